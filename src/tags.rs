use crate::search::{note_files, read_text};
use regex::Regex;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::OnceLock;
use tracing::{debug, warn};

fn hashtag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"#[\p{L}\p{N}]+").expect("hashtag pattern is valid"))
}

/// `#tag` form of a user-supplied tag, lower-cased. Blank input stays blank.
pub fn normalize_tag(t: &str) -> String {
    match t.trim() {
        "" => String::new(),
        bare => format!("#{}", bare.strip_prefix('#').unwrap_or(bare).to_lowercase()),
    }
}

/// Normalized tags, sorted, each once.
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tags.into_iter()
        .map(|t| normalize_tag(t.as_ref()))
        .filter(|t| !t.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Every `#tag` occurrence in `text`, as written.
pub fn hashtags_in(text: &str) -> impl Iterator<Item = &str> {
    hashtag_re().find_iter(text).map(|m| m.as_str())
}

/// All hashtags used in the notes under `root`: lower-cased, deduplicated
/// and sorted. Unreadable and binary files are skipped.
pub fn extract_hashtags(root: &Path) -> Vec<String> {
    let mut found = Vec::new();
    for path in note_files(root) {
        match read_text(&path) {
            Ok(Some(text)) => found.extend(hashtags_in(&text).map(str::to_string)),
            Ok(None) => {}
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping unreadable file")
            }
        }
    }
    let tags = normalize_tags(found);
    debug!(root = %root.display(), count = tags.len(), "extracted hashtags");
    tags
}
