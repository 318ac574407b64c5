//! Mapping between a note's logical identity and its file under a
//! collection root.
//!
//! Dated notes live at `root/yyyy/mm/dd.txt`, titled notes at
//! `root/<sanitized title>.txt`. Anything else found under the root
//! resolves to [`NoteIdentity::Unknown`], which keeps the path so the note
//! stays loadable.

use chrono::{Datelike, Days, Local, NaiveDate};
use std::fmt;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

pub const NOTE_EXT: &str = "txt";
pub const UNTITLED: &str = "untitled";

/// Filesystem-safe form of a free-form title.
///
/// Letters and digits are kept, whitespace runs become one space, every
/// other character becomes `_`, and the result is trimmed. Applying it
/// twice gives the same result as applying it once.
pub fn sanitize(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    let mut in_space = false;
    for ch in title.chars() {
        if ch.is_whitespace() {
            if !in_space {
                out.push(' ');
                in_space = true;
            }
            continue;
        }
        in_space = false;
        if ch.is_alphanumeric() {
            out.push(ch);
        } else {
            out.push('_');
        }
    }
    out.trim().to_string()
}

/// First line of `text` with visible content, or `""`.
pub fn first_line(text: &str) -> &str {
    text.lines().find(|l| !l.trim().is_empty()).unwrap_or("")
}

/// A sanitized note title. Empty titles collapse to [`UNTITLED`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Title(String);

impl Title {
    pub fn new(raw: &str) -> Self {
        let clean = sanitize(raw);
        if clean.is_empty() {
            Self(UNTITLED.to_string())
        } else {
            Self(clean)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Title {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Logical key of a note.
///
/// `Unknown` is the sentinel for paths that parse as neither form. It
/// holds the path relative to the collection root (or the full path when
/// it lies outside the root) and never equals a dated or titled identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NoteIdentity {
    Dated(NaiveDate),
    Titled(Title),
    Unknown(PathBuf),
}

impl NoteIdentity {
    pub fn titled(raw: &str) -> Self {
        Self::Titled(Title::new(raw))
    }

    pub fn today() -> Self {
        Self::Dated(local_today())
    }

    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            Self::Dated(d) => Some(*d),
            _ => None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown(_))
    }
}

impl fmt::Display for NoteIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dated(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Self::Titled(t) => write!(f, "{t}"),
            Self::Unknown(p) => write!(f, "?{}", p.display()),
        }
    }
}

/// Today's calendar date in the local timezone.
pub fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn path_for(identity: &NoteIdentity, root: &Path) -> PathBuf {
    match identity {
        NoteIdentity::Dated(d) => root
            .join(format!("{:04}", d.year()))
            .join(format!("{:02}", d.month()))
            .join(format!("{:02}.{NOTE_EXT}", d.day())),
        NoteIdentity::Titled(t) => root.join(format!("{}.{NOTE_EXT}", t.as_str())),
        NoteIdentity::Unknown(rel) => root.join(rel),
    }
}

/// Resolve a path found under `root` back into an identity.
///
/// Never fails: anything that is not `yyyy/mm/dd.txt` or `<title>.txt`
/// directly under the root becomes [`NoteIdentity::Unknown`].
pub fn identity_from_path(path: &Path, root: &Path) -> NoteIdentity {
    let Ok(rel) = path.strip_prefix(root) else {
        warn!(
            path = %path.display(),
            root = %root.display(),
            "path outside collection root"
        );
        return NoteIdentity::Unknown(path.to_path_buf());
    };
    let unknown = || {
        debug!(path = %rel.display(), "unrecognised note path");
        NoteIdentity::Unknown(rel.to_path_buf())
    };

    let segments: Option<Vec<&str>> = rel
        .components()
        .map(|c| match c {
            Component::Normal(s) => s.to_str(),
            _ => None,
        })
        .collect();
    let Some(mut segments) = segments else {
        return unknown();
    };
    let Some(stem) = segments
        .pop()
        .and_then(|last| last.strip_suffix(&format!(".{NOTE_EXT}")))
    else {
        return unknown();
    };

    match segments.as_slice() {
        [] => NoteIdentity::titled(stem),
        [year, month] => match parse_date_segments(year, month, stem) {
            Some(date) => NoteIdentity::Dated(date),
            None => unknown(),
        },
        _ => unknown(),
    }
}

fn parse_date_segments(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    fn digits(s: &str, width: usize) -> Option<u32> {
        if s.len() == width && s.bytes().all(|b| b.is_ascii_digit()) {
            s.parse().ok()
        } else {
            None
        }
    }
    let y = digits(year, 4)?;
    let m = digits(month, 2)?;
    let d = digits(day, 2)?;
    NaiveDate::from_ymd_opt(i32::try_from(y).ok()?, m, d)
}

/// Identity scheme of a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollectionKind {
    #[default]
    Dated,
    Titled,
}

impl CollectionKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dated" | "journal" => Some(Self::Dated),
            "titled" | "book" => Some(Self::Titled),
            _ => None,
        }
    }

    /// The note a fresh session opens on.
    pub fn default_identity(self) -> NoteIdentity {
        match self {
            Self::Dated => NoteIdentity::today(),
            Self::Titled => NoteIdentity::titled(UNTITLED),
        }
    }
}

/// Parse a user-supplied identity: `YYYY-MM-DD`, `today`, `yesterday` or
/// `tomorrow` for dated collections, free text for titled ones.
pub fn parse_identity(kind: CollectionKind, arg: &str) -> Result<NoteIdentity, String> {
    match kind {
        CollectionKind::Titled => Ok(NoteIdentity::titled(arg)),
        CollectionKind::Dated => {
            let today = local_today();
            let date = match arg.trim().to_ascii_lowercase().as_str() {
                "today" => Some(today),
                "yesterday" => today.checked_sub_days(Days::new(1)),
                "tomorrow" => today.checked_add_days(Days::new(1)),
                other => NaiveDate::parse_from_str(other, "%Y-%m-%d").ok(),
            };
            date.map(NoteIdentity::Dated)
                .ok_or_else(|| format!("Not a date (expected YYYY-MM-DD): {arg}"))
        }
    }
}
