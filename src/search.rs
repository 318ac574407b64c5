//! Finding the note files that match a query.
//!
//! Two backends implement [`Searcher`]: [`WalkSearcher`] scans the tree in
//! process, [`GrepSearcher`] delegates to an external `grep`. Both return
//! only the paths of matching files, in no particular order.

use crate::error::{Result, StoreError};
use regex::{Regex, RegexBuilder};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

/// Bytes inspected for a NUL when deciding whether a file is binary.
const BINARY_CHECK_LEN: usize = 8192;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    Literal,
    Regex,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub kind: QueryKind,
    pub pattern: String,
}

impl SearchQuery {
    pub fn literal(pattern: impl Into<String>) -> Self {
        Self { kind: QueryKind::Literal, pattern: pattern.into() }
    }

    pub fn regex(pattern: impl Into<String>) -> Self {
        Self { kind: QueryKind::Regex, pattern: pattern.into() }
    }

    pub fn is_empty(&self) -> bool {
        self.pattern.is_empty()
    }
}

/// Case-insensitive fixed-string finder. No regex engine is involved, so
/// metacharacters in the needle are plain text.
#[derive(Debug, Clone)]
pub(crate) struct LiteralFinder {
    needle: String,
}

impl LiteralFinder {
    pub(crate) fn new(pattern: &str) -> Self {
        Self { needle: pattern.to_lowercase() }
    }

    /// One case fold of the haystack, then std's linear-time substring
    /// search. Needles never hold a newline, so any hit lies on one line.
    pub(crate) fn is_match(&self, haystack: &str) -> bool {
        if self.needle.is_empty() {
            return true;
        }
        if self.needle.is_ascii() {
            haystack.to_ascii_lowercase().contains(&self.needle)
        } else {
            haystack.to_lowercase().contains(&self.needle)
        }
    }
}

/// A query compiled once per search. Matching is line by line, the way
/// `grep` matches, so `^` and `$` anchor to each line.
#[derive(Debug, Clone)]
pub(crate) enum Matcher {
    Literal(LiteralFinder),
    Regex(Regex),
}

impl Matcher {
    /// Regex queries without metacharacters take the literal path.
    /// Patterns spanning several lines are refused: no single line can
    /// match them.
    pub(crate) fn compile(query: &SearchQuery) -> Result<Self> {
        if query.pattern.contains('\n') {
            return Err(StoreError::Query(
                "pattern spans more than one line".to_string(),
            ));
        }
        let literal = match query.kind {
            QueryKind::Literal => true,
            QueryKind::Regex => regex::escape(&query.pattern) == query.pattern,
        };
        if literal {
            return Ok(Self::Literal(LiteralFinder::new(&query.pattern)));
        }
        let re = RegexBuilder::new(&query.pattern)
            .case_insensitive(true)
            .build()?;
        Ok(Self::Regex(re))
    }

    pub(crate) fn is_match(&self, haystack: &str) -> bool {
        match self {
            Self::Literal(f) => f.is_match(haystack),
            Self::Regex(re) => haystack.split('\n').any(|line| re.is_match(line)),
        }
    }
}

pub trait Searcher {
    /// Paths of the files under `roots` containing at least one match.
    /// An empty query matches nothing.
    fn search(&self, roots: &[PathBuf], query: &SearchQuery) -> Result<Vec<PathBuf>>;
}

/// In-process recursive scan.
#[derive(Debug, Clone, Copy, Default)]
pub struct WalkSearcher;

impl Searcher for WalkSearcher {
    fn search(&self, roots: &[PathBuf], query: &SearchQuery) -> Result<Vec<PathBuf>> {
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let matcher = Matcher::compile(query)?;
        let mut found = Vec::new();
        for root in roots {
            for path in note_files(root) {
                match read_text(&path) {
                    Ok(Some(text)) if matcher.is_match(&text) => found.push(path),
                    Ok(_) => {}
                    Err(e) => warn!(
                        path = %path.display(),
                        error = %e,
                        "skipping unreadable file"
                    ),
                }
            }
        }
        debug!(pattern = %query.pattern, matches = found.len(), "walk search finished");
        Ok(found)
    }
}

fn is_hidden_dir(entry: &DirEntry) -> bool {
    entry.file_type().is_dir()
        && entry.file_name().to_str().is_some_and(|name| name.starts_with('.'))
}

/// Regular files under `root`, not descending into hidden directories.
/// The root itself is always entered. A missing root yields nothing.
pub(crate) fn note_files(root: &Path) -> impl Iterator<Item = PathBuf> {
    WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden_dir(e))
        .filter_map(|entry| match entry {
            Ok(e) => Some(e),
            Err(err) => {
                if err.io_error().is_some_and(|e| e.kind() == io::ErrorKind::NotFound) {
                    debug!(error = %err, "search root missing");
                } else {
                    warn!(error = %err, "skipping entry during scan");
                }
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .map(DirEntry::into_path)
}

/// File contents as text, or `None` for binary files.
pub(crate) fn read_text(path: &Path) -> io::Result<Option<String>> {
    let bytes = fs::read(path)?;
    let head = &bytes[..bytes.len().min(BINARY_CHECK_LEN)];
    if head.contains(&0) {
        debug!(path = %path.display(), "skipping binary file");
        return Ok(None);
    }
    Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
}

/// Runs an external GNU-compatible `grep` and reads the matching file
/// names from its stdout.
#[derive(Debug, Clone)]
pub struct GrepSearcher {
    program: String,
}

impl Default for GrepSearcher {
    fn default() -> Self {
        Self::new("grep")
    }
}

impl GrepSearcher {
    pub fn new(program: impl Into<String>) -> Self {
        Self { program: program.into() }
    }

    pub fn is_available(&self) -> bool {
        Command::new(&self.program)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok_and(|s| s.success())
    }

    fn search_root(&self, root: &Path, query: &SearchQuery) -> Result<Vec<PathBuf>> {
        let mode = match query.kind {
            QueryKind::Literal => "--fixed-strings",
            QueryKind::Regex => "--extended-regexp",
        };
        // Run inside the root so the hidden-directory exclusion can never
        // match the root's own path.
        let output = Command::new(&self.program)
            .current_dir(root)
            .args([
                "--recursive",
                "--files-with-matches",
                "--ignore-case",
                "--binary-files=without-match",
                "--exclude-dir=.[!.]*",
                mode,
                "--regexp",
            ])
            .arg(&query.pattern)
            .arg(".")
            .stdin(Stdio::null())
            .output()
            .map_err(|e| {
                StoreError::Backend(format!("could not run {}: {e}", self.program))
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        match output.status.code() {
            Some(0) | Some(1) => {}
            _ if stdout.trim().is_empty() => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                return Err(StoreError::Backend(format!(
                    "{} exited with {}: {}",
                    self.program,
                    output.status,
                    stderr.trim()
                )));
            }
            _ => warn!(
                status = %output.status,
                "grep reported errors; using partial results"
            ),
        }

        Ok(stdout
            .lines()
            .filter(|l| !l.is_empty())
            .map(|l| root.join(l.strip_prefix("./").unwrap_or(l)))
            .collect())
    }
}

impl Searcher for GrepSearcher {
    fn search(&self, roots: &[PathBuf], query: &SearchQuery) -> Result<Vec<PathBuf>> {
        if query.is_empty() {
            return Ok(Vec::new());
        }
        // Reject patterns the in-process engine would reject, so both
        // backends fail the same way.
        Matcher::compile(query)?;
        let mut found = Vec::new();
        for root in roots {
            if !root.is_dir() {
                debug!(root = %root.display(), "search root missing");
                continue;
            }
            found.extend(self.search_root(root, query)?);
        }
        debug!(pattern = %query.pattern, matches = found.len(), "grep search finished");
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{TempDir, tempdir};

    fn fixture() -> TempDir {
        let tmp = tempdir().unwrap();
        let files = [
            ("2024/01/01.txt", "Alpha and beta"),
            ("2024/01/02.txt", "ALPHA only"),
            ("2024/01/03.txt", "a.c literal dot"),
            ("2024/01/04.txt", "abc no dot"),
            ("2024/01/06.txt", "intro\nMeeting at noon\n"),
            (".trash/2024/01/05.txt", "alpha in the bin"),
        ];
        for (rel, text) in files {
            let path = tmp.path().join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, text).unwrap();
        }
        fs::write(tmp.path().join("blob.bin"), b"alpha\0\x01\x02").unwrap();
        tmp
    }

    fn names(root: &Path, mut found: Vec<PathBuf>) -> Vec<String> {
        found.sort();
        found
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect()
    }

    #[test]
    fn test_literal_is_case_insensitive_and_skips_hidden_and_binary() {
        let tmp = fixture();
        let roots = vec![tmp.path().to_path_buf()];
        let found = WalkSearcher.search(&roots, &SearchQuery::literal("alpha")).unwrap();
        assert_eq!(names(tmp.path(), found), vec!["2024/01/01.txt", "2024/01/02.txt"]);
    }

    #[test]
    fn test_literal_does_not_interpret_metacharacters() {
        let tmp = fixture();
        let roots = vec![tmp.path().to_path_buf()];
        let found = WalkSearcher.search(&roots, &SearchQuery::literal("a.c")).unwrap();
        assert_eq!(names(tmp.path(), found), vec!["2024/01/03.txt"]);

        let found = WalkSearcher.search(&roots, &SearchQuery::regex("a.c")).unwrap();
        assert_eq!(names(tmp.path(), found), vec!["2024/01/03.txt", "2024/01/04.txt"]);
    }

    #[test]
    fn test_regex_posix_class() {
        let tmp = fixture();
        let roots = vec![tmp.path().to_path_buf()];
        let q = SearchQuery::regex("^[[:alnum:]]+ only$");
        let found = WalkSearcher.search(&roots, &q).unwrap();
        assert_eq!(names(tmp.path(), found), vec!["2024/01/02.txt"]);
    }

    #[test]
    fn test_regex_anchors_to_each_line() {
        let tmp = fixture();
        let roots = vec![tmp.path().to_path_buf()];
        let search = |p: &str| {
            let found = WalkSearcher.search(&roots, &SearchQuery::regex(p));
            names(tmp.path(), found.unwrap())
        };
        assert_eq!(search("^meeting"), vec!["2024/01/06.txt"]);
        assert_eq!(search("intro$"), vec!["2024/01/06.txt"]);
        assert!(search("^noon").is_empty());
        assert!(search(r"intro\s+meeting").is_empty());
    }

    #[test]
    fn test_multiline_query_is_refused() {
        let tmp = fixture();
        let roots = vec![tmp.path().to_path_buf()];
        let q = SearchQuery::literal("intro\nMeeting");
        let err = WalkSearcher.search(&roots, &q).unwrap_err();
        assert!(matches!(err, StoreError::Query(_)));

        let grep = GrepSearcher::new("definitely-not-a-grep-binary");
        let err = grep.search(&roots, &SearchQuery::regex("a\nb")).unwrap_err();
        assert!(matches!(err, StoreError::Query(_)));
    }

    #[test]
    fn test_empty_query_and_bad_pattern() {
        let tmp = fixture();
        let roots = vec![tmp.path().to_path_buf()];
        let empty = WalkSearcher.search(&roots, &SearchQuery::literal(""));
        assert!(empty.unwrap().is_empty());
        let bad = SearchQuery::regex("(unclosed");
        let err = WalkSearcher.search(&roots, &bad).unwrap_err();
        assert!(matches!(err, StoreError::Pattern(_)));
    }

    #[test]
    fn test_missing_root_and_multiple_roots() {
        let a = fixture();
        let b = tempdir().unwrap();
        fs::write(b.path().join("x.txt"), "alpha").unwrap();
        let roots = vec![
            a.path().join("nope"),
            a.path().to_path_buf(),
            b.path().to_path_buf(),
        ];
        let q = SearchQuery::literal("ALPHA");
        assert_eq!(WalkSearcher.search(&roots, &q).unwrap().len(), 3);
    }

    #[test]
    fn test_metachar_free_regex_is_literal() {
        assert!(matches!(
            Matcher::compile(&SearchQuery::regex("plain words")).unwrap(),
            Matcher::Literal(_)
        ));
        assert!(matches!(
            Matcher::compile(&SearchQuery::regex("#[[:alnum:]]+")).unwrap(),
            Matcher::Regex(_)
        ));
    }

    #[test]
    fn test_literal_finder_unicode() {
        let f = LiteralFinder::new("CAFÉ");
        assert!(f.is_match("un café noir"));
        assert!(!f.is_match("cafe"));
        assert!(LiteralFinder::new("").is_match("anything"));
        assert!(LiteralFinder::new("(1+1)").is_match("x = (1+1)"));
        assert!(LiteralFinder::new("Noon").is_match("déjà vu at NOON"));
    }

    fn gnu_grep() -> Option<GrepSearcher> {
        let out = Command::new("grep").arg("--version").output().ok()?;
        String::from_utf8_lossy(&out.stdout)
            .contains("GNU")
            .then(GrepSearcher::default)
    }

    #[test]
    fn test_grep_backend_matches_walker() {
        let Some(grep) = gnu_grep() else {
            eprintln!("GNU grep not available; skipping");
            return;
        };
        let tmp = fixture();
        let roots = vec![tmp.path().to_path_buf()];
        let queries = [
            SearchQuery::literal("alpha"),
            SearchQuery::literal("a.c"),
            SearchQuery::regex("^meeting"),
            SearchQuery::regex("dot$"),
            SearchQuery::regex("^a"),
        ];
        for q in queries {
            let expected = names(tmp.path(), WalkSearcher.search(&roots, &q).unwrap());
            let got = names(tmp.path(), grep.search(&roots, &q).unwrap());
            assert_eq!(got, expected, "{q:?}");
        }
    }

    #[test]
    fn test_grep_missing_program() {
        let tmp = fixture();
        let roots = vec![tmp.path().to_path_buf()];
        let grep = GrepSearcher::new("definitely-not-a-grep-binary");
        assert!(!grep.is_available());
        let err = grep.search(&roots, &SearchQuery::literal("alpha")).unwrap_err();
        assert!(matches!(err, StoreError::Backend(_)));
    }
}
