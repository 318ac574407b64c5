use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Failures surfaced by the note engine.
///
/// A missing note file, an unparseable path and an empty query are not
/// errors; they resolve to an empty note, `NoteIdentity::Unknown` and an
/// empty result respectively.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to {action} {}: {source}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid search pattern: {0}")]
    Pattern(#[from] regex::Error),
    #[error("invalid search query: {0}")]
    Query(String),
    #[error("a note titled \"{title}\" already exists")]
    Conflict { title: String },
    #[error("search backend failed: {0}")]
    Backend(String),
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl StoreError {
    pub(crate) fn io(action: &'static str, path: &Path, source: io::Error) -> Self {
        Self::Io { action, path: path.to_path_buf(), source }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
