//! Environment-driven settings for a session.

use crate::error::{Result, StoreError};
use crate::identity::CollectionKind;
use crate::search::{GrepSearcher, Searcher, WalkSearcher};
use crate::store::{StoreRoot, validate_collection_name};
use std::path::PathBuf;

pub const DIR_ENV: &str = "DAYBOOK_DIR";
pub const COLLECTION_ENV: &str = "DAYBOOK_COLLECTION";
pub const KIND_ENV: &str = "DAYBOOK_KIND";
pub const SEARCH_ENV: &str = "DAYBOOK_SEARCH";
pub const LOG_ENV: &str = "DAYBOOK_LOG";

pub const DEFAULT_COLLECTION: &str = "Default";
const DEFAULT_DATA_DIR: &str = ".daybook";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchBackend {
    #[default]
    Walk,
    Grep,
}

impl SearchBackend {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "walk" | "builtin" => Some(Self::Walk),
            "grep" => Some(Self::Grep),
            _ => None,
        }
    }

    pub fn searcher(self) -> Box<dyn Searcher> {
        match self {
            Self::Walk => Box::new(WalkSearcher),
            Self::Grep => Box::new(GrepSearcher::default()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub base_dir: PathBuf,
    pub collection: String,
    pub kind: CollectionKind,
    pub backend: SearchBackend,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any variable source; unset and empty values
    /// fall back to defaults.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| get(key).filter(|v| !v.trim().is_empty());

        let base_dir = match get(DIR_ENV) {
            Some(dir) => PathBuf::from(dir),
            None => {
                let home = get("HOME").ok_or_else(|| {
                    StoreError::Config(format!("HOME not set; set {DIR_ENV} explicitly"))
                })?;
                PathBuf::from(home).join(DEFAULT_DATA_DIR)
            }
        };

        let collection =
            get(COLLECTION_ENV).unwrap_or_else(|| DEFAULT_COLLECTION.to_string());
        validate_collection_name(&collection)?;

        let kind = match get(KIND_ENV) {
            Some(v) => CollectionKind::parse(&v).ok_or_else(|| {
                let msg = format!("{KIND_ENV} must be dated or titled, got {v:?}");
                StoreError::Config(msg)
            })?,
            None => CollectionKind::default(),
        };

        let backend = match get(SEARCH_ENV) {
            Some(v) => SearchBackend::parse(&v).ok_or_else(|| {
                let msg = format!("{SEARCH_ENV} must be walk or grep, got {v:?}");
                StoreError::Config(msg)
            })?,
            None => SearchBackend::default(),
        };

        Ok(Self { base_dir, collection, kind, backend })
    }

    pub fn store_root(&self) -> Result<StoreRoot> {
        StoreRoot::new(&self.base_dir, &self.collection)
    }
}
