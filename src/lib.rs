//! Plain-text notes kept as one file per note, in collections that are
//! either dated journals (`yyyy/mm/dd.txt`) or titled notebooks
//! (`<title>.txt`), with case-insensitive search and result refinement.

pub mod config;
pub mod error;
pub mod identity;
pub mod note;
pub mod results;
pub mod search;
pub mod session;
pub mod store;
pub mod tags;

mod args;
mod commands;
mod formatting;
mod shared {
    pub(crate) mod table;
}

pub use error::{Result, StoreError};
pub use identity::{CollectionKind, NoteIdentity, Title};
pub use note::Note;
pub use results::{Refinement, ResultSet};
pub use search::{GrepSearcher, QueryKind, SearchQuery, Searcher, WalkSearcher};
pub use session::Session;
pub use store::{NoteStore, Saved, StoreRoot};

use std::env;
use std::error::Error;
use tracing_subscriber::EnvFilter;

/// Run the command line host with the process arguments.
pub fn entry() -> std::result::Result<(), Box<dyn Error>> {
    init_logging();
    let args: Vec<String> = env::args().skip(1).collect();
    commands::run(args)
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(config::LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
