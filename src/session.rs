//! The caller-owned context for one open collection: the note being
//! edited, the current search results and the backends they come from.

use crate::config::Config;
use crate::error::Result;
use crate::identity::{CollectionKind, NoteIdentity, local_today};
use crate::note::Note;
use crate::results::{Refinement, ResultSet};
use crate::search::{SearchQuery, Searcher};
use crate::store::{NoteStore, Saved, StoreRoot};
use crate::tags::{extract_hashtags, normalize_tag};
use chrono::Days;
use tracing::{debug, info, warn};

pub struct Session {
    kind: CollectionKind,
    store: NoteStore,
    searcher: Box<dyn Searcher>,
    current: Note,
    /// Set while `current` stands in for a note whose file could not be
    /// read. Its text is not the note's text.
    unread: bool,
    found: ResultSet,
}

/// The collection's default note, or an empty stand-in (flagged `true`)
/// when its file is unreadable.
fn load_default(store: &NoteStore, kind: CollectionKind) -> (Note, bool) {
    let identity = kind.default_identity();
    match store.load(&identity) {
        Ok(note) => (note, false),
        Err(e) => {
            warn!(%identity, error = %e, "default note unreadable");
            (Note::new(identity), true)
        }
    }
}

impl Session {
    /// Open `root` on its default note: today for dated collections, the
    /// untitled note for titled ones. If that note's file cannot be read the
    /// session still opens, and only operations on that note fail.
    pub fn new(
        root: StoreRoot,
        kind: CollectionKind,
        searcher: Box<dyn Searcher>,
    ) -> Result<Self> {
        let store = NoteStore::new(root);
        let (current, unread) = load_default(&store, kind);
        Ok(Self {
            kind,
            store,
            searcher,
            current,
            unread,
            found: ResultSet::new(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.store_root()?, config.kind, config.backend.searcher())
    }

    pub fn kind(&self) -> CollectionKind {
        self.kind
    }

    pub fn store(&self) -> &NoteStore {
        &self.store
    }

    pub fn current(&self) -> &Note {
        &self.current
    }

    /// Replace the current note's edit buffer.
    pub fn edit(&mut self, text: impl Into<String>) {
        self.current.set_text(text);
    }

    pub fn found(&self) -> &ResultSet {
        &self.found
    }

    /// Persist the current note if it is dirty. In a titled collection a
    /// changed first line moves the note to its new title; the move is
    /// refused if another note already has that title, and the edit buffer
    /// is kept either way.
    pub fn commit(&mut self) -> Result<Option<Saved>> {
        if !self.current.is_dirty() {
            return Ok(None);
        }
        if self.unread {
            // Never write over a file that could not be read.
            self.store.load(self.current.identity())?;
            self.unread = false;
        }
        if self.kind == CollectionKind::Titled
            && matches!(self.current.identity(), NoteIdentity::Titled(_))
            && !self.current.is_blank()
        {
            let derived = NoteIdentity::titled(self.current.title());
            if derived != *self.current.identity() {
                let old = self.current.identity().clone();
                self.store.rename(&mut self.current, derived.clone())?;
                self.found.rename(&old, derived.clone());
                return Ok(Some(Saved::Written(self.store.path_for(&derived))));
            }
        }
        self.store.save(&mut self.current).map(Some)
    }

    /// Commit the current note, then make `identity` current.
    pub fn open(&mut self, identity: NoteIdentity) -> Result<&Note> {
        self.commit()?;
        debug!(%identity, "opening note");
        self.current = self.store.load(&identity)?;
        self.unread = false;
        Ok(&self.current)
    }

    pub fn open_today(&mut self) -> Result<&Note> {
        self.open(NoteIdentity::today())
    }

    /// Open the dated note `days` away from the current one (from today
    /// when the current note is not dated).
    pub fn step_days(&mut self, days: i64) -> Result<&Note> {
        let base = self.current.identity().date().unwrap_or_else(local_today);
        let target = if days >= 0 {
            base.checked_add_days(Days::new(days.unsigned_abs()))
        } else {
            base.checked_sub_days(Days::new(days.unsigned_abs()))
        };
        self.open(NoteIdentity::Dated(target.unwrap_or(base)))
    }

    /// Open the `index`-th found note. `None` when out of range.
    pub fn select(&mut self, index: usize) -> Result<Option<&Note>> {
        let Some(identity) = self.found.get(index).cloned() else {
            return Ok(None);
        };
        self.open(identity).map(Some)
    }

    /// Text of a note for display. The current note shows its live buffer;
    /// other notes are read from disk without becoming current.
    pub fn preview(&self, identity: &NoteIdentity) -> Result<String> {
        if identity == self.current.identity() && !self.unread {
            return Ok(self.current.text().to_string());
        }
        Ok(self.store.load(identity)?.text().to_string())
    }

    /// Run `query` against the collection and resolve the matches to
    /// identities, oldest first for dated collections.
    pub fn search(&self, query: &SearchQuery) -> Result<ResultSet> {
        let roots = [self.store.dir().to_path_buf()];
        let paths = self.searcher.search(&roots, query)?;
        let mut set: ResultSet =
            paths.iter().map(|p| self.store.identity_for(p)).collect();
        if self.kind == CollectionKind::Dated {
            set.sort_by_date();
        }
        Ok(set)
    }

    /// Replace the found set with the results of `query`.
    pub fn find(&mut self, query: &SearchQuery) -> Result<&ResultSet> {
        self.found = self.search(query)?;
        debug!(pattern = %query.pattern, found = self.found.len(), "find");
        Ok(&self.found)
    }

    /// Combine the found set with the results of `query`.
    pub fn refine(
        &mut self,
        refinement: Refinement,
        query: &SearchQuery,
    ) -> Result<&ResultSet> {
        let fresh = self.search(query)?;
        self.found = refinement.apply(&self.found, &fresh);
        debug!(
            ?refinement,
            pattern = %query.pattern,
            found = self.found.len(),
            "refine"
        );
        Ok(&self.found)
    }

    pub fn hashtags(&self) -> Vec<String> {
        extract_hashtags(self.store.dir())
    }

    /// Find the notes using `tag`, matched as a literal string.
    pub fn find_hashtag(&mut self, tag: &str) -> Result<&ResultSet> {
        self.find(&SearchQuery::literal(normalize_tag(tag)))
    }

    /// Delete a note's file. Removing the current note also clears its
    /// buffer.
    pub fn remove(&mut self, identity: &NoteIdentity) -> Result<bool> {
        let removed = self.store.remove(identity)?;
        if identity == self.current.identity() {
            self.current = Note::new(identity.clone());
            self.unread = false;
        }
        self.found.remove(identity);
        Ok(removed)
    }

    /// Commit, then re-root the session on another collection under the
    /// same base directory. The found set is cleared.
    pub fn switch_collection(&mut self, collection: &str) -> Result<()> {
        let root = StoreRoot::new(self.store.root().base(), collection)?;
        self.commit()?;
        let store = NoteStore::new(root);
        (self.current, self.unread) = load_default(&store, self.kind);
        self.store = store;
        self.found = ResultSet::new();
        info!(collection, "switched collection");
        Ok(())
    }
}
