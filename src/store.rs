//! Load/save/remove/rename of note files under one collection.
//!
//! There is no cache: every load re-reads the file. Saving blank text
//! deletes the file instead of writing it.

use crate::error::{Result, StoreError};
use crate::identity::{NoteIdentity, identity_from_path, path_for};
use crate::note::Note;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};

/// Base data directory plus the collection (journal or book) beneath it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreRoot {
    base: PathBuf,
    collection: String,
}

impl StoreRoot {
    pub fn new(base: impl Into<PathBuf>, collection: &str) -> Result<Self> {
        validate_collection_name(collection)?;
        Ok(Self { base: base.into(), collection: collection.to_string() })
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn dir(&self) -> PathBuf {
        self.base.join(&self.collection)
    }
}

/// A collection name must be one visible path segment.
pub fn validate_collection_name(name: &str) -> Result<()> {
    let mut components = Path::new(name).components();
    let single = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    );
    if !single || name.starts_with('.') || name.contains(['/', '\\']) {
        return Err(StoreError::Config(format!("invalid collection name: {name:?}")));
    }
    Ok(())
}

/// Names of the collections under `base`, sorted. Hidden directories are
/// skipped and a missing base yields no collections.
pub fn list_collections(base: &Path) -> Result<Vec<String>> {
    let entries = match fs::read_dir(base) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(StoreError::io("list", base, e)),
    };
    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| StoreError::io("list", base, e))?;
        let is_dir = entry.file_type().map(|ft| ft.is_dir()).unwrap_or(false);
        if !is_dir {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            if !name.starts_with('.') {
                names.push(name.to_string());
            }
        }
    }
    names.sort();
    Ok(names)
}

fn ensure_dir(path: &Path) -> io::Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    }
    Ok(())
}

/// What a save did on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Saved {
    Written(PathBuf),
    Removed,
}

#[derive(Debug, Clone)]
pub struct NoteStore {
    root: StoreRoot,
    dir: PathBuf,
}

impl NoteStore {
    pub fn new(root: StoreRoot) -> Self {
        let dir = root.dir();
        Self { root, dir }
    }

    pub fn root(&self) -> &StoreRoot {
        &self.root
    }

    /// The collection directory all note paths live under.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, identity: &NoteIdentity) -> PathBuf {
        path_for(identity, &self.dir)
    }

    pub fn identity_for(&self, path: &Path) -> NoteIdentity {
        identity_from_path(path, &self.dir)
    }

    pub fn exists(&self, identity: &NoteIdentity) -> bool {
        self.path_for(identity).is_file()
    }

    /// Read the note for `identity`. A missing file is an empty note; any
    /// other read failure is an error so a blank buffer never stands in for
    /// content that could not be read.
    pub fn load(&self, identity: &NoteIdentity) -> Result<Note> {
        let path = self.path_for(identity);
        match fs::read_to_string(&path) {
            Ok(text) => {
                debug!(path = %path.display(), bytes = text.len(), "loaded note");
                Ok(Note::loaded(identity.clone(), text))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no note on disk");
                Ok(Note::new(identity.clone()))
            }
            Err(e) => Err(StoreError::io("read", &path, e)),
        }
    }

    /// Persist the note's text verbatim, creating parent directories as
    /// needed. Blank text removes the file instead. On error the note is
    /// left exactly as it was.
    pub fn save(&self, note: &mut Note) -> Result<Saved> {
        let path = self.path_for(note.identity());
        if note.is_blank() {
            self.remove_path(&path)?;
            note.mark_saved();
            return Ok(Saved::Removed);
        }
        if let Some(parent) = path.parent() {
            ensure_dir(parent)
                .map_err(|e| StoreError::io("create directory for", &path, e))?;
        }
        fs::write(&path, note.text()).map_err(|e| StoreError::io("write", &path, e))?;
        info!(path = %path.display(), bytes = note.text().len(), "saved note");
        note.mark_saved();
        Ok(Saved::Written(path))
    }

    /// Delete the file for `identity`. Returns whether a file was removed.
    pub fn remove(&self, identity: &NoteIdentity) -> Result<bool> {
        self.remove_path(&self.path_for(identity))
    }

    fn remove_path(&self, path: &Path) -> Result<bool> {
        match fs::remove_file(path) {
            Ok(()) => {
                info!(path = %path.display(), "removed note");
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StoreError::io("remove", path, e)),
        }
    }

    /// Move `note` to `new_identity`: write it at the new path, then remove
    /// the file at its current path.
    ///
    /// A rename onto a path that already holds a note is rejected with
    /// [`StoreError::Conflict`] and changes nothing. Renaming to the same
    /// identity does nothing.
    pub fn rename(&self, note: &mut Note, new_identity: NoteIdentity) -> Result<()> {
        if *note.identity() == new_identity {
            return Ok(());
        }
        let old_path = self.path_for(note.identity());
        let new_path = self.path_for(&new_identity);
        if new_path.exists() {
            return Err(StoreError::Conflict { title: new_identity.to_string() });
        }

        if !note.is_blank() {
            let mut moved = note.clone();
            moved.set_identity(new_identity.clone());
            self.save(&mut moved)?;
        }
        note.set_identity(new_identity);
        note.mark_saved();
        info!(from = %old_path.display(), to = %new_path.display(), "renamed note");
        self.remove_path(&old_path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    fn store(base: &Path) -> NoteStore {
        NoteStore::new(StoreRoot::new(base, "Default").unwrap())
    }

    fn day(y: i32, m: u32, d: u32) -> NoteIdentity {
        NoteIdentity::Dated(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    #[test]
    fn test_load_missing_is_empty() {
        let tmp = tempdir().unwrap();
        let note = store(tmp.path()).load(&day(2024, 1, 1)).unwrap();
        assert_eq!(note.text(), "");
        assert!(!note.is_dirty());
    }

    #[test]
    fn test_save_creates_dirs_and_writes_verbatim() {
        let tmp = tempdir().unwrap();
        let store = store(tmp.path());
        let mut note = Note::new(day(2024, 3, 5));
        note.set_text("Meeting notes\n#work");
        let saved = store.save(&mut note).unwrap();
        let path = tmp.path().join("Default/2024/03/05.txt");
        assert_eq!(saved, Saved::Written(path.clone()));
        assert_eq!(fs::read_to_string(path).unwrap(), "Meeting notes\n#work");
        assert!(!note.is_dirty());

        let reloaded = store.load(&day(2024, 3, 5)).unwrap();
        assert_eq!(reloaded.text(), "Meeting notes\n#work");
        assert_eq!(reloaded.loaded_text(), reloaded.text());
    }

    #[test]
    fn test_blank_save_deletes() {
        let tmp = tempdir().unwrap();
        let store = store(tmp.path());
        let id = NoteIdentity::titled("Groceries");
        let mut note = Note::new(id.clone());
        note.set_text("eggs");
        store.save(&mut note).unwrap();
        assert!(store.exists(&id));

        note.set_text("  \n\t ");
        assert_eq!(store.save(&mut note).unwrap(), Saved::Removed);
        assert!(!store.exists(&id));
        assert_eq!(store.load(&id).unwrap().text(), "");

        // removing a note that was never written is fine
        let mut fresh = Note::new(NoteIdentity::titled("never"));
        assert_eq!(store.save(&mut fresh).unwrap(), Saved::Removed);
    }

    #[test]
    fn test_write_failure_keeps_buffer() {
        let tmp = tempdir().unwrap();
        // a file where the year directory should be
        fs::create_dir_all(tmp.path().join("Default")).unwrap();
        fs::write(tmp.path().join("Default/2024"), "not a dir").unwrap();
        let store = store(tmp.path());
        let mut note = Note::new(day(2024, 3, 5));
        note.set_text("precious");
        let err = store.save(&mut note).unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }), "{err}");
        assert_eq!(note.text(), "precious");
        assert!(note.is_dirty());
    }

    #[test]
    fn test_rename_moves_file() {
        let tmp = tempdir().unwrap();
        let store = store(tmp.path());
        let mut note = Note::new(NoteIdentity::titled("Old Title"));
        note.set_text("Old Title\nbody");
        store.save(&mut note).unwrap();

        note.set_text("New Title\nbody");
        store.rename(&mut note, NoteIdentity::titled("New Title")).unwrap();
        assert!(!tmp.path().join("Default/Old Title.txt").exists());
        assert_eq!(
            fs::read_to_string(tmp.path().join("Default/New Title.txt")).unwrap(),
            "New Title\nbody"
        );
        assert_eq!(note.identity(), &NoteIdentity::titled("New Title"));
        assert!(!note.is_dirty());
    }

    #[test]
    fn test_rename_conflict_is_rejected() {
        let tmp = tempdir().unwrap();
        let store = store(tmp.path());
        let mut other = Note::new(NoteIdentity::titled("New Title"));
        other.set_text("New Title\nsomeone else");
        store.save(&mut other).unwrap();

        let mut note = Note::new(NoteIdentity::titled("Old Title"));
        note.set_text("Old Title\nmine");
        store.save(&mut note).unwrap();
        note.set_text("New Title\nmine");

        let err = store
            .rename(&mut note, NoteIdentity::titled("New Title"))
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));
        assert_eq!(note.identity(), &NoteIdentity::titled("Old Title"));
        assert_eq!(note.text(), "New Title\nmine");
        assert_eq!(
            fs::read_to_string(tmp.path().join("Default/New Title.txt")).unwrap(),
            "New Title\nsomeone else"
        );
        assert_eq!(
            fs::read_to_string(tmp.path().join("Default/Old Title.txt")).unwrap(),
            "Old Title\nmine"
        );
    }

    #[test]
    fn test_rename_to_same_identity_is_noop() {
        let tmp = tempdir().unwrap();
        let store = store(tmp.path());
        let mut note = Note::new(NoteIdentity::titled("Same"));
        note.set_text("Same");
        store.save(&mut note).unwrap();
        note.set_text("Same!");
        store.rename(&mut note, NoteIdentity::titled("Same")).unwrap();
        assert!(note.is_dirty());
        assert_eq!(fs::read_to_string(store.path_for(note.identity())).unwrap(), "Same");
    }

    #[test]
    fn test_collection_names() {
        assert!(validate_collection_name("Default").is_ok());
        assert!(validate_collection_name("Work notes").is_ok());
        for bad in ["", ".", "..", ".hidden", "a/b", "/abs"] {
            assert!(validate_collection_name(bad).is_err(), "{bad:?}");
        }
    }

    #[test]
    fn test_list_collections() {
        let tmp = tempdir().unwrap();
        for d in ["Work", "Default", ".git"] {
            fs::create_dir_all(tmp.path().join(d)).unwrap();
        }
        fs::write(tmp.path().join("theme.json"), "{}").unwrap();
        assert_eq!(list_collections(tmp.path()).unwrap(), vec!["Default", "Work"]);
        assert!(list_collections(&tmp.path().join("missing")).unwrap().is_empty());
    }
}
