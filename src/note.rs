use crate::identity::{NoteIdentity, UNTITLED, first_line};

/// In-memory note: its identity, the live edit buffer, and the text as
/// last read from or written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    identity: NoteIdentity,
    text: String,
    loaded_text: String,
}

impl Note {
    pub fn new(identity: NoteIdentity) -> Self {
        Self { identity, text: String::new(), loaded_text: String::new() }
    }

    pub(crate) fn loaded(identity: NoteIdentity, text: String) -> Self {
        Self { identity, loaded_text: text.clone(), text }
    }

    pub fn identity(&self) -> &NoteIdentity {
        &self.identity
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn loaded_text(&self) -> &str {
        &self.loaded_text
    }

    /// Replace the edit buffer. Nothing touches disk until the note is saved.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn is_dirty(&self) -> bool {
        self.text != self.loaded_text
    }

    /// Empty or whitespace-only notes are deleted on save.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Display title: the first line with content.
    pub fn title(&self) -> &str {
        match first_line(&self.text).trim() {
            "" => UNTITLED,
            line => line,
        }
    }

    pub(crate) fn mark_saved(&mut self) {
        self.loaded_text.clone_from(&self.text);
    }

    pub(crate) fn set_identity(&mut self, identity: NoteIdentity) {
        self.identity = identity;
    }
}
