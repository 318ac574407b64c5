//! Search result sets and how successive searches refine them.
//!
//! Sets combine by [`NoteIdentity`] equality, never by path.

use crate::identity::NoteIdentity;
use std::cmp::Ordering;
use std::collections::HashSet;

/// How a fresh search result is combined with the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refinement {
    /// Union.
    Widen,
    /// Intersection.
    Narrow,
    /// Difference: drop what the fresh search found.
    Exclude,
}

impl Refinement {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "widen" | "or" => Some(Self::Widen),
            "narrow" | "and" => Some(Self::Narrow),
            "exclude" | "not" => Some(Self::Exclude),
            _ => None,
        }
    }

    pub fn apply(self, current: &ResultSet, fresh: &ResultSet) -> ResultSet {
        match self {
            Self::Widen => current.widen(fresh),
            Self::Narrow => current.narrow(fresh),
            Self::Exclude => current.exclude(fresh),
        }
    }
}

/// Ordered, duplicate-free list of note identities.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultSet {
    items: Vec<NoteIdentity>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&NoteIdentity> {
        self.items.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, NoteIdentity> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[NoteIdentity] {
        &self.items
    }

    pub fn contains(&self, identity: &NoteIdentity) -> bool {
        self.items.contains(identity)
    }

    /// Appends `identity` unless already present.
    pub fn push(&mut self, identity: NoteIdentity) -> bool {
        if self.contains(&identity) {
            return false;
        }
        self.items.push(identity);
        true
    }

    /// Swap `old` for `new` in place, after a note was renamed.
    pub fn rename(&mut self, old: &NoteIdentity, new: NoteIdentity) {
        if self.contains(&new) {
            self.items.retain(|id| id != old);
        } else if let Some(slot) = self.items.iter_mut().find(|id| *id == old) {
            *slot = new;
        }
    }

    /// Drops `identity` if present.
    pub fn remove(&mut self, identity: &NoteIdentity) {
        self.items.retain(|id| id != identity);
    }

    /// `self ∪ other`: this set's order, then `other`'s new members.
    /// An empty `other` leaves the set unchanged.
    pub fn widen(&self, other: &ResultSet) -> ResultSet {
        let mut out = self.clone();
        for id in other {
            out.push(id.clone());
        }
        out
    }

    /// `self ∩ other`, in this set's order. An empty `other` carries no
    /// information and leaves the set unchanged.
    pub fn narrow(&self, other: &ResultSet) -> ResultSet {
        if other.is_empty() {
            return self.clone();
        }
        let keep: HashSet<&NoteIdentity> = other.iter().collect();
        self.filtered(|id| keep.contains(id))
    }

    /// `self \ other`, in this set's order.
    pub fn exclude(&self, other: &ResultSet) -> ResultSet {
        if other.is_empty() {
            return self.clone();
        }
        let drop: HashSet<&NoteIdentity> = other.iter().collect();
        self.filtered(|id| !drop.contains(id))
    }

    fn filtered(&self, keep: impl Fn(&NoteIdentity) -> bool) -> ResultSet {
        Self { items: self.items.iter().filter(|id| keep(id)).cloned().collect() }
    }

    /// Stable sort putting dated notes first, oldest first. Undated notes
    /// keep their relative order after them.
    pub fn sort_by_date(&mut self) {
        self.items.sort_by(|a, b| match (a.date(), b.date()) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
    }
}

impl FromIterator<NoteIdentity> for ResultSet {
    fn from_iter<I: IntoIterator<Item = NoteIdentity>>(iter: I) -> Self {
        let mut set = ResultSet::new();
        for id in iter {
            set.push(id);
        }
        set
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a NoteIdentity;
    type IntoIter = std::slice::Iter<'a, NoteIdentity>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl IntoIterator for ResultSet {
    type Item = NoteIdentity;
    type IntoIter = std::vec::IntoIter<NoteIdentity>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}
