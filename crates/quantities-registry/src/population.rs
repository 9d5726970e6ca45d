//! Identity-indexed, insertion-ordered storage.

use rustc_hash::FxHashMap;

use quantities_core::{Identified, TypeIdentity};

/// Map from [`TypeIdentity`] to an entry, iterated in insertion order.
///
/// Insertion order is kept so that every pass over a population is
/// deterministic for a given input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Population<T> {
    entries: Vec<T>,
    index: FxHashMap<TypeIdentity, usize>,
}

impl<T> Default for Population<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: FxHashMap::default(),
        }
    }
}

impl<T: Identified> Population<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry if its identity is free.
    ///
    /// On collision the existing entry is kept and the rejected one is
    /// handed back.
    pub fn insert(&mut self, entry: T) -> Result<(), T> {
        if self.index.contains_key(entry.identity()) {
            return Err(entry);
        }
        self.index
            .insert(entry.identity().clone(), self.entries.len());
        self.entries.push(entry);
        Ok(())
    }

    /// Insert or replace in place, keeping the original position.
    pub fn upsert(&mut self, entry: T) -> Option<T> {
        match self.index.get(entry.identity()) {
            Some(&slot) => Some(std::mem::replace(&mut self.entries[slot], entry)),
            None => {
                self.index
                    .insert(entry.identity().clone(), self.entries.len());
                self.entries.push(entry);
                None
            }
        }
    }

    pub fn get(&self, identity: &TypeIdentity) -> Option<&T> {
        self.index.get(identity).map(|&slot| &self.entries[slot])
    }

    pub fn contains(&self, identity: &TypeIdentity) -> bool {
        self.index.contains_key(identity)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.entries.iter()
    }

    pub fn identities(&self) -> impl Iterator<Item = &TypeIdentity> {
        self.entries.iter().map(Identified::identity)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a, T> IntoIterator for &'a Population<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl<T> IntoIterator for Population<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
