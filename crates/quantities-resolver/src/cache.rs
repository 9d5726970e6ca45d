//! Resolution cache keyed by chain fingerprints.
//!
//! An entry is reused only while the fingerprint of the declaration, every
//! ancestor and the chain end is unchanged. Editing any ancestor changes the
//! fingerprint of all its descendants, which invalidates them.

use rustc_hash::{FxHashMap, FxHashSet};

use quantities_core::{Fingerprint, ScalarProperties, TypeIdentity, VectorProperties};

use crate::passes::ChainOutcome;

/// Chain outcomes of one kind, by identity.
#[derive(Debug, Clone)]
pub struct ChainCache<P> {
    entries: FxHashMap<TypeIdentity, ChainOutcome<P>>,
}

impl<P> Default for ChainCache<P> {
    fn default() -> Self {
        Self {
            entries: FxHashMap::default(),
        }
    }
}

impl<P> ChainCache<P> {
    /// The cached outcome, if it was computed for the same fingerprint.
    pub fn lookup(&self, identity: &TypeIdentity, fingerprint: Fingerprint) -> Option<&ChainOutcome<P>> {
        self.entries
            .get(identity)
            .filter(|outcome| outcome.fingerprint == fingerprint)
    }

    pub fn store(&mut self, identity: TypeIdentity, outcome: ChainOutcome<P>) {
        self.entries.insert(identity, outcome);
    }

    /// Drop entries for identities no longer declared.
    pub fn retain(&mut self, live: &FxHashSet<TypeIdentity>) {
        self.entries.retain(|identity, _| live.contains(identity));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Chain caches of the three specializable kinds.
#[derive(Debug, Clone, Default)]
pub struct ResolutionCache {
    pub scalars: ChainCache<ScalarProperties>,
    pub vectors: ChainCache<VectorProperties>,
    pub groups: ChainCache<VectorProperties>,
}

impl ResolutionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.scalars.len() + self.vectors.len() + self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.scalars.clear();
        self.vectors.clear();
        self.groups.clear();
    }

    pub fn retain(&mut self, live: &FxHashSet<TypeIdentity>) {
        self.scalars.retain(live);
        self.vectors.retain(live);
        self.groups.retain(live);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quantities_core::Status;

    fn outcome(fingerprint: u64) -> ChainOutcome<ScalarProperties> {
        ChainOutcome {
            properties: ScalarProperties::default(),
            status: Status::Resolved,
            fingerprint: Fingerprint(fingerprint),
            diagnostics: Vec::new(),
        }
    }

    #[test]
    fn lookup_requires_matching_fingerprint() {
        let mut cache = ChainCache::default();
        let length = TypeIdentity::global("Length");
        cache.store(length.clone(), outcome(1));

        assert!(cache.lookup(&length, Fingerprint(1)).is_some());
        assert!(cache.lookup(&length, Fingerprint(2)).is_none());
        assert!(cache.lookup(&TypeIdentity::global("Time"), Fingerprint(1)).is_none());
    }

    #[test]
    fn retain_drops_dead_identities() {
        let mut cache = ResolutionCache::new();
        cache.scalars.store(TypeIdentity::global("Length"), outcome(1));
        cache.scalars.store(TypeIdentity::global("Time"), outcome(2));

        let mut live = FxHashSet::default();
        live.insert(TypeIdentity::global("Time"));
        cache.retain(&live);
        assert_eq!(cache.len(), 1);
    }
}
