//! Read-only name directory over local declarations and resolved entries.
//!
//! Lookups consult the local populations first, then the resolved store
//! (foreign entries, resolved units, and entries kept from an earlier pass).

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;

use quantities_core::{
    DeclarationKind, ResolvedUnit, ResolvedVector, Shape, TypeIdentity, VectorProperties,
};
use quantities_registry::{Populations, ResolvedStore};

use crate::passes::ChainOutcome;

static NO_MEMBERS: BTreeMap<u32, TypeIdentity> = BTreeMap::new();

#[derive(Clone, Copy)]
pub struct Directory<'a> {
    populations: &'a Populations,
    store: &'a ResolvedStore,
    vector_chains: Option<&'a FxHashMap<TypeIdentity, ChainOutcome<VectorProperties>>>,
}

impl<'a> Directory<'a> {
    pub fn new(populations: &'a Populations, store: &'a ResolvedStore) -> Self {
        Self {
            populations,
            store,
            vector_chains: None,
        }
    }

    /// Use chain outcomes of local vectors for dimension lookups.
    pub fn with_vector_chains(
        mut self,
        chains: &'a FxHashMap<TypeIdentity, ChainOutcome<VectorProperties>>,
    ) -> Self {
        self.vector_chains = Some(chains);
        self
    }

    pub fn populations(&self) -> &'a Populations {
        self.populations
    }

    pub fn store(&self) -> &'a ResolvedStore {
        self.store
    }

    /// A resolved unit. The unit pass has run, so local units are in the store.
    pub fn unit(&self, identity: &TypeIdentity) -> Option<&'a ResolvedUnit> {
        self.store.unit(identity)
    }

    pub fn unit_kind(&self, identity: &TypeIdentity) -> Option<DeclarationKind> {
        self.populations.unit_kind(identity).or_else(|| {
            self.store
                .units
                .contains(identity)
                .then_some(DeclarationKind::Unit)
        })
    }

    pub fn scalar_kind(&self, identity: &TypeIdentity) -> Option<DeclarationKind> {
        self.populations.scalar_kind(identity).or_else(|| {
            self.store
                .scalars
                .contains(identity)
                .then_some(DeclarationKind::Scalar)
        })
    }

    pub fn vector_kind(&self, identity: &TypeIdentity) -> Option<DeclarationKind> {
        self.populations
            .vector_kind(identity)
            .or_else(|| self.store.vector_kind(identity))
    }

    /// Kind of any entry with this identity, scalars first.
    pub fn kind_of(&self, identity: &TypeIdentity) -> Option<DeclarationKind> {
        self.scalar_kind(identity)
            .or_else(|| self.vector_kind(identity))
            .or_else(|| self.unit_kind(identity))
    }

    /// Dimension of a vector or group member.
    pub fn vector_dimension(&self, identity: &TypeIdentity) -> Option<u32> {
        if let Some(outcome) = self.vector_chains.and_then(|chains| chains.get(identity)) {
            return outcome.properties.dimension.value().copied();
        }
        if let Some(member) = self.populations.members.get(identity) {
            return Some(member.dimension);
        }
        if let Some(Shape::Base(definition)) = self.populations.vectors.get(identity).map(|v| &v.shape) {
            return Some(definition.dimension);
        }
        self.store.vector(identity).and_then(ResolvedVector::dimension)
    }

    /// Members of a group by dimension; `None` if `identity` is not a group.
    pub fn group_members(&self, identity: &TypeIdentity) -> Option<&'a BTreeMap<u32, TypeIdentity>> {
        if self.populations.groups.contains(identity) {
            return Some(self.populations.members_of(identity).unwrap_or(&NO_MEMBERS));
        }
        self.store.group(identity).map(|group| &group.members)
    }
}
