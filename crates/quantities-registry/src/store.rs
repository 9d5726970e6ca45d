//! The resolved population store.
//!
//! Holds every resolved entry keyed by identity, local and foreign alike. A
//! foreign declaration source hands over a store of the same shape.

use std::fmt;

use quantities_core::{
    DeclarationKind, Origin, ResolvedGroup, ResolvedScalar, ResolvedUnit, ResolvedVector,
    TypeIdentity,
};

use crate::Population;

/// Resolved entries by namespace. Group members live in `vectors`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedStore {
    pub units: Population<ResolvedUnit>,
    pub scalars: Population<ResolvedScalar>,
    pub vectors: Population<ResolvedVector>,
    pub groups: Population<ResolvedGroup>,
}

impl ResolvedStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unit(&self, identity: &TypeIdentity) -> Option<&ResolvedUnit> {
        self.units.get(identity)
    }

    pub fn scalar(&self, identity: &TypeIdentity) -> Option<&ResolvedScalar> {
        self.scalars.get(identity)
    }

    /// A vector or group member.
    pub fn vector(&self, identity: &TypeIdentity) -> Option<&ResolvedVector> {
        self.vectors.get(identity)
    }

    pub fn group(&self, identity: &TypeIdentity) -> Option<&ResolvedGroup> {
        self.groups.get(identity)
    }

    pub fn vector_kind(&self, identity: &TypeIdentity) -> Option<DeclarationKind> {
        if let Some(vector) = self.vectors.get(identity) {
            Some(if vector.is_member() {
                DeclarationKind::GroupMember
            } else {
                DeclarationKind::Vector
            })
        } else {
            self.groups
                .contains(identity)
                .then_some(DeclarationKind::VectorGroup)
        }
    }

    pub fn kind_of(&self, identity: &TypeIdentity) -> Option<DeclarationKind> {
        if self.scalars.contains(identity) {
            Some(DeclarationKind::Scalar)
        } else if let Some(kind) = self.vector_kind(identity) {
            Some(kind)
        } else {
            self.units
                .contains(identity)
                .then_some(DeclarationKind::Unit)
        }
    }

    pub fn len(&self) -> usize {
        self.units.len() + self.scalars.len() + self.vectors.len() + self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every identity in the store, namespace by namespace.
    pub fn identities(&self) -> impl Iterator<Item = &TypeIdentity> {
        self.units
            .identities()
            .chain(self.scalars.identities())
            .chain(self.vectors.identities())
            .chain(self.groups.identities())
    }

    pub fn stats(&self) -> ResolutionStats {
        ResolutionStats::from(self)
    }
}

/// Outcome counts over a resolved store.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ResolutionStats {
    pub units: usize,
    pub scalars: usize,
    pub vectors: usize,
    pub groups: usize,
    pub broken: usize,
    pub foreign: usize,
    /// Property slots filled from an ancestor or group.
    pub inherited_properties: usize,
}

impl From<&ResolvedStore> for ResolutionStats {
    fn from(store: &ResolvedStore) -> Self {
        let mut stats = ResolutionStats {
            units: store.units.len(),
            scalars: store.scalars.len(),
            vectors: store.vectors.len(),
            groups: store.groups.len(),
            ..Default::default()
        };

        stats.foreign = store
            .units
            .iter()
            .filter(|u| u.origin == Origin::Foreign)
            .count();

        for scalar in &store.scalars {
            stats.broken += usize::from(scalar.is_broken());
            stats.foreign += usize::from(scalar.origin == Origin::Foreign);
            stats.inherited_properties += scalar.properties.inherited_count();
        }
        for vector in &store.vectors {
            stats.broken += usize::from(vector.is_broken());
            stats.foreign += usize::from(vector.origin == Origin::Foreign);
            stats.inherited_properties += vector.properties.inherited_count();
        }
        for group in &store.groups {
            stats.broken += usize::from(group.is_broken());
            stats.foreign += usize::from(group.origin == Origin::Foreign);
            stats.inherited_properties += group.properties.inherited_count();
        }
        stats
    }
}

impl fmt::Display for ResolutionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Resolution: {} units, {} scalars, {} vectors, {} groups ({} broken, {} foreign), \
             {} inherited properties",
            self.units,
            self.scalars,
            self.vectors,
            self.groups,
            self.broken,
            self.foreign,
            self.inherited_properties
        )
    }
}
