//! Resolved declarations, the output consumed by code generation.
//!
//! Every slot of a resolved property bag is either `Explicit` (set by the
//! declaration), `Inherited` (filled from the nearest ancestor that sets it)
//! or `Unset` (absent: not generated). Links to other declarations have been
//! checked; a slot that failed to link is `Unset`, never guessed.

use std::collections::BTreeMap;

use crate::{
    DeclarationKind, Identified, ScalarProperties, Span, TypeIdentity, UnitDeclaration, VectorProperties,
};

/// Where a resolved entry was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Origin {
    /// Resolved in this pass.
    #[default]
    Local,
    /// Resolved by another compilation unit and merged in as-is.
    Foreign,
}

/// Terminal resolution state of a declaration.
///
/// ```text
/// Unresolved --first visit--> Resolving --chain complete--> Resolved
///                                 |
///                                 +--cycle / missing ancestor--> Broken
/// ```
///
/// Only the terminal states are stored. A declaration whose chain passes
/// through a broken ancestor is broken as well.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Status {
    #[default]
    Resolved,
    Broken,
}

impl Status {
    pub fn is_broken(self) -> bool {
        self == Status::Broken
    }

    /// Status of a node whose parent has `self`.
    pub fn propagate(self, own: Status) -> Status {
        if self.is_broken() || own.is_broken() {
            Status::Broken
        } else {
            Status::Resolved
        }
    }
}

/// A resolved entry that can act as the parent of a specialization.
pub trait ResolvedEntry: Identified {
    type Properties;

    fn kind(&self) -> DeclarationKind;
    fn properties(&self) -> &Self::Properties;
    fn status(&self) -> Status;
    fn origin(&self) -> Origin;
}

/// A unit with its instance list checked.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedUnit {
    pub declaration: UnitDeclaration,
    /// Bound scalar quantity, if it resolved.
    pub quantity: Option<TypeIdentity>,
    /// Valid instance names, dependencies before dependants.
    pub instances: Vec<String>,
    pub origin: Origin,
}

impl ResolvedUnit {
    pub fn identity(&self) -> &TypeIdentity {
        &self.declaration.identity
    }

    /// Whether `name` is a valid instance of this unit (exact match).
    pub fn has_instance(&self, name: &str) -> bool {
        self.instances.iter().any(|i| i == name)
    }
}

impl Identified for ResolvedUnit {
    fn identity(&self) -> &TypeIdentity {
        &self.declaration.identity
    }

    fn span(&self) -> Span {
        self.declaration.span
    }
}

/// A scalar with every property resolved.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedScalar {
    pub identity: TypeIdentity,
    pub span: Span,
    pub original: Option<TypeIdentity>,
    pub status: Status,
    pub origin: Origin,
    pub properties: ScalarProperties,
    /// The quantity that defines the bound unit, for unit-aware constructors.
    pub unit_quantity: Option<TypeIdentity>,
}

impl ResolvedScalar {
    pub fn unit(&self) -> Option<&TypeIdentity> {
        self.properties.unit.value()
    }

    pub fn is_broken(&self) -> bool {
        self.status.is_broken()
    }
}

impl Identified for ResolvedScalar {
    fn identity(&self) -> &TypeIdentity {
        &self.identity
    }

    fn span(&self) -> Span {
        self.span
    }
}

impl ResolvedEntry for ResolvedScalar {
    type Properties = ScalarProperties;

    fn kind(&self) -> DeclarationKind {
        DeclarationKind::Scalar
    }

    fn properties(&self) -> &ScalarProperties {
        &self.properties
    }

    fn status(&self) -> Status {
        self.status
    }

    fn origin(&self) -> Origin {
        self.origin
    }
}

/// A vector of fixed dimension: base, specialization, or group member.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedVector {
    pub identity: TypeIdentity,
    pub span: Span,
    pub original: Option<TypeIdentity>,
    /// Owning group, for group members.
    pub group: Option<TypeIdentity>,
    pub status: Status,
    pub origin: Origin,
    pub properties: VectorProperties,
}

impl ResolvedVector {
    pub fn unit(&self) -> Option<&TypeIdentity> {
        self.properties.unit.value()
    }

    pub fn dimension(&self) -> Option<u32> {
        self.properties.dimension.value().copied()
    }

    pub fn is_member(&self) -> bool {
        self.group.is_some()
    }

    pub fn is_broken(&self) -> bool {
        self.status.is_broken()
    }
}

impl Identified for ResolvedVector {
    fn identity(&self) -> &TypeIdentity {
        &self.identity
    }

    fn span(&self) -> Span {
        self.span
    }
}

impl ResolvedEntry for ResolvedVector {
    type Properties = VectorProperties;

    fn kind(&self) -> DeclarationKind {
        if self.is_member() {
            DeclarationKind::GroupMember
        } else {
            DeclarationKind::Vector
        }
    }

    fn properties(&self) -> &VectorProperties {
        &self.properties
    }

    fn status(&self) -> Status {
        self.status
    }

    fn origin(&self) -> Origin {
        self.origin
    }
}

/// A resolved vector group and its dimension-keyed members.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedGroup {
    pub identity: TypeIdentity,
    pub span: Span,
    pub original: Option<TypeIdentity>,
    pub status: Status,
    pub origin: Origin,
    pub properties: VectorProperties,
    pub members: BTreeMap<u32, TypeIdentity>,
}

impl ResolvedGroup {
    pub fn member(&self, dimension: u32) -> Option<&TypeIdentity> {
        self.members.get(&dimension)
    }

    pub fn dimensions(&self) -> Vec<u32> {
        self.members.keys().copied().collect()
    }

    pub fn is_broken(&self) -> bool {
        self.status.is_broken()
    }
}

impl Identified for ResolvedGroup {
    fn identity(&self) -> &TypeIdentity {
        &self.identity
    }

    fn span(&self) -> Span {
        self.span
    }
}

impl ResolvedEntry for ResolvedGroup {
    type Properties = VectorProperties;

    fn kind(&self) -> DeclarationKind {
        DeclarationKind::VectorGroup
    }

    fn properties(&self) -> &VectorProperties {
        &self.properties
    }

    fn status(&self) -> Status {
        self.status
    }

    fn origin(&self) -> Origin {
        self.origin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn broken_status_propagates() {
        assert_eq!(Status::Resolved.propagate(Status::Resolved), Status::Resolved);
        assert_eq!(Status::Broken.propagate(Status::Resolved), Status::Broken);
        assert_eq!(Status::Resolved.propagate(Status::Broken), Status::Broken);
    }

    #[test]
    fn group_member_lookup() {
        let mut members = BTreeMap::new();
        members.insert(3, TypeIdentity::global("Position3"));
        members.insert(2, TypeIdentity::global("Position2"));
        let group = ResolvedGroup {
            identity: TypeIdentity::global("Position"),
            span: Span::default(),
            original: None,
            status: Status::Resolved,
            origin: Origin::Local,
            properties: VectorProperties::default(),
            members,
        };
        assert_eq!(group.member(3), Some(&TypeIdentity::global("Position3")));
        assert_eq!(group.member(4), None);
        assert_eq!(group.dimensions(), vec![2, 3]);
    }
}
