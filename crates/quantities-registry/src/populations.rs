//! The three declaration namespaces.
//!
//! ```text
//! units    - UnitDeclaration
//! scalars  - ScalarDeclaration
//! vectors  - VectorDeclaration, GroupDeclaration, GroupMemberDeclaration
//! ```
//!
//! Identities are unique within a namespace. Vectors, groups and group
//! members share one namespace, so a vector and a group cannot have the same
//! identity, while a unit and a scalar can.

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;

use quantities_core::{
    DeclarationKind, GroupDeclaration, GroupMemberDeclaration, Identified, InstanceDefinition,
    ScalarDeclaration, Specializable, TypeIdentity, UnitDeclaration, VectorDeclaration,
};

use crate::Population;

/// Deduplicated raw declarations of one compilation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Populations {
    pub units: Population<UnitDeclaration>,
    pub scalars: Population<ScalarDeclaration>,
    pub vectors: Population<VectorDeclaration>,
    pub groups: Population<GroupDeclaration>,
    pub members: Population<GroupMemberDeclaration>,

    /// group -> (dimension -> member)
    members_by_group: FxHashMap<TypeIdentity, BTreeMap<u32, TypeIdentity>>,

    /// original -> specializations, in insertion order.
    specializations: FxHashMap<TypeIdentity, Vec<TypeIdentity>>,

    /// referenced identity -> declarations naming it, in insertion order.
    referrers: FxHashMap<TypeIdentity, Vec<TypeIdentity>>,
}

impl Populations {
    pub fn new() -> Self {
        Self::default()
    }

    // ==========================================================================
    // Insertion (first-seen wins)
    // ==========================================================================

    pub fn insert_unit(&mut self, unit: UnitDeclaration) -> Result<(), UnitDeclaration> {
        let identity = unit.identity.clone();
        let references: Vec<TypeIdentity> = unit
            .quantity
            .iter()
            .chain(unit.instances.iter().flat_map(|instance| match &instance.definition {
                InstanceDefinition::Derived { operands } => {
                    operands.iter().map(|op| &op.unit).collect::<Vec<_>>()
                }
                _ => Vec::new(),
            }))
            .cloned()
            .collect();
        self.units.insert(unit)?;
        self.record_references(&identity, references);
        Ok(())
    }

    pub fn insert_scalar(&mut self, scalar: ScalarDeclaration) -> Result<(), ScalarDeclaration> {
        let original = scalar.original().cloned();
        let identity = scalar.identity.clone();
        let references: Vec<TypeIdentity> = scalar.references().into_iter().cloned().collect();
        self.scalars.insert(scalar)?;
        self.record_references(&identity, references);
        self.record_specialization(original, identity);
        Ok(())
    }

    pub fn insert_vector(&mut self, vector: VectorDeclaration) -> Result<(), VectorDeclaration> {
        if self.vector_kind(&vector.identity).is_some() {
            return Err(vector);
        }
        let original = vector.original().cloned();
        let identity = vector.identity.clone();
        let references: Vec<TypeIdentity> = vector.references().into_iter().cloned().collect();
        self.vectors.insert(vector)?;
        self.record_references(&identity, references);
        self.record_specialization(original, identity);
        Ok(())
    }

    pub fn insert_group(&mut self, group: GroupDeclaration) -> Result<(), GroupDeclaration> {
        if self.vector_kind(&group.identity).is_some() {
            return Err(group);
        }
        let original = group.original().cloned();
        let identity = group.identity.clone();
        let references: Vec<TypeIdentity> = group.references().into_iter().cloned().collect();
        self.groups.insert(group)?;
        self.record_references(&identity, references);
        self.record_specialization(original, identity);
        Ok(())
    }

    /// Insert a member and index it under its group.
    ///
    /// The caller checks the (group, dimension) slot first, see [`Self::member_at`].
    pub fn insert_member(
        &mut self,
        member: GroupMemberDeclaration,
    ) -> Result<(), GroupMemberDeclaration> {
        if self.vector_kind(&member.identity).is_some() {
            return Err(member);
        }
        let group = member.group.clone();
        let dimension = member.dimension;
        let identity = member.identity.clone();
        let references: Vec<TypeIdentity> = member.references().into_iter().cloned().collect();
        self.members.insert(member)?;
        self.record_references(&identity, references);
        self.members_by_group
            .entry(group)
            .or_default()
            .entry(dimension)
            .or_insert(identity);
        Ok(())
    }

    fn record_references(&mut self, identity: &TypeIdentity, references: Vec<TypeIdentity>) {
        for target in references {
            let referrers = self.referrers.entry(target).or_default();
            // one declaration can name the same target in several slots
            if referrers.last() != Some(identity) {
                referrers.push(identity.clone());
            }
        }
    }

    fn record_specialization(&mut self, original: Option<TypeIdentity>, identity: TypeIdentity) {
        if let Some(original) = original {
            self.specializations
                .entry(original)
                .or_default()
                .push(identity);
        }
    }

    // ==========================================================================
    // Lookup
    // ==========================================================================

    pub fn unit_kind(&self, identity: &TypeIdentity) -> Option<DeclarationKind> {
        self.units
            .contains(identity)
            .then_some(DeclarationKind::Unit)
    }

    pub fn scalar_kind(&self, identity: &TypeIdentity) -> Option<DeclarationKind> {
        self.scalars
            .contains(identity)
            .then_some(DeclarationKind::Scalar)
    }

    /// Kind of an entry of the vector namespace.
    pub fn vector_kind(&self, identity: &TypeIdentity) -> Option<DeclarationKind> {
        if self.vectors.contains(identity) {
            Some(DeclarationKind::Vector)
        } else if self.groups.contains(identity) {
            Some(DeclarationKind::VectorGroup)
        } else if self.members.contains(identity) {
            Some(DeclarationKind::GroupMember)
        } else {
            None
        }
    }

    /// Kind of any declaration with this identity, scalars first.
    pub fn kind_of(&self, identity: &TypeIdentity) -> Option<DeclarationKind> {
        self.scalar_kind(identity)
            .or_else(|| self.vector_kind(identity))
            .or_else(|| self.unit_kind(identity))
    }

    pub fn contains(&self, identity: &TypeIdentity) -> bool {
        self.kind_of(identity).is_some()
    }

    /// Members of a group, keyed by dimension.
    pub fn members_of(&self, group: &TypeIdentity) -> Option<&BTreeMap<u32, TypeIdentity>> {
        self.members_by_group.get(group)
    }

    pub fn member_at(&self, group: &TypeIdentity, dimension: u32) -> Option<&TypeIdentity> {
        self.members_by_group
            .get(group)
            .and_then(|members| members.get(&dimension))
    }

    /// Declarations whose original is `identity`.
    pub fn specializations_of(&self, identity: &TypeIdentity) -> &[TypeIdentity] {
        self.specializations
            .get(identity)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Declarations that must be re-resolved when `identity` changes:
    /// its specializations and, for a group, its members.
    pub fn dependents_of(&self, identity: &TypeIdentity) -> impl Iterator<Item = &TypeIdentity> {
        self.specializations_of(identity).iter().chain(
            self.members_of(identity)
                .into_iter()
                .flat_map(|members| members.values()),
        )
    }

    /// Local declarations that name `identity` anywhere in their data.
    pub fn referrers_of(&self, identity: &TypeIdentity) -> &[TypeIdentity] {
        self.referrers
            .get(identity)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.units.len()
            + self.scalars.len()
            + self.vectors.len()
            + self.groups.len()
            + self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quantities_core::{
        GroupDefinition, ScalarDefinition, ScalarProperties, Span, VectorDefinition,
    };

    fn id(name: &str) -> TypeIdentity {
        TypeIdentity::global(name)
    }

    #[test]
    fn vector_namespace_is_shared() {
        let mut populations = Populations::new();
        populations
            .insert_vector(VectorDeclaration::base(
                "Position",
                Span::default(),
                VectorDefinition::new("UnitOfLength", 3),
            ))
            .unwrap();

        let clash = GroupDeclaration::base(
            "Position",
            Span::default(),
            GroupDefinition::new("UnitOfLength"),
        );
        assert!(populations.insert_group(clash).is_err());
        assert_eq!(
            populations.vector_kind(&id("Position")),
            Some(DeclarationKind::Vector)
        );
    }

    #[test]
    fn unit_and_scalar_may_share_identity() {
        let mut populations = Populations::new();
        populations
            .insert_unit(UnitDeclaration::new("Metre", Span::default()))
            .unwrap();
        populations
            .insert_scalar(ScalarDeclaration::base(
                "Metre",
                Span::default(),
                ScalarDefinition::new("Metre"),
            ))
            .unwrap();
        assert_eq!(populations.kind_of(&id("Metre")), Some(DeclarationKind::Scalar));
        assert_eq!(populations.unit_kind(&id("Metre")), Some(DeclarationKind::Unit));
    }

    #[test]
    fn members_are_indexed_by_dimension() {
        let mut populations = Populations::new();
        for dimension in [3, 2] {
            populations
                .insert_member(GroupMemberDeclaration::new(
                    format!("Position{}", dimension),
                    Span::default(),
                    "Position",
                    dimension,
                ))
                .unwrap();
        }
        let dims: Vec<u32> = populations
            .members_of(&id("Position"))
            .unwrap()
            .keys()
            .copied()
            .collect();
        assert_eq!(dims, vec![2, 3]);
        assert_eq!(populations.member_at(&id("Position"), 3), Some(&id("Position3")));
        assert_eq!(populations.member_at(&id("Position"), 4), None);
    }

    #[test]
    fn dependents_cover_specializations_and_members() {
        let mut populations = Populations::new();
        populations
            .insert_scalar(ScalarDeclaration::specialization(
                "Distance",
                Span::default(),
                "Length",
                ScalarProperties::new(),
            ))
            .unwrap();
        populations
            .insert_member(GroupMemberDeclaration::new(
                "Length2",
                Span::default(),
                "Length",
                2,
            ))
            .unwrap();

        let dependents: Vec<&TypeIdentity> = populations.dependents_of(&id("Length")).collect();
        assert_eq!(dependents, vec![&id("Distance"), &id("Length2")]);
    }

    #[test]
    fn referrers_are_indexed_across_namespaces() {
        let mut populations = Populations::new();
        populations
            .insert_unit(UnitDeclaration::new("UnitOfLength", Span::default()).with_quantity("Length"))
            .unwrap();
        populations
            .insert_scalar(ScalarDeclaration::base(
                "Area",
                Span::default(),
                ScalarDefinition::new("UnitOfArea").with_power(
                    quantities_core::PowerRelation::SquareRoot,
                    "Length",
                ),
            ))
            .unwrap();

        assert_eq!(
            populations.referrers_of(&id("Length")),
            &[id("UnitOfLength"), id("Area")]
        );
        assert!(populations.referrers_of(&id("Area")).is_empty());
    }
}
