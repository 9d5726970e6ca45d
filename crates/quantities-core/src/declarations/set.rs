//! The flat input collections handed over by the declaration extractor.
//!
//! A [`DeclarationSet`] holds the five order-stable lists the population
//! builder consumes. Input order matters: on an identity collision the
//! first-seen entry wins.

use super::{
    GroupDeclaration, GroupMemberDeclaration, ScalarDeclaration, UnitDeclaration,
    VectorDeclaration,
};
use crate::TypeIdentity;

/// Raw declarations of one compilation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeclarationSet {
    /// Unit declarations.
    pub units: Vec<UnitDeclaration>,
    /// Scalar bases and specializations.
    pub scalars: Vec<ScalarDeclaration>,
    /// Vector bases and specializations.
    pub vectors: Vec<VectorDeclaration>,
    /// Vector group bases and specializations.
    pub groups: Vec<GroupDeclaration>,
    /// Vector group members.
    pub members: Vec<GroupMemberDeclaration>,
}

impl DeclarationSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_unit(&mut self, unit: UnitDeclaration) {
        self.units.push(unit);
    }

    pub fn add_scalar(&mut self, scalar: ScalarDeclaration) {
        self.scalars.push(scalar);
    }

    pub fn add_vector(&mut self, vector: VectorDeclaration) {
        self.vectors.push(vector);
    }

    pub fn add_group(&mut self, group: GroupDeclaration) {
        self.groups.push(group);
    }

    pub fn add_member(&mut self, member: GroupMemberDeclaration) {
        self.members.push(member);
    }

    pub fn with_unit(mut self, unit: UnitDeclaration) -> Self {
        self.add_unit(unit);
        self
    }

    pub fn with_scalar(mut self, scalar: ScalarDeclaration) -> Self {
        self.add_scalar(scalar);
        self
    }

    pub fn with_vector(mut self, vector: VectorDeclaration) -> Self {
        self.add_vector(vector);
        self
    }

    pub fn with_group(mut self, group: GroupDeclaration) -> Self {
        self.add_group(group);
        self
    }

    pub fn with_member(mut self, member: GroupMemberDeclaration) -> Self {
        self.add_member(member);
        self
    }

    /// Total number of declarations across all five collections.
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

    /// All declared identities, in input order, collection by collection.
    pub fn all_identities(&self) -> impl Iterator<Item = &TypeIdentity> {
        self.units
            .iter()
            .map(|u| &u.identity)
            .chain(self.scalars.iter().map(|s| &s.identity))
            .chain(self.vectors.iter().map(|v| &v.identity))
            .chain(self.groups.iter().map(|g| &g.identity))
            .chain(self.members.iter().map(|m| &m.identity))
    }

    /// Append another set after this one.
    ///
    /// Used when one pass collects declarations from several sources.
    pub fn merge(&mut self, other: DeclarationSet) {
        self.units.extend(other.units);
        self.scalars.extend(other.scalars);
        self.vectors.extend(other.vectors);
        self.groups.extend(other.groups);
        self.members.extend(other.members);
    }
}

/// Declaration counts per kind.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DeclarationStats {
    pub units: usize,
    pub unit_instances: usize,
    pub scalar_bases: usize,
    pub scalar_specializations: usize,
    pub vector_bases: usize,
    pub vector_specializations: usize,
    pub groups: usize,
    pub members: usize,
}

impl From<&DeclarationSet> for DeclarationStats {
    fn from(set: &DeclarationSet) -> Self {
        let scalar_bases = set.scalars.iter().filter(|s| s.shape.is_base()).count();
        let vector_bases = set.vectors.iter().filter(|v| v.shape.is_base()).count();
        Self {
            units: set.units.len(),
            unit_instances: set.units.iter().map(|u| u.instances.len()).sum(),
            scalar_bases,
            scalar_specializations: set.scalars.len() - scalar_bases,
            vector_bases,
            vector_specializations: set.vectors.len() - vector_bases,
            groups: set.groups.len(),
            members: set.members.len(),
        }
    }
}

impl std::fmt::Display for DeclarationStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Declarations: {} units ({} instances), {} scalars ({} specialized), \
             {} vectors ({} specialized), {} groups, {} members",
            self.units,
            self.unit_instances,
            self.scalar_bases + self.scalar_specializations,
            self.scalar_specializations,
            self.vector_bases + self.vector_specializations,
            self.vector_specializations,
            self.groups,
            self.members
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ScalarDefinition, ScalarProperties, Span, UnitInstance};

    fn length_set() -> DeclarationSet {
        DeclarationSet::new()
            .with_unit(
                UnitDeclaration::new("UnitOfLength", Span::default())
                    .with_instance(UnitInstance::fixed("Metre", "Metres", 1.0)),
            )
            .with_scalar(ScalarDeclaration::base(
                "Length",
                Span::default(),
                ScalarDefinition::new("UnitOfLength"),
            ))
            .with_scalar(ScalarDeclaration::specialization(
                "Distance",
                Span::default(),
                "Length",
                ScalarProperties::new(),
            ))
    }

    #[test]
    fn empty_set() {
        let set = DeclarationSet::new();
        assert!(set.is_empty());
        assert_eq!(DeclarationStats::from(&set), DeclarationStats::default());
    }

    #[test]
    fn identities_follow_input_order() {
        let set = length_set();
        let names: Vec<String> = set.all_identities().map(|i| i.to_string()).collect();
        assert_eq!(names, vec!["UnitOfLength", "Length", "Distance"]);
    }

    #[test]
    fn merge_appends() {
        let mut set = length_set();
        set.merge(length_set());
        assert_eq!(set.len(), 6);
        assert_eq!(set.scalars[2].identity, TypeIdentity::global("Length"));
    }

    #[test]
    fn stats_count_kinds() {
        let stats = DeclarationStats::from(&length_set());
        assert_eq!(stats.units, 1);
        assert_eq!(stats.unit_instances, 1);
        assert_eq!(stats.scalar_bases, 1);
        assert_eq!(stats.scalar_specializations, 1);

        let display = stats.to_string();
        assert!(display.contains("1 units (1 instances)"));
        assert!(display.contains("2 scalars (1 specialized)"));
    }
}
