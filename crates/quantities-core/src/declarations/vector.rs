//! Vector, vector group and group member declarations.

use super::{Identified, Inheritable, InstanceSelection, Shape, Specializable};
use crate::{Property, Span, TypeIdentity};

/// Fully defined properties of a base vector.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VectorDefinition {
    pub unit: TypeIdentity,
    /// Scalar type of the components.
    pub scalar: Option<TypeIdentity>,
    pub dimension: u32,
    pub implement_sum: bool,
    pub implement_difference: bool,
    /// Vector or vector group; `None` means the vector itself.
    pub difference: Option<TypeIdentity>,
    pub default_unit_instance: Option<String>,
    pub unit_instances: InstanceSelection,
    pub generate_documentation: bool,
}

impl VectorDefinition {
    pub fn new(unit: impl Into<TypeIdentity>, dimension: u32) -> Self {
        Self {
            unit: unit.into(),
            scalar: None,
            dimension,
            implement_sum: true,
            implement_difference: true,
            difference: None,
            default_unit_instance: None,
            unit_instances: InstanceSelection::All,
            generate_documentation: true,
        }
    }

    pub fn with_scalar(mut self, scalar: impl Into<TypeIdentity>) -> Self {
        self.scalar = Some(scalar.into());
        self
    }

    pub fn with_difference(mut self, difference: impl Into<TypeIdentity>) -> Self {
        self.difference = Some(difference.into());
        self
    }

    pub fn without_difference(mut self) -> Self {
        self.implement_difference = false;
        self
    }

    pub fn with_default_unit_instance(mut self, instance: impl Into<String>) -> Self {
        self.default_unit_instance = Some(instance.into());
        self
    }

    pub fn with_unit_instances(mut self, selection: InstanceSelection) -> Self {
        self.unit_instances = selection;
        self
    }
}

/// Fully defined properties of a base vector group.
///
/// Same as [`VectorDefinition`] without a dimension: each member fixes its own.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupDefinition {
    pub unit: TypeIdentity,
    pub scalar: Option<TypeIdentity>,
    pub implement_sum: bool,
    pub implement_difference: bool,
    /// Vector group; `None` means the group itself.
    pub difference: Option<TypeIdentity>,
    pub default_unit_instance: Option<String>,
    pub unit_instances: InstanceSelection,
    pub generate_documentation: bool,
}

impl GroupDefinition {
    pub fn new(unit: impl Into<TypeIdentity>) -> Self {
        Self {
            unit: unit.into(),
            scalar: None,
            implement_sum: true,
            implement_difference: true,
            difference: None,
            default_unit_instance: None,
            unit_instances: InstanceSelection::All,
            generate_documentation: true,
        }
    }

    pub fn with_scalar(mut self, scalar: impl Into<TypeIdentity>) -> Self {
        self.scalar = Some(scalar.into());
        self
    }

    pub fn with_difference(mut self, difference: impl Into<TypeIdentity>) -> Self {
        self.difference = Some(difference.into());
        self
    }

    pub fn with_default_unit_instance(mut self, instance: impl Into<String>) -> Self {
        self.default_unit_instance = Some(instance.into());
        self
    }
}

/// Tri-state property bag shared by vectors, groups and group members.
///
/// `dimension` is never set for a group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct VectorProperties {
    pub unit: Property<TypeIdentity>,
    pub scalar: Property<Option<TypeIdentity>>,
    pub dimension: Property<u32>,
    pub implement_sum: Property<bool>,
    pub implement_difference: Property<bool>,
    pub difference: Property<Option<TypeIdentity>>,
    pub default_unit_instance: Property<Option<String>>,
    pub unit_instances: Property<InstanceSelection>,
    pub generate_documentation: Property<bool>,
}

impl VectorProperties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_unit(mut self, unit: impl Into<TypeIdentity>) -> Self {
        self.unit = Property::Explicit(unit.into());
        self
    }

    pub fn with_scalar(mut self, scalar: Option<TypeIdentity>) -> Self {
        self.scalar = Property::Explicit(scalar);
        self
    }

    pub fn with_dimension(mut self, dimension: u32) -> Self {
        self.dimension = Property::Explicit(dimension);
        self
    }

    pub fn with_sum(mut self, enabled: bool) -> Self {
        self.implement_sum = Property::Explicit(enabled);
        self
    }

    pub fn with_implement_difference(mut self, enabled: bool) -> Self {
        self.implement_difference = Property::Explicit(enabled);
        self
    }

    pub fn with_difference(mut self, difference: Option<TypeIdentity>) -> Self {
        self.difference = Property::Explicit(difference);
        self
    }

    pub fn with_default_unit_instance(mut self, instance: impl Into<String>) -> Self {
        self.default_unit_instance = Property::Explicit(Some(instance.into()));
        self
    }

    pub fn with_unit_instances(mut self, selection: InstanceSelection) -> Self {
        self.unit_instances = Property::Explicit(selection);
        self
    }

    pub fn with_documentation(mut self, enabled: bool) -> Self {
        self.generate_documentation = Property::Explicit(enabled);
        self
    }

    pub fn inherited_count(&self) -> usize {
        [
            self.unit.is_inherited(),
            self.scalar.is_inherited(),
            self.dimension.is_inherited(),
            self.implement_sum.is_inherited(),
            self.implement_difference.is_inherited(),
            self.difference.is_inherited(),
            self.default_unit_instance.is_inherited(),
            self.unit_instances.is_inherited(),
            self.generate_documentation.is_inherited(),
        ]
        .iter()
        .filter(|inherited| **inherited)
        .count()
    }

    /// Identities named by the set slots.
    pub fn references(&self) -> impl Iterator<Item = &TypeIdentity> {
        self.unit
            .value()
            .into_iter()
            .chain(self.scalar.flatten())
            .chain(self.difference.flatten())
    }
}

impl From<VectorDefinition> for VectorProperties {
    fn from(def: VectorDefinition) -> Self {
        Self {
            unit: Property::Explicit(def.unit),
            scalar: Property::Explicit(def.scalar),
            dimension: Property::Explicit(def.dimension),
            implement_sum: Property::Explicit(def.implement_sum),
            implement_difference: Property::Explicit(def.implement_difference),
            difference: Property::Explicit(def.difference),
            default_unit_instance: Property::Explicit(def.default_unit_instance),
            unit_instances: Property::Explicit(def.unit_instances),
            generate_documentation: Property::Explicit(def.generate_documentation),
        }
    }
}

impl From<GroupDefinition> for VectorProperties {
    fn from(def: GroupDefinition) -> Self {
        Self {
            unit: Property::Explicit(def.unit),
            scalar: Property::Explicit(def.scalar),
            dimension: Property::Unset,
            implement_sum: Property::Explicit(def.implement_sum),
            implement_difference: Property::Explicit(def.implement_difference),
            difference: Property::Explicit(def.difference),
            default_unit_instance: Property::Explicit(def.default_unit_instance),
            unit_instances: Property::Explicit(def.unit_instances),
            generate_documentation: Property::Explicit(def.generate_documentation),
        }
    }
}

impl Inheritable for VectorProperties {
    fn inherit_from(&mut self, parent: &Self) {
        self.unit.inherit(&parent.unit);
        self.scalar.inherit(&parent.scalar);
        self.dimension.inherit(&parent.dimension);
        self.implement_sum.inherit(&parent.implement_sum);
        self.implement_difference.inherit(&parent.implement_difference);
        self.difference.inherit(&parent.difference);
        self.default_unit_instance.inherit(&parent.default_unit_instance);
        self.unit_instances.inherit(&parent.unit_instances);
        self.generate_documentation.inherit(&parent.generate_documentation);
    }
}

/// A vector quantity of fixed dimension: base or specialization.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VectorDeclaration {
    pub identity: TypeIdentity,
    pub span: Span,
    pub shape: Shape<VectorDefinition, VectorProperties>,
}

impl VectorDeclaration {
    pub fn base(identity: impl Into<TypeIdentity>, span: Span, definition: VectorDefinition) -> Self {
        Self {
            identity: identity.into(),
            span,
            shape: Shape::Base(definition),
        }
    }

    pub fn specialization(
        identity: impl Into<TypeIdentity>,
        span: Span,
        original: impl Into<TypeIdentity>,
        overrides: VectorProperties,
    ) -> Self {
        Self {
            identity: identity.into(),
            span,
            shape: Shape::Specialization {
                original: original.into(),
                overrides,
            },
        }
    }

    pub fn references(&self) -> Vec<&TypeIdentity> {
        match &self.shape {
            Shape::Base(def) => std::iter::once(&def.unit)
                .chain(def.scalar.as_ref())
                .chain(def.difference.as_ref())
                .collect(),
            Shape::Specialization {
                original,
                overrides,
            } => std::iter::once(original)
                .chain(overrides.references())
                .collect(),
        }
    }
}

impl Identified for VectorDeclaration {
    fn identity(&self) -> &TypeIdentity {
        &self.identity
    }

    fn span(&self) -> Span {
        self.span
    }
}

impl Specializable for VectorDeclaration {
    type Properties = VectorProperties;

    fn original(&self) -> Option<&TypeIdentity> {
        self.shape.original()
    }

    fn own_properties(&self) -> VectorProperties {
        self.shape.own_properties()
    }
}

/// A dimension-agnostic vector family: base or specialization.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupDeclaration {
    pub identity: TypeIdentity,
    pub span: Span,
    pub shape: Shape<GroupDefinition, VectorProperties>,
}

impl GroupDeclaration {
    pub fn base(identity: impl Into<TypeIdentity>, span: Span, definition: GroupDefinition) -> Self {
        Self {
            identity: identity.into(),
            span,
            shape: Shape::Base(definition),
        }
    }

    pub fn specialization(
        identity: impl Into<TypeIdentity>,
        span: Span,
        original: impl Into<TypeIdentity>,
        overrides: VectorProperties,
    ) -> Self {
        Self {
            identity: identity.into(),
            span,
            shape: Shape::Specialization {
                original: original.into(),
                overrides,
            },
        }
    }

    pub fn references(&self) -> Vec<&TypeIdentity> {
        match &self.shape {
            Shape::Base(def) => std::iter::once(&def.unit)
                .chain(def.scalar.as_ref())
                .chain(def.difference.as_ref())
                .collect(),
            Shape::Specialization {
                original,
                overrides,
            } => std::iter::once(original)
                .chain(overrides.references())
                .collect(),
        }
    }
}

impl Identified for GroupDeclaration {
    fn identity(&self) -> &TypeIdentity {
        &self.identity
    }

    fn span(&self) -> Span {
        self.span
    }
}

impl Specializable for GroupDeclaration {
    type Properties = VectorProperties;

    fn original(&self) -> Option<&TypeIdentity> {
        self.shape.original()
    }

    fn own_properties(&self) -> VectorProperties {
        self.shape.own_properties()
    }
}

/// One member of a vector group, fixing a concrete dimension.
///
/// Unset slots are taken from the group.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupMemberDeclaration {
    pub identity: TypeIdentity,
    pub span: Span,
    pub group: TypeIdentity,
    pub dimension: u32,
    pub overrides: VectorProperties,
}

impl GroupMemberDeclaration {
    pub fn new(
        identity: impl Into<TypeIdentity>,
        span: Span,
        group: impl Into<TypeIdentity>,
        dimension: u32,
    ) -> Self {
        Self {
            identity: identity.into(),
            span,
            group: group.into(),
            dimension,
            overrides: VectorProperties::default(),
        }
    }

    pub fn with_overrides(mut self, overrides: VectorProperties) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn references(&self) -> Vec<&TypeIdentity> {
        std::iter::once(&self.group)
            .chain(self.overrides.references())
            .collect()
    }
}

impl Identified for GroupMemberDeclaration {
    fn identity(&self) -> &TypeIdentity {
        &self.identity
    }

    fn span(&self) -> Span {
        self.span
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_definition_leaves_dimension_unset() {
        let props = VectorProperties::from(GroupDefinition::new("UnitOfLength"));
        assert!(props.dimension.is_unset());
        assert!(props.unit.is_explicit());
    }

    #[test]
    fn specialized_vector_inherits_dimension() {
        let parent = VectorProperties::from(VectorDefinition::new("UnitOfLength", 3));
        let mut child = VectorProperties::new().with_documentation(false);
        child.inherit_from(&parent);
        assert_eq!(child.dimension, Property::Inherited(3));
        assert_eq!(child.generate_documentation, Property::Explicit(false));
    }

    #[test]
    fn member_references_name_group_first() {
        let member = GroupMemberDeclaration::new("Position3", Span::default(), "Position", 3)
            .with_overrides(VectorProperties::new().with_scalar(Some("Length".into())));
        let refs: Vec<String> = member.references().iter().map(|r| r.to_string()).collect();
        assert_eq!(refs, vec!["Position", "Length"]);
    }
}
