//! Scalar quantity declarations.

use super::{Identified, Inheritable, InstanceSelection, Shape, Specializable};
use crate::{Property, PropertyName, Span, TypeIdentity};

/// Named scalar-to-scalar relationships.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PowerRelation {
    Reciprocal,
    Square,
    Cube,
    SquareRoot,
    CubeRoot,
}

impl PowerRelation {
    pub const ALL: [PowerRelation; 5] = [
        PowerRelation::Reciprocal,
        PowerRelation::Square,
        PowerRelation::Cube,
        PowerRelation::SquareRoot,
        PowerRelation::CubeRoot,
    ];

    pub fn property_name(self) -> PropertyName {
        match self {
            PowerRelation::Reciprocal => PropertyName::Reciprocal,
            PowerRelation::Square => PropertyName::Square,
            PowerRelation::Cube => PropertyName::Cube,
            PowerRelation::SquareRoot => PropertyName::SquareRoot,
            PowerRelation::CubeRoot => PropertyName::CubeRoot,
        }
    }
}

/// Fully defined properties of a base scalar.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScalarDefinition {
    /// Backing unit.
    pub unit: TypeIdentity,
    /// Associated vector or vector group.
    pub vector: Option<TypeIdentity>,
    pub use_unit_bias: bool,
    pub implement_sum: bool,
    pub implement_difference: bool,
    /// Result of subtracting two instances; `None` means the quantity itself.
    pub difference: Option<TypeIdentity>,
    pub default_unit_instance: Option<String>,
    pub reciprocal: Option<TypeIdentity>,
    pub square: Option<TypeIdentity>,
    pub cube: Option<TypeIdentity>,
    pub square_root: Option<TypeIdentity>,
    pub cube_root: Option<TypeIdentity>,
    pub unit_instances: InstanceSelection,
    pub generate_documentation: bool,
}

impl ScalarDefinition {
    /// Base definition with sum, difference and documentation enabled.
    pub fn new(unit: impl Into<TypeIdentity>) -> Self {
        Self {
            unit: unit.into(),
            vector: None,
            use_unit_bias: false,
            implement_sum: true,
            implement_difference: true,
            difference: None,
            default_unit_instance: None,
            reciprocal: None,
            square: None,
            cube: None,
            square_root: None,
            cube_root: None,
            unit_instances: InstanceSelection::All,
            generate_documentation: true,
        }
    }

    pub fn with_vector(mut self, vector: impl Into<TypeIdentity>) -> Self {
        self.vector = Some(vector.into());
        self
    }

    pub fn with_unit_bias(mut self) -> Self {
        self.use_unit_bias = true;
        self
    }

    pub fn without_sum(mut self) -> Self {
        self.implement_sum = false;
        self
    }

    pub fn without_difference(mut self) -> Self {
        self.implement_difference = false;
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

    pub fn with_power(mut self, relation: PowerRelation, target: impl Into<TypeIdentity>) -> Self {
        let target = Some(target.into());
        match relation {
            PowerRelation::Reciprocal => self.reciprocal = target,
            PowerRelation::Square => self.square = target,
            PowerRelation::Cube => self.cube = target,
            PowerRelation::SquareRoot => self.square_root = target,
            PowerRelation::CubeRoot => self.cube_root = target,
        }
        self
    }

    pub fn with_unit_instances(mut self, selection: InstanceSelection) -> Self {
        self.unit_instances = selection;
        self
    }

    pub fn without_documentation(mut self) -> Self {
        self.generate_documentation = false;
        self
    }
}

/// Tri-state property bag of a scalar.
///
/// A specialization stores only what it sets explicitly. Resolution fills the
/// rest from the nearest ancestor that defines it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ScalarProperties {
    pub unit: Property<TypeIdentity>,
    pub vector: Property<Option<TypeIdentity>>,
    pub use_unit_bias: Property<bool>,
    pub implement_sum: Property<bool>,
    pub implement_difference: Property<bool>,
    pub difference: Property<Option<TypeIdentity>>,
    pub default_unit_instance: Property<Option<String>>,
    pub reciprocal: Property<Option<TypeIdentity>>,
    pub square: Property<Option<TypeIdentity>>,
    pub cube: Property<Option<TypeIdentity>>,
    pub square_root: Property<Option<TypeIdentity>>,
    pub cube_root: Property<Option<TypeIdentity>>,
    pub unit_instances: Property<InstanceSelection>,
    pub generate_documentation: Property<bool>,
}

impl ScalarProperties {
    /// Empty bag: every slot unset.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_unit(mut self, unit: impl Into<TypeIdentity>) -> Self {
        self.unit = Property::Explicit(unit.into());
        self
    }

    pub fn with_vector(mut self, vector: Option<TypeIdentity>) -> Self {
        self.vector = Property::Explicit(vector);
        self
    }

    pub fn with_unit_bias(mut self, enabled: bool) -> Self {
        self.use_unit_bias = Property::Explicit(enabled);
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

    pub fn with_power(mut self, relation: PowerRelation, target: Option<TypeIdentity>) -> Self {
        *self.power_mut(relation) = Property::Explicit(target);
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

    pub fn power(&self, relation: PowerRelation) -> &Property<Option<TypeIdentity>> {
        match relation {
            PowerRelation::Reciprocal => &self.reciprocal,
            PowerRelation::Square => &self.square,
            PowerRelation::Cube => &self.cube,
            PowerRelation::SquareRoot => &self.square_root,
            PowerRelation::CubeRoot => &self.cube_root,
        }
    }

    pub fn power_mut(&mut self, relation: PowerRelation) -> &mut Property<Option<TypeIdentity>> {
        match relation {
            PowerRelation::Reciprocal => &mut self.reciprocal,
            PowerRelation::Square => &mut self.square,
            PowerRelation::Cube => &mut self.cube,
            PowerRelation::SquareRoot => &mut self.square_root,
            PowerRelation::CubeRoot => &mut self.cube_root,
        }
    }

    /// Number of slots holding an inherited value.
    pub fn inherited_count(&self) -> usize {
        let powers = PowerRelation::ALL
            .iter()
            .filter(|r| self.power(**r).is_inherited())
            .count();
        powers
            + [
                self.unit.is_inherited(),
                self.vector.is_inherited(),
                self.use_unit_bias.is_inherited(),
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
}

impl From<ScalarDefinition> for ScalarProperties {
    fn from(def: ScalarDefinition) -> Self {
        Self {
            unit: Property::Explicit(def.unit),
            vector: Property::Explicit(def.vector),
            use_unit_bias: Property::Explicit(def.use_unit_bias),
            implement_sum: Property::Explicit(def.implement_sum),
            implement_difference: Property::Explicit(def.implement_difference),
            difference: Property::Explicit(def.difference),
            default_unit_instance: Property::Explicit(def.default_unit_instance),
            reciprocal: Property::Explicit(def.reciprocal),
            square: Property::Explicit(def.square),
            cube: Property::Explicit(def.cube),
            square_root: Property::Explicit(def.square_root),
            cube_root: Property::Explicit(def.cube_root),
            unit_instances: Property::Explicit(def.unit_instances),
            generate_documentation: Property::Explicit(def.generate_documentation),
        }
    }
}

impl Inheritable for ScalarProperties {
    fn inherit_from(&mut self, parent: &Self) {
        self.unit.inherit(&parent.unit);
        self.vector.inherit(&parent.vector);
        self.use_unit_bias.inherit(&parent.use_unit_bias);
        self.implement_sum.inherit(&parent.implement_sum);
        self.implement_difference.inherit(&parent.implement_difference);
        self.difference.inherit(&parent.difference);
        self.default_unit_instance.inherit(&parent.default_unit_instance);
        for relation in PowerRelation::ALL {
            self.power_mut(relation).inherit(parent.power(relation));
        }
        self.unit_instances.inherit(&parent.unit_instances);
        self.generate_documentation.inherit(&parent.generate_documentation);
    }
}

/// A scalar quantity declaration: base or specialization.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScalarDeclaration {
    pub identity: TypeIdentity,
    pub span: Span,
    pub shape: Shape<ScalarDefinition, ScalarProperties>,
}

impl ScalarDeclaration {
    pub fn base(identity: impl Into<TypeIdentity>, span: Span, definition: ScalarDefinition) -> Self {
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
        overrides: ScalarProperties,
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

    /// Every identity this declaration names.
    pub fn references(&self) -> Vec<&TypeIdentity> {
        let mut refs = Vec::new();
        let props = match &self.shape {
            Shape::Base(def) => {
                refs.push(&def.unit);
                refs.extend(def.vector.as_ref());
                refs.extend(def.difference.as_ref());
                refs.extend(
                    [
                        &def.reciprocal,
                        &def.square,
                        &def.cube,
                        &def.square_root,
                        &def.cube_root,
                    ]
                    .into_iter()
                    .flatten(),
                );
                return refs;
            }
            Shape::Specialization {
                original,
                overrides,
            } => {
                refs.push(original);
                overrides
            }
        };
        refs.extend(props.unit.value());
        refs.extend(props.vector.flatten());
        refs.extend(props.difference.flatten());
        for relation in PowerRelation::ALL {
            refs.extend(props.power(relation).flatten());
        }
        refs
    }
}

impl Identified for ScalarDeclaration {
    fn identity(&self) -> &TypeIdentity {
        &self.identity
    }

    fn span(&self) -> Span {
        self.span
    }
}

impl Specializable for ScalarDeclaration {
    type Properties = ScalarProperties;

    fn original(&self) -> Option<&TypeIdentity> {
        self.shape.original()
    }

    fn own_properties(&self) -> ScalarProperties {
        self.shape.own_properties()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_properties_are_all_explicit() {
        let props = ScalarProperties::from(
            ScalarDefinition::new("UnitOfLength").with_power(PowerRelation::Square, "Area"),
        );
        assert_eq!(props.unit, Property::Explicit(TypeIdentity::global("UnitOfLength")));
        assert_eq!(props.square.flatten(), Some(&TypeIdentity::global("Area")));
        assert_eq!(props.cube, Property::Explicit(None));
        assert_eq!(props.inherited_count(), 0);
    }

    #[test]
    fn specialization_inherits_unset_slots() {
        let parent = ScalarProperties::from(
            ScalarDefinition::new("UnitOfLength")
                .with_power(PowerRelation::Square, "Area")
                .without_sum(),
        );
        let mut child = ScalarProperties::new().with_sum(true);
        child.inherit_from(&parent);

        assert_eq!(child.implement_sum, Property::Explicit(true));
        assert_eq!(
            child.unit,
            Property::Inherited(TypeIdentity::global("UnitOfLength"))
        );
        assert_eq!(
            child.square,
            Property::Inherited(Some(TypeIdentity::global("Area")))
        );
        assert!(child.inherited_count() > 0);
    }

    #[test]
    fn references_include_original_and_overrides() {
        let decl = ScalarDeclaration::specialization(
            "Distance",
            Span::default(),
            "Length",
            ScalarProperties::new().with_power(PowerRelation::Reciprocal, Some("Wavenumber".into())),
        );
        let refs: Vec<String> = decl.references().iter().map(|r| r.to_string()).collect();
        assert_eq!(refs, vec!["Length", "Wavenumber"]);
    }
}
