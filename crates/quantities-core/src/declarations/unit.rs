//! Unit declarations and their instances.

use ordered_float::OrderedFloat;

use super::Identified;
use crate::{Span, TypeIdentity};

/// A unit of measurement and the named instances registered under it.
///
/// # Examples
///
/// ```
/// use quantities_core::{UnitDeclaration, UnitInstance, Span};
///
/// let unit = UnitDeclaration::new("UnitOfLength", Span::default())
///     .with_quantity("Length")
///     .with_instance(UnitInstance::fixed("Metre", "Metres", 1.0))
///     .with_instance(UnitInstance::prefixed("Kilometre", "Kilometres", "Metre", 3));
///
/// assert!(unit.instance("Kilometre").is_some());
/// assert!(unit.instance("kilometre").is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UnitDeclaration {
    pub identity: TypeIdentity,
    pub span: Span,
    /// The scalar quantity this unit describes, if bound.
    pub quantity: Option<TypeIdentity>,
    /// Whether instances of this unit may carry an offset (e.g. Celsius).
    pub bias_term: bool,
    /// Instance definitions in declaration order.
    pub instances: Vec<UnitInstance>,
}

impl UnitDeclaration {
    pub fn new(identity: impl Into<TypeIdentity>, span: Span) -> Self {
        Self {
            identity: identity.into(),
            span,
            quantity: None,
            bias_term: false,
            instances: Vec::new(),
        }
    }

    pub fn with_quantity(mut self, quantity: impl Into<TypeIdentity>) -> Self {
        self.quantity = Some(quantity.into());
        self
    }

    pub fn with_bias_term(mut self) -> Self {
        self.bias_term = true;
        self
    }

    pub fn with_instance(mut self, instance: UnitInstance) -> Self {
        self.instances.push(instance);
        self
    }

    /// Find an instance by exact, case-sensitive name.
    pub fn instance(&self, name: &str) -> Option<&UnitInstance> {
        self.instances.iter().find(|i| i.name == name)
    }
}

impl Identified for UnitDeclaration {
    fn identity(&self) -> &TypeIdentity {
        &self.identity
    }

    fn span(&self) -> Span {
        self.span
    }
}

/// One named instance of a unit ("Metre", "Kilometre", ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UnitInstance {
    pub name: String,
    pub plural: String,
    pub definition: InstanceDefinition,
    pub span: Span,
}

impl UnitInstance {
    pub fn new(
        name: impl Into<String>,
        plural: impl Into<String>,
        definition: InstanceDefinition,
    ) -> Self {
        Self {
            name: name.into(),
            plural: plural.into(),
            definition,
            span: Span::default(),
        }
    }

    pub fn fixed(name: impl Into<String>, plural: impl Into<String>, value: f64) -> Self {
        Self::new(
            name,
            plural,
            InstanceDefinition::Fixed {
                value: OrderedFloat(value),
            },
        )
    }

    pub fn scaled(
        name: impl Into<String>,
        plural: impl Into<String>,
        from: impl Into<String>,
        scale: f64,
    ) -> Self {
        Self::new(
            name,
            plural,
            InstanceDefinition::Scaled {
                from: from.into(),
                scale: OrderedFloat(scale),
            },
        )
    }

    /// Metric-prefixed instance, `exponent` being the power of ten.
    pub fn prefixed(
        name: impl Into<String>,
        plural: impl Into<String>,
        from: impl Into<String>,
        exponent: i32,
    ) -> Self {
        Self::new(
            name,
            plural,
            InstanceDefinition::Prefixed {
                from: from.into(),
                prefix: Prefix::Metric(exponent),
            },
        )
    }

    pub fn offset(
        name: impl Into<String>,
        plural: impl Into<String>,
        from: impl Into<String>,
        offset: f64,
    ) -> Self {
        Self::new(
            name,
            plural,
            InstanceDefinition::Offset {
                from: from.into(),
                offset: OrderedFloat(offset),
            },
        )
    }

    pub fn alias(
        name: impl Into<String>,
        plural: impl Into<String>,
        of: impl Into<String>,
    ) -> Self {
        Self::new(name, plural, InstanceDefinition::Alias { of: of.into() })
    }

    pub fn derived(
        name: impl Into<String>,
        plural: impl Into<String>,
        operands: Vec<InstanceRef>,
    ) -> Self {
        Self::new(name, plural, InstanceDefinition::Derived { operands })
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }
}

/// How an instance is defined numerically.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum InstanceDefinition {
    /// A fixed magnitude relative to the unit's reference.
    Fixed { value: OrderedFloat<f64> },
    /// Derived from instances of other units (e.g. metre per second).
    Derived { operands: Vec<InstanceRef> },
    /// Another instance of the same unit times a factor.
    Scaled {
        from: String,
        scale: OrderedFloat<f64>,
    },
    /// Another instance of the same unit with a metric or binary prefix.
    Prefixed { from: String, prefix: Prefix },
    /// Another instance of the same unit shifted by a constant.
    Offset {
        from: String,
        offset: OrderedFloat<f64>,
    },
    /// A second name for another instance of the same unit.
    Alias { of: String },
}

impl InstanceDefinition {
    /// The instance of the same unit this definition builds on.
    pub fn same_unit_dependency(&self) -> Option<&str> {
        match self {
            InstanceDefinition::Scaled { from, .. }
            | InstanceDefinition::Prefixed { from, .. }
            | InstanceDefinition::Offset { from, .. } => Some(from),
            InstanceDefinition::Alias { of } => Some(of),
            InstanceDefinition::Fixed { .. } | InstanceDefinition::Derived { .. } => None,
        }
    }

    pub fn is_offset(&self) -> bool {
        matches!(self, InstanceDefinition::Offset { .. })
    }
}

/// An instance of some unit, referenced from a derived definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InstanceRef {
    pub unit: TypeIdentity,
    pub instance: String,
}

impl InstanceRef {
    pub fn new(unit: impl Into<TypeIdentity>, instance: impl Into<String>) -> Self {
        Self {
            unit: unit.into(),
            instance: instance.into(),
        }
    }
}

/// Prefix applied to another instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Prefix {
    /// Power of ten.
    Metric(i32),
    /// Power of 1024.
    Binary(u32),
}

impl Prefix {
    pub fn factor(self) -> f64 {
        match self {
            Prefix::Metric(exponent) => 10f64.powi(exponent),
            Prefix::Binary(exponent) => 1024f64.powi(exponent as i32),
        }
    }
}

/// Which instances of the bound unit a quantity exposes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum InstanceSelection {
    /// Every instance of the unit.
    #[default]
    All,
    /// Only the listed instances.
    Include(Vec<String>),
    /// Every instance except the listed ones.
    Exclude(Vec<String>),
}

impl InstanceSelection {
    /// The instance names this selection mentions.
    pub fn names(&self) -> &[String] {
        match self {
            InstanceSelection::All => &[],
            InstanceSelection::Include(names) | InstanceSelection::Exclude(names) => names,
        }
    }

    /// Whether an instance of the unit is exposed under this selection.
    pub fn admits(&self, instance: &str) -> bool {
        match self {
            InstanceSelection::All => true,
            InstanceSelection::Include(names) => names.iter().any(|n| n == instance),
            InstanceSelection::Exclude(names) => !names.iter().any(|n| n == instance),
        }
    }

    /// Keep only the mentioned names for which `keep` returns true.
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        match self {
            InstanceSelection::All => {}
            InstanceSelection::Include(names) | InstanceSelection::Exclude(names) => {
                names.retain(|n| keep(n.as_str()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instance_lookup_is_case_sensitive() {
        let unit = UnitDeclaration::new("UnitOfLength", Span::default())
            .with_instance(UnitInstance::fixed("Metre", "Metres", 1.0));
        assert!(unit.instance("Metre").is_some());
        assert!(unit.instance("metre").is_none());
        assert!(unit.instance("Metres").is_none());
    }

    #[test]
    fn same_unit_dependencies() {
        assert_eq!(
            UnitInstance::alias("Meter", "Meters", "Metre")
                .definition
                .same_unit_dependency(),
            Some("Metre")
        );
        assert_eq!(
            UnitInstance::fixed("Metre", "Metres", 1.0)
                .definition
                .same_unit_dependency(),
            None
        );
        let derived = UnitInstance::derived(
            "MetrePerSecond",
            "MetresPerSecond",
            vec![
                InstanceRef::new("UnitOfLength", "Metre"),
                InstanceRef::new("UnitOfTime", "Second"),
            ],
        );
        assert_eq!(derived.definition.same_unit_dependency(), None);
    }

    #[test]
    fn prefix_factors() {
        assert_eq!(Prefix::Metric(3).factor(), 1000.0);
        assert_eq!(Prefix::Metric(-2).factor(), 0.01);
        assert_eq!(Prefix::Binary(1).factor(), 1024.0);
    }

    #[test]
    fn selection_admits() {
        let include = InstanceSelection::Include(vec!["Metre".into()]);
        assert!(include.admits("Metre"));
        assert!(!include.admits("Foot"));

        let exclude = InstanceSelection::Exclude(vec!["Foot".into()]);
        assert!(exclude.admits("Metre"));
        assert!(!exclude.admits("Foot"));

        assert!(InstanceSelection::All.admits("anything"));
    }

    #[test]
    fn float_definitions_are_hashable() {
        use rustc_hash::FxHashSet;

        let mut set = FxHashSet::default();
        set.insert(UnitInstance::scaled("Foot", "Feet", "Metre", 0.3048));
        assert!(set.contains(&UnitInstance::scaled("Foot", "Feet", "Metre", 0.3048)));
    }
}
