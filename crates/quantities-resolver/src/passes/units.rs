//! Unit Pass - validate unit instances and order them by dependency.
//!
//! Runs before scalar and vector resolution, so that default unit instances
//! and instance selections are checked against valid instances only.
//!
//! ## Algorithm
//!
//! Depth-first over the same-unit dependencies of each instance
//! (`Scaled`, `Prefixed`, `Offset`, `Alias`, and `Derived` operands of the
//! same unit). An instance is valid when all of its dependencies are valid.
//! Valid instances are emitted post-order, dependencies first.
//!
//! ```text
//! Metre      Fixed            -> valid
//! Kilometre  Prefixed(Metre)  -> valid, after Metre
//! Foot       Scaled(Yard)     -> cycle with Yard, both dropped
//! Yard       Scaled(Foot)
//! Inch       Scaled(Thumb)    -> Thumb unknown, dropped
//! ```

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, instrument, trace};

use quantities_core::{
    DeclarationKind, Diagnostic, InstanceDefinition, InstanceRef, Origin, PropertyName,
    ResolutionError, ResolveError, ResolvedUnit, Severity, TypeIdentity, UnitDeclaration,
};

use crate::{Directory, ResolverOptions};

const SCALAR: &[DeclarationKind] = &[DeclarationKind::Scalar];
const UNIT: &[DeclarationKind] = &[DeclarationKind::Unit];

/// Output of the unit pass.
#[derive(Debug, Default)]
pub struct UnitOutput {
    pub units: Vec<ResolvedUnit>,
    pub diagnostics: Vec<Diagnostic>,
}

pub struct UnitPass<'a> {
    directory: Directory<'a>,
    scope: Option<&'a FxHashSet<TypeIdentity>>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    InProgress,
    Valid,
    Invalid,
}

impl<'a> UnitPass<'a> {
    pub fn new(directory: Directory<'a>) -> Self {
        Self {
            directory,
            scope: None,
        }
    }

    pub fn with_scope(mut self, scope: Option<&'a FxHashSet<TypeIdentity>>) -> Self {
        self.scope = scope;
        self
    }

    #[cfg_attr(feature = "profiling", profiling::function)]
    #[instrument(skip_all, name = "units")]
    pub fn run(&self, options: &ResolverOptions) -> Result<UnitOutput, ResolveError> {
        let mut output = UnitOutput::default();

        for unit in &self.directory.populations().units {
            if self
                .scope
                .is_some_and(|scope| !scope.contains(&unit.identity))
            {
                continue;
            }
            options.checkpoint()?;
            let resolved = self.resolve_unit(unit, options, &mut output.diagnostics);
            output.units.push(resolved);
        }

        debug!(units = output.units.len(), "units resolved");
        Ok(output)
    }

    fn resolve_unit(
        &self,
        unit: &UnitDeclaration,
        options: &ResolverOptions,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> ResolvedUnit {
        let quantity = unit.quantity.as_ref().and_then(|quantity| {
            if self.directory.scalar_kind(quantity).is_some() {
                return Some(quantity.clone());
            }
            diagnostics.push(Diagnostic::error(self.reference_error(
                &unit.identity,
                PropertyName::Quantity,
                quantity,
                SCALAR,
            )));
            None
        });

        let mut walk = InstanceWalk {
            pass: self,
            unit,
            flag_severity: options.inconsistent_flag_severity,
            state: FxHashMap::default(),
            stack: Vec::new(),
            order: Vec::new(),
            diagnostics,
        };
        for instance in &unit.instances {
            walk.visit(&instance.name);
        }
        let instances = walk.order;

        trace!(unit = %unit.identity, valid = instances.len(), declared = unit.instances.len(), "unit instances ordered");

        ResolvedUnit {
            declaration: unit.clone(),
            quantity,
            instances,
            origin: Origin::Local,
        }
    }

    fn reference_error(
        &self,
        identity: &TypeIdentity,
        property: PropertyName,
        target: &TypeIdentity,
        expected: &'static [DeclarationKind],
    ) -> ResolutionError {
        match self.directory.kind_of(target) {
            Some(found) => ResolutionError::WrongKindReference {
                identity: identity.clone(),
                property,
                target: target.clone(),
                expected,
                found,
            },
            None => ResolutionError::UnresolvedReference {
                identity: identity.clone(),
                property,
                target: target.to_string(),
            },
        }
    }

    /// Whether `operand` names an existing instance of another unit.
    fn foreign_operand_exists(&self, operand: &InstanceRef) -> Option<bool> {
        if let Some(unit) = self.directory.populations().units.get(&operand.unit) {
            return Some(unit.instance(&operand.instance).is_some());
        }
        self.directory
            .unit(&operand.unit)
            .map(|unit| unit.has_instance(&operand.instance))
    }
}

struct InstanceWalk<'w, 'a> {
    pass: &'w UnitPass<'a>,
    unit: &'w UnitDeclaration,
    flag_severity: Severity,
    state: FxHashMap<&'w str, Visit>,
    stack: Vec<&'w str>,
    order: Vec<String>,
    diagnostics: &'w mut Vec<Diagnostic>,
}

impl<'w> InstanceWalk<'w, '_> {
    fn visit(&mut self, name: &'w str) -> bool {
        match self.state.get(name) {
            Some(Visit::Valid) => return true,
            Some(Visit::Invalid) => return false,
            Some(Visit::InProgress) => {
                self.report_cycle(name);
                return false;
            }
            None => {}
        }

        let Some(instance) = self.unit.instance(name) else {
            return false;
        };

        self.state.insert(name, Visit::InProgress);
        self.stack.push(name);

        let valid = match &instance.definition {
            InstanceDefinition::Fixed { .. } => true,
            InstanceDefinition::Derived { operands } => {
                let mut valid = true;
                for operand in operands {
                    valid &= self.visit_operand(name, operand);
                }
                valid
            }
            definition => match definition.same_unit_dependency() {
                Some(dependency) => self.visit_dependency(name, dependency),
                None => true,
            },
        };

        let valid = valid && self.check_offset(name, &instance.definition);

        self.stack.pop();
        // A cycle member may already be marked invalid.
        let valid = valid && self.state.get(name) != Some(&Visit::Invalid);
        self.state
            .insert(name, if valid { Visit::Valid } else { Visit::Invalid });
        if valid {
            self.order.push(name.to_string());
        }
        valid
    }

    fn visit_dependency(&mut self, name: &str, dependency: &'w str) -> bool {
        if self.unit.instance(dependency).is_none() {
            self.diagnostics
                .push(Diagnostic::error(ResolutionError::UnresolvedReference {
                    identity: self.unit.identity.clone(),
                    property: PropertyName::Instance(name.to_string()),
                    target: dependency.to_string(),
                }));
            return false;
        }
        self.visit(dependency)
    }

    fn visit_operand(&mut self, name: &str, operand: &'w InstanceRef) -> bool {
        if operand.unit == self.unit.identity {
            return self.visit_dependency(name, &operand.instance);
        }

        let property = PropertyName::Instance(name.to_string());
        match self.pass.foreign_operand_exists(operand) {
            Some(true) => true,
            Some(false) => {
                self.diagnostics
                    .push(Diagnostic::error(ResolutionError::UnresolvedReference {
                        identity: self.unit.identity.clone(),
                        property,
                        target: format!("{}::{}", operand.unit, operand.instance),
                    }));
                false
            }
            None => {
                let error =
                    self.pass
                        .reference_error(&self.unit.identity, property, &operand.unit, UNIT);
                self.diagnostics.push(Diagnostic::error(error));
                false
            }
        }
    }

    fn check_offset(&mut self, name: &str, definition: &InstanceDefinition) -> bool {
        if definition.is_offset() && !self.unit.bias_term {
            self.diagnostics.push(Diagnostic::new(
                self.flag_severity,
                ResolutionError::InconsistentFlagValue {
                    identity: self.unit.identity.clone(),
                    property: PropertyName::Instance(name.to_string()),
                    flag: PropertyName::BiasTerm,
                },
            ));
            return false;
        }
        true
    }

    fn report_cycle(&mut self, reentered: &str) {
        let Some(start) = self.stack.iter().position(|n| *n == reentered) else {
            return;
        };
        let members: Vec<&'w str> = self.stack[start..].to_vec();
        for (offset, member) in members.iter().enumerate() {
            let cycle: Vec<String> = members[offset..]
                .iter()
                .chain(&members[..offset])
                .chain(std::iter::once(member))
                .map(|n| n.to_string())
                .collect();
            self.diagnostics
                .push(Diagnostic::error(ResolutionError::CircularInstanceDependency {
                    identity: self.unit.identity.clone(),
                    instance: member.to_string(),
                    cycle,
                }));
            self.state.insert(*member, Visit::Invalid);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quantities_core::{DiagnosticCode, Span, UnitInstance};
    use quantities_registry::{Populations, ResolvedStore};

    fn run(units: Vec<UnitDeclaration>) -> UnitOutput {
        let mut populations = Populations::new();
        for unit in units {
            populations.insert_unit(unit).unwrap();
        }
        let store = ResolvedStore::new();
        UnitPass::new(Directory::new(&populations, &store))
            .run(&ResolverOptions::default())
            .unwrap()
    }

    fn codes(output: &UnitOutput) -> Vec<DiagnosticCode> {
        output.diagnostics.iter().map(|d| d.code()).collect()
    }

    #[test]
    fn dependencies_come_first() {
        let output = run(vec![
            UnitDeclaration::new("UnitOfLength", Span::default())
                .with_instance(UnitInstance::prefixed("Kilometre", "Kilometres", "Metre", 3))
                .with_instance(UnitInstance::alias("Meter", "Meters", "Metre"))
                .with_instance(UnitInstance::fixed("Metre", "Metres", 1.0)),
        ]);
        assert!(output.diagnostics.is_empty());
        assert_eq!(output.units[0].instances, vec!["Metre", "Kilometre", "Meter"]);
    }

    #[test]
    fn missing_dependency_drops_instance() {
        let output = run(vec![
            UnitDeclaration::new("UnitOfLength", Span::default())
                .with_instance(UnitInstance::fixed("Metre", "Metres", 1.0))
                .with_instance(UnitInstance::scaled("Inch", "Inches", "Thumb", 0.0254)),
        ]);
        assert_eq!(output.units[0].instances, vec!["Metre"]);
        assert_eq!(codes(&output), vec![DiagnosticCode::UnresolvedReference]);
        assert_eq!(
            output.diagnostics[0].property(),
            PropertyName::Instance("Inch".to_string())
        );
    }

    #[test]
    fn instance_cycle_reports_every_member() {
        let output = run(vec![
            UnitDeclaration::new("UnitOfLength", Span::default())
                .with_instance(UnitInstance::scaled("Foot", "Feet", "Yard", 1.0 / 3.0))
                .with_instance(UnitInstance::scaled("Yard", "Yards", "Foot", 3.0))
                .with_instance(UnitInstance::alias("Ft", "Ft", "Foot"))
                .with_instance(UnitInstance::fixed("Metre", "Metres", 1.0)),
        ]);
        assert_eq!(output.units[0].instances, vec!["Metre"]);
        assert_eq!(
            codes(&output),
            vec![
                DiagnosticCode::CircularInstanceDependency,
                DiagnosticCode::CircularInstanceDependency
            ]
        );
    }

    #[test]
    fn offset_requires_bias_term() {
        let without_bias = run(vec![
            UnitDeclaration::new("UnitOfTemperature", Span::default())
                .with_instance(UnitInstance::fixed("Kelvin", "Kelvins", 1.0))
                .with_instance(UnitInstance::offset("Celsius", "Celsius", "Kelvin", 273.15)),
        ]);
        assert_eq!(without_bias.units[0].instances, vec!["Kelvin"]);
        assert_eq!(codes(&without_bias), vec![DiagnosticCode::InconsistentFlagValue]);
        assert!(!without_bias.diagnostics[0].is_error());

        let with_bias = run(vec![
            UnitDeclaration::new("UnitOfTemperature", Span::default())
                .with_bias_term()
                .with_instance(UnitInstance::fixed("Kelvin", "Kelvins", 1.0))
                .with_instance(UnitInstance::offset("Celsius", "Celsius", "Kelvin", 273.15)),
        ]);
        assert_eq!(with_bias.units[0].instances, vec!["Kelvin", "Celsius"]);
    }

    #[test]
    fn derived_operands_name_other_units() {
        let output = run(vec![
            UnitDeclaration::new("UnitOfLength", Span::default())
                .with_instance(UnitInstance::fixed("Metre", "Metres", 1.0)),
            UnitDeclaration::new("UnitOfTime", Span::default())
                .with_instance(UnitInstance::fixed("Second", "Seconds", 1.0)),
            UnitDeclaration::new("UnitOfSpeed", Span::default())
                .with_instance(UnitInstance::derived(
                    "MetrePerSecond",
                    "MetresPerSecond",
                    vec![
                        InstanceRef::new("UnitOfLength", "Metre"),
                        InstanceRef::new("UnitOfTime", "Second"),
                    ],
                ))
                .with_instance(UnitInstance::derived(
                    "MetrePerHour",
                    "MetresPerHour",
                    vec![
                        InstanceRef::new("UnitOfLength", "Metre"),
                        InstanceRef::new("UnitOfTime", "Hour"),
                    ],
                ))
                .with_instance(UnitInstance::derived(
                    "MetrePerFortnight",
                    "MetresPerFortnight",
                    vec![InstanceRef::new("UnitOfEternity", "Fortnight")],
                )),
        ]);
        assert_eq!(output.units[2].instances, vec!["MetrePerSecond"]);
        assert_eq!(
            codes(&output),
            vec![
                DiagnosticCode::UnresolvedReference,
                DiagnosticCode::UnresolvedReference
            ]
        );
    }

    #[test]
    fn quantity_must_be_a_scalar() {
        let output = run(vec![
            UnitDeclaration::new("UnitOfLength", Span::default()).with_quantity("Length"),
        ]);
        assert_eq!(output.units[0].quantity, None);
        assert_eq!(codes(&output), vec![DiagnosticCode::UnresolvedReference]);
        assert_eq!(output.diagnostics[0].property(), PropertyName::Quantity);
    }
}
