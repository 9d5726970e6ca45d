//! Cross-Namespace Linker - check every reference of a chain-resolved bag.
//!
//! Runs on the output of the chain pass. Each named reference is looked up
//! in the [`Directory`]; a reference that does not resolve to an entry of
//! the right kind is dropped, leaving the slot absent.
//!
//! A failure is reported only when one of the slots involved was set by the
//! declaration itself. A failure in an inherited slot was already reported
//! on the ancestor that set it. Requester-specific failures (a group lookup
//! missing the requester's dimension) are always reported.

use tracing::trace;

use quantities_core::{
    DeclarationKind, Diagnostic, GroupMemberDeclaration, Inheritable, InstanceSelection,
    PowerRelation, Property, PropertyName, ResolutionError, ResolvedUnit, ScalarProperties,
    Severity, TypeIdentity, VectorProperties,
};

use crate::Directory;

const UNIT: &[DeclarationKind] = &[DeclarationKind::Unit];
const SCALAR: &[DeclarationKind] = &[DeclarationKind::Scalar];
const VECTOR_OR_GROUP: &[DeclarationKind] = &[DeclarationKind::Vector, DeclarationKind::VectorGroup];
const GROUP: &[DeclarationKind] = &[DeclarationKind::VectorGroup];

/// Who asks for a vector `difference` lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requester {
    /// A vector or group member, with its dimension if known.
    Vector(Option<u32>),
    /// A vector group, which takes groups as they are.
    Group,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedScalar {
    pub properties: ScalarProperties,
    /// Quantity of the bound unit.
    pub unit_quantity: Option<TypeIdentity>,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedVector {
    pub properties: VectorProperties,
    pub diagnostics: Vec<Diagnostic>,
}

/// Diagnostics of one declaration, filtered by slot provenance.
struct Report<'r> {
    identity: &'r TypeIdentity,
    flag_severity: Severity,
    diagnostics: Vec<Diagnostic>,
}

impl Report<'_> {
    fn error(&mut self, explicit: bool, error: ResolutionError) {
        if explicit {
            self.diagnostics.push(Diagnostic::error(error));
        }
    }

    fn inconsistent(&mut self, explicit: bool, property: PropertyName, flag: PropertyName) {
        if explicit {
            self.diagnostics.push(Diagnostic::new(
                self.flag_severity,
                ResolutionError::InconsistentFlagValue {
                    identity: self.identity.clone(),
                    property,
                    flag,
                },
            ));
        }
    }
}

pub struct Linker<'a> {
    directory: Directory<'a>,
    flag_severity: Severity,
}

impl<'a> Linker<'a> {
    pub fn new(directory: Directory<'a>, flag_severity: Severity) -> Self {
        Self {
            directory,
            flag_severity,
        }
    }

    pub fn directory(&self) -> Directory<'a> {
        self.directory
    }

    fn report<'r>(&self, identity: &'r TypeIdentity) -> Report<'r> {
        Report {
            identity,
            flag_severity: self.flag_severity,
            diagnostics: Vec::new(),
        }
    }

    /// `UnresolvedReference` or `WrongKindReference` for a reference that
    /// is not of the `expected` kind.
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

    // ==========================================================================
    // Scalars
    // ==========================================================================

    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn link_scalar(&self, identity: &TypeIdentity, mut props: ScalarProperties) -> LinkedScalar {
        let mut report = self.report(identity);

        let unit = self.link_unit(&mut report, &mut props.unit);
        let unit_explicit = props.unit.is_explicit();

        if let Some(vector) = props.vector.flatten() {
            let linked = matches!(
                self.directory.vector_kind(vector),
                Some(DeclarationKind::Vector | DeclarationKind::VectorGroup | DeclarationKind::GroupMember)
            );
            if !linked {
                let error =
                    self.reference_error(identity, PropertyName::Vector, vector, VECTOR_OR_GROUP);
                report.error(props.vector.is_explicit(), error);
                props.vector.clear();
            }
        }

        if props.use_unit_bias.enabled() {
            match unit {
                Some(unit) if !unit.declaration.bias_term => {
                    report.inconsistent(
                        props.use_unit_bias.is_explicit() || unit_explicit,
                        PropertyName::UseUnitBias,
                        PropertyName::BiasTerm,
                    );
                    props.use_unit_bias.replace(false);
                }
                Some(_) => {}
                None => props.use_unit_bias.replace(false),
            }
        }

        let disabled = self.difference_disabled(
            &mut report,
            &mut props.difference,
            &props.implement_difference,
        );
        if let Some(difference) = props.difference.flatten().filter(|_| !disabled) {
            if self.directory.scalar_kind(difference).is_none() {
                let error =
                    self.reference_error(identity, PropertyName::Difference, difference, SCALAR);
                report.error(props.difference.is_explicit(), error);
                props.difference.clear();
            }
        }

        for relation in PowerRelation::ALL {
            let slot = props.power_mut(relation);
            if let Some(target) = slot.flatten() {
                if self.directory.scalar_kind(target).is_none() {
                    let error =
                        self.reference_error(identity, relation.property_name(), target, SCALAR);
                    report.error(slot.is_explicit(), error);
                    slot.clear();
                }
            }
        }

        self.link_instances(
            &mut report,
            unit,
            unit_explicit,
            &mut props.unit_instances,
            &mut props.default_unit_instance,
        );

        LinkedScalar {
            properties: props,
            unit_quantity: unit.and_then(|u| u.quantity.clone()),
            diagnostics: report.diagnostics,
        }
    }

    // ==========================================================================
    // Vectors, groups and members
    // ==========================================================================

    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn link_vector(
        &self,
        identity: &TypeIdentity,
        mut props: VectorProperties,
        requester: Requester,
    ) -> LinkedVector {
        let mut report = self.report(identity);

        let unit = self.link_unit(&mut report, &mut props.unit);
        let unit_explicit = props.unit.is_explicit();

        if let Some(scalar) = props.scalar.flatten() {
            if self.directory.scalar_kind(scalar).is_none() {
                let error = self.reference_error(identity, PropertyName::Scalar, scalar, SCALAR);
                report.error(props.scalar.is_explicit(), error);
                props.scalar.clear();
            }
        }

        if !self.difference_disabled(
            &mut report,
            &mut props.difference,
            &props.implement_difference,
        ) {
            self.link_vector_difference(&mut report, &mut props, requester);
        }

        self.link_instances(
            &mut report,
            unit,
            unit_explicit,
            &mut props.unit_instances,
            &mut props.default_unit_instance,
        );

        LinkedVector {
            properties: props,
            diagnostics: report.diagnostics,
        }
    }

    /// A member's bag before linking: its overrides, its own dimension, and
    /// everything else from the group's linked bag.
    pub fn compose_member(
        member: &GroupMemberDeclaration,
        group: Option<&VectorProperties>,
    ) -> VectorProperties {
        let mut props = member.overrides.clone();
        props.dimension = Property::Explicit(member.dimension);
        if let Some(group) = group {
            props.inherit_from(group);
        }
        props
    }

    /// Link a member bag composed by [`Linker::compose_member`].
    pub fn link_member(&self, member: &GroupMemberDeclaration, props: VectorProperties) -> LinkedVector {
        self.link_vector(&member.identity, props, Requester::Vector(Some(member.dimension)))
    }

    /// Error for a member whose group is not a declared vector group.
    pub fn missing_group(&self, member: &GroupMemberDeclaration) -> Diagnostic {
        Diagnostic::error(self.reference_error(
            &member.identity,
            PropertyName::Group,
            &member.group,
            GROUP,
        ))
    }

    fn link_vector_difference(
        &self,
        report: &mut Report<'_>,
        props: &mut VectorProperties,
        requester: Requester,
    ) {
        let Some(target) = props.difference.flatten().cloned() else {
            return;
        };
        let identity = report.identity;
        let explicit = props.difference.is_explicit();

        match (self.directory.vector_kind(&target), requester) {
            (Some(DeclarationKind::VectorGroup), Requester::Group) => {}
            (Some(DeclarationKind::VectorGroup), Requester::Vector(None)) => {
                props.difference.clear();
            }
            (Some(DeclarationKind::VectorGroup), Requester::Vector(Some(dimension))) => {
                let members = self.directory.group_members(&target);
                match members.and_then(|m| m.get(&dimension)) {
                    Some(member) => {
                        trace!(identity = %identity, group = %target, member = %member, "difference picks group member");
                        props.difference.replace(Some(member.clone()));
                    }
                    None => {
                        report.error(
                            true,
                            ResolutionError::DimensionMismatch {
                                identity: identity.clone(),
                                property: PropertyName::Difference,
                                target: target.clone(),
                                requested: dimension,
                                available: members
                                    .map(|m| m.keys().copied().collect())
                                    .unwrap_or_default(),
                            },
                        );
                        props.difference.clear();
                    }
                }
            }
            (Some(found @ (DeclarationKind::Vector | DeclarationKind::GroupMember)), Requester::Group) => {
                report.error(
                    explicit,
                    ResolutionError::WrongKindReference {
                        identity: identity.clone(),
                        property: PropertyName::Difference,
                        target: target.clone(),
                        expected: GROUP,
                        found,
                    },
                );
                props.difference.clear();
            }
            (Some(DeclarationKind::Vector | DeclarationKind::GroupMember), Requester::Vector(dimension)) => {
                let Some(dimension) = dimension else {
                    props.difference.clear();
                    return;
                };
                let found = self.directory.vector_dimension(&target);
                if found != Some(dimension) {
                    report.error(
                        explicit || props.dimension.is_explicit(),
                        ResolutionError::DimensionMismatch {
                            identity: identity.clone(),
                            property: PropertyName::Difference,
                            target: target.clone(),
                            requested: dimension,
                            available: found.into_iter().collect(),
                        },
                    );
                    props.difference.clear();
                }
            }
            (_, requester) => {
                let expected = match requester {
                    Requester::Vector(_) => VECTOR_OR_GROUP,
                    Requester::Group => GROUP,
                };
                let error = self.reference_error(identity, PropertyName::Difference, &target, expected);
                report.error(explicit, error);
                props.difference.clear();
            }
        }
    }

    // ==========================================================================
    // Shared slots
    // ==========================================================================

    /// Link the `unit` slot. Returns the resolved unit if it linked.
    fn link_unit(
        &self,
        report: &mut Report<'_>,
        slot: &mut Property<TypeIdentity>,
    ) -> Option<&'a ResolvedUnit> {
        let target = slot.value()?;
        if let Some(unit) = self.directory.unit(target) {
            return Some(unit);
        }
        let error = self.reference_error(report.identity, PropertyName::Unit, target, UNIT);
        report.error(slot.is_explicit(), error);
        slot.clear();
        None
    }

    /// Clear `difference` when `implement_difference` is off. Returns whether
    /// it was cleared.
    fn difference_disabled(
        &self,
        report: &mut Report<'_>,
        difference: &mut Property<Option<TypeIdentity>>,
        implement_difference: &Property<bool>,
    ) -> bool {
        if difference.flatten().is_none() || implement_difference.value() != Some(&false) {
            return false;
        }
        report.inconsistent(
            difference.is_explicit() || implement_difference.is_explicit(),
            PropertyName::Difference,
            PropertyName::ImplementDifference,
        );
        difference.clear();
        true
    }

    /// Check the instance selection and default instance against the unit.
    fn link_instances(
        &self,
        report: &mut Report<'_>,
        unit: Option<&ResolvedUnit>,
        unit_explicit: bool,
        selection: &mut Property<InstanceSelection>,
        default: &mut Property<Option<String>>,
    ) {
        let identity = report.identity;
        let Some(unit) = unit else {
            default.clear();
            return;
        };

        let selection_explicit = selection.is_explicit();
        if let Property::Explicit(selected) | Property::Inherited(selected) = selection {
            let mut missing = Vec::new();
            selected.retain(|name| {
                let known = unit.has_instance(name);
                if !known {
                    missing.push(name.to_string());
                }
                known
            });
            for name in missing {
                report.error(
                    selection_explicit || unit_explicit,
                    ResolutionError::UnresolvedReference {
                        identity: identity.clone(),
                        property: PropertyName::UnitInstances,
                        target: name,
                    },
                );
            }
        }

        let Some(name) = default.flatten() else {
            return;
        };
        let default_explicit = default.is_explicit();
        if !unit.has_instance(name) {
            report.error(
                default_explicit || unit_explicit,
                ResolutionError::UnresolvedReference {
                    identity: identity.clone(),
                    property: PropertyName::DefaultUnitInstance,
                    target: name.clone(),
                },
            );
            default.clear();
        } else if selection.value().is_some_and(|s| !s.admits(name)) {
            report.inconsistent(
                default_explicit || selection_explicit,
                PropertyName::DefaultUnitInstance,
                PropertyName::UnitInstances,
            );
            default.clear();
        }
    }
}
