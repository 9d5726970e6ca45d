//! Population Builder - index raw declarations by identity.
//!
//! A single pass over the five input collections, in order. Every entry is
//! inserted if its identity is free in its namespace; a collision reports
//! both sites and keeps the first-seen entry. Declarations that named the
//! dropped entry surface as unresolved references later on.
//!
//! Besides identity collisions the builder also drops:
//!
//! - repeated instance names within one unit ([`ResolutionError::DuplicateInstance`])
//! - a second member for an occupied (group, dimension) slot
//! - a dimension set on a group specialization (groups have none)

use rustc_hash::FxHashMap;
use tracing::{debug, instrument, trace};

use quantities_core::{
    DeclarationKind, DeclarationSet, DeclarationStats, Diagnostic, DiagnosticsCollector,
    GroupDeclaration, Property, PropertyName, ResolutionError, Severity, Shape, Span,
    UnitDeclaration,
};

use crate::Populations;

/// Output of the population builder.
#[derive(Debug, Default)]
pub struct BuildOutput {
    pub populations: Populations,
    pub diagnostics: DiagnosticsCollector,
    /// Counts over the raw input.
    pub stats: DeclarationStats,
}

/// Builds [`Populations`] from a [`DeclarationSet`].
#[derive(Debug, Clone, Copy)]
pub struct PopulationBuilder {
    flag_severity: Severity,
}

impl Default for PopulationBuilder {
    fn default() -> Self {
        Self {
            flag_severity: Severity::Warning,
        }
    }
}

impl PopulationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Severity used for inconsistent flag values.
    pub fn with_flag_severity(mut self, severity: Severity) -> Self {
        self.flag_severity = severity;
        self
    }

    #[cfg_attr(feature = "profiling", profiling::function)]
    #[instrument(skip_all, name = "build_populations")]
    pub fn build(self, set: DeclarationSet) -> BuildOutput {
        let stats = DeclarationStats::from(&set);
        let mut populations = Populations::new();
        let mut diagnostics = DiagnosticsCollector::new();

        for unit in set.units {
            let unit = dedup_instances(unit, &mut diagnostics);
            if let Err(duplicate) = populations.insert_unit(unit) {
                let first = span_of(populations.units.get(&duplicate.identity));
                report_duplicate(&mut diagnostics, DeclarationKind::Unit, &duplicate, first);
            }
        }

        for scalar in set.scalars {
            if let Err(duplicate) = populations.insert_scalar(scalar) {
                let first = span_of(populations.scalars.get(&duplicate.identity));
                report_duplicate(&mut diagnostics, DeclarationKind::Scalar, &duplicate, first);
            }
        }

        for vector in set.vectors {
            if let Err(duplicate) = populations.insert_vector(vector) {
                let first = vector_namespace_span(&populations, &duplicate.identity);
                report_duplicate(&mut diagnostics, DeclarationKind::Vector, &duplicate, first);
            }
        }

        for group in set.groups {
            let group = self.strip_group_dimension(group, &mut diagnostics);
            if let Err(duplicate) = populations.insert_group(group) {
                let first = vector_namespace_span(&populations, &duplicate.identity);
                report_duplicate(
                    &mut diagnostics,
                    DeclarationKind::VectorGroup,
                    &duplicate,
                    first,
                );
            }
        }

        for member in set.members {
            if let Some(occupant) = populations.member_at(&member.group, member.dimension) {
                trace!(member = %member.identity, occupant = %occupant, "group slot taken");
                diagnostics.error(ResolutionError::DuplicateGroupMember {
                    identity: member.group.clone(),
                    dimension: member.dimension,
                    first: occupant.clone(),
                    duplicate: member.identity,
                });
                continue;
            }
            if let Err(duplicate) = populations.insert_member(member) {
                let first = vector_namespace_span(&populations, &duplicate.identity);
                report_duplicate(
                    &mut diagnostics,
                    DeclarationKind::GroupMember,
                    &duplicate,
                    first,
                );
            }
        }

        debug!(
            units = populations.units.len(),
            scalars = populations.scalars.len(),
            vectors = populations.vectors.len(),
            groups = populations.groups.len(),
            members = populations.members.len(),
            diagnostics = diagnostics.len(),
            "populations built"
        );

        BuildOutput {
            populations,
            diagnostics,
            stats,
        }
    }

    fn strip_group_dimension(
        &self,
        mut group: GroupDeclaration,
        diagnostics: &mut DiagnosticsCollector,
    ) -> GroupDeclaration {
        if let Shape::Specialization { overrides, .. } = &mut group.shape {
            if overrides.dimension.is_set() {
                overrides.dimension = Property::Unset;
                diagnostics.report(Diagnostic::new(
                    self.flag_severity,
                    ResolutionError::InconsistentFlagValue {
                        identity: group.identity.clone(),
                        property: PropertyName::Dimension,
                        flag: PropertyName::Group,
                    },
                ));
            }
        }
        group
    }
}

/// Keep the first instance of each name.
fn dedup_instances(mut unit: UnitDeclaration, diagnostics: &mut DiagnosticsCollector) -> UnitDeclaration {
    let mut first_seen: FxHashMap<String, Span> = FxHashMap::default();
    let identity = unit.identity.clone();
    unit.instances.retain(|instance| match first_seen.get(&instance.name) {
        Some(&first) => {
            diagnostics.error(ResolutionError::DuplicateInstance {
                identity: identity.clone(),
                instance: instance.name.clone(),
                first,
                duplicate: instance.span,
            });
            false
        }
        None => {
            first_seen.insert(instance.name.clone(), instance.span);
            true
        }
    });
    unit
}

fn span_of<T: quantities_core::Identified>(entry: Option<&T>) -> Span {
    entry.map(|e| e.span()).unwrap_or_default()
}

fn vector_namespace_span(
    populations: &Populations,
    identity: &quantities_core::TypeIdentity,
) -> Span {
    populations
        .vectors
        .get(identity)
        .map(|v| v.span)
        .or_else(|| populations.groups.get(identity).map(|g| g.span))
        .or_else(|| populations.members.get(identity).map(|m| m.span))
        .unwrap_or_default()
}

fn report_duplicate<T: quantities_core::Identified>(
    diagnostics: &mut DiagnosticsCollector,
    kind: DeclarationKind,
    duplicate: &T,
    first: Span,
) {
    debug!(identity = %duplicate.identity(), %kind, "duplicate identity dropped");
    diagnostics.error(ResolutionError::DuplicateIdentity {
        identity: duplicate.identity().clone(),
        kind,
        first,
        duplicate: duplicate.span(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use quantities_core::{
        DiagnosticCode, GroupDefinition, GroupMemberDeclaration, ScalarDeclaration,
        ScalarDefinition, TypeIdentity, UnitInstance, VectorDeclaration, VectorDefinition,
        VectorProperties,
    };

    fn codes(output: &BuildOutput) -> Vec<DiagnosticCode> {
        output.diagnostics.iter().map(|d| d.code()).collect()
    }

    #[test]
    fn empty_input_builds_empty_populations() {
        let output = PopulationBuilder::new().build(DeclarationSet::new());
        assert!(output.populations.is_empty());
        assert!(output.diagnostics.is_empty());
    }

    #[test]
    fn duplicate_identity_keeps_first_and_names_both_sites() {
        let set = DeclarationSet::new()
            .with_scalar(ScalarDeclaration::base(
                "Length",
                Span::point(1, 1),
                ScalarDefinition::new("UnitOfLength"),
            ))
            .with_scalar(ScalarDeclaration::base(
                "Length",
                Span::point(9, 1),
                ScalarDefinition::new("UnitOfTime"),
            ));
        let output = PopulationBuilder::new().build(set);

        let kept = output
            .populations
            .scalars
            .get(&TypeIdentity::global("Length"))
            .unwrap();
        assert_eq!(kept.span, Span::point(1, 1));

        match &output.diagnostics.as_slice()[0].error {
            ResolutionError::DuplicateIdentity {
                kind,
                first,
                duplicate,
                ..
            } => {
                assert_eq!(*kind, DeclarationKind::Scalar);
                assert_eq!(*first, Span::point(1, 1));
                assert_eq!(*duplicate, Span::point(9, 1));
            }
            other => panic!("unexpected diagnostic: {:?}", other),
        }
    }

    #[test]
    fn vector_and_group_collide() {
        let set = DeclarationSet::new()
            .with_vector(VectorDeclaration::base(
                "Position",
                Span::point(2, 1),
                VectorDefinition::new("UnitOfLength", 3),
            ))
            .with_group(GroupDeclaration::base(
                "Position",
                Span::point(5, 1),
                GroupDefinition::new("UnitOfLength"),
            ));
        let output = PopulationBuilder::new().build(set);
        assert_eq!(codes(&output), vec![DiagnosticCode::DuplicateIdentity]);
        assert!(output.populations.groups.is_empty());
    }

    #[test]
    fn duplicate_instances_are_dropped() {
        let set = DeclarationSet::new().with_unit(
            UnitDeclaration::new("UnitOfLength", Span::default())
                .with_instance(UnitInstance::fixed("Metre", "Metres", 1.0))
                .with_instance(UnitInstance::fixed("Metre", "Meters", 1.0)),
        );
        let output = PopulationBuilder::new().build(set);
        let unit = output
            .populations
            .units
            .get(&TypeIdentity::global("UnitOfLength"))
            .unwrap();
        assert_eq!(unit.instances.len(), 1);
        assert_eq!(unit.instances[0].plural, "Metres");
        assert_eq!(codes(&output), vec![DiagnosticCode::DuplicateInstance]);
    }

    #[test]
    fn second_member_for_dimension_is_rejected() {
        let set = DeclarationSet::new()
            .with_member(GroupMemberDeclaration::new(
                "Position3",
                Span::default(),
                "Position",
                3,
            ))
            .with_member(GroupMemberDeclaration::new(
                "Point3",
                Span::default(),
                "Position",
                3,
            ));
        let output = PopulationBuilder::new().build(set);
        assert_eq!(codes(&output), vec![DiagnosticCode::DuplicateGroupMember]);
        assert!(!output.populations.members.contains(&TypeIdentity::global("Point3")));
    }

    #[test]
    fn group_specialization_dimension_is_cleared() {
        let set = DeclarationSet::new().with_group(GroupDeclaration::specialization(
            "Displacement",
            Span::default(),
            "Position",
            VectorProperties::new().with_dimension(3),
        ));
        let output = PopulationBuilder::new()
            .with_flag_severity(Severity::Error)
            .build(set);

        let group = output
            .populations
            .groups
            .get(&TypeIdentity::global("Displacement"))
            .unwrap();
        match &group.shape {
            Shape::Specialization { overrides, .. } => assert!(overrides.dimension.is_unset()),
            Shape::Base(_) => panic!("expected specialization"),
        }
        let diagnostic = &output.diagnostics.as_slice()[0];
        assert_eq!(diagnostic.code(), DiagnosticCode::InconsistentFlagValue);
        assert!(diagnostic.is_error());
    }

    #[test]
    fn stats_reflect_raw_input() {
        let set = DeclarationSet::new()
            .with_scalar(ScalarDeclaration::base(
                "Length",
                Span::default(),
                ScalarDefinition::new("UnitOfLength"),
            ))
            .with_scalar(ScalarDeclaration::base(
                "Length",
                Span::default(),
                ScalarDefinition::new("UnitOfLength"),
            ));
        let output = PopulationBuilder::new().build(set);
        assert_eq!(output.stats.scalar_bases, 2);
        assert_eq!(output.populations.scalars.len(), 1);
    }
}
