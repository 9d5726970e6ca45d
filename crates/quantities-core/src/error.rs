//! Diagnostic taxonomy for population building and resolution.
//!
//! Every problem found while building populations or resolving declarations is
//! a [`ResolutionError`]. None of them stop the pipeline: each one is attached to
//! a single declaration (and usually a single property of it), which resolves
//! absent while everything else carries on.
//!
//! ## Taxonomy
//!
//! ```text
//! ResolutionError
//! ├── DuplicateIdentity          - same identity declared twice in one population
//! ├── DuplicateInstance          - same unit-instance name twice in one unit
//! ├── DuplicateGroupMember       - two members for one (group, dimension)
//! ├── UnresolvedReference        - named reference not found anywhere
//! ├── WrongKindReference         - named reference found, but of another kind
//! ├── CircularSpecialization     - specialization chain loops back on itself
//! ├── CircularInstanceDependency - unit instances defined in terms of each other
//! ├── MissingAncestor            - "original" of a specialization not declared
//! ├── DimensionMismatch          - vector/group lookup misses the requested dimension
//! ├── InconsistentFlagValue      - value set while its controlling flag disables it
//! └── ForeignCollision           - foreign entry shadowed by a local one
//! ```
//!
//! The `Display` impls are terse developer renderings. Formatting diagnostics
//! for end users is left to the host.

use std::fmt;

use thiserror::Error;

use crate::{DeclarationKind, Span, TypeIdentity};

/// Name of the property a diagnostic is about.
///
/// Together with the offending identity and the [`DiagnosticCode`] this forms
/// the deduplication key of a diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PropertyName {
    /// The declaration's own identity (duplicates).
    Identity,
    /// The "original" of a specialization.
    Original,
    Unit,
    Quantity,
    BiasTerm,
    Vector,
    Scalar,
    Dimension,
    Group,
    UseUnitBias,
    ImplementSum,
    ImplementDifference,
    Difference,
    DefaultUnitInstance,
    UnitInstances,
    Reciprocal,
    Square,
    Cube,
    SquareRoot,
    CubeRoot,
    GenerateDocumentation,
    /// A named unit instance.
    Instance(String),
    /// The member slot of a vector group at a dimension.
    Member(u32),
}

impl PropertyName {
    pub fn as_str(&self) -> &str {
        match self {
            PropertyName::Identity => "identity",
            PropertyName::Original => "original",
            PropertyName::Unit => "unit",
            PropertyName::Quantity => "quantity",
            PropertyName::BiasTerm => "bias term",
            PropertyName::Vector => "vector",
            PropertyName::Scalar => "scalar",
            PropertyName::Dimension => "dimension",
            PropertyName::Group => "group",
            PropertyName::UseUnitBias => "use unit bias",
            PropertyName::ImplementSum => "implement sum",
            PropertyName::ImplementDifference => "implement difference",
            PropertyName::Difference => "difference",
            PropertyName::DefaultUnitInstance => "default unit instance",
            PropertyName::UnitInstances => "unit instances",
            PropertyName::Reciprocal => "reciprocal",
            PropertyName::Square => "square",
            PropertyName::Cube => "cube",
            PropertyName::SquareRoot => "square root",
            PropertyName::CubeRoot => "cube root",
            PropertyName::GenerateDocumentation => "generate documentation",
            PropertyName::Instance(name) => name,
            PropertyName::Member(_) => "member",
        }
    }
}

impl fmt::Display for PropertyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyName::Instance(name) => write!(f, "instance '{}'", name),
            PropertyName::Member(dimension) => write!(f, "member of dimension {}", dimension),
            other => f.write_str(other.as_str()),
        }
    }
}

/// Field-less code of a [`ResolutionError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DiagnosticCode {
    DuplicateIdentity,
    DuplicateInstance,
    DuplicateGroupMember,
    UnresolvedReference,
    WrongKindReference,
    CircularSpecialization,
    CircularInstanceDependency,
    MissingAncestor,
    DimensionMismatch,
    InconsistentFlagValue,
    ForeignCollision,
}

impl DiagnosticCode {
    pub fn as_str(self) -> &'static str {
        match self {
            DiagnosticCode::DuplicateIdentity => "duplicate-identity",
            DiagnosticCode::DuplicateInstance => "duplicate-instance",
            DiagnosticCode::DuplicateGroupMember => "duplicate-group-member",
            DiagnosticCode::UnresolvedReference => "unresolved-reference",
            DiagnosticCode::WrongKindReference => "wrong-kind-reference",
            DiagnosticCode::CircularSpecialization => "circular-specialization",
            DiagnosticCode::CircularInstanceDependency => "circular-instance-dependency",
            DiagnosticCode::MissingAncestor => "missing-ancestor",
            DiagnosticCode::DimensionMismatch => "dimension-mismatch",
            DiagnosticCode::InconsistentFlagValue => "inconsistent-flag-value",
            DiagnosticCode::ForeignCollision => "foreign-collision",
        }
    }

    /// Codes reported while building populations or merging, never by resolution.
    pub fn is_build_stage(self) -> bool {
        matches!(
            self,
            DiagnosticCode::DuplicateIdentity
                | DiagnosticCode::DuplicateInstance
                | DiagnosticCode::DuplicateGroupMember
                | DiagnosticCode::ForeignCollision
        )
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A problem with one declaration, carrying unformatted detail.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
pub enum ResolutionError {
    /// Identity declared more than once in the same population; first-seen kept.
    #[error("duplicate {kind} '{identity}' at {duplicate}, first declared at {first}")]
    DuplicateIdentity {
        identity: TypeIdentity,
        kind: DeclarationKind,
        first: Span,
        duplicate: Span,
    },

    /// Unit instance name used twice within one unit; first-seen kept.
    #[error("unit '{identity}' declares instance '{instance}' twice ({first} and {duplicate})")]
    DuplicateInstance {
        identity: TypeIdentity,
        instance: String,
        first: Span,
        duplicate: Span,
    },

    /// A second member for an occupied dimension of a vector group.
    #[error("vector group '{identity}' already has member '{first}' of dimension {dimension}; '{duplicate}' ignored")]
    DuplicateGroupMember {
        identity: TypeIdentity,
        dimension: u32,
        first: TypeIdentity,
        duplicate: TypeIdentity,
    },

    /// A named reference does not exist.
    #[error("'{identity}': {property} refers to unknown '{target}'")]
    UnresolvedReference {
        identity: TypeIdentity,
        property: PropertyName,
        target: String,
    },

    /// A named reference exists but is of the wrong kind.
    #[error("'{identity}': {property} refers to {found} '{target}', expected {}", KindList(.expected))]
    WrongKindReference {
        identity: TypeIdentity,
        property: PropertyName,
        target: TypeIdentity,
        expected: &'static [DeclarationKind],
        found: DeclarationKind,
    },

    /// The specialization chain revisits a declaration.
    #[error("'{identity}' is part of a circular specialization chain ({})", IdentityPath(.cycle))]
    CircularSpecialization {
        identity: TypeIdentity,
        cycle: Vec<TypeIdentity>,
    },

    /// Unit instances defined in terms of each other.
    #[error("unit '{identity}': instance '{instance}' depends on itself ({})", .cycle.join(" -> "))]
    CircularInstanceDependency {
        identity: TypeIdentity,
        instance: String,
        cycle: Vec<String>,
    },

    /// The original of a specialization is not declared anywhere.
    #[error("'{identity}' specializes unknown '{original}'")]
    MissingAncestor {
        identity: TypeIdentity,
        original: TypeIdentity,
    },

    /// The referenced vector or group has no entry of the requested dimension.
    #[error("'{identity}': {property} '{target}' has no dimension {requested} (available: {available:?})")]
    DimensionMismatch {
        identity: TypeIdentity,
        property: PropertyName,
        target: TypeIdentity,
        requested: u32,
        available: Vec<u32>,
    },

    /// A value was set while the flag controlling it disables it.
    #[error("'{identity}': {property} is set but {flag} disables it")]
    InconsistentFlagValue {
        identity: TypeIdentity,
        property: PropertyName,
        flag: PropertyName,
    },

    /// A foreign entry was shadowed by a local entry of the same identity.
    #[error("foreign {kind} '{identity}' is shadowed by a local declaration")]
    ForeignCollision {
        identity: TypeIdentity,
        kind: DeclarationKind,
    },
}

impl ResolutionError {
    /// The field-less code of this error.
    pub fn code(&self) -> DiagnosticCode {
        match self {
            ResolutionError::DuplicateIdentity { .. } => DiagnosticCode::DuplicateIdentity,
            ResolutionError::DuplicateInstance { .. } => DiagnosticCode::DuplicateInstance,
            ResolutionError::DuplicateGroupMember { .. } => DiagnosticCode::DuplicateGroupMember,
            ResolutionError::UnresolvedReference { .. } => DiagnosticCode::UnresolvedReference,
            ResolutionError::WrongKindReference { .. } => DiagnosticCode::WrongKindReference,
            ResolutionError::CircularSpecialization { .. } => {
                DiagnosticCode::CircularSpecialization
            }
            ResolutionError::CircularInstanceDependency { .. } => {
                DiagnosticCode::CircularInstanceDependency
            }
            ResolutionError::MissingAncestor { .. } => DiagnosticCode::MissingAncestor,
            ResolutionError::DimensionMismatch { .. } => DiagnosticCode::DimensionMismatch,
            ResolutionError::InconsistentFlagValue { .. } => DiagnosticCode::InconsistentFlagValue,
            ResolutionError::ForeignCollision { .. } => DiagnosticCode::ForeignCollision,
        }
    }

    /// The offending declaration.
    pub fn identity(&self) -> &TypeIdentity {
        match self {
            ResolutionError::DuplicateIdentity { identity, .. }
            | ResolutionError::DuplicateInstance { identity, .. }
            | ResolutionError::DuplicateGroupMember { identity, .. }
            | ResolutionError::UnresolvedReference { identity, .. }
            | ResolutionError::WrongKindReference { identity, .. }
            | ResolutionError::CircularSpecialization { identity, .. }
            | ResolutionError::CircularInstanceDependency { identity, .. }
            | ResolutionError::MissingAncestor { identity, .. }
            | ResolutionError::DimensionMismatch { identity, .. }
            | ResolutionError::InconsistentFlagValue { identity, .. }
            | ResolutionError::ForeignCollision { identity, .. } => identity,
        }
    }

    /// The property of the offending declaration this error is about.
    pub fn property(&self) -> PropertyName {
        match self {
            ResolutionError::DuplicateIdentity { .. } | ResolutionError::ForeignCollision { .. } => {
                PropertyName::Identity
            }
            ResolutionError::DuplicateInstance { instance, .. }
            | ResolutionError::CircularInstanceDependency { instance, .. } => {
                PropertyName::Instance(instance.clone())
            }
            ResolutionError::DuplicateGroupMember { dimension, .. } => {
                PropertyName::Member(*dimension)
            }
            ResolutionError::CircularSpecialization { .. }
            | ResolutionError::MissingAncestor { .. } => PropertyName::Original,
            ResolutionError::UnresolvedReference { property, .. }
            | ResolutionError::WrongKindReference { property, .. }
            | ResolutionError::DimensionMismatch { property, .. }
            | ResolutionError::InconsistentFlagValue { property, .. } => property.clone(),
        }
    }
}

/// Errors that abort a resolution pass.
///
/// Declaration problems never do; only the host can stop a pass.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// The cancellation token was triggered between iterations.
    #[error("resolution cancelled")]
    Cancelled,
}

struct KindList<'a>(&'a [DeclarationKind]);

impl fmt::Display for KindList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, kind) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" or ")?;
            }
            write!(f, "{}", kind)?;
        }
        Ok(())
    }
}

struct IdentityPath<'a>(&'a [TypeIdentity]);

impl fmt::Display for IdentityPath<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, id) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" -> ")?;
            }
            write!(f, "{}", id)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_exposes_identity_property_and_code() {
        let err = ResolutionError::UnresolvedReference {
            identity: TypeIdentity::global("Length"),
            property: PropertyName::Square,
            target: "Area".to_string(),
        };
        assert_eq!(err.code(), DiagnosticCode::UnresolvedReference);
        assert_eq!(err.identity(), &TypeIdentity::global("Length"));
        assert_eq!(err.property(), PropertyName::Square);
    }

    #[test]
    fn instance_errors_key_on_instance_name() {
        let err = ResolutionError::CircularInstanceDependency {
            identity: TypeIdentity::global("UnitOfLength"),
            instance: "Foot".to_string(),
            cycle: vec!["Foot".to_string(), "Yard".to_string(), "Foot".to_string()],
        };
        assert_eq!(err.property(), PropertyName::Instance("Foot".to_string()));
        assert_eq!(
            err.to_string(),
            "unit 'UnitOfLength': instance 'Foot' depends on itself (Foot -> Yard -> Foot)"
        );
    }

    #[test]
    fn wrong_kind_lists_expected_kinds() {
        let err = ResolutionError::WrongKindReference {
            identity: TypeIdentity::global("Length"),
            property: PropertyName::Vector,
            target: TypeIdentity::global("Time"),
            expected: &[DeclarationKind::Vector, DeclarationKind::VectorGroup],
            found: DeclarationKind::Scalar,
        };
        assert_eq!(
            err.to_string(),
            "'Length': vector refers to scalar 'Time', expected vector or vector group"
        );
    }

    #[test]
    fn cycle_display_lists_path() {
        let err = ResolutionError::CircularSpecialization {
            identity: TypeIdentity::global("A"),
            cycle: vec![
                TypeIdentity::global("A"),
                TypeIdentity::global("B"),
                TypeIdentity::global("A"),
            ],
        };
        assert!(err.to_string().contains("A -> B -> A"));
        assert_eq!(err.property(), PropertyName::Original);
    }
}
