//! Quantities Core
//!
//! Shared data model for quantity type resolution.
//!
//! ## Modules
//!
//! - [`declarations`]: Raw unit, scalar, vector and group declarations
//! - [`diagnostic`]: Severity, diagnostics and the deduplicating collector
//! - [`error`]: Diagnostic taxonomy and pipeline errors
//! - [`fingerprint`]: Chain fingerprints for the resolution cache
//! - [`property`]: Tri-state property slots
//! - [`resolved`]: Resolved declarations consumed by code generation

pub mod declarations;
pub mod diagnostic;
pub mod error;
pub mod fingerprint;
mod identity;
pub mod property;
pub mod resolved;
mod span;

pub use declarations::{
    DeclarationKind, DeclarationSet, DeclarationStats, GroupDeclaration, GroupDefinition,
    GroupMemberDeclaration, Identified, Inheritable, InstanceDefinition, InstanceRef,
    InstanceSelection, PowerRelation, Prefix, ScalarDeclaration, ScalarDefinition,
    ScalarProperties, Shape, Specializable, UnitDeclaration, UnitInstance, VectorDeclaration,
    VectorDefinition, VectorProperties,
};
pub use diagnostic::{Diagnostic, DiagnosticKey, DiagnosticsCollector, Severity};
pub use error::{DiagnosticCode, PropertyName, ResolutionError, ResolveError};
pub use fingerprint::{Fingerprint, FingerprintBuilder, fingerprint_constants};
pub use identity::TypeIdentity;
pub use property::Property;
pub use resolved::{
    Origin, ResolvedEntry, ResolvedGroup, ResolvedScalar, ResolvedUnit, ResolvedVector, Status,
};
pub use span::Span;
