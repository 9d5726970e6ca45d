//! Quantities
//!
//! Resolves quantity, unit and vector declarations into a linked type graph
//! ready for code generation.
//!
//! - [`core`]: identities, declarations, tri-state properties, diagnostics
//! - [`registry`]: populations and the resolved store
//! - [`resolver`]: the pipeline and its passes
//!
//! ```
//! use quantities::prelude::*;
//!
//! let set = DeclarationSet::new()
//!     .with_unit(
//!         UnitDeclaration::new("UnitOfLength", Span::default())
//!             .with_quantity("Length")
//!             .with_instance(UnitInstance::fixed("Metre", "Metres", 1.0)),
//!     )
//!     .with_scalar(ScalarDeclaration::base(
//!         "Length",
//!         Span::default(),
//!         ScalarDefinition::new("UnitOfLength"),
//!     ))
//!     .with_scalar(ScalarDeclaration::specialization(
//!         "Distance",
//!         Span::default(),
//!         "Length",
//!         ScalarProperties::new(),
//!     ));
//!
//! let resolution = quantities::resolve(set).unwrap();
//! let distance = resolution.store().scalar(&"Distance".into()).unwrap();
//! assert_eq!(distance.properties.unit.value(), Some(&"UnitOfLength".into()));
//! ```

pub use quantities_core as core;
pub use quantities_registry as registry;
pub use quantities_resolver as resolver;

use quantities_core::{DeclarationSet, ResolveError};
use quantities_resolver::{Resolution, Resolver};

/// Resolve a declaration set with default options and no cache.
pub fn resolve(set: DeclarationSet) -> Result<Resolution, ResolveError> {
    Resolver::default().resolve(set)
}

pub mod prelude {
    pub use quantities_core::{
        DeclarationKind, DeclarationSet, Diagnostic, DiagnosticCode, DiagnosticsCollector,
        GroupDeclaration, GroupDefinition, GroupMemberDeclaration, InstanceSelection, Origin,
        PowerRelation, Prefix, Property, PropertyName, ResolutionError, ResolveError,
        ScalarDeclaration, ScalarDefinition, ScalarProperties, Severity, Span, Status,
        TypeIdentity, UnitDeclaration, UnitInstance, VectorDeclaration, VectorDefinition,
        VectorProperties,
    };
    pub use quantities_registry::{Populations, ResolvedStore};
    pub use quantities_resolver::{
        CancellationToken, CollisionPolicy, MergeReport, Resolution, Resolver, ResolverOptions,
    };
}
