//! Quantities Registry
//!
//! Identity-indexed storage for declarations and resolved entries.
//!
//! - [`Population`]: insertion-ordered map keyed by `TypeIdentity`
//! - [`Populations`]: the unit, scalar and vector namespaces
//! - [`PopulationBuilder`]: raw declarations to populations, with duplicate detection
//! - [`ResolvedStore`]: resolved entries consumed by code generation

mod builder;
mod population;
mod populations;
mod store;

pub use builder::{BuildOutput, PopulationBuilder};
pub use population::Population;
pub use populations::Populations;
pub use store::{ResolutionStats, ResolvedStore};
