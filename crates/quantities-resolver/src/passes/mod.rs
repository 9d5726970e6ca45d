//! Resolution passes.
//!
//! - [`units`]: validate unit instances, dependencies first
//! - [`chain`]: fill unset properties along specialization chains
//! - [`link`]: check references across namespaces
//! - [`merge`]: fold foreign entries into the store and find what to re-resolve

pub mod chain;
pub mod link;
pub mod merge;
pub mod units;

pub use chain::{ChainOutcome, ChainOutput, ChainPass, ChainStats};
pub use link::{LinkedScalar, LinkedVector, Linker, Requester};
pub use merge::{MergeOutcome, affected_closure, is_stale, merge_into_store};
pub use units::{UnitOutput, UnitPass};
