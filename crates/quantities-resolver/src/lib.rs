//! Quantities Resolver
//!
//! Turns deduplicated quantity declarations into a resolved store.
//!
//! ## Modules
//!
//! - [`passes`]: unit, chain, link and merge passes
//! - [`pipeline`]: the [`Resolver`] driving the passes, and its [`Resolution`]
//! - [`cache`]: chain outcomes reused across runs
//! - [`directory`]: name lookups across populations and the store
//! - [`options`]: parallelism, collision policy, severities and cancellation

pub mod cache;
pub mod directory;
pub mod options;
pub mod passes;
pub mod pipeline;

pub use cache::{ChainCache, ResolutionCache};
pub use directory::Directory;
pub use options::{CancellationToken, CollisionPolicy, ResolverOptions};
pub use passes::{ChainOutcome, ChainStats, Linker, MergeOutcome, Requester};
pub use pipeline::{MergeReport, Resolution, Resolver};
