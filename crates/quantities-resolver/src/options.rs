//! Resolver configuration and cooperative cancellation.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use quantities_core::{ResolveError, Severity};

/// What to do when a foreign entry has the identity of a local declaration.
///
/// The local declaration wins either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollisionPolicy {
    /// Drop the foreign entry, logged at debug level only.
    #[default]
    LocalWins,
    /// Drop the foreign entry and report a `ForeignCollision` warning.
    Diagnose,
}

/// Options for a [`Resolver`](crate::Resolver).
#[derive(Debug, Clone)]
pub struct ResolverOptions {
    /// Resolve the scalar and vector branches concurrently.
    pub parallel: bool,
    pub foreign_collisions: CollisionPolicy,
    /// Severity of `InconsistentFlagValue` diagnostics.
    pub inconsistent_flag_severity: Severity,
    pub cancellation: Option<CancellationToken>,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            parallel: false,
            foreign_collisions: CollisionPolicy::LocalWins,
            inconsistent_flag_severity: Severity::Warning,
            cancellation: None,
        }
    }
}

impl ResolverOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_foreign_collisions(mut self, policy: CollisionPolicy) -> Self {
        self.foreign_collisions = policy;
        self
    }

    pub fn with_inconsistent_flag_severity(mut self, severity: Severity) -> Self {
        self.inconsistent_flag_severity = severity;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Fails with [`ResolveError::Cancelled`] once the token is triggered.
    pub fn checkpoint(&self) -> Result<(), ResolveError> {
        match &self.cancellation {
            Some(token) => token.checkpoint(),
            None => Ok(()),
        }
    }
}

/// Shared flag a host sets to abandon a pass whose inputs went stale.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    pub fn checkpoint(&self) -> Result<(), ResolveError> {
        if self.is_cancelled() {
            Err(ResolveError::Cancelled)
        } else {
            Ok(())
        }
    }
}
