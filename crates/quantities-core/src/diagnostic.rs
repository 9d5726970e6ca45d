//! Diagnostics and the collector shared by every stage.
//!
//! Stages report into a [`DiagnosticsCollector`]. The collector keeps report
//! order and drops repeats of the same `(identity, property, code)` key, so a
//! broken ancestor does not flood the output once per descendant.

use rustc_hash::FxHashSet;

use crate::{DiagnosticCode, PropertyName, ResolutionError, TypeIdentity};

/// Severity of a diagnostic. Whether any severity blocks code generation is
/// the host's decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

/// A reported problem with one declaration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Diagnostic {
    pub severity: Severity,
    pub error: ResolutionError,
}

impl Diagnostic {
    pub fn new(severity: Severity, error: ResolutionError) -> Self {
        Self { severity, error }
    }

    pub fn error(error: ResolutionError) -> Self {
        Self::new(Severity::Error, error)
    }

    pub fn warning(error: ResolutionError) -> Self {
        Self::new(Severity::Warning, error)
    }

    pub fn code(&self) -> DiagnosticCode {
        self.error.code()
    }

    pub fn identity(&self) -> &TypeIdentity {
        self.error.identity()
    }

    pub fn property(&self) -> PropertyName {
        self.error.property()
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Deduplication key.
    pub fn key(&self) -> DiagnosticKey {
        DiagnosticKey {
            identity: self.identity().clone(),
            property: self.property(),
            code: self.code(),
        }
    }
}

impl From<ResolutionError> for Diagnostic {
    fn from(error: ResolutionError) -> Self {
        Diagnostic::error(error)
    }
}

/// `(identity, property, code)` triple used for deduplication.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DiagnosticKey {
    pub identity: TypeIdentity,
    pub property: PropertyName,
    pub code: DiagnosticCode,
}

/// Ordered, deduplicating diagnostics accumulator.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticsCollector {
    diagnostics: Vec<Diagnostic>,
    seen: FxHashSet<DiagnosticKey>,
}

impl DiagnosticsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic. Returns `false` if its key was already reported.
    pub fn report(&mut self, diagnostic: Diagnostic) -> bool {
        if self.seen.insert(diagnostic.key()) {
            self.diagnostics.push(diagnostic);
            true
        } else {
            false
        }
    }

    pub fn error(&mut self, error: ResolutionError) -> bool {
        self.report(Diagnostic::error(error))
    }

    pub fn warning(&mut self, error: ResolutionError) -> bool {
        self.report(Diagnostic::warning(error))
    }

    pub fn extend(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        for diagnostic in diagnostics {
            self.report(diagnostic);
        }
    }

    /// Drop every diagnostic about one of `identities`.
    ///
    /// Used before re-resolving those declarations.
    pub fn forget(&mut self, identities: &FxHashSet<TypeIdentity>) {
        self.forget_where(|d| identities.contains(d.identity()));
    }

    /// Drop every diagnostic matching `stale`; its key may be reported again.
    pub fn forget_where(&mut self, mut stale: impl FnMut(&Diagnostic) -> bool) {
        self.diagnostics.retain(|d| !stale(d));
        self.seen = self.diagnostics.iter().map(Diagnostic::key).collect();
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.diagnostics.len() - self.error_count()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.diagnostics.iter()
    }

    pub fn as_slice(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

impl From<Vec<Diagnostic>> for DiagnosticsCollector {
    fn from(diagnostics: Vec<Diagnostic>) -> Self {
        let mut collector = Self::new();
        collector.extend(diagnostics);
        collector
    }
}

impl IntoIterator for DiagnosticsCollector {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.diagnostics.into_iter()
    }
}

impl<'a> IntoIterator for &'a DiagnosticsCollector {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.diagnostics.iter()
    }
}
