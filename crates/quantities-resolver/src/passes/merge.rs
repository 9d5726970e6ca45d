//! Foreign Population Merger.
//!
//! Folds entries resolved by another compilation unit into the store. A
//! foreign entry whose identity is already taken in its own namespace,
//! locally or by an earlier merge, is dropped: the local declaration wins.
//!
//! After a merge, local declarations that name a newly added identity may
//! resolve differently. [`affected_closure`] finds them, together with
//! everything that inherits from them, so that only that part of the local
//! population is resolved again.

use std::collections::VecDeque;

use rustc_hash::FxHashSet;
use tracing::{debug, instrument};

use quantities_core::{
    DeclarationKind, Diagnostic, DiagnosticCode, Origin, PropertyName, ResolutionError,
    ResolvedEntry, TypeIdentity,
};
use quantities_registry::{Populations, ResolvedStore};

use crate::CollisionPolicy;

/// Result of folding one foreign store into the local one.
#[derive(Debug, Default)]
pub struct MergeOutcome {
    /// Foreign identities now in the store.
    pub added: Vec<TypeIdentity>,
    /// Foreign identities dropped in favour of an existing entry.
    pub shadowed: Vec<TypeIdentity>,
    /// `ForeignCollision` warnings, with [`CollisionPolicy::Diagnose`].
    pub diagnostics: Vec<Diagnostic>,
}

impl MergeOutcome {
    fn shadow(&mut self, identity: TypeIdentity, kind: DeclarationKind, policy: CollisionPolicy) {
        match policy {
            CollisionPolicy::LocalWins => {
                debug!(identity = %identity, kind = %kind, "foreign entry shadowed");
            }
            CollisionPolicy::Diagnose => {
                self.diagnostics
                    .push(Diagnostic::warning(ResolutionError::ForeignCollision {
                        identity: identity.clone(),
                        kind,
                    }));
            }
        }
        self.shadowed.push(identity);
    }
}

/// Whether `identity` is taken in the namespace an entry of `kind` lives in.
fn occupied(
    populations: &Populations,
    store: &ResolvedStore,
    kind: DeclarationKind,
    identity: &TypeIdentity,
) -> bool {
    match kind {
        DeclarationKind::Unit => {
            populations.units.contains(identity) || store.units.contains(identity)
        }
        DeclarationKind::Scalar => {
            populations.scalars.contains(identity) || store.scalars.contains(identity)
        }
        DeclarationKind::Vector | DeclarationKind::VectorGroup | DeclarationKind::GroupMember => {
            populations.vector_kind(identity).is_some() || store.vector_kind(identity).is_some()
        }
    }
}

/// Insert every foreign entry whose identity is free, marked [`Origin::Foreign`].
#[cfg_attr(feature = "profiling", profiling::function)]
#[instrument(skip_all, name = "merge")]
pub fn merge_into_store(
    populations: &Populations,
    store: &mut ResolvedStore,
    foreign: ResolvedStore,
    policy: CollisionPolicy,
) -> MergeOutcome {
    let mut outcome = MergeOutcome::default();

    for mut unit in foreign.units {
        let identity = unit.identity().clone();
        if occupied(populations, store, DeclarationKind::Unit, &identity) {
            outcome.shadow(identity, DeclarationKind::Unit, policy);
            continue;
        }
        unit.origin = Origin::Foreign;
        if store.units.insert(unit).is_ok() {
            outcome.added.push(identity);
        }
    }

    for mut scalar in foreign.scalars {
        let identity = scalar.identity.clone();
        if occupied(populations, store, scalar.kind(), &identity) {
            outcome.shadow(identity, scalar.kind(), policy);
            continue;
        }
        scalar.origin = Origin::Foreign;
        if store.scalars.insert(scalar).is_ok() {
            outcome.added.push(identity);
        }
    }

    for mut vector in foreign.vectors {
        let identity = vector.identity.clone();
        if occupied(populations, store, vector.kind(), &identity) {
            outcome.shadow(identity, vector.kind(), policy);
            continue;
        }
        vector.origin = Origin::Foreign;
        if store.vectors.insert(vector).is_ok() {
            outcome.added.push(identity);
        }
    }

    for mut group in foreign.groups {
        let identity = group.identity.clone();
        if occupied(populations, store, group.kind(), &identity) {
            outcome.shadow(identity, group.kind(), policy);
            continue;
        }
        group.origin = Origin::Foreign;
        if store.groups.insert(group).is_ok() {
            outcome.added.push(identity);
        }
    }

    debug!(
        added = outcome.added.len(),
        shadowed = outcome.shadowed.len(),
        "foreign entries merged"
    );
    outcome
}

/// Local declarations to re-resolve after `added` entered the store.
///
/// Seeds with the declarations that name an added identity, then follows
/// specializations, group members and references until nothing new turns up.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn affected_closure(populations: &Populations, added: &[TypeIdentity]) -> FxHashSet<TypeIdentity> {
    let mut seen: FxHashSet<TypeIdentity> = FxHashSet::default();
    let mut queue: VecDeque<TypeIdentity> = VecDeque::new();

    for identity in added {
        for referrer in populations.referrers_of(identity) {
            if seen.insert(referrer.clone()) {
                queue.push_back(referrer.clone());
            }
        }
    }

    while let Some(identity) = queue.pop_front() {
        let next = populations
            .dependents_of(&identity)
            .chain(populations.referrers_of(&identity));
        for dependent in next {
            if seen.insert(dependent.clone()) {
                queue.push_back(dependent.clone());
            }
        }
    }

    seen
}

/// Whether a diagnostic is recomputed when `scope` is resolved again.
///
/// Population-building diagnostics (duplicates, collisions, group
/// dimensions) are not.
pub fn is_stale(scope: &FxHashSet<TypeIdentity>, diagnostic: &Diagnostic) -> bool {
    let code = diagnostic.code();
    scope.contains(diagnostic.identity())
        && !code.is_build_stage()
        && !(code == DiagnosticCode::InconsistentFlagValue
            && diagnostic.property() == PropertyName::Dimension)
}
