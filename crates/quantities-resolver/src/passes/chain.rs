//! Specialization Chain Pass - fill unset properties from ancestors.
//!
//! Generic over the declaration kind: scalars, vectors and vector groups all
//! run the same engine.
//!
//! ## Algorithm
//!
//! For each declaration, walk `original` links upwards until one of:
//!
//! ```text
//! Root      - a base declaration
//! Memo      - an ancestor finished earlier in this pass
//! Resolved  - an ancestor resolved elsewhere (foreign, or kept from a previous pass)
//! Missing   - an original that is not declared anywhere
//! WrongKind - an original declared in another namespace or of another kind
//! Cycle     - an ancestor already on the current walk
//! ```
//!
//! Then unwind top to bottom: each node takes its own explicit slots and
//! inherits the rest from its parent. Every node on the walk is memoized, so
//! an ancestor shared by many descendants is resolved once.
//!
//! Faults are reported only for the node adjacent to them. Cycle members keep
//! their own slots and are broken; so is the last node before a missing
//! ancestor. Descendants of a broken node are broken too, silently.

use std::hash::Hash;
use std::ops::AddAssign;

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, instrument, trace};

use quantities_core::fingerprint_constants::{CYCLE, LINK, MISSING, RESOLVED, ROOT};
use quantities_core::{
    DeclarationKind, Fingerprint, FingerprintBuilder, Inheritable, PropertyName, ResolutionError,
    ResolveError, ResolvedEntry, Specializable, Status, TypeIdentity,
};
use quantities_registry::Population;

use crate::ResolverOptions;
use crate::cache::ChainCache;

/// Chain resolution result of one declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainOutcome<P> {
    /// Own slots plus inherited ones. Links are not checked yet.
    pub properties: P,
    pub status: Status,
    /// Fingerprint of the declaration, its ancestors and the chain end.
    pub fingerprint: Fingerprint,
    /// Chain faults of this declaration (not of its ancestors).
    pub diagnostics: Vec<ResolutionError>,
}

/// Counters of one chain pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ChainStats {
    pub resolved: usize,
    pub broken: usize,
    /// Outcomes taken from the resolution cache.
    pub reused: usize,
}

impl AddAssign for ChainStats {
    fn add_assign(&mut self, other: Self) {
        self.resolved += other.resolved;
        self.broken += other.broken;
        self.reused += other.reused;
    }
}

/// Output of a chain pass.
#[derive(Debug)]
pub struct ChainOutput<P> {
    pub outcomes: FxHashMap<TypeIdentity, ChainOutcome<P>>,
    pub stats: ChainStats,
}

impl<P> Default for ChainOutput<P> {
    fn default() -> Self {
        Self {
            outcomes: FxHashMap::default(),
            stats: ChainStats::default(),
        }
    }
}

enum Slot<P> {
    /// On the current walk.
    Resolving,
    Done(ChainOutcome<P>),
}

enum Terminus<'a, R> {
    Root,
    Memo(TypeIdentity),
    Resolved(&'a R),
    Missing(TypeIdentity),
    WrongKind(TypeIdentity, DeclarationKind),
    /// Index into the walk where the cycle starts.
    Cycle(usize),
}

struct Parent<P> {
    properties: P,
    status: Status,
    fingerprint: Fingerprint,
}

/// Specialization chain pass over one population.
pub struct ChainPass<'a, D, R, F>
where
    D: Specializable,
{
    expected: &'static [DeclarationKind],
    declarations: &'a Population<D>,
    resolved: &'a Population<R>,
    kind_elsewhere: F,
    scope: Option<&'a FxHashSet<TypeIdentity>>,
    cache: Option<&'a mut ChainCache<D::Properties>>,
    memo: FxHashMap<TypeIdentity, Slot<D::Properties>>,
    stats: ChainStats,
}

impl<'a, D, R, F> ChainPass<'a, D, R, F>
where
    D: Specializable + Hash,
    D::Properties: Clone,
    R: ResolvedEntry<Properties = D::Properties> + Hash,
    F: Fn(&TypeIdentity) -> Option<DeclarationKind>,
{
    /// Create a chain pass.
    ///
    /// - `expected`: the kind an original must have, for diagnostics
    /// - `resolved`: entries usable as already-resolved parents
    /// - `kind_elsewhere`: kind of an identity outside this population, if declared
    pub fn new(
        expected: &'static [DeclarationKind],
        declarations: &'a Population<D>,
        resolved: &'a Population<R>,
        kind_elsewhere: F,
    ) -> Self {
        Self {
            expected,
            declarations,
            resolved,
            kind_elsewhere,
            scope: None,
            cache: None,
            memo: FxHashMap::default(),
            stats: ChainStats::default(),
        }
    }

    /// Only walk declarations in `scope`; everything else is read from `resolved`.
    pub fn with_scope(mut self, scope: Option<&'a FxHashSet<TypeIdentity>>) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_cache(mut self, cache: Option<&'a mut ChainCache<D::Properties>>) -> Self {
        self.cache = cache;
        self
    }

    /// Run the pass over every in-scope declaration.
    #[cfg_attr(feature = "profiling", profiling::function)]
    #[instrument(skip_all, name = "chain")]
    pub fn run(mut self, options: &ResolverOptions) -> Result<ChainOutput<D::Properties>, ResolveError> {
        let declarations: &'a Population<D> = self.declarations;
        for declaration in declarations {
            if !self.in_scope(declaration.identity()) {
                continue;
            }
            options.checkpoint()?;
            self.resolve(declaration.identity());
        }

        debug!(
            resolved = self.stats.resolved,
            broken = self.stats.broken,
            reused = self.stats.reused,
            "chains resolved"
        );

        let outcomes = self
            .memo
            .into_iter()
            .filter_map(|(identity, slot)| match slot {
                Slot::Done(outcome) => Some((identity, outcome)),
                Slot::Resolving => None,
            })
            .collect();

        Ok(ChainOutput {
            outcomes,
            stats: self.stats,
        })
    }

    fn in_scope(&self, identity: &TypeIdentity) -> bool {
        self.scope.is_none_or(|scope| scope.contains(identity))
    }

    fn declaration(&self, identity: &TypeIdentity) -> Option<&'a D> {
        let declarations: &'a Population<D> = self.declarations;
        if self.in_scope(identity) {
            declarations.get(identity)
        } else {
            None
        }
    }

    fn resolve(&mut self, identity: &TypeIdentity) {
        if self.memo.contains_key(identity) {
            return;
        }

        let resolved: &'a Population<R> = self.resolved;
        let mut path: Vec<&'a D> = Vec::new();
        let mut cursor = identity.clone();

        let terminus = loop {
            match self.memo.get(&cursor) {
                Some(Slot::Done(_)) => break Terminus::Memo(cursor),
                Some(Slot::Resolving) => {
                    let start = path
                        .iter()
                        .position(|d| d.identity() == &cursor)
                        .unwrap_or(0);
                    break Terminus::Cycle(start);
                }
                None => {}
            }

            match self.declaration(&cursor) {
                Some(declaration) => {
                    self.memo.insert(cursor.clone(), Slot::Resolving);
                    path.push(declaration);
                    match declaration.original() {
                        None => break Terminus::Root,
                        Some(original) => cursor = original.clone(),
                    }
                }
                None => {
                    if let Some(entry) = resolved.get(&cursor) {
                        let found = entry.kind();
                        if self.expected.contains(&found) {
                            break Terminus::Resolved(entry);
                        }
                        break Terminus::WrongKind(cursor, found);
                    }
                    match (self.kind_elsewhere)(&cursor) {
                        Some(found) => break Terminus::WrongKind(cursor, found),
                        None => break Terminus::Missing(cursor),
                    }
                }
            }
        };

        self.unwind(path, terminus);
    }

    fn unwind(&mut self, path: Vec<&'a D>, terminus: Terminus<'a, R>) {
        let Some(last) = path.last() else {
            return;
        };

        let mut end = path.len();
        let mut fault = None;
        let mut terminus_fp = FingerprintBuilder::new();
        let mut parent = None;

        match terminus {
            Terminus::Root => {
                terminus_fp.mark(ROOT);
            }
            Terminus::Memo(identity) => {
                parent = self.parent_from_memo(&identity);
            }
            Terminus::Resolved(entry) => {
                trace!(identity = %last.identity(), parent = %entry.identity(), "chain ends at resolved entry");
                parent = Some(Parent {
                    properties: entry.properties().clone(),
                    status: entry.status(),
                    fingerprint: FingerprintBuilder::new().mix(RESOLVED, entry).finish(),
                });
            }
            Terminus::Missing(original) => {
                terminus_fp.mix(MISSING, &original);
                fault = Some(ResolutionError::MissingAncestor {
                    identity: last.identity().clone(),
                    original,
                });
            }
            Terminus::WrongKind(target, found) => {
                terminus_fp.mix(MISSING, &target).mix(MISSING, &found);
                fault = Some(ResolutionError::WrongKindReference {
                    identity: last.identity().clone(),
                    property: PropertyName::Original,
                    target,
                    expected: self.expected,
                    found,
                });
            }
            Terminus::Cycle(start) => {
                let members = &path[start..];
                let mut cycle_fp = FingerprintBuilder::new();
                cycle_fp.mark(CYCLE);
                for member in members {
                    cycle_fp.mix(LINK, *member);
                }
                let cycle_fp = cycle_fp.finish();

                for (offset, member) in members.iter().enumerate() {
                    let cycle: Vec<TypeIdentity> = members[offset..]
                        .iter()
                        .chain(&members[..offset])
                        .chain(std::iter::once(member))
                        .map(|d| d.identity().clone())
                        .collect();
                    let fault = ResolutionError::CircularSpecialization {
                        identity: member.identity().clone(),
                        cycle,
                    };
                    self.finish(member, None, cycle_fp, Some(fault));
                }

                end = start;
                parent = self.parent_from_memo(path[start].identity());
            }
        }

        let terminus_fp = terminus_fp.finish();
        for declaration in path[..end].iter().rev() {
            let next = self.finish(declaration, parent.as_ref(), terminus_fp, fault.take());
            parent = Some(next);
        }
    }

    fn parent_from_memo(&self, identity: &TypeIdentity) -> Option<Parent<D::Properties>> {
        match self.memo.get(identity) {
            Some(Slot::Done(outcome)) => Some(Parent {
                properties: outcome.properties.clone(),
                status: outcome.status,
                fingerprint: outcome.fingerprint,
            }),
            _ => None,
        }
    }

    /// Resolve one node from its parent and record the outcome.
    fn finish(
        &mut self,
        declaration: &D,
        parent: Option<&Parent<D::Properties>>,
        terminus_fp: Fingerprint,
        fault: Option<ResolutionError>,
    ) -> Parent<D::Properties> {
        let identity = declaration.identity();
        let upstream = parent.map_or(terminus_fp, |p| p.fingerprint);
        let fingerprint = FingerprintBuilder::new()
            .mix(LINK, declaration)
            .mix(LINK, &upstream.0)
            .finish();

        let cached = self
            .cache
            .as_deref()
            .and_then(|cache| cache.lookup(identity, fingerprint))
            .cloned();

        let outcome = match cached {
            Some(outcome) => {
                self.stats.reused += 1;
                outcome
            }
            None => {
                let mut properties = declaration.own_properties();
                let mut status = Status::Resolved;
                if let Some(parent) = parent {
                    properties.inherit_from(&parent.properties);
                    status = parent.status;
                }
                let mut diagnostics = Vec::new();
                if let Some(fault) = fault {
                    trace!(identity = %identity, code = %fault.code(), "chain fault");
                    status = Status::Broken;
                    diagnostics.push(fault);
                }
                let outcome = ChainOutcome {
                    properties,
                    status,
                    fingerprint,
                    diagnostics,
                };
                if let Some(cache) = self.cache.as_deref_mut() {
                    cache.store(identity.clone(), outcome.clone());
                }
                outcome
            }
        };

        if outcome.status.is_broken() {
            self.stats.broken += 1;
        } else {
            self.stats.resolved += 1;
        }

        let next = Parent {
            properties: outcome.properties.clone(),
            status: outcome.status,
            fingerprint: outcome.fingerprint,
        };
        self.memo.insert(identity.clone(), Slot::Done(outcome));
        next
    }
}
