//! The resolution pipeline.
//!
//! ```text
//! DeclarationSet
//!   -> PopulationBuilder        duplicates, group dimensions
//!   -> merge_into_store         foreign entries, optional
//!   -> UnitPass                 instance validity and order
//!   -> scalar branch            chain + link          } concurrently when
//!   -> vector branch            vectors, groups,      } `parallel` is set
//!                               members
//!   -> Resolution               store + diagnostics
//! ```
//!
//! The scalar and vector branches only read the populations and the store,
//! so they can run on two threads. Their results are written back after both
//! finish, and diagnostics are reported in a fixed order: units, scalars,
//! vectors, groups, members.

use rustc_hash::FxHashSet;
use tracing::{debug, info, instrument};

use quantities_core::{
    DeclarationKind, DeclarationSet, DeclarationStats, Diagnostic, DiagnosticsCollector, Origin,
    ResolveError, ResolvedGroup, ResolvedScalar, ResolvedVector, ScalarProperties, Status,
    TypeIdentity, VectorProperties,
};
use quantities_registry::{BuildOutput, PopulationBuilder, Populations, ResolutionStats, ResolvedStore};

use crate::cache::{ChainCache, ResolutionCache};
use crate::passes::{
    ChainPass, ChainStats, Linker, Requester, UnitPass, affected_closure, is_stale,
    merge_into_store,
};
use crate::{Directory, ResolverOptions};

const SCALAR: &[DeclarationKind] = &[DeclarationKind::Scalar];
const VECTOR: &[DeclarationKind] = &[DeclarationKind::Vector];
const GROUP: &[DeclarationKind] = &[DeclarationKind::VectorGroup];

/// Runs the resolution pipeline, keeping a chain cache across runs.
///
/// # Example
///
/// ```
/// use quantities_core::{DeclarationSet, ScalarDeclaration, ScalarDefinition, Span, UnitDeclaration, UnitInstance};
/// use quantities_resolver::Resolver;
///
/// let set = DeclarationSet::new()
///     .with_unit(
///         UnitDeclaration::new("UnitOfLength", Span::default())
///             .with_instance(UnitInstance::fixed("Metre", "Metres", 1.0)),
///     )
///     .with_scalar(ScalarDeclaration::base(
///         "Length",
///         Span::default(),
///         ScalarDefinition::new("UnitOfLength"),
///     ));
///
/// let mut resolver = Resolver::default();
/// let resolution = resolver.resolve(set).unwrap();
/// assert!(resolution.diagnostics().is_empty());
/// assert!(resolution.store().scalar(&"Length".into()).is_some());
/// ```
#[derive(Debug, Default)]
pub struct Resolver {
    options: ResolverOptions,
    cache: ResolutionCache,
}

impl Resolver {
    pub fn new(options: ResolverOptions) -> Self {
        Self {
            options,
            cache: ResolutionCache::new(),
        }
    }

    pub fn options(&self) -> &ResolverOptions {
        &self.options
    }

    pub fn cache(&self) -> &ResolutionCache {
        &self.cache
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Resolve a declaration set on its own.
    pub fn resolve(&mut self, set: DeclarationSet) -> Result<Resolution, ResolveError> {
        self.resolve_with_foreign(set, None)
    }

    /// Resolve a declaration set, with entries resolved by another
    /// compilation unit available from the start.
    #[cfg_attr(feature = "profiling", profiling::function)]
    #[instrument(skip_all, name = "resolve")]
    pub fn resolve_with_foreign(
        &mut self,
        set: DeclarationSet,
        foreign: Option<ResolvedStore>,
    ) -> Result<Resolution, ResolveError> {
        let BuildOutput {
            populations,
            mut diagnostics,
            stats,
        } = PopulationBuilder::new()
            .with_flag_severity(self.options.inconsistent_flag_severity)
            .build(set);

        let mut store = ResolvedStore::new();
        if let Some(foreign) = foreign {
            let merged = merge_into_store(
                &populations,
                &mut store,
                foreign,
                self.options.foreign_collisions,
            );
            diagnostics.extend(merged.diagnostics);
        }

        let run = resolve_scope(
            &populations,
            &mut store,
            None,
            Some(&mut self.cache),
            &self.options,
        )?;
        diagnostics.extend(run.diagnostics);

        let live: FxHashSet<TypeIdentity> = populations
            .scalars
            .identities()
            .chain(populations.vectors.identities())
            .chain(populations.groups.identities())
            .cloned()
            .collect();
        self.cache.retain(&live);

        let resolution = Resolution {
            populations,
            store,
            diagnostics,
            declaration_stats: stats,
            chain_stats: run.chain_stats,
            options: self.options.clone(),
        };
        info!(
            "{} ({} errors, {} warnings)",
            resolution.resolution_stats(),
            resolution.diagnostics.error_count(),
            resolution.diagnostics.warning_count()
        );
        Ok(resolution)
    }
}

/// Summary of [`Resolution::merge_foreign`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MergeReport {
    pub added: Vec<TypeIdentity>,
    pub shadowed: Vec<TypeIdentity>,
    /// Local declarations resolved again.
    pub re_resolved: usize,
}

/// Resolved store and diagnostics of one pipeline run.
#[derive(Debug)]
pub struct Resolution {
    populations: Populations,
    store: ResolvedStore,
    diagnostics: DiagnosticsCollector,
    declaration_stats: DeclarationStats,
    chain_stats: ChainStats,
    options: ResolverOptions,
}

impl Resolution {
    pub fn populations(&self) -> &Populations {
        &self.populations
    }

    pub fn store(&self) -> &ResolvedStore {
        &self.store
    }

    pub fn diagnostics(&self) -> &DiagnosticsCollector {
        &self.diagnostics
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.has_errors()
    }

    /// Counts over the raw input.
    pub fn declaration_stats(&self) -> &DeclarationStats {
        &self.declaration_stats
    }

    pub fn chain_stats(&self) -> ChainStats {
        self.chain_stats
    }

    pub fn resolution_stats(&self) -> ResolutionStats {
        self.store.stats()
    }

    pub fn into_parts(self) -> (ResolvedStore, DiagnosticsCollector) {
        (self.store, self.diagnostics)
    }

    /// Fold a foreign store in after resolution and re-resolve the local
    /// declarations that may now link differently.
    ///
    /// Resolution-stage diagnostics of the re-resolved declarations are
    /// recomputed; everything else is kept.
    #[cfg_attr(feature = "profiling", profiling::function)]
    #[instrument(skip_all, name = "merge_foreign")]
    pub fn merge_foreign(&mut self, foreign: ResolvedStore) -> Result<MergeReport, ResolveError> {
        let merged = merge_into_store(
            &self.populations,
            &mut self.store,
            foreign,
            self.options.foreign_collisions,
        );
        let scope = affected_closure(&self.populations, &merged.added);
        debug!(
            added = merged.added.len(),
            affected = scope.len(),
            "re-resolving after merge"
        );

        self.diagnostics.forget_where(|d| is_stale(&scope, d));
        self.diagnostics.extend(merged.diagnostics);

        let run = resolve_scope(
            &self.populations,
            &mut self.store,
            Some(&scope),
            None,
            &self.options,
        )?;
        self.diagnostics.extend(run.diagnostics);
        self.chain_stats += run.chain_stats;

        Ok(MergeReport {
            added: merged.added,
            shadowed: merged.shadowed,
            re_resolved: scope.len(),
        })
    }
}

// ==========================================================================
// Scoped run
// ==========================================================================

struct ScopeRun {
    diagnostics: Vec<Diagnostic>,
    chain_stats: ChainStats,
}

/// Resolve units, scalars and vectors in `scope` (everything if `None`)
/// and write the results into `store`.
fn resolve_scope(
    populations: &Populations,
    store: &mut ResolvedStore,
    scope: Option<&FxHashSet<TypeIdentity>>,
    cache: Option<&mut ResolutionCache>,
    options: &ResolverOptions,
) -> Result<ScopeRun, ResolveError> {
    let units = UnitPass::new(Directory::new(populations, store))
        .with_scope(scope)
        .run(options)?;
    let mut diagnostics = units.diagnostics;
    for unit in units.units {
        store.units.upsert(unit);
    }

    let (scalar_cache, vector_cache, group_cache) = match cache {
        Some(cache) => (
            Some(&mut cache.scalars),
            Some(&mut cache.vectors),
            Some(&mut cache.groups),
        ),
        None => (None, None, None),
    };

    let directory = Directory::new(populations, store);
    let (scalars, vectors) = if options.parallel {
        rayon::join(
            || scalar_branch(directory, scope, scalar_cache, options),
            || vector_branch(directory, scope, vector_cache, group_cache, options),
        )
    } else {
        (
            scalar_branch(directory, scope, scalar_cache, options),
            vector_branch(directory, scope, vector_cache, group_cache, options),
        )
    };
    let scalars = scalars?;
    let vectors = vectors?;

    let mut chain_stats = scalars.stats;
    chain_stats += vectors.stats;

    diagnostics.extend(scalars.diagnostics);
    diagnostics.extend(vectors.diagnostics);

    for scalar in scalars.scalars {
        store.scalars.upsert(scalar);
    }
    for vector in vectors.vectors.into_iter().chain(vectors.members) {
        store.vectors.upsert(vector);
    }
    for group in vectors.groups {
        store.groups.upsert(group);
    }

    Ok(ScopeRun {
        diagnostics,
        chain_stats,
    })
}

struct ScalarBranch {
    scalars: Vec<ResolvedScalar>,
    diagnostics: Vec<Diagnostic>,
    stats: ChainStats,
}

#[cfg_attr(feature = "profiling", profiling::function)]
#[instrument(skip_all, name = "scalars")]
fn scalar_branch(
    directory: Directory<'_>,
    scope: Option<&FxHashSet<TypeIdentity>>,
    cache: Option<&mut ChainCache<ScalarProperties>>,
    options: &ResolverOptions,
) -> Result<ScalarBranch, ResolveError> {
    let populations = directory.populations();
    let mut chains = ChainPass::new(
        SCALAR,
        &populations.scalars,
        &directory.store().scalars,
        |identity: &TypeIdentity| directory.kind_of(identity),
    )
    .with_scope(scope)
    .with_cache(cache)
    .run(options)?;

    let linker = Linker::new(directory, options.inconsistent_flag_severity);
    let mut branch = ScalarBranch {
        scalars: Vec::with_capacity(chains.outcomes.len()),
        diagnostics: Vec::new(),
        stats: chains.stats,
    };

    for declaration in &populations.scalars {
        let Some(outcome) = chains.outcomes.remove(&declaration.identity) else {
            continue;
        };
        options.checkpoint()?;

        branch
            .diagnostics
            .extend(outcome.diagnostics.into_iter().map(Diagnostic::error));
        let linked = linker.link_scalar(&declaration.identity, outcome.properties);
        branch.diagnostics.extend(linked.diagnostics);

        branch.scalars.push(ResolvedScalar {
            identity: declaration.identity.clone(),
            span: declaration.span,
            original: declaration.shape.original().cloned(),
            status: outcome.status,
            origin: Origin::Local,
            properties: linked.properties,
            unit_quantity: linked.unit_quantity,
        });
    }

    debug!(scalars = branch.scalars.len(), "scalars linked");
    Ok(branch)
}

struct VectorBranch {
    vectors: Vec<ResolvedVector>,
    groups: Vec<ResolvedGroup>,
    members: Vec<ResolvedVector>,
    diagnostics: Vec<Diagnostic>,
    stats: ChainStats,
}

#[cfg_attr(feature = "profiling", profiling::function)]
#[instrument(skip_all, name = "vectors")]
fn vector_branch(
    directory: Directory<'_>,
    scope: Option<&FxHashSet<TypeIdentity>>,
    vector_cache: Option<&mut ChainCache<VectorProperties>>,
    group_cache: Option<&mut ChainCache<VectorProperties>>,
    options: &ResolverOptions,
) -> Result<VectorBranch, ResolveError> {
    let populations = directory.populations();
    let store = directory.store();
    let kind_elsewhere = |identity: &TypeIdentity| directory.kind_of(identity);

    let vector_chains = ChainPass::new(VECTOR, &populations.vectors, &store.vectors, kind_elsewhere)
        .with_scope(scope)
        .with_cache(vector_cache)
        .run(options)?;
    let mut group_chains = ChainPass::new(GROUP, &populations.groups, &store.groups, kind_elsewhere)
        .with_scope(scope)
        .with_cache(group_cache)
        .run(options)?;

    let mut stats = vector_chains.stats;
    stats += group_chains.stats;

    let linker = Linker::new(
        directory.with_vector_chains(&vector_chains.outcomes),
        options.inconsistent_flag_severity,
    );

    let mut vectors = Vec::new();
    let mut vector_diagnostics = Vec::new();
    for declaration in &populations.vectors {
        let Some(outcome) = vector_chains.outcomes.get(&declaration.identity) else {
            continue;
        };
        options.checkpoint()?;

        vector_diagnostics.extend(outcome.diagnostics.iter().cloned().map(Diagnostic::error));
        let dimension = outcome.properties.dimension.value().copied();
        let linked = linker.link_vector(
            &declaration.identity,
            outcome.properties.clone(),
            Requester::Vector(dimension),
        );
        vector_diagnostics.extend(linked.diagnostics);

        vectors.push(ResolvedVector {
            identity: declaration.identity.clone(),
            span: declaration.span,
            original: declaration.shape.original().cloned(),
            group: None,
            status: outcome.status,
            origin: Origin::Local,
            properties: linked.properties,
        });
    }

    let mut groups = Vec::new();
    let mut group_diagnostics = Vec::new();
    for declaration in &populations.groups {
        let Some(outcome) = group_chains.outcomes.remove(&declaration.identity) else {
            continue;
        };
        options.checkpoint()?;

        group_diagnostics.extend(outcome.diagnostics.into_iter().map(Diagnostic::error));
        let linked = linker.link_vector(&declaration.identity, outcome.properties, Requester::Group);
        group_diagnostics.extend(linked.diagnostics);

        groups.push(ResolvedGroup {
            identity: declaration.identity.clone(),
            span: declaration.span,
            original: declaration.shape.original().cloned(),
            status: outcome.status,
            origin: Origin::Local,
            properties: linked.properties,
            members: populations
                .members_of(&declaration.identity)
                .cloned()
                .unwrap_or_default(),
        });
    }

    let mut members = Vec::new();
    let mut member_diagnostics = Vec::new();
    for member in &populations.members {
        if scope.is_some_and(|scope| !scope.contains(&member.identity)) {
            continue;
        }
        options.checkpoint()?;

        let group = groups
            .iter()
            .find(|g| g.identity == member.group)
            .or_else(|| store.group(&member.group))
            .map(|g| (&g.properties, g.status));

        let (props, status) = match group {
            Some((properties, status)) => (Linker::compose_member(member, Some(properties)), status),
            None => {
                member_diagnostics.push(linker.missing_group(member));
                (Linker::compose_member(member, None), Status::Broken)
            }
        };
        let linked = linker.link_member(member, props);
        member_diagnostics.extend(linked.diagnostics);

        members.push(ResolvedVector {
            identity: member.identity.clone(),
            span: member.span,
            original: None,
            group: Some(member.group.clone()),
            status,
            origin: Origin::Local,
            properties: linked.properties,
        });
    }

    debug!(
        vectors = vectors.len(),
        groups = groups.len(),
        members = members.len(),
        "vectors linked"
    );

    let mut diagnostics = vector_diagnostics;
    diagnostics.extend(group_diagnostics);
    diagnostics.extend(member_diagnostics);

    Ok(VectorBranch {
        vectors,
        groups,
        members,
        diagnostics,
        stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use quantities_core::{
        DiagnosticCode, Property, ScalarDeclaration, ScalarDefinition, Span, UnitDeclaration,
        UnitInstance,
    };

    fn id(name: &str) -> TypeIdentity {
        TypeIdentity::global(name)
    }

    fn length_set() -> DeclarationSet {
        DeclarationSet::new()
            .with_unit(
                UnitDeclaration::new("UnitOfLength", Span::default())
                    .with_quantity("Length")
                    .with_instance(UnitInstance::fixed("Metre", "Metres", 1.0)),
            )
            .with_scalar(ScalarDeclaration::base(
                "Length",
                Span::default(),
                ScalarDefinition::new("UnitOfLength").with_default_unit_instance("Metre"),
            ))
            .with_scalar(ScalarDeclaration::specialization(
                "Distance",
                Span::default(),
                "Length",
                ScalarProperties::new(),
            ))
    }

    #[test]
    fn resolves_units_and_scalars() {
        let resolution = Resolver::default().resolve(length_set()).unwrap();

        assert!(resolution.diagnostics().is_empty());
        let distance = resolution.store().scalar(&id("Distance")).unwrap();
        assert_eq!(distance.properties.unit, Property::Inherited(id("UnitOfLength")));
        assert_eq!(
            distance.properties.default_unit_instance,
            Property::Inherited(Some("Metre".to_string()))
        );
        assert_eq!(distance.unit_quantity, Some(id("Length")));
        assert_eq!(resolution.resolution_stats().scalars, 2);
    }

    #[test]
    fn second_run_reuses_cached_chains() {
        let mut resolver = Resolver::default();
        let first = resolver.resolve(length_set()).unwrap();
        assert_eq!(first.chain_stats().reused, 0);
        assert_eq!(resolver.cache().len(), 2);

        let second = resolver.resolve(length_set()).unwrap();
        assert_eq!(second.chain_stats().reused, 2);
        assert_eq!(first.store(), second.store());
    }

    #[test]
    fn cache_forgets_removed_declarations() {
        let mut resolver = Resolver::default();
        resolver.resolve(length_set()).unwrap();

        let mut set = length_set();
        set.scalars.pop();
        resolver.resolve(set).unwrap();
        assert_eq!(resolver.cache().len(), 1);
    }

    #[test]
    fn diagnostics_follow_declaration_order() {
        let set = length_set()
            .with_scalar(ScalarDeclaration::specialization(
                "Speed2",
                Span::default(),
                "Speed",
                ScalarProperties::new(),
            ))
            .with_scalar(ScalarDeclaration::base(
                "Time",
                Span::default(),
                ScalarDefinition::new("UnitOfTime"),
            ));
        let resolution = Resolver::default().resolve(set).unwrap();

        let found: Vec<(String, DiagnosticCode)> = resolution
            .diagnostics()
            .iter()
            .map(|d| (d.identity().to_string(), d.code()))
            .collect();
        assert_eq!(
            found,
            vec![
                ("Speed2".to_string(), DiagnosticCode::MissingAncestor),
                ("Time".to_string(), DiagnosticCode::UnresolvedReference),
            ]
        );
    }

    #[test]
    fn cancellation_aborts_the_run() {
        let token = crate::CancellationToken::new();
        token.cancel();
        let mut resolver = Resolver::new(ResolverOptions::new().with_cancellation(token));
        assert!(matches!(resolver.resolve(length_set()), Err(ResolveError::Cancelled)));
    }
}
