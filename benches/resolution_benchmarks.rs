//! Benchmarks for the resolution pipeline.
//!
//! - Chains: one base scalar with a single specialization chain of growing depth
//! - Wide: many independent base scalars, each with a short chain
//! - Groups: vector groups with members of dimension 2 to 4
//! - Cached: a second run over an unchanged set with a warm chain cache
//!
//! ## Profiling with Puffin
//!
//! ```bash
//! cargo bench --features profile-with-puffin -- --profile-time 5
//! ```

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use quantities::prelude::*;
use std::hint::black_box;

#[cfg(feature = "profile-with-puffin")]
use std::collections::HashMap;

#[cfg(feature = "profile-with-puffin")]
static FRAME_VIEW: std::sync::OnceLock<puffin::GlobalFrameView> = std::sync::OnceLock::new();

#[cfg(feature = "profile-with-puffin")]
fn setup_profiler() {
    puffin::set_scopes_on(true);
    FRAME_VIEW.get_or_init(puffin::GlobalFrameView::default);
}

#[cfg(not(feature = "profile-with-puffin"))]
fn setup_profiler() {}

#[cfg(feature = "profile-with-puffin")]
fn end_profiling_frame() {
    puffin::GlobalProfiler::lock().new_frame();
}

#[cfg(not(feature = "profile-with-puffin"))]
fn end_profiling_frame() {}

/// Average time per frame of every top-level pass scope.
#[cfg(feature = "profile-with-puffin")]
fn print_profiling_stats() {
    use puffin::Reader;

    let Some(frame_view) = FRAME_VIEW.get() else {
        return;
    };
    let view = frame_view.lock();
    let scopes = view.scope_collection();

    let mut totals: HashMap<String, i64> = HashMap::new();
    let mut frames = 0i64;
    for frame in view.recent_frames() {
        let Ok(unpacked) = frame.unpacked() else {
            continue;
        };
        frames += 1;
        for (_thread, stream_info) in unpacked.thread_streams.iter() {
            if let Ok(top) = Reader::from_start(&stream_info.stream).read_top_scopes() {
                for scope in top {
                    if let Some(details) = scopes.fetch_by_id(&scope.id) {
                        *totals.entry(details.name().to_string()).or_insert(0) +=
                            scope.record.duration_ns;
                    }
                }
            }
        }
    }

    if frames == 0 {
        return;
    }
    let mut entries: Vec<_> = totals.into_iter().collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1));

    println!("\n=== Resolution passes ({} frames) ===", frames);
    for (name, ns) in entries {
        println!(
            "  {:30} {:>10.2?} avg",
            name,
            std::time::Duration::from_nanos((ns / frames) as u64)
        );
    }
}

#[cfg(not(feature = "profile-with-puffin"))]
fn print_profiling_stats() {}

fn length_unit() -> UnitDeclaration {
    UnitDeclaration::new("UnitOfLength", Span::default())
        .with_quantity("Length")
        .with_instance(UnitInstance::fixed("Metre", "Metres", 1.0))
        .with_instance(UnitInstance::prefixed("Kilometre", "Kilometres", "Metre", 3))
}

/// `Length` followed by `depth` specializations, each of the previous one.
fn chain_set(depth: usize) -> DeclarationSet {
    let mut set = DeclarationSet::new().with_unit(length_unit()).with_scalar(
        ScalarDeclaration::base(
            "Length",
            Span::default(),
            ScalarDefinition::new("UnitOfLength").with_default_unit_instance("Metre"),
        ),
    );
    let mut parent = "Length".to_string();
    for level in 0..depth {
        let name = format!("Length{}", level);
        set.add_scalar(ScalarDeclaration::specialization(
            name.as_str(),
            Span::default(),
            parent.as_str(),
            ScalarProperties::new(),
        ));
        parent = name;
    }
    set
}

/// `width` base scalars, each specialized three levels deep.
fn wide_set(width: usize) -> DeclarationSet {
    let mut set = DeclarationSet::new().with_unit(length_unit());
    for index in 0..width {
        let base = format!("Quantity{}", index);
        set.add_scalar(ScalarDeclaration::base(
            base.as_str(),
            Span::default(),
            ScalarDefinition::new("UnitOfLength"),
        ));
        let mut parent = base;
        for level in 0..3 {
            let name = format!("Quantity{}_{}", index, level);
            set.add_scalar(ScalarDeclaration::specialization(
                name.as_str(),
                Span::default(),
                parent.as_str(),
                ScalarProperties::new(),
            ));
            parent = name;
        }
    }
    set
}

/// `count` vector groups with three members each and a vector naming each group.
fn group_set(count: usize) -> DeclarationSet {
    let mut set = DeclarationSet::new()
        .with_unit(length_unit())
        .with_scalar(ScalarDeclaration::base(
            "Length",
            Span::default(),
            ScalarDefinition::new("UnitOfLength"),
        ));
    for index in 0..count {
        let group = format!("Position{}", index);
        set.add_group(GroupDeclaration::base(
            group.as_str(),
            Span::default(),
            GroupDefinition::new("UnitOfLength").with_scalar("Length"),
        ));
        for dimension in 2..=4 {
            set.add_member(GroupMemberDeclaration::new(
                format!("{}D{}", group, dimension).as_str(),
                Span::default(),
                group.as_str(),
                dimension,
            ));
        }
        set.add_vector(VectorDeclaration::base(
            format!("Displacement{}", index).as_str(),
            Span::default(),
            VectorDefinition::new("UnitOfLength", 3)
                .with_scalar("Length")
                .with_difference(group.as_str()),
        ));
    }
    set
}

fn chain_benchmarks(c: &mut Criterion) {
    setup_profiler();
    let mut group = c.benchmark_group("resolve/chains");

    for depth in [10, 100, 1000] {
        group.throughput(Throughput::Elements(depth as u64));
        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, &depth| {
            b.iter_batched(
                || chain_set(depth),
                |set| {
                    let resolution = Resolver::default().resolve(black_box(set));
                    end_profiling_frame();
                    black_box(resolution)
                },
                criterion::BatchSize::SmallInput,
            );
        });
    }

    group.finish();
    print_profiling_stats();
}

fn wide_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve/wide");

    for width in [100, 1000] {
        group.throughput(Throughput::Elements((width * 4) as u64));
        for parallel in [false, true] {
            let name = if parallel { "parallel" } else { "sequential" };
            group.bench_with_input(BenchmarkId::new(name, width), &width, |b, &width| {
                b.iter_batched(
                    || wide_set(width),
                    |set| {
                        let options = ResolverOptions::new().with_parallel(parallel);
                        black_box(Resolver::new(options).resolve(black_box(set)))
                    },
                    criterion::BatchSize::SmallInput,
                );
            });
        }
    }

    group.finish();
}

fn group_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve/groups");

    for count in [10, 200] {
        group.throughput(Throughput::Elements((count * 5) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            b.iter_batched(
                || group_set(count),
                |set| black_box(Resolver::default().resolve(black_box(set))),
                criterion::BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

fn cached_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve/cached");

    let mut resolver = Resolver::default();
    if resolver.resolve(wide_set(1000)).is_err() {
        return;
    }
    group.bench_function("wide_1000_warm", |b| {
        b.iter_batched(
            || wide_set(1000),
            |set| black_box(resolver.resolve(black_box(set))),
            criterion::BatchSize::SmallInput,
        );
    });

    group.finish();
}

criterion_group!(
    benches,
    chain_benchmarks,
    wide_benchmarks,
    group_benchmarks,
    cached_benchmarks
);
criterion_main!(benches);
