//! Benchmarks for successor generation.
//!
//! Measures cold and warm exploration of a ring of processes that pass a
//! token through restricted channels, with and without weak saturation.

use ccs_engine::config::EngineConfig;
use ccs_engine::graph::ProcessGraph;
use ccs_engine::session::Session;
use ccs_engine::term::Action;
use ccs_engine::ProcessId;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::collections::BTreeSet;

/// `Ring = (C0 | … | C_{n-1}) \ {t0, …, t_{n-1}}`
/// with `C_i = t_i.work.'t_{i+1}.C_i` and `C0` holding the token first.
fn token_ring(n: usize) -> ProcessGraph {
    let mut graph = ProcessGraph::new();
    let mut cells = Vec::new();
    for i in 0..n {
        let name = format!("C{}", i);
        let this = graph.named(&name);
        let pass = graph.prefix(Action::output(format!("t{}", (i + 1) % n)), this);
        let work = graph.prefix(Action::input("work"), pass);
        let body = graph.prefix(Action::input(format!("t{}", i)), work);
        graph.define(&name, body).unwrap();
        cells.push(this);
    }
    let start = graph.named("Start");
    let first = graph.prefix(Action::output("t0"), cells[0]);
    graph.define("Start", first).unwrap();
    let mut system = start;
    for &cell in &cells[1..] {
        system = graph.parallel(system, cell);
    }
    let ring = graph.restrict(system, (0..n).map(|i| format!("t{}", i)));
    graph.define("Ring", ring).unwrap();
    graph
}

/// Explores every state reachable from `Ring`; returns the number of states.
fn explore(session: &mut Session) -> usize {
    let root = session.process_by_name("Ring").unwrap();
    let mut seen: BTreeSet<ProcessId> = BTreeSet::new();
    let mut stack = vec![root];
    while let Some(state) = stack.pop() {
        if !seen.insert(state) {
            continue;
        }
        let steps = session.successors(state).unwrap();
        stack.extend(steps.iter().map(|t| t.target));
    }
    seen.len()
}

fn bench_explore(c: &mut Criterion) {
    let mut group = c.benchmark_group("explore_ring");
    for n in [4usize, 8, 16] {
        for (label, config) in [("reduced", EngineConfig::default()), ("weak", EngineConfig::weak())] {
            group.bench_with_input(BenchmarkId::new(label, n), &n, |b, &n| {
                b.iter(|| {
                    let mut session = Session::new(token_ring(n), config).unwrap();
                    black_box(explore(&mut session))
                });
            });
        }
    }
    group.finish();
}

fn bench_warm_cache(c: &mut Criterion) {
    let mut session = Session::new(token_ring(16), EngineConfig::weak()).unwrap();
    explore(&mut session);
    c.bench_function("explore_ring_16_warm", |b| {
        b.iter(|| black_box(explore(&mut session)));
    });
}

criterion_group!(
    name = benches;
    config = Criterion::default().sample_size(10);
    targets = bench_explore, bench_warm_cache
);
criterion_main!(benches);
