use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use diagram_layout::config::{Algorithm, LayoutConfig};
use diagram_layout::ir::{DiagramData, DiagramType, Edge, Node};
use diagram_layout::layout::{EngineKind, LayoutManager};
use std::hint::black_box;

fn dense_diagram(nodes: usize, extra_edges: usize) -> DiagramData {
    let mut data = DiagramData::new(DiagramType::Flowchart);
    for i in 0..nodes {
        data.nodes.push(Node::new(
            format!("N{i}"),
            (i % 10) as f32 * 40.0,
            (i / 10) as f32 * 40.0,
            120.0,
            48.0,
        ));
    }
    for i in 0..nodes.saturating_sub(1) {
        data.edges
            .push(Edge::new(format!("c{i}"), format!("N{i}"), format!("N{}", i + 1)));
    }
    let mut count = 0usize;
    'outer: for i in 0..nodes {
        for j in (i + 2)..nodes {
            if count >= extra_edges {
                break 'outer;
            }
            data.edges
                .push(Edge::new(format!("x{count}"), format!("N{i}"), format!("N{j}")));
            count += 1;
        }
    }
    data
}

fn bench_force_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("force_directed");
    let manager = LayoutManager::new(LayoutConfig {
        algorithm: Some(Algorithm::Force),
        ..Default::default()
    });
    for size in [10usize, 50, 100, 200] {
        let data = dense_diagram(size, size / 2);
        group.bench_with_input(BenchmarkId::from_parameter(size), &data, |b, data| {
            b.iter(|| black_box(manager.auto_layout(black_box(data))));
        });
    }
    group.finish();
}

fn bench_geometric(c: &mut Criterion) {
    let mut group = c.benchmark_group("geometric");
    let data = dense_diagram(200, 100);
    for algorithm in [Algorithm::Circular, Algorithm::Tree, Algorithm::Grid] {
        let manager = LayoutManager::new(LayoutConfig {
            algorithm: Some(algorithm),
            ..Default::default()
        });
        group.bench_function(algorithm.as_str(), |b| {
            b.iter(|| black_box(manager.auto_layout(black_box(&data))));
        });
    }
    group.finish();
}

fn bench_layered_engines(c: &mut Criterion) {
    let mut group = c.benchmark_group("layered_engines");
    let manager = LayoutManager::default();
    for size in [20usize, 80] {
        let data = dense_diagram(size, size);
        for engine in [EngineKind::Dagre, EngineKind::Layered] {
            group.bench_with_input(BenchmarkId::new(engine.as_str(), size), &data, |b, data| {
                b.iter(|| black_box(manager.apply_layout(black_box(data), engine)));
            });
        }
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_force_scaling,
    bench_geometric,
    bench_layered_engines
);
criterion_main!(benches);
