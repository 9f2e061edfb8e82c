use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use kvgraph::{Direction, ElementKind, Graph, GraphConfig, Value, Vertex};
use std::time::{Duration, Instant};
use tempfile::TempDir;

fn rocksdb_graph(autoflush: bool) -> (TempDir, Graph) {
    let temp_dir = TempDir::new().unwrap();
    let mut config = GraphConfig::rocksdb(temp_dir.path());
    config.autoflush = autoflush;
    let graph = Graph::open(config).unwrap();
    (temp_dir, graph)
}

fn populate(graph: &Graph, n: usize) -> Vec<Vertex> {
    let mut vertices = Vec::with_capacity(n);
    for i in 0..n {
        let v = graph.add_vertex(Some(&format!("v{:06}", i))).unwrap();
        graph.set_property(&v, "name", format!("Person{}", i)).unwrap();
        graph.set_property(&v, "age", (20 + (i % 60)) as i64).unwrap();
        vertices.push(v);
    }
    graph.flush().unwrap();
    vertices
}

/// Benchmark creating vertices with two properties each
fn bench_create_vertices(c: &mut Criterion) {
    let mut group = c.benchmark_group("create_vertices");
    group.throughput(Throughput::Elements(1000));

    for autoflush in [true, false] {
        let (_dir, graph) = rocksdb_graph(autoflush);
        group.bench_with_input(
            BenchmarkId::new("batch_1000", if autoflush { "autoflush" } else { "buffered" }),
            &graph,
            |b, graph| {
                b.iter_custom(|iters| {
                    let mut total = Duration::ZERO;
                    for _ in 0..iters {
                        let start = Instant::now();
                        for i in 0..1000 {
                            let v = graph.add_vertex(None).unwrap();
                            graph.set_property(&v, "name", format!("Person{}", i)).unwrap();
                            graph.set_property(&v, "age", 20 + (i % 60) as i64).unwrap();
                        }
                        graph.flush().unwrap();
                        total += start.elapsed();
                    }
                    total
                });
            },
        );
    }

    group.finish();
}

/// Benchmark scanning vertices
fn bench_scan_vertices(c: &mut Criterion) {
    let (_dir, graph) = rocksdb_graph(false);
    populate(&graph, 1000);

    c.bench_function("scan_1000_vertices", |b| {
        b.iter(|| {
            let count = graph.vertices().unwrap().filter(|v| v.is_ok()).count();
            black_box(count)
        });
    });
}

/// Benchmark creating edges
fn bench_create_edges(c: &mut Criterion) {
    let (_dir, graph) = rocksdb_graph(false);
    let vertices = populate(&graph, 100);

    let mut group = c.benchmark_group("create_edges");
    group.throughput(Throughput::Elements(99));
    group.bench_function("chain_99", |b| {
        b.iter(|| {
            for pair in vertices.windows(2) {
                let edge = graph.add_edge(None, &pair[0], &pair[1], "NEXT").unwrap();
                black_box(edge);
            }
            graph.flush().unwrap();
        });
    });
    group.finish();
}

/// Benchmark adjacent edge and vertex traversal from a hub vertex
fn bench_edge_traversal(c: &mut Criterion) {
    let (_dir, graph) = rocksdb_graph(false);
    let vertices = populate(&graph, 1001);
    let hub = &vertices[0];
    for (i, v) in vertices[1..].iter().enumerate() {
        let label = if i % 2 == 0 { "KNOWS" } else { "FOLLOWS" };
        graph.add_edge(None, hub, v, label).unwrap();
    }
    graph.flush().unwrap();

    let mut group = c.benchmark_group("traversal");
    group.bench_function("adjacent_edges_1000", |b| {
        b.iter(|| {
            let count = graph
                .adjacent_edges(hub, Direction::Out, &[])
                .unwrap()
                .filter(|e| e.is_ok())
                .count();
            black_box(count)
        });
    });
    group.bench_function("adjacent_vertices_1000", |b| {
        b.iter(|| {
            let count = graph
                .adjacent_vertices(hub, Direction::Out, &[])
                .unwrap()
                .filter(|v| v.is_ok())
                .count();
            black_box(count)
        });
    });
    group.bench_function("adjacent_vertices_labeled_500", |b| {
        b.iter(|| {
            let count = graph
                .adjacent_vertices(hub, Direction::Out, &["KNOWS"])
                .unwrap()
                .filter(|v| v.is_ok())
                .count();
            black_box(count)
        });
    });
    group.finish();
}

/// Benchmark equality lookups through the key index against a full scan
fn bench_index_lookup(c: &mut Criterion) {
    let (_dir, graph) = rocksdb_graph(false);
    populate(&graph, 5000);
    graph.create_key_index("name", ElementKind::Vertex).unwrap();
    let target = Value::from("Person4242");

    let mut group = c.benchmark_group("lookup_by_name_5000");
    group.bench_function("index", |b| {
        b.iter(|| {
            let hits = graph
                .get_elements("name", Some(&target), ElementKind::Vertex)
                .unwrap()
                .count();
            black_box(hits)
        });
    });
    group.bench_function("scan", |b| {
        b.iter(|| {
            let hits = graph.scan_vertices_with("name", &target).unwrap().count();
            black_box(hits)
        });
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_create_vertices,
    bench_scan_vertices,
    bench_create_edges,
    bench_edge_traversal,
    bench_index_lookup
);

criterion_main!(benches);
