use anyhow::Result;
use clap::{Parser, ValueEnum};
use kvgraph::{Direction, Graph, GraphConfig, GraphResult, Vertex};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum WorkloadType {
    Read,
    Write,
    Mixed,
    Traverse,
}

#[derive(Parser, Debug)]
#[command(name = "concurrent_bench")]
#[command(about = "Concurrent benchmark tool for kvgraph", long_about = None)]
struct Args {
    /// Workload type
    #[arg(short, long, value_enum)]
    workload: WorkloadType,

    /// Number of worker threads (defaults to the number of CPUs)
    #[arg(short = 't', long)]
    threads: Option<usize>,

    /// Duration in seconds
    #[arg(short, long, default_value_t = 30)]
    duration: u64,

    /// Database path (RocksDB backend)
    #[arg(short = 'p', long, default_value = "./data/concurrent_bench")]
    db_path: PathBuf,

    /// Use the in-memory store instead of RocksDB
    #[arg(long)]
    memory: bool,

    /// Number of pre-existing vertices (0 to skip initialization)
    #[arg(short = 'v', long, default_value_t = 10000)]
    init_vertices: usize,

    /// Out edges created per pre-existing vertex
    #[arg(short = 'e', long, default_value_t = 5)]
    edges_per_vertex: usize,

    /// Read/write ratio for mixed workload (0.0-1.0, where 0.9 means 90% reads)
    #[arg(short, long, default_value_t = 0.9)]
    read_ratio: f64,

    /// Output JSON results to file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Random seed
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

#[derive(Debug, Serialize, Deserialize)]
struct BenchmarkResults {
    workload_type: String,
    threads: usize,
    duration_secs: u64,
    total_operations: u64,
    successful_operations: u64,
    failed_operations: u64,
    throughput_ops_per_sec: f64,
    latencies_ms: LatencyStats,
    per_thread_ops: Vec<u64>,
}

#[derive(Debug, Serialize, Deserialize)]
struct LatencyStats {
    min: f64,
    max: f64,
    mean: f64,
    p50: f64,
    p95: f64,
    p99: f64,
}

struct WorkerStats {
    operations: AtomicU64,
    successes: AtomicU64,
    failures: AtomicU64,
    latencies: Mutex<Vec<Duration>>,
}

impl WorkerStats {
    fn new() -> Self {
        Self {
            operations: AtomicU64::new(0),
            successes: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            latencies: Mutex::new(Vec::new()),
        }
    }

    fn record<T>(&self, started: Instant, outcome: GraphResult<T>) -> bool {
        self.operations.fetch_add(1, Ordering::Relaxed);
        match outcome {
            Ok(_) => {
                self.successes.fetch_add(1, Ordering::Relaxed);
                self.latencies.lock().push(started.elapsed());
                true
            }
            Err(e) => {
                self.failures.fetch_add(1, Ordering::Relaxed);
                warn!(error = %e, "operation failed");
                false
            }
        }
    }
}

/// Everything a worker needs; cloned into each blocking task
#[derive(Clone)]
struct Workload {
    graph: Arc<Graph>,
    vertex_ids: Arc<Vec<String>>,
    stats: Arc<WorkerStats>,
    duration: Duration,
    read_ratio: f64,
    seed: u64,
}

fn initialize_graph(graph: &Graph, num_vertices: usize, edges_per_vertex: usize, seed: u64) -> Result<Vec<String>> {
    info!(vertices = num_vertices, edges_per_vertex, "initializing graph");
    let mut rng = StdRng::seed_from_u64(seed);
    let mut vertices = Vec::with_capacity(num_vertices);

    for i in 0..num_vertices {
        let vertex = graph.add_vertex(Some(&format!("v{:08}", i)))?;
        graph.set_property(&vertex, "name", format!("Vertex{}", i))?;
        graph.set_property(&vertex, "value", (i * 2) as i64)?;
        vertices.push(vertex);

        if (i + 1) % 10000 == 0 {
            info!(created = i + 1, "vertices created");
        }
    }

    if !vertices.is_empty() {
        for out_vertex in &vertices {
            for _ in 0..edges_per_vertex {
                let in_vertex = &vertices[rng.gen_range(0..vertices.len())];
                let edge = graph.add_edge(None, out_vertex, in_vertex, "LINKS")?;
                graph.set_property(&edge, "weight", rng.gen_range(0.0..1.0))?;
            }
        }
    }
    graph.flush()?;

    info!("graph initialization complete");
    Ok(vertices.into_iter().map(|v| v.into_id().into_string()).collect())
}

fn read_once(graph: &Graph, id: &str) -> GraphResult<()> {
    if let Some(vertex) = graph.get_vertex(id)? {
        graph.properties(&vertex)?;
    }
    Ok(())
}

fn write_once(graph: &Graph, rng: &mut StdRng, thread_id: usize, anchors: &[String]) -> GraphResult<()> {
    let vertex = graph.add_vertex(None)?;
    graph.set_property(&vertex, "thread_id", thread_id as i64)?;
    graph.set_property(&vertex, "name", format!("NewVertex_{}_{}", thread_id, rng.gen::<u32>()))?;
    if !anchors.is_empty() {
        let anchor = Vertex::new(anchors[rng.gen_range(0..anchors.len())].parse()?);
        graph.add_edge(None, &vertex, &anchor, "LINKS")?;
    }
    Ok(())
}

fn traverse_once(graph: &Graph, id: &str) -> GraphResult<usize> {
    let mut count = 0;
    if let Some(vertex) = graph.get_vertex(id)? {
        for neighbor in graph.adjacent_vertices(&vertex, Direction::Out, &[])? {
            neighbor?;
            count += 1;
        }
    }
    Ok(count)
}

fn run_worker(kind: WorkloadType, work: Workload, thread_id: usize) -> u64 {
    let mut rng = StdRng::seed_from_u64(work.seed + thread_id as u64);
    let ids = work.vertex_ids.as_slice();
    let start = Instant::now();
    let mut local_ops = 0u64;

    while start.elapsed() < work.duration {
        let op_start = Instant::now();
        let read = match kind {
            WorkloadType::Read | WorkloadType::Traverse => true,
            WorkloadType::Write => false,
            WorkloadType::Mixed => rng.gen::<f64>() < work.read_ratio,
        };

        let ok = if read && ids.is_empty() {
            // Nothing to read without a seeded graph
            break;
        } else if read {
            let id = &ids[rng.gen_range(0..ids.len())];
            match kind {
                WorkloadType::Traverse => work.stats.record(op_start, traverse_once(&work.graph, id)),
                _ => work.stats.record(op_start, read_once(&work.graph, id)),
            }
        } else {
            work.stats.record(op_start, write_once(&work.graph, &mut rng, thread_id, ids))
        };
        if ok {
            local_ops += 1;
        }
    }

    info!(thread_id, operations = local_ops, "worker finished");
    local_ops
}

fn calculate_latency_stats(latencies: &[Duration]) -> LatencyStats {
    if latencies.is_empty() {
        return LatencyStats {
            min: 0.0,
            max: 0.0,
            mean: 0.0,
            p50: 0.0,
            p95: 0.0,
            p99: 0.0,
        };
    }

    let mut sorted: Vec<f64> = latencies
        .iter()
        .map(|d| d.as_secs_f64() * 1000.0)
        .collect();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let len = sorted.len();
    let sum: f64 = sorted.iter().sum();

    LatencyStats {
        min: sorted[0],
        max: sorted[len - 1],
        mean: sum / len as f64,
        p50: sorted[len / 2],
        p95: sorted[(len * 95) / 100],
        p99: sorted[(len * 99) / 100],
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    let threads = args.threads.unwrap_or_else(num_cpus::get).max(1);

    let mut config = if args.memory {
        GraphConfig::in_memory()
    } else {
        GraphConfig::rocksdb(&args.db_path)
    };
    config.query_threads = threads;
    config.logging.init()?;

    println!("=== Concurrent Benchmark Configuration ===");
    println!("Workload: {:?}", args.workload);
    println!("Threads: {}", threads);
    println!("Duration: {}s", args.duration);
    println!("Backend: {:?}", config.backend);
    println!("==========================================\n");

    let graph = Arc::new(Graph::open(config)?);

    let vertex_ids = if args.init_vertices > 0 {
        let graph = graph.clone();
        let (n, e, seed) = (args.init_vertices, args.edges_per_vertex, args.seed);
        tokio::task::spawn_blocking(move || initialize_graph(&graph, n, e, seed)).await??
    } else {
        Vec::new()
    };

    println!("\nStarting benchmark...\n");

    let work = Workload {
        graph: graph.clone(),
        vertex_ids: Arc::new(vertex_ids),
        stats: Arc::new(WorkerStats::new()),
        duration: Duration::from_secs(args.duration),
        read_ratio: args.read_ratio,
        seed: args.seed,
    };

    // Graph operations block on the store, so each worker gets a blocking thread
    let mut join_set = JoinSet::new();
    let start_time = Instant::now();
    for thread_id in 0..threads {
        let work = work.clone();
        let kind = args.workload;
        join_set.spawn_blocking(move || (thread_id, run_worker(kind, work, thread_id)));
    }

    let mut per_thread_ops = vec![0u64; threads];
    while let Some(result) = join_set.join_next().await {
        match result {
            Ok((thread_id, ops)) => per_thread_ops[thread_id] = ops,
            Err(e) => warn!(error = %e, "worker panicked"),
        }
    }
    let actual_duration = start_time.elapsed();
    graph.flush()?;

    let stats = &work.stats;
    let total_ops = stats.operations.load(Ordering::Relaxed);
    let successes = stats.successes.load(Ordering::Relaxed);
    let failures = stats.failures.load(Ordering::Relaxed);
    let latency_stats = calculate_latency_stats(&stats.latencies.lock());

    let results = BenchmarkResults {
        workload_type: format!("{:?}", args.workload),
        threads,
        duration_secs: actual_duration.as_secs(),
        total_operations: total_ops,
        successful_operations: successes,
        failed_operations: failures,
        throughput_ops_per_sec: successes as f64 / actual_duration.as_secs_f64(),
        latencies_ms: latency_stats,
        per_thread_ops,
    };

    println!("\n=== Benchmark Results ===");
    println!("Total operations: {}", results.total_operations);
    println!("Successful: {}", results.successful_operations);
    println!("Failed: {}", results.failed_operations);
    println!("Duration: {:.2}s", actual_duration.as_secs_f64());
    println!("Throughput: {:.2} ops/sec", results.throughput_ops_per_sec);
    println!("\nLatency (ms):");
    println!("  Min: {:.3}", results.latencies_ms.min);
    println!("  Mean: {:.3}", results.latencies_ms.mean);
    println!("  P50: {:.3}", results.latencies_ms.p50);
    println!("  P95: {:.3}", results.latencies_ms.p95);
    println!("  P99: {:.3}", results.latencies_ms.p99);
    println!("  Max: {:.3}", results.latencies_ms.max);

    if let Some(output_path) = args.output {
        let json_output = serde_json::to_string_pretty(&results)?;
        std::fs::write(&output_path, json_output)?;
        println!("\n✅ Results saved to: {}", output_path.display());
    }

    Ok(())
}
