use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use kvgraph::tools::{EdgeRecord, GraphDocument, VertexRecord};
use kvgraph::{
    export_to_csv, import_from_json, ExportOptions, Graph, GraphConfig, ImportOptions, Value,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Clone, ValueEnum)]
enum GraphType {
    Uniform,
    PowerLaw,
    Grid,
    Tree,
}

#[derive(Parser, Debug)]
#[command(name = "data_generator")]
#[command(about = "Generate property graph datasets for benchmarking", long_about = None)]
struct Args {
    /// Type of graph to generate
    #[arg(short, long, value_enum)]
    graph_type: GraphType,

    /// Number of vertices
    #[arg(short = 'n', long, default_value_t = 1000)]
    vertices: usize,

    /// Average degree for uniform/power-law graphs
    #[arg(short = 'd', long, default_value_t = 10)]
    avg_degree: usize,

    /// Grid size (for grid graphs, creates size×size grid)
    #[arg(short = 's', long)]
    size: Option<usize>,

    /// Tree depth (for tree graphs)
    #[arg(long, default_value_t = 4)]
    depth: usize,

    /// Tree branching factor
    #[arg(short = 'b', long, default_value_t = 3)]
    branching: usize,

    /// Output directory
    #[arg(short, long)]
    output: PathBuf,

    /// Export formats (json, csv)
    #[arg(short, long, value_delimiter = ',', default_value = "json")]
    formats: Vec<String>,

    /// Also load the dataset into the graph described by the environment
    /// (`KVGRAPH_*` variables) or by `--config`
    #[arg(long)]
    load: bool,

    /// Graph configuration file (JSON) used with `--load`
    #[arg(long)]
    config: Option<PathBuf>,

    /// Random seed for reproducibility
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

fn vertex_id(i: usize) -> String {
    format!("v{:08}", i)
}

fn props(entries: Vec<(&str, Value)>) -> BTreeMap<String, Value> {
    entries
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

struct GraphGenerator {
    rng: StdRng,
    document: GraphDocument,
}

impl GraphGenerator {
    fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            document: GraphDocument::default(),
        }
    }

    fn push_vertex(&mut self, i: usize, properties: BTreeMap<String, Value>) {
        self.document.vertices.push(VertexRecord {
            id: Some(vertex_id(i)),
            properties,
        });
    }

    fn push_edge(&mut self, label: &str, out: usize, into: usize, properties: BTreeMap<String, Value>) {
        let id = format!("e{:08}", self.document.edges.len());
        self.document.edges.push(EdgeRecord {
            id: Some(id),
            label: label.to_string(),
            out: vertex_id(out),
            in_vertex: vertex_id(into),
            properties,
        });
    }

    fn person(&mut self, name: String, age: std::ops::Range<i64>, cities: &[&str], jobs: &[&str]) -> BTreeMap<String, Value> {
        props(vec![
            ("name", Value::from(name)),
            ("age", Value::Int(self.rng.gen_range(age))),
            ("city", Value::from(cities[self.rng.gen_range(0..cities.len())])),
            ("occupation", Value::from(jobs[self.rng.gen_range(0..jobs.len())])),
        ])
    }

    /// Uniform random graph (Erdős-Rényi-like with fixed average degree)
    fn generate_uniform(&mut self, n: usize, avg_degree: usize) {
        info!(vertices = n, avg_degree, "generating uniform random graph");

        let cities = ["NYC", "LA", "Chicago", "Houston", "Phoenix", "Philadelphia",
                      "San Antonio", "San Diego", "Dallas", "San Jose"];
        let occupations = ["Engineer", "Teacher", "Doctor", "Artist", "Manager",
                           "Scientist", "Writer", "Designer", "Analyst", "Developer"];

        for i in 0..n {
            let properties = self.person(format!("Person{}", i), 18..80, &cities, &occupations);
            self.push_vertex(i, properties);
        }
        if n < 2 {
            return;
        }

        let num_edges = (n * avg_degree) / 2;
        let mut edge_set = HashSet::new();
        let mut attempts = 0;
        let max_attempts = num_edges * 10;

        while edge_set.len() < num_edges && attempts < max_attempts {
            let start = self.rng.gen_range(0..n);
            let end = self.rng.gen_range(0..n);

            if start != end && !edge_set.contains(&(start, end)) && !edge_set.contains(&(end, start)) {
                let properties = props(vec![
                    ("since", Value::Int(self.rng.gen_range(2000..2024))),
                    ("weight", Value::Float(self.rng.gen_range(1.0..10.0))),
                ]);
                self.push_edge("KNOWS", start, end, properties);
                edge_set.insert((start, end));
            }
            attempts += 1;
        }
    }

    /// Power-law graph using Barabási-Albert preferential attachment
    fn generate_power_law(&mut self, n: usize, m_per_node: usize) {
        info!(vertices = n, m_per_node, "generating power-law graph");

        let cities = ["NYC", "LA", "Chicago", "Houston", "Phoenix"];
        let occupations = ["Engineer", "Influencer", "Developer", "Artist", "Manager"];

        for i in 0..n {
            let properties = self.person(format!("User{}", i), 18..65, &cities, &occupations);
            self.push_vertex(i, properties);
        }

        let initial_size = (m_per_node + 1).min(n);
        let mut degree: HashMap<usize, usize> = HashMap::new();

        // Seed with a complete graph
        for i in 0..initial_size {
            for j in (i + 1)..initial_size {
                self.push_edge("FOLLOWS", i, j, props(vec![("since", Value::Int(2015))]));
                *degree.entry(i).or_insert(0) += 1;
                *degree.entry(j).or_insert(0) += 1;
            }
        }

        for new_node in initial_size..n {
            let total_degree: usize = degree.values().sum();
            if total_degree == 0 {
                break;
            }

            let mut targets = HashSet::new();
            let mut attempts = 0;
            while targets.len() < m_per_node && attempts < 100 {
                let mut cumulative = 0.0;
                let threshold = self.rng.gen::<f64>() * total_degree as f64;
                for (&node, &deg) in degree.iter() {
                    cumulative += deg as f64;
                    if cumulative >= threshold && node != new_node && !targets.contains(&node) {
                        targets.insert(node);
                        break;
                    }
                }
                attempts += 1;
            }

            for target in targets {
                let properties = props(vec![("since", Value::Int(self.rng.gen_range(2015..2024)))]);
                self.push_edge("FOLLOWS", new_node, target, properties);
                *degree.entry(new_node).or_insert(0) += 1;
                *degree.entry(target).or_insert(0) += 1;
            }
        }
    }

    /// 4-connected rows×cols grid
    fn generate_grid(&mut self, rows: usize, cols: usize) {
        info!(rows, cols, "generating grid graph");

        for row in 0..rows {
            for col in 0..cols {
                let properties = props(vec![
                    ("x", Value::Int(col as i64)),
                    ("y", Value::Int(row as i64)),
                    ("name", Value::from(format!("Node_{}_{}", row, col))),
                ]);
                self.push_vertex(row * cols + col, properties);
            }
        }

        for row in 0..rows {
            for col in 0..cols {
                let id = row * cols + col;
                if col + 1 < cols {
                    self.push_edge("CONNECTED", id, id + 1, props(vec![("distance", Value::Float(1.0))]));
                }
                if row + 1 < rows {
                    self.push_edge("CONNECTED", id, id + cols, props(vec![("distance", Value::Float(1.0))]));
                }
            }
        }
    }

    /// Balanced k-ary tree
    fn generate_tree(&mut self, depth: usize, branching: usize) {
        info!(depth, branching, "generating tree");

        let mut next_id = 0;
        let mut queue = vec![(0usize, 0usize)]; // (id, depth)

        while let Some((id, d)) = queue.pop() {
            let properties = props(vec![
                ("depth", Value::Int(d as i64)),
                ("name", Value::from(format!("Node{}", id))),
            ]);
            self.push_vertex(id, properties);

            if d < depth {
                for i in 0..branching {
                    next_id += 1;
                    self.push_edge("PARENT_OF", id, next_id, props(vec![("child_index", Value::Int(i as i64))]));
                    queue.push((next_id, d + 1));
                }
            }
        }
    }

    fn write_json(&self, path: &Path) -> Result<()> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, &self.document)?;
        info!(path = %path.display(), "wrote JSON document");
        Ok(())
    }
}

fn load_config(args: &Args) -> Result<GraphConfig> {
    let config = match &args.config {
        Some(path) => GraphConfig::from_json_file(path)?,
        None => GraphConfig::from_env()?,
    };
    Ok(config)
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let mut config = if args.load {
        load_config(&args)?
    } else {
        GraphConfig::in_memory()
    };
    config.logging.init()?;

    std::fs::create_dir_all(&args.output).context("Failed to create output directory")?;

    let mut generator = GraphGenerator::new(args.seed);
    match args.graph_type {
        GraphType::Uniform => generator.generate_uniform(args.vertices, args.avg_degree),
        GraphType::PowerLaw => generator.generate_power_law(args.vertices, args.avg_degree),
        GraphType::Grid => {
            let size = args.size.unwrap_or((args.vertices as f64).sqrt().ceil() as usize);
            generator.generate_grid(size, size)
        }
        GraphType::Tree => generator.generate_tree(args.depth, args.branching),
    }

    // The JSON document is the interchange form; every other output is
    // produced by loading it into a graph.
    let json_path = args.output.join("graph.json");
    generator.write_json(&json_path)?;

    let needs_graph = args.load || args.formats.iter().any(|f| f == "csv");
    if needs_graph {
        // Bulk load: buffer mutations and flush in import batches
        config.autoflush = false;
        let graph = Graph::open(config).context("Failed to open graph")?;
        let stats = import_from_json(&graph, &json_path, &ImportOptions::default())?;
        info!(
            vertices = stats.vertices_imported,
            edges = stats.edges_imported,
            "loaded dataset into graph"
        );

        for format in &args.formats {
            match format.as_str() {
                "json" => {}
                "csv" => {
                    export_to_csv(
                        &graph,
                        args.output.join("vertices.csv"),
                        args.output.join("edges.csv"),
                        &ExportOptions::default(),
                    )?;
                }
                other => warn!(format = other, "unknown export format"),
            }
        }
        graph.shutdown()?;
    }

    let document = &generator.document;
    println!("\n✅ Data generation complete!");
    println!("Output directory: {:?}", args.output);
    println!("Graph statistics:");
    println!("  - Vertices: {}", document.vertices.len());
    println!("  - Edges: {}", document.edges.len());
    if !document.vertices.is_empty() {
        let avg_degree = (2 * document.edges.len()) as f64 / document.vertices.len() as f64;
        println!("  - Average degree: {:.2}", avg_degree);
    }

    Ok(())
}
