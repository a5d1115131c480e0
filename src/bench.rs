use std::env;
use std::time::{Duration, Instant};

use rand::{rngs::StdRng, SeedableRng};

use ipq_lib::graph::Graph;

/// Settings of a benchmark run
#[derive(Debug)]
struct BenchSettings {
    graph_path: Option<String>,
    num_nodes: usize,
    num_edges: usize,
    max_dist: usize,
    src_id: usize,
    seed: u64,
    loop_count: usize,
    dump: bool,
}

#[derive(Debug)]
struct BenchResults {
    avg_indexed: Duration,
    avg_lazy: Duration,
    num_reachable: usize,
    results_match: bool,
}

/// Parse the value following the flag at `args[i]`
fn parse_arg<T: std::str::FromStr>(args: &[String], i: usize) -> T {
    let flag = &args[i];
    let val = args.get(i + 1)
        .unwrap_or_else(|| panic!("Missing value for argument: {}", flag));
    val.parse()
        .unwrap_or_else(|_| panic!("Invalid argument: {} '{}'", flag, val))
}

/// Average duration of `count` runs that took `sum` in total
fn average(sum: Duration, count: usize) -> Duration {
    sum.div_f64(count.max(1) as f64)
}

fn parse_settings(args: &[String]) -> BenchSettings {
    let mut settings = BenchSettings {
        graph_path: None,
        num_nodes: 100_000,
        num_edges: 400_000,
        max_dist: 1000,
        src_id: 0,
        seed: 42,
        loop_count: 1,
        dump: false,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--graph" => settings.graph_path = Some(parse_arg(args, i)),
            "-n" => settings.num_nodes = parse_arg(args, i),
            "-m" => settings.num_edges = parse_arg(args, i),
            "-w" => settings.max_dist = parse_arg(args, i),
            "-s" => settings.src_id = parse_arg(args, i),
            "--seed" => settings.seed = parse_arg(args, i),
            "--loop" => settings.loop_count = parse_arg(args, i),
            "--dump" => {
                settings.dump = true;
                i += 1;
                continue;
            }
            _ => {
                let err = format!("Unknown argument: {}", &args[i]);
                log::error!("{}", err);
                panic!("{}", err);
            }
        }
        i += 2;
    }
    settings
}

fn main() {
    // Initialize logger
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    let args: Vec<_> = env::args().collect();
    let settings = parse_settings(&args);
    log::info!("Benchmarking with the following settings: {:?}", &settings);

    let graph = match &settings.graph_path {
        Some(path) => Graph::parse_from_file(path)
            .unwrap_or_else(|err| panic!("Failed to load graph {}: {}", path, err)),
        None => {
            let mut rng = StdRng::seed_from_u64(settings.seed);
            Graph::random(settings.num_nodes, settings.num_edges, settings.max_dist, &mut rng)
        }
    };
    log::info!("Graph has {} nodes and {} edges", graph.num_nodes, graph.num_edges);

    let loop_count = settings.loop_count.max(1);
    let mut sum_indexed = Duration::ZERO;
    let mut sum_lazy = Duration::ZERO;
    let mut indexed_dists = Vec::new();
    let mut lazy_dists = Vec::new();
    for _ in 0..loop_count {
        let start = Instant::now();
        indexed_dists = graph.shortest_dists(settings.src_id)
            .expect("Invalid source node");
        sum_indexed += start.elapsed();

        let start = Instant::now();
        lazy_dists = graph.shortest_dists_lazy(settings.src_id)
            .expect("Invalid source node");
        sum_lazy += start.elapsed();
    }

    let bench_results = BenchResults {
        avg_indexed: average(sum_indexed, loop_count),
        avg_lazy: average(sum_lazy, loop_count),
        num_reachable: indexed_dists.iter().filter(|d| d.is_some()).count(),
        results_match: indexed_dists == lazy_dists,
    };

    if !bench_results.results_match {
        log::warn!("Indexed and lazy Dijkstra disagree");
    }
    log::info!("Benchmark results:\n{:#?}", bench_results);

    if settings.dump {
        match serde_json::to_string(&indexed_dists) {
            Ok(json) => println!("{}", json),
            Err(err) => log::error!("Failed to serialize distances: {}", err),
        }
    }
}
