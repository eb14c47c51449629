use clap::Parser;
use descent::{
    Result,
    candidates::{CandidateBuilder, CandidateStrategy, DescentParams},
    random::{RngState, try_rejection_sample},
    sets::heap::NeighborHeap,
    statistics::Stats,
};
use rand::{Rng, SeedableRng, rngs::StdRng};
use rand_distr::StandardNormal;
use serde::Serialize;
use std::{fs::File, hint::black_box, path::PathBuf, time::Instant};
use tqdm::tqdm;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Candidate generation benchmark for neighbor descent
#[derive(Parser, Debug)]
#[command(name = "descent")]
#[command(about = "Times candidate-heap generation on random kNN graphs", long_about = None)]
struct Args {
    /// Number of points (graph rows)
    #[arg(long, default_value_t = 100_000)]
    points: usize,

    /// Optional JSON file with descent parameters
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Neighbors per point, overrides the config file
    #[arg(long)]
    neighbors: Option<usize>,

    /// Candidate heap capacity per point, overrides the config file
    #[arg(long)]
    max_candidates: Option<usize>,

    /// Seed, overrides the config file
    #[arg(long)]
    seed: Option<u64>,

    /// Worker counts to sweep (comma-separated list, e.g., "1,2,4,8"). 1 runs the serial builder.
    #[arg(short, long, value_delimiter = ',', default_value = "1")]
    workers: Vec<usize>,

    /// Candidate rounds per worker count
    #[arg(short, long, default_value_t = 5)]
    rounds: usize,

    /// Where to write the JSON report of every run
    #[arg(long)]
    stats_out: Option<PathBuf>,
}

#[derive(Serialize)]
struct RunReport {
    workers: usize,
    rounds: usize,
    elapsed_secs: f64,
    stats: Stats,
}

/// Random graph with `n_neighbors` distinct neighbors per point, all flagged
/// new, weighted by a fake distance drawn from a half-normal distribution.
fn random_graph(points: usize, n_neighbors: usize, seed: u64) -> Result<NeighborHeap> {
    let mut sampler_state = RngState::from_seed(seed);
    let mut weights = StdRng::seed_from_u64(seed);
    let mut graph = NeighborHeap::new(points, n_neighbors)?;

    for i in 0..points {
        for j in try_rejection_sample(n_neighbors, points, &mut sampler_state)? {
            let fake_distance: f32 = weights.sample::<f32, _>(StandardNormal).abs();
            graph.push(i, fake_distance, j, true);
        }
    }
    Ok(graph)
}

fn run_candidate_job(params: &DescentParams, points: usize, rounds: usize) -> Result<RunReport> {
    let workers = match params.strategy {
        CandidateStrategy::Serial => 1,
        CandidateStrategy::Partitioned { workers } => workers,
    };
    info!(workers, rounds, "running candidate job");

    let builder = CandidateBuilder::from_params(params, points);
    let mut rng = RngState::from_seed(params.seed);
    let mut stats = Stats::new();
    let mut elapsed = 0.0;

    for round in tqdm(0..rounds) {
        // a fresh graph per round keeps every edge flagged new
        let round_seed = params.seed.wrapping_add(round as u64);
        let mut graph = random_graph(points, params.n_neighbors, round_seed)?;

        let start_time = Instant::now();
        black_box(builder.build(&mut graph, &mut rng, &mut stats)?);
        elapsed += start_time.elapsed().as_secs_f64();
    }

    // no rate when nothing was timed
    let rounds_per_sec = (elapsed > 0.0).then(|| rounds as f64 / elapsed);
    info!(
        workers,
        elapsed_secs = elapsed,
        rounds_per_sec,
        edges = stats.get_edges_visited(),
        accepted = stats.get_pushes_accepted(),
        rejected = stats.get_pushes_rejected(),
        "candidate job done"
    );

    Ok(RunReport {
        workers,
        rounds,
        elapsed_secs: elapsed,
        stats,
    })
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut params = match &args.config {
        Some(path) => DescentParams::from_json_path(path)?,
        None => DescentParams::default(),
    };
    if let Some(n) = args.neighbors {
        params.n_neighbors = n;
    }
    if let Some(m) = args.max_candidates {
        params.max_candidates = m;
    }
    if let Some(seed) = args.seed {
        params.seed = seed;
    }

    info!(
        points = args.points,
        n_neighbors = params.n_neighbors,
        max_candidates = params.max_candidates,
        workers = ?args.workers,
        "starting worker sweep"
    );

    let mut reports = Vec::with_capacity(args.workers.len());
    for &workers in &args.workers {
        let strategy = if workers <= 1 {
            CandidateStrategy::Serial
        } else {
            CandidateStrategy::Partitioned { workers }
        };
        let job_params = DescentParams {
            strategy,
            ..params.clone()
        };
        reports.push(run_candidate_job(&job_params, args.points, args.rounds)?);
    }

    if let Some(path) = &args.stats_out {
        serde_json::to_writer_pretty(File::create(path)?, &reports)?;
        info!(path = %path.display(), "wrote report");
    }

    Ok(())
}
