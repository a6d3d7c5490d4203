//! Bounded-confidence opinion dynamics on a random network.
//!
//! Runs one simulation, prints a summary with histograms of the first and
//! last opinion snapshots, and optionally exports the trajectory.

use std::path::PathBuf;

use anyhow::{anyhow, Context};
use clap::Parser;
use opinion_dynamics::analysis::{histogram, TrajectoryAnalysis, DEFAULT_CLUSTER_GAP};
use opinion_dynamics::output::{write_summary_json, write_trajectory_csv};
use opinion_dynamics::{run_to_completion, OpinionSystem, ProgressLogger, SimulationParams};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "opinion_dynamics")]
#[command(about = "Bounded-confidence opinion dynamics on a random network", long_about = None)]
struct Cli {
    /// TOML parameter file (missing keys use defaults)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Named parameter preset (baseline, consensus, fragmented)
    #[arg(long, conflicts_with = "config")]
    preset: Option<String>,

    /// Number of agents
    #[arg(short = 'n', long)]
    agents: Option<usize>,

    /// Probability of each possible edge
    #[arg(short = 'p', long)]
    edge_probability: Option<f64>,

    /// Confidence threshold
    #[arg(long)]
    confidence: Option<f64>,

    /// Adaptation rate
    #[arg(long)]
    alpha: Option<f64>,

    /// Agents picked for an update each step
    #[arg(short = 'q', long)]
    update_nodes: Option<usize>,

    /// Maximum number of steps
    #[arg(long)]
    max_steps: Option<usize>,

    /// Consecutive unchanged steps needed to stop
    #[arg(long)]
    min_stationary: Option<usize>,

    /// Random seed
    #[arg(short, long)]
    seed: Option<u64>,

    /// Write the trajectory as CSV (step,agent_id,opinion)
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Write the run summary as JSON
    #[arg(long)]
    summary_json: Option<PathBuf>,

    /// Histogram bins for the snapshot plots
    #[arg(long, default_value = "20")]
    bins: usize,

    /// Log progress every N steps (requires -v)
    #[arg(long, default_value = "1000")]
    progress_interval: usize,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn params(&self) -> anyhow::Result<SimulationParams> {
        let mut params = match (&self.config, &self.preset) {
            (Some(path), _) => SimulationParams::from_toml_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            (None, Some(name)) => {
                SimulationParams::preset(name).ok_or_else(|| anyhow!("unknown preset '{name}'"))?
            }
            (None, None) => SimulationParams::default(),
        };

        if let Some(n) = self.agents {
            params.num_agents = n;
        }
        if let Some(p) = self.edge_probability {
            params.edge_probability = p;
        }
        if let Some(c) = self.confidence {
            params.confidence_threshold = c;
        }
        if let Some(a) = self.alpha {
            params.adaptation_rate = a;
        }
        if let Some(q) = self.update_nodes {
            params.num_update_nodes = q;
        }
        if let Some(steps) = self.max_steps {
            params.max_steps = steps;
        }
        if let Some(steps) = self.min_stationary {
            params.min_stationary = steps;
        }
        if let Some(seed) = self.seed {
            params.seed = seed;
        }
        Ok(params)
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Horizontal bar chart of opinion counts over [0, 1]
fn print_histogram(title: &str, opinions: &[f64], bins: usize) {
    const WIDTH: usize = 50;
    let counts = histogram(opinions, bins, 0.0, 1.0);
    let peak = counts.iter().copied().max().unwrap_or(0).max(1);
    let bin_width = 1.0 / counts.len() as f64;

    println!("\n{title}");
    for (k, &count) in counts.iter().enumerate() {
        let bar = "#".repeat(count * WIDTH / peak);
        println!("  [{:.2}, {:.2}) {:>5} {}", k as f64 * bin_width, (k + 1) as f64 * bin_width, count, bar);
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let params = cli.params()?;
    println!("========================================");
    println!("Bounded-Confidence Opinion Dynamics");
    println!("========================================");
    println!("Agents: {}", params.num_agents);
    println!(
        "Edge probability: {} (expected {:.1} edges)",
        params.edge_probability,
        params.expected_edges()
    );
    println!("Confidence threshold: {}", params.confidence_threshold);
    println!("Adaptation rate: {}", params.adaptation_rate);
    println!("Update nodes per step: {}", params.num_update_nodes);
    println!(
        "Max steps: {}, min stationary: {}, seed: {}\n",
        params.max_steps, params.min_stationary, params.seed
    );

    let system = OpinionSystem::new(params)?
        .with_observer(Box::new(ProgressLogger::new(cli.progress_interval)));
    let stats = run_to_completion(system)?;
    let trajectory = stats.clone().into_trajectory()?;

    let analysis = TrajectoryAnalysis::new(&stats, &trajectory, DEFAULT_CLUSTER_GAP);
    analysis.print_summary();

    if let (Some(first), Some(last)) = (trajectory.first(), trajectory.last()) {
        print_histogram("Opinions after step 1", first, cli.bins);
        print_histogram(
            &format!("Opinions after step {}", trajectory.len()),
            last,
            cli.bins,
        );
    }

    if let Some(path) = &cli.csv {
        write_trajectory_csv(&trajectory, path)
            .with_context(|| format!("writing {}", path.display()))?;
        println!("\nTrajectory written to {}", path.display());
    }
    if let Some(path) = &cli.summary_json {
        write_summary_json(&analysis, path)
            .with_context(|| format!("writing {}", path.display()))?;
        println!("Summary written to {}", path.display());
    }

    Ok(())
}
