//! Load-Balancing Simulation CLI
//!
//! Runs every requested strategy over one shared workload vector and prints
//! a comparison table.
//!
//! ```bash
//! loadsim --workers 4 --tasks 40 --seed 7
//! loadsim -s least-loaded,static --show-steps
//! RUST_LOG=loadsim_engine=debug loadsim --output report.json
//! ```

use std::fs;

use anyhow::{Context, Result};
use clap::Parser;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use loadsim_engine::{
    Engine, RunReport, SimError, Strategy, WorkloadRange, workload::WorkloadGenerator,
};

/// Used when `RUST_LOG` is unset: info for the binary and the engine library
const DEFAULT_LOG_FILTER: &str = "loadsim=info,loadsim_engine=info,warn";

#[derive(Parser, Debug)]
#[command(name = "loadsim")]
#[command(about = "Compare load-balancing strategies on synthetic workloads", long_about = None)]
struct Args {
    /// Number of workers
    #[arg(short, long, default_value_t = 4)]
    workers: usize,

    /// Number of tasks
    #[arg(short, long, default_value_t = 20)]
    tasks: usize,

    /// Strategies to compare (comma-separated: round-robin,least-loaded,random,static)
    #[arg(short, long, default_value = "round-robin,least-loaded,random,static")]
    strategies: String,

    /// Smallest task workload (inclusive)
    #[arg(long, default_value_t = 1)]
    min_workload: u64,

    /// Largest task workload (inclusive)
    #[arg(long, default_value_t = 10)]
    max_workload: u64,

    /// Seed for workloads and the random strategy (default: OS entropy)
    #[arg(long)]
    seed: Option<u64>,

    /// Abort a run that has not completed after this many steps
    #[arg(long, default_value_t = 10_000)]
    max_steps: u64,

    /// Print a line per step
    #[arg(long)]
    show_steps: bool,

    /// Output JSON file path (optional)
    #[arg(short, long)]
    output: Option<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let range = WorkloadRange::new(args.min_workload, args.max_workload)?;
    let strategies = args
        .strategies
        .split(',')
        .filter(|name| !name.trim().is_empty())
        .map(str::parse::<Strategy>)
        .collect::<std::result::Result<Vec<_>, SimError>>()?;
    if args.workers == 0 {
        return Err(SimError::InvalidWorkerCount(args.workers).into());
    }

    println!("Configuration:");
    println!("  Workers: {}", args.workers);
    println!("  Tasks: {}", args.tasks);
    println!("  Workload range: {}..={}", range.min, range.max);
    match args.seed {
        Some(seed) => println!("  Seed: {}\n", seed),
        None => println!("  Seed: (entropy)\n"),
    }

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    // Every strategy sees the same workloads
    let workloads = WorkloadGenerator::new(range)?
        .generate(args.tasks, &mut rng);
    info!(
        tasks = workloads.len(),
        total_work = workloads.iter().sum::<u64>(),
        "Generated workloads"
    );

    let mut reports = Vec::with_capacity(strategies.len());
    for strategy in strategies {
        let engine_rng = StdRng::from_rng(&mut rng)?;
        let mut engine =
            Engine::from_workloads(args.workers, workloads.clone(), strategy, engine_rng)?;

        if args.show_steps {
            println!("--- {} ---", strategy);
            run_with_trace(&mut engine, args.max_steps)?;
        } else {
            engine.run_to_completion(args.max_steps)?;
        }

        reports.push(engine.report()?);
    }

    print_table(&reports);

    if let Some(path) = &args.output {
        let json = serde_json::to_string_pretty(&reports)?;
        fs::write(path, json)
            .with_context(|| format!("writing report to {}", path))?;
        println!("\nResults written to {}", path);
    }

    Ok(())
}

/// Step one engine to completion, printing a summary per step
fn run_with_trace(engine: &mut Engine, max_steps: u64) -> Result<()> {
    while !engine.is_complete() {
        if engine.current_step() >= max_steps {
            return Err(SimError::StepLimitExceeded(max_steps).into());
        }
        engine.advance();

        let state = engine.snapshot();
        let loads: Vec<String> = state
            .workers
            .iter()
            .map(|w| w.current_load.to_string())
            .collect();
        println!(
            "step {:>4}  completed {:>4}/{:<4}  busy {:>3}  loads [{}]",
            state.current_step,
            state.completed_tasks,
            state.tasks.len(),
            state.busy_workers(),
            loads.join(", ")
        );
    }
    Ok(())
}

fn print_table(reports: &[RunReport]) {
    println!(
        "\n{:<14} {:>10} {:>10} {:>10} {:>12} {:>12} {:>12}",
        "Strategy", "Time", "Avg Comp", "Max Comp", "Imbalance", "Variance", "Efficiency"
    );
    println!("{}", "-".repeat(86));

    for report in reports {
        match &report.metrics {
            Some(m) => println!(
                "{:<14} {:>10} {:>10.2} {:>10} {:>12.2} {:>12.2} {:>11.1}%",
                report.strategy,
                m.total_time,
                m.avg_completion,
                m.max_completion,
                m.load_imbalance,
                m.load_variance,
                m.efficiency
            ),
            None => {
                warn!(
                    strategy = %report.strategy,
                    "No tasks completed; no metrics"
                );
                println!("{:<14} {:>10}", report.strategy, "-");
            }
        }
    }
}
