//! # Clip Batch Runner
//!
//! Command-line entry point: loads the batch configuration, clips every
//! configured target dataset against the boundary's polygons with the
//! process-isolated worker, and prints the batch summary.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

use clip_batch::logging::{init_structured_logging, log_batch_runtime};
use clip_batch::{
    BatchConfig, BatchOrchestrator, BatchReport, ConfigLoader, Dispatcher, GeoJsonWorkspace,
    ProcessClipBackend, RoundSummary,
};

#[derive(Parser)]
#[command(name = "clip-batch")]
#[command(about = "Clip target datasets by every polygon of a boundary dataset, in parallel")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Configuration file (YAML or TOML)
    #[arg(short, long, env = "CLIP_BATCH_CONFIG")]
    config: Option<PathBuf>,

    /// Environment name used to pick the override file
    #[arg(short, long, env = "CLIP_BATCH_ENV")]
    environment: Option<String>,

    /// Worker slots per round (defaults to the logical core count)
    #[arg(short, long)]
    parallelism: Option<usize>,

    /// Exit with status 1 when any job or round failed
    #[arg(long)]
    strict: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the batch (default)
    Run {
        /// Print the full batch report as JSON on stdout
        #[arg(long)]
        json: bool,
    },

    /// Load and validate the configuration, then print it
    Check,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_structured_logging();
    let started = Instant::now();

    match execute(cli).await {
        Ok(code) => process::exit(code),
        Err(e) => {
            error!(error = %format!("{e:#}"), "clip-batch failed");
            eprintln!("error: {e:#}");
            // Runtime is reported on every exit path
            log_batch_runtime("not-started", started.elapsed(), 0, 0);
            process::exit(2);
        }
    }
}

async fn execute(cli: Cli) -> anyhow::Result<i32> {
    let config = load_config(&cli)?;

    match cli.command.unwrap_or(Commands::Run { json: false }) {
        Commands::Check => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(0)
        }
        Commands::Run { json } => {
            let report = run_batch(config).await;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_summary(&report);
            }

            Ok(if cli.strict && !report.is_clean() { 1 } else { 0 })
        }
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<BatchConfig> {
    let mut loader = ConfigLoader::new();
    if let Some(path) = &cli.config {
        loader = loader.with_file(path);
    }
    if let Some(environment) = &cli.environment {
        loader = loader.with_environment(environment);
    }

    let mut config = loader.load().context("loading batch configuration")?;
    if cli.parallelism.is_some() {
        config.parallelism = cli.parallelism;
        config.validate().context("validating command-line overrides")?;
    }

    info!(
        environment = loader.environment(),
        boundary = %config.boundary,
        targets = ?config.targets,
        "Configuration ready"
    );
    Ok(config)
}

async fn run_batch(config: BatchConfig) -> BatchReport {
    let source = Arc::new(GeoJsonWorkspace::new(&config.workspace));
    let backend = Arc::new(ProcessClipBackend::new(
        config.worker.executable.clone(),
        config.worker.args.clone(),
        &config.workspace,
    ));

    let dispatcher = match config.parallelism {
        Some(slots) => Dispatcher::with_parallelism(backend, slots),
        None => Dispatcher::new(backend),
    };

    BatchOrchestrator::new(config, source, dispatcher).run().await
}

fn print_summary(report: &BatchReport) {
    for round in &report.rounds {
        match round {
            RoundSummary::Completed(r) if r.failed_count() > 0 => println!(
                "{}: {} of {} jobs failed",
                r.target,
                r.failed_count(),
                r.submitted
            ),
            RoundSummary::Completed(r) => println!("{}: {} jobs succeeded", r.target, r.submitted),
            RoundSummary::Failed { target, error } => println!("{target}: round failed: {error}"),
        }
    }
    println!("Batch runtime: {:.3} seconds", report.elapsed.as_secs_f64());
}
