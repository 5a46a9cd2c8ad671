//! Whole-Body Tracking Dispatcher CLI
//!
//! Discovers pending motion-tracking training jobs, splits them across
//! cooperating machines, and runs this machine's share over per-GPU workers.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_indicatif::IndicatifLayer;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use wbt_dispatch::{
    config::DispatchConfig,
    discovery,
    dispatcher::Dispatcher,
    registry::{RunRegistry, TaskStatus},
    runner::TrainRunner,
};

#[derive(Parser)]
#[command(name = "wbt-dispatch", about = "Whole-body tracking training dispatcher")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run parallel training across GPUs
    Run {
        /// Path to dispatch.toml config file
        #[arg(long, default_value = "dispatch.toml")]
        config: String,

        /// Root directory containing motion .npz files
        #[arg(long = "root_dir")]
        root_dir: Option<PathBuf>,

        /// Directory the trainer writes run directories into
        #[arg(long = "logs_dir")]
        logs_dir: Option<PathBuf>,

        /// GPU ids to use (e.g. --gpu_ids 0 1 2)
        #[arg(long = "gpu_ids", num_args = 1.., required = true)]
        gpu_ids: Vec<u32>,

        /// Number of worker processes per GPU
        #[arg(long = "workers_per_gpu")]
        workers_per_gpu: Option<usize>,

        /// Total number of distributed worker machines (for splitting work)
        #[arg(long = "num_workers", default_value_t = 1)]
        num_workers: usize,

        /// This machine's index (0 to num_workers-1)
        #[arg(long = "worker_split", default_value_t = 0)]
        worker_split: usize,

        /// Delete incomplete run directories before re-queueing their motions
        #[arg(long = "delete_incomplete")]
        delete_incomplete: bool,

        /// Print the task slice and worker plan without running anything
        #[arg(long = "dry_run")]
        dry_run: bool,
    },

    /// Show completion status for every candidate motion
    Status {
        /// Path to dispatch.toml config file
        #[arg(long, default_value = "dispatch.toml")]
        config: String,

        /// Root directory containing motion .npz files
        #[arg(long = "root_dir")]
        root_dir: Option<PathBuf>,

        /// Directory the trainer writes run directories into
        #[arg(long = "logs_dir")]
        logs_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // tracing goes through the indicatif layer so log lines don't clobber
    // the worker spinners
    let indicatif_layer = IndicatifLayer::new();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(indicatif_layer.get_stderr_writer()))
        .with(
            EnvFilter::builder()
                .with_default_directive(tracing::Level::INFO.into())
                .from_env_lossy(),
        )
        .with(indicatif_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            root_dir,
            logs_dir,
            gpu_ids,
            workers_per_gpu,
            num_workers,
            worker_split,
            delete_incomplete,
            dry_run,
        } => {
            let mut cfg = DispatchConfig::load_or_default(&config)?;
            if let Some(dir) = root_dir {
                cfg.dispatch.root_dir = dir;
            }
            if let Some(dir) = logs_dir {
                cfg.dispatch.logs_dir = dir;
            }
            if let Some(n) = workers_per_gpu {
                cfg.dispatch.workers_per_gpu = n;
            }
            if delete_incomplete {
                cfg.dispatch.delete_incomplete = true;
            }

            let registry = RunRegistry::new(&cfg.dispatch.logs_dir, &cfg.dispatch.checkpoint_file);
            let tasks = discovery::discover_tasks(
                &cfg.dispatch.root_dir,
                &registry,
                cfg.dispatch.delete_incomplete,
            )?;
            tracing::info!("total tasks discovered: {}", tasks.len());

            let slice = discovery::split_tasks(tasks, num_workers, worker_split)?;
            tracing::info!(
                "tasks for this worker split ({worker_split}/{num_workers}): {}",
                slice.len()
            );

            let total_workers = gpu_ids.len() * cfg.dispatch.workers_per_gpu;
            println!("GPUs                   : {gpu_ids:?}");
            println!("Workers per GPU        : {}", cfg.dispatch.workers_per_gpu);
            println!("Total worker processes : {total_workers}");

            if dry_run {
                println!();
                println!("Would run {} tasks:", slice.len());
                for motion in &slice {
                    println!("  - {motion}");
                }
                return Ok(());
            }

            let runner = TrainRunner::new(cfg.trainer.clone(), &cfg.dispatch.dispatch_log_dir);
            let dispatcher = Dispatcher::new(gpu_ids, cfg.dispatch.workers_per_gpu, runner);
            dispatcher.run(slice).await;

            println!("All tasks completed!");
        }

        Commands::Status {
            config,
            root_dir,
            logs_dir,
        } => {
            let mut cfg = DispatchConfig::load_or_default(&config)?;
            if let Some(dir) = root_dir {
                cfg.dispatch.root_dir = dir;
            }
            if let Some(dir) = logs_dir {
                cfg.dispatch.logs_dir = dir;
            }

            let registry = RunRegistry::new(&cfg.dispatch.logs_dir, &cfg.dispatch.checkpoint_file);
            let motions = discovery::list_motions(&cfg.dispatch.root_dir)?;

            if motions.is_empty() {
                println!("No motion files in {}.", cfg.dispatch.root_dir.display());
                return Ok(());
            }

            println!("=== Motion Status ===");
            println!();

            for motion in &motions {
                let record = registry.record(motion);
                let status = match record.status() {
                    TaskStatus::Pending => "PENDING",
                    TaskStatus::Incomplete => "INCOMPLETE",
                    TaskStatus::Completed => "COMPLETED",
                };
                println!("{motion}: {status}");
                for dir in &record.completed {
                    println!("  run: {} [checkpoint]", dir.display());
                }
                for dir in &record.incomplete {
                    println!("  run: {}", dir.display());
                }
            }
        }
    }

    Ok(())
}
