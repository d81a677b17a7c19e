//! forge - concurrent Go tool builder
//!
//! Reads a manifest of tools, builds each one in an isolated scratch
//! directory under a shared load-aware scheduler, and drops the binaries
//! into the output directory.

use std::sync::Arc;

use clap::Parser;
use colored::Colorize;
use eyre::{Context, Result};
use tracing::info;

use toolforge::admission::{AdmissionGate, SystemLoad};
use toolforge::build::{Builder, SystemRunner};
use toolforge::cli::Cli;
use toolforge::config::{self, Config};
use toolforge::job;
use toolforge::progress::ConsoleProgress;
use toolforge::scheduler::{Scheduler, SchedulerConfig};
use toolforge::workspace::Workspace;

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    let output_dir = match cli.output_dir {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };

    let work = config::select(config.tools, &cli.tools);
    if work.is_empty() {
        println!("Nothing to build");
        return Ok(());
    }

    job::reject_duplicate_artifacts(&work).context("Invalid tool set")?;

    let workspace =
        Arc::new(Workspace::create(&output_dir, cli.keep).context("Failed to create build directory")?);

    let cpus = std::thread::available_parallelism()
        .context("Failed to read CPU count")?
        .get();

    let limits = SchedulerConfig::default();
    let admission = AdmissionGate::new(
        Box::new(SystemLoad),
        limits.max_load_per_cpu * cpus as f64,
        limits.poll_interval,
    );

    let builder = Arc::new(Builder::new(
        output_dir.clone(),
        Arc::clone(&workspace),
        Arc::new(SystemRunner),
    ));
    let progress = Arc::new(ConsoleProgress::new(work.len() as u64));
    let scheduler = Scheduler::new(admission, limits.max_concurrent, builder, progress);

    info!(
        tools = work.len(),
        output_dir = %output_dir.display(),
        "starting build run"
    );

    let outcomes = scheduler.run(work).await;

    // Cleanup runs whether or not the batch survived.
    workspace.cleanup();

    let outcomes = outcomes?;
    let failed = outcomes.iter().filter(|o| !o.is_success()).count();
    let built = outcomes.len() - failed;

    if failed == 0 {
        println!(
            "{} Built {} tool(s) into {}",
            "✓".green(),
            built,
            output_dir.display()
        );
    } else {
        println!(
            "{} Built {} tool(s), {} failed (see log)",
            "!".yellow(),
            built,
            failed
        );
    }

    Ok(())
}
