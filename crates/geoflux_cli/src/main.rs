//! geoflux CLI
//!
//! Runs headless animation scenarios against a map container and reports
//! the result as JSON.

mod config;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::GeofluxConfig;
use geoflux_app::headless_runner::{run_loaded_scenario, RunOutcome};
use geoflux_app::headless_scenario::HeadlessScenario;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "geoflux")]
#[command(author, version, about = "geoflux animation scenario runner", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scenario file headlessly
    Run {
        /// Scenario JSON file
        scenario: PathBuf,

        /// Config file (geoflux.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Logical milliseconds between frames
        #[arg(long)]
        tick_ms: Option<u64>,

        /// Override the phase seed
        #[arg(long)]
        seed: Option<u64>,

        /// Write the report to this relative path instead of stdout
        #[arg(short, long)]
        report: Option<PathBuf>,
    },

    /// Write a default geoflux.toml
    Init {
        /// Directory to write into
        #[arg(default_value = ".")]
        path: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run {
            scenario,
            config,
            tick_ms,
            seed,
            report,
        } => cmd_run(&scenario, config.as_deref(), tick_ms, seed, report.as_deref()),
        Commands::Init { path } => cmd_init(&path),
    }
}

fn cmd_run(
    scenario_path: &Path,
    config_path: Option<&Path>,
    tick_ms: Option<u64>,
    seed: Option<u64>,
    report_path: Option<&Path>,
) -> Result<()> {
    let mut config = match config_path {
        Some(path) => GeofluxConfig::load(path)?,
        None => GeofluxConfig::default(),
    };
    if let Some(tick_ms) = tick_ms {
        config.headless.tick_ms = tick_ms;
    }
    if let Some(seed) = seed {
        config.driver.seed = seed;
    }

    let scenario = HeadlessScenario::from_path(scenario_path)
        .with_context(|| format!("Failed to load scenario {}", scenario_path.display()))?;
    info!("Running {}", scenario_path.display());

    let outcome = run_loaded_scenario(&scenario, config.runtime(), config.driver.clone())?;
    let report = outcome.report();
    match report_path {
        Some(path) => {
            report.write_to_path(path)?;
            info!("Report written to {}", path.display());
        }
        None => report.write_to_writer(&mut std::io::stdout().lock())?,
    }

    match outcome {
        RunOutcome::Passed { report } => {
            info!(
                frames = report.stats.elapsed_frames,
                completions = report.stats.completions,
                "scenario passed"
            );
            Ok(())
        }
        RunOutcome::Failed { report } => anyhow::bail!(
            "step {} failed: {}",
            report.failed_step_index.unwrap_or_default(),
            report.message.unwrap_or_default()
        ),
    }
}

fn cmd_init(path: &Path) -> Result<()> {
    let config_path = path.join("geoflux.toml");
    if config_path.exists() {
        anyhow::bail!("{} already exists", config_path.display());
    }
    std::fs::create_dir_all(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    std::fs::write(&config_path, GeofluxConfig::default().to_toml()?)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;
    info!("Created {}", config_path.display());
    Ok(())
}
