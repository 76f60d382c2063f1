//! Headless encounter runner.
//!
//! This binary runs encounters without graphics, either from a scenario
//! file or controlled via JSON on stdin/stdout.
//!
//! # Usage
//!
//! ```bash
//! # Interactive mode - read commands from stdin
//! cargo run -p skirmish_headless
//!
//! # Run a scenario and print its summary
//! cargo run -p skirmish_headless -- run --scenario assets/scenarios/duel.ron
//!
//! # Check that repeated runs agree
//! cargo run -p skirmish_headless -- verify --scenario assets/scenarios/duel.ron --runs 10
//!
//! # Check data files
//! cargo run -p skirmish_headless -- validate --archetypes assets/data/archetypes.ron
//! ```
//!
//! # Protocol
//!
//! Input (stdin): JSON commands, one per line
//! Output (stdout): JSON responses, one per line
//! Logs (stderr): Debug information
//!
//! See the protocol module for command/response format.

use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use skirmish_core::config::EncounterConfig;
use skirmish_core::data::ArchetypeCatalog;
use skirmish_core::encounter::Encounter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use skirmish_headless::{
    data_loader::{default_data_dir, load_catalog, load_config, load_data_dir},
    runner::{ScenarioRunner, Session},
    scenario::{Scenario, ScenarioError},
};

#[derive(Parser)]
#[command(name = "skirmish_headless")]
#[command(about = "Headless encounter runner for scenarios and external controllers")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Data directory with archetypes.ron and encounter.ron
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scenario to completion and print a JSON summary
    Run {
        /// Scenario file to load
        #[arg(short, long)]
        scenario: PathBuf,

        /// Override the scenario's tick limit
        #[arg(long)]
        max_ticks: Option<u64>,
    },

    /// Drive an empty encounter with JSON lines on stdin
    Interactive {
        /// Spawn the opening lineup before accepting commands
        #[arg(long)]
        lineup: bool,
    },

    /// Run a scenario several times and compare final state hashes
    Verify {
        /// Scenario file to load
        #[arg(short, long)]
        scenario: PathBuf,

        /// Number of runs
        #[arg(short, long, default_value = "5")]
        runs: u32,
    },

    /// Check archetype and config files without running anything
    Validate {
        /// Archetype list (RON)
        #[arg(short, long)]
        archetypes: PathBuf,

        /// Encounter tuning (RON)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging to stderr (stdout is for protocol)
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    let data = cli.data.or_else(default_data_dir);
    let result = match cli.command {
        Some(Commands::Run {
            scenario,
            max_ticks,
        }) => cmd_run(&scenario, max_ticks, data.as_deref()),
        Some(Commands::Interactive { lineup }) => cmd_interactive(lineup, data.as_deref()),
        Some(Commands::Verify { scenario, runs }) => cmd_verify(&scenario, runs, data.as_deref()),
        Some(Commands::Validate { archetypes, config }) => {
            cmd_validate(&archetypes, config.as_deref())
        }
        None => cmd_interactive(false, data.as_deref()),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

/// Tuning and presets from the data directory, or the built-in ones.
fn load_setup(data: Option<&Path>) -> Result<(EncounterConfig, ArchetypeCatalog), ScenarioError> {
    match data {
        Some(dir) => {
            tracing::debug!(dir = %dir.display(), "loading encounter data");
            load_data_dir(dir)
        }
        None => Ok((EncounterConfig::default(), ArchetypeCatalog::builtin())),
    }
}

fn load_runner(scenario: &Path, data: Option<&Path>) -> Result<ScenarioRunner, ScenarioError> {
    let (config, catalog) = load_setup(data)?;
    ScenarioRunner::with_data(Scenario::load(scenario)?, &config, catalog)
}

/// Run a scenario and print its summary
fn cmd_run(
    scenario: &Path,
    max_ticks: Option<u64>,
    data: Option<&Path>,
) -> Result<ExitCode, ScenarioError> {
    tracing::info!("Running scenario {}", scenario.display());

    let mut runner = load_runner(scenario, data)?;
    let summary = match max_ticks {
        Some(limit) => {
            runner.run_for(limit);
            runner.summary()
        }
        None => runner.run(),
    };

    println!("{}", to_json(&summary));
    Ok(ExitCode::SUCCESS)
}

/// Run an interactive session on stdin/stdout
fn cmd_interactive(lineup: bool, data: Option<&Path>) -> Result<ExitCode, ScenarioError> {
    tracing::info!("Starting interactive session");

    let (config, catalog) = load_setup(data)?;
    let mut encounter = Encounter::with_setup(config, catalog)?;
    if lineup {
        encounter.spawn_starting_roster()?;
    }

    let stdin = io::stdin();
    let mut session = Session::new(encounter, stdin.lock(), io::stdout().lock());
    session.run()?;

    tracing::info!(tick = session.encounter().tick(), "session ended");
    Ok(ExitCode::SUCCESS)
}

/// Verify determinism
fn cmd_verify(scenario: &Path, runs: u32, data: Option<&Path>) -> Result<ExitCode, ScenarioError> {
    tracing::info!("Verifying determinism: {} ({} runs)", scenario.display(), runs);

    let mut hashes = Vec::with_capacity(runs as usize);
    for run in 0..runs {
        let summary = load_runner(scenario, data)?.run();
        tracing::debug!(run, ticks = summary.ticks_run, hash = summary.final_hash, "run finished");
        hashes.push(summary.final_hash);
    }

    let deterministic = hashes.windows(2).all(|pair| pair[0] == pair[1]);
    println!(
        "{}",
        serde_json::json!({
            "scenario": scenario.display().to_string(),
            "runs": runs,
            "hashes": hashes,
            "deterministic": deterministic,
        })
    );

    if deterministic {
        eprintln!("PASS: All {runs} runs produced identical results");
        Ok(ExitCode::SUCCESS)
    } else {
        eprintln!("FAIL: Non-determinism detected!");
        Ok(ExitCode::FAILURE)
    }
}

/// Validate data files
fn cmd_validate(archetypes: &Path, config: Option<&Path>) -> Result<ExitCode, ScenarioError> {
    let catalog = load_catalog(archetypes)?;
    eprintln!(
        "OK: {} archetypes ({})",
        catalog.len(),
        catalog.names().collect::<Vec<_>>().join(", ")
    );

    if let Some(path) = config {
        load_config(path)?;
        eprintln!("OK: encounter config {}", path.display());
    }
    Ok(ExitCode::SUCCESS)
}

fn to_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| format!(r#"{{"error":"Serialization failed: {e}"}}"#))
}
