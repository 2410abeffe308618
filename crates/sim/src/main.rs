//! Command-line entry point for the combat tick driver.

use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use combat_content::{ContentFactory, ScenarioLoader};
use combat_core::Millis;
use combat_sim::{EventWriter, RunOptions, RunSummary, ScenarioRunner, Tally};

/// Seed override read when `--seed` is not given.
const SEED_ENV: &str = "COMBAT_SIM_SEED";

/// Runs scripted combat scenarios against the referee
#[derive(Parser)]
#[command(name = "combat-sim")]
#[command(about = "Deterministic combat scenario driver", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Play a scenario and stream its events as JSON lines
    Run {
        /// Content directory (config.toml, tables.toml, spells.ron, ...)
        #[arg(short, long, value_name = "DIR", default_value = "data")]
        content: PathBuf,

        /// Scenario name under `scenarios/`, or a path to a `.ron` file
        #[arg(short, long, value_name = "SCENARIO")]
        scenario: String,

        /// Simulation step in milliseconds
        #[arg(long, value_name = "MS", default_value_t = RunOptions::DEFAULT_TICK.0)]
        tick_ms: u64,

        /// Stop after this much simulated time instead of when the fight settles
        #[arg(long, value_name = "MS")]
        duration_ms: Option<u64>,

        /// Seed override
        #[arg(long)]
        seed: Option<u64>,

        /// Print only the summary
        #[arg(short, long)]
        quiet: bool,
    },

    /// Load all content and report cross-reference problems
    Check {
        #[arg(short, long, value_name = "DIR", default_value = "data")]
        content: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Run {
            content,
            scenario,
            tick_ms,
            duration_ms,
            seed,
            quiet,
        } => {
            let seed = match seed {
                Some(seed) => Some(seed),
                None => seed_from_env()?,
            };
            let options = RunOptions {
                tick: Millis(tick_ms),
                duration: duration_ms.map(Millis),
                seed,
            };
            run(&content, &scenario, options, quiet)
        }
        Command::Check { content } => check(&content),
    }
}

fn seed_from_env() -> Result<Option<u64>> {
    match std::env::var(SEED_ENV) {
        Ok(value) => value
            .parse()
            .map(Some)
            .with_context(|| format!("{} is not a valid seed: {}", SEED_ENV, value)),
        Err(_) => Ok(None),
    }
}

fn run(content_dir: &Path, scenario: &str, options: RunOptions, quiet: bool) -> Result<()> {
    let factory = ContentFactory::new(content_dir);
    let content = factory.load_all()?;

    let scenario = if scenario.ends_with(".ron") {
        ScenarioLoader::load(Path::new(scenario))?
    } else {
        factory.load_scenario(scenario)?
    };
    tracing::info!(
        scenario = %scenario.name,
        units = scenario.units.len(),
        actions = scenario.script.len(),
        "starting run"
    );

    let mut runner = ScenarioRunner::new(&content, &scenario, options)?;
    let mut tally = Tally::default();
    let mut writer = EventWriter::new(BufWriter::new(io::stdout().lock()));
    let mut write_error = None;

    let elapsed = runner.run(|at, event| {
        tally.record(event);
        if quiet || write_error.is_some() {
            return;
        }
        if let Err(error) = writer.write(at, event) {
            write_error = Some(error);
        }
    });
    if let Some(error) = write_error {
        return Err(error.context("writing events"));
    }
    let written = writer.written();
    let mut out = writer.finish()?;

    let summary = RunSummary::collect(&scenario.name, &runner, &tally);
    serde_json::to_writer_pretty(&mut out, &summary)?;
    out.write_all(b"\n")?;
    out.flush()?;

    tracing::info!(%elapsed, events = written, "run finished");
    Ok(())
}

fn check(content_dir: &Path) -> Result<()> {
    let factory = ContentFactory::new(content_dir);
    let content = factory.load_all()?;
    let issues = content.validate();

    let scenarios_dir = factory.data_dir().join("scenarios");
    let mut scenarios = 0;
    if scenarios_dir.is_dir() {
        for entry in std::fs::read_dir(&scenarios_dir)
            .with_context(|| format!("Failed to list {}", scenarios_dir.display()))?
        {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "ron") {
                ScenarioLoader::load(&path)?;
                scenarios += 1;
            }
        }
    }

    for issue in &issues {
        println!("{}", issue);
    }
    tracing::info!(
        spells = content.catalog.len(),
        scenarios,
        issues = issues.len(),
        "content checked"
    );
    if !issues.is_empty() {
        anyhow::bail!("{} content issue(s)", issues.len());
    }
    Ok(())
}
