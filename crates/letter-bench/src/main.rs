use std::path::PathBuf;

use clap::Parser;

use letter_bench::config::{BenchmarkConfig, ResolvedOutputs};
use letter_bench::logging::init_logging;
use letter_bench::tournament::TournamentRunner;

/// Tournament benchmarking harness for Love Letter bots.
#[derive(Debug, Parser)]
#[command(
    name = "letter-bench",
    author,
    version,
    about = "Deterministic Love Letter bot tournament harness"
)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "bench/bench.yaml")]
    config: PathBuf,

    /// Override the run identifier (substitutes {run_id} templates).
    #[arg(long, value_name = "RUN_ID")]
    run_id: Option<String>,

    /// Override the number of seeded games to play.
    #[arg(long, value_name = "GAMES")]
    games: Option<usize>,

    /// Override the RNG seed for game generation.
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,

    /// Override the number of seat rotations per seed.
    #[arg(long, value_name = "COUNT")]
    rotations: Option<usize>,

    /// Exit after validating the configuration (no tournament is run).
    #[arg(long)]
    validate_only: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = BenchmarkConfig::from_path(&cli.config)?;

    if let Some(run_id) = cli.run_id {
        config.run_id = run_id;
    }

    if let Some(games) = cli.games {
        config.games.games = games;
    }

    if let Some(seed) = cli.seed {
        config.games.seed = Some(seed);
    }

    if let Some(rotations) = cli.rotations {
        config.games.rotations = Some(rotations);
    }

    config.validate()?;

    let outputs: ResolvedOutputs = config.resolved_outputs();
    let agent_count = config.agents.len();
    let run_id = config.run_id.clone();
    let games = config.games.games;
    let rotations = config.games.rotation_count();

    println!(
        "Loaded configuration '{run_id}' with {agent_count} agent{} ({games} games, {rotations} rotations)",
        if agent_count == 1 { "" } else { "s" }
    );

    let logging_guard = init_logging(&config.logging, &outputs, &run_id)?;
    let runner = TournamentRunner::new(config, outputs)?;

    if cli.validate_only {
        println!("Validation-only mode: tournament execution skipped.");
        return Ok(());
    }

    let summary = runner.run()?;
    println!(
        "Tournament complete for '{run_id}': {} games × {} rotations → {} rows at {}",
        summary.games_played,
        summary.rotations,
        summary.rows_written,
        summary.jsonl_path.display()
    );
    println!("Summary table: {}", summary.summary_path.display());
    if let Some(guard) = logging_guard.as_ref() {
        println!("Event log: {}", guard.log_path.display());
    }

    Ok(())
}
