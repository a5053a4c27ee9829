//! Subnet Economy Simulation Binary
//!
//! Runs a built-in scenario or a JSON scenario file and writes the four
//! snapshot files (`accounts.json`, `subnets.json`, `trades.json`,
//! `subtensor.json`).
//!
//! ## Usage
//! ```bash
//! cargo run --bin subnet_sim --release -- --scenario random --seed 7 --out data
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use subnet_simulation::snapshot::write_snapshots;
use subnet_simulation::{Result, RootWeightMode, Scenario, ScenarioConfig};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "subnet_sim")]
#[command(about = "Simulate staking, emission and dividends across subnets")]
struct Cli {
    /// Built-in scenario (simple, root-versus-alpha, example, cabal, random)
    #[arg(short, long, default_value = "simple", conflicts_with = "config")]
    scenario: String,

    /// JSON scenario file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seed for the random scenario
    #[arg(long, default_value = "0")]
    seed: u64,

    /// Override the block count
    #[arg(short, long)]
    blocks: Option<u64>,

    /// Decay root weight linearly over the run
    #[arg(long)]
    decay_root_weight: bool,

    /// Output directory for the snapshot files
    #[arg(short, long, default_value = "data")]
    out: PathBuf,
}

fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => ScenarioConfig::load(path)?,
        None => cli.scenario.parse::<Scenario>()?.build(cli.seed)?,
    };
    if let Some(blocks) = cli.blocks {
        config.blocks = blocks;
    }
    if cli.decay_root_weight {
        config.root_weight_mode = RootWeightMode::LinearDecay;
    }

    println!("=======================================================");
    println!("  Subnet Economy Simulation");
    println!("=======================================================");
    println!();
    println!("Parameters:");
    println!("  Blocks: {}, Checkpoints: {}", config.blocks, config.n_steps);
    println!("  Subnets: {}, Accounts: {}, Trades: {}", config.subnets.len(), config.accounts.len(), config.trades.len());
    println!("  Global split: {:.2}, Root weight: {:.2}", config.global_split, config.root_weight);
    println!("  Balanced: {}", config.balanced);
    println!();

    let mut ledger = config.into_ledger()?;
    let stream = ledger.run();

    write_snapshots(&cli.out, &stream)?;
    info!(dir = %cli.out.display(), "wrote snapshots");

    if let Some(summary) = stream.summary() {
        println!("Results:");
        println!("{}", "-".repeat(50));
        summary.print();
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}
