//! Root Versus Alpha Comparison Binary
//!
//! Pits a root staker against a subnet staker across dividend splits and
//! balancing modes, then prints their final market values.
//!
//! ## Usage
//! ```bash
//! cargo run --bin root_versus_alpha --release
//! ```

use std::process::ExitCode;

use subnet_simulation::{Result, Scenario};
use tracing::error;
use tracing_subscriber::EnvFilter;

const BLOCKS: u64 = 7200;
const SPLITS: [f64; 5] = [0.0, 0.25, 0.5, 0.75, 1.0];

fn print_comparison_table() -> Result<()> {
    println!("| Split | Balanced | Root holder | Alpha holder | Supply    | Sum prices |");
    println!("|-------|----------|-------------|--------------|-----------|------------|");

    for balanced in [true, false] {
        for split in SPLITS {
            let mut config = Scenario::RootVersusAlpha.build(0)?;
            config.blocks = BLOCKS;
            config.global_split = split;
            config.balanced = balanced;

            let stream = config.into_ledger()?.run();
            let Some(summary) = stream.summary() else {
                continue;
            };
            let value = |id: u32| summary.market_values.get(&id).copied().unwrap_or(0.0);

            println!(
                "| {:5.2} | {:8} | {:11.2} | {:12.2} | {:9.1} | {:10.4} |",
                split,
                balanced,
                value(1),
                value(2),
                summary.tao_supply,
                summary.sum_prices,
            );
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    println!("=======================================================");
    println!("  Root Versus Alpha");
    println!("  Final market value by dividend split");
    println!("=======================================================");
    println!();
    println!("Parameters:");
    println!("  Blocks: {}, Root weight: 0.50", BLOCKS);
    println!();

    if let Err(err) = print_comparison_table() {
        error!("{err}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
