//! Snapshot Stream
//!
//! Four append-only record sequences produced by a run. Field names follow the
//! JSON layout consumed by the plotting tools, so records serialize directly.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::action::ActionKind;
use crate::error::Result;
use crate::participant::ParticipantId;
use crate::pool::PoolId;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AccountRecord {
    pub block: u64,
    pub account_id: ParticipantId,
    pub free_balance: f64,
    pub market_value: f64,
    pub alpha_stakes: BTreeMap<PoolId, f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PoolRecord {
    pub block: u64,
    pub subnet_id: PoolId,
    pub tao_in: f64,
    pub alpha_in: f64,
    pub alpha_out: f64,
    pub exchange_rate: f64,
    pub emission_rate: f64,
    /// Blended dividend share per participant. Empty for the root pool.
    pub dividends: BTreeMap<ParticipantId, f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub block: u64,
    pub account_id: ParticipantId,
    pub subnet_id: PoolId,
    pub action: ActionKind,
    pub amount: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EconomyRecord {
    pub block: u64,
    pub tao_supply: f64,
    pub sum_prices: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotStream {
    pub accounts: Vec<AccountRecord>,
    pub pools: Vec<PoolRecord>,
    pub actions: Vec<ActionRecord>,
    pub economy: Vec<EconomyRecord>,
}

impl SnapshotStream {
    pub fn last_checkpoint(&self) -> Option<u64> {
        self.economy.last().map(|r| r.block)
    }

    pub fn accounts_at(&self, block: u64) -> impl Iterator<Item = &AccountRecord> {
        self.accounts.iter().filter(move |r| r.block == block)
    }

    pub fn pools_at(&self, block: u64) -> impl Iterator<Item = &PoolRecord> {
        self.pools.iter().filter(move |r| r.block == block)
    }

    /// Condense the final checkpoint. `None` for an empty run.
    pub fn summary(&self) -> Option<RunSummary> {
        let last = self.economy.last()?;
        Some(RunSummary {
            final_block: last.block,
            checkpoints: self.economy.len(),
            executed_actions: self.actions.len(),
            tao_supply: last.tao_supply,
            sum_prices: last.sum_prices,
            market_values: self
                .accounts_at(last.block)
                .map(|r| (r.account_id, r.market_value))
                .collect(),
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RunSummary {
    pub final_block: u64,
    pub checkpoints: usize,
    pub executed_actions: usize,
    pub tao_supply: f64,
    pub sum_prices: f64,
    pub market_values: BTreeMap<ParticipantId, f64>,
}

impl RunSummary {
    pub fn print(&self) {
        println!("  Final block:             {}", self.final_block);
        println!("  Checkpoints:             {}", self.checkpoints);
        println!("  Executed actions:        {}", self.executed_actions);
        println!("  Base supply:             {:.4}", self.tao_supply);
        println!("  Sum of prices:           {:.4}", self.sum_prices);
        for (id, value) in &self.market_values {
            println!("  Account {:<4} value:      {:.4}", id, value);
        }
    }
}

/// Write the four sequences as pretty-printed JSON under `dir`.
pub fn write_snapshots(dir: &Path, stream: &SnapshotStream) -> Result<()> {
    fs::create_dir_all(dir)?;
    write_json(&dir.join("accounts.json"), &stream.accounts)?;
    write_json(&dir.join("subnets.json"), &stream.pools)?;
    write_json(&dir.join("trades.json"), &stream.actions)?;
    write_json(&dir.join("subtensor.json"), &stream.economy)?;
    Ok(())
}

pub fn write_json<T: Serialize + ?Sized>(path: &Path, data: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(data)?;
    fs::write(path, json)?;
    Ok(())
}

pub fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn economy(block: u64, supply: f64) -> EconomyRecord {
        EconomyRecord {
            block,
            tao_supply: supply,
            sum_prices: 0.5,
        }
    }

    #[test]
    fn test_summary_uses_last_checkpoint() {
        let mut stream = SnapshotStream::default();
        assert!(stream.summary().is_none());

        for (block, value) in [(0, 10.0), (9, 12.5)] {
            stream.economy.push(economy(block, 100.0 + block as f64));
            stream.accounts.push(AccountRecord {
                block,
                account_id: 1,
                free_balance: 0.0,
                market_value: value,
                alpha_stakes: BTreeMap::new(),
            });
        }

        let summary = stream.summary().unwrap();
        assert_eq!(summary.final_block, 9);
        assert_eq!(summary.checkpoints, 2);
        assert_eq!(summary.tao_supply, 109.0);
        assert_eq!(summary.market_values.get(&1), Some(&12.5));
    }

    #[test]
    fn test_write_and_read_back() {
        let dir = std::env::temp_dir().join(format!("subnet-sim-snapshot-{}", std::process::id()));
        let mut stream = SnapshotStream::default();
        stream.economy.push(economy(3, 42.0));

        write_snapshots(&dir, &stream).unwrap();
        let economy: Vec<EconomyRecord> = read_json(&dir.join("subtensor.json")).unwrap();
        assert_eq!(economy, stream.economy);
        assert!(dir.join("accounts.json").exists());

        fs::remove_dir_all(&dir).unwrap();
    }
}
