//! Subnet Economy Simulation Library
//!
//! Block-by-block model of a multi-pool token economy: independent
//! constant-product subnets that accounts stake into and unstake from, a fixed
//! per-block emission, and dividends blended from global and per-subnet stake.
//!
//! ## Modules
//!
//! - `pool`: bonding-curve subnet and the 1:1 root pool
//! - `participant`: account balances and positions
//! - `action`: scheduled trades and amount specifiers
//! - `ledger`: the block-stepped engine (trades, emission, dividends, checkpoints)
//! - `snapshot`: recorded output stream and JSON emission
//! - `scenario`: JSON configuration, reference scenarios, random schedules
//!
//! ## Usage
//!
//! ```bash
//! # Run a built-in scenario and write the snapshot files to ./data
//! cargo run --bin subnet_sim --release -- --scenario simple --out data
//!
//! # Run a JSON scenario
//! cargo run --bin subnet_sim --release -- --config scenario.json --out data
//!
//! # Compare root and subnet stakers across dividend splits
//! cargo run --bin root_versus_alpha --release
//! ```

pub mod action;
pub mod error;
pub mod ledger;
pub mod participant;
pub mod pool;
pub mod scenario;
pub mod snapshot;

pub use action::{ActionKind, AmountSpec, Direction, ScheduledAction};
pub use error::{Result, SimError};
pub use ledger::{EconomyParams, Ledger, RootWeightMode, EMISSION_UNIT};
pub use participant::{Participant, ParticipantId};
pub use pool::{Pool, PoolId};
pub use scenario::{Scenario, ScenarioConfig};
pub use snapshot::{RunSummary, SnapshotStream};
