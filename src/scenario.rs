//! Scenario Configuration
//!
//! JSON-loadable run configuration plus a handful of reference economies.
//!
//! ## Built-in scenarios
//! - `simple`: one root holder and one subnet holder, each exiting mid-run
//! - `root-versus-alpha`: ten-block comparison of a root stake and a subnet stake
//! - `example`: root stake against a position spread over three subnets
//! - `cabal`: two accounts rotating all of their stake into their own subnet every block
//! - `random`: seeded random trading over a root and three subnets

use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

use rand::prelude::*;
use rand::seq::index;
use rand_distr::{Bernoulli, Distribution, Uniform};
use serde::{Deserialize, Serialize};

use crate::action::{ActionKind, ScheduledAction};
use crate::error::{Result, SimError};
use crate::ledger::{EconomyParams, Ledger, RootWeightMode};
use crate::participant::{Participant, ParticipantId};
use crate::pool::{Pool, PoolId};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SubnetConfig {
    pub id: PoolId,
    pub tao_in: f64,
    pub alpha_in: f64,
    pub alpha_out: f64,
    #[serde(default)]
    pub is_root: bool,
}

impl SubnetConfig {
    pub fn new(id: PoolId, reserves: f64, is_root: bool) -> Self {
        Self {
            id,
            tao_in: reserves,
            alpha_in: reserves,
            alpha_out: reserves,
            is_root,
        }
    }

    pub fn to_pool(&self) -> Pool {
        Pool::new(self.id, self.tao_in, self.alpha_in, self.alpha_out, self.is_root)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AccountConfig {
    pub id: ParticipantId,
    pub free_balance: f64,
    #[serde(default)]
    pub alpha_stakes: BTreeMap<PoolId, f64>,
    #[serde(default)]
    pub registered_subnets: Vec<PoolId>,
}

impl AccountConfig {
    pub fn to_participant(&self) -> Participant {
        Participant::new(
            self.id,
            self.free_balance,
            self.alpha_stakes.clone(),
            self.registered_subnets.iter().copied(),
        )
    }
}

/// Everything needed to construct a [`Ledger`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    pub blocks: u64,
    pub n_steps: u64,
    pub tao_supply: f64,
    pub global_split: f64,
    pub balanced: bool,
    pub root_weight: f64,
    #[serde(default)]
    pub root_weight_mode: RootWeightMode,
    pub subnets: Vec<SubnetConfig>,
    pub accounts: Vec<AccountConfig>,
    #[serde(default)]
    pub trades: Vec<ScheduledAction>,
}

impl ScenarioConfig {
    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn params(&self) -> EconomyParams {
        EconomyParams {
            blocks: self.blocks,
            n_steps: self.n_steps,
            base_supply: self.tao_supply,
            global_split: self.global_split,
            balanced: self.balanced,
            root_weight: self.root_weight,
            root_weight_mode: self.root_weight_mode,
        }
    }

    pub fn pools(&self) -> Vec<Pool> {
        self.subnets.iter().map(SubnetConfig::to_pool).collect()
    }

    pub fn participants(&self) -> Vec<Participant> {
        self.accounts.iter().map(AccountConfig::to_participant).collect()
    }

    pub fn into_ledger(self) -> Result<Ledger> {
        let params = self.params();
        let pools = self.pools();
        let participants = self.participants();
        Ledger::new(pools, participants, self.trades, params)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scenario {
    Simple,
    RootVersusAlpha,
    Example,
    Cabal,
    Random,
}

impl Scenario {
    pub fn all() -> Vec<Self> {
        vec![
            Self::Simple,
            Self::RootVersusAlpha,
            Self::Example,
            Self::Cabal,
            Self::Random,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::RootVersusAlpha => "root-versus-alpha",
            Self::Example => "example",
            Self::Cabal => "cabal",
            Self::Random => "random",
        }
    }

    /// Build the scenario. `seed` only matters for [`Scenario::Random`].
    pub fn build(&self, seed: u64) -> Result<ScenarioConfig> {
        let config = match self {
            Self::Simple => simple(),
            Self::RootVersusAlpha => root_versus_alpha(),
            Self::Example => example(),
            Self::Cabal => cabal(),
            Self::Random => random(seed)?,
        };
        Ok(config)
    }
}

impl FromStr for Scenario {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self> {
        Self::all()
            .into_iter()
            .find(|scenario| scenario.name() == s)
            .ok_or_else(|| SimError::UnknownScenario(s.to_string()))
    }
}

fn account(id: ParticipantId, free_balance: f64, stakes: &[(PoolId, f64)], registered: &[PoolId]) -> AccountConfig {
    AccountConfig {
        id,
        free_balance,
        alpha_stakes: stakes.iter().copied().collect(),
        registered_subnets: registered.to_vec(),
    }
}

fn root_and_subnets(reserves: f64, subnets: PoolId) -> Vec<SubnetConfig> {
    std::iter::once(SubnetConfig::new(0, reserves, true))
        .chain((1..=subnets).map(|id| SubnetConfig::new(id, reserves, false)))
        .collect()
}

fn simple() -> ScenarioConfig {
    ScenarioConfig {
        blocks: 1000,
        n_steps: 10,
        tao_supply: 200.0,
        global_split: 0.5,
        balanced: true,
        root_weight: 0.5,
        root_weight_mode: RootWeightMode::Fixed,
        subnets: root_and_subnets(100.0, 1),
        accounts: vec![
            account(1, 50.0, &[(0, 50.0)], &[0, 1]),
            account(2, 0.0, &[(1, 100.0)], &[1]),
        ],
        trades: vec![
            ScheduledAction::new(500, 1, 0, ActionKind::Sell, "50%"),
            ScheduledAction::new(750, 2, 1, ActionKind::Sell, "all"),
        ],
    }
}

fn root_versus_alpha() -> ScenarioConfig {
    ScenarioConfig {
        blocks: 10,
        n_steps: 1,
        tao_supply: 200.0,
        global_split: 0.5,
        balanced: true,
        root_weight: 0.5,
        root_weight_mode: RootWeightMode::Fixed,
        subnets: root_and_subnets(100.0, 1),
        accounts: vec![
            account(1, 0.0, &[(0, 100.0)], &[0, 1]),
            account(2, 0.0, &[(1, 100.0)], &[1]),
        ],
        trades: Vec::new(),
    }
}

fn example() -> ScenarioConfig {
    let blocks = 10_000;
    let mut trades: Vec<ScheduledAction> = (0..=3)
        .map(|subnet| ScheduledAction::new(blocks, 1, subnet, ActionKind::Sell, "all"))
        .collect();
    trades.extend((1..=3).map(|subnet| ScheduledAction::new(blocks, 2, subnet, ActionKind::Sell, "all")));

    ScenarioConfig {
        blocks: blocks + 1,
        n_steps: 30,
        tao_supply: 200.0,
        global_split: 0.5,
        balanced: true,
        root_weight: 0.5,
        root_weight_mode: RootWeightMode::Fixed,
        subnets: root_and_subnets(1000.0, 3),
        accounts: vec![
            account(1, 100.0, &[(0, 100.0)], &[0, 1, 2, 3]),
            account(2, 100.0, &[(1, 33.33), (2, 33.33), (3, 33.33)], &[1, 2, 3]),
        ],
        trades,
    }
}

fn cabal() -> ScenarioConfig {
    let blocks = 1000;
    ScenarioConfig {
        blocks,
        n_steps: 50,
        tao_supply: 200.0,
        global_split: 0.5,
        balanced: true,
        root_weight: 0.5,
        root_weight_mode: RootWeightMode::Fixed,
        subnets: vec![
            SubnetConfig::new(1, 100_000.0, false),
            SubnetConfig::new(2, 100_000.0, false),
        ],
        accounts: vec![
            account(1, 350_000.0, &[], &[1, 2]),
            account(2, 650_000.0, &[], &[1, 2]),
        ],
        trades: cabal_trades((1, 1), (2, 2), blocks),
    }
}

fn random(seed: u64) -> Result<ScenarioConfig> {
    let blocks = 2160;
    let subnets = root_and_subnets(1000.0, 3);
    let registered: Vec<PoolId> = subnets.iter().map(|s| s.id).collect();
    let accounts: Vec<AccountConfig> = (1..=2).map(|id| account(id, 100.0, &[], &registered)).collect();

    let pools: Vec<Pool> = subnets.iter().map(SubnetConfig::to_pool).collect();
    let participants: Vec<Participant> = accounts.iter().map(AccountConfig::to_participant).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    let trades = generate_trades(&pools, &participants, blocks, &mut rng)?;

    Ok(ScenarioConfig {
        blocks,
        n_steps: 12,
        tao_supply: 1_000_000.0,
        global_split: 0.5,
        balanced: true,
        root_weight: 0.5,
        root_weight_mode: RootWeightMode::Fixed,
        subnets,
        accounts,
        trades,
    })
}

/// Two accounts, each paired with its own subnet, that pull everything out
/// of the other's subnet and restake it into their own on every block.
pub fn cabal_trades(
    first: (ParticipantId, PoolId),
    second: (ParticipantId, PoolId),
    blocks: u64,
) -> Vec<ScheduledAction> {
    let (a, a_pool) = first;
    let (b, b_pool) = second;

    let mut trades = vec![
        ScheduledAction::new(0, a, a_pool, ActionKind::Stake, "all"),
        ScheduledAction::new(0, b, b_pool, ActionKind::Stake, "all"),
    ];
    for block in 0..blocks {
        trades.push(ScheduledAction::new(block, a, b_pool, ActionKind::Unstake, "all"));
        trades.push(ScheduledAction::new(block, b, a_pool, ActionKind::Unstake, "all"));
        trades.push(ScheduledAction::new(block, a, a_pool, ActionKind::Stake, "all"));
        trades.push(ScheduledAction::new(block, b, b_pool, ActionKind::Stake, "all"));
    }
    trades
}

#[derive(Default)]
struct TraderBook {
    free_balance: f64,
    staked: BTreeMap<PoolId, f64>,
}

impl TraderBook {
    fn staked_in(&self, pool_id: PoolId) -> f64 {
        self.staked.get(&pool_id).copied().unwrap_or(0.0)
    }
}

/// Random trade schedule over `blocks`.
///
/// Each account opens one to three positions at block 0, then trades on its own
/// cadence across 80-90% of the interior blocks. The generator keeps a naive
/// book (base asset in equals shares out) to size later trades; the ledger
/// applies the real curve when the schedule runs.
pub fn generate_trades<R: Rng + ?Sized>(
    pools: &[Pool],
    participants: &[Participant],
    blocks: u64,
    rng: &mut R,
) -> Result<Vec<ScheduledAction>> {
    let known = |id: &PoolId| pools.iter().any(|p| p.id == *id);
    let initial_pct = Uniform::new(0.1, 0.5);
    let exit_pct = Uniform::new(0.3, 0.7);
    let buy_bias = Bernoulli::new(0.6)?;

    let mut books: BTreeMap<ParticipantId, TraderBook> = participants
        .iter()
        .map(|p| {
            let book = TraderBook {
                free_balance: p.base_balance,
                ..TraderBook::default()
            };
            (p.id, book)
        })
        .collect();
    let mut trades = Vec::new();

    for participant in participants {
        let Some(book) = books.get_mut(&participant.id) else {
            continue;
        };
        let valid: Vec<PoolId> = participant.eligible_pools.iter().copied().filter(known).collect();
        if book.free_balance <= 0.0 || valid.is_empty() {
            continue;
        }

        let count = rng.gen_range(1..=valid.len().min(3));
        for &pool_id in valid.choose_multiple(rng, count) {
            let amount = book.free_balance * initial_pct.sample(rng);
            if amount > 0.0 {
                trades.push(ScheduledAction::new(0, participant.id, pool_id, ActionKind::Buy, format!("{amount}")));
                book.free_balance -= amount;
                *book.staked.entry(pool_id).or_insert(0.0) += amount;
            }
        }
    }

    let interior = blocks.saturating_sub(2) as usize;
    if interior == 0 {
        return Ok(trades);
    }
    let target = ((blocks as f64 * Uniform::new(0.8, 0.9).sample(rng)) as usize).min(interior);
    let mut trading_blocks: Vec<u64> = index::sample(rng, interior, target)
        .into_iter()
        .map(|i| i as u64 + 1)
        .collect();
    trading_blocks.sort_unstable();

    let max_frequency = (blocks / 20).max(2);
    let frequencies: BTreeMap<ParticipantId, u64> = participants
        .iter()
        .map(|p| (p.id, rng.gen_range(1..=max_frequency)))
        .collect();

    for block in trading_blocks {
        for participant in participants {
            let frequency = frequencies.get(&participant.id).copied().unwrap_or(1);
            if block % frequency != 0 {
                continue;
            }
            let Some(book) = books.get_mut(&participant.id) else {
                continue;
            };

            let staked: Vec<PoolId> = participant
                .eligible_pools
                .iter()
                .copied()
                .filter(|id| book.staked_in(*id) > 0.0 && known(id))
                .collect();

            if book.free_balance < 1.0 && !staked.is_empty() {
                if let Some(&pool_id) = staked.choose(rng) {
                    let pct = exit_pct.sample(rng);
                    push_sell(&mut trades, book, block, participant.id, pool_id, pct);
                }
                continue;
            }

            let buying = buy_bias.sample(rng) && book.free_balance > 0.0;
            if buying {
                let valid: Vec<PoolId> = participant.eligible_pools.iter().copied().filter(known).collect();
                if let Some(&pool_id) = valid.choose(rng) {
                    let amount = book.free_balance * initial_pct.sample(rng);
                    trades.push(ScheduledAction::new(block, participant.id, pool_id, ActionKind::Buy, format!("{amount}")));
                    book.free_balance -= amount;
                    *book.staked.entry(pool_id).or_insert(0.0) += amount;
                }
            } else if let Some(&pool_id) = staked.choose(rng) {
                let pct = initial_pct.sample(rng);
                push_sell(&mut trades, book, block, participant.id, pool_id, pct);
            }
        }
    }

    trades.sort_by_key(|t| (t.block, t.participant_id));
    Ok(trades)
}

fn push_sell(
    trades: &mut Vec<ScheduledAction>,
    book: &mut TraderBook,
    block: u64,
    participant_id: ParticipantId,
    pool_id: PoolId,
    pct: f64,
) {
    let amount = book.staked_in(pool_id) * pct;
    trades.push(ScheduledAction::new(
        block,
        participant_id,
        pool_id,
        ActionKind::Sell,
        format!("{}%", pct * 100.0),
    ));
    *book.staked.entry(pool_id).or_insert(0.0) -= amount;
    book.free_balance += amount;
}
