//! Block-Stepped Ledger
//!
//! Owns every pool and participant for one run and advances them block by block.
//!
//! ## Per-block procedure
//! 1. Scheduled actions for the block execute in schedule order
//! 2. One emission unit enters every non-root pool, either as base asset or as
//!    share reserve depending on the balancing switch
//! 3. Each pool's emission is paid out as dividends right after its injection,
//!    blending economy-wide (global) and pool-local stake weights
//! 4. On checkpoint blocks every pool, participant and the economy are recorded
//!
//! Pools and participants live in ordered maps, so every sum and payout runs in
//! ascending id order and a run is reproducible bit for bit.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::action::{AmountSpec, Direction, ScheduledAction};
use crate::error::{Result, SimError};
use crate::participant::{Participant, ParticipantId};
use crate::pool::{Pool, PoolId};
use crate::snapshot::{AccountRecord, ActionRecord, EconomyRecord, PoolRecord, SnapshotStream};

/// Value issued into the non-root pools every block.
pub const EMISSION_UNIT: f64 = 1.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RootWeightMode {
    /// Root weight keeps its initial value for the whole run.
    #[default]
    Fixed,
    /// Root weight falls linearly to zero over the run.
    LinearDecay,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EconomyParams {
    pub blocks: u64,
    pub n_steps: u64,
    pub base_supply: f64,
    /// Fraction of each dividend paid by global weight; the rest goes by local weight.
    pub global_split: f64,
    pub balanced: bool,
    pub root_weight: f64,
    pub root_weight_mode: RootWeightMode,
}

impl Default for EconomyParams {
    fn default() -> Self {
        Self {
            blocks: 100,
            n_steps: 10,
            base_supply: 0.0,
            global_split: 0.5,
            balanced: true,
            root_weight: 0.5,
            root_weight_mode: RootWeightMode::Fixed,
        }
    }
}

impl EconomyParams {
    pub fn validate(&self) -> Result<()> {
        if self.n_steps == 0 {
            return Err(SimError::InvalidParameter {
                name: "n_steps",
                value: 0.0,
            });
        }
        if !(0.0..=1.0).contains(&self.global_split) {
            return Err(SimError::InvalidParameter {
                name: "global_split",
                value: self.global_split,
            });
        }
        if !(0.0..=1.0).contains(&self.root_weight) {
            return Err(SimError::InvalidParameter {
                name: "root_weight",
                value: self.root_weight,
            });
        }
        if !(self.base_supply >= 0.0) {
            return Err(SimError::InvalidParameter {
                name: "base_supply",
                value: self.base_supply,
            });
        }
        Ok(())
    }

    /// Blocks between checkpoints, never less than one.
    pub fn log_interval(&self) -> u64 {
        (self.blocks / self.n_steps.max(1)).max(1)
    }

    pub fn is_checkpoint(&self, block: u64) -> bool {
        block % self.log_interval() == 0 || block + 1 == self.blocks
    }
}

/// Which side of the curve receives the block's emission.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EmissionBranch {
    /// New base asset enters the pools and the global supply grows.
    Base,
    /// New shares enter the share reserves; supply is untouched.
    Shares,
}

/// Emission split for one block, computed from pre-injection reserves.
#[derive(Clone, Debug, PartialEq)]
pub struct EmissionPlan {
    pub shares: BTreeMap<PoolId, f64>,
    pub sum_prices: f64,
    pub branch: EmissionBranch,
}

impl EmissionPlan {
    pub fn compute(pools: &BTreeMap<PoolId, Pool>, balanced: bool) -> Self {
        let sum_prices = sum_prices(pools);
        let branch = if sum_prices < 1.0 || !balanced {
            EmissionBranch::Base
        } else {
            EmissionBranch::Shares
        };

        Self {
            shares: emission_shares(pools),
            sum_prices,
            branch,
        }
    }

    /// `(base_delta, share_reserve_delta)` for one pool.
    pub fn injection_for(&self, pool_id: PoolId) -> (f64, f64) {
        match self.branch {
            EmissionBranch::Base => {
                let share = self.shares.get(&pool_id).copied().unwrap_or(0.0);
                (share * EMISSION_UNIT, 0.0)
            }
            EmissionBranch::Shares => (0.0, EMISSION_UNIT),
        }
    }
}

/// Each non-root pool's fraction of the total non-root base reserve.
pub fn emission_shares(pools: &BTreeMap<PoolId, Pool>) -> BTreeMap<PoolId, f64> {
    let total: f64 = pools
        .values()
        .filter(|p| !p.is_root())
        .map(|p| p.reserve_base)
        .sum();

    pools
        .values()
        .filter(|p| !p.is_root())
        .map(|p| {
            let share = if total != 0.0 { p.reserve_base / total } else { 0.0 };
            (p.id, share)
        })
        .collect()
}

pub fn sum_prices(pools: &BTreeMap<PoolId, Pool>) -> f64 {
    pools
        .values()
        .filter(|p| !p.is_root())
        .map(Pool::price)
        .sum()
}

/// Stake weights behind one pool's dividend payout.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DividendWeights {
    /// Economy-wide weight of every participant, root stake scaled by root weight.
    pub global: BTreeMap<ParticipantId, f64>,
    /// Weight inside the paying pool, for participants with a position entry there.
    pub local: BTreeMap<ParticipantId, f64>,
    pub total_global: f64,
    pub total_local: f64,
}

impl DividendWeights {
    pub fn compute(
        pools: &BTreeMap<PoolId, Pool>,
        participants: &BTreeMap<ParticipantId, Participant>,
        pool_id: PoolId,
        root_weight: f64,
    ) -> Self {
        let mut global: BTreeMap<ParticipantId, f64> =
            participants.keys().map(|&id| (id, 0.0)).collect();
        for pool in pools.values() {
            for participant in participants.values() {
                let Some(&shares) = participant.pool_shares.get(&pool.id) else {
                    continue;
                };
                let scaled = if pool.is_root() { shares * root_weight } else { shares };
                *global.entry(participant.id).or_insert(0.0) += pool.weight(scaled);
            }
        }

        let local: BTreeMap<ParticipantId, f64> = match pools.get(&pool_id) {
            Some(pool) => participants
                .values()
                .filter(|p| p.holds(pool_id))
                .map(|p| (p.id, pool.weight(p.shares_in(pool_id))))
                .collect(),
            None => BTreeMap::new(),
        };

        let total_global = global.values().sum();
        let total_local = local.values().sum();

        Self {
            global,
            local,
            total_global,
            total_local,
        }
    }

    /// Blended fraction of one emission unit owed to `id`.
    pub fn dividend_share(&self, id: ParticipantId, global_split: f64) -> f64 {
        let global = ratio(self.global.get(&id).copied().unwrap_or(0.0), self.total_global);
        let local = ratio(self.local.get(&id).copied().unwrap_or(0.0), self.total_local);
        global_split * global + (1.0 - global_split) * local
    }

    /// Dividend share for every participant, zeros included.
    pub fn shares(&self, global_split: f64) -> BTreeMap<ParticipantId, f64> {
        self.global
            .keys()
            .map(|&id| (id, self.dividend_share(id, global_split)))
            .collect()
    }
}

fn ratio(part: f64, total: f64) -> f64 {
    if total != 0.0 {
        part / total
    } else {
        0.0
    }
}

#[derive(Clone, Debug)]
struct Scheduled {
    action: ScheduledAction,
    /// `None` for actions that can never execute; their amount is not parsed.
    amount: Option<AmountSpec>,
}

/// The simulation engine. One instance per run.
#[derive(Clone, Debug)]
pub struct Ledger {
    pools: BTreeMap<PoolId, Pool>,
    participants: BTreeMap<ParticipantId, Participant>,
    schedule: BTreeMap<u64, Vec<Scheduled>>,
    params: EconomyParams,
    base_supply: f64,
    root_weight: f64,
    last_branch: Option<EmissionBranch>,
}

impl Ledger {
    /// Ingest the run's inputs. Fails on invalid parameters or on a malformed
    /// amount specifier in any action that will execute. Actions naming an
    /// unknown account or subnet, or scheduled past the last block, are kept
    /// as no-ops without parsing their amount.
    pub fn new(
        pools: Vec<Pool>,
        participants: Vec<Participant>,
        actions: Vec<ScheduledAction>,
        params: EconomyParams,
    ) -> Result<Self> {
        params.validate()?;

        let pools: BTreeMap<PoolId, Pool> = pools.into_iter().map(|p| (p.id, p)).collect();
        let participants: BTreeMap<ParticipantId, Participant> =
            participants.into_iter().map(|p| (p.id, p)).collect();

        let mut schedule: BTreeMap<u64, Vec<Scheduled>> = BTreeMap::new();
        for action in actions {
            let reachable = action.block < params.blocks
                && participants.contains_key(&action.participant_id)
                && pools.contains_key(&action.pool_id);
            let amount = if reachable {
                Some(action.amount_spec()?)
            } else {
                None
            };
            schedule
                .entry(action.block)
                .or_default()
                .push(Scheduled { action, amount });
        }

        Ok(Self {
            pools,
            participants,
            schedule,
            base_supply: params.base_supply,
            root_weight: params.root_weight,
            params,
            last_branch: None,
        })
    }

    pub fn params(&self) -> &EconomyParams {
        &self.params
    }

    pub fn pool(&self, id: PoolId) -> Option<&Pool> {
        self.pools.get(&id)
    }

    pub fn pools(&self) -> impl Iterator<Item = &Pool> {
        self.pools.values()
    }

    pub fn participant(&self, id: ParticipantId) -> Option<&Participant> {
        self.participants.get(&id)
    }

    pub fn participants(&self) -> impl Iterator<Item = &Participant> {
        self.participants.values()
    }

    pub fn base_supply(&self) -> f64 {
        self.base_supply
    }

    pub fn root_weight(&self) -> f64 {
        self.root_weight
    }

    pub fn sum_prices(&self) -> f64 {
        sum_prices(&self.pools)
    }

    /// Linearly decayed root weight for `block`.
    pub fn root_weight_at(&self, block: u64) -> f64 {
        let initial = self.params.root_weight;
        if self.params.blocks == 0 {
            return initial;
        }
        let per_block = initial / self.params.blocks as f64;
        (initial - block as f64 * per_block).max(0.0)
    }

    pub fn dividend_weights(&self, pool_id: PoolId) -> DividendWeights {
        DividendWeights::compute(&self.pools, &self.participants, pool_id, self.root_weight)
    }

    /// Base balance plus what unstaking every positive position would release now.
    pub fn market_value(&self, participant: &Participant) -> f64 {
        let staked: f64 = participant
            .pool_shares
            .iter()
            .filter(|(_, shares)| **shares > 0.0)
            .filter_map(|(id, shares)| self.pools.get(id).map(|pool| pool.unstake_quote(*shares)))
            .sum();
        participant.base_balance + staked
    }

    /// Run every block and return the recorded stream.
    pub fn run(&mut self) -> SnapshotStream {
        info!(
            blocks = self.params.blocks,
            pools = self.pools.len(),
            participants = self.participants.len(),
            scheduled_blocks = self.schedule.len(),
            balanced = self.params.balanced,
            global_split = self.params.global_split,
            "starting simulation"
        );

        let mut stream = SnapshotStream::default();
        for block in 0..self.params.blocks {
            self.step(block, &mut stream);
        }

        info!(
            base_supply = self.base_supply,
            sum_prices = self.sum_prices(),
            executed_actions = stream.actions.len(),
            "simulation complete"
        );
        stream
    }

    /// Advance a single block, appending to `stream`.
    pub fn step(&mut self, block: u64, stream: &mut SnapshotStream) {
        if self.params.root_weight_mode == RootWeightMode::LinearDecay {
            self.root_weight = self.root_weight_at(block);
        }

        if let Some(actions) = self.schedule.remove(&block) {
            for scheduled in &actions {
                self.execute(scheduled);
                let action = &scheduled.action;
                stream.actions.push(ActionRecord {
                    block,
                    account_id: action.participant_id,
                    subnet_id: action.pool_id,
                    action: action.kind,
                    amount: action.amount.clone(),
                });
            }
        }

        self.emission_step(block);

        if self.params.is_checkpoint(block) {
            self.log_state(block, stream);
        }
    }

    fn execute(&mut self, scheduled: &Scheduled) {
        let action = &scheduled.action;
        let (Some(amount), Some(participant), Some(pool)) = (
            scheduled.amount,
            self.participants.get_mut(&action.participant_id),
            self.pools.get_mut(&action.pool_id),
        ) else {
            trace!(
                block = action.block,
                account = action.participant_id,
                subnet = action.pool_id,
                "skipping action with unknown account or subnet"
            );
            return;
        };

        match action.kind.direction() {
            Direction::Deposit => {
                let amount = amount.resolve(participant.base_balance);
                let minted = pool.stake(amount);
                participant.credit_shares(pool.id, minted);
                participant.base_balance -= amount;
                trace!(account = participant.id, subnet = pool.id, amount, minted, "deposit");
            }
            Direction::Withdraw => {
                let amount = amount.resolve(participant.shares_in(pool.id));
                let released = pool.unstake(amount);
                participant.credit_shares(pool.id, -amount);
                participant.base_balance += released;
                trace!(account = participant.id, subnet = pool.id, amount, released, "withdraw");
            }
        }
    }

    fn emission_step(&mut self, block: u64) {
        let plan = EmissionPlan::compute(&self.pools, self.params.balanced);
        if self.last_branch != Some(plan.branch) {
            debug!(block, sum_prices = plan.sum_prices, branch = ?plan.branch, "emission branch");
            self.last_branch = Some(plan.branch);
        }
        if plan.branch == EmissionBranch::Base {
            self.base_supply += EMISSION_UNIT;
        }

        let subnet_ids: Vec<PoolId> = self
            .pools
            .values()
            .filter(|p| !p.is_root())
            .map(|p| p.id)
            .collect();

        for pool_id in subnet_ids {
            let (base_delta, share_delta) = plan.injection_for(pool_id);
            if let Some(pool) = self.pools.get_mut(&pool_id) {
                pool.inject(base_delta, share_delta, EMISSION_UNIT);
            }

            // Zero payouts still open a position entry for the pool.
            let dividends = self.dividend_weights(pool_id).shares(self.params.global_split);
            for (participant_id, share) in dividends {
                if let Some(participant) = self.participants.get_mut(&participant_id) {
                    participant.credit_shares(pool_id, share * EMISSION_UNIT);
                }
            }
        }
    }

    fn log_state(&self, block: u64, stream: &mut SnapshotStream) {
        for participant in self.participants.values() {
            stream.accounts.push(AccountRecord {
                block,
                account_id: participant.id,
                free_balance: participant.base_balance,
                market_value: self.market_value(participant),
                alpha_stakes: participant.pool_shares.clone(),
            });
        }

        let emissions = emission_shares(&self.pools);
        for pool in self.pools.values() {
            let dividends = if pool.is_root() {
                BTreeMap::new()
            } else {
                self.dividend_weights(pool.id).shares(self.params.global_split)
            };

            stream.pools.push(PoolRecord {
                block,
                subnet_id: pool.id,
                tao_in: pool.reserve_base,
                alpha_in: pool.reserve_share_supply,
                alpha_out: pool.shares_outstanding,
                exchange_rate: pool.price(),
                emission_rate: emissions.get(&pool.id).copied().unwrap_or(0.0),
                dividends,
            });
        }

        let sum_prices = self.sum_prices();
        stream.economy.push(EconomyRecord {
            block,
            tao_supply: self.base_supply,
            sum_prices,
        });

        debug!(block, base_supply = self.base_supply, sum_prices, "checkpoint");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::ActionKind;
    use proptest::prelude::*;

    const EPS: f64 = 1e-9;

    fn holdings(entries: &[(PoolId, f64)]) -> BTreeMap<PoolId, f64> {
        entries.iter().copied().collect()
    }

    fn root_versus_alpha() -> Ledger {
        let pools = vec![
            Pool::new(0, 100.0, 100.0, 100.0, true),
            Pool::new(1, 100.0, 100.0, 100.0, false),
        ];
        let participants = vec![
            Participant::new(1, 0.0, holdings(&[(0, 100.0)]), [0, 1]),
            Participant::new(2, 0.0, holdings(&[(1, 100.0)]), [1]),
        ];
        let params = EconomyParams {
            blocks: 10,
            n_steps: 1,
            base_supply: 200.0,
            global_split: 0.5,
            balanced: true,
            root_weight: 0.5,
            root_weight_mode: RootWeightMode::Fixed,
        };
        Ledger::new(pools, participants, Vec::new(), params).unwrap()
    }

    #[test]
    fn test_root_versus_alpha_scenario() {
        let mut ledger = root_versus_alpha();
        let stream = ledger.run();

        assert_eq!(stream.economy.len(), 2);
        assert_eq!(stream.economy[0].block, 0);
        assert_eq!(stream.economy[1].block, 9);
        assert_eq!(stream.accounts.len(), 4);
        assert_eq!(stream.pools.len(), 4);
        assert!(stream.actions.is_empty());

        // Parity at block 0 sends shares; the price then alternates back to parity.
        assert_eq!(stream.economy[1].tao_supply, 205.0);
        let subnet = ledger.pool(1).unwrap();
        assert!(subnet.price() <= 1.0 + EPS);
        assert!((subnet.shares_outstanding - 110.0).abs() < EPS);
        for record in stream.pools.iter().filter(|r| r.subnet_id == 1) {
            assert!(record.exchange_rate <= 1.0 + EPS);
        }

        let root_holder = ledger.participant(1).unwrap();
        let alpha_holder = ledger.participant(2).unwrap();
        assert_eq!(root_holder.shares_in(0), 100.0);

        let root_holder_alpha = subnet.unstake_quote(root_holder.shares_in(1));
        let expected_root_value = 100.0 + root_holder_alpha;
        let expected_alpha_value = subnet.unstake_quote(alpha_holder.shares_in(1));

        let last: Vec<_> = stream.accounts_at(9).collect();
        assert!((last[0].market_value - expected_root_value).abs() < EPS);
        assert!((last[1].market_value - expected_alpha_value).abs() < EPS);
        assert!(last[1].market_value < alpha_holder.shares_in(1) * subnet.price());

        // Every emission unit lands with one of the two holders.
        let total_shares = root_holder.shares_in(1) + alpha_holder.shares_in(1);
        assert!((total_shares - 110.0).abs() < 1e-6);
    }

    #[test]
    fn test_first_block_dividends() {
        let mut ledger = root_versus_alpha();
        let mut stream = SnapshotStream::default();
        ledger.step(0, &mut stream);

        let subnet_weight = 100.0 / 101.0 * 100.0;
        let total = 50.0 + subnet_weight;
        let root_share = 0.5 * 50.0 / total;
        let alpha_share = 0.5 * subnet_weight / total + 0.5;

        assert!((ledger.participant(1).unwrap().shares_in(1) - root_share).abs() < EPS);
        assert!((ledger.participant(2).unwrap().shares_in(1) - (100.0 + alpha_share)).abs() < EPS);
        assert_eq!(ledger.base_supply(), 200.0);
    }

    #[test]
    fn test_buy_then_partial_sell() {
        let pools = vec![Pool::new(1, 100.0, 100.0, 100.0, false)];
        let participants = vec![Participant::new(1, 100.0, BTreeMap::new(), [1])];
        let actions = vec![
            ScheduledAction::new(0, 1, 1, ActionKind::Buy, "50"),
            ScheduledAction::new(5, 1, 1, ActionKind::Sell, "50%"),
        ];
        let params = EconomyParams {
            blocks: 10,
            n_steps: 10,
            ..EconomyParams::default()
        };
        let mut ledger = Ledger::new(pools, participants, actions, params).unwrap();
        let mut stream = SnapshotStream::default();

        ledger.step(0, &mut stream);
        let minted = 100.0 - 10_000.0 / 150.0;
        let after_buy = ledger.participant(1).unwrap();
        assert!((after_buy.base_balance - 50.0).abs() < EPS);
        // Sole holder collects the full block-0 dividend.
        assert!((after_buy.shares_in(1) - (minted + EMISSION_UNIT)).abs() < EPS);

        for block in 1..5 {
            ledger.step(block, &mut stream);
        }

        let shares_before = ledger.participant(1).unwrap().shares_in(1);
        let base_before = ledger.participant(1).unwrap().base_balance;
        let mut expected_pool = ledger.pool(1).unwrap().clone();
        let sold = shares_before * 0.5;
        let released = expected_pool.unstake(sold);

        ledger.step(5, &mut stream);
        let after_sell = ledger.participant(1).unwrap();
        assert!((after_sell.base_balance - (base_before + released)).abs() < EPS);
        assert!((after_sell.shares_in(1) - (shares_before - sold + EMISSION_UNIT)).abs() < EPS);

        assert_eq!(stream.actions.len(), 2);
        assert_eq!(stream.actions[1].block, 5);
        assert_eq!(stream.actions[1].action, ActionKind::Sell);
        assert_eq!(stream.actions[1].amount, "50%");
    }

    #[test]
    fn test_unknown_ids_are_skipped() {
        let pools = vec![Pool::new(1, 100.0, 100.0, 100.0, false)];
        let participants = vec![Participant::new(1, 10.0, BTreeMap::new(), [1])];
        let actions = vec![
            ScheduledAction::new(0, 99, 1, ActionKind::Stake, "all"),
            ScheduledAction::new(0, 1, 42, ActionKind::Stake, "all"),
        ];
        let params = EconomyParams {
            blocks: 2,
            n_steps: 1,
            ..EconomyParams::default()
        };
        let mut ledger = Ledger::new(pools, participants, actions, params).unwrap();
        let stream = ledger.run();

        assert_eq!(stream.actions.len(), 2);
        assert_eq!(stream.actions[0].account_id, 99);
        assert_eq!(stream.actions[1].subnet_id, 42);
        assert!(stream.actions.iter().all(|r| r.block == 0 && r.amount == "all"));

        let participant = ledger.participant(1).unwrap();
        assert_eq!(participant.base_balance, 10.0);
        assert_eq!(participant.shares_in(1), 0.0);
        assert_eq!(ledger.pool(1).unwrap().reserve_base, 100.0);
    }

    #[test]
    fn test_unreachable_actions_skip_amount_parsing() {
        let pools = vec![Pool::new(1, 100.0, 100.0, 100.0, false)];
        let participants = vec![Participant::new(1, 10.0, BTreeMap::new(), [1])];
        let actions = vec![
            ScheduledAction::new(0, 99, 1, ActionKind::Stake, "junk"),
            ScheduledAction::new(0, 1, 42, ActionKind::Unstake, "junk"),
            ScheduledAction::new(5, 1, 1, ActionKind::Buy, "junk"),
        ];
        let params = EconomyParams {
            blocks: 2,
            n_steps: 1,
            ..EconomyParams::default()
        };
        let mut ledger = Ledger::new(pools, participants, actions, params).unwrap();
        let stream = ledger.run();

        assert_eq!(stream.actions.len(), 2);
        assert_eq!(ledger.participant(1).unwrap().base_balance, 10.0);
    }

    #[test]
    fn test_zero_dividends_open_position_entry() {
        let pools = vec![Pool::new(1, 100.0, 100.0, 100.0, false)];
        let participants = vec![
            Participant::new(1, 0.0, holdings(&[(1, 100.0)]), [1]),
            Participant::new(2, 25.0, BTreeMap::new(), [1]),
        ];
        let params = EconomyParams {
            blocks: 1,
            n_steps: 1,
            ..EconomyParams::default()
        };
        let mut ledger = Ledger::new(pools, participants, Vec::new(), params).unwrap();
        let stream = ledger.run();

        let idle = &stream.accounts[1];
        assert_eq!(idle.account_id, 2);
        assert_eq!(idle.alpha_stakes, holdings(&[(1, 0.0)]));
        assert_eq!(idle.market_value, 25.0);
    }

    #[test]
    fn test_malformed_amount_fails_run() {
        let pools = vec![Pool::new(1, 100.0, 100.0, 100.0, false)];
        let participants = vec![Participant::new(1, 10.0, BTreeMap::new(), [1])];
        let actions = vec![ScheduledAction::new(3, 1, 1, ActionKind::Buy, "lots")];
        let result = Ledger::new(pools, participants, actions, EconomyParams::default());
        assert!(matches!(result, Err(SimError::MalformedAmount { raw }) if raw == "lots"));
    }

    #[test]
    fn test_invalid_parameters() {
        let bad = [
            EconomyParams { n_steps: 0, ..EconomyParams::default() },
            EconomyParams { global_split: 1.5, ..EconomyParams::default() },
            EconomyParams { root_weight: -0.1, ..EconomyParams::default() },
            EconomyParams { base_supply: f64::NAN, ..EconomyParams::default() },
        ];
        for params in bad {
            let result = Ledger::new(Vec::new(), Vec::new(), Vec::new(), params);
            assert!(matches!(result, Err(SimError::InvalidParameter { .. })));
        }
    }

    #[test]
    fn test_overdraw_is_not_guarded() {
        let pools = vec![Pool::new(0, 0.0, 0.0, 0.0, true)];
        let participants = vec![Participant::new(1, 5.0, BTreeMap::new(), [0])];
        let actions = vec![ScheduledAction::new(0, 1, 0, ActionKind::Buy, "8")];
        let params = EconomyParams {
            blocks: 1,
            n_steps: 1,
            ..EconomyParams::default()
        };
        let mut ledger = Ledger::new(pools, participants, actions, params).unwrap();
        ledger.run();

        let participant = ledger.participant(1).unwrap();
        assert_eq!(participant.base_balance, -3.0);
        assert_eq!(participant.shares_in(0), 8.0);
    }

    #[test]
    fn test_balancing_ceiling_holds_supply() {
        let pools = vec![Pool::new(1, 1000.0, 100.0, 100.0, false)];
        let participants = vec![Participant::new(1, 0.0, holdings(&[(1, 100.0)]), [1])];
        let params = EconomyParams {
            blocks: 8,
            n_steps: 8,
            base_supply: 50.0,
            ..EconomyParams::default()
        };
        let mut ledger = Ledger::new(pools.clone(), participants.clone(), Vec::new(), params.clone()).unwrap();
        let stream = ledger.run();
        assert_eq!(stream.economy.len(), 8);
        for record in &stream.economy {
            assert!(record.sum_prices >= 1.0);
            assert_eq!(record.tao_supply, 50.0);
        }

        let unbalanced = EconomyParams {
            balanced: false,
            ..params
        };
        let mut ledger = Ledger::new(pools, participants, Vec::new(), unbalanced).unwrap();
        let stream = ledger.run();
        assert_eq!(stream.economy.last().unwrap().tao_supply, 58.0);
    }

    #[test]
    fn test_emission_split_by_reserve() {
        let pools: BTreeMap<PoolId, Pool> = [
            Pool::new(0, 999.0, 999.0, 999.0, true),
            Pool::new(1, 300.0, 300.0, 300.0, false),
            Pool::new(2, 100.0, 100.0, 100.0, false),
        ]
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

        let shares = emission_shares(&pools);
        assert_eq!(shares.len(), 2);
        assert!((shares[&1] - 0.75).abs() < EPS);
        assert!((shares[&2] - 0.25).abs() < EPS);

        let plan = EmissionPlan::compute(&pools, true);
        assert_eq!(plan.branch, EmissionBranch::Shares);
        assert_eq!(plan.injection_for(1), (0.0, EMISSION_UNIT));

        let empty: BTreeMap<PoolId, Pool> =
            [(3, Pool::new(3, 0.0, 0.0, 0.0, false))].into_iter().collect();
        assert_eq!(emission_shares(&empty)[&3], 0.0);
    }

    #[test]
    fn test_checkpoint_schedule() {
        let params = EconomyParams {
            blocks: 10,
            n_steps: 3,
            ..EconomyParams::default()
        };
        let checkpoints: Vec<u64> = (0..10).filter(|&b| params.is_checkpoint(b)).collect();
        assert_eq!(checkpoints, vec![0, 3, 6, 9]);

        let dense = EconomyParams {
            blocks: 4,
            n_steps: 12,
            ..EconomyParams::default()
        };
        assert_eq!(dense.log_interval(), 1);
    }

    #[test]
    fn test_root_weight_fixed_by_default() {
        let mut ledger = root_versus_alpha();
        ledger.run();
        assert_eq!(ledger.root_weight(), 0.5);
        assert!((ledger.root_weight_at(5) - 0.25).abs() < EPS);
        assert_eq!(ledger.root_weight_at(20), 0.0);
    }

    #[test]
    fn test_root_weight_decay_mode() {
        let mut ledger = root_versus_alpha();
        ledger.params.root_weight_mode = RootWeightMode::LinearDecay;
        ledger.run();
        assert!((ledger.root_weight() - 0.05).abs() < EPS);
    }

    #[test]
    fn test_zero_weights_pay_nothing() {
        let pools: BTreeMap<PoolId, Pool> =
            [(1, Pool::new(1, 100.0, 100.0, 0.0, false))].into_iter().collect();
        let participants: BTreeMap<ParticipantId, Participant> =
            [(1, Participant::new(1, 10.0, BTreeMap::new(), [1]))].into_iter().collect();

        let weights = DividendWeights::compute(&pools, &participants, 1, 0.5);
        assert_eq!(weights.total_global, 0.0);
        assert_eq!(weights.dividend_share(1, 0.5), 0.0);
    }

    proptest! {
        #[test]
        fn prop_dividends_sum_to_one(
            split in 0.0f64..=1.0,
            root_weight in 0.0f64..=1.0,
            stakes in prop::collection::vec(
                (1.0f64..1e4, 1.0f64..1e4, 1.0f64..1e4),
                1..6,
            ),
        ) {
            let pools: BTreeMap<PoolId, Pool> = [
                Pool::new(0, 500.0, 500.0, 500.0, true),
                Pool::new(1, 800.0, 400.0, 2e4, false),
                Pool::new(2, 300.0, 900.0, 3e4, false),
            ]
            .into_iter()
            .map(|p| (p.id, p))
            .collect();
            let participants: BTreeMap<ParticipantId, Participant> = stakes
                .iter()
                .enumerate()
                .map(|(i, &(r, a, b))| {
                    let id = i as ParticipantId;
                    (id, Participant::new(id, 0.0, holdings(&[(0, r), (1, a), (2, b)]), [0, 1, 2]))
                })
                .collect();

            for pool_id in [1, 2] {
                let weights = DividendWeights::compute(&pools, &participants, pool_id, root_weight);
                let total: f64 = weights.shares(split).values().sum();
                prop_assert!((total - 1.0).abs() < 1e-9);
            }
        }
    }
}
