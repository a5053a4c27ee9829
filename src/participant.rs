use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::pool::PoolId;

pub type ParticipantId = u32;

/// An account: free base asset plus share positions keyed by pool.
///
/// `pool_shares` only carries entries for pools the participant has touched,
/// either through configuration, a trade, or a dividend credit.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub base_balance: f64,
    pub pool_shares: BTreeMap<PoolId, f64>,
    pub eligible_pools: BTreeSet<PoolId>,
}

impl Participant {
    pub fn new(
        id: ParticipantId,
        base_balance: f64,
        pool_shares: BTreeMap<PoolId, f64>,
        eligible_pools: impl IntoIterator<Item = PoolId>,
    ) -> Self {
        Self {
            id,
            base_balance,
            pool_shares,
            eligible_pools: eligible_pools.into_iter().collect(),
        }
    }

    pub fn shares_in(&self, pool_id: PoolId) -> f64 {
        self.pool_shares.get(&pool_id).copied().unwrap_or(0.0)
    }

    pub fn holds(&self, pool_id: PoolId) -> bool {
        self.pool_shares.contains_key(&pool_id)
    }

    pub fn credit_shares(&mut self, pool_id: PoolId, amount: f64) {
        *self.pool_shares.entry(pool_id).or_insert(0.0) += amount;
    }
}
