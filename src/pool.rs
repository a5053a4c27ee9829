//! Bonding-Curve Pools
//!
//! Each subnet pairs a base-asset reserve with a share reserve and prices
//! trades along the constant-product curve `reserve_base * reserve_share_supply = k`.
//! The root pool has no curve: its shares are pegged 1:1 to the base asset.
//!
//! `k` only moves through [`Pool::inject`]; stake and unstake slide along the
//! curve recorded at the last injection.

pub type PoolId = u32;

#[derive(Clone, Debug, PartialEq)]
pub struct Pool {
    pub id: PoolId,
    pub reserve_base: f64,
    pub reserve_share_supply: f64,
    pub shares_outstanding: f64,
    is_root: bool,
    invariant_k: f64,
}

impl Pool {
    pub fn new(
        id: PoolId,
        reserve_base: f64,
        reserve_share_supply: f64,
        shares_outstanding: f64,
        is_root: bool,
    ) -> Self {
        let invariant_k = if is_root {
            0.0
        } else {
            reserve_base * reserve_share_supply
        };

        Self {
            id,
            reserve_base,
            reserve_share_supply,
            shares_outstanding,
            is_root,
            invariant_k,
        }
    }

    pub fn is_root(&self) -> bool {
        self.is_root
    }

    pub fn invariant_k(&self) -> f64 {
        self.invariant_k
    }

    /// Base asset per share. Root pools and drained share reserves quote parity.
    pub fn price(&self) -> f64 {
        if self.is_root || self.reserve_share_supply == 0.0 {
            1.0
        } else {
            self.reserve_base / self.reserve_share_supply
        }
    }

    /// Pro-rata claim on the base reserve for `share_amount` shares.
    pub fn weight(&self, share_amount: f64) -> f64 {
        if self.is_root {
            share_amount
        } else if self.shares_outstanding == 0.0 {
            0.0
        } else {
            (share_amount / self.shares_outstanding) * self.reserve_base
        }
    }

    /// Deposit base asset, returning the shares minted.
    pub fn stake(&mut self, base_amount: f64) -> f64 {
        if self.is_root {
            self.shares_outstanding += base_amount;
            return base_amount;
        }

        let new_reserve_base = self.reserve_base + base_amount;
        let new_share_supply = self.invariant_k / new_reserve_base;
        let minted = self.reserve_share_supply - new_share_supply;

        self.shares_outstanding += minted;
        self.reserve_share_supply = new_share_supply;
        self.reserve_base = new_reserve_base;
        minted
    }

    /// Redeem shares, returning the base asset released.
    ///
    /// Reserves are not bounds-checked; redeeming more than was ever minted
    /// drives `shares_outstanding` negative.
    pub fn unstake(&mut self, share_amount: f64) -> f64 {
        if self.is_root {
            self.shares_outstanding -= share_amount;
            return share_amount;
        }

        let new_share_supply = self.reserve_share_supply + share_amount;
        let new_reserve_base = self.invariant_k / new_share_supply;
        let released = self.reserve_base - new_reserve_base;

        self.shares_outstanding -= share_amount;
        self.reserve_share_supply = new_share_supply;
        self.reserve_base = new_reserve_base;
        released
    }

    /// Base asset that [`Pool::unstake`] would release right now, without
    /// touching the reserves.
    pub fn unstake_quote(&self, share_amount: f64) -> f64 {
        if self.is_root {
            share_amount
        } else {
            self.reserve_base - self.invariant_k / (self.reserve_share_supply + share_amount)
        }
    }

    /// Grow the reserves outside of a trade and re-anchor the curve.
    pub fn inject(&mut self, base_delta: f64, share_reserve_delta: f64, shares_outstanding_delta: f64) {
        self.reserve_base += base_delta;
        self.reserve_share_supply += share_reserve_delta;
        self.shares_outstanding += shares_outstanding_delta;
        self.invariant_k = self.reserve_base * self.reserve_share_supply;
    }
}
