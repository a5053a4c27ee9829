//! Scheduled trades.
//!
//! Four textual kinds exist at the input/output boundary but they collapse to
//! two operations on a pool: deposit base asset for shares, or redeem shares
//! for base asset.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::participant::ParticipantId;
use crate::pool::PoolId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Buy,
    Sell,
    Stake,
    Unstake,
}

impl ActionKind {
    pub fn direction(&self) -> Direction {
        match self {
            Self::Buy | Self::Stake => Direction::Deposit,
            Self::Sell | Self::Unstake => Direction::Withdraw,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
            Self::Stake => "stake",
            Self::Unstake => "unstake",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Base asset in, shares out.
    Deposit,
    /// Shares in, base asset out.
    Withdraw,
}

/// How much of the relevant balance an action moves.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AmountSpec {
    All,
    /// Percentage of the available balance, e.g. `50.0` for `"50%"`.
    Percent(f64),
    Absolute(f64),
}

impl AmountSpec {
    /// Resolve against the balance the action draws from: free base asset for
    /// deposits, shares held in the target pool for withdrawals.
    pub fn resolve(&self, available: f64) -> f64 {
        match *self {
            Self::All => available,
            Self::Percent(pct) => available * pct / 100.0,
            Self::Absolute(amount) => amount,
        }
    }
}

impl FromStr for AmountSpec {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || SimError::MalformedAmount { raw: s.to_string() };
        let trimmed = s.trim();

        if trimmed == "all" {
            return Ok(Self::All);
        }
        // Any `%` marks a percentage; `%` at either end is stripped.
        if trimmed.contains('%') {
            return trimmed
                .trim_matches('%')
                .trim()
                .parse::<f64>()
                .map(Self::Percent)
                .map_err(|_| malformed());
        }
        trimmed
            .parse::<f64>()
            .map(Self::Absolute)
            .map_err(|_| malformed())
    }
}

/// A trade to execute at `block`. The raw amount text is kept so consumed
/// actions can be reported exactly as they were scheduled.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScheduledAction {
    pub block: u64,
    #[serde(rename = "account_id")]
    pub participant_id: ParticipantId,
    #[serde(rename = "subnet_id")]
    pub pool_id: PoolId,
    #[serde(rename = "action")]
    pub kind: ActionKind,
    pub amount: String,
}

impl ScheduledAction {
    pub fn new(
        block: u64,
        participant_id: ParticipantId,
        pool_id: PoolId,
        kind: ActionKind,
        amount: impl Into<String>,
    ) -> Self {
        Self {
            block,
            participant_id,
            pool_id,
            kind,
            amount: amount.into(),
        }
    }

    pub fn amount_spec(&self) -> Result<AmountSpec, SimError> {
        self.amount.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount_specs() {
        assert_eq!("all".parse::<AmountSpec>().unwrap(), AmountSpec::All);
        assert_eq!("50%".parse::<AmountSpec>().unwrap(), AmountSpec::Percent(50.0));
        assert_eq!("12.5".parse::<AmountSpec>().unwrap(), AmountSpec::Absolute(12.5));
        assert_eq!(" 7 ".parse::<AmountSpec>().unwrap(), AmountSpec::Absolute(7.0));
        assert_eq!("10%%".parse::<AmountSpec>().unwrap(), AmountSpec::Percent(10.0));
        assert_eq!("%50".parse::<AmountSpec>().unwrap(), AmountSpec::Percent(50.0));
    }

    #[test]
    fn test_malformed_amounts_are_rejected() {
        for raw in ["", "half", "%", "5%0", "%x%", "ALL", "1e"] {
            match raw.parse::<AmountSpec>() {
                Err(SimError::MalformedAmount { raw: r }) => assert_eq!(r, raw),
                other => panic!("expected malformed amount for {raw:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_resolve() {
        assert_eq!(AmountSpec::All.resolve(80.0), 80.0);
        assert!((AmountSpec::Percent(25.0).resolve(80.0) - 20.0).abs() < 1e-12);
        assert_eq!(AmountSpec::Absolute(3.0).resolve(80.0), 3.0);
    }

    #[test]
    fn test_kinds_collapse_to_two_directions() {
        assert_eq!(ActionKind::Buy.direction(), Direction::Deposit);
        assert_eq!(ActionKind::Stake.direction(), Direction::Deposit);
        assert_eq!(ActionKind::Sell.direction(), Direction::Withdraw);
        assert_eq!(ActionKind::Unstake.direction(), Direction::Withdraw);
    }

    #[test]
    fn test_action_wire_format() {
        let action = ScheduledAction::new(5, 1, 2, ActionKind::Unstake, "50%");
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["account_id"], 1);
        assert_eq!(json["subnet_id"], 2);
        assert_eq!(json["action"], "unstake");
        assert_eq!(json["amount"], "50%");
    }
}
