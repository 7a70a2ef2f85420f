//! Ledger configuration.

use miniledger_core::{ParameterId, ParameterPolicy, ParameterSet, MAX_MONEY};
use serde::{Deserialize, Serialize};

/// Which prefix of a funds batch is undone when transaction `k` fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RollbackPolicy {
    /// Undo `[0, k-1)`; the transaction just before the failure stays applied.
    #[default]
    Legacy,
    /// Undo `[0, k)`; the whole applied prefix is reverted.
    Inclusive,
}

impl RollbackPolicy {
    /// Number of leading transactions to undo after a failure at `failed`.
    pub fn undo_count(self, failed: usize) -> usize {
        match self {
            RollbackPolicy::Legacy => failed.saturating_sub(1),
            RollbackPolicy::Inclusive => failed,
        }
    }
}

/// Inclusive range of acceptable values for one parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bound {
    pub min: u64,
    pub max: u64,
}

impl Bound {
    pub const fn new(min: u64, max: u64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: u64) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

/// Default bounds check for config transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParameterBounds {
    pub fee_minimum: Bound,
    pub block_size: Bound,
    pub diff_interval: Bound,
    pub block_interval: Bound,
    pub block_reward: Bound,
}

impl Default for ParameterBounds {
    fn default() -> Self {
        Self {
            fee_minimum: Bound::new(0, MAX_MONEY),
            block_size: Bound::new(1000, 100_000_000),
            diff_interval: Bound::new(3, 9_999_999),
            block_interval: Bound::new(10, 86_400),
            block_reward: Bound::new(0, 1_152_921_504_606_846_976),
        }
    }
}

impl ParameterBounds {
    pub fn bound(&self, id: ParameterId) -> Bound {
        match id {
            ParameterId::FeeMinimum => self.fee_minimum,
            ParameterId::BlockSize => self.block_size,
            ParameterId::DiffInterval => self.diff_interval,
            ParameterId::BlockInterval => self.block_interval,
            ParameterId::BlockReward => self.block_reward,
        }
    }
}

impl ParameterPolicy for ParameterBounds {
    fn accepts(&self, id: ParameterId, value: u64) -> bool {
        self.bound(id).contains(value)
    }
}

/// Ledger configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Rollback boundary for failed funds batches.
    pub rollback_policy: RollbackPolicy,
    /// Parameters active before any config transaction.
    pub genesis_parameters: ParameterSet,
    /// Accepted range per parameter.
    pub bounds: ParameterBounds,
}

impl LedgerConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn with_rollback_policy(mut self, policy: RollbackPolicy) -> Self {
        self.rollback_policy = policy;
        self
    }
}
