//! Governance-controlled protocol parameters.
//!
//! Parameters are never edited in place. Every accepted change produces a new
//! [`ParameterSet`] snapshot appended to a [`ParameterHistory`]; the newest
//! entry is the active one and readers receive it by value.

use crate::hash::Hash;
use serde::{Deserialize, Serialize};

/// The parameters a config transaction can change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ParameterId {
    BlockSize = 1,
    DiffInterval = 2,
    FeeMinimum = 3,
    BlockInterval = 4,
    BlockReward = 5,
}

impl ParameterId {
    pub const ALL: [ParameterId; 5] = [
        ParameterId::BlockSize,
        ParameterId::DiffInterval,
        ParameterId::FeeMinimum,
        ParameterId::BlockInterval,
        ParameterId::BlockReward,
    ];

    /// Map a wire id to a parameter. Unknown ids map to `None`.
    pub fn from_u8(id: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|param| *param as u8 == id)
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Snapshot of all protocol parameters, tagged with the block that set them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterSet {
    /// Hash of the block whose config transactions produced this snapshot.
    pub block_hash: Hash,
    pub fee_minimum: u64,
    pub block_size: u64,
    pub diff_interval: u64,
    pub block_interval: u64,
    pub block_reward: u64,
}

impl Default for ParameterSet {
    fn default() -> Self {
        Self {
            block_hash: Hash::ZERO,
            fee_minimum: 1,
            block_size: 1000,
            diff_interval: 2016,
            block_interval: 60,
            block_reward: 0,
        }
    }
}

impl ParameterSet {
    pub fn get(&self, id: ParameterId) -> u64 {
        match id {
            ParameterId::BlockSize => self.block_size,
            ParameterId::DiffInterval => self.diff_interval,
            ParameterId::FeeMinimum => self.fee_minimum,
            ParameterId::BlockInterval => self.block_interval,
            ParameterId::BlockReward => self.block_reward,
        }
    }

    pub fn set(&mut self, id: ParameterId, value: u64) {
        match id {
            ParameterId::BlockSize => self.block_size = value,
            ParameterId::DiffInterval => self.diff_interval = value,
            ParameterId::FeeMinimum => self.fee_minimum = value,
            ParameterId::BlockInterval => self.block_interval = value,
            ParameterId::BlockReward => self.block_reward = value,
        }
    }
}

/// Decides whether a proposed parameter value is acceptable.
pub trait ParameterPolicy {
    fn accepts(&self, id: ParameterId, value: u64) -> bool;
}

impl<F> ParameterPolicy for F
where
    F: Fn(ParameterId, u64) -> bool,
{
    fn accepts(&self, id: ParameterId, value: u64) -> bool {
        self(id, value)
    }
}

/// Append-only sequence of parameter snapshots. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StoredHistory")]
pub struct ParameterHistory {
    sets: Vec<ParameterSet>,
}

#[derive(Deserialize)]
struct StoredHistory {
    sets: Vec<ParameterSet>,
}

impl TryFrom<StoredHistory> for ParameterHistory {
    type Error = &'static str;

    fn try_from(stored: StoredHistory) -> Result<Self, Self::Error> {
        if stored.sets.is_empty() {
            return Err("parameter history has no genesis snapshot");
        }
        Ok(Self { sets: stored.sets })
    }
}

impl ParameterHistory {
    /// Start a history with the genesis parameters.
    pub fn new(genesis: ParameterSet) -> Self {
        Self {
            sets: vec![genesis],
        }
    }

    /// The active snapshot (the most recently appended).
    pub fn active(&self) -> ParameterSet {
        // `sets` starts with genesis and is never shrunk below it.
        self.sets[self.sets.len() - 1]
    }

    /// Append a snapshot and make it active.
    pub fn append(&mut self, set: ParameterSet) {
        self.sets.push(set);
    }

    /// Drop the active snapshot if it was produced by `block_hash`.
    ///
    /// Used when a block that changed parameters is abandoned. Genesis is
    /// never removed.
    pub fn revert_block(&mut self, block_hash: &Hash) -> bool {
        if self.sets.len() > 1 && self.active().block_hash == *block_hash {
            self.sets.pop();
            return true;
        }
        false
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParameterSet> {
        self.sets.iter()
    }
}

impl Default for ParameterHistory {
    fn default() -> Self {
        Self::new(ParameterSet::default())
    }
}
