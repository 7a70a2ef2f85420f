//! State errors.

use miniledger_core::Hash;
use thiserror::Error;

/// State errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    #[error("unknown account: {0}")]
    UnknownAccount(Hash),

    #[error("account already exists: {0}")]
    AccountExists(Hash),

    #[error("insufficient balance: account {account}, required {required}, available {available}")]
    InsufficientFunds {
        account: Hash,
        required: u64,
        available: u64,
    },

    #[error("balance overflow: account {account}, balance {balance}, credit {amount}")]
    BalanceOverflow {
        account: Hash,
        balance: u64,
        amount: u64,
    },

    /// The store contradicts its own invariants. Not recoverable.
    #[error("inconsistent state: {0}")]
    Inconsistent(String),
}

impl StateError {
    /// True for errors that leave the store unusable.
    pub fn is_fatal(&self) -> bool {
        matches!(self, StateError::Inconsistent(_))
    }
}

/// Result type for state operations.
pub type Result<T> = std::result::Result<T, StateError>;
