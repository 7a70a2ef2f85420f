//! Ledger errors.

use miniledger_core::{CodecError, Hash};
use miniledger_state::StateError;
use thiserror::Error;

/// Errors that can occur while verifying or applying transactions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("unknown account: {0}")]
    UnknownAccount(Hash),

    #[error("sequence mismatch on {account} (expected {expected}, got {got})")]
    SequenceMismatch {
        account: Hash,
        expected: u32,
        got: u32,
    },

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

    #[error("account already exists: {0}")]
    AccountExists(Hash),

    #[error("invalid signature on {0}")]
    SignatureInvalid(&'static str),

    #[error("{0} is not a root key")]
    UnauthorizedMint(Hash),

    #[error("funds transaction with zero amount")]
    ZeroAmount,

    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("state corrupted: {0}")]
    StateCorrupted(String),
}

impl LedgerError {
    /// True if the store can no longer be trusted.
    pub fn is_fatal(&self) -> bool {
        matches!(self, LedgerError::StateCorrupted(_))
    }
}

impl From<StateError> for LedgerError {
    fn from(err: StateError) -> Self {
        match err {
            StateError::UnknownAccount(hash) => LedgerError::UnknownAccount(hash),
            StateError::AccountExists(hash) => LedgerError::AccountExists(hash),
            StateError::InsufficientFunds {
                account,
                required,
                available,
            } => LedgerError::InsufficientFunds {
                account,
                required,
                available,
            },
            StateError::BalanceOverflow {
                account,
                balance,
                amount,
            } => LedgerError::BalanceOverflow {
                account,
                balance,
                amount,
            },
            StateError::Inconsistent(reason) => LedgerError::StateCorrupted(reason),
        }
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
