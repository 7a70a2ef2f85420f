//! Account state representation.

use crate::crypto::PublicKey;
use crate::hash::{Hash, ShortHash};
use serde::{Deserialize, Serialize};

/// Ceiling for every balance in the ledger.
pub const MAX_MONEY: u64 = 9_223_372_036_854_775_807;

/// An account in the ledger state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Public key of the owner, which doubles as its address.
    pub address: PublicKey,
    /// Hash of `address`; the key the account is stored under.
    pub hash: Hash,
    /// Account balance in the native token.
    pub balance: u64,
    /// Number of funds transactions sent from this account.
    pub tx_count: u32,
}

impl Account {
    /// Create an empty account owned by `address`.
    pub fn new(address: PublicKey) -> Self {
        Self {
            address,
            hash: address.account_hash(),
            balance: 0,
            tx_count: 0,
        }
    }

    /// Create an account with an opening balance.
    pub fn with_balance(address: PublicKey, balance: u64) -> Self {
        Self {
            balance,
            ..Self::new(address)
        }
    }

    /// The wire prefix this account is addressed by.
    pub fn short_hash(&self) -> ShortHash {
        self.hash.short()
    }

    /// Balance after crediting `amount`, or `None` if it would pass `MAX_MONEY`.
    pub fn credited(&self, amount: u64) -> Option<u64> {
        self.balance
            .checked_add(amount)
            .filter(|balance| *balance <= MAX_MONEY)
    }

    /// Add balance to the account.
    /// Returns false and leaves the balance unchanged on overflow.
    pub fn credit(&mut self, amount: u64) -> bool {
        match self.credited(amount) {
            Some(balance) => {
                self.balance = balance;
                true
            }
            None => false,
        }
    }

    /// Subtract balance from the account.
    /// Returns true if successful, false if insufficient balance.
    pub fn debit(&mut self, amount: u64) -> bool {
        if self.balance >= amount {
            self.balance -= amount;
            true
        } else {
            false
        }
    }

    /// Check if the account has sufficient balance.
    pub fn has_balance(&self, amount: u64) -> bool {
        self.balance >= amount
    }
}
