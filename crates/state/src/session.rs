//! Journaled mutation of an [`AccountStore`].
//!
//! Every change made through a [`StateSession`] is recorded as a [`Change`]
//! delta. Callers mark positions with [`StateSession::checkpoint`] and can
//! later undo everything after a mark, or a range between two marks. Reverting
//! a range unwinds the journal back to the range start and replays the later
//! entries; if a replayed entry no longer applies, everything from the range
//! start stays undone.
//!
//! A session dropped without [`StateSession::commit`] undoes its journal.

use crate::error::{Result, StateError};
use crate::store::AccountStore;
use miniledger_core::{Account, Hash, PublicKey};
use std::ops::Range;
use tracing::{debug, error};

/// One recorded mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    Credit { account: Hash, amount: u64 },
    Debit { account: Hash, amount: u64 },
    TxCount { account: Hash },
    Created { account: Hash, address: PublicKey },
    RootAdded { account: Hash },
    RootRemoved { account: Hash },
}

/// Position in a session's journal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Checkpoint(usize);

impl Checkpoint {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Exclusive, journaled access to an [`AccountStore`].
pub struct StateSession<'a> {
    store: &'a mut AccountStore,
    journal: Vec<Change>,
}

impl<'a> StateSession<'a> {
    pub(crate) fn new(store: &'a mut AccountStore) -> Self {
        Self {
            store,
            journal: Vec::new(),
        }
    }

    /// Read access to the store as currently modified.
    pub fn store(&self) -> &AccountStore {
        &*self.store
    }

    /// Mark the current end of the journal.
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint(self.journal.len())
    }

    /// Changes recorded so far, oldest first.
    pub fn changes(&self) -> &[Change] {
        &self.journal
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add `amount` to an account's balance, bounded by `MAX_MONEY`.
    pub fn credit(&mut self, account: &Hash, amount: u64) -> Result<()> {
        let acc = self.store.account_mut(account)?;
        if !acc.credit(amount) {
            return Err(StateError::BalanceOverflow {
                account: *account,
                balance: acc.balance,
                amount,
            });
        }
        self.journal.push(Change::Credit {
            account: *account,
            amount,
        });
        Ok(())
    }

    /// Subtract `amount` from an account's balance.
    pub fn debit(&mut self, account: &Hash, amount: u64) -> Result<()> {
        let acc = self.store.account_mut(account)?;
        if !acc.debit(amount) {
            return Err(StateError::InsufficientFunds {
                account: *account,
                required: amount,
                available: acc.balance,
            });
        }
        self.journal.push(Change::Debit {
            account: *account,
            amount,
        });
        Ok(())
    }

    pub fn increment_tx_count(&mut self, account: &Hash) -> Result<()> {
        let acc = self.store.account_mut(account)?;
        acc.tx_count = acc.tx_count.checked_add(1).ok_or_else(|| {
            StateError::Inconsistent(format!("tx count overflow on {}", account))
        })?;
        self.journal.push(Change::TxCount { account: *account });
        Ok(())
    }

    /// Store a fresh, empty account owned by `address`.
    pub fn create_account(&mut self, address: PublicKey) -> Result<Hash> {
        let account = Account::new(address);
        let hash = account.hash;
        self.store.put_account(account)?;
        self.journal.push(Change::Created {
            account: hash,
            address,
        });
        Ok(hash)
    }

    /// Make `address` a root key, creating its account if needed.
    ///
    /// Returns true if the registry changed.
    pub fn register_root(&mut self, address: PublicKey) -> Result<bool> {
        let hash = address.account_hash();
        if !self.store.contains(&hash) {
            self.create_account(address)?;
        }
        if !self.store.insert_root_key(hash) {
            return Ok(false);
        }
        self.journal.push(Change::RootAdded { account: hash });
        Ok(true)
    }

    /// Remove `account` from the root registry, keeping the account.
    ///
    /// Returns true if the registry changed.
    pub fn deregister_root(&mut self, account: &Hash) -> bool {
        if !self.store.remove_root_key(account) {
            return false;
        }
        self.journal.push(Change::RootRemoved { account: *account });
        true
    }

    // =========================================================================
    // Undo
    // =========================================================================

    /// Undo every change recorded after `checkpoint`.
    pub fn revert_to(&mut self, checkpoint: Checkpoint) -> Result<()> {
        let end = self.journal.len();
        if checkpoint.0 >= end {
            return Ok(());
        }
        debug!(from = checkpoint.0, to = end, "reverting state changes");
        for change in self.journal.drain(checkpoint.0..).rev() {
            undo(self.store, &change)?;
        }
        Ok(())
    }

    /// Undo the changes recorded between two checkpoints.
    ///
    /// Changes after `range.end` are replayed on top of the reverted state.
    /// Returns false if one of them depended on the reverted range; the
    /// session is then left at `range.start` with the later changes undone
    /// as well. Checkpoints taken after `range.start` no longer point at the
    /// same entries afterwards.
    pub fn revert_range(&mut self, range: Range<Checkpoint>) -> Result<bool> {
        let (start, end) = (range.start.0, range.end.0);
        if start >= end {
            return Ok(true);
        }
        if end > self.journal.len() {
            return Err(StateError::Inconsistent(format!(
                "revert past journal end: {} > {}",
                end,
                self.journal.len()
            )));
        }

        let kept = self.journal.split_off(end);
        for change in kept.iter().rev() {
            undo(self.store, change)?;
        }
        self.revert_to(range.start)?;

        for (replayed, change) in kept.iter().enumerate() {
            if let Err(e) = redo(self.store, change) {
                debug!(error = %e, "later change depends on reverted range");
                for done in kept[..replayed].iter().rev() {
                    undo(self.store, done)?;
                }
                return Ok(false);
            }
        }
        self.journal.extend(kept);
        Ok(true)
    }

    /// Keep all changes.
    pub fn commit(mut self) {
        self.journal.clear();
    }

    /// Undo all changes.
    pub fn rollback(mut self) -> Result<()> {
        self.revert_to(Checkpoint(0))
    }
}

impl Drop for StateSession<'_> {
    fn drop(&mut self) {
        if self.journal.is_empty() {
            return;
        }
        if let Err(e) = self.revert_to(Checkpoint(0)) {
            error!(error = %e, "failed to undo abandoned session");
        }
    }
}

fn undo(store: &mut AccountStore, change: &Change) -> Result<()> {
    match change {
        Change::Credit { account, amount } => {
            let acc = undo_target(store, account, "credit")?;
            if !acc.debit(*amount) {
                return Err(inconsistent("credit", account));
            }
        }
        Change::Debit { account, amount } => {
            let acc = undo_target(store, account, "debit")?;
            if !acc.credit(*amount) {
                return Err(inconsistent("debit", account));
            }
        }
        Change::TxCount { account } => {
            let acc = undo_target(store, account, "tx count")?;
            acc.tx_count = acc
                .tx_count
                .checked_sub(1)
                .ok_or_else(|| inconsistent("tx count", account))?;
        }
        Change::Created { account, .. } => {
            store
                .remove_account(account)
                .ok_or_else(|| inconsistent("creation", account))?;
        }
        Change::RootAdded { account } => {
            if !store.remove_root_key(account) {
                return Err(inconsistent("root registration", account));
            }
        }
        Change::RootRemoved { account } => {
            if !store.insert_root_key(*account) {
                return Err(inconsistent("root removal", account));
            }
        }
    }
    Ok(())
}

fn redo(store: &mut AccountStore, change: &Change) -> Result<()> {
    match change {
        Change::Credit { account, amount } => {
            let acc = store.account_mut(account)?;
            if !acc.credit(*amount) {
                return Err(StateError::BalanceOverflow {
                    account: *account,
                    balance: acc.balance,
                    amount: *amount,
                });
            }
        }
        Change::Debit { account, amount } => {
            let acc = store.account_mut(account)?;
            if !acc.debit(*amount) {
                return Err(StateError::InsufficientFunds {
                    account: *account,
                    required: *amount,
                    available: acc.balance,
                });
            }
        }
        Change::TxCount { account } => {
            let acc = store.account_mut(account)?;
            acc.tx_count = acc.tx_count.checked_add(1).ok_or_else(|| {
                StateError::Inconsistent(format!("tx count overflow on {}", account))
            })?;
        }
        Change::Created { address, .. } => {
            store.put_account(Account::new(*address))?;
        }
        Change::RootAdded { account } => {
            if !store.insert_root_key(*account) {
                return Err(StateError::Inconsistent(format!("{} is already a root", account)));
            }
        }
        Change::RootRemoved { account } => {
            if !store.remove_root_key(account) {
                return Err(StateError::Inconsistent(format!("{} is not a root", account)));
            }
        }
    }
    Ok(())
}

fn undo_target<'s>(store: &'s mut AccountStore, account: &Hash, what: &str) -> Result<&'s mut Account> {
    store
        .account_mut(account)
        .map_err(|_| inconsistent(what, account))
}

fn inconsistent(what: &str, account: &Hash) -> StateError {
    error!(account = %account, "cannot undo {}", what);
    StateError::Inconsistent(format!("cannot undo {} on {}", what, account))
}
