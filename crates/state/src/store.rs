//! Account store: accounts, short-hash buckets and root keys.

use crate::error::{Result, StateError};
use crate::session::StateSession;
use miniledger_core::{Account, Hash, ShortHash};
use std::collections::{BTreeSet, HashMap};
use tracing::error;

/// In-memory ledger state.
///
/// Each account is stored exactly once, under its full hash. Buckets map a
/// short hash to the full hashes sharing that prefix, in insertion order;
/// distinct accounts may collide on a prefix and must coexist. The root-key
/// registry holds the full hashes of accounts allowed to mint.
#[derive(Debug, Clone, Default)]
pub struct AccountStore {
    accounts: HashMap<Hash, Account>,
    buckets: HashMap<ShortHash, Vec<Hash>>,
    root_keys: BTreeSet<Hash>,
}

impl AccountStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a session; all balance and registry mutations go through it.
    pub fn session(&mut self) -> StateSession<'_> {
        StateSession::new(self)
    }

    // =========================================================================
    // Account Operations
    // =========================================================================

    /// Look up an account by full hash.
    pub fn get_account(&self, hash: &Hash) -> Option<&Account> {
        self.accounts.get(hash)
    }

    /// Check if an account exists.
    pub fn contains(&self, hash: &Hash) -> bool {
        self.accounts.contains_key(hash)
    }

    /// All accounts whose hash starts with `short`, in insertion order.
    pub fn candidates<'a>(&'a self, short: &ShortHash) -> impl Iterator<Item = &'a Account> + 'a {
        self.buckets
            .get(short)
            .into_iter()
            .flatten()
            .filter_map(|hash| self.accounts.get(hash))
    }

    /// Number of accounts sharing `short`.
    pub fn bucket_len(&self, short: &ShortHash) -> usize {
        self.buckets.get(short).map_or(0, Vec::len)
    }

    /// Insert a new account.
    ///
    /// Fails if an account with the identical full hash is already stored.
    /// Accounts that merely share a short hash are accepted.
    pub fn put_account(&mut self, account: Account) -> Result<()> {
        if self.accounts.contains_key(&account.hash) {
            return Err(StateError::AccountExists(account.hash));
        }
        self.buckets
            .entry(account.short_hash())
            .or_default()
            .push(account.hash);
        self.accounts.insert(account.hash, account);
        Ok(())
    }

    pub(crate) fn remove_account(&mut self, hash: &Hash) -> Option<Account> {
        let account = self.accounts.remove(hash)?;
        let short = hash.short();
        if let Some(bucket) = self.buckets.get_mut(&short) {
            bucket.retain(|entry| entry != hash);
            if bucket.is_empty() {
                self.buckets.remove(&short);
            }
        }
        Some(account)
    }

    pub(crate) fn account_mut(&mut self, hash: &Hash) -> Result<&mut Account> {
        self.accounts
            .get_mut(hash)
            .ok_or(StateError::UnknownAccount(*hash))
    }

    /// Number of stored accounts.
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Account> {
        self.accounts.values()
    }

    /// Sum of all balances.
    pub fn total_supply(&self) -> u128 {
        self.accounts.values().map(|acc| acc.balance as u128).sum()
    }

    // =========================================================================
    // Root Keys
    // =========================================================================

    /// Mark an account as a root key, storing it first if it is new.
    ///
    /// Returns true if a new account record was created. Registering an
    /// existing root key again changes nothing.
    pub fn add_root_key(&mut self, account: Account) -> bool {
        let hash = account.hash;
        let created = !self.accounts.contains_key(&hash);
        if created {
            // Cannot collide: checked above.
            let _ = self.put_account(account);
        }
        self.root_keys.insert(hash);
        created
    }

    /// Remove a root key. Removing an absent key is not an error.
    ///
    /// The account itself stays in the store. Returns true if it was a root.
    pub fn remove_root_key(&mut self, hash: &Hash) -> bool {
        self.root_keys.remove(hash)
    }

    pub(crate) fn insert_root_key(&mut self, hash: Hash) -> bool {
        self.root_keys.insert(hash)
    }

    pub fn is_root(&self, hash: &Hash) -> bool {
        self.root_keys.contains(hash)
    }

    /// Registered root keys in ascending hash order.
    pub fn root_keys(&self) -> impl Iterator<Item = &Hash> {
        self.root_keys.iter()
    }

    /// Resolve a registered root key to its account.
    ///
    /// Returns `Ok(None)` if `hash` is not a root key, and
    /// [`StateError::Inconsistent`] if it is registered without an account.
    pub fn root_account(&self, hash: &Hash) -> Result<Option<&Account>> {
        if !self.root_keys.contains(hash) {
            return Ok(None);
        }
        match self.accounts.get(hash) {
            Some(account) => Ok(Some(account)),
            None => {
                error!(root = %hash, "root key registered without an account");
                Err(StateError::Inconsistent(format!(
                    "root key {} has no account",
                    hash
                )))
            }
        }
    }

    /// Check that every index entry points at a stored account.
    pub fn check_consistency(&self) -> Result<()> {
        for hash in &self.root_keys {
            self.root_account(hash)?;
        }
        for (short, bucket) in &self.buckets {
            for hash in bucket {
                if !short.matches(hash) || !self.accounts.contains_key(hash) {
                    return Err(StateError::Inconsistent(format!(
                        "bucket {} holds dangling entry {}",
                        short, hash
                    )));
                }
            }
        }
        let indexed: usize = self.buckets.values().map(Vec::len).sum();
        if indexed != self.accounts.len() {
            return Err(StateError::Inconsistent(format!(
                "{} accounts but {} bucket entries",
                self.accounts.len(),
                indexed
            )));
        }
        Ok(())
    }
}
