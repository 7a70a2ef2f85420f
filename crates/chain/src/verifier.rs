//! Transaction authentication.
//!
//! Funds transactions address their parties by short hash only, so the
//! verifier has to find the one sender/receiver pair whose full hashes make
//! the folded signature verify. Account and config transactions must be
//! signed by a registered root key.

use crate::error::{LedgerError, Result};
use miniledger_core::{AccTx, ConfigTx, FundsTx, Hash, Transaction};
use miniledger_state::AccountStore;
use tracing::{debug, warn};

/// A funds transaction whose counterparties have been resolved.
///
/// Only the verifier constructs these, so holding one means the full hashes
/// were proven by the sender's signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedFundsTx {
    tx: FundsTx,
    from: Hash,
    to: Hash,
}

impl VerifiedFundsTx {
    pub fn tx(&self) -> &FundsTx {
        &self.tx
    }

    /// Full hash of the sender.
    pub fn from_hash(&self) -> Hash {
        self.from
    }

    /// Full hash of the receiver.
    pub fn to_hash(&self) -> Hash {
        self.to
    }

    pub fn into_inner(self) -> FundsTx {
        self.tx
    }
}

impl Transaction for VerifiedFundsTx {
    fn fee(&self) -> u64 {
        self.tx.fee as u64
    }

    fn hash(&self) -> Hash {
        self.tx.storage_hash(&self.from, &self.to)
    }
}

/// Resolve and authenticate a funds transaction.
///
/// Every pair from the sender and receiver buckets is tried in bucket order.
/// The first pair whose reassembled signature verifies under the sender
/// candidate's key wins, provided the two candidates are different records.
pub fn verify_funds_tx(store: &AccountStore, tx: &FundsTx) -> Result<VerifiedFundsTx> {
    if tx.amount == 0 {
        warn!(from = %tx.from, to = %tx.to, "rejecting zero-amount transfer");
        return Err(LedgerError::ZeroAmount);
    }

    for sender in store.candidates(&tx.from) {
        for receiver in store.candidates(&tx.to) {
            if sender == receiver {
                continue;
            }
            let digest = tx.signing_hash(&sender.hash, &receiver.hash);
            let signature = tx.signature_for(&sender.hash, &receiver.hash);
            if sender.address.verify_hash(&digest, &signature).is_ok() {
                debug!(from = %sender.hash, to = %receiver.hash, "funds transaction verified");
                return Ok(VerifiedFundsTx {
                    tx: tx.clone(),
                    from: sender.hash,
                    to: receiver.hash,
                });
            }
        }
    }

    warn!(from = %tx.from, to = %tx.to, "no candidate pair verifies");
    Err(LedgerError::SignatureInvalid("funds transaction"))
}

/// Verify a batch of funds transactions, stopping at the first failure.
pub fn verify_funds_batch(store: &AccountStore, txs: &[FundsTx]) -> Result<Vec<VerifiedFundsTx>> {
    txs.iter().map(|tx| verify_funds_tx(store, tx)).collect()
}

/// Check that an account transaction comes from a root key.
pub fn verify_acc_tx(store: &AccountStore, tx: &AccTx) -> Result<()> {
    let issuer = store.root_account(&tx.issuer)?.ok_or_else(|| {
        warn!(issuer = %tx.issuer, "account transaction from non-root issuer");
        LedgerError::UnauthorizedMint(tx.issuer)
    })?;

    tx.verify(&issuer.address).map_err(|e| {
        warn!(issuer = %tx.issuer, error = %e, "account transaction signature rejected");
        LedgerError::SignatureInvalid("account transaction")
    })
}

/// Check that a config transaction is signed by any registered root key.
pub fn verify_config_tx(store: &AccountStore, tx: &ConfigTx) -> Result<()> {
    for hash in store.root_keys() {
        if let Some(root) = store.root_account(hash)? {
            if tx.verify(&root.address).is_ok() {
                return Ok(());
            }
        }
    }

    warn!(id = tx.id, "config transaction not signed by a root key");
    Err(LedgerError::SignatureInvalid("config transaction"))
}
