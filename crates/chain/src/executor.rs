//! State transition engine.
//!
//! Applies verified transaction batches to the account store. Each batch
//! runs eagerly, one transaction at a time, with a checkpoint before every
//! transaction. When transaction `k` fails, its own partial effects are
//! undone and then a prefix of the batch is reverted according to the
//! configured [`RollbackPolicy`]. If a retained transaction relied on the
//! reverted prefix, the whole batch is reverted instead. Either way the error
//! of the failing transaction is returned.

use crate::config::RollbackPolicy;
use crate::error::{LedgerError, Result};
use crate::verifier::VerifiedFundsTx;
use miniledger_core::{AccTx, AccTxKind, ConfigTx, Hash, ParameterHistory, ParameterPolicy};
use miniledger_state::{AccountStore, StateSession};
use std::collections::HashMap;
use tracing::{debug, info, warn};

// =============================================================================
// Funds
// =============================================================================

/// Apply a single verified transfer.
///
/// A transfer from a root key is a mint: the root account is credited with
/// amount plus fee and nobody is debited.
pub fn apply_funds_tx(session: &mut StateSession<'_>, verified: &VerifiedFundsTx) -> Result<()> {
    apply_transfer(session, verified, 0)
}

/// Apply a transfer whose sender must also keep `reserved` for fees owed by
/// earlier transfers in the same batch.
fn apply_transfer(
    session: &mut StateSession<'_>,
    verified: &VerifiedFundsTx,
    reserved: u64,
) -> Result<()> {
    let tx = verified.tx();
    let from = verified.from_hash();
    let to = verified.to_hash();

    let root_count = session
        .store()
        .root_account(&from)?
        .map(|root| root.tx_count);
    if let Some(expected) = root_count {
        check_sequence(&from, expected, tx.tx_count)?;
        session.credit(&from, tx.total())?;
        session.increment_tx_count(&from)?;
        info!(root = %from, amount = tx.amount, fee = tx.fee, "root key mint");
        return Ok(());
    }

    let store = session.store();
    let sender = store
        .get_account(&from)
        .ok_or(LedgerError::UnknownAccount(from))?;
    let receiver = store
        .get_account(&to)
        .ok_or(LedgerError::UnknownAccount(to))?;

    check_sequence(&from, sender.tx_count, tx.tx_count)?;

    let required = tx.total().saturating_add(reserved);
    if sender.balance < required {
        return Err(LedgerError::InsufficientFunds {
            account: from,
            required,
            available: sender.balance,
        });
    }

    let amount = tx.amount as u64;
    if receiver.credited(amount).is_none() {
        return Err(LedgerError::BalanceOverflow {
            account: to,
            balance: receiver.balance,
            amount,
        });
    }

    session.increment_tx_count(&from)?;
    session.debit(&from, amount)?;
    session.credit(&to, amount)?;

    debug!(from = %from, to = %to, amount, "transfer applied");
    Ok(())
}

fn check_sequence(account: &Hash, expected: u32, got: u32) -> Result<()> {
    if expected != got {
        return Err(LedgerError::SequenceMismatch {
            account: *account,
            expected,
            got,
        });
    }
    Ok(())
}

/// Apply a funds batch inside an open session.
///
/// Fees stay with their senders until [`collect_fees`](crate::fees::collect_fees)
/// runs, so each sender must cover the fees of its earlier transfers in the
/// batch as well. On failure the retained prefix stays in the session's
/// journal; the caller decides whether to commit it.
pub fn apply_funds(
    session: &mut StateSession<'_>,
    txs: &[VerifiedFundsTx],
    policy: RollbackPolicy,
) -> Result<()> {
    let mut owed: HashMap<Hash, u64> = HashMap::new();
    apply_batch(session, txs, policy, "funds", |session, tx| {
        let sender = owed.entry(tx.from_hash()).or_default();
        apply_transfer(session, tx, *sender)?;
        *sender = sender.saturating_add(tx.tx().fee as u64);
        Ok(())
    })
}

/// Apply a funds batch directly to the store.
///
/// Whatever the rollback policy retains after a failure is kept, and the
/// error of the failing transaction is returned.
pub fn funds_state_change(
    store: &mut AccountStore,
    txs: &[VerifiedFundsTx],
    policy: RollbackPolicy,
) -> Result<()> {
    let mut session = store.session();
    let result = apply_funds(&mut session, txs, policy);
    session.commit();
    result
}

// =============================================================================
// Accounts
// =============================================================================

/// Apply a single account transaction.
pub fn apply_acc_tx(session: &mut StateSession<'_>, tx: &AccTx) -> Result<()> {
    let account = tx.account_hash();
    match tx.kind() {
        AccTxKind::RegisterRoot => {
            if session.register_root(tx.pub_key)? {
                info!(account = %account, "root key registered");
            }
        }
        AccTxKind::DeregisterRoot => {
            if session.deregister_root(&account) {
                info!(account = %account, "root key removed");
            }
        }
        AccTxKind::Create => {
            session.create_account(tx.pub_key)?;
            debug!(account = %account, "account created");
        }
    }
    Ok(())
}

/// Apply an account batch inside an open session.
pub fn apply_accounts(
    session: &mut StateSession<'_>,
    txs: &[AccTx],
    policy: RollbackPolicy,
) -> Result<()> {
    apply_batch(session, txs, policy, "account", apply_acc_tx)
}

/// Apply an account batch directly to the store.
pub fn acc_state_change(
    store: &mut AccountStore,
    txs: &[AccTx],
    policy: RollbackPolicy,
) -> Result<()> {
    let mut session = store.session();
    let result = apply_accounts(&mut session, txs, policy);
    session.commit();
    result
}

fn apply_batch<T>(
    session: &mut StateSession<'_>,
    txs: &[T],
    policy: RollbackPolicy,
    kind: &'static str,
    mut apply: impl FnMut(&mut StateSession<'_>, &T) -> Result<()>,
) -> Result<()> {
    let mut marks = Vec::with_capacity(txs.len());

    for (index, tx) in txs.iter().enumerate() {
        let mark = session.checkpoint();
        marks.push(mark);

        if let Err(err) = apply(session, tx) {
            warn!(kind, index, error = %err, "transaction rejected, rolling back batch");
            session.revert_to(mark)?;

            let undo = policy.undo_count(index);
            if undo > 0 && !session.revert_range(marks[0]..marks[undo])? {
                warn!(kind, index, "retained transactions depend on reverted ones, batch reverted");
            }
            return Err(err);
        }
    }

    Ok(())
}

// =============================================================================
// Parameters
// =============================================================================

/// Apply config transactions and snapshot the result.
///
/// Unknown parameter ids are ignored. A new snapshot tagged with
/// `block_hash` is appended only if at least one change passed `policy`.
/// Returns whether a snapshot was appended.
pub fn config_state_change<P>(
    history: &mut ParameterHistory,
    txs: &[ConfigTx],
    block_hash: Hash,
    policy: &P,
) -> bool
where
    P: ParameterPolicy + ?Sized,
{
    let mut next = history.active();
    let mut changed = false;

    for tx in txs {
        let Some(id) = tx.parameter() else {
            debug!(id = tx.id, "ignoring unknown parameter id");
            continue;
        };
        if policy.accepts(id, tx.payload) {
            info!(parameter = ?id, value = tx.payload, "parameter changed");
            next.set(id, tx.payload);
            changed = true;
        } else {
            warn!(parameter = ?id, value = tx.payload, "parameter value out of bounds");
        }
    }

    if changed {
        next.block_hash = block_hash;
        history.append(next);
    }
    changed
}
