//! Fee and block reward collection.

use crate::error::{LedgerError, Result};
use crate::verifier::VerifiedFundsTx;
use miniledger_core::{AccTx, ConfigTx, Hash, Transaction};
use miniledger_state::{AccountStore, StateSession};
use tracing::{debug, warn};

/// Move every fee of an applied block to the miner.
///
/// Funds fees are taken from their senders; account and config fees are
/// minted. If any credit would overflow, every fee moved in this pass is
/// returned and the error is reported. Returns the total collected.
pub fn collect_fees(
    session: &mut StateSession<'_>,
    funds: &[VerifiedFundsTx],
    accounts: &[AccTx],
    configs: &[ConfigTx],
    miner: &Hash,
) -> Result<u64> {
    if !session.store().contains(miner) {
        return Err(LedgerError::UnknownAccount(*miner));
    }

    let start = session.checkpoint();
    match move_fees(session, funds, accounts, configs, miner) {
        Ok(total) => {
            debug!(miner = %miner, total, "fees collected");
            Ok(total)
        }
        Err(err) => {
            warn!(miner = %miner, error = %err, "fee collection failed, returning fees");
            session.revert_to(start)?;
            Err(err)
        }
    }
}

fn move_fees(
    session: &mut StateSession<'_>,
    funds: &[VerifiedFundsTx],
    accounts: &[AccTx],
    configs: &[ConfigTx],
    miner: &Hash,
) -> Result<u64> {
    let mut total = 0u64;

    for tx in funds {
        let fee = tx.fee();
        session.credit(miner, fee)?;
        session.debit(&tx.from_hash(), fee)?;
        total = total.saturating_add(fee);
    }

    let minted = accounts
        .iter()
        .map(Transaction::fee)
        .chain(configs.iter().map(Transaction::fee));
    for fee in minted {
        session.credit(miner, fee)?;
        total = total.saturating_add(fee);
    }

    Ok(total)
}

/// Credit the block reward to the miner.
pub fn collect_block_reward(session: &mut StateSession<'_>, reward: u64, miner: &Hash) -> Result<()> {
    session.credit(miner, reward).map_err(|err| {
        warn!(miner = %miner, reward, error = %err, "block reward rejected");
        LedgerError::from(err)
    })
}

/// [`collect_fees`] applied directly to the store.
pub fn collect_tx_fees(
    store: &mut AccountStore,
    funds: &[VerifiedFundsTx],
    accounts: &[AccTx],
    configs: &[ConfigTx],
    miner: &Hash,
) -> Result<u64> {
    let mut session = store.session();
    let total = collect_fees(&mut session, funds, accounts, configs, miner)?;
    session.commit();
    Ok(total)
}

/// [`collect_block_reward`] applied directly to the store.
pub fn collect_reward(store: &mut AccountStore, reward: u64, miner: &Hash) -> Result<()> {
    let mut session = store.session();
    collect_block_reward(&mut session, reward, miner)?;
    session.commit();
    Ok(())
}
