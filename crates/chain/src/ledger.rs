//! Block application.
//!
//! The [`Ledger`] owns the account store and the parameter history and runs
//! a whole block against them: verify, apply accounts, apply funds, collect
//! fees and reward, then apply parameter changes and commit the block's
//! transactions root.

use crate::config::LedgerConfig;
use crate::error::Result;
use crate::executor::{apply_acc_tx, apply_funds, config_state_change};
use crate::fees::{collect_block_reward, collect_fees};
use crate::verifier::{verify_acc_tx, verify_config_tx, verify_funds_batch, VerifiedFundsTx};
use miniledger_core::{
    merkle_root, AccTx, Account, ConfigTx, FundsTx, Hash, ParameterHistory, ParameterSet,
    PublicKey, Transaction,
};
use miniledger_state::AccountStore;
use tracing::{debug, info};

/// The transactions of one block, grouped by kind.
#[derive(Debug, Clone, Default)]
pub struct BlockTransactions {
    pub funds: Vec<FundsTx>,
    pub accounts: Vec<AccTx>,
    pub configs: Vec<ConfigTx>,
}

impl BlockTransactions {
    pub fn len(&self) -> usize {
        self.funds.len() + self.accounts.len() + self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Result of applying a block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockOutcome {
    /// Merkle root over funds, then account, then config transactions.
    pub merkle_root: Hash,
    pub fees_collected: u64,
    pub reward: u64,
    /// Whether a new parameter snapshot became active.
    pub parameters_changed: bool,
}

/// Merkle root over a block's transactions in canonical order.
pub fn transactions_root(
    funds: &[VerifiedFundsTx],
    accounts: &[AccTx],
    configs: &[ConfigTx],
) -> Hash {
    let leaves: Vec<Hash> = funds
        .iter()
        .map(Transaction::hash)
        .chain(accounts.iter().map(Transaction::hash))
        .chain(configs.iter().map(Transaction::hash))
        .collect();
    merkle_root(&leaves)
}

/// Account state plus protocol parameters.
#[derive(Debug, Clone)]
pub struct Ledger {
    store: AccountStore,
    parameters: ParameterHistory,
    config: LedgerConfig,
}

impl Ledger {
    /// Create an empty ledger.
    pub fn new(config: LedgerConfig) -> Self {
        Self {
            store: AccountStore::new(),
            parameters: ParameterHistory::new(config.genesis_parameters),
            config,
        }
    }

    /// Create a ledger whose only account is the given root key.
    pub fn with_root(config: LedgerConfig, root: PublicKey) -> Self {
        let mut ledger = Self::new(config);
        ledger.store.add_root_key(Account::new(root));
        ledger
    }

    pub fn store(&self) -> &AccountStore {
        &self.store
    }

    /// Direct access to the store, e.g. to seed genesis balances.
    pub fn store_mut(&mut self) -> &mut AccountStore {
        &mut self.store
    }

    pub fn parameters(&self) -> &ParameterHistory {
        &self.parameters
    }

    /// The active parameter snapshot.
    pub fn active_parameters(&self) -> ParameterSet {
        self.parameters.active()
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn get_account(&self, hash: &Hash) -> Option<&Account> {
        self.store.get_account(hash)
    }

    /// Apply all transactions of a block, crediting fees and the active
    /// block reward to `miner`.
    ///
    /// Account and config transactions are authenticated against the root
    /// registry as left by the account transactions before them, so a key
    /// deregistered earlier in the block can no longer sign.
    ///
    /// Either the whole block is applied or the store is left untouched.
    pub fn apply_block(
        &mut self,
        block_hash: Hash,
        block: &BlockTransactions,
        miner: &Hash,
    ) -> Result<BlockOutcome> {
        let policy = self.config.rollback_policy;
        let reward = self.parameters.active().block_reward;

        let mut session = self.store.session();
        for tx in &block.accounts {
            verify_acc_tx(session.store(), tx)?;
            apply_acc_tx(&mut session, tx)?;
        }
        for tx in &block.configs {
            verify_config_tx(session.store(), tx)?;
        }

        // Accounts created above may take part in this block's transfers.
        let funds = verify_funds_batch(session.store(), &block.funds)?;
        apply_funds(&mut session, &funds, policy)?;

        let fees_collected =
            collect_fees(&mut session, &funds, &block.accounts, &block.configs, miner)?;
        collect_block_reward(&mut session, reward, miner)?;
        session.commit();

        let parameters_changed = config_state_change(
            &mut self.parameters,
            &block.configs,
            block_hash,
            &self.config.bounds,
        );

        let merkle_root = transactions_root(&funds, &block.accounts, &block.configs);
        info!(
            block = %block_hash,
            transactions = block.len(),
            fees = fees_collected,
            reward,
            "block applied"
        );

        Ok(BlockOutcome {
            merkle_root,
            fees_collected,
            reward,
            parameters_changed,
        })
    }

    /// Drop the parameter snapshot produced by `block_hash`, if it is active.
    pub fn revert_parameters(&mut self, block_hash: &Hash) -> bool {
        let reverted = self.parameters.revert_block(block_hash);
        if reverted {
            debug!(block = %block_hash, "parameter snapshot reverted");
        }
        reverted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LedgerError;
    use miniledger_core::{AccTxKind, Keypair, ParameterId};

    fn setup_ledger() -> (Ledger, Keypair, Keypair) {
        let root = Keypair::generate();
        let miner = Keypair::generate();
        let mut ledger = Ledger::with_root(LedgerConfig::default(), root.public_key);
        ledger
            .store_mut()
            .put_account(Account::new(miner.public_key))
            .unwrap();
        (ledger, root, miner)
    }

    #[test]
    fn test_ledger_init() {
        let (ledger, root, _) = setup_ledger();
        assert!(ledger.store().is_root(&root.account_hash()));
        assert_eq!(ledger.parameters().len(), 1);
        assert_eq!(ledger.active_parameters(), ParameterSet::default());
    }

    #[test]
    fn test_empty_block() {
        let (mut ledger, _, miner) = setup_ledger();
        let outcome = ledger
            .apply_block(Hash([1u8; 32]), &BlockTransactions::default(), &miner.account_hash())
            .unwrap();

        assert_eq!(outcome.merkle_root, Hash::ZERO);
        assert_eq!(outcome.fees_collected, 0);
        assert!(!outcome.parameters_changed);
    }

    #[test]
    fn test_new_account_receives_funds_in_same_block() {
        let (mut ledger, root, miner) = setup_ledger();
        let (acc_tx, user) = AccTx::create(0, 2, &root).unwrap();
        let mint = FundsTx::new(
            0,
            100,
            1,
            0,
            &root.account_hash(),
            &user.account_hash(),
            &root,
        )
        .unwrap();

        let block = BlockTransactions {
            funds: vec![mint],
            accounts: vec![acc_tx],
            configs: vec![],
        };
        let outcome = ledger
            .apply_block(Hash([2u8; 32]), &block, &miner.account_hash())
            .unwrap();

        assert!(ledger.store().contains(&user.account_hash()));
        assert_eq!(outcome.fees_collected, 3);
        assert_eq!(ledger.get_account(&miner.account_hash()).unwrap().balance, 3);
        // Mint credits 101 to the root, the funds fee moves 1 to the miner.
        assert_eq!(ledger.get_account(&root.account_hash()).unwrap().balance, 100);
    }

    #[test]
    fn test_failed_block_leaves_state_untouched() {
        let (mut ledger, root, miner) = setup_ledger();
        let (acc_tx, user) = AccTx::create(0, 0, &root).unwrap();
        // The user has no funds to send.
        let transfer = FundsTx::new(
            0,
            10,
            0,
            0,
            &user.account_hash(),
            &root.account_hash(),
            &user,
        )
        .unwrap();

        let block = BlockTransactions {
            funds: vec![transfer],
            accounts: vec![acc_tx],
            configs: vec![],
        };
        let err = ledger
            .apply_block(Hash([3u8; 32]), &block, &miner.account_hash())
            .unwrap_err();

        assert!(matches!(err, LedgerError::InsufficientFunds { .. }));
        assert!(!ledger.store().contains(&user.account_hash()));
    }

    #[test]
    fn test_unauthorized_account_tx() {
        let (mut ledger, _, miner) = setup_ledger();
        let outsider = Keypair::generate();
        let (acc_tx, _) = AccTx::create(0, 0, &outsider).unwrap();

        let block = BlockTransactions {
            accounts: vec![acc_tx],
            ..Default::default()
        };
        assert_eq!(
            ledger.apply_block(Hash::ZERO, &block, &miner.account_hash()),
            Err(LedgerError::UnauthorizedMint(outsider.account_hash()))
        );
    }

    #[test]
    fn test_deregistered_root_cannot_sign_later_in_block() {
        let (mut ledger, root, miner) = setup_ledger();
        let deregister =
            AccTx::new(AccTxKind::DEREGISTER_ROOT, 0, root.public_key, &root).unwrap();
        let (create, user) = AccTx::create(0, 0, &root).unwrap();

        let block = BlockTransactions {
            accounts: vec![deregister.clone(), create],
            ..Default::default()
        };
        assert_eq!(
            ledger.apply_block(Hash([7u8; 32]), &block, &miner.account_hash()),
            Err(LedgerError::UnauthorizedMint(root.account_hash()))
        );
        assert!(ledger.store().is_root(&root.account_hash()));
        assert!(!ledger.store().contains(&user.account_hash()));

        let config_tx =
            ConfigTx::new(0, ParameterId::BlockReward.as_u8(), 25, 0, 0, &root).unwrap();
        let block = BlockTransactions {
            accounts: vec![deregister],
            configs: vec![config_tx],
            ..Default::default()
        };
        assert_eq!(
            ledger.apply_block(Hash([8u8; 32]), &block, &miner.account_hash()),
            Err(LedgerError::SignatureInvalid("config transaction"))
        );
        assert!(ledger.store().is_root(&root.account_hash()));
        assert_eq!(ledger.parameters().len(), 1);
    }

    #[test]
    fn test_parameter_change_and_revert() {
        let (mut ledger, root, miner) = setup_ledger();
        let block_hash = Hash([5u8; 32]);
        let config_tx =
            ConfigTx::new(0, ParameterId::BlockReward.as_u8(), 25, 0, 0, &root).unwrap();

        let block = BlockTransactions {
            configs: vec![config_tx],
            ..Default::default()
        };
        let outcome = ledger
            .apply_block(block_hash, &block, &miner.account_hash())
            .unwrap();

        assert!(outcome.parameters_changed);
        // The reward in force while the block was applied is the old one.
        assert_eq!(outcome.reward, 0);
        assert_eq!(ledger.active_parameters().block_reward, 25);

        let next = ledger
            .apply_block(Hash([6u8; 32]), &BlockTransactions::default(), &miner.account_hash())
            .unwrap();
        assert_eq!(next.reward, 25);
        assert_eq!(ledger.get_account(&miner.account_hash()).unwrap().balance, 25);

        assert!(ledger.revert_parameters(&block_hash));
        assert_eq!(ledger.active_parameters().block_reward, 0);
    }

    #[test]
    fn test_transactions_root_order() {
        let root = Keypair::generate();
        let (a, _) = AccTx::create(0, 0, &root).unwrap();
        let c = ConfigTx::new(0, 1, 5000, 0, 0, &root).unwrap();

        let expected = merkle_root(&[a.hash(), c.hash()]);
        assert_eq!(transactions_root(&[], &[a.clone()], &[c.clone()]), expected);
        assert_eq!(
            transactions_root(&[], &[a.clone()], &[]),
            merkle_root(&[a.hash()])
        );
    }
}
