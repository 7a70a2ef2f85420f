//! Block application for miniledger.
//!
//! This crate turns verified transactions into state changes:
//! - **Verifier**: resolves short-hash addressing and authenticates signatures
//! - **Executor**: applies funds, account and config batches with rollback
//! - **Fees**: moves fees and the block reward to the miner
//! - **Ledger**: runs a whole block atomically and computes its merkle root
//!
//! # Example
//!
//! ```rust
//! use miniledger_chain::{BlockTransactions, Ledger, LedgerConfig};
//! use miniledger_core::{Account, FundsTx, Hash, Keypair};
//!
//! let root = Keypair::generate();
//! let alice = Keypair::generate();
//! let miner = Keypair::generate();
//!
//! let mut ledger = Ledger::with_root(LedgerConfig::default(), root.public_key);
//! ledger.store_mut().put_account(Account::new(alice.public_key)).unwrap();
//! ledger.store_mut().put_account(Account::new(miner.public_key)).unwrap();
//!
//! // A transfer signed by a root key mints new funds.
//! let mint = FundsTx::new(0, 500, 1, 0, &root.account_hash(), &alice.account_hash(), &root)
//!     .unwrap();
//! let block = BlockTransactions { funds: vec![mint], ..Default::default() };
//!
//! let outcome = ledger
//!     .apply_block(Hash([1u8; 32]), &block, &miner.account_hash())
//!     .unwrap();
//! assert_eq!(outcome.fees_collected, 1);
//! ```

pub mod config;
pub mod error;
pub mod executor;
pub mod fees;
pub mod ledger;
pub mod verifier;

// Re-export commonly used types
pub use config::{Bound, LedgerConfig, ParameterBounds, RollbackPolicy};
pub use error::{LedgerError, Result};
pub use executor::{
    acc_state_change, apply_acc_tx, apply_accounts, apply_funds, apply_funds_tx,
    config_state_change, funds_state_change,
};
pub use fees::{collect_block_reward, collect_fees, collect_reward, collect_tx_fees};
pub use ledger::{transactions_root, BlockOutcome, BlockTransactions, Ledger};
pub use verifier::{
    verify_acc_tx, verify_config_tx, verify_funds_batch, verify_funds_tx, VerifiedFundsTx,
};
