//! Account state for miniledger.
//!
//! This crate holds the in-memory ledger state:
//! - Accounts, stored once and keyed by their full 32-byte hash
//! - Short-hash buckets that index accounts by their 8-byte wire prefix
//! - The root-key registry of accounts allowed to mint
//! - An undo journal that every balance or registry change passes through
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │          Verifier / State transition          │
//! └───────────────┬───────────────────┬──────────┘
//!          &AccountStore       &mut AccountStore
//!                 │                   │
//!                 │           ┌───────▼────────┐
//!                 │           │  StateSession  │
//!                 │           │  - journal     │
//!                 │           │  - checkpoints │
//!                 │           └───────┬────────┘
//! ┌───────────────▼───────────────────▼──────────┐
//! │                 AccountStore                  │
//! │  accounts:  Hash      -> Account              │
//! │  buckets:   ShortHash -> [Hash]               │
//! │  root_keys: {Hash}                            │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust
//! use miniledger_core::{Account, Keypair};
//! use miniledger_state::AccountStore;
//!
//! let alice = Keypair::generate();
//! let bob = Keypair::generate();
//!
//! let mut store = AccountStore::new();
//! store.put_account(Account::with_balance(alice.public_key, 100)).unwrap();
//! store.put_account(Account::new(bob.public_key)).unwrap();
//!
//! let mut session = store.session();
//! session.debit(&alice.account_hash(), 40).unwrap();
//! session.credit(&bob.account_hash(), 40).unwrap();
//! session.commit();
//!
//! assert_eq!(store.get_account(&bob.account_hash()).unwrap().balance, 40);
//! ```

pub mod error;
pub mod session;
pub mod store;

pub use error::{Result, StateError};
pub use session::{Change, Checkpoint, StateSession};
pub use store::AccountStore;
