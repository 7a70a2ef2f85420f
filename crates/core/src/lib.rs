//! Core ledger primitives for miniledger.
//!
//! This crate provides the fundamental types used throughout the ledger:
//! - Hashing and the truncated short-hash addressing scheme
//! - P-256 keys and signatures
//! - Account state
//! - Funds, account and config transactions with their wire codec
//! - Protocol parameter snapshots
//! - Merkle trees

pub mod account;
pub mod crypto;
pub mod hash;
pub mod merkle;
pub mod params;
pub mod transaction;

// Re-export commonly used types at the crate root
pub use account::{Account, MAX_MONEY};
pub use crypto::{CryptoError, Keypair, PublicKey, Signature};
pub use hash::{hash, hash_concat, Hash, ShortHash, H256};
pub use merkle::{merkle_root, verify_proof, MerkleProof, MerkleTree};
pub use params::{ParameterHistory, ParameterId, ParameterPolicy, ParameterSet};
pub use transaction::{
    AccTx, AccTxKind, CodecError, ConfigTx, FundsTx, Transaction, TransactionError, WireFormat,
};
