//! Account and root-key management transactions.

use super::{Reader, Transaction, TransactionError, WireFormat};
use crate::crypto::{CryptoError, Keypair, PublicKey, Signature};
use crate::hash::{hash, hash_concat, Hash};
use serde::Serialize;

/// Encoded size of an account transaction.
pub const ACC_TX_SIZE: usize = 1 + 32 + 8 + 64 + 64;

/// What an account transaction does, selected by its header byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccTxKind {
    /// Create a regular account for the carried key.
    Create,
    /// Mark the carried key as a root key.
    RegisterRoot,
    /// Remove the carried key from the root registry.
    DeregisterRoot,
}

impl AccTxKind {
    pub const REGISTER_ROOT: u8 = 0x01;
    pub const DEREGISTER_ROOT: u8 = 0x02;

    pub fn from_header(header: u8) -> Self {
        match header {
            Self::REGISTER_ROOT => Self::RegisterRoot,
            Self::DEREGISTER_ROOT => Self::DeregisterRoot,
            _ => Self::Create,
        }
    }
}

/// Creates an account or edits the root-key registry. Signed by a root key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccTx {
    pub header: u8,
    /// Account hash of the root key that signed this transaction.
    pub issuer: Hash,
    pub fee: u64,
    /// Key of the account being created, promoted or demoted.
    pub pub_key: PublicKey,
    pub sig: Signature,
}

#[derive(Serialize)]
struct StoredAccTx {
    header: u8,
    issuer: Hash,
    fee: u64,
    pub_key: PublicKey,
}

impl AccTx {
    /// Build an account transaction for `pub_key`, signed by `issuer`.
    pub fn new(
        header: u8,
        fee: u64,
        pub_key: PublicKey,
        issuer: &Keypair,
    ) -> Result<Self, TransactionError> {
        let mut tx = Self {
            header,
            issuer: issuer.account_hash(),
            fee,
            pub_key,
            sig: Signature::default(),
        };
        tx.sig = issuer.sign_hash(&tx.signing_hash())?;
        Ok(tx)
    }

    /// Generate a fresh keypair and the transaction introducing it.
    pub fn create(
        header: u8,
        fee: u64,
        issuer: &Keypair,
    ) -> Result<(Self, Keypair), TransactionError> {
        let keypair = Keypair::generate();
        let tx = Self::new(header, fee, keypair.public_key, issuer)?;
        Ok((tx, keypair))
    }

    pub fn kind(&self) -> AccTxKind {
        AccTxKind::from_header(self.header)
    }

    /// Hash of the carried key, i.e. the affected account.
    pub fn account_hash(&self) -> Hash {
        self.pub_key.account_hash()
    }

    pub fn signing_hash(&self) -> Hash {
        hash_concat(&[
            &[self.header],
            self.issuer.as_ref(),
            &self.fee.to_be_bytes(),
            self.pub_key.as_bytes(),
        ])
    }

    /// Verify the signature against the issuer's key.
    pub fn verify(&self, issuer_key: &PublicKey) -> Result<(), CryptoError> {
        issuer_key.verify_hash(&self.signing_hash(), &self.sig)
    }
}

impl Transaction for AccTx {
    fn fee(&self) -> u64 {
        self.fee
    }

    fn hash(&self) -> Hash {
        let stored = StoredAccTx {
            header: self.header,
            issuer: self.issuer,
            fee: self.fee,
            pub_key: self.pub_key,
        };
        let encoded = bincode::serialize(&stored).expect("serialization should not fail");
        hash(&encoded)
    }
}

impl WireFormat for AccTx {
    const KIND: &'static str = "account transaction";
    const SIZE: usize = ACC_TX_SIZE;

    fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(ACC_TX_SIZE);
        out.push(self.header);
        out.extend_from_slice(self.issuer.as_bytes());
        out.extend_from_slice(&self.fee.to_be_bytes());
        out.extend_from_slice(self.pub_key.as_bytes());
        out.extend_from_slice(self.sig.as_bytes());
        out
    }

    fn decode_exact(reader: &mut Reader<'_>) -> Self {
        Self {
            header: reader.u8(),
            issuer: Hash(reader.array()),
            fee: reader.u64(),
            pub_key: PublicKey(reader.array()),
            sig: Signature(reader.array()),
        }
    }
}
