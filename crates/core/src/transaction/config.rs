//! Protocol parameter change transactions.

use super::{Reader, Transaction, TransactionError, WireFormat};
use crate::crypto::{CryptoError, Keypair, PublicKey, Signature};
use crate::hash::{hash, hash_concat, Hash};
use crate::params::ParameterId;
use serde::Serialize;

/// Encoded size of a config transaction.
pub const CONFIG_TX_SIZE: usize = 1 + 1 + 8 + 8 + 1 + 64;

/// Proposes a new value for one protocol parameter. Signed by a root key.
///
/// Ids outside the recognized set are valid on the wire but have no effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigTx {
    pub header: u8,
    pub id: u8,
    pub payload: u64,
    pub fee: u64,
    /// Distinguishes otherwise identical proposals.
    pub tx_cnt: u8,
    pub sig: Signature,
}

#[derive(Serialize)]
struct StoredConfigTx {
    header: u8,
    id: u8,
    payload: u64,
    fee: u64,
    tx_cnt: u8,
}

impl ConfigTx {
    pub fn new(
        header: u8,
        id: u8,
        payload: u64,
        fee: u64,
        tx_cnt: u8,
        keypair: &Keypair,
    ) -> Result<Self, TransactionError> {
        let mut tx = Self {
            header,
            id,
            payload,
            fee,
            tx_cnt,
            sig: Signature::default(),
        };
        tx.sig = keypair.sign_hash(&tx.signing_hash())?;
        Ok(tx)
    }

    /// The targeted parameter, if the id is recognized.
    pub fn parameter(&self) -> Option<ParameterId> {
        ParameterId::from_u8(self.id)
    }

    pub fn signing_hash(&self) -> Hash {
        hash_concat(&[
            &[self.header, self.id],
            &self.payload.to_be_bytes(),
            &self.fee.to_be_bytes(),
            &[self.tx_cnt],
        ])
    }

    pub fn verify(&self, key: &PublicKey) -> Result<(), CryptoError> {
        key.verify_hash(&self.signing_hash(), &self.sig)
    }
}

impl Transaction for ConfigTx {
    fn fee(&self) -> u64 {
        self.fee
    }

    fn hash(&self) -> Hash {
        let stored = StoredConfigTx {
            header: self.header,
            id: self.id,
            payload: self.payload,
            fee: self.fee,
            tx_cnt: self.tx_cnt,
        };
        let encoded = bincode::serialize(&stored).expect("serialization should not fail");
        hash(&encoded)
    }
}

impl WireFormat for ConfigTx {
    const KIND: &'static str = "config transaction";
    const SIZE: usize = CONFIG_TX_SIZE;

    fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(CONFIG_TX_SIZE);
        out.push(self.header);
        out.push(self.id);
        out.extend_from_slice(&self.payload.to_be_bytes());
        out.extend_from_slice(&self.fee.to_be_bytes());
        out.push(self.tx_cnt);
        out.extend_from_slice(self.sig.as_bytes());
        out
    }

    fn decode_exact(reader: &mut Reader<'_>) -> Self {
        Self {
            header: reader.u8(),
            id: reader.u8(),
            payload: reader.u64(),
            fee: reader.u64(),
            tx_cnt: reader.u8(),
            sig: Signature(reader.array()),
        }
    }
}
