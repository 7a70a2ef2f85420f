//! Value transfer transactions.

use super::{u24_bytes, CodecError, Reader, TransactionError, WireFormat};
use crate::crypto::{Keypair, Signature, SIGNATURE_LEN};
use crate::hash::{hash, hash_concat, Hash, ShortHash, SHORT_HASH_LEN};
use serde::Serialize;

/// Encoded size of a funds transaction.
pub const FUNDS_TX_SIZE: usize = 90;
/// Largest sequence number representable in the 24-bit wire field.
pub const MAX_TX_COUNT: u32 = 0x00ff_ffff;
/// Signature bytes folded into the sender/receiver hash tails.
pub const XORED_LEN: usize = 24;
/// Signature bytes transmitted verbatim.
pub const SIG_TAIL_LEN: usize = SIGNATURE_LEN - XORED_LEN;

/// A value transfer as it travels on the wire.
///
/// Sender and receiver are addressed by short hash only. The first
/// [`XORED_LEN`] signature bytes are XORed with the tails of both full hashes,
/// so the signature can only be reassembled by someone who knows which
/// accounts are meant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FundsTx {
    pub header: u8,
    pub amount: u32,
    pub fee: u16,
    /// Sender sequence number (24 bits on the wire).
    pub tx_count: u32,
    pub from: ShortHash,
    pub to: ShortHash,
    pub xored: [u8; XORED_LEN],
    pub sig: [u8; SIG_TAIL_LEN],
}

/// Canonical storage form: full hashes instead of wire prefixes.
#[derive(Serialize)]
struct StoredFundsTx {
    header: u8,
    amount: u32,
    fee: u16,
    tx_count: u32,
    from: Hash,
    to: Hash,
}

impl FundsTx {
    /// Build and sign a transfer from `from` to `to`.
    pub fn new(
        header: u8,
        amount: u32,
        fee: u16,
        tx_count: u32,
        from: &Hash,
        to: &Hash,
        keypair: &Keypair,
    ) -> Result<Self, TransactionError> {
        if tx_count > MAX_TX_COUNT {
            return Err(CodecError::OutOfRange {
                field: "tx_count",
                value: tx_count as u64,
            }
            .into());
        }

        let digest = Self::signing_digest(header, amount, fee, tx_count, from, to);
        let signature = keypair.sign_hash(&digest)?;

        let mut xored = [0u8; XORED_LEN];
        for (i, byte) in xored.iter_mut().enumerate() {
            *byte = signature.0[i] ^ from.tail()[i] ^ to.tail()[i];
        }
        let mut sig = [0u8; SIG_TAIL_LEN];
        sig.copy_from_slice(&signature.0[XORED_LEN..]);

        Ok(Self {
            header,
            amount,
            fee,
            tx_count,
            from: from.short(),
            to: to.short(),
            xored,
            sig,
        })
    }

    /// Digest signed by the sender.
    pub fn signing_digest(
        header: u8,
        amount: u32,
        fee: u16,
        tx_count: u32,
        from: &Hash,
        to: &Hash,
    ) -> Hash {
        hash_concat(&[
            &[header],
            &amount.to_be_bytes(),
            &fee.to_be_bytes(),
            &u24_bytes(tx_count),
            from.as_ref(),
            to.as_ref(),
        ])
    }

    /// Digest this transaction would carry if sent from `from` to `to`.
    pub fn signing_hash(&self, from: &Hash, to: &Hash) -> Hash {
        Self::signing_digest(self.header, self.amount, self.fee, self.tx_count, from, to)
    }

    /// Reassemble the full signature assuming the given counterparties.
    ///
    /// Wrong candidates yield a garbage signature rather than an error.
    pub fn signature_for(&self, from: &Hash, to: &Hash) -> Signature {
        let mut full = [0u8; SIGNATURE_LEN];
        for i in 0..XORED_LEN {
            full[i] = self.xored[i] ^ from.tail()[i] ^ to.tail()[i];
        }
        full[XORED_LEN..].copy_from_slice(&self.sig);
        Signature(full)
    }

    /// Amount plus fee, the sender's total outlay.
    pub fn total(&self) -> u64 {
        self.amount as u64 + self.fee as u64
    }

    /// Storage-level hash once the full counterparties are known.
    pub fn storage_hash(&self, from: &Hash, to: &Hash) -> Hash {
        let stored = StoredFundsTx {
            header: self.header,
            amount: self.amount,
            fee: self.fee,
            tx_count: self.tx_count,
            from: *from,
            to: *to,
        };
        let encoded = bincode::serialize(&stored).expect("serialization should not fail");
        hash(&encoded)
    }
}

impl WireFormat for FundsTx {
    const KIND: &'static str = "funds transaction";
    const SIZE: usize = FUNDS_TX_SIZE;

    fn encode(&self) -> Vec<u8> {
        debug_assert!(
            self.tx_count <= MAX_TX_COUNT,
            "tx_count {} does not fit in 24 bits",
            self.tx_count
        );
        let mut out = Vec::with_capacity(FUNDS_TX_SIZE);
        out.push(self.header);
        out.extend_from_slice(&self.amount.to_be_bytes());
        out.extend_from_slice(&self.fee.to_be_bytes());
        out.extend_from_slice(&u24_bytes(self.tx_count & MAX_TX_COUNT));
        out.extend_from_slice(self.from.as_bytes());
        out.extend_from_slice(self.to.as_bytes());
        out.extend_from_slice(&self.xored);
        out.extend_from_slice(&self.sig);
        out
    }

    fn decode_exact(reader: &mut Reader<'_>) -> Self {
        Self {
            header: reader.u8(),
            amount: reader.u32(),
            fee: reader.u16(),
            tx_count: reader.u24(),
            from: ShortHash(reader.array::<SHORT_HASH_LEN>()),
            to: ShortHash(reader.array::<SHORT_HASH_LEN>()),
            xored: reader.array(),
            sig: reader.array(),
        }
    }
}
