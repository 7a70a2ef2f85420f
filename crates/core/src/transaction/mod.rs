//! Transaction kinds and their fixed-width wire codec.
//!
//! Every kind has a constant encoded size and big-endian integer fields. The
//! only field that distinguishes variants inside a kind is the leading header
//! byte; there is no length prefix or versioning.

mod account;
mod config;
mod funds;

pub use account::{AccTx, AccTxKind, ACC_TX_SIZE};
pub use config::{ConfigTx, CONFIG_TX_SIZE};
pub use funds::{FundsTx, FUNDS_TX_SIZE, MAX_TX_COUNT, XORED_LEN, SIG_TAIL_LEN};

use crate::crypto::CryptoError;
use crate::hash::Hash;
use thiserror::Error;

/// Errors raised while encoding or decoding wire transactions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("invalid {kind} length (expected {expected} bytes, got {got})")]
    InvalidLength {
        kind: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("{field} out of wire range: {value}")]
    OutOfRange { field: &'static str, value: u64 },
}

/// Errors that can occur while building a transaction.
#[derive(Debug, Error)]
pub enum TransactionError {
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),
}

/// Fixed-width binary encoding.
pub trait WireFormat: Sized {
    /// Human-readable kind, used in codec errors.
    const KIND: &'static str;
    /// Exact encoded length in bytes.
    const SIZE: usize;

    fn encode(&self) -> Vec<u8>;

    /// Decode from a buffer already known to be `SIZE` bytes long.
    fn decode_exact(reader: &mut Reader<'_>) -> Self;

    fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        if bytes.len() != Self::SIZE {
            return Err(CodecError::InvalidLength {
                kind: Self::KIND,
                expected: Self::SIZE,
                got: bytes.len(),
            });
        }
        Ok(Self::decode_exact(&mut Reader::new(bytes)))
    }
}

/// Anything that can be committed into a block.
pub trait Transaction {
    /// Fee paid to the miner.
    fn fee(&self) -> u64;

    /// Hash of the storage-level encoding; used as the Merkle leaf.
    fn hash(&self) -> Hash;
}

/// Cursor over a length-checked wire buffer.
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn array<const N: usize>(&mut self) -> [u8; N] {
        let mut out = [0u8; N];
        out.copy_from_slice(&self.buf[self.pos..self.pos + N]);
        self.pos += N;
        out
    }

    pub fn u8(&mut self) -> u8 {
        self.array::<1>()[0]
    }

    pub fn u16(&mut self) -> u16 {
        u16::from_be_bytes(self.array())
    }

    pub fn u24(&mut self) -> u32 {
        let [a, b, c] = self.array::<3>();
        u32::from_be_bytes([0, a, b, c])
    }

    pub fn u32(&mut self) -> u32 {
        u32::from_be_bytes(self.array())
    }

    pub fn u64(&mut self) -> u64 {
        u64::from_be_bytes(self.array())
    }
}

/// Big-endian 24-bit encoding; the caller guarantees `value <= MAX_TX_COUNT`.
pub(crate) fn u24_bytes(value: u32) -> [u8; 3] {
    let [_, a, b, c] = value.to_be_bytes();
    [a, b, c]
}
