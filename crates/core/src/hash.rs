//! Blake3 hashing utilities and the truncated addressing hash.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A named alias for a 32-byte(u8) array, used to represent a 256-bit hash.
pub type H256 = [u8; 32];

/// Number of leading hash bytes carried on the wire to address an account.
pub const SHORT_HASH_LEN: usize = 8;

/// A wrapper type for H256 with Display and Debug formatting.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Hash(pub H256);

impl Hash {
    /// The zero hash (all zeros).
    pub const ZERO: Self = Self([0u8; 32]);

    /// Create a new Hash from raw bytes.
    pub fn from_bytes(bytes: H256) -> Self {
        Self(bytes)
    }

    /// Get the underlying bytes.
    pub fn as_bytes(&self) -> &H256 {
        &self.0
    }

    /// The wire prefix of this hash.
    pub fn short(&self) -> ShortHash {
        let mut prefix = [0u8; SHORT_HASH_LEN];
        prefix.copy_from_slice(&self.0[..SHORT_HASH_LEN]);
        ShortHash(prefix)
    }

    /// The 24 bytes following the short prefix.
    ///
    /// Funds transactions fold this tail into the transmitted signature.
    pub fn tail(&self) -> &[u8] {
        &self.0[SHORT_HASH_LEN..]
    }

    /// Convert to a hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from a hex string.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        if bytes.len() != 32 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash(0x{})", &self.to_hex()[..8])
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl From<H256> for Hash {
    fn from(bytes: H256) -> Self {
        Self(bytes)
    }
}

impl From<Hash> for H256 {
    fn from(hash: Hash) -> Self {
        hash.0
    }
}

impl AsRef<[u8]> for Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// The first eight bytes of an account hash.
///
/// Several accounts may share a short hash; lookups by short hash return a
/// bucket of candidates rather than a single account.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct ShortHash(pub [u8; SHORT_HASH_LEN]);

impl ShortHash {
    pub fn as_bytes(&self) -> &[u8; SHORT_HASH_LEN] {
        &self.0
    }

    /// True if `hash` starts with this prefix.
    pub fn matches(&self, hash: &Hash) -> bool {
        hash.0[..SHORT_HASH_LEN] == self.0
    }
}

impl fmt::Debug for ShortHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ShortHash(0x{})", hex::encode(self.0))
    }
}

impl fmt::Display for ShortHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl From<[u8; SHORT_HASH_LEN]> for ShortHash {
    fn from(bytes: [u8; SHORT_HASH_LEN]) -> Self {
        Self(bytes)
    }
}

/// Hash arbitrary data using Blake3.
pub fn hash(data: &[u8]) -> Hash {
    Hash(blake3::hash(data).into())
}

/// Hash multiple pieces of data by concatenating them.
pub fn hash_concat(parts: &[&[u8]]) -> Hash {
    let mut hasher = blake3::Hasher::new();
    for part in parts {
        hasher.update(part);
    }
    Hash(hasher.finalize().into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_deterministic() {
        let data = b"hello world";
        let h1 = hash(data);
        let h2 = hash(data);
        assert_eq!(h1, h2);
    }

    #[test]
    fn test_hash_different_inputs() {
        let h1 = hash(b"hello");
        let h2 = hash(b"world");
        assert_ne!(h1, h2);
    }

    #[test]
    fn test_hash_hex_roundtrip() {
        let h = hash(b"test data");
        let hex_str = h.to_hex();
        let parsed = Hash::from_hex(&hex_str).unwrap();
        assert_eq!(h, parsed);
    }

    #[test]
    fn test_hash_concat() {
        let h1 = hash_concat(&[b"hello", b"world"]);
        let h2 = hash(b"helloworld");
        assert_eq!(h1, h2);
    }

    #[test]
    fn test_short_hash_is_prefix() {
        let h = hash(b"account");
        let short = h.short();
        assert_eq!(&short.0[..], &h.0[..8]);
        assert!(short.matches(&h));
        assert_eq!(h.tail().len(), 24);
        assert_eq!(h.tail(), &h.0[8..]);
    }

    #[test]
    fn test_short_hash_mismatch() {
        let a = hash(b"a");
        let b = hash(b"b");
        assert!(!a.short().matches(&b));
    }

    #[test]
    fn test_zero_hash() {
        assert_eq!(Hash::ZERO.0, [0u8; 32]);
        assert_eq!(Hash::ZERO.short(), ShortHash::default());
    }
}
