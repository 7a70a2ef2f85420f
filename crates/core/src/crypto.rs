//! P-256 ECDSA primitives for signing and verification.
//!
//! Public keys travel as the raw 64-byte `X || Y` affine coordinates and
//! signatures as the raw 64-byte `r || s` pair. Transactions are signed over a
//! Blake3 digest, so signing and verification work on prehashed input.

use crate::hash::{hash, Hash};
use p256::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use p256::ecdsa::{Signature as EcdsaSignature, SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Length of an uncompressed public key without the SEC1 tag byte.
pub const PUBLIC_KEY_LEN: usize = 64;
/// Length of an `r || s` signature.
pub const SIGNATURE_LEN: usize = 64;

/// Errors that can occur during cryptographic operations.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("invalid signature")]
    InvalidSignature,
    #[error("invalid public key")]
    InvalidPublicKey,
    #[error("invalid private key")]
    InvalidPrivateKey,
    #[error("signature verification failed")]
    VerificationFailed,
}

mod bytes64_serde {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8; 64], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serde::Serialize::serialize(bytes.as_slice(), serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<[u8; 64], D::Error>
    where
        D: Deserializer<'de>,
    {
        let bytes: Vec<u8> = Vec::deserialize(deserializer)?;
        if bytes.len() != 64 {
            return Err(serde::de::Error::custom("expected 64 bytes"));
        }
        let mut arr = [0u8; 64];
        arr.copy_from_slice(&bytes);
        Ok(arr)
    }
}

/// A cryptographic signature (`r || s`).
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature(#[serde(with = "bytes64_serde")] pub [u8; SIGNATURE_LEN]);

impl Signature {
    /// Create a signature from raw bytes.
    pub fn from_bytes(bytes: [u8; SIGNATURE_LEN]) -> Self {
        Self(bytes)
    }

    /// Get the underlying bytes.
    pub fn as_bytes(&self) -> &[u8; SIGNATURE_LEN] {
        &self.0
    }

    /// Convert to a hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl Default for Signature {
    fn default() -> Self {
        Self([0u8; SIGNATURE_LEN])
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({}...)", &self.to_hex()[..16])
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

/// A public key in raw `X || Y` form. This is an account's address.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PublicKey(#[serde(with = "bytes64_serde")] pub [u8; PUBLIC_KEY_LEN]);

impl PublicKey {
    pub fn from_bytes(bytes: [u8; PUBLIC_KEY_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_LEN] {
        &self.0
    }

    /// The account hash derived from this key.
    pub fn account_hash(&self) -> Hash {
        hash(&self.0)
    }

    fn verifying_key(&self) -> Result<VerifyingKey, CryptoError> {
        let mut sec1 = [0u8; PUBLIC_KEY_LEN + 1];
        sec1[0] = 0x04;
        sec1[1..].copy_from_slice(&self.0);
        VerifyingKey::from_sec1_bytes(&sec1).map_err(|_| CryptoError::InvalidPublicKey)
    }

    /// Verify a signature over a digest.
    pub fn verify_hash(&self, digest: &Hash, signature: &Signature) -> Result<(), CryptoError> {
        let key = self.verifying_key()?;
        let sig =
            EcdsaSignature::from_slice(&signature.0).map_err(|_| CryptoError::InvalidSignature)?;
        key.verify_prehash(digest.as_bytes(), &sig)
            .map_err(|_| CryptoError::VerificationFailed)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", hex::encode(&self.0[..8]))
    }
}

impl Default for PublicKey {
    fn default() -> Self {
        Self([0u8; PUBLIC_KEY_LEN])
    }
}

/// A keypair for signing and verification.
pub struct Keypair {
    signing_key: SigningKey,
    pub public_key: PublicKey,
}

impl Keypair {
    /// Generate a new random keypair.
    pub fn generate() -> Self {
        Self::from_signing_key(SigningKey::random(&mut OsRng))
    }

    /// Create a keypair from a private scalar (32 bytes).
    pub fn from_private_key(bytes: &[u8; 32]) -> Result<Self, CryptoError> {
        let signing_key =
            SigningKey::from_slice(bytes).map_err(|_| CryptoError::InvalidPrivateKey)?;
        Ok(Self::from_signing_key(signing_key))
    }

    fn from_signing_key(signing_key: SigningKey) -> Self {
        let point = signing_key.verifying_key().to_encoded_point(false);
        let mut raw = [0u8; PUBLIC_KEY_LEN];
        // Skip the 0x04 SEC1 tag.
        raw.copy_from_slice(&point.as_bytes()[1..]);
        Self {
            signing_key,
            public_key: PublicKey(raw),
        }
    }

    /// Get the private key bytes.
    pub fn private_key(&self) -> [u8; 32] {
        let mut out = [0u8; 32];
        out.copy_from_slice(&self.signing_key.to_bytes());
        out
    }

    /// The account hash of this keypair's public key.
    pub fn account_hash(&self) -> Hash {
        self.public_key.account_hash()
    }

    /// Sign a digest.
    pub fn sign_hash(&self, digest: &Hash) -> Result<Signature, CryptoError> {
        let sig: EcdsaSignature = self
            .signing_key
            .sign_prehash(digest.as_bytes())
            .map_err(|_| CryptoError::InvalidSignature)?;
        let mut out = [0u8; SIGNATURE_LEN];
        out.copy_from_slice(&sig.to_bytes());
        Ok(Signature(out))
    }

    /// Verify a signature against our public key.
    pub fn verify_hash(&self, digest: &Hash, signature: &Signature) -> Result<(), CryptoError> {
        self.public_key.verify_hash(digest, signature)
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keypair")
            .field("account", &self.account_hash())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_and_verify() {
        let kp = Keypair::generate();
        let digest = hash(b"hello world");
        let sig = kp.sign_hash(&digest).unwrap();
        assert!(kp.verify_hash(&digest, &sig).is_ok());
    }

    #[test]
    fn test_wrong_digest_fails() {
        let kp = Keypair::generate();
        let sig = kp.sign_hash(&hash(b"hello")).unwrap();
        assert!(kp.verify_hash(&hash(b"world"), &sig).is_err());
    }

    #[test]
    fn test_wrong_key_fails() {
        let kp1 = Keypair::generate();
        let kp2 = Keypair::generate();
        let digest = hash(b"hello");
        let sig = kp1.sign_hash(&digest).unwrap();
        assert!(kp2.verify_hash(&digest, &sig).is_err());
    }

    #[test]
    fn test_zero_signature_rejected() {
        let kp = Keypair::generate();
        let result = kp.verify_hash(&hash(b"x"), &Signature::default());
        assert!(matches!(result, Err(CryptoError::InvalidSignature)));
    }

    #[test]
    fn test_invalid_public_key() {
        let key = PublicKey::default();
        let kp = Keypair::generate();
        let digest = hash(b"x");
        let sig = kp.sign_hash(&digest).unwrap();
        assert!(matches!(
            key.verify_hash(&digest, &sig),
            Err(CryptoError::InvalidPublicKey)
        ));
    }

    #[test]
    fn test_keypair_from_private_key() {
        let kp1 = Keypair::generate();
        let kp2 = Keypair::from_private_key(&kp1.private_key()).unwrap();
        assert_eq!(kp1.public_key, kp2.public_key);
        assert_eq!(kp1.account_hash(), kp2.account_hash());
    }

    #[test]
    fn test_invalid_private_key() {
        assert!(Keypair::from_private_key(&[0u8; 32]).is_err());
    }

    #[test]
    fn test_public_key_serde_roundtrip() {
        let kp = Keypair::generate();
        let json = serde_json::to_string(&kp.public_key).unwrap();
        let parsed: PublicKey = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, kp.public_key);
    }
}
