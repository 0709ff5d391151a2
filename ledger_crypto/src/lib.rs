//! Deterministic hashing and `Ed25519` signing primitives.
//!
//! The ledger core treats signature *verification verdicts* as something
//! supplied by a collaborator, but it still needs a concrete, bit-for-bit
//! reproducible hash function for blocks and transactions, and a concrete
//! keypair type for test fixtures and the key-management surface in `§6`.
//! This crate is that minimal, self-contained implementation.

#![allow(clippy::module_name_repetitions)]

use std::{cmp::Ordering, fmt, hash::Hash as StdHash, marker::PhantomData};

use blake2::{digest::consts::U32, Blake2b, Digest};
use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};

type Blake2b256 = Blake2b<U32>;

/// Length in bytes of a [`Hash`], a [`PublicKey`], and an `Ed25519` seed.
pub const HASH_LENGTH: usize = 32;

/// A raw 32-byte digest, canonical and content-addressed.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, StdHash, Serialize, Deserialize)]
pub struct Hash(pub [u8; HASH_LENGTH]);

impl Hash {
    /// The all-zero hash, used as the `prev_hash` of the genesis block and
    /// as the pager's "start from newest" cursor sentinel.
    pub const ZERO: Hash = Hash([0_u8; HASH_LENGTH]);

    /// Hashes `bytes` with BLAKE2b-256.
    #[must_use]
    pub fn new(bytes: &[u8]) -> Self {
        let mut hasher = Blake2b256::new();
        hasher.update(bytes);
        let digest = hasher.finalize();
        let mut out = [0_u8; HASH_LENGTH];
        out.copy_from_slice(&digest);
        Self(out)
    }

    /// Returns the hash's bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; HASH_LENGTH] {
        &self.0
    }

    /// `true` if this is the [`Hash::ZERO`] sentinel.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == [0_u8; HASH_LENGTH]
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// A [`Hash`] tagged with the type it was computed over, so a block hash
/// and a transaction hash can't be confused at the type level even though
/// both are 32 bytes underneath.
pub struct HashOf<T>(Hash, PhantomData<fn() -> T>);

impl<T> HashOf<T> {
    /// Wraps a raw [`Hash`] as the hash of `T`.
    #[must_use]
    pub fn from_hash(hash: Hash) -> Self {
        Self(hash, PhantomData)
    }

    /// The untyped [`Hash`] underneath.
    #[must_use]
    pub fn into_hash(self) -> Hash {
        self.0
    }
}

impl<T> Clone for HashOf<T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T> Copy for HashOf<T> {}
impl<T> PartialEq for HashOf<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}
impl<T> Eq for HashOf<T> {}
impl<T> PartialOrd for HashOf<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl<T> Ord for HashOf<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}
impl<T> StdHash for HashOf<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}
impl<T> fmt::Debug for HashOf<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
impl<T> fmt::Display for HashOf<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Hashes a value by its canonical JSON encoding.
///
/// # Errors
/// Fails if `value` cannot be serialized, which should never happen for the
/// plain-data types this core hashes.
pub fn hash_of<T: Serialize>(value: &T) -> Result<HashOf<T>, serde_json::Error> {
    let bytes = serde_json::to_vec(value)?;
    Ok(HashOf::from_hash(Hash::new(&bytes)))
}

/// An `Ed25519` public key.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, StdHash, Serialize, Deserialize)]
pub struct PublicKey(pub [u8; HASH_LENGTH]);

impl PublicKey {
    /// The all-zero public key, used by `create_account` to mean "no
    /// initial signatory".
    pub const ZERO: PublicKey = PublicKey([0_u8; HASH_LENGTH]);

    /// `true` if this is the [`PublicKey::ZERO`] sentinel.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == [0_u8; HASH_LENGTH]
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ed25519:{}", hex::encode(self.0))
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// An `Ed25519` signature over a 32-byte hash.
#[derive(Clone, Copy, Serialize, Deserialize)]
pub struct Signature(#[serde(with = "serde_bytes64")] pub [u8; 64]);

mod serde_bytes64 {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8; 64], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<[u8; 64], D::Error> {
        let hexed = String::deserialize(d)?;
        let bytes = hex::decode(hexed).map_err(serde::de::Error::custom)?;
        bytes
            .try_into()
            .map_err(|_| serde::de::Error::custom("expected 64-byte signature"))
    }
}

/// An `Ed25519` keypair, used for signing genesis transactions and in test
/// fixtures.
pub struct KeyPair {
    signing_key: SigningKey,
    public_key: PublicKey,
}

/// Errors produced while loading or generating a [`KeyPair`].
#[derive(Debug, thiserror::Error, displaydoc::Display)]
pub enum Error {
    /// seed must be exactly 32 bytes, got {0}
    BadSeedLength(usize),
    /// signature verification failed
    BadSignature,
}

impl KeyPair {
    /// Generates a fresh keypair from the OS RNG.
    #[must_use]
    pub fn generate() -> Self {
        let mut rng = rand::rngs::OsRng;
        let signing_key = SigningKey::generate(&mut rng);
        Self::from_signing_key(signing_key)
    }

    /// Derives a keypair deterministically from a 32-byte seed, e.g. one
    /// derived from a passphrase by the key-management collaborator.
    ///
    /// # Errors
    /// Fails if `seed` is not exactly 32 bytes.
    pub fn from_seed(seed: &[u8]) -> Result<Self, Error> {
        let seed: [u8; 32] = seed
            .try_into()
            .map_err(|_| Error::BadSeedLength(seed.len()))?;
        Ok(Self::from_signing_key(SigningKey::from_bytes(&seed)))
    }

    fn from_signing_key(signing_key: SigningKey) -> Self {
        let public_key = PublicKey(signing_key.verifying_key().to_bytes());
        Self {
            signing_key,
            public_key,
        }
    }

    /// The public half of this keypair.
    #[must_use]
    pub fn public_key(&self) -> PublicKey {
        self.public_key
    }

    /// Signs `hash`.
    #[must_use]
    pub fn sign(&self, hash: &Hash) -> Signature {
        Signature(self.signing_key.sign(&hash.0).to_bytes())
    }
}

/// Verifies that `signature` over `hash` was produced by `public_key`.
///
/// # Errors
/// Returns [`Error::BadSignature`] if the signature does not verify.
pub fn verify(public_key: &PublicKey, hash: &Hash, signature: &Signature) -> Result<(), Error> {
    let verifying_key =
        VerifyingKey::from_bytes(&public_key.0).map_err(|_| Error::BadSignature)?;
    let sig = ed25519_dalek::Signature::from_bytes(&signature.0);
    verifying_key
        .verify(&hash.0, &sig)
        .map_err(|_| Error::BadSignature)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic() {
        assert_eq!(Hash::new(b"abc"), Hash::new(b"abc"));
        assert_ne!(Hash::new(b"abc"), Hash::new(b"abd"));
    }

    #[test]
    fn zero_hash_is_zero() {
        assert!(Hash::ZERO.is_zero());
        assert!(!Hash::new(b"x").is_zero());
    }

    #[test]
    fn sign_and_verify_roundtrip() {
        let keys = KeyPair::generate();
        let hash = Hash::new(b"payload");
        let sig = keys.sign(&hash);
        assert!(verify(&keys.public_key(), &hash, &sig).is_ok());
    }

    #[test]
    fn verify_rejects_tampered_hash() {
        let keys = KeyPair::generate();
        let hash = Hash::new(b"payload");
        let sig = keys.sign(&hash);
        let other = Hash::new(b"different");
        assert!(verify(&keys.public_key(), &other, &sig).is_err());
    }

    #[test]
    fn from_seed_is_deterministic() {
        let seed = [7_u8; 32];
        let a = KeyPair::from_seed(&seed).unwrap();
        let b = KeyPair::from_seed(&seed).unwrap();
        assert_eq!(a.public_key(), b.public_key());
    }
}
