//! Cryptographic primitives for Box Office.
//!
//! Provides three things:
//!   1. BLAKE3 hashing: transaction ids and read/write set digests
//!   2. X25519 keypairs: long-term identities of enrolled users and peers
//!   3. Keyed BLAKE3 tags: endorsement signatures in the simulated network
//!
//! All key material derives ZeroizeOnDrop and is wiped from memory when dropped.

use rand::RngCore;
use thiserror::Error;
use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// Length of the random nonce mixed into every transaction id.
pub const NONCE_LEN: usize = 24;

// ── BLAKE3 ────────────────────────────────────────────────────────────────────

/// Incremental BLAKE3 hasher for digests built from several fields.
pub struct Hasher(blake3::Hasher);

impl Hasher {
    pub fn new() -> Self {
        Self(blake3::Hasher::new())
    }

    pub fn update(&mut self, data: &[u8]) {
        self.0.update(data);
    }

    /// Feed a length-prefixed field so adjacent fields cannot run together.
    pub fn update_field(&mut self, data: &[u8]) {
        self.0.update(&(data.len() as u64).to_le_bytes());
        self.0.update(data);
    }

    pub fn finalize(self) -> [u8; 32] {
        *self.0.finalize().as_bytes()
    }
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new()
    }
}

/// Generate a cryptographically random nonce for a new transaction.
pub fn generate_nonce() -> [u8; NONCE_LEN] {
    let mut nonce = [0u8; NONCE_LEN];
    rand::thread_rng().fill_bytes(&mut nonce);
    nonce
}

/// Derive a transaction id from the proposal nonce and the creator's key.
///
///   tx_id = BLAKE3(nonce || creator_public_key)
///
/// A fresh nonce per attempt makes the id unique per attempt.
pub fn transaction_id(nonce: &[u8; NONCE_LEN], creator: &[u8; 32]) -> [u8; 32] {
    let mut h = Hasher::new();
    h.update(nonce);
    h.update(creator);
    h.finalize()
}

// ── Keypair ───────────────────────────────────────────────────────────────────

/// A long-term X25519 keypair.
///
/// Enrolled users hold one in the credential store; simulated peers hold one
/// to tag their endorsements. The private key never leaves this struct except
/// through `private_bytes` for persistence.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct Keypair {
    private: Zeroizing<[u8; 32]>,
    pub public: [u8; 32],
}

impl Keypair {
    /// Generate a new random keypair.
    pub fn generate() -> Self {
        let secret = StaticSecret::random_from_rng(rand::thread_rng());
        let public = PublicKey::from(&secret);
        Self {
            private: Zeroizing::new(secret.to_bytes()),
            public: *public.as_bytes(),
        }
    }

    /// Reconstruct a keypair from stored private key bytes.
    /// The public key is derived deterministically from the private key.
    pub fn from_private(private_bytes: [u8; 32]) -> Self {
        let secret = StaticSecret::from(private_bytes);
        let public = PublicKey::from(&secret);
        Self {
            private: Zeroizing::new(private_bytes),
            public: *public.as_bytes(),
        }
    }

    /// Reconstruct a keypair from a hex-encoded private key.
    pub fn from_private_hex(hex_str: &str) -> Result<Self, CryptoError> {
        let bytes = Zeroizing::new(hex::decode(hex_str.trim()).map_err(|_| CryptoError::BadHex)?);
        if bytes.len() != 32 {
            return Err(CryptoError::BadKeyLength(bytes.len()));
        }
        let mut private = [0u8; 32];
        private.copy_from_slice(&bytes);
        let keypair = Self::from_private(private);
        private.zeroize();
        Ok(keypair)
    }

    /// Serialize the private key for persistent storage.
    ///
    /// Store these bytes securely (mode 0600). The public key need not be
    /// stored; it is always derived on load.
    pub fn private_bytes(&self) -> Zeroizing<[u8; 32]> {
        Zeroizing::new(*self.private)
    }

    pub fn public_hex(&self) -> String {
        hex::encode(self.public)
    }

    /// Tag `data` with a keyed BLAKE3 MAC under this keypair's private key.
    pub fn sign(&self, data: &[u8]) -> [u8; 32] {
        *blake3::keyed_hash(&self.private, data).as_bytes()
    }

    /// Constant-time check of a tag produced by `sign`.
    pub fn verify(&self, data: &[u8], tag: &[u8]) -> bool {
        let Ok(tag) = <[u8; 32]>::try_from(tag) else {
            return false;
        };
        blake3::keyed_hash(&self.private, data) == blake3::Hash::from(tag)
    }
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("key material is not valid hex")]
    BadHex,

    #[error("private key must be 32 bytes, got {0}")]
    BadKeyLength(usize),
}

// ── Tests ─────────────────────────────────────────────────────────────────────
