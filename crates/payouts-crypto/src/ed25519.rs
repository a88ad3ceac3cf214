//! Ed25519 signing and verification (RFC 8032).
//!
//! This module wraps `ed25519-dalek` with workspace types. The funding
//! account's key is held by a [`Signer`], whose public key doubles as the
//! account's [`AccountId`].

use ed25519_dalek::{Signer as _, Verifier};
use payouts_types::AccountId;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::{CryptoError, Result};

/// Length of an Ed25519 seed in bytes.
pub const SEED_LEN: usize = 32;

/// Private half of the funding key. The dalek key wipes itself on drop.
#[derive(Clone)]
pub struct SigningKey {
    inner: ed25519_dalek::SigningKey,
}

/// An Ed25519 verification key (public key).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyingKey {
    inner: ed25519_dalek::VerifyingKey,
}

/// An Ed25519 signature.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    inner: ed25519_dalek::Signature,
}

impl SigningKey {
    pub fn from_seed(bytes: &[u8; SEED_LEN]) -> Self {
        Self {
            inner: ed25519_dalek::SigningKey::from_bytes(bytes),
        }
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        VerifyingKey {
            inner: self.inner.verifying_key(),
        }
    }

    /// Sign a message.
    pub fn sign(&self, message: &[u8]) -> Signature {
        Signature {
            inner: self.inner.sign(message),
        }
    }
}

impl VerifyingKey {
    /// Interpret an account id as a public key.
    ///
    /// # Errors
    ///
    /// [`CryptoError::InvalidInput`] if the bytes are not a curve point.
    pub fn from_account(account: &AccountId) -> Result<Self> {
        let inner = ed25519_dalek::VerifyingKey::from_bytes(account.as_bytes())
            .map_err(|e| CryptoError::InvalidInput(e.to_string()))?;
        Ok(Self { inner })
    }

    pub fn to_account(&self) -> AccountId {
        AccountId::new(self.inner.to_bytes())
    }

    pub fn verify(&self, message: &[u8], signature: &Signature) -> Result<()> {
        self.inner
            .verify(message, &signature.inner)
            .map_err(|_| CryptoError::SignatureVerification)
    }
}

impl Signature {
    pub fn from_bytes(bytes: &[u8; 64]) -> Self {
        Self {
            inner: ed25519_dalek::Signature::from_bytes(bytes),
        }
    }

    pub fn to_bytes(&self) -> [u8; 64] {
        self.inner.to_bytes()
    }
}

/// Signing capability of the funding account.
///
/// Pays for and signs every submitted transaction. The account id is the
/// Ed25519 public key.
#[derive(Clone)]
pub struct Signer {
    key: SigningKey,
    account: AccountId,
}

impl Signer {
    /// Build a signer from a raw 32-byte seed.
    pub fn from_seed(seed: &[u8; SEED_LEN]) -> Self {
        let key = SigningKey::from_seed(seed);
        let account = key.verifying_key().to_account();
        Self { key, account }
    }

    /// Build a signer from a hex seed, as stored in a key file.
    ///
    /// Surrounding whitespace and an optional `0x` prefix are accepted.
    ///
    /// # Errors
    ///
    /// - [`CryptoError::InvalidInput`] if the seed is not hex
    /// - [`CryptoError::InvalidKeyLength`] if it does not decode to 32 bytes
    pub fn from_seed_hex(seed_hex: &str) -> Result<Self> {
        let trimmed = seed_hex.trim();
        let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        let bytes = Zeroizing::new(
            hex::decode(digits).map_err(|e| CryptoError::InvalidInput(e.to_string()))?,
        );
        if bytes.len() != SEED_LEN {
            return Err(CryptoError::InvalidKeyLength {
                expected: SEED_LEN,
                actual: bytes.len(),
            });
        }
        let mut seed = Zeroizing::new([0u8; SEED_LEN]);
        seed.copy_from_slice(&bytes);
        Ok(Self::from_seed(&seed))
    }

    /// The funding account this signer pays from.
    pub fn account(&self) -> AccountId {
        self.account
    }

    /// Sign a message with the funding key.
    pub fn sign(&self, message: &[u8]) -> Signature {
        self.key.sign(message)
    }
}

impl std::fmt::Debug for Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signer")
            .field("account", &self.account)
            .finish()
    }
}
