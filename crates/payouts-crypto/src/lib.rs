//! # payouts-crypto
//!
//! Signing and hashing primitives for the funding account.
//!
//! ## Modules
//!
//! - [`blake3`] — Domain-separated BLAKE3 hashing for transaction payloads
//! - [`ed25519`] — Ed25519 keys and signatures, plus the funding-account [`Signer`]

pub mod blake3;
pub mod ed25519;

pub use ed25519::Signer;

/// Error types for cryptographic operations.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// Ed25519 signature verification failed.
    #[error("signature verification failed")]
    SignatureVerification,

    /// Invalid key length.
    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    /// Invalid input data.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, CryptoError>;
