//! # payouts-types
//!
//! Shared domain types used across the staking payouts workspace.
//!
//! ## Modules
//!
//! - [`account`] — Opaque 32-byte chain account identifiers (hex and SS58)
//! - [`era`] — Era indices and half-open era windows
//! - [`claim`] — Claim requests, submission outcomes and run summaries

pub mod account;
pub mod claim;
pub mod era;

pub use account::AccountId;
pub use claim::{ClaimRequest, RunSummary, SubmissionOutcome};
pub use era::{EraIndex, EraWindow};

/// Length in bytes of an [`AccountId`].
pub const ACCOUNT_ID_LEN: usize = 32;

/// Commission values are stored in parts per billion.
pub const PERBILL_PER_PERCENT: u32 = 10_000_000;

/// Error types for parsing domain values.
#[derive(Debug, thiserror::Error)]
pub enum TypesError {
    /// The account string is not valid hex.
    #[error("invalid account hex: {0}")]
    InvalidHex(String),

    /// The account string is not a valid SS58 address.
    #[error("invalid ss58 address: {0}")]
    InvalidAddress(String),

    /// The decoded account has the wrong length.
    #[error("invalid account length: expected {expected}, got {actual}")]
    InvalidLength {
        /// Expected number of bytes.
        expected: usize,
        /// Actual number of bytes.
        actual: usize,
    },
}
