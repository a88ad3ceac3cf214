//! # payouts-reports
//!
//! Read-only staking reports.
//!
//! ## Modules
//!
//! - [`nominators`] — Nominators of given validators, by bonded weight
//! - [`commission`] — Commission distribution across all validators

pub mod commission;
pub mod nominators;

use payouts_chain::ChainError;

pub use commission::{commission_report, CommissionReport};
pub use nominators::{nominators_by_weight, NominatorWeight, StashNominators};

/// Error types for report generation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReportError {
    /// A record the report depends on is missing on chain.
    #[error("not found: {0}")]
    NotFound(String),

    /// The chain has no active era.
    #[error("no active era")]
    NoActivePeriod,

    /// There are no registered validators to report on.
    #[error("no validators registered")]
    NoValidators,

    /// Threshold outside 0..=100.
    #[error("commission threshold must be between 0 and 100, got {0}")]
    InvalidPercent(u32),

    #[error(transparent)]
    Chain(ChainError),
}

impl From<ChainError> for ReportError {
    fn from(err: ChainError) -> Self {
        match err {
            ChainError::NotFound(what) => Self::NotFound(what),
            other => Self::Chain(other),
        }
    }
}

/// Convenience result type for reports.
pub type Result<T> = std::result::Result<T, ReportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_lifted() {
        let err: ReportError = ChainError::NotFound("ledger of 0x01".into()).into();
        assert_eq!(err, ReportError::NotFound("ledger of 0x01".into()));
        let err: ReportError = ChainError::Timeout(5).into();
        assert_eq!(err.to_string(), "request timed out after 5s");
    }
}
