//! Claim requests and submission results.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{AccountId, EraIndex};

/// A single outstanding reward claim: pay out `validator` for `era`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClaimRequest {
    /// Validator stash whose era reward is unclaimed.
    pub validator: AccountId,
    /// Era the reward was earned in.
    pub era: EraIndex,
}

impl ClaimRequest {
    pub fn new(validator: AccountId, era: EraIndex) -> Self {
        Self { validator, era }
    }
}

impl fmt::Display for ClaimRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "staking.payout_stakers({}, {})", self.validator, self.era)
    }
}

/// Result of pushing one batch through the submitter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionOutcome {
    /// Position of the batch in the submission queue.
    pub batch_index: usize,
    /// Number of submission attempts made (at least 1).
    pub attempts: u32,
    /// Whether any attempt was accepted.
    pub success: bool,
    /// Last error reported, set only when every attempt failed.
    pub error_message: Option<String>,
    /// Nonce the batch was signed with.
    pub nonce: u64,
    /// Transaction hash reported by the node on success.
    pub tx_hash: Option<String>,
}

impl SubmissionOutcome {
    /// Outcome for a batch accepted on attempt `attempts`.
    pub fn succeeded(batch_index: usize, attempts: u32, nonce: u64, tx_hash: String) -> Self {
        Self {
            batch_index,
            attempts,
            success: true,
            error_message: None,
            nonce,
            tx_hash: Some(tx_hash),
        }
    }

    /// Outcome for a batch whose every attempt failed.
    pub fn failed(batch_index: usize, attempts: u32, nonce: u64, error: String) -> Self {
        Self {
            batch_index,
            attempts,
            success: false,
            error_message: Some(error),
            nonce,
            tx_hash: None,
        }
    }
}

/// Tally of a submission run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub total: usize,
}

impl RunSummary {
    /// Reduce an outcome list to counts.
    pub fn from_outcomes(outcomes: &[SubmissionOutcome]) -> Self {
        let succeeded = outcomes.iter().filter(|o| o.success).count();
        Self {
            succeeded,
            failed: outcomes.len() - succeeded,
            total: outcomes.len(),
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} succeeded, {} failed out of {} total",
            self.succeeded, self.failed, self.total
        )
    }
}
