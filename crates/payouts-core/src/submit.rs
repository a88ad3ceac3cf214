//! Sequential signing and submission of batches.
//!
//! The funding account's next index is read once. Each batch is then signed
//! at the current nonce and retried with that same nonce; the nonce moves on
//! by exactly one per batch whether or not the batch got through, so a run
//! over `N` batches always consumes `N` consecutive nonces.

use std::time::Duration;

use payouts_chain::{Call, TxSubmitter};
use payouts_crypto::Signer;
use payouts_types::{RunSummary, SubmissionOutcome};
use tracing::{info, warn};

use crate::batch::Batch;
use crate::SubmitSetupError;

/// Default number of retries after a failed attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 1;

/// Retry behaviour for one batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubmitPolicy {
    /// Extra attempts after the first.
    pub max_retries: u32,
    /// Pause between attempts of the same batch.
    pub retry_delay: Duration,
}

impl Default for SubmitPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: Duration::ZERO,
        }
    }
}

impl SubmitPolicy {
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

/// Submit `batches` in order, one outcome per batch.
///
/// Batch failures are recorded in the outcomes and never stop the run.
///
/// # Errors
///
/// - [`SubmitSetupError::NonceLookup`] if the starting nonce cannot be read.
///   Nothing has been broadcast in that case.
pub async fn submit<S>(
    submitter: &S,
    signer: &Signer,
    batches: &[Batch],
    policy: &SubmitPolicy,
) -> Result<Vec<SubmissionOutcome>, SubmitSetupError>
where
    S: TxSubmitter + ?Sized,
{
    let account = signer.account();
    let mut nonce = submitter
        .next_index(&account)
        .await
        .map_err(|source| SubmitSetupError::NonceLookup { account, source })?;

    info!(
        account = %account,
        start_nonce = nonce,
        batches = batches.len(),
        "submitting payout batches"
    );

    let mut outcomes = Vec::with_capacity(batches.len());
    for (index, batch) in batches.iter().enumerate() {
        let call = batch.to_call();
        outcomes.push(submit_batch(submitter, signer, index, &call, nonce, policy).await);
        nonce = nonce.saturating_add(1);
    }

    let summary = RunSummary::from_outcomes(&outcomes);
    info!("Transaction summary: {summary}");
    if summary.failed > 0 {
        warn!(
            failed = summary.failed,
            total = summary.total,
            "some payout batches failed; their claims stay outstanding for the next run"
        );
    }

    Ok(outcomes)
}

async fn submit_batch<S>(
    submitter: &S,
    signer: &Signer,
    index: usize,
    call: &Call,
    nonce: u64,
    policy: &SubmitPolicy,
) -> SubmissionOutcome
where
    S: TxSubmitter + ?Sized,
{
    let max_attempts = policy.max_attempts();
    let mut last_error = String::new();

    for attempt in 1..=max_attempts {
        match submitter.sign_and_submit(call, signer, nonce).await {
            Ok(receipt) => {
                info!(
                    batch = index,
                    nonce,
                    attempt,
                    claims = call.call_count(),
                    tx_hash = %receipt.tx_hash,
                    "batch submitted"
                );
                return SubmissionOutcome::succeeded(index, attempt, nonce, receipt.tx_hash);
            }
            Err(e) => {
                warn!(
                    batch = index,
                    nonce,
                    attempt,
                    max_attempts,
                    error = %e,
                    "batch submission failed"
                );
                last_error = e.to_string();
                if attempt < max_attempts && !policy.retry_delay.is_zero() {
                    tokio::time::sleep(policy.retry_delay).await;
                }
            }
        }
    }

    SubmissionOutcome::failed(index, max_attempts, nonce, last_error)
}
