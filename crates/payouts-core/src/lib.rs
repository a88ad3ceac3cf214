//! # payouts-core
//!
//! Payout discovery and batched submission.
//!
//! A run resolves the input accounts into validator stashes, finds every
//! unclaimed (validator, era) reward in the configured era window, groups
//! the claims into bounded batches, and submits them one after another from
//! a single funding account with gap-free nonces and bounded retry.
//!
//! ## Modules
//!
//! - [`era`] — Era window arithmetic
//! - [`targets`] — Nominator to validator resolution
//! - [`oracle`] — Claim status checks
//! - [`discover`] — Concurrent discovery of outstanding claims
//! - [`batch`] — Grouping claims into transactions
//! - [`submit`] — Sequential submission with retry

pub mod batch;
pub mod discover;
pub mod era;
pub mod oracle;
pub mod submit;
pub mod targets;

#[cfg(test)]
mod testing;

use std::num::NonZeroUsize;
use std::sync::Arc;

use payouts_chain::{ChainError, ChainQuery, TxSubmitter};
use payouts_crypto::Signer;
use payouts_types::{AccountId, ClaimRequest, RunSummary, SubmissionOutcome};
use tracing::info;

pub use batch::{build_batches, Batch, DEFAULT_MAX_CALLS};
pub use discover::{discover, DEFAULT_MAX_CONCURRENT_QUERIES};
pub use era::{compute_window, DEFAULT_ERA_DEPTH, DEFAULT_ERA_STOP};
pub use oracle::ClaimOracle;
pub use submit::{submit, SubmitPolicy, DEFAULT_MAX_RETRIES};
pub use targets::resolve_targets;

/// Invalid run parameters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("era depth must be >= 0, got {0}")]
    NegativeDepth(i64),

    #[error("era stop must be >= 0, got {0}")]
    NegativeStop(i64),

    #[error("max calls per batch must be >= 1")]
    ZeroMaxCalls,

    #[error("max concurrent queries must be >= 1")]
    ZeroConcurrency,
}

/// Failure to produce the list of outstanding claims.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DiscoveryError {
    /// The chain reports no active era, so no window can be computed.
    #[error("no active era, pending payouts could not be fetched")]
    NoActivePeriod,

    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    /// The active era could not be read.
    #[error("chain query failed: {0}")]
    Chain(#[from] ChainError),
}

/// Failure before any batch was broadcast.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmitSetupError {
    #[error("could not read next nonce of {account}: {source}")]
    NonceLookup {
        account: AccountId,
        #[source]
        source: ChainError,
    },
}

/// Fatal failure of a collect run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PayoutError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error(transparent)]
    Submit(#[from] SubmitSetupError),
}

/// Parameters of a collect run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PayoutParams {
    /// Validator or nominator stashes to collect for.
    pub accounts: Vec<AccountId>,
    pub era_depth: i64,
    pub era_stop: i64,
    pub max_calls: NonZeroUsize,
    pub max_concurrent_queries: usize,
    pub policy: SubmitPolicy,
}

impl PayoutParams {
    /// Parameters with every knob at its default.
    pub fn new(accounts: Vec<AccountId>) -> Self {
        Self {
            accounts,
            era_depth: DEFAULT_ERA_DEPTH,
            era_stop: DEFAULT_ERA_STOP,
            max_calls: DEFAULT_MAX_CALLS,
            max_concurrent_queries: DEFAULT_MAX_CONCURRENT_QUERIES,
            policy: SubmitPolicy::default(),
        }
    }

    /// Reject parameters that would make the run meaningless.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        era::check_offsets(self.era_depth, self.era_stop)?;
        if self.max_concurrent_queries == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        Ok(())
    }
}

/// What a collect run found and did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CollectReport {
    /// Outstanding claims found, in submission order.
    pub claims: Vec<ClaimRequest>,
    /// Number of batches built from `claims`.
    pub batches: usize,
    /// One outcome per batch.
    pub outcomes: Vec<SubmissionOutcome>,
    pub summary: RunSummary,
}

impl CollectReport {
    /// Whether the run found nothing to claim.
    pub fn nothing_to_claim(&self) -> bool {
        self.claims.is_empty()
    }
}

/// Discover outstanding claims and submit them in batches.
///
/// Failed batches are reported in the returned outcomes; only problems that
/// prevent the run as a whole are errors.
///
/// # Errors
///
/// - [`PayoutError::Config`] for invalid parameters
/// - [`PayoutError::Discovery`] if discovery cannot run
/// - [`PayoutError::Submit`] if the funding account's nonce cannot be read
pub async fn collect_payouts<C>(
    chain: Arc<C>,
    signer: &Signer,
    params: &PayoutParams,
) -> Result<CollectReport, PayoutError>
where
    C: ChainQuery + TxSubmitter + 'static,
{
    params.validate()?;

    let claims = discover(
        Arc::clone(&chain),
        &params.accounts,
        params.era_depth,
        params.era_stop,
        params.max_concurrent_queries,
    )
    .await?;

    if claims.is_empty() {
        info!("No payouts to claim");
        return Ok(CollectReport::default());
    }

    let batches = build_batches(&claims, params.max_calls);
    info!(
        claims = claims.len(),
        batches = batches.len(),
        max_calls = params.max_calls.get(),
        "claims grouped into batches"
    );

    let outcomes = submit(chain.as_ref(), signer, &batches, &params.policy).await?;
    let summary = RunSummary::from_outcomes(&outcomes);

    Ok(CollectReport {
        claims,
        batches: batches.len(),
        outcomes,
        summary,
    })
}

/// Outstanding claims for `accounts`, without submitting anything.
///
/// # Errors
///
/// See [`discover`].
pub async fn list_pending_payouts<C>(
    chain: Arc<C>,
    accounts: &[AccountId],
    depth: i64,
    stop: i64,
    max_concurrent: usize,
) -> Result<Vec<ClaimRequest>, DiscoveryError>
where
    C: ChainQuery + ?Sized + 'static,
{
    let pending = discover(chain, accounts, depth, stop, max_concurrent).await?;
    info!(count = pending.len(), "pending payouts listed");
    Ok(pending)
}

#[cfg(test)]
mod tests {
    use super::*;
    use payouts_chain::{ChainState, MemoryChain, ValidatorPrefs};

    fn id(b: u8) -> AccountId {
        AccountId::new([b; 32])
    }

    fn chain_with_unclaimed(validators: u8) -> Arc<MemoryChain> {
        let mut state = ChainState::default().with_current_era(100);
        for v in 1..=validators {
            state
                .add_validator(id(v), ValidatorPrefs::default())
                .set_unclaimed(99, id(v), 10);
        }
        Arc::new(MemoryChain::new(state))
    }

    #[tokio::test]
    async fn test_collect_claims_everything() {
        let chain = chain_with_unclaimed(4);
        let signer = Signer::from_seed(&[8; 32]);
        let params = PayoutParams::new((1..=4).map(id).collect());

        let report = collect_payouts(Arc::clone(&chain), &signer, &params)
            .await
            .expect("collect");
        assert_eq!(report.claims.len(), 4);
        assert_eq!(report.batches, 2);
        assert_eq!(report.summary.to_string(), "2 succeeded, 0 failed out of 2 total");

        let state = chain.snapshot().await;
        assert!((1..=4).all(|v| !state.is_unclaimed(99, &id(v))));

        // A second run finds nothing left.
        let again = collect_payouts(chain, &signer, &params)
            .await
            .expect("collect");
        assert!(again.nothing_to_claim());
        assert_eq!(again.summary, RunSummary::default());
    }

    #[tokio::test]
    async fn test_collect_rejects_bad_params_first() {
        let chain = chain_with_unclaimed(1);
        let mut params = PayoutParams::new(vec![id(1)]);
        params.era_stop = -1;
        let err = collect_payouts(Arc::clone(&chain), &Signer::from_seed(&[8; 32]), &params)
            .await
            .expect_err("config error");
        assert_eq!(err, PayoutError::Config(ConfigError::NegativeStop(-1)));
        assert_eq!(chain.query_count(), 0);
    }

    #[tokio::test]
    async fn test_list_pending_does_not_submit() {
        let chain = chain_with_unclaimed(2);
        let pending = list_pending_payouts(Arc::clone(&chain), &[id(1), id(2)], 0, 1, 4)
            .await
            .expect("list");
        assert_eq!(pending.len(), 2);
        assert!(chain.attempts().await.is_empty());
    }

    #[test]
    fn test_default_params() {
        let params = PayoutParams::new(vec![]);
        assert_eq!(params.era_depth, 0);
        assert_eq!(params.era_stop, 1);
        assert_eq!(params.max_calls.get(), 3);
        assert_eq!(params.policy.max_retries, 1);
        assert!(params.validate().is_ok());
    }
}
