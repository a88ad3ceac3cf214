//! Discovery of outstanding payouts.
//!
//! Resolves the input accounts into validator stashes, then checks every
//! (validator, era) pair of the window concurrently. Results are put back in
//! input order: validators as resolved, eras oldest first.

use std::sync::Arc;

use payouts_chain::ChainQuery;
use payouts_types::{AccountId, ClaimRequest};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::era::{check_offsets, compute_window};
use crate::oracle::ClaimOracle;
use crate::targets::resolve_targets;
use crate::{ConfigError, DiscoveryError};

/// Default bound on concurrent claim status lookups.
pub const DEFAULT_MAX_CONCURRENT_QUERIES: usize = 8;

/// Find every outstanding claim for `accounts` in the window given by
/// `depth` and `stop`.
///
/// # Errors
///
/// - [`DiscoveryError::InvalidConfig`] on negative offsets or zero
///   concurrency, before any chain query
/// - [`DiscoveryError::NoActivePeriod`] if the chain has no active era
/// - [`DiscoveryError::Chain`] if the active era cannot be read
pub async fn discover<C>(
    chain: Arc<C>,
    accounts: &[AccountId],
    depth: i64,
    stop: i64,
    max_concurrent: usize,
) -> Result<Vec<ClaimRequest>, DiscoveryError>
where
    C: ChainQuery + ?Sized + 'static,
{
    check_offsets(depth, stop)?;
    if max_concurrent == 0 {
        return Err(ConfigError::ZeroConcurrency.into());
    }

    let current = chain
        .current_era()
        .await?
        .ok_or(DiscoveryError::NoActivePeriod)?;
    let window = compute_window(current, depth, stop)?;
    debug!(current_era = current, %window, depth, stop, "era window computed");

    if window.is_empty() {
        info!("No payouts found");
        return Ok(Vec::new());
    }

    let validators = resolve_targets(chain.as_ref(), accounts).await;
    let pairs: Vec<ClaimRequest> = validators
        .iter()
        .flat_map(|v| window.eras().map(move |era| ClaimRequest::new(*v, era)))
        .collect();
    debug!(
        validators = validators.len(),
        pairs = pairs.len(),
        "checking claim status"
    );

    let oracle = Arc::new(ClaimOracle::new(chain));
    let permits = Arc::new(Semaphore::new(max_concurrent));
    let mut tasks = JoinSet::new();
    for (index, request) in pairs.iter().copied().enumerate() {
        let oracle = Arc::clone(&oracle);
        let permits = Arc::clone(&permits);
        tasks.spawn(async move {
            let _permit = permits.acquire_owned().await;
            let outstanding = oracle
                .is_claim_outstanding(&request.validator, request.era)
                .await;
            (index, outstanding)
        });
    }

    let mut outstanding = vec![false; pairs.len()];
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, found)) => {
                if let Some(slot) = outstanding.get_mut(index) {
                    *slot = found;
                }
            }
            Err(e) => warn!(error = %e, "claim status task failed"),
        }
    }

    let found: Vec<ClaimRequest> = pairs
        .into_iter()
        .zip(outstanding)
        .filter_map(|(request, outstanding)| outstanding.then_some(request))
        .collect();

    if found.is_empty() {
        info!("No payouts found");
    } else {
        for request in &found {
            info!("{request}");
        }
        info!(count = found.len(), "unclaimed payouts found");
    }
    Ok(found)
}
