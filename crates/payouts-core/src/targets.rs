//! Resolution of input accounts into validator stashes.
//!
//! A nominator stands for the validators it backs; any other account stands
//! for itself. Candidates that are not bonded stashes are dropped.

use payouts_chain::ChainQuery;
use payouts_types::AccountId;
use tracing::{debug, warn};

/// Expand `accounts` into the validator stashes to check.
///
/// Order follows the inputs, with a nominator's targets in stored order.
/// Duplicates are kept. Accounts whose lookups fail are skipped with a
/// warning.
pub async fn resolve_targets<C>(chain: &C, accounts: &[AccountId]) -> Vec<AccountId>
where
    C: ChainQuery + ?Sized,
{
    let mut candidates = Vec::with_capacity(accounts.len());
    for account in accounts {
        match chain.nominations(account).await {
            Ok(Some(targets)) => {
                debug!(
                    nominator = %account,
                    targets = targets.len(),
                    "nominator detected, adding its targets"
                );
                candidates.extend(targets);
            }
            Ok(None) => {
                debug!(validator = %account, "validator detected");
                candidates.push(*account);
            }
            Err(e) => {
                warn!(account = %account, error = %e, "nominations lookup failed, skipping account");
            }
        }
    }

    let mut stashes = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        match chain.bonded(&candidate).await {
            Ok(Some(_controller)) => stashes.push(candidate),
            Ok(None) => warn!(account = %candidate, "not a valid stash address, skipping"),
            Err(e) => {
                warn!(account = %candidate, error = %e, "bonded lookup failed, skipping account");
            }
        }
    }
    stashes
}
