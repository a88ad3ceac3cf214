//! Claim status checks.
//!
//! A (validator, era) reward is outstanding when no page of it has been
//! paid, the validator was exposed in that era, and it earned reward points.
//! Query failures count as "not outstanding" so one bad lookup never stops
//! a discovery run.

use std::collections::HashMap;
use std::sync::Arc;

use payouts_chain::{ChainError, ChainQuery, RewardPoints};
use payouts_types::{AccountId, EraIndex};
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, warn};

/// Answers whether a reward claim is outstanding.
///
/// Era reward points are fetched once per era and reused for the lifetime of
/// the oracle. Failed fetches are not cached. Fetches for different eras run
/// independently; checks on the same era wait for the one fetch in flight.
pub struct ClaimOracle<C: ?Sized> {
    chain: Arc<C>,
    points: Mutex<HashMap<EraIndex, Arc<PointsCell>>>,
}

type PointsCell = OnceCell<Arc<RewardPoints>>;

impl<C> ClaimOracle<C>
where
    C: ChainQuery + ?Sized,
{
    pub fn new(chain: Arc<C>) -> Self {
        Self {
            chain,
            points: Mutex::new(HashMap::new()),
        }
    }

    /// Whether `validator`'s reward for `era` can still be claimed.
    pub async fn is_claim_outstanding(&self, validator: &AccountId, era: EraIndex) -> bool {
        match self.check(validator, era).await {
            Ok(outstanding) => outstanding,
            Err(e) => {
                warn!(
                    validator = %validator,
                    era,
                    error = %e,
                    "claim status lookup failed, treating as not outstanding"
                );
                false
            }
        }
    }

    async fn check(&self, validator: &AccountId, era: EraIndex) -> Result<bool, ChainError> {
        let claimed = self.chain.claimed_rewards(era, validator).await?;
        if !claimed.is_empty() {
            debug!(validator = %validator, era, pages = ?claimed, "already claimed");
            return Ok(false);
        }

        if self.chain.stakers_overview(era, validator).await?.is_none() {
            debug!(validator = %validator, era, "not exposed in era");
            return Ok(false);
        }

        let points = self.era_points(era).await?;
        Ok(points.has_points(validator))
    }

    async fn era_points(&self, era: EraIndex) -> Result<Arc<RewardPoints>, ChainError> {
        // The map lock only guards the cell lookup, never the fetch.
        let cell = {
            let mut cells = self.points.lock().await;
            Arc::clone(cells.entry(era).or_default())
        };
        let points = cell
            .get_or_try_init(|| async {
                debug!(era, "fetching era reward points");
                self.chain.reward_points(era).await.map(Arc::new)
            })
            .await?;
        Ok(Arc::clone(points))
    }
}
