//! Chain wrapper with per-query latency, for concurrency tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use payouts_chain::{
    ChainQuery, Exposure, MemoryChain, NominatorEntry, Result, RewardPoints, StakeOverview,
    StakingLedger, ValidatorEntry,
};
use payouts_types::{AccountId, EraIndex};

/// Delegates to a [`MemoryChain`] after sleeping.
///
/// `reward_points` sleeps a fixed time; `claimed_rewards` sleeps whatever
/// `claimed_delay` returns for the pair. Everything else answers at once.
pub(crate) struct DelayedChain {
    inner: MemoryChain,
    points_delay: Duration,
    claimed_delay: fn(EraIndex, &AccountId) -> Duration,
    points_fetches: AtomicUsize,
}

impl DelayedChain {
    pub(crate) fn new(inner: MemoryChain) -> Self {
        Self {
            inner,
            points_delay: Duration::ZERO,
            claimed_delay: |_, _| Duration::ZERO,
            points_fetches: AtomicUsize::new(0),
        }
    }

    pub(crate) fn with_points_delay(mut self, delay: Duration) -> Self {
        self.points_delay = delay;
        self
    }

    pub(crate) fn with_claimed_delay(mut self, delay: fn(EraIndex, &AccountId) -> Duration) -> Self {
        self.claimed_delay = delay;
        self
    }

    pub(crate) fn inner(&self) -> &MemoryChain {
        &self.inner
    }

    /// Reward point fetches started so far, failed ones included.
    pub(crate) fn points_fetches(&self) -> usize {
        self.points_fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChainQuery for DelayedChain {
    async fn current_era(&self) -> Result<Option<EraIndex>> {
        self.inner.current_era().await
    }

    async fn nominations(&self, account: &AccountId) -> Result<Option<Vec<AccountId>>> {
        self.inner.nominations(account).await
    }

    async fn bonded(&self, stash: &AccountId) -> Result<Option<AccountId>> {
        self.inner.bonded(stash).await
    }

    async fn claimed_rewards(&self, era: EraIndex, validator: &AccountId) -> Result<Vec<u32>> {
        tokio::time::sleep((self.claimed_delay)(era, validator)).await;
        self.inner.claimed_rewards(era, validator).await
    }

    async fn stakers_overview(
        &self,
        era: EraIndex,
        validator: &AccountId,
    ) -> Result<Option<StakeOverview>> {
        self.inner.stakers_overview(era, validator).await
    }

    async fn reward_points(&self, era: EraIndex) -> Result<RewardPoints> {
        self.points_fetches.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.points_delay).await;
        self.inner.reward_points(era).await
    }

    async fn nominator_entries(&self) -> Result<Vec<NominatorEntry>> {
        self.inner.nominator_entries().await
    }

    async fn ledger(&self, controller: &AccountId) -> Result<Option<StakingLedger>> {
        self.inner.ledger(controller).await
    }

    async fn validator_entries(&self) -> Result<Vec<ValidatorEntry>> {
        self.inner.validator_entries().await
    }

    async fn eras_stakers(&self, era: EraIndex, validator: &AccountId) -> Result<Exposure> {
        self.inner.eras_stakers(era, validator).await
    }
}
