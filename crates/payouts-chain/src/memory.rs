//! In-process chain model.
//!
//! [`MemoryChain`] answers staking queries from a [`ChainState`] snapshot
//! and accepts signed transactions the way a node's pool does: signatures
//! are checked, stale nonces are refused, and a successful payout marks the
//! claimed (validator, era) pairs so later queries see them as paid.
//!
//! Individual queries can be made to fail with [`MemoryChain::fail_query`],
//! and submission outcomes can be scripted with
//! [`MemoryChain::script_submissions`].

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use payouts_crypto::Signer;
use payouts_types::{AccountId, EraIndex};
use tokio::sync::Mutex;
use tracing::debug;

use crate::{
    Balance, Call, ChainError, ChainQuery, Exposure, NominatorEntry, Receipt, Result,
    RewardPoints, SignedTransaction, StakeOverview, StakingLedger, SubmitError, TxSubmitter,
    ValidatorEntry, ValidatorPrefs,
};

/// Staking storage snapshot.
#[derive(Clone, Debug, Default)]
pub struct ChainState {
    pub current_era: Option<EraIndex>,
    /// Nominator stash to its targets.
    pub nominations: HashMap<AccountId, Vec<AccountId>>,
    /// Stash to controller.
    pub bonded: HashMap<AccountId, AccountId>,
    /// Controller to ledger.
    pub ledgers: HashMap<AccountId, StakingLedger>,
    pub claimed: HashMap<(EraIndex, AccountId), Vec<u32>>,
    pub overviews: HashMap<(EraIndex, AccountId), StakeOverview>,
    pub points: HashMap<EraIndex, RewardPoints>,
    pub exposures: HashMap<(EraIndex, AccountId), Exposure>,
    pub validators: BTreeMap<AccountId, ValidatorPrefs>,
    pub next_index: HashMap<AccountId, u64>,
}

impl ChainState {
    pub fn with_current_era(mut self, era: EraIndex) -> Self {
        self.current_era = Some(era);
        self
    }

    /// Bond `stash` under `controller` with `active` funds.
    pub fn bond(&mut self, stash: AccountId, controller: AccountId, active: Balance) -> &mut Self {
        self.bonded.insert(stash, controller);
        self.ledgers.insert(
            controller,
            StakingLedger {
                stash,
                total: active,
                active,
            },
        );
        self
    }

    /// Register a self-controlled validator.
    pub fn add_validator(&mut self, stash: AccountId, prefs: ValidatorPrefs) -> &mut Self {
        self.bond(stash, stash, 0);
        self.validators.insert(stash, prefs);
        self
    }

    /// Register a self-controlled nominator backing `targets`.
    pub fn add_nominator(
        &mut self,
        stash: AccountId,
        targets: Vec<AccountId>,
        active: Balance,
    ) -> &mut Self {
        self.bond(stash, stash, active);
        self.nominations.insert(stash, targets);
        self
    }

    /// Give `validator` an unclaimed reward in `era` worth `points`.
    pub fn set_unclaimed(&mut self, era: EraIndex, validator: AccountId, points: u32) -> &mut Self {
        self.overviews.insert(
            (era, validator),
            StakeOverview {
                page_count: 1,
                ..StakeOverview::default()
            },
        );
        let era_points = self.points.entry(era).or_default();
        era_points.individual.insert(validator, points);
        era_points.total = era_points.total.saturating_add(points);
        self
    }

    /// Record page 0 of `validator`'s `era` reward as paid.
    pub fn mark_claimed(&mut self, era: EraIndex, validator: AccountId) -> &mut Self {
        let pages = self.claimed.entry((era, validator)).or_default();
        if !pages.contains(&0) {
            pages.push(0);
        }
        self
    }

    pub fn set_exposure(
        &mut self,
        era: EraIndex,
        validator: AccountId,
        total: Balance,
        own: Balance,
    ) -> &mut Self {
        self.exposures.insert((era, validator), Exposure { total, own });
        self
    }

    /// Whether a claim for (`validator`, `era`) would be accepted.
    pub fn is_unclaimed(&self, era: EraIndex, validator: &AccountId) -> bool {
        self.claimed
            .get(&(era, *validator))
            .map_or(true, |pages| pages.is_empty())
            && self.overviews.contains_key(&(era, *validator))
    }
}

/// A query that can be made to fail.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum FailingQuery {
    CurrentEra,
    Nominations(AccountId),
    Bonded(AccountId),
    ClaimedRewards(EraIndex, AccountId),
    StakersOverview(EraIndex, AccountId),
    RewardPoints(EraIndex),
    NominatorEntries,
    Ledger(AccountId),
    ValidatorEntries,
    ErasStakers(EraIndex, AccountId),
    NextIndex,
}

/// Chain model backed by a [`ChainState`].
pub struct MemoryChain {
    state: Mutex<ChainState>,
    faults: Mutex<HashSet<FailingQuery>>,
    scripted: Mutex<VecDeque<std::result::Result<(), String>>>,
    attempts: Mutex<Vec<(Call, u64)>>,
    submitted: Mutex<Vec<SignedTransaction>>,
    queries: AtomicUsize,
}

impl MemoryChain {
    pub fn new(state: ChainState) -> Self {
        Self {
            state: Mutex::new(state),
            faults: Mutex::new(HashSet::new()),
            scripted: Mutex::new(VecDeque::new()),
            attempts: Mutex::new(Vec::new()),
            submitted: Mutex::new(Vec::new()),
            queries: AtomicUsize::new(0),
        }
    }

    /// Make `query` fail with a transport error until cleared.
    pub async fn fail_query(&self, query: FailingQuery) {
        self.faults.lock().await.insert(query);
    }

    pub async fn clear_faults(&self) {
        self.faults.lock().await.clear();
    }

    /// Queue outcomes for the next submission attempts, in order.
    ///
    /// `Err(msg)` rejects the attempt with `msg`. `Ok(())` lets it through to
    /// the normal checks. Once the queue is drained every attempt goes
    /// through the normal checks.
    pub async fn script_submissions(
        &self,
        outcomes: impl IntoIterator<Item = std::result::Result<(), String>>,
    ) {
        self.scripted.lock().await.extend(outcomes);
    }

    /// Transactions accepted so far.
    pub async fn submitted(&self) -> Vec<SignedTransaction> {
        self.submitted.lock().await.clone()
    }

    /// Every submission attempt as (call, nonce), accepted or not.
    pub async fn attempts(&self) -> Vec<(Call, u64)> {
        self.attempts.lock().await.clone()
    }

    /// Number of storage queries answered or failed so far.
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::Relaxed)
    }

    /// Copy of the current storage.
    pub async fn snapshot(&self) -> ChainState {
        self.state.lock().await.clone()
    }

    /// Mutate storage in place.
    pub async fn update(&self, f: impl FnOnce(&mut ChainState)) {
        f(&mut *self.state.lock().await);
    }

    async fn check(&self, query: FailingQuery) -> Result<()> {
        self.queries.fetch_add(1, Ordering::Relaxed);
        if self.faults.lock().await.contains(&query) {
            return Err(ChainError::Transport(format!("injected fault: {query:?}")));
        }
        Ok(())
    }
}

#[async_trait]
impl ChainQuery for MemoryChain {
    async fn current_era(&self) -> Result<Option<EraIndex>> {
        self.check(FailingQuery::CurrentEra).await?;
        Ok(self.state.lock().await.current_era)
    }

    async fn nominations(&self, account: &AccountId) -> Result<Option<Vec<AccountId>>> {
        self.check(FailingQuery::Nominations(*account)).await?;
        Ok(self.state.lock().await.nominations.get(account).cloned())
    }

    async fn bonded(&self, stash: &AccountId) -> Result<Option<AccountId>> {
        self.check(FailingQuery::Bonded(*stash)).await?;
        Ok(self.state.lock().await.bonded.get(stash).copied())
    }

    async fn claimed_rewards(&self, era: EraIndex, validator: &AccountId) -> Result<Vec<u32>> {
        self.check(FailingQuery::ClaimedRewards(era, *validator))
            .await?;
        Ok(self
            .state
            .lock()
            .await
            .claimed
            .get(&(era, *validator))
            .cloned()
            .unwrap_or_default())
    }

    async fn stakers_overview(
        &self,
        era: EraIndex,
        validator: &AccountId,
    ) -> Result<Option<StakeOverview>> {
        self.check(FailingQuery::StakersOverview(era, *validator))
            .await?;
        Ok(self
            .state
            .lock()
            .await
            .overviews
            .get(&(era, *validator))
            .cloned())
    }

    async fn reward_points(&self, era: EraIndex) -> Result<RewardPoints> {
        self.check(FailingQuery::RewardPoints(era)).await?;
        Ok(self
            .state
            .lock()
            .await
            .points
            .get(&era)
            .cloned()
            .unwrap_or_default())
    }

    async fn nominator_entries(&self) -> Result<Vec<NominatorEntry>> {
        self.check(FailingQuery::NominatorEntries).await?;
        let state = self.state.lock().await;
        let mut entries: Vec<NominatorEntry> = state
            .nominations
            .iter()
            .map(|(nominator, targets)| NominatorEntry {
                nominator: *nominator,
                targets: targets.clone(),
            })
            .collect();
        entries.sort_by_key(|e| e.nominator);
        Ok(entries)
    }

    async fn ledger(&self, controller: &AccountId) -> Result<Option<StakingLedger>> {
        self.check(FailingQuery::Ledger(*controller)).await?;
        Ok(self.state.lock().await.ledgers.get(controller).cloned())
    }

    async fn validator_entries(&self) -> Result<Vec<ValidatorEntry>> {
        self.check(FailingQuery::ValidatorEntries).await?;
        Ok(self
            .state
            .lock()
            .await
            .validators
            .iter()
            .map(|(validator, prefs)| ValidatorEntry {
                validator: *validator,
                prefs: *prefs,
            })
            .collect())
    }

    async fn eras_stakers(&self, era: EraIndex, validator: &AccountId) -> Result<Exposure> {
        self.check(FailingQuery::ErasStakers(era, *validator))
            .await?;
        Ok(self
            .state
            .lock()
            .await
            .exposures
            .get(&(era, *validator))
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl TxSubmitter for MemoryChain {
    async fn next_index(&self, account: &AccountId) -> Result<u64> {
        self.check(FailingQuery::NextIndex).await?;
        Ok(self
            .state
            .lock()
            .await
            .next_index
            .get(account)
            .copied()
            .unwrap_or(0))
    }

    async fn sign_and_submit(
        &self,
        call: &Call,
        signer: &Signer,
        nonce: u64,
    ) -> std::result::Result<Receipt, SubmitError> {
        self.attempts.lock().await.push((call.clone(), nonce));

        if let Some(Err(msg)) = self.scripted.lock().await.pop_front() {
            debug!(%call, nonce, "scripted rejection");
            return Err(SubmitError::Rejected(msg));
        }

        let tx = SignedTransaction::sign(call.clone(), signer, nonce)?;
        tx.verify()?;
        let tx_hash = tx.hash_hex()?;

        let mut state = self.state.lock().await;
        let expected = state.next_index.get(&tx.signer).copied().unwrap_or(0);
        if nonce < expected {
            return Err(SubmitError::Rejected(format!(
                "stale nonce {nonce}, account is at {expected}"
            )));
        }
        state.next_index.insert(tx.signer, nonce.saturating_add(1));
        for claim in call.claims() {
            state.mark_claimed(claim.era, claim.validator);
        }
        drop(state);

        debug!(%call, nonce, %tx_hash, "transaction accepted");
        self.submitted.lock().await.push(tx);
        Ok(Receipt { tx_hash })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(b: u8) -> AccountId {
        AccountId::new([b; 32])
    }

    fn sample() -> ChainState {
        let mut state = ChainState::default().with_current_era(100);
        state
            .add_validator(id(1), ValidatorPrefs::default())
            .add_nominator(id(9), vec![id(1)], 500)
            .set_unclaimed(98, id(1), 20)
            .set_unclaimed(99, id(1), 40);
        state
    }

    #[tokio::test]
    async fn test_queries_read_state() {
        let chain = MemoryChain::new(sample());
        assert_eq!(chain.current_era().await.expect("era"), Some(100));
        assert_eq!(
            chain.nominations(&id(9)).await.expect("noms"),
            Some(vec![id(1)])
        );
        assert_eq!(chain.bonded(&id(9)).await.expect("bonded"), Some(id(9)));
        assert_eq!(chain.bonded(&id(7)).await.expect("bonded"), None);
        let points = chain.reward_points(99).await.expect("points");
        assert_eq!(points.total, 40);
        assert!(points.has_points(&id(1)));
        assert!(chain.claimed_rewards(99, &id(1)).await.expect("claimed").is_empty());
        assert_eq!(chain.query_count(), 6);
    }

    #[tokio::test]
    async fn test_injected_fault() {
        let chain = MemoryChain::new(sample());
        chain.fail_query(FailingQuery::Bonded(id(9))).await;
        assert!(matches!(
            chain.bonded(&id(9)).await,
            Err(ChainError::Transport(_))
        ));
        assert!(chain.bonded(&id(1)).await.is_ok());
        chain.clear_faults().await;
        assert!(chain.bonded(&id(9)).await.is_ok());
    }

    #[tokio::test]
    async fn test_accepted_payout_marks_claimed() {
        let chain = MemoryChain::new(sample());
        let signer = Signer::from_seed(&[3; 32]);
        let call = Call::batch(vec![
            Call::payout_stakers(id(1), 98),
            Call::payout_stakers(id(1), 99),
        ]);
        let receipt = chain.sign_and_submit(&call, &signer, 0).await.expect("submit");
        assert!(receipt.tx_hash.starts_with("0x"));

        let state = chain.snapshot().await;
        assert!(!state.is_unclaimed(98, &id(1)));
        assert!(!state.is_unclaimed(99, &id(1)));
        assert_eq!(
            chain.next_index(&signer.account()).await.expect("nonce"),
            1
        );
        assert_eq!(chain.submitted().await.len(), 1);
    }

    #[tokio::test]
    async fn test_stale_nonce_rejected() {
        let chain = MemoryChain::new(sample());
        let signer = Signer::from_seed(&[3; 32]);
        let call = Call::payout_stakers(id(1), 98);
        chain.sign_and_submit(&call, &signer, 5).await.expect("submit");
        let err = chain
            .sign_and_submit(&call, &signer, 5)
            .await
            .expect_err("stale");
        assert!(matches!(err, SubmitError::Rejected(_)));
        assert_eq!(chain.attempts().await.len(), 2);
        assert_eq!(chain.submitted().await.len(), 1);
    }

    #[tokio::test]
    async fn test_scripted_rejection_then_acceptance() {
        let chain = MemoryChain::new(sample());
        let signer = Signer::from_seed(&[3; 32]);
        chain
            .script_submissions([Err("pool full".to_string()), Ok(())])
            .await;
        let call = Call::payout_stakers(id(1), 99);
        assert_eq!(
            chain.sign_and_submit(&call, &signer, 0).await,
            Err(SubmitError::Rejected("pool full".into()))
        );
        assert!(chain.sign_and_submit(&call, &signer, 0).await.is_ok());
        assert!(chain.sign_and_submit(&call, &signer, 1).await.is_ok());
    }

    #[tokio::test]
    async fn test_entries_are_sorted() {
        let mut state = sample();
        state.add_nominator(id(4), vec![id(1)], 10);
        state.add_validator(id(2), ValidatorPrefs { commission: 50_000_000, blocked: true });
        let chain = MemoryChain::new(state);
        let noms: Vec<_> = chain
            .nominator_entries()
            .await
            .expect("entries")
            .into_iter()
            .map(|e| e.nominator)
            .collect();
        assert_eq!(noms, vec![id(4), id(9)]);
        let vals = chain.validator_entries().await.expect("validators");
        assert_eq!(vals.len(), 2);
        assert!(vals[1].prefs.blocked);
    }
}
