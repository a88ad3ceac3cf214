//! Commission distribution across all registered validators.
//!
//! Validators are split by a commission threshold (blocked validators count
//! as above it) and by whether they were in the active set two eras ago,
//! the most recent era whose exposure is reliably settled.
//!
//! Commission is stored in Perbill: [`PERBILL_PER_PERCENT`] parts per percent.

use std::fmt;

use payouts_chain::{ChainQuery, ValidatorPrefs};
use payouts_types::{AccountId, EraIndex, PERBILL_PER_PERCENT};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{ReportError, Result};

/// Eras between the active era and the era checked for activity.
pub const ACTIVITY_ERA_LAG: EraIndex = 2;

/// Which side of the threshold a validator falls on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Bucket {
    /// Blocked, or commission strictly above the threshold.
    AboveOrBlocked,
    /// Open to nominations with commission at or below the threshold.
    AtOrBelow,
}

/// Classify `prefs` against `threshold_perbill`.
pub fn classify(prefs: &ValidatorPrefs, threshold_perbill: u64) -> Bucket {
    if prefs.blocked || u64::from(prefs.commission) > threshold_perbill {
        Bucket::AboveOrBlocked
    } else {
        Bucket::AtOrBelow
    }
}

/// Commission statistics.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CommissionReport {
    /// Threshold in whole percent.
    pub threshold_percent: u32,
    /// Era used to decide activity.
    pub era: EraIndex,
    pub validators: usize,
    /// Mean commission, floored to whole percent.
    pub average_percent: u64,
    /// Upper median commission, floored to whole percent.
    pub median_percent: u64,
    pub active_above_or_blocked: usize,
    pub active_at_or_below: usize,
    pub waiting_above_or_blocked: usize,
    pub waiting_at_or_below: usize,
}

impl fmt::Display for CommissionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p = self.threshold_percent;
        writeln!(f, "average (floor): {}%", self.average_percent)?;
        writeln!(f, "median (floor): {}%", self.median_percent)?;
        writeln!(
            f,
            "active validators blocked or commission > {p}%: {}",
            self.active_above_or_blocked
        )?;
        writeln!(
            f,
            "active validators with commission <= {p}%: {}",
            self.active_at_or_below
        )?;
        writeln!(
            f,
            "waiting validators blocked or commission > {p}%: {}",
            self.waiting_above_or_blocked
        )?;
        write!(
            f,
            "waiting validators with commission <= {p}%: {}",
            self.waiting_at_or_below
        )
    }
}

/// Build the commission report for threshold `percent`.
///
/// # Errors
///
/// - [`ReportError::InvalidPercent`] if `percent > 100`
/// - [`ReportError::NoActivePeriod`] if the chain has no active era
/// - [`ReportError::NoValidators`] if no validator is registered
/// - [`ReportError::Chain`] if the validator or era query fails
pub async fn commission_report<C>(chain: &C, percent: u32) -> Result<CommissionReport>
where
    C: ChainQuery + ?Sized,
{
    if percent > 100 {
        return Err(ReportError::InvalidPercent(percent));
    }
    let threshold = u64::from(percent) * u64::from(PERBILL_PER_PERCENT);

    let validators = chain.validator_entries().await?;
    if validators.is_empty() {
        return Err(ReportError::NoValidators);
    }
    let current = chain
        .current_era()
        .await?
        .ok_or(ReportError::NoActivePeriod)?;
    let era = current.saturating_sub(ACTIVITY_ERA_LAG);
    info!(validators = validators.len(), era, "checking validator activity");

    let mut report = CommissionReport {
        threshold_percent: percent,
        era,
        validators: validators.len(),
        ..CommissionReport::default()
    };

    let mut commissions = Vec::with_capacity(validators.len());
    for entry in &validators {
        commissions.push(u64::from(entry.prefs.commission));
        let active = is_active_in(chain, &entry.validator, era).await;
        let counter = match (classify(&entry.prefs, threshold), active) {
            (Bucket::AboveOrBlocked, true) => &mut report.active_above_or_blocked,
            (Bucket::AtOrBelow, true) => &mut report.active_at_or_below,
            (Bucket::AboveOrBlocked, false) => &mut report.waiting_above_or_blocked,
            (Bucket::AtOrBelow, false) => &mut report.waiting_at_or_below,
        };
        *counter += 1;
    }

    let per_percent = u64::from(PERBILL_PER_PERCENT);
    report.average_percent = average(&commissions) / per_percent;
    report.median_percent = upper_median(&mut commissions) / per_percent;
    Ok(report)
}

async fn is_active_in<C>(chain: &C, validator: &AccountId, era: EraIndex) -> bool
where
    C: ChainQuery + ?Sized,
{
    match chain.eras_stakers(era, validator).await {
        Ok(exposure) => exposure.total > 0,
        Err(e) => {
            warn!(validator = %validator, era, error = %e, "exposure lookup failed, counting as waiting");
            false
        }
    }
}

fn average(values: &[u64]) -> u64 {
    let count = u64::try_from(values.len()).unwrap_or(u64::MAX);
    if count == 0 {
        return 0;
    }
    let sum: u128 = values.iter().map(|v| u128::from(*v)).sum();
    u64::try_from(sum / u128::from(count)).unwrap_or(u64::MAX)
}

/// Element at `len / 2` after sorting.
fn upper_median(values: &mut [u64]) -> u64 {
    values.sort_unstable();
    let mid = values.len() / 2;
    let median = values.get(mid).copied().unwrap_or_default();
    debug!(median, "median commission");
    median
}

#[cfg(test)]
mod tests {
    use super::*;
    use payouts_chain::{ChainState, FailingQuery, MemoryChain};

    fn id(b: u8) -> AccountId {
        AccountId::new([b; 32])
    }

    fn pct(p: u32) -> u32 {
        p * PERBILL_PER_PERCENT
    }

    fn prefs(commission: u32, blocked: bool) -> ValidatorPrefs {
        ValidatorPrefs { commission, blocked }
    }

    #[test]
    fn test_classify_threshold_is_inclusive() {
        let t = u64::from(pct(10));
        assert_eq!(classify(&prefs(pct(10), false), t), Bucket::AtOrBelow);
        assert_eq!(classify(&prefs(pct(10) + 1, false), t), Bucket::AboveOrBlocked);
        assert_eq!(classify(&prefs(0, true), t), Bucket::AboveOrBlocked);
    }

    #[test]
    fn test_average_and_median() {
        assert_eq!(average(&[]), 0);
        assert_eq!(average(&[1, 2, 4]), 2);
        assert_eq!(upper_median(&mut [9, 1, 5, 3]), 5);
        assert_eq!(upper_median(&mut []), 0);
    }

    fn chain() -> MemoryChain {
        let mut state = ChainState::default().with_current_era(52);
        state
            .add_validator(id(1), prefs(pct(5), false))
            .add_validator(id(2), prefs(pct(20), false))
            .add_validator(id(3), prefs(pct(1), true))
            .add_validator(id(4), prefs(pct(10), false))
            .set_exposure(50, id(1), 1_000, 10)
            .set_exposure(50, id(2), 2_000, 20)
            .set_exposure(51, id(4), 3_000, 30);
        MemoryChain::new(state)
    }

    #[tokio::test]
    async fn test_report_buckets() {
        let report = commission_report(&chain(), 10).await.expect("report");
        assert_eq!(report.era, 50);
        assert_eq!(report.validators, 4);
        assert_eq!(report.active_at_or_below, 1);
        assert_eq!(report.active_above_or_blocked, 1);
        assert_eq!(report.waiting_above_or_blocked, 1);
        assert_eq!(report.waiting_at_or_below, 1);
        // (5 + 20 + 1 + 10) / 4 = 9, sorted [1, 5, 10, 20] -> 10
        assert_eq!(report.average_percent, 9);
        assert_eq!(report.median_percent, 10);
        assert!(report
            .to_string()
            .contains("active validators with commission <= 10%: 1"));
    }

    #[tokio::test]
    async fn test_failed_exposure_counts_as_waiting() {
        let chain = chain();
        chain.fail_query(FailingQuery::ErasStakers(50, id(1))).await;
        let report = commission_report(&chain, 10).await.expect("report");
        assert_eq!(report.active_at_or_below, 0);
        assert_eq!(report.waiting_at_or_below, 2);
    }

    #[tokio::test]
    async fn test_invalid_percent() {
        assert_eq!(
            commission_report(&chain(), 101).await,
            Err(ReportError::InvalidPercent(101))
        );
    }

    #[tokio::test]
    async fn test_no_validators() {
        let chain = MemoryChain::new(ChainState::default().with_current_era(3));
        assert_eq!(
            commission_report(&chain, 10).await,
            Err(ReportError::NoValidators)
        );
    }

    #[tokio::test]
    async fn test_no_active_era() {
        let mut state = ChainState::default();
        state.add_validator(id(1), prefs(0, false));
        let chain = MemoryChain::new(state);
        assert_eq!(
            commission_report(&chain, 10).await,
            Err(ReportError::NoActivePeriod)
        );
    }
}
