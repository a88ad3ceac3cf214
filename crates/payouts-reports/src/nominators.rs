//! Nominators backing given validators, heaviest first.

use std::collections::HashMap;
use std::fmt;

use payouts_chain::{Balance, ChainQuery, OptionExt};
use payouts_types::AccountId;
use serde::Serialize;
use tracing::info;

use crate::Result;

/// A nominator and its active bonded amount.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct NominatorWeight {
    pub nominator: AccountId,
    pub active: Balance,
}

/// Nominators of one validator, sorted by `active` descending.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StashNominators {
    pub stash: AccountId,
    pub nominators: Vec<NominatorWeight>,
}

impl fmt::Display for StashNominators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Validator {} has the following nominations:", self.stash)?;
        for (index, n) in self.nominators.iter().enumerate() {
            let rank = format!("{index}) ");
            let id = format!("{},", n.nominator);
            writeln!(f, "{rank:>8}{id:<70}{}", n.active)?;
        }
        Ok(())
    }
}

/// For each of `stashes`, the nominators backing it with their weights.
///
/// Nominators with no targets are ignored. A nominator backing several of
/// the stashes is listed under each. Output follows the order of `stashes`.
///
/// # Errors
///
/// - [`crate::ReportError::NotFound`] if a backing nominator has no
///   controller or its controller has no ledger
/// - [`crate::ReportError::Chain`] if a query fails
pub async fn nominators_by_weight<C>(
    chain: &C,
    stashes: &[AccountId],
) -> Result<Vec<StashNominators>>
where
    C: ChainQuery + ?Sized,
{
    info!("querying nominators");
    let entries = chain.nominator_entries().await?;

    let backing: Vec<_> = entries
        .into_iter()
        .filter(|e| e.targets.iter().any(|t| stashes.contains(t)))
        .collect();

    info!(nominators = backing.len(), "querying ledgers of backing nominators");
    let mut weights: HashMap<AccountId, Balance> = HashMap::with_capacity(backing.len());
    for entry in &backing {
        let controller = chain
            .bonded(&entry.nominator)
            .await?
            .required(format!("controller of {}", entry.nominator))?;
        let ledger = chain
            .ledger(&controller)
            .await?
            .required(format!("ledger of {}", entry.nominator))?;
        weights.insert(entry.nominator, ledger.active);
    }

    let mut report: Vec<StashNominators> = stashes
        .iter()
        .map(|stash| StashNominators {
            stash: *stash,
            nominators: Vec::new(),
        })
        .collect();
    for entry in &backing {
        let active = weights.get(&entry.nominator).copied().unwrap_or_default();
        for row in report
            .iter_mut()
            .filter(|row| entry.targets.contains(&row.stash))
        {
            row.nominators.push(NominatorWeight {
                nominator: entry.nominator,
                active,
            });
        }
    }
    for row in &mut report {
        row.nominators.sort_by(|a, b| b.active.cmp(&a.active));
    }
    Ok(report)
}
