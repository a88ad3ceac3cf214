//! `ls`: list outstanding payouts without claiming them.

use anyhow::Context;
use payouts_core::list_pending_payouts;

use crate::config::PayoutsConfig;
use crate::GlobalArgs;

pub async fn run(config: &PayoutsConfig, args: &GlobalArgs) -> anyhow::Result<()> {
    let accounts = super::stashes(args)?;
    // Validates offsets and concurrency; the batch size is irrelevant here.
    let params = config.payout_params(accounts)?;

    let pending = list_pending_payouts(
        super::connect(config),
        &params.accounts,
        params.era_depth,
        params.era_stop,
        params.max_concurrent_queries,
    )
    .await
    .context("could not list pending payouts")?;

    for claim in &pending {
        println!("{claim}");
    }
    Ok(())
}
