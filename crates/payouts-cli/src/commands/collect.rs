//! `collect`: claim every outstanding payout.

use anyhow::Context;
use payouts_core::collect_payouts;
use tracing::{error, info};

use crate::config::PayoutsConfig;
use crate::{inputs, GlobalArgs};

pub async fn run(config: &PayoutsConfig, args: &GlobalArgs) -> anyhow::Result<()> {
    let suri_file = args
        .suri_file
        .as_deref()
        .context("--suri-file is required to collect payouts")?;
    let signer = inputs::load_signer(suri_file)?;
    let params = config.payout_params(super::stashes(args)?)?;

    info!(
        funding_account = %signer.account(),
        stashes = params.accounts.len(),
        era_depth = params.era_depth,
        era_stop = params.era_stop,
        "collecting payouts"
    );

    let chain = super::connect(config);
    let report = collect_payouts(chain, &signer, &params)
        .await
        .context("payout collection failed")?;

    for outcome in report.outcomes.iter().filter(|o| !o.success) {
        error!(
            batch = outcome.batch_index,
            nonce = outcome.nonce,
            attempts = outcome.attempts,
            error = outcome.error_message.as_deref().unwrap_or("unknown"),
            "batch was not submitted"
        );
    }
    if !report.nothing_to_claim() {
        println!("{}", report.summary);
    }
    Ok(())
}
