//! `commission`: commission statistics over all validators.

use anyhow::Context;
use clap::Args;
use payouts_reports::commission_report;

use crate::config::PayoutsConfig;

#[derive(Debug, Clone, Args)]
pub struct CommissionArgs {
    /// Threshold in whole percent.
    #[arg(short = 'p', long)]
    pub percent: u32,
}

pub async fn run(config: &PayoutsConfig, args: &CommissionArgs) -> anyhow::Result<()> {
    let chain = super::connect(config);
    let report = commission_report(chain.as_ref(), args.percent)
        .await
        .context("could not build commission report")?;
    println!("{report}");
    Ok(())
}
