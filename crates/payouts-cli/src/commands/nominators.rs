//! `ls-nominators`: nominators of the given stashes by bonded weight.

use anyhow::Context;
use payouts_reports::nominators_by_weight;

use crate::config::PayoutsConfig;
use crate::GlobalArgs;

pub async fn run(config: &PayoutsConfig, args: &GlobalArgs) -> anyhow::Result<()> {
    let stashes = super::stashes(args)?;
    let chain = super::connect(config);
    let report = nominators_by_weight(chain.as_ref(), &stashes)
        .await
        .context("could not list nominators")?;
    for stash in &report {
        println!("{stash}");
    }
    Ok(())
}
