//! Subcommand handlers.

pub mod collect;
pub mod commission;
pub mod ls;
pub mod nominators;

use std::sync::Arc;

use payouts_chain::RpcChain;
use payouts_types::AccountId;

use crate::config::PayoutsConfig;
use crate::{inputs, GlobalArgs};

/// Gateway client for the configured endpoint.
fn connect(config: &PayoutsConfig) -> Arc<RpcChain> {
    tracing::info!(endpoint = %config.chain.endpoint, "using chain gateway");
    Arc::new(RpcChain::new(config.chain.endpoint.clone()).with_timeout(config.request_timeout()))
}

fn stashes(args: &GlobalArgs) -> anyhow::Result<Vec<AccountId>> {
    inputs::load_stashes(&args.stashes, args.stashes_file.as_deref())
}
