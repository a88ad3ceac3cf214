//! payouts: claim outstanding staking rewards.
//!
//! Finds unclaimed validator rewards for a set of stashes and submits the
//! claims in batches from one funding account. Also lists pending payouts,
//! the nominators behind a set of validators, and commission statistics.

mod commands;
mod config;
mod inputs;
mod logging;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use crate::config::PayoutsConfig;

#[derive(Debug, Parser)]
#[command(name = "payouts", version, about = "Staking payout collector")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Claim every outstanding payout (default).
    Collect,
    /// List outstanding payouts without claiming them.
    Ls,
    /// List the nominators of the given stashes by bonded weight.
    LsNominators,
    /// Commission statistics over all validators.
    Commission(commands::commission::CommissionArgs),
}

/// Options shared by every subcommand. Anything set here overrides the
/// config file.
#[derive(Debug, Clone, Default, Args)]
pub struct GlobalArgs {
    /// Chain gateway endpoint (host:port).
    #[arg(short = 'w', long = "ws", visible_alias = "endpoint", global = true)]
    pub ws: Option<String>,

    /// Validator or nominator stashes (SS58 or hex), comma separated.
    #[arg(short = 's', long, value_delimiter = ',', global = true)]
    pub stashes: Vec<String>,

    /// JSON file holding an array of stash addresses (SS58 or hex).
    #[arg(short = 'S', long, alias = "stashesFile", global = true)]
    pub stashes_file: Option<PathBuf>,

    /// File holding the funding account's hex seed. Required by `collect`.
    #[arg(short = 'u', long, alias = "suriFile", global = true)]
    pub suri_file: Option<PathBuf>,

    /// Eras to check before the newest checked era.
    #[arg(
        short = 'e',
        long,
        alias = "eraDepth",
        global = true,
        allow_negative_numbers = true
    )]
    pub era_depth: Option<i64>,

    /// Newest eras to skip; 1 skips the era in progress.
    #[arg(
        long,
        aliases = ["eraStop", "stop"],
        global = true,
        allow_negative_numbers = true
    )]
    pub era_stop: Option<i64>,

    /// Maximum claims per transaction.
    #[arg(short = 'm', long, alias = "maxCalls", global = true)]
    pub max_calls: Option<usize>,

    /// Retries per transaction after a failed attempt.
    #[arg(long, global = true)]
    pub max_retries: Option<u32>,

    /// Config file (default ./payouts.toml).
    #[arg(long, env = "PAYOUTS_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Debug logging for this tool's own modules.
    #[arg(long, env = "PAYOUTS_DEBUG", global = true)]
    pub debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config =
        PayoutsConfig::load(cli.global.config.as_deref()).context("failed to load config")?;
    config.apply_overrides(&cli.global);

    logging::init(&config.logging.level, cli.global.debug)?;

    match cli.command.unwrap_or(Command::Collect) {
        Command::Collect => commands::collect::run(&config, &cli.global).await,
        Command::Ls => commands::ls::run(&config, &cli.global).await,
        Command::LsNominators => commands::nominators::run(&config, &cli.global).await,
        Command::Commission(args) => commands::commission::run(&config, &args).await,
    }
}
