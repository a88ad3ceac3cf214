//! Configuration file management.
//!
//! ```toml
//! [chain]
//! endpoint = "127.0.0.1:9944"
//! request_timeout_secs = 30
//!
//! [payouts]
//! era_depth = 0
//! era_stop = 1
//! max_calls = 3
//! max_retries = 1
//! retry_delay_ms = 0
//! max_concurrent_queries = 8
//!
//! [logging]
//! level = "info"
//! ```

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use payouts_core::{ConfigError, PayoutParams, SubmitPolicy};
use payouts_types::AccountId;
use serde::{Deserialize, Serialize};

use crate::GlobalArgs;

/// Config file read when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "payouts.toml";

/// Complete tool configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PayoutsConfig {
    /// Chain gateway settings.
    #[serde(default)]
    pub chain: ChainConfig,
    /// Discovery and submission settings.
    #[serde(default)]
    pub payouts: PayoutsSection,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Chain gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Gateway address (host:port).
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Per-request timeout.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

/// Discovery and submission configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoutsSection {
    #[serde(default)]
    pub era_depth: i64,
    #[serde(default = "default_era_stop")]
    pub era_stop: i64,
    #[serde(default = "default_max_calls")]
    pub max_calls: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Pause between attempts of the same transaction.
    #[serde(default)]
    pub retry_delay_ms: u64,
    #[serde(default = "default_max_concurrent_queries")]
    pub max_concurrent_queries: usize,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is unset: "debug" | "info" | "warn" | "error".
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default value functions

fn default_endpoint() -> String {
    "127.0.0.1:9944".to_string()
}

fn default_request_timeout() -> u64 {
    payouts_chain::rpc::DEFAULT_TIMEOUT_SECS
}

fn default_era_stop() -> i64 {
    payouts_core::DEFAULT_ERA_STOP
}

fn default_max_calls() -> usize {
    payouts_core::DEFAULT_MAX_CALLS.get()
}

fn default_max_retries() -> u32 {
    payouts_core::DEFAULT_MAX_RETRIES
}

fn default_max_concurrent_queries() -> usize {
    payouts_core::DEFAULT_MAX_CONCURRENT_QUERIES
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl Default for PayoutsSection {
    fn default() -> Self {
        Self {
            era_depth: payouts_core::DEFAULT_ERA_DEPTH,
            era_stop: default_era_stop(),
            max_calls: default_max_calls(),
            max_retries: default_max_retries(),
            retry_delay_ms: 0,
            max_concurrent_queries: default_max_concurrent_queries(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl PayoutsConfig {
    /// Load configuration from `path`, or from [`DEFAULT_CONFIG_FILE`] in
    /// the working directory.
    ///
    /// A missing default file yields defaults; a missing explicit file is an
    /// error.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };
        if !explicit && !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("invalid config in {}", path.display()))
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Apply command-line overrides.
    pub fn apply_overrides(&mut self, args: &GlobalArgs) {
        if let Some(ws) = &args.ws {
            self.chain.endpoint.clone_from(ws);
        }
        if let Some(depth) = args.era_depth {
            self.payouts.era_depth = depth;
        }
        if let Some(stop) = args.era_stop {
            self.payouts.era_stop = stop;
        }
        if let Some(max_calls) = args.max_calls {
            self.payouts.max_calls = max_calls;
        }
        if let Some(max_retries) = args.max_retries {
            self.payouts.max_retries = max_retries;
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.chain.request_timeout_secs)
    }

    /// Run parameters for `accounts`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for a zero batch size or concurrency, or for
    /// negative era offsets.
    pub fn payout_params(&self, accounts: Vec<AccountId>) -> Result<PayoutParams, ConfigError> {
        let p = &self.payouts;
        let max_calls = NonZeroUsize::new(p.max_calls).ok_or(ConfigError::ZeroMaxCalls)?;
        let params = PayoutParams {
            accounts,
            era_depth: p.era_depth,
            era_stop: p.era_stop,
            max_calls,
            max_concurrent_queries: p.max_concurrent_queries,
            policy: SubmitPolicy {
                max_retries: p.max_retries,
                retry_delay: Duration::from_millis(p.retry_delay_ms),
            },
        };
        params.validate()?;
        Ok(params)
    }
}
