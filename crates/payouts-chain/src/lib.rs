//! # payouts-chain
//!
//! Chain access for the payouts pipeline.
//!
//! The pipeline never talks to a node directly. It consumes two
//! capabilities, [`ChainQuery`] for staking storage reads and
//! [`TxSubmitter`] for nonce lookup and signed submission, and builds its
//! transactions with [`Call`].
//!
//! ## Modules
//!
//! - [`call`] — Claim and batch calls, signed transactions
//! - [`cbor`] — CBOR encoding of transactions
//! - [`rpc`] — Newline-delimited JSON-RPC client for a chain gateway
//! - [`memory`] — In-process chain model with fault injection
//!
//! ## Architecture
//!
//! ```text
//! payouts-core
//!     |
//!     v
//! ChainQuery / TxSubmitter      -- async capabilities
//!     |
//!     +--> RpcChain             -- JSON-RPC over TCP to a gateway
//!     +--> MemoryChain          -- in-process model
//! ```

pub mod call;
pub mod cbor;
pub mod memory;
pub mod rpc;

use std::collections::BTreeMap;

use async_trait::async_trait;
use payouts_crypto::Signer;
use payouts_types::{AccountId, EraIndex};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr, PickFirst};

pub use call::{Call, SignedTransaction};
pub use memory::{ChainState, FailingQuery, MemoryChain};
pub use rpc::RpcChain;

/// Token amount in the chain's smallest unit.
pub type Balance = u128;

/// Error types for chain access.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChainError {
    /// A record that must exist was absent.
    #[error("not found: {0}")]
    NotFound(String),

    /// Connection or I/O failure talking to the gateway.
    #[error("transport error: {0}")]
    Transport(String),

    /// The gateway answered with a JSON-RPC error object.
    #[error("rpc error {code}: {message}")]
    Rpc {
        /// JSON-RPC error code.
        code: i64,
        /// Error message from the gateway.
        message: String,
    },

    /// The response could not be decoded into the expected shape.
    #[error("decode error: {0}")]
    Decode(String),

    /// The request did not complete in time.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A transaction could not be encoded or signed.
    #[error("encoding error: {0}")]
    Encoding(String),
}

/// Result type alias for chain access.
pub type Result<T> = std::result::Result<T, ChainError>;

/// Failure of one submission attempt.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    /// The node refused the transaction.
    #[error("transaction rejected: {0}")]
    Rejected(String),

    /// The transaction never reached the node, or the answer was unreadable.
    #[error(transparent)]
    Chain(#[from] ChainError),
}

/// Turns an absent remote record into [`ChainError::NotFound`].
pub trait OptionExt<T> {
    fn required(self, what: impl Into<String>) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn required(self, what: impl Into<String>) -> Result<T> {
        self.ok_or_else(|| ChainError::NotFound(what.into()))
    }
}

/// Node acknowledgement of a submitted transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    /// Hex transaction hash.
    pub tx_hash: String,
}

/// Era reward points: total and per-validator.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardPoints {
    pub total: u32,
    pub individual: BTreeMap<AccountId, u32>,
}

impl RewardPoints {
    /// Whether `validator` earned any points this era.
    pub fn has_points(&self, validator: &AccountId) -> bool {
        self.individual.contains_key(validator)
    }
}

/// Paged exposure overview of a validator for one era.
#[serde_as]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeOverview {
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub total: Balance,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub own: Balance,
    pub nominator_count: u32,
    pub page_count: u32,
}

/// Full exposure of a validator for one era. Zero when not elected.
#[serde_as]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exposure {
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub total: Balance,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub own: Balance,
}

/// Bonded funds of a stash, keyed by its controller.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakingLedger {
    pub stash: AccountId,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub total: Balance,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub active: Balance,
}

/// A nominator and the validators it backs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NominatorEntry {
    pub nominator: AccountId,
    pub targets: Vec<AccountId>,
}

/// Validator preferences.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorPrefs {
    /// Commission in parts per billion.
    pub commission: u32,
    /// Whether the validator refuses new nominations.
    pub blocked: bool,
}

/// A registered validator and its preferences.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorEntry {
    pub validator: AccountId,
    pub prefs: ValidatorPrefs,
}

/// Read access to staking storage.
#[async_trait]
pub trait ChainQuery: Send + Sync {
    /// Index of the active era, `None` before the first era starts.
    async fn current_era(&self) -> Result<Option<EraIndex>>;

    /// Nomination targets of `account`, `None` if it is not nominating.
    async fn nominations(&self, account: &AccountId) -> Result<Option<Vec<AccountId>>>;

    /// Controller of `stash`, `None` if it is not a bonded stash.
    async fn bonded(&self, stash: &AccountId) -> Result<Option<AccountId>>;

    /// Pages of `validator`'s `era` reward already paid out. Empty if unclaimed.
    async fn claimed_rewards(&self, era: EraIndex, validator: &AccountId) -> Result<Vec<u32>>;

    /// Exposure overview of `validator` in `era`, `None` if it was not exposed.
    async fn stakers_overview(
        &self,
        era: EraIndex,
        validator: &AccountId,
    ) -> Result<Option<StakeOverview>>;

    /// Reward points of every validator in `era`.
    async fn reward_points(&self, era: EraIndex) -> Result<RewardPoints>;

    /// All current nominators.
    async fn nominator_entries(&self) -> Result<Vec<NominatorEntry>>;

    /// Ledger held by `controller`.
    async fn ledger(&self, controller: &AccountId) -> Result<Option<StakingLedger>>;

    /// All registered validators.
    async fn validator_entries(&self) -> Result<Vec<ValidatorEntry>>;

    /// Full exposure of `validator` in `era`.
    async fn eras_stakers(&self, era: EraIndex, validator: &AccountId) -> Result<Exposure>;
}

/// Transaction submission for the funding account.
#[async_trait]
pub trait TxSubmitter: Send + Sync {
    /// Next nonce the chain expects from `account`.
    async fn next_index(&self, account: &AccountId) -> Result<u64>;

    /// Sign `call` with `signer` at `nonce` and broadcast it.
    async fn sign_and_submit(
        &self,
        call: &Call,
        signer: &Signer,
        nonce: u64,
    ) -> std::result::Result<Receipt, SubmitError>;
}
