//! Claim calls and signed transactions.
//!
//! A [`Call`] is either a single `staking.payout_stakers` claim or a
//! `utility.batch` wrapping several claims into one composite transaction.
//!
//! ## Signing payload
//!
//! ```text
//! payload = BLAKE3::derive_key(
//!     "staking-payouts v1 tx-signing-payload",
//!     LE32-framed(CBOR(call), nonce_le, signer)
//! )
//! ```

use std::fmt;

use payouts_crypto::blake3::{self, contexts};
use payouts_crypto::ed25519::{Signature, VerifyingKey};
use payouts_crypto::Signer;
use payouts_types::{AccountId, ClaimRequest, EraIndex};
use serde::{Deserialize, Serialize};

use crate::{cbor, ChainError, Result};

/// A dispatchable call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Call {
    /// Pay out every nominator of `validator_stash` for `era`.
    PayoutStakers {
        validator_stash: AccountId,
        era: EraIndex,
    },
    /// Dispatch `calls` in order inside one transaction.
    Batch { calls: Vec<Call> },
}

impl Call {
    /// Claim transaction for one (validator, era) pair.
    pub fn payout_stakers(validator_stash: AccountId, era: EraIndex) -> Self {
        Self::PayoutStakers {
            validator_stash,
            era,
        }
    }

    /// Composite transaction over `calls`.
    pub fn batch(calls: Vec<Call>) -> Self {
        Self::Batch { calls }
    }

    pub fn section(&self) -> &'static str {
        match self {
            Self::PayoutStakers { .. } => "staking",
            Self::Batch { .. } => "utility",
        }
    }

    pub fn method(&self) -> &'static str {
        match self {
            Self::PayoutStakers { .. } => "payout_stakers",
            Self::Batch { .. } => "batch",
        }
    }

    /// Number of claims carried, counting nested batch members.
    pub fn call_count(&self) -> usize {
        match self {
            Self::PayoutStakers { .. } => 1,
            Self::Batch { calls } => calls.iter().map(Call::call_count).sum(),
        }
    }

    /// Claims carried by this call, in dispatch order.
    pub fn claims(&self) -> Vec<ClaimRequest> {
        match self {
            Self::PayoutStakers {
                validator_stash,
                era,
            } => vec![ClaimRequest::new(*validator_stash, *era)],
            Self::Batch { calls } => calls.iter().flat_map(Call::claims).collect(),
        }
    }
}

impl From<ClaimRequest> for Call {
    fn from(req: ClaimRequest) -> Self {
        Self::payout_stakers(req.validator, req.era)
    }
}

impl fmt::Display for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PayoutStakers {
                validator_stash,
                era,
            } => write!(f, "staking.payout_stakers({validator_stash}, {era})"),
            Self::Batch { calls } => write!(f, "utility.batch({} calls)", calls.len()),
        }
    }
}

/// A call signed by the funding account at a fixed nonce.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
    pub signer: AccountId,
    pub nonce: u64,
    pub call: Call,
    pub signature: Signature,
}

impl SignedTransaction {
    /// Sign `call` at `nonce`.
    ///
    /// # Errors
    ///
    /// - [`ChainError::Encoding`] if the call cannot be encoded
    pub fn sign(call: Call, signer: &Signer, nonce: u64) -> Result<Self> {
        let payload = signing_payload(&call, &signer.account(), nonce)?;
        let signature = signer.sign(&payload);
        Ok(Self {
            signer: signer.account(),
            nonce,
            call,
            signature,
        })
    }

    /// Check the signature against the embedded signer.
    ///
    /// # Errors
    ///
    /// - [`ChainError::Encoding`] if the signer is not a valid key or the
    ///   signature does not match
    pub fn verify(&self) -> Result<()> {
        let payload = signing_payload(&self.call, &self.signer, self.nonce)?;
        VerifyingKey::from_account(&self.signer)
            .and_then(|vk| vk.verify(&payload, &self.signature))
            .map_err(|e| ChainError::Encoding(e.to_string()))
    }

    /// CBOR encoding broadcast to the node.
    pub fn encode(&self) -> Result<Vec<u8>> {
        cbor::to_vec_named(self, "SignedTransaction")
    }

    /// Decode a CBOR-encoded transaction.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        cbor::from_slice_named(bytes, "SignedTransaction")
    }

    /// Hex transaction hash over the encoded form.
    pub fn hash_hex(&self) -> Result<String> {
        let encoded = self.encode()?;
        Ok(format!(
            "0x{}",
            hex::encode(blake3::derive_key(contexts::TX_HASH, &encoded))
        ))
    }
}

fn signing_payload(call: &Call, signer: &AccountId, nonce: u64) -> Result<[u8; 32]> {
    let call_bytes = cbor::to_vec_named(call, "Call")?;
    let nonce_bytes = nonce.to_le_bytes();
    let fields =
        blake3::encode_multi_field(&[&call_bytes[..], &nonce_bytes[..], &signer.as_bytes()[..]]);
    Ok(blake3::derive_key(contexts::TX_SIGNING_PAYLOAD, &fields))
}
