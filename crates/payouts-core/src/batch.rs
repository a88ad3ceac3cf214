//! Grouping of claims into composite transactions.

use std::num::NonZeroUsize;

use payouts_chain::Call;
use payouts_types::ClaimRequest;

/// Default number of claims per transaction.
pub const DEFAULT_MAX_CALLS: NonZeroUsize = match NonZeroUsize::new(3) {
    Some(n) => n,
    None => NonZeroUsize::MIN,
};

/// An ordered, non-empty group of claims submitted as one transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Batch {
    claims: Vec<ClaimRequest>,
}

impl Batch {
    pub fn claims(&self) -> &[ClaimRequest] {
        &self.claims
    }

    pub fn len(&self) -> usize {
        self.claims.len()
    }

    /// Always false for batches from [`build_batches`].
    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }

    /// The transaction carrying this batch.
    ///
    /// A single claim is sent as a bare `payout_stakers` call; more are
    /// wrapped in `utility.batch`.
    pub fn to_call(&self) -> Call {
        match self.claims.as_slice() {
            [single] => Call::from(*single),
            many => Call::batch(many.iter().copied().map(Call::from).collect()),
        }
    }
}

/// Split `requests` into consecutive batches of at most `max_calls` claims.
///
/// Request `i` lands in batch `i / max_calls`; order is preserved and only
/// the last batch may be short.
pub fn build_batches(requests: &[ClaimRequest], max_calls: NonZeroUsize) -> Vec<Batch> {
    requests
        .chunks(max_calls.get())
        .map(|chunk| Batch {
            claims: chunk.to_vec(),
        })
        .collect()
}
