//! Stash lists and the funding key.

use std::path::Path;

use anyhow::{ensure, Context};
use payouts_crypto::Signer;
use payouts_types::AccountId;
use zeroize::Zeroizing;

/// Stashes from `--stashes` followed by those in `--stashes-file`.
///
/// The file holds a JSON array of addresses, SS58 or hex. At least one
/// stash must be given overall.
pub fn load_stashes(listed: &[String], file: Option<&Path>) -> anyhow::Result<Vec<AccountId>> {
    let mut raw: Vec<String> = listed.to_vec();
    if let Some(path) = file {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read stashes file {}", path.display()))?;
        let from_file: Vec<String> = serde_json::from_str(&content)
            .with_context(|| format!("{} is not a JSON array of addresses", path.display()))?;
        raw.extend(from_file);
    }
    ensure!(
        !raw.is_empty(),
        "no stashes given; use --stashes or --stashes-file"
    );

    raw.iter()
        .map(|s| {
            s.parse::<AccountId>()
                .with_context(|| format!("invalid stash address {s:?}"))
        })
        .collect()
}

/// Funding key from a file holding a 32-byte hex seed.
pub fn load_signer(path: &Path) -> anyhow::Result<Signer> {
    let seed = Zeroizing::new(
        std::fs::read_to_string(path)
            .with_context(|| format!("cannot read key file {}", path.display()))?,
    );
    Signer::from_seed_hex(&seed)
        .with_context(|| format!("key file {} does not hold a 32-byte hex seed", path.display()))
}
