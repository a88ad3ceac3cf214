//! Chain account identifiers.
//!
//! An [`AccountId`] is 32 opaque bytes. Equality is byte-exact; the hex
//! rendering (`0x` followed by 64 lowercase digits) is for presentation and
//! for the JSON forms used by config files and the chain gateway.
//!
//! Parsing also accepts SS58 addresses under any network prefix, so stash
//! lists copied from wallets and explorers work unchanged.

use std::fmt;
use std::str::FromStr;

use blake2::{Blake2b512, Digest};
use serde_with::{DeserializeFromStr, SerializeDisplay};

use crate::{TypesError, ACCOUNT_ID_LEN};

/// A chain account: validator stash, nominator or funding account.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, SerializeDisplay, DeserializeFromStr)]
pub struct AccountId([u8; ACCOUNT_ID_LEN]);

impl AccountId {
    /// Wrap raw account bytes.
    pub const fn new(bytes: [u8; ACCOUNT_ID_LEN]) -> Self {
        Self(bytes)
    }

    /// Raw account bytes.
    pub fn as_bytes(&self) -> &[u8; ACCOUNT_ID_LEN] {
        &self.0
    }

    /// Decode an SS58 address: network prefix, key, two checksum bytes.
    pub fn from_ss58(address: &str) -> Result<Self, TypesError> {
        let data = bs58::decode(address)
            .into_vec()
            .map_err(|e| TypesError::InvalidAddress(e.to_string()))?;
        let prefix_len = match data.first().copied() {
            Some(0..=63) => 1,
            Some(64..=127) => 2,
            _ => return Err(TypesError::InvalidAddress("unknown network prefix".into())),
        };
        if data.len() != prefix_len + ACCOUNT_ID_LEN + SS58_CHECKSUM_LEN {
            return Err(TypesError::InvalidLength {
                expected: prefix_len + ACCOUNT_ID_LEN + SS58_CHECKSUM_LEN,
                actual: data.len(),
            });
        }

        let (body, checksum) = data.split_at(prefix_len + ACCOUNT_ID_LEN);
        if checksum != ss58_checksum(body).as_slice() {
            return Err(TypesError::InvalidAddress("checksum mismatch".into()));
        }
        let mut key = [0u8; ACCOUNT_ID_LEN];
        key.copy_from_slice(&body[prefix_len..]);
        Ok(Self(key))
    }

    fn from_hex(digits: &str) -> Result<Self, TypesError> {
        let bytes = hex::decode(digits).map_err(|e| TypesError::InvalidHex(e.to_string()))?;
        let actual = bytes.len();
        let array: [u8; ACCOUNT_ID_LEN] =
            bytes.try_into().map_err(|_| TypesError::InvalidLength {
                expected: ACCOUNT_ID_LEN,
                actual,
            })?;
        Ok(Self(array))
    }
}

const SS58_CHECKSUM_LEN: usize = 2;

fn ss58_checksum(body: &[u8]) -> [u8; SS58_CHECKSUM_LEN] {
    let mut hasher = Blake2b512::new();
    hasher.update(b"SS58PRE");
    hasher.update(body);
    let digest = hasher.finalize();
    [digest[0], digest[1]]
}

impl From<[u8; ACCOUNT_ID_LEN]> for AccountId {
    fn from(bytes: [u8; ACCOUNT_ID_LEN]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountId({self})")
    }
}

impl FromStr for AccountId {
    type Err = TypesError;

    /// `0x`-hex, bare 64-digit hex, or SS58.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Some(digits) = trimmed.strip_prefix("0x") {
            return Self::from_hex(digits);
        }
        if trimmed.len() == 2 * ACCOUNT_ID_LEN && trimmed.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Self::from_hex(trimmed);
        }
        Self::from_ss58(trimmed)
    }
}
