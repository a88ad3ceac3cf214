//! CBOR serialization helpers for transaction encoding.
//!
//! Wraps [`ciborium`]. Signed transactions and the calls inside their
//! signing payload are CBOR (RFC 8949) encoded.

use serde::{de::DeserializeOwned, Serialize};

use crate::ChainError;

/// Serialize a value to CBOR bytes, naming the type in the error.
///
/// # Errors
///
/// Returns [`ChainError::Encoding`] if the value cannot be serialized.
pub fn to_vec_named<T: Serialize>(value: &T, type_name: &str) -> Result<Vec<u8>, ChainError> {
    let mut buf = Vec::new();
    ciborium::into_writer(value, &mut buf).map_err(|e| {
        ChainError::Encoding(format!("CBOR serialization of {type_name} failed: {e}"))
    })?;
    Ok(buf)
}

/// Deserialize a value from CBOR bytes, naming the type in the error.
///
/// # Errors
///
/// Returns [`ChainError::Decode`] if the bytes cannot be deserialized into
/// the target type.
pub fn from_slice_named<T: DeserializeOwned>(
    data: &[u8],
    type_name: &str,
) -> Result<T, ChainError> {
    ciborium::from_reader(data).map_err(|e| {
        ChainError::Decode(format!("CBOR deserialization of {type_name} failed: {e}"))
    })
}
