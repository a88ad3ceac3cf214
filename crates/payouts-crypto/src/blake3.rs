//! Domain-separated BLAKE3 hashing.
//!
//! Every digest is taken in `derive_key` mode under one of the registered
//! [`contexts`], so a signing payload can never collide with a transaction
//! hash. Multi-part inputs are framed with [`encode_multi_field`].

/// Registered context strings. Each purpose gets its own domain.
pub mod contexts {
    pub const TX_SIGNING_PAYLOAD: &str = "staking-payouts v1 tx-signing-payload";
    pub const TX_HASH: &str = "staking-payouts v1 tx-hash";

    /// All registered context strings.
    pub const ALL_CONTEXTS: &[&str] = &[TX_SIGNING_PAYLOAD, TX_HASH];
}

/// Derive a 32-byte digest bound to `context`.
///
/// # Arguments
///
/// * `context` - A registered context string from [`contexts`]
/// * `key_material` - The input bytes
pub fn derive_key(context: &str, key_material: &[u8]) -> [u8; 32] {
    let mut hasher = ::blake3::Hasher::new_derive_key(context);
    hasher.update(key_material);
    *hasher.finalize().as_bytes()
}

/// Encode multiple dynamic fields using length-prefixed encoding.
///
/// `LE32(len(field1)) || field1 || LE32(len(field2)) || field2 || ...`
pub fn encode_multi_field(fields: &[&[u8]]) -> Vec<u8> {
    let total_len: usize = fields.iter().map(|f| 4 + f.len()).sum();
    let mut output = Vec::with_capacity(total_len);
    for field in fields {
        output.extend_from_slice(&(field.len() as u32).to_le_bytes());
        output.extend_from_slice(field);
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_prefix() {
        for ctx in contexts::ALL_CONTEXTS {
            assert!(ctx.starts_with("staking-payouts v1 "));
        }
    }

    #[test]
    fn test_derive_key_deterministic() {
        let ctx = contexts::TX_HASH;
        assert_eq!(derive_key(ctx, b"payload"), derive_key(ctx, b"payload"));
        assert_ne!(derive_key(ctx, b"payload-1"), derive_key(ctx, b"payload-2"));
    }

    #[test]
    fn test_derive_key_separates_domains() {
        let a = derive_key(contexts::TX_SIGNING_PAYLOAD, b"call");
        let b = derive_key(contexts::TX_HASH, b"call");
        assert_ne!(a, b);
        assert_ne!(a, *::blake3::hash(b"call").as_bytes());
    }

    #[test]
    fn test_multi_field_encoding() {
        let encoded = encode_multi_field(&[b"call", b"nonce123"]);
        assert_eq!(encoded.len(), 4 + 4 + 4 + 8);
        assert_eq!(&encoded[0..4], &4u32.to_le_bytes());
        assert_eq!(&encoded[4..8], b"call");
        assert_eq!(&encoded[8..12], &8u32.to_le_bytes());
    }

    #[test]
    fn test_multi_field_is_unambiguous() {
        let a = encode_multi_field(&[b"ab", b"c"]);
        let b = encode_multi_field(&[b"a", b"bc"]);
        assert_ne!(a, b);
    }
}
