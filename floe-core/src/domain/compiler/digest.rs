// floe-core/src/domain/compiler/digest.rs

use crate::domain::error::DomainError;
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Compact JSON with object keys sorted at every level.
///
/// Going through `serde_json::Value` normalises key order: its map is a
/// BTreeMap, whatever order the struct fields were declared in.
pub fn canonical_bytes<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, DomainError> {
    let normalised = serde_json::to_value(value)?;
    Ok(serde_json::to_vec(&normalised)?)
}

pub fn sha256_digest(bytes: &[u8]) -> String {
    format!("sha256:{}", hex::encode(Sha256::digest(bytes)))
}

/// Hex part of a `sha256:<hex>` digest, if well formed. Only lowercase hex
/// is accepted, matching what [`sha256_digest`] produces.
pub fn digest_hex(digest: &str) -> Option<&str> {
    digest.strip_prefix("sha256:").filter(|hex| {
        hex.len() == 64 && hex.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    #[test]
    fn test_key_order_does_not_change_bytes() {
        let mut a = HashMap::new();
        a.insert("zeta", 1);
        a.insert("alpha", 2);
        let b = json!({"alpha": 2, "zeta": 1});
        assert_eq!(canonical_bytes(&a).unwrap(), canonical_bytes(&b).unwrap());
        assert_eq!(canonical_bytes(&b).unwrap(), br#"{"alpha":2,"zeta":1}"#.to_vec());
    }

    #[test]
    fn test_digest_shape() {
        let d = sha256_digest(b"");
        assert_eq!(
            d,
            "sha256:e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert!(digest_hex(&d).is_some());
        assert!(digest_hex("sha256:xyz").is_none());
        assert!(digest_hex("md5:e3b0").is_none());
    }

    #[test]
    fn test_uppercase_hex_is_rejected() {
        let d = sha256_digest(b"");
        let shouted = format!("sha256:{}", digest_hex(&d).unwrap().to_uppercase());
        assert!(digest_hex(&shouted).is_none());
    }
}
