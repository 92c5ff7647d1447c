//! Document MAC
//!
//! The MAC is the hex SHA-512 of every decrypted leaf's canonical string,
//! fed in traversal order, stored encrypted under `sops.mac` with the
//! `lastmodified` timestamp as AAD. Any reordering, insertion, removal or
//! substitution of leaves changes the digest.

use sha2::{Digest, Sha512};
use sopsdec_core::{MacField, SopsError, SopsMetadata, SopsResult, Value};
use tracing::{debug, warn};

use crate::codec::EncryptedScalar;
use crate::key::DataKey;

/// Field name used in errors and logs for the MAC slot.
const MAC_FIELD: &str = "sops.mac";

/// Outcome of a successful verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacStatus {
    /// The recorded MAC matched the recomputed digest.
    Verified,
    /// The document carries no MAC; nothing was checked.
    Absent,
}

/// Running SHA-512 over leaf values.
#[derive(Clone, Default)]
pub struct MacDigest {
    hasher: Sha512,
    leaves: usize,
}

impl std::fmt::Debug for MacDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MacDigest")
            .field("leaves", &self.leaves)
            .finish_non_exhaustive()
    }
}

impl MacDigest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, leaf: &Value) {
        self.hasher.update(leaf.canonical_string().as_bytes());
        self.leaves += 1;
    }

    /// Number of leaves fed so far.
    pub fn leaves(&self) -> usize {
        self.leaves
    }

    /// Uppercase hex, as SOPS writes it.
    pub fn finalize(self) -> String {
        hex::encode_upper(self.hasher.finalize())
    }
}

/// Check a finished digest against the document's recorded MAC.
///
/// Only a missing or `null` MAC skips the check. A MAC that is not an
/// encrypted string, cannot be authenticated, or decrypts to a non-string
/// is reported as [`SopsError::ChecksumMismatch`]: from the document's
/// point of view the checksum does not hold.
pub fn verify_digest(metadata: &SopsMetadata, digest: &str, key: &DataKey) -> SopsResult<MacStatus> {
    let encoded = match metadata.mac() {
        MacField::Absent => return Ok(MacStatus::Absent),
        MacField::Encoded(encoded) => encoded,
        MacField::Invalid(kind) => {
            warn!(field = MAC_FIELD, kind, "MAC is not a string");
            return Err(SopsError::ChecksumMismatch);
        }
    };
    let Some(scalar) = EncryptedScalar::parse(encoded) else {
        warn!(field = MAC_FIELD, "MAC is not an encrypted value");
        return Err(SopsError::ChecksumMismatch);
    };

    let aad = metadata.last_modified().unwrap_or_default();
    let recorded = match scalar.decrypt(key, aad) {
        Ok(Value::String(recorded)) => recorded,
        Ok(other) => {
            warn!(field = MAC_FIELD, kind = other.type_name(), "MAC does not decrypt to a string");
            return Err(SopsError::ChecksumMismatch);
        }
        Err(e) => {
            warn!(field = MAC_FIELD, error = %e, "MAC could not be decrypted");
            return Err(SopsError::ChecksumMismatch);
        }
    };

    if !recorded.eq_ignore_ascii_case(digest) {
        return Err(SopsError::ChecksumMismatch);
    }

    debug!("document MAC verified");
    Ok(MacStatus::Verified)
}

/// Recompute the digest over `leaves` (already decrypted, in traversal
/// order) and check it against the recorded MAC.
pub fn verify<'a>(
    metadata: &SopsMetadata,
    leaves: impl IntoIterator<Item = &'a Value>,
    key: &DataKey,
) -> SopsResult<MacStatus> {
    let mut digest = MacDigest::new();
    for leaf in leaves {
        digest.update(leaf);
    }
    verify_digest(metadata, &digest.finalize(), key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::encrypt_scalar;
    use crate::KEY_SIZE;

    const LAST_MODIFIED: &str = "2024-01-02T03:04:05Z";

    fn test_key() -> DataKey {
        DataKey::from_bytes([0x42u8; KEY_SIZE])
    }

    fn leaves() -> Vec<Value> {
        vec![
            Value::from("secret"),
            Value::Integer(42),
            Value::Float(1.5),
            Value::Bool(true),
        ]
    }

    fn digest_of(values: &[Value]) -> String {
        let mut digest = MacDigest::new();
        values.iter().for_each(|v| digest.update(v));
        digest.finalize()
    }

    fn metadata_with_mac(mac: Option<String>) -> SopsMetadata {
        metadata_with_mac_value(mac.map(Value::String))
    }

    fn metadata_with_mac_value(mac: Option<Value>) -> SopsMetadata {
        let mut block = sopsdec_core::Map::new();
        if let Some(mac) = mac {
            block.insert("mac".into(), mac);
        }
        block.insert("lastmodified".into(), Value::from(LAST_MODIFIED));
        let mut doc = sopsdec_core::Map::new();
        doc.insert("sops".into(), Value::Object(block));
        SopsMetadata::from_document(&Value::Object(doc)).unwrap()
    }

    #[test]
    fn test_digest_matches_manual_sha512() {
        let mut hasher = Sha512::new();
        for part in ["secret", "42", "1.5", "true"] {
            hasher.update(part.as_bytes());
        }
        assert_eq!(digest_of(&leaves()), hex::encode_upper(hasher.finalize()));
    }

    #[test]
    fn test_digest_is_order_sensitive() {
        let mut reordered = leaves();
        reordered.swap(0, 1);
        assert_ne!(digest_of(&leaves()), digest_of(&reordered));
    }

    #[test]
    fn test_verify_matching_mac() {
        let key = test_key();
        let mac = encrypt_scalar(&Value::String(digest_of(&leaves())), &key, LAST_MODIFIED).unwrap();
        let status = verify(&metadata_with_mac(Some(mac)), &leaves(), &key).unwrap();
        assert_eq!(status, MacStatus::Verified);
    }

    #[test]
    fn test_verify_is_case_insensitive() {
        let key = test_key();
        let lower = digest_of(&leaves()).to_lowercase();
        let mac = encrypt_scalar(&Value::String(lower), &key, LAST_MODIFIED).unwrap();
        assert_eq!(
            verify(&metadata_with_mac(Some(mac)), &leaves(), &key).unwrap(),
            MacStatus::Verified
        );
    }

    #[test]
    fn test_verify_mismatch() {
        let key = test_key();
        let mac = encrypt_scalar(&Value::String(digest_of(&leaves())), &key, LAST_MODIFIED).unwrap();
        let mut changed = leaves();
        changed[1] = Value::Integer(43);
        let err = verify(&metadata_with_mac(Some(mac)), &changed, &key).unwrap_err();
        assert!(matches!(err, SopsError::ChecksumMismatch));
    }

    #[test]
    fn test_mac_bound_to_last_modified() {
        let key = test_key();
        let mac = encrypt_scalar(&Value::String(digest_of(&leaves())), &key, "1999-01-01T00:00:00Z")
            .unwrap();
        let err = verify(&metadata_with_mac(Some(mac)), &leaves(), &key).unwrap_err();
        assert!(matches!(err, SopsError::ChecksumMismatch));
    }

    #[test]
    fn test_non_string_mac_is_mismatch() {
        let key = test_key();
        let mac = encrypt_scalar(&Value::Integer(7), &key, LAST_MODIFIED).unwrap();
        let err = verify(&metadata_with_mac(Some(mac)), &leaves(), &key).unwrap_err();
        assert!(matches!(err, SopsError::ChecksumMismatch));
    }

    #[test]
    fn test_absent_mac_skips_verification() {
        let status = verify(&metadata_with_mac(None), &leaves(), &test_key()).unwrap();
        assert_eq!(status, MacStatus::Absent);
    }

    #[test]
    fn test_null_mac_skips_verification() {
        let status = verify(&metadata_with_mac_value(Some(Value::Null)), &leaves(), &test_key()).unwrap();
        assert_eq!(status, MacStatus::Absent);
    }

    #[test]
    fn test_wrong_type_mac_is_mismatch() {
        let mut block = sopsdec_core::Map::new();
        block.insert("k".into(), Value::from("v"));
        for mac in [
            Value::Integer(0),
            Value::Bool(true),
            Value::Array(vec![]),
            Value::Object(block),
        ] {
            let err = verify(&metadata_with_mac_value(Some(mac)), &leaves(), &test_key()).unwrap_err();
            assert!(matches!(err, SopsError::ChecksumMismatch));
        }
    }

    #[test]
    fn test_plaintext_mac_is_mismatch() {
        let err = verify(&metadata_with_mac(Some(digest_of(&leaves()))), &leaves(), &test_key())
            .unwrap_err();
        assert!(matches!(err, SopsError::ChecksumMismatch));
    }
}
