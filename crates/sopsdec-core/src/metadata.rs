//! The reserved `sops` block
//!
//! ```yaml
//! sops:
//!   gcp_kms:
//!     - resource_id: projects/p/locations/l/keyRings/r/cryptoKeys/k
//!       created_at: "2024-01-01T00:00:00Z"
//!       enc: CiQA...   # wrapped data key, base64
//!   mac: ENC[AES256_GCM,data:...,iv:...,tag:...,type:str]
//!   lastmodified: "2024-01-01T00:00:00Z"
//!   version: 3.7.3
//! ```

use tracing::debug;

use crate::value::{Map, Value};

/// Top-level key holding the metadata block.
pub const METADATA_KEY: &str = "sops";

/// State of the `sops.mac` slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacField<'a> {
    /// Missing or `null`.
    Absent,
    Encoded(&'a str),
    /// Present but not a string; carries the node's type name.
    Invalid(&'static str),
}

/// One wrapped copy of the data key, as recorded for a key-management scheme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEntry {
    pub resource_id: String,
    pub created_at: Option<String>,
    /// Base64 ciphertext of the data key.
    pub enc: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SopsMetadata {
    block: Map,
}

impl SopsMetadata {
    /// Read the metadata block of `document`. `None` if the document is not
    /// an object or has no object under `sops`.
    pub fn from_document(document: &Value) -> Option<Self> {
        document
            .get(METADATA_KEY)
            .and_then(Value::as_object)
            .map(|block| Self {
                block: block.clone(),
            })
    }

    /// Encrypted MAC slot. Only a missing or `null` entry counts as absent.
    pub fn mac(&self) -> MacField<'_> {
        match self.block.get("mac") {
            None | Some(Value::Null) => MacField::Absent,
            Some(Value::String(encoded)) => MacField::Encoded(encoded),
            Some(other) => MacField::Invalid(other.type_name()),
        }
    }

    /// The `lastmodified` timestamp the MAC is bound to.
    pub fn last_modified(&self) -> Option<&str> {
        self.block.get("lastmodified").and_then(Value::as_str)
    }

    /// Informational only; never validated.
    pub fn version(&self) -> Option<&str> {
        self.block.get("version").and_then(Value::as_str)
    }

    /// Key entries listed under `scheme` (`gcp_kms`, `kms`, `age`, ...), in
    /// declaration order. Entries without a string `enc` are skipped.
    pub fn key_entries(&self, scheme: &str) -> Vec<KeyEntry> {
        let Some(entries) = self.block.get(scheme).and_then(Value::as_array) else {
            return Vec::new();
        };

        entries
            .iter()
            .enumerate()
            .filter_map(|(index, entry)| {
                let enc = entry.get("enc").and_then(Value::as_str);
                if enc.is_none() {
                    debug!(scheme, index, "skipping key entry without 'enc'");
                }
                Some(KeyEntry {
                    resource_id: entry
                        .get("resource_id")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string(),
                    created_at: entry
                        .get("created_at")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                    enc: enc?.to_string(),
                })
            })
            .collect()
    }

    /// True when `scheme` lists at least one entry, usable or not.
    pub fn has_scheme(&self, scheme: &str) -> bool {
        self.block
            .get(scheme)
            .and_then(Value::as_array)
            .is_some_and(|entries| !entries.is_empty())
    }
}
