//! Shared fixtures: encrypting plaintext trees into SOPS documents and a
//! scripted Cloud KMS client.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use sopsdec_core::{walk, Map, TreeBuilder, Value, METADATA_KEY};
use sopsdec_crypto::{encrypt_scalar, DataKey, MacDigest, KEY_SIZE};
use sopsdec_secrets::KmsClient;

pub const LAST_MODIFIED: &str = "2024-05-06T07:08:09Z";
pub const PRIMARY_KEY: &str = "projects/p/locations/global/keyRings/r/cryptoKeys/primary";
pub const BACKUP_KEY: &str = "projects/p/locations/global/keyRings/r/cryptoKeys/backup";

pub fn test_key() -> DataKey {
    DataKey::from_bytes([0x5au8; KEY_SIZE])
}

pub fn parse(json: &str) -> Value {
    serde_json::from_str(json).unwrap()
}

/// Plaintext used by most tests.
pub fn secret_fixture() -> Value {
    parse(
        r#"{
            "database": {"user": "admin", "password": "hunter2", "port": 5432},
            "features": {"beta": true, "ratio": 0.75},
            "hosts": ["a.example.com", "b.example.com"],
            "empty": "",
            "nothing": null
        }"#,
    )
}

/// Encrypt every leaf of `plain` under `key` (AAD = leaf path), attach a
/// `sops` block listing `kms_entries` and a MAC over the plaintext leaves.
pub fn encrypt_document_with_entries(plain: &Value, key: &DataKey, kms_entries: &[&str]) -> Value {
    let mut builder = TreeBuilder::with_shape_of(plain, None);
    let mut digest = MacDigest::new();
    for (path, leaf) in walk(plain) {
        digest.update(leaf);
        let sealed = match leaf {
            Value::Null => Value::Null,
            other => Value::String(encrypt_scalar(other, key, &path.to_string()).unwrap()),
        };
        builder.insert(&path, sealed).unwrap();
    }

    let entries = kms_entries
        .iter()
        .map(|resource_id| {
            let mut entry = Map::new();
            entry.insert("resource_id".into(), Value::from(*resource_id));
            entry.insert("created_at".into(), Value::from(LAST_MODIFIED));
            // Base64 of "wrapped"; the stub client ignores the ciphertext.
            entry.insert("enc".into(), Value::from("d3JhcHBlZA=="));
            Value::Object(entry)
        })
        .collect();

    let mac = encrypt_scalar(&Value::String(digest.finalize()), key, LAST_MODIFIED).unwrap();

    let mut sops = Map::new();
    sops.insert("gcp_kms".into(), Value::Array(entries));
    sops.insert("lastmodified".into(), Value::from(LAST_MODIFIED));
    sops.insert("mac".into(), Value::String(mac));
    sops.insert("version".into(), Value::from("3.8.1"));

    let mut document = builder.finish();
    match &mut document {
        Value::Object(map) => {
            map.insert(METADATA_KEY.into(), Value::Object(sops));
        }
        other => panic!("fixture root must be an object, got {}", other.type_name()),
    }
    document
}

pub fn encrypt_document(plain: &Value, key: &DataKey) -> Value {
    encrypt_document_with_entries(plain, key, &[PRIMARY_KEY])
}

fn sops_block(document: &mut Value) -> &mut Map {
    match document {
        Value::Object(map) => match map.get_mut(METADATA_KEY) {
            Some(Value::Object(sops)) => sops,
            _ => panic!("document has no sops block"),
        },
        _ => panic!("document is not an object"),
    }
}

pub fn without_mac(mut document: Value) -> Value {
    sops_block(&mut document).shift_remove("mac");
    document
}

/// Replace the MAC with a well-formed one over a different digest.
pub fn with_wrong_mac(mut document: Value, key: &DataKey) -> Value {
    let forged = encrypt_scalar(&Value::from("0".repeat(128)), key, LAST_MODIFIED).unwrap();
    sops_block(&mut document).insert("mac".into(), Value::String(forged));
    document
}

/// Overwrite the `sops.mac` slot with an arbitrary node.
pub fn with_mac_value(mut document: Value, mac: Value) -> Value {
    sops_block(&mut document).insert("mac".into(), mac);
    document
}

/// Drop the first base64 character of the `data:` segment.
pub fn truncate_data(encoded: &str) -> String {
    let start = encoded.find("data:").unwrap() + "data:".len();
    format!("{}{}", &encoded[..start], &encoded[start + 1..])
}

/// Change the first base64 character of the `data:` segment.
pub fn tamper_data(encoded: &str) -> String {
    let start = encoded.find("data:").unwrap() + "data:".len();
    let original = &encoded[start..start + 1];
    let replacement = if original == "A" { "B" } else { "A" };
    format!("{}{}{}", &encoded[..start], replacement, &encoded[start + 1..])
}

/// Returns the test data key for allowed resource ids, fails for the rest.
pub struct StubKms {
    allowed: Vec<&'static str>,
    key: [u8; KEY_SIZE],
    calls: AtomicUsize,
}

impl StubKms {
    pub fn allowing(allowed: &[&'static str]) -> Self {
        Self {
            allowed: allowed.to_vec(),
            key: *test_key().as_bytes(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KmsClient for StubKms {
    async fn decrypt(&self, key_name: &str, _ciphertext: &[u8]) -> anyhow::Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.allowed.iter().any(|allowed| *allowed == key_name) {
            Ok(self.key.to_vec())
        } else {
            anyhow::bail!("permission denied on {key_name}")
        }
    }
}
