//! Provider for a data key that is already in hand

use async_trait::async_trait;
use sopsdec_core::{SopsMetadata, Value};
use sopsdec_crypto::DataKey;

use crate::gcp_kms::GCP_KMS_SCHEME;
use crate::provider::KeyProvider;

/// Hands out a fixed data key for documents that list entries under one
/// scheme. Useful when the key was unwrapped out of band.
#[derive(Debug, Clone)]
pub struct StaticKeyProvider {
    key: DataKey,
    scheme: String,
}

impl StaticKeyProvider {
    /// Serve documents encrypted for `gcp_kms`.
    pub fn new(key: DataKey) -> Self {
        Self::for_scheme(GCP_KMS_SCHEME, key)
    }

    pub fn for_scheme(scheme: impl Into<String>, key: DataKey) -> Self {
        Self {
            key,
            scheme: scheme.into(),
        }
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }
}

#[async_trait]
impl KeyProvider for StaticKeyProvider {
    fn can_supply(&self, document: &Value) -> bool {
        SopsMetadata::from_document(document).is_some_and(|meta| meta.has_scheme(&self.scheme))
    }

    async fn unwrap_key(&self, _document: &Value) -> anyhow::Result<DataKey> {
        Ok(self.key.clone())
    }
}
