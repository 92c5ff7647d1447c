//! Google Cloud KMS key provider
//!
//! Each `sops.gcp_kms[]` entry holds the data key encrypted by a Cloud KMS
//! crypto key:
//! ```yaml
//! gcp_kms:
//!   - resource_id: projects/<p>/locations/<l>/keyRings/<r>/cryptoKeys/<k>
//!     created_at: "2024-01-01T00:00:00Z"
//!     enc: CiQA...   # base64 KMS ciphertext
//! ```
//! The KMS transport (auth, retries, timeouts) lives behind [`KmsClient`].

use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as B64, Engine};
use sopsdec_core::{KeyEntry, SopsMetadata, Value};
use sopsdec_crypto::DataKey;
use tracing::{debug, warn};

use crate::provider::KeyProvider;

/// Metadata key listing Cloud KMS entries.
pub const GCP_KMS_SCHEME: &str = "gcp_kms";

/// The single KMS call the provider needs: ciphertext in, plaintext out.
#[async_trait]
pub trait KmsClient: Send + Sync {
    /// Decrypt `ciphertext` with the crypto key named `key_name`.
    async fn decrypt(&self, key_name: &str, ciphertext: &[u8]) -> Result<Vec<u8>>;
}

pub struct GcpKmsKeyProvider<C> {
    client: C,
}

impl<C: KmsClient> GcpKmsKeyProvider<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    async fn unwrap_entry(&self, entry: &KeyEntry) -> Result<DataKey> {
        let ciphertext = B64
            .decode(&entry.enc)
            .with_context(|| format!("base64 decode enc for {}", entry.resource_id))?;

        let plaintext = self
            .client
            .decrypt(&entry.resource_id, &ciphertext)
            .await
            .with_context(|| format!("KMS decrypt with {}", entry.resource_id))?;

        Ok(DataKey::try_from(plaintext)?)
    }
}

#[async_trait]
impl<C: KmsClient> KeyProvider for GcpKmsKeyProvider<C> {
    fn can_supply(&self, document: &Value) -> bool {
        SopsMetadata::from_document(document).is_some_and(|meta| meta.has_scheme(GCP_KMS_SCHEME))
    }

    /// Entries are tried in declaration order; the first that unwraps wins.
    /// If every entry fails, the last failure is returned.
    async fn unwrap_key(&self, document: &Value) -> Result<DataKey> {
        let metadata = SopsMetadata::from_document(document)
            .context("no 'sops' block in document (is this a SOPS file?)")?;
        let entries = metadata.key_entries(GCP_KMS_SCHEME);

        let mut last_error = None;
        for entry in &entries {
            match self.unwrap_entry(entry).await {
                Ok(key) => {
                    debug!(resource_id = %entry.resource_id, "unwrapped data key via Cloud KMS");
                    return Ok(key);
                }
                Err(e) => {
                    warn!(resource_id = %entry.resource_id, error = %e, "Cloud KMS entry failed");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| anyhow::anyhow!("sops.gcp_kms has no entry with 'enc'")))
    }
}
