//! Decryption orchestration
//!
//! Key → walk → decrypt each leaf → rebuild → verify MAC. Every step is a
//! hard precondition for the next.

use sopsdec_core::{
    walk_excluding, DecryptConfig, SopsError, SopsMetadata, SopsResult, TreeBuilder, Value,
    METADATA_KEY,
};
use sopsdec_crypto::{decrypt_scalar, verify_digest, DataKey, MacDigest, MacStatus};
use tracing::{debug, info, warn};

use crate::provider::KeyProvider;

/// Stateless between calls: each call owns its key and output tree, so one
/// engine can serve concurrent decryptions.
#[derive(Debug, Clone, Default)]
pub struct DecryptionEngine {
    config: DecryptConfig,
}

impl DecryptionEngine {
    pub fn new(config: DecryptConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DecryptConfig {
        &self.config
    }

    /// Decrypt `document` with a key obtained from `provider`.
    ///
    /// Fails with [`SopsError::KeyNotSupported`] before any provider I/O if
    /// the provider does not recognize the document's key entries.
    pub async fn decrypt<P>(&self, document: &Value, provider: &P) -> SopsResult<Value>
    where
        P: KeyProvider + ?Sized,
    {
        if !provider.can_supply(document) {
            return Err(SopsError::KeyNotSupported);
        }
        self.check_depth(document)?;

        let key = provider
            .unwrap_key(document)
            .await
            .map_err(SopsError::Provider)?;

        self.decrypt_tree(document, &key)
    }

    /// Decrypt `document` with a data key that is already available.
    pub fn decrypt_with_key(&self, document: &Value, key: &DataKey) -> SopsResult<Value> {
        self.check_depth(document)?;
        self.decrypt_tree(document, key)
    }

    fn check_depth(&self, document: &Value) -> SopsResult<()> {
        if document.depth() > self.config.max_depth {
            return Err(SopsError::TooDeep {
                max_depth: self.config.max_depth,
            });
        }
        Ok(())
    }

    fn decrypt_tree(&self, document: &Value, key: &DataKey) -> SopsResult<Value> {
        let mut builder = TreeBuilder::with_shape_of(document, Some(METADATA_KEY));
        let mut digest = MacDigest::new();

        for (path, leaf) in walk_excluding(document, METADATA_KEY) {
            let field = path.to_string();
            let value = match leaf {
                Value::String(encoded) => {
                    decrypt_scalar(encoded, key, &field).map_err(|e| e.at(&field))?
                }
                plain => plain.clone(),
            };
            debug!(path = %field, "decrypted leaf");

            digest.update(&value);
            builder.insert(&path, value)?;
        }

        let leaves = digest.leaves();
        let metadata = SopsMetadata::from_document(document);
        if let Some(version) = metadata.as_ref().and_then(SopsMetadata::version) {
            debug!(version, "sops metadata");
        }
        let status = match metadata {
            Some(metadata) => verify_digest(&metadata, &digest.finalize(), key)?,
            None => MacStatus::Absent,
        };

        if status == MacStatus::Absent {
            if self.config.require_mac {
                return Err(SopsError::MacMissing);
            }
            warn!("document has no MAC; skipping integrity check");
        }

        info!(leaves, mac = ?status, "decrypted SOPS document");
        Ok(builder.finish())
    }
}
