//! One provider paired with one engine

use std::path::Path;

use anyhow::Context;
use serde::de::DeserializeOwned;
use sopsdec_core::{DecryptConfig, SopsError, SopsResult, Value};

use crate::document::load_document;
use crate::engine::DecryptionEngine;
use crate::provider::KeyProvider;

/// Entry point for applications: holds the key provider chosen for their
/// documents and decrypts trees, files, or typed structs.
pub struct SopsClient<P> {
    provider: P,
    engine: DecryptionEngine,
}

impl<P: KeyProvider> SopsClient<P> {
    pub fn new(provider: P) -> Self {
        Self::with_config(provider, DecryptConfig::default())
    }

    pub fn with_config(provider: P, config: DecryptConfig) -> Self {
        Self {
            provider,
            engine: DecryptionEngine::new(config),
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn engine(&self) -> &DecryptionEngine {
        &self.engine
    }

    pub async fn decrypt(&self, document: &Value) -> SopsResult<Value> {
        self.engine.decrypt(document, &self.provider).await
    }

    /// Decrypt, then deserialize the result into `T`.
    pub async fn decrypt_as<T: DeserializeOwned>(&self, document: &Value) -> SopsResult<T> {
        let decrypted = self.decrypt(document).await?;
        let json = serde_json::to_value(&decrypted).context("converting decrypted document");
        json.and_then(|json| {
            serde_json::from_value(json).context("deserializing decrypted document")
        })
        .map_err(SopsError::Document)
    }

    /// Load a JSON or YAML SOPS file and decrypt it.
    pub async fn decrypt_file(&self, path: &Path) -> SopsResult<Value> {
        let document = load_document(path).await.map_err(SopsError::Document)?;
        self.decrypt(&document).await
    }
}
