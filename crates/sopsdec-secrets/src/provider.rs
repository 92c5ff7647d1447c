//! Key provider capability
//!
//! A provider owns one key-management scheme. It reads its own entries from
//! the document's `sops` block and turns one of them into the raw data key.
//! Callers pick the provider; the engine never tries more than one.

use std::sync::Arc;

use async_trait::async_trait;
use sopsdec_core::Value;
use sopsdec_crypto::DataKey;

#[async_trait]
pub trait KeyProvider: Send + Sync {
    /// True iff the document's metadata has key entries this provider
    /// recognizes. Must not perform I/O.
    fn can_supply(&self, document: &Value) -> bool;

    /// Recover the data key. Errors (network, permission, not found) are
    /// handed to the caller unchanged.
    async fn unwrap_key(&self, document: &Value) -> anyhow::Result<DataKey>;
}

#[async_trait]
impl<T> KeyProvider for Arc<T>
where
    T: KeyProvider + ?Sized,
{
    fn can_supply(&self, document: &Value) -> bool {
        (**self).can_supply(document)
    }

    async fn unwrap_key(&self, document: &Value) -> anyhow::Result<DataKey> {
        (**self).unwrap_key(document).await
    }
}

#[async_trait]
impl<T> KeyProvider for Box<T>
where
    T: KeyProvider + ?Sized,
{
    fn can_supply(&self, document: &Value) -> bool {
        (**self).can_supply(document)
    }

    async fn unwrap_key(&self, document: &Value) -> anyhow::Result<DataKey> {
        (**self).unwrap_key(document).await
    }
}
