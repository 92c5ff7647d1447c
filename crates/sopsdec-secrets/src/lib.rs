//! sopsdec-secrets: SOPS document decryption
//!
//! Decryption flow:
//!   1. Ask the [`KeyProvider`] whether it recognizes the document's key entries
//!   2. Unwrap the 32-byte data key through the provider (the only I/O)
//!   3. Walk every leaf outside `sops`, decrypting with AAD = leaf path
//!   4. Rebuild the tree at the original paths
//!   5. Recompute the SHA-512 digest and check it against `sops.mac`
//!
//! Any failure aborts the whole call; there is no partial output.

pub mod client;
pub mod document;
pub mod engine;
pub mod gcp_kms;
pub mod provider;
pub mod static_key;

pub use client::SopsClient;
pub use document::{load_document, parse_document, DocumentFormat};
pub use engine::DecryptionEngine;
pub use gcp_kms::{GcpKmsKeyProvider, KmsClient, GCP_KMS_SCHEME};
pub use provider::KeyProvider;
pub use static_key::StaticKeyProvider;

pub use sopsdec_core::{DecryptConfig, SopsError, SopsResult, Value};
pub use sopsdec_crypto::DataKey;
