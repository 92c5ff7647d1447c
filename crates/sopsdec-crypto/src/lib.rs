//! sopsdec-crypto: per-leaf cryptography for SOPS documents
//!
//! Every leaf is sealed independently with the document's data key:
//! ```text
//! leaf   : AES-256-GCM(key=data_key, nonce=iv, AAD=canonical path)
//! mac    : AES-256-GCM(key=data_key, nonce=iv, AAD=lastmodified)
//!          over hex(SHA-512(canonical leaf strings, traversal order))
//! format : ENC[AES256_GCM,data:<b64>,iv:<b64>,tag:<b64>,type:<str|bytes|int|float|bool>]
//! ```

pub mod codec;
pub mod key;
pub mod mac;

pub use codec::{decrypt_scalar, EncryptedScalar, ScalarError, ScalarType};
pub use key::DataKey;
pub use mac::{verify, verify_digest, MacDigest, MacStatus};

#[cfg(any(test, feature = "test-utils"))]
pub use codec::{encrypt_scalar, encrypt_scalar_with_iv};

/// Size of the data key in bytes (256-bit)
pub const KEY_SIZE: usize = 32;

/// Size of a GCM authentication tag
pub const TAG_SIZE: usize = 16;

/// Nonce size SOPS writes
pub const SOPS_NONCE_SIZE: usize = 32;

/// Standard GCM nonce size, also accepted
pub const GCM_NONCE_SIZE: usize = 12;
