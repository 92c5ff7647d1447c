//! sopsdec-core: shared types for SOPS document decryption
//!
//! A SOPS document is a JSON/YAML tree whose leaves are individually
//! encrypted, plus a reserved top-level `sops` block:
//! ```yaml
//! db:
//!   password: ENC[AES256_GCM,data:...,iv:...,tag:...,type:str]
//!   port: ENC[AES256_GCM,data:...,iv:...,tag:...,type:int]
//! sops:
//!   gcp_kms:
//!     - resource_id: projects/p/locations/global/keyRings/r/cryptoKeys/k
//!       created_at: "2024-01-01T00:00:00Z"
//!       enc: CiQA...
//!   mac: ENC[AES256_GCM,data:...,iv:...,tag:...,type:str]
//!   lastmodified: "2024-01-01T00:00:00Z"
//!   version: 3.7.3
//! ```
//!
//! This crate holds the pieces every other crate agrees on: the [`Value`]
//! tree, the leaf walker and [`TreeBuilder`], the parsed [`SopsMetadata`],
//! [`DecryptConfig`], and the [`SopsError`] taxonomy.

pub mod builder;
pub mod config;
pub mod error;
pub mod metadata;
pub mod path;
pub mod value;

pub use builder::TreeBuilder;
pub use config::DecryptConfig;
pub use error::{SopsError, SopsResult};
pub use metadata::{KeyEntry, MacField, SopsMetadata, METADATA_KEY};
pub use path::{walk, walk_excluding, Leaves, Segment, TreePath};
pub use value::{Map, Value};
