//! SOPS scalar encoding
//!
//! `ENC[AES256_GCM,data:<b64>,iv:<b64>,tag:<b64>,type:<tag>]`
//!
//! Strings that do not match the grammar are plaintext and pass through
//! untouched. Matching strings are authenticated against the AAD they were
//! sealed with; a failed tag check is never recoverable.

use aes_gcm::aead::consts::U32;
use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::aes::Aes256;
use aes_gcm::{Aes256Gcm, AesGcm, Nonce};
use base64::{engine::general_purpose::STANDARD as B64, Engine};
use sopsdec_core::{SopsError, Value};
use thiserror::Error;

use crate::key::DataKey;
use crate::{GCM_NONCE_SIZE, SOPS_NONCE_SIZE, TAG_SIZE};

/// AES-256-GCM with the 32-byte nonce SOPS uses.
type SopsAesGcm = AesGcm<Aes256, U32>;

const PREFIX: &str = "ENC[AES256_GCM,data:";
const SUFFIX: &str = "]";

/// Codec failure, not yet attached to a document field.
#[derive(Debug, Error)]
pub enum ScalarError {
    #[error("authentication failed")]
    Authentication,

    #[error("unknown scalar type '{0}'")]
    UnknownType(String),

    #[error("cleartext is not a valid {0}")]
    MalformedNumber(&'static str),

    #[error("{0}")]
    Malformed(String),
}

impl ScalarError {
    /// Attach the field (canonical path, or `sops.mac`) the error occurred at.
    pub fn at(self, field: impl Into<String>) -> SopsError {
        let field = field.into();
        match self {
            ScalarError::Authentication => SopsError::AuthenticationFailure { field },
            ScalarError::UnknownType(type_tag) => SopsError::UnknownScalarType { field, type_tag },
            ScalarError::MalformedNumber(kind) => SopsError::MalformedNumber { field, kind },
            ScalarError::Malformed(reason) => SopsError::MalformedScalar { field, reason },
        }
    }
}

/// Declared type of an encrypted leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    Bytes,
    Str,
    Int,
    Float,
    Bool,
}

impl ScalarType {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "bytes" => Some(ScalarType::Bytes),
            "str" => Some(ScalarType::Str),
            "int" => Some(ScalarType::Int),
            "float" => Some(ScalarType::Float),
            "bool" => Some(ScalarType::Bool),
            _ => None,
        }
    }

    pub fn as_tag(self) -> &'static str {
        match self {
            ScalarType::Bytes => "bytes",
            ScalarType::Str => "str",
            ScalarType::Int => "int",
            ScalarType::Float => "float",
            ScalarType::Bool => "bool",
        }
    }

    /// Turn authenticated cleartext into a typed value.
    ///
    /// `bool` is permissive: anything other than the literal `true` is false.
    pub fn coerce(self, cleartext: String) -> Result<Value, ScalarError> {
        match self {
            ScalarType::Bytes | ScalarType::Str => Ok(Value::String(cleartext)),
            ScalarType::Int => cleartext
                .parse::<i64>()
                .map(Value::Integer)
                .map_err(|_| ScalarError::MalformedNumber("int")),
            ScalarType::Float => cleartext
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|_| ScalarError::MalformedNumber("float")),
            ScalarType::Bool => Ok(Value::Bool(cleartext == "true")),
        }
    }
}

/// The four base64/tag segments of an encoded leaf, borrowed from the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncryptedScalar<'a> {
    pub data: &'a str,
    pub iv: &'a str,
    pub tag: &'a str,
    pub type_tag: &'a str,
}

impl<'a> EncryptedScalar<'a> {
    /// Match the encoding grammar. `None` means the string is plaintext.
    ///
    /// `data` may be empty (an encrypted empty string); the other segments
    /// may not.
    pub fn parse(encoded: &'a str) -> Option<Self> {
        let inner = encoded.strip_prefix(PREFIX)?.strip_suffix(SUFFIX)?;
        let (rest, type_tag) = inner.rsplit_once(",type:")?;
        let (rest, tag) = rest.rsplit_once(",tag:")?;
        let (data, iv) = rest.rsplit_once(",iv:")?;

        if iv.is_empty() || tag.is_empty() || type_tag.is_empty() {
            return None;
        }

        Some(Self {
            data,
            iv,
            tag,
            type_tag,
        })
    }

    /// Authenticate and decrypt with `aad`, then coerce by the type tag.
    pub fn decrypt(&self, key: &DataKey, aad: &str) -> Result<Value, ScalarError> {
        let ciphertext = decode_segment("data", self.data)?;
        let iv = decode_segment("iv", self.iv)?;
        let tag = decode_segment("tag", self.tag)?;

        if tag.len() != TAG_SIZE {
            return Err(ScalarError::Malformed(format!(
                "tag must be {TAG_SIZE} bytes, got {}",
                tag.len()
            )));
        }

        // aes-gcm expects ciphertext || tag
        let mut sealed = ciphertext;
        sealed.extend_from_slice(&tag);

        let payload = Payload {
            msg: &sealed,
            aad: aad.as_bytes(),
        };
        let plaintext = open(key, &iv, payload)?;

        let cleartext = String::from_utf8(plaintext)
            .map_err(|_| ScalarError::Malformed("cleartext is not valid UTF-8".into()))?;

        ScalarType::from_tag(self.type_tag)
            .ok_or_else(|| ScalarError::UnknownType(self.type_tag.to_string()))?
            .coerce(cleartext)
    }
}

/// Decrypt one encoded leaf, or hand back plaintext strings unchanged.
pub fn decrypt_scalar(encoded: &str, key: &DataKey, aad: &str) -> Result<Value, ScalarError> {
    match EncryptedScalar::parse(encoded) {
        Some(scalar) => scalar.decrypt(key, aad),
        None => Ok(Value::String(encoded.to_string())),
    }
}

fn decode_segment(name: &str, segment: &str) -> Result<Vec<u8>, ScalarError> {
    B64.decode(segment)
        .map_err(|e| ScalarError::Malformed(format!("base64 decode {name}: {e}")))
}

fn open(key: &DataKey, iv: &[u8], payload: Payload<'_, '_>) -> Result<Vec<u8>, ScalarError> {
    let result = match iv.len() {
        SOPS_NONCE_SIZE => SopsAesGcm::new_from_slice(key.as_bytes())
            .map_err(|e| ScalarError::Malformed(format!("creating AES-256-GCM cipher: {e}")))?
            .decrypt(Nonce::<U32>::from_slice(iv), payload),
        GCM_NONCE_SIZE => Aes256Gcm::new_from_slice(key.as_bytes())
            .map_err(|e| ScalarError::Malformed(format!("creating AES-256-GCM cipher: {e}")))?
            .decrypt(Nonce::from_slice(iv), payload),
        n => {
            return Err(ScalarError::Malformed(format!(
                "IV must be {SOPS_NONCE_SIZE} or {GCM_NONCE_SIZE} bytes, got {n}"
            )))
        }
    };
    result.map_err(|_| ScalarError::Authentication)
}

#[cfg(any(test, feature = "test-utils"))]
fn seal(key: &DataKey, iv: &[u8], payload: Payload<'_, '_>) -> anyhow::Result<Vec<u8>> {
    let sealed = match iv.len() {
        SOPS_NONCE_SIZE => SopsAesGcm::new_from_slice(key.as_bytes())
            .map_err(|e| anyhow::anyhow!("creating AES-256-GCM cipher: {e}"))?
            .encrypt(Nonce::<U32>::from_slice(iv), payload),
        GCM_NONCE_SIZE => Aes256Gcm::new_from_slice(key.as_bytes())
            .map_err(|e| anyhow::anyhow!("creating AES-256-GCM cipher: {e}"))?
            .encrypt(Nonce::from_slice(iv), payload),
        n => anyhow::bail!("unsupported IV length {n}"),
    };
    sealed.map_err(|e| anyhow::anyhow!("AES-256-GCM encryption failed: {e}"))
}

/// Encode `value` the way SOPS does, with a fresh random 32-byte nonce.
#[cfg(any(test, feature = "test-utils"))]
pub fn encrypt_scalar(value: &Value, key: &DataKey, aad: &str) -> anyhow::Result<String> {
    use rand::RngCore;

    let mut iv = [0u8; SOPS_NONCE_SIZE];
    rand::thread_rng().fill_bytes(&mut iv);
    encrypt_scalar_with_iv(value, key, &iv, aad)
}

/// Encode `value` with a caller-chosen nonce (12 or 32 bytes).
#[cfg(any(test, feature = "test-utils"))]
pub fn encrypt_scalar_with_iv(
    value: &Value,
    key: &DataKey,
    iv: &[u8],
    aad: &str,
) -> anyhow::Result<String> {
    let scalar_type = match value {
        Value::String(_) => ScalarType::Str,
        Value::Integer(_) => ScalarType::Int,
        Value::Float(_) => ScalarType::Float,
        Value::Bool(_) => ScalarType::Bool,
        other => anyhow::bail!("cannot encrypt a {} node", other.type_name()),
    };
    let cleartext = value.canonical_string();

    let sealed = seal(
        key,
        iv,
        Payload {
            msg: cleartext.as_bytes(),
            aad: aad.as_bytes(),
        },
    )?;
    let (ciphertext, tag) = sealed.split_at(sealed.len() - TAG_SIZE);

    Ok(format!(
        "ENC[AES256_GCM,data:{},iv:{},tag:{},type:{}]",
        B64.encode(ciphertext),
        B64.encode(iv),
        B64.encode(tag),
        scalar_type.as_tag()
    ))
}
