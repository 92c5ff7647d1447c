use thiserror::Error;

pub type SopsResult<T> = Result<T, SopsError>;

/// Every way a decryption call can fail. None of these are recovered
/// internally: the first error aborts the call and no partial tree is
/// returned.
#[derive(Debug, Error)]
pub enum SopsError {
    #[error("no key provider can supply a data key for this document")]
    KeyNotSupported,

    #[error("authentication failed for '{field}' (wrong key or tampered value)")]
    AuthenticationFailure { field: String },

    #[error("MAC mismatch: document content does not match its recorded checksum")]
    ChecksumMismatch,

    #[error("unknown scalar type '{type_tag}' at '{field}'")]
    UnknownScalarType { field: String, type_tag: String },

    #[error("'{field}' is declared as {kind} but its cleartext is not a valid {kind}")]
    MalformedNumber { field: String, kind: &'static str },

    #[error("malformed encrypted value at '{field}': {reason}")]
    MalformedScalar { field: String, reason: String },

    #[error("data key must be 32 bytes, got {len}")]
    InvalidDataKey { len: usize },

    #[error("document has no MAC and a MAC is required")]
    MacMissing,

    #[error("cannot place a value at '{path}'")]
    InvalidPath { path: String },

    #[error("document nesting exceeds the configured maximum depth of {max_depth}")]
    TooDeep { max_depth: usize },

    #[error("document error: {0:#}")]
    Document(anyhow::Error),

    #[error(transparent)]
    Provider(anyhow::Error),
}

impl SopsError {
    /// Failures that indicate the document was altered or the wrong key was used.
    pub fn is_tampering(&self) -> bool {
        matches!(
            self,
            SopsError::AuthenticationFailure { .. } | SopsError::ChecksumMismatch
        )
    }
}
