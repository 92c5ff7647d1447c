//! The document data key

use sopsdec_core::SopsError;
use zeroize::Zeroize;

use crate::KEY_SIZE;

/// The 256-bit key every leaf of one document is encrypted with. Zeroized on
/// drop and never printed.
#[derive(Clone)]
pub struct DataKey {
    bytes: [u8; KEY_SIZE],
}

impl DataKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl TryFrom<&[u8]> for DataKey {
    type Error = SopsError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let bytes: [u8; KEY_SIZE] = bytes
            .try_into()
            .map_err(|_| SopsError::InvalidDataKey { len: bytes.len() })?;
        Ok(Self::from_bytes(bytes))
    }
}

impl TryFrom<Vec<u8>> for DataKey {
    type Error = SopsError;

    fn try_from(mut bytes: Vec<u8>) -> Result<Self, Self::Error> {
        let key = Self::try_from(bytes.as_slice());
        bytes.zeroize();
        key
    }
}

impl Drop for DataKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for DataKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_vec_exact_length() {
        let key = DataKey::try_from(vec![7u8; KEY_SIZE]).unwrap();
        assert_eq!(key.as_bytes(), &[7u8; KEY_SIZE]);
    }

    #[test]
    fn test_rejects_wrong_length() {
        let short = DataKey::try_from(vec![1u8; 16]).unwrap_err();
        assert!(matches!(short, SopsError::InvalidDataKey { len: 16 }));

        let long = DataKey::try_from(&[1u8; 33][..]).unwrap_err();
        assert!(matches!(long, SopsError::InvalidDataKey { len: 33 }));
    }

    #[test]
    fn test_debug_redacts() {
        let key = DataKey::from_bytes([0xAB; KEY_SIZE]);
        let rendered = format!("{key:?}");
        assert!(rendered.contains("REDACTED"));
        assert!(!rendered.contains("171"));
        assert!(!rendered.to_lowercase().contains("ab, ab"));
    }
}
