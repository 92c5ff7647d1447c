use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Decryption policy (loadable from a `[decrypt]`-style TOML table)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecryptConfig {
    /// Fail when the document carries no MAC (default: false, a missing MAC
    /// skips verification)
    pub require_mac: bool,
    /// Maximum container nesting accepted before any leaf is touched
    /// (default: 256)
    pub max_depth: usize,
}

impl Default for DecryptConfig {
    fn default() -> Self {
        Self {
            require_mac: false,
            max_depth: 256,
        }
    }
}

impl DecryptConfig {
    pub fn from_toml_str(toml_str: &str) -> anyhow::Result<Self> {
        toml::from_str(toml_str).context("parsing decrypt config")
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file: {}", path.display()))?;
        Self::from_toml_str(&contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DecryptConfig::default();
        assert!(!config.require_mac);
        assert_eq!(config.max_depth, 256);
    }

    #[test]
    fn test_parse_partial_config() {
        let config = DecryptConfig::from_toml_str("require_mac = true\n").unwrap();
        assert!(config.require_mac);
        assert_eq!(config.max_depth, 256);
    }

    #[test]
    fn test_parse_empty_config() {
        assert_eq!(DecryptConfig::from_toml_str("").unwrap(), DecryptConfig::default());
    }

    #[test]
    fn test_reject_wrong_type() {
        assert!(DecryptConfig::from_toml_str("max_depth = \"deep\"\n").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sopsdec.toml");
        std::fs::write(&path, "require_mac = true\nmax_depth = 16\n").unwrap();

        let config = DecryptConfig::load(&path).unwrap();
        assert_eq!(
            config,
            DecryptConfig {
                require_mac: true,
                max_depth: 16,
            }
        );
    }

    #[test]
    fn test_load_missing_file() {
        let err = DecryptConfig::load(Path::new("/nonexistent/sopsdec.toml")).unwrap_err();
        assert!(err.to_string().contains("reading config file"));
    }
}
