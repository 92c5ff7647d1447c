//! Reading SOPS files into a [`Value`] tree

use std::path::Path;

use anyhow::{Context, Result};
use sopsdec_core::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
    /// Try JSON, then YAML.
    Auto,
}

impl DocumentFormat {
    /// Pick a format from the file extension.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => DocumentFormat::Json,
            Some("yaml" | "yml") => DocumentFormat::Yaml,
            _ => DocumentFormat::Auto,
        }
    }
}

pub fn parse_document(text: &str, format: DocumentFormat) -> Result<Value> {
    match format {
        DocumentFormat::Json => serde_json::from_str(text).context("parsing SOPS JSON"),
        DocumentFormat::Yaml => serde_yml::from_str(text).context("parsing SOPS YAML"),
        DocumentFormat::Auto => serde_json::from_str(text)
            .or_else(|_| serde_yml::from_str(text))
            .context("parsing SOPS document as JSON or YAML"),
    }
}

pub async fn load_document(path: &Path) -> Result<Value> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading SOPS file: {}", path.display()))?;

    parse_document(&text, DocumentFormat::from_path(path))
        .with_context(|| format!("loading {}", path.display()))
}
