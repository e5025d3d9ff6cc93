use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::format::FORMAT_VERSION;

/// Metadata stamped into the header of every exported model.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ExportConfig {
    /// Major, minor and release-candidate version of the file.
    pub version: [i32; 3],
    /// Owner contact, at most 32 bytes.
    pub contact: String,
    /// Free-form description, at most 16 bytes.
    pub description: String,
}

impl ExportConfig {
    pub fn new(contact: &str, description: &str) -> Self {
        Self {
            contact: contact.to_string(),
            description: description.to_string(),
            ..Self::default()
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            version: FORMAT_VERSION,
            contact: String::new(),
            description: "sklearn_svm".to_string(),
        }
    }
}

/// Load an export configuration from a JSON file. Missing keys take their
/// default values.
pub fn load_export_config<P: AsRef<Path>>(path: P) -> Result<ExportConfig> {
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config: {}", path.as_ref().display()))?;
    let config: ExportConfig = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse config: {}", path.as_ref().display()))?;
    Ok(config)
}
