use aethercast_kernel::EngineConfig;
use aethercast_ledger::{CostConfig, LedgerConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Errors from loading configuration files.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("unsupported config format `{0}`: expected .json, .yaml or .yml")]
    UnsupportedFormat(String),
}

/// All tunables of a casting session. Missing sections and fields keep their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AetherConfig {
    pub engine: EngineConfig,
    pub cost: CostConfig,
    pub ledger: LedgerConfig,
}

impl AetherConfig {
    /// Load from a JSON or YAML file, chosen by extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let text = std::fs::read_to_string(path)?;
        let config = match ext.as_str() {
            "json" => serde_json::from_str(&text)?,
            "yaml" | "yml" => serde_yaml::from_str(&text)?,
            _ => return Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        };
        tracing::info!(path = %path.display(), "loaded configuration");
        Ok(config)
    }
}
