//! Runtime configuration loading

use anyhow::{Context, Result};
use std::path::Path;
use volt_runtime::RuntimeConfig;

/// Load a runtime configuration, falling back to defaults when no file is given
pub fn load_runtime_config(path: Option<&Path>) -> Result<RuntimeConfig> {
    let Some(path) = path else {
        return Ok(RuntimeConfig::default());
    };
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    let config = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse config file {}", path.display()))?;
    Ok(config)
}
