//! Loading the runner configuration from disk.

use anyhow::{bail, Context, Result};
use savanna_core::RunnerConfig;
use std::path::Path;
use tokio::fs;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Toml,
}

impl ConfigFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Ok(Self::Json),
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Ok(Self::Toml),
            _ => bail!(
                "Unsupported config file {}: expected a .json or .toml extension",
                path.display()
            ),
        }
    }
}

pub fn parse_config(contents: &str, format: ConfigFormat) -> Result<RunnerConfig> {
    let config: RunnerConfig = match format {
        ConfigFormat::Json => serde_json::from_str(contents).map_err(savanna_core::Error::from)?,
        ConfigFormat::Toml => toml::from_str(contents).map_err(savanna_core::Error::from)?,
    };
    Ok(config)
}

pub async fn load_config(path: &Path) -> Result<RunnerConfig> {
    let format = ConfigFormat::from_path(path)?;
    let contents = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config file {}", path.display()))?;

    let config = parse_config(&contents, format)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;

    info!(path = %path.display(), ?format, "Loaded configuration");
    Ok(config)
}
