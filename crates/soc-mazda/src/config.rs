//! Configuration file handling for soc-mazda

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Directory openWB reads state-of-charge values from
pub const DEFAULT_RAMDISK_DIR: &str = "/var/www/html/openWB/ramdisk";

/// Configuration for the SoC module
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Directory for the SoC and log files
    pub ramdisk_dir: Option<PathBuf>,
    /// Override for the region's API base URL
    pub base_url: Option<String>,
}

impl Config {
    /// Load configuration from the default config file
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Get the default config file path
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join("soc-mazda");

        Ok(config_dir.join("config.toml"))
    }

    /// Merge CLI arguments over config file values
    pub fn merge_with_args(&self, ramdisk_dir: Option<&Path>, base_url: Option<&str>) -> MergedConfig {
        MergedConfig {
            ramdisk_dir: ramdisk_dir
                .map(Path::to_path_buf)
                .or_else(|| self.ramdisk_dir.clone())
                .unwrap_or_else(|| PathBuf::from(DEFAULT_RAMDISK_DIR)),
            base_url: base_url.map(String::from).or_else(|| self.base_url.clone()),
        }
    }
}

/// Fully resolved configuration after merging CLI args
#[derive(Debug, Clone)]
pub struct MergedConfig {
    pub ramdisk_dir: PathBuf,
    pub base_url: Option<String>,
}
