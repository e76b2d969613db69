//! Application configuration management.
//!
//! This module handles loading and saving the application configuration,
//! which currently amounts to the catalog API endpoint.
//!
//! Configuration is stored at `~/.config/dexcache/config.json`.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Application name used for config/data directory paths
const APP_NAME: &str = "dexcache";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Default catalog endpoint (a local development server, matching the
/// upstream data set's layout).
const DEFAULT_API_BASE_URL: &str = "http://localhost:9090/pokemon";

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Root directory for the durable key-value store.
    pub fn store_dir(&self) -> Result<PathBuf> {
        Ok(Self::data_dir()?.join("store"))
    }

    /// Root directory for cached image artifacts.
    pub fn image_dir(&self) -> Result<PathBuf> {
        Ok(Self::data_dir()?.join("images"))
    }

    fn data_dir() -> Result<PathBuf> {
        let data_dir =
            dirs::data_dir().ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }
}
