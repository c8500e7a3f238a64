use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";

/// Environment override for the orchestration service base URL.
pub const BASE_URL_ENV: &str = "BANKLINE_API_URL";

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Config {
    pub api_base_url: Option<String>,
}

impl Config {
    /// Loads the config file, writing a default one on first run so the user
    /// has something to edit.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        if !config_path.exists() {
            let config = Self::default();
            config.save_to(&config_path)?;
            return Ok(config);
        }
        Self::load_from(&config_path)
    }

    fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Base URL precedence: environment variable, then config file, then the
    /// default local orchestration service.
    pub fn base_url(&self) -> String {
        resolve_base_url(std::env::var(BASE_URL_ENV).ok(), self)
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir =
            dirs::config_dir().ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("bankline").join("config.json"))
    }
}

fn resolve_base_url(env_value: Option<String>, config: &Config) -> String {
    env_value
        .filter(|value| !value.trim().is_empty())
        .or_else(|| config.api_base_url.clone())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
}
