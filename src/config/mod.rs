//! Configuration management for ddddctl
//!
//! Environment variables override individual file settings:
//! `DDDDCTL_RELEASE_API_URL` and `DDDDCTL_CACHE_DIR`.

pub mod schema;

pub use schema::Config;

use crate::cache::{BinaryCache, CACHE_DIR_ENV};
use crate::error::{DdddError, DdddResult};
use crate::release::RELEASE_API_URL_ENV;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Configuration manager
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new config manager with default path
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    /// Create a config manager with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ddddctl")
            .join("config.toml")
    }

    /// Load configuration (defaults if the file is missing) and apply env overrides
    pub async fn load(&self) -> DdddResult<Config> {
        let mut config = if self.config_path.exists() {
            self.load_from_file(&self.config_path).await?
        } else {
            debug!("Config file not found, using defaults");
            Config::default()
        };

        apply_env_overrides(&mut config);
        Ok(config)
    }

    /// Load configuration from a specific file
    pub async fn load_from_file(&self, path: &Path) -> DdddResult<Config> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| DdddError::io(format!("reading config from {}", path.display()), e))?;

        toml::from_str(&content).map_err(|e| DdddError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Save configuration to file
    pub async fn save(&self, config: &Config) -> DdddResult<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| DdddError::ConfigDirCreate {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }

        let content = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, content).await.map_err(|e| {
            DdddError::io(format!("writing config to {}", self.config_path.display()), e)
        })?;

        info!("Configuration saved to {}", self.config_path.display());
        Ok(())
    }

    /// Get the config file path
    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

fn apply_env_overrides(config: &mut Config) {
    if let Some(url) = non_empty_env(RELEASE_API_URL_ENV) {
        debug!("Release feed overridden by {}", RELEASE_API_URL_ENV);
        config.release.api_url = url;
    }
    if let Some(dir) = non_empty_env(CACHE_DIR_ENV) {
        debug!("Cache directory overridden by {}", CACHE_DIR_ENV);
        config.launcher.cache_dir = Some(PathBuf::from(dir));
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

impl Config {
    /// Effective cache directory
    pub fn cache_dir(&self) -> PathBuf {
        self.launcher
            .cache_dir
            .clone()
            .unwrap_or_else(BinaryCache::default_dir)
    }
}
