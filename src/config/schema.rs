//! Configuration schema for ddddctl
//!
//! Configuration is stored at `~/.config/ddddctl/config.toml`

use crate::platform::AssetTable;
use crate::release::DEFAULT_RELEASE_API_URL;
use crate::service::Readiness;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Where the local service listens
    pub service: ServiceConfig,

    /// Release feed settings
    pub release: ReleaseConfig,

    /// Launcher behavior
    pub launcher: LauncherConfig,

    /// Request client settings
    pub client: ClientConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
        }
    }
}

/// Service bind address
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub address: String,
    pub port: u16,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

/// Release feed settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReleaseConfig {
    /// GitHub "latest release" API endpoint
    pub api_url: String,

    /// Asset naming table
    pub asset_table: AssetTable,

    /// Timeout for the metadata request in seconds
    pub timeout_secs: u64,
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_RELEASE_API_URL.to_string(),
            asset_table: AssetTable::default(),
            timeout_secs: 30,
        }
    }
}

/// Launcher settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LauncherConfig {
    /// How to tell the service is up
    pub readiness: Readiness,

    /// Seconds to wait for readiness after spawning (poll mode)
    pub ready_timeout_secs: u64,

    /// Cache directory (default: ~/.ddddocr_cache)
    pub cache_dir: Option<PathBuf>,

    /// Launch the cached executable when the release feed is unavailable
    pub offline_fallback: bool,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            readiness: Readiness::default(),
            ready_timeout_secs: 30,
            cache_dir: None,
            offline_fallback: true,
        }
    }
}

/// Request client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

impl Config {
    /// Base URL of the local service
    pub fn service_url(&self) -> String {
        format!("http://{}:{}", self.service.address, self.service.port)
    }
}
