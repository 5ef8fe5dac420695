//! Release feed lookup
//!
//! Queries the GitHub "latest release" endpoint and picks the asset whose
//! name matches the resolved platform archive.

use crate::error::{DdddError, DdddResult};
use crate::http;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

/// Default release metadata endpoint
pub const DEFAULT_RELEASE_API_URL: &str =
    "https://api.github.com/repos/86maid/ddddocr/releases/latest";

/// Environment override for the release endpoint
pub const RELEASE_API_URL_ENV: &str = "DDDDCTL_RELEASE_API_URL";

/// Release metadata as returned by the GitHub API
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GithubRelease {
    #[serde(default)]
    pub tag_name: String,
    #[serde(default)]
    pub assets: Vec<GithubAsset>,
}

/// One downloadable asset of a release
#[derive(Debug, Clone, Deserialize)]
pub struct GithubAsset {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub browser_download_url: String,
}

/// The asset selected for this platform, paired with its release tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseDescriptor {
    pub version: String,
    pub asset_name: String,
    pub download_url: String,
}

/// Pick the asset whose name equals `filename` exactly
pub fn select_asset(release: &GithubRelease, filename: &str) -> Option<ReleaseDescriptor> {
    release
        .assets
        .iter()
        .find(|a| a.name == filename && !a.browser_download_url.is_empty())
        .map(|a| ReleaseDescriptor {
            version: release.tag_name.clone(),
            asset_name: a.name.clone(),
            download_url: a.browser_download_url.clone(),
        })
}

/// Client for the release metadata endpoint
#[derive(Debug, Clone)]
pub struct ReleaseFeed {
    api_url: String,
    timeout: Duration,
}

impl ReleaseFeed {
    /// Create a feed client for an endpoint
    pub fn new(api_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            api_url: api_url.into(),
            timeout,
        }
    }

    /// Endpoint this feed queries
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Fetch and parse the latest release metadata
    pub fn fetch(&self) -> DdddResult<GithubRelease> {
        let agent = http::agent(self.timeout);
        let mut req = agent
            .get(&self.api_url)
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", http::USER_AGENT);

        if let Ok(token) = std::env::var("GITHUB_TOKEN") {
            if !token.is_empty() {
                req = req.header("Authorization", format!("Bearer {token}"));
            }
        }

        let mut response = req.call().map_err(|e| DdddError::Download {
            url: self.api_url.clone(),
            reason: e.to_string(),
        })?;

        let status = response.status().as_u16();
        if status != 200 {
            return Err(DdddError::Download {
                url: self.api_url.clone(),
                reason: format!("HTTP {status}"),
            });
        }

        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| DdddError::Download {
                url: self.api_url.clone(),
                reason: e.to_string(),
            })?;

        let release: GithubRelease = serde_json::from_str(&body)?;
        debug!(
            "Release {} lists {} asset(s)",
            release.tag_name,
            release.assets.len()
        );
        Ok(release)
    }

    /// Find the download for `filename` in the latest release.
    ///
    /// Feed failures are logged and reported as `None`; the caller decides
    /// whether that is fatal.
    pub fn latest_for(&self, filename: &str) -> Option<ReleaseDescriptor> {
        match self.fetch() {
            Ok(release) => {
                let found = select_asset(&release, filename);
                if found.is_none() {
                    debug!("No asset named {} in release {}", filename, release.tag_name);
                }
                found
            }
            Err(e) => {
                warn!("Error fetching release info: {}", e);
                None
            }
        }
    }
}
