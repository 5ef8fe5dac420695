//! Error types for ddddctl
//!
//! All modules use `DdddResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for ddddctl operations
pub type DdddResult<T> = Result<T, DdddError>;

/// All errors that can occur in ddddctl
#[derive(Error, Debug)]
pub enum DdddError {
    // Input errors
    #[error("{label} not found: {}", path.display())]
    FileNotFound { label: &'static str, path: PathBuf },

    // Service errors
    #[error("Failed to connect to ddddocr service: {reason}")]
    ServiceUnreachable { endpoint: String, reason: String },

    #[error("{0}")]
    Service(String),

    #[error("MCP error {code}: {message}")]
    Mcp { code: i64, message: String },

    #[error("Legacy route {route} failed: {reason}")]
    Legacy { route: String, reason: String },

    // Platform and release errors
    #[error("Unsupported platform {os} {arch}")]
    UnsupportedPlatform { os: String, arch: String },

    #[error("Could not find release for {0}")]
    ReleaseNotFound(String),

    // Install errors
    #[error("Download failed: {url}: {reason}")]
    Download { url: String, reason: String },

    #[error("Unsupported archive format: {0}")]
    UnsupportedArchive(String),

    #[error("Failed to extract {}: {reason}", path.display())]
    Extract { path: PathBuf, reason: String },

    #[error("Executable not found: no {name} under {}", dir.display())]
    ExecutableNotFound { name: String, dir: PathBuf },

    #[error("Failed to replace cache directory {}: {reason}", path.display())]
    CacheReplace { path: PathBuf, reason: String },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Process errors
    #[error("Command failed: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    User(String),
}

impl DdddError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command failed error
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Create a service-unreachable error for an endpoint
    pub fn unreachable(endpoint: impl Into<String>, reason: impl ToString) -> Self {
        Self::ServiceUnreachable {
            endpoint: endpoint.into(),
            reason: reason.to_string(),
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::ServiceUnreachable { .. } => Some("Make sure the service is running: ddddctl start"),
            Self::ReleaseNotFound(_) => {
                Some("Check network access to the release feed, or set release.api_url")
            }
            Self::ExecutableNotFound { .. } => {
                Some("The release archive layout may have changed; run: ddddctl cache clear")
            }
            Self::ConfigInvalid { .. } => Some("Run: ddddctl config init --force"),
            _ => None,
        }
    }
}
