//! Host platform detection and release asset selection
//!
//! Maps (OS, architecture) onto the archive name published in the ddddocr
//! release feed. Two tables exist because the published Linux x64 build has
//! shipped under two names; which one to use is configurable.

use crate::error::{DdddError, DdddResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Operating systems with published builds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostOs {
    Windows,
    Linux,
    MacOs,
}

impl HostOs {
    /// Normalize an OS name (`std::env::consts::OS` or `uname` style)
    pub fn parse(os: &str) -> Option<Self> {
        match os.to_ascii_lowercase().as_str() {
            "windows" => Some(Self::Windows),
            "linux" => Some(Self::Linux),
            "macos" | "darwin" => Some(Self::MacOs),
            _ => None,
        }
    }
}

/// CPU architectures with published builds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostArch {
    X86,
    X64,
    Arm64,
}

impl HostArch {
    /// Normalize an architecture name (`std::env::consts::ARCH` or `uname -m` style)
    pub fn parse(arch: &str) -> Option<Self> {
        match arch.to_ascii_lowercase().as_str() {
            "x86_64" | "amd64" => Some(Self::X64),
            "x86" | "i386" | "i686" => Some(Self::X86),
            "aarch64" | "arm64" => Some(Self::Arm64),
            _ => None,
        }
    }
}

/// Which asset naming table to resolve against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AssetTable {
    /// Static musl build for Linux x64
    #[default]
    Musl,
    /// Generic glibc build name for Linux x64
    Generic,
}

impl fmt::Display for AssetTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Musl => write!(f, "musl"),
            Self::Generic => write!(f, "generic"),
        }
    }
}

/// Raw platform identifiers as reported by the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    pub os: String,
    pub arch: String,
}

impl Platform {
    /// Detect the current host
    pub fn detect() -> Self {
        Self {
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
        }
    }

    /// Create from explicit identifiers
    pub fn new(os: impl Into<String>, arch: impl Into<String>) -> Self {
        Self {
            os: os.into(),
            arch: arch.into(),
        }
    }

    /// Resolve the release asset filename for this platform
    pub fn asset_filename(&self, table: AssetTable) -> DdddResult<&'static str> {
        resolve(&self.os, &self.arch, table).ok_or_else(|| DdddError::UnsupportedPlatform {
            os: self.os.clone(),
            arch: self.arch.clone(),
        })
    }

    /// Name of the service executable inside the release archive
    pub fn executable_name(&self) -> &'static str {
        executable_name(&self.os)
    }
}

/// Look up the asset filename for an (OS, architecture) pair.
///
/// Returns `None` for any pair without a published build.
pub fn resolve(os: &str, arch: &str, table: AssetTable) -> Option<&'static str> {
    let os = HostOs::parse(os)?;
    let arch = HostArch::parse(arch)?;

    match (os, arch) {
        (HostOs::Windows, HostArch::X64) => Some("x86_64-pc-windows-msvc-inline.zip"),
        (HostOs::Windows, HostArch::X86) => Some("i686-pc-windows-msvc-inline.zip"),
        (HostOs::Linux, HostArch::Arm64) => Some("aarch64-unknown-linux-gnu-inline.zip"),
        (HostOs::Linux, HostArch::X64) => match table {
            AssetTable::Musl => Some("x86_64-unknown-linux-musl-inline.zip"),
            AssetTable::Generic => Some("linux-x86_64-inline.zip"),
        },
        (HostOs::MacOs, HostArch::Arm64) => Some("aarch64-apple-darwin-inline.zip"),
        (HostOs::MacOs, HostArch::X64) => Some("macos-x86_64-inline.zip"),
        _ => None,
    }
}

/// Executable filename for an OS
pub fn executable_name(os: &str) -> &'static str {
    if HostOs::parse(os) == Some(HostOs::Windows) {
        "ddddocr.exe"
    } else {
        "ddddocr"
    }
}
