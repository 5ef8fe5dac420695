//! ddddctl - launcher and client for the ddddocr service
//!
//! Resolves the release asset for the host, keeps the executable cached,
//! starts it detached and talks to its HTTP endpoints.

pub mod cache;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod platform;
pub mod release;
pub mod service;
pub mod ui;

pub use error::{DdddError, DdddResult};

/// Run blocking work (ureq calls, archive extraction) off the async runtime
pub async fn blocking<T, F>(f: F) -> DdddResult<T>
where
    F: FnOnce() -> DdddResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| DdddError::Internal(format!("blocking task failed: {}", e)))?
}
