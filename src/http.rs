//! Shared HTTP agent construction
//!
//! Agents never turn 4xx/5xx into errors; callers inspect the status.

use std::time::Duration;
use ureq::Agent;

/// User-Agent sent with every request
pub const USER_AGENT: &str = concat!("ddddctl/", env!("CARGO_PKG_VERSION"));

/// Agent with a global per-request timeout
pub fn agent(timeout: Duration) -> Agent {
    Agent::config_builder()
        .timeout_global(Some(timeout))
        .http_status_as_error(false)
        .build()
        .into()
}

/// Agent for large downloads: bounded connect, unbounded body
pub fn download_agent(connect_timeout: Duration) -> Agent {
    Agent::config_builder()
        .timeout_connect(Some(connect_timeout))
        .http_status_as_error(false)
        .build()
        .into()
}
