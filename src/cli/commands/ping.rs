//! Ping command - check the service answers on /ping

use crate::blocking;
use crate::cli::args::PingArgs;
use crate::client::legacy::LegacyClient;
use crate::config::Config;
use crate::error::DdddResult;
use std::time::{Duration, Instant};

/// Execute the ping command
pub async fn execute(args: PingArgs, config: &Config) -> DdddResult<()> {
    let base_url = args.base_url.unwrap_or_else(|| config.service_url());
    let api = LegacyClient::new(base_url.clone(), Duration::from_secs(config.client.timeout_secs));

    let started = Instant::now();
    let body = blocking(move || api.ping()).await?;
    println!(
        "{} from {} in {} ms",
        body.trim(),
        base_url,
        started.elapsed().as_millis()
    );
    Ok(())
}
