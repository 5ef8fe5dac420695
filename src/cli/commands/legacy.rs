//! Legacy command - call the /{option}/{b64|file}/{text|json} routes

use crate::blocking;
use crate::cli::args::LegacyArgs;
use crate::client::legacy::{self, LegacyClient};
use crate::client::read_image;
use crate::config::Config;
use crate::error::DdddResult;
use serde_json::Value;
use std::time::Duration;

/// Execute the legacy command
pub async fn execute(args: LegacyArgs, config: &Config) -> DdddResult<()> {
    let keys = args.option.image_keys();
    let mut images = Vec::with_capacity(args.images.len());
    for (i, path) in args.images.iter().enumerate() {
        let label = match keys.get(i) {
            Some(&"target") => "Target image",
            Some(&"background") => "Background image",
            _ => "Image file",
        };
        images.push(read_image(label, path)?);
    }

    let base_url = args.base_url.unwrap_or_else(|| config.service_url());
    let api = LegacyClient::new(base_url, Duration::from_secs(config.client.timeout_secs));
    let (option, transport, format) = (args.option, args.transport, args.format);

    tracing::debug!("Legacy route {}", legacy::route(option, transport, format));
    let result = blocking(move || api.call(option, transport, format, &images)).await?;

    match result {
        Value::String(text) => println!("{}", text),
        other => println!("{}", other),
    }
    Ok(())
}
