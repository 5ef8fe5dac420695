//! Det command - detect objects in an image

use crate::blocking;
use crate::cli::args::DetArgs;
use crate::client::{self, DetRequest, ServiceClient};
use crate::config::Config;
use crate::error::DdddResult;
use std::time::Duration;

/// Execute the det command
pub async fn execute(args: DetArgs, config: &Config) -> DdddResult<()> {
    let image = client::load_image("Image file", &args.image)?;

    let api = ServiceClient::new(
        config.service_url(),
        Duration::from_secs(config.client.timeout_secs),
    );
    let url = args.endpoint.unwrap_or_else(|| api.endpoint("/det"));
    let request = DetRequest { image };

    let data = blocking(move || api.det(&url, &request)).await?;

    if args.json {
        println!("{}", data);
    } else {
        println!("{}", client::format_det(&data));
    }
    Ok(())
}
