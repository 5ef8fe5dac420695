//! Slide command - locate a slider piece in a background image

use crate::blocking;
use crate::cli::args::{SlideAlgorithm, SlideArgs};
use crate::client::{self, ServiceClient, SlideComparisonRequest, SlideMatchRequest};
use crate::config::Config;
use crate::error::DdddResult;
use std::time::Duration;
use tracing::warn;

/// Execute the slide command
pub async fn execute(args: SlideArgs, config: &Config) -> DdddResult<()> {
    let target_image = client::load_image("Target image", &args.target)?;
    let background_image = client::load_image("Background image", &args.background)?;

    let api = ServiceClient::new(
        config.service_url(),
        Duration::from_secs(config.client.timeout_secs),
    );

    let data = match args.algorithm {
        SlideAlgorithm::Match => {
            let url = args
                .endpoint
                .unwrap_or_else(|| api.endpoint("/slide-match"));
            let request = SlideMatchRequest {
                target_image,
                background_image,
                simple_target: args.simple_target.then_some(true),
            };
            blocking(move || api.slide_match(&url, &request)).await?
        }
        SlideAlgorithm::Comparison => {
            if args.simple_target {
                warn!("--simple-target only applies to the match algorithm");
            }
            let url = args
                .endpoint
                .unwrap_or_else(|| api.endpoint("/slide-comparison"));
            let request = SlideComparisonRequest {
                target_image,
                background_image,
            };
            blocking(move || api.slide_comparison(&url, &request)).await?
        }
    };

    if args.json {
        println!("{}", data);
    } else {
        let text = client::format_slide(&data);
        if !text.is_empty() {
            println!("{}", text);
        }
    }
    Ok(())
}
