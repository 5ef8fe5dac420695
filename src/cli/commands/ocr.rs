//! OCR command - recognize text in an image

use crate::blocking;
use crate::cli::args::OcrArgs;
use crate::client::types::COLOR_PRESETS;
use crate::client::{self, ColorFilter, OcrRequest, ServiceClient};
use crate::config::Config;
use crate::error::DdddResult;
use std::time::Duration;
use tracing::warn;

/// Execute the ocr command
pub async fn execute(args: OcrArgs, config: &Config) -> DdddResult<()> {
    let image = client::load_image("Image file", &args.image)?;

    for preset in &args.color_filter {
        if !COLOR_PRESETS.contains(&preset.as_str()) {
            warn!("Unknown color filter preset '{}', sending anyway", preset);
        }
    }

    let api = ServiceClient::new(
        config.service_url(),
        Duration::from_secs(config.client.timeout_secs),
    );
    let url = args
        .endpoint
        .clone()
        .unwrap_or_else(|| api.endpoint("/ocr"));

    let request = OcrRequest {
        image,
        color_filter: ColorFilter::from_args(args.color_filter, args.hsv_range),
        charset_range: args.charset_range,
        probability: args.probability.then_some(true),
    };

    let data = blocking(move || api.ocr(&url, &request)).await?;

    if args.json {
        println!("{}", data);
    } else {
        println!("{}", client::format_ocr(&data, args.text_only));
    }
    Ok(())
}
