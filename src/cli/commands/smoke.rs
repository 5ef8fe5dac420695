//! Smoke command - hit every JSON route once and show what came back
//!
//! Each route prints its status line, an equivalent curl command (images
//! elided) and the response body. A failing route does not stop the run.

use crate::blocking;
use crate::cli::args::SmokeArgs;
use crate::client::{load_image, ServiceClient};
use crate::config::Config;
use crate::error::DdddResult;
use console::style;
use serde_json::{json, Map, Value};
use std::time::Duration;

/// One request in the smoke run
#[derive(Debug, Clone)]
struct Route {
    method: &'static str,
    path: &'static str,
    body: Option<Value>,
}

impl Route {
    fn get(path: &'static str) -> Self {
        Self {
            method: "GET",
            path,
            body: None,
        }
    }

    fn post(path: &'static str, body: Value) -> Self {
        Self {
            method: "POST",
            path,
            body: Some(body),
        }
    }
}

/// Execute the smoke command
pub async fn execute(args: SmokeArgs, config: &Config) -> DdddResult<()> {
    let image = load_image("Image file", &args.image)?;
    let slide_target = load_image("Target image", &args.slide_target)?;
    let slide_background = load_image("Background image", &args.slide_background)?;
    let cmp_target = load_image("Target image", &args.compare_target)?;
    let cmp_background = load_image("Background image", &args.compare_background)?;

    let base_url = args.base_url.unwrap_or_else(|| config.service_url());
    let routes = routes(
        &image,
        &slide_target,
        &slide_background,
        &cmp_target,
        &cmp_background,
    );
    let api = ServiceClient::new(base_url, Duration::from_secs(config.client.timeout_secs));

    let failures = blocking(move || Ok(run(&api, &routes))).await?;
    if failures > 0 {
        eprintln!(
            "{} {} route(s) failed",
            style("[WARN]").yellow(),
            failures
        );
    }
    Ok(())
}

fn run(api: &ServiceClient, routes: &[Route]) -> usize {
    let mut failures = 0;
    for route in routes {
        let url = api.endpoint(route.path);
        let curl = build_curl(route.method, &url, route.body.as_ref());
        let result = match &route.body {
            None => api.get_raw(&url),
            Some(body) => api.post_raw(&url, body),
        };

        match result {
            Ok((status, text)) => {
                if status != 200 {
                    failures += 1;
                }
                println!("--> {} {} {}\n", status, route.method, route.path);
                println!("  {}\n", curl);
                println!("  {}\n", text);
            }
            Err(e) => {
                failures += 1;
                println!("--> ERROR {} {}\n", route.method, route.path);
                println!("  {}\n", curl);
                println!("  {}\n", e);
            }
        }
    }
    failures
}

fn routes(
    image: &str,
    slide_target: &str,
    slide_background: &str,
    cmp_target: &str,
    cmp_background: &str,
) -> Vec<Route> {
    let charset = "A九A乘A六A等A于A？A";
    vec![
        Route::get("/status"),
        Route::post("/ocr", json!({"image": image})),
        Route::post("/ocr", json!({"image": image, "color_filter": "green"})),
        Route::post("/ocr", json!({"image": image, "color_filter": ["green"]})),
        Route::post(
            "/ocr",
            json!({"image": image, "color_filter": ["green", "blue"]}),
        ),
        Route::post(
            "/ocr",
            json!({"image": image, "color_filter": [[[40, 50, 50], [80, 255, 255]]]}),
        ),
        Route::post("/ocr", json!({"image": image, "charset_range": charset})),
        Route::post(
            "/ocr",
            json!({"image": image, "charset_range": charset, "color_filter": "green"}),
        ),
        Route::post(
            "/ocr",
            json!({"image": image, "charset_range": charset, "probability": true}),
        ),
        Route::post("/det", json!({"image": image})),
        Route::post(
            "/slide-match",
            json!({
                "target_image": slide_target,
                "background_image": slide_background,
                "simple_target": true,
            }),
        ),
        Route::post(
            "/slide-match",
            json!({
                "target_image": slide_target,
                "background_image": slide_background,
                "simple_target": false,
            }),
        ),
        Route::post(
            "/slide-comparison",
            json!({
                "target_image": cmp_target,
                "background_image": cmp_background,
            }),
        ),
    ]
}

/// Equivalent curl invocation with image payloads replaced by a placeholder
fn build_curl(method: &str, url: &str, body: Option<&Value>) -> String {
    let mut parts = vec![format!("curl -X {} \"{}\"", method, url)];
    if let Some(Value::Object(fields)) = body {
        parts.push("-H \"Content-Type: application/json\"".to_string());
        let elided: Map<String, Value> = fields
            .iter()
            .map(|(k, v)| {
                let v = if k.contains("image") {
                    Value::String("base64 image".to_string())
                } else {
                    v.clone()
                };
                (k.clone(), v)
            })
            .collect();
        parts.push(format!("-d '{}'", Value::Object(elided)));
    }
    parts.join("\n       ")
}
