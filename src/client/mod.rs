//! HTTP client for a running ddddocr service
//!
//! Requests are blocking; async callers go through [`crate::blocking`].

pub mod legacy;
pub mod mcp;
pub mod types;

pub use types::{
    ColorFilter, DetData, DetRequest, HsvRange, OcrData, OcrRequest, SlideComparisonRequest,
    SlideData, SlideMatchRequest,
};

use crate::error::{DdddError, DdddResult};
use crate::http;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use tracing::debug;
use types::Envelope;
use ureq::Agent;

/// Client for the JSON endpoints (`/ocr`, `/det`, `/slide-*`)
#[derive(Debug, Clone)]
pub struct ServiceClient {
    agent: Agent,
    base_url: String,
}

impl ServiceClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            agent: http::agent(timeout),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL for `path` under the base URL
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// POST `body` as JSON and parse the response body as JSON.
    ///
    /// Transport failures, non-200 statuses and unparseable bodies all
    /// count as the service being unreachable.
    pub fn post_json<T: Serialize>(&self, url: &str, body: &T) -> DdddResult<Value> {
        let (status, text) = self.post_raw(url, body)?;
        if status != 200 {
            return Err(DdddError::unreachable(
                url,
                format!("{} returned HTTP {}", url, status),
            ));
        }
        serde_json::from_str(&text).map_err(|e| DdddError::unreachable(url, e))
    }

    /// POST `body` as JSON; returns the status and body whatever the status
    pub fn post_raw<T: Serialize>(&self, url: &str, body: &T) -> DdddResult<(u16, String)> {
        debug!("POST {}", url);
        let mut response = self
            .agent
            .post(url)
            .header("User-Agent", http::USER_AGENT)
            .send_json(body)
            .map_err(|e| DdddError::unreachable(url, e))?;

        let status = response.status().as_u16();
        let text = response
            .body_mut()
            .read_to_string()
            .map_err(|e| DdddError::unreachable(url, e))?;
        Ok((status, text))
    }

    /// GET `url`; returns the status and body whatever the status
    pub fn get_raw(&self, url: &str) -> DdddResult<(u16, String)> {
        debug!("GET {}", url);
        let mut response = self
            .agent
            .get(url)
            .header("User-Agent", http::USER_AGENT)
            .call()
            .map_err(|e| DdddError::unreachable(url, e))?;

        let status = response.status().as_u16();
        let text = response
            .body_mut()
            .read_to_string()
            .map_err(|e| DdddError::unreachable(url, e))?;
        Ok((status, text))
    }

    /// POST and unwrap the `{code, msg, data}` envelope
    pub fn call<T: Serialize>(&self, url: &str, body: &T) -> DdddResult<Value> {
        unwrap_envelope(self.post_json(url, body)?)
    }

    pub fn ocr(&self, url: &str, request: &OcrRequest) -> DdddResult<Value> {
        self.call(url, request)
    }

    pub fn det(&self, url: &str, request: &DetRequest) -> DdddResult<Value> {
        self.call(url, request)
    }

    pub fn slide_match(&self, url: &str, request: &SlideMatchRequest) -> DdddResult<Value> {
        self.call(url, request)
    }

    pub fn slide_comparison(
        &self,
        url: &str,
        request: &SlideComparisonRequest,
    ) -> DdddResult<Value> {
        self.call(url, request)
    }
}

/// `data` when `code == 200`, otherwise the service's `msg` as an error
pub fn unwrap_envelope(body: Value) -> DdddResult<Value> {
    let envelope: Envelope = serde_json::from_value(body)
        .map_err(|e| DdddError::Service(format!("Unexpected response: {}", e)))?;
    if envelope.code == 200 {
        Ok(envelope.data)
    } else {
        Err(DdddError::Service(
            envelope.msg.unwrap_or_else(|| "Unknown error".to_string()),
        ))
    }
}

/// Read an image after checking it exists
pub fn read_image(label: &'static str, path: &Path) -> DdddResult<Vec<u8>> {
    if !path.exists() {
        return Err(DdddError::FileNotFound {
            label,
            path: path.to_path_buf(),
        });
    }
    std::fs::read(path).map_err(|e| DdddError::io(format!("reading {}", path.display()), e))
}

/// Read an image and base64-encode it (standard alphabet)
pub fn load_image(label: &'static str, path: &Path) -> DdddResult<String> {
    Ok(STANDARD.encode(read_image(label, path)?))
}

/// Human output for an OCR result
pub fn format_ocr(data: &Value, text_only: bool) -> String {
    let ocr: OcrData = serde_json::from_value(data.clone()).unwrap_or_default();
    if text_only {
        return ocr.text;
    }

    let mut out = format!("Text: {}", ocr.text);
    match ocr.probability {
        None | Some(Value::Null) | Some(Value::Bool(false)) => {}
        Some(p) => out.push_str(&format!("\nProbability: {}", p)),
    }
    out
}

/// Human output for a detection result
pub fn format_det(data: &Value) -> String {
    let det: DetData = serde_json::from_value(data.clone()).unwrap_or_default();
    let mut lines = vec![format!("Found {} object(s):", det.bboxes.len())];
    for (i, bbox) in det.bboxes.iter().enumerate() {
        lines.push(format!("  {}. {}", i + 1, format_box(bbox)));
    }
    lines.join("\n")
}

/// Human output for a slide result
pub fn format_slide(data: &Value) -> String {
    let slide: SlideData = serde_json::from_value(data.clone()).unwrap_or_default();

    if let Some(bbox) = slide.target.as_deref() {
        let x = slide.target_x.or_else(|| bbox.first().copied()).unwrap_or_default();
        let y = slide.target_y.or_else(|| bbox.get(1).copied()).unwrap_or_default();
        return format!("Position: x={}, y={}\nBounding box: {}", x, y, format_box(bbox));
    }
    match (slide.x, slide.y) {
        (Some(x), y) => format!("Position: x={}, y={}", x, y.unwrap_or_default()),
        _ => String::new(),
    }
}

fn format_box(bbox: &[i64]) -> String {
    let parts: Vec<String> = bbox.iter().map(i64::to_string).collect();
    format!("[{}]", parts.join(", "))
}
