//! Legacy `/{option}/{b64|file}/{text|json}` routes and `/ping`

use crate::error::{DdddError, DdddResult};
use crate::http;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{Map, Value};
use std::fmt;
use std::time::Duration;
use tracing::debug;
use ureq::Agent;

/// Which model a legacy route runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
#[value(rename_all = "snake_case")]
pub enum LegacyOption {
    Ocr,
    Old,
    OcrProbability,
    OldProbability,
    Det,
    Match,
    SimpleMatch,
    Compare,
}

impl LegacyOption {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ocr => "ocr",
            Self::Old => "old",
            Self::OcrProbability => "ocr_probability",
            Self::OldProbability => "old_probability",
            Self::Det => "det",
            Self::Match => "match",
            Self::SimpleMatch => "simple_match",
            Self::Compare => "compare",
        }
    }

    /// Form keys, in the order images are given on the command line
    pub fn image_keys(self) -> &'static [&'static str] {
        match self {
            Self::Match | Self::SimpleMatch | Self::Compare => &["target", "background"],
            _ => &["image"],
        }
    }
}

impl fmt::Display for LegacyOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How images are sent
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Transport {
    /// JSON object of base64 strings
    #[default]
    B64,
    /// multipart/form-data
    File,
}

impl Transport {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::B64 => "b64",
            Self::File => "file",
        }
    }
}

/// How results come back
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Format {
    /// Raw result, empty body on failure
    Text,
    /// `{status, result}` or `{status, msg}`
    #[default]
    Json,
}

impl Format {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Json => "json",
        }
    }
}

/// Path for a legacy route, e.g. `/simple_match/file/json`
pub fn route(option: LegacyOption, transport: Transport, format: Format) -> String {
    format!(
        "/{}/{}/{}",
        option.as_str(),
        transport.as_str(),
        format.as_str()
    )
}

/// Client for the legacy routes
#[derive(Debug, Clone)]
pub struct LegacyClient {
    agent: Agent,
    base_url: String,
}

impl LegacyClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            agent: http::agent(timeout),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// `GET /ping`; the service answers `pong`
    pub fn ping(&self) -> DdddResult<String> {
        let url = format!("{}/ping", self.base_url);
        let mut response = self
            .agent
            .get(&url)
            .header("User-Agent", http::USER_AGENT)
            .call()
            .map_err(|e| DdddError::unreachable(&url, e))?;
        let status = response.status().as_u16();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| DdddError::unreachable(&url, e))?;
        if status != 200 {
            return Err(DdddError::unreachable(&url, format!("HTTP {}", status)));
        }
        Ok(body)
    }

    /// Call a legacy route with `images` (paired with `option.image_keys()`).
    ///
    /// Returns the `result` for JSON format and the raw body for text.
    pub fn call(
        &self,
        option: LegacyOption,
        transport: Transport,
        format: Format,
        images: &[Vec<u8>],
    ) -> DdddResult<Value> {
        let keys = option.image_keys();
        if images.len() != keys.len() {
            return Err(DdddError::User(format!(
                "{} expects {} image(s) ({}), got {}",
                option,
                keys.len(),
                keys.join(", "),
                images.len()
            )));
        }
        let fields: Vec<(&str, &[u8])> = keys
            .iter()
            .copied()
            .zip(images.iter().map(Vec::as_slice))
            .collect();

        let path = route(option, transport, format);
        let url = format!("{}{}", self.base_url, path);
        debug!("POST {}", url);

        let request = self
            .agent
            .post(&url)
            .header("User-Agent", http::USER_AGENT);
        let result = match transport {
            Transport::B64 => request.send_json(Value::Object(b64_body(&fields))),
            Transport::File => {
                let boundary = format!("ddddctl-{}", uuid::Uuid::new_v4().simple());
                let body = multipart_body(&boundary, &fields);
                request
                    .header(
                        "Content-Type",
                        format!("multipart/form-data; boundary={}", boundary),
                    )
                    .send(&body[..])
            }
        };
        let mut response = result.map_err(|e| DdddError::unreachable(&url, e))?;

        let status = response.status().as_u16();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| DdddError::unreachable(&url, e))?;
        if status != 200 {
            return Err(DdddError::Legacy {
                route: path,
                reason: format!("HTTP {}: {}", status, body.trim()),
            });
        }

        match format {
            Format::Json => interpret_json(&path, &body),
            Format::Text if body.is_empty() => Err(DdddError::Legacy {
                route: path,
                reason: "empty response".to_string(),
            }),
            Format::Text => Ok(Value::String(body)),
        }
    }
}

/// Unwrap `{status: 200, result}`; `{status: 404, msg}` becomes an error
pub fn interpret_json(route: &str, body: &str) -> DdddResult<Value> {
    let value: Value = serde_json::from_str(body).map_err(|e| DdddError::Legacy {
        route: route.to_string(),
        reason: format!("invalid JSON: {}", e),
    })?;

    if value.get("status").and_then(Value::as_i64) == Some(200) {
        return Ok(value.get("result").cloned().unwrap_or(Value::Null));
    }
    let reason = value
        .get("msg")
        .and_then(Value::as_str)
        .unwrap_or("Unknown error")
        .to_string();
    Err(DdddError::Legacy {
        route: route.to_string(),
        reason,
    })
}

fn b64_body(fields: &[(&str, &[u8])]) -> Map<String, Value> {
    fields
        .iter()
        .map(|(key, bytes)| ((*key).to_string(), Value::String(STANDARD.encode(bytes))))
        .collect()
}

/// Encode `fields` as multipart/form-data
pub fn multipart_body(boundary: &str, fields: &[(&str, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (key, bytes) in fields {
        body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{key}\"; filename=\"{key}\"\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());
    body
}
