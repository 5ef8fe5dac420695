//! Request payloads and response data for the service endpoints

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

/// Color presets the service understands
pub const COLOR_PRESETS: [&str; 10] = [
    "red", "blue", "green", "yellow", "orange", "purple", "cyan", "black", "white", "gray",
];

/// An HSV range: lower and upper `[h, s, v]` bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HsvRange(pub [u8; 3], pub [u8; 3]);

impl FromStr for HsvRange {
    type Err = String;

    /// Parses `h,s,v:h,s,v`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (lo, hi) = s
            .split_once(':')
            .ok_or_else(|| format!("expected LO:HI, got '{}'", s))?;
        Ok(Self(parse_triplet(lo)?, parse_triplet(hi)?))
    }
}

fn parse_triplet(s: &str) -> Result<[u8; 3], String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    if parts.len() != 3 {
        return Err(format!("expected h,s,v, got '{}'", s));
    }
    let mut out = [0u8; 3];
    for (slot, part) in out.iter_mut().zip(&parts) {
        *slot = part
            .parse()
            .map_err(|_| format!("'{}' is not a number between 0 and 255", part))?;
    }
    Ok(out)
}

/// The `color_filter` field of an OCR request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ColorFilter {
    Preset(String),
    Presets(Vec<String>),
    HsvRanges(Vec<HsvRange>),
}

impl ColorFilter {
    /// Build from CLI input. HSV ranges take precedence over preset names.
    pub fn from_args(presets: Vec<String>, ranges: Vec<HsvRange>) -> Option<Self> {
        if !ranges.is_empty() {
            return Some(Self::HsvRanges(ranges));
        }
        match presets.len() {
            0 => None,
            1 => presets.into_iter().next().map(Self::Preset),
            _ => Some(Self::Presets(presets)),
        }
    }
}

/// `POST /ocr`
#[derive(Debug, Clone, Serialize)]
pub struct OcrRequest {
    pub image: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_filter: Option<ColorFilter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub charset_range: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probability: Option<bool>,
}

/// `POST /det`
#[derive(Debug, Clone, Serialize)]
pub struct DetRequest {
    pub image: String,
}

/// `POST /slide-match`
#[derive(Debug, Clone, Serialize)]
pub struct SlideMatchRequest {
    pub target_image: String,
    pub background_image: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub simple_target: Option<bool>,
}

/// `POST /slide-comparison`
#[derive(Debug, Clone, Serialize)]
pub struct SlideComparisonRequest {
    pub target_image: String,
    pub background_image: String,
}

/// Application envelope wrapping every response
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    pub code: i64,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub data: Value,
}

/// `data` of an OCR response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OcrData {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub probability: Option<Value>,
}

/// `data` of a detection response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DetData {
    #[serde(default)]
    pub bboxes: Vec<Vec<i64>>,
}

/// `data` of a slide response. Match results carry `target`;
/// comparison results carry `x` and `y`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SlideData {
    #[serde(default)]
    pub target: Option<Vec<i64>>,
    #[serde(default)]
    pub target_x: Option<i64>,
    #[serde(default)]
    pub target_y: Option<i64>,
    #[serde(default)]
    pub x: Option<i64>,
    #[serde(default)]
    pub y: Option<i64>,
}
