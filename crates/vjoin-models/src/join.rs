//! Join request payload definitions.
//!
//! These types mirror the wire payload accepted at the request boundary:
//! an ordered list of base64-encoded clips, optional narration and
//! background music tracks, and an optional watermark overlay spec.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// One input video clip, base64-encoded.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ClipPayload {
    /// Original file name (informational only)
    pub name: String,
    /// Base64-encoded video bytes
    pub data: String,
}

/// An auxiliary audio track (narration or background music), base64-encoded.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AudioPayload {
    /// Original file name (informational only)
    pub name: String,
    /// Base64-encoded audio bytes
    pub data: String,
}

/// Watermark overlay placement preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum WatermarkPosition {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    Center,
}

impl Default for WatermarkPosition {
    fn default() -> Self {
        WatermarkPosition::BottomRight
    }
}

impl WatermarkPosition {
    pub fn as_str(&self) -> &'static str {
        match self {
            WatermarkPosition::TopLeft => "top_left",
            WatermarkPosition::TopRight => "top_right",
            WatermarkPosition::BottomLeft => "bottom_left",
            WatermarkPosition::BottomRight => "bottom_right",
            WatermarkPosition::Center => "center",
        }
    }
}

impl fmt::Display for WatermarkPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error parsing a watermark position string.
#[derive(Debug, Error)]
#[error("Invalid watermark position: {0}")]
pub struct ParsePositionError(String);

impl FromStr for WatermarkPosition {
    type Err = ParsePositionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "top_left" => Ok(WatermarkPosition::TopLeft),
            "top_right" => Ok(WatermarkPosition::TopRight),
            "bottom_left" => Ok(WatermarkPosition::BottomLeft),
            "bottom_right" => Ok(WatermarkPosition::BottomRight),
            "center" => Ok(WatermarkPosition::Center),
            other => Err(ParsePositionError(other.to_string())),
        }
    }
}

/// Watermark overlay specification.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WatermarkPayload {
    /// Base64-encoded image bytes (PNG with alpha recommended)
    pub data: String,
    /// Placement preset
    #[serde(default)]
    pub position: WatermarkPosition,
    /// Opacity percentage, 0-100
    #[serde(default = "default_opacity")]
    pub opacity: u8,
    /// Target width in pixels after scaling
    #[serde(default = "default_watermark_width")]
    pub width: u32,
}

fn default_opacity() -> u8 {
    100
}

fn default_watermark_width() -> u32 {
    150
}

/// One composition request: ordered clips plus optional extras.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct JoinRequest {
    /// Ordered list of input clips
    pub clips: Vec<ClipPayload>,
    /// Optional narration track, mixed over the joined audio
    #[serde(default)]
    pub voice: Option<AudioPayload>,
    /// Optional background music track
    #[serde(default)]
    pub backsound: Option<AudioPayload>,
    /// Whether the background music should actually be mixed in
    #[serde(default)]
    pub use_backsound: bool,
    /// Optional watermark overlay
    #[serde(default)]
    pub watermark: Option<WatermarkPayload>,
}

impl JoinRequest {
    /// Create a request from clips only.
    pub fn from_clips(clips: Vec<ClipPayload>) -> Self {
        Self {
            clips,
            voice: None,
            backsound: None,
            use_backsound: false,
            watermark: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_serde_snake_case() {
        let json = serde_json::to_string(&WatermarkPosition::BottomRight).unwrap();
        assert_eq!(json, "\"bottom_right\"");

        let pos: WatermarkPosition = serde_json::from_str("\"top_left\"").unwrap();
        assert_eq!(pos, WatermarkPosition::TopLeft);
    }

    #[test]
    fn test_position_from_str() {
        assert_eq!(
            "center".parse::<WatermarkPosition>().unwrap(),
            WatermarkPosition::Center
        );
        assert!("middle".parse::<WatermarkPosition>().is_err());
    }

    #[test]
    fn test_request_defaults() {
        let json = r#"{"clips":[{"name":"a.mp4","data":"AAAA"}]}"#;
        let req: JoinRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.clips.len(), 1);
        assert!(req.voice.is_none());
        assert!(!req.use_backsound);
        assert!(req.watermark.is_none());
    }

    #[test]
    fn test_watermark_defaults() {
        let json = r#"{"data":"AAAA"}"#;
        let wm: WatermarkPayload = serde_json::from_str(json).unwrap();
        assert_eq!(wm.position, WatermarkPosition::BottomRight);
        assert_eq!(wm.opacity, 100);
        assert_eq!(wm.width, 150);
    }
}
