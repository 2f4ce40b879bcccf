//! Watermark overlay stage.
//!
//! The staged watermark image is scaled to its requested width with lanczos
//! resampling (alpha preserved via `format=rgba`), its alpha channel is
//! multiplied by the requested opacity, and the result is composited over
//! the running video pin at one of five anchor presets.

use std::path::PathBuf;

use crate::graph::{FilterChain, FilterOp};
use vjoin_models::encoding::WATERMARK_MARGIN;
use vjoin_models::WatermarkPosition;

/// A staged watermark ready for overlay.
#[derive(Debug, Clone)]
pub struct WatermarkSpec {
    /// Staged image path
    pub path: PathBuf,
    /// Placement preset
    pub position: WatermarkPosition,
    /// Opacity percentage, 0-100
    pub opacity: u8,
    /// Target width in pixels
    pub width: u32,
    /// Margin from the anchoring edges in pixels
    pub margin: u32,
}

impl WatermarkSpec {
    pub fn new(path: PathBuf, position: WatermarkPosition, opacity: u8, width: u32) -> Self {
        Self {
            path,
            position,
            opacity: opacity.min(100),
            width,
            margin: WATERMARK_MARGIN,
        }
    }

    /// Alpha multiplier derived from the opacity percentage.
    pub fn alpha(&self) -> f64 {
        f64::from(self.opacity) / 100.0
    }

    /// Overlay position expressions for the anchor preset.
    ///
    /// `W`/`H` are the base video dimensions, `w`/`h` the overlay's.
    pub fn overlay_position(&self) -> (String, String) {
        let m = self.margin;
        match self.position {
            WatermarkPosition::TopLeft => (format!("{}", m), format!("{}", m)),
            WatermarkPosition::TopRight => (format!("W-w-{}", m), format!("{}", m)),
            WatermarkPosition::BottomLeft => (format!("{}", m), format!("H-h-{}", m)),
            WatermarkPosition::BottomRight => (format!("W-w-{}", m), format!("H-h-{}", m)),
            WatermarkPosition::Center => ("(W-w)/2".to_string(), "(H-h)/2".to_string()),
        }
    }
}

/// Build the watermark chains: prepare the image, then overlay it.
///
/// `input_index` is the ffmpeg input carrying the image; `video_in` is the
/// running video pin and `video_out` the pin produced by the overlay.
pub fn watermark_chains(
    spec: &WatermarkSpec,
    input_index: usize,
    video_in: &str,
    video_out: &str,
) -> Vec<FilterChain> {
    let (x, y) = spec.overlay_position();

    vec![
        FilterChain::new(
            [format!("{}:v", input_index)],
            vec![
                FilterOp::Scale {
                    width: i64::from(spec.width),
                    height: -1,
                    fit: false,
                    flags: Some("lanczos".to_string()),
                },
                FilterOp::Format {
                    pix_fmt: "rgba".to_string(),
                },
                FilterOp::ColorAlpha {
                    alpha: spec.alpha(),
                },
            ],
            ["wm"],
        ),
        FilterChain::new(
            [video_in.to_string(), "wm".to_string()],
            vec![FilterOp::Overlay { x, y }],
            [video_out],
        ),
    ]
}
