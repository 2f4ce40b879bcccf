//! Encoding and composition configuration.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Default video codec (H.264)
pub const DEFAULT_VIDEO_CODEC: &str = "libx264";
/// Default audio codec
pub const DEFAULT_AUDIO_CODEC: &str = "aac";
/// Default encoding preset (latency over quality for interactive joins)
pub const DEFAULT_PRESET: &str = "ultrafast";
/// Default pixel format (widely compatible 4:2:0 chroma subsampling)
pub const DEFAULT_PIXEL_FORMAT: &str = "yuv420p";

/// Canonical portrait frame size all clips are normalized to
pub const FRAME_WIDTH: u32 = 720;
pub const FRAME_HEIGHT: u32 = 1280;
/// Canonical frame rate forced before cross-fading
pub const FRAME_RATE: u32 = 30;
/// Canonical audio sample rate
pub const SAMPLE_RATE: u32 = 44100;

/// Default cross-fade blend duration between adjacent clips, in seconds
pub const DEFAULT_BLEND_DURATION: f64 = 1.0;
/// Length of the synthesized silence asset, in seconds
pub const SILENCE_DURATION: f64 = 10.0;
/// Margin between a watermark and its anchoring edges, in pixels
pub const WATERMARK_MARGIN: u32 = 20;

/// Narration gain applied before mixing
pub const VOICE_GAIN: f64 = 1.5;
/// Background music gain applied before mixing
pub const BACKSOUND_GAIN: f64 = 0.15;

/// Video encoding configuration for the final join encode.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EncodingConfig {
    /// Video codec (e.g., "libx264")
    #[serde(default = "default_video_codec")]
    pub codec: String,

    /// Encoding preset (e.g., "ultrafast", "fast", "medium")
    #[serde(default = "default_preset")]
    pub preset: String,

    /// Audio codec
    #[serde(default = "default_audio_codec")]
    pub audio_codec: String,

    /// Pixel format for the output
    #[serde(default = "default_pixel_format")]
    pub pixel_format: String,

    /// Additional FFmpeg output arguments
    #[serde(default)]
    pub extra_args: Vec<String>,
}

fn default_video_codec() -> String {
    DEFAULT_VIDEO_CODEC.to_string()
}
fn default_preset() -> String {
    DEFAULT_PRESET.to_string()
}
fn default_audio_codec() -> String {
    DEFAULT_AUDIO_CODEC.to_string()
}
fn default_pixel_format() -> String {
    DEFAULT_PIXEL_FORMAT.to_string()
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            codec: DEFAULT_VIDEO_CODEC.to_string(),
            preset: DEFAULT_PRESET.to_string(),
            audio_codec: DEFAULT_AUDIO_CODEC.to_string(),
            pixel_format: DEFAULT_PIXEL_FORMAT.to_string(),
            extra_args: Vec::new(),
        }
    }
}

impl EncodingConfig {
    /// Create a new encoding configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Convert to FFmpeg output arguments.
    pub fn to_ffmpeg_args(&self) -> Vec<String> {
        let mut args = vec![
            "-c:v".to_string(),
            self.codec.clone(),
            "-preset".to_string(),
            self.preset.clone(),
            "-c:a".to_string(),
            self.audio_codec.clone(),
            "-pix_fmt".to_string(),
            self.pixel_format.clone(),
        ];

        args.extend(self.extra_args.clone());

        args
    }
}

/// Composition parameters for one join job.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct JoinConfig {
    /// Frame width all clips are normalized to
    #[serde(default = "default_frame_width")]
    pub frame_width: u32,

    /// Frame height all clips are normalized to
    #[serde(default = "default_frame_height")]
    pub frame_height: u32,

    /// Frame rate forced on every normalized clip
    #[serde(default = "default_frame_rate")]
    pub frame_rate: u32,

    /// Audio sample rate all tracks are resampled to
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// Cross-fade blend duration between adjacent clips, in seconds
    #[serde(default = "default_blend_duration")]
    pub blend_duration: f64,

    /// Length of the synthesized silence asset, in seconds
    #[serde(default = "default_silence_duration")]
    pub silence_duration: f64,

    /// Final encode settings
    #[serde(default)]
    pub encoding: EncodingConfig,
}

fn default_frame_width() -> u32 {
    FRAME_WIDTH
}
fn default_frame_height() -> u32 {
    FRAME_HEIGHT
}
fn default_frame_rate() -> u32 {
    FRAME_RATE
}
fn default_sample_rate() -> u32 {
    SAMPLE_RATE
}
fn default_blend_duration() -> f64 {
    DEFAULT_BLEND_DURATION
}
fn default_silence_duration() -> f64 {
    SILENCE_DURATION
}

impl Default for JoinConfig {
    fn default() -> Self {
        Self {
            frame_width: FRAME_WIDTH,
            frame_height: FRAME_HEIGHT,
            frame_rate: FRAME_RATE,
            sample_rate: SAMPLE_RATE,
            blend_duration: DEFAULT_BLEND_DURATION,
            silence_duration: SILENCE_DURATION,
            encoding: EncodingConfig::default(),
        }
    }
}

impl JoinConfig {
    /// Returns a new config with updated blend duration.
    pub fn with_blend_duration(mut self, seconds: f64) -> Self {
        self.blend_duration = seconds;
        self
    }
}
