//! FFmpeg CLI wrapper for the vjoin composition pipeline.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building and subprocess execution
//! - Stream inspection (audio presence, measured durations)
//! - Silence synthesis and audio-topology repair
//! - A validated filter-graph IR for the cross-fade/watermark/mix stages
//! - The end-to-end join pipeline with scoped workspace cleanup

pub mod command;
pub mod error;
pub mod graph;
pub mod join;
pub mod patch;
pub mod plan;
pub mod probe;
pub mod silence;
pub mod stage;
pub mod watermark;

pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use error::{JoinError, MediaResult};
pub use graph::{FilterChain, FilterGraph, FilterOp};
pub use join::{build_join_graph, join_videos, JoinGraph};
pub use patch::patch_silent_clip;
pub use plan::{Transition, TransitionPlan};
pub use probe::{has_audio_stream, probe_duration};
pub use silence::synthesize_silence;
pub use stage::{stage, JobWorkspace, StagedClip, StagedJob};
pub use watermark::{watermark_chains, WatermarkSpec};
