//! Shared data models for the vjoin backend.
//!
//! This crate provides Serde-serializable types for:
//! - Join requests (clips, narration, background music, watermark)
//! - Watermark placement presets
//! - Encoding and composition configuration
//! - Job identifiers

pub mod encoding;
pub mod job;
pub mod join;

// Re-export common types
pub use encoding::{EncodingConfig, JoinConfig};
pub use job::JobId;
pub use join::{AudioPayload, ClipPayload, JoinRequest, WatermarkPayload, WatermarkPosition};
