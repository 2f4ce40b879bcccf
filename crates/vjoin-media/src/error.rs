//! Error types for the composition pipeline.

use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, JoinError>;

/// Errors that can occur while composing a video.
///
/// Only `Probe` has a non-fatal path: the audio-presence prober swallows it
/// and defaults the clip to "no audio". Every other variant fails the job.
#[derive(Debug, Error)]
pub enum JoinError {
    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("FFmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("FFprobe not found in PATH")]
    FfprobeNotFound,

    #[error("Probe failed: {message}")]
    Probe {
        message: String,
        stderr: Option<String>,
    },

    #[error("Silence synthesis failed")]
    Synthesis { stderr: Option<String> },

    #[error("Audio patch failed for clip {clip}")]
    Patch {
        clip: usize,
        stderr: Option<String>,
    },

    #[error("Final encode failed: {message}")]
    Encode {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("Malformed filter graph: {0}")]
    Graph(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl JoinError {
    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a probe failure error.
    pub fn probe(message: impl Into<String>, stderr: Option<String>) -> Self {
        Self::Probe {
            message: message.into(),
            stderr,
        }
    }

    /// Create an encode failure error.
    pub fn encode(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::Encode {
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// The engine's own diagnostic text, when captured.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            Self::Probe { stderr, .. }
            | Self::Synthesis { stderr }
            | Self::Patch { stderr, .. }
            | Self::Encode { stderr, .. } => stderr.as_deref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stderr_is_surfaced() {
        let err = JoinError::encode("boom", Some("filtergraph error".to_string()), Some(1));
        assert_eq!(err.stderr(), Some("filtergraph error"));

        let err = JoinError::validation("empty clip list");
        assert!(err.stderr().is_none());
    }
}
