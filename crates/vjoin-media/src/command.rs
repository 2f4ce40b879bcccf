//! FFmpeg command builder and runner.
//!
//! The builder supports an arbitrary number of inputs (file paths or lavfi
//! source specifiers) because the join encode feeds every staged clip plus
//! the optional watermark/voice/backsound inputs into a single invocation.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use crate::error::{JoinError, MediaResult};
use vjoin_models::EncodingConfig;

/// One `-i` input: a file path or a lavfi source, with optional pre-input args.
#[derive(Debug, Clone)]
pub struct FfmpegInput {
    /// Arguments placed before this input's `-i`
    pre_args: Vec<String>,
    /// File path or lavfi specifier
    source: String,
}

impl FfmpegInput {
    /// A regular file input.
    pub fn path(path: impl AsRef<Path>) -> Self {
        Self {
            pre_args: Vec::new(),
            source: path.as_ref().to_string_lossy().to_string(),
        }
    }

    /// A lavfi source input (e.g. `anullsrc=channel_layout=stereo:sample_rate=44100`).
    pub fn lavfi(spec: impl Into<String>) -> Self {
        Self {
            pre_args: vec!["-f".to_string(), "lavfi".to_string()],
            source: spec.into(),
        }
    }

    /// A file input looped indefinitely (`-stream_loop -1`).
    pub fn looped(path: impl AsRef<Path>) -> Self {
        Self {
            pre_args: vec!["-stream_loop".to_string(), "-1".to_string()],
            source: path.as_ref().to_string_lossy().to_string(),
        }
    }
}

/// Builder for FFmpeg commands.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    /// Ordered inputs; the index order defines stream indices in filters
    inputs: Vec<FfmpegInput>,
    /// Output file path
    output: PathBuf,
    /// Output arguments (after all inputs)
    output_args: Vec<String>,
    /// Whether to overwrite output
    overwrite: bool,
    /// Log level
    log_level: String,
}

impl FfmpegCommand {
    /// Create a new FFmpeg command writing to `output`.
    pub fn new(output: impl AsRef<Path>) -> Self {
        Self {
            inputs: Vec::new(),
            output: output.as_ref().to_path_buf(),
            output_args: Vec::new(),
            overwrite: true,
            log_level: "error".to_string(),
        }
    }

    /// Add a file input.
    pub fn input(mut self, path: impl AsRef<Path>) -> Self {
        self.inputs.push(FfmpegInput::path(path));
        self
    }

    /// Add a lavfi source input.
    pub fn lavfi_input(mut self, spec: impl Into<String>) -> Self {
        self.inputs.push(FfmpegInput::lavfi(spec));
        self
    }

    /// Add a file input that loops until the output ends.
    pub fn looped_input(mut self, path: impl AsRef<Path>) -> Self {
        self.inputs.push(FfmpegInput::looped(path));
        self
    }

    /// Add an output argument.
    pub fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    /// Add multiple output arguments.
    pub fn output_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set output duration.
    pub fn duration(self, seconds: f64) -> Self {
        self.output_arg("-t").output_arg(format!("{:.3}", seconds))
    }

    /// Set filter complex.
    pub fn filter_complex(self, filter: impl Into<String>) -> Self {
        self.output_arg("-filter_complex").output_arg(filter)
    }

    /// Map a stream or filter pad into the output.
    pub fn map(self, label: impl Into<String>) -> Self {
        self.output_arg("-map").output_arg(label)
    }

    /// Set video codec.
    pub fn video_codec(self, codec: impl Into<String>) -> Self {
        self.output_arg("-c:v").output_arg(codec)
    }

    /// Set audio codec.
    pub fn audio_codec(self, codec: impl Into<String>) -> Self {
        self.output_arg("-c:a").output_arg(codec)
    }

    /// Apply final-encode settings.
    pub fn encoding(self, encoding: &EncodingConfig) -> Self {
        self.output_args(encoding.to_ffmpeg_args())
    }

    /// Stop writing when the shortest mapped stream ends.
    pub fn shortest(self) -> Self {
        self.output_arg("-shortest")
    }

    /// Build the command arguments.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        // Overwrite flag
        if self.overwrite {
            args.push("-y".to_string());
        }

        // Log level
        args.push("-v".to_string());
        args.push(self.log_level.clone());

        // Inputs, in stream-index order
        for input in &self.inputs {
            args.extend(input.pre_args.clone());
            args.push("-i".to_string());
            args.push(input.source.clone());
        }

        // Output args
        args.extend(self.output_args.clone());

        // Output file
        args.push(self.output.to_string_lossy().to_string());

        args
    }
}

/// Runner for FFmpeg commands.
///
/// Captures stderr in full so the engine's own diagnostics travel verbatim
/// inside the returned error.
#[derive(Debug, Default)]
pub struct FfmpegRunner;

impl FfmpegRunner {
    /// Create a new runner.
    pub fn new() -> Self {
        Self
    }

    /// Run an FFmpeg command to completion.
    pub async fn run(&self, cmd: &FfmpegCommand) -> MediaResult<()> {
        which::which("ffmpeg").map_err(|_| JoinError::FfmpegNotFound)?;

        let args = cmd.build_args();
        debug!("Running FFmpeg: ffmpeg {}", args.join(" "));

        let output = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if output.status.success() {
            Ok(())
        } else {
            Err(JoinError::encode(
                "FFmpeg exited with non-zero status",
                Some(String::from_utf8_lossy(&output.stderr).into_owned()),
                output.status.code(),
            ))
        }
    }
}

/// Check if FFmpeg is available.
pub fn check_ffmpeg() -> MediaResult<PathBuf> {
    which::which("ffmpeg").map_err(|_| JoinError::FfmpegNotFound)
}

/// Check if FFprobe is available.
pub fn check_ffprobe() -> MediaResult<PathBuf> {
    which::which("ffprobe").map_err(|_| JoinError::FfprobeNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multi_input_ordering() {
        let cmd = FfmpegCommand::new("out.mp4")
            .input("a.mp4")
            .input("b.mp4")
            .filter_complex("[0:v][1:v]xfade=transition=fade:duration=1:offset=4[v]")
            .map("[v]");

        let args = cmd.build_args();
        let first_i = args.iter().position(|a| a == "-i").unwrap();
        assert_eq!(args[first_i + 1], "a.mp4");
        let second_i = args.iter().rposition(|a| a == "-i").unwrap();
        assert_eq!(args[second_i + 1], "b.mp4");
        // Filter args come after every input
        let fc = args.iter().position(|a| a == "-filter_complex").unwrap();
        assert!(fc > second_i);
        assert_eq!(args.last().unwrap(), "out.mp4");
    }

    #[test]
    fn test_lavfi_input_args() {
        let cmd = FfmpegCommand::new("silence.m4a")
            .lavfi_input("anullsrc=channel_layout=stereo:sample_rate=44100")
            .duration(10.0)
            .audio_codec("aac");

        let args = cmd.build_args();
        let f = args.iter().position(|a| a == "-f").unwrap();
        assert_eq!(args[f + 1], "lavfi");
        let i = args.iter().position(|a| a == "-i").unwrap();
        assert!(f < i, "-f lavfi must precede -i");
        assert!(args.contains(&"-t".to_string()));
        assert!(args.contains(&"10.000".to_string()));
    }

    #[test]
    fn test_encoding_args_applied() {
        let cmd = FfmpegCommand::new("out.mp4")
            .input("in.mp4")
            .encoding(&EncodingConfig::default())
            .shortest();

        let args = cmd.build_args();
        assert!(args.contains(&"libx264".to_string()));
        assert!(args.contains(&"ultrafast".to_string()));
        assert!(args.contains(&"-shortest".to_string()));
    }
}
