//! Silence synthesis.
//!
//! One canonical silent track is generated per job and muxed into every clip
//! that arrives without audio, so the cross-fade stage always sees a uniform
//! audio+video topology.

use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{JoinError, MediaResult};

/// File name of the per-job silence asset.
pub const SILENCE_FILE_NAME: &str = "silence_source.m4a";

/// Build the anullsrc specifier for a given sample rate.
pub fn anullsrc_spec(sample_rate: u32) -> String {
    format!(
        "anullsrc=channel_layout=stereo:sample_rate={}",
        sample_rate
    )
}

/// Synthesize the job's silent audio asset.
///
/// Writes a stereo AAC track of `duration` seconds into `workspace_dir`.
/// Failure is fatal for the job: without the silence asset an audio-less
/// clip cannot be merged downstream.
pub async fn synthesize_silence(
    workspace_dir: &Path,
    sample_rate: u32,
    duration: f64,
) -> MediaResult<PathBuf> {
    let output = workspace_dir.join(SILENCE_FILE_NAME);

    debug!(
        path = %output.display(),
        sample_rate,
        duration,
        "Synthesizing silence asset"
    );

    let cmd = FfmpegCommand::new(&output)
        .lavfi_input(anullsrc_spec(sample_rate))
        .duration(duration)
        .audio_codec("aac");

    match FfmpegRunner::new().run(&cmd).await {
        Ok(()) => {
            info!(path = %output.display(), "Silence asset ready");
            Ok(output)
        }
        Err(JoinError::Encode { stderr, .. }) => Err(JoinError::Synthesis { stderr }),
        Err(e) => Err(e),
    }
}
