//! Audio topology repair.
//!
//! Clips that arrive without an audio stream get the job's silence asset
//! muxed in. The video stream is copied untouched; only the audio is
//! encoded. The silence input loops indefinitely and `-shortest` ends the
//! mux when the video does, so a clip longer than the silence asset keeps
//! its full video and the audio is truncated to match, never the other
//! way round.

use std::path::{Path, PathBuf};
use tracing::info;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{JoinError, MediaResult};

/// Build the patch command for one clip.
///
/// Exposed for tests: the stream mapping is the contract here (`0:v` copied,
/// `1:a` encoded, silence looped so the video's natural length always wins
/// the `-shortest` race).
pub fn patch_command(input: &Path, silence: &Path, output: &Path) -> FfmpegCommand {
    FfmpegCommand::new(output)
        .input(input)
        .looped_input(silence)
        .map("0:v")
        .map("1:a")
        .video_codec("copy")
        .audio_codec("aac")
        .shortest()
}

/// Mux the silence asset into an audio-less clip.
///
/// Writes the patched clip next to the input and returns its path. A patch
/// failure fails the whole job: continuing with an audio-less clip only
/// defers the error to the cross-fade stage, where it surfaces without the
/// clip's name attached.
pub async fn patch_silent_clip(
    clip_index: usize,
    input: &Path,
    silence: &Path,
) -> MediaResult<PathBuf> {
    let output = input.with_file_name(format!("clip_patched_{}.mp4", clip_index));

    info!(
        clip = clip_index,
        input = %input.display(),
        "Clip has no audio, muxing in silence"
    );

    let cmd = patch_command(input, silence, &output);

    match FfmpegRunner::new().run(&cmd).await {
        Ok(()) => Ok(output),
        Err(JoinError::Encode { stderr, .. }) => Err(JoinError::Patch {
            clip: clip_index,
            stderr,
        }),
        Err(e) => Err(e),
    }
}
