//! FFprobe stream inspection: audio presence and measured duration.

use serde::Deserialize;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::warn;

use crate::error::{JoinError, MediaResult};

/// FFprobe JSON output format.
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
}

/// Whether any stream in the parsed probe output carries audio.
fn streams_have_audio(probe: &FfprobeOutput) -> bool {
    probe
        .streams
        .iter()
        .any(|s| s.codec_type.as_deref() == Some("audio"))
}

/// Parse `format.duration` from probe output.
fn parse_duration(probe: &FfprobeOutput) -> Option<f64> {
    probe
        .format
        .duration
        .as_ref()
        .and_then(|d| d.parse::<f64>().ok())
}

/// Run ffprobe and parse its JSON output.
async fn run_ffprobe(path: &Path) -> MediaResult<FfprobeOutput> {
    if !path.exists() {
        return Err(JoinError::probe(
            format!("File not found: {}", path.display()),
            None,
        ));
    }

    which::which("ffprobe").map_err(|_| JoinError::FfprobeNotFound)?;

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        return Err(JoinError::probe(
            format!("FFprobe failed for {}", path.display()),
            Some(String::from_utf8_lossy(&output.stderr).into_owned()),
        ));
    }

    Ok(serde_json::from_slice(&output.stdout)?)
}

/// Check whether a media file carries an audio stream.
///
/// A probe failure (missing binary, crashed subprocess, unparsable output)
/// is deliberately treated as "no audio": downstream adds a silence track,
/// which is always safe, whereas failing the whole job on a transient
/// inspection error is not. The failure is logged so a persistently broken
/// ffprobe still shows up.
pub async fn has_audio_stream(path: impl AsRef<Path>) -> bool {
    let path = path.as_ref();
    match run_ffprobe(path).await {
        Ok(probe) => streams_have_audio(&probe),
        Err(e) => {
            warn!(
                file = %path.display(),
                error = %e,
                "Audio probe failed, assuming no audio"
            );
            false
        }
    }
}

/// Measure the exact duration of a media file in seconds.
///
/// Unlike the audio-presence probe this propagates failures: transition
/// offsets are derived from measured durations, so there is no safe default.
pub async fn probe_duration(path: impl AsRef<Path>) -> MediaResult<f64> {
    let path = path.as_ref();
    let probe = run_ffprobe(path).await?;

    parse_duration(&probe).ok_or_else(|| {
        JoinError::probe(
            format!("FFprobe reported no duration for {}", path.display()),
            None,
        )
    })
}
