//! The join pipeline: filter-graph construction and execution.
//!
//! Staged clips are normalized to a canonical portrait frame, folded together
//! pairwise with cross-fades at measured offsets, optionally watermarked and
//! mixed with narration/background music, then encoded in one FFmpeg
//! invocation. The whole job runs inside a scoped workspace that is removed
//! on every exit path.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{JoinError, MediaResult};
use crate::graph::{FilterChain, FilterGraph, FilterOp};
use crate::patch::patch_silent_clip;
use crate::plan::TransitionPlan;
use crate::probe;
use crate::silence::synthesize_silence;
use crate::stage::{stage, StagedClip, StagedJob};
use crate::watermark::{watermark_chains, WatermarkSpec};
use vjoin_models::encoding::{BACKSOUND_GAIN, VOICE_GAIN};
use vjoin_models::{JoinConfig, JoinRequest};

/// File name of the final encode inside the workspace.
pub const OUTPUT_FILE_NAME: &str = "output_final.mp4";

/// Smoothing window for sources dropping out of the mix, in seconds.
const MIX_DROPOUT_TRANSITION: f64 = 2.0;

/// A validated graph plus everything the encode command needs.
#[derive(Debug)]
pub struct JoinGraph {
    /// The validated filter graph
    pub graph: FilterGraph,
    /// FFmpeg inputs in stream-index order: clips, then watermark, voice,
    /// backsound as present
    pub inputs: Vec<PathBuf>,
    /// Final video pin to map
    pub video_out: String,
    /// Final audio pin to map
    pub audio_out: String,
}

/// Build and validate the composition graph for a prepared job.
///
/// Every clip must already carry audio and a measured duration.
pub fn build_join_graph(
    clips: &[StagedClip],
    watermark: Option<&WatermarkSpec>,
    voice: Option<&Path>,
    backsound: Option<&Path>,
    config: &JoinConfig,
) -> MediaResult<JoinGraph> {
    if clips.is_empty() {
        return Err(JoinError::validation("Cannot build a graph without clips"));
    }

    let n = clips.len();
    let mut graph = FilterGraph::new();
    let mut inputs: Vec<PathBuf> = clips.iter().map(|c| c.path.clone()).collect();

    // Normalization: canonical frame, constant rate, zeroed timestamps
    for i in 0..n {
        graph.push(FilterChain::new(
            [format!("{}:v", i)],
            vec![
                FilterOp::Scale {
                    width: i64::from(config.frame_width),
                    height: i64::from(config.frame_height),
                    fit: true,
                    flags: None,
                },
                FilterOp::Pad {
                    width: config.frame_width,
                    height: config.frame_height,
                },
                FilterOp::SetSar,
                FilterOp::Fps {
                    fps: config.frame_rate,
                },
                FilterOp::Format {
                    pix_fmt: config.encoding.pixel_format.clone(),
                },
                FilterOp::SetPts,
            ],
            [format!("v{}", i)],
        ));
        graph.push(FilterChain::new(
            [format!("{}:a", i)],
            vec![
                FilterOp::AResample {
                    rate: config.sample_rate,
                },
                FilterOp::ASetPts,
            ],
            [format!("a{}", i)],
        ));
    }

    // Pairwise cross-fade fold; a single clip skips this stage entirely
    let durations: Vec<f64> = clips.iter().map(|c| c.duration).collect();
    let plan = TransitionPlan::compute(&durations, config.blend_duration);

    let mut video_pin = "v0".to_string();
    let mut audio_pin = "a0".to_string();
    for (boundary, transition) in plan.transitions().iter().enumerate() {
        let next = boundary + 1;

        let video_out = format!("v_x{}", next);
        graph.push(FilterChain::new(
            [video_pin.clone(), format!("v{}", next)],
            vec![FilterOp::Xfade {
                duration: transition.blend,
                offset: transition.offset,
            }],
            [video_out.clone()],
        ));
        video_pin = video_out;

        let audio_out = format!("a_x{}", next);
        graph.push(FilterChain::new(
            [audio_pin.clone(), format!("a{}", next)],
            vec![FilterOp::ACrossfade {
                duration: transition.blend,
            }],
            [audio_out.clone()],
        ));
        audio_pin = audio_out;
    }

    // Watermark overlay on the running video pin
    let mut next_input = n;
    if let Some(wm) = watermark {
        inputs.push(wm.path.clone());
        for chain in watermark_chains(wm, next_input, &video_pin, "v_wm") {
            graph.push(chain);
        }
        video_pin = "v_wm".to_string();
        next_input += 1;
    }

    // Audio mix: the joined audio always comes first so `duration=first`
    // makes it the length ceiling
    let mut mix_pins = vec![audio_pin.clone()];
    if let Some(voice) = voice {
        inputs.push(voice.to_path_buf());
        graph.push(FilterChain::new(
            [format!("{}:a", next_input)],
            vec![FilterOp::Volume { gain: VOICE_GAIN }],
            ["voice_norm"],
        ));
        mix_pins.push("voice_norm".to_string());
        next_input += 1;
    }
    if let Some(backsound) = backsound {
        inputs.push(backsound.to_path_buf());
        graph.push(FilterChain::new(
            [format!("{}:a", next_input)],
            vec![FilterOp::Volume {
                gain: BACKSOUND_GAIN,
            }],
            ["bgm_norm"],
        ));
        mix_pins.push("bgm_norm".to_string());
    }

    if mix_pins.len() > 1 {
        let count = mix_pins.len();
        graph.push(FilterChain::new(
            mix_pins,
            vec![FilterOp::Amix {
                inputs: count,
                dropout_transition: MIX_DROPOUT_TRANSITION,
            }],
            ["a_final"],
        ));
    } else {
        // Unity-gain relabel so the mapped pin name is stable
        graph.push(FilterChain::new(
            [audio_pin],
            vec![FilterOp::Volume { gain: 1.0 }],
            ["a_final"],
        ));
    }

    let audio_out = "a_final".to_string();
    let dangling = graph.validate(&[video_pin.as_str(), audio_out.as_str()])?;
    for pin in &dangling {
        warn!(pin = %pin, "Filter graph produces an unconsumed pin");
    }

    Ok(JoinGraph {
        graph,
        inputs,
        video_out: video_pin,
        audio_out,
    })
}

/// Run the final encode and read the result into memory.
async fn execute(staged: &StagedJob, join_graph: &JoinGraph, config: &JoinConfig) -> MediaResult<Vec<u8>> {
    let output = staged.workspace.path().join(OUTPUT_FILE_NAME);

    let mut cmd = FfmpegCommand::new(&output);
    for input in &join_graph.inputs {
        cmd = cmd.input(input);
    }
    let cmd = cmd
        .filter_complex(join_graph.graph.serialize())
        .map(format!("[{}]", join_graph.video_out))
        .map(format!("[{}]", join_graph.audio_out))
        .encoding(&config.encoding)
        .shortest();

    info!(
        job_id = %staged.workspace.id(),
        inputs = join_graph.inputs.len(),
        chains = join_graph.graph.len(),
        "Running final encode"
    );

    FfmpegRunner::new().run(&cmd).await?;

    Ok(tokio::fs::read(&output).await?)
}

/// Probe one clip, patch in silence if needed, and measure its duration.
async fn prepare_clip(index: usize, path: PathBuf, silence: &Path) -> MediaResult<StagedClip> {
    let has_audio = probe::has_audio_stream(&path).await;

    let path = if has_audio {
        path
    } else {
        patch_silent_clip(index, &path, silence).await?
    };

    // Measured, not nominal: encoder padding and frame rounding shift real
    // durations, and the offsets must follow what is actually on disk
    let duration = probe::probe_duration(&path).await?;
    debug!(clip = index, duration, has_audio, "Clip prepared");

    Ok(StagedClip {
        path,
        has_audio: true,
        duration,
    })
}

/// Probe and patch all clips across a bounded worker pool.
///
/// Results are joined back in clip order before any offset math runs.
async fn prepare_clips(clips: &mut [StagedClip], silence: &Path) -> MediaResult<()> {
    let limit = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4);
    let semaphore = Arc::new(Semaphore::new(limit));
    let mut tasks = JoinSet::new();

    for (index, clip) in clips.iter().enumerate() {
        let semaphore = semaphore.clone();
        let path = clip.path.clone();
        let silence = silence.to_path_buf();
        tasks.spawn(async move {
            let _permit = semaphore
                .acquire_owned()
                .await
                .map_err(|_| JoinError::internal("clip worker pool closed"))?;
            let prepared = prepare_clip(index, path, &silence).await?;
            Ok::<_, JoinError>((index, prepared))
        });
    }

    while let Some(joined) = tasks.join_next().await {
        let (index, prepared) =
            joined.map_err(|e| JoinError::internal(format!("clip task panicked: {}", e)))??;
        clips[index] = prepared;
    }

    Ok(())
}

/// Compose a join request into a single base64-encoded MP4.
///
/// Pipeline: stage inputs, synthesize the silence asset, probe/patch/measure
/// every clip, build and validate the filter graph, encode, read back. The
/// workspace directory is removed when this function returns, on success and
/// on every failure path alike.
pub async fn join_videos(request: &JoinRequest, config: &JoinConfig) -> MediaResult<String> {
    let mut staged = stage(request).await?;
    info!(
        job_id = %staged.workspace.id(),
        clips = staged.clips.len(),
        "Starting join job"
    );

    let silence = synthesize_silence(
        staged.workspace.path(),
        config.sample_rate,
        config.silence_duration,
    )
    .await?;

    prepare_clips(&mut staged.clips, &silence).await?;

    let durations: Vec<f64> = staged.clips.iter().map(|c| c.duration).collect();
    debug!(
        job_id = %staged.workspace.id(),
        ?durations,
        expected = TransitionPlan::expected_duration(&durations, config.blend_duration),
        "Clip durations measured"
    );

    let join_graph = build_join_graph(
        &staged.clips,
        staged.watermark.as_ref(),
        staged.voice.as_deref(),
        staged.backsound.as_deref(),
        config,
    )?;

    let bytes = execute(&staged, &join_graph, config).await?;

    info!(
        job_id = %staged.workspace.id(),
        size = bytes.len(),
        "Join job complete"
    );

    Ok(BASE64.encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use vjoin_models::WatermarkPosition;

    fn prepared_clip(index: usize, duration: f64) -> StagedClip {
        StagedClip {
            path: PathBuf::from(format!("/job/clip_{}.mp4", index)),
            has_audio: true,
            duration,
        }
    }

    fn clips(durations: &[f64]) -> Vec<StagedClip> {
        durations
            .iter()
            .enumerate()
            .map(|(i, &d)| prepared_clip(i, d))
            .collect()
    }

    #[test]
    fn test_single_clip_emits_no_transitions() {
        let jg = build_join_graph(&clips(&[7.0]), None, None, None, &JoinConfig::default()).unwrap();
        let serialized = jg.graph.serialize();
        assert!(!serialized.contains("xfade"));
        assert!(!serialized.contains("acrossfade"));
        assert_eq!(jg.video_out, "v0");
        // Joined audio passes through at unity gain under a stable label
        assert!(serialized.contains("[a0]volume=1.00[a_final]"));
    }

    #[test]
    fn test_three_clips_fold_with_cumulative_offsets() {
        let config = JoinConfig::default().with_blend_duration(0.5);
        let jg =
            build_join_graph(&clips(&[5.0, 5.0, 5.0]), None, None, None, &config).unwrap();
        let serialized = jg.graph.serialize();

        assert_eq!(serialized.matches("xfade=transition=fade").count(), 2);
        assert_eq!(serialized.matches("acrossfade=").count(), 2);
        assert!(serialized.contains("offset=4.500"));
        assert!(serialized.contains("offset=9.000"));
        assert_eq!(jg.video_out, "v_x2");
    }

    #[test]
    fn test_normalization_chain_per_clip() {
        let jg = build_join_graph(&clips(&[5.0, 5.0]), None, None, None, &JoinConfig::default())
            .unwrap();
        let serialized = jg.graph.serialize();
        assert_eq!(
            serialized
                .matches("scale=720:1280:force_original_aspect_ratio=decrease")
                .count(),
            2
        );
        assert_eq!(serialized.matches("aresample=44100").count(), 2);
        assert!(serialized.contains("fps=30"));
        assert!(serialized.contains("format=yuv420p"));
        assert!(serialized.contains("setpts=PTS-STARTPTS"));
    }

    #[test]
    fn test_watermark_input_follows_clips() {
        let wm = WatermarkSpec::new(
            PathBuf::from("/job/watermark.png"),
            WatermarkPosition::BottomRight,
            80,
            150,
        );
        let jg = build_join_graph(
            &clips(&[5.0, 5.0, 5.0]),
            Some(&wm),
            None,
            None,
            &JoinConfig::default(),
        )
        .unwrap();

        assert_eq!(jg.inputs.len(), 4);
        assert_eq!(jg.inputs[3], PathBuf::from("/job/watermark.png"));
        let serialized = jg.graph.serialize();
        assert!(serialized.contains("[3:v]scale=150:-1:flags=lanczos"));
        assert!(serialized.contains("overlay=W-w-20:H-h-20"));
        assert_eq!(jg.video_out, "v_wm");
    }

    #[test]
    fn test_full_mix_gains_and_ceiling() {
        let voice = PathBuf::from("/job/voice.mp3");
        let backsound = PathBuf::from("/job/backsound.mp3");
        let jg = build_join_graph(
            &clips(&[5.0]),
            None,
            Some(&voice),
            Some(&backsound),
            &JoinConfig::default(),
        )
        .unwrap();

        // Inputs: clip 0, voice 1, backsound 2
        assert_eq!(jg.inputs, vec![
            PathBuf::from("/job/clip_0.mp4"),
            voice.clone(),
            backsound.clone()
        ]);
        let serialized = jg.graph.serialize();
        assert!(serialized.contains("[1:a]volume=1.50[voice_norm]"));
        assert!(serialized.contains("[2:a]volume=0.15[bgm_norm]"));
        assert!(serialized.contains("amix=inputs=3:duration=first:dropout_transition=2"));
        // Joined audio first: it sets the output length
        assert!(serialized.contains("[a0][voice_norm][bgm_norm]amix"));
    }

    #[test]
    fn test_backsound_only_mix_has_no_voice_gain() {
        let backsound = PathBuf::from("/job/backsound.mp3");
        let jg = build_join_graph(
            &clips(&[5.0]),
            None,
            None,
            Some(&backsound),
            &JoinConfig::default(),
        )
        .unwrap();

        let serialized = jg.graph.serialize();
        assert!(!serialized.contains("volume=1.50"));
        assert!(serialized.contains("volume=0.15"));
        assert!(serialized.contains("amix=inputs=2"));
    }

    #[test]
    fn test_watermark_and_extras_index_layout() {
        let wm = WatermarkSpec::new(
            PathBuf::from("/job/watermark.png"),
            WatermarkPosition::Center,
            100,
            200,
        );
        let voice = PathBuf::from("/job/voice.mp3");
        let jg = build_join_graph(
            &clips(&[5.0, 5.0]),
            Some(&wm),
            Some(&voice),
            None,
            &JoinConfig::default(),
        )
        .unwrap();

        // clips 0-1, watermark 2, voice 3
        let serialized = jg.graph.serialize();
        assert!(serialized.contains("[2:v]scale=200:-1"));
        assert!(serialized.contains("[3:a]volume=1.50"));
    }

    #[test]
    fn test_empty_clips_rejected() {
        let err =
            build_join_graph(&[], None, None, None, &JoinConfig::default()).unwrap_err();
        assert!(matches!(err, JoinError::Validation(_)));
    }
}
