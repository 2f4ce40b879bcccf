//! Input staging.
//!
//! Each job gets a freshly created, uniquely named workspace directory under
//! the OS temp root. The directory is owned by the job for its lifetime and
//! removed on drop, so cleanup happens on every exit path. Validation runs
//! before the directory is created: a rejected request leaves no trace on
//! the filesystem.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tokio::fs;
use tracing::{debug, info};

use crate::error::{JoinError, MediaResult};
use crate::watermark::WatermarkSpec;
use vjoin_models::{JobId, JoinRequest};

/// The temp directory owned by one job.
#[derive(Debug)]
pub struct JobWorkspace {
    id: JobId,
    dir: TempDir,
}

impl JobWorkspace {
    /// Create a fresh workspace directory.
    ///
    /// Creation failure is an environment problem, not something a retry of
    /// the same request can fix, so it surfaces as an IO error.
    pub fn create() -> MediaResult<Self> {
        let id = JobId::new();
        let dir = tempfile::Builder::new()
            .prefix(&format!("vjoin-{}-", id))
            .tempdir()?;
        debug!(job_id = %id, path = %dir.path().display(), "Created job workspace");
        Ok(Self { id, dir })
    }

    pub fn id(&self) -> &JobId {
        &self.id
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

/// One staged clip and its probed attributes.
#[derive(Debug, Clone)]
pub struct StagedClip {
    /// Current on-disk path (replaced by the patched file when audio is added)
    pub path: PathBuf,
    /// Whether the clip carries an audio stream; true for every clip after
    /// the patch stage
    pub has_audio: bool,
    /// Measured duration in seconds, set after patching
    pub duration: f64,
}

/// A fully staged job: workspace plus decoded inputs.
#[derive(Debug)]
pub struct StagedJob {
    pub workspace: JobWorkspace,
    pub clips: Vec<StagedClip>,
    pub voice: Option<PathBuf>,
    pub backsound: Option<PathBuf>,
    pub watermark: Option<WatermarkSpec>,
}

/// Decode a base64 payload, mapping failures to a validation error.
fn decode_payload(name: &str, data: &str) -> MediaResult<Vec<u8>> {
    BASE64
        .decode(data)
        .map_err(|e| JoinError::validation(format!("Undecodable payload '{}': {}", name, e)))
}

/// Validate and stage a join request into a new workspace.
pub async fn stage(request: &JoinRequest) -> MediaResult<StagedJob> {
    // Reject before creating any directory
    if request.clips.is_empty() {
        return Err(JoinError::validation("Clip list is empty"));
    }
    if let Some(wm) = &request.watermark {
        if wm.width == 0 {
            return Err(JoinError::validation("Watermark width must be positive"));
        }
    }

    let workspace = JobWorkspace::create()?;
    let dir = workspace.path().to_path_buf();

    let mut clips = Vec::with_capacity(request.clips.len());
    for (i, clip) in request.clips.iter().enumerate() {
        let bytes = decode_payload(&clip.name, &clip.data)?;
        let path = dir.join(format!("clip_{}.mp4", i));
        fs::write(&path, &bytes).await?;
        clips.push(StagedClip {
            path,
            has_audio: false,
            duration: 0.0,
        });
    }

    let voice = match &request.voice {
        Some(v) => {
            let bytes = decode_payload(&v.name, &v.data)?;
            let path = dir.join("voice.mp3");
            fs::write(&path, &bytes).await?;
            Some(path)
        }
        None => None,
    };

    // The flag gates staging too: an unused backsound never hits the disk
    let backsound = match &request.backsound {
        Some(b) if request.use_backsound => {
            let bytes = decode_payload(&b.name, &b.data)?;
            let path = dir.join("backsound.mp3");
            fs::write(&path, &bytes).await?;
            Some(path)
        }
        _ => None,
    };

    let watermark = match &request.watermark {
        Some(wm) => {
            let bytes = decode_payload("watermark", &wm.data)?;
            let path = dir.join("watermark.png");
            fs::write(&path, &bytes).await?;
            Some(WatermarkSpec::new(path, wm.position, wm.opacity, wm.width))
        }
        None => None,
    };

    info!(
        job_id = %workspace.id(),
        clips = clips.len(),
        voice = voice.is_some(),
        backsound = backsound.is_some(),
        watermark = watermark.is_some(),
        "Staged join request"
    );

    Ok(StagedJob {
        workspace,
        clips,
        voice,
        backsound,
        watermark,
    })
}
