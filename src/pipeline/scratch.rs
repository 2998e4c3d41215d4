use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::chat::job::JobId;
use crate::foundation::error::ChatReelResult;

const FRAMES_DIR: &str = "frames";
const VIDEO_FILE: &str = "video.mp4";

/// Per-job scratch directory `<root>/<job id>/`, removed when dropped.
///
/// Holds the numbered frames (deleted once encoded) and the intermediate video (deleted once
/// mixed). With `keep` set nothing is removed, for debugging.
#[derive(Debug)]
pub struct JobScratch {
    dir: PathBuf,
    keep: bool,
}

impl JobScratch {
    /// Create `<root>/<id>/frames`.
    pub fn create(root: &Path, id: JobId, keep: bool) -> ChatReelResult<Self> {
        let dir = root.join(id.to_string());
        let frames = dir.join(FRAMES_DIR);
        std::fs::create_dir_all(&frames)
            .with_context(|| format!("create scratch directory '{}'", frames.display()))?;
        Ok(Self { dir, keep })
    }

    /// Job directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Directory the frame images go to.
    pub fn frames_dir(&self) -> PathBuf {
        self.dir.join(FRAMES_DIR)
    }

    /// Intermediate encoded video.
    pub fn video_path(&self) -> PathBuf {
        self.dir.join(VIDEO_FILE)
    }

    /// Drop the frame images once the video is encoded.
    pub fn remove_frames(&self) {
        if !self.keep {
            remove_dir(&self.frames_dir());
        }
    }

    /// Drop the intermediate video once the output is written.
    pub fn remove_video(&self) {
        let p = self.video_path();
        if !self.keep
            && let Err(e) = std::fs::remove_file(&p)
            && e.kind() != std::io::ErrorKind::NotFound
        {
            tracing::warn!("failed to remove '{}': {e}", p.display());
        }
    }
}

impl Drop for JobScratch {
    fn drop(&mut self) {
        if self.keep {
            tracing::info!(dir = %self.dir.display(), "keeping job scratch directory");
        } else {
            remove_dir(&self.dir);
        }
    }
}

fn remove_dir(path: &Path) {
    if let Err(e) = std::fs::remove_dir_all(path)
        && e.kind() != std::io::ErrorKind::NotFound
    {
        tracing::warn!("failed to remove '{}': {e}", path.display());
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/scratch.rs"]
mod tests;
