use std::path::PathBuf;

use crate::audio::cues::MixOutcome;
use crate::chat::job::JobId;
use crate::render::sequencer::RenderStats;

/// Where a job is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStage {
    /// Inputs validated and timeline computed; nothing on disk yet.
    Scheduled,
    /// Compositing frames into the scratch directory.
    RenderingFrames,
    /// Encoding the frame sequence to the intermediate video.
    EncodingVideo,
    /// Overlaying cues, or copying the video through on fallback.
    MixingAudio,
    /// Output delivered.
    Done,
    /// Aborted; scratch artifacts removed.
    Failed,
}

impl JobStage {
    /// Whether `self -> next` is a legal transition.
    ///
    /// Mixing only fails when the fallback copy itself fails or the job is cancelled; a mix
    /// error alone still ends in `Done`.
    pub fn can_transition_to(self, next: JobStage) -> bool {
        use JobStage::*;
        matches!(
            (self, next),
            (Scheduled, RenderingFrames)
                | (RenderingFrames, EncodingVideo)
                | (EncodingVideo, MixingAudio)
                | (MixingAudio, Done)
                | (Scheduled | RenderingFrames | EncodingVideo | MixingAudio, Failed)
        )
    }

    /// `Done` or `Failed`.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStage::Done | JobStage::Failed)
    }
}

impl std::fmt::Display for JobStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JobStage::Scheduled => "SCHEDULED",
            JobStage::RenderingFrames => "RENDERING_FRAMES",
            JobStage::EncodingVideo => "ENCODING_VIDEO",
            JobStage::MixingAudio => "MIXING_AUDIO",
            JobStage::Done => "DONE",
            JobStage::Failed => "FAILED",
        };
        f.write_str(s)
    }
}

/// Terminal result of [`run_job`](crate::pipeline::job::run_job).
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobStatus {
    /// The video was written to `output`.
    Done {
        /// Job identifier.
        job_id: JobId,
        /// Delivered video.
        output: PathBuf,
        /// What the cue stage did.
        mix: MixOutcome,
        /// Frame counters.
        stats: RenderStats,
    },
    /// Refused before any work started; nothing was written.
    Rejected {
        /// Why the inputs were refused.
        reason: String,
    },
    /// Aborted mid-pipeline; scratch artifacts were removed.
    Failed {
        /// Job identifier.
        job_id: JobId,
        /// Stage that was running when the job failed.
        stage: JobStage,
        /// Error description.
        reason: String,
    },
}

impl JobStatus {
    /// Whether the job delivered a video.
    pub fn is_done(&self) -> bool {
        matches!(self, JobStatus::Done { .. })
    }

    /// Delivered video path, if any.
    pub fn output(&self) -> Option<&std::path::Path> {
        match self {
            JobStatus::Done { output, .. } => Some(output),
            _ => None,
        }
    }
}

/// Current stage of one job, logging every transition.
#[derive(Debug)]
pub(crate) struct StageTracker {
    job_id: JobId,
    stage: JobStage,
}

impl StageTracker {
    pub(crate) fn new(job_id: JobId) -> Self {
        tracing::info!(job = %job_id, stage = %JobStage::Scheduled, "job stage");
        Self {
            job_id,
            stage: JobStage::Scheduled,
        }
    }

    pub(crate) fn stage(&self) -> JobStage {
        self.stage
    }

    pub(crate) fn advance(&mut self, next: JobStage) {
        debug_assert!(
            self.stage.can_transition_to(next),
            "illegal job transition {} -> {next}",
            self.stage
        );
        tracing::info!(job = %self.job_id, from = %self.stage, stage = %next, "job stage");
        self.stage = next;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/stage.rs"]
mod tests;
