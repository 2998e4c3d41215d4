use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::assets::decode::load_avatar;
use crate::assets::text::{FontFace, TextShaper};
use crate::audio::cache::ToneCache;
use crate::audio::config::AudioConfig;
use crate::audio::cues::{MixOutcome, mix_cues};
use crate::chat::job::RenderJob;
use crate::encode::assembler::{AssembleConfig, assemble_video};
use crate::encode::process::remove_partial;
use crate::foundation::cancel::{CancelToken, JobControl};
use crate::foundation::error::{ChatReelError, ChatReelResult};
use crate::pipeline::scratch::JobScratch;
use crate::pipeline::stage::{JobStage, JobStatus, StageTracker};
use crate::render::config::RenderConfig;
use crate::render::cpu::CompositorAssets;
use crate::render::sequencer::{RenderStats, RenderThreading, render_timeline};
use crate::render::sink::PngSequenceSink;
use crate::timeline::scheduler::{Timeline, schedule};

/// Options for one [`run_job`] call.
#[derive(Clone, Debug)]
pub struct PipelineOpts {
    /// Parent of the per-job scratch directories.
    pub scratch_root: PathBuf,
    /// Where the finished video is written.
    pub output_path: PathBuf,
    /// Frame rendering parallelism.
    pub threading: RenderThreading,
    /// Wall-clock budget for the whole job.
    pub timeout: Option<Duration>,
    /// Caller-held cancellation flag.
    pub cancel: CancelToken,
    /// Leave frames and the intermediate video on disk.
    pub keep_intermediates: bool,
    /// Screen appearance.
    pub render: RenderConfig,
    /// Audio and tone cache settings.
    pub audio: AudioConfig,
}

impl PipelineOpts {
    /// Defaults writing to `output_path`, with scratch under the system temp directory.
    pub fn new(output_path: impl Into<PathBuf>) -> Self {
        Self {
            scratch_root: std::env::temp_dir().join("chatreel"),
            output_path: output_path.into(),
            threading: RenderThreading::default(),
            timeout: None,
            cancel: CancelToken::new(),
            keep_intermediates: false,
            render: RenderConfig::default(),
            audio: AudioConfig::default(),
        }
    }
}

struct Prepared {
    cfg: RenderConfig,
    assets: CompositorAssets,
    background: Option<PathBuf>,
}

/// Run one job end to end: schedule, render frames, encode, mix cues.
///
/// Never panics or returns early with an error: bad inputs yield [`JobStatus::Rejected`]
/// with nothing written, and any fatal stage error yields [`JobStatus::Failed`] after the
/// job's scratch directory is removed. A missing avatar or background track, and a failed
/// cue mix, only degrade the output.
#[tracing::instrument(skip_all, fields(job = %job.id, turns = job.turns.len()))]
pub fn run_job(job: &RenderJob, opts: &PipelineOpts) -> JobStatus {
    let timeline = match schedule(&job.turns, &job.timing) {
        Ok(t) => t,
        Err(e) => return reject(e),
    };
    let prepared = match prepare(job, opts) {
        Ok(p) => p,
        Err(e) => return reject(e),
    };

    let control = JobControl::with_timeout(opts.cancel.clone(), opts.timeout);
    let mut tracker = StageTracker::new(job.id);
    match execute(job, &timeline, &prepared, opts, &control, &mut tracker) {
        Ok((mix, stats)) => {
            tracker.advance(JobStage::Done);
            JobStatus::Done {
                job_id: job.id,
                output: opts.output_path.clone(),
                mix,
                stats,
            }
        }
        Err(e) => {
            let stage = tracker.stage();
            if stage == JobStage::MixingAudio {
                remove_partial(&opts.output_path);
            }
            tracing::error!(stage = %stage, "job failed: {e}");
            tracker.advance(JobStage::Failed);
            JobStatus::Failed {
                job_id: job.id,
                stage,
                reason: e.to_string(),
            }
        }
    }
}

fn reject(e: ChatReelError) -> JobStatus {
    tracing::warn!("job rejected: {e}");
    JobStatus::Rejected {
        reason: e.to_string(),
    }
}

// Everything that can refuse the job without touching the filesystem.
fn prepare(job: &RenderJob, opts: &PipelineOpts) -> ChatReelResult<Prepared> {
    let mut cfg = opts.render.clone();
    if !job.counterparty_name.trim().is_empty() {
        cfg.counterparty_name = job.counterparty_name.clone();
    }
    cfg.validate()?;
    opts.audio.validate()?;
    if opts.output_path.as_os_str().is_empty() {
        return Err(ChatReelError::configuration("output path is empty"));
    }

    let font = resolve_font(cfg.font_path.as_deref())?;
    // Fails on bytes parley cannot register.
    TextShaper::new(&font)?;
    let avatar = match &job.avatar {
        Some(src) => match load_avatar(src) {
            Ok(img) => Some(img),
            Err(e) => {
                tracing::warn!("avatar skipped: {e}");
                None
            }
        },
        None => None,
    };
    let background = match &job.background_audio {
        Some(p) if p.is_file() => Some(p.clone()),
        Some(p) => {
            let e = ChatReelError::missing_asset(format!("background audio '{}'", p.display()));
            tracing::warn!("background audio skipped: {e}");
            None
        }
        None => None,
    };

    Ok(Prepared {
        cfg,
        assets: CompositorAssets { font, avatar },
        background,
    })
}

/// Load `path`, or discover a system font when it is `None`.
pub fn resolve_font(path: Option<&Path>) -> ChatReelResult<FontFace> {
    match path {
        Some(p) => FontFace::from_path(p),
        None => {
            let p = FontFace::discover().ok_or_else(|| {
                ChatReelError::configuration(
                    "no font configured and none found; set render.font_path or CHATREEL_FONT",
                )
            })?;
            FontFace::from_path(&p)
        }
    }
}

fn execute(
    job: &RenderJob,
    timeline: &Timeline<'_>,
    prepared: &Prepared,
    opts: &PipelineOpts,
    control: &JobControl,
    tracker: &mut StageTracker,
) -> ChatReelResult<(MixOutcome, RenderStats)> {
    let scratch = JobScratch::create(&opts.scratch_root, job.id, opts.keep_intermediates)?;

    tracker.advance(JobStage::RenderingFrames);
    let mut sink = PngSequenceSink::new(scratch.frames_dir(), prepared.cfg.palette.background);
    let stats = render_timeline(
        timeline,
        &prepared.cfg,
        &prepared.assets,
        &opts.threading,
        control,
        &mut sink,
    )?;

    tracker.advance(JobStage::EncodingVideo);
    let assemble = AssembleConfig {
        fps: timeline.fps,
        frame_pattern: sink.pattern(),
        out_path: scratch.video_path(),
        background_audio: prepared.background.clone(),
    };
    assemble_video(&assemble, &opts.audio, control)?;
    scratch.remove_frames();

    tracker.advance(JobStage::MixingAudio);
    let tones = ToneCache::new(&opts.audio.tone_cache_dir, opts.audio.sample_rate);
    let mix = mix_cues(
        &assemble.out_path,
        &opts.output_path,
        &timeline.cues,
        &tones,
        &opts.audio,
        control,
    )?;
    scratch.remove_video();
    Ok((mix, stats))
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/job.rs"]
mod tests;
