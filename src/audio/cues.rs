use std::path::{Path, PathBuf};

use crate::audio::cache::{ToneCache, TonePaths};
use crate::audio::config::AudioConfig;
use crate::audio::graph::{FilterGraph, FilterNode};
use crate::encode::process::{
    FfmpegArgs, ensure_parent_dir, remove_partial, require_output, run_ffmpeg,
};
use crate::foundation::cancel::JobControl;
use crate::foundation::error::{ChatReelError, ChatReelResult};
use crate::foundation::math::secs_to_ms;
use crate::timeline::scheduler::{AudioCueEvent, CueKind};

/// Label of the final mixed audio stream.
pub const MIX_SINK: &str = "aout";
const CUE_BUS: &str = "cues";

/// Filter graph plus the tone files it reads.
#[derive(Clone, Debug, PartialEq)]
pub struct CueMixPlan {
    /// Graph over input 0 (the video) and the tone inputs, ending in [`MIX_SINK`].
    pub graph: FilterGraph,
    /// Tone files, in input order starting at index 1.
    pub inputs: Vec<PathBuf>,
}

/// How the cue stage finished.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MixOutcome {
    /// Cues were overlaid onto the video's audio.
    Mixed {
        /// Number of cues mixed.
        cues: usize,
    },
    /// Nothing to mix; the video was copied through.
    NoCues,
    /// Mixing failed and the unmixed video was delivered instead.
    Fallback {
        /// Why the mix failed.
        reason: String,
    },
}

/// Build the overlay graph for `cues`, or `None` when there is nothing to mix.
///
/// Each cue is its tone delayed to the cue offset on every channel. The cues are summed
/// without normalization, conformed to stereo at `sample_rate`, and summed onto `[0:a]` for
/// the length of the video.
pub fn plan_cue_mix(
    cues: &[AudioCueEvent],
    tones: &TonePaths,
    sample_rate: u32,
) -> Option<CueMixPlan> {
    if cues.is_empty() {
        return None;
    }

    // Only tones that are actually used become inputs, in order of first use.
    let mut kinds: Vec<(CueKind, usize)> = Vec::new();
    for c in cues {
        match kinds.iter_mut().find(|(k, _)| *k == c.kind) {
            Some((_, n)) => *n += 1,
            None => kinds.push((c.kind, 1)),
        }
    }

    let mut graph = FilterGraph::new();
    let mut sources: Vec<(CueKind, Vec<String>)> = Vec::with_capacity(kinds.len());
    for (i, &(kind, uses)) in kinds.iter().enumerate() {
        let stream = format!("{}:a", i + 1);
        if uses == 1 {
            sources.push((kind, vec![stream]));
            continue;
        }
        let tag = kind_tag(kind);
        let mut split = FilterNode::new("asplit").input(stream).positional(uses);
        let mut labels = Vec::with_capacity(uses);
        for j in 0..uses {
            let l = format!("{tag}{j}");
            split = split.output(l.clone());
            labels.push(l);
        }
        graph.push(split);
        // Consumed in cue order.
        labels.reverse();
        sources.push((kind, labels));
    }

    let mut delayed = Vec::with_capacity(cues.len());
    for (i, c) in cues.iter().enumerate() {
        let Some(src) = sources
            .iter_mut()
            .find(|(k, _)| *k == c.kind)
            .and_then(|(_, ls)| ls.pop())
        else {
            continue;
        };
        let out = format!("c{i}");
        graph.push(
            FilterNode::new("adelay")
                .input(src)
                .param("delays", secs_to_ms(c.offset_seconds))
                .param("all", 1)
                .output(out.clone()),
        );
        delayed.push(out);
    }

    let bus_in = if delayed.len() == 1 {
        delayed.remove(0)
    } else {
        let mut mix = FilterNode::new("amix");
        for l in &delayed {
            mix = mix.input(l.clone());
        }
        graph.push(
            mix.param("inputs", delayed.len())
                .param("duration", "longest")
                .param("normalize", 0)
                .output("cuemix"),
        );
        "cuemix".to_owned()
    };

    graph
        .push(
            FilterNode::new("aformat")
                .input(bus_in)
                .param("sample_rates", sample_rate)
                .param("channel_layouts", "stereo")
                .output(CUE_BUS),
        )
        .push(
            FilterNode::new("amix")
                .input("0:a")
                .input(CUE_BUS)
                .param("inputs", 2)
                .param("duration", "first")
                .param("normalize", 0)
                .output(MIX_SINK),
        );

    let inputs = kinds
        .iter()
        .map(|(k, _)| tones.path_for(*k).to_path_buf())
        .collect();
    Some(CueMixPlan { graph, inputs })
}

fn kind_tag(kind: CueKind) -> &'static str {
    match kind {
        CueKind::Send => "snd",
        CueKind::Receive => "rcv",
    }
}

/// Arguments that apply `plan` to `video`: video stream copied, audio re-encoded.
pub fn mix_args(video: &Path, out: &Path, plan: &CueMixPlan, audio: &AudioConfig) -> FfmpegArgs {
    let mut a = FfmpegArgs::new();
    a.args(["-y", "-hide_banner", "-loglevel", "error", "-i"])
        .arg(video);
    for input in &plan.inputs {
        a.arg("-i").arg(input);
    }
    a.args([
        "-filter_complex",
        plan.graph.render().as_str(),
        "-map",
        "0:v",
        "-map",
        format!("[{MIX_SINK}]").as_str(),
        "-c:v",
        "copy",
        "-c:a",
        "aac",
        "-b:a",
        audio.audio_bitrate.as_str(),
        "-ac",
        "2",
        "-ar",
        audio.sample_rate.to_string().as_str(),
        "-movflags",
        "+faststart",
    ])
    .arg(out);
    a
}

/// Arguments that copy `video` to `out` unchanged.
pub fn copy_args(video: &Path, out: &Path) -> FfmpegArgs {
    let mut a = FfmpegArgs::new();
    a.args(["-y", "-hide_banner", "-loglevel", "error", "-i"])
        .arg(video)
        .args(["-c", "copy", "-movflags", "+faststart"])
        .arg(out);
    a
}

/// Overlay the cue tones onto `video`, writing `out`.
///
/// A mix failure is not fatal: it is logged and the unmixed video is copied to `out`
/// instead, reported as [`MixOutcome::Fallback`]. Only a failed copy ([`ChatReelError::Encode`])
/// or cancellation fails the stage.
#[tracing::instrument(skip_all, fields(cues = cues.len(), out = %out.display()))]
pub fn mix_cues(
    video: &Path,
    out: &Path,
    cues: &[AudioCueEvent],
    tones: &ToneCache,
    audio: &AudioConfig,
    control: &JobControl,
) -> ChatReelResult<MixOutcome> {
    ensure_parent_dir(out).map_err(|e| ChatReelError::encode(format!("{e:#}")))?;
    if cues.is_empty() {
        copy_through(video, out, control)?;
        return Ok(MixOutcome::NoCues);
    }

    match try_mix(video, out, cues, tones, audio, control) {
        Ok(n) => {
            tracing::info!(cues = n, "cues mixed");
            Ok(MixOutcome::Mixed { cues: n })
        }
        Err(e @ ChatReelError::Cancelled(_)) => {
            remove_partial(out);
            Err(e)
        }
        Err(e) => {
            tracing::warn!("cue mix failed, delivering unmixed video: {e}");
            remove_partial(out);
            copy_through(video, out, control)?;
            Ok(MixOutcome::Fallback {
                reason: e.to_string(),
            })
        }
    }
}

fn try_mix(
    video: &Path,
    out: &Path,
    cues: &[AudioCueEvent],
    tones: &ToneCache,
    audio: &AudioConfig,
    control: &JobControl,
) -> ChatReelResult<usize> {
    let paths = tones.ensure()?;
    let plan = plan_cue_mix(cues, &paths, audio.sample_rate)
        .ok_or_else(|| ChatReelError::mix("no cues to mix"))?;
    plan.graph.validate(MIX_SINK)?;
    run_ffmpeg(
        &mix_args(video, out, &plan, audio),
        control,
        "mix cues",
        ChatReelError::Mix,
    )?;
    require_output(out, ChatReelError::Mix)?;
    Ok(cues.len())
}

fn copy_through(video: &Path, out: &Path, control: &JobControl) -> ChatReelResult<()> {
    let result = run_ffmpeg(&copy_args(video, out), control, "copy video", ChatReelError::Encode)
        .and_then(|()| require_output(out, ChatReelError::Encode));
    if result.is_err() {
        remove_partial(out);
    }
    result
}

#[cfg(test)]
#[path = "../../tests/unit/audio/cues.rs"]
mod tests;
