use std::path::PathBuf;

use crate::audio::config::AudioConfig;
use crate::audio::graph::{FilterGraph, FilterNode};
use crate::encode::process::{
    FfmpegArgs, ensure_parent_dir, remove_partial, require_output, run_ffmpeg,
};
use crate::foundation::cancel::JobControl;
use crate::foundation::error::{ChatReelError, ChatReelResult};

const AUDIO_LABEL: &str = "audio";

/// Inputs and options for encoding one numbered image sequence.
#[derive(Clone, Debug, PartialEq)]
pub struct AssembleConfig {
    /// Sequence frame rate.
    pub fps: u32,
    /// `printf`-style frame path, e.g. `frames/frame-%06d.png`.
    pub frame_pattern: PathBuf,
    /// Encoded video path.
    pub out_path: PathBuf,
    /// Background audio; must already be known to exist.
    pub background_audio: Option<PathBuf>,
}

/// Build the encoder argument list.
///
/// Video: H.264 main profile level 3.1, yuv420p, CRF 23, `+faststart`. Audio: the background
/// track attenuated and padded with silence, or a generated silent track; AAC stereo. The
/// output stops at the end of the image sequence.
pub fn assemble_args(cfg: &AssembleConfig, audio: &AudioConfig) -> FfmpegArgs {
    let mut a = FfmpegArgs::new();
    a.args(["-y", "-hide_banner", "-loglevel", "error"]);
    a.args(["-framerate", cfg.fps.to_string().as_str(), "-i"])
        .arg(&cfg.frame_pattern);

    match &cfg.background_audio {
        Some(bg) => {
            a.arg("-i").arg(bg);
            let graph = background_graph(audio.background_volume);
            a.args(["-filter_complex", graph.render().as_str()]);
            a.args(["-map", "0:v", "-map", format!("[{AUDIO_LABEL}]").as_str()]);
        }
        None => {
            a.args([
                "-f",
                "lavfi",
                "-i",
                format!(
                    "anullsrc=channel_layout=stereo:sample_rate={}",
                    audio.sample_rate
                )
                .as_str(),
            ]);
            a.args(["-map", "0:v", "-map", "1:a"]);
        }
    }

    a.args([
        "-c:v",
        "libx264",
        "-pix_fmt",
        "yuv420p",
        "-profile:v",
        "main",
        "-level",
        "3.1",
        "-crf",
        "23",
        "-r",
        cfg.fps.to_string().as_str(),
        "-movflags",
        "+faststart",
        "-c:a",
        "aac",
        "-b:a",
        audio.audio_bitrate.as_str(),
        "-ac",
        "2",
        "-ar",
        audio.sample_rate.to_string().as_str(),
        "-shortest",
    ])
    .arg(&cfg.out_path);
    a
}

/// `[1:a]volume=V[bgv];[bgv]apad[audio]`
pub fn background_graph(volume: f64) -> FilterGraph {
    let mut g = FilterGraph::new();
    g.push(
        FilterNode::new("volume")
            .input("1:a")
            .positional(volume)
            .output("bgv"),
    )
    .push(FilterNode::new("apad").input("bgv").output(AUDIO_LABEL));
    g
}

/// Encode the image sequence to `cfg.out_path`.
///
/// Any failure, including a missing or empty output file, is an [`ChatReelError::Encode`];
/// partial output is removed.
#[tracing::instrument(skip_all, fields(out = %cfg.out_path.display(), bg = cfg.background_audio.is_some()))]
pub fn assemble_video(
    cfg: &AssembleConfig,
    audio: &AudioConfig,
    control: &JobControl,
) -> ChatReelResult<()> {
    if cfg.fps == 0 {
        return Err(ChatReelError::configuration("encode fps must be non-zero"));
    }
    ensure_parent_dir(&cfg.out_path).map_err(|e| ChatReelError::encode(format!("{e:#}")))?;

    let args = assemble_args(cfg, audio);
    let result = run_ffmpeg(&args, control, "encode video", ChatReelError::Encode)
        .and_then(|()| require_output(&cfg.out_path, ChatReelError::Encode));
    if result.is_err() {
        remove_partial(&cfg.out_path);
    }
    result?;
    tracing::info!("video encoded");
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/encode/assembler.rs"]
mod tests;
