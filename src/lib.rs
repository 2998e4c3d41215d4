//! chatreel renders a scripted two-party chat conversation into a phone-screen video.
//!
//! A job flows through four stages:
//!
//! - [`schedule`] turns the conversation and [`TimingConfig`] into a [`Timeline`] of
//!   [`FrameDescriptor`]s and [`AudioCueEvent`]s
//! - [`Compositor`] rasterizes each descriptor on the CPU, driven by [`render_timeline`]
//! - the video assembler encodes the numbered frames with the system `ffmpeg`
//! - the cue engine overlays generated notification tones at each cue offset
//!
//! [`run_job`] runs all of them with per-job scratch storage, cancellation, and cleanup.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

/// Tones, the tone cache, and cue mixing.
pub mod audio;
/// Colors, avatar decoding, and text shaping.
pub mod assets;
/// Conversation model and job descriptions.
pub mod chat;
/// `ffmpeg` process control and the video assembler.
pub mod encode;
/// Job lifecycle and the end-to-end runner.
pub mod pipeline;
/// Compositor, frame sequencer, and frame sinks.
pub mod render;
/// Frame and cue scheduling.
pub mod timeline;

pub use crate::foundation::cancel::{CancelToken, JobControl};
pub use crate::foundation::core::{Affine, BezPath, Canvas, FrameIndex, Point, Rect, Rgba8Premul};
pub use crate::foundation::error::{ChatReelError, ChatReelResult};

pub use crate::assets::color::Color;
pub use crate::assets::text::{FixedAdvance, FontFace, TextMeasure, wrap_text};
pub use crate::audio::cache::{ToneCache, TonePaths};
pub use crate::audio::config::AudioConfig;
pub use crate::audio::cues::{MixOutcome, mix_cues};
pub use crate::chat::job::{ImageSource, JobId, JobSpec, RenderJob};
pub use crate::chat::model::{ChatTurn, Speaker, TimingConfig};
pub use crate::encode::assembler::{AssembleConfig, assemble_video};
pub use crate::pipeline::job::{PipelineOpts, run_job};
pub use crate::pipeline::stage::{JobStage, JobStatus};
pub use crate::render::config::{LayoutMetrics, Palette, RenderConfig};
pub use crate::render::cpu::{Compositor, CompositorAssets, FrameRGBA};
pub use crate::render::sequencer::{RenderStats, RenderThreading, render_timeline};
pub use crate::render::sink::{FrameSink, InMemorySink, PngSequenceSink, SinkConfig};
pub use crate::timeline::scheduler::{AudioCueEvent, CueKind, FrameDescriptor, Timeline, schedule};
