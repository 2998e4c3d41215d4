use std::collections::HashMap;

use rayon::prelude::*;

use crate::foundation::cancel::JobControl;
use crate::foundation::error::{ChatReelError, ChatReelResult};
use crate::render::config::RenderConfig;
use crate::render::cpu::{Compositor, CompositorAssets, FrameRGBA};
use crate::render::sink::{FrameSink, SinkConfig};
use crate::timeline::scheduler::{FrameDescriptor, Timeline};

/// How frames are produced.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RenderThreading {
    /// Render each chunk on a rayon pool, one compositor per worker.
    pub parallel: bool,
    /// Frames per chunk; bounds memory held between rendering and writing.
    pub chunk_size: usize,
    /// Worker count; `None` lets rayon decide.
    pub threads: Option<usize>,
    /// Render frames with identical content once and reuse the pixels.
    pub static_frame_elision: bool,
}

impl Default for RenderThreading {
    fn default() -> Self {
        Self {
            parallel: false,
            chunk_size: 64,
            threads: None,
            static_frame_elision: true,
        }
    }
}

/// Frame counters from one sequencer run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct RenderStats {
    /// Frames pushed to the sink.
    pub frames_total: u64,
    /// Frames actually composited.
    pub frames_rendered: u64,
    /// Frames reused from an identical earlier frame.
    pub frames_elided: u64,
}

impl RenderStats {
    fn add(&mut self, other: RenderStats) {
        self.frames_total += other.frames_total;
        self.frames_rendered += other.frames_rendered;
        self.frames_elided += other.frames_elided;
    }
}

/// Composite every frame of `timeline` and push the results to `sink` in index order.
///
/// Cancellation and the deadline in `control` are checked before each chunk and before each
/// frame is handed to the sink.
#[tracing::instrument(skip_all, fields(frames = timeline.len(), parallel = threading.parallel))]
pub fn render_timeline(
    timeline: &Timeline<'_>,
    cfg: &RenderConfig,
    assets: &CompositorAssets,
    threading: &RenderThreading,
    control: &JobControl,
    sink: &mut dyn FrameSink,
) -> ChatReelResult<RenderStats> {
    // Fails fast on bad config or font before any file is written.
    let mut main = Compositor::new(cfg, assets)?;
    let pool = if threading.parallel {
        Some(build_thread_pool(threading.threads)?)
    } else {
        None
    };

    sink.begin(SinkConfig {
        width: cfg.width,
        height: cfg.height,
        fps: timeline.fps,
        frames_total: timeline.len() as u64,
    })?;

    let chunk_size = normalized_chunk_size(threading.chunk_size);
    let mut stats = RenderStats::default();
    let mut carry: Option<(u64, FrameRGBA)> = None;

    for chunk in timeline.frames.chunks(chunk_size) {
        control.check("render frames")?;

        let (frames, chunk_stats) = match &pool {
            Some(pool) => render_chunk_parallel(chunk, cfg, assets, threading, pool, &carry)?,
            None => render_chunk_sequential(chunk, &mut main, threading, &carry)?,
        };

        for (desc, frame) in chunk.iter().zip(&frames) {
            control.check("render frames")?;
            sink.push_frame(desc.index, frame)?;
        }
        stats.add(chunk_stats);

        if threading.static_frame_elision
            && let (Some(desc), Some(frame)) = (chunk.last(), frames.into_iter().last())
        {
            carry = Some((desc.content_fingerprint(), frame));
        }
    }

    sink.end()?;
    tracing::info!(
        frames = stats.frames_total,
        rendered = stats.frames_rendered,
        elided = stats.frames_elided,
        "frames rendered"
    );
    Ok(stats)
}

/// For each frame, the slot in the unique list it draws from, and the unique frames in order.
/// A slot of `None` reuses the frame carried over from the previous chunk.
fn dedupe(
    chunk: &[FrameDescriptor<'_>],
    elide: bool,
    carry: &Option<(u64, FrameRGBA)>,
) -> (Vec<usize>, Vec<Option<usize>>) {
    let mut unique = Vec::with_capacity(chunk.len());
    let mut slots = Vec::with_capacity(chunk.len());
    if !elide {
        for i in 0..chunk.len() {
            unique.push(i);
            slots.push(Some(i));
        }
        return (unique, slots);
    }

    let carried = carry.as_ref().map(|(fp, _)| *fp);
    let mut first = HashMap::<u64, usize>::new();
    for (i, desc) in chunk.iter().enumerate() {
        let fp = desc.content_fingerprint();
        if Some(fp) == carried {
            slots.push(None);
        } else if let Some(&slot) = first.get(&fp) {
            slots.push(Some(slot));
        } else {
            let slot = unique.len();
            unique.push(i);
            first.insert(fp, slot);
            slots.push(Some(slot));
        }
    }
    (unique, slots)
}

fn expand(
    rendered: Vec<FrameRGBA>,
    slots: &[Option<usize>],
    carry: &Option<(u64, FrameRGBA)>,
) -> ChatReelResult<(Vec<FrameRGBA>, RenderStats)> {
    let mut out = Vec::with_capacity(slots.len());
    for slot in slots {
        let frame = match slot {
            Some(u) => rendered.get(*u),
            None => carry.as_ref().map(|(_, f)| f),
        };
        let frame = frame.ok_or_else(|| {
            ChatReelError::render("internal error: elided frame has no source")
        })?;
        out.push(frame.clone());
    }
    let total = slots.len() as u64;
    let rendered_count = rendered.len() as u64;
    Ok((
        out,
        RenderStats {
            frames_total: total,
            frames_rendered: rendered_count,
            frames_elided: total.saturating_sub(rendered_count),
        },
    ))
}

fn render_chunk_sequential(
    chunk: &[FrameDescriptor<'_>],
    compositor: &mut Compositor,
    threading: &RenderThreading,
    carry: &Option<(u64, FrameRGBA)>,
) -> ChatReelResult<(Vec<FrameRGBA>, RenderStats)> {
    let (unique, slots) = dedupe(chunk, threading.static_frame_elision, carry);
    let mut rendered = Vec::with_capacity(unique.len());
    for &i in &unique {
        rendered.push(compositor.render(&chunk[i])?);
    }
    expand(rendered, &slots, carry)
}

fn render_chunk_parallel(
    chunk: &[FrameDescriptor<'_>],
    cfg: &RenderConfig,
    assets: &CompositorAssets,
    threading: &RenderThreading,
    pool: &rayon::ThreadPool,
    carry: &Option<(u64, FrameRGBA)>,
) -> ChatReelResult<(Vec<FrameRGBA>, RenderStats)> {
    let (unique, slots) = dedupe(chunk, threading.static_frame_elision, carry);

    let results = pool.install(|| {
        unique
            .par_iter()
            .map_init(
                || Compositor::new(cfg, assets),
                |worker, &i| -> ChatReelResult<FrameRGBA> {
                    match worker {
                        Ok(c) => c.render(&chunk[i]),
                        Err(e) => Err(ChatReelError::render(format!(
                            "worker compositor setup failed: {e}"
                        ))),
                    }
                },
            )
            .collect::<Vec<_>>()
    });

    let mut rendered = Vec::with_capacity(results.len());
    for r in results {
        rendered.push(r?);
    }
    expand(rendered, &slots, carry)
}

fn build_thread_pool(threads: Option<usize>) -> ChatReelResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(ChatReelError::configuration(
            "render threading 'threads' must be >= 1 when set",
        ));
    }

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| ChatReelError::render(format!("failed to build rayon thread pool: {e}")))
}

fn normalized_chunk_size(chunk_size: usize) -> usize {
    chunk_size.max(1)
}

#[cfg(test)]
#[path = "../../tests/unit/render/sequencer.rs"]
mod tests;
