use std::io::Cursor;
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::assets::color::Color;
use crate::foundation::core::{FrameIndex, Rgba8Premul};
use crate::foundation::error::{ChatReelError, ChatReelResult};
use crate::foundation::math::mul_div255_u16;
use crate::render::cpu::FrameRGBA;

/// `printf`-style name pattern of numbered frame files, as ffmpeg's image2 demuxer reads it.
pub const FRAME_FILE_PATTERN: &str = "frame-%06d.png";

/// File name of frame `idx` under [`FRAME_FILE_PATTERN`].
pub fn frame_file_name(idx: FrameIndex) -> String {
    format!("frame-{:06}.png", idx.0)
}

/// Configuration provided to a [`FrameSink`] before the first frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkConfig {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Output frames per second.
    pub fps: u32,
    /// Number of frames that will be pushed.
    pub frames_total: u64,
}

/// Consumer of rendered frames in timeline order.
///
/// Ordering contract: `push_frame` is called with indices `0, 1, 2, ...` with no gaps.
pub trait FrameSink: Send {
    /// Called once before any frames are pushed.
    fn begin(&mut self, cfg: SinkConfig) -> ChatReelResult<()>;
    /// Push the next frame.
    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> ChatReelResult<()>;
    /// Called once after the last frame is pushed.
    fn end(&mut self) -> ChatReelResult<()>;
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    frames: Vec<(FrameIndex, FrameRGBA)>,
    ended: bool,
}

impl InMemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration captured in `begin`, if any.
    pub fn config(&self) -> Option<SinkConfig> {
        self.cfg
    }

    /// Captured frames in push order.
    pub fn frames(&self) -> &[(FrameIndex, FrameRGBA)] {
        &self.frames
    }

    /// Whether `end` was called.
    pub fn ended(&self) -> bool {
        self.ended
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> ChatReelResult<()> {
        self.cfg = Some(cfg);
        self.frames.clear();
        self.ended = false;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> ChatReelResult<()> {
        self.frames.push((idx, frame.clone()));
        Ok(())
    }

    fn end(&mut self) -> ChatReelResult<()> {
        self.ended = true;
        Ok(())
    }
}

/// Writes `frame-000000.png`, `frame-000001.png`, ... into one directory.
///
/// Frames are flattened over an opaque background first. Runs of identical frames are encoded
/// once and the PNG bytes reused.
#[derive(Debug)]
pub struct PngSequenceSink {
    dir: PathBuf,
    background: Color,
    cfg: Option<SinkConfig>,
    next: u64,
    scratch: Vec<u8>,
    last_flat: Vec<u8>,
    last_png: Vec<u8>,
    files_written: u64,
    encodes: u64,
}

impl PngSequenceSink {
    /// Sink writing into `dir`, flattening over `background`.
    pub fn new(dir: impl Into<PathBuf>, background: Color) -> Self {
        Self {
            dir: dir.into(),
            background,
            cfg: None,
            next: 0,
            scratch: Vec::new(),
            last_flat: Vec::new(),
            last_png: Vec::new(),
            files_written: 0,
            encodes: 0,
        }
    }

    /// Output directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Input pattern for the encoder.
    pub fn pattern(&self) -> PathBuf {
        self.dir.join(FRAME_FILE_PATTERN)
    }

    /// Number of files written so far.
    pub fn files_written(&self) -> u64 {
        self.files_written
    }

    /// Number of PNG encodes performed (at most `files_written`).
    pub fn encodes(&self) -> u64 {
        self.encodes
    }
}

impl FrameSink for PngSequenceSink {
    fn begin(&mut self, cfg: SinkConfig) -> ChatReelResult<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("create frame directory '{}'", self.dir.display()))
            .map_err(|e| ChatReelError::render(format!("{e:#}")))?;
        self.scratch = vec![0u8; (cfg.width as usize) * (cfg.height as usize) * 4];
        self.last_flat.clear();
        self.last_png.clear();
        self.cfg = Some(cfg);
        self.next = 0;
        self.files_written = 0;
        self.encodes = 0;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> ChatReelResult<()> {
        let Some(cfg) = self.cfg else {
            return Err(ChatReelError::render("png sink used before begin"));
        };
        if idx.0 != self.next {
            return Err(ChatReelError::render(format!(
                "frame {} pushed out of order (expected {})",
                idx.0, self.next
            )));
        }
        if frame.width != cfg.width || frame.height != cfg.height {
            return Err(ChatReelError::render(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, cfg.width, cfg.height
            )));
        }

        flatten_to_opaque_rgba8(
            &mut self.scratch,
            &frame.data,
            frame.premultiplied,
            self.background,
        )?;

        if self.last_png.is_empty() || self.scratch != self.last_flat {
            let img = image::RgbaImage::from_raw(cfg.width, cfg.height, self.scratch.clone())
                .ok_or_else(|| ChatReelError::render("frame buffer does not match its size"))?;
            let mut png = Vec::new();
            image::DynamicImage::ImageRgba8(img)
                .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
                .map_err(|e| ChatReelError::render(format!("encode frame {}: {e}", idx.0)))?;
            self.last_png = png;
            self.last_flat.clone_from(&self.scratch);
            self.encodes += 1;
        }

        let path = self.dir.join(frame_file_name(idx));
        std::fs::write(&path, &self.last_png)
            .with_context(|| format!("write frame '{}'", path.display()))
            .map_err(|e| ChatReelError::render(format!("{e:#}")))?;

        self.next += 1;
        self.files_written += 1;
        Ok(())
    }

    fn end(&mut self) -> ChatReelResult<()> {
        if let Some(cfg) = self.cfg
            && self.next != cfg.frames_total
        {
            return Err(ChatReelError::render(format!(
                "png sink ended after {} of {} frames",
                self.next, cfg.frames_total
            )));
        }
        Ok(())
    }
}

/// Composite `src` over an opaque background into `dst`.
pub fn flatten_to_opaque_rgba8(
    dst: &mut [u8],
    src: &[u8],
    src_is_premul: bool,
    bg: Color,
) -> ChatReelResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(ChatReelError::render(
            "flatten_to_opaque_rgba8 expects equal-length rgba8 buffers",
        ));
    }

    let bg = bg.to_premul();
    let bg_r = u16::from(bg.r);
    let bg_g = u16::from(bg.g);
    let bg_b = u16::from(bg.b);

    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let a = u16::from(s[3]);
        if a == 255 {
            d.copy_from_slice(s);
            continue;
        }

        let inv = 255u16 - a;
        let premul = if src_is_premul {
            [s[0], s[1], s[2]]
        } else {
            let p = Rgba8Premul::from_straight_rgba(s[0], s[1], s[2], s[3]);
            [p.r, p.g, p.b]
        };
        let r = u16::from(premul[0]) + mul_div255_u16(bg_r, inv);
        let g = u16::from(premul[1]) + mul_div255_u16(bg_g, inv);
        let b = u16::from(premul[2]) + mul_div255_u16(bg_b, inv);

        d[0] = r.min(255) as u8;
        d[1] = g.min(255) as u8;
        d[2] = b.min(255) as u8;
        d[3] = 255;
    }

    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/render/sink.rs"]
mod tests;
