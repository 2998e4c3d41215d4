//! Chat-screen compositing and frame sequencing.
//!
//! [`cpu::Compositor`] turns one [`FrameDescriptor`](crate::FrameDescriptor) into pixels.
//! [`sequencer::render_timeline`] drives it over a whole timeline and feeds a
//! [`sink::FrameSink`], usually a numbered PNG sequence for the encoder.

/// Render configuration and palette.
pub mod config;
/// CPU raster compositor.
pub mod cpu;
/// Pure bubble layout.
pub mod layout;
/// Timeline-to-sink driver.
pub mod sequencer;
/// Frame consumers.
pub mod sink;
