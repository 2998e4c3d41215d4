//! Image-sequence encoding through the system `ffmpeg` binary.

/// Sequence-to-video encode.
pub mod assembler;
/// `ffmpeg` process control.
pub mod process;
