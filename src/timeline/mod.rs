//! Deterministic frame/cue scheduling for a chat conversation.
//!
//! The scheduler is pure: it maps `(turns, timing)` to an ordered list of
//! [`FrameDescriptor`](scheduler::FrameDescriptor)s and [`AudioCueEvent`](scheduler::AudioCueEvent)s
//! without touching the filesystem or the clock.

/// Timeline construction.
pub mod scheduler;
