//! Notification cues: tone synthesis, the on-disk tone cache, and the mix that overlays cues
//! onto the encoded video's audio.

/// Generated tone files.
pub mod cache;
/// Audio settings.
pub mod config;
/// Cue placement and the overlay mix.
pub mod cues;
/// Structured `-filter_complex` graphs.
pub mod graph;
/// Tone recipes and synthesis.
pub mod tones;
