//! Chat input model: turns, timing, and on-disk job descriptions.

/// Job descriptions loaded from JSON and resolved into render jobs.
pub mod job;
/// Chat turns and timing configuration.
pub mod model;
