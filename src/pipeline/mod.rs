//! Job orchestration: stages, scratch storage, and the end-to-end runner.

/// End-to-end job runner.
pub mod job;
/// Per-job scratch storage.
pub mod scratch;
/// Job lifecycle and terminal status.
pub mod stage;
