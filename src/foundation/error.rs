/// Convenience result type used across chatreel APIs.
pub type ChatReelResult<T> = Result<T, ChatReelError>;

/// Error taxonomy for a render job.
///
/// `Configuration` is raised before any work starts. `Render` and `Encode` abort the job after
/// its scratch artifacts are removed. `Mix` and `MissingAsset` are recoverable: the pipeline
/// degrades (unmixed video, feature skipped) instead of failing.
#[derive(thiserror::Error, Debug)]
pub enum ChatReelError {
    /// Invalid timing, dimensions, or required inputs.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A frame failed to composite or could not be written.
    #[error("render error: {0}")]
    Render(String),

    /// The external video encode failed or produced no output.
    #[error("encode error: {0}")]
    Encode(String),

    /// The audio mixing stage failed.
    #[error("mix error: {0}")]
    Mix(String),

    /// An optional asset was referenced but is absent or unreadable.
    #[error("missing asset: {0}")]
    MissingAsset(String),

    /// The job was cancelled or ran past its deadline.
    #[error("cancelled: {0}")]
    Cancelled(String),

    /// Wrapped lower-level error.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ChatReelError {
    /// Build a [`ChatReelError::Configuration`] error.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Build a [`ChatReelError::Render`] error.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`ChatReelError::Encode`] error.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Build a [`ChatReelError::Mix`] error.
    pub fn mix(msg: impl Into<String>) -> Self {
        Self::Mix(msg.into())
    }

    /// Build a [`ChatReelError::MissingAsset`] error.
    pub fn missing_asset(msg: impl Into<String>) -> Self {
        Self::MissingAsset(msg.into())
    }

    /// Build a [`ChatReelError::Cancelled`] error.
    pub fn cancelled(msg: impl Into<String>) -> Self {
        Self::Cancelled(msg.into())
    }

    /// Whether this error must terminate the job.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Mix(_) | Self::MissingAsset(_))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
