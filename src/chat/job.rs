use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::chat::model::{ChatTurn, TimingConfig};
use crate::foundation::error::{ChatReelError, ChatReelResult};

/// Name shown in the header when a job does not provide one.
pub const DEFAULT_COUNTERPARTY_NAME: &str = "Astrologer";

/// Unique job identifier used to namespace scratch artifacts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct JobId(pub uuid::Uuid);

impl JobId {
    /// Fresh random identifier.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Where the avatar image comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImageSource {
    /// Encoded image file on disk.
    Path(PathBuf),
    /// Encoded image bytes already in memory.
    Bytes(Vec<u8>),
}

/// Everything one render needs, created fresh per job.
#[derive(Clone, Debug)]
pub struct RenderJob {
    /// Scratch namespace for this job.
    pub id: JobId,
    /// Ordered conversation.
    pub turns: Vec<ChatTurn>,
    /// Frame rate and delays.
    pub timing: TimingConfig,
    /// Name shown in the header; its first character seeds the fallback avatar.
    pub counterparty_name: String,
    /// Optional avatar image, clipped to a circle in the header.
    pub avatar: Option<ImageSource>,
    /// Optional background audio file, attenuated under the notification cues.
    pub background_audio: Option<PathBuf>,
}

impl RenderJob {
    /// Job with default timing, no avatar, and no background audio.
    pub fn new(turns: Vec<ChatTurn>) -> Self {
        Self {
            id: JobId::new(),
            turns,
            timing: TimingConfig::default(),
            counterparty_name: DEFAULT_COUNTERPARTY_NAME.to_string(),
            avatar: None,
            background_audio: None,
        }
    }

    /// Replace the timing configuration.
    pub fn with_timing(mut self, timing: TimingConfig) -> Self {
        self.timing = timing;
        self
    }

    /// Replace the avatar source.
    pub fn with_avatar(mut self, avatar: ImageSource) -> Self {
        self.avatar = Some(avatar);
        self
    }

    /// Attach a background audio file.
    pub fn with_background_audio(mut self, path: impl Into<PathBuf>) -> Self {
        self.background_audio = Some(path.into());
        self
    }
}

/// JSON description of a job, as written by hand or by an upload handler.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct JobSpec {
    /// Ordered conversation.
    #[serde(alias = "messages")]
    pub turns: Vec<ChatTurn>,
    /// Frame rate and delays; missing fields fall back to defaults.
    #[serde(default)]
    pub timing: TimingConfig,
    /// Header name.
    #[serde(default, alias = "astrologerName")]
    pub counterparty_name: Option<String>,
    /// Avatar image path, relative to the spec file.
    #[serde(default)]
    pub avatar: Option<PathBuf>,
    /// Background audio path, relative to the spec file.
    #[serde(default, alias = "backgroundAudio")]
    pub background_audio: Option<PathBuf>,
}

impl JobSpec {
    /// Parse a job spec from a JSON file.
    pub fn from_path(path: &Path) -> ChatReelResult<Self> {
        let f = File::open(path).map_err(|e| {
            ChatReelError::configuration(format!("open job spec '{}': {e}", path.display()))
        })?;
        serde_json::from_reader(BufReader::new(f)).map_err(|e| {
            ChatReelError::configuration(format!("parse job spec '{}': {e}", path.display()))
        })
    }

    /// Parse a job spec from a JSON string.
    pub fn from_json_str(s: &str) -> ChatReelResult<Self> {
        serde_json::from_str(s)
            .map_err(|e| ChatReelError::configuration(format!("parse job spec: {e}")))
    }

    /// Resolve relative asset paths against `base_dir` and mint a fresh job id.
    pub fn into_job(self, base_dir: &Path) -> RenderJob {
        let resolve = |p: PathBuf| {
            if p.is_absolute() {
                p
            } else {
                base_dir.join(p)
            }
        };
        RenderJob {
            id: JobId::new(),
            turns: self.turns,
            timing: self.timing,
            counterparty_name: self
                .counterparty_name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_COUNTERPARTY_NAME.to_string()),
            avatar: self.avatar.map(resolve).map(ImageSource::Path),
            background_audio: self.background_audio.map(resolve),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/chat/job.rs"]
mod tests;
