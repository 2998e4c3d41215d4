use crate::foundation::error::{ChatReelError, ChatReelResult};

/// Upper bound on `fps`; higher rates only inflate the frame count.
pub const MAX_FPS: i64 = 240;
/// Upper bound on any single delay (10 minutes).
pub const MAX_DELAY_MS: i64 = 600_000;

/// Who sent a turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    /// The phone owner; bubbles are right-aligned.
    User,
    /// The other side of the chat; bubbles are left-aligned and preceded by a typing phase.
    #[serde(alias = "astrologer", alias = "assistant")]
    Counterparty,
}

/// One message in the scripted conversation.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ChatTurn {
    /// Sender of the message.
    #[serde(alias = "role")]
    pub speaker: Speaker,
    /// Message body.
    pub text: String,
}

impl ChatTurn {
    /// Build a USER turn.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::User,
            text: text.into(),
        }
    }

    /// Build a COUNTERPARTY turn.
    pub fn counterparty(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Counterparty,
            text: text.into(),
        }
    }
}

/// Frame rate and delays for one render job.
///
/// Fields are signed so that out-of-range input reaches [`TimingConfig::validate`] and is
/// reported as a configuration error instead of a parse failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Output frames per second, `> 0`.
    pub fps: i64,
    /// Hold time after each turn appears, in milliseconds, `>= 0`.
    pub inter_message_delay_ms: i64,
    /// Typing-indicator time before each COUNTERPARTY turn, in milliseconds, `>= 0`.
    pub typing_delay_ms: i64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            fps: 30,
            inter_message_delay_ms: 2000,
            typing_delay_ms: 1000,
        }
    }
}

impl TimingConfig {
    /// Reject non-positive fps and negative (or absurdly long) delays.
    pub fn validate(&self) -> ChatReelResult<()> {
        if self.fps <= 0 {
            return Err(ChatReelError::configuration(format!(
                "fps must be > 0, got {}",
                self.fps
            )));
        }
        if self.fps > MAX_FPS {
            return Err(ChatReelError::configuration(format!(
                "fps must be <= {MAX_FPS}, got {}",
                self.fps
            )));
        }
        for (name, v) in [
            ("inter_message_delay_ms", self.inter_message_delay_ms),
            ("typing_delay_ms", self.typing_delay_ms),
        ] {
            if v < 0 {
                return Err(ChatReelError::configuration(format!(
                    "{name} must be >= 0, got {v}"
                )));
            }
            if v > MAX_DELAY_MS {
                return Err(ChatReelError::configuration(format!(
                    "{name} must be <= {MAX_DELAY_MS}, got {v}"
                )));
            }
        }
        Ok(())
    }

    /// Frame rate as `u32`. Only meaningful after [`TimingConfig::validate`].
    pub fn fps_u32(&self) -> u32 {
        self.fps.clamp(0, MAX_FPS) as u32
    }
}

#[cfg(test)]
#[path = "../../tests/unit/chat/model.rs"]
mod tests;
