use std::path::PathBuf;

use crate::foundation::error::{ChatReelError, ChatReelResult};

/// Audio settings shared by the assembler and the cue engine.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Directory holding the cached notification tones; persists across jobs.
    pub tone_cache_dir: PathBuf,
    /// Gain applied to background audio under the cues.
    pub background_volume: f64,
    /// Output and tone sample rate.
    pub sample_rate: u32,
    /// AAC bitrate passed to the encoder.
    pub audio_bitrate: String,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            tone_cache_dir: PathBuf::from("assets/sounds"),
            background_volume: 0.3,
            sample_rate: 44_100,
            audio_bitrate: "128k".to_owned(),
        }
    }
}

impl AudioConfig {
    /// Reject settings the encoder cannot use.
    pub fn validate(&self) -> ChatReelResult<()> {
        if !self.background_volume.is_finite() || !(0.0..=4.0).contains(&self.background_volume) {
            return Err(ChatReelError::configuration(
                "audio.background_volume must be finite and in [0, 4]",
            ));
        }
        if !(8_000..=192_000).contains(&self.sample_rate) {
            return Err(ChatReelError::configuration(format!(
                "audio.sample_rate must be in [8000, 192000], got {}",
                self.sample_rate
            )));
        }
        let b = self.audio_bitrate.trim();
        let digits = b.strip_suffix(['k', 'K']).unwrap_or(b);
        if digits.is_empty() || !digits.bytes().all(|c| c.is_ascii_digit()) {
            return Err(ChatReelError::configuration(format!(
                "audio.audio_bitrate must look like '128k', got '{}'",
                self.audio_bitrate
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/audio/config.rs"]
mod tests;
