use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::audio::tones::{ToneSpec, synthesize, wav_spec, write_wav};
use crate::foundation::error::{ChatReelError, ChatReelResult};
use crate::timeline::scheduler::CueKind;

/// Paths of the two generated notification tones.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TonePaths {
    /// Tone played when the user sends a message.
    pub send: PathBuf,
    /// Tone played when the counterparty's message arrives.
    pub receive: PathBuf,
}

impl TonePaths {
    /// Tone file for `kind`.
    pub fn path_for(&self, kind: CueKind) -> &Path {
        match kind {
            CueKind::Send => &self.send,
            CueKind::Receive => &self.receive,
        }
    }
}

/// Directory of generated tones, shared by every job that points at it.
///
/// Files are generated on first use and then reused; a file that does not match the
/// expected format or length is regenerated.
#[derive(Clone, Debug)]
pub struct ToneCache {
    dir: PathBuf,
    sample_rate: u32,
}

impl ToneCache {
    /// Cache rooted at `dir`, producing tones at `sample_rate`.
    pub fn new(dir: impl Into<PathBuf>, sample_rate: u32) -> Self {
        Self {
            dir: dir.into(),
            sample_rate,
        }
    }

    /// Cache directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Where the tone for `kind` lives, whether or not it exists yet.
    pub fn path_for(&self, kind: CueKind) -> PathBuf {
        let name = match kind {
            CueKind::Send => "send",
            CueKind::Receive => "receive",
        };
        self.dir.join(format!("{name}-{}.wav", self.sample_rate))
    }

    /// Make sure both tones exist and are valid, generating them if needed.
    ///
    /// Failures are [`ChatReelError::Mix`]: without tones the cues cannot be mixed, but the
    /// video itself is still usable.
    #[tracing::instrument(skip(self), fields(dir = %self.dir.display()))]
    pub fn ensure(&self) -> ChatReelResult<TonePaths> {
        std::fs::create_dir_all(&self.dir).map_err(|e| {
            ChatReelError::mix(format!(
                "failed to create tone cache '{}': {e}",
                self.dir.display()
            ))
        })?;
        Ok(TonePaths {
            send: self.ensure_one(CueKind::Send)?,
            receive: self.ensure_one(CueKind::Receive)?,
        })
    }

    fn ensure_one(&self, kind: CueKind) -> ChatReelResult<PathBuf> {
        let path = self.path_for(kind);
        let spec = ToneSpec::for_kind(kind);
        if self.is_valid(&path, &spec) {
            tracing::debug!(?kind, "tone cache hit");
            return Ok(path);
        }
        self.generate(&path, &spec)
            .map_err(|e| ChatReelError::mix(format!("{e:#}")))?;
        tracing::info!(?kind, path = %path.display(), "generated notification tone");
        Ok(path)
    }

    fn is_valid(&self, path: &Path, spec: &ToneSpec) -> bool {
        let Ok(reader) = hound::WavReader::open(path) else {
            return false;
        };
        reader.spec() == wav_spec(self.sample_rate)
            && reader.duration() as usize == spec.sample_count(self.sample_rate)
    }

    // Write to a sibling temp file and rename, so concurrent jobs never see a torn file.
    fn generate(&self, path: &Path, spec: &ToneSpec) -> anyhow::Result<()> {
        let samples = synthesize(spec, self.sample_rate);
        let tmp = path.with_extension(format!("wav.{}.tmp", uuid::Uuid::new_v4().simple()));
        write_wav(&tmp, &samples, self.sample_rate)?;
        if let Err(e) = std::fs::rename(&tmp, path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(e).with_context(|| format!("install tone '{}'", path.display()));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/audio/cache.rs"]
mod tests;
