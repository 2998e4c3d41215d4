use std::ffi::{OsStr, OsString};
use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Duration;

use crate::foundation::cancel::JobControl;
use crate::foundation::error::{ChatReelError, ChatReelResult};

const POLL_INTERVAL: Duration = Duration::from_millis(20);
const STDERR_TAIL_BYTES: usize = 4096;

/// Whether an `ffmpeg` binary can be executed from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Create the parent directory of `path` if it has one.
pub fn ensure_parent_dir(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Argument list for one `ffmpeg` invocation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FfmpegArgs(Vec<OsString>);

impl FfmpegArgs {
    /// Empty argument list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one argument.
    pub fn arg(&mut self, a: impl AsRef<OsStr>) -> &mut Self {
        self.0.push(a.as_ref().to_owned());
        self
    }

    /// Append several arguments.
    pub fn args<I, S>(&mut self, items: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        for a in items {
            self.arg(a);
        }
        self
    }

    /// Arguments in order.
    pub fn as_slice(&self) -> &[OsString] {
        &self.0
    }

    /// Lossy string form of every argument, for tests and logs.
    pub fn to_strings(&self) -> Vec<String> {
        self.0
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    /// Value following the first occurrence of `flag`.
    pub fn value_of(&self, flag: &str) -> Option<String> {
        let pos = self.0.iter().position(|a| a == flag)?;
        self.0
            .get(pos + 1)
            .map(|v| v.to_string_lossy().into_owned())
    }
}

impl std::fmt::Display for FfmpegArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ffmpeg")?;
        for a in &self.0 {
            write!(f, " {}", a.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Run `ffmpeg` to completion, killing it if `control` is cancelled or its deadline passes.
///
/// Spawn failures and non-zero exits are reported through `fail`, so each stage can surface its
/// own error variant; cancellation is always [`ChatReelError::Cancelled`].
pub fn run_ffmpeg(
    args: &FfmpegArgs,
    control: &JobControl,
    stage: &str,
    fail: fn(String) -> ChatReelError,
) -> ChatReelResult<()> {
    control.check(stage)?;
    tracing::debug!(stage, command = %args, "spawning ffmpeg");

    let mut child = Command::new("ffmpeg")
        .args(args.as_slice())
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| {
            fail(format!(
                "{stage}: failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;

    let stderr_reader = child.stderr.take().map(|mut stderr| {
        std::thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = stderr.read_to_end(&mut buf);
            buf
        })
    });

    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => {}
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(fail(format!("{stage}: failed to wait for ffmpeg: {e}")));
            }
        }
        if let Err(cancelled) = control.check(stage) {
            let _ = child.kill();
            let _ = child.wait();
            if let Some(h) = stderr_reader {
                let _ = h.join();
            }
            tracing::warn!(stage, "ffmpeg killed: {cancelled}");
            return Err(cancelled);
        }
        std::thread::sleep(POLL_INTERVAL);
    };

    let stderr = stderr_reader
        .and_then(|h| h.join().ok())
        .unwrap_or_default();

    if !status.success() {
        return Err(fail(format!(
            "{stage}: ffmpeg exited with status {status}: {}",
            stderr_tail(&stderr)
        )));
    }
    Ok(())
}

fn stderr_tail(bytes: &[u8]) -> String {
    let start = bytes.len().saturating_sub(STDERR_TAIL_BYTES);
    String::from_utf8_lossy(&bytes[start..]).trim().to_owned()
}

/// Fail unless `path` exists and is non-empty.
pub fn require_output(path: &Path, fail: fn(String) -> ChatReelError) -> ChatReelResult<()> {
    match std::fs::metadata(path) {
        Ok(m) if m.is_file() && m.len() > 0 => Ok(()),
        Ok(_) => Err(fail(format!("'{}' is empty", path.display()))),
        Err(e) => Err(fail(format!("'{}' was not produced: {e}", path.display()))),
    }
}

/// Best-effort removal of a partially written output.
pub(crate) fn remove_partial(path: &Path) {
    if path.exists()
        && let Err(e) = std::fs::remove_file(path)
    {
        tracing::warn!("failed to remove partial output '{}': {e}", path.display());
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/process.rs"]
mod tests;
