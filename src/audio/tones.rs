use std::f64::consts::PI;
use std::path::Path;

use anyhow::Context;

use crate::timeline::scheduler::CueKind;

/// Recipe for one notification tone.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ToneSpec {
    /// Frequency at the start, in Hz.
    pub start_hz: f64,
    /// Frequency at the end, in Hz; equal to `start_hz` for a steady tone.
    pub end_hz: f64,
    /// Length in seconds.
    pub duration_s: f64,
    /// Peak amplitude in `(0, 1]`.
    pub gain: f64,
    /// Linear fade-in length in seconds.
    pub attack_s: f64,
    /// Linear fade-out length in seconds.
    pub release_s: f64,
    /// One-pole high-pass cutoff in Hz.
    pub highpass_hz: f64,
    /// One-pole low-pass cutoff in Hz.
    pub lowpass_hz: f64,
}

impl ToneSpec {
    /// Bright, rising blip for outgoing messages.
    pub const SEND: Self = Self {
        start_hz: 800.0,
        end_hz: 1000.0,
        duration_s: 0.10,
        gain: 0.3,
        attack_s: 0.005,
        release_s: 0.03,
        highpass_hz: 300.0,
        lowpass_hz: 3000.0,
    };

    /// Softer, longer tone for incoming messages.
    pub const RECEIVE: Self = Self {
        start_hz: 600.0,
        end_hz: 600.0,
        duration_s: 0.15,
        gain: 0.4,
        attack_s: 0.01,
        release_s: 0.06,
        highpass_hz: 300.0,
        lowpass_hz: 3000.0,
    };

    /// Recipe for `kind`.
    pub fn for_kind(kind: CueKind) -> Self {
        match kind {
            CueKind::Send => Self::SEND,
            CueKind::Receive => Self::RECEIVE,
        }
    }

    /// Sample count at `sample_rate`.
    pub fn sample_count(&self, sample_rate: u32) -> usize {
        (self.duration_s * f64::from(sample_rate)).round().max(0.0) as usize
    }
}

/// Render `spec` to 16-bit mono PCM.
///
/// Deterministic: the same spec and rate always produce the same samples.
pub fn synthesize(spec: &ToneSpec, sample_rate: u32) -> Vec<i16> {
    let n = spec.sample_count(sample_rate);
    let sr = f64::from(sample_rate);
    let dt = 1.0 / sr;

    let hp_rc = 1.0 / (2.0 * PI * spec.highpass_hz.max(1.0));
    let hp_alpha = hp_rc / (hp_rc + dt);
    let lp_rc = 1.0 / (2.0 * PI * spec.lowpass_hz.max(1.0));
    let lp_alpha = dt / (lp_rc + dt);

    let mut phase = 0.0_f64;
    let (mut hp_prev_in, mut hp_prev_out, mut lp_prev) = (0.0_f64, 0.0_f64, 0.0_f64);
    let mut out = Vec::with_capacity(n);

    for i in 0..n {
        let t = i as f64 * dt;
        let progress = if n > 1 { i as f64 / (n - 1) as f64 } else { 0.0 };
        let freq = spec.start_hz + (spec.end_hz - spec.start_hz) * progress;
        let raw = phase.sin();
        phase = (phase + 2.0 * PI * freq * dt) % (2.0 * PI);

        let hp = hp_alpha * (hp_prev_out + raw - hp_prev_in);
        hp_prev_in = raw;
        hp_prev_out = hp;
        lp_prev += lp_alpha * (hp - lp_prev);

        let env = envelope(t, spec);
        let v = (lp_prev * env * spec.gain).clamp(-1.0, 1.0);
        out.push((v * f64::from(i16::MAX)).round() as i16);
    }
    out
}

fn envelope(t: f64, spec: &ToneSpec) -> f64 {
    let attack = if spec.attack_s > 0.0 {
        (t / spec.attack_s).min(1.0)
    } else {
        1.0
    };
    let remaining = (spec.duration_s - t).max(0.0);
    let release = if spec.release_s > 0.0 {
        (remaining / spec.release_s).min(1.0)
    } else {
        1.0
    };
    attack * release
}

/// WAV header for the tones this crate writes.
pub fn wav_spec(sample_rate: u32) -> hound::WavSpec {
    hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    }
}

/// Write mono 16-bit PCM to `path`.
pub fn write_wav(path: &Path, samples: &[i16], sample_rate: u32) -> anyhow::Result<()> {
    let mut writer = hound::WavWriter::create(path, wav_spec(sample_rate))
        .with_context(|| format!("create wav '{}'", path.display()))?;
    for &s in samples {
        writer.write_sample(s)?;
    }
    writer
        .finalize()
        .with_context(|| format!("finalize wav '{}'", path.display()))?;
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/audio/tones.rs"]
mod tests;
