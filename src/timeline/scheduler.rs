use crate::chat::model::{ChatTurn, Speaker, TimingConfig};
use crate::foundation::core::FrameIndex;
use crate::foundation::error::ChatReelResult;
use crate::foundation::math::{Fnv1a64, ms_to_frames};

/// Length of the fade-in applied to a newly revealed bubble.
pub const APPEAR_MS: u32 = 300;
/// Idle time before the first turn.
pub const LEADING_SECONDS: u32 = 1;
/// Hold time after the last turn.
pub const TRAILING_SECONDS: u32 = 2;

/// Notification sound attached to a turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CueKind {
    /// Outgoing message (USER).
    Send,
    /// Incoming message (COUNTERPARTY).
    Receive,
}

impl CueKind {
    /// Cue played when `speaker`'s turn appears.
    pub fn for_speaker(speaker: Speaker) -> Self {
        match speaker {
            Speaker::User => Self::Send,
            Speaker::Counterparty => Self::Receive,
        }
    }
}

/// A cue placed on the output timeline.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AudioCueEvent {
    /// Seconds from the start of the video, `>= 0`.
    pub offset_seconds: f64,
    /// Which tone to play.
    pub kind: CueKind,
}

/// Everything visible at one instant of the output video.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameDescriptor<'a> {
    /// Position in the output sequence.
    pub index: FrameIndex,
    /// Prefix of the conversation that is on screen.
    pub visible_turns: &'a [ChatTurn],
    /// Whether the three-dot typing bubble is shown below the stack.
    pub typing_indicator_visible: bool,
    /// Alpha applied to the most recently revealed bubble only.
    pub last_turn_opacity: f32,
}

impl FrameDescriptor<'_> {
    /// Hash of the visual content, ignoring the frame index.
    ///
    /// Two descriptors of the same timeline with equal fingerprints composite to identical
    /// pixels, because `visible_turns` is always a prefix of the same list.
    pub fn content_fingerprint(&self) -> u64 {
        let mut h = Fnv1a64::new_default();
        h.write_u64(self.visible_turns.len() as u64);
        h.write_u8(u8::from(self.typing_indicator_visible));
        h.write_u32(self.last_turn_opacity.to_bits());
        h.finish()
    }
}

/// Frame counts for each phase, derived from one [`TimingConfig`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PhaseFrames {
    /// Opening idle shot.
    pub leading: u64,
    /// Typing indicator before each COUNTERPARTY turn.
    pub typing: u64,
    /// Fade-in of a new bubble.
    pub appear: u64,
    /// Hold after each turn.
    pub hold: u64,
    /// Closing shot.
    pub trailing: u64,
}

impl PhaseFrames {
    /// Validate `timing` and compute the per-phase counts.
    pub fn from_timing(timing: &TimingConfig) -> ChatReelResult<Self> {
        timing.validate()?;
        let fps = timing.fps_u32();
        // validate() bounds the delays to 0..=MAX_DELAY_MS
        let typing_ms = timing.typing_delay_ms as u32;
        let hold_ms = timing.inter_message_delay_ms as u32;
        Ok(Self {
            leading: u64::from(fps * LEADING_SECONDS),
            typing: ms_to_frames(typing_ms, fps),
            appear: ms_to_frames(APPEAR_MS, fps),
            hold: ms_to_frames(hold_ms, fps),
            trailing: u64::from(fps * TRAILING_SECONDS),
        })
    }

    /// Frames contributed by one turn of `speaker`.
    pub fn per_turn(&self, speaker: Speaker) -> u64 {
        let typing = match speaker {
            Speaker::Counterparty => self.typing,
            Speaker::User => 0,
        };
        typing + self.appear + self.hold
    }
}

/// Ordered frames and cues for one job.
#[derive(Clone, Debug, PartialEq)]
pub struct Timeline<'a> {
    /// Output frame rate.
    pub fps: u32,
    /// Contiguous, zero-based frames in emission order.
    pub frames: Vec<FrameDescriptor<'a>>,
    /// One cue per turn, in chat order.
    pub cues: Vec<AudioCueEvent>,
}

impl<'a> Timeline<'a> {
    /// Number of frames.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// True when there are no frames (never the case for a scheduled timeline).
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Frame at `index`, if in range.
    pub fn frame(&self, index: FrameIndex) -> Option<&FrameDescriptor<'a>> {
        usize::try_from(index.0)
            .ok()
            .and_then(|i| self.frames.get(i))
    }

    /// Video length in seconds at the scheduled frame rate.
    pub fn duration_seconds(&self) -> f64 {
        self.frames.len() as f64 / f64::from(self.fps.max(1))
    }

    /// Serializable summary (no turn text).
    pub fn summary(&self) -> TimelineSummary {
        TimelineSummary {
            fps: self.fps,
            frames_total: self.frames.len() as u64,
            duration_seconds: self.duration_seconds(),
            cues: self.cues.clone(),
        }
    }
}

/// Compact description of a [`Timeline`], printed by the CLI.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct TimelineSummary {
    /// Output frame rate.
    pub fps: u32,
    /// Total frame count.
    pub frames_total: u64,
    /// Video length in seconds.
    pub duration_seconds: f64,
    /// Cue list.
    pub cues: Vec<AudioCueEvent>,
}

/// Closed-form frame count for `turns` under `timing`.
pub fn expected_frame_count(turns: &[ChatTurn], timing: &TimingConfig) -> ChatReelResult<u64> {
    let p = PhaseFrames::from_timing(timing)?;
    let body: u64 = turns.iter().map(|t| p.per_turn(t.speaker)).sum();
    Ok(p.leading + body + p.trailing)
}

struct Emitter<'a> {
    turns: &'a [ChatTurn],
    frames: Vec<FrameDescriptor<'a>>,
}

impl<'a> Emitter<'a> {
    fn emit(&mut self, visible: usize, typing: bool, opacity: f32) {
        let index = FrameIndex(self.frames.len() as u64);
        self.frames.push(FrameDescriptor {
            index,
            visible_turns: &self.turns[..visible],
            typing_indicator_visible: typing,
            last_turn_opacity: opacity,
        });
    }

    fn emit_n(&mut self, n: u64, visible: usize, typing: bool, opacity: f32) {
        for _ in 0..n {
            self.emit(visible, typing, opacity);
        }
    }
}

/// Build the full timeline for `turns`.
///
/// Cue offsets are derived from the frame position at which each turn is revealed, so they
/// land exactly on a frame boundary and never depend on wall-clock time.
#[tracing::instrument(skip(turns), fields(turns = turns.len()))]
pub fn schedule<'a>(turns: &'a [ChatTurn], timing: &TimingConfig) -> ChatReelResult<Timeline<'a>> {
    let p = PhaseFrames::from_timing(timing)?;
    let fps = timing.fps_u32();
    let total = expected_frame_count(turns, timing)?;

    let mut em = Emitter {
        turns,
        frames: Vec::with_capacity(usize::try_from(total).unwrap_or(0)),
    };
    let mut cues = Vec::with_capacity(turns.len());

    em.emit_n(p.leading, 0, false, 1.0);

    for (i, turn) in turns.iter().enumerate() {
        if turn.speaker == Speaker::Counterparty {
            em.emit_n(p.typing, i, true, 1.0);
        }

        cues.push(AudioCueEvent {
            offset_seconds: em.frames.len() as f64 / f64::from(fps),
            kind: CueKind::for_speaker(turn.speaker),
        });

        let visible = i + 1;
        for k in 0..p.appear {
            em.emit(visible, false, k as f32 / p.appear as f32);
        }
        em.emit_n(p.hold, visible, false, 1.0);
    }

    em.emit_n(p.trailing, turns.len(), false, 1.0);

    debug_assert_eq!(em.frames.len() as u64, total);
    tracing::debug!(frames = em.frames.len(), cues = cues.len(), "timeline scheduled");

    Ok(Timeline {
        fps,
        frames: em.frames,
        cues,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/scheduler.rs"]
mod tests;
