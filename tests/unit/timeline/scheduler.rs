use super::*;

fn timing() -> TimingConfig {
    TimingConfig {
        fps: 30,
        inter_message_delay_ms: 2000,
        typing_delay_ms: 1000,
    }
}

fn scenario() -> Vec<ChatTurn> {
    vec![ChatTurn::counterparty("Hi"), ChatTurn::user("Hello")]
}

#[test]
fn scenario_frame_count_and_cues() {
    let turns = scenario();
    let tl = schedule(&turns, &timing()).unwrap();

    assert_eq!(tl.len(), 30 + (30 + 9 + 60) + (9 + 60) + 60);
    assert_eq!(tl.len(), 258);
    assert_eq!(tl.cues.len(), 2);

    assert_eq!(tl.cues[0].kind, CueKind::Receive);
    assert!((tl.cues[0].offset_seconds - 2.0).abs() < 1e-9);
    assert_eq!(tl.cues[1].kind, CueKind::Send);
    assert!((tl.cues[1].offset_seconds - 4.3).abs() < 1e-9);
    assert!((tl.duration_seconds() - 8.6).abs() < 1e-9);
}

#[test]
fn scenario_phases_have_expected_shape() {
    let turns = scenario();
    let tl = schedule(&turns, &timing()).unwrap();

    // leading idle
    assert!(tl.frames[..30].iter().all(|f| f.visible_turns.is_empty()));
    assert!(tl.frames[..30].iter().all(|f| !f.typing_indicator_visible));
    // typing before the counterparty turn
    assert!(tl.frames[30..60].iter().all(|f| f.typing_indicator_visible));
    assert!(tl.frames[30..60].iter().all(|f| f.visible_turns.is_empty()));
    // appear ramp starts at 0 and stays below 1
    assert_eq!(tl.frames[60].last_turn_opacity, 0.0);
    assert_eq!(tl.frames[60].visible_turns.len(), 1);
    assert!(tl.frames[68].last_turn_opacity < 1.0);
    assert!((tl.frames[68].last_turn_opacity - 8.0 / 9.0).abs() < 1e-6);
    // hold snaps to full opacity
    assert_eq!(tl.frames[69].last_turn_opacity, 1.0);
    // user turn has no typing phase
    assert_eq!(tl.frames[129].visible_turns.len(), 2);
    assert_eq!(tl.frames[129].last_turn_opacity, 0.0);
    assert!(!tl.frames[129].typing_indicator_visible);
    // trailing holds final state
    assert!(tl.frames[198..].iter().all(|f| f.visible_turns.len() == 2));
    assert!(tl.frames[198..].iter().all(|f| f.last_turn_opacity == 1.0));
}

#[test]
fn empty_conversation_is_three_idle_seconds() {
    for fps in [1, 24, 30, 60] {
        let t = TimingConfig { fps, ..timing() };
        let tl = schedule(&[], &t).unwrap();
        assert_eq!(tl.len() as i64, fps * 3);
        assert!(tl.cues.is_empty());
        assert!(tl.frames.iter().all(|f| f.visible_turns.is_empty()));
    }
}

#[test]
fn indices_are_contiguous_and_visible_turns_grow_by_prefix() {
    let turns = vec![
        ChatTurn::user("a"),
        ChatTurn::counterparty("b"),
        ChatTurn::counterparty("c"),
        ChatTurn::user("d"),
    ];
    let tl = schedule(&turns, &timing()).unwrap();
    for (i, f) in tl.frames.iter().enumerate() {
        assert_eq!(f.index, FrameIndex(i as u64));
        assert_eq!(f.visible_turns, &turns[..f.visible_turns.len()]);
    }
    for w in tl.frames.windows(2) {
        assert!(w[0].visible_turns.len() <= w[1].visible_turns.len());
    }
}

#[test]
fn cues_match_speakers_and_are_non_decreasing() {
    let turns = vec![
        ChatTurn::user("a"),
        ChatTurn::user("b"),
        ChatTurn::counterparty("c"),
    ];
    let t = TimingConfig {
        inter_message_delay_ms: 0,
        typing_delay_ms: 0,
        ..timing()
    };
    let tl = schedule(&turns, &t).unwrap();
    assert_eq!(tl.cues.len(), turns.len());
    for (cue, turn) in tl.cues.iter().zip(&turns) {
        assert_eq!(cue.kind, CueKind::for_speaker(turn.speaker));
    }
    for w in tl.cues.windows(2) {
        assert!(w[0].offset_seconds <= w[1].offset_seconds);
    }
}

#[test]
fn frame_count_matches_closed_form() {
    let turns = vec![
        ChatTurn::counterparty("one"),
        ChatTurn::user("two"),
        ChatTurn::counterparty("three"),
    ];
    for (fps, hold, typing) in [(30, 2000, 1000), (25, 1500, 700), (12, 0, 0), (60, 333, 1)] {
        let t = TimingConfig {
            fps,
            inter_message_delay_ms: hold,
            typing_delay_ms: typing,
        };
        let tl = schedule(&turns, &t).unwrap();
        assert_eq!(tl.len() as u64, expected_frame_count(&turns, &t).unwrap());
    }
}

#[test]
fn scheduling_is_idempotent() {
    let turns = scenario();
    let a = schedule(&turns, &timing()).unwrap();
    let b = schedule(&turns, &timing()).unwrap();
    assert_eq!(a, b);
}

#[test]
fn invalid_timing_is_rejected_before_scheduling() {
    let turns = scenario();
    let err = schedule(&turns, &TimingConfig { fps: 0, ..timing() }).unwrap_err();
    assert!(matches!(err, crate::ChatReelError::Configuration(_)));
    let err = schedule(
        &turns,
        &TimingConfig {
            inter_message_delay_ms: -10,
            ..timing()
        },
    )
    .unwrap_err();
    assert!(matches!(err, crate::ChatReelError::Configuration(_)));
}

#[test]
fn fingerprint_ignores_index_but_not_content() {
    let turns = scenario();
    let tl = schedule(&turns, &timing()).unwrap();
    // two hold frames of the first turn
    assert_eq!(
        tl.frames[70].content_fingerprint(),
        tl.frames[71].content_fingerprint()
    );
    // appear ramp frames differ
    assert_ne!(
        tl.frames[61].content_fingerprint(),
        tl.frames[62].content_fingerprint()
    );
    // typing vs idle
    assert_ne!(
        tl.frames[0].content_fingerprint(),
        tl.frames[30].content_fingerprint()
    );
}
