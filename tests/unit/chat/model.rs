use super::*;

#[test]
fn default_timing_is_valid() {
    let t = TimingConfig::default();
    assert!(t.validate().is_ok());
    assert_eq!(t.fps_u32(), 30);
}

#[test]
fn timing_rejects_bad_values() {
    let base = TimingConfig::default();
    for bad in [
        TimingConfig { fps: 0, ..base },
        TimingConfig { fps: -5, ..base },
        TimingConfig {
            fps: MAX_FPS + 1,
            ..base
        },
        TimingConfig {
            inter_message_delay_ms: -1,
            ..base
        },
        TimingConfig {
            typing_delay_ms: -1,
            ..base
        },
        TimingConfig {
            typing_delay_ms: MAX_DELAY_MS + 1,
            ..base
        },
    ] {
        let err = bad.validate().unwrap_err();
        assert!(matches!(err, ChatReelError::Configuration(_)), "{bad:?}");
    }
}

#[test]
fn zero_delays_are_allowed() {
    let t = TimingConfig {
        fps: 24,
        inter_message_delay_ms: 0,
        typing_delay_ms: 0,
    };
    assert!(t.validate().is_ok());
}

#[test]
fn turns_parse_with_role_alias() {
    let json = r#"[
        {"role": "astrologer", "text": "Hi"},
        {"speaker": "user", "text": "Hello"}
    ]"#;
    let turns: Vec<ChatTurn> = serde_json::from_str(json).unwrap();
    assert_eq!(
        turns,
        vec![ChatTurn::counterparty("Hi"), ChatTurn::user("Hello")]
    );
}

#[test]
fn timing_fills_missing_fields_with_defaults() {
    let t: TimingConfig = serde_json::from_str(r#"{"fps": 24}"#).unwrap();
    assert_eq!(t.fps, 24);
    assert_eq!(t.inter_message_delay_ms, 2000);
    assert_eq!(t.typing_delay_ms, 1000);
}
