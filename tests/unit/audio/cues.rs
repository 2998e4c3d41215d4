use super::*;

fn tones() -> TonePaths {
    TonePaths {
        send: PathBuf::from("/cache/send.wav"),
        receive: PathBuf::from("/cache/receive.wav"),
    }
}

fn cue(offset_seconds: f64, kind: CueKind) -> AudioCueEvent {
    AudioCueEvent {
        offset_seconds,
        kind,
    }
}

#[test]
fn no_cues_means_no_plan() {
    assert!(plan_cue_mix(&[], &tones(), 44_100).is_none());
}

#[test]
fn two_turn_conversation_graph() {
    let cues = [cue(2.0, CueKind::Receive), cue(4.3, CueKind::Send)];
    let plan = plan_cue_mix(&cues, &tones(), 44_100).unwrap();
    assert_eq!(
        plan.inputs,
        vec![
            PathBuf::from("/cache/receive.wav"),
            PathBuf::from("/cache/send.wav")
        ]
    );
    assert_eq!(
        plan.graph.render(),
        "[1:a]adelay=delays=2000:all=1[c0];\
         [2:a]adelay=delays=4300:all=1[c1];\
         [c0][c1]amix=inputs=2:duration=longest:normalize=0[cuemix];\
         [cuemix]aformat=sample_rates=44100:channel_layouts=stereo[cues];\
         [0:a][cues]amix=inputs=2:duration=first:normalize=0[aout]"
    );
    plan.graph.validate(MIX_SINK).unwrap();
}

#[test]
fn single_cue_skips_the_submix() {
    let plan = plan_cue_mix(&[cue(1.5, CueKind::Send)], &tones(), 48_000).unwrap();
    assert_eq!(plan.inputs, vec![PathBuf::from("/cache/send.wav")]);
    assert_eq!(
        plan.graph.render(),
        "[1:a]adelay=delays=1500:all=1[c0];\
         [c0]aformat=sample_rates=48000:channel_layouts=stereo[cues];\
         [0:a][cues]amix=inputs=2:duration=first:normalize=0[aout]"
    );
    plan.graph.validate(MIX_SINK).unwrap();
}

#[test]
fn repeated_tones_are_split_and_delayed_in_order() {
    let cues = [
        cue(2.0, CueKind::Send),
        cue(4.0, CueKind::Receive),
        cue(6.0, CueKind::Send),
        cue(8.0, CueKind::Send),
    ];
    let plan = plan_cue_mix(&cues, &tones(), 44_100).unwrap();
    assert_eq!(plan.inputs.len(), 2);
    plan.graph.validate(MIX_SINK).unwrap();

    let split: Vec<_> = plan.graph.nodes_named("asplit").collect();
    assert_eq!(split.len(), 1);
    assert_eq!(split[0].inputs, vec!["1:a"]);
    assert_eq!(split[0].outputs, vec!["snd0", "snd1", "snd2"]);

    let delays: Vec<(String, String)> = plan
        .graph
        .nodes_named("adelay")
        .map(|n| (n.inputs[0].clone(), n.get("delays").unwrap().to_owned()))
        .collect();
    assert_eq!(
        delays,
        vec![
            ("snd0".to_owned(), "2000".to_owned()),
            ("2:a".to_owned(), "4000".to_owned()),
            ("snd1".to_owned(), "6000".to_owned()),
            ("snd2".to_owned(), "8000".to_owned()),
        ]
    );

    let submix = plan
        .graph
        .nodes_named("amix")
        .find(|n| n.outputs == ["cuemix"])
        .unwrap();
    assert_eq!(submix.get("inputs"), Some("4"));
    assert_eq!(submix.get("normalize"), Some("0"));
}

#[test]
fn mix_args_copy_video_and_encode_audio() {
    let cues = [cue(2.0, CueKind::Receive)];
    let plan = plan_cue_mix(&cues, &tones(), 44_100).unwrap();
    let a = mix_args(
        Path::new("/job/video.mp4"),
        Path::new("/out/final.mp4"),
        &plan,
        &AudioConfig::default(),
    );
    let s = a.to_strings();
    assert!(s.windows(2).any(|w| w == ["-i", "/job/video.mp4"]));
    assert!(s.windows(2).any(|w| w == ["-i", "/cache/receive.wav"]));
    assert!(s.windows(2).any(|w| w == ["-map", "0:v"]));
    assert!(s.windows(2).any(|w| w == ["-map", "[aout]"]));
    assert_eq!(a.value_of("-c:v").as_deref(), Some("copy"));
    assert_eq!(a.value_of("-c:a").as_deref(), Some("aac"));
    assert_eq!(a.value_of("-filter_complex"), Some(plan.graph.render()));
    assert_eq!(s.last().map(String::as_str), Some("/out/final.mp4"));
}

#[test]
fn copy_args_stream_copy() {
    let a = copy_args(Path::new("in.mp4"), Path::new("out.mp4"));
    assert_eq!(a.value_of("-c").as_deref(), Some("copy"));
    assert_eq!(a.value_of("-i").as_deref(), Some("in.mp4"));
    assert!(!a.to_strings().contains(&"-filter_complex".to_owned()));
}

#[test]
fn outcome_serializes_with_tag() {
    let v = serde_json::to_value(MixOutcome::Mixed { cues: 2 }).unwrap();
    assert_eq!(v, serde_json::json!({"outcome": "mixed", "cues": 2}));
    let v = serde_json::to_value(MixOutcome::NoCues).unwrap();
    assert_eq!(v, serde_json::json!({"outcome": "no_cues"}));
}

#[test]
fn cancelled_job_does_not_spawn() {
    let dir = tempfile::tempdir().unwrap();
    let control = JobControl::with_timeout(crate::foundation::cancel::CancelToken::new(), None);
    control.cancel.cancel();
    let err = mix_cues(
        &dir.path().join("video.mp4"),
        &dir.path().join("out.mp4"),
        &[],
        &ToneCache::new(dir.path().join("sounds"), 44_100),
        &AudioConfig::default(),
        &control,
    )
    .unwrap_err();
    assert!(matches!(err, ChatReelError::Cancelled(_)), "{err}");
    assert!(!dir.path().join("out.mp4").exists());
}

#[test]
fn broken_video_falls_back_then_fails_on_copy() {
    if !crate::encode::process::is_ffmpeg_on_path() {
        eprintln!("skipping: ffmpeg not on PATH");
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let video = dir.path().join("video.mp4");
    std::fs::write(&video, b"not a video").unwrap();
    let control = JobControl::with_timeout(crate::foundation::cancel::CancelToken::new(), None);
    let err = mix_cues(
        &video,
        &dir.path().join("out.mp4"),
        &[cue(0.5, CueKind::Send)],
        &ToneCache::new(dir.path().join("sounds"), 44_100),
        &AudioConfig::default(),
        &control,
    )
    .unwrap_err();
    assert!(matches!(err, ChatReelError::Encode(_)), "{err}");
    assert!(!dir.path().join("out.mp4").exists());
}
