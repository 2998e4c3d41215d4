use super::*;

const ALL: [JobStage; 6] = [
    JobStage::Scheduled,
    JobStage::RenderingFrames,
    JobStage::EncodingVideo,
    JobStage::MixingAudio,
    JobStage::Done,
    JobStage::Failed,
];

#[test]
fn happy_path_is_linear() {
    let path = [
        JobStage::Scheduled,
        JobStage::RenderingFrames,
        JobStage::EncodingVideo,
        JobStage::MixingAudio,
        JobStage::Done,
    ];
    for w in path.windows(2) {
        assert!(w[0].can_transition_to(w[1]), "{} -> {}", w[0], w[1]);
    }
    assert!(!JobStage::Scheduled.can_transition_to(JobStage::EncodingVideo));
    assert!(!JobStage::RenderingFrames.can_transition_to(JobStage::Done));
}

#[test]
fn terminal_states_have_no_exits() {
    for from in [JobStage::Done, JobStage::Failed] {
        assert!(from.is_terminal());
        for to in ALL {
            assert!(!from.can_transition_to(to), "{from} -> {to}");
        }
    }
}

#[test]
fn every_working_stage_can_fail() {
    for from in ALL.iter().copied().filter(|s| !s.is_terminal()) {
        assert!(from.can_transition_to(JobStage::Failed), "{from}");
    }
}

#[test]
fn tracker_follows_transitions() {
    let mut t = StageTracker::new(JobId::new());
    assert_eq!(t.stage(), JobStage::Scheduled);
    t.advance(JobStage::RenderingFrames);
    t.advance(JobStage::Failed);
    assert_eq!(t.stage(), JobStage::Failed);
}

#[test]
fn status_serializes_for_callers() {
    let id = JobId::new();
    let done = JobStatus::Done {
        job_id: id,
        output: PathBuf::from("/out/v.mp4"),
        mix: MixOutcome::NoCues,
        stats: RenderStats::default(),
    };
    assert!(done.is_done());
    assert_eq!(done.output(), Some(std::path::Path::new("/out/v.mp4")));
    let v = serde_json::to_value(&done).unwrap();
    assert_eq!(v["status"], "done");
    assert_eq!(v["mix"]["outcome"], "no_cues");

    let failed = JobStatus::Failed {
        job_id: id,
        stage: JobStage::EncodingVideo,
        reason: "boom".to_owned(),
    };
    assert!(!failed.is_done());
    assert_eq!(failed.output(), None);
    let v = serde_json::to_value(&failed).unwrap();
    assert_eq!(v["stage"], "encoding_video");
    assert_eq!(JobStage::MixingAudio.to_string(), "MIXING_AUDIO");
}
