use super::*;
use crate::chat::model::{ChatTurn, TimingConfig};

fn test_font_path() -> Option<PathBuf> {
    std::env::var_os("CHATREEL_TEST_FONT")
        .map(PathBuf::from)
        .or_else(FontFace::discover)
}

fn opts(root: &Path) -> PipelineOpts {
    let mut o = PipelineOpts::new(root.join("out/final.mp4"));
    o.scratch_root = root.join("scratch");
    o.audio.tone_cache_dir = root.join("sounds");
    o.render.font_path = test_font_path();
    o
}

fn job() -> RenderJob {
    RenderJob::new(vec![ChatTurn::counterparty("Hi"), ChatTurn::user("Hello")])
}

fn assert_nothing_written(root: &Path) {
    assert!(!root.join("scratch").exists());
    assert!(!root.join("out").exists());
    assert!(!root.join("sounds").exists());
}

#[test]
fn invalid_timing_is_rejected_without_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let j = job().with_timing(TimingConfig {
        fps: 0,
        ..TimingConfig::default()
    });
    let status = run_job(&j, &opts(dir.path()));
    assert!(matches!(status, JobStatus::Rejected { .. }), "{status:?}");
    assert_nothing_written(dir.path());
}

#[test]
fn odd_canvas_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut o = opts(dir.path());
    o.render.width = 375;
    let status = run_job(&job(), &o);
    let JobStatus::Rejected { reason } = &status else {
        panic!("expected rejection, got {status:?}");
    };
    assert!(reason.contains("even"), "{reason}");
    assert_nothing_written(dir.path());
}

#[test]
fn unreadable_font_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut o = opts(dir.path());
    o.render.font_path = Some(dir.path().join("missing.ttf"));
    assert!(matches!(run_job(&job(), &o), JobStatus::Rejected { .. }));
    assert_nothing_written(dir.path());

    let garbage = dir.path().join("bad.ttf");
    std::fs::write(&garbage, b"not a font at all").unwrap();
    o.render.font_path = Some(garbage);
    let status = run_job(&job(), &o);
    let JobStatus::Rejected { reason } = &status else {
        panic!("expected rejection, got {status:?}");
    };
    assert!(reason.contains("font"), "{reason}");
    assert_nothing_written(dir.path());
}

#[test]
fn bad_audio_config_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut o = opts(dir.path());
    o.audio.sample_rate = 1;
    assert!(matches!(run_job(&job(), &o), JobStatus::Rejected { .. }));
}

#[test]
fn cancelled_job_fails_while_rendering_and_cleans_up() {
    let dir = tempfile::tempdir().unwrap();
    let o = opts(dir.path());
    if o.render.font_path.is_none() {
        eprintln!("skipping: no font available");
        return;
    }
    o.cancel.cancel();
    let status = run_job(&job(), &o);
    let JobStatus::Failed { stage, reason, .. } = &status else {
        panic!("expected failure, got {status:?}");
    };
    assert_eq!(*stage, JobStage::RenderingFrames);
    assert!(reason.contains("cancelled"), "{reason}");

    let leftovers: Vec<_> = std::fs::read_dir(dir.path().join("scratch"))
        .unwrap()
        .collect();
    assert!(leftovers.is_empty());
    assert!(!dir.path().join("out/final.mp4").exists());
}

#[test]
fn missing_optional_assets_do_not_reject() {
    let dir = tempfile::tempdir().unwrap();
    let o = opts(dir.path());
    if o.render.font_path.is_none() {
        eprintln!("skipping: no font available");
        return;
    }
    let j = job()
        .with_avatar(crate::chat::job::ImageSource::Path(dir.path().join("nope.png")))
        .with_background_audio(dir.path().join("nope.mp3"));
    let prepared = prepare(&j, &o).unwrap();
    assert!(prepared.assets.avatar.is_none());
    assert!(prepared.background.is_none());
    assert_eq!(prepared.cfg.counterparty_name, "Astrologer");
}

#[test]
fn job_name_overrides_config_name() {
    let dir = tempfile::tempdir().unwrap();
    let o = opts(dir.path());
    if o.render.font_path.is_none() {
        eprintln!("skipping: no font available");
        return;
    }
    let mut j = job();
    j.counterparty_name = "Mira".to_owned();
    assert_eq!(prepare(&j, &o).unwrap().cfg.counterparty_name, "Mira");
}
