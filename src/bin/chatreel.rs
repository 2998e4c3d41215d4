use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use chatreel::render::sink::flatten_to_opaque_rgba8;

#[derive(Parser, Debug)]
#[command(name = "chatreel", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a job to MP4 (requires `ffmpeg` on PATH).
    Render(RenderArgs),
    /// Render a single frame as a PNG.
    Frame(FrameArgs),
    /// Print the frame count and cue list of a job as JSON.
    Timeline(TimelineArgs),
    /// Generate (or validate) the cached notification tones.
    Tones(TonesArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input job JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output MP4 path.
    #[arg(long)]
    out: PathBuf,

    /// Font file; discovered from `CHATREEL_FONT` or system paths when omitted.
    #[arg(long)]
    font: Option<PathBuf>,

    /// Parent directory for per-job scratch files.
    #[arg(long)]
    scratch: Option<PathBuf>,

    /// Directory holding the cached notification tones.
    #[arg(long, default_value = "assets/sounds")]
    tone_cache: PathBuf,

    /// Enable frame-level parallelism.
    #[arg(long, default_value_t = false)]
    parallel: bool,

    /// Override rayon worker threads (parallel mode only).
    #[arg(long)]
    threads: Option<usize>,

    /// Abandon the job after this many seconds.
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Keep frames and the intermediate video.
    #[arg(long, default_value_t = false)]
    keep_intermediates: bool,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Input job JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Frame index (0-based).
    #[arg(long)]
    frame: u64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Font file; discovered when omitted.
    #[arg(long)]
    font: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct TimelineArgs {
    /// Input job JSON.
    #[arg(long = "in")]
    in_path: PathBuf,
}

#[derive(Parser, Debug)]
struct TonesArgs {
    /// Directory holding the cached notification tones.
    #[arg(long, default_value = "assets/sounds")]
    tone_cache: PathBuf,

    /// Tone sample rate.
    #[arg(long, default_value_t = 44_100)]
    sample_rate: u32,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("chatreel=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Frame(args) => cmd_frame(args),
        Command::Timeline(args) => cmd_timeline(args),
        Command::Tones(args) => cmd_tones(args),
    }
}

fn load_job(in_path: &Path) -> anyhow::Result<chatreel::RenderJob> {
    let spec = chatreel::JobSpec::from_path(in_path)?;
    let base = in_path.parent().unwrap_or_else(|| Path::new("."));
    Ok(spec.into_job(base))
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let job = load_job(&args.in_path)?;

    let mut opts = chatreel::PipelineOpts::new(&args.out);
    if let Some(scratch) = args.scratch {
        opts.scratch_root = scratch;
    }
    opts.render.font_path = args.font;
    opts.audio.tone_cache_dir = args.tone_cache;
    opts.threading.parallel = args.parallel;
    opts.threading.threads = args.threads;
    opts.timeout = args.timeout_secs.map(Duration::from_secs);
    opts.keep_intermediates = args.keep_intermediates;

    let status = chatreel::run_job(&job, &opts);
    println!("{}", serde_json::to_string_pretty(&status)?);
    match status {
        chatreel::JobStatus::Done { output, .. } => {
            eprintln!("wrote {}", output.display());
            Ok(())
        }
        chatreel::JobStatus::Rejected { reason } => anyhow::bail!("job rejected: {reason}"),
        chatreel::JobStatus::Failed { stage, reason, .. } => {
            anyhow::bail!("job failed during {stage}: {reason}")
        }
    }
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let job = load_job(&args.in_path)?;
    let timeline = chatreel::schedule(&job.turns, &job.timing)?;
    let desc = timeline
        .frame(chatreel::FrameIndex(args.frame))
        .with_context(|| {
            format!(
                "frame {} is out of range (timeline has {} frames)",
                args.frame,
                timeline.len()
            )
        })?;

    let mut cfg = chatreel::RenderConfig {
        font_path: args.font,
        ..chatreel::RenderConfig::default()
    };
    if !job.counterparty_name.trim().is_empty() {
        cfg.counterparty_name = job.counterparty_name.clone();
    }
    let font = chatreel::pipeline::job::resolve_font(cfg.font_path.as_deref())?;
    let avatar = match &job.avatar {
        Some(src) => chatreel::assets::decode::load_avatar(src)
            .inspect_err(|e| tracing::warn!("avatar skipped: {e}"))
            .ok(),
        None => None,
    };
    let mut compositor =
        chatreel::Compositor::new(&cfg, &chatreel::CompositorAssets { font, avatar })?;
    let frame = compositor.render(desc)?;

    let mut rgba = vec![0u8; frame.data.len()];
    flatten_to_opaque_rgba8(
        &mut rgba,
        &frame.data,
        frame.premultiplied,
        cfg.palette.background,
    )?;

    if let Some(parent) = args.out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    image::save_buffer_with_format(
        &args.out,
        &rgba,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_timeline(args: TimelineArgs) -> anyhow::Result<()> {
    let job = load_job(&args.in_path)?;
    let timeline = chatreel::schedule(&job.turns, &job.timing)?;
    println!("{}", serde_json::to_string_pretty(&timeline.summary())?);
    Ok(())
}

fn cmd_tones(args: TonesArgs) -> anyhow::Result<()> {
    let paths = chatreel::ToneCache::new(&args.tone_cache, args.sample_rate).ensure()?;
    println!("{}", paths.send.display());
    println!("{}", paths.receive.display());
    Ok(())
}
