use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use diffusion_reel::{
    BackendKind, FfmpegSink, FfmpegSinkOpts, FontBook, FontWeight, FrameIndex, FrameRange,
    MonospaceMetrics, ParleyShaper, PngSequenceSink, ReelConfig, RenderSettings, RenderThreading,
    build_explainer, create_backend,
};

#[derive(Parser, Debug)]
#[command(name = "diffusion-reel", version)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Args, Debug)]
struct GlobalArgs {
    /// Configuration JSON (defaults apply to every missing field).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Seed for the procedural latents and embedding numbers.
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Print the resolved text faces (family name + SHA-256 of font bytes).
    #[arg(long, global = true)]
    dump_fonts: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render the explainer video as MP4 (requires `ffmpeg` on PATH) or a PNG sequence.
    Render(RenderArgs),
    /// Render a single frame as a PNG.
    Frame(FrameArgs),
    /// Print the timeline schedule as JSON.
    Timeline(TimelineArgs),
    /// Write the noise, target and midpoint latents as PNGs.
    Latents(LatentsArgs),
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// Output MP4 path.
    #[arg(long, default_value = "media/videos/diffusion_explainer.mp4")]
    out: PathBuf,

    /// Write numbered PNG frames into this directory instead of an MP4.
    #[arg(long)]
    png_dir: Option<PathBuf>,

    /// Overwrite output if it already exists.
    #[arg(long, default_value_t = false)]
    overwrite: bool,

    /// First frame to render (inclusive).
    #[arg(long)]
    start: Option<u64>,

    /// Last frame to render (exclusive).
    #[arg(long)]
    end: Option<u64>,

    /// Enable frame-level parallelism.
    #[arg(long, default_value_t = false)]
    parallel: bool,

    /// Override rayon worker threads (parallel mode only).
    #[arg(long)]
    threads: Option<usize>,

    /// Render chunk size.
    #[arg(long, default_value_t = 64)]
    chunk_size: usize,

    /// Enable static-frame elision within chunks (parallel mode only).
    #[arg(long, default_value_t = false)]
    static_frame_elision: bool,
}

#[derive(Args, Debug)]
struct FrameArgs {
    /// Frame index (0-based).
    #[arg(long)]
    frame: u64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Leave the background transparent.
    #[arg(long, default_value_t = false)]
    transparent: bool,
}

#[derive(Args, Debug)]
struct TimelineArgs {
    /// Write the JSON here instead of stdout.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct LatentsArgs {
    /// Output directory.
    #[arg(long)]
    out_dir: PathBuf,

    /// Latent side length in pixels (overrides the configuration).
    #[arg(long)]
    size: Option<u32>,

    /// Integer nearest-neighbour upscale applied to the written PNGs.
    #[arg(long, default_value_t = 8)]
    scale: u32,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.global.verbose);
    match cli.cmd {
        Command::Render(args) => cmd_render(&cli.global, args),
        Command::Frame(args) => cmd_frame(&cli.global, args),
        Command::Timeline(args) => cmd_timeline(&cli.global, args),
        Command::Latents(args) => cmd_latents(&cli.global, args),
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .with_target(false)
        .try_init();
}

fn load_config(global: &GlobalArgs) -> anyhow::Result<ReelConfig> {
    let mut cfg = match &global.config {
        Some(path) => ReelConfig::from_json_file(path)
            .with_context(|| format!("load config '{}'", path.display()))?,
        None => ReelConfig::default(),
    };
    if global.seed.is_some() {
        cfg.seed = global.seed;
    }
    cfg.validate()?;
    Ok(cfg)
}

fn load_shaper(cfg: &ReelConfig, dump_fonts: bool) -> anyhow::Result<ParleyShaper> {
    let book = FontBook::load(&cfg.fonts.font_dirs, cfg.fonts.system_fonts);
    if dump_fonts {
        dump_font_diagnostics(&book, &cfg.fonts.family)?;
    }
    let shaper = ParleyShaper::new(&book, &cfg.fonts.family)
        .with_context(|| format!("resolve font family '{}'", cfg.fonts.family))?;
    Ok(shaper)
}

fn cmd_render(global: &GlobalArgs, args: RenderArgs) -> anyhow::Result<()> {
    let cfg = load_config(global)?;
    let mut shaper = load_shaper(&cfg, global.dump_fonts)?;
    let explainer = build_explainer(&cfg, &mut shaper)?;
    let timeline = &explainer.timeline;
    eprintln!(
        "seed {}, {} frames at {} fps",
        explainer.seed,
        timeline.total_frames(),
        timeline.fps.as_f64()
    );

    let range = FrameRange::new(
        FrameIndex(args.start.unwrap_or(0)),
        FrameIndex(args.end.unwrap_or(timeline.total_frames())),
    )?;
    let threading = RenderThreading {
        parallel: args.parallel,
        chunk_size: args.chunk_size,
        threads: args.threads,
        static_frame_elision: args.static_frame_elision,
    };
    let mut backend = create_backend(BackendKind::Cpu, &RenderSettings::default())?;

    let (stats, written) = match &args.png_dir {
        Some(dir) => {
            let mut sink = PngSequenceSink::new(dir);
            let stats = diffusion_reel::render_range(
                timeline,
                range,
                backend.as_mut(),
                &mut sink,
                &threading,
            )?;
            (stats, dir.clone())
        }
        None => {
            let mut sink = FfmpegSink::new(FfmpegSinkOpts {
                out_path: args.out.clone(),
                overwrite: args.overwrite,
                background: cfg.palette.background,
            });
            let stats = diffusion_reel::render_range(
                timeline,
                range,
                backend.as_mut(),
                &mut sink,
                &threading,
            )?;
            (stats, args.out.clone())
        }
    };

    eprintln!(
        "wrote {} ({} frames, {} rendered, {} elided)",
        written.display(),
        stats.frames_total,
        stats.frames_rendered,
        stats.frames_elided
    );
    Ok(())
}

fn cmd_frame(global: &GlobalArgs, args: FrameArgs) -> anyhow::Result<()> {
    let cfg = load_config(global)?;
    let mut shaper = load_shaper(&cfg, global.dump_fonts)?;
    let explainer = build_explainer(&cfg, &mut shaper)?;

    let settings = RenderSettings {
        clear_rgba: args.transparent.then_some([0, 0, 0, 0]),
    };
    let mut backend = create_backend(BackendKind::Cpu, &settings)?;
    let frame = diffusion_reel::render_frame(
        &explainer.timeline,
        FrameIndex(args.frame),
        backend.as_mut(),
    )?;
    diffusion_reel::write_frame_png(&args.out, &frame)?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_timeline(global: &GlobalArgs, args: TimelineArgs) -> anyhow::Result<()> {
    let cfg = load_config(global)?;
    let explainer = if global.dump_fonts {
        let mut shaper = load_shaper(&cfg, true)?;
        build_explainer(&cfg, &mut shaper)?
    } else {
        // Schedule frame counts do not depend on glyph metrics.
        build_explainer(&cfg, &mut MonospaceMetrics)?
    };
    let json = explainer.timeline.schedule().to_json_pretty()?;

    match &args.out {
        Some(path) => {
            write_text(path, &json)?;
            eprintln!("wrote {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn cmd_latents(global: &GlobalArgs, args: LatentsArgs) -> anyhow::Result<()> {
    let mut cfg = load_config(global)?;
    if let Some(size) = args.size {
        cfg.latent_size = size;
    }
    // Metric-only shaping keeps the random draws identical to a full render with the same seed.
    let explainer = build_explainer(&cfg, &mut MonospaceMetrics)?;
    let latents = &explainer.latents;

    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("create output dir '{}'", args.out_dir.display()))?;
    let midpoint = latents.blend(0.5)?;
    for (name, grid) in [
        ("noise.png", &latents.noise),
        ("target.png", &latents.target),
        ("midpoint.png", &midpoint),
    ] {
        let path = args.out_dir.join(name);
        diffusion_reel::write_grid_png(&path, grid, args.scale)?;
        eprintln!("wrote {}", path.display());
    }
    eprintln!("seed {}", explainer.seed);
    Ok(())
}

fn write_text(path: &Path, text: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(path, text).with_context(|| format!("write '{}'", path.display()))?;
    Ok(())
}

fn dump_font_diagnostics(book: &FontBook, family: &str) -> anyhow::Result<()> {
    eprintln!("text font diagnostics:");
    eprintln!("  faces_loaded: {}", book.face_count());
    for (label, weight) in [("regular", FontWeight::Normal), ("bold", FontWeight::Bold)] {
        let face = book
            .resolve(family, weight)
            .with_context(|| format!("resolve {label} face for '{family}'"))?;
        eprintln!("  {label}:");
        eprintln!("    requested: {family}");
        eprintln!("    family:    {}", face.family);
        eprintln!("    index:     {}", face.index);
        eprintln!("    sha256:    {}", face.sha256_hex());
    }
    Ok(())
}
