use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand, ValueEnum};
use glam::DVec3;
use indicatif::{ProgressBar, ProgressStyle};

use campath::{
    AnalyticScene, CameraModel, CameraPathDef, CampathError, Colormap, ColormapOptions,
    DriverOpts, FocalPolicy, FrameIndex, ImageEncoding, Intrinsics, MissingChannelPolicy, Pose,
    ProgressEvent, ProgressObserver, RenderSummary, SinkKind, SpiralOpts, Trajectory,
    TrajectoryOpts, VideoSinkOpts,
};

#[derive(Parser, Debug)]
#[command(name = "campath", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render every frame of a camera path to an MP4 (requires `ffmpeg`) or an image directory.
    Render(RenderArgs),
    /// Render one frame of a camera path as a PNG.
    Frame(FrameArgs),
    /// Render a spiral orbit around a base camera.
    Spiral(SpiralArgs),
    /// Print what a camera path file describes.
    Inspect(InspectArgs),
}

#[derive(Args, Debug)]
struct PathArgs {
    /// Input camera path JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    #[command(flatten)]
    focal: FocalArgs,
}

#[derive(Args, Debug)]
struct FocalArgs {
    /// Fixed focal length in pixels (perspective and fisheye).
    #[arg(long, default_value_t = campath::DEFAULT_FOCAL_PX)]
    focal: f64,

    /// Derive focal length from each keyframe's `fov` instead of `--focal`.
    #[arg(long, default_value_t = false)]
    use_fov: bool,

    /// Vertical field of view (degrees) for keyframes without `fov` when `--use-fov` is set.
    #[arg(long, default_value_t = 50.0)]
    fallback_fov: f64,

    /// Scale output resolution and intrinsics.
    #[arg(long, default_value_t = 1.0)]
    resolution_scale: f64,
}

impl FocalArgs {
    fn trajectory_opts(&self) -> TrajectoryOpts {
        let focal = if self.use_fov {
            FocalPolicy::PerFrameFov {
                fallback_fov_deg: self.fallback_fov,
            }
        } else {
            FocalPolicy::Fixed(self.focal)
        };
        TrajectoryOpts {
            focal,
            resolution_scale: self.resolution_scale,
        }
    }
}

impl PathArgs {
    fn load(&self) -> anyhow::Result<(CameraPathDef, Trajectory)> {
        let def = CameraPathDef::from_path(&self.in_path)?;
        let traj = campath::build_trajectory(&def, &self.focal.trajectory_opts())
            .with_context(|| format!("build trajectory from '{}'", self.in_path.display()))?;
        Ok((def, traj))
    }
}

#[derive(Args, Debug)]
struct CompositeArgs {
    /// Output channels to place side by side, in order.
    #[arg(long, value_delimiter = ',', default_value = "rgb")]
    channels: Vec<String>,

    /// Colormap for channel values.
    #[arg(long, value_enum, default_value_t = ColormapArg::Default)]
    colormap: ColormapArg,

    /// Rescale single-channel outputs by their own min/max.
    #[arg(long, default_value_t = false)]
    normalize: bool,

    /// Lower bound mapped to 0 (requires `--range-max`).
    #[arg(long, requires = "range_max")]
    range_min: Option<f32>,

    /// Upper bound mapped to 1 (requires `--range-min`).
    #[arg(long, requires = "range_min")]
    range_max: Option<f32>,

    /// Invert single-channel values after rescaling.
    #[arg(long, default_value_t = false)]
    invert: bool,

    /// What to do when a requested channel is not produced.
    #[arg(long, value_enum, default_value_t = MissingChannelArg::Skip)]
    missing_channel: MissingChannelArg,

    /// Ignore the crop box stored in the camera path.
    #[arg(long, default_value_t = false)]
    no_crop: bool,
}

impl CompositeArgs {
    fn colormap_opts(&self) -> ColormapOptions {
        ColormapOptions {
            colormap: self.colormap.into(),
            normalize: self.normalize,
            range: self.range_min.zip(self.range_max),
            invert: self.invert,
            ..ColormapOptions::default()
        }
    }

    fn driver_opts(&self, def: Option<&CameraPathDef>, seconds: f64) -> DriverOpts {
        DriverOpts {
            channels: self.channels.clone(),
            colormap: self.colormap_opts(),
            missing_channel: self.missing_channel.into(),
            seconds,
            crop: if self.no_crop {
                None
            } else {
                def.and_then(CameraPathDef::crop_spec)
            },
            cancel: None,
        }
    }
}

#[derive(Args, Debug)]
struct OutputArgs {
    /// Output MP4 file, or directory for `--format images`.
    #[arg(long)]
    out: PathBuf,

    /// Output kind.
    #[arg(long, value_enum, default_value_t = OutputFormat::Video)]
    format: OutputFormat,

    /// Image file type for `--format images`.
    #[arg(long, value_enum, default_value_t = ImageFormatArg::Png)]
    image_format: ImageFormatArg,

    /// JPEG quality (1-100) for `--image-format jpeg`.
    #[arg(long, default_value_t = 95)]
    jpeg_quality: u8,

    /// x264 constant rate factor for `--format video`.
    #[arg(long, default_value_t = 18)]
    crf: u8,

    /// Fail instead of replacing an existing MP4.
    #[arg(long, default_value_t = false)]
    no_overwrite: bool,
}

impl OutputArgs {
    fn sink_kind(&self) -> SinkKind {
        match self.format {
            OutputFormat::Video => SinkKind::Video(VideoSinkOpts {
                overwrite: !self.no_overwrite,
                crf: self.crf,
                ..VideoSinkOpts::new(&self.out)
            }),
            OutputFormat::Images => SinkKind::Images {
                dir: self.out.clone(),
                encoding: match self.image_format {
                    ImageFormatArg::Png => ImageEncoding::Png,
                    ImageFormatArg::Jpeg => ImageEncoding::Jpeg {
                        quality: self.jpeg_quality,
                    },
                },
            },
        }
    }
}

#[derive(Parser, Debug)]
struct RenderArgs {
    #[command(flatten)]
    path: PathArgs,
    #[command(flatten)]
    composite: CompositeArgs,
    #[command(flatten)]
    output: OutputArgs,

    /// Output duration in seconds; overrides `seconds` from the camera path.
    #[arg(long)]
    seconds: Option<f64>,

    /// Hide the progress bar.
    #[arg(long, default_value_t = false)]
    quiet: bool,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    #[command(flatten)]
    path: PathArgs,
    #[command(flatten)]
    composite: CompositeArgs,

    /// Frame index (0-based).
    #[arg(long, default_value_t = 0)]
    frame: u64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct SpiralArgs {
    /// Camera path whose first keyframe is the base camera. Without it a default view of the
    /// built-in scene is used.
    #[arg(long = "in")]
    in_path: Option<PathBuf>,

    // With `--in` these shape the base camera like `render` does; without it only `--focal` applies.
    #[command(flatten)]
    focal: FocalArgs,
    #[command(flatten)]
    composite: CompositeArgs,
    #[command(flatten)]
    output: OutputArgs,

    /// Frame width without `--in`.
    #[arg(long, default_value_t = 640)]
    width: u32,

    /// Frame height without `--in`.
    #[arg(long, default_value_t = 480)]
    height: u32,

    /// Number of frames.
    #[arg(long, default_value_t = 30)]
    steps: usize,

    /// Orbit radius.
    #[arg(long, default_value_t = 0.1)]
    radius: f64,

    /// Revolutions over the path.
    #[arg(long, default_value_t = 2.0)]
    rotations: f64,

    /// Depth oscillation rate.
    #[arg(long, default_value_t = 0.5)]
    zrate: f64,

    /// Distance to the look-at point in front of the base camera.
    #[arg(long, default_value_t = 1.0)]
    focus_distance: f64,

    /// Output duration in seconds.
    #[arg(long, default_value_t = 4.0)]
    seconds: f64,

    /// Hide the progress bar.
    #[arg(long, default_value_t = false)]
    quiet: bool,
}

#[derive(Parser, Debug)]
struct InspectArgs {
    #[command(flatten)]
    path: PathArgs,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ColormapArg {
    Default,
    Gray,
    Turbo,
    Inferno,
}

impl From<ColormapArg> for Colormap {
    fn from(v: ColormapArg) -> Self {
        match v {
            ColormapArg::Default => Colormap::Default,
            ColormapArg::Gray => Colormap::Gray,
            ColormapArg::Turbo => Colormap::Turbo,
            ColormapArg::Inferno => Colormap::Inferno,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum MissingChannelArg {
    Skip,
    Fail,
}

impl From<MissingChannelArg> for MissingChannelPolicy {
    fn from(v: MissingChannelArg) -> Self {
        match v {
            MissingChannelArg::Skip => MissingChannelPolicy::Skip,
            MissingChannelArg::Fail => MissingChannelPolicy::Fail,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Video,
    Images,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ImageFormatArg {
    Png,
    Jpeg,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Frame(args) => cmd_frame(args),
        Command::Spiral(args) => cmd_spiral(args),
        Command::Inspect(args) => cmd_inspect(args),
    }
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let (def, traj) = args.path.load()?;
    let seconds = args.seconds.or(def.seconds).ok_or_else(|| {
        CampathError::malformed(
            "duration unknown: pass --seconds or set `seconds` in the camera path",
        )
    })?;
    let opts = args.composite.driver_opts(Some(&def), seconds);
    run(&traj, opts, &args.output, args.quiet)
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let (def, traj) = args.path.load()?;
    let opts = args.composite.driver_opts(Some(&def), def.seconds.unwrap_or(1.0));
    let mut scene = AnalyticScene::default();
    let composited =
        campath::render_single_frame(&traj, FrameIndex(args.frame), &mut scene, &opts)?;
    for name in &composited.missing {
        eprintln!("warning: channel '{name}' not produced; skipped");
    }

    campath::encode::ffmpeg::ensure_parent_dir(&args.out)?;
    let frame = composited.frame;
    image::save_buffer_with_format(
        &args.out,
        frame.data(),
        frame.width(),
        frame.height(),
        image::ColorType::Rgb8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_spiral(args: SpiralArgs) -> anyhow::Result<()> {
    let (base, intrinsics, model, def) = match &args.in_path {
        Some(path) => {
            let def = CameraPathDef::from_path(path)?;
            let traj = campath::build_trajectory(&def, &args.focal.trajectory_opts())
                .with_context(|| format!("build trajectory from '{}'", path.display()))?;
            let view = traj
                .view(0)
                .context("camera path has no keyframes")?;
            (view.pose, view.intrinsics, view.model, Some(def))
        }
        None => (
            Pose::look_at(
                DVec3::new(0.0, 1.2, 4.0),
                DVec3::new(0.0, 0.4, 0.0),
                DVec3::Y,
            ),
            Intrinsics::centered(
                args.width,
                args.height,
                args.focal.focal,
                args.focal.focal,
            ),
            CameraModel::Perspective,
            None,
        ),
    };

    let spiral = SpiralOpts {
        steps: args.steps,
        radius: args.radius,
        rotations: args.rotations,
        zrate: args.zrate,
        focus_distance: args.focus_distance,
    };
    let traj = campath::spiral_trajectory(base, intrinsics, model, &spiral)?;
    let opts = args.composite.driver_opts(def.as_ref(), args.seconds);
    run(&traj, opts, &args.output, args.quiet)
}

fn cmd_inspect(args: InspectArgs) -> anyhow::Result<()> {
    let (def, traj) = args.path.load()?;
    let k = traj
        .intrinsics_at(0)
        .context("camera path has no keyframes")?;

    println!("file:        {}", args.path.in_path.display());
    println!("frames:      {}", traj.len());
    println!("resolution:  {}x{}", k.width, k.height);
    println!("camera:      {:?}", traj.model());
    println!("focal:       fx={:.3} fy={:.3}", k.fx, k.fy);
    println!(
        "timestamps:  {}",
        if traj.timestamps().is_some() { "yes" } else { "no" }
    );
    match def.seconds {
        Some(s) => {
            let rate = campath::FrameRate::from_duration(traj.len() as u64, s)?;
            println!("duration:    {s}s ({rate} fps)");
        }
        None => println!("duration:    unset"),
    }
    match def.crop_spec() {
        Some(c) => println!(
            "crop:        center={:?} scale={:?} bg={:?}",
            c.center.to_array(),
            c.scale.to_array(),
            c.background
        ),
        None => println!("crop:        none"),
    }
    Ok(())
}

fn run(
    traj: &Trajectory,
    mut opts: DriverOpts,
    output: &OutputArgs,
    quiet: bool,
) -> anyhow::Result<()> {
    let cancel = Arc::new(AtomicBool::new(false));
    ctrlc::set_handler({
        let cancel = cancel.clone();
        move || {
            eprintln!("received Ctrl-C, finishing the output...");
            cancel.store(true, Ordering::SeqCst);
        }
    })
    .context("install Ctrl-C handler")?;
    opts.cancel = Some(cancel);

    let mut scene = AnalyticScene::default();
    let mut sink = campath::create_sink(output.sink_kind());
    let mut observer = BarObserver::new(traj.len() as u64, quiet)?;

    let summary =
        campath::render_trajectory(traj, &mut scene, sink.as_mut(), opts, &mut observer)?;

    if summary.frames_with_missing_channels > 0 {
        eprintln!(
            "warning: {} frame(s) were missing requested channels",
            summary.frames_with_missing_channels
        );
    }
    eprintln!("wrote {}", summary.location.display());
    Ok(())
}

/// Terminal progress bar.
struct BarObserver {
    pb: ProgressBar,
}

impl BarObserver {
    fn new(total: u64, quiet: bool) -> anyhow::Result<Self> {
        let pb = if quiet {
            ProgressBar::hidden()
        } else {
            ProgressBar::new(total)
        };
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>7}/{len:7} ({eta}) {msg} {per_sec}",
                )?
                .progress_chars("##>-"),
        );
        Ok(Self { pb })
    }
}

impl ProgressObserver for BarObserver {
    fn report_progress(&mut self, event: &ProgressEvent) {
        self.pb.set_position(event.frames_done);
    }

    fn report_error(&mut self, error: &CampathError) {
        if error.is_soft() {
            self.pb.println(format!("warning: {error}"));
        } else {
            self.pb.abandon_with_message(format!("failed: {error}"));
        }
    }

    fn report_summary(&mut self, summary: &RenderSummary) {
        self.pb.finish_with_message(format!(
            "{} frames @ {} fps",
            summary.frames_written, summary.frame_rate
        ));
    }
}
