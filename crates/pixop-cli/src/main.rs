//! pixop - raw image processing from the command line
//!
//! Inputs and outputs are headerless sample files: the element sequence of
//! an image, nothing else. Geometry, kind, color and layout are given on
//! the command line.

use anyhow::Result;
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use pixop_core::{Color, KindId, Layout};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Runs `$body` with `$k` bound to the element type named by a [`KindId`].
macro_rules! with_kind {
    ($kind:expr, $k:ident => $body:expr) => {
        match $kind {
            ::pixop_core::KindId::U8 => {
                type $k = u8;
                $body
            }
            ::pixop_core::KindId::U16 => {
                type $k = u16;
                $body
            }
            ::pixop_core::KindId::I32 => {
                type $k = i32;
                $body
            }
            ::pixop_core::KindId::I64 => {
                type $k = i64;
                $body
            }
            ::pixop_core::KindId::F16 => {
                type $k = ::pixop_core::f16;
                $body
            }
            ::pixop_core::KindId::F32 => {
                type $k = f32;
                $body
            }
            ::pixop_core::KindId::F64 => {
                type $k = f64;
                $body
            }
            ::pixop_core::KindId::Complex32 => {
                type $k = ::pixop_core::Complex32;
                $body
            }
            ::pixop_core::KindId::Complex64 => {
                type $k = ::pixop_core::Complex64;
                $body
            }
        }
    };
}

mod commands;
mod raw;

#[derive(Parser)]
#[command(name = "pixop")]
#[command(author, version, about = "Raw image processing with a lazy pixel-operation engine")]
#[command(long_about = "
Processes headerless raw sample files. Every input needs its geometry:
width, height, element kind, color model and layout.

Examples:
  pixop info plate.raw --width 640 --height 480 --kind u8 --color rgb
  pixop convert plate.raw --width 640 --height 480 -o plate.f32 --to-kind f32
  pixop filter plate.raw --width 640 --height 480 -o soft.raw -K gaussian -r 2
  pixop sobel plate.raw --width 640 --height 480 --color gray -o edges.raw
  pixop combine a.raw b.raw --width 640 --height 480 -o mix.raw -m blend
  pixop gray plate.raw --width 640 --height 480 -o luma.raw
  pixop rotate plate.raw --width 640 --height 480 -o turned.raw -a 90
  pixop frames clip.raw --width 320 --height 240 --op invert -o out.raw
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Show geometry and per-channel averages
    #[command(visible_alias = "i")]
    Info(InfoArgs),

    /// Change element kind, scale or layout
    #[command(visible_alias = "c")]
    Convert(ConvertArgs),

    /// Convolve with a built-in kernel
    Filter(FilterArgs),

    /// Sobel gradient magnitude
    Sobel(PointArgs),

    /// Combine two images pointwise
    Combine(CombineArgs),

    /// Luma of an RGB(A) image into a gray image
    Gray(PointArgs),

    /// Broadcast a gray image into a multi-channel one
    Colorize(ColorizeArgs),

    /// Invert against the output kind's maximum
    Invert(PointArgs),

    /// Per-channel threshold
    Threshold(ThresholdArgs),

    /// Scale values towards the kind minimum
    Brightness(BrightnessArgs),

    /// Linear color model conversion
    Colorspace(ColorspaceArgs),

    /// Lossless quarter-turn rotation
    Rotate(RotateArgs),

    /// Affine resampling
    Transform(TransformArgs),

    /// Cut out a rectangle
    Crop(CropArgs),

    /// Apply an operation to every frame of a raw sequence
    Frames(FramesArgs),
}

/// Geometry of a headerless input file.
#[derive(Args, Clone, Debug)]
struct RawSpec {
    /// Width in pixels
    #[arg(long)]
    width: usize,

    /// Height in pixels
    #[arg(long)]
    height: usize,

    /// Element kind: u8, u16, i32, i64, f16, f32, f64, complex32, complex64
    #[arg(short = 'k', long, default_value = "u8")]
    kind: KindId,

    /// Color model: gray, rgb, rgba, xyz[a], yuv[a], customN[a]
    #[arg(short = 'c', long, default_value = "rgb")]
    color: Color,

    /// Sample layout: interleaved, planar
    #[arg(short = 'l', long, default_value = "interleaved")]
    layout: Layout,
}

/// Where and how to write the result.
#[derive(Args, Clone, Debug)]
struct OutputSpec {
    /// Output file
    #[arg(short, long)]
    output: PathBuf,

    /// Output kind (defaults to the input kind)
    #[arg(long)]
    out_kind: Option<KindId>,

    /// Output layout (defaults to the input layout)
    #[arg(long)]
    out_layout: Option<Layout>,
}

#[derive(Args)]
struct InfoArgs {
    /// Input file
    input: PathBuf,

    #[command(flatten)]
    raw: RawSpec,
}

#[derive(Args)]
struct ConvertArgs {
    /// Input file
    input: PathBuf,

    #[command(flatten)]
    raw: RawSpec,

    /// Output file
    #[arg(short, long)]
    output: PathBuf,

    /// Target element kind
    #[arg(short = 't', long)]
    to_kind: Option<KindId>,

    /// Target layout
    #[arg(long)]
    to_layout: Option<Layout>,

    /// Multiply normalized values by this factor
    #[arg(short, long)]
    scale: Option<f64>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum KernelKind {
    Box,
    Gaussian,
    Sharpen,
    Laplacian,
    SobelX,
    SobelY,
}

#[derive(Args)]
struct FilterArgs {
    /// Input file
    input: PathBuf,

    #[command(flatten)]
    raw: RawSpec,

    /// Output file
    #[arg(short, long)]
    output: PathBuf,

    /// Kernel to convolve with
    #[arg(short = 'K', long, value_enum, default_value = "gaussian")]
    kernel: KernelKind,

    /// Kernel radius for box and gaussian
    #[arg(short, long, default_value = "1")]
    radius: usize,

    /// Gaussian standard deviation (defaults to radius / 2, at least 0.5)
    #[arg(long)]
    std: Option<f64>,

    /// Sharpen strength
    #[arg(long, default_value = "1.0")]
    amount: f64,

    /// Divide the kernel by its sum first
    #[arg(long)]
    normalize: bool,
}

#[derive(Args)]
struct PointArgs {
    /// Input file
    input: PathBuf,

    #[command(flatten)]
    raw: RawSpec,

    #[command(flatten)]
    out: OutputSpec,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CombineMode {
    Blend,
    Min,
    Max,
    Add,
    Sub,
    Mul,
    Diff,
}

#[derive(Args)]
struct CombineArgs {
    /// First input
    a: PathBuf,

    /// Second input (same geometry as the first)
    b: PathBuf,

    #[command(flatten)]
    raw: RawSpec,

    #[command(flatten)]
    out: OutputSpec,

    /// How to combine the two inputs
    #[arg(short, long, value_enum, default_value = "blend")]
    mode: CombineMode,
}

#[derive(Args)]
struct ColorizeArgs {
    #[command(flatten)]
    point: PointArgs,

    /// Output color model
    #[arg(long, default_value = "rgb")]
    to_color: Color,
}

#[derive(Args)]
struct ThresholdArgs {
    #[command(flatten)]
    point: PointArgs,

    /// One threshold per channel, comma separated
    #[arg(long, value_delimiter = ',', required = true, allow_hyphen_values = true)]
    values: Vec<f64>,
}

#[derive(Args)]
struct BrightnessArgs {
    #[command(flatten)]
    point: PointArgs,

    /// Scale factor (1.0 = unchanged, 0.0 = kind minimum)
    #[arg(short, long)]
    factor: f64,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Conversion {
    RgbToXyz,
    XyzToRgb,
    RgbToYuv,
    YuvToRgb,
}

#[derive(Args)]
struct ColorspaceArgs {
    #[command(flatten)]
    point: PointArgs,

    /// Conversion to apply
    #[arg(short = 'C', long, value_enum)]
    conversion: Conversion,
}

#[derive(Args)]
struct RotateArgs {
    /// Input file
    input: PathBuf,

    #[command(flatten)]
    raw: RawSpec,

    /// Output file
    #[arg(short, long)]
    output: PathBuf,

    /// Clockwise angle: 90, 180 or 270
    #[arg(short, long)]
    angle: u32,
}

#[derive(Args)]
struct TransformArgs {
    #[command(flatten)]
    point: PointArgs,

    /// Scale as sx,sy (applied first)
    #[arg(long, value_delimiter = ',')]
    scale: Option<Vec<f64>>,

    /// Rotation in degrees about the origin (applied second)
    #[arg(long, allow_hyphen_values = true)]
    rotate: Option<f64>,

    /// Translation as tx,ty (applied last)
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    translate: Option<Vec<f64>>,

    /// Output width (defaults to the input width)
    #[arg(long)]
    out_width: Option<usize>,

    /// Output height (defaults to the input height)
    #[arg(long)]
    out_height: Option<usize>,
}

#[derive(Args)]
struct CropArgs {
    /// Input file
    input: PathBuf,

    #[command(flatten)]
    raw: RawSpec,

    /// Output file
    #[arg(short, long)]
    output: PathBuf,

    /// Rectangle as x,y,width,height
    #[arg(long, value_delimiter = ',', required = true)]
    rect: Vec<usize>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FrameOp {
    Copy,
    Invert,
    Sobel,
    Blur,
}

#[derive(Args)]
struct FramesArgs {
    /// Input sequence (frames concatenated back to back)
    input: PathBuf,

    #[command(flatten)]
    raw: RawSpec,

    /// Output sequence; frames are only summarized when omitted
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Operation applied to each frame
    #[arg(long, value_enum, default_value = "copy")]
    op: FrameOp,
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Info(args) => commands::info::run(args, cli.verbose),
        Commands::Convert(args) => commands::convert::run(args, cli.verbose),
        Commands::Filter(args) => commands::filter::run(args, cli.verbose),
        Commands::Sobel(args) => commands::filter::run_sobel(args, cli.verbose),
        Commands::Combine(args) => commands::combine::run(args, cli.verbose),
        Commands::Gray(args) => commands::color::run_gray(args, cli.verbose),
        Commands::Colorize(args) => commands::color::run_colorize(args, cli.verbose),
        Commands::Invert(args) => commands::tone::run_invert(args, cli.verbose),
        Commands::Threshold(args) => commands::tone::run_threshold(args, cli.verbose),
        Commands::Brightness(args) => commands::tone::run_brightness(args, cli.verbose),
        Commands::Colorspace(args) => commands::color::run_colorspace(args, cli.verbose),
        Commands::Rotate(args) => commands::geometry::run_rotate(args, cli.verbose),
        Commands::Transform(args) => commands::geometry::run_transform(args, cli.verbose),
        Commands::Crop(args) => commands::geometry::run_crop(args, cli.verbose),
        Commands::Frames(args) => commands::frames::run(args, cli.verbose),
    }
}
