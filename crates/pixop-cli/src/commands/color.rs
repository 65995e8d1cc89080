//! Gray, colorize and colorspace commands

use crate::{ColorizeArgs, ColorspaceArgs, Conversion, PointArgs};
use anyhow::Result;
use pixop_core::Color;
use pixop_ops::Op;
use tracing::{info, trace};

pub fn run_gray(args: PointArgs, verbose: u8) -> Result<()> {
    trace!(input = %args.input.display(), "gray::run");
    let source = super::load_source(&args.input, &args.raw)?;
    if verbose > 0 {
        println!("Rec.709 luma of {}", args.input.display());
    }
    super::eval_and_save(
        &Op::grayscale(),
        &[source],
        &args.raw,
        &args.out,
        (args.raw.width, args.raw.height),
        Color::GRAY,
    )
}

pub fn run_colorize(args: ColorizeArgs, verbose: u8) -> Result<()> {
    let point = &args.point;
    trace!(input = %point.input.display(), to = %args.to_color, "colorize::run");
    let source = super::load_source(&point.input, &point.raw)?;
    if verbose > 0 {
        println!("Broadcasting {} to {}", point.input.display(), args.to_color);
    }
    super::eval_and_save(
        &Op::color(),
        &[source],
        &point.raw,
        &point.out,
        (point.raw.width, point.raw.height),
        args.to_color,
    )
}

pub fn run_colorspace(args: ColorspaceArgs, verbose: u8) -> Result<()> {
    let point = &args.point;
    trace!(input = %point.input.display(), conversion = ?args.conversion, "colorspace::run");

    let input_color = point.raw.color;
    let alpha = input_color.has_alpha();
    let (op, model, with_alpha) = match args.conversion {
        Conversion::RgbToXyz => (Op::rgb_to_xyz(), Color::XYZ, Color::XYZA),
        Conversion::XyzToRgb => (Op::xyz_to_rgb()?, Color::RGB, Color::RGBA),
        Conversion::RgbToYuv => (Op::rgb_to_yuv(), Color::YUV, Color::YUVA),
        Conversion::YuvToRgb => (Op::yuv_to_rgb()?, Color::RGB, Color::RGBA),
    };
    // alpha stays after the converted triple
    let color = match (input_color.channels(), alpha) {
        (3, false) => model,
        (4, true) => with_alpha,
        _ => Color::custom(input_color.channels(), alpha)?,
    };

    info!(conversion = ?args.conversion, %color, "Converting color model");
    let source = super::load_source(&point.input, &point.raw)?;
    if verbose > 0 {
        println!("{:?}: {} -> {}", args.conversion, input_color, color);
    }
    super::eval_and_save(
        &op,
        &[source],
        &point.raw,
        &point.out,
        (point.raw.width, point.raw.height),
        color,
    )
}
