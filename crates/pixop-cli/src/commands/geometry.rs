//! Rotate, transform and crop commands

use crate::{CropArgs, RotateArgs, TransformArgs};
use anyhow::{bail, Context, Result};
use pixop_core::Rect;
use pixop_math::Affine2;
use pixop_ops::Op;
use tracing::{info, trace};

pub fn run_rotate(args: RotateArgs, verbose: u8) -> Result<()> {
    trace!(input = %args.input.display(), angle = args.angle, "rotate::run");
    if ![90, 180, 270].contains(&args.angle) {
        bail!("Rotation must be 90, 180 or 270 degrees, got {}", args.angle);
    }
    if verbose > 0 {
        println!("Rotating {} by {} degrees", args.input.display(), args.angle);
    }

    with_kind!(args.raw.kind, K => {
        let image = super::load_image::<K>(&args.input, &args.raw)?;
        let rotated = match args.angle {
            90 => image.rotate_90(),
            180 => image.rotate_180(),
            _ => image.rotate_270(),
        };
        super::save_image(&args.output, &rotated)?;
    });
    Ok(())
}

fn pair(values: &Option<Vec<f64>>, name: &str) -> Result<Option<(f64, f64)>> {
    match values.as_deref() {
        None => Ok(None),
        Some([a, b]) => Ok(Some((*a, *b))),
        Some(other) => bail!("--{name} takes two values, got {}", other.len()),
    }
}

/// Builds the source-to-destination map: scale, then rotate, then translate.
fn build_affine(args: &TransformArgs) -> Result<Affine2> {
    let mut m = Affine2::IDENTITY;
    if let Some((sx, sy)) = pair(&args.scale, "scale")? {
        m = m.then(&Affine2::scale(sx, sy));
    }
    if let Some(degrees) = args.rotate {
        m = m.then(&Affine2::rotation(degrees.to_radians()));
    }
    if let Some((tx, ty)) = pair(&args.translate, "translate")? {
        m = m.then(&Affine2::translation(tx, ty));
    }
    Ok(m)
}

pub fn run_transform(args: TransformArgs, verbose: u8) -> Result<()> {
    let point = &args.point;
    trace!(input = %point.input.display(), "transform::run");

    let forward = build_affine(&args)?;
    let op = Op::transform(forward).context("Transform is not invertible")?;
    let width = args.out_width.unwrap_or(point.raw.width);
    let height = args.out_height.unwrap_or(point.raw.height);

    info!(rows = ?forward.to_rows(), width, height, "Resampling");
    if verbose > 0 {
        println!("Resampling {} into {width}x{height}", point.input.display());
    }

    let source = super::load_source(&point.input, &point.raw)?;
    super::eval_and_save(&op, &[source], &point.raw, &point.out, (width, height), point.raw.color)
}

pub fn run_crop(args: CropArgs, verbose: u8) -> Result<()> {
    trace!(input = %args.input.display(), rect = ?args.rect, "crop::run");
    let [x, y, width, height] = args.rect[..] else {
        bail!("--rect takes x,y,width,height");
    };
    let rect = Rect::new(x, y, width, height);
    if verbose > 0 {
        println!("Cropping {} to {rect:?}", args.input.display());
    }

    with_kind!(args.raw.kind, K => {
        let image = super::load_image::<K>(&args.input, &args.raw)?;
        let cropped = image.crop(rect).context("Crop rectangle outside the image")?;
        super::save_image(&args.output, &cropped)?;
    });
    Ok(())
}
