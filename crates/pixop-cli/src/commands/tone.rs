//! Invert, threshold and brightness commands

use crate::{BrightnessArgs, PointArgs, ThresholdArgs};
use anyhow::{bail, Result};
use pixop_ops::Op;
use tracing::{info, trace};

fn run_point(op: Op, args: &PointArgs, verbose: u8, what: &str) -> Result<()> {
    let source = super::load_source(&args.input, &args.raw)?;
    info!(op = what, "Applying");
    if verbose > 0 {
        println!("Applying {what} to {}", args.input.display());
    }
    super::eval_and_save(
        &op,
        &[source],
        &args.raw,
        &args.out,
        (args.raw.width, args.raw.height),
        args.raw.color,
    )
}

pub fn run_invert(args: PointArgs, verbose: u8) -> Result<()> {
    trace!(input = %args.input.display(), "invert::run");
    run_point(Op::invert(), &args, verbose, "invert")
}

pub fn run_threshold(args: ThresholdArgs, verbose: u8) -> Result<()> {
    trace!(input = %args.point.input.display(), values = ?args.values, "threshold::run");
    let channels = args.point.raw.color.channels();
    if args.values.len() != channels {
        bail!(
            "{} thresholds given for a {}-channel image",
            args.values.len(),
            channels
        );
    }
    run_point(Op::threshold(args.values), &args.point, verbose, "threshold")
}

pub fn run_brightness(args: BrightnessArgs, verbose: u8) -> Result<()> {
    trace!(input = %args.point.input.display(), factor = args.factor, "brightness::run");
    run_point(Op::brightness(args.factor), &args.point, verbose, "brightness")
}
