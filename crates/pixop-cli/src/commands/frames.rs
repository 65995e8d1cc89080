//! Frames command
//!
//! Streams a raw frame sequence through one operation, printing the
//! per-frame average and optionally writing the processed sequence.

use crate::raw::RawFrames;
use crate::{FrameOp, FramesArgs};
use anyhow::{Context, Result};
use pixop_core::{FrameSource, Kernel};
use pixop_ops::Op;
use std::fs::File;
use std::io::{BufWriter, Write};
use tracing::{debug, trace};

fn build_op(op: FrameOp) -> Result<Op> {
    Ok(match op {
        FrameOp::Copy => Op::source(0),
        FrameOp::Invert => Op::invert(),
        FrameOp::Sobel => Op::sobel(),
        FrameOp::Blur => Op::filter(Kernel::gaussian(1, 0.8)?),
    })
}

pub fn run(args: FramesArgs, verbose: u8) -> Result<()> {
    trace!(input = %args.input.display(), op = ?args.op, "frames::run");
    let raw = &args.raw;
    let op = build_op(args.op)?;

    let mut writer = match &args.output {
        Some(path) => Some(BufWriter::new(
            File::create(path).with_context(|| format!("Failed to create: {}", path.display()))?,
        )),
        None => None,
    };

    let count = with_kind!(raw.kind, K => {
        let mut source = RawFrames::<K>::open(&args.input, raw.codec(), raw.color)
            .with_context(|| format!("Failed to open: {}", args.input.display()))?;
        for frame in source.frames() {
            let frame = frame.context("Failed to read frame")?;
            let mut out = frame.like();
            op.eval(&mut out, &[&frame])?;

            let avg = out.avg(None);
            debug!(avg = ?avg.as_slice(), "frame processed");
            if verbose > 0 {
                let values: Vec<String> = avg.as_slice().iter().map(|v| format!("{v:.4}")).collect();
                println!("frame: average [{}]", values.join(", "));
            }
            if let Some(w) = writer.as_mut() {
                w.write_all(out.data().as_bytes())?;
            }
        }
        source.index()
    });

    if let Some(mut w) = writer {
        w.flush()?;
    }
    println!("{count} frames");
    Ok(())
}
