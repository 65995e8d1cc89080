//! Combine command
//!
//! Pointwise combination of two inputs of identical geometry.

use crate::{CombineArgs, CombineMode};
use anyhow::Result;
use pixop_ops::{Op, UnaryFn};
use tracing::{info, trace};

fn build_op(mode: CombineMode) -> Op {
    let (a, b) = (Op::source(0), Op::source(1));
    match mode {
        CombineMode::Blend => Op::blend(),
        CombineMode::Min => Op::min(),
        CombineMode::Max => Op::max(),
        CombineMode::Add => a + b,
        CombineMode::Sub => a - b,
        CombineMode::Mul => a * b,
        CombineMode::Diff => (a - b).map(UnaryFn::Abs),
    }
}

pub fn run(args: CombineArgs, verbose: u8) -> Result<()> {
    trace!(a = %args.a.display(), b = %args.b.display(), mode = ?args.mode, "combine::run");
    let sources = vec![
        super::load_source(&args.a, &args.raw)?,
        super::load_source(&args.b, &args.raw)?,
    ];

    info!(mode = ?args.mode, "Combining");
    if verbose > 0 {
        println!(
            "Combining {} and {} ({:?})",
            args.a.display(),
            args.b.display(),
            args.mode
        );
    }

    super::eval_and_save(
        &build_op(args.mode),
        &sources,
        &args.raw,
        &args.out,
        (args.raw.width, args.raw.height),
        args.raw.color,
    )
}
