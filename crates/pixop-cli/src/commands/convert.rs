//! Convert command
//!
//! Changes element kind and/or layout, optionally scaling normalized values.

use crate::ConvertArgs;
use anyhow::{Context, Result};
use pixop_core::{Image, Kind};
use tracing::{info, trace};

pub fn run(args: ConvertArgs, verbose: u8) -> Result<()> {
    trace!(input = %args.input.display(), "convert::run");
    let raw = &args.raw;
    let to_kind = args.to_kind.unwrap_or(raw.kind);
    let to_layout = args.to_layout.unwrap_or(raw.layout);

    info!(from = %raw.kind, to = %to_kind, layout = %to_layout, scale = ?args.scale, "Converting");
    if verbose > 0 {
        println!(
            "Converting {} ({} -> {}, {})",
            args.input.display(),
            raw.kind,
            to_kind,
            to_layout
        );
    }

    with_kind!(raw.kind, K => {
        let image = super::load_image::<K>(&args.input, raw)?;
        with_kind!(to_kind, K2 => {
            let mut dest =
                Image::<K2>::with_layout(image.width(), image.height(), image.color(), to_layout);
            image
                .convert_to(&mut dest, args.scale)
                .with_context(|| format!("Failed to convert to {}", K2::name()))?;
            super::save_image(&args.output, &dest)?;
        })
    });

    if verbose > 0 {
        println!("Done.");
    }
    Ok(())
}
