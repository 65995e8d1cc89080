//! Info command
//!
//! Prints geometry, buffer size and per-channel averages of a raw image.

use crate::InfoArgs;
use anyhow::Result;
use pixop_core::Kind;
use tracing::trace;

pub fn run(args: InfoArgs, verbose: u8) -> Result<()> {
    trace!(input = %args.input.display(), "info::run");
    let raw = &args.raw;

    with_kind!(raw.kind, K => {
        let image = super::load_image::<K>(&args.input, raw)?;
        println!("{}", args.input.display());
        println!(
            "  {}",
            super::describe(K::ID, image.width(), image.height(), image.color(), image.layout())
        );
        println!("  {} samples, {} bytes", image.data().len(), image.data().as_bytes().len());

        let avg = image.avg(None);
        let channels: Vec<String> = avg.as_slice().iter().map(|v| format!("{v:.6}")).collect();
        println!("  average: [{}]", channels.join(", "));

        if verbose > 0 && image.channels() >= 3 {
            if let Ok(luma) = avg.luma() {
                println!("  average luma: {luma:.6}");
            }
        }
    });
    Ok(())
}
