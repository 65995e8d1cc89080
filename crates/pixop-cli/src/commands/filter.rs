//! Filter and sobel commands
//!
//! `filter` convolves with a built-in kernel through `Image::filter`;
//! `sobel` builds the gradient-magnitude operation and evaluates it.

use crate::{FilterArgs, KernelKind, PointArgs};
use anyhow::{Context, Result};
use pixop_core::Kernel;
use pixop_ops::Op;
use tracing::{debug, info, trace};

fn build_kernel(args: &FilterArgs) -> Result<Kernel> {
    let kernel = match args.kernel {
        KernelKind::Box => Kernel::box_blur(args.radius),
        KernelKind::Gaussian => {
            let std = args.std.unwrap_or((args.radius as f64 / 2.0).max(0.5));
            Kernel::gaussian(args.radius, std)?
        }
        KernelKind::Sharpen => Kernel::sharpen(args.amount),
        KernelKind::Laplacian => Kernel::laplacian(),
        KernelKind::SobelX => Kernel::sobel_x(),
        KernelKind::SobelY => Kernel::sobel_y(),
    };
    if args.normalize {
        return kernel.normalize().context("Kernel cannot be normalized");
    }
    Ok(kernel)
}

pub fn run(args: FilterArgs, verbose: u8) -> Result<()> {
    trace!(input = %args.input.display(), kernel = ?args.kernel, radius = args.radius, "filter::run");
    let kernel = build_kernel(&args)?;
    debug!(rows = kernel.rows(), cols = kernel.cols(), sum = kernel.sum(), "kernel");

    info!(kernel = ?args.kernel, w = args.raw.width, h = args.raw.height, "Applying filter");
    if verbose > 0 {
        println!(
            "Applying {:?} {}x{} kernel to {}",
            args.kernel,
            kernel.rows(),
            kernel.cols(),
            args.input.display()
        );
    }

    with_kind!(args.raw.kind, K => {
        let image = super::load_image::<K>(&args.input, &args.raw)?;
        let filtered = image.filter(&kernel);
        super::save_image(&args.output, &filtered)?;
    });

    if verbose > 0 {
        println!("Done.");
    }
    Ok(())
}

pub fn run_sobel(args: PointArgs, verbose: u8) -> Result<()> {
    trace!(input = %args.input.display(), "sobel::run");
    let source = super::load_source(&args.input, &args.raw)?;
    if verbose > 0 {
        println!("Sobel magnitude of {}", args.input.display());
    }
    super::eval_and_save(
        &Op::sobel(),
        &[source],
        &args.raw,
        &args.out,
        (args.raw.width, args.raw.height),
        args.raw.color,
    )
}
