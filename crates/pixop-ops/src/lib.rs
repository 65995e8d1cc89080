//! # pixop-ops
//!
//! Lazy per-pixel operations over [`pixop_core::Image`]s.
//!
//! An [`Op`] is a small expression tree: constants, source reads,
//! pointwise joins and maps, and a handful of structural nodes (grayscale,
//! broadcast, threshold, convolution, affine resampling, color matrices).
//! Nothing is computed until [`eval()`] walks the destination image.
//!
//! # Modules
//!
//! - [`op`] - the tree, its combinators and derived operations
//! - [`guard`] - up-front validation against destination and sources
//! - [`eval`](mod@eval) - the interpreter
//!
//! # Example
//!
//! ```rust
//! use pixop_core::{Color, Image};
//! use pixop_ops::Op;
//!
//! let mut flat: Image<u8> = Image::new(8, 8, Color::GRAY);
//! flat.fill(90);
//!
//! let mut edges = flat.like();
//! Op::sobel().eval(&mut edges, &[&flat]).unwrap();
//! assert_eq!(edges.get(4, 4, 0), 0);
//! ```
//!
//! # Dependencies
//!
//! - `pixop-core` - images, kernels, the float bridge
//! - `pixop-math` - affine maps and 3x3 matrices
//! - `tracing` - evaluation logging

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod eval;
pub mod guard;
pub mod op;

pub use eval::{eval, eval_region, sample_bilinear};
pub use op::{BinaryFn, Op, UnaryFn};
