//! # pixop-math
//!
//! Small linear-algebra primitives used by the pixel engine:
//!
//! - [`Mat3`] - 3x3 matrices for per-pixel color model conversions
//! - [`Affine2`] - 2D affine maps for geometric resampling
//!
//! # Design
//!
//! Everything works in `f64`, the canonical float domain of the engine.
//! Matrices are stored **row-major** and applied to **column vectors**:
//!
//! ```text
//! result = matrix * vector
//! ```
//!
//! Inversion and composition of affine maps delegate to [`glam`]'s
//! double-precision types.
//!
//! # Used By
//!
//! - `pixop-core` - RGB/XYZ/YUV pixel conversions
//! - `pixop-ops` - affine `transform` operation

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod affine;
mod mat3;

pub use affine::*;
pub use mat3::*;
