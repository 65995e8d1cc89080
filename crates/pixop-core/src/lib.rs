//! # pixop-core
//!
//! Typed image buffers and the pieces every pixel operation is built from.
//!
//! - [`Kind`] - element types (`u8`, `u16`, `i32`, `i64`, `f16`, `f32`,
//!   `f64`, complex) with a float bridge to a normalized domain
//! - [`Data`] - fixed-length typed buffer, heap or memory-mapped
//! - [`Color`] - channel count, alpha flag, model tag
//! - [`Pixel`] - kind-independent channel vector with color conversions
//! - [`Image`] - width, height, color and layout over a [`Data`]
//! - [`Kernel`] - convolution weights
//! - [`Source`] - kind-erased read access consumed by `pixop-ops`
//! - [`Decoder`], [`Encoder`], [`FrameSource`] - external codec seams
//!
//! ## Quick start
//!
//! ```rust
//! use pixop_core::prelude::*;
//!
//! let mut img: Image<u8> = Image::new(2, 2, Color::RGB);
//! img.set_pixel(0, 0, &Pixel::from_slice(&[1.0, 0.0, 0.0])).unwrap();
//! let luma = img.get_pixel(0, 0).luma().unwrap();
//! assert!((luma - 0.2126).abs() < 1e-12);
//! ```
//!
//! ## Dependencies
//!
//! - `pixop-math` - matrices for color conversion
//! - `half`, `num-complex` - `f16` and complex kinds
//! - `bytemuck` - byte views of buffers
//! - `smallvec` - inline pixel storage
//! - `libc` - memory-mapped buffers (unix)

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod color;
pub mod data;
pub mod error;
pub mod image;
pub mod io;
pub mod kernel;
pub mod kind;
mod mapped;
pub mod pixel;
pub mod rect;
pub mod source;

pub use color::{Color, ColorModel};
pub use data::{Data, DataView, DataViewMut};
pub use error::{Error, Result};
pub use image::{Image, Layout, PixelMut};
pub use io::{Decoder, Encoder, FrameSource, Frames};
pub use kernel::Kernel;
pub use kind::{Kind, KindId};
pub use pixel::{
    luma_rec709, xyz_to_rgb_matrix, yuv_to_rgb_matrix, Pixel, REC709_LUMA, RGB_TO_XYZ, RGB_TO_YUV,
};
pub use rect::Rect;
pub use source::Source;

pub use half::f16;
pub use num_complex::{Complex32, Complex64};

/// Prelude module for convenient imports.
///
/// ```
/// use pixop_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::color::{Color, ColorModel};
    pub use crate::data::Data;
    pub use crate::error::{Error, Result};
    pub use crate::image::{Image, Layout};
    pub use crate::kernel::Kernel;
    pub use crate::kind::{Kind, KindId};
    pub use crate::pixel::Pixel;
    pub use crate::rect::Rect;
    pub use crate::source::Source;
}
