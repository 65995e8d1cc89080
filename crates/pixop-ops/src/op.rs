//! The operation expression tree.
//!
//! An [`Op`] is a pure function of `(x, y, channel, sources)` to a
//! normalized float. Building one does no pixel work; it only assembles a
//! tree that [`crate::eval()`] interprets against a destination image.
//!
//! # Leaves and nodes
//!
//! | node | value at `(x, y, c)` |
//! |------|----------------------|
//! | `Const(v)` | `v` |
//! | `KindMin` / `KindMax` | normalized bounds of the destination kind |
//! | `Source(i)` | `sources[i][x, y, c]` |
//! | `Join(f, a, b)` | `f(a, b)` |
//! | `Map(f, a)` | `f(a)` |
//! | `Grayscale(i)` | Rec.709 luma of `sources[i]` |
//! | `Broadcast(i)` | channel 0 of `sources[i]` |
//! | `Threshold(t, a)` | `KindMax` if `a > t[c]`, else `KindMin` |
//! | `Filter(k, i)` | convolution of `sources[i]` with `k` |
//! | `Transform(m, i)` | bilinear sample of `sources[i]` at `m(x, y)` |
//! | `ColorMatrix(m, model, a)` | `m` applied to channels 0..3 of `a` |
//!
//! # Example
//!
//! ```rust
//! use pixop_core::{Color, Image};
//! use pixop_ops::Op;
//!
//! let a: Image<u8> = Image::new(2, 2, Color::RGB);
//! let mut b = a.clone();
//! b.fill(200);
//!
//! // (a + b) / 2 written out by hand equals the built-in blend
//! let by_hand = (Op::source(0) + Op::source(1)) / 2.0;
//! let mut out1 = a.like();
//! let mut out2 = a.like();
//! by_hand.eval(&mut out1, &[&a, &b]).unwrap();
//! Op::blend().eval(&mut out2, &[&a, &b]).unwrap();
//! assert_eq!(out1, out2);
//! assert_eq!(out1.get(0, 0, 0), 100);
//! ```

use pixop_core::{ColorModel, Error, Kernel, Kind, Result, RGB_TO_XYZ, RGB_TO_YUV, xyz_to_rgb_matrix, yuv_to_rgb_matrix};
use pixop_math::{Affine2, Mat3};
use std::ops::{Add, Div, Mul, Neg, Sub};
use std::sync::Arc;

/// Pointwise binary functions for [`Op::Join`].
#[derive(Debug, Clone, Copy)]
pub enum BinaryFn {
    /// `a + b`
    Add,
    /// `a - b`
    Sub,
    /// `a * b`
    Mul,
    /// `a / b`
    Div,
    /// Smaller of the two.
    Min,
    /// Larger of the two.
    Max,
    /// `sqrt(a^2 + b^2)`
    Hypot,
    /// User function.
    Custom(fn(f64, f64) -> f64),
}

impl BinaryFn {
    /// Applies the function.
    #[inline]
    pub fn apply(&self, a: f64, b: f64) -> f64 {
        match self {
            BinaryFn::Add => a + b,
            BinaryFn::Sub => a - b,
            BinaryFn::Mul => a * b,
            BinaryFn::Div => a / b,
            BinaryFn::Min => a.min(b),
            BinaryFn::Max => a.max(b),
            BinaryFn::Hypot => a.hypot(b),
            BinaryFn::Custom(f) => f(a, b),
        }
    }

    /// Whether the function relies on ordering its operands.
    pub fn is_ordering(&self) -> bool {
        matches!(self, BinaryFn::Min | BinaryFn::Max)
    }
}

/// Pointwise unary functions for [`Op::Map`].
#[derive(Debug, Clone, Copy)]
pub enum UnaryFn {
    /// `-a`
    Neg,
    /// `|a|`
    Abs,
    /// `sqrt(a)`
    Sqrt,
    /// `a * a`
    Square,
    /// User function.
    Custom(fn(f64) -> f64),
}

impl UnaryFn {
    /// Applies the function.
    #[inline]
    pub fn apply(&self, a: f64) -> f64 {
        match self {
            UnaryFn::Neg => -a,
            UnaryFn::Abs => a.abs(),
            UnaryFn::Sqrt => a.sqrt(),
            UnaryFn::Square => a * a,
            UnaryFn::Custom(f) => f(a),
        }
    }
}

/// Lazily evaluated per-pixel operation.
#[derive(Debug, Clone)]
pub enum Op {
    /// Constant value.
    Const(f64),
    /// Normalized minimum of the destination kind.
    KindMin,
    /// Normalized maximum of the destination kind.
    KindMax,
    /// Sample of source `i` at the same coordinate and channel.
    Source(usize),
    /// Pointwise combination of two operations.
    Join(BinaryFn, Box<Op>, Box<Op>),
    /// Pointwise function of one operation.
    Map(UnaryFn, Box<Op>),
    /// Luma of source `i` into a one-channel destination.
    Grayscale(usize),
    /// Channel 0 of one-channel source `i`, on every destination channel.
    Broadcast(usize),
    /// Per-channel threshold of an operation.
    Threshold(Arc<[f64]>, Box<Op>),
    /// Convolution of source `i`.
    Filter(Arc<Kernel>, usize),
    /// Destination-to-source map and the source it samples.
    Transform(Affine2, usize),
    /// 3x3 matrix over the first three channels; others pass through.
    /// When a model is given, every source `a` reads must carry it
    /// (`Rgb` also admits `Rgba`).
    ColorMatrix(Mat3, Option<ColorModel>, Box<Op>),
}

impl Op {
    /// Constant `v` everywhere.
    pub fn scalar(v: f64) -> Op {
        Op::Const(v)
    }

    /// Constant normalized minimum of `K`.
    pub fn scalar_min<K: Kind>() -> Op {
        Op::Const(K::MIN_F)
    }

    /// Constant normalized maximum of `K`.
    pub fn scalar_max<K: Kind>() -> Op {
        Op::Const(K::MAX_F)
    }

    /// Sample of source `i`.
    pub fn source(i: usize) -> Op {
        Op::Source(i)
    }

    /// `f(a, b)` pointwise.
    pub fn join(f: BinaryFn, a: Op, b: Op) -> Op {
        Op::Join(f, Box::new(a), Box::new(b))
    }

    /// `f(a, b)` pointwise with a plain function.
    pub fn join_with(f: fn(f64, f64) -> f64, a: Op, b: Op) -> Op {
        Op::join(BinaryFn::Custom(f), a, b)
    }

    /// `f(self)` pointwise.
    pub fn map(self, f: UnaryFn) -> Op {
        Op::Map(f, Box::new(self))
    }

    /// `f(self)` pointwise with a plain function.
    pub fn map_with(self, f: fn(f64) -> f64) -> Op {
        self.map(UnaryFn::Custom(f))
    }

    /// Average of sources 0 and 1.
    pub fn blend() -> Op {
        (Op::Source(0) + Op::Source(1)) / 2.0
    }

    /// Pointwise minimum of two operations.
    pub fn min_of(a: Op, b: Op) -> Op {
        Op::join(BinaryFn::Min, a, b)
    }

    /// Pointwise maximum of two operations.
    pub fn max_of(a: Op, b: Op) -> Op {
        Op::join(BinaryFn::Max, a, b)
    }

    /// Pointwise minimum of sources 0 and 1.
    pub fn min() -> Op {
        Op::min_of(Op::Source(0), Op::Source(1))
    }

    /// Pointwise maximum of sources 0 and 1.
    pub fn max() -> Op {
        Op::max_of(Op::Source(0), Op::Source(1))
    }

    /// Luma of source 0; the destination must have one channel.
    pub fn grayscale() -> Op {
        Op::Grayscale(0)
    }

    /// Channel 0 of one-channel source 0 broadcast to every channel.
    pub fn color() -> Op {
        Op::Broadcast(0)
    }

    /// `KindMax - source 0`.
    pub fn invert() -> Op {
        Op::KindMax - Op::Source(0)
    }

    /// Per-channel threshold of source 0.
    pub fn threshold(thresholds: impl Into<Arc<[f64]>>) -> Op {
        Op::threshold_of(thresholds, Op::Source(0))
    }

    /// Per-channel threshold of an operation.
    pub fn threshold_of(thresholds: impl Into<Arc<[f64]>>, input: Op) -> Op {
        Op::Threshold(thresholds.into(), Box::new(input))
    }

    /// Scales source 0 towards the kind minimum: `v * f + min * (1 - f)`.
    ///
    /// `f = 1` leaves values untouched; `f = 0` yields the minimum.
    pub fn brightness(factor: f64) -> Op {
        Op::Source(0) * factor + Op::KindMin * (1.0 - factor)
    }

    /// Convolution of source 0 with `kernel`.
    pub fn filter(kernel: Kernel) -> Op {
        Op::Filter(Arc::new(kernel), 0)
    }

    /// `f(filter(k1), filter(k2))` over source 0.
    ///
    /// Kernels of equal size are evaluated in one pass over the footprint.
    pub fn join_filter(f: BinaryFn, k1: Kernel, k2: Kernel) -> Op {
        Op::join(f, Op::filter(k1), Op::filter(k2))
    }

    /// Sobel gradient magnitude of source 0.
    pub fn sobel() -> Op {
        Op::join_filter(BinaryFn::Hypot, Kernel::sobel_x(), Kernel::sobel_y())
    }

    /// Resamples source 0 under `forward`, which maps source coordinates
    /// to destination coordinates.
    ///
    /// Each destination pixel reads the source bilinearly at its preimage.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidParameter`] if `forward` is not invertible.
    pub fn transform(forward: Affine2) -> Result<Op> {
        let inverse = forward.inverse().ok_or_else(|| {
            Error::invalid_parameter(format!("affine transform {:?} is singular", forward.to_rows()))
        })?;
        Ok(Op::Transform(inverse, 0))
    }

    /// Applies `m` to the first three channels of `input`.
    pub fn color_matrix(m: Mat3, input: Op) -> Op {
        Op::ColorMatrix(m, None, Box::new(input))
    }

    fn model_matrix(m: Mat3, from: ColorModel) -> Op {
        Op::ColorMatrix(m, Some(from), Box::new(Op::Source(0)))
    }

    /// RGB(A) source 0 to XYZ(A).
    pub fn rgb_to_xyz() -> Op {
        Op::model_matrix(RGB_TO_XYZ, ColorModel::Rgb)
    }

    /// XYZ(A) source 0 to RGB(A).
    pub fn xyz_to_rgb() -> Result<Op> {
        Ok(Op::model_matrix(xyz_to_rgb_matrix()?, ColorModel::Xyz))
    }

    /// RGB(A) source 0 to YUV(A).
    pub fn rgb_to_yuv() -> Op {
        Op::model_matrix(RGB_TO_YUV, ColorModel::Rgb)
    }

    /// YUV(A) source 0 to RGB(A).
    pub fn yuv_to_rgb() -> Result<Op> {
        Ok(Op::model_matrix(yuv_to_rgb_matrix()?, ColorModel::Yuv))
    }

    /// Rebinds every source index `i` to `i + offset`, so an operation
    /// written against source 0 can be combined with one written against
    /// another input.
    pub fn shift_sources(self, offset: usize) -> Op {
        let shift = |op: Box<Op>| Box::new(op.shift_sources(offset));
        match self {
            Op::Source(i) => Op::Source(i + offset),
            Op::Grayscale(i) => Op::Grayscale(i + offset),
            Op::Broadcast(i) => Op::Broadcast(i + offset),
            Op::Filter(k, i) => Op::Filter(k, i + offset),
            Op::Transform(m, i) => Op::Transform(m, i + offset),
            Op::Join(f, a, b) => Op::Join(f, shift(a), shift(b)),
            Op::Map(f, a) => Op::Map(f, shift(a)),
            Op::Threshold(t, a) => Op::Threshold(t, shift(a)),
            Op::ColorMatrix(m, from, a) => Op::ColorMatrix(m, from, shift(a)),
            leaf @ (Op::Const(_) | Op::KindMin | Op::KindMax) => leaf,
        }
    }

    /// Number of nodes in the tree.
    pub fn node_count(&self) -> usize {
        1 + self.children().map(Op::node_count).sum::<usize>()
    }

    /// Direct children.
    pub fn children(&self) -> impl Iterator<Item = &Op> {
        let (a, b): (Option<&Op>, Option<&Op>) = match self {
            Op::Join(_, a, b) => (Some(&**a), Some(&**b)),
            Op::Map(_, a) | Op::Threshold(_, a) | Op::ColorMatrix(_, _, a) => (Some(&**a), None),
            _ => (None, None),
        };
        a.into_iter().chain(b)
    }

    /// Source index read directly by this node, if any.
    pub fn source_index(&self) -> Option<usize> {
        match self {
            Op::Source(i)
            | Op::Grayscale(i)
            | Op::Broadcast(i)
            | Op::Filter(_, i)
            | Op::Transform(_, i) => Some(*i),
            _ => None,
        }
    }

    /// Highest source index referenced plus one.
    pub fn arity(&self) -> usize {
        let own = self.source_index().map_or(0, |i| i + 1);
        self.children().map(Op::arity).fold(own, usize::max)
    }
}

impl From<f64> for Op {
    fn from(v: f64) -> Self {
        Op::Const(v)
    }
}

macro_rules! binary_operator {
    ($trait:ident, $method:ident, $f:ident) => {
        impl<R: Into<Op>> $trait<R> for Op {
            type Output = Op;

            fn $method(self, rhs: R) -> Op {
                Op::join(BinaryFn::$f, self, rhs.into())
            }
        }
    };
}

binary_operator!(Add, add, Add);
binary_operator!(Sub, sub, Sub);
binary_operator!(Mul, mul, Mul);
binary_operator!(Div, div, Div);

impl Neg for Op {
    type Output = Op;

    fn neg(self) -> Op {
        self.map(UnaryFn::Neg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operators_build_joins() {
        let op = Op::source(0) * 2.0 - Op::source(1);
        match &op {
            Op::Join(BinaryFn::Sub, a, b) => {
                assert!(matches!(**a, Op::Join(BinaryFn::Mul, _, _)));
                assert!(matches!(**b, Op::Source(1)));
            }
            other => panic!("unexpected tree {other:?}"),
        }
        assert_eq!(op.node_count(), 5);
        assert_eq!(op.arity(), 2);
    }

    #[test]
    fn test_shift_sources() {
        let op = Op::sobel().shift_sources(2);
        assert_eq!(op.arity(), 3);
        let op = (-Op::invert()).shift_sources(1);
        assert_eq!(op.arity(), 2);
    }

    #[test]
    fn test_singular_transform_rejected() {
        let flat = Affine2::scale(0.0, 1.0);
        assert!(matches!(Op::transform(flat), Err(Error::InvalidParameter(_))));
        assert!(Op::transform(Affine2::translation(1.0, 2.0)).is_ok());
    }

    #[test]
    fn test_functions() {
        assert_eq!(BinaryFn::Hypot.apply(3.0, 4.0), 5.0);
        assert_eq!(BinaryFn::Min.apply(3.0, -4.0), -4.0);
        assert!(BinaryFn::Max.is_ordering());
        assert!(!BinaryFn::Add.is_ordering());
        assert_eq!(UnaryFn::Square.apply(-3.0), 9.0);
        assert_eq!(UnaryFn::Custom(|v| v + 1.0).apply(1.0), 2.0);
    }
}
