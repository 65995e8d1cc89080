//! Numeric element kinds and the float bridge.
//!
//! A [`Kind`] is the storage type of one channel sample together with its
//! *normalized* value range. Every kind converts to and from the canonical
//! `f64` domain; kind-agnostic code (operations, statistics, conversions)
//! works exclusively through that bridge.
//!
//! # Declared ranges
//!
//! | kind          | storage        | normalized range            |
//! |---------------|----------------|-----------------------------|
//! | `u8`, `u16`   | unsigned int   | `[0, 1]`                    |
//! | `i32`, `i64`  | signed int     | `[-1, 1 - 2^-(bits-1)]`     |
//! | `f16`, `f32`, `f64` | float    | `[0, 1]`, identity mapped   |
//! | `Complex32`, `Complex64` | complex | real part, `[0, 1]`, unordered |
//!
//! Integer quantization clamps into the declared range, scales, then rounds
//! half to even. Signed kinds scale by a power of two, so `to_float` followed
//! by `of_float` is exact for every value `f64` can hold (all of `i32`,
//! `|v| <= 2^53` for `i64`).
//!
//! # Usage
//!
//! ```rust
//! use pixop_core::Kind;
//!
//! assert_eq!(u8::to_float(255), 1.0);
//! assert_eq!(u8::of_float(0.5), 128);
//! assert_eq!(u8::of_float(2.0), 255); // clamped
//! assert_eq!(i32::to_float(i32::MIN), -1.0);
//! ```

use crate::{Error, Result};
use half::f16;
use num_complex::{Complex32, Complex64};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Runtime identifier of a [`Kind`].
///
/// Used wherever the element type is only known at runtime: dynamic
/// image sources, command-line parsing, diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KindId {
    /// 8-bit unsigned integer.
    U8,
    /// 16-bit unsigned integer.
    U16,
    /// 32-bit signed integer.
    I32,
    /// 64-bit signed integer.
    I64,
    /// 16-bit half-precision float.
    F16,
    /// 32-bit float.
    F32,
    /// 64-bit float.
    F64,
    /// Complex with `f32` components.
    Complex32,
    /// Complex with `f64` components.
    Complex64,
}

impl KindId {
    /// Every kind, in declaration order.
    pub const ALL: [KindId; 9] = [
        KindId::U8,
        KindId::U16,
        KindId::I32,
        KindId::I64,
        KindId::F16,
        KindId::F32,
        KindId::F64,
        KindId::Complex32,
        KindId::Complex64,
    ];

    /// Short lowercase name (`"u8"`, `"complex32"`, ...).
    pub const fn name(&self) -> &'static str {
        match self {
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::F16 => "f16",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::Complex32 => "complex32",
            Self::Complex64 => "complex64",
        }
    }

    /// Bytes per element.
    pub const fn size_of(&self) -> usize {
        match self {
            Self::U8 => 1,
            Self::U16 | Self::F16 => 2,
            Self::I32 | Self::F32 => 4,
            Self::I64 | Self::F64 | Self::Complex32 => 8,
            Self::Complex64 => 16,
        }
    }

    /// Whether values of this kind have a total order.
    pub const fn is_ordered(&self) -> bool {
        !matches!(self, Self::Complex32 | Self::Complex64)
    }

    /// Whether this is a floating-point (or complex) kind.
    pub const fn is_float(&self) -> bool {
        matches!(
            self,
            Self::F16 | Self::F32 | Self::F64 | Self::Complex32 | Self::Complex64
        )
    }
}

impl fmt::Display for KindId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for KindId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.to_ascii_lowercase();
        let alias = match lower.as_str() {
            "uint8" => "u8",
            "uint16" => "u16",
            "int32" => "i32",
            "int64" => "i64",
            "half" | "float16" => "f16",
            "float" | "float32" => "f32",
            "double" | "float64" => "f64",
            "c32" => "complex32",
            "c64" => "complex64",
            other => other,
        };
        Self::ALL
            .into_iter()
            .find(|k| k.name() == alias)
            .ok_or_else(|| Error::invalid_parameter(format!("unknown kind '{s}'")))
    }
}

/// A numeric element type with a normalized float bridge.
///
/// # Contract
///
/// - `MIN_F <= MAX_F`
/// - `of_float(to_float(v)) == v` for every representable `v` in the
///   declared range
/// - `of_float` clamps into `[MIN_F, MAX_F]` (ordered kinds) before
///   quantizing
///
/// Implementations are plain-old-data so buffers can be viewed as bytes
/// (memory-mapped backing, structural hashing).
pub trait Kind: bytemuck::Pod + Default + PartialEq + fmt::Debug + Send + Sync + 'static {
    /// Runtime identifier.
    const ID: KindId;

    /// Declared minimum stored value.
    const MIN: Self;

    /// Declared maximum stored value.
    const MAX: Self;

    /// `to_float(MIN)`.
    const MIN_F: f64;

    /// `to_float(MAX)`.
    const MAX_F: f64;

    /// Whether the kind supports ordering and clamping.
    const ORDERED: bool = true;

    /// Converts a stored value to the normalized float domain.
    fn to_float(self) -> f64;

    /// Converts a normalized float to a stored value, clamping and rounding.
    fn of_float(f: f64) -> Self;

    /// Total order used for structural comparison of buffers.
    ///
    /// Floats order by `total_cmp`; complex values order by real then
    /// imaginary component.
    fn total_cmp(&self, other: &Self) -> Ordering;

    /// Restricts `f` to `[MIN_F, MAX_F]`.
    ///
    /// # Errors
    ///
    /// [`Error::Unsupported`] for unordered (complex) kinds.
    fn clamp_float(f: f64) -> Result<f64> {
        if !Self::ORDERED {
            return Err(Error::unsupported(Self::ID.name(), "clamp"));
        }
        Ok(f.clamp(Self::MIN_F, Self::MAX_F))
    }

    /// Kind name, shorthand for `Self::ID.name()`.
    #[inline]
    fn name() -> &'static str {
        Self::ID.name()
    }
}

macro_rules! unsigned_kind {
    ($t:ty, $id:ident) => {
        impl Kind for $t {
            const ID: KindId = KindId::$id;
            const MIN: Self = 0;
            const MAX: Self = <$t>::MAX;
            const MIN_F: f64 = 0.0;
            const MAX_F: f64 = 1.0;

            #[inline]
            fn to_float(self) -> f64 {
                self as f64 / <$t>::MAX as f64
            }

            #[inline]
            fn of_float(f: f64) -> Self {
                (f.clamp(0.0, 1.0) * <$t>::MAX as f64).round_ties_even() as $t
            }

            #[inline]
            fn total_cmp(&self, other: &Self) -> Ordering {
                self.cmp(other)
            }
        }
    };
}

macro_rules! signed_kind {
    ($t:ty, $id:ident) => {
        impl Kind for $t {
            const ID: KindId = KindId::$id;
            const MIN: Self = <$t>::MIN;
            const MAX: Self = <$t>::MAX;
            const MIN_F: f64 = -1.0;
            const MAX_F: f64 = <$t>::MAX as f64 / -(<$t>::MIN as f64);

            #[inline]
            fn to_float(self) -> f64 {
                self as f64 / -(<$t>::MIN as f64)
            }

            #[inline]
            fn of_float(f: f64) -> Self {
                // saturating cast absorbs the i64 edge where MAX_F * scale == 2^63
                (f.clamp(Self::MIN_F, Self::MAX_F) * -(<$t>::MIN as f64)).round_ties_even() as $t
            }

            #[inline]
            fn total_cmp(&self, other: &Self) -> Ordering {
                self.cmp(other)
            }
        }
    };
}

unsigned_kind!(u8, U8);
unsigned_kind!(u16, U16);
signed_kind!(i32, I32);
signed_kind!(i64, I64);

impl Kind for f16 {
    const ID: KindId = KindId::F16;
    const MIN: Self = f16::ZERO;
    const MAX: Self = f16::ONE;
    const MIN_F: f64 = 0.0;
    const MAX_F: f64 = 1.0;

    #[inline]
    fn to_float(self) -> f64 {
        self.to_f64()
    }

    #[inline]
    fn of_float(f: f64) -> Self {
        f16::from_f64(f.clamp(0.0, 1.0))
    }

    #[inline]
    fn total_cmp(&self, other: &Self) -> Ordering {
        f16::total_cmp(self, other)
    }
}

impl Kind for f32 {
    const ID: KindId = KindId::F32;
    const MIN: Self = 0.0;
    const MAX: Self = 1.0;
    const MIN_F: f64 = 0.0;
    const MAX_F: f64 = 1.0;

    #[inline]
    fn to_float(self) -> f64 {
        self as f64
    }

    #[inline]
    fn of_float(f: f64) -> Self {
        f.clamp(0.0, 1.0) as f32
    }

    #[inline]
    fn total_cmp(&self, other: &Self) -> Ordering {
        f32::total_cmp(self, other)
    }
}

impl Kind for f64 {
    const ID: KindId = KindId::F64;
    const MIN: Self = 0.0;
    const MAX: Self = 1.0;
    const MIN_F: f64 = 0.0;
    const MAX_F: f64 = 1.0;

    #[inline]
    fn to_float(self) -> f64 {
        self
    }

    #[inline]
    fn of_float(f: f64) -> Self {
        f.clamp(0.0, 1.0)
    }

    #[inline]
    fn total_cmp(&self, other: &Self) -> Ordering {
        f64::total_cmp(self, other)
    }
}

// Complex kinds bridge through the real component and are never clamped:
// there is no order to clamp against.
impl Kind for Complex32 {
    const ID: KindId = KindId::Complex32;
    const MIN: Self = Complex32::new(0.0, 0.0);
    const MAX: Self = Complex32::new(1.0, 0.0);
    const MIN_F: f64 = 0.0;
    const MAX_F: f64 = 1.0;
    const ORDERED: bool = false;

    #[inline]
    fn to_float(self) -> f64 {
        self.re as f64
    }

    #[inline]
    fn of_float(f: f64) -> Self {
        Complex32::new(f as f32, 0.0)
    }

    #[inline]
    fn total_cmp(&self, other: &Self) -> Ordering {
        self.re.total_cmp(&other.re).then(self.im.total_cmp(&other.im))
    }
}

impl Kind for Complex64 {
    const ID: KindId = KindId::Complex64;
    const MIN: Self = Complex64::new(0.0, 0.0);
    const MAX: Self = Complex64::new(1.0, 0.0);
    const MIN_F: f64 = 0.0;
    const MAX_F: f64 = 1.0;
    const ORDERED: bool = false;

    #[inline]
    fn to_float(self) -> f64 {
        self.re
    }

    #[inline]
    fn of_float(f: f64) -> Self {
        Complex64::new(f, 0.0)
    }

    #[inline]
    fn total_cmp(&self, other: &Self) -> Ordering {
        self.re.total_cmp(&other.re).then(self.im.total_cmp(&other.im))
    }
}
