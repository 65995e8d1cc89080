//! Kind-independent pixel values.
//!
//! A [`Pixel`] holds one sample of every channel as normalized `f64`s.
//! It is detached from any [`Kind`]: images of different kinds exchange
//! values through pixels.
//!
//! # Color model conversions
//!
//! Three fixed linear transforms act on the first three channels; extra
//! channels (alpha) pass through unchanged:
//!
//! - [`Pixel::rgb_to_xyz`] - sRGB primaries, D65 white
//! - [`Pixel::rgb_to_yuv`] - BT.601 YUV
//! - [`Pixel::luma`] - Rec.709 weights
//!
//! The reverse directions are derived by inverting the forward matrices
//! ([`xyz_to_rgb_matrix`], [`yuv_to_rgb_matrix`]); they are not separate
//! constants.
//!
//! ```rust
//! use pixop_core::Pixel;
//!
//! let red = Pixel::from_slice(&[1.0, 0.0, 0.0]);
//! let xyz = red.rgb_to_xyz().unwrap();
//! let back = xyz.xyz_to_rgb().unwrap();
//! assert!((back[0] - 1.0).abs() < 1e-9);
//! ```

use crate::{Error, Kind, Result};
use pixop_math::Mat3;
use smallvec::SmallVec;
use std::ops::{Index, IndexMut};
use std::sync::LazyLock;

/// Rec.709 luma weights `[R, G, B]`, used by grayscale conversion.
pub const REC709_LUMA: [f64; 3] = [0.2126, 0.7152, 0.0722];

/// Linear sRGB (D65) to CIE XYZ.
pub const RGB_TO_XYZ: Mat3 = Mat3::from_rows([
    [0.4124564, 0.3575761, 0.1804375],
    [0.2126729, 0.7151522, 0.0721750],
    [0.0193339, 0.1191920, 0.9503041],
]);

/// RGB to BT.601 YUV.
pub const RGB_TO_YUV: Mat3 = Mat3::from_rows([
    [0.299, 0.587, 0.114],
    [-0.14713, -0.28886, 0.436],
    [0.615, -0.51499, -0.10001],
]);

static XYZ_TO_RGB: LazyLock<Option<Mat3>> = LazyLock::new(|| RGB_TO_XYZ.inverse());
static YUV_TO_RGB: LazyLock<Option<Mat3>> = LazyLock::new(|| RGB_TO_YUV.inverse());

/// Inverse of [`RGB_TO_XYZ`].
pub fn xyz_to_rgb_matrix() -> Result<Mat3> {
    (*XYZ_TO_RGB).ok_or_else(|| Error::invalid_parameter("RGB to XYZ matrix is singular"))
}

/// Inverse of [`RGB_TO_YUV`].
pub fn yuv_to_rgb_matrix() -> Result<Mat3> {
    (*YUV_TO_RGB).ok_or_else(|| Error::invalid_parameter("RGB to YUV matrix is singular"))
}

/// Rec.709 luma of an `[R, G, B]` triple.
#[inline]
pub fn luma_rec709(rgb: [f64; 3]) -> f64 {
    rgb[0] * REC709_LUMA[0] + rgb[1] * REC709_LUMA[1] + rgb[2] * REC709_LUMA[2]
}

/// One sample across all channels, in the normalized float domain.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Pixel {
    values: SmallVec<[f64; 4]>,
}

impl Pixel {
    /// A zeroed pixel with `channels` channels.
    pub fn new(channels: usize) -> Self {
        Self::filled(channels, 0.0)
    }

    /// A pixel with every channel set to `value`.
    pub fn filled(channels: usize, value: f64) -> Self {
        Self {
            values: SmallVec::from_elem(value, channels),
        }
    }

    /// A pixel holding a copy of `values`.
    pub fn from_slice(values: &[f64]) -> Self {
        Self {
            values: SmallVec::from_slice(values),
        }
    }

    /// Reads one interleaved sample of raw typed values.
    pub fn from_data<K: Kind>(raw: &[K]) -> Self {
        Self {
            values: raw.iter().map(|&v| v.to_float()).collect(),
        }
    }

    /// Quantizes this pixel into a raw typed sample.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidColor`] if `raw` does not have one slot per channel.
    pub fn to_data<K: Kind>(&self, raw: &mut [K]) -> Result<()> {
        if raw.len() != self.len() {
            return Err(Error::invalid_color(self.len(), raw.len()));
        }
        for (dst, &v) in raw.iter_mut().zip(&self.values) {
            *dst = K::of_float(v);
        }
        Ok(())
    }

    /// Number of channels.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` for a zero-channel pixel.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Channel values.
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    /// Mutable channel values.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.values
    }

    /// Applies `f` to every channel.
    pub fn map(&self, mut f: impl FnMut(f64) -> f64) -> Pixel {
        Self {
            values: self.values.iter().map(|&v| f(v)).collect(),
        }
    }

    /// Combines matching channels of two pixels.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidColor`] if the channel counts differ.
    pub fn map2(&self, other: &Pixel, mut f: impl FnMut(f64, f64) -> f64) -> Result<Pixel> {
        self.ensure_same_len(other)?;
        Ok(Self {
            values: self
                .values
                .iter()
                .zip(&other.values)
                .map(|(&a, &b)| f(a, b))
                .collect(),
        })
    }

    /// Left fold over the channels.
    pub fn fold<A>(&self, init: A, mut f: impl FnMut(A, f64) -> A) -> A {
        self.values.iter().fold(init, |acc, &v| f(acc, v))
    }

    /// Left fold over matching channels of two pixels.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidColor`] if the channel counts differ.
    pub fn fold2<A>(&self, other: &Pixel, init: A, mut f: impl FnMut(A, f64, f64) -> A) -> Result<A> {
        self.ensure_same_len(other)?;
        Ok(self
            .values
            .iter()
            .zip(&other.values)
            .fold(init, |acc, (&a, &b)| f(acc, a, b)))
    }

    fn ensure_same_len(&self, other: &Pixel) -> Result<()> {
        if self.len() != other.len() {
            return Err(Error::invalid_color(self.len(), other.len()));
        }
        Ok(())
    }

    /// Applies `m` to the first three channels; remaining channels pass through.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidColor`] for pixels with fewer than three channels.
    pub fn apply_matrix(&self, m: &Mat3) -> Result<Pixel> {
        if self.len() < 3 {
            return Err(Error::invalid_color(3, self.len()));
        }
        let out = m.transform([self.values[0], self.values[1], self.values[2]]);
        let mut result = self.clone();
        result.values[..3].copy_from_slice(&out);
        Ok(result)
    }

    /// RGB(A) to XYZ(A).
    pub fn rgb_to_xyz(&self) -> Result<Pixel> {
        self.apply_matrix(&RGB_TO_XYZ)
    }

    /// XYZ(A) to RGB(A), through the inverted RGB→XYZ matrix.
    pub fn xyz_to_rgb(&self) -> Result<Pixel> {
        self.apply_matrix(&xyz_to_rgb_matrix()?)
    }

    /// RGB(A) to YUV(A).
    pub fn rgb_to_yuv(&self) -> Result<Pixel> {
        self.apply_matrix(&RGB_TO_YUV)
    }

    /// YUV(A) to RGB(A), through the inverted RGB→YUV matrix.
    pub fn yuv_to_rgb(&self) -> Result<Pixel> {
        self.apply_matrix(&yuv_to_rgb_matrix()?)
    }

    /// Rec.709 luma; a single-channel pixel is its own luma.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidColor`] for two-channel pixels.
    pub fn luma(&self) -> Result<f64> {
        match self.len() {
            1 => Ok(self.values[0]),
            n if n >= 3 => Ok(luma_rec709([self.values[0], self.values[1], self.values[2]])),
            n => Err(Error::invalid_color(3, n)),
        }
    }
}

impl Index<usize> for Pixel {
    type Output = f64;

    #[inline]
    fn index(&self, c: usize) -> &f64 {
        &self.values[c]
    }
}

impl IndexMut<usize> for Pixel {
    #[inline]
    fn index_mut(&mut self, c: usize) -> &mut f64 {
        &mut self.values[c]
    }
}

impl From<Vec<f64>> for Pixel {
    fn from(values: Vec<f64>) -> Self {
        Self {
            values: SmallVec::from_vec(values),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_raw_roundtrip() {
        let raw: [u8; 3] = [255, 0, 51];
        let p = Pixel::from_data(&raw);
        assert_eq!(p.as_slice(), &[1.0, 0.0, 0.2]);
        let mut out = [0u8; 3];
        p.to_data(&mut out).unwrap();
        assert_eq!(out, raw);
        let mut short = [0u8; 2];
        assert!(p.to_data(&mut short).is_err());
    }

    #[test]
    fn test_map_fold() {
        let a = Pixel::from_slice(&[0.1, 0.2, 0.3]);
        let b = Pixel::filled(3, 0.5);
        let sum = a.map2(&b, |x, y| x + y).unwrap();
        assert_abs_diff_eq!(sum[2], 0.8, epsilon = 1e-12);
        assert_abs_diff_eq!(a.fold(0.0, |acc, v| acc + v), 0.6, epsilon = 1e-12);
        let dot = a.fold2(&b, 0.0, |acc, x, y| acc + x * y).unwrap();
        assert_abs_diff_eq!(dot, 0.3, epsilon = 1e-12);
        assert_eq!(a.map(|v| v * 0.0), Pixel::new(3));
    }

    #[test]
    fn test_shape_mismatch() {
        let a = Pixel::new(3);
        let b = Pixel::new(4);
        assert!(matches!(a.map2(&b, |x, _| x), Err(Error::InvalidColor { expected: 3, got: 4 })));
        assert!(a.fold2(&b, 0.0, |acc, _, _| acc).is_err());
    }

    #[test]
    fn test_white_to_xyz_is_d65() {
        let xyz = Pixel::filled(3, 1.0).rgb_to_xyz().unwrap();
        assert_abs_diff_eq!(xyz[0], 0.9504700, epsilon = 1e-6);
        assert_abs_diff_eq!(xyz[1], 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(xyz[2], 1.0888300, epsilon = 1e-6);
    }

    #[test]
    fn test_inverse_conversions() {
        let rgba = Pixel::from_slice(&[0.2, 0.4, 0.6, 0.5]);
        let yuv = rgba.rgb_to_yuv().unwrap();
        assert_eq!(yuv[3], 0.5); // alpha untouched
        let back = yuv.yuv_to_rgb().unwrap();
        for c in 0..4 {
            assert_abs_diff_eq!(back[c], rgba[c], epsilon = 1e-9);
        }
        let back = rgba.rgb_to_xyz().unwrap().xyz_to_rgb().unwrap();
        for c in 0..4 {
            assert_abs_diff_eq!(back[c], rgba[c], epsilon = 1e-9);
        }
    }

    #[test]
    fn test_luma() {
        assert_abs_diff_eq!(Pixel::from_slice(&[1.0, 0.0, 0.0]).luma().unwrap(), 0.2126);
        assert_eq!(Pixel::from_slice(&[0.3]).luma().unwrap(), 0.3);
        assert!(Pixel::new(2).luma().is_err());
        assert!(Pixel::new(2).rgb_to_xyz().is_err());
    }
}
