//! 2D affine maps for geometric resampling.
//!
//! An [`Affine2`] maps source pixel coordinates to destination pixel
//! coordinates. Resamplers walk the destination and pull from the
//! preimage, so they apply [`Affine2::inverse`].
//!
//! ```rust
//! use pixop_math::Affine2;
//!
//! let shift = Affine2::translation(3.0, -1.0);
//! assert_eq!(shift.apply(1.0, 1.0), (4.0, 0.0));
//! assert_eq!(shift.inverse().unwrap().apply(4.0, 0.0), (1.0, 1.0));
//! ```

use glam::{DAffine2, DMat2, DVec2};

/// A 2x3 affine matrix `[[a, b, tx], [c, d, ty]]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine2 {
    inner: DAffine2,
}

impl Affine2 {
    /// The identity map.
    pub const IDENTITY: Self = Self { inner: DAffine2::IDENTITY };

    /// Creates a map from its two rows.
    pub fn from_rows(rows: [[f64; 3]; 2]) -> Self {
        let [[a, b, tx], [c, d, ty]] = rows;
        Self {
            inner: DAffine2::from_mat2_translation(
                DMat2::from_cols(DVec2::new(a, c), DVec2::new(b, d)),
                DVec2::new(tx, ty),
            ),
        }
    }

    /// Pure translation.
    pub fn translation(tx: f64, ty: f64) -> Self {
        Self { inner: DAffine2::from_translation(DVec2::new(tx, ty)) }
    }

    /// Axis-aligned scale about the origin.
    pub fn scale(sx: f64, sy: f64) -> Self {
        Self { inner: DAffine2::from_scale(DVec2::new(sx, sy)) }
    }

    /// Rotation about the origin by `radians`.
    pub fn rotation(radians: f64) -> Self {
        Self { inner: DAffine2::from_angle(radians) }
    }

    /// Returns the rows `[[a, b, tx], [c, d, ty]]`.
    pub fn to_rows(&self) -> [[f64; 3]; 2] {
        let m = self.inner.matrix2;
        let t = self.inner.translation;
        [[m.x_axis.x, m.y_axis.x, t.x], [m.x_axis.y, m.y_axis.y, t.y]]
    }

    /// Returns the map that applies `self` first, then `next`.
    pub fn then(&self, next: &Affine2) -> Self {
        Self { inner: next.inner * self.inner }
    }

    /// Determinant of the linear part.
    pub fn determinant(&self) -> f64 {
        self.inner.matrix2.determinant()
    }

    /// Returns the inverse map, or `None` when the linear part is singular.
    pub fn inverse(&self) -> Option<Self> {
        let det = self.determinant();
        if !det.is_finite() || det.abs() < 1e-12 {
            return None;
        }
        Some(Self { inner: self.inner.inverse() })
    }

    /// Maps a point.
    #[inline]
    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        let p = self.inner.transform_point2(DVec2::new(x, y));
        (p.x, p.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_rows_roundtrip() {
        let rows = [[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]];
        assert_eq!(Affine2::from_rows(rows).to_rows(), rows);
    }

    #[test]
    fn test_then_order() {
        // scale first, then shift
        let m = Affine2::scale(2.0, 2.0).then(&Affine2::translation(1.0, 0.0));
        assert_eq!(m.apply(1.0, 1.0), (3.0, 2.0));
    }

    #[test]
    fn test_rotation_inverse() {
        let r = Affine2::rotation(std::f64::consts::FRAC_PI_2);
        let (x, y) = r.apply(1.0, 0.0);
        assert_abs_diff_eq!(x, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(y, 1.0, epsilon = 1e-12);
        let (bx, by) = r.inverse().unwrap().apply(x, y);
        assert_abs_diff_eq!(bx, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(by, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_singular() {
        assert!(Affine2::scale(0.0, 1.0).inverse().is_none());
    }
}
