//! Convolution kernels.
//!
//! A [`Kernel`] is a dense `rows x cols` matrix of `f64` weights. Filters
//! anchor it at `(rows / 2, cols / 2)`, so odd sizes center exactly.
//!
//! # Built-ins
//!
//! - [`Kernel::sobel_x`] / [`Kernel::sobel_y`] - 3x3 gradient kernels
//! - [`Kernel::gaussian`] - sampled Gaussian density, normalized
//! - [`Kernel::box_blur`] - uniform average
//! - [`Kernel::sharpen`] / [`Kernel::laplacian`]
//!
//! # Example
//!
//! ```rust
//! use pixop_core::Kernel;
//!
//! let k = Kernel::gaussian(2, 1.0).unwrap();
//! assert_eq!((k.rows(), k.cols()), (5, 5));
//! assert!((k.sum() - 1.0).abs() < 1e-12);
//!
//! let zero = Kernel::new(3, 3).unwrap();
//! assert!(zero.normalize().is_err());
//! ```

use crate::{Error, Result};
use std::fmt;
use std::ops::{Index, IndexMut};

/// Dense row-major convolution kernel.
#[derive(Clone, PartialEq)]
pub struct Kernel {
    rows: usize,
    cols: usize,
    weights: Vec<f64>,
}

impl Kernel {
    /// A zero kernel.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidKernelShape`] if either dimension is zero.
    pub fn new(rows: usize, cols: usize) -> Result<Self> {
        if rows == 0 || cols == 0 {
            return Err(Error::invalid_kernel_shape(rows, cols, "dimensions must be non-zero"));
        }
        Ok(Self {
            rows,
            cols,
            weights: vec![0.0; rows * cols],
        })
    }

    /// Builds a kernel from row-major weights.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidKernelShape`] if `weights.len() != rows * cols` or a
    /// dimension is zero.
    pub fn from_vec(rows: usize, cols: usize, weights: Vec<f64>) -> Result<Self> {
        if rows == 0 || cols == 0 {
            return Err(Error::invalid_kernel_shape(rows, cols, "dimensions must be non-zero"));
        }
        if weights.len() != rows * cols {
            return Err(Error::invalid_kernel_shape(
                rows,
                cols,
                format!("{} weights supplied", weights.len()),
            ));
        }
        Ok(Self { rows, cols, weights })
    }

    /// Builds a kernel from equal-length rows.
    pub fn from_rows<const C: usize>(rows: &[[f64; C]]) -> Result<Self> {
        Self::from_vec(rows.len(), C, rows.iter().flatten().copied().collect())
    }

    /// Number of rows.
    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Anchor `(row, col)` aligned with the output pixel.
    #[inline]
    pub fn center(&self) -> (usize, usize) {
        (self.rows / 2, self.cols / 2)
    }

    /// Weight at `(row, col)`. Panics when out of range.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self[(row, col)]
    }

    /// Sets the weight at `(row, col)`. Panics when out of range.
    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self[(row, col)] = value;
    }

    /// Row-major weights.
    #[inline]
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Sum of all weights.
    pub fn sum(&self) -> f64 {
        self.weights.iter().sum()
    }

    /// Returns a copy with every weight divided by [`Kernel::sum`].
    ///
    /// # Errors
    ///
    /// [`Error::DivisionByZero`] when the sum is zero or not finite.
    pub fn normalize(&self) -> Result<Kernel> {
        let sum = self.sum();
        if sum == 0.0 || !sum.is_finite() {
            return Err(Error::DivisionByZero(format!(
                "cannot normalize {}x{} kernel with sum {sum}",
                self.rows, self.cols
            )));
        }
        Ok(self.map(|w| w / sum))
    }

    /// Applies `f` to every weight.
    pub fn map(&self, f: impl FnMut(f64) -> f64) -> Kernel {
        Self {
            rows: self.rows,
            cols: self.cols,
            weights: self.weights.iter().copied().map(f).collect(),
        }
    }

    /// Swaps rows and columns.
    pub fn transpose(&self) -> Kernel {
        let mut weights = Vec::with_capacity(self.weights.len());
        for c in 0..self.cols {
            for r in 0..self.rows {
                weights.push(self[(r, c)]);
            }
        }
        Self {
            rows: self.cols,
            cols: self.rows,
            weights,
        }
    }

    /// Horizontal Sobel gradient.
    pub fn sobel_x() -> Self {
        #[rustfmt::skip]
        let weights = vec![
            -1.0, 0.0, 1.0,
            -2.0, 0.0, 2.0,
            -1.0, 0.0, 1.0,
        ];
        Self {
            rows: 3,
            cols: 3,
            weights,
        }
    }

    /// Vertical Sobel gradient.
    pub fn sobel_y() -> Self {
        Self::sobel_x().transpose()
    }

    /// Gaussian density sampled at integer offsets `-radius..=radius`,
    /// normalized to unit sum.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidParameter`] if `std` is not a positive finite number.
    pub fn gaussian_1d(radius: usize, std: f64) -> Result<Vec<f64>> {
        if !(std > 0.0 && std.is_finite()) {
            return Err(Error::invalid_parameter(format!(
                "gaussian std must be positive, got {std}"
            )));
        }
        let r = radius as isize;
        let two_var = 2.0 * std * std;
        let samples: Vec<f64> = (-r..=r)
            .map(|i| (-((i * i) as f64) / two_var).exp())
            .collect();
        let sum: f64 = samples.iter().sum();
        Ok(samples.into_iter().map(|s| s / sum).collect())
    }

    /// Square `(2 * radius + 1)` Gaussian: outer product of two
    /// [`Kernel::gaussian_1d`] profiles.
    pub fn gaussian(radius: usize, std: f64) -> Result<Self> {
        let profile = Self::gaussian_1d(radius, std)?;
        let size = profile.len();
        let weights = profile
            .iter()
            .flat_map(|&row| profile.iter().map(move |&col| row * col))
            .collect();
        Ok(Self {
            rows: size,
            cols: size,
            weights,
        })
    }

    /// Uniform `(2 * radius + 1)` square average.
    pub fn box_blur(radius: usize) -> Self {
        let size = 2 * radius + 1;
        let count = size * size;
        Self {
            rows: size,
            cols: size,
            weights: vec![1.0 / count as f64; count],
        }
    }

    /// 3x3 sharpen with the given strength; `amount = 0` is identity.
    pub fn sharpen(amount: f64) -> Self {
        let center = 1.0 + 4.0 * amount;
        #[rustfmt::skip]
        let weights = vec![
            0.0, -amount, 0.0,
            -amount, center, -amount,
            0.0, -amount, 0.0,
        ];
        Self {
            rows: 3,
            cols: 3,
            weights,
        }
    }

    /// 3x3 Laplacian edge kernel.
    pub fn laplacian() -> Self {
        #[rustfmt::skip]
        let weights = vec![
            0.0, -1.0, 0.0,
            -1.0, 4.0, -1.0,
            0.0, -1.0, 0.0,
        ];
        Self {
            rows: 3,
            cols: 3,
            weights,
        }
    }
}

impl Index<(usize, usize)> for Kernel {
    type Output = f64;

    #[inline]
    fn index(&self, (row, col): (usize, usize)) -> &f64 {
        assert!(col < self.cols, "kernel column {col} out of range");
        &self.weights[row * self.cols + col]
    }
}

impl IndexMut<(usize, usize)> for Kernel {
    #[inline]
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut f64 {
        assert!(col < self.cols, "kernel column {col} out of range");
        &mut self.weights[row * self.cols + col]
    }
}

impl fmt::Debug for Kernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rows: Vec<&[f64]> = self.weights.chunks(self.cols).collect();
        f.debug_struct("Kernel")
            .field("rows", &self.rows)
            .field("cols", &self.cols)
            .field("weights", &rows)
            .finish()
    }
}
