//! Error types for pixop-core operations.
//!
//! Constructors and shape-sensitive entry points validate eagerly and
//! return one of these variants. Per-pixel inner loops never produce
//! errors; out-of-range reads fall back to the kind minimum instead
//! (see [`crate::Image::get`]).
//!
//! # Usage
//!
//! ```rust
//! use pixop_core::{Error, Result};
//!
//! fn check_len(expected: usize, got: usize) -> Result<()> {
//!     if expected != got {
//!         return Err(Error::invalid_shape(format!("expected {expected} elements, got {got}")));
//!     }
//!     Ok(())
//! }
//!
//! assert!(check_len(4, 3).unwrap_err().is_shape_error());
//! ```

use crate::Color;
use thiserror::Error;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by buffers, images, kernels and operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Buffer or image length does not match the declared geometry,
    /// or two images that must agree in size do not.
    #[error("invalid shape: {0}")]
    InvalidShape(String),

    /// Kernel dimensions are unusable for the requested operation.
    #[error("invalid kernel shape {rows}x{cols}: {reason}")]
    InvalidKernelShape {
        /// Kernel rows
        rows: usize,
        /// Kernel columns
        cols: usize,
        /// What was wrong
        reason: String,
    },

    /// Channel count mismatch when interpreting data under a color model.
    #[error("invalid color: expected {expected} channels, got {got}")]
    InvalidColor {
        /// Channels required
        expected: usize,
        /// Channels supplied
        got: usize,
    },

    /// A source carries a color model the operation cannot read.
    #[error("invalid color: expected {expected}, got {got}")]
    InvalidColorModel {
        /// Models accepted
        expected: &'static str,
        /// Color supplied
        got: Color,
    },

    /// The element kind cannot support the requested operation.
    #[error("{op} is not supported for kind {kind}")]
    Unsupported {
        /// Kind name
        kind: &'static str,
        /// Operation name
        op: String,
    },

    /// Division by a zero (or non-finite) divisor.
    #[error("division by zero: {0}")]
    DivisionByZero(String),

    /// A parameter value is outside its valid domain.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// I/O failure on a file-backed buffer.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failure reported by an external decoder, encoder or frame source.
    #[error("{0}")]
    Collaborator(String),
}

impl Error {
    /// Creates an [`Error::InvalidShape`] error.
    #[inline]
    pub fn invalid_shape(msg: impl Into<String>) -> Self {
        Self::InvalidShape(msg.into())
    }

    /// Creates an [`Error::InvalidKernelShape`] error.
    #[inline]
    pub fn invalid_kernel_shape(rows: usize, cols: usize, reason: impl Into<String>) -> Self {
        Self::InvalidKernelShape {
            rows,
            cols,
            reason: reason.into(),
        }
    }

    /// Creates an [`Error::InvalidColor`] error.
    #[inline]
    pub fn invalid_color(expected: usize, got: usize) -> Self {
        Self::InvalidColor { expected, got }
    }

    /// Creates an [`Error::InvalidColorModel`] error.
    #[inline]
    pub fn invalid_color_model(expected: &'static str, got: Color) -> Self {
        Self::InvalidColorModel { expected, got }
    }

    /// Creates an [`Error::Unsupported`] error.
    #[inline]
    pub fn unsupported(kind: &'static str, op: impl Into<String>) -> Self {
        Self::Unsupported { kind, op: op.into() }
    }

    /// Creates an [`Error::InvalidParameter`] error.
    #[inline]
    pub fn invalid_parameter(msg: impl Into<String>) -> Self {
        Self::InvalidParameter(msg.into())
    }

    /// Creates an [`Error::Collaborator`] error.
    #[inline]
    pub fn collaborator(msg: impl Into<String>) -> Self {
        Self::Collaborator(msg.into())
    }

    /// Returns `true` for geometry mismatches (image or kernel).
    #[inline]
    pub fn is_shape_error(&self) -> bool {
        matches!(self, Self::InvalidShape(_) | Self::InvalidKernelShape { .. })
    }

    /// Returns `true` for channel-count or color-model mismatches.
    #[inline]
    pub fn is_color_error(&self) -> bool {
        matches!(self, Self::InvalidColor { .. } | Self::InvalidColorModel { .. })
    }

    /// Returns `true` if this is an I/O error.
    #[inline]
    pub fn is_io_error(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}
