//! Kind-erased read access to images.
//!
//! Operations read their inputs through [`Source`] so that one evaluation
//! can mix images of different kinds (a `u8` mask and an `f32` plate, say).
//! Every read goes through the float bridge and the boundary policy of
//! [`crate::Image::get`].

use crate::{Color, KindId};

/// Read-only, kind-erased view of an image.
pub trait Source {
    /// Width in pixels.
    fn width(&self) -> usize;

    /// Height in pixels.
    fn height(&self) -> usize;

    /// Color descriptor.
    fn color(&self) -> Color;

    /// Element kind of the backing buffer.
    fn kind(&self) -> KindId;

    /// Normalized value at `(x, y, c)`; coordinates outside the image
    /// read as the kind minimum.
    fn sample(&self, x: isize, y: isize, c: usize) -> f64;

    /// Channel count.
    fn channels(&self) -> usize {
        self.color().channels()
    }

    /// `(width, height)`.
    fn dimensions(&self) -> (usize, usize) {
        (self.width(), self.height())
    }
}
