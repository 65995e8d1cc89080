//! Axis-aligned pixel rectangles.
//!
//! Used to restrict iteration ([`crate::Image::each_pixel_in`]), averaging
//! ([`crate::Image::avg`]) and cropping ([`crate::Image::crop`]) to part
//! of an image.
//!
//! Origin (0, 0) is the top-left corner; X grows right, Y grows down.
//!
//! ```rust
//! use pixop_core::Rect;
//!
//! let rect = Rect::new(10, 20, 100, 50);
//! assert!(rect.contains(15, 25));
//! assert_eq!(rect.right(), 110);
//!
//! let clipped = rect.clamp_to(64, 64).unwrap();
//! assert_eq!((clipped.width, clipped.height), (54, 44));
//! ```

/// Rectangle with an inclusive origin and exclusive far edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    /// Left edge (inclusive)
    pub x: usize,
    /// Top edge (inclusive)
    pub y: usize,
    /// Width in pixels
    pub width: usize,
    /// Height in pixels
    pub height: usize,
}

impl Rect {
    /// Creates a rectangle from origin and size.
    #[inline]
    pub const fn new(x: usize, y: usize, width: usize, height: usize) -> Self {
        Self { x, y, width, height }
    }

    /// Rectangle at the origin covering `width` x `height`.
    #[inline]
    pub const fn from_size(width: usize, height: usize) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Exclusive right edge.
    #[inline]
    pub const fn right(&self) -> usize {
        self.x + self.width
    }

    /// Exclusive bottom edge.
    #[inline]
    pub const fn bottom(&self) -> usize {
        self.y + self.height
    }

    /// Number of pixels covered.
    #[inline]
    pub const fn area(&self) -> usize {
        self.width * self.height
    }

    /// Returns `true` if the rectangle covers no pixels.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Returns `true` if `(x, y)` lies inside.
    #[inline]
    pub const fn contains(&self, x: usize, y: usize) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// Overlap of two rectangles, or `None` when they are disjoint.
    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if right <= x || bottom <= y {
            return None;
        }
        Some(Rect::new(x, y, right - x, bottom - y))
    }

    /// Clips the rectangle to a `width` x `height` image.
    pub fn clamp_to(&self, width: usize, height: usize) -> Option<Rect> {
        self.intersect(&Rect::from_size(width, height))
    }

    /// Row-major iterator over the covered coordinates.
    pub fn coords(&self) -> impl Iterator<Item = (usize, usize)> + use<> {
        let r = *self;
        (r.y..r.bottom()).flat_map(move |y| (r.x..r.right()).map(move |x| (x, y)))
    }
}
