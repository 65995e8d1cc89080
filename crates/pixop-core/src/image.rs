//! Two-dimensional images over typed buffers.
//!
//! An [`Image`] wraps a [`Data`] buffer with a width, height, [`Color`]
//! and [`Layout`]. It owns the index arithmetic, per-pixel access, region
//! iteration, rotation, convolution and conversion between kinds.
//!
//! # Memory layout
//!
//! ```text
//! Interleaved: offset(x, y, c) = y * step + channels * x + c
//!              [R G B R G B ...]  row 0
//!              [R G B R G B ...]  row 1
//!
//! Planar:      offset(x, y, c) = width * height * c + y * width + x
//!              [R R R ... | G G G ... | B B B ...]
//! ```
//!
//! `step` is `width * channels` for both layouts, so the buffer always
//! holds `step * height` elements.
//!
//! # Boundary policy
//!
//! [`Image::get`] and every read made by filters, transforms and ops
//! return the kind minimum for coordinates outside `[0, width) x [0,
//! height)`. [`Image::set`] outside the image panics.
//!
//! # Usage
//!
//! ```rust
//! use pixop_core::{Color, Image, Kernel};
//!
//! let mut img: Image<u8> = Image::new(4, 4, Color::RGB);
//! img.set(1, 2, 0, 255);
//! assert_eq!(img.get(1, 2, 0), 255);
//! assert_eq!(img.get(9, 9, 0), 0); // outside reads the kind minimum
//!
//! let blurred = img.filter(&Kernel::box_blur(1));
//! assert_eq!(blurred.width(), 4);
//!
//! let as_float = img.convert::<f32>(None);
//! assert_eq!(as_float.get(1, 2, 0), 1.0);
//! ```

use crate::{Color, Data, Error, Kernel, Kind, KindId, Pixel, Rect, Result, Source};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, trace};

/// Arrangement of channel samples in the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Layout {
    /// One plane per channel.
    Planar,
    /// Channels of a pixel stored together.
    #[default]
    Interleaved,
}

impl Layout {
    /// Lowercase name.
    pub const fn name(&self) -> &'static str {
        match self {
            Layout::Planar => "planar",
            Layout::Interleaved => "interleaved",
        }
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Layout {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "planar" => Ok(Layout::Planar),
            "interleaved" | "packed" => Ok(Layout::Interleaved),
            other => Err(Error::invalid_parameter(format!("unknown layout '{other}'"))),
        }
    }
}

/// A `width x height` image of `K` samples.
#[derive(Debug, Clone, PartialEq)]
pub struct Image<K: Kind> {
    width: usize,
    height: usize,
    color: Color,
    step: usize,
    layout: Layout,
    data: Data<K>,
}

impl<K: Kind> Eq for Image<K> {}

fn element_count(width: usize, height: usize, color: Color) -> Result<usize> {
    width
        .checked_mul(height)
        .and_then(|n| n.checked_mul(color.channels()))
        .ok_or_else(|| Error::invalid_shape(format!("{width}x{height} {color} image overflows")))
}

impl<K: Kind> Image<K> {
    /// Allocates a zeroed interleaved image.
    pub fn new(width: usize, height: usize, color: Color) -> Self {
        Self::with_layout(width, height, color, Layout::Interleaved)
    }

    /// Allocates a zeroed image with the given layout.
    pub fn with_layout(width: usize, height: usize, color: Color, layout: Layout) -> Self {
        Self {
            width,
            height,
            color,
            step: width * color.channels(),
            layout,
            data: Data::new(width * height * color.channels()),
        }
    }

    /// Wraps an existing buffer.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidShape`] unless `data` holds exactly
    /// `width * height * channels` elements.
    pub fn of_data(
        width: usize,
        height: usize,
        color: Color,
        layout: Layout,
        data: Data<K>,
    ) -> Result<Self> {
        let expected = element_count(width, height, color)?;
        if data.len() != expected {
            return Err(Error::invalid_shape(format!(
                "{width}x{height} {color} image needs {expected} elements, buffer has {}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            color,
            step: width * color.channels(),
            layout,
            data,
        })
    }

    /// Wraps interleaved samples.
    pub fn of_vec(width: usize, height: usize, color: Color, values: Vec<K>) -> Result<Self> {
        Self::of_data(width, height, color, Layout::Interleaved, Data::from_vec(values))
    }

    /// Creates a zeroed image backed by a new file at `path`.
    pub fn create_mapped(
        path: impl AsRef<Path>,
        width: usize,
        height: usize,
        color: Color,
        layout: Layout,
    ) -> Result<Self> {
        let data = Data::create_mapped(path, element_count(width, height, color)?)?;
        Self::of_data(width, height, color, layout, data)
    }

    /// Maps an existing headerless file as an image of the given shape.
    pub fn open_mapped(
        path: impl AsRef<Path>,
        width: usize,
        height: usize,
        color: Color,
        layout: Layout,
    ) -> Result<Self> {
        let data = Data::open_mapped(path, element_count(width, height, color)?)?;
        Self::of_data(width, height, color, layout, data)
    }

    /// Zeroed image with the same shape, kind, color and layout.
    pub fn like(&self) -> Self {
        Self::with_layout(self.width, self.height, self.color, self.layout)
    }

    /// Zeroed image with the same shape but another kind.
    pub fn like_kind<K2: Kind>(&self) -> Image<K2> {
        Image::with_layout(self.width, self.height, self.color, self.layout)
    }

    /// Zeroed image with the same shape but another color.
    pub fn like_color(&self, color: Color) -> Self {
        Self::with_layout(self.width, self.height, color, self.layout)
    }

    /// Width in pixels.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in pixels.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Color descriptor.
    #[inline]
    pub fn color(&self) -> Color {
        self.color
    }

    /// Channels per pixel.
    #[inline]
    pub fn channels(&self) -> usize {
        self.color.channels()
    }

    /// Elements per row, `width * channels`.
    #[inline]
    pub fn step(&self) -> usize {
        self.step
    }

    /// Buffer layout.
    #[inline]
    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// Full-image rectangle.
    #[inline]
    pub fn bounds(&self) -> Rect {
        Rect::from_size(self.width, self.height)
    }

    /// Backing buffer.
    #[inline]
    pub fn data(&self) -> &Data<K> {
        &self.data
    }

    /// Mutable backing buffer.
    #[inline]
    pub fn data_mut(&mut self) -> &mut Data<K> {
        &mut self.data
    }

    /// Releases the backing buffer.
    pub fn into_data(self) -> Data<K> {
        self.data
    }

    /// Flat buffer offset of `(x, y, c)`; no bounds check.
    #[inline]
    pub fn offset(&self, x: usize, y: usize, c: usize) -> usize {
        match self.layout {
            Layout::Interleaved => y * self.step + self.color.channels() * x + c,
            Layout::Planar => self.width * self.height * c + y * self.width + x,
        }
    }

    #[inline]
    fn contains(&self, x: usize, y: usize, c: usize) -> bool {
        x < self.width && y < self.height && c < self.color.channels()
    }

    /// Sample at `(x, y, c)`, or `K::MIN` outside the image.
    #[inline]
    pub fn get(&self, x: usize, y: usize, c: usize) -> K {
        if self.contains(x, y, c) {
            self.data.get(self.offset(x, y, c))
        } else {
            K::MIN
        }
    }

    /// Like [`Image::get`] for signed coordinates, as produced by kernel
    /// footprints and transforms.
    #[inline]
    pub fn get_at(&self, x: isize, y: isize, c: usize) -> K {
        if x < 0 || y < 0 {
            return K::MIN;
        }
        self.get(x as usize, y as usize, c)
    }

    /// Writes the sample at `(x, y, c)`.
    ///
    /// # Panics
    ///
    /// Panics if the coordinate lies outside the image.
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, c: usize, value: K) {
        assert!(
            self.contains(x, y, c),
            "({x}, {y}, {c}) outside {}x{}x{} image",
            self.width,
            self.height,
            self.color.channels()
        );
        let i = self.offset(x, y, c);
        self.data.set(i, value);
    }

    /// Normalized sample at `(x, y, c)`.
    #[inline]
    pub fn get_float(&self, x: usize, y: usize, c: usize) -> f64 {
        self.get(x, y, c).to_float()
    }

    /// Quantizes and writes a normalized sample.
    #[inline]
    pub fn set_float(&mut self, x: usize, y: usize, c: usize, value: f64) {
        self.set(x, y, c, K::of_float(value));
    }

    /// All channels at `(x, y)`.
    pub fn get_pixel(&self, x: usize, y: usize) -> Pixel {
        let mut px = Pixel::new(self.channels());
        for c in 0..self.channels() {
            px[c] = self.get_float(x, y, c);
        }
        px
    }

    /// Writes all channels at `(x, y)`.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidColor`] if the pixel's channel count differs.
    pub fn set_pixel(&mut self, x: usize, y: usize, px: &Pixel) -> Result<()> {
        if px.len() != self.channels() {
            return Err(Error::invalid_color(self.channels(), px.len()));
        }
        for c in 0..px.len() {
            self.set_float(x, y, c, px[c]);
        }
        Ok(())
    }

    /// Sets every sample to `value`.
    pub fn fill(&mut self, value: K) {
        self.data.fill(value);
    }

    /// Sets every pixel to `px`.
    pub fn fill_pixel(&mut self, px: &Pixel) -> Result<()> {
        if px.len() != self.channels() {
            return Err(Error::invalid_color(self.channels(), px.len()));
        }
        let values: Vec<K> = (0..px.len()).map(|c| K::of_float(px[c])).collect();
        let (channels, plane, layout) = (values.len(), self.width * self.height, self.layout);
        let mut i = 0;
        self.data.map_inplace(|_| {
            let c = match layout {
                Layout::Interleaved => i % channels,
                Layout::Planar => i / plane,
            };
            i += 1;
            values[c]
        });
        Ok(())
    }

    /// Visits every pixel, rows outer, columns inner.
    pub fn each_pixel(&mut self, f: impl FnMut(usize, usize, &mut PixelMut<'_, K>)) {
        self.each_pixel_in(self.bounds(), f);
    }

    /// Visits the pixels of `region` (clipped to the image), rows outer,
    /// columns inner. Writes through the handle land in the buffer
    /// immediately.
    pub fn each_pixel_in(
        &mut self,
        region: Rect,
        mut f: impl FnMut(usize, usize, &mut PixelMut<'_, K>),
    ) {
        let Some(region) = region.clamp_to(self.width, self.height) else {
            return;
        };
        let (width, step, channels, layout) = (self.width, self.step, self.channels(), self.layout);
        let stride = match layout {
            Layout::Interleaved => 1,
            Layout::Planar => self.width * self.height,
        };
        let samples = self.data.as_mut_slice();
        for (x, y) in region.coords() {
            let base = match layout {
                Layout::Interleaved => y * step + channels * x,
                Layout::Planar => y * width + x,
            };
            let mut px = PixelMut {
                samples: &mut *samples,
                base,
                stride,
                channels,
            };
            f(x, y, &mut px);
        }
    }

    /// Per-channel mean over `region` (whole image if `None`), clipped to
    /// the image. An empty region averages to zeros.
    pub fn avg(&self, region: Option<Rect>) -> Pixel {
        let channels = self.channels();
        let mut sums = Pixel::new(channels);
        let Some(region) = region.unwrap_or(self.bounds()).clamp_to(self.width, self.height) else {
            return sums;
        };
        match self.layout {
            Layout::Interleaved => {
                for y in region.y..region.bottom() {
                    let row = self.data.slice(y * self.step + region.x * channels, region.width * channels);
                    row.fold(0, |i, v| {
                        sums[i % channels] += v.to_float();
                        i + 1
                    });
                }
            }
            Layout::Planar => {
                let plane = self.width * self.height;
                for c in 0..channels {
                    for y in region.y..region.bottom() {
                        let row = self.data.slice(c * plane + y * self.width + region.x, region.width);
                        sums[c] = row.fold(sums[c], |acc, v| acc + v.to_float());
                    }
                }
            }
        }
        let n = region.area() as f64;
        sums.map(|s| s / n)
    }

    fn remap(
        &self,
        width: usize,
        height: usize,
        dest_of: impl Fn(usize, usize) -> (usize, usize),
    ) -> Self {
        let mut out = Self::with_layout(width, height, self.color, self.layout);
        for y in 0..self.height {
            for x in 0..self.width {
                let (dx, dy) = dest_of(x, y);
                for c in 0..self.channels() {
                    out.set(dx, dy, c, self.get(x, y, c));
                }
            }
        }
        out
    }

    /// Rotates 90 degrees clockwise.
    pub fn rotate_90(&self) -> Self {
        let h = self.height;
        self.remap(self.height, self.width, |x, y| (h - 1 - y, x))
    }

    /// Rotates 180 degrees.
    pub fn rotate_180(&self) -> Self {
        let (w, h) = (self.width, self.height);
        self.remap(w, h, |x, y| (w - 1 - x, h - 1 - y))
    }

    /// Rotates 90 degrees counter-clockwise.
    pub fn rotate_270(&self) -> Self {
        let w = self.width;
        self.remap(self.height, self.width, |x, y| (y, w - 1 - x))
    }

    /// Converts to another kind through the float bridge, multiplying by
    /// `scale` when given.
    pub fn convert<K2: Kind>(&self, scale: Option<f64>) -> Image<K2> {
        let s = scale.unwrap_or(1.0);
        trace!(from = K::name(), to = K2::name(), scale = s, "convert");
        Image {
            width: self.width,
            height: self.height,
            color: self.color,
            step: self.step,
            layout: self.layout,
            data: self.data.convert(|v| K2::of_float(v.to_float() * s)),
        }
    }

    /// Like [`Image::convert`] but writes into `dest`, which may use a
    /// different layout.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidShape`] unless `dest` has the same width, height
    /// and channel count.
    pub fn convert_to<K2: Kind>(&self, dest: &mut Image<K2>, scale: Option<f64>) -> Result<()> {
        self.ensure_same_shape(dest, "convert_to")?;
        let s = scale.unwrap_or(1.0);
        trace!(from = K::name(), to = K2::name(), scale = s, "convert_to");
        if dest.layout == self.layout {
            return dest
                .data
                .map2_inplace(&self.data, |_, v| K2::of_float(v.to_float() * s));
        }
        for y in 0..self.height {
            for x in 0..self.width {
                for c in 0..self.channels() {
                    dest.set_float(x, y, c, self.get_float(x, y, c) * s);
                }
            }
        }
        Ok(())
    }

    fn ensure_same_shape<K2: Kind>(&self, other: &Image<K2>, op: &str) -> Result<()> {
        if (self.width, self.height, self.channels()) != (other.width, other.height, other.channels())
        {
            return Err(Error::invalid_shape(format!(
                "{op}: {}x{}x{} vs {}x{}x{}",
                self.width,
                self.height,
                self.channels(),
                other.width,
                other.height,
                other.channels()
            )));
        }
        Ok(())
    }

    /// Direct convolution into a new image of the same kind.
    pub fn filter(&self, kernel: &Kernel) -> Self {
        let mut out = self.like();
        self.convolve(kernel, &mut out);
        out
    }

    /// Direct convolution into `dest`.
    ///
    /// For every output sample,
    /// `sum(kernel[ky][kx] * self[x + kx - cx, y + ky - cy, c])` with
    /// `(cy, cx) = kernel.center()`; taps outside the image read the kind
    /// minimum.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidShape`] unless `dest` matches in width, height and
    /// channel count.
    pub fn filter_into<K2: Kind>(&self, kernel: &Kernel, dest: &mut Image<K2>) -> Result<()> {
        self.ensure_same_shape(dest, "filter_into")?;
        self.convolve(kernel, dest);
        Ok(())
    }

    fn convolve<K2: Kind>(&self, kernel: &Kernel, dest: &mut Image<K2>) {
        trace!(
            width = self.width,
            height = self.height,
            channels = self.channels(),
            kernel_rows = kernel.rows(),
            kernel_cols = kernel.cols(),
            "convolve"
        );
        let (cy, cx) = kernel.center();
        for y in 0..self.height {
            for x in 0..self.width {
                for c in 0..self.channels() {
                    let mut acc = 0.0;
                    for ky in 0..kernel.rows() {
                        let sy = (y + ky) as isize - cy as isize;
                        for kx in 0..kernel.cols() {
                            let sx = (x + kx) as isize - cx as isize;
                            acc += kernel.get(ky, kx) * self.sample(sx, sy, c);
                        }
                    }
                    dest.set_float(x, y, c, acc);
                }
            }
        }
    }

    /// Reinterprets the samples under another color with the same
    /// channel count.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidColor`] if the channel counts differ.
    pub fn with_color(self, color: Color) -> Result<Self> {
        if color.channels() != self.channels() {
            return Err(Error::invalid_color(self.channels(), color.channels()));
        }
        Ok(Self { color, ..self })
    }

    /// Copy rearranged into `layout`.
    pub fn to_layout(&self, layout: Layout) -> Self {
        if layout == self.layout {
            return self.clone();
        }
        debug!(from = %self.layout, to = %layout, "relayout");
        let mut out = Self::with_layout(self.width, self.height, self.color, layout);
        self.copy_region(self.bounds(), &mut out);
        out
    }

    /// Copy of the pixels inside `rect`.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidShape`] if `rect` is empty or leaves the image.
    pub fn crop(&self, rect: Rect) -> Result<Self> {
        if rect.is_empty() || rect.right() > self.width || rect.bottom() > self.height {
            return Err(Error::invalid_shape(format!(
                "crop {rect:?} outside {}x{} image",
                self.width, self.height
            )));
        }
        let mut out = Self::with_layout(rect.width, rect.height, self.color, self.layout);
        self.copy_region(rect, &mut out);
        Ok(out)
    }

    fn copy_region(&self, rect: Rect, out: &mut Self) {
        for (x, y) in rect.coords() {
            for c in 0..self.channels() {
                out.set(x - rect.x, y - rect.y, c, self.get(x, y, c));
            }
        }
    }

    /// Writes a mapped backing file to disk; no-op for heap buffers.
    pub fn flush(&self) -> Result<()> {
        self.data.flush()
    }
}

impl<K: Kind> Source for Image<K> {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn color(&self) -> Color {
        self.color
    }

    fn kind(&self) -> KindId {
        K::ID
    }

    #[inline]
    fn sample(&self, x: isize, y: isize, c: usize) -> f64 {
        self.get_at(x, y, c).to_float()
    }
}

/// Write-through handle to one pixel, passed to [`Image::each_pixel`]
/// callbacks.
pub struct PixelMut<'a, K: Kind> {
    samples: &'a mut [K],
    base: usize,
    stride: usize,
    channels: usize,
}

impl<K: Kind> PixelMut<'_, K> {
    /// Channel count.
    #[inline]
    pub fn channels(&self) -> usize {
        self.channels
    }

    #[inline]
    fn index(&self, c: usize) -> usize {
        assert!(c < self.channels, "channel {c} out of range");
        self.base + c * self.stride
    }

    /// Typed sample of channel `c`.
    #[inline]
    pub fn get(&self, c: usize) -> K {
        self.samples[self.index(c)]
    }

    /// Writes channel `c`.
    #[inline]
    pub fn set(&mut self, c: usize, value: K) {
        let i = self.index(c);
        self.samples[i] = value;
    }

    /// Normalized sample of channel `c`.
    #[inline]
    pub fn get_float(&self, c: usize) -> f64 {
        self.get(c).to_float()
    }

    /// Quantizes and writes channel `c`.
    #[inline]
    pub fn set_float(&mut self, c: usize, value: f64) {
        self.set(c, K::of_float(value));
    }

    /// Copies the channels out.
    pub fn to_pixel(&self) -> Pixel {
        let mut px = Pixel::new(self.channels);
        for c in 0..self.channels {
            px[c] = self.get_float(c);
        }
        px
    }

    /// Writes every channel from `px`.
    pub fn set_pixel(&mut self, px: &Pixel) -> Result<()> {
        if px.len() != self.channels {
            return Err(Error::invalid_color(self.channels, px.len()));
        }
        for c in 0..self.channels {
            self.set_float(c, px[c]);
        }
        Ok(())
    }
}
