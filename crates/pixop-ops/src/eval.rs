//! The operation interpreter.
//!
//! [`eval`] validates an [`Op`] against the destination and sources, then
//! walks every `(x, y, channel)` of the destination (rows outer, columns
//! inner, channels innermost) and writes `of_float(op(x, y, c))`.
//!
//! Rows are written independently of each other, so callers wanting
//! parallelism can split the destination into row bands and evaluate each
//! band with [`eval_region`].
//!
//! # Sampling
//!
//! - Pointwise and filter reads use integer coordinates; taps outside a
//!   source read its kind minimum.
//! - `Transform` reads the source bilinearly at the preimage of each
//!   destination pixel; each of the four taps follows the same boundary
//!   policy.

use crate::guard::{validate, Target};
use crate::Op;
use pixop_core::{luma_rec709, Color, Image, Kernel, Kind, Rect, Result, Source};
use tracing::{debug, trace};

/// Evaluates `op` into every pixel of `dest`.
///
/// # Errors
///
/// Fails before touching `dest` if the operation does not fit the
/// destination and sources (see [`crate::guard::validate`]).
pub fn eval<K: Kind>(op: &Op, dest: &mut Image<K>, sources: &[&dyn Source]) -> Result<()> {
    let region = dest.bounds();
    eval_region(op, dest, sources, region)
}

/// Evaluates `op` into the pixels of `dest` inside `region` only.
///
/// Validation still runs against the full destination shape.
pub fn eval_region<K: Kind>(
    op: &Op,
    dest: &mut Image<K>,
    sources: &[&dyn Source],
    region: Rect,
) -> Result<()> {
    let target = Target {
        width: dest.width(),
        height: dest.height(),
        channels: dest.channels(),
        kind: K::ID,
    };
    validate(op, &target, sources)?;
    debug!(
        nodes = op.node_count(),
        width = target.width,
        height = target.height,
        channels = target.channels,
        kind = K::name(),
        sources = sources.len(),
        "eval"
    );
    trace!(?region, "eval region");

    let interp = Interpreter {
        sources,
        min: K::MIN_F,
        max: K::MAX_F,
    };
    let channels = target.channels;
    dest.each_pixel_in(region, |x, y, px| {
        for c in 0..channels {
            px.set_float(c, interp.value(op, x, y, c));
        }
    });
    Ok(())
}

/// Reads `src` at a fractional position with bilinear weights.
pub fn sample_bilinear(src: &dyn Source, x: f64, y: f64, c: usize) -> f64 {
    let x0 = x.floor();
    let y0 = y.floor();
    let fx = x - x0;
    let fy = y - y0;
    // every tap of a far-away position reads outside; keep `+ 1` in range
    let ix = x0.clamp(-2.0, src.width() as f64 + 1.0) as isize;
    let iy = y0.clamp(-2.0, src.height() as f64 + 1.0) as isize;

    let p00 = src.sample(ix, iy, c);
    let p10 = src.sample(ix + 1, iy, c);
    let p01 = src.sample(ix, iy + 1, c);
    let p11 = src.sample(ix + 1, iy + 1, c);

    let top = p00 * (1.0 - fx) + p10 * fx;
    let bot = p01 * (1.0 - fx) + p11 * fx;
    top * (1.0 - fy) + bot * fy
}

struct Interpreter<'a, 's> {
    sources: &'a [&'s dyn Source],
    min: f64,
    max: f64,
}

impl Interpreter<'_, '_> {
    fn value(&self, op: &Op, x: usize, y: usize, c: usize) -> f64 {
        match op {
            Op::Const(v) => *v,
            Op::KindMin => self.min,
            Op::KindMax => self.max,
            Op::Source(i) => self.sources[*i].sample(x as isize, y as isize, c),
            Op::Join(f, a, b) => {
                if let (Op::Filter(k1, i), Op::Filter(k2, j)) = (&**a, &**b) {
                    if i == j && (k1.rows(), k1.cols()) == (k2.rows(), k2.cols()) {
                        let (s1, s2) = self.filter_pair(k1, k2, *i, x, y, c);
                        return f.apply(s1, s2);
                    }
                }
                f.apply(self.value(a, x, y, c), self.value(b, x, y, c))
            }
            Op::Map(f, a) => f.apply(self.value(a, x, y, c)),
            Op::Grayscale(i) => {
                let src = self.sources[*i];
                let (sx, sy) = (x as isize, y as isize);
                luma_rec709([src.sample(sx, sy, 0), src.sample(sx, sy, 1), src.sample(sx, sy, 2)])
            }
            Op::Broadcast(i) => self.sources[*i].sample(x as isize, y as isize, 0),
            Op::Threshold(t, a) => {
                if self.value(a, x, y, c) > t[c] {
                    self.max
                } else {
                    self.min
                }
            }
            Op::Filter(k, i) => self.filter(k, *i, x, y, c),
            Op::Transform(inverse, i) => {
                let (sx, sy) = inverse.apply(x as f64, y as f64);
                sample_bilinear(self.sources[*i], sx, sy, c)
            }
            Op::ColorMatrix(m, _, a) => {
                if c < 3 {
                    let row = m[c];
                    row[0] * self.value(a, x, y, 0)
                        + row[1] * self.value(a, x, y, 1)
                        + row[2] * self.value(a, x, y, 2)
                } else {
                    self.value(a, x, y, c)
                }
            }
        }
    }

    fn filter(&self, k: &Kernel, i: usize, x: usize, y: usize, c: usize) -> f64 {
        let src = self.sources[i];
        let (cy, cx) = k.center();
        let mut acc = 0.0;
        for ky in 0..k.rows() {
            let sy = (y + ky) as isize - cy as isize;
            for kx in 0..k.cols() {
                let sx = (x + kx) as isize - cx as isize;
                acc += k.get(ky, kx) * src.sample(sx, sy, c);
            }
        }
        acc
    }

    // k1 and k2 share a shape; one walk over the footprint feeds both sums
    fn filter_pair(
        &self,
        k1: &Kernel,
        k2: &Kernel,
        i: usize,
        x: usize,
        y: usize,
        c: usize,
    ) -> (f64, f64) {
        let src = self.sources[i];
        let (cy, cx) = k1.center();
        let (mut acc1, mut acc2) = (0.0, 0.0);
        for ky in 0..k1.rows() {
            let sy = (y + ky) as isize - cy as isize;
            for kx in 0..k1.cols() {
                let sx = (x + kx) as isize - cx as isize;
                let v = src.sample(sx, sy, c);
                acc1 += k1.get(ky, kx) * v;
                acc2 += k2.get(ky, kx) * v;
            }
        }
        (acc1, acc2)
    }
}

impl Op {
    /// Method form of [`eval`].
    pub fn eval<K: Kind>(&self, dest: &mut Image<K>, sources: &[&dyn Source]) -> Result<()> {
        eval(self, dest, sources)
    }

    /// Method form of [`eval_region`].
    pub fn eval_region<K: Kind>(
        &self,
        dest: &mut Image<K>,
        sources: &[&dyn Source],
        region: Rect,
    ) -> Result<()> {
        eval_region(self, dest, sources, region)
    }

    /// Evaluates into a new interleaved `width x height` image.
    pub fn render<K: Kind>(
        &self,
        width: usize,
        height: usize,
        color: Color,
        sources: &[&dyn Source],
    ) -> Result<Image<K>> {
        let mut dest = Image::new(width, height, color);
        eval(self, &mut dest, sources)?;
        Ok(dest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BinaryFn, UnaryFn};
    use approx::assert_abs_diff_eq;
    use pixop_core::{Complex64, Error, Layout, Pixel};
    use pixop_math::Affine2;

    fn pattern(width: usize, height: usize, color: Color, seed: usize) -> Image<u8> {
        let mut img = Image::new(width, height, color);
        img.each_pixel(|x, y, px| {
            for c in 0..px.channels() {
                px.set(c, ((x * 37 + y * 91 + c * 53 + seed * 17) % 256) as u8);
            }
        });
        img
    }

    #[test]
    fn test_blend() {
        let a = pattern(4, 3, Color::RGB, 1);
        let b = pattern(4, 3, Color::RGB, 2);
        let out: Image<f64> = Op::blend().render(4, 3, Color::RGB, &[&a, &b]).unwrap();
        let expected = (a.get_float(2, 1, 1) + b.get_float(2, 1, 1)) / 2.0;
        assert_abs_diff_eq!(out.get(2, 1, 1), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_blend_shape_mismatch() {
        let a = pattern(4, 3, Color::RGB, 1);
        let b = pattern(5, 3, Color::RGB, 2);
        let mut dest = a.like();
        let err = Op::blend().eval(&mut dest, &[&a, &b]).unwrap_err();
        assert!(matches!(err, Error::InvalidShape(_)));
        assert!(dest.data().as_slice().iter().all(|&v| v == 0));
    }

    #[test]
    fn test_min_max_symmetry() {
        let a = pattern(5, 4, Color::RGBA, 3);
        let b = pattern(5, 4, Color::RGBA, 8);
        for op in [Op::min(), Op::max()] {
            let mut ab = a.like();
            let mut ba = a.like();
            op.eval(&mut ab, &[&a, &b]).unwrap();
            op.eval(&mut ba, &[&b, &a]).unwrap();
            assert_eq!(ab, ba);
        }
        let mut lo = a.like();
        Op::min().eval(&mut lo, &[&a, &b]).unwrap();
        assert_eq!(lo.get(3, 2, 1), a.get(3, 2, 1).min(b.get(3, 2, 1)));
    }

    #[test]
    fn test_grayscale_red() {
        let mut rgb: Image<u8> = Image::new(2, 2, Color::RGB);
        rgb.set_pixel(0, 0, &Pixel::from_slice(&[1.0, 0.0, 0.0])).unwrap();
        let mut gray: Image<u8> = Image::new(2, 2, Color::GRAY);
        Op::grayscale().eval(&mut gray, &[&rgb]).unwrap();
        // 0.2126 * 255 = 54.213
        assert_eq!(gray.get(0, 0, 0), 54);
        assert_eq!(gray.get(1, 1, 0), 0);

        let mut back: Image<u8> = Image::new(2, 2, Color::RGB);
        Op::color().eval(&mut back, &[&gray]).unwrap();
        assert_eq!(back.get_pixel(0, 0), Pixel::filled(3, 54.0 / 255.0));
    }

    #[test]
    fn test_color_model_rejected_before_writing() {
        let xyz: Image<u8> = Image::new(2, 2, Color::XYZ);
        let yuv: Image<u8> = Image::new(2, 2, Color::YUV);
        let mut gray: Image<u8> = Image::new(2, 2, Color::GRAY);
        gray.fill(7);
        assert!(matches!(
            Op::grayscale().eval(&mut gray, &[&xyz]),
            Err(Error::InvalidColorModel { .. })
        ));
        assert_eq!(gray.get(1, 1, 0), 7);

        let mut rgb: Image<u8> = Image::new(2, 2, Color::RGB);
        assert!(Op::rgb_to_xyz().eval(&mut rgb, &[&yuv]).unwrap_err().is_color_error());
    }

    #[test]
    fn test_invert_uses_destination_kind() {
        let a = pattern(3, 3, Color::GRAY, 0);
        let mut out = a.like();
        Op::invert().eval(&mut out, &[&a]).unwrap();
        assert_eq!(out.get(1, 2, 0), 255 - a.get(1, 2, 0));

        let mut wide: Image<u16> = a.like_kind();
        Op::invert().eval(&mut wide, &[&a]).unwrap();
        assert_eq!(wide.get(1, 2, 0), 65535 - a.get(1, 2, 0) as u16 * 257);
    }

    #[test]
    fn test_threshold() {
        let a = pattern(4, 4, Color::RGB, 5);
        let mut out = a.like();
        Op::threshold(vec![0.5, 0.0, 1.0]).eval(&mut out, &[&a]).unwrap();
        out.each_pixel(|x, y, px| {
            let expect = if a.get_float(x, y, 0) > 0.5 { 255 } else { 0 };
            assert_eq!(px.get(0), expect);
            assert_eq!(px.get(2), 0);
        });
        assert!(Op::threshold(vec![0.5]).eval(&mut out, &[&a]).is_err());
    }

    #[test]
    fn test_brightness() {
        let a = pattern(3, 2, Color::RGB, 4);
        let mut out = a.like();
        Op::brightness(1.0).eval(&mut out, &[&a]).unwrap();
        assert_eq!(out, a);
        Op::brightness(0.0).eval(&mut out, &[&a]).unwrap();
        assert!(out.data().as_slice().iter().all(|&v| v == 0));

        let mut signed: Image<i32> = a.convert(None);
        let src = signed.clone();
        Op::brightness(0.0).eval(&mut signed, &[&src]).unwrap();
        assert!(signed.data().as_slice().iter().all(|&v| v == i32::MIN));
        Op::brightness(1.0).eval(&mut signed, &[&src]).unwrap();
        assert_eq!(signed, src);
    }

    #[test]
    fn test_filter_matches_image_filter() {
        let a = pattern(6, 5, Color::RGB, 7);
        let k = Kernel::gaussian(1, 0.8).unwrap();
        let mut out = a.like();
        Op::filter(k.clone()).eval(&mut out, &[&a]).unwrap();
        assert_eq!(out, a.filter(&k));
    }

    #[test]
    fn test_sobel_flat_interior_is_zero() {
        let mut flat: Image<u8> = Image::new(6, 6, Color::GRAY);
        flat.fill(120);
        let mut out = flat.like();
        Op::sobel().eval(&mut out, &[&flat]).unwrap();
        for y in 1..5 {
            for x in 1..5 {
                assert_eq!(out.get(x, y, 0), 0);
            }
        }
        // the border sees the zero boundary
        assert!(out.get(0, 3, 0) > 0);
    }

    #[test]
    fn test_fused_filters_match_separate() {
        let a: Image<f64> = pattern(5, 5, Color::GRAY, 2).convert(None);
        let k1 = Kernel::gaussian(1, 1.0).unwrap();
        let k2 = Kernel::box_blur(1);
        let mut fused = a.like();
        Op::join_filter(BinaryFn::Min, k1.clone(), k2.clone())
            .eval(&mut fused, &[&a])
            .unwrap();
        let (f1, f2) = (a.filter(&k1), a.filter(&k2));
        fused.each_pixel(|x, y, px| assert_eq!(px.get(0), f1.get(x, y, 0).min(f2.get(x, y, 0))));
    }

    #[test]
    fn test_transform_identity_and_shift() {
        let a = pattern(4, 3, Color::RGB, 6);
        let mut out = a.like();
        Op::transform(Affine2::IDENTITY).unwrap().eval(&mut out, &[&a]).unwrap();
        assert_eq!(out, a);

        Op::transform(Affine2::translation(1.0, 0.0)).unwrap().eval(&mut out, &[&a]).unwrap();
        assert_eq!(out.get(0, 1, 2), 0);
        assert_eq!(out.get(3, 1, 2), a.get(2, 1, 2));
    }

    #[test]
    fn test_transform_quarter_turn_matches_rotate() {
        let a = pattern(4, 3, Color::RGB, 9);
        let turn = Affine2::from_rows([[0.0, -1.0, 2.0], [1.0, 0.0, 0.0]]);
        let mut out: Image<u8> = Image::new(3, 4, Color::RGB);
        Op::transform(turn).unwrap().eval(&mut out, &[&a]).unwrap();
        assert_eq!(out, a.rotate_90());
    }

    #[test]
    fn test_transform_half_pixel_is_bilinear() {
        let mut a: Image<f64> = Image::new(2, 1, Color::GRAY);
        a.set(0, 0, 0, 0.2);
        a.set(1, 0, 0, 0.6);
        let mut out: Image<f64> = Image::new(1, 1, Color::GRAY);
        Op::transform(Affine2::translation(-0.5, 0.0)).unwrap().eval(&mut out, &[&a]).unwrap();
        assert_abs_diff_eq!(out.get(0, 0, 0), 0.4, epsilon = 1e-12);
    }

    #[test]
    fn test_transform_far_off_image() {
        let mut a: Image<u8> = Image::new(2, 2, Color::GRAY);
        a.fill(200);
        let mut out: Image<u8> = Image::new(2, 2, Color::GRAY);
        out.fill(9);
        for (dx, dy) in [(-1e19, 0.0), (1e19, 0.0), (0.0, -1e300), (0.0, 1e300)] {
            Op::transform(Affine2::translation(dx, dy)).unwrap().eval(&mut out, &[&a]).unwrap();
            assert_eq!(out.get(1, 1, 0), 0);
        }
        assert_eq!(sample_bilinear(&a, -1e19, 0.5, 0), 0.0);
    }

    #[test]
    fn test_color_matrix_roundtrip() {
        let a: Image<f64> = pattern(3, 3, Color::RGBA, 1).convert(None);
        // chroma goes negative; complex samples are not clamped
        let mut yuv: Image<Complex64> = Image::new(3, 3, Color::YUVA);
        Op::rgb_to_yuv().eval(&mut yuv, &[&a]).unwrap();
        let expected = a.get_pixel(1, 2).rgb_to_yuv().unwrap();
        assert_abs_diff_eq!(yuv.get(1, 2, 1).re, expected[1], epsilon = 1e-12);
        assert_eq!(yuv.get(1, 2, 3).re, a.get(1, 2, 3));

        let mut back = a.like();
        Op::yuv_to_rgb().unwrap().eval(&mut back, &[&yuv]).unwrap();
        for (v, w) in back.data().as_slice().iter().zip(a.data().as_slice()) {
            assert_abs_diff_eq!(v, w, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_mixed_kinds_and_layouts() {
        let a = pattern(3, 3, Color::RGB, 2);
        let b: Image<f32> = pattern(3, 3, Color::RGB, 4).convert::<f32>(None).to_layout(Layout::Planar);
        let diff = (Op::source(0) - Op::source(1)).map(UnaryFn::Abs);
        let out: Image<u8> = diff.render(3, 3, Color::RGB, &[&a, &b]).unwrap();
        assert_eq!(
            out.get(2, 0, 1),
            u8::of_float((a.get_float(2, 0, 1) - b.get(2, 0, 1) as f64).abs())
        );
    }

    #[test]
    fn test_eval_region_touches_only_region() {
        let a = pattern(4, 4, Color::GRAY, 3);
        let mut out = a.like();
        out.fill(7);
        Op::scalar(1.0)
            .eval_region(&mut out, &[&a], Rect::new(1, 1, 2, 2))
            .unwrap();
        assert_eq!(out.get(1, 1, 0), 255);
        assert_eq!(out.get(2, 2, 0), 255);
        assert_eq!(out.get(0, 0, 0), 7);
        assert_eq!(out.get(3, 2, 0), 7);
    }

    #[test]
    fn test_scalar_kind_bounds() {
        assert_eq!(Op::scalar_max::<u16>().node_count(), 1);
        let out: Image<i32> = (Op::scalar_min::<i32>() + 0.0).render(1, 1, Color::GRAY, &[]).unwrap();
        assert_eq!(out.get(0, 0, 0), i32::MIN);
        let out: Image<u8> = Op::KindMax.render(1, 1, Color::GRAY, &[]).unwrap();
        assert_eq!(out.get(0, 0, 0), 255);
    }
}
