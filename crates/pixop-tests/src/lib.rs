//! Integration tests for pixop crates.
//!
//! End-to-end scenarios spanning the kind bridge, images, kernels and the
//! operation interpreter.

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use pixop_core::{
        Color, Complex64, Data, Decoder, Error, Image, Kernel, Kind, Layout, Pixel, Rect, Result,
        Source, f16,
    };
    use pixop_math::Affine2;
    use pixop_ops::{BinaryFn, Op};
    use std::path::Path;
    use tempfile::tempdir;

    fn ramp<K: Kind>(width: usize, height: usize, color: Color, layout: Layout) -> Image<K> {
        let mut img = Image::with_layout(width, height, color, layout);
        let n = (width * height * color.channels()) as f64;
        img.each_pixel(|x, y, px| {
            for c in 0..px.channels() {
                let i = ((y * width + x) * px.channels() + c) as f64;
                px.set_float(c, (i * 7.0 % n) / n);
            }
        });
        img
    }

    fn assert_roundtrip<K: Kind>(values: impl IntoIterator<Item = K>) {
        for v in values {
            assert_eq!(K::of_float(v.to_float()), v, "{} value {v:?}", K::name());
        }
    }

    #[test]
    fn test_kind_roundtrip_every_kind() {
        assert_roundtrip(0..=u8::MAX);
        assert_roundtrip((0..=u16::MAX).step_by(97));
        assert_roundtrip([i32::MIN, -1, 0, 1, 12345, i32::MAX]);
        assert_roundtrip([i64::MIN, -(1 << 40), 0, 1 << 40]);
        assert_roundtrip([f16::ZERO, f16::from_f32(0.25), f16::ONE]);
        assert_roundtrip([0.0f32, 0.125, 0.7, 1.0]);
        assert_roundtrip([0.0f64, 1e-9, 0.5, 1.0]);
        assert_roundtrip([Complex64::new(0.25, 0.0), Complex64::new(1.0, 0.0)]);
    }

    #[test]
    fn test_shape_invariant_across_kinds() {
        fn check<K: Kind>() {
            for layout in [Layout::Interleaved, Layout::Planar] {
                for color in [Color::GRAY, Color::RGB, Color::RGBA] {
                    let img: Image<K> = Image::with_layout(7, 5, color, layout);
                    assert_eq!(img.data().len(), img.step() * img.height());
                    assert_eq!(img.step(), img.width() * color.channels());
                }
            }
        }
        check::<u8>();
        check::<i64>();
        check::<f16>();
        check::<Complex64>();
    }

    #[test]
    fn test_normalize_idempotent() {
        let kernels = [
            Kernel::gaussian(2, 1.3).unwrap().map(|w| w * 3.0),
            Kernel::from_rows(&[[1.0, -2.0, 4.0], [0.5, 0.5, 7.0]]).unwrap(),
            Kernel::sharpen(0.7),
        ];
        for k in kernels {
            let once = k.normalize().unwrap();
            let twice = once.normalize().unwrap();
            assert_abs_diff_eq!(once.sum(), 1.0, epsilon = 1e-12);
            for (a, b) in once.weights().iter().zip(twice.weights()) {
                assert_abs_diff_eq!(a, b, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_zero_sum_kernel() {
        let k = Kernel::new(3, 3).unwrap();
        let err = k.normalize().unwrap_err();
        assert!(matches!(err, Error::DivisionByZero(_)));
    }

    #[test]
    fn test_min_max_symmetric_across_kinds() {
        let a: Image<u8> = ramp(6, 4, Color::RGB, Layout::Interleaved);
        let b: Image<u16> = ramp::<u16>(6, 4, Color::RGB, Layout::Planar).rotate_180();
        for op in [Op::min(), Op::max()] {
            let ab: Image<f32> = op.render(6, 4, Color::RGB, &[&a, &b]).unwrap();
            let ba: Image<f32> = op.render(6, 4, Color::RGB, &[&b, &a]).unwrap();
            assert_eq!(ab, ba);
        }
    }

    #[test]
    fn test_conversion_consistency() {
        let src: Image<u8> = ramp(8, 8, Color::RGBA, Layout::Interleaved);
        assert_eq!(src.convert::<f32>(Some(1.0)).convert::<u8>(Some(1.0)), src);
        assert_eq!(src.convert::<i32>(Some(1.0)).convert::<u8>(Some(1.0)), src);

        let wide: Image<u16> = ramp(8, 8, Color::RGB, Layout::Planar);
        let back = wide.convert::<u8>(Some(1.0)).convert::<u16>(Some(1.0));
        for (a, b) in wide.data().as_slice().iter().zip(back.data().as_slice()) {
            // one u8 step is 257 u16 units; rounding keeps us within half of it
            assert!(a.abs_diff(*b) <= 129, "{a} vs {b}");
        }

        let float: Image<f32> = ramp(8, 8, Color::GRAY, Layout::Interleaved);
        let back = float.convert::<u8>(Some(1.0)).convert::<f32>(Some(1.0));
        for (a, b) in float.data().as_slice().iter().zip(back.data().as_slice()) {
            assert!((a - b).abs() <= 0.5 / 255.0 + 1e-6);
        }
    }

    #[test]
    fn test_boundary_policy() {
        fn check<K: Kind>() {
            let mut img: Image<K> = Image::new(3, 2, Color::RGB);
            img.fill(K::MAX);
            for (x, y) in [(3, 0), (0, 2), (100, 100)] {
                assert_eq!(img.get(x, y, 1), K::MIN);
            }
            assert_eq!(img.get_at(-1, 1, 0), K::MIN);
            assert_eq!(img.sample(-5, -5, 2), K::MIN_F);
        }
        check::<u8>();
        check::<u16>();
        check::<i32>();
        check::<i64>();
        check::<f32>();
        check::<f64>();
    }

    #[test]
    fn test_grayscale_scenario() {
        let mut rgb: Image<u8> = Image::new(2, 2, Color::RGB);
        rgb.set(0, 0, 0, 255);
        let mut gray: Image<u8> = Image::new(2, 2, Color::GRAY);
        Op::grayscale().eval(&mut gray, &[&rgb]).unwrap();
        let expected = u8::of_float(0.2126 * 1.0 + 0.7152 * 0.0 + 0.0722 * 0.0);
        assert_eq!(gray.get(0, 0, 0), expected);
        assert_eq!(expected, 54);
    }

    #[test]
    fn test_blend_width_mismatch() {
        let a: Image<u8> = Image::new(4, 4, Color::RGB);
        let b: Image<u8> = Image::new(3, 4, Color::RGB);
        let mut dest: Image<u8> = Image::new(4, 4, Color::RGB);
        let err = Op::blend().eval(&mut dest, &[&a, &b]).unwrap_err();
        assert!(err.is_shape_error());
    }

    #[test]
    fn test_sobel_uniform_image() {
        for level in [0.0, 0.25, 1.0] {
            let mut img: Image<f32> = Image::new(9, 7, Color::RGB);
            img.fill_pixel(&Pixel::filled(3, level)).unwrap();
            let sobel = Op::join_filter(BinaryFn::Hypot, Kernel::sobel_x(), Kernel::sobel_y());
            let mut out = img.like();
            sobel.eval(&mut out, &[&img]).unwrap();
            out.each_pixel_in(Rect::new(1, 1, 7, 5), |_, _, px| {
                for c in 0..3 {
                    assert_eq!(px.get(c), 0.0);
                }
            });
        }
    }

    #[test]
    fn test_band_evaluation_matches_full() {
        let src: Image<u16> = ramp(10, 9, Color::RGB, Layout::Interleaved);
        let op = Op::sobel() * 0.5 + Op::invert() * 0.5;
        let mut full = src.like();
        op.eval(&mut full, &[&src]).unwrap();

        let mut banded = src.like();
        for y0 in (0..9).step_by(4) {
            let band = Rect::new(0, y0, 10, 4);
            op.eval_region(&mut banded, &[&src], band).unwrap();
        }
        assert_eq!(banded, full);
    }

    #[test]
    fn test_mapped_destination() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.raw");
        let src: Image<u8> = ramp(5, 5, Color::GRAY, Layout::Interleaved);
        {
            let mut dest: Image<u8> =
                Image::create_mapped(&path, 5, 5, Color::GRAY, Layout::Interleaved).unwrap();
            Op::invert().eval(&mut dest, &[&src]).unwrap();
            dest.flush().unwrap();
        }
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes.len(), 25);
        assert_eq!(bytes[7], 255 - src.get(2, 1, 0));
    }

    #[test]
    fn test_transform_rotation_about_center() {
        let src: Image<f64> = ramp(5, 5, Color::GRAY, Layout::Interleaved);
        // half turn about the center pixel (2, 2)
        let forward = Affine2::translation(-2.0, -2.0)
            .then(&Affine2::rotation(std::f64::consts::PI))
            .then(&Affine2::translation(2.0, 2.0));
        let mut out = src.like();
        Op::transform(forward).unwrap().eval(&mut out, &[&src]).unwrap();
        let expected = src.rotate_180();
        for y in 0..5 {
            for x in 0..5 {
                assert_abs_diff_eq!(out.get(x, y, 0), expected.get(x, y, 0), epsilon = 1e-9);
            }
        }
    }

    struct FailingDecoder;

    impl Decoder for FailingDecoder {
        fn decode<K: Kind>(&self, path: &Path, _color: Color) -> Result<Image<K>> {
            Err(Error::collaborator(format!("cannot decode {}", path.display())))
        }
    }

    struct MemoryDecoder(Vec<u8>);

    impl Decoder for MemoryDecoder {
        fn decode<K: Kind>(&self, _path: &Path, color: Color) -> Result<Image<K>> {
            let values = self.0.iter().map(|&v| K::of_float(v as f64 / 255.0)).collect();
            Image::of_data(2, 2, color, Layout::Interleaved, Data::from_vec(values))
        }
    }

    #[test]
    fn test_collaborator_errors_surface() {
        let err = FailingDecoder.decode::<u8>(Path::new("missing.png"), Color::RGB).unwrap_err();
        assert!(matches!(err, Error::Collaborator(_)));
        assert_eq!(err.to_string(), "cannot decode missing.png");

        let short = MemoryDecoder(vec![0; 3]);
        assert!(short.decode::<u8>(Path::new("x"), Color::GRAY).unwrap_err().is_shape_error());

        let ok = MemoryDecoder(vec![0, 51, 102, 255]);
        let img: Image<f32> = ok.decode(Path::new("x"), Color::GRAY).unwrap();
        assert_abs_diff_eq!(img.avg(None)[0], (0.0 + 0.2 + 0.4 + 1.0) / 4.0, epsilon = 1e-6);
    }
}
