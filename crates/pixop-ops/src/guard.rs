//! Eager validation of operation trees.
//!
//! Everything that can go wrong in an evaluation is checked here, once,
//! before the per-pixel loop starts:
//!
//! - every referenced source exists
//! - pointwise reads see a source of the destination's size
//! - channel counts suit the node (grayscale, broadcast, thresholds,
//!   color matrices)
//! - color models suit the node: grayscale reads RGB or RGBA, broadcast
//!   reads gray, `rgb_to_*` read RGB or RGBA, `xyz_to_rgb` reads XYZ(A)
//!   and `yuv_to_rgb` reads YUV(A)
//! - ordering nodes (`Min`, `Max`, `Threshold`) only touch ordered kinds
//!
//! The interpreter itself never fails.

use crate::Op;
use pixop_core::{ColorModel, Error, KindId, Result, Source};

/// Shape of the image an operation is evaluated into.
#[derive(Debug, Clone, Copy)]
pub struct Target {
    /// Width in pixels
    pub width: usize,
    /// Height in pixels
    pub height: usize,
    /// Channels per pixel
    pub channels: usize,
    /// Element kind
    pub kind: KindId,
}

/// Checks `op` against `target` and `sources`.
///
/// # Errors
///
/// - [`Error::InvalidShape`] for missing sources or size mismatches
/// - [`Error::InvalidColor`] for channel-count mismatches
/// - [`Error::InvalidColorModel`] for sources tagged with the wrong model
/// - [`Error::Unsupported`] for ordering over unordered kinds
pub fn validate(op: &Op, target: &Target, sources: &[&dyn Source]) -> Result<()> {
    let arity = op.arity();
    if arity > sources.len() {
        return Err(Error::invalid_shape(format!(
            "operation reads {arity} sources, {} supplied",
            sources.len()
        )));
    }
    check(op, target, sources)
}

fn check(op: &Op, target: &Target, sources: &[&dyn Source]) -> Result<()> {
    match op {
        Op::Const(_) | Op::KindMin | Op::KindMax => Ok(()),
        Op::Source(i) | Op::Filter(_, i) => {
            let src = sources[*i];
            ensure_same_size(target, src, *i)?;
            ensure_channels(target.channels, src.channels())
        }
        Op::Transform(_, i) => ensure_channels(target.channels, sources[*i].channels()),
        Op::Grayscale(i) => {
            let src = sources[*i];
            ensure_same_size(target, src, *i)?;
            ensure_channels(1, target.channels)?;
            ensure_model(src, ColorModel::Rgb)
        }
        Op::Broadcast(i) => {
            let src = sources[*i];
            ensure_same_size(target, src, *i)?;
            ensure_channels(1, src.channels())?;
            ensure_model(src, ColorModel::Gray)
        }
        Op::Threshold(t, a) => {
            ensure_channels(target.channels, t.len())?;
            ensure_ordered(a, "threshold", target, sources)?;
            check(a, target, sources)
        }
        Op::Join(f, a, b) => {
            if f.is_ordering() {
                ensure_ordered(op, "min/max", target, sources)?;
            }
            check(a, target, sources)?;
            check(b, target, sources)
        }
        Op::Map(_, a) => check(a, target, sources),
        Op::ColorMatrix(_, from, a) => {
            if target.channels < 3 {
                return Err(Error::invalid_color(3, target.channels));
            }
            if let Some(model) = from {
                let mut result = Ok(());
                visit_sources(a, &mut |i| {
                    if result.is_ok() {
                        result = ensure_model(sources[i], *model);
                    }
                });
                result?;
            }
            check(a, target, sources)
        }
    }
}

fn ensure_same_size(target: &Target, src: &dyn Source, index: usize) -> Result<()> {
    if src.dimensions() != (target.width, target.height) {
        return Err(Error::invalid_shape(format!(
            "source {index} is {}x{}, destination is {}x{}",
            src.width(),
            src.height(),
            target.width,
            target.height
        )));
    }
    Ok(())
}

fn ensure_channels(expected: usize, got: usize) -> Result<()> {
    if expected != got {
        return Err(Error::invalid_color(expected, got));
    }
    Ok(())
}

/// `Rgb` admits `Rgba`; every other model must match exactly.
fn ensure_model(src: &dyn Source, model: ColorModel) -> Result<()> {
    let color = src.color();
    let ok = match model {
        ColorModel::Rgb => matches!(color.model(), ColorModel::Rgb | ColorModel::Rgba),
        other => color.model() == other,
    };
    if ok {
        return Ok(());
    }
    let expected = match model {
        ColorModel::Gray => "gray",
        ColorModel::Rgb | ColorModel::Rgba => "rgb or rgba",
        ColorModel::Xyz => "xyz or xyza",
        ColorModel::Yuv => "yuv or yuva",
        ColorModel::Custom => "custom",
    };
    Err(Error::invalid_color_model(expected, color))
}

fn ensure_ordered(op: &Op, name: &str, target: &Target, sources: &[&dyn Source]) -> Result<()> {
    if !target.kind.is_ordered() {
        return Err(Error::unsupported(target.kind.name(), name));
    }
    let mut result = Ok(());
    visit_sources(op, &mut |i| {
        let kind = sources[i].kind();
        if result.is_ok() && !kind.is_ordered() {
            result = Err(Error::unsupported(kind.name(), name));
        }
    });
    result
}

fn visit_sources(op: &Op, f: &mut impl FnMut(usize)) {
    if let Some(i) = op.source_index() {
        f(i);
    }
    for child in op.children() {
        visit_sources(child, f);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pixop_core::{Color, Complex32, Image};

    fn target(width: usize, height: usize, channels: usize, kind: KindId) -> Target {
        Target {
            width,
            height,
            channels,
            kind,
        }
    }

    #[test]
    fn test_missing_source() {
        let a: Image<u8> = Image::new(2, 2, Color::GRAY);
        let err = validate(&Op::blend(), &target(2, 2, 1, KindId::U8), &[&a]).unwrap_err();
        assert!(err.is_shape_error());
    }

    #[test]
    fn test_transform_accepts_other_sizes() {
        let a: Image<u8> = Image::new(5, 3, Color::RGB);
        let op = Op::transform(pixop_math::Affine2::IDENTITY).unwrap();
        assert!(validate(&op, &target(2, 2, 3, KindId::U8), &[&a]).is_ok());
        assert!(validate(&Op::source(0), &target(2, 2, 3, KindId::U8), &[&a]).is_err());
    }

    #[test]
    fn test_ordering_rejects_complex() {
        let a: Image<Complex32> = Image::new(2, 2, Color::GRAY);
        let b: Image<u8> = Image::new(2, 2, Color::GRAY);
        let t = target(2, 2, 1, KindId::U8);
        assert!(matches!(
            validate(&Op::min(), &t, &[&b, &a]),
            Err(Error::Unsupported { kind: "complex32", .. })
        ));
        assert!(validate(&Op::threshold(vec![0.5]), &t, &[&a]).is_err());
        // arithmetic on complex sources is fine
        assert!(validate(&Op::blend(), &t, &[&b, &a]).is_ok());
        let ct = target(2, 2, 1, KindId::Complex32);
        assert!(validate(&Op::max(), &ct, &[&b, &b]).is_err());
    }

    #[test]
    fn test_color_checks() {
        let rgb: Image<u8> = Image::new(2, 2, Color::RGB);
        let gray: Image<u8> = Image::new(2, 2, Color::GRAY);
        let t1 = target(2, 2, 1, KindId::U8);
        let t3 = target(2, 2, 3, KindId::U8);
        assert!(validate(&Op::grayscale(), &t1, &[&rgb]).is_ok());
        assert!(matches!(
            validate(&Op::grayscale(), &t3, &[&rgb]),
            Err(Error::InvalidColor { expected: 1, got: 3 })
        ));
        assert!(validate(&Op::grayscale(), &t1, &[&gray]).is_err());
        assert!(validate(&Op::color(), &t3, &[&gray]).is_ok());
        assert!(validate(&Op::color(), &t3, &[&rgb]).is_err());
        assert!(validate(&Op::threshold(vec![0.5, 0.5]), &t3, &[&rgb]).is_err());
        assert!(validate(&Op::rgb_to_yuv(), &t1, &[&gray]).is_err());
    }

    #[test]
    fn test_color_model_checks() {
        let rgba: Image<u8> = Image::new(2, 2, Color::RGBA);
        let xyz: Image<u8> = Image::new(2, 2, Color::XYZ);
        let yuv: Image<u8> = Image::new(2, 2, Color::YUV);
        let bands: Image<u8> = Image::new(2, 2, Color::custom(5, false).unwrap());
        let mono: Image<u8> = Image::new(2, 2, Color::custom(1, false).unwrap());
        let t1 = target(2, 2, 1, KindId::U8);
        let t3 = target(2, 2, 3, KindId::U8);
        let t4 = target(2, 2, 4, KindId::U8);

        assert!(validate(&Op::grayscale(), &t1, &[&rgba]).is_ok());
        for src in [&xyz, &yuv, &bands] {
            let src: &dyn Source = src;
            let err = validate(&Op::grayscale(), &t1, &[src]).unwrap_err();
            assert!(matches!(err, Error::InvalidColorModel { expected: "rgb or rgba", .. }));
        }
        assert!(validate(&Op::color(), &t3, &[&mono]).unwrap_err().is_color_error());

        assert!(validate(&Op::rgb_to_xyz(), &t4, &[&rgba]).is_ok());
        assert!(validate(&Op::rgb_to_xyz(), &t3, &[&yuv]).unwrap_err().is_color_error());
        assert!(validate(&Op::rgb_to_yuv(), &t3, &[&xyz]).unwrap_err().is_color_error());
        let to_rgb = Op::xyz_to_rgb().unwrap();
        assert!(validate(&to_rgb, &t3, &[&xyz]).is_ok());
        assert!(validate(&to_rgb, &t3, &[&yuv]).unwrap_err().is_color_error());
        let to_rgb = Op::yuv_to_rgb().unwrap();
        assert!(validate(&to_rgb, &t3, &[&yuv]).is_ok());
        let yuva: Image<u8> = Image::new(2, 2, Color::YUVA);
        assert!(validate(&to_rgb, &t4, &[&yuva]).is_ok());
        assert!(validate(&to_rgb, &t3, &[&xyz]).unwrap_err().is_color_error());

        // untagged matrices read anything with three channels
        let m = Op::color_matrix(pixop_math::Mat3::IDENTITY, Op::source(0));
        assert!(validate(&m, &t3, &[&xyz]).is_ok());
    }
}
