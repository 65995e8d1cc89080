//! Color model descriptors.
//!
//! A [`Color`] says how many channels a pixel has, whether the last one is
//! alpha, and which model the channels belong to. Models are a runtime tag:
//! operations that only make sense for some models (grayscale needs three
//! color channels, color broadcast needs one) check the tag and channel
//! count when they are validated, and report [`crate::Error::InvalidColor`]
//! or [`crate::Error::InvalidColorModel`].
//!
//! ```rust
//! use pixop_core::{Color, ColorModel};
//!
//! assert_eq!(Color::RGBA.channels(), 4);
//! assert_eq!(Color::RGBA.alpha_index(), Some(3));
//! assert_eq!(Color::RGB.model(), ColorModel::Rgb);
//!
//! let bands = Color::custom(7, false).unwrap();
//! assert_eq!(bands.color_channels(), 7);
//! ```

use crate::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Tag distinguishing well-known color models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorModel {
    /// Single luminance channel.
    Gray,
    /// Red, green, blue.
    Rgb,
    /// Red, green, blue, alpha.
    Rgba,
    /// CIE XYZ tristimulus.
    Xyz,
    /// Luma plus two chroma channels.
    Yuv,
    /// Any other channel arrangement.
    Custom,
}

/// Immutable channel layout descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    channels: usize,
    alpha: bool,
    model: ColorModel,
}

impl Color {
    /// One gray channel.
    pub const GRAY: Self = Self::known(1, false, ColorModel::Gray);
    /// Three RGB channels.
    pub const RGB: Self = Self::known(3, false, ColorModel::Rgb);
    /// RGB plus alpha.
    pub const RGBA: Self = Self::known(4, true, ColorModel::Rgba);
    /// Three XYZ channels.
    pub const XYZ: Self = Self::known(3, false, ColorModel::Xyz);
    /// XYZ plus alpha.
    pub const XYZA: Self = Self::known(4, true, ColorModel::Xyz);
    /// Three YUV channels.
    pub const YUV: Self = Self::known(3, false, ColorModel::Yuv);
    /// YUV plus alpha.
    pub const YUVA: Self = Self::known(4, true, ColorModel::Yuv);

    const fn known(channels: usize, alpha: bool, model: ColorModel) -> Self {
        Self { channels, alpha, model }
    }

    /// Arbitrary channel layout; alpha, when present, is the last channel.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidColor`] for zero channels.
    pub fn custom(channels: usize, alpha: bool) -> Result<Self> {
        if channels == 0 {
            return Err(Error::invalid_color(1, 0));
        }
        Ok(Self::known(channels, alpha, ColorModel::Custom))
    }

    /// Total channel count, alpha included.
    #[inline]
    pub const fn channels(&self) -> usize {
        self.channels
    }

    /// Whether the last channel is alpha.
    #[inline]
    pub const fn has_alpha(&self) -> bool {
        self.alpha
    }

    /// Model tag.
    #[inline]
    pub const fn model(&self) -> ColorModel {
        self.model
    }

    /// Index of the alpha channel, always the last one.
    #[inline]
    pub const fn alpha_index(&self) -> Option<usize> {
        if self.alpha { Some(self.channels - 1) } else { None }
    }

    /// Channels excluding alpha.
    #[inline]
    pub const fn color_channels(&self) -> usize {
        if self.alpha { self.channels - 1 } else { self.channels }
    }

    /// Fails unless this color has exactly `channels` channels.
    pub fn ensure_channels(&self, channels: usize) -> Result<()> {
        if self.channels != channels {
            return Err(Error::invalid_color(channels, self.channels));
        }
        Ok(())
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.model {
            ColorModel::Gray => f.write_str("gray"),
            ColorModel::Rgb => f.write_str("rgb"),
            ColorModel::Rgba => f.write_str("rgba"),
            ColorModel::Xyz if self.alpha => f.write_str("xyza"),
            ColorModel::Xyz => f.write_str("xyz"),
            ColorModel::Yuv if self.alpha => f.write_str("yuva"),
            ColorModel::Yuv => f.write_str("yuv"),
            ColorModel::Custom => {
                write!(f, "custom{}", self.channels)?;
                if self.alpha {
                    f.write_str("a")?;
                }
                Ok(())
            }
        }
    }
}

impl FromStr for Color {
    type Err = Error;

    /// Parses `gray`, `rgb`, `rgba`, `xyz[a]`, `yuv[a]`, or `customN[a]`.
    fn from_str(s: &str) -> Result<Self> {
        let lower = s.to_ascii_lowercase();
        match lower.as_str() {
            "gray" | "grey" | "y" => Ok(Self::GRAY),
            "rgb" => Ok(Self::RGB),
            "rgba" => Ok(Self::RGBA),
            "xyz" => Ok(Self::XYZ),
            "xyza" => Ok(Self::XYZA),
            "yuv" => Ok(Self::YUV),
            "yuva" => Ok(Self::YUVA),
            other => {
                let rest = other
                    .strip_prefix("custom")
                    .ok_or_else(|| Error::invalid_parameter(format!("unknown color '{s}'")))?;
                let (digits, alpha) = match rest.strip_suffix('a') {
                    Some(d) => (d, true),
                    None => (rest, false),
                };
                let channels = digits
                    .parse::<usize>()
                    .map_err(|_| Error::invalid_parameter(format!("unknown color '{s}'")))?;
                Self::custom(channels, alpha)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_colors() {
        assert_eq!(Color::GRAY.channels(), 1);
        assert_eq!(Color::RGB.channels(), 3);
        assert_eq!(Color::XYZ.channels(), 3);
        assert_eq!(Color::YUV.channels(), 3);
        assert!(Color::RGBA.has_alpha());
        assert_eq!(Color::RGBA.color_channels(), 3);
        assert_eq!(Color::RGB.alpha_index(), None);
        assert_ne!(Color::RGB, Color::XYZ);
        assert_eq!(Color::YUVA.model(), ColorModel::Yuv);
        assert_eq!(Color::XYZA.alpha_index(), Some(3));
    }

    #[test]
    fn test_custom_rejects_zero_channels() {
        assert!(matches!(
            Color::custom(0, false),
            Err(Error::InvalidColor { expected: 1, got: 0 })
        ));
        let c = Color::custom(2, true).unwrap();
        assert_eq!(c.alpha_index(), Some(1));
    }

    #[test]
    fn test_parse_and_display() {
        for c in [Color::GRAY, Color::RGB, Color::RGBA, Color::XYZ, Color::XYZA, Color::YUV, Color::YUVA] {
            assert_eq!(c.to_string().parse::<Color>().unwrap(), c);
        }
        let custom: Color = "custom5a".parse().unwrap();
        assert_eq!(custom.channels(), 5);
        assert!(custom.has_alpha());
        assert_eq!(custom.to_string(), "custom5a");
        assert!("cmyk".parse::<Color>().is_err());
    }

    #[test]
    fn test_ensure_channels() {
        assert!(Color::RGB.ensure_channels(3).is_ok());
        assert!(matches!(
            Color::GRAY.ensure_channels(3),
            Err(Error::InvalidColor { expected: 3, got: 1 })
        ));
    }
}
