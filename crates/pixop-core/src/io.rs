//! Collaborator interfaces for file codecs and frame sources.
//!
//! The core never reads file bytes itself. Codecs and video decoders live
//! outside and hand over fully materialized [`Image`] values through these
//! traits; their failures surface as [`crate::Error::Collaborator`].
//!
//! ```rust,ignore
//! use pixop_core::{Color, Decoder, Image, Kind, Result};
//! use std::path::Path;
//!
//! struct MyCodec;
//!
//! impl Decoder for MyCodec {
//!     fn decode<K: Kind>(&self, path: &Path, color: Color) -> Result<Image<K>> {
//!         // parse the file, then Image::of_data(...)
//!     }
//! }
//! ```

use crate::{Color, Image, Kind, Result};
use std::path::Path;

/// Reads an image file into a typed image.
pub trait Decoder {
    /// Decodes `path` into an image of kind `K` under `color`.
    fn decode<K: Kind>(&self, path: &Path, color: Color) -> Result<Image<K>>;
}

/// Writes a typed image to a file.
pub trait Encoder {
    /// Encodes `image` to `path`.
    fn encode<K: Kind>(&self, path: &Path, image: &Image<K>) -> Result<()>;
}

/// Yields consecutive frames of a video or image sequence.
pub trait FrameSource<K: Kind> {
    /// The next frame, `None` once the source is exhausted.
    fn next_frame(&mut self) -> Option<Result<Image<K>>>;

    /// Borrowing iterator over the remaining frames.
    fn frames(&mut self) -> Frames<'_, Self, K>
    where
        Self: Sized,
    {
        Frames {
            source: self,
            _kind: std::marker::PhantomData,
        }
    }
}

/// Iterator returned by [`FrameSource::frames`].
pub struct Frames<'a, S, K> {
    source: &'a mut S,
    _kind: std::marker::PhantomData<K>,
}

impl<S: FrameSource<K>, K: Kind> Iterator for Frames<'_, S, K> {
    type Item = Result<Image<K>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.source.next_frame()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    struct Countdown(u8);

    impl FrameSource<u8> for Countdown {
        fn next_frame(&mut self) -> Option<Result<Image<u8>>> {
            if self.0 == 0 {
                return None;
            }
            self.0 -= 1;
            if self.0 == 1 {
                return Some(Err(Error::collaborator("dropped frame")));
            }
            let mut img = Image::new(1, 1, Color::GRAY);
            img.fill(self.0);
            Some(Ok(img))
        }
    }

    #[test]
    fn test_frames_iterator() {
        let mut src = Countdown(3);
        let frames: Vec<_> = src.frames().collect();
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].as_ref().unwrap().get(0, 0, 0), 2);
        assert!(frames[1].is_err());
        assert!(src.next_frame().is_none());
    }
}
