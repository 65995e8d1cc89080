//! Headerless raw codec and frame sequence reader.
//!
//! A raw file is the element sequence of one image in its declared layout;
//! a raw sequence is several such images back to back. Nothing in the file
//! says what it holds, so geometry always comes from the caller.

use pixop_core::{Color, Data, Decoder, Encoder, Error, FrameSource, Image, Kind, Layout, Result};
use std::fs::{self, File};
use std::io::{BufReader, ErrorKind, Read};
use std::marker::PhantomData;
use std::path::Path;
use tracing::{debug, trace};

/// Raw codec for images of a fixed geometry.
#[derive(Debug, Clone, Copy)]
pub struct RawCodec {
    pub width: usize,
    pub height: usize,
    pub layout: Layout,
}

impl RawCodec {
    pub fn new(width: usize, height: usize, layout: Layout) -> Self {
        Self { width, height, layout }
    }

    fn frame_len(&self, color: Color) -> usize {
        self.width * self.height * color.channels()
    }
}

impl Decoder for RawCodec {
    fn decode<K: Kind>(&self, path: &Path, color: Color) -> Result<Image<K>> {
        let bytes = fs::read(path)?;
        let expected = self.frame_len(color) * size_of::<K>();
        if bytes.len() != expected {
            return Err(Error::collaborator(format!(
                "{}: {} bytes, expected {expected} for {}x{} {color} {}",
                path.display(),
                bytes.len(),
                self.width,
                self.height,
                K::name()
            )));
        }
        debug!(path = %path.display(), kind = K::name(), %color, "decoded raw image");
        let mut data = Data::<K>::new(self.frame_len(color));
        bytemuck::cast_slice_mut::<K, u8>(data.as_mut_slice()).copy_from_slice(&bytes);
        Image::of_data(self.width, self.height, color, self.layout, data)
    }
}

impl Encoder for RawCodec {
    fn encode<K: Kind>(&self, path: &Path, image: &Image<K>) -> Result<()> {
        debug!(
            path = %path.display(),
            kind = K::name(),
            width = image.width(),
            height = image.height(),
            layout = %image.layout(),
            "encoding raw image"
        );
        fs::write(path, image.data().as_bytes())?;
        Ok(())
    }
}

/// Reads consecutive raw frames from one file.
pub struct RawFrames<K: Kind> {
    reader: BufReader<File>,
    codec: RawCodec,
    color: Color,
    index: usize,
    _kind: PhantomData<K>,
}

impl<K: Kind> RawFrames<K> {
    pub fn open(path: &Path, codec: RawCodec, color: Color) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self {
            reader: BufReader::new(file),
            codec,
            color,
            index: 0,
            _kind: PhantomData,
        })
    }

    /// Frames handed out so far.
    pub fn index(&self) -> usize {
        self.index
    }
}

/// Fills `buf` as far as the reader allows; returns the bytes read.
fn read_full(reader: &mut impl Read, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

impl<K: Kind> FrameSource<K> for RawFrames<K> {
    fn next_frame(&mut self) -> Option<Result<Image<K>>> {
        let len = self.codec.frame_len(self.color);
        // empty frames carry nothing, so the sequence is empty
        if len == 0 {
            return None;
        }
        let mut data = Data::<K>::new(len);
        let buf: &mut [u8] = bytemuck::cast_slice_mut(data.as_mut_slice());
        let expected = buf.len();
        match read_full(&mut self.reader, buf) {
            Ok(0) => None,
            Ok(n) if n == expected => {
                trace!(index = self.index, "raw frame");
                self.index += 1;
                Some(Image::of_data(
                    self.codec.width,
                    self.codec.height,
                    self.color,
                    self.codec.layout,
                    data,
                ))
            }
            Ok(n) => Some(Err(Error::collaborator(format!(
                "frame {} truncated: {n} of {expected} bytes",
                self.index
            )))),
            Err(e) => Some(Err(e.into())),
        }
    }
}
