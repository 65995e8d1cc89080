//! CLI command implementations

pub mod color;
pub mod combine;
pub mod convert;
pub mod filter;
pub mod frames;
pub mod geometry;
pub mod info;
pub mod tone;

use crate::raw::RawCodec;
use crate::{OutputSpec, RawSpec};
use anyhow::{Context, Result};
use pixop_core::{Color, Decoder, Encoder, Image, Kind, KindId, Layout, Source};
use pixop_ops::Op;
use std::path::Path;
use tracing::debug;

impl RawSpec {
    pub fn codec(&self) -> RawCodec {
        RawCodec::new(self.width, self.height, self.layout)
    }
}

/// Loads a typed image.
pub fn load_image<K: Kind>(path: &Path, raw: &RawSpec) -> Result<Image<K>> {
    raw.codec()
        .decode(path, raw.color)
        .with_context(|| format!("Failed to load: {}", path.display()))
}

/// Loads an image of the declared kind behind the kind-erased interface.
pub fn load_source(path: &Path, raw: &RawSpec) -> Result<Box<dyn Source>> {
    with_kind!(raw.kind, K => {
        let img = load_image::<K>(path, raw)?;
        Ok(Box::new(img) as Box<dyn Source>)
    })
}

/// Saves a typed image.
pub fn save_image<K: Kind>(path: &Path, image: &Image<K>) -> Result<()> {
    let codec = RawCodec::new(image.width(), image.height(), image.layout());
    codec
        .encode(path, image)
        .with_context(|| format!("Failed to save: {}", path.display()))
}

/// Evaluates `op` into a fresh `width x height` image described by `out`
/// (kind and layout default to the input's) and saves it.
pub fn eval_and_save(
    op: &Op,
    sources: &[Box<dyn Source>],
    raw: &RawSpec,
    out: &OutputSpec,
    size: (usize, usize),
    color: Color,
) -> Result<()> {
    let kind = out.out_kind.unwrap_or(raw.kind);
    let layout = out.out_layout.unwrap_or(raw.layout);
    let refs: Vec<&dyn Source> = sources.iter().map(|s| s.as_ref()).collect();
    debug!(nodes = op.node_count(), %kind, %color, "evaluating");

    with_kind!(kind, K => {
        let mut dest = Image::<K>::with_layout(size.0, size.1, color, layout);
        op.eval(&mut dest, &refs)
            .with_context(|| format!("Failed to evaluate into {kind} {color} image"))?;
        save_image(&out.output, &dest)
    })
}

/// Describes an image for verbose output.
pub fn describe(kind: KindId, width: usize, height: usize, color: Color, layout: Layout) -> String {
    format!("{width}x{height} {color} {kind} ({layout})")
}
