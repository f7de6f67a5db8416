//! Codec collaborator interfaces
//!
//! File formats are handled outside this library; these traits are the
//! seam the container calls through. A decoder produces an [`Image`],
//! an encoder consumes one with an optional quality in `0..=100`
//! (`None` means the codec's default).

use crate::error::Result;
use crate::image::Image;
use std::io::{Read, Write};

/// Reads one image from a byte source.
pub trait ImageDecoder {
    /// Decode an image; a decodable-but-empty source yields a null image.
    fn read(&mut self, source: &mut dyn Read) -> Result<Image>;
}

/// Writes one image to a byte sink.
pub trait ImageEncoder {
    /// Encode `image`; `quality` is clamped to `0..=100` by implementors.
    fn write(&mut self, sink: &mut dyn Write, image: &Image, quality: Option<u8>) -> Result<()>;
}
