//! Lossless PNG encoding for raster images.
//!
//! `decode(encode(img)) == img` for every canvas-sized RGBA buffer. Decoding
//! never yields a partial image: truncated data, non-PNG data, and PNGs of
//! the wrong size are all rejected with a [`DecodeError`]. The size comes from
//! the PNG header and is checked before any pixel data is decoded.

use std::io::Cursor;

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, ImageFormat, ImageReader};

use crate::error::{DecodeError, EncodeError};
use crate::pattern::CANVAS_SIZE;
use crate::raster::RasterImage;

/// Encodes an image as an RGBA8 PNG.
pub fn encode(image: &RasterImage) -> Result<Vec<u8>, EncodeError> {
    let mut buffer = Vec::new();
    PngEncoder::new(&mut buffer)
        .write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            ExtendedColorType::Rgba8,
        )
        .map_err(|e| EncodeError(e.to_string()))?;
    Ok(buffer)
}

/// Decodes PNG bytes into a canvas-sized image.
pub fn decode(bytes: &[u8]) -> Result<RasterImage, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::Empty);
    }

    let (width, height) = png_reader(bytes)
        .into_dimensions()
        .map_err(|e| DecodeError::Image(e.to_string()))?;
    if width != CANVAS_SIZE || height != CANVAS_SIZE {
        return Err(DecodeError::DimensionMismatch { width, height });
    }

    let decoded = png_reader(bytes)
        .decode()
        .map_err(|e| DecodeError::Image(e.to_string()))?;

    RasterImage::from_rgba(decoded.to_rgba8())
}

fn png_reader(bytes: &[u8]) -> ImageReader<Cursor<&[u8]>> {
    ImageReader::with_format(Cursor::new(bytes), ImageFormat::Png)
}
