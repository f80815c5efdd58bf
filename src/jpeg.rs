//! Baseline codec boundary: JPEG in and out through the `image` crate.
//!
//! The core codec only ever sees the decoded [`Image`] buffers produced
//! here; no `image` crate types leak past this module.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder};

use crate::pixmap::{Image, PixelFormat};
use crate::{Result, StupError};

pub const DEFAULT_QUALITY: u8 = 85;

/// Decode a JPEG file into an RGB image buffer.
pub fn load_jpeg<P: AsRef<Path>>(path: P) -> Result<Image> {
    let decoded = image::open(path)?.into_rgb8();
    let (width, height) = decoded.dimensions();
    Ok(Image::from_raw(
        width as usize,
        height as usize,
        PixelFormat::Rgb,
        decoded.into_raw(),
    ))
}

/// Encode an RGB or grayscale image as JPEG.
pub fn save_jpeg<P: AsRef<Path>>(img: &Image, path: P, quality: u8) -> Result<()> {
    let color_type = match img.format() {
        PixelFormat::Rgb => ExtendedColorType::Rgb8,
        PixelFormat::Gray => ExtendedColorType::L8,
        PixelFormat::YCbCr => return Err(StupError::UnsupportedFormat),
    };
    let out = BufWriter::new(File::create(path)?);
    let encoder = JpegEncoder::new_with_quality(out, quality);
    encoder.write_image(
        img.data(),
        img.width() as u32,
        img.height() as u32,
        color_type,
    )?;
    Ok(())
}
