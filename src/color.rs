//! Fixed YCbCr color transform and plane split/merge.
//!
//! The forward transform works in the full 0-255 range. The inverse uses the
//! studio-range coefficients of the original format, including the
//! `0.9372549019607843` rescale and `+16` offset, so a forward/inverse pair
//! is NOT an identity. Both directions are part of the wire-compatible
//! behavior and are kept as-is.

use crate::pixmap::{Image, PixelFormat, Plane};

const KR: f32 = 0.299;
const KB: f32 = 0.114;
const KG: f32 = 1.0 - KR - KB;

const STUDIO_SCALE: f32 = 0.9372549019607843;
const STUDIO_OFFSET: f32 = 16.0;

/// Forward transform for one pixel, full range.
pub fn rgb_to_ycbcr(rgb: [u8; 3]) -> [u8; 3] {
    let [r, g, b] = rgb.map(f32::from);
    let y = (r * KR + g * KG + b * KB) as u8;
    let cb = (128.0 + 0.5 * (b - f32::from(y)) / (1.0 - KB)).clamp(0.0, 255.0) as u8;
    let cr = (128.0 + 0.5 * (r - f32::from(y)) / (1.0 - KR)).clamp(0.0, 255.0) as u8;
    [y, cb, cr]
}

/// Inverse transform for one pixel, rescaled into the 16-235 studio range.
pub fn ycbcr_to_rgb(ycbcr: [u8; 3]) -> [u8; 3] {
    let [y, cb, cr] = ycbcr.map(f32::from);
    let r = 298.082 * y / 256.0 + 408.583 * cr / 256.0 - 222.921;
    let g = 298.082 * y / 256.0 - 100.291 * cb / 256.0 - 208.12 * cr / 256.0 + 135.576;
    let b = 298.082 * y / 256.0 + 512.412 * cb / 256.0 - 276.836;
    [r, g, b].map(|v| (v * STUDIO_SCALE + STUDIO_OFFSET).clamp(0.0, 255.0) as u8)
}

/// Convert an image into the target pixel format, producing a new buffer.
pub fn convert(img: &Image, target: PixelFormat) -> Image {
    let src = img.data();
    let (w, h) = (img.width(), img.height());
    let data = match (img.format(), target) {
        (f, t) if f == t => src.to_vec(),
        (PixelFormat::Gray, PixelFormat::Rgb) => {
            src.iter().flat_map(|&v| [v, v, v]).collect()
        }
        (PixelFormat::Gray, PixelFormat::YCbCr) => {
            src.iter().flat_map(|&v| [v, 128, 128]).collect()
        }
        (PixelFormat::Rgb, PixelFormat::YCbCr) => src
            .chunks_exact(3)
            .flat_map(|p| rgb_to_ycbcr([p[0], p[1], p[2]]))
            .collect(),
        (PixelFormat::YCbCr, PixelFormat::Rgb) => src
            .chunks_exact(3)
            .flat_map(|p| ycbcr_to_rgb([p[0], p[1], p[2]]))
            .collect(),
        (PixelFormat::Rgb, PixelFormat::Gray) => src
            .chunks_exact(3)
            .map(|p| {
                let mean = (u16::from(p[0]) + u16::from(p[1]) + u16::from(p[2])) as f32 / 3.0;
                (mean + 0.5) as u8
            })
            .collect(),
        (PixelFormat::YCbCr, PixelFormat::Gray) => {
            src.chunks_exact(3).map(|p| p[0]).collect()
        }
        _ => unreachable!("all format pairs are covered"),
    };
    Image::from_raw(w, h, target, data)
}

/// Split a three-channel image into its per-channel planes.
pub fn split(img: &Image) -> [Plane; 3] {
    assert_eq!(img.format().channels(), 3, "split needs an interleaved image");
    let (w, h) = (img.width(), img.height());
    let mut planes = [vec![0u8; w * h], vec![0u8; w * h], vec![0u8; w * h]];
    for (i, p) in img.data().chunks_exact(3).enumerate() {
        planes[0][i] = p[0];
        planes[1][i] = p[1];
        planes[2][i] = p[2];
    }
    planes.map(|data| Plane::from_raw(w, h, data))
}

/// Interleave three equally sized planes back into a YCbCr image.
pub fn merge(y: &Plane, cb: &Plane, cr: &Plane) -> Image {
    assert!(
        y.width() == cb.width()
            && y.width() == cr.width()
            && y.height() == cb.height()
            && y.height() == cr.height(),
        "merge needs equally sized planes"
    );
    let mut data = Vec::with_capacity(y.data().len() * 3);
    for i in 0..y.data().len() {
        data.push(y.data()[i]);
        data.push(cb.data()[i]);
        data.push(cr.data()[i]);
    }
    Image::from_raw(y.width(), y.height(), PixelFormat::YCbCr, data)
}
