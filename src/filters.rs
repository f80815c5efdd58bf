//! Optional preprocessing filters applied before compression.
//!
//! Every filter keeps the image's dimensions and pixel format, so the
//! compression pipeline can treat them as pure buffer-to-buffer passes.
//! The neighborhood filters (edge, blur, selective blur) operate on
//! grayscale images only.

use crate::pixmap::{Image, PixelFormat};
use crate::{Result, StupError};

/// `(p - 128) * contrast + brightness + 128.5`, clamped.
pub fn contrast_brightness(img: &mut Image, contrast: f32, brightness: i16) {
    adjust(img.data_mut(), contrast, f32::from(brightness));
}

fn adjust(data: &mut [u8], contrast: f32, brightness: f32) {
    for p in data {
        *p = ((f32::from(*p) - 128.0) * contrast + brightness + 128.5).clamp(0.0, 255.0) as u8;
    }
}

/// Binarize: everything above `value` becomes 255, the rest 0.
pub fn threshold(img: &mut Image, value: u8) {
    for p in img.data_mut() {
        *p = if *p > value { 255 } else { 0 };
    }
}

pub fn invert(img: &mut Image) {
    for p in img.data_mut() {
        *p = 255 - *p;
    }
}

fn require_gray(img: &Image) -> Result<(usize, usize)> {
    if img.format() != PixelFormat::Gray {
        return Err(StupError::UnsupportedFormat);
    }
    Ok((img.width(), img.height()))
}

/// Gradient magnitude against the left and upper neighbors. The first row
/// and column have no such neighbors and are left at 0.
pub fn edge_filter(img: &mut Image) -> Result<()> {
    let (w, h) = require_gray(img)?;
    let mut edges = vec![0u8; w * h];
    edge_pass(img.data(), w, h, &mut edges);
    img.replace_buffer(PixelFormat::Gray, edges);
    Ok(())
}

fn edge_pass(data: &[u8], w: usize, h: usize, out: &mut [u8]) {
    for y in 1..h {
        for x in 1..w {
            let p0 = f32::from(data[x + y * w]);
            let dh = p0 - f32::from(data[x - 1 + y * w]);
            let dv = p0 - f32::from(data[x + (y - 1) * w]);
            out[x + y * w] = (dh * dh + dv * dv).sqrt().clamp(0.0, 255.0) as u8;
        }
    }
}

/// Separable box blur: a horizontal mean pass then a vertical one, sweeping
/// interior pixels only so the kernel never leaves the image.
pub fn box_blur(img: &mut Image, radius: u8) -> Result<()> {
    let (w, h) = require_gray(img)?;
    blur_pass(img.data_mut(), w, h, radius as usize);
    Ok(())
}

fn blur_pass(data: &mut [u8], w: usize, h: usize, radius: usize) {
    if radius == 0 || w <= 2 * radius || h <= 2 * radius {
        return;
    }
    let window = (2 * radius + 1) as f32;
    let mut horizontal = data.to_vec();
    for y in 0..h {
        for x in radius..w - radius {
            let sum: u32 = (x - radius..=x + radius)
                .map(|xi| u32::from(data[xi + y * w]))
                .sum();
            horizontal[x + y * w] = (sum as f32 / window) as u8;
        }
    }
    for y in radius..h - radius {
        for x in 0..w {
            let sum: u32 = (y - radius..=y + radius)
                .map(|yi| u32::from(horizontal[x + yi * w]))
                .sum();
            data[x + y * w] = (sum as f32 / window) as u8;
        }
    }
}

/// Separable dilation: spread maxima above `floor` over the kernel window.
fn max_pass(data: &mut [u8], w: usize, h: usize, radius: usize, floor: u8) {
    if radius == 0 || w <= 2 * radius || h <= 2 * radius {
        return;
    }
    let mut horizontal = vec![0u8; w * h];
    for y in 0..h {
        for x in radius..w - radius {
            let mut peak = 0u8;
            for xi in x - radius..=x + radius {
                let v = data[xi + y * w];
                if v > peak && v > floor {
                    peak = v;
                }
            }
            horizontal[x + y * w] = peak;
        }
    }
    for y in radius..h - radius {
        for x in 0..w {
            let mut peak = data[x + y * w];
            for yi in y - radius..=y + radius {
                let v = horizontal[x + yi * w];
                if v > peak && v > floor {
                    peak = v;
                }
            }
            data[x + y * w] = peak;
        }
    }
}

/// Content-adaptive blur: build an edge map, dilate and smooth it into a
/// per-pixel blur radius, then average each pixel's neighborhood weighted
/// by that map. Flat areas get smoothed hard, edges stay put.
pub fn selective_blur(img: &mut Image, radius: f32, map_gain: f32, map_bias: f32) -> Result<()> {
    let (w, h) = require_gray(img)?;
    let r = radius as usize;

    let mut blur_map = vec![0u8; w * h];
    edge_pass(img.data(), w, h, &mut blur_map);
    max_pass(&mut blur_map, w, h, r, 5);
    blur_pass(&mut blur_map, w, h, r);
    adjust(&mut blur_map, map_gain, map_bias * map_gain);
    for p in blur_map.iter_mut() {
        *p = 255 - *p;
    }
    adjust(&mut blur_map, radius / 255.0, -127.0);

    let data = img.data();
    let mut out = vec![0u8; w * h];
    for y in 0..h {
        for x in 0..w {
            let mut val = f64::from(data[x + y * w]);
            let mut weight = 1.0f64;
            let reach = i32::from(blur_map[x + y * w]);
            for j in -reach..=reach {
                for i in -reach..=reach {
                    let xi = x as i32 + i;
                    let yj = y as i32 + j;
                    if xi < 0 || xi >= w as i32 || yj < 0 || yj >= h as i32 {
                        continue;
                    }
                    let idx = xi as usize + yj as usize * w;
                    let wgt = f64::from(blur_map[idx]) / f64::from(radius);
                    val += f64::from(data[idx]) * wgt;
                    weight += wgt;
                }
            }
            out[x + y * w] = (val / weight).clamp(0.0, 255.0) as u8;
        }
    }
    img.replace_buffer(PixelFormat::Gray, out);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gray(w: usize, h: usize, data: Vec<u8>) -> Image {
        Image::from_raw(w, h, PixelFormat::Gray, data)
    }

    #[test]
    fn unit_contrast_is_an_identity() {
        let mut img = gray(4, 1, vec![0, 100, 128, 255]);
        contrast_brightness(&mut img, 1.0, 0);
        assert_eq!(img.data(), &[0, 100, 128, 255]);
    }

    #[test]
    fn contrast_stretches_around_mid_gray() {
        let mut img = gray(3, 1, vec![100, 128, 156]);
        contrast_brightness(&mut img, 2.0, 0);
        assert_eq!(img.data(), &[72, 128, 184]);
    }

    #[test]
    fn invert_is_an_involution() {
        let mut img = gray(3, 1, vec![0, 100, 255]);
        invert(&mut img);
        assert_eq!(img.data(), &[255, 155, 0]);
        invert(&mut img);
        assert_eq!(img.data(), &[0, 100, 255]);
    }

    #[test]
    fn threshold_binarizes() {
        let mut img = gray(4, 1, vec![0, 100, 101, 255]);
        threshold(&mut img, 100);
        assert_eq!(img.data(), &[0, 0, 255, 255]);
    }

    #[test]
    fn edges_of_a_flat_image_are_zero() {
        let mut img = gray(8, 8, vec![200; 64]);
        edge_filter(&mut img).unwrap();
        assert!(img.data().iter().all(|&v| v == 0));
    }

    #[test]
    fn edge_filter_finds_a_vertical_step() {
        let mut row = vec![10u8; 8];
        row[4] = 210;
        row[5] = 210;
        row[6] = 210;
        row[7] = 210;
        let data: Vec<u8> = (0..8).flat_map(|_| row.clone()).collect();
        let mut img = gray(8, 8, data);
        edge_filter(&mut img).unwrap();
        // |dh| = 200 at the step, clamped to 255 after the magnitude
        assert_eq!(img.data()[4 + 8], 200);
        assert_eq!(img.data()[2 + 8], 0);
    }

    #[test]
    fn blur_preserves_flat_images_and_dimensions() {
        let mut img = gray(16, 16, vec![90; 256]);
        box_blur(&mut img, 2).unwrap();
        assert_eq!(img.width(), 16);
        assert_eq!(img.height(), 16);
        assert!(img.data().iter().all(|&v| v == 90));
    }

    #[test]
    fn neighborhood_filters_reject_interleaved_images() {
        let mut img = Image::new(16, 16, PixelFormat::Rgb);
        assert!(matches!(
            box_blur(&mut img, 2),
            Err(StupError::UnsupportedFormat)
        ));
        assert!(matches!(edge_filter(&mut img), Err(StupError::UnsupportedFormat)));
        assert!(matches!(
            selective_blur(&mut img, 2.0, 4.0, 50.0),
            Err(StupError::UnsupportedFormat)
        ));
    }

    #[test]
    fn selective_blur_keeps_flat_images_flat() {
        let mut img = gray(16, 16, vec![90; 256]);
        selective_blur(&mut img, 2.0, 4.0, 50.0).unwrap();
        assert_eq!(img.width(), 16);
        assert_eq!(img.height(), 16);
        assert!(img.data().iter().all(|&v| v == 90));
    }
}
