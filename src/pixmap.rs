//! Owned pixel buffers: interleaved images and single-channel planes.
//!
//! All addressing goes through bounds-checked accessors; callers never
//! compute flat `x + y * width` offsets themselves.

use crate::{Result, StupError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Rgb,
    YCbCr,
    Gray,
}

impl PixelFormat {
    pub fn channels(self) -> usize {
        match self {
            PixelFormat::Rgb | PixelFormat::YCbCr => 3,
            PixelFormat::Gray => 1,
        }
    }
}

/// An interleaved image buffer.
///
/// Invariant: `data.len() == width * height * format.channels()`, upheld by
/// construction. Format conversions replace the buffer atomically.
#[derive(Debug, Clone)]
pub struct Image {
    width: usize,
    height: usize,
    format: PixelFormat,
    data: Vec<u8>,
}

impl Image {
    pub fn new(width: usize, height: usize, format: PixelFormat) -> Self {
        Self {
            width,
            height,
            format,
            data: vec![0; width * height * format.channels()],
        }
    }

    /// Wrap an existing buffer. The buffer length must match the dimensions.
    pub fn from_raw(width: usize, height: usize, format: PixelFormat, data: Vec<u8>) -> Self {
        assert_eq!(data.len(), width * height * format.channels());
        Self {
            width,
            height,
            format,
            data,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub(crate) fn replace_buffer(&mut self, format: PixelFormat, data: Vec<u8>) {
        assert_eq!(data.len(), self.width * self.height * format.channels());
        self.format = format;
        self.data = data;
    }

    /// Overwrite this image with the nonzero bytes of `other`.
    ///
    /// Zero bytes in `other` leave the existing content in place, the byte
    /// sibling of the Solid block's zero-range sparse no-op.
    pub fn overlay(&mut self, other: &Image) -> Result<()> {
        if self.data.len() != other.data.len() {
            return Err(StupError::InvalidDimensions {
                width: other.width as u32,
                height: other.height as u32,
            });
        }
        for (dst, &src) in self.data.iter_mut().zip(other.data.iter()) {
            if src != 0 {
                *dst = src;
            }
        }
        Ok(())
    }
}

/// A single-channel plane (luma, Cb, or Cr) with rectangular accessors.
#[derive(Debug, Clone)]
pub struct Plane {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl Plane {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0; width * height],
        }
    }

    pub fn from_raw(width: usize, height: usize, data: Vec<u8>) -> Self {
        assert_eq!(data.len(), width * height);
        Self {
            width,
            height,
            data,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        assert!(x < self.width && y < self.height);
        self.data[x + y * self.width]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: u8) {
        assert!(x < self.width && y < self.height);
        self.data[x + y * self.width] = value;
    }

    /// Copy a `side`/`step` x `side`/`step` grid of samples out of the square
    /// region at (`x0`, `y0`), taking every `step`-th pixel in both axes.
    pub fn copy_rect(&self, x0: usize, y0: usize, side: usize, step: usize) -> Vec<u8> {
        assert!(step > 0 && x0 + side <= self.width && y0 + side <= self.height);
        let mut out = Vec::with_capacity((side / step) * (side / step));
        for y in (y0..y0 + side).step_by(step) {
            for x in (x0..x0 + side).step_by(step) {
                out.push(self.data[x + y * self.width]);
            }
        }
        out
    }

    /// Fill the square region at (`x0`, `y0`) with a constant.
    pub fn fill_rect(&mut self, x0: usize, y0: usize, side: usize, value: u8) {
        assert!(x0 + side <= self.width && y0 + side <= self.height);
        for y in y0..y0 + side {
            let row = x0 + y * self.width;
            self.data[row..row + side].fill(value);
        }
    }

    /// Write `side * side` samples row-major into the region at (`x0`, `y0`).
    pub fn write_rect(&mut self, x0: usize, y0: usize, side: usize, samples: &[u8]) {
        assert!(x0 + side <= self.width && y0 + side <= self.height);
        assert_eq!(samples.len(), side * side);
        for (y, row) in samples.chunks_exact(side).enumerate() {
            let start = x0 + (y0 + y) * self.width;
            self.data[start..start + side].copy_from_slice(row);
        }
    }

    /// Promote to a single-channel [`Image`].
    pub fn into_image(self) -> Image {
        Image::from_raw(self.width, self.height, PixelFormat::Gray, self.data)
    }
}
