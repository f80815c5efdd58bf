//! File-level orchestration: the fixed header, the shared tile traversal,
//! and the encode/decode pipelines.
//!
//! The file stores no block count or offsets; placement is entirely implied
//! by the traversal order, so encoder and decoder must replay the exact same
//! sequence of block slots. [`block_traversal`] is that sequence.

use std::io::{Read, Write};

#[cfg(feature = "rayon")]
use rayon::prelude::*;

use crate::pixmap::{Image, PixelFormat, Plane};
use crate::{block, color, resample};
use crate::{Result, StupError, BLOCK_SIDE, TILE_SIDE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Luma,
    Cb,
    Cr,
}

/// One 8x8 block position in wire order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockSlot {
    pub channel: Channel,
    pub x: usize,
    pub y: usize,
}

/// Reject dimensions the traversal cannot cover.
pub fn validate_dimensions(width: usize, height: usize) -> Result<()> {
    let ok = width > 0
        && height > 0
        && width % TILE_SIDE == 0
        && height % TILE_SIDE == 0
        && width <= u16::MAX as usize
        && height <= u16::MAX as usize;
    if ok {
        Ok(())
    } else {
        Err(StupError::InvalidDimensions {
            width: width as u32,
            height: height as u32,
        })
    }
}

/// Top-left corners of the 16x16 luma tiles, raster order.
fn tile_origins(width: usize, height: usize) -> impl Iterator<Item = (usize, usize)> {
    (0..height / TILE_SIDE).flat_map(move |ty| {
        (0..width / TILE_SIDE).map(move |tx| (tx * TILE_SIDE, ty * TILE_SIDE))
    })
}

/// The six block slots of one tile: luma TL, TR, BL, BR, then the tile's
/// Cb and Cr blocks at the half-resolution coordinate.
fn tile_slots(x: usize, y: usize) -> [BlockSlot; 6] {
    [
        BlockSlot { channel: Channel::Luma, x, y },
        BlockSlot { channel: Channel::Luma, x: x + BLOCK_SIDE, y },
        BlockSlot { channel: Channel::Luma, x, y: y + BLOCK_SIDE },
        BlockSlot { channel: Channel::Luma, x: x + BLOCK_SIDE, y: y + BLOCK_SIDE },
        BlockSlot { channel: Channel::Cb, x: x / 2, y: y / 2 },
        BlockSlot { channel: Channel::Cr, x: x / 2, y: y / 2 },
    ]
}

/// Every block slot of an image, in wire order.
pub fn block_traversal(width: usize, height: usize) -> impl Iterator<Item = BlockSlot> {
    tile_origins(width, height).flat_map(|(x, y)| tile_slots(x, y))
}

/// Encode an image of any pixel format into a STUP stream.
pub fn encode<W: Write>(img: &Image, out: &mut W) -> Result<()> {
    let (width, height) = (img.width(), img.height());
    validate_dimensions(width, height)?;

    let ycbcr = color::convert(img, PixelFormat::YCbCr);
    let [luma, cb, cr] = color::split(&ycbcr);
    let cb = resample::downsample_2x(&cb);
    let cr = resample::downsample_2x(&cr);

    out.write_all(&(width as u16).to_le_bytes())?;
    out.write_all(&(height as u16).to_le_bytes())?;

    let encode_tile = |&(x, y): &(usize, usize)| -> Vec<u8> {
        let mut buf = Vec::new();
        for slot in tile_slots(x, y) {
            let plane = match slot.channel {
                Channel::Luma => &luma,
                Channel::Cb => &cb,
                Channel::Cr => &cr,
            };
            block::encode_block(plane, slot.x, slot.y, &mut buf);
        }
        buf
    };

    // Tiles encode independently; indexing by tile position keeps the
    // output in traversal order regardless of completion order.
    let tiles: Vec<(usize, usize)> = tile_origins(width, height).collect();
    #[cfg(feature = "rayon")]
    let records: Vec<Vec<u8>> = tiles.par_iter().map(encode_tile).collect();
    #[cfg(not(feature = "rayon"))]
    let records: Vec<Vec<u8>> = tiles.iter().map(encode_tile).collect();

    for record in records {
        out.write_all(&record)?;
    }
    Ok(())
}

/// Decode a STUP stream into a YCbCr image.
pub fn decode<R: Read>(src: &mut R) -> Result<Image> {
    let mut header = [0u8; 4];
    src.read_exact(&mut header).map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            StupError::TruncatedHeader
        } else {
            StupError::Io(e)
        }
    })?;
    let width = u16::from_le_bytes([header[0], header[1]]) as usize;
    let height = u16::from_le_bytes([header[2], header[3]]) as usize;
    validate_dimensions(width, height)?;

    let mut luma = Plane::new(width, height);
    let mut cb = Plane::new(width / 2, height / 2);
    let mut cr = Plane::new(width / 2, height / 2);

    for (index, slot) in block_traversal(width, height).enumerate() {
        let plane = match slot.channel {
            Channel::Luma => &mut luma,
            Channel::Cb => &mut cb,
            Channel::Cr => &mut cr,
        };
        block::decode_block(src, plane, slot.x, slot.y).map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                StupError::TruncatedBlock(index)
            } else {
                StupError::Io(e)
            }
        })?;
    }

    let cb = resample::upsample_2x(&cb);
    let cr = resample::upsample_2x(&cr);
    Ok(color::merge(&luma, &cb, &cr))
}
