//! Per-block classification, encoding, and decoding.
//!
//! Every block covers an 8x8 region of one plane. The wire form is a control
//! byte (low 2 bits: mode, high 6 bits: quantization baseline masked to a
//! multiple of 4), a range byte, and 0/4/16/32 bytes of packed levels.

use std::io::Read;

use crate::bitpack;
use crate::pixmap::Plane;
use crate::BLOCK_SIDE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockMode {
    /// Constant fill; a zero range byte means "leave the region untouched".
    Solid,
    /// 4x4 grid of 2-bit levels, spatially reconstructed to 8x8.
    HalfRes2Bit,
    /// 64 2-bit levels, one per pixel.
    FullRes2Bit,
    /// 64 4-bit levels, one per pixel. Never produced by this encoder but
    /// accepted on decode for files from denser encoders.
    FullRes4Bit,
}

impl BlockMode {
    pub fn from_control(control: u8) -> Self {
        match control & 0x3 {
            0 => BlockMode::Solid,
            1 => BlockMode::HalfRes2Bit,
            2 => BlockMode::FullRes2Bit,
            _ => BlockMode::FullRes4Bit,
        }
    }

    /// Number of packed sample bytes following the control/range pair.
    pub fn sample_bytes(self) -> usize {
        match self {
            BlockMode::Solid => 0,
            BlockMode::HalfRes2Bit => 4,
            BlockMode::FullRes2Bit => 16,
            BlockMode::FullRes4Bit => 32,
        }
    }
}

struct BlockStats {
    min: u8,
    max: u8,
    max_grad: u8,
}

/// Min, max, and the peak local gradient over the 8x8 window at (x0, y0).
///
/// The gradient of a pixel is the mean of its absolute forward differences
/// in x and y; pixels on the right/bottom block boundary contribute 0.
fn block_stats(plane: &Plane, x0: usize, y0: usize) -> BlockStats {
    let mut min = 255u8;
    let mut max = 0u8;
    let mut max_grad = 0u8;
    for y in y0..y0 + BLOCK_SIDE {
        for x in x0..x0 + BLOCK_SIDE {
            let p = plane.get(x, y);
            min = min.min(p);
            max = max.max(p);
            if x + 1 < x0 + BLOCK_SIDE && y + 1 < y0 + BLOCK_SIDE {
                let dh = (i16::from(p) - i16::from(plane.get(x + 1, y))).unsigned_abs();
                let dv = (i16::from(p) - i16::from(plane.get(x, y + 1))).unsigned_abs();
                max_grad = max_grad.max(((dh + dv) / 2) as u8);
            }
        }
    }
    BlockStats { min, max, max_grad }
}

/// Gradient below which a block is considered smooth enough to store at
/// half resolution.
const SMOOTH_GRAD_LIMIT: u8 = 15;

/// Pick the encoding mode for the 8x8 region at (x0, y0).
pub fn classify(plane: &Plane, x0: usize, y0: usize) -> BlockMode {
    let stats = block_stats(plane, x0, y0);
    classify_stats(&stats)
}

fn classify_stats(stats: &BlockStats) -> BlockMode {
    if stats.max == stats.min {
        BlockMode::Solid
    } else if stats.max_grad < SMOOTH_GRAD_LIMIT {
        BlockMode::HalfRes2Bit
    } else {
        BlockMode::FullRes2Bit
    }
}

fn quantize(samples: &[u8], min: u8, range: u8, steps: f32) -> Vec<u8> {
    samples
        .iter()
        .map(|&s| (f32::from(s - min) / f32::from(range) * steps + 0.49) as u8)
        .collect()
}

#[inline]
fn dequantize(value: f32) -> u8 {
    value.clamp(0.0, 255.0) as u8
}

/// Classify and encode the 8x8 region at (x0, y0), appending its wire record.
pub fn encode_block(plane: &Plane, x0: usize, y0: usize, out: &mut Vec<u8>) {
    let stats = block_stats(plane, x0, y0);
    match classify_stats(&stats) {
        BlockMode::Solid => {
            out.push(0);
            // 0 is reserved for the sparse no-op, so a black block fills
            // with 1 instead.
            out.push(if stats.min == 0 { 1 } else { stats.min });
        }
        BlockMode::HalfRes2Bit => {
            out.push((stats.min & 0xFC) | 1);
            out.push(stats.max - stats.min);
            let samples = plane.copy_rect(x0, y0, BLOCK_SIDE, 2);
            let levels = quantize(&samples, stats.min, stats.max - stats.min, 3.0);
            out.extend_from_slice(&bitpack::pack2(&levels));
        }
        BlockMode::FullRes2Bit => {
            out.push((stats.min & 0xFC) | 2);
            out.push(stats.max - stats.min);
            let samples = plane.copy_rect(x0, y0, BLOCK_SIDE, 1);
            let levels = quantize(&samples, stats.min, stats.max - stats.min, 3.0);
            out.extend_from_slice(&bitpack::pack2(&levels));
        }
        BlockMode::FullRes4Bit => unreachable!("the classifier never picks 4-bit blocks"),
    }
}

/// Decode one wire record into the 8x8 region at (x0, y0).
///
/// A short read is reported as `ErrorKind::UnexpectedEof`; the caller turns
/// it into a block-indexed error. There is no partial-block recovery.
pub fn decode_block(
    src: &mut impl Read,
    plane: &mut Plane,
    x0: usize,
    y0: usize,
) -> std::io::Result<()> {
    let mut header = [0u8; 2];
    src.read_exact(&mut header)?;
    let (control, range) = (header[0], header[1]);

    match BlockMode::from_control(control) {
        BlockMode::Solid => {
            if range > 0 {
                plane.fill_rect(x0, y0, BLOCK_SIDE, range);
            }
            // range == 0: sparse no-op, the region keeps its prior content.
        }
        BlockMode::HalfRes2Bit => {
            let mut packed = [0u8; 4];
            src.read_exact(&mut packed)?;
            let baseline = (control & 0xFC) | 2;
            let grid: Vec<u8> = bitpack::unpack2(&packed, 16)
                .iter()
                .map(|&l| {
                    dequantize(f32::from(l) * f32::from(range) / 3.0 + f32::from(baseline))
                })
                .collect();
            plane.write_rect(x0, y0, BLOCK_SIDE, &reconstruct_half_res(&grid));
        }
        BlockMode::FullRes2Bit => {
            let mut packed = [0u8; 16];
            src.read_exact(&mut packed)?;
            // The baseline here is the raw control byte, mode bits included.
            let samples: Vec<u8> = bitpack::unpack2(&packed, 64)
                .iter()
                .map(|&l| {
                    dequantize(f32::from(l) / 3.0 * f32::from(range) + f32::from(control))
                })
                .collect();
            plane.write_rect(x0, y0, BLOCK_SIDE, &samples);
        }
        BlockMode::FullRes4Bit => {
            let mut packed = [0u8; 32];
            src.read_exact(&mut packed)?;
            let samples: Vec<u8> = bitpack::unpack4(&packed, 64)
                .iter()
                .map(|&l| {
                    dequantize(f32::from(l) / 15.0 * f32::from(range) + f32::from(control))
                })
                .collect();
            plane.write_rect(x0, y0, BLOCK_SIDE, &samples);
        }
    }
    Ok(())
}

/// Expand a 4x4 dequantized grid into an 8x8 block.
///
/// Even/even positions take the grid sample directly; odd positions blend
/// with the next sample to the right and/or below. Grid indices past the
/// last column/row replicate the edge sample.
fn reconstruct_half_res(grid: &[u8]) -> [u8; BLOCK_SIDE * BLOCK_SIDE] {
    debug_assert_eq!(grid.len(), 16);
    let g = |gx: usize, gy: usize| u16::from(grid[gx.min(3) + gy.min(3) * 4]);
    let mut out = [0u8; BLOCK_SIDE * BLOCK_SIDE];
    for y in 0..BLOCK_SIDE {
        for x in 0..BLOCK_SIDE {
            let (gx, gy) = (x / 2, y / 2);
            let v = match (x % 2, y % 2) {
                (0, 0) => g(gx, gy),
                (1, 0) => (g(gx, gy) + g(gx + 1, gy)) / 2,
                (0, 1) => (g(gx, gy) + g(gx, gy + 1)) / 2,
                _ => (g(gx, gy) + g(gx + 1, gy) + g(gx, gy + 1) + g(gx + 1, gy + 1)) / 4,
            };
            out[x + y * BLOCK_SIDE] = v as u8;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block_plane(samples: &[u8; 64]) -> Plane {
        Plane::from_raw(8, 8, samples.to_vec())
    }

    fn gradient_block(step: u8) -> Plane {
        let mut samples = [0u8; 64];
        for y in 0..8 {
            for x in 0..8 {
                samples[x + y * 8] = ((x + y) as u8).saturating_mul(step);
            }
        }
        block_plane(&samples)
    }

    #[test]
    fn classify_flat_block_as_solid() {
        assert_eq!(classify(&block_plane(&[93; 64]), 0, 0), BlockMode::Solid);
    }

    #[test]
    fn classify_gentle_ramp_as_half_res() {
        // forward differences of 4 in both axes, gradient 4 < 15
        assert_eq!(classify(&gradient_block(4), 0, 0), BlockMode::HalfRes2Bit);
    }

    #[test]
    fn classify_steep_ramp_as_full_res() {
        assert_eq!(classify(&gradient_block(16), 0, 0), BlockMode::FullRes2Bit);
    }

    #[test]
    fn solid_block_roundtrips_exactly() {
        for v in [1u8, 77, 128, 255] {
            let plane = block_plane(&[v; 64]);
            let mut record = Vec::new();
            encode_block(&plane, 0, 0, &mut record);
            assert_eq!(record, vec![0, v]);

            let mut out = Plane::new(8, 8);
            decode_block(&mut record.as_slice(), &mut out, 0, 0).unwrap();
            assert_eq!(out.data(), plane.data());
        }
    }

    #[test]
    fn solid_zero_block_decodes_to_one() {
        // 0 is reserved as the sparse no-op, so a black block drifts to 1.
        let plane = block_plane(&[0; 64]);
        let mut record = Vec::new();
        encode_block(&plane, 0, 0, &mut record);
        assert_eq!(record, vec![0, 1]);

        let mut out = Plane::new(8, 8);
        decode_block(&mut record.as_slice(), &mut out, 0, 0).unwrap();
        assert_eq!(out.data(), &[1u8; 64]);
    }

    #[test]
    fn solid_zero_range_leaves_region_untouched() {
        let mut out = Plane::from_raw(8, 8, (0..64).collect());
        let record = [0u8, 0u8];
        decode_block(&mut record.as_slice(), &mut out, 0, 0).unwrap();
        assert_eq!(out.data(), &(0..64).collect::<Vec<u8>>()[..]);
    }

    #[test]
    fn full_res_error_stays_within_one_quantization_step() {
        let plane = gradient_block(16);
        let mut record = Vec::new();
        encode_block(&plane, 0, 0, &mut record);
        assert_eq!(record.len(), 2 + 16);

        let mut out = Plane::new(8, 8);
        decode_block(&mut record.as_slice(), &mut out, 0, 0).unwrap();

        let range = 224u16; // block max (14 * 16) minus block min (0)
        let tolerance = range / 3 + 3; // half-step rounding plus baseline drift
        for (&orig, &dec) in plane.data().iter().zip(out.data()) {
            let err = (i16::from(orig) - i16::from(dec)).unsigned_abs();
            assert!(err <= tolerance, "error {err} at value {orig} -> {dec}");
        }
    }

    #[test]
    fn half_res_reconstruction_blends_the_grid() {
        // Hand-build a record: baseline 100 (control 100|1), range 60,
        // levels alternating 0 and 3 along x.
        let mut levels = [0u8; 16];
        for gy in 0..4 {
            for gx in 0..4 {
                levels[gx + gy * 4] = if gx % 2 == 0 { 0 } else { 3 };
            }
        }
        let mut record = vec![(100 & 0xFC) | 1, 60];
        record.extend_from_slice(&bitpack::pack2(&levels));

        let mut out = Plane::new(8, 8);
        decode_block(&mut record.as_slice(), &mut out, 0, 0).unwrap();

        // dequantized grid: level 0 -> 102, level 3 -> 162
        let lo = 102u8;
        let hi = 162u8;
        // even/even direct
        assert_eq!(out.get(0, 0), lo);
        assert_eq!(out.get(2, 0), hi);
        // odd-x interior: average with the grid sample to the right
        assert_eq!(out.get(1, 0), (lo as u16 + hi as u16).div_euclid(2) as u8);
        // odd-x at the right edge replicates
        assert_eq!(out.get(7, 0), out.get(6, 0));
        // odd-y blends vertically; columns are constant so it is a no-op
        assert_eq!(out.get(0, 1), lo);
        assert_eq!(out.get(0, 7), lo);
    }

    #[test]
    fn four_bit_records_decode_even_though_never_encoded() {
        // control: baseline 40, mode 3; range 30; levels = x-position ramp
        let mut levels = [0u8; 64];
        for y in 0..8 {
            for x in 0..8 {
                levels[x + y * 8] = (x * 2) as u8;
            }
        }
        let mut record = vec![(40 & 0xFC) | 3, 30];
        record.extend_from_slice(&bitpack::pack4(&levels));
        assert_eq!(record.len(), 2 + 32);

        let mut out = Plane::new(8, 8);
        decode_block(&mut record.as_slice(), &mut out, 0, 0).unwrap();

        let control = (40 & 0xFC) | 3;
        for y in 0..8 {
            for x in 0..8 {
                let expected = ((x * 2) as f32 / 15.0 * 30.0 + control as f32) as u8;
                assert_eq!(out.get(x, y), expected);
            }
        }
    }

    #[test]
    fn idempotent_after_first_loss() {
        // Encode, decode, re-encode, re-decode: the second pass must be
        // a fixed point for a solid block.
        let plane = block_plane(&[0; 64]);
        let mut record = Vec::new();
        encode_block(&plane, 0, 0, &mut record);

        let mut once = Plane::new(8, 8);
        decode_block(&mut record.as_slice(), &mut once, 0, 0).unwrap();

        let mut record2 = Vec::new();
        encode_block(&once, 0, 0, &mut record2);
        let mut twice = Plane::new(8, 8);
        decode_block(&mut record2.as_slice(), &mut twice, 0, 0).unwrap();
        assert_eq!(once.data(), twice.data());
    }

    #[test]
    fn truncated_sample_data_is_an_eof() {
        // HalfRes record cut off after the header
        let record = [(100u8 & 0xFC) | 1, 60];
        let mut out = Plane::new(8, 8);
        let err = decode_block(&mut record.as_slice(), &mut out, 0, 0).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::UnexpectedEof);
    }
}
