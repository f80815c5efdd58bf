//! Packing of 2-bit and 4-bit quantization levels into byte arrays.
//!
//! Packing order is least-significant-first within a byte: 2-bit sample `i`
//! occupies bits `(i % 4) * 2` and up of byte `i / 4`; 4-bit sample `i`
//! occupies the low nibble of byte `i / 2` when `i` is even, the high nibble
//! otherwise. Values are pre-clamped to range by the caller.

/// Pack 2-bit levels, four per byte.
pub fn pack2(levels: &[u8]) -> Vec<u8> {
    let mut out = vec![0u8; levels.len().div_ceil(4)];
    for (i, &level) in levels.iter().enumerate() {
        out[i / 4] |= (level & 0x3) << ((i % 4) * 2);
    }
    out
}

/// Unpack `count` 2-bit levels.
pub fn unpack2(bytes: &[u8], count: usize) -> Vec<u8> {
    (0..count)
        .map(|i| (bytes[i / 4] >> ((i % 4) * 2)) & 0x3)
        .collect()
}

/// Pack 4-bit levels, two per byte (low nibble first).
pub fn pack4(levels: &[u8]) -> Vec<u8> {
    let mut out = vec![0u8; levels.len().div_ceil(2)];
    for (i, &level) in levels.iter().enumerate() {
        if i % 2 == 0 {
            out[i / 2] |= level & 0xF;
        } else {
            out[i / 2] |= (level & 0xF) << 4;
        }
    }
    out
}

/// Unpack `count` 4-bit levels.
pub fn unpack4(bytes: &[u8], count: usize) -> Vec<u8> {
    (0..count)
        .map(|i| {
            if i % 2 == 0 {
                bytes[i / 2] & 0xF
            } else {
                bytes[i / 2] >> 4
            }
        })
        .collect()
}
