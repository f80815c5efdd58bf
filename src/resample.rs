//! 2x chroma resampling: box-filter downsample and the matching
//! reconstruction upsample. Both carry the format's `+0.4` rounding bias.

use crate::pixmap::Plane;

/// Halve a plane in both axes with a 2x2 box filter.
///
/// The plane must have even dimensions.
pub fn downsample_2x(plane: &Plane) -> Plane {
    let (w, h) = (plane.width(), plane.height());
    assert!(w % 2 == 0 && h % 2 == 0, "downsample needs even dimensions");
    let mut out = Plane::new(w / 2, h / 2);
    for y in (0..h).step_by(2) {
        for x in (0..w).step_by(2) {
            let sum = u16::from(plane.get(x, y))
                + u16::from(plane.get(x + 1, y))
                + u16::from(plane.get(x, y + 1))
                + u16::from(plane.get(x + 1, y + 1));
            out.set(x / 2, y / 2, (f32::from(sum) / 4.0 + 0.4) as u8);
        }
    }
    out
}

/// Double a plane in both axes.
///
/// Even positions take the source sample directly; odd positions average
/// with the neighbor to the right/below (both for the diagonal), with
/// neighbor fetches clamped at the plane edge.
pub fn upsample_2x(plane: &Plane) -> Plane {
    let (w, h) = (plane.width(), plane.height());
    let mut out = Plane::new(w * 2, h * 2);
    for y in 0..h {
        for x in 0..w {
            let p1 = f32::from(plane.get(x, y));
            let p2 = f32::from(plane.get((x + 1).min(w - 1), y));
            let p3 = f32::from(plane.get(x, (y + 1).min(h - 1)));
            let p4 = f32::from(plane.get((x + 1).min(w - 1), (y + 1).min(h - 1)));
            out.set(x * 2, y * 2, p1 as u8);
            out.set(x * 2 + 1, y * 2, ((p1 + p2) / 2.0 + 0.4) as u8);
            out.set(x * 2, y * 2 + 1, ((p1 + p3) / 2.0 + 0.4) as u8);
            out.set(x * 2 + 1, y * 2 + 1, ((p1 + p2 + p3 + p4) / 4.0 + 0.4) as u8);
        }
    }
    out
}
