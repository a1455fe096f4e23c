use super::area::*;
use super::reverse::*;

///
/// True if the ring winds clockwise (negative signed area)
///
#[inline]
pub fn linear_ring_is_clockwise(flat_coordinates: &[f64], offset: usize, end: usize, stride: usize) -> bool {
    linear_ring_area(flat_coordinates, offset, end, stride) < 0.0
}

///
/// True if the rings follow the expected orientation: with `right_handed` set the
/// exterior ring winds counter-clockwise and every hole winds clockwise, and the mirror
/// of that otherwise
///
pub fn linear_rings_are_oriented(flat_coordinates: &[f64], offset: usize, ends: &[usize], stride: usize, right_handed: bool) -> bool {
    let mut offset = offset;

    for (ring, end) in ends.iter().enumerate() {
        let clockwise       = linear_ring_is_clockwise(flat_coordinates, offset, *end, stride);
        let want_clockwise  = if ring == 0 { !right_handed } else { right_handed };

        if clockwise != want_clockwise {
            return false;
        }
        offset = *end;
    }

    true
}

///
/// `linear_rings_are_oriented` over a multi-polygon
///
pub fn linear_ringss_are_oriented(flat_coordinates: &[f64], offset: usize, endss: &[Vec<usize>], stride: usize, right_handed: bool) -> bool {
    let mut offset = offset;

    for ends in endss {
        if !linear_rings_are_oriented(flat_coordinates, offset, ends, stride, right_handed) {
            return false;
        }
        offset = *ends.last().unwrap_or(&offset);
    }

    true
}

///
/// Reverses rings in place as needed so they follow the expected orientation, returning
/// the end offset of the last ring
///
pub fn orient_linear_rings(flat_coordinates: &mut [f64], offset: usize, ends: &[usize], stride: usize, right_handed: bool) -> usize {
    let mut offset = offset;

    for (ring, end) in ends.iter().enumerate() {
        let clockwise       = linear_ring_is_clockwise(flat_coordinates, offset, *end, stride);
        let want_clockwise  = if ring == 0 { !right_handed } else { right_handed };

        if clockwise != want_clockwise {
            reverse_coordinates(flat_coordinates, offset, *end, stride);
        }
        offset = *end;
    }

    offset
}

///
/// `orient_linear_rings` over a multi-polygon
///
pub fn orient_linear_ringss(flat_coordinates: &mut [f64], offset: usize, endss: &[Vec<usize>], stride: usize, right_handed: bool) -> usize {
    let mut offset = offset;

    for ends in endss {
        offset = orient_linear_rings(flat_coordinates, offset, ends, stride, right_handed);
    }

    offset
}
