///
/// Signed area of a linear ring, positive when the ring winds counter-clockwise
///
/// The ring does not need to repeat its first coordinate: the closing segment is implied.
///
pub fn linear_ring_area(flat_coordinates: &[f64], offset: usize, end: usize, stride: usize) -> f64 {
    if end <= offset {
        return 0.0;
    }

    let mut twice_area  = 0.0;
    let mut x1          = flat_coordinates[end - stride];
    let mut y1          = flat_coordinates[end - stride + 1];

    let mut idx = offset;
    while idx < end {
        let x2 = flat_coordinates[idx];
        let y2 = flat_coordinates[idx + 1];

        twice_area += x1 * y2 - x2 * y1;

        x1 = x2;
        y1 = y2;
        idx += stride;
    }

    twice_area / 2.0
}

///
/// Signed area of a set of rings forming one polygon (exterior ring plus holes)
///
/// With oriented rings (counter-clockwise exterior, clockwise holes) the hole areas
/// subtract from the exterior area.
///
pub fn linear_rings_area(flat_coordinates: &[f64], offset: usize, ends: &[usize], stride: usize) -> f64 {
    let mut area    = 0.0;
    let mut offset  = offset;

    for end in ends {
        area    += linear_ring_area(flat_coordinates, offset, *end, stride);
        offset  = *end;
    }

    area
}

///
/// Signed area of a set of polygons, each made of a set of rings
///
pub fn linear_ringss_area(flat_coordinates: &[f64], offset: usize, endss: &[Vec<usize>], stride: usize) -> f64 {
    let mut area    = 0.0;
    let mut offset  = offset;

    for ends in endss {
        area    += linear_rings_area(flat_coordinates, offset, ends, stride);
        offset  = *ends.last().unwrap_or(&offset);
    }

    area
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_clockwise_square_has_positive_area() {
        let square = vec![0.0, 0.0, 4.0, 0.0, 4.0, 4.0, 0.0, 4.0];

        assert!(linear_ring_area(&square, 0, 8, 2) == 16.0);
    }

    #[test]
    fn clockwise_square_has_negative_area() {
        let square = vec![0.0, 0.0, 0.0, 4.0, 4.0, 4.0, 4.0, 0.0];

        assert!(linear_ring_area(&square, 0, 8, 2) == -16.0);
    }

    #[test]
    fn hole_subtracts_from_exterior() {
        // 4x4 counter-clockwise square with a 2x2 clockwise hole
        let flat = vec![
            0.0, 0.0, 4.0, 0.0, 4.0, 4.0, 0.0, 4.0,
            1.0, 1.0, 1.0, 3.0, 3.0, 3.0, 3.0, 1.0,
        ];

        assert!(linear_rings_area(&flat, 0, &[8, 16], 2) == 12.0);
    }

    #[test]
    fn empty_ring_has_zero_area() {
        assert!(linear_ring_area(&[], 0, 0, 2) == 0.0);
    }
}
