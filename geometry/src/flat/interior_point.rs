use super::contains::*;

use itertools::Itertools;

///
/// Picks a point interior to a ring set, suitable for anchoring a label
///
/// A horizontal line is cast through `center_y` (normally the vertical center of the
/// exterior ring's extent). Every ring/line intersection is collected and sorted; the
/// midpoints of consecutive intersection pairs are candidate anchors, and the candidate
/// with the longest run that actually lies inside the ring set wins. When two runs tie,
/// the leftmost one is kept. Degenerate rings that produce no valid candidate fall back
/// to `fallback` (normally the extent center).
///
pub fn interior_point_of_rings(
    flat_coordinates: &[f64], offset: usize, ends: &[usize], stride: usize,
    center_y: f64, fallback: (f64, f64),
) -> (f64, f64) {
    // Collect the intersections of y = center_y with every ring segment
    let mut intersections: Vec<f64> = vec![];
    let mut ring_offset = offset;

    for end in ends {
        let end = *end;
        if end > ring_offset {
            let mut x1 = flat_coordinates[end - stride];
            let mut y1 = flat_coordinates[end - stride + 1];

            let mut idx = ring_offset;
            while idx < end {
                let x2 = flat_coordinates[idx];
                let y2 = flat_coordinates[idx + 1];

                if (y1 <= center_y && y2 > center_y) || (y2 <= center_y && y1 > center_y) {
                    let x = (center_y - y1) / (y2 - y1) * (x2 - x1) + x1;
                    intersections.push(x);
                }

                x1 = x2;
                y1 = y2;
                idx += stride;
            }
        }
        ring_offset = end;
    }

    intersections.sort_by(|a, b| a.partial_cmp(b).unwrap());

    // Choose the contained midpoint with the longest run; ties keep the earlier (leftmost)
    let mut best: Option<(f64, f64)> = None;

    for (left, right) in intersections.iter().tuple_windows() {
        let run         = right - left;
        let midpoint    = (left + right) / 2.0;

        if best.map(|(_, best_run)| run > best_run).unwrap_or(true)
            && linear_rings_contains_xy(flat_coordinates, offset, ends, stride, midpoint, center_y) {
            best = Some((midpoint, run));
        }
    }

    match best {
        Some((x, _))    => (x, center_y),
        None            => fallback,
    }
}

///
/// Interior points for every polygon of a multi-polygon, flattened as x, y pairs
///
/// `centers` holds the fallback anchor for each polygon (see `linear_ringss_centers`),
/// and supplies the scanline height for each polygon's interior point.
///
pub fn interior_points_of_multi_array(
    flat_coordinates: &[f64], offset: usize, endss: &[Vec<usize>], stride: usize,
    centers: &[f64],
) -> Vec<f64> {
    let mut interior_points = Vec::with_capacity(endss.len() * 2);
    let mut offset          = offset;

    for (polygon, ends) in endss.iter().enumerate() {
        let fallback    = (centers[polygon * 2], centers[polygon * 2 + 1]);
        let (x, y)      = interior_point_of_rings(flat_coordinates, offset, ends, stride, fallback.1, fallback);

        interior_points.push(x);
        interior_points.push(y);

        offset = *ends.last().unwrap_or(&offset);
    }

    interior_points
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::center::*;

    #[test]
    fn interior_point_of_square_is_center() {
        let flat    = vec![0.0, 0.0, 4.0, 0.0, 4.0, 4.0, 0.0, 4.0];
        let ends    = vec![8];
        let center  = linear_rings_center(&flat, 0, &ends, 2);
        let (x, y)  = interior_point_of_rings(&flat, 0, &ends, 2, center.1, center);

        assert!(x == 2.0 && y == 2.0, "Unexpected interior point: {} {}", x, y);
    }

    #[test]
    fn interior_point_avoids_hole() {
        // A hole spanning the vertical center: the interior point must land beside it
        let flat = vec![
            0.0, 0.0, 10.0, 0.0, 10.0, 10.0, 0.0, 10.0,
            4.0, 1.0, 4.0, 9.0, 6.0, 9.0, 6.0, 1.0,
        ];
        let ends    = vec![8, 16];
        let center  = linear_rings_center(&flat, 0, &ends, 2);
        let (x, y)  = interior_point_of_rings(&flat, 0, &ends, 2, center.1, center);

        assert!(linear_rings_contains_xy(&flat, 0, &ends, 2, x, y), "Interior point {} {} not contained", x, y);
        // The widest run at y=5 is 0..4, so the point is at x=2
        assert!(x == 2.0 && y == 5.0, "Unexpected interior point: {} {}", x, y);
    }

    #[test]
    fn degenerate_ring_falls_back_to_center() {
        // A zero-height ring has no scanline intersections with strictly-above semantics
        let flat    = vec![0.0, 0.0, 4.0, 0.0, 2.0, 0.0];
        let ends    = vec![6];
        let (x, y)  = interior_point_of_rings(&flat, 0, &ends, 2, 0.0, (2.0, 0.0));

        assert!(x == 2.0 && y == 0.0, "Unexpected fallback point: {} {}", x, y);
    }
}
