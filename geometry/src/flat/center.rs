use crate::extent::*;

///
/// Center of the extent of the exterior ring of one polygon's ring set
///
pub fn linear_rings_center(flat_coordinates: &[f64], offset: usize, ends: &[usize], stride: usize) -> (f64, f64) {
    let end     = ends.first().copied().unwrap_or(offset);
    let extent  = Extent::from_flat_coordinates(flat_coordinates, offset, end, stride);

    extent.center()
}

///
/// Extent centers of the exterior rings of each polygon in a multi-polygon, flattened
/// as x, y pairs
///
/// These are the fallback anchors used when a polygon has no valid interior point.
///
pub fn linear_ringss_centers(flat_coordinates: &[f64], offset: usize, endss: &[Vec<usize>], stride: usize) -> Vec<f64> {
    let mut centers = Vec::with_capacity(endss.len() * 2);
    let mut offset  = offset;

    for ends in endss {
        let (x, y) = linear_rings_center(flat_coordinates, offset, ends, stride);
        centers.push(x);
        centers.push(y);

        offset = *ends.last().unwrap_or(&offset);
    }

    centers
}
