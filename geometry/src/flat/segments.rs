///
/// Calls `callback` for every segment of a run of flat coordinates, stopping early and
/// returning true as soon as the callback does
///
pub fn for_each_segment<Callback>(flat_coordinates: &[f64], offset: usize, end: usize, stride: usize, mut callback: Callback) -> bool
where
    Callback: FnMut(f64, f64, f64, f64) -> bool,
{
    if end < offset + 2 * stride {
        return false;
    }

    let mut idx = offset + stride;
    while idx < end {
        if callback(
            flat_coordinates[idx - stride], flat_coordinates[idx - stride + 1],
            flat_coordinates[idx], flat_coordinates[idx + 1],
        ) {
            return true;
        }
        idx += stride;
    }

    false
}

///
/// True if the segments (x1,y1)-(x2,y2) and (x3,y3)-(x4,y4) intersect
///
pub fn segments_intersect(x1: f64, y1: f64, x2: f64, y2: f64, x3: f64, y3: f64, x4: f64, y4: f64) -> bool {
    let d12 = (x2 - x1, y2 - y1);
    let d34 = (x4 - x3, y4 - y3);

    let denominator = d12.0 * d34.1 - d12.1 * d34.0;
    if denominator == 0.0 {
        // Parallel segments only intersect when collinear and overlapping; the renderers
        // treat that case as no crossing
        return false;
    }

    let t = ((x3 - x1) * d34.1 - (y3 - y1) * d34.0) / denominator;
    let u = ((x3 - x1) * d12.1 - (y3 - y1) * d12.0) / denominator;

    (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u)
}

///
/// The intersection point of two segments known to intersect
///
pub fn segment_intersection_point(x1: f64, y1: f64, x2: f64, y2: f64, x3: f64, y3: f64, x4: f64, y4: f64) -> Option<(f64, f64)> {
    let d12 = (x2 - x1, y2 - y1);
    let d34 = (x4 - x3, y4 - y3);

    let denominator = d12.0 * d34.1 - d12.1 * d34.0;
    if denominator == 0.0 {
        return None;
    }

    let t = ((x3 - x1) * d34.1 - (y3 - y1) * d34.0) / denominator;

    Some((x1 + t * d12.0, y1 + t * d12.1))
}
