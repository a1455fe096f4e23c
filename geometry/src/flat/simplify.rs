use smallvec::SmallVec;

///
/// Squared distance from the point x, y to the segment (x1,y1)-(x2,y2)
///
fn squared_segment_distance(x: f64, y: f64, x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    let dx = x2 - x1;
    let dy = y2 - y1;

    let (px, py) = if dx == 0.0 && dy == 0.0 {
        (x1, y1)
    } else {
        let t = ((x - x1) * dx + (y - y1) * dy) / (dx * dx + dy * dy);
        if t <= 0.0 {
            (x1, y1)
        } else if t >= 1.0 {
            (x2, y2)
        } else {
            (x1 + t * dx, y1 + t * dy)
        }
    };

    let dx = x - px;
    let dy = y - py;
    dx * dx + dy * dy
}

///
/// Douglas-Peucker simplification of one coordinate run
///
/// Vertices whose deviation from the simplified path exceeds the tolerance are retained;
/// everything else is dropped. The endpoints always survive. Simplified output is always
/// two-dimensional: x, y pairs are appended to `simplified`.
///
pub fn douglas_peucker(flat_coordinates: &[f64], offset: usize, end: usize, stride: usize, squared_tolerance: f64, simplified: &mut Vec<f64>) {
    let n = (end - offset) / stride;

    if n < 3 {
        let mut idx = offset;
        while idx < end {
            simplified.push(flat_coordinates[idx]);
            simplified.push(flat_coordinates[idx + 1]);
            idx += stride;
        }
        return;
    }

    // markers[i] is set for each vertex that survives
    let mut markers = vec![false; n];
    markers[0]      = true;
    markers[n - 1]  = true;

    let mut stack: SmallVec<[(usize, usize); 32]> = SmallVec::new();
    stack.push((offset, end - stride));

    while let Some((first, last)) = stack.pop() {
        let x1 = flat_coordinates[first];
        let y1 = flat_coordinates[first + 1];
        let x2 = flat_coordinates[last];
        let y2 = flat_coordinates[last + 1];

        let mut max_squared_distance    = 0.0;
        let mut max_index               = 0;

        let mut idx = first + stride;
        while idx < last {
            let squared_distance = squared_segment_distance(
                flat_coordinates[idx], flat_coordinates[idx + 1], x1, y1, x2, y2,
            );
            if squared_distance > max_squared_distance {
                max_squared_distance    = squared_distance;
                max_index               = idx;
            }
            idx += stride;
        }

        if max_squared_distance > squared_tolerance {
            markers[(max_index - offset) / stride] = true;

            if first + stride < max_index {
                stack.push((first, max_index));
            }
            if max_index + stride < last {
                stack.push((max_index, last));
            }
        }
    }

    for (vertex, marker) in markers.iter().enumerate() {
        if *marker {
            let idx = offset + vertex * stride;
            simplified.push(flat_coordinates[idx]);
            simplified.push(flat_coordinates[idx + 1]);
        }
    }
}

///
/// `douglas_peucker` over a multi-part run, returning the new end offsets
///
pub fn douglas_peucker_ends(flat_coordinates: &[f64], offset: usize, ends: &[usize], stride: usize, squared_tolerance: f64, simplified: &mut Vec<f64>) -> Vec<usize> {
    let mut simplified_ends = Vec::with_capacity(ends.len());
    let mut offset          = offset;

    for end in ends {
        douglas_peucker(flat_coordinates, offset, *end, stride, squared_tolerance, simplified);
        simplified_ends.push(simplified.len());
        offset = *end;
    }

    simplified_ends
}

///
/// Radial-distance pre-pass: drops consecutive vertices closer together than the
/// tolerance, keeping the endpoints
///
/// A cheap reduction for very dense inputs, run ahead of Douglas-Peucker.
///
pub fn radial_distance(flat_coordinates: &[f64], offset: usize, end: usize, stride: usize, squared_tolerance: f64, simplified: &mut Vec<f64>) {
    if (end - offset) / stride < 3 {
        let mut idx = offset;
        while idx < end {
            simplified.push(flat_coordinates[idx]);
            simplified.push(flat_coordinates[idx + 1]);
            idx += stride;
        }
        return;
    }

    let mut x1 = flat_coordinates[offset];
    let mut y1 = flat_coordinates[offset + 1];
    simplified.push(x1);
    simplified.push(y1);

    let mut last_pushed = (x1, y1);
    let mut idx = offset + stride;
    while idx < end - stride {
        let x2 = flat_coordinates[idx];
        let y2 = flat_coordinates[idx + 1];
        let dx = x2 - x1;
        let dy = y2 - y1;

        if dx * dx + dy * dy > squared_tolerance {
            simplified.push(x2);
            simplified.push(y2);
            last_pushed = (x2, y2);
            x1 = x2;
            y1 = y2;
        }
        idx += stride;
    }

    // The final coordinate always survives
    let x2 = flat_coordinates[end - stride];
    let y2 = flat_coordinates[end - stride + 1];
    if (x2, y2) != last_pushed || simplified.len() == 2 {
        simplified.push(x2);
        simplified.push(y2);
    }
}

#[inline]
fn snap(value: f64, tolerance: f64) -> f64 {
    tolerance * (value / tolerance).round()
}

///
/// Grid quantization: snaps coordinates to a grid with cells the size of the tolerance,
/// dropping duplicate and collinear-extension points
///
/// Preserves topology better than Douglas-Peucker under heavy simplification, which is
/// why the polygon types use it for their simplified copies.
///
pub fn quantize(flat_coordinates: &[f64], offset: usize, end: usize, stride: usize, tolerance: f64, simplified: &mut Vec<f64>) {
    if end <= offset {
        return;
    }

    // Nothing to snap to: pass the coordinates through unchanged
    if tolerance <= 0.0 {
        let mut idx = offset;
        while idx < end {
            simplified.push(flat_coordinates[idx]);
            simplified.push(flat_coordinates[idx + 1]);
            idx += stride;
        }
        return;
    }

    // First snapped coordinate
    let mut offset  = offset;
    let x1          = snap(flat_coordinates[offset], tolerance);
    let y1          = snap(flat_coordinates[offset + 1], tolerance);
    offset += stride;
    simplified.push(x1);
    simplified.push(y1);

    let (mut x1, mut y1) = (x1, y1);

    // Skip forward to the first coordinate that snaps somewhere new
    let (mut x2, mut y2);
    loop {
        if offset >= end {
            return;
        }
        x2 = snap(flat_coordinates[offset], tolerance);
        y2 = snap(flat_coordinates[offset + 1], tolerance);
        offset += stride;
        if x2 != x1 || y2 != y1 {
            break;
        }
    }

    while offset < end {
        let x3 = snap(flat_coordinates[offset], tolerance);
        let y3 = snap(flat_coordinates[offset + 1], tolerance);
        offset += stride;

        if x3 == x2 && y3 == y2 {
            continue;
        }

        let dx1 = x2 - x1;
        let dy1 = y2 - y1;
        let dx2 = x3 - x1;
        let dy2 = y3 - y1;

        // A collinear point extending the current segment replaces its predecessor
        if dx1 * dy2 == dy1 * dx2
            && ((dx1 < 0.0 && dx2 < dx1) || dx1 == dx2 || (dx1 > 0.0 && dx2 > dx1))
            && ((dy1 < 0.0 && dy2 < dy1) || dy1 == dy2 || (dy1 > 0.0 && dy2 > dy1)) {
            x2 = x3;
            y2 = y3;
            continue;
        }

        simplified.push(x2);
        simplified.push(y2);
        x1 = x2;
        y1 = y2;
        x2 = x3;
        y2 = y3;
    }

    simplified.push(x2);
    simplified.push(y2);
}

///
/// `quantize` over a multi-part run, returning the new end offsets
///
pub fn quantize_ends(flat_coordinates: &[f64], offset: usize, ends: &[usize], stride: usize, tolerance: f64, simplified: &mut Vec<f64>) -> Vec<usize> {
    let mut simplified_ends = Vec::with_capacity(ends.len());
    let mut offset          = offset;

    for end in ends {
        quantize(flat_coordinates, offset, *end, stride, tolerance, simplified);
        simplified_ends.push(simplified.len());
        offset = *end;
    }

    simplified_ends
}

///
/// `quantize` over a two-level multi-part run, returning the new end offset arrays
///
pub fn quantize_endss(flat_coordinates: &[f64], offset: usize, endss: &[Vec<usize>], stride: usize, tolerance: f64, simplified: &mut Vec<f64>) -> Vec<Vec<usize>> {
    let mut simplified_endss = Vec::with_capacity(endss.len());
    let mut offset           = offset;

    for ends in endss {
        simplified_endss.push(quantize_ends(flat_coordinates, offset, ends, stride, tolerance, simplified));
        offset = *ends.last().unwrap_or(&offset);
    }

    simplified_endss
}
