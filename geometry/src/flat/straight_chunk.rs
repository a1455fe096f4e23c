///
/// Finds the longest chunk of a line string whose direction never turns by more than
/// `max_angle` radians between consecutive segments
///
/// Text placed along a line is drawn glyph by glyph over such a chunk so that adjacent
/// letters never rotate too far relative to one another. Returns the `(start, end)`
/// offsets of the matching chunk within the flat buffer.
///
pub fn matching_chunk(max_angle: f64, flat_coordinates: &[f64], offset: usize, end: usize, stride: usize) -> (usize, usize) {
    let mut chunk_start = offset;
    let mut chunk_end   = offset;
    let mut chunk_m     = 0.0;
    let mut m           = 0.0;
    let mut start       = offset;

    let mut x1: Option<(f64, f64)>          = None;
    let mut seg12: Option<(f64, f64, f64)>  = None;
    let mut m23                             = 0.0;

    let mut idx = offset;
    while idx < end {
        let x2 = flat_coordinates[idx];
        let y2 = flat_coordinates[idx + 1];

        if let Some((px, py)) = x1 {
            let x23 = x2 - px;
            let y23 = y2 - py;
            m23     = (x23 * x23 + y23 * y23).sqrt();

            if let Some((x12, y12, m12)) = seg12 {
                m += m12;
                let angle = ((x12 * x23 + y12 * y23) / (m12 * m23)).clamp(-1.0, 1.0).acos();

                if angle > max_angle {
                    // Turn too sharp: close the current chunk and start a new one at the
                    // previous vertex
                    if m > chunk_m {
                        chunk_m     = m;
                        chunk_start = start;
                        chunk_end   = idx;
                    }
                    m       = 0.0;
                    start   = idx - stride;
                }
            }

            seg12 = Some((x23, y23, m23));
        }

        x1 = Some((x2, y2));
        idx += stride;
    }

    m += m23;
    if m > chunk_m {
        (start, end)
    } else {
        (chunk_start, chunk_end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn straight_line_matches_entirely() {
        let flat = vec![0.0, 0.0, 5.0, 0.0, 10.0, 0.0];

        assert!(matching_chunk(PI / 4.0, &flat, 0, 6, 2) == (0, 6));
    }

    #[test]
    fn right_angle_splits_chunks() {
        // The longer leg after the right angle wins
        let flat = vec![0.0, 0.0, 2.0, 0.0, 2.0, 10.0];
        let (start, end) = matching_chunk(PI / 4.0, &flat, 0, 6, 2);

        assert!((start, end) == (2, 6), "Unexpected chunk: {} {}", start, end);
    }

    #[test]
    fn gentle_bends_stay_in_one_chunk() {
        let flat = vec![0.0, 0.0, 5.0, 0.5, 10.0, 0.0, 15.0, 0.5];

        assert!(matching_chunk(PI / 4.0, &flat, 0, 8, 2) == (0, 8));
    }
}
