use carta_geometry::flat;
use carta_geometry::*;

///
/// Appends a run of flat coordinates to `dest` as XY pairs, dropping runs of segments
/// that stay outside `max_extent`
///
/// A stroked line far off screen still needs its re-entry point drawn correctly, so a
/// skipped run is replaced by its last coordinate before the path comes back towards the
/// extent: the stroke crosses the viewport boundary in the right place while the
/// instruction tape stays bounded by what is visible. Closed rings keep their final
/// coordinate so the ring still closes after clipping.
///
/// Returns the end offset of the appended run within `dest`.
///
pub fn append_clipped_coordinates(
    dest: &mut Vec<f64>,
    flat_coordinates: &[f64], offset: usize, end: usize, stride: usize,
    max_extent: &Extent, closed: bool,
) -> usize {
    let mut skipped_coord: Option<(f64, f64)> = None;
    let mut last: Option<(f64, f64)>          = None;

    let mut idx = offset;
    while idx < end {
        let x = flat_coordinates[idx];
        let y = flat_coordinates[idx + 1];

        let keep = match last {
            None            => true,
            Some((lx, ly))  => {
                // Keep the segment if either endpoint is inside or it crosses the extent
                max_extent.contains_xy(x, y)
                    || max_extent.contains_xy(lx, ly)
                    || flat::intersects_segment(max_extent, lx, ly, x, y)
            }
        };

        if keep {
            if let Some((sx, sy)) = skipped_coord.take() {
                // The path went away and came back: record where it last was so the
                // boundary crossing is drawn from the right direction
                dest.push(sx);
                dest.push(sy);
            }
            dest.push(x);
            dest.push(y);
        } else {
            skipped_coord = Some((x, y));
        }

        last = Some((x, y));
        idx += stride;
    }

    // A ring must end where it started even if the tail was skipped
    if closed {
        if let Some((sx, sy)) = skipped_coord {
            dest.push(sx);
            dest.push(sy);
        }
    }

    dest.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinates_inside_are_kept_verbatim() {
        let extent  = Extent::new(0.0, 0.0, 10.0, 10.0);
        let line    = vec![1.0, 1.0, 5.0, 5.0, 9.0, 9.0];
        let mut out = vec![];

        append_clipped_coordinates(&mut out, &line, 0, line.len(), 2, &extent, false);

        assert!(out == line, "Unexpected clip result: {:?}", out);
    }

    #[test]
    fn off_extent_runs_collapse_to_reentry_points() {
        let extent  = Extent::new(0.0, 0.0, 10.0, 10.0);
        // Wanders far to the right before coming back: the two interior off-extent
        // points collapse into the one the path turns around at
        let line    = vec![5.0, 5.0, 50.0, 5.0, 80.0, 5.0, 80.0, 6.0, 5.0, 6.0];
        let mut out = vec![];

        append_clipped_coordinates(&mut out, &line, 0, line.len(), 2, &extent, false);

        assert!(out.len() < line.len(), "Nothing was clipped: {:?}", out);
        // First and final coordinates survive
        assert!(out[0] == 5.0 && out[1] == 5.0);
        assert!(out[out.len()-2] == 5.0 && out[out.len()-1] == 6.0);
    }

    #[test]
    fn fully_outside_line_is_bounded() {
        let extent  = Extent::new(0.0, 0.0, 10.0, 10.0);
        let line    = vec![100.0, 100.0, 110.0, 100.0, 120.0, 100.0, 130.0, 100.0];
        let mut out = vec![];

        append_clipped_coordinates(&mut out, &line, 0, line.len(), 2, &extent, false);

        // Only the first coordinate is kept: every following segment stays outside
        assert!(out.len() == 2, "Unexpected clip result: {:?}", out);
    }
}
