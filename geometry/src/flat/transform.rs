use crate::transform::*;

///
/// Applies an affine transform to a run of flat coordinates, appending the transformed
/// x, y pairs to `dest`
///
/// This is the projection step the replays run once per distinct transform: map units in,
/// device pixels out.
///
pub fn transform_2d(flat_coordinates: &[f64], offset: usize, end: usize, stride: usize, transform: &Transform, dest: &mut Vec<f64>) {
    let mut idx = offset;
    while idx < end {
        let (x, y) = transform.apply(flat_coordinates[idx], flat_coordinates[idx + 1]);
        dest.push(x);
        dest.push(y);
        idx += stride;
    }
}

///
/// Rotates flat coordinates in place around an anchor point
///
pub fn rotate_coordinates(flat_coordinates: &mut [f64], offset: usize, end: usize, stride: usize, angle: f64, anchor: (f64, f64)) {
    let cos = angle.cos();
    let sin = angle.sin();

    let mut idx = offset;
    while idx < end {
        let x = flat_coordinates[idx] - anchor.0;
        let y = flat_coordinates[idx + 1] - anchor.1;

        flat_coordinates[idx]       = anchor.0 + x * cos - y * sin;
        flat_coordinates[idx + 1]   = anchor.1 + x * sin + y * cos;
        idx += stride;
    }
}

///
/// Scales flat coordinates in place about an anchor point
///
pub fn scale_coordinates(flat_coordinates: &mut [f64], offset: usize, end: usize, stride: usize, sx: f64, sy: f64, anchor: (f64, f64)) {
    let mut idx = offset;
    while idx < end {
        flat_coordinates[idx]       = anchor.0 + sx * (flat_coordinates[idx] - anchor.0);
        flat_coordinates[idx + 1]   = anchor.1 + sy * (flat_coordinates[idx + 1] - anchor.1);
        idx += stride;
    }
}

///
/// Translates flat coordinates in place
///
pub fn translate_coordinates(flat_coordinates: &mut [f64], offset: usize, end: usize, stride: usize, dx: f64, dy: f64) {
    let mut idx = offset;
    while idx < end {
        flat_coordinates[idx]       += dx;
        flat_coordinates[idx + 1]   += dy;
        idx += stride;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn transform_2d_projects_to_pixels() {
        let flat        = vec![1.0, 1.0, 2.0, 2.0];
        let transform   = Transform::compose(10.0, 10.0, 2.0, -2.0, 0.0);
        let mut dest    = vec![];

        transform_2d(&flat, 0, 4, 2, &transform, &mut dest);

        assert!(dest == vec![12.0, 8.0, 14.0, 6.0], "Unexpected: {:?}", dest);
    }

    #[test]
    fn rotate_quarter_turn() {
        let mut flat = vec![1.0, 0.0];
        rotate_coordinates(&mut flat, 0, 2, 2, PI / 2.0, (0.0, 0.0));

        assert!((flat[0]).abs() < 1e-12 && (flat[1] - 1.0).abs() < 1e-12, "Unexpected: {:?}", flat);
    }

    #[test]
    fn scale_about_anchor() {
        let mut flat = vec![2.0, 2.0];
        scale_coordinates(&mut flat, 0, 2, 2, 2.0, 3.0, (1.0, 1.0));

        assert!(flat == vec![3.0, 4.0], "Unexpected: {:?}", flat);
    }

    #[test]
    fn translate_keeps_extra_dimensions() {
        let mut flat = vec![0.0, 0.0, 7.0, 1.0, 1.0, 8.0];
        translate_coordinates(&mut flat, 0, 6, 3, 10.0, 20.0);

        assert!(flat == vec![10.0, 20.0, 7.0, 11.0, 21.0, 8.0], "Unexpected: {:?}", flat);
    }
}
