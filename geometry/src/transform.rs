///
/// A 2D affine transformation stored as the six varying entries of a 3x3 matrix
///
/// The entries are `[a, b, c, d, e, f]`, applied as:
///
/// ```text
/// x' = a*x + c*y + e
/// y' = b*x + d*y + f
/// ```
///
/// This is the shape the map shell supplies for converting map units to device pixels,
/// and the shape the replays cache to decide whether a coordinate buffer needs to be
/// re-projected before executing.
///
#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
pub struct Transform(pub [f64; 6]);

impl Default for Transform {
    #[inline]
    fn default() -> Self {
        Transform::identity()
    }
}

impl Transform {
    ///
    /// The identity transformation
    ///
    #[inline]
    pub fn identity() -> Transform {
        Transform([1.0, 0.0, 0.0, 1.0, 0.0, 0.0])
    }

    ///
    /// Composes a transform from a translation, a scale about the origin and a rotation
    ///
    /// The result maps a point by scaling it, rotating it, then translating it: the order
    /// the renderers need for mapping map units to device pixels (scale to pixels, rotate
    /// with the view, move to the viewport origin).
    ///
    pub fn compose(dx: f64, dy: f64, sx: f64, sy: f64, angle: f64) -> Transform {
        let sin = angle.sin();
        let cos = angle.cos();

        Transform([
            sx * cos,
            sy * sin,
            -sx * sin,
            sy * cos,
            dx,
            dy,
        ])
    }

    ///
    /// Creates a translation transform
    ///
    #[inline]
    pub fn translation(dx: f64, dy: f64) -> Transform {
        Transform([1.0, 0.0, 0.0, 1.0, dx, dy])
    }

    ///
    /// Creates a scaling transform about the origin
    ///
    #[inline]
    pub fn scaling(sx: f64, sy: f64) -> Transform {
        Transform([sx, 0.0, 0.0, sy, 0.0, 0.0])
    }

    ///
    /// Applies this transform to the point x, y
    ///
    #[inline]
    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        let Transform([a, b, c, d, e, f]) = self;

        (a*x + c*y + e, b*x + d*y + f)
    }

    ///
    /// Returns the transform equivalent to applying `other` first and then this transform
    ///
    pub fn multiply(&self, other: &Transform) -> Transform {
        let Transform([a1, b1, c1, d1, e1, f1]) = self;
        let Transform([a2, b2, c2, d2, e2, f2]) = other;

        Transform([
            a1*a2 + c1*b2,
            b1*a2 + d1*b2,
            a1*c2 + c1*d2,
            b1*c2 + d1*d2,
            a1*e2 + c1*f2 + e1,
            b1*e2 + d1*f2 + f1,
        ])
    }

    ///
    /// Returns the inverse of this transform, or None if it is singular
    ///
    pub fn invert(&self) -> Option<Transform> {
        let Transform([a, b, c, d, e, f]) = self;
        let det = a*d - c*b;

        if det == 0.0 {
            return None;
        }

        Some(Transform([
            d / det,
            -b / det,
            -c / det,
            a / det,
            (c*f - d*e) / det,
            (b*e - a*f) / det,
        ]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn identity_leaves_points_alone() {
        let (x, y) = Transform::identity().apply(4.0, -7.0);

        assert!(x == 4.0 && y == -7.0);
    }

    #[test]
    fn compose_scales_then_translates() {
        let transform   = Transform::compose(100.0, 50.0, 2.0, -2.0, 0.0);
        let (x, y)      = transform.apply(3.0, 4.0);

        assert!(close(x, 106.0), "Unexpected x: {}", x);
        assert!(close(y, 42.0), "Unexpected y: {}", y);
    }

    #[test]
    fn invert_round_trips() {
        let transform   = Transform::compose(12.0, -3.0, 0.5, 4.0, 0.7);
        let inverse     = transform.invert().unwrap();
        let (x, y)      = inverse.apply(transform.apply(9.0, -2.0).0, transform.apply(9.0, -2.0).1);

        assert!(close(x, 9.0) && close(y, -2.0), "Unexpected point: {} {}", x, y);
    }

    #[test]
    fn multiply_matches_sequential_application() {
        let first       = Transform::compose(3.0, 1.0, 2.0, 2.0, 0.0);
        let second      = Transform::compose(-1.0, 4.0, 1.0, 1.0, 0.3);
        let combined    = second.multiply(&first);

        let (x1, y1)    = first.apply(5.0, 6.0);
        let (x2, y2)    = second.apply(x1, y1);
        let (x3, y3)    = combined.apply(5.0, 6.0);

        assert!(close(x2, x3) && close(y2, y3), "Unexpected point: {} {}", x3, y3);
    }
}
