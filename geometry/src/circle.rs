use crate::base::*;
use crate::extent::*;
use crate::layout::*;

///
/// A circle stored as two coordinates: the center, and the point on the boundary at the
/// positive x axis
///
/// Storing two points instead of a polygonal approximation keeps the geometry exact at
/// any resolution; renderers that need a polygon build one explicitly with
/// `Polygon::from_circle`.
///
#[derive(Clone, Debug)]
pub struct Circle {
    base: GeometryBase,
}

impl Circle {
    pub fn new(center_x: f64, center_y: f64, radius: f64) -> Circle {
        Circle {
            base: GeometryBase::new(GeometryLayout::XY, vec![center_x, center_y, center_x + radius, center_y]),
        }
    }

    #[inline]
    pub fn base(&self) -> &GeometryBase {
        &self.base
    }

    #[inline]
    pub fn base_mut(&mut self) -> &mut GeometryBase {
        &mut self.base
    }

    #[inline]
    pub fn center(&self) -> (f64, f64) {
        let flat = self.base.flat_coordinates();
        (flat[0], flat[1])
    }

    #[inline]
    pub fn radius(&self) -> f64 {
        let flat    = self.base.flat_coordinates();
        let dx      = flat[2] - flat[0];
        let dy      = flat[3] - flat[1];

        (dx * dx + dy * dy).sqrt()
    }

    pub fn set_center(&mut self, center_x: f64, center_y: f64) {
        let radius = self.radius();
        self.base.set_flat_coordinates(vec![center_x, center_y, center_x + radius, center_y]);
    }

    pub fn set_radius(&mut self, radius: f64) {
        let (center_x, center_y) = self.center();
        self.base.set_flat_coordinates(vec![center_x, center_y, center_x + radius, center_y]);
    }

    pub fn extent(&self) -> Extent {
        let (center_x, center_y)    = self.center();
        let radius                  = self.radius();

        Extent::new(center_x - radius, center_y - radius, center_x + radius, center_y + radius)
    }

    pub fn contains_xy(&self, x: f64, y: f64) -> bool {
        let (center_x, center_y)    = self.center();
        let dx                      = x - center_x;
        let dy                      = y - center_y;
        let radius                  = self.radius();

        dx * dx + dy * dy <= radius * radius
    }

    ///
    /// Distance from the probe to this circle, taking the boundary as the closest point
    /// for exterior probes and reporting interior probes as distance zero
    ///
    pub fn closest_point_xy(&self, x: f64, y: f64, closest: &mut Vec<f64>, min_squared_distance: f64) -> f64 {
        let (center_x, center_y)    = self.center();
        let radius                  = self.radius();
        let dx                      = x - center_x;
        let dy                      = y - center_y;
        let center_distance         = (dx * dx + dy * dy).sqrt();

        let squared_distance = if center_distance <= radius {
            0.0
        } else {
            let boundary_distance = center_distance - radius;
            boundary_distance * boundary_distance
        };

        if squared_distance < min_squared_distance {
            closest.clear();
            if center_distance == 0.0 {
                closest.push(center_x + radius);
                closest.push(center_y);
            } else {
                closest.push(center_x + dx * radius / center_distance);
                closest.push(center_y + dy * radius / center_distance);
            }
            squared_distance
        } else {
            min_squared_distance
        }
    }

    ///
    /// True if any point of the extent lies inside or on the circle
    ///
    pub fn intersects_extent(&self, extent: &Extent) -> bool {
        if extent.is_empty() {
            return false;
        }

        let (center_x, center_y) = self.center();

        // The closest point of the extent to the circle center decides the intersection
        let squared_distance    = extent.squared_distance_to_xy(center_x, center_y);
        let radius              = self.radius();

        squared_distance <= radius * radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extent_covers_the_circle() {
        let circle = Circle::new(0.0, 0.0, 5.0);

        assert!(circle.extent() == Extent::new(-5.0, -5.0, 5.0, 5.0));
    }

    #[test]
    fn distant_extent_does_not_intersect() {
        let circle = Circle::new(0.0, 0.0, 5.0);

        assert!(!circle.intersects_extent(&Extent::new(10.0, 10.0, 20.0, 20.0)));
    }

    #[test]
    fn central_extent_intersects() {
        let circle = Circle::new(0.0, 0.0, 5.0);

        assert!(circle.intersects_extent(&Extent::new(-1.0, -1.0, 1.0, 1.0)));
    }

    #[test]
    fn corner_gap_does_not_intersect() {
        // The extent corner at (4, 4) is sqrt(32) > 5 from the center even though the
        // extent overlaps the circle's bounding box
        let circle = Circle::new(0.0, 0.0, 5.0);

        assert!(!circle.intersects_extent(&Extent::new(4.0, 4.0, 6.0, 6.0)));
    }

    #[test]
    fn closest_point_sits_on_the_boundary() {
        let circle      = Circle::new(0.0, 0.0, 5.0);
        let mut closest = vec![];
        let distance    = circle.closest_point_xy(10.0, 0.0, &mut closest, f64::INFINITY);

        assert!(distance == 25.0, "Unexpected distance: {}", distance);
        assert!(closest == vec![5.0, 0.0], "Unexpected closest: {:?}", closest);
    }
}
