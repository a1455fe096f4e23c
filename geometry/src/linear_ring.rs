use crate::base::*;
use crate::extent::*;
use crate::flat;
use crate::layout::*;

use std::cell::Cell;

///
/// A closed ring of coordinates, used as a polygon boundary
///
/// Rings are construction material for polygons rather than a renderable geometry in
/// their own right: the replay renderers have no drawing operation for them.
///
#[derive(Clone, Debug)]
pub struct LinearRing {
    base:       GeometryBase,
    max_delta:  Cell<Option<(u64, f64)>>,
}

impl LinearRing {
    pub fn new(layout: GeometryLayout, flat_coordinates: Vec<f64>) -> LinearRing {
        LinearRing {
            base:       GeometryBase::new(layout, flat_coordinates),
            max_delta:  Cell::new(None),
        }
    }

    pub fn from_coordinates(coordinates: &[[f64; 2]]) -> LinearRing {
        let flat = coordinates.iter().flat_map(|point| point.iter().copied()).collect();
        LinearRing::new(GeometryLayout::XY, flat)
    }

    #[inline]
    pub fn base(&self) -> &GeometryBase {
        &self.base
    }

    #[inline]
    pub fn base_mut(&mut self) -> &mut GeometryBase {
        &mut self.base
    }

    pub fn set_coordinates(&mut self, flat_coordinates: Vec<f64>) {
        self.base.set_flat_coordinates(flat_coordinates);
    }

    pub fn extent(&self) -> Extent {
        self.base.extent()
    }

    ///
    /// Signed area: positive for counter-clockwise winding
    ///
    pub fn area(&self) -> f64 {
        let flat = self.base.flat_coordinates();
        flat::linear_ring_area(flat, 0, flat.len(), self.base.stride())
    }

    pub fn is_clockwise(&self) -> bool {
        let flat = self.base.flat_coordinates();
        flat::linear_ring_is_clockwise(flat, 0, flat.len(), self.base.stride())
    }

    fn max_delta(&self) -> f64 {
        let revision = self.base.revision();

        if let Some((cached_revision, max_delta)) = self.max_delta.get() {
            if cached_revision == revision {
                return max_delta;
            }
        }

        let flat        = self.base.flat_coordinates();
        let max_delta   = flat::max_squared_delta(flat, 0, flat.len(), self.base.stride(), 0.0).sqrt();
        self.max_delta.set(Some((revision, max_delta)));

        max_delta
    }

    pub fn closest_point_xy(&self, x: f64, y: f64, closest: &mut Vec<f64>, min_squared_distance: f64) -> f64 {
        if self.extent().squared_distance_to_xy(x, y) >= min_squared_distance {
            return min_squared_distance;
        }

        let stride = self.base.stride();
        let flat   = self.base.flat_coordinates();
        closest.resize(stride, 0.0);

        flat::assign_closest_point(flat, 0, flat.len(), stride, self.max_delta(), true, x, y, closest, min_squared_distance)
    }

    pub fn contains_xy(&self, x: f64, y: f64) -> bool {
        let flat = self.base.flat_coordinates();
        flat::linear_ring_contains_xy(flat, 0, flat.len(), self.base.stride(), x, y)
    }
}
