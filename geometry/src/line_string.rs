use crate::base::*;
use crate::extent::*;
use crate::flat;
use crate::layout::*;

use std::cell::{Cell, RefCell};

///
/// A connected run of line segments
///
#[derive(Clone, Debug)]
pub struct LineString {
    base:               GeometryBase,
    max_delta:          Cell<Option<(u64, f64)>>,
    simplified_cache:   RefCell<SimplifiedCache<LineString>>,
}

impl LineString {
    pub fn new(layout: GeometryLayout, flat_coordinates: Vec<f64>) -> LineString {
        LineString {
            base:               GeometryBase::new(layout, flat_coordinates),
            max_delta:          Cell::new(None),
            simplified_cache:   RefCell::new(SimplifiedCache::new()),
        }
    }

    ///
    /// Creates an XY line string from coordinate pairs
    ///
    pub fn from_coordinates(coordinates: &[[f64; 2]]) -> LineString {
        let flat = coordinates.iter().flat_map(|point| point.iter().copied()).collect();
        LineString::new(GeometryLayout::XY, flat)
    }

    #[inline]
    pub fn base(&self) -> &GeometryBase {
        &self.base
    }

    #[inline]
    pub fn base_mut(&mut self) -> &mut GeometryBase {
        &mut self.base
    }

    ///
    /// The number of coordinates in this line string
    ///
    #[inline]
    pub fn coordinate_count(&self) -> usize {
        self.base.flat_coordinates().len() / self.base.stride()
    }

    pub fn set_coordinates(&mut self, flat_coordinates: Vec<f64>) {
        self.base.set_flat_coordinates(flat_coordinates);
    }

    pub fn extent(&self) -> Extent {
        self.base.extent()
    }

    pub fn length(&self) -> f64 {
        let flat = self.base.flat_coordinates();
        flat::line_string_length(flat, 0, flat.len(), self.base.stride())
    }

    ///
    /// The square root of the largest squared segment length, cached against the revision
    ///
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
        // Branch and bound: a geometry whose extent is further than the current minimum
        // cannot contain a closer point
        if self.extent().squared_distance_to_xy(x, y) >= min_squared_distance {
            return min_squared_distance;
        }

        let stride = self.base.stride();
        let flat   = self.base.flat_coordinates();
        closest.resize(stride, 0.0);

        flat::assign_closest_point(flat, 0, flat.len(), stride, self.max_delta(), false, x, y, closest, min_squared_distance)
    }

    pub fn intersects_extent(&self, extent: &Extent) -> bool {
        let flat = self.base.flat_coordinates();
        flat::intersects_line_string(flat, 0, flat.len(), self.base.stride(), extent)
    }

    ///
    /// Returns a simplified copy for the supplied squared tolerance
    ///
    /// Simplified copies are cached by tolerance; once a tolerance is known to leave the
    /// coordinates unchanged, every smaller tolerance short-circuits to a plain copy.
    ///
    pub fn simplified(&self, squared_tolerance: f64) -> LineString {
        if squared_tolerance <= 0.0 {
            return self.clone();
        }

        let revision    = self.base.revision();
        let mut cache   = self.simplified_cache.borrow_mut();
        cache.refresh(revision);

        if cache.is_unchanged(squared_tolerance) {
            return self.clone();
        }

        let key = squared_tolerance.to_bits();
        if let Some(simplified) = cache.entries.get(&key) {
            return simplified.clone();
        }

        let flat            = self.base.flat_coordinates();
        let mut simplified  = Vec::with_capacity(flat.len());
        flat::douglas_peucker(flat, 0, flat.len(), self.base.stride(), squared_tolerance, &mut simplified);

        if simplified.len() == flat.len() && self.base.stride() == 2 && simplified == *flat {
            cache.mark_unchanged(squared_tolerance);
            return self.clone();
        }

        let simplified = LineString::new(GeometryLayout::XY, simplified);
        cache.entries.insert(key, simplified.clone());

        simplified
    }
}
