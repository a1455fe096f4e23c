use crate::base::*;
use crate::extent::*;
use crate::flat;
use crate::layout::*;
use crate::polygon::*;

use std::cell::{Cell, RefCell};

///
/// A set of polygons in one flat buffer, with one `ends` array per polygon
///
#[derive(Clone, Debug)]
pub struct MultiPolygon {
    base:               GeometryBase,
    endss:              Vec<Vec<usize>>,
    max_delta:          Cell<Option<(u64, f64)>>,
    oriented:           RefCell<Option<(u64, Vec<f64>)>>,
    simplified_cache:   RefCell<SimplifiedCache<MultiPolygon>>,
}

impl MultiPolygon {
    pub fn new(layout: GeometryLayout, flat_coordinates: Vec<f64>, endss: Vec<Vec<usize>>) -> MultiPolygon {
        let terminal = endss.last().and_then(|ends| ends.last()).copied().unwrap_or(0);
        assert!(terminal == flat_coordinates.len(), "Ring ends must terminate at the buffer length {} (got {})", flat_coordinates.len(), terminal);

        MultiPolygon {
            base:               GeometryBase::new(layout, flat_coordinates),
            endss,
            max_delta:          Cell::new(None),
            oriented:           RefCell::new(None),
            simplified_cache:   RefCell::new(SimplifiedCache::new()),
        }
    }

    ///
    /// Creates an XY multi-polygon from per-polygon, per-ring coordinate pairs
    ///
    pub fn from_polygons(polygons: &[Vec<Vec<[f64; 2]>>]) -> MultiPolygon {
        let mut flat    = vec![];
        let mut endss   = vec![];

        for rings in polygons {
            let mut ends = vec![];
            for ring in rings {
                for point in ring {
                    flat.push(point[0]);
                    flat.push(point[1]);
                }
                ends.push(flat.len());
            }
            endss.push(ends);
        }

        MultiPolygon::new(GeometryLayout::XY, flat, endss)
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
    pub fn endss(&self) -> &[Vec<usize>] {
        &self.endss
    }

    #[inline]
    pub fn polygon_count(&self) -> usize {
        self.endss.len()
    }

    ///
    /// Extracts one member polygon
    ///
    pub fn polygon(&self, index: usize) -> Option<Polygon> {
        if index >= self.endss.len() {
            return None;
        }

        let offset = if index == 0 {
            0
        } else {
            self.endss[index - 1].last().copied().unwrap_or(0)
        };

        let ends: Vec<usize> = self.endss[index].iter().map(|end| end - offset).collect();
        let end              = self.endss[index].last().copied().unwrap_or(offset);
        let flat             = self.base.flat_coordinates()[offset..end].to_vec();

        Some(Polygon::new(self.base.layout(), flat, ends))
    }

    pub fn set_coordinates(&mut self, flat_coordinates: Vec<f64>, endss: Vec<Vec<usize>>) {
        let terminal = endss.last().and_then(|ends| ends.last()).copied().unwrap_or(0);
        assert!(terminal == flat_coordinates.len(), "Ring ends must terminate at the buffer length");

        self.endss = endss;
        self.base.set_flat_coordinates(flat_coordinates);
    }

    pub fn extent(&self) -> Extent {
        self.base.extent()
    }

    pub fn area(&self) -> f64 {
        let oriented = self.oriented_flat_coordinates();
        flat::linear_ringss_area(&oriented, 0, &self.endss, self.base.stride())
    }

    pub fn oriented_flat_coordinates(&self) -> Vec<f64> {
        let revision = self.base.revision();

        {
            let oriented = self.oriented.borrow();
            if let Some((cached_revision, coordinates)) = oriented.as_ref() {
                if *cached_revision == revision {
                    return coordinates.clone();
                }
            }
        }

        let stride          = self.base.stride();
        let mut coordinates = self.base.flat_coordinates().to_vec();

        if !flat::linear_ringss_are_oriented(&coordinates, 0, &self.endss, stride, true) {
            flat::orient_linear_ringss(&mut coordinates, 0, &self.endss, stride, true);
        }

        *self.oriented.borrow_mut() = Some((revision, coordinates.clone()));
        coordinates
    }

    ///
    /// One interior point per member polygon, flattened as x, y pairs
    ///
    pub fn interior_points(&self) -> Vec<f64> {
        let oriented    = self.oriented_flat_coordinates();
        let stride      = self.base.stride();
        let centers     = flat::linear_ringss_centers(&oriented, 0, &self.endss, stride);

        flat::interior_points_of_multi_array(&oriented, 0, &self.endss, stride, &centers)
    }

    pub fn contains_xy(&self, x: f64, y: f64) -> bool {
        let oriented = self.oriented_flat_coordinates();
        flat::linear_ringss_contains_xy(&oriented, 0, &self.endss, self.base.stride(), x, y)
    }

    fn max_delta(&self) -> f64 {
        let revision = self.base.revision();

        if let Some((cached_revision, max_delta)) = self.max_delta.get() {
            if cached_revision == revision {
                return max_delta;
            }
        }

        let flat        = self.base.flat_coordinates();
        let mut max     = 0.0;
        let mut offset  = 0;
        for ends in &self.endss {
            max     = flat::max_squared_deltas(flat, offset, ends, self.base.stride(), max);
            offset  = *ends.last().unwrap_or(&offset);
        }
        let max_delta = max.sqrt();
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

        flat::assign_closest_multi_array_point(flat, 0, &self.endss, stride, self.max_delta(), true, x, y, closest, min_squared_distance)
    }

    pub fn intersects_extent(&self, extent: &Extent) -> bool {
        let oriented = self.oriented_flat_coordinates();
        flat::intersects_linear_ringss(&oriented, 0, &self.endss, self.base.stride(), extent)
    }

    ///
    /// Returns a simplified copy using grid quantization per ring
    ///
    pub fn simplified(&self, squared_tolerance: f64) -> MultiPolygon {
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

        let flat             = self.base.flat_coordinates();
        let tolerance        = squared_tolerance.sqrt();
        let mut simplified   = Vec::with_capacity(flat.len());
        let simplified_endss = flat::quantize_endss(flat, 0, &self.endss, self.base.stride(), tolerance, &mut simplified);

        if simplified.len() == flat.len() && self.base.stride() == 2 && simplified == *flat {
            cache.mark_unchanged(squared_tolerance);
            return self.clone();
        }

        let simplified = MultiPolygon::new(GeometryLayout::XY, simplified, simplified_endss);
        cache.entries.insert(key, simplified.clone());

        simplified
    }
}
