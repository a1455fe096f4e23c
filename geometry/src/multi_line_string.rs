use crate::base::*;
use crate::extent::*;
use crate::flat;
use crate::layout::*;
use crate::line_string::*;

use std::cell::{Cell, RefCell};

///
/// A set of line strings in one flat buffer, with `ends` marking where each part stops
///
#[derive(Clone, Debug)]
pub struct MultiLineString {
    base:               GeometryBase,
    ends:               Vec<usize>,
    max_delta:          Cell<Option<(u64, f64)>>,
    simplified_cache:   RefCell<SimplifiedCache<MultiLineString>>,
}

impl MultiLineString {
    pub fn new(layout: GeometryLayout, flat_coordinates: Vec<f64>, ends: Vec<usize>) -> MultiLineString {
        assert!(ends.windows(2).all(|pair| pair[0] <= pair[1]), "Part ends must be non-decreasing: {:?}", ends);
        assert!(ends.last().copied().unwrap_or(0) == flat_coordinates.len(), "Part ends must terminate at the buffer length");

        MultiLineString {
            base:               GeometryBase::new(layout, flat_coordinates),
            ends,
            max_delta:          Cell::new(None),
            simplified_cache:   RefCell::new(SimplifiedCache::new()),
        }
    }

    ///
    /// Creates an XY multi-line-string from per-part coordinate pairs
    ///
    pub fn from_coordinates(parts: &[Vec<[f64; 2]>]) -> MultiLineString {
        let mut flat = vec![];
        let mut ends = vec![];

        for part in parts {
            for point in part {
                flat.push(point[0]);
                flat.push(point[1]);
            }
            ends.push(flat.len());
        }

        MultiLineString::new(GeometryLayout::XY, flat, ends)
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
    pub fn ends(&self) -> &[usize] {
        &self.ends
    }

    #[inline]
    pub fn part_count(&self) -> usize {
        self.ends.len()
    }

    ///
    /// Extracts one member line string
    ///
    pub fn line_string(&self, index: usize) -> Option<LineString> {
        if index >= self.ends.len() {
            return None;
        }

        let offset  = if index == 0 { 0 } else { self.ends[index - 1] };
        let end     = self.ends[index];
        let flat    = self.base.flat_coordinates()[offset..end].to_vec();

        Some(LineString::new(self.base.layout(), flat))
    }

    pub fn set_coordinates(&mut self, flat_coordinates: Vec<f64>, ends: Vec<usize>) {
        assert!(ends.last().copied().unwrap_or(0) == flat_coordinates.len(), "Part ends must terminate at the buffer length");

        self.ends = ends;
        self.base.set_flat_coordinates(flat_coordinates);
    }

    pub fn extent(&self) -> Extent {
        self.base.extent()
    }

    fn max_delta(&self) -> f64 {
        let revision = self.base.revision();

        if let Some((cached_revision, max_delta)) = self.max_delta.get() {
            if cached_revision == revision {
                return max_delta;
            }
        }

        let flat        = self.base.flat_coordinates();
        let max_delta   = flat::max_squared_deltas(flat, 0, &self.ends, self.base.stride(), 0.0).sqrt();
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

        flat::assign_closest_array_point(flat, 0, &self.ends, stride, self.max_delta(), false, x, y, closest, min_squared_distance)
    }

    pub fn intersects_extent(&self, extent: &Extent) -> bool {
        let flat = self.base.flat_coordinates();
        flat::intersects_line_strings(flat, 0, &self.ends, self.base.stride(), extent)
    }

    ///
    /// Returns a simplified copy, applying Douglas-Peucker to every part
    ///
    pub fn simplified(&self, squared_tolerance: f64) -> MultiLineString {
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
        let simplified_ends = flat::douglas_peucker_ends(flat, 0, &self.ends, self.base.stride(), squared_tolerance, &mut simplified);

        if simplified.len() == flat.len() && self.base.stride() == 2 && simplified == *flat {
            cache.mark_unchanged(squared_tolerance);
            return self.clone();
        }

        let simplified = MultiLineString::new(GeometryLayout::XY, simplified, simplified_ends);
        cache.entries.insert(key, simplified.clone());

        simplified
    }
}
