use crate::base::*;
use crate::circle::*;
use crate::extent::*;
use crate::flat;
use crate::layout::*;
use crate::linear_ring::*;

use std::cell::{Cell, RefCell};
use std::f64::consts::TAU;

///
/// A polygon: an exterior ring plus zero or more holes, all stored in one flat buffer
/// with `ends` marking where each ring stops
///
/// The orientation convention is right-handed: exterior counter-clockwise, holes
/// clockwise. Input rings may arrive in any winding; `oriented_flat_coordinates` provides
/// a correctly wound copy, recomputed only when the geometry changes.
///
#[derive(Clone, Debug)]
pub struct Polygon {
    base:               GeometryBase,
    ends:               Vec<usize>,
    max_delta:          Cell<Option<(u64, f64)>>,
    oriented:           RefCell<Option<(u64, Vec<f64>)>>,
    simplified_cache:   RefCell<SimplifiedCache<Polygon>>,
}

impl Polygon {
    ///
    /// Creates a polygon from a flat buffer and ring end offsets
    ///
    /// `ends` must be non-decreasing and terminate at the buffer length.
    ///
    pub fn new(layout: GeometryLayout, flat_coordinates: Vec<f64>, ends: Vec<usize>) -> Polygon {
        let length = flat_coordinates.len();
        assert!(ends.windows(2).all(|pair| pair[0] <= pair[1]), "Ring ends must be non-decreasing: {:?}", ends);
        assert!(ends.last().copied().unwrap_or(0) == length, "Ring ends must terminate at the buffer length {} (got {:?})", length, ends);

        Polygon {
            base:               GeometryBase::new(layout, flat_coordinates),
            ends,
            max_delta:          Cell::new(None),
            oriented:           RefCell::new(None),
            simplified_cache:   RefCell::new(SimplifiedCache::new()),
        }
    }

    ///
    /// Creates an XY polygon from rings of coordinate pairs (exterior first)
    ///
    pub fn from_rings(rings: &[Vec<[f64; 2]>]) -> Polygon {
        let mut flat = vec![];
        let mut ends = vec![];

        for ring in rings {
            for point in ring {
                flat.push(point[0]);
                flat.push(point[1]);
            }
            ends.push(flat.len());
        }

        Polygon::new(GeometryLayout::XY, flat, ends)
    }

    ///
    /// Approximates a circle as a regular polygon with `sides` vertices
    ///
    /// The first vertex sits at `rotation` radians from the positive x axis.
    ///
    pub fn from_circle(circle: &Circle, sides: usize, rotation: f64) -> Polygon {
        let sides       = sides.max(3);
        let (cx, cy)    = circle.center();
        let radius      = circle.radius();

        let mut flat = Vec::with_capacity(sides * 2);
        for vertex in 0..sides {
            let angle = rotation + TAU * (vertex as f64) / (sides as f64);
            flat.push(cx + radius * angle.cos());
            flat.push(cy + radius * angle.sin());
        }

        let ends = vec![flat.len()];
        Polygon::new(GeometryLayout::XY, flat, ends)
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

    pub fn set_coordinates(&mut self, flat_coordinates: Vec<f64>, ends: Vec<usize>) {
        assert!(ends.last().copied().unwrap_or(0) == flat_coordinates.len(), "Ring ends must terminate at the buffer length");

        self.ends = ends;
        self.base.set_flat_coordinates(flat_coordinates);
    }

    pub fn extent(&self) -> Extent {
        self.base.extent()
    }

    ///
    /// Signed area: exterior minus holes once oriented
    ///
    pub fn area(&self) -> f64 {
        let oriented = self.oriented_flat_coordinates();
        flat::linear_rings_area(&oriented, 0, &self.ends, self.base.stride())
    }

    ///
    /// The number of rings (exterior plus holes)
    ///
    #[inline]
    pub fn ring_count(&self) -> usize {
        self.ends.len()
    }

    ///
    /// Extracts one ring as a standalone geometry
    ///
    pub fn ring(&self, index: usize) -> Option<LinearRing> {
        if index >= self.ends.len() {
            return None;
        }

        let offset  = if index == 0 { 0 } else { self.ends[index - 1] };
        let end     = self.ends[index];
        let flat    = self.base.flat_coordinates()[offset..end].to_vec();

        Some(LinearRing::new(self.base.layout(), flat))
    }

    ///
    /// A copy of the coordinates with the rings correctly wound, cached by revision
    ///
    /// When the stored coordinates are already oriented the copy is taken verbatim, so
    /// repeated calls after a single orientation fix are cheap.
    ///
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

        if !flat::linear_rings_are_oriented(&coordinates, 0, &self.ends, stride, true) {
            flat::orient_linear_rings(&mut coordinates, 0, &self.ends, stride, true);
        }

        *self.oriented.borrow_mut() = Some((revision, coordinates.clone()));
        coordinates
    }

    ///
    /// A point interior to the polygon, for label anchoring
    ///
    pub fn interior_point(&self) -> (f64, f64) {
        let oriented    = self.oriented_flat_coordinates();
        let stride      = self.base.stride();
        let center      = flat::linear_rings_center(&oriented, 0, &self.ends, stride);

        flat::interior_point_of_rings(&oriented, 0, &self.ends, stride, center.1, center)
    }

    pub fn contains_xy(&self, x: f64, y: f64) -> bool {
        let oriented = self.oriented_flat_coordinates();
        flat::linear_rings_contains_xy(&oriented, 0, &self.ends, self.base.stride(), x, y)
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

        flat::assign_closest_array_point(flat, 0, &self.ends, stride, self.max_delta(), true, x, y, closest, min_squared_distance)
    }

    pub fn intersects_extent(&self, extent: &Extent) -> bool {
        let oriented = self.oriented_flat_coordinates();
        flat::intersects_linear_rings(&oriented, 0, &self.ends, self.base.stride(), extent)
    }

    ///
    /// Returns a simplified copy using grid quantization, which preserves ring topology
    /// better than Douglas-Peucker under heavy simplification
    ///
    pub fn simplified(&self, squared_tolerance: f64) -> Polygon {
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
        let tolerance       = squared_tolerance.sqrt();
        let mut simplified  = Vec::with_capacity(flat.len());
        let simplified_ends = flat::quantize_ends(flat, 0, &self.ends, self.base.stride(), tolerance, &mut simplified);

        if simplified.len() == flat.len() && self.base.stride() == 2 && simplified == *flat {
            cache.mark_unchanged(squared_tolerance);
            return self.clone();
        }

        let simplified = Polygon::new(GeometryLayout::XY, simplified, simplified_ends);
        cache.entries.insert(key, simplified.clone());

        simplified
    }
}
