use crate::base::*;
use crate::extent::*;
use crate::layout::*;
use crate::point::*;

///
/// A set of points in one flat buffer
///
#[derive(Clone, Debug)]
pub struct MultiPoint {
    base: GeometryBase,
}

impl MultiPoint {
    pub fn new(layout: GeometryLayout, flat_coordinates: Vec<f64>) -> MultiPoint {
        MultiPoint {
            base: GeometryBase::new(layout, flat_coordinates),
        }
    }

    pub fn from_coordinates(coordinates: &[[f64; 2]]) -> MultiPoint {
        let flat = coordinates.iter().flat_map(|point| point.iter().copied()).collect();
        MultiPoint::new(GeometryLayout::XY, flat)
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
    pub fn point_count(&self) -> usize {
        self.base.flat_coordinates().len() / self.base.stride()
    }

    ///
    /// Extracts one member point
    ///
    pub fn point(&self, index: usize) -> Option<Point> {
        let stride  = self.base.stride();
        let offset  = index * stride;
        let flat    = self.base.flat_coordinates();

        if offset + stride > flat.len() {
            return None;
        }

        Some(Point::with_layout(self.base.layout(), flat[offset..offset + stride].to_vec()))
    }

    pub fn set_coordinates(&mut self, flat_coordinates: Vec<f64>) {
        self.base.set_flat_coordinates(flat_coordinates);
    }

    pub fn extent(&self) -> Extent {
        self.base.extent()
    }

    pub fn closest_point_xy(&self, x: f64, y: f64, closest: &mut Vec<f64>, min_squared_distance: f64) -> f64 {
        if self.extent().squared_distance_to_xy(x, y) >= min_squared_distance {
            return min_squared_distance;
        }

        let stride  = self.base.stride();
        let flat    = self.base.flat_coordinates();

        let mut min_squared_distance = min_squared_distance;
        let mut idx = 0;
        while idx < flat.len() {
            let dx = x - flat[idx];
            let dy = y - flat[idx + 1];
            let squared_distance = dx * dx + dy * dy;

            if squared_distance < min_squared_distance {
                min_squared_distance = squared_distance;
                closest.clear();
                closest.extend_from_slice(&flat[idx..idx + stride]);
            }
            idx += stride;
        }

        min_squared_distance
    }

    pub fn intersects_extent(&self, extent: &Extent) -> bool {
        let stride  = self.base.stride();
        let flat    = self.base.flat_coordinates();

        let mut idx = 0;
        while idx < flat.len() {
            if extent.contains_xy(flat[idx], flat[idx + 1]) {
                return true;
            }
            idx += stride;
        }

        false
    }
}
