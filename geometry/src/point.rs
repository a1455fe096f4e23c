use crate::base::*;
use crate::extent::*;
use crate::layout::*;

///
/// A single coordinate
///
#[derive(Clone, Debug)]
pub struct Point {
    base: GeometryBase,
}

impl Point {
    ///
    /// Creates an XY point
    ///
    pub fn new(x: f64, y: f64) -> Point {
        Point {
            base: GeometryBase::new(GeometryLayout::XY, vec![x, y]),
        }
    }

    ///
    /// Creates a point with an explicit layout
    ///
    pub fn with_layout(layout: GeometryLayout, coordinates: Vec<f64>) -> Point {
        Point {
            base: GeometryBase::new(layout, coordinates),
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
    pub fn x(&self) -> f64 {
        self.base.flat_coordinates().get(0).copied().unwrap_or(f64::NAN)
    }

    #[inline]
    pub fn y(&self) -> f64 {
        self.base.flat_coordinates().get(1).copied().unwrap_or(f64::NAN)
    }

    pub fn set_coordinates(&mut self, coordinates: Vec<f64>) {
        self.base.set_flat_coordinates(coordinates);
    }

    pub fn extent(&self) -> Extent {
        self.base.extent()
    }

    pub fn closest_point_xy(&self, x: f64, y: f64, closest: &mut Vec<f64>, min_squared_distance: f64) -> f64 {
        let flat = self.base.flat_coordinates();
        if flat.is_empty() {
            return min_squared_distance;
        }

        let dx = x - flat[0];
        let dy = y - flat[1];
        let squared_distance = dx * dx + dy * dy;

        if squared_distance < min_squared_distance {
            closest.clear();
            closest.extend_from_slice(&flat[..self.base.stride()]);
            squared_distance
        } else {
            min_squared_distance
        }
    }

    pub fn intersects_extent(&self, extent: &Extent) -> bool {
        let flat = self.base.flat_coordinates();
        !flat.is_empty() && extent.contains_xy(flat[0], flat[1])
    }
}
