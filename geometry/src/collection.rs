use crate::extent::*;
use crate::geometry::*;

use std::cell::Cell;

///
/// A heterogeneous collection of child geometries
///
/// The collection owns its children outright. Rather than children holding a back
/// reference to notify the parent of changes, the collection derives a combined revision
/// from its own counter plus the children's counters: any mutation of a child through
/// the accessors below moves the combined revision and invalidates the cached extent.
///
#[derive(Clone, Debug)]
pub struct GeometryCollection {
    geometries:     Vec<Geometry>,
    revision:       Cell<u64>,
    extent_cache:   Cell<Option<(u64, Extent)>>,
}

impl GeometryCollection {
    pub fn new(geometries: Vec<Geometry>) -> GeometryCollection {
        GeometryCollection {
            geometries,
            revision:       Cell::new(1),
            extent_cache:   Cell::new(None),
        }
    }

    #[inline]
    pub fn geometries(&self) -> &[Geometry] {
        &self.geometries
    }

    ///
    /// Mutable access to the children; the combined revision tracks any change made
    /// through the returned slice
    ///
    pub fn geometries_mut(&mut self) -> &mut [Geometry] {
        &mut self.geometries
    }

    ///
    /// Replaces the children and bumps the revision
    ///
    pub fn set_geometries(&mut self, geometries: Vec<Geometry>) {
        self.geometries = geometries;
        self.changed();
    }

    ///
    /// Adds a child geometry
    ///
    pub fn push(&mut self, geometry: Geometry) {
        self.geometries.push(geometry);
        self.changed();
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.geometries.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.geometries.len()
    }

    #[inline]
    pub fn changed(&self) {
        self.revision.set(self.revision.get() + 1);
    }

    ///
    /// The combined revision: moves whenever this collection or any child changes
    ///
    pub fn revision(&self) -> u64 {
        let mut revision = self.revision.get();
        for geometry in &self.geometries {
            revision = revision.wrapping_add(geometry.revision());
        }
        revision
    }

    ///
    /// The union of the children's extents, cached against the combined revision
    ///
    pub fn extent(&self) -> Extent {
        let revision = self.revision();

        if let Some((cached_revision, extent)) = self.extent_cache.get() {
            if cached_revision == revision {
                return extent;
            }
        }

        let mut extent = Extent::empty();
        for geometry in &self.geometries {
            extent.extend(&geometry.extent());
        }
        self.extent_cache.set(Some((revision, extent)));

        extent
    }

    pub fn closest_point_xy(&self, x: f64, y: f64, closest: &mut Vec<f64>, min_squared_distance: f64) -> f64 {
        if self.extent().squared_distance_to_xy(x, y) >= min_squared_distance {
            return min_squared_distance;
        }

        let mut min_squared_distance = min_squared_distance;
        for geometry in &self.geometries {
            min_squared_distance = geometry.closest_point_xy(x, y, closest, min_squared_distance);
        }

        min_squared_distance
    }

    pub fn intersects_extent(&self, extent: &Extent) -> bool {
        self.geometries.iter().any(|geometry| geometry.intersects_extent(extent))
    }

    ///
    /// Returns a collection with every simplifiable child simplified
    ///
    pub fn simplified(&self, squared_tolerance: f64) -> GeometryCollection {
        let simplified = self.geometries.iter()
            .map(|geometry| geometry.simplified(squared_tolerance))
            .collect();

        GeometryCollection::new(simplified)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point::*;
    use crate::polygon::*;

    #[test]
    fn extent_is_union_of_children() {
        let collection = GeometryCollection::new(vec![
            Geometry::Point(Point::new(10.0, 10.0)),
            Geometry::Polygon(Polygon::from_rings(&[vec![[0.0, 0.0], [4.0, 0.0], [4.0, 4.0], [0.0, 4.0]]])),
        ]);

        assert!(collection.extent() == Extent::new(0.0, 0.0, 10.0, 10.0));
    }

    #[test]
    fn translating_moves_children_and_revision() {
        let mut collection = GeometryCollection::new(vec![
            Geometry::Point(Point::new(0.0, 0.0)),
            Geometry::Point(Point::new(1.0, 1.0)),
        ]);

        let revision_before         = collection.revision();
        let child_revision_before   = collection.geometries()[0].revision();

        for geometry in collection.geometries_mut() {
            geometry.translate(5.0, 5.0);
        }

        assert!(collection.revision() != revision_before);
        assert!(collection.geometries()[0].revision() > child_revision_before);
        assert!(collection.extent() == Extent::new(5.0, 5.0, 6.0, 6.0));
    }
}
