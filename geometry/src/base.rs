use crate::extent::*;
use crate::layout::*;

use std::cell::Cell;
use std::collections::HashMap;

///
/// State shared by every geometry variant: one owned flat coordinate buffer, its layout,
/// and the revision counter that invalidates every cache derived from the buffer
///
/// The revision starts at 1 and is bumped by every mutation, so a cache captured at
/// revision 0 is always stale.
///
#[derive(Clone, Debug)]
pub struct GeometryBase {
    pub(crate) layout:              GeometryLayout,
    pub(crate) stride:              usize,
    pub(crate) flat_coordinates:    Vec<f64>,
    pub(crate) revision:            Cell<u64>,
    pub(crate) extent_cache:        Cell<Option<(u64, Extent)>>,
}

impl GeometryBase {
    ///
    /// Creates a base holding the supplied buffer
    ///
    /// The buffer length must be a multiple of the layout's stride: anything else is a
    /// caller bug, not a data problem.
    ///
    pub fn new(layout: GeometryLayout, flat_coordinates: Vec<f64>) -> GeometryBase {
        let stride = layout.stride();
        assert!(flat_coordinates.len() % stride == 0, "Flat coordinate buffer length {} is not a multiple of the stride {}", flat_coordinates.len(), stride);

        GeometryBase {
            layout,
            stride,
            flat_coordinates,
            revision:       Cell::new(1),
            extent_cache:   Cell::new(None),
        }
    }

    #[inline]
    pub fn layout(&self) -> GeometryLayout {
        self.layout
    }

    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    #[inline]
    pub fn flat_coordinates(&self) -> &[f64] {
        &self.flat_coordinates
    }

    ///
    /// The current revision: bumped by every mutation
    ///
    #[inline]
    pub fn revision(&self) -> u64 {
        self.revision.get()
    }

    ///
    /// Marks the buffer as changed, invalidating every derived cache
    ///
    #[inline]
    pub fn changed(&self) {
        self.revision.set(self.revision.get() + 1);
    }

    ///
    /// Replaces the coordinate buffer, keeping the layout, and bumps the revision
    ///
    pub fn set_flat_coordinates(&mut self, flat_coordinates: Vec<f64>) {
        assert!(flat_coordinates.len() % self.stride == 0, "Flat coordinate buffer length {} is not a multiple of the stride {}", flat_coordinates.len(), self.stride);

        self.flat_coordinates = flat_coordinates;
        self.changed();
    }

    ///
    /// Mutable access to the coordinate buffer for in-place transforms; bumps the
    /// revision immediately
    ///
    pub fn flat_coordinates_mut(&mut self) -> &mut Vec<f64> {
        self.changed();
        &mut self.flat_coordinates
    }

    ///
    /// The extent of the buffer, cached against the revision
    ///
    pub fn extent(&self) -> Extent {
        let revision = self.revision.get();

        if let Some((cached_revision, extent)) = self.extent_cache.get() {
            if cached_revision == revision {
                return extent;
            }
        }

        let extent = Extent::from_flat_coordinates(&self.flat_coordinates, 0, self.flat_coordinates.len(), self.stride);
        self.extent_cache.set(Some((revision, extent)));

        extent
    }
}

///
/// Cache of simplified copies of a geometry, keyed by squared tolerance
///
/// Once a simplification returns coordinates identical to the source, the geometry is
/// presumed fully simplified for every tolerance up to that one: later calls short
/// circuit without recomputing. The whole cache is discarded whenever the source
/// revision moves on.
///
#[derive(Clone, Debug)]
pub struct SimplifiedCache<Geometry> {
    pub(crate) revision:        u64,
    pub(crate) max_unchanged:   f64,
    pub(crate) entries:         HashMap<u64, Geometry>,
}

impl<Geometry> SimplifiedCache<Geometry> {
    pub fn new() -> SimplifiedCache<Geometry> {
        SimplifiedCache {
            revision:       0,
            max_unchanged:  0.0,
            entries:        HashMap::new(),
        }
    }

    ///
    /// Discards stale entries if the source revision has moved on
    ///
    pub fn refresh(&mut self, revision: u64) {
        if self.revision != revision {
            self.revision       = revision;
            self.max_unchanged  = 0.0;
            self.entries.clear();
        }
    }

    ///
    /// True if a tolerance this small is already known to leave the geometry unchanged
    ///
    #[inline]
    pub fn is_unchanged(&self, squared_tolerance: f64) -> bool {
        squared_tolerance <= self.max_unchanged && self.max_unchanged > 0.0
    }

    ///
    /// Records that this tolerance left the geometry unchanged
    ///
    #[inline]
    pub fn mark_unchanged(&mut self, squared_tolerance: f64) {
        if squared_tolerance > self.max_unchanged {
            self.max_unchanged = squared_tolerance;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extent_is_cached_until_changed() {
        let mut base = GeometryBase::new(GeometryLayout::XY, vec![0.0, 0.0, 2.0, 3.0]);

        assert!(base.extent() == Extent::new(0.0, 0.0, 2.0, 3.0));

        // Mutate through the tracked accessor: the cache must follow
        base.flat_coordinates_mut()[2] = 10.0;
        assert!(base.extent() == Extent::new(0.0, 0.0, 10.0, 3.0));
    }

    #[test]
    fn revision_bumps_on_mutation() {
        let mut base    = GeometryBase::new(GeometryLayout::XY, vec![0.0, 0.0]);
        let before      = base.revision();

        base.set_flat_coordinates(vec![1.0, 1.0]);

        assert!(base.revision() > before);
    }

    #[test]
    #[should_panic]
    fn misaligned_buffer_is_a_caller_bug() {
        GeometryBase::new(GeometryLayout::XY, vec![0.0, 0.0, 1.0]);
    }

    #[test]
    fn simplified_cache_resets_on_new_revision() {
        let mut cache: SimplifiedCache<()> = SimplifiedCache::new();

        cache.refresh(1);
        cache.mark_unchanged(4.0);
        assert!(cache.is_unchanged(2.0));

        cache.refresh(2);
        assert!(!cache.is_unchanged(2.0));
    }
}
