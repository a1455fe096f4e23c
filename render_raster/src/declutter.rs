use crate::context::*;

use carta_geometry::*;
use carta_replay::*;

///
/// One image stamp deferred for collision-aware placement
///
#[derive(Clone, Debug)]
pub struct DeclutterItem {
    pub raster:     ImageRaster,
    pub placement:  ImagePlacement,
}

///
/// The stamps one feature deferred together
///
/// A feature's marker and its label declutter as a unit: either the whole group draws
/// or none of it does, so a label never appears without the marker it annotates.
///
#[derive(Clone, Debug)]
pub struct DeclutterGroup {
    pub items: Vec<DeclutterItem>,
}

impl DeclutterGroup {
    pub fn new() -> DeclutterGroup {
        DeclutterGroup { items: vec![] }
    }

    pub fn push(&mut self, raster: ImageRaster, placement: ImagePlacement) {
        self.items.push(DeclutterItem { raster, placement });
    }

    ///
    /// The combined device-pixel extent of every stamp in this group
    ///
    pub fn extent(&self) -> Extent {
        let mut extent = Extent::empty();
        for item in self.items.iter() {
            extent.extend(&item.placement.extent());
        }
        extent
    }
}

///
/// The frame-wide index of space already claimed by decluttered drawing
///
/// Collision boxes accumulate over a whole frame across every replay group, so labels
/// from different z-indices and layers avoid each other the same way labels within one
/// replay do.
///
pub struct DeclutterTree {
    claimed: Vec<Extent>,
}

impl DeclutterTree {
    pub fn new() -> DeclutterTree {
        DeclutterTree { claimed: vec![] }
    }

    ///
    /// True if the extent overlaps space already claimed this frame
    ///
    pub fn collides(&self, extent: &Extent) -> bool {
        !extent.is_empty() && self.claimed.iter().any(|claimed| claimed.intersects(extent))
    }

    pub fn claim(&mut self, extent: Extent) {
        self.claimed.push(extent);
    }
}

///
/// Draws every deferred group that fits, first come first served
///
/// Groups were deferred in draw order, so the first feature drawn at a spot keeps it
/// and later overlapping features are dropped for the frame.
///
pub fn flush_declutter_groups(context: &mut dyn RasterContext, groups: &[DeclutterGroup], tree: &mut DeclutterTree) {
    for group in groups.iter() {
        if group.items.is_empty() {
            continue;
        }

        let extent = group.extent();
        if tree.collides(&extent) {
            continue;
        }

        tree.claim(extent);
        for item in group.items.iter() {
            context.draw_image(&item.raster, &item.placement);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlapping_groups_keep_the_first() {
        let mut tree    = DeclutterTree::new();
        let extent      = Extent::new(0.0, 0.0, 10.0, 10.0);

        assert!(!tree.collides(&extent));
        tree.claim(extent);

        assert!(tree.collides(&Extent::new(5.0, 5.0, 15.0, 15.0)));
        assert!(!tree.collides(&Extent::new(20.0, 20.0, 30.0, 30.0)));
    }
}
