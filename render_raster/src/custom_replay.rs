use crate::context::*;
use crate::replay::*;

use carta_geometry::*;
use carta_replay::*;

use std::rc::Rc;

///
/// Records application-supplied drawing into a raster replay
///
/// This backs the `Default` drawing type: a feature whose style carries a render
/// function rather than resolved primitives. The callback itself cannot travel on the
/// serialisable tape, so the instruction stores an index into this replay's side table
/// and the callback receives the projected device-pixel coordinates at execution time.
///
pub struct CustomReplay {
    replay: RasterReplay,
}

impl CustomReplay {
    pub fn new(tolerance: f64, max_extent: Extent, resolution: f64, pixel_ratio: f64, overlaps: bool) -> CustomReplay {
        CustomReplay {
            replay: RasterReplay::new(tolerance, max_extent, resolution, pixel_ratio, overlaps),
        }
    }

    #[inline]
    pub fn replay(&self) -> &RasterReplay {
        &self.replay
    }

    #[inline]
    pub fn replay_mut(&mut self) -> &mut RasterReplay {
        &mut self.replay
    }

    ///
    /// Records a custom drawing over the geometry's coordinates
    ///
    pub fn draw_custom(&mut self, geometry: &Geometry, feature: FeatureId, renderer: Rc<CustomRenderer>) {
        let simplified  = geometry.simplified(self.replay.squared_tolerance());
        let flat        = simplified.flat_coordinates().to_vec();
        let stride      = simplified.stride();
        if flat.is_empty() {
            return;
        }

        let renderer_index = self.replay.register_custom_renderer(renderer);

        self.replay.begin_geometry(feature);

        let (begin, end) = self.replay.append_coordinates(&flat, 0, flat.len(), stride, false, false);
        self.replay.instructions.push(Instruction::Custom { begin, end, feature, renderer: renderer_index });
        self.replay.hit_instructions.push(Instruction::Custom { begin, end, feature, renderer: renderer_index });

        self.replay.end_geometry(feature);
    }
}

impl GeometryRenderer for CustomReplay {
    // Only draw_custom records anything; every standard drawing method is a wiring bug
    // for this drawing type and keeps its panicking default.
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::cell::Cell;
    use std::rc::Rc;

    struct NullContext;

    impl RasterContext for NullContext {
        fn begin_path(&mut self) { }
        fn move_to(&mut self, _x: f64, _y: f64) { }
        fn line_to(&mut self, _x: f64, _y: f64) { }
        fn close_path(&mut self) { }
        fn circle(&mut self, _center_x: f64, _center_y: f64, _radius: f64) { }
        fn set_fill_style(&mut self, _fill: &FillStyle) { }
        fn set_stroke_style(&mut self, _stroke: &StrokeStyle) { }
        fn set_global_alpha(&mut self, _alpha: f32) { }
        fn fill(&mut self, _rule: FillRule) { }
        fn stroke(&mut self) { }
        fn draw_image(&mut self, _raster: &ImageRaster, _placement: &ImagePlacement) { }
        fn save(&mut self) { }
        fn restore(&mut self) { }
        fn alpha_at(&self, _x: usize, _y: usize) -> u8 { 0 }
        fn clear(&mut self) { }
    }

    #[test]
    fn custom_renderers_receive_projected_coordinates() {
        let mut replay  = CustomReplay::new(0.0, Extent::empty(), 1.0, 1.0, false);
        let seen        = Rc::new(Cell::new((0.0, 0.0)));

        let seen_in     = Rc::clone(&seen);
        let geometry    = Geometry::Point(Point::new(3.0, 4.0));
        replay.draw_custom(&geometry, FeatureId(1), Rc::new(move |_context: &mut dyn RasterContext, coordinates: &[f64]| {
            seen_in.set((coordinates[0], coordinates[1]));
        }));
        replay.replay_mut().finish();

        let transform = Transform::compose(100.0, 100.0, 2.0, 2.0, 0.0);
        replay.replay().replay(&mut NullContext, &transform, 0.0, &FeatureSkipSet::new(), None);

        assert!(seen.get() == (106.0, 108.0), "Unexpected projected point: {:?}", seen.get());
    }
}
