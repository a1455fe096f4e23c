use crate::replay::*;

use carta_geometry::*;
use carta_replay::*;

///
/// Records filled/stroked polygonal geometry into a raster replay
///
/// Handles polygons, multi-polygons and circles. Rings are recorded in oriented order
/// (exterior counter-clockwise, holes clockwise) so non-zero filling leaves holes open.
/// The hit-detection tape always records a fully opaque fill, whatever the real style
/// says: translucent or stroke-only polygons must stay pickable across their interior.
///
pub struct PolygonReplay {
    replay: RasterReplay,
}

impl PolygonReplay {
    pub fn new(tolerance: f64, max_extent: Extent, resolution: f64, pixel_ratio: f64, overlaps: bool) -> PolygonReplay {
        PolygonReplay {
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
    /// Records the hit-tape styles for the current feature: an opaque fill always, the
    /// (opaque) stroke only when one is set
    ///
    fn record_hit_styles(&mut self) {
        let hit_fill = match &self.replay.fill_style {
            Some(fill)  => fill.opaque(),
            None        => FillStyle::Color(Rgba([0, 0, 0, 255])),
        };
        self.replay.hit_instructions.push(Instruction::SetFillStyle(hit_fill));

        if let Some(stroke) = &self.replay.stroke_style {
            self.replay.hit_instructions.push(Instruction::SetStrokeStyle(stroke.opaque()));
        }
    }

    ///
    /// Records one ring set (exterior plus holes) as a path on both tapes
    ///
    fn draw_rings(&mut self, flat_coordinates: &[f64], offset: usize, ends: &[usize], stride: usize) {
        let has_fill    = self.replay.fill_style.is_some();
        let has_stroke  = self.replay.stroke_style.is_some();

        self.replay.instructions.push(Instruction::BeginPath);
        self.replay.hit_instructions.push(Instruction::BeginPath);

        let mut ring_offset = offset;
        for end in ends {
            let (begin, run_end) = self.replay.append_coordinates(flat_coordinates, ring_offset, *end, stride, true, false);

            self.replay.instructions.push(Instruction::MoveToLineTo { begin, end: run_end });
            self.replay.instructions.push(Instruction::ClosePath);
            self.replay.hit_instructions.push(Instruction::MoveToLineTo { begin, end: run_end });
            self.replay.hit_instructions.push(Instruction::ClosePath);

            ring_offset = *end;
        }

        if has_fill {
            self.replay.instructions.push(Instruction::Fill(FillRule::NonZero));
        }
        if has_stroke {
            self.replay.instructions.push(Instruction::Stroke);
        }

        self.replay.hit_instructions.push(Instruction::Fill(FillRule::NonZero));
        if has_stroke {
            self.replay.hit_instructions.push(Instruction::Stroke);
        }
    }
}

impl GeometryRenderer for PolygonReplay {
    fn set_fill_stroke_style(&mut self, fill: Option<FillStyle>, stroke: Option<StrokeStyle>) {
        self.replay.update_fill_stroke_state(fill, stroke);
    }

    fn draw_polygon(&mut self, polygon: &Polygon, feature: FeatureId) {
        if self.replay.fill_style.is_none() && self.replay.stroke_style.is_none() {
            return;
        }

        let simplified  = polygon.simplified(self.replay.squared_tolerance());
        let oriented    = simplified.oriented_flat_coordinates();
        if oriented.is_empty() {
            return;
        }

        self.replay.apply_pending_styles();
        self.replay.begin_geometry(feature);
        self.record_hit_styles();

        let stride = simplified.base().stride();
        self.draw_rings(&oriented, 0, simplified.ends(), stride);

        self.replay.end_geometry(feature);
    }

    fn draw_multi_polygon(&mut self, polygons: &MultiPolygon, feature: FeatureId) {
        if self.replay.fill_style.is_none() && self.replay.stroke_style.is_none() {
            return;
        }

        let simplified  = polygons.simplified(self.replay.squared_tolerance());
        let oriented    = simplified.oriented_flat_coordinates();
        if oriented.is_empty() {
            return;
        }

        self.replay.apply_pending_styles();
        self.replay.begin_geometry(feature);
        self.record_hit_styles();

        let stride      = simplified.base().stride();
        let mut offset  = 0;
        for ends in simplified.endss() {
            self.draw_rings(&oriented, offset, ends, stride);
            offset = ends.last().copied().unwrap_or(offset);
        }

        self.replay.end_geometry(feature);
    }

    fn draw_circle(&mut self, circle: &Circle, feature: FeatureId) {
        if self.replay.fill_style.is_none() && self.replay.stroke_style.is_none() {
            return;
        }

        self.replay.apply_pending_styles();
        self.replay.begin_geometry(feature);
        self.record_hit_styles();

        // The centre and a point at centre + radius: projecting both keeps the radius
        // correct under any uniform transform
        let (center_x, center_y)    = circle.center();
        let radius                  = circle.radius();
        let run                     = [center_x, center_y, center_x + radius, center_y];
        let (begin, _)              = self.replay.append_coordinates(&run, 0, run.len(), 2, false, false);

        let has_fill    = self.replay.fill_style.is_some();
        let has_stroke  = self.replay.stroke_style.is_some();

        for instructions in [&mut self.replay.instructions, &mut self.replay.hit_instructions] {
            instructions.push(Instruction::BeginPath);
            instructions.push(Instruction::Circle { begin });
        }

        if has_fill {
            self.replay.instructions.push(Instruction::Fill(FillRule::NonZero));
        }
        if has_stroke {
            self.replay.instructions.push(Instruction::Stroke);
        }

        self.replay.hit_instructions.push(Instruction::Fill(FillRule::NonZero));
        if has_stroke {
            self.replay.hit_instructions.push(Instruction::Stroke);
        }

        self.replay.end_geometry(feature);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn styleless_polygons_record_nothing() {
        let mut replay  = PolygonReplay::new(0.0, Extent::empty(), 1.0, 1.0, false);
        let polygon     = Polygon::from_rings(&[vec![[0.0, 0.0], [4.0, 0.0], [4.0, 4.0], [0.0, 4.0]]]);

        replay.draw_polygon(&polygon, FeatureId(1));

        assert!(replay.replay().is_empty());
    }

    #[test]
    fn hit_tape_forces_an_opaque_fill_for_stroke_only_styles() {
        let mut replay = PolygonReplay::new(0.0, Extent::empty(), 1.0, 1.0, false);
        replay.set_fill_stroke_style(None, Some(StrokeStyle::new(Rgba([0, 0, 255, 128]), 2.0)));

        let polygon = Polygon::from_rings(&[vec![[0.0, 0.0], [4.0, 0.0], [4.0, 4.0], [0.0, 4.0]]]);
        replay.draw_polygon(&polygon, FeatureId(1));

        let hit_fills = replay.replay().hit_instructions.iter()
            .filter_map(|instruction| match instruction {
                Instruction::SetFillStyle(FillStyle::Color(color))  => Some(*color),
                _                                                   => None,
            })
            .collect::<Vec<_>>();

        assert!(hit_fills == vec![Rgba([0, 0, 0, 255])], "Unexpected hit fills: {:?}", hit_fills);
        // The visible tape records no fill at all
        assert!(!replay.replay().instructions.iter().any(|instruction| matches!(instruction, Instruction::Fill(_))));
    }

    #[test]
    fn rings_record_one_subpath_each() {
        let mut replay = PolygonReplay::new(0.0, Extent::empty(), 1.0, 1.0, false);
        replay.set_fill_stroke_style(Some(FillStyle::Color(Rgba([0, 128, 0, 255]))), None);

        let polygon = Polygon::from_rings(&[
            vec![[0.0, 0.0], [4.0, 0.0], [4.0, 4.0], [0.0, 4.0]],
            vec![[1.0, 1.0], [3.0, 1.0], [3.0, 3.0], [1.0, 3.0]],
        ]);
        replay.draw_polygon(&polygon, FeatureId(1));

        let subpaths = replay.replay().instructions.iter()
            .filter(|instruction| matches!(instruction, Instruction::MoveToLineTo { .. }))
            .count();

        assert!(subpaths == 2, "Unexpected subpath count: {}", subpaths);
    }
}
