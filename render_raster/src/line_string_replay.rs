use crate::replay::*;

use carta_geometry::*;
use carta_replay::*;

///
/// Records stroked line geometry into a raster replay
///
/// Line runs are clipped against the buffered max extent while recording: a path that
/// wanders far off screen is replaced by its boundary crossings, bounding the tape
/// without visibly moving the stroke.
///
pub struct LineStringReplay {
    replay: RasterReplay,
}

impl LineStringReplay {
    pub fn new(tolerance: f64, max_extent: Extent, resolution: f64, pixel_ratio: f64, overlaps: bool) -> LineStringReplay {
        LineStringReplay {
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
    /// Records one clipped line run as a stroked path on both tapes
    ///
    fn draw_flat_line(&mut self, flat_coordinates: &[f64], offset: usize, end: usize, stride: usize) {
        let (begin, run_end) = self.replay.append_coordinates(flat_coordinates, offset, end, stride, false, true);
        if run_end <= begin {
            return;
        }

        for instructions in [&mut self.replay.instructions, &mut self.replay.hit_instructions] {
            instructions.push(Instruction::BeginPath);
            instructions.push(Instruction::MoveToLineTo { begin, end: run_end });
            instructions.push(Instruction::Stroke);
        }
    }
}

impl GeometryRenderer for LineStringReplay {
    fn set_fill_stroke_style(&mut self, _fill: Option<FillStyle>, stroke: Option<StrokeStyle>) {
        self.replay.update_fill_stroke_state(None, stroke);
    }

    fn draw_line_string(&mut self, line: &LineString, feature: FeatureId) {
        let hit_stroke = match &self.replay.stroke_style {
            Some(stroke)    => stroke.opaque(),
            None            => return,
        };

        let simplified  = line.simplified(self.replay.squared_tolerance());
        let flat        = simplified.base().flat_coordinates();
        if flat.is_empty() {
            return;
        }

        self.replay.apply_pending_styles();
        self.replay.begin_geometry(feature);
        self.replay.hit_instructions.push(Instruction::SetStrokeStyle(hit_stroke));

        let stride  = simplified.base().stride();
        let end     = flat.len();
        let flat    = flat.to_vec();
        self.draw_flat_line(&flat, 0, end, stride);

        self.replay.end_geometry(feature);
    }

    fn draw_multi_line_string(&mut self, lines: &MultiLineString, feature: FeatureId) {
        let hit_stroke = match &self.replay.stroke_style {
            Some(stroke)    => stroke.opaque(),
            None            => return,
        };

        let simplified  = lines.simplified(self.replay.squared_tolerance());
        let flat        = simplified.base().flat_coordinates().to_vec();
        if flat.is_empty() {
            return;
        }

        self.replay.apply_pending_styles();
        self.replay.begin_geometry(feature);
        self.replay.hit_instructions.push(Instruction::SetStrokeStyle(hit_stroke));

        let stride      = simplified.base().stride();
        let mut offset  = 0;
        for end in simplified.ends() {
            self.draw_flat_line(&flat, offset, *end, stride);
            offset = *end;
        }

        self.replay.end_geometry(feature);
    }
}
