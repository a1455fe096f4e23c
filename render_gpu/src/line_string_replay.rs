use crate::buffer::*;
use crate::command::*;
use crate::vertex::*;

use carta_geometry::*;
use carta_replay::*;

use smallvec::SmallVec;

use std::sync::Arc;

///
/// Tessellates stroked lines into GPU quads
///
/// Every segment becomes two triangles whose vertices sit on the line's spine and carry
/// an offset direction; the vertex stage multiplies that direction by half the current
/// line width, so one tessellation draws at any width. Joins depend on the turn
/// direction (signed-area test): bevel and round joins add one triangle on the outer
/// side, miter joins add one extra tip vertex and a second triangle. Caps extend the
/// ends for the square and round cap styles.
///
pub struct LineStringReplay {
    origin:     (f64, f64),
    tolerance:  f64,

    buffers:    ReplayBuffers,
    styles:     StyleGroups<Uniforms>,
    stroke:     Option<StrokeStyle>,

    frozen:     Option<(Arc<Vec<f32>>, Arc<Vec<u32>>)>,
}

impl LineStringReplay {
    pub fn new(origin: (f64, f64), tolerance: f64) -> LineStringReplay {
        LineStringReplay {
            origin,
            tolerance,
            buffers:    ReplayBuffers::new(),
            styles:     StyleGroups::new(),
            stroke:     None,
            frozen:     None,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buffers.indices.is_empty()
    }

    pub(crate) fn set_stroke(&mut self, stroke: Option<StrokeStyle>) {
        self.stroke = stroke;
    }

    fn push_vertex(&mut self, x: f64, y: f64, offset_x: f64, offset_y: f64, instruction: f32) -> u32 {
        let vertex = self.buffers.vertex_count(VertexLayout::Line.floats_per_vertex()) as u32;
        LineVertex::new(
            (x - self.origin.0) as f32,
            (y - self.origin.1) as f32,
            offset_x as f32,
            offset_y as f32,
            instruction,
        ).push_to(&mut self.buffers.vertices);
        vertex
    }

    ///
    /// Tessellates one polyline under the current stroke, bracketed as `feature`
    ///
    pub(crate) fn draw_flat_line(&mut self, flat_coordinates: &[f64], offset: usize, end: usize, stride: usize, closed: bool, feature: FeatureId) {
        let stroke = match &self.stroke {
            Some(stroke)    => stroke.clone(),
            None            => return,
        };

        // Deduplicate consecutive points; drop an explicit closing point on rings
        let mut points: SmallVec<[(f64, f64); 16]> = SmallVec::new();
        let mut idx = offset;
        while idx < end {
            let point = (flat_coordinates[idx], flat_coordinates[idx + 1]);
            if points.last() != Some(&point) {
                points.push(point);
            }
            idx += stride;
        }
        if closed && points.len() > 1 && points.first() == points.last() {
            points.pop();
        }
        if points.len() < 2 {
            return;
        }

        self.buffers.begin_feature(feature);
        self.styles.set_style(
            Uniforms {
                fill_color:     Rgba([0, 0, 0, 0]),
                stroke_color:   stroke.color,
                line_width:     stroke.width as f32,
                miter_limit:    stroke.miter_limit as f32,
                opacity:        1.0,
            },
            self.buffers.indices.len(),
        );

        let count           = points.len();
        let segment_count   = if closed { count } else { count - 1 };

        // One quad per segment
        for segment in 0..segment_count {
            let (x1, y1) = points[segment];
            let (x2, y2) = points[(segment + 1) % count];

            let length = ((x2-x1)*(x2-x1) + (y2-y1)*(y2-y1)).sqrt();
            if length == 0.0 {
                continue;
            }

            let normal_x = -(y2 - y1) / length;
            let normal_y = (x2 - x1) / length;

            let a_up    = self.push_vertex(x1, y1, normal_x, normal_y, INSTRUCTION_SEGMENT);
            let a_down  = self.push_vertex(x1, y1, -normal_x, -normal_y, INSTRUCTION_SEGMENT);
            let b_up    = self.push_vertex(x2, y2, normal_x, normal_y, INSTRUCTION_SEGMENT);
            let b_down  = self.push_vertex(x2, y2, -normal_x, -normal_y, INSTRUCTION_SEGMENT);

            self.buffers.push_triangle(a_up, a_down, b_up);
            self.buffers.push_triangle(a_down, b_down, b_up);
        }

        // Joins at the interior vertices (every vertex on a closed ring)
        let join_range = if closed { 0..count } else { 1..count-1 };
        for join in join_range {
            let previous    = points[(join + count - 1) % count];
            let current     = points[join];
            let next        = points[(join + 1) % count];
            self.add_join(previous, current, next, &stroke);
        }

        if !closed && stroke.line_cap != LineCap::Butt {
            self.add_cap(points[1], points[0], INSTRUCTION_CAP_BEGIN);
            self.add_cap(points[count-2], points[count-1], INSTRUCTION_CAP_END);
        }
    }

    ///
    /// Adds the join geometry at `current`: one triangle on the outer side of the turn,
    /// plus the miter tip vertex and its triangle for miter joins
    ///
    fn add_join(&mut self, previous: (f64, f64), current: (f64, f64), next: (f64, f64), stroke: &StrokeStyle) {
        let in_length   = ((current.0-previous.0).powi(2) + (current.1-previous.1).powi(2)).sqrt();
        let out_length  = ((next.0-current.0).powi(2) + (next.1-current.1).powi(2)).sqrt();
        if in_length == 0.0 || out_length == 0.0 {
            return;
        }

        let in_normal   = (-(current.1-previous.1) / in_length, (current.0-previous.0) / in_length);
        let out_normal  = (-(next.1-current.1) / out_length, (next.0-current.0) / out_length);

        // The turn direction picks the outer side: a counter-clockwise turn leaves the
        // gap on the right (negative normal) side
        let turn = (current.0-previous.0) * (next.1-previous.1) - (next.0-previous.0) * (current.1-previous.1);
        if turn == 0.0 {
            return;
        }
        let side = if turn > 0.0 { -1.0 } else { 1.0 };

        let instruction = match stroke.line_join {
            LineJoin::Bevel => INSTRUCTION_JOIN_BEVEL,
            LineJoin::Round => INSTRUCTION_JOIN_ROUND,
            LineJoin::Miter => INSTRUCTION_JOIN_MITER,
        };

        let center      = self.push_vertex(current.0, current.1, 0.0, 0.0, instruction);
        let from_corner = self.push_vertex(current.0, current.1, side * in_normal.0, side * in_normal.1, instruction);
        let to_corner   = self.push_vertex(current.0, current.1, side * out_normal.0, side * out_normal.1, instruction);
        self.buffers.push_triangle(center, from_corner, to_corner);

        if stroke.line_join == LineJoin::Miter {
            let miter_x = in_normal.0 + out_normal.0;
            let miter_y = in_normal.1 + out_normal.1;
            let length  = (miter_x*miter_x + miter_y*miter_y).sqrt();
            if length == 0.0 {
                return;
            }

            // Scale the unit miter direction out to the miter point, bounded so a near
            // U-turn cannot shoot to infinity
            let scale   = (1.0 / (miter_x / length * in_normal.0 + miter_y / length * in_normal.1)).min(stroke.miter_limit);
            let tip     = self.push_vertex(current.0, current.1, side * miter_x / length * scale, side * miter_y / length * scale, INSTRUCTION_JOIN_MITER);
            self.buffers.push_triangle(from_corner, tip, to_corner);
        }
    }

    ///
    /// Adds a cap quad extending past `tip`, away from `inner`
    ///
    fn add_cap(&mut self, inner: (f64, f64), tip: (f64, f64), instruction: f32) {
        let dx      = tip.0 - inner.0;
        let dy      = tip.1 - inner.1;
        let length  = (dx*dx + dy*dy).sqrt();
        if length == 0.0 {
            return;
        }

        let tangent = (dx / length, dy / length);
        let normal  = (-tangent.1, tangent.0);

        let near_up     = self.push_vertex(tip.0, tip.1, normal.0, normal.1, instruction);
        let near_down   = self.push_vertex(tip.0, tip.1, -normal.0, -normal.1, instruction);
        let far_up      = self.push_vertex(tip.0, tip.1, normal.0 + tangent.0, normal.1 + tangent.1, instruction);
        let far_down    = self.push_vertex(tip.0, tip.1, -normal.0 + tangent.0, -normal.1 + tangent.1, instruction);

        self.buffers.push_triangle(near_up, near_down, far_up);
        self.buffers.push_triangle(near_down, far_down, far_up);
    }

    ///
    /// Freezes the buffers into shareable uploads
    ///
    /// The working copies stay in place: feature ranges and style groups keep indexing
    /// into them for skip splitting and hit detection.
    ///
    pub fn finish(&mut self) {
        if self.frozen.is_none() {
            self.frozen = Some((
                Arc::new(self.buffers.vertices.clone()),
                Arc::new(self.buffers.indices.clone()),
            ));
        }
    }

    fn frozen_buffers(&self) -> (Arc<Vec<f32>>, Arc<Vec<u32>>) {
        let (vertices, indices) = self.frozen.as_ref().expect("Replayed before finish()");
        (Arc::clone(vertices), Arc::clone(indices))
    }

    ///
    /// Compiles the recorded strokes into a draw command stream
    ///
    pub fn replay(&self, transform: &Transform, view_rotation: f64, skipped: &FeatureSkipSet) -> Vec<DrawCommand> {
        let (vertices, indices) = self.frozen_buffers();
        if indices.is_empty() {
            return vec![];
        }

        let mut commands = vec![
            DrawCommand::SetTransform(transform.multiply(&Transform::translation(self.origin.0, self.origin.1))),
            DrawCommand::SetViewRotation(view_rotation),
            DrawCommand::UploadVertices { layout: VertexLayout::Line, vertices },
            DrawCommand::UploadIndices(indices),
        ];

        for (uniforms, range) in self.styles.groups(self.index_count()) {
            commands.push(DrawCommand::SetUniforms(uniforms));
            for subrange in self.buffers.non_skipped_subranges(&range, skipped) {
                commands.push(DrawCommand::DrawIndexed { first: subrange.start, count: subrange.len() });
            }
        }

        commands
    }

    fn index_count(&self) -> usize {
        self.buffers.indices.len()
    }

    ///
    /// The recorded features, most recently drawn first
    ///
    pub fn features_reversed(&self) -> Vec<FeatureId> {
        self.buffers.feature_ranges().into_iter().rev().map(|(feature, _)| feature).collect()
    }

    ///
    /// The command stream drawing one feature alone, forced opaque, for hit readback
    ///
    pub fn commands_for_feature(&self, feature: FeatureId, transform: &Transform, view_rotation: f64) -> Vec<DrawCommand> {
        let (vertices, indices) = self.frozen_buffers();

        let range = match self.buffers.feature_ranges().into_iter().find(|(id, _)| *id == feature) {
            Some((_, range)) if !range.is_empty()   => range,
            _                                       => return vec![],
        };

        // Find the stroke width active over this feature so hit extents match drawing
        let mut line_width = 1.0f32;
        for (uniforms, group_range) in self.styles.groups(indices.len()) {
            if group_range.start <= range.start && range.start < group_range.end {
                line_width = uniforms.line_width.max(1.0);
            }
        }

        vec![
            DrawCommand::SetTransform(transform.multiply(&Transform::translation(self.origin.0, self.origin.1))),
            DrawCommand::SetViewRotation(view_rotation),
            DrawCommand::UploadVertices { layout: VertexLayout::Line, vertices },
            DrawCommand::UploadIndices(indices),
            DrawCommand::SetUniforms(Uniforms {
                fill_color:     Rgba([0, 0, 0, 0]),
                stroke_color:   Rgba([255, 255, 255, 255]),
                line_width,
                miter_limit:    10.0,
                opacity:        1.0,
            }),
            DrawCommand::DrawIndexed { first: range.start, count: range.len() },
        ]
    }
}

impl GeometryRenderer for LineStringReplay {
    fn set_fill_stroke_style(&mut self, _fill: Option<FillStyle>, stroke: Option<StrokeStyle>) {
        self.set_stroke(stroke);
    }

    fn draw_line_string(&mut self, line: &LineString, feature: FeatureId) {
        let simplified  = line.simplified(self.tolerance * self.tolerance);
        let flat        = simplified.base().flat_coordinates().to_vec();
        if flat.is_empty() {
            return;
        }

        let end = flat.len();
        self.draw_flat_line(&flat, 0, end, simplified.base().stride(), false, feature);
    }

    fn draw_multi_line_string(&mut self, lines: &MultiLineString, feature: FeatureId) {
        let simplified  = lines.simplified(self.tolerance * self.tolerance);
        let flat        = simplified.base().flat_coordinates().to_vec();
        let stride      = simplified.base().stride();

        let mut offset = 0;
        for end in simplified.ends().to_vec() {
            self.draw_flat_line(&flat, offset, end, stride, false, feature);
            offset = end;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stroked_replay() -> LineStringReplay {
        let mut replay = LineStringReplay::new((0.0, 0.0), 0.0);
        replay.set_stroke(Some(StrokeStyle::new(Rgba([0, 0, 0, 255]), 2.0)));
        replay
    }

    #[test]
    fn one_segment_makes_one_quad() {
        let mut replay = stroked_replay();

        let line = LineString::from_coordinates(&[[0.0, 0.0], [10.0, 0.0]]);
        replay.draw_line_string(&line, FeatureId(1));

        // 4 segment vertices, two triangles, plus round caps (2 quads)
        assert!(replay.buffers.indices.len() == 6 + 12, "Unexpected index count: {}", replay.buffers.indices.len());
    }

    #[test]
    fn miter_joins_add_an_extra_triangle_over_bevel() {
        let mut bevel_replay = LineStringReplay::new((0.0, 0.0), 0.0);
        let mut bevel_stroke = StrokeStyle::new(Rgba([0, 0, 0, 255]), 2.0);
        bevel_stroke.line_join = LineJoin::Bevel;
        bevel_stroke.line_cap = LineCap::Butt;
        bevel_replay.set_stroke(Some(bevel_stroke));

        let mut miter_replay = LineStringReplay::new((0.0, 0.0), 0.0);
        let mut miter_stroke = StrokeStyle::new(Rgba([0, 0, 0, 255]), 2.0);
        miter_stroke.line_join = LineJoin::Miter;
        miter_stroke.line_cap = LineCap::Butt;
        miter_replay.set_stroke(Some(miter_stroke));

        let line = LineString::from_coordinates(&[[0.0, 0.0], [10.0, 0.0], [10.0, 10.0]]);
        bevel_replay.draw_line_string(&line, FeatureId(1));
        miter_replay.draw_line_string(&line, FeatureId(1));

        assert!(
            miter_replay.buffers.indices.len() == bevel_replay.buffers.indices.len() + 3,
            "Unexpected counts: miter {} bevel {}",
            miter_replay.buffers.indices.len(), bevel_replay.buffers.indices.len()
        );
    }

    #[test]
    fn styleless_lines_record_nothing() {
        let mut replay = LineStringReplay::new((0.0, 0.0), 0.0);

        let line = LineString::from_coordinates(&[[0.0, 0.0], [10.0, 0.0]]);
        replay.draw_line_string(&line, FeatureId(1));

        assert!(replay.is_empty());
    }
}
