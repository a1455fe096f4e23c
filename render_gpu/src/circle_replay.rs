use crate::buffer::*;
use crate::command::*;
use crate::vertex::*;

use carta_geometry::*;
use carta_replay::*;

use std::sync::Arc;

///
/// Builds resolution-independent circle quads for the GPU
///
/// Every circle is four vertices and two triangles whatever its radius: each vertex
/// carries the centre, its corner index and the radius, the vertex stage expands the
/// quad, and the fragment stage discards pixels outside the analytic circle (and inside
/// it for stroke-only styles).
///
pub struct CircleReplay {
    origin:     (f64, f64),

    buffers:    ReplayBuffers,
    styles:     StyleGroups<Uniforms>,
    fill:       Option<Rgba>,
    stroke:     Option<StrokeStyle>,

    frozen:     Option<(Arc<Vec<f32>>, Arc<Vec<u32>>)>,
}

impl CircleReplay {
    // Circles are analytic: the group's simplification tolerance has nothing to shave off
    pub fn new(origin: (f64, f64), _tolerance: f64) -> CircleReplay {
        CircleReplay {
            origin,
            buffers:    ReplayBuffers::new(),
            styles:     StyleGroups::new(),
            fill:       None,
            stroke:     None,
            frozen:     None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.indices.is_empty()
    }

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

    fn upload_commands(&self, transform: &Transform, view_rotation: f64) -> Vec<DrawCommand> {
        let (vertices, indices) = self.frozen_buffers();

        vec![
            DrawCommand::SetTransform(transform.multiply(&Transform::translation(self.origin.0, self.origin.1))),
            DrawCommand::SetViewRotation(view_rotation),
            DrawCommand::UploadVertices { layout: VertexLayout::Circle, vertices },
            DrawCommand::UploadIndices(indices),
        ]
    }

    ///
    /// Compiles the recorded circles into a draw command stream
    ///
    pub fn replay(&self, transform: &Transform, view_rotation: f64, skipped: &FeatureSkipSet) -> Vec<DrawCommand> {
        if self.buffers.indices.is_empty() {
            return vec![];
        }

        let mut commands = self.upload_commands(transform, view_rotation);

        for (uniforms, range) in self.styles.groups(self.buffers.indices.len()) {
            commands.push(DrawCommand::SetUniforms(uniforms));
            for subrange in self.buffers.non_skipped_subranges(&range, skipped) {
                commands.push(DrawCommand::DrawIndexed { first: subrange.start, count: subrange.len() });
            }
        }

        commands
    }

    pub fn features_reversed(&self) -> Vec<FeatureId> {
        self.buffers.feature_ranges().into_iter().rev().map(|(feature, _)| feature).collect()
    }

    ///
    /// The command stream drawing one feature alone, forced opaque, for hit readback
    ///
    pub fn commands_for_feature(&self, feature: FeatureId, transform: &Transform, view_rotation: f64) -> Vec<DrawCommand> {
        let range = match self.buffers.feature_ranges().into_iter().find(|(id, _)| *id == feature) {
            Some((_, range)) if !range.is_empty()   => range,
            _                                       => return vec![],
        };

        let mut commands = self.upload_commands(transform, view_rotation);
        commands.push(DrawCommand::SetUniforms(Uniforms {
            fill_color:     Rgba([255, 255, 255, 255]),
            stroke_color:   Rgba([0, 0, 0, 0]),
            line_width:     0.0,
            miter_limit:    10.0,
            opacity:        1.0,
        }));
        commands.push(DrawCommand::DrawIndexed { first: range.start, count: range.len() });
        commands
    }
}

impl GeometryRenderer for CircleReplay {
    fn set_fill_stroke_style(&mut self, fill: Option<FillStyle>, stroke: Option<StrokeStyle>) {
        self.fill = match fill {
            Some(FillStyle::Color(color))   => Some(color),
            Some(FillStyle::Pattern(_))     => None,
            None                            => None,
        };
        self.stroke = stroke;
    }

    fn draw_circle(&mut self, circle: &Circle, feature: FeatureId) {
        if self.fill.is_none() && self.stroke.is_none() {
            return;
        }

        let (center_x, center_y)    = circle.center();
        let radius                  = circle.radius();

        self.buffers.begin_feature(feature);
        self.styles.set_style(
            Uniforms {
                fill_color:     self.fill.unwrap_or(Rgba([0, 0, 0, 0])),
                stroke_color:   self.stroke.as_ref().map(|stroke| stroke.color).unwrap_or(Rgba([0, 0, 0, 0])),
                line_width:     self.stroke.as_ref().map(|stroke| stroke.width as f32).unwrap_or(0.0),
                miter_limit:    10.0,
                opacity:        1.0,
            },
            self.buffers.indices.len(),
        );

        let base = self.buffers.vertex_count(VertexLayout::Circle.floats_per_vertex()) as u32;
        for corner in 0..4 {
            CircleVertex::new(
                (center_x - self.origin.0) as f32,
                (center_y - self.origin.1) as f32,
                corner,
                radius as f32,
            ).push_to(&mut self.buffers.vertices);
        }

        self.buffers.push_triangle(base, base + 1, base + 2);
        self.buffers.push_triangle(base, base + 2, base + 3);
    }
}
