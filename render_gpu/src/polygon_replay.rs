use crate::buffer::*;
use crate::command::*;
use crate::line_string_replay::*;
use crate::triangulate::*;
use crate::vertex::*;

use carta_geometry::*;
use carta_replay::*;

use std::sync::Arc;

///
/// Builds triangulated polygon fills for the GPU
///
/// Fills triangulate into the shared vertex/index arena through the ear-clipping
/// triangulator; stroked outlines delegate to a nested line tessellation so a filled
/// and stroked polygon is one feature across two buffers. Pattern fills have no GPU
/// rendition here and record nothing (the raster backend draws them).
///
pub struct PolygonReplay {
    origin:     (f64, f64),
    tolerance:  f64,

    buffers:    ReplayBuffers,
    styles:     StyleGroups<Uniforms>,
    fill:       Option<Rgba>,

    outlines:   LineStringReplay,
    frozen:     Option<(Arc<Vec<f32>>, Arc<Vec<u32>>)>,
}

impl PolygonReplay {
    pub fn new(origin: (f64, f64), tolerance: f64) -> PolygonReplay {
        PolygonReplay {
            origin,
            tolerance,
            buffers:    ReplayBuffers::new(),
            styles:     StyleGroups::new(),
            fill:       None,
            outlines:   LineStringReplay::new(origin, tolerance),
            frozen:     None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.indices.is_empty() && self.outlines.is_empty()
    }

    ///
    /// Triangulates one ring set into the arena
    ///
    fn fill_rings(&mut self, flat_coordinates: &[f64], offset: usize, ends: &[usize], stride: usize) {
        let triangulation = triangulate_rings(flat_coordinates, offset, ends, stride);
        if triangulation.indices.is_empty() {
            return;
        }

        let base = self.buffers.vertex_count(VertexLayout::Polygon.floats_per_vertex()) as u32;
        for vertex in triangulation.vertices.chunks_exact(2) {
            PolygonVertex::new(
                (vertex[0] - self.origin.0) as f32,
                (vertex[1] - self.origin.1) as f32,
            ).push_to(&mut self.buffers.vertices);
        }
        for index in triangulation.indices {
            self.buffers.indices.push(base + index);
        }
    }

    ///
    /// Strokes one ring set through the nested line tessellation
    ///
    fn outline_rings(&mut self, flat_coordinates: &[f64], offset: usize, ends: &[usize], stride: usize, feature: FeatureId) {
        let mut ring_offset = offset;
        for end in ends {
            self.outlines.draw_flat_line(flat_coordinates, ring_offset, *end, stride, true, feature);
            ring_offset = *end;
        }
    }

    fn draw_ring_sets(&mut self, flat_coordinates: &[f64], endss: &[&[usize]], stride: usize, feature: FeatureId) {
        if let Some(fill) = self.fill {
            self.buffers.begin_feature(feature);
            self.styles.set_style(
                Uniforms {
                    fill_color:     fill,
                    stroke_color:   Rgba([0, 0, 0, 0]),
                    line_width:     0.0,
                    miter_limit:    10.0,
                    opacity:        1.0,
                },
                self.buffers.indices.len(),
            );

            let mut offset = 0;
            for ends in endss {
                self.fill_rings(flat_coordinates, offset, ends, stride);
                offset = ends.last().copied().unwrap_or(offset);
            }
        }

        let mut offset = 0;
        for ends in endss {
            self.outline_rings(flat_coordinates, offset, ends, stride, feature);
            offset = ends.last().copied().unwrap_or(offset);
        }
    }

    pub fn finish(&mut self) {
        if self.frozen.is_none() {
            self.frozen = Some((
                Arc::new(self.buffers.vertices.clone()),
                Arc::new(self.buffers.indices.clone()),
            ));
        }
        self.outlines.finish();
    }

    fn frozen_buffers(&self) -> (Arc<Vec<f32>>, Arc<Vec<u32>>) {
        let (vertices, indices) = self.frozen.as_ref().expect("Replayed before finish()");
        (Arc::clone(vertices), Arc::clone(indices))
    }

    ///
    /// Compiles the recorded fills and outlines into a draw command stream, fills first
    ///
    pub fn replay(&self, transform: &Transform, view_rotation: f64, skipped: &FeatureSkipSet) -> Vec<DrawCommand> {
        let mut commands = vec![];

        if !self.buffers.indices.is_empty() {
            let (vertices, indices) = self.frozen_buffers();

            commands.push(DrawCommand::SetTransform(transform.multiply(&Transform::translation(self.origin.0, self.origin.1))));
            commands.push(DrawCommand::SetViewRotation(view_rotation));
            commands.push(DrawCommand::UploadVertices { layout: VertexLayout::Polygon, vertices });
            commands.push(DrawCommand::UploadIndices(indices));

            for (uniforms, range) in self.styles.groups(self.buffers.indices.len()) {
                commands.push(DrawCommand::SetUniforms(uniforms));
                for subrange in self.buffers.non_skipped_subranges(&range, skipped) {
                    commands.push(DrawCommand::DrawIndexed { first: subrange.start, count: subrange.len() });
                }
            }
        }

        commands.extend(self.outlines.replay(transform, view_rotation, skipped));
        commands
    }

    ///
    /// The recorded features, most recently drawn first
    ///
    pub fn features_reversed(&self) -> Vec<FeatureId> {
        let mut features: Vec<FeatureId> = self.buffers.feature_ranges().into_iter().map(|(feature, _)| feature).collect();

        for feature in self.outlines.features_reversed().into_iter().rev() {
            if !features.contains(&feature) {
                features.push(feature);
            }
        }

        features.reverse();
        features
    }

    ///
    /// The command stream drawing one feature alone, forced opaque, for hit readback
    ///
    pub fn commands_for_feature(&self, feature: FeatureId, transform: &Transform, view_rotation: f64) -> Vec<DrawCommand> {
        let mut commands = vec![];

        if let Some((_, range)) = self.buffers.feature_ranges().into_iter().find(|(id, _)| *id == feature) {
            if !range.is_empty() {
                let (vertices, indices) = self.frozen_buffers();

                commands.push(DrawCommand::SetTransform(transform.multiply(&Transform::translation(self.origin.0, self.origin.1))));
                commands.push(DrawCommand::SetViewRotation(view_rotation));
                commands.push(DrawCommand::UploadVertices { layout: VertexLayout::Polygon, vertices });
                commands.push(DrawCommand::UploadIndices(indices));
                commands.push(DrawCommand::SetUniforms(Uniforms {
                    fill_color:     Rgba([255, 255, 255, 255]),
                    stroke_color:   Rgba([0, 0, 0, 0]),
                    line_width:     0.0,
                    miter_limit:    10.0,
                    opacity:        1.0,
                }));
                commands.push(DrawCommand::DrawIndexed { first: range.start, count: range.len() });
            }
        }

        commands.extend(self.outlines.commands_for_feature(feature, transform, view_rotation));
        commands
    }
}

impl GeometryRenderer for PolygonReplay {
    fn set_fill_stroke_style(&mut self, fill: Option<FillStyle>, stroke: Option<StrokeStyle>) {
        self.fill = match fill {
            Some(FillStyle::Color(color))   => Some(color),
            // Pattern fills stay on the raster backend
            Some(FillStyle::Pattern(_))     => None,
            None                            => None,
        };
        self.outlines.set_stroke(stroke);
    }

    fn draw_polygon(&mut self, polygon: &Polygon, feature: FeatureId) {
        let simplified  = polygon.simplified(self.tolerance * self.tolerance);
        let oriented    = simplified.oriented_flat_coordinates();
        if oriented.is_empty() {
            return;
        }

        let stride = simplified.base().stride();
        self.draw_ring_sets(&oriented, &[simplified.ends()], stride, feature);
    }

    fn draw_multi_polygon(&mut self, polygons: &MultiPolygon, feature: FeatureId) {
        let simplified  = polygons.simplified(self.tolerance * self.tolerance);
        let oriented    = simplified.oriented_flat_coordinates();
        if oriented.is_empty() {
            return;
        }

        let stride  = simplified.base().stride();
        let endss   = simplified.endss().iter().map(|ends| ends.as_slice()).collect::<Vec<_>>();
        self.draw_ring_sets(&oriented, &endss, stride, feature);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filled_square_produces_two_triangles() {
        let mut replay = PolygonReplay::new((0.0, 0.0), 0.0);
        replay.set_fill_stroke_style(Some(FillStyle::Color(Rgba([255, 0, 0, 255]))), None);

        let polygon = Polygon::from_rings(&[vec![[0.0, 0.0], [4.0, 0.0], [4.0, 4.0], [0.0, 4.0]]]);
        replay.draw_polygon(&polygon, FeatureId(1));

        assert!(replay.buffers.indices.len() == 6, "Unexpected index count: {}", replay.buffers.indices.len());
        assert!(replay.buffers.feature_ranges() == vec![(FeatureId(1), 0..6)]);
    }

    #[test]
    fn consecutive_same_fill_polygons_share_a_style_group() {
        let mut replay = PolygonReplay::new((0.0, 0.0), 0.0);
        replay.set_fill_stroke_style(Some(FillStyle::Color(Rgba([255, 0, 0, 255]))), None);

        let square = Polygon::from_rings(&[vec![[0.0, 0.0], [4.0, 0.0], [4.0, 4.0], [0.0, 4.0]]]);
        replay.draw_polygon(&square, FeatureId(1));
        replay.draw_polygon(&square, FeatureId(2));

        replay.set_fill_stroke_style(Some(FillStyle::Color(Rgba([0, 0, 255, 255]))), None);
        replay.draw_polygon(&square, FeatureId(3));

        let groups = replay.styles.groups(replay.buffers.indices.len());
        assert!(groups.len() == 2, "Unexpected group count: {}", groups.len());
        assert!(groups[0].1 == (0..12) && groups[1].1 == (12..18), "Unexpected ranges: {:?} {:?}", groups[0].1, groups[1].1);
    }

    #[test]
    fn stroke_only_polygons_tessellate_outlines_without_fill_triangles() {
        let mut replay = PolygonReplay::new((0.0, 0.0), 0.0);
        replay.set_fill_stroke_style(None, Some(StrokeStyle::new(Rgba([0, 0, 0, 255]), 2.0)));

        let polygon = Polygon::from_rings(&[vec![[0.0, 0.0], [4.0, 0.0], [4.0, 4.0], [0.0, 4.0]]]);
        replay.draw_polygon(&polygon, FeatureId(1));

        assert!(replay.buffers.indices.is_empty(), "Fill triangles recorded without a fill");
        assert!(!replay.outlines.is_empty(), "Outline missing");
    }
}
