use crate::atlas::*;
use crate::buffer::*;
use crate::command::*;
use crate::vertex::*;

use carta_geometry::flat;
use carta_geometry::*;
use carta_replay::*;

use std::sync::Arc;

///
/// Builds textured glyph quads for the GPU
///
/// Labels stamp glyph by glyph at a computed anchor (the point itself, a line's
/// midpoint, a polygon's interior point) out of the process-wide glyph atlas. A glyph
/// the atlas cannot hold is skipped for the frame; the rest of the label still draws.
/// Draws group by atlas page so one page bind covers a run of glyphs.
///
pub struct TextReplay {
    origin:         (f64, f64),
    pixel_ratio:    f64,

    buffers:        ReplayBuffers,
    pages:          StyleGroups<usize>,
    style:          Option<TextStyle>,
    rasterizer:     Option<Arc<dyn GlyphRasterizer>>,

    frozen:         Option<(Arc<Vec<f32>>, Arc<Vec<u32>>)>,
}

impl TextReplay {
    pub fn new(origin: (f64, f64), pixel_ratio: f64, rasterizer: Option<Arc<dyn GlyphRasterizer>>) -> TextReplay {
        TextReplay {
            origin,
            pixel_ratio,
            buffers:    ReplayBuffers::new(),
            pages:      StyleGroups::new(),
            style:      None,
            rasterizer,
            frozen:     None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.indices.is_empty()
    }

    ///
    /// Stamps the current label's glyphs in a row around an anchor coordinate
    ///
    fn stamp_label_at(&mut self, x: f64, y: f64, feature: FeatureId) {
        let (style, rasterizer) = match (&self.style, &self.rasterizer) {
            (Some(style), Some(rasterizer)) => (style.clone(), Arc::clone(rasterizer)),
            _                               => return,
        };
        if style.text.is_empty() {
            return;
        }

        let scale = style.scale * self.pixel_ratio;

        let total_width: f64 = style.text.chars()
            .map(|glyph| rasterizer.measure_glyph(glyph, &style.font).0 as f64 * scale)
            .sum();
        let line_height = style.text.chars()
            .map(|glyph| rasterizer.measure_glyph(glyph, &style.font).1 as f64 * scale)
            .fold(0.0, f64::max);

        let mut pen_x = match style.align {
            TextAlign::Left     => 0.0,
            TextAlign::Center   => -total_width / 2.0,
            TextAlign::Right    => -total_width,
        } + style.offset_x * self.pixel_ratio;

        let pen_y = match style.baseline {
            TextBaseline::Top           => 0.0,
            TextBaseline::Middle        => -line_height / 2.0,
            TextBaseline::Alphabetic    => -line_height * 0.8,
            TextBaseline::Bottom        => -line_height,
        } + style.offset_y * self.pixel_ratio;

        let fill_checksum       = style.fill.as_ref().map(|fill| fill.checksum()).unwrap_or(0);
        let rotate_with_view    = if style.rotate_with_view { 1.0 } else { 0.0 };

        self.buffers.begin_feature(feature);

        let mut atlas = GLYPH_ATLAS.lock().unwrap();
        let page_size = atlas.page_size() as f64;

        for glyph in style.text.chars() {
            let (glyph_width, _) = rasterizer.measure_glyph(glyph, &style.font);
            let advance = glyph_width as f64 * scale;

            let key = GlyphKey { glyph, font: style.font.clone(), fill_checksum };
            let slot = match atlas.slot(key, rasterizer.as_ref(), style.fill.as_ref()) {
                Some(slot)  => slot,
                // Atlas exhaustion skips the glyph, not the frame
                None        => { pen_x += advance; continue; }
            };

            self.pages.set_style(slot.page, self.buffers.indices.len());

            let width   = slot.width as f64 * scale;
            let height  = slot.height as f64 * scale;

            let u0 = slot.x as f64 / page_size;
            let v0 = slot.y as f64 / page_size;
            let u1 = (slot.x + slot.width) as f64 / page_size;
            let v1 = (slot.y + slot.height) as f64 / page_size;

            let base = self.buffers.vertex_count(VertexLayout::Textured.floats_per_vertex()) as u32;
            for (corner_x, corner_y, u, v) in [
                (pen_x, pen_y, u0, v0),
                (pen_x + width, pen_y, u1, v0),
                (pen_x + width, pen_y + height, u1, v1),
                (pen_x, pen_y + height, u0, v1),
            ] {
                TexturedVertex {
                    pos:                [(x - self.origin.0) as f32, (y - self.origin.1) as f32],
                    offset:             [corner_x as f32, corner_y as f32],
                    tex:                [u as f32, v as f32],
                    opacity:            1.0,
                    rotate_with_view,
                }.push_to(&mut self.buffers.vertices);
            }

            self.buffers.push_triangle(base, base + 1, base + 2);
            self.buffers.push_triangle(base, base + 2, base + 3);

            pen_x += advance;
        }
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
            DrawCommand::UploadVertices { layout: VertexLayout::Textured, vertices },
            DrawCommand::UploadIndices(indices),
        ]
    }

    ///
    /// Compiles the recorded glyphs into a draw command stream, one atlas page bind per
    /// group
    ///
    pub fn replay(&self, transform: &Transform, view_rotation: f64, skipped: &FeatureSkipSet) -> Vec<DrawCommand> {
        if self.buffers.indices.is_empty() {
            return vec![];
        }

        let mut commands = self.upload_commands(transform, view_rotation);
        commands.push(DrawCommand::SetUniforms(Uniforms::transparent()));

        let atlas = GLYPH_ATLAS.lock().unwrap();
        for (page, range) in self.pages.groups(self.buffers.indices.len()) {
            if let Some(raster) = atlas.page_raster(page) {
                commands.push(DrawCommand::BindTexture(raster));
                for subrange in self.buffers.non_skipped_subranges(&range, skipped) {
                    commands.push(DrawCommand::DrawIndexed { first: subrange.start, count: subrange.len() });
                }
            }
        }

        commands
    }

    pub fn features_reversed(&self) -> Vec<FeatureId> {
        self.buffers.feature_ranges().into_iter().rev().map(|(feature, _)| feature).collect()
    }

    ///
    /// The command stream drawing one feature alone for hit readback
    ///
    pub fn commands_for_feature(&self, feature: FeatureId, transform: &Transform, view_rotation: f64) -> Vec<DrawCommand> {
        let range = match self.buffers.feature_ranges().into_iter().find(|(id, _)| *id == feature) {
            Some((_, range)) if !range.is_empty()   => range,
            _                                       => return vec![],
        };

        let mut commands = self.upload_commands(transform, view_rotation);
        commands.push(DrawCommand::SetUniforms(Uniforms::transparent()));

        let atlas = GLYPH_ATLAS.lock().unwrap();
        for (page, group_range) in self.pages.groups(self.buffers.indices.len()) {
            let start   = group_range.start.max(range.start);
            let end     = group_range.end.min(range.end);
            if start < end {
                if let Some(raster) = atlas.page_raster(page) {
                    commands.push(DrawCommand::BindTexture(raster));
                    commands.push(DrawCommand::DrawIndexed { first: start, count: end - start });
                }
            }
        }

        commands
    }
}

impl GeometryRenderer for TextReplay {
    fn set_text_style(&mut self, text: TextStyle) {
        self.style = Some(text);
    }

    fn draw_point(&mut self, point: &Point, feature: FeatureId) {
        if point.base().flat_coordinates().is_empty() {
            return;
        }

        self.stamp_label_at(point.x(), point.y(), feature);
    }

    fn draw_multi_point(&mut self, points: &MultiPoint, feature: FeatureId) {
        let flat    = points.base().flat_coordinates().to_vec();
        let stride  = points.base().stride();

        let mut idx = 0;
        while idx < flat.len() {
            self.stamp_label_at(flat[idx], flat[idx + 1], feature);
            idx += stride;
        }
    }

    fn draw_line_string(&mut self, line: &LineString, feature: FeatureId) {
        let flat = line.base().flat_coordinates();
        if flat.is_empty() {
            return;
        }

        // Anchor at half the line's length
        let stride      = line.base().stride();
        let total       = flat::line_string_length(flat, 0, flat.len(), stride);
        let mut walked  = 0.0;

        let mut idx = stride;
        while idx < flat.len() {
            let (x1, y1) = (flat[idx - stride], flat[idx - stride + 1]);
            let (x2, y2) = (flat[idx], flat[idx + 1]);

            let segment = ((x2-x1)*(x2-x1) + (y2-y1)*(y2-y1)).sqrt();
            if segment > 0.0 && walked + segment >= total / 2.0 {
                let along = (total / 2.0 - walked) / segment;
                self.stamp_label_at(x1 + (x2-x1)*along, y1 + (y2-y1)*along, feature);
                return;
            }

            walked += segment;
            idx += stride;
        }

        self.stamp_label_at(flat[0], flat[1], feature);
    }

    fn draw_multi_line_string(&mut self, lines: &MultiLineString, feature: FeatureId) {
        for index in 0..lines.part_count() {
            if let Some(line) = lines.line_string(index) {
                self.draw_line_string(&line, feature);
            }
        }
    }

    fn draw_polygon(&mut self, polygon: &Polygon, feature: FeatureId) {
        if polygon.base().flat_coordinates().is_empty() {
            return;
        }

        let (x, y) = polygon.interior_point();
        self.stamp_label_at(x, y, feature);
    }

    fn draw_multi_polygon(&mut self, polygons: &MultiPolygon, feature: FeatureId) {
        let interior_points = polygons.interior_points();

        let mut idx = 0;
        while idx + 1 < interior_points.len() {
            self.stamp_label_at(interior_points[idx], interior_points[idx + 1], feature);
            idx += 2;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label_replay(text: &str) -> TextReplay {
        let mut replay = TextReplay::new((0.0, 0.0), 1.0, Some(Arc::new(BlockGlyphRasterizer::new())));
        replay.set_text_style(TextStyle::new(text, "mono"));
        replay
    }

    #[test]
    fn each_glyph_is_one_quad() {
        let mut replay = label_replay("abc");

        replay.draw_point(&Point::new(10.0, 10.0), FeatureId(1));

        assert!(replay.buffers.indices.len() == 18, "Unexpected index count: {}", replay.buffers.indices.len());
    }

    #[test]
    fn labels_without_a_rasterizer_record_nothing() {
        let mut replay = TextReplay::new((0.0, 0.0), 1.0, None);
        replay.set_text_style(TextStyle::new("label", "mono"));

        replay.draw_point(&Point::new(10.0, 10.0), FeatureId(1));

        assert!(replay.is_empty());
    }

    #[test]
    fn centered_labels_straddle_the_anchor() {
        let mut replay = label_replay("ab");

        replay.draw_point(&Point::new(0.0, 0.0), FeatureId(1));

        // Two 8px glyphs centred: the first quad's left edge sits at -8
        let first_offset_x = replay.buffers.vertices[2];
        assert!(first_offset_x == -8.0, "Unexpected first offset: {}", first_offset_x);
    }
}
