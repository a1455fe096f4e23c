use crate::buffer::*;
use crate::command::*;
use crate::vertex::*;

use carta_geometry::*;
use carta_replay::*;

use std::sync::Arc;

///
/// Builds textured marker quads for the GPU
///
/// One quad per stamped point: the anchor coordinate goes through the map transform,
/// the corner offsets stay in device pixels, so markers keep their size at every zoom.
/// Draws batch by raster: consecutive stamps of the same image share one texture bind.
///
pub struct ImageReplay {
    origin:         (f64, f64),
    pixel_ratio:    f64,

    buffers:        ReplayBuffers,
    textures:       StyleGroups<ImageRaster>,
    style:          Option<ImageStyle>,

    frozen:         Option<(Arc<Vec<f32>>, Arc<Vec<u32>>)>,
}

impl ImageReplay {
    pub fn new(origin: (f64, f64), pixel_ratio: f64) -> ImageReplay {
        ImageReplay {
            origin,
            pixel_ratio,
            buffers:    ReplayBuffers::new(),
            textures:   StyleGroups::new(),
            style:      None,
            frozen:     None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.indices.is_empty()
    }

    ///
    /// Stamps one quad anchored at a map coordinate
    ///
    fn stamp(&mut self, x: f64, y: f64, style: &ImageStyle) {
        let scale   = style.scale * self.pixel_ratio;
        let width   = style.size.0 * scale;
        let height  = style.size.1 * scale;

        let left    = -style.anchor.0 * scale;
        let top     = -style.anchor.1 * scale;

        let raster_width    = style.raster.width as f64;
        let raster_height   = style.raster.height as f64;
        let u0 = style.origin.0 / raster_width;
        let v0 = style.origin.1 / raster_height;
        let u1 = (style.origin.0 + style.size.0) / raster_width;
        let v1 = (style.origin.1 + style.size.1) / raster_height;

        let sin = style.rotation.sin();
        let cos = style.rotation.cos();

        let base                = self.buffers.vertex_count(VertexLayout::Textured.floats_per_vertex()) as u32;
        let rotate_with_view    = if style.rotate_with_view { 1.0 } else { 0.0 };

        for (corner_x, corner_y, u, v) in [
            (left, top, u0, v0),
            (left + width, top, u1, v0),
            (left + width, top + height, u1, v1),
            (left, top + height, u0, v1),
        ] {
            TexturedVertex {
                pos:                [(x - self.origin.0) as f32, (y - self.origin.1) as f32],
                offset:             [(corner_x*cos - corner_y*sin) as f32, (corner_x*sin + corner_y*cos) as f32],
                tex:                [u as f32, v as f32],
                opacity:            style.opacity,
                rotate_with_view,
            }.push_to(&mut self.buffers.vertices);
        }

        self.buffers.push_triangle(base, base + 1, base + 2);
        self.buffers.push_triangle(base, base + 2, base + 3);
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
    /// Compiles the recorded stamps into a draw command stream, one texture bind per
    /// group of consecutive same-raster stamps
    ///
    pub fn replay(&self, transform: &Transform, view_rotation: f64, skipped: &FeatureSkipSet) -> Vec<DrawCommand> {
        if self.buffers.indices.is_empty() {
            return vec![];
        }

        let mut commands = self.upload_commands(transform, view_rotation);
        commands.push(DrawCommand::SetUniforms(Uniforms::transparent()));

        for (raster, range) in self.textures.groups(self.buffers.indices.len()) {
            commands.push(DrawCommand::BindTexture(raster));
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
    /// The command stream drawing one feature alone for hit readback
    ///
    pub fn commands_for_feature(&self, feature: FeatureId, transform: &Transform, view_rotation: f64) -> Vec<DrawCommand> {
        let range = match self.buffers.feature_ranges().into_iter().find(|(id, _)| *id == feature) {
            Some((_, range)) if !range.is_empty()   => range,
            _                                       => return vec![],
        };

        let mut commands = self.upload_commands(transform, view_rotation);
        commands.push(DrawCommand::SetUniforms(Uniforms::transparent()));

        for (raster, group_range) in self.textures.groups(self.buffers.indices.len()) {
            let start   = group_range.start.max(range.start);
            let end     = group_range.end.min(range.end);
            if start < end {
                commands.push(DrawCommand::BindTexture(raster));
                commands.push(DrawCommand::DrawIndexed { first: start, count: end - start });
            }
        }

        commands
    }
}

impl GeometryRenderer for ImageReplay {
    fn set_image_style(&mut self, image: ImageStyle) {
        self.style = Some(image);
    }

    fn draw_point(&mut self, point: &Point, feature: FeatureId) {
        let style = match &self.style {
            Some(style) => style.clone(),
            None        => return,
        };
        if point.base().flat_coordinates().is_empty() {
            return;
        }

        self.buffers.begin_feature(feature);
        self.textures.set_style(style.raster.clone(), self.buffers.indices.len());
        self.stamp(point.x(), point.y(), &style);
    }

    fn draw_multi_point(&mut self, points: &MultiPoint, feature: FeatureId) {
        let style = match &self.style {
            Some(style) => style.clone(),
            None        => return,
        };

        let flat    = points.base().flat_coordinates().to_vec();
        let stride  = points.base().stride();
        if flat.is_empty() {
            return;
        }

        self.buffers.begin_feature(feature);
        self.textures.set_style(style.raster.clone(), self.buffers.indices.len());

        let mut idx = 0;
        while idx < flat.len() {
            self.stamp(flat[idx], flat[idx + 1], &style);
            idx += stride;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stamps_share_texture_groups_per_raster() {
        let mut replay = ImageReplay::new((0.0, 0.0), 1.0);

        let marker = ImageStyle::new(ImageRaster::new(2, 2, vec![255; 16]));
        replay.set_image_style(marker.clone());
        replay.draw_point(&Point::new(0.0, 0.0), FeatureId(1));
        replay.draw_point(&Point::new(5.0, 5.0), FeatureId(2));

        let other = ImageStyle::new(ImageRaster::new(4, 4, vec![128; 64]));
        replay.set_image_style(other);
        replay.draw_point(&Point::new(9.0, 9.0), FeatureId(3));

        let groups = replay.textures.groups(replay.buffers.indices.len());
        assert!(groups.len() == 2, "Unexpected texture group count: {}", groups.len());
        assert!(groups[0].1 == (0..12), "Unexpected first group range: {:?}", groups[0].1);
    }

    #[test]
    fn each_point_is_one_quad() {
        let mut replay = ImageReplay::new((0.0, 0.0), 1.0);
        replay.set_image_style(ImageStyle::new(ImageRaster::new(2, 2, vec![255; 16])));

        let points = MultiPoint::from_coordinates(&[[0.0, 0.0], [1.0, 1.0], [2.0, 2.0]]);
        replay.draw_multi_point(&points, FeatureId(1));

        assert!(replay.buffers.vertex_count(VertexLayout::Textured.floats_per_vertex()) == 12);
        assert!(replay.buffers.indices.len() == 18);
    }
}
