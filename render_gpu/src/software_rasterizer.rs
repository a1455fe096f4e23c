use crate::command::*;

use carta_geometry::*;
use carta_replay::*;

use std::sync::Arc;

///
/// A CPU executor for draw command streams
///
/// This emulates the vertex and fragment stages for each layout: segment/join/cap
/// expansion for lines, corner expansion and analytic discard for circles, device-pixel
/// offsets and nearest-neighbour sampling for textured quads. Hit detection runs whole
/// per-feature streams through a 1x1 instance of this and reads back the single alpha
/// value; tests use larger framebuffers to assert on real pixels.
///
pub struct SoftwareRasterizer {
    width:          usize,
    height:         usize,
    pixels:         Vec<u8>,

    transform:      Transform,
    view_rotation:  f64,
    layout:         VertexLayout,
    vertices:       Arc<Vec<f32>>,
    indices:        Arc<Vec<u32>>,
    uniforms:       Uniforms,
    texture:        Option<ImageRaster>,
}

impl SoftwareRasterizer {
    pub fn new(width: usize, height: usize) -> SoftwareRasterizer {
        SoftwareRasterizer {
            width,
            height,
            pixels:         vec![0; width * height * 4],
            transform:      Transform::identity(),
            view_rotation:  0.0,
            layout:         VertexLayout::Polygon,
            vertices:       Arc::new(vec![]),
            indices:        Arc::new(vec![]),
            uniforms:       Uniforms::transparent(),
            texture:        None,
        }
    }

    #[inline]
    pub fn alpha_at(&self, x: usize, y: usize) -> u8 {
        if x >= self.width || y >= self.height {
            return 0;
        }
        self.pixels[(y * self.width + x) * 4 + 3]
    }

    #[inline]
    pub fn pixel_at(&self, x: usize, y: usize) -> [u8; 4] {
        if x >= self.width || y >= self.height {
            return [0, 0, 0, 0];
        }
        let idx = (y * self.width + x) * 4;
        [self.pixels[idx], self.pixels[idx+1], self.pixels[idx+2], self.pixels[idx+3]]
    }

    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.pixels
    }

    pub fn clear(&mut self) {
        self.pixels.iter_mut().for_each(|byte| *byte = 0);
    }

    ///
    /// Executes a command stream against this framebuffer
    ///
    pub fn run(&mut self, commands: &[DrawCommand]) {
        for command in commands {
            match command {
                DrawCommand::SetTransform(transform)                => { self.transform = *transform; }
                DrawCommand::SetViewRotation(rotation)              => { self.view_rotation = *rotation; }
                DrawCommand::UploadVertices { layout, vertices }    => {
                    self.layout     = *layout;
                    self.vertices   = Arc::clone(vertices);
                }
                DrawCommand::UploadIndices(indices)                 => { self.indices = Arc::clone(indices); }
                DrawCommand::SetUniforms(uniforms)                  => { self.uniforms = *uniforms; }
                DrawCommand::BindTexture(raster)                    => { self.texture = Some(raster.clone()); }
                DrawCommand::DrawIndexed { first, count }           => { self.draw_indexed(*first, *count); }
            }
        }
    }

    fn draw_indexed(&mut self, first: usize, count: usize) {
        let end = (first + count).min(self.indices.len());
        let indices = Arc::clone(&self.indices);

        for triangle in indices[first..end].chunks_exact(3) {
            let a = self.expand_vertex(triangle[0] as usize);
            let b = self.expand_vertex(triangle[1] as usize);
            let c = self.expand_vertex(triangle[2] as usize);

            self.fill_triangle(a, b, c);
        }
    }

    ///
    /// Runs the vertex stage for one vertex: returns its device position and the
    /// varyings its layout interpolates
    ///
    fn expand_vertex(&self, vertex: usize) -> (f64, f64, [f64; 4]) {
        let stride  = self.layout.floats_per_vertex();
        let data    = &self.vertices[vertex * stride..(vertex + 1) * stride];

        match self.layout {
            VertexLayout::Polygon => {
                let (x, y) = self.transform.apply(data[0] as f64, data[1] as f64);
                (x, y, [0.0; 4])
            }

            VertexLayout::Line => {
                let (x, y) = self.transform.apply(data[0] as f64, data[1] as f64);

                // The offset direction is in map space: rotate it through the linear
                // part of the transform, keep its miter scale, and apply half the line
                // width in device pixels
                let offset_x    = data[2] as f64;
                let offset_y    = data[3] as f64;
                let miter_scale = (offset_x*offset_x + offset_y*offset_y).sqrt();

                let Transform([a, b, c, d, _, _]) = self.transform;
                let device_x = a*offset_x + c*offset_y;
                let device_y = b*offset_x + d*offset_y;
                let length   = (device_x*device_x + device_y*device_y).sqrt();

                let half_width = (self.uniforms.line_width as f64 / 2.0).max(0.5);
                if length > 0.0 {
                    (x + device_x/length * half_width * miter_scale, y + device_y/length * half_width * miter_scale, [0.0; 4])
                } else {
                    (x, y, [0.0; 4])
                }
            }

            VertexLayout::Circle => {
                let center_x    = data[0] as f64;
                let center_y    = data[1] as f64;
                let corner      = data[2] as usize;
                let radius      = data[3] as f64;

                let (device_cx, device_cy)  = self.transform.apply(center_x, center_y);
                let (edge_x, edge_y)        = self.transform.apply(center_x + radius, center_y);
                let device_radius           = ((edge_x-device_cx).powi(2) + (edge_y-device_cy).powi(2)).sqrt();

                let reach = device_radius + (self.uniforms.line_width as f64) / 2.0 + 1.0;
                let (sign_x, sign_y) = match corner {
                    0 => (-1.0, -1.0),
                    1 => (1.0, -1.0),
                    2 => (1.0, 1.0),
                    _ => (-1.0, 1.0),
                };

                (device_cx + sign_x * reach, device_cy + sign_y * reach, [device_cx, device_cy, device_radius, 0.0])
            }

            VertexLayout::Textured => {
                let (x, y) = self.transform.apply(data[0] as f64, data[1] as f64);

                let offset_x = data[2] as f64;
                let offset_y = data[3] as f64;
                let (offset_x, offset_y) = if data[7] != 0.0 {
                    let sin = self.view_rotation.sin();
                    let cos = self.view_rotation.cos();
                    (offset_x*cos - offset_y*sin, offset_x*sin + offset_y*cos)
                } else {
                    (offset_x, offset_y)
                };

                (x + offset_x, y + offset_y, [data[4] as f64, data[5] as f64, data[6] as f64, 0.0])
            }
        }
    }

    ///
    /// Runs the fragment stage: the colour for interpolated varyings, or None to discard
    ///
    fn shade(&self, fragment_x: f64, fragment_y: f64, varyings: [f64; 4]) -> Option<[u8; 4]> {
        match self.layout {
            VertexLayout::Polygon => {
                let color = self.uniforms.fill_color;
                if color.is_fully_transparent() { None } else { Some(color.0) }
            }

            VertexLayout::Line => {
                let color = self.uniforms.stroke_color;
                if color.is_fully_transparent() { None } else { Some(color.0) }
            }

            VertexLayout::Circle => {
                let [center_x, center_y, radius, _] = varyings;
                let distance = ((fragment_x-center_x).powi(2) + (fragment_y-center_y).powi(2)).sqrt();

                let stroke      = self.uniforms.stroke_color;
                let half_width  = (self.uniforms.line_width as f64 / 2.0).max(0.5);
                if !stroke.is_fully_transparent() && (distance - radius).abs() <= half_width {
                    return Some(stroke.0);
                }

                let fill = self.uniforms.fill_color;
                if !fill.is_fully_transparent() && distance <= radius {
                    return Some(fill.0);
                }

                None
            }

            VertexLayout::Textured => {
                let texture = self.texture.as_ref()?;
                let [u, v, opacity, _] = varyings;

                let sample_x    = (u * texture.width as f64).floor().max(0.0) as u32;
                let sample_y    = (v * texture.height as f64).floor().max(0.0) as u32;
                let color       = texture.pixel(sample_x.min(texture.width.saturating_sub(1)), sample_y.min(texture.height.saturating_sub(1)));

                let alpha = ((color[3] as f64) * opacity).round() as u8;
                if alpha == 0 {
                    None
                } else {
                    Some([color[0], color[1], color[2], alpha])
                }
            }
        }
    }

    fn fill_triangle(&mut self, a: (f64, f64, [f64; 4]), b: (f64, f64, [f64; 4]), c: (f64, f64, [f64; 4])) {
        let denominator = (b.1 - c.1) * (a.0 - c.0) + (c.0 - b.0) * (a.1 - c.1);
        if denominator == 0.0 {
            return;
        }

        let min_x = a.0.min(b.0).min(c.0).floor().max(0.0) as usize;
        let max_x = (a.0.max(b.0).max(c.0).ceil() as i64).min(self.width as i64 - 1);
        let min_y = a.1.min(b.1).min(c.1).floor().max(0.0) as usize;
        let max_y = (a.1.max(b.1).max(c.1).ceil() as i64).min(self.height as i64 - 1);
        if max_x < 0 || max_y < 0 {
            return;
        }

        for row in min_y..=(max_y as usize) {
            for col in min_x..=(max_x as usize) {
                let px = col as f64 + 0.5;
                let py = row as f64 + 0.5;

                let l0 = ((b.1 - c.1) * (px - c.0) + (c.0 - b.0) * (py - c.1)) / denominator;
                let l1 = ((c.1 - a.1) * (px - c.0) + (a.0 - c.0) * (py - c.1)) / denominator;
                let l2 = 1.0 - l0 - l1;

                if l0 < 0.0 || l1 < 0.0 || l2 < 0.0 {
                    continue;
                }

                let varyings = [
                    l0*a.2[0] + l1*b.2[0] + l2*c.2[0],
                    l0*a.2[1] + l1*b.2[1] + l2*c.2[1],
                    l0*a.2[2] + l1*b.2[2] + l2*c.2[2],
                    l0*a.2[3] + l1*b.2[3] + l2*c.2[3],
                ];

                if let Some(color) = self.shade(px, py, varyings) {
                    self.blend_pixel(col, row, color);
                }
            }
        }
    }

    fn blend_pixel(&mut self, x: usize, y: usize, color: [u8; 4]) {
        let source_alpha = (color[3] as f32 / 255.0) * self.uniforms.opacity;
        if source_alpha <= 0.0 {
            return;
        }

        let idx     = (y * self.width + x) * 4;
        let inverse = 1.0 - source_alpha;

        for channel in 0..3 {
            let source = (color[channel] as f32) * source_alpha;
            let dest   = self.pixels[idx + channel] as f32;
            self.pixels[idx + channel] = (source + dest * inverse).round().min(255.0) as u8;
        }

        let dest_alpha = self.pixels[idx + 3] as f32;
        self.pixels[idx + 3] = (source_alpha * 255.0 + dest_alpha * inverse).round().min(255.0) as u8;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::vertex::*;

    fn upload_square() -> Vec<DrawCommand> {
        // A 10x10 square from (2, 2) as two polygon triangles
        let mut vertices = vec![];
        for (x, y) in [(2.0, 2.0), (12.0, 2.0), (12.0, 12.0), (2.0, 12.0)] {
            PolygonVertex::new(x, y).push_to(&mut vertices);
        }

        vec![
            DrawCommand::SetTransform(Transform::identity()),
            DrawCommand::UploadVertices { layout: VertexLayout::Polygon, vertices: Arc::new(vertices) },
            DrawCommand::UploadIndices(Arc::new(vec![0, 1, 2, 0, 2, 3])),
            DrawCommand::SetUniforms(Uniforms {
                fill_color:     Rgba([255, 0, 0, 255]),
                stroke_color:   Rgba([0, 0, 0, 0]),
                line_width:     0.0,
                miter_limit:    10.0,
                opacity:        1.0,
            }),
            DrawCommand::DrawIndexed { first: 0, count: 6 },
        ]
    }

    #[test]
    fn polygon_triangles_cover_their_interior() {
        let mut rasterizer = SoftwareRasterizer::new(16, 16);
        rasterizer.run(&upload_square());

        assert!(rasterizer.alpha_at(7, 7) == 255, "Interior not covered");
        assert!(rasterizer.alpha_at(0, 0) == 0, "Exterior covered");
    }

    #[test]
    fn repeated_runs_are_bit_identical() {
        let commands = upload_square();

        let mut first = SoftwareRasterizer::new(16, 16);
        first.run(&commands);
        let mut second = SoftwareRasterizer::new(16, 16);
        second.run(&commands);

        assert!(first.data() == second.data());
    }

    #[test]
    fn circle_fragments_discard_outside_the_radius() {
        let mut vertices = vec![];
        for corner in 0..4 {
            CircleVertex::new(8.0, 8.0, corner, 5.0).push_to(&mut vertices);
        }

        let mut rasterizer = SoftwareRasterizer::new(16, 16);
        rasterizer.run(&[
            DrawCommand::SetTransform(Transform::identity()),
            DrawCommand::UploadVertices { layout: VertexLayout::Circle, vertices: Arc::new(vertices) },
            DrawCommand::UploadIndices(Arc::new(vec![0, 1, 2, 0, 2, 3])),
            DrawCommand::SetUniforms(Uniforms {
                fill_color:     Rgba([0, 200, 0, 255]),
                stroke_color:   Rgba([0, 0, 0, 0]),
                line_width:     0.0,
                miter_limit:    10.0,
                opacity:        1.0,
            }),
            DrawCommand::DrawIndexed { first: 0, count: 6 },
        ]);

        assert!(rasterizer.alpha_at(8, 8) == 255, "Centre not covered");
        // The quad corner is inside the expanded geometry but outside the circle
        assert!(rasterizer.alpha_at(14, 14) == 0, "Fragment outside the radius survived");
    }

    #[test]
    fn textured_quads_sample_the_bound_texture() {
        let texture = ImageRaster::new(2, 1, vec![255, 0, 0, 255, 0, 0, 255, 255]);

        let mut vertices = vec![];
        for (offset_x, offset_y, u, v) in [(-4.0, -2.0, 0.0, 0.0), (4.0, -2.0, 1.0, 0.0), (4.0, 2.0, 1.0, 1.0), (-4.0, 2.0, 0.0, 1.0)] {
            TexturedVertex {
                pos:                [8.0, 8.0],
                offset:             [offset_x, offset_y],
                tex:                [u, v],
                opacity:            1.0,
                rotate_with_view:   0.0,
            }.push_to(&mut vertices);
        }

        let mut rasterizer = SoftwareRasterizer::new(16, 16);
        rasterizer.run(&[
            DrawCommand::SetTransform(Transform::identity()),
            DrawCommand::UploadVertices { layout: VertexLayout::Textured, vertices: Arc::new(vertices) },
            DrawCommand::UploadIndices(Arc::new(vec![0, 1, 2, 0, 2, 3])),
            DrawCommand::SetUniforms(Uniforms::transparent()),
            DrawCommand::BindTexture(texture),
            DrawCommand::DrawIndexed { first: 0, count: 6 },
        ]);

        // Left half red, right half blue
        assert!(rasterizer.pixel_at(5, 8)[0] == 255, "Left half not red: {:?}", rasterizer.pixel_at(5, 8));
        assert!(rasterizer.pixel_at(11, 8)[2] == 255, "Right half not blue: {:?}", rasterizer.pixel_at(11, 8));
    }
}
