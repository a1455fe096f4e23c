use crate::context::*;
use crate::label_cache::*;
use crate::replay::*;

use carta_geometry::flat;
use carta_geometry::*;
use carta_replay::*;

use itertools::Itertools;

use std::sync::Arc;

///
/// Records text labels into a raster replay
///
/// Point-placed labels rasterise once through the process-wide label cache and record a
/// single `DrawImage` stamp at a computed anchor: the point itself, a line's midpoint,
/// or a polygon's interior point. Line-placed labels record a `DrawChars` instruction
/// over the straightest chunk of the line instead, and are laid out glyph by glyph at
/// execution time so the letters follow the projected path of the current frame.
///
pub struct TextReplay {
    replay:     RasterReplay,
    text_style: Option<TextStyle>,
}

impl TextReplay {
    pub fn new(tolerance: f64, max_extent: Extent, resolution: f64, pixel_ratio: f64, overlaps: bool, rasterizer: Option<Arc<dyn LabelRasterizer>>) -> TextReplay {
        let mut replay          = RasterReplay::new(tolerance, max_extent, resolution, pixel_ratio, overlaps);
        replay.label_rasterizer = rasterizer;

        TextReplay {
            replay,
            text_style: None,
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
    /// Rasterises the current label and records a stamp of it anchored at x, y
    ///
    fn stamp_label_at(&mut self, x: f64, y: f64, feature: FeatureId) {
        let (style, rasterizer) = match (&self.text_style, &self.replay.label_rasterizer) {
            (Some(style), Some(rasterizer)) => (style.clone(), Arc::clone(rasterizer)),
            _                               => return,
        };
        if style.text.is_empty() {
            return;
        }

        let raster = match cached_label(rasterizer.as_ref(), &style.text, &style.font, style.fill.as_ref(), style.stroke.as_ref(), self.replay.pixel_ratio) {
            Some(raster)    => raster,
            None            => return,
        };

        // The raster was rendered at the pixel ratio; anchor within it per the style's
        // alignment, then shift by the style offsets (in label pixels)
        let width   = raster.width as f64;
        let height  = raster.height as f64;

        let anchor_x = match style.align {
            TextAlign::Left     => 0.0,
            TextAlign::Center   => width / 2.0,
            TextAlign::Right    => width,
        } - style.offset_x * self.replay.pixel_ratio;

        let anchor_y = match style.baseline {
            TextBaseline::Top           => 0.0,
            TextBaseline::Middle        => height / 2.0,
            TextBaseline::Alphabetic    => height * 0.8,
            TextBaseline::Bottom        => height,
        } - style.offset_y * self.replay.pixel_ratio;

        let image = ImageStyle {
            anchor:             (anchor_x, anchor_y),
            origin:             (0.0, 0.0),
            size:               (width, height),
            scale:              style.scale / self.replay.pixel_ratio,
            opacity:            1.0,
            rotation:           style.rotation,
            rotate_with_view:   style.rotate_with_view,
            snap_to_pixel:      true,
            raster,
        };

        self.replay.begin_geometry(feature);

        let run             = [x, y];
        let (begin, end)    = self.replay.append_coordinates(&run, 0, run.len(), 2, false, false);
        self.replay.instructions.push(Instruction::DrawImage { begin, end, image: image.clone() });
        self.replay.hit_instructions.push(Instruction::DrawImage { begin, end, image });

        self.replay.end_geometry(feature);
    }

    ///
    /// Records a glyph-by-glyph layout over the straightest chunk of a line
    ///
    fn draw_chars_along(&mut self, flat_coordinates: &[f64], offset: usize, end: usize, stride: usize, feature: FeatureId) {
        let style = match &self.text_style {
            Some(style) => style.clone(),
            None        => return,
        };
        if style.text.is_empty() || self.replay.label_rasterizer.is_none() {
            return;
        }

        // Letters must not rotate too far relative to one another: lay the label out
        // over the longest chunk whose turns stay under the style's max angle
        let (chunk_begin, chunk_end) = flat::matching_chunk(style.max_angle, flat_coordinates, offset, end, stride);
        if chunk_end <= chunk_begin {
            return;
        }

        let mut hit_style = style.clone();
        hit_style.fill      = hit_style.fill.map(|fill| fill.opaque());
        hit_style.stroke    = hit_style.stroke.map(|stroke| stroke.opaque());

        self.replay.begin_geometry(feature);

        let (begin, run_end) = self.replay.append_coordinates(flat_coordinates, chunk_begin, chunk_end, stride, false, false);
        self.replay.instructions.push(Instruction::DrawChars { begin, end: run_end, style });
        self.replay.hit_instructions.push(Instruction::DrawChars { begin, end: run_end, style: hit_style });

        self.replay.end_geometry(feature);
    }

    fn draw_flat_line(&mut self, flat_coordinates: &[f64], offset: usize, end: usize, stride: usize, feature: FeatureId) {
        let placement = match &self.text_style {
            Some(style) => style.placement,
            None        => return,
        };

        match placement {
            TextPlacement::Line     => self.draw_chars_along(flat_coordinates, offset, end, stride, feature),
            TextPlacement::Point    => {
                let (x, y) = point_along(flat_coordinates, offset, end, stride, 0.5);
                self.stamp_label_at(x, y, feature);
            }
        }
    }
}

impl GeometryRenderer for TextReplay {
    fn set_text_style(&mut self, text: TextStyle) {
        self.text_style = Some(text);
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
        let simplified  = line.simplified(self.replay.squared_tolerance());
        let flat        = simplified.base().flat_coordinates().to_vec();
        if flat.is_empty() {
            return;
        }

        let end = flat.len();
        self.draw_flat_line(&flat, 0, end, simplified.base().stride(), feature);
    }

    fn draw_multi_line_string(&mut self, lines: &MultiLineString, feature: FeatureId) {
        let simplified  = lines.simplified(self.replay.squared_tolerance());
        let flat        = simplified.base().flat_coordinates().to_vec();
        let stride      = simplified.base().stride();
        let ends        = simplified.ends().to_vec();

        let mut offset = 0;
        for end in ends {
            self.draw_flat_line(&flat, offset, end, stride, feature);
            offset = end;
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

///
/// The point a fraction of the way along a line string's length
///
fn point_along(flat_coordinates: &[f64], offset: usize, end: usize, stride: usize, fraction: f64) -> (f64, f64) {
    let total = flat::line_string_length(flat_coordinates, offset, end, stride);
    if total == 0.0 {
        return (flat_coordinates[offset], flat_coordinates[offset + 1]);
    }

    let target      = total * fraction;
    let mut walked  = 0.0;

    let mut idx = offset + stride;
    while idx < end {
        let x1 = flat_coordinates[idx - stride];
        let y1 = flat_coordinates[idx - stride + 1];
        let x2 = flat_coordinates[idx];
        let y2 = flat_coordinates[idx + 1];

        let segment = ((x2-x1)*(x2-x1) + (y2-y1)*(y2-y1)).sqrt();
        if walked + segment >= target && segment > 0.0 {
            let along = (target - walked) / segment;
            return (x1 + (x2-x1)*along, y1 + (y2-y1)*along);
        }

        walked += segment;
        idx += stride;
    }

    (flat_coordinates[end - stride], flat_coordinates[end - stride + 1])
}

///
/// Lays a `DrawChars` instruction out glyph by glyph along a projected line
///
/// Each glyph rasterises through the process-wide label cache and is emitted centred on
/// the path at its distance along it, rotated to its segment's direction. A label longer
/// than the path is dropped whole rather than clipped mid-word.
///
pub(crate) fn execute_draw_chars(
    pixel_coordinates: &[f64], begin: usize, end: usize,
    style: &TextStyle, rasterizer: &dyn LabelRasterizer, pixel_ratio: f64,
    emit: &mut dyn FnMut(&ImageRaster, ImagePlacement),
) {
    if end <= begin + 2 {
        return;
    }

    // Walk left to right so the glyphs read forwards
    let mut points = Vec::with_capacity((end - begin) / 2);
    let mut idx = begin;
    while idx < end {
        points.push((pixel_coordinates[idx], pixel_coordinates[idx + 1]));
        idx += 2;
    }
    if points[0].0 > points[points.len() - 1].0 {
        points.reverse();
    }

    let path_length: f64 = points.iter()
        .tuple_windows()
        .map(|((x1, y1), (x2, y2))| ((x2-x1)*(x2-x1) + (y2-y1)*(y2-y1)).sqrt())
        .sum();

    let (text_width, _) = rasterizer.measure(&style.text, &style.font);
    let text_width      = text_width * style.scale * pixel_ratio;
    if text_width > path_length || path_length == 0.0 {
        return;
    }

    let mut distance = match style.align {
        TextAlign::Left     => 0.0,
        TextAlign::Center   => (path_length - text_width) / 2.0,
        TextAlign::Right    => path_length - text_width,
    };

    for glyph in style.text.chars() {
        let glyph_text          = glyph.to_string();
        let (glyph_width, _)    = rasterizer.measure(&glyph_text, &style.font);
        let glyph_width         = glyph_width * style.scale * pixel_ratio;

        if let Some((x, y, angle)) = position_at(&points, distance + glyph_width / 2.0) {
            if let Some(raster) = cached_label(rasterizer, &glyph_text, &style.font, style.fill.as_ref(), style.stroke.as_ref(), pixel_ratio) {
                let width   = (raster.width as f64) * style.scale;
                let height  = (raster.height as f64) * style.scale;

                emit(&raster, ImagePlacement {
                    x,
                    y,
                    offset_x:       -width / 2.0,
                    offset_y:       -height / 2.0 - style.offset_y * pixel_ratio,
                    width,
                    height,
                    rotation:       angle + style.rotation,
                    opacity:        1.0,
                    snap_to_pixel:  false,
                    src_x:          0.0,
                    src_y:          0.0,
                    src_width:      raster.width as f64,
                    src_height:     raster.height as f64,
                });
            }
        }

        distance += glyph_width;
    }
}

///
/// The position and direction a distance along a polyline, or None past its end
///
fn position_at(points: &[(f64, f64)], distance: f64) -> Option<(f64, f64, f64)> {
    let mut walked = 0.0;

    for pair in points.windows(2) {
        let (x1, y1) = pair[0];
        let (x2, y2) = pair[1];

        let segment = ((x2-x1)*(x2-x1) + (y2-y1)*(y2-y1)).sqrt();
        if segment > 0.0 && walked + segment >= distance {
            let along = (distance - walked) / segment;
            return Some((x1 + (x2-x1)*along, y1 + (y2-y1)*along, (y2-y1).atan2(x2-x1)));
        }

        walked += segment;
    }

    None
}
