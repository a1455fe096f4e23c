use crate::atlas::*;
use crate::circle_replay::*;
use crate::command::*;
use crate::image_replay::*;
use crate::line_string_replay::*;
use crate::polygon_replay::*;
use crate::software_rasterizer::*;
use crate::text_replay::*;

use carta_geometry::*;
use carta_replay::*;

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

///
/// One replay in a GPU group, tagged by its drawing type
///
/// The `Default` drawing type has no GPU rendition: custom render functions draw
/// through the raster backend, and asking this backend for one is a wiring bug.
///
pub enum GpuReplayEntry {
    Circle(CircleReplay),
    Polygon(PolygonReplay),
    LineString(LineStringReplay),
    Image(ImageReplay),
    Text(TextReplay),
}

impl GpuReplayEntry {
    fn new(replay_type: ReplayType, origin: (f64, f64), tolerance: f64, pixel_ratio: f64, glyphs: Option<Arc<dyn GlyphRasterizer>>) -> GpuReplayEntry {
        match replay_type {
            ReplayType::Circle      => GpuReplayEntry::Circle(CircleReplay::new(origin, tolerance)),
            ReplayType::Polygon     => GpuReplayEntry::Polygon(PolygonReplay::new(origin, tolerance)),
            ReplayType::LineString  => GpuReplayEntry::LineString(LineStringReplay::new(origin, tolerance)),
            ReplayType::Image       => GpuReplayEntry::Image(ImageReplay::new(origin, pixel_ratio)),
            ReplayType::Text        => GpuReplayEntry::Text(TextReplay::new(origin, pixel_ratio, glyphs)),
            ReplayType::Default     => panic!("The Default drawing type is not supported by the GPU backend"),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            GpuReplayEntry::Circle(replay)      => replay.is_empty(),
            GpuReplayEntry::Polygon(replay)     => replay.is_empty(),
            GpuReplayEntry::LineString(replay)  => replay.is_empty(),
            GpuReplayEntry::Image(replay)       => replay.is_empty(),
            GpuReplayEntry::Text(replay)        => replay.is_empty(),
        }
    }

    pub fn finish(&mut self) {
        match self {
            GpuReplayEntry::Circle(replay)      => replay.finish(),
            GpuReplayEntry::Polygon(replay)     => replay.finish(),
            GpuReplayEntry::LineString(replay)  => replay.finish(),
            GpuReplayEntry::Image(replay)       => replay.finish(),
            GpuReplayEntry::Text(replay)        => replay.finish(),
        }
    }

    pub fn replay(&self, transform: &Transform, view_rotation: f64, skipped: &FeatureSkipSet) -> Vec<DrawCommand> {
        match self {
            GpuReplayEntry::Circle(replay)      => replay.replay(transform, view_rotation, skipped),
            GpuReplayEntry::Polygon(replay)     => replay.replay(transform, view_rotation, skipped),
            GpuReplayEntry::LineString(replay)  => replay.replay(transform, view_rotation, skipped),
            GpuReplayEntry::Image(replay)       => replay.replay(transform, view_rotation, skipped),
            GpuReplayEntry::Text(replay)        => replay.replay(transform, view_rotation, skipped),
        }
    }

    pub fn features_reversed(&self) -> Vec<FeatureId> {
        match self {
            GpuReplayEntry::Circle(replay)      => replay.features_reversed(),
            GpuReplayEntry::Polygon(replay)     => replay.features_reversed(),
            GpuReplayEntry::LineString(replay)  => replay.features_reversed(),
            GpuReplayEntry::Image(replay)       => replay.features_reversed(),
            GpuReplayEntry::Text(replay)        => replay.features_reversed(),
        }
    }

    pub fn commands_for_feature(&self, feature: FeatureId, transform: &Transform, view_rotation: f64) -> Vec<DrawCommand> {
        match self {
            GpuReplayEntry::Circle(replay)      => replay.commands_for_feature(feature, transform, view_rotation),
            GpuReplayEntry::Polygon(replay)     => replay.commands_for_feature(feature, transform, view_rotation),
            GpuReplayEntry::LineString(replay)  => replay.commands_for_feature(feature, transform, view_rotation),
            GpuReplayEntry::Image(replay)       => replay.commands_for_feature(feature, transform, view_rotation),
            GpuReplayEntry::Text(replay)        => replay.commands_for_feature(feature, transform, view_rotation),
        }
    }
}

impl GeometryRenderer for GpuReplayEntry {
    fn set_fill_stroke_style(&mut self, fill: Option<FillStyle>, stroke: Option<StrokeStyle>) {
        match self {
            GpuReplayEntry::Circle(replay)      => replay.set_fill_stroke_style(fill, stroke),
            GpuReplayEntry::Polygon(replay)     => replay.set_fill_stroke_style(fill, stroke),
            GpuReplayEntry::LineString(replay)  => replay.set_fill_stroke_style(fill, stroke),
            GpuReplayEntry::Image(replay)       => replay.set_fill_stroke_style(fill, stroke),
            GpuReplayEntry::Text(replay)        => replay.set_fill_stroke_style(fill, stroke),
        }
    }

    fn set_image_style(&mut self, image: ImageStyle) {
        match self {
            GpuReplayEntry::Image(replay)   => replay.set_image_style(image),
            _                               => panic!("set_image_style is only supported by the Image drawing type"),
        }
    }

    fn set_text_style(&mut self, text: TextStyle) {
        match self {
            GpuReplayEntry::Text(replay)    => replay.set_text_style(text),
            _                               => panic!("set_text_style is only supported by the Text drawing type"),
        }
    }

    fn draw_point(&mut self, point: &Point, feature: FeatureId) {
        match self {
            GpuReplayEntry::Image(replay)   => replay.draw_point(point, feature),
            GpuReplayEntry::Text(replay)    => replay.draw_point(point, feature),
            _                               => panic!("draw_point is only supported by the Image and Text drawing types"),
        }
    }

    fn draw_multi_point(&mut self, points: &MultiPoint, feature: FeatureId) {
        match self {
            GpuReplayEntry::Image(replay)   => replay.draw_multi_point(points, feature),
            GpuReplayEntry::Text(replay)    => replay.draw_multi_point(points, feature),
            _                               => panic!("draw_multi_point is only supported by the Image and Text drawing types"),
        }
    }

    fn draw_line_string(&mut self, line: &LineString, feature: FeatureId) {
        match self {
            GpuReplayEntry::LineString(replay)  => replay.draw_line_string(line, feature),
            GpuReplayEntry::Text(replay)        => replay.draw_line_string(line, feature),
            _                                   => panic!("draw_line_string is only supported by the LineString and Text drawing types"),
        }
    }

    fn draw_multi_line_string(&mut self, lines: &MultiLineString, feature: FeatureId) {
        match self {
            GpuReplayEntry::LineString(replay)  => replay.draw_multi_line_string(lines, feature),
            GpuReplayEntry::Text(replay)        => replay.draw_multi_line_string(lines, feature),
            _                                   => panic!("draw_multi_line_string is only supported by the LineString and Text drawing types"),
        }
    }

    fn draw_polygon(&mut self, polygon: &Polygon, feature: FeatureId) {
        match self {
            GpuReplayEntry::Polygon(replay) => replay.draw_polygon(polygon, feature),
            GpuReplayEntry::Text(replay)    => replay.draw_polygon(polygon, feature),
            _                               => panic!("draw_polygon is only supported by the Polygon and Text drawing types"),
        }
    }

    fn draw_multi_polygon(&mut self, polygons: &MultiPolygon, feature: FeatureId) {
        match self {
            GpuReplayEntry::Polygon(replay) => replay.draw_multi_polygon(polygons, feature),
            GpuReplayEntry::Text(replay)    => replay.draw_multi_polygon(polygons, feature),
            _                               => panic!("draw_multi_polygon is only supported by the Polygon and Text drawing types"),
        }
    }

    fn draw_circle(&mut self, circle: &Circle, feature: FeatureId) {
        match self {
            GpuReplayEntry::Circle(replay)  => replay.draw_circle(circle, feature),
            _                               => panic!("draw_circle is only supported by the Circle drawing type"),
        }
    }
}

///
/// All the GPU replays of one render pass, keyed by z-index and drawing type
///
/// `replay` concatenates every bucket's command stream in z-index/painter order into
/// one frame's stream; hit detection runs candidate features one at a time through a
/// 1x1 software framebuffer and reads back the single alpha value, descending z-order
/// so the topmost feature wins.
///
pub struct GpuReplayGroup {
    tolerance:          f64,
    pixel_ratio:        f64,
    origin:             (f64, f64),
    glyph_rasterizer:   Option<Arc<dyn GlyphRasterizer>>,
    replays:            BTreeMap<ZIndex, HashMap<ReplayType, GpuReplayEntry>>,
}

impl GpuReplayGroup {
    ///
    /// Creates an empty group for one render pass
    ///
    /// Vertex positions are stored relative to the max extent's corner: map coordinates
    /// can exceed what an f32 holds precisely, offsets within a viewport cannot.
    ///
    pub fn new(tolerance: f64, max_extent: Extent, pixel_ratio: f64, glyph_rasterizer: Option<Arc<dyn GlyphRasterizer>>) -> GpuReplayGroup {
        let origin = if max_extent.is_empty() {
            (0.0, 0.0)
        } else {
            (max_extent.min_x, max_extent.min_y)
        };

        GpuReplayGroup {
            tolerance,
            pixel_ratio,
            origin,
            glyph_rasterizer,
            replays: BTreeMap::new(),
        }
    }

    ///
    /// Returns the replay for a (z-index, drawing-type) bucket, creating it on first use
    ///
    pub fn get_replay(&mut self, z_index: ZIndex, replay_type: ReplayType) -> &mut GpuReplayEntry {
        let origin      = self.origin;
        let tolerance   = self.tolerance;
        let pixel_ratio = self.pixel_ratio;
        let glyphs      = self.glyph_rasterizer.clone();

        self.replays
            .entry(z_index)
            .or_insert_with(HashMap::new)
            .entry(replay_type)
            .or_insert_with(|| GpuReplayEntry::new(replay_type, origin, tolerance, pixel_ratio, glyphs))
    }

    pub fn is_empty(&self) -> bool {
        self.replays.values().all(|types| types.values().all(|entry| entry.is_empty()))
    }

    ///
    /// Freezes every replay's buffers for upload
    ///
    pub fn finish(&mut self) {
        for types in self.replays.values_mut() {
            for entry in types.values_mut() {
                entry.finish();
            }
        }
    }

    ///
    /// Compiles one frame's draw command stream in z-index/painter order
    ///
    pub fn replay(&self, transform: &Transform, view_rotation: f64, skipped: &FeatureSkipSet, order: Option<&[ReplayType]>) -> Vec<DrawCommand> {
        let order = order.unwrap_or(&REPLAY_ORDER);

        let mut commands = vec![];
        for types in self.replays.values() {
            for replay_type in order {
                if let Some(entry) = types.get(replay_type) {
                    commands.extend(entry.replay(transform, view_rotation, skipped));
                }
            }
        }
        commands
    }

    ///
    /// Finds the topmost feature drawn at a coordinate
    ///
    /// Candidate features render one at a time into a 1x1 framebuffer whose single
    /// pixel is the probe point; the first non-zero alpha wins. `callback` can veto a
    /// candidate by returning `None`, letting the scan continue underneath it.
    ///
    pub fn for_each_feature_at_coordinate<T>(
        &self,
        coordinate: (f64, f64),
        resolution: f64,
        rotation: f64,
        skipped: &FeatureSkipSet,
        mut callback: impl FnMut(FeatureId) -> Option<T>,
    ) -> Option<T> {
        // The probe coordinate lands on the centre of the one and only pixel
        let transform = Transform::compose(0.5, 0.5, 1.0 / resolution, -1.0 / resolution, -rotation)
            .multiply(&Transform::translation(-coordinate.0, -coordinate.1));

        let mut framebuffer = SoftwareRasterizer::new(1, 1);

        for (_, types) in self.replays.iter().rev() {
            for replay_type in HIT_DETECT_ORDER.iter() {
                if let Some(entry) = types.get(replay_type) {
                    for feature in entry.features_reversed() {
                        if skipped.contains(&feature) {
                            continue;
                        }

                        framebuffer.clear();
                        framebuffer.run(&entry.commands_for_feature(feature, &transform, rotation));

                        if framebuffer.alpha_at(0, 0) > 0 {
                            if let Some(result) = callback(feature) {
                                return Some(result);
                            }
                        }
                    }
                }
            }
        }

        None
    }

    ///
    /// True if any feature is drawn at the coordinate
    ///
    pub fn has_feature_at_coordinate(&self, coordinate: (f64, f64), resolution: f64, rotation: f64, skipped: &FeatureSkipSet) -> bool {
        self.for_each_feature_at_coordinate(coordinate, resolution, rotation, skipped, |_| Some(())).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_replay_returns_the_same_bucket() {
        let mut group = GpuReplayGroup::new(0.0, Extent::new(0.0, 0.0, 100.0, 100.0), 1.0, None);

        group.get_replay(ZIndex(0.0), ReplayType::Polygon)
            .set_fill_stroke_style(Some(FillStyle::Color(Rgba([255, 0, 0, 255]))), None);
        let polygon = Polygon::from_rings(&[vec![[0.0, 0.0], [4.0, 0.0], [4.0, 4.0], [0.0, 4.0]]]);
        group.get_replay(ZIndex(0.0), ReplayType::Polygon).draw_polygon(&polygon, FeatureId(1));

        assert!(!group.is_empty());
    }

    #[test]
    #[should_panic]
    fn the_default_drawing_type_is_a_wiring_bug() {
        let mut group = GpuReplayGroup::new(0.0, Extent::empty(), 1.0, None);
        group.get_replay(ZIndex(0.0), ReplayType::Default);
    }
}
