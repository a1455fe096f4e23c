use crate::context::*;
use crate::custom_replay::*;
use crate::declutter::*;
use crate::image_replay::*;
use crate::label_cache::*;
use crate::line_string_replay::*;
use crate::polygon_replay::*;
use crate::replay::*;
use crate::surface::*;
use crate::text_replay::*;

use carta_geometry::*;
use carta_replay::*;

use once_cell::sync::Lazy;

use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;
use std::sync::{Arc, Mutex};

///
/// One replay in a group, tagged by its drawing type
///
/// Circles share the polygon builder: both record path-and-fill instructions, a circle
/// just records a `Circle` subpath instead of ring subpaths.
///
pub enum RasterReplayEntry {
    Circle(PolygonReplay),
    Polygon(PolygonReplay),
    LineString(LineStringReplay),
    Image(ImageReplay),
    Text(TextReplay),
    Default(CustomReplay),
}

impl RasterReplayEntry {
    fn new(replay_type: ReplayType, tolerance: f64, max_extent: Extent, resolution: f64, pixel_ratio: f64, overlaps: bool, rasterizer: Option<Arc<dyn LabelRasterizer>>) -> RasterReplayEntry {
        match replay_type {
            ReplayType::Circle      => RasterReplayEntry::Circle(PolygonReplay::new(tolerance, max_extent, resolution, pixel_ratio, overlaps)),
            ReplayType::Polygon     => RasterReplayEntry::Polygon(PolygonReplay::new(tolerance, max_extent, resolution, pixel_ratio, overlaps)),
            ReplayType::LineString  => RasterReplayEntry::LineString(LineStringReplay::new(tolerance, max_extent, resolution, pixel_ratio, overlaps)),
            ReplayType::Image       => RasterReplayEntry::Image(ImageReplay::new(tolerance, max_extent, resolution, pixel_ratio, overlaps)),
            ReplayType::Text        => RasterReplayEntry::Text(TextReplay::new(tolerance, max_extent, resolution, pixel_ratio, overlaps, rasterizer)),
            ReplayType::Default     => RasterReplayEntry::Default(CustomReplay::new(tolerance, max_extent, resolution, pixel_ratio, overlaps)),
        }
    }

    ///
    /// The shared replay machinery behind this entry
    ///
    pub fn replay(&self) -> &RasterReplay {
        match self {
            RasterReplayEntry::Circle(replay)       => replay.replay(),
            RasterReplayEntry::Polygon(replay)      => replay.replay(),
            RasterReplayEntry::LineString(replay)   => replay.replay(),
            RasterReplayEntry::Image(replay)        => replay.replay(),
            RasterReplayEntry::Text(replay)         => replay.replay(),
            RasterReplayEntry::Default(replay)      => replay.replay(),
        }
    }

    pub fn replay_mut(&mut self) -> &mut RasterReplay {
        match self {
            RasterReplayEntry::Circle(replay)       => replay.replay_mut(),
            RasterReplayEntry::Polygon(replay)      => replay.replay_mut(),
            RasterReplayEntry::LineString(replay)   => replay.replay_mut(),
            RasterReplayEntry::Image(replay)        => replay.replay_mut(),
            RasterReplayEntry::Text(replay)         => replay.replay_mut(),
            RasterReplayEntry::Default(replay)      => replay.replay_mut(),
        }
    }

    ///
    /// Records a custom drawing; only valid on a `Default` entry
    ///
    pub fn draw_custom(&mut self, geometry: &Geometry, feature: FeatureId, renderer: Rc<CustomRenderer>) {
        match self {
            RasterReplayEntry::Default(replay)  => replay.draw_custom(geometry, feature, renderer),
            _                                   => panic!("Custom drawing is only supported by the Default drawing type"),
        }
    }
}

impl GeometryRenderer for RasterReplayEntry {
    fn set_fill_stroke_style(&mut self, fill: Option<FillStyle>, stroke: Option<StrokeStyle>) {
        match self {
            RasterReplayEntry::Circle(replay)       => replay.set_fill_stroke_style(fill, stroke),
            RasterReplayEntry::Polygon(replay)      => replay.set_fill_stroke_style(fill, stroke),
            RasterReplayEntry::LineString(replay)   => replay.set_fill_stroke_style(fill, stroke),
            RasterReplayEntry::Image(replay)        => replay.set_fill_stroke_style(fill, stroke),
            RasterReplayEntry::Text(replay)         => replay.set_fill_stroke_style(fill, stroke),
            RasterReplayEntry::Default(replay)      => replay.set_fill_stroke_style(fill, stroke),
        }
    }

    fn set_image_style(&mut self, image: ImageStyle) {
        match self {
            RasterReplayEntry::Image(replay)    => replay.set_image_style(image),
            other                               => other.replay_mut_panic("set_image_style"),
        }
    }

    fn set_text_style(&mut self, text: TextStyle) {
        match self {
            RasterReplayEntry::Text(replay) => replay.set_text_style(text),
            other                           => other.replay_mut_panic("set_text_style"),
        }
    }

    fn draw_point(&mut self, point: &Point, feature: FeatureId) {
        match self {
            RasterReplayEntry::Image(replay)    => replay.draw_point(point, feature),
            RasterReplayEntry::Text(replay)     => replay.draw_point(point, feature),
            other                               => other.replay_mut_panic("draw_point"),
        }
    }

    fn draw_multi_point(&mut self, points: &MultiPoint, feature: FeatureId) {
        match self {
            RasterReplayEntry::Image(replay)    => replay.draw_multi_point(points, feature),
            RasterReplayEntry::Text(replay)     => replay.draw_multi_point(points, feature),
            other                               => other.replay_mut_panic("draw_multi_point"),
        }
    }

    fn draw_line_string(&mut self, line: &LineString, feature: FeatureId) {
        match self {
            RasterReplayEntry::LineString(replay)   => replay.draw_line_string(line, feature),
            RasterReplayEntry::Text(replay)         => replay.draw_line_string(line, feature),
            other                                   => other.replay_mut_panic("draw_line_string"),
        }
    }

    fn draw_multi_line_string(&mut self, lines: &MultiLineString, feature: FeatureId) {
        match self {
            RasterReplayEntry::LineString(replay)   => replay.draw_multi_line_string(lines, feature),
            RasterReplayEntry::Text(replay)         => replay.draw_multi_line_string(lines, feature),
            other                                   => other.replay_mut_panic("draw_multi_line_string"),
        }
    }

    fn draw_polygon(&mut self, polygon: &Polygon, feature: FeatureId) {
        match self {
            RasterReplayEntry::Polygon(replay)  => replay.draw_polygon(polygon, feature),
            RasterReplayEntry::Text(replay)     => replay.draw_polygon(polygon, feature),
            other                               => other.replay_mut_panic("draw_polygon"),
        }
    }

    fn draw_multi_polygon(&mut self, polygons: &MultiPolygon, feature: FeatureId) {
        match self {
            RasterReplayEntry::Polygon(replay)  => replay.draw_multi_polygon(polygons, feature),
            RasterReplayEntry::Text(replay)     => replay.draw_multi_polygon(polygons, feature),
            other                               => other.replay_mut_panic("draw_multi_polygon"),
        }
    }

    fn draw_circle(&mut self, circle: &Circle, feature: FeatureId) {
        match self {
            RasterReplayEntry::Circle(replay)   => replay.draw_circle(circle, feature),
            RasterReplayEntry::Polygon(replay)  => replay.draw_circle(circle, feature),
            other                               => other.replay_mut_panic("draw_circle"),
        }
    }
}

impl RasterReplayEntry {
    fn replay_mut_panic(&mut self, operation: &str) -> ! {
        let name = match self {
            RasterReplayEntry::Circle(_)        => "Circle",
            RasterReplayEntry::Polygon(_)       => "Polygon",
            RasterReplayEntry::LineString(_)    => "LineString",
            RasterReplayEntry::Image(_)         => "Image",
            RasterReplayEntry::Text(_)          => "Text",
            RasterReplayEntry::Default(_)       => "Default",
        };
        panic!("{} is not supported by the {} drawing type", operation, name);
    }
}

///
/// Circular pixel masks for hit probes, keyed by tolerance in pixels
///
static MASK_CACHE: Lazy<Mutex<HashMap<usize, Arc<Vec<bool>>>>> = Lazy::new(|| Mutex::new(HashMap::new()));

fn circular_mask(tolerance: usize) -> Arc<Vec<bool>> {
    let mut cache = MASK_CACHE.lock().unwrap();

    Arc::clone(cache.entry(tolerance).or_insert_with(|| {
        let side        = 2 * tolerance + 1;
        let radius      = tolerance as f64;
        let mut mask    = Vec::with_capacity(side * side);

        for row in 0..side {
            for col in 0..side {
                let dx = col as f64 - radius;
                let dy = row as f64 - radius;
                mask.push(dx*dx + dy*dy <= radius*radius + 0.25);
            }
        }

        Arc::new(mask)
    }))
}

///
/// All the replays of one render pass, keyed by z-index and drawing type
///
/// A group is populated during a single pass over the features, sealed once with
/// `finish`, and then replayed as many times as frames need it. Drawing iterates
/// z-indices ascending with the drawing types in painter's order inside each; hit
/// detection iterates both in reverse so the topmost feature wins.
///
pub struct RasterReplayGroup {
    tolerance:          f64,
    max_extent:         Extent,
    resolution:         f64,
    pixel_ratio:        f64,
    overlaps:           bool,
    declutter:          bool,
    label_rasterizer:   Option<Arc<dyn LabelRasterizer>>,
    replays:            BTreeMap<ZIndex, HashMap<ReplayType, RasterReplayEntry>>,
}

impl RasterReplayGroup {
    ///
    /// Creates an empty group for one render pass
    ///
    pub fn new(tolerance: f64, max_extent: Extent, resolution: f64, pixel_ratio: f64, overlaps: bool, declutter: bool, label_rasterizer: Option<Arc<dyn LabelRasterizer>>) -> RasterReplayGroup {
        // The shared label cache prunes opportunistically here, once per pass
        LABEL_CACHE.lock().unwrap().prune();

        RasterReplayGroup {
            tolerance,
            max_extent,
            resolution,
            pixel_ratio,
            overlaps,
            declutter,
            label_rasterizer,
            replays: BTreeMap::new(),
        }
    }

    ///
    /// Returns the replay for a (z-index, drawing-type) bucket, creating it on first use
    ///
    pub fn get_replay(&mut self, z_index: ZIndex, replay_type: ReplayType) -> &mut RasterReplayEntry {
        let tolerance   = self.tolerance;
        let max_extent  = self.max_extent;
        let resolution  = self.resolution;
        let pixel_ratio = self.pixel_ratio;
        let overlaps    = self.overlaps;
        let rasterizer  = self.label_rasterizer.clone();

        self.replays
            .entry(z_index)
            .or_insert_with(HashMap::new)
            .entry(replay_type)
            .or_insert_with(|| RasterReplayEntry::new(replay_type, tolerance, max_extent, resolution, pixel_ratio, overlaps, rasterizer))
    }

    ///
    /// True if nothing was recorded into any replay
    ///
    pub fn is_empty(&self) -> bool {
        self.replays.values().all(|types| types.values().all(|entry| entry.replay().is_empty()))
    }

    ///
    /// Seals every replay, making the group executable
    ///
    pub fn finish(&mut self) {
        for types in self.replays.values_mut() {
            for entry in types.values_mut() {
                entry.replay_mut().finish();
            }
        }
    }

    ///
    /// Replays every bucket in z-index/painter order, composing one frame
    ///
    /// With declutter enabled, image and text drawing defers into per-feature groups
    /// and flushes once at the end of the frame, so collision avoidance sees the whole
    /// frame's candidates before anything is stamped.
    ///
    pub fn replay(&self, context: &mut dyn RasterContext, transform: &Transform, view_rotation: f64, skipped: &FeatureSkipSet, order: Option<&[ReplayType]>) {
        let order = order.unwrap_or(&REPLAY_ORDER);

        let mut deferred: Vec<DeclutterGroup> = vec![];

        for types in self.replays.values() {
            for replay_type in order {
                if let Some(entry) = types.get(replay_type) {
                    let defers = self.declutter && matches!(replay_type, ReplayType::Image | ReplayType::Text);

                    if defers {
                        entry.replay().replay(context, transform, view_rotation, skipped, Some(&mut deferred));
                    } else {
                        entry.replay().replay(context, transform, view_rotation, skipped, None);
                    }
                }
            }
        }

        if !deferred.is_empty() {
            let mut tree = DeclutterTree::new();
            flush_declutter_groups(context, &deferred, &mut tree);
        }
    }

    ///
    /// Finds the topmost feature within `hit_tolerance` pixels of a coordinate
    ///
    /// Each candidate feature's hit tape renders into a small offscreen surface centred
    /// on the probe; the first feature leaving alpha inside the circular tolerance mask
    /// wins. `callback` can veto a candidate by returning `None` (eg, for a layer
    /// filter), letting the scan continue underneath it.
    ///
    pub fn for_each_feature_at_coordinate<T>(
        &self,
        coordinate: (f64, f64),
        resolution: f64,
        rotation: f64,
        hit_tolerance: f64,
        skipped: &FeatureSkipSet,
        mut callback: impl FnMut(FeatureId) -> Option<T>,
    ) -> Option<T> {
        let tolerance   = hit_tolerance.max(0.0).round() as usize;
        let side        = 2 * tolerance + 1;
        let mask        = circular_mask(tolerance);

        let mut surface = SoftwareSurface::new(side, side);

        // Centre the probe coordinate on the centre pixel of the surface
        let center      = tolerance as f64 + 0.5;
        let transform   = Transform::compose(center, center, 1.0 / resolution, -1.0 / resolution, -rotation)
            .multiply(&Transform::translation(-coordinate.0, -coordinate.1));

        for (_, types) in self.replays.iter().rev() {
            for replay_type in HIT_DETECT_ORDER.iter() {
                if let Some(entry) = types.get(replay_type) {
                    let result = entry.replay().replay_hit_detection(&mut surface, &transform, rotation, skipped, &mut |context, feature| {
                        let hit = mask.iter().enumerate().any(|(index, masked)| {
                            *masked && context.alpha_at(index % side, index / side) > 0
                        });
                        context.clear();

                        if hit {
                            callback(feature)
                        } else {
                            None
                        }
                    });

                    if result.is_some() {
                        return result;
                    }
                }
            }
        }

        None
    }

    ///
    /// True if any feature is within `hit_tolerance` pixels of the coordinate
    ///
    pub fn has_feature_at_coordinate(&self, coordinate: (f64, f64), resolution: f64, rotation: f64, hit_tolerance: f64, skipped: &FeatureSkipSet) -> bool {
        self.for_each_feature_at_coordinate(coordinate, resolution, rotation, hit_tolerance, skipped, |_| Some(())).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_replay_returns_the_same_bucket() {
        let mut group = RasterReplayGroup::new(0.0, Extent::empty(), 1.0, 1.0, false, false, None);

        group.get_replay(ZIndex(1.0), ReplayType::Polygon)
            .set_fill_stroke_style(Some(FillStyle::Color(Rgba([255, 0, 0, 255]))), None);
        let polygon = Polygon::from_rings(&[vec![[0.0, 0.0], [4.0, 0.0], [4.0, 4.0], [0.0, 4.0]]]);
        group.get_replay(ZIndex(1.0), ReplayType::Polygon).draw_polygon(&polygon, FeatureId(1));

        assert!(!group.is_empty());
        assert!(group.replays.len() == 1);
    }

    #[test]
    fn circular_mask_covers_the_centre_and_not_the_corners() {
        let mask = circular_mask(3);
        let side = 7;

        assert!(mask[3 * side + 3], "Centre pixel not masked");
        assert!(!mask[0], "Corner pixel masked");
    }
}
