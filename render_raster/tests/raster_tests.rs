//!
//! Pipeline-shaped tests for the raster backend: record replays from geometries the way
//! a layer renderer would, seal them, then execute against the software surface and
//! assert on pixels and hit results.
//!

use carta_geometry::*;
use carta_render_raster::*;
use carta_replay::*;

use std::sync::Arc;

fn identity_pass() -> (Transform, FeatureSkipSet) {
    (Transform::identity(), FeatureSkipSet::new())
}

#[test]
fn filled_polygon_replays_onto_the_surface() {
    let mut group = RasterReplayGroup::new(0.0, Extent::new(0.0, 0.0, 64.0, 64.0), 1.0, 1.0, false, false, None);

    let replay = group.get_replay(ZIndex(0.0), ReplayType::Polygon);
    replay.set_fill_stroke_style(Some(FillStyle::Color(Rgba([200, 0, 0, 255]))), None);
    let polygon = Polygon::from_rings(&[vec![[10.0, 10.0], [50.0, 10.0], [50.0, 50.0], [10.0, 50.0]]]);
    replay.draw_polygon(&polygon, FeatureId(1));

    group.finish();

    let mut surface             = SoftwareSurface::new(64, 64);
    let (transform, skipped)    = identity_pass();
    group.replay(&mut surface, &transform, 0.0, &skipped, None);

    assert!(surface.alpha_at(30, 30) == 255, "Interior not filled");
    assert!(surface.alpha_at(5, 5) == 0, "Exterior filled");
}

#[test]
fn polygon_holes_stay_open() {
    let mut group = RasterReplayGroup::new(0.0, Extent::new(0.0, 0.0, 64.0, 64.0), 1.0, 1.0, false, false, None);

    let replay = group.get_replay(ZIndex(0.0), ReplayType::Polygon);
    replay.set_fill_stroke_style(Some(FillStyle::Color(Rgba([0, 0, 200, 255]))), None);
    let polygon = Polygon::from_rings(&[
        vec![[10.0, 10.0], [50.0, 10.0], [50.0, 50.0], [10.0, 50.0]],
        vec![[25.0, 25.0], [35.0, 25.0], [35.0, 35.0], [25.0, 35.0]],
    ]);
    replay.draw_polygon(&polygon, FeatureId(1));

    group.finish();

    let mut surface             = SoftwareSurface::new(64, 64);
    let (transform, skipped)    = identity_pass();
    group.replay(&mut surface, &transform, 0.0, &skipped, None);

    assert!(surface.alpha_at(15, 15) == 255, "Ring not filled");
    assert!(surface.alpha_at(30, 30) == 0, "Hole was filled");
}

#[test]
fn clipped_off_extent_stroke_draws_nothing_visible() {
    // A stroked line fully outside the clip extent: the tape stays bounded and the
    // surface stays empty
    let mut group = RasterReplayGroup::new(0.0, Extent::new(0.0, 0.0, 32.0, 32.0), 1.0, 1.0, false, false, None);

    let replay = group.get_replay(ZIndex(0.0), ReplayType::LineString);
    replay.set_fill_stroke_style(None, Some(StrokeStyle::new(Rgba([0, 0, 0, 255]), 2.0)));
    let coordinates = (0..200).map(|idx| [100.0 + idx as f64, 500.0]).collect::<Vec<_>>();
    replay.draw_line_string(&LineString::from_coordinates(&coordinates), FeatureId(1));

    assert!(replay.replay().coordinates().len() <= 4, "Tape not bounded: {} coordinates", replay.replay().coordinates().len());

    group.finish();

    let mut surface             = SoftwareSurface::new(32, 32);
    let (transform, skipped)    = identity_pass();
    group.replay(&mut surface, &transform, 0.0, &skipped, None);

    assert!(surface.data().iter().all(|byte| *byte == 0), "Off-extent stroke drew pixels");
}

#[test]
fn replaying_twice_is_bit_identical() {
    let mut group = RasterReplayGroup::new(0.0, Extent::new(0.0, 0.0, 48.0, 48.0), 1.0, 1.0, false, false, None);

    let replay = group.get_replay(ZIndex(0.0), ReplayType::Polygon);
    replay.set_fill_stroke_style(
        Some(FillStyle::Color(Rgba([40, 90, 120, 180]))),
        Some(StrokeStyle::new(Rgba([0, 0, 0, 255]), 3.0)),
    );
    let polygon = Polygon::from_rings(&[vec![[8.0, 8.0], [40.0, 12.0], [36.0, 40.0], [6.0, 30.0]]]);
    replay.draw_polygon(&polygon, FeatureId(1));

    group.finish();

    let transform   = Transform::compose(2.0, 1.0, 1.0, 1.0, 0.1);
    let skipped     = FeatureSkipSet::new();

    let mut first = SoftwareSurface::new(48, 48);
    group.replay(&mut first, &transform, 0.0, &skipped, None);
    let mut second = SoftwareSurface::new(48, 48);
    group.replay(&mut second, &transform, 0.0, &skipped, None);

    assert!(first.data() == second.data());
}

#[test]
fn skipped_features_are_not_drawn() {
    let mut group = RasterReplayGroup::new(0.0, Extent::new(0.0, 0.0, 64.0, 64.0), 1.0, 1.0, false, false, None);

    let replay = group.get_replay(ZIndex(0.0), ReplayType::Polygon);
    replay.set_fill_stroke_style(Some(FillStyle::Color(Rgba([255, 0, 0, 255]))), None);
    replay.draw_polygon(&Polygon::from_rings(&[vec![[0.0, 0.0], [20.0, 0.0], [20.0, 20.0], [0.0, 20.0]]]), FeatureId(1));
    replay.draw_polygon(&Polygon::from_rings(&[vec![[30.0, 30.0], [50.0, 30.0], [50.0, 50.0], [30.0, 50.0]]]), FeatureId(2));

    group.finish();

    let mut skipped = FeatureSkipSet::new();
    skipped.insert(FeatureId(1));

    let mut surface = SoftwareSurface::new(64, 64);
    group.replay(&mut surface, &Transform::identity(), 0.0, &skipped, None);

    assert!(surface.alpha_at(10, 10) == 0, "Skipped feature was drawn");
    assert!(surface.alpha_at(40, 40) == 255, "Unskipped feature missing");
}

#[test]
fn hit_detection_reports_the_topmost_feature() {
    let mut group = RasterReplayGroup::new(0.0, Extent::new(0.0, 0.0, 64.0, 64.0), 1.0, 1.0, false, false, None);

    // Two overlapping squares on different z-indices
    let bottom = group.get_replay(ZIndex(0.0), ReplayType::Polygon);
    bottom.set_fill_stroke_style(Some(FillStyle::Color(Rgba([255, 0, 0, 255]))), None);
    bottom.draw_polygon(&Polygon::from_rings(&[vec![[0.0, 0.0], [40.0, 0.0], [40.0, 40.0], [0.0, 40.0]]]), FeatureId(1));

    let top = group.get_replay(ZIndex(5.0), ReplayType::Polygon);
    top.set_fill_stroke_style(Some(FillStyle::Color(Rgba([0, 255, 0, 64]))), None);
    top.draw_polygon(&Polygon::from_rings(&[vec![[20.0, 20.0], [60.0, 20.0], [60.0, 60.0], [20.0, 60.0]]]), FeatureId(2));

    group.finish();

    let skipped = FeatureSkipSet::new();

    // Inside both: the higher z-index (even though translucent) wins
    let hit = group.for_each_feature_at_coordinate((30.0, 30.0), 1.0, 0.0, 2.0, &skipped, Some);
    assert!(hit == Some(FeatureId(2)), "Unexpected hit: {:?}", hit);

    // Inside only the bottom square
    let hit = group.for_each_feature_at_coordinate((10.0, 10.0), 1.0, 0.0, 2.0, &skipped, Some);
    assert!(hit == Some(FeatureId(1)), "Unexpected hit: {:?}", hit);

    // Outside everything
    let hit = group.for_each_feature_at_coordinate((63.0, 5.0), 1.0, 0.0, 2.0, &skipped, Some);
    assert!(hit == None, "Unexpected hit: {:?}", hit);
}

#[test]
fn hit_detection_sees_stroke_only_polygons_across_their_interior() {
    let mut group = RasterReplayGroup::new(0.0, Extent::new(0.0, 0.0, 64.0, 64.0), 1.0, 1.0, false, false, None);

    let replay = group.get_replay(ZIndex(0.0), ReplayType::Polygon);
    replay.set_fill_stroke_style(None, Some(StrokeStyle::new(Rgba([0, 0, 0, 255]), 1.0)));
    replay.draw_polygon(&Polygon::from_rings(&[vec![[10.0, 10.0], [50.0, 10.0], [50.0, 50.0], [10.0, 50.0]]]), FeatureId(7));

    group.finish();

    // The probe is far from the outline but inside the ring: the forced opaque hit
    // fill must still report it
    let hit = group.for_each_feature_at_coordinate((30.0, 30.0), 1.0, 0.0, 2.0, &FeatureSkipSet::new(), Some);
    assert!(hit == Some(FeatureId(7)), "Unexpected hit: {:?}", hit);
}

#[test]
fn hit_detection_respects_the_skip_set() {
    let mut group = RasterReplayGroup::new(0.0, Extent::new(0.0, 0.0, 64.0, 64.0), 1.0, 1.0, false, false, None);

    let replay = group.get_replay(ZIndex(0.0), ReplayType::Polygon);
    replay.set_fill_stroke_style(Some(FillStyle::Color(Rgba([255, 0, 0, 255]))), None);
    replay.draw_polygon(&Polygon::from_rings(&[vec![[0.0, 0.0], [40.0, 0.0], [40.0, 40.0], [0.0, 40.0]]]), FeatureId(1));

    group.finish();

    let mut skipped = FeatureSkipSet::new();
    skipped.insert(FeatureId(1));

    let hit = group.for_each_feature_at_coordinate((20.0, 20.0), 1.0, 0.0, 2.0, &skipped, Some);
    assert!(hit == None, "Skipped feature was hit: {:?}", hit);
}

#[test]
fn circles_fill_and_hit_analytically() {
    let mut group = RasterReplayGroup::new(0.0, Extent::new(0.0, 0.0, 64.0, 64.0), 1.0, 1.0, false, false, None);

    let replay = group.get_replay(ZIndex(0.0), ReplayType::Circle);
    replay.set_fill_stroke_style(Some(FillStyle::Color(Rgba([0, 120, 0, 255]))), None);
    replay.draw_circle(&Circle::new(32.0, 32.0, 10.0), FeatureId(3));

    group.finish();

    let mut surface = SoftwareSurface::new(64, 64);
    group.replay(&mut surface, &Transform::identity(), 0.0, &FeatureSkipSet::new(), None);

    assert!(surface.alpha_at(32, 32) == 255, "Circle centre not filled");
    assert!(surface.alpha_at(32, 45) == 0, "Beyond the radius was filled");

    let hit = group.for_each_feature_at_coordinate((35.0, 32.0), 1.0, 0.0, 1.0, &FeatureSkipSet::new(), Some);
    assert!(hit == Some(FeatureId(3)), "Unexpected hit: {:?}", hit);
}

#[test]
fn decluttered_labels_keep_the_first_of_overlapping_pairs() {
    let rasterizer: Arc<dyn LabelRasterizer> = Arc::new(BlockLabelRasterizer::new());
    let mut group = RasterReplayGroup::new(0.0, Extent::new(0.0, 0.0, 128.0, 128.0), 1.0, 1.0, false, true, Some(rasterizer));

    let replay = group.get_replay(ZIndex(0.0), ReplayType::Text);
    replay.set_text_style(TextStyle::new("AAAA", "mono"));
    replay.draw_point(&Point::new(40.0, 40.0), FeatureId(1));
    // A second label overlapping the first, and a third far away
    replay.set_text_style(TextStyle::new("BBBB", "mono"));
    replay.draw_point(&Point::new(44.0, 42.0), FeatureId(2));
    replay.set_text_style(TextStyle::new("CCCC", "mono"));
    replay.draw_point(&Point::new(100.0, 100.0), FeatureId(3));

    group.finish();

    let mut surface = SoftwareSurface::new(128, 128);
    group.replay(&mut surface, &Transform::identity(), 0.0, &FeatureSkipSet::new(), None);

    // First and third labels land; the second collides and is dropped, so its centre
    // row right of the first label's box stays empty
    assert!(surface.alpha_at(40, 40) == 255, "First label missing");
    assert!(surface.alpha_at(100, 100) == 255, "Far label missing");
    assert!(surface.alpha_at(60, 42) == 0, "Colliding label was drawn");
}

#[test]
fn transforms_project_the_tape_not_the_geometry() {
    let mut group = RasterReplayGroup::new(0.0, Extent::new(0.0, 0.0, 64.0, 64.0), 1.0, 1.0, false, false, None);

    let replay = group.get_replay(ZIndex(0.0), ReplayType::Polygon);
    replay.set_fill_stroke_style(Some(FillStyle::Color(Rgba([255, 255, 0, 255]))), None);
    replay.draw_polygon(&Polygon::from_rings(&[vec![[0.0, 0.0], [8.0, 0.0], [8.0, 8.0], [0.0, 8.0]]]), FeatureId(1));

    group.finish();

    // Scale by 4: the 8-unit square covers 32 pixels
    let transform   = Transform::scaling(4.0, 4.0);
    let mut surface = SoftwareSurface::new(64, 64);
    group.replay(&mut surface, &transform, 0.0, &FeatureSkipSet::new(), None);

    assert!(surface.alpha_at(16, 16) == 255);
    assert!(surface.alpha_at(30, 30) == 255);
    assert!(surface.alpha_at(40, 40) == 0);
}
