//!
//! Pipeline-shaped tests for the GPU backend: record replays the way a layer renderer
//! would, compile the draw command stream, execute it on the software rasterizer and
//! assert on pixels and hit results.
//!

use carta_geometry::*;
use carta_render_gpu::*;
use carta_replay::*;

use std::sync::Arc;

fn frame_extent() -> Extent {
    Extent::new(0.0, 0.0, 64.0, 64.0)
}

#[test]
fn filled_polygon_rasterizes_through_the_command_stream() {
    let mut group = GpuReplayGroup::new(0.0, frame_extent(), 1.0, None);

    let replay = group.get_replay(ZIndex(0.0), ReplayType::Polygon);
    replay.set_fill_stroke_style(Some(FillStyle::Color(Rgba([200, 30, 30, 255]))), None);
    replay.draw_polygon(&Polygon::from_rings(&[vec![[10.0, 10.0], [50.0, 10.0], [50.0, 50.0], [10.0, 50.0]]]), FeatureId(1));

    group.finish();

    let commands        = group.replay(&Transform::identity(), 0.0, &FeatureSkipSet::new(), None);
    let mut rasterizer  = SoftwareRasterizer::new(64, 64);
    rasterizer.run(&commands);

    assert!(rasterizer.alpha_at(30, 30) == 255, "Interior not filled");
    assert!(rasterizer.alpha_at(5, 5) == 0, "Exterior filled");
}

#[test]
fn polygon_holes_are_not_filled() {
    let mut group = GpuReplayGroup::new(0.0, frame_extent(), 1.0, None);

    let replay = group.get_replay(ZIndex(0.0), ReplayType::Polygon);
    replay.set_fill_stroke_style(Some(FillStyle::Color(Rgba([30, 30, 200, 255]))), None);
    replay.draw_polygon(&Polygon::from_rings(&[
        vec![[10.0, 10.0], [50.0, 10.0], [50.0, 50.0], [10.0, 50.0]],
        vec![[25.0, 25.0], [35.0, 25.0], [35.0, 35.0], [25.0, 35.0]],
    ]), FeatureId(1));

    group.finish();

    let commands        = group.replay(&Transform::identity(), 0.0, &FeatureSkipSet::new(), None);
    let mut rasterizer  = SoftwareRasterizer::new(64, 64);
    rasterizer.run(&commands);

    assert!(rasterizer.alpha_at(15, 15) == 255, "Ring not filled");
    assert!(rasterizer.alpha_at(30, 30) == 0, "Hole filled");
}

#[test]
fn stroked_line_covers_its_spine() {
    let mut group = GpuReplayGroup::new(0.0, frame_extent(), 1.0, None);

    let replay = group.get_replay(ZIndex(0.0), ReplayType::LineString);
    replay.set_fill_stroke_style(None, Some(StrokeStyle::new(Rgba([0, 0, 0, 255]), 4.0)));
    replay.draw_line_string(&LineString::from_coordinates(&[[5.0, 32.0], [60.0, 32.0]]), FeatureId(1));

    group.finish();

    let commands        = group.replay(&Transform::identity(), 0.0, &FeatureSkipSet::new(), None);
    let mut rasterizer  = SoftwareRasterizer::new(64, 64);
    rasterizer.run(&commands);

    assert!(rasterizer.alpha_at(30, 32) == 255, "Spine not covered");
    assert!(rasterizer.alpha_at(30, 10) == 0, "Far from the line covered");
}

#[test]
fn circle_draws_and_discards_analytically() {
    let mut group = GpuReplayGroup::new(0.0, frame_extent(), 1.0, None);

    let replay = group.get_replay(ZIndex(0.0), ReplayType::Circle);
    replay.set_fill_stroke_style(Some(FillStyle::Color(Rgba([0, 160, 0, 255]))), None);
    replay.draw_circle(&Circle::new(32.0, 32.0, 10.0), FeatureId(1));

    group.finish();

    let commands        = group.replay(&Transform::identity(), 0.0, &FeatureSkipSet::new(), None);
    let mut rasterizer  = SoftwareRasterizer::new(64, 64);
    rasterizer.run(&commands);

    assert!(rasterizer.alpha_at(32, 32) == 255, "Centre not filled");
    assert!(rasterizer.alpha_at(32, 45) == 0, "Outside the radius filled");
}

#[test]
fn replaying_twice_builds_identical_buffers() {
    let mut group = GpuReplayGroup::new(0.0, frame_extent(), 1.0, None);

    let replay = group.get_replay(ZIndex(0.0), ReplayType::Polygon);
    replay.set_fill_stroke_style(
        Some(FillStyle::Color(Rgba([90, 60, 120, 220]))),
        Some(StrokeStyle::new(Rgba([0, 0, 0, 255]), 2.0)),
    );
    replay.draw_polygon(&Polygon::from_rings(&[vec![[8.0, 8.0], [40.0, 12.0], [36.0, 40.0], [6.0, 30.0]]]), FeatureId(1));

    group.finish();

    let transform   = Transform::compose(3.0, -1.0, 1.0, 1.0, 0.2);
    let skipped     = FeatureSkipSet::new();

    let mut first = SoftwareRasterizer::new(64, 64);
    first.run(&group.replay(&transform, 0.0, &skipped, None));
    let mut second = SoftwareRasterizer::new(64, 64);
    second.run(&group.replay(&transform, 0.0, &skipped, None));

    assert!(first.data() == second.data());
}

#[test]
fn skipped_features_are_left_out_of_the_stream() {
    let mut group = GpuReplayGroup::new(0.0, frame_extent(), 1.0, None);

    let replay = group.get_replay(ZIndex(0.0), ReplayType::Polygon);
    replay.set_fill_stroke_style(Some(FillStyle::Color(Rgba([255, 0, 0, 255]))), None);
    replay.draw_polygon(&Polygon::from_rings(&[vec![[0.0, 0.0], [20.0, 0.0], [20.0, 20.0], [0.0, 20.0]]]), FeatureId(1));
    replay.draw_polygon(&Polygon::from_rings(&[vec![[30.0, 30.0], [50.0, 30.0], [50.0, 50.0], [30.0, 50.0]]]), FeatureId(2));

    group.finish();

    let mut skipped = FeatureSkipSet::new();
    skipped.insert(FeatureId(1));

    let mut rasterizer = SoftwareRasterizer::new(64, 64);
    rasterizer.run(&group.replay(&Transform::identity(), 0.0, &skipped, None));

    assert!(rasterizer.alpha_at(10, 10) == 0, "Skipped feature drawn");
    assert!(rasterizer.alpha_at(40, 40) == 255, "Unskipped feature missing");
}

#[test]
fn hit_detection_reports_the_topmost_feature() {
    let mut group = GpuReplayGroup::new(0.0, frame_extent(), 1.0, None);

    let bottom = group.get_replay(ZIndex(0.0), ReplayType::Polygon);
    bottom.set_fill_stroke_style(Some(FillStyle::Color(Rgba([255, 0, 0, 255]))), None);
    bottom.draw_polygon(&Polygon::from_rings(&[vec![[0.0, 0.0], [40.0, 0.0], [40.0, 40.0], [0.0, 40.0]]]), FeatureId(1));

    let top = group.get_replay(ZIndex(4.0), ReplayType::Polygon);
    top.set_fill_stroke_style(Some(FillStyle::Color(Rgba([0, 255, 0, 40]))), None);
    top.draw_polygon(&Polygon::from_rings(&[vec![[20.0, 20.0], [60.0, 20.0], [60.0, 60.0], [20.0, 60.0]]]), FeatureId(2));

    group.finish();

    let skipped = FeatureSkipSet::new();

    let hit = group.for_each_feature_at_coordinate((30.0, 30.0), 1.0, 0.0, &skipped, Some);
    assert!(hit == Some(FeatureId(2)), "Unexpected hit: {:?}", hit);

    let hit = group.for_each_feature_at_coordinate((10.0, 10.0), 1.0, 0.0, &skipped, Some);
    assert!(hit == Some(FeatureId(1)), "Unexpected hit: {:?}", hit);

    let hit = group.for_each_feature_at_coordinate((55.0, 5.0), 1.0, 0.0, &skipped, Some);
    assert!(hit == None, "Unexpected hit: {:?}", hit);
}

#[test]
fn hit_detection_respects_the_skip_set() {
    let mut group = GpuReplayGroup::new(0.0, frame_extent(), 1.0, None);

    let replay = group.get_replay(ZIndex(0.0), ReplayType::Polygon);
    replay.set_fill_stroke_style(Some(FillStyle::Color(Rgba([255, 0, 0, 255]))), None);
    replay.draw_polygon(&Polygon::from_rings(&[vec![[0.0, 0.0], [40.0, 0.0], [40.0, 40.0], [0.0, 40.0]]]), FeatureId(1));

    group.finish();

    let mut skipped = FeatureSkipSet::new();
    skipped.insert(FeatureId(1));

    let hit = group.for_each_feature_at_coordinate((20.0, 20.0), 1.0, 0.0, &skipped, Some);
    assert!(hit == None, "Skipped feature hit: {:?}", hit);
}

#[test]
fn glyph_labels_rasterize_from_the_atlas() {
    let glyphs: Arc<dyn GlyphRasterizer> = Arc::new(BlockGlyphRasterizer::new());
    let mut group = GpuReplayGroup::new(0.0, frame_extent(), 1.0, Some(glyphs));

    let replay = group.get_replay(ZIndex(0.0), ReplayType::Text);
    replay.set_text_style(TextStyle::new("ab", "mono"));
    replay.draw_point(&Point::new(32.0, 32.0), FeatureId(1));

    group.finish();

    let commands        = group.replay(&Transform::identity(), 0.0, &FeatureSkipSet::new(), None);
    let mut rasterizer  = SoftwareRasterizer::new(64, 64);
    rasterizer.run(&commands);

    // Two 8x16 glyphs centred on (32, 32)
    assert!(rasterizer.alpha_at(32, 32) == 255, "Label missing at the anchor");
    assert!(rasterizer.alpha_at(32, 5) == 0, "Label bled far from the anchor");
}

#[test]
fn triangulated_area_matches_polygon_area() {
    let square = vec![0.0, 0.0, 4.0, 0.0, 4.0, 4.0, 0.0, 4.0];
    let plain = triangulate::triangulate_rings(&square, 0, &[8], 2);
    assert!((plain.area() - 16.0).abs() < 1e-9, "Unexpected area: {}", plain.area());

    let with_hole = vec![
        0.0, 0.0, 4.0, 0.0, 4.0, 4.0, 0.0, 4.0,
        1.0, 1.0, 1.0, 3.0, 3.0, 3.0, 3.0, 1.0,
    ];
    let holed = triangulate::triangulate_rings(&with_hole, 0, &[8, 16], 2);
    assert!((holed.area() - 12.0).abs() < 1e-9, "Unexpected area: {}", holed.area());
}
