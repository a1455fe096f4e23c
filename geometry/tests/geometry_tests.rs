use carta_geometry::*;

#[test]
fn square_polygon_area() {
    // A 4x4 square has area 16 whichever way it winds
    let polygon = Polygon::from_rings(&[vec![[0.0, 0.0], [4.0, 0.0], [4.0, 4.0], [0.0, 4.0], [0.0, 0.0]]]);

    assert!(polygon.area() == 16.0, "Unexpected area: {}", polygon.area());
}

#[test]
fn square_with_hole_area() {
    let polygon = Polygon::from_rings(&[
        vec![[0.0, 0.0], [4.0, 0.0], [4.0, 4.0], [0.0, 4.0], [0.0, 0.0]],
        vec![[1.0, 1.0], [3.0, 1.0], [3.0, 3.0], [1.0, 3.0], [1.0, 1.0]],
    ]);

    assert!(polygon.area() == 12.0, "Unexpected area: {}", polygon.area());
}

#[test]
fn clockwise_square_has_same_area_after_orientation() {
    // Wound the wrong way round: orientation normalisation makes the area positive
    let polygon = Polygon::from_rings(&[vec![[0.0, 0.0], [0.0, 4.0], [4.0, 4.0], [4.0, 0.0]]]);

    assert!(polygon.area() == 16.0, "Unexpected area: {}", polygon.area());
}

#[test]
fn oriented_coordinates_satisfy_the_invariant() {
    // Exterior and hole both counter-clockwise on input
    let polygon = Polygon::from_rings(&[
        vec![[0.0, 0.0], [4.0, 0.0], [4.0, 4.0], [0.0, 4.0]],
        vec![[1.0, 1.0], [3.0, 1.0], [3.0, 3.0], [1.0, 3.0]],
    ]);

    let oriented = polygon.oriented_flat_coordinates();

    assert!(flat::linear_ring_area(&oriented, 0, 8, 2) >= 0.0);
    assert!(flat::linear_ring_area(&oriented, 8, 16, 2) <= 0.0);
}

#[test]
fn line_string_simplify_zero_keeps_points() {
    let line        = LineString::from_coordinates(&[[0.0, 0.0], [10.0, 0.0], [10.0, 10.0]]);
    let simplified  = line.simplified(0.0);

    assert!(simplified.base().flat_coordinates() == line.base().flat_coordinates());
}

#[test]
fn line_string_simplify_collapses_shallow_bend() {
    let line        = LineString::from_coordinates(&[[0.0, 0.0], [5.0, 0.01], [10.0, 0.0]]);
    let simplified  = line.simplified(1.0);

    assert!(simplified.base().flat_coordinates() == &[0.0, 0.0, 10.0, 0.0], "Unexpected: {:?}", simplified.base().flat_coordinates());
}

#[test]
fn simplification_is_monotone_in_tolerance() {
    let line = LineString::from_coordinates(&[
        [0.0, 0.0], [1.0, 0.5], [2.0, -0.4], [3.0, 0.9], [4.0, 0.2], [5.0, -0.7], [6.0, 0.0],
    ]);

    let fine    = line.simplified(0.01);
    let coarse  = line.simplified(5.0);

    assert!(fine.base().flat_coordinates().len() >= coarse.base().flat_coordinates().len());
}

#[test]
fn simplified_geometry_is_cached() {
    let line = LineString::from_coordinates(&[[0.0, 0.0], [5.0, 0.01], [10.0, 0.0]]);

    let first   = line.simplified(1.0);
    let second  = line.simplified(1.0);

    // Identical values from the cache, and the source must be untouched
    assert!(first.base().flat_coordinates() == second.base().flat_coordinates());
    assert!(line.base().flat_coordinates().len() == 6);
}

#[test]
fn fully_simplified_short_circuits() {
    // Already minimal: a simplification pass leaves it unchanged, so a smaller
    // tolerance afterwards must come back as a plain copy
    let line = LineString::from_coordinates(&[[0.0, 0.0], [10.0, 10.0]]);

    let simplified = line.simplified(4.0);
    assert!(simplified.base().flat_coordinates() == line.base().flat_coordinates());

    let again = line.simplified(1.0);
    assert!(again.base().flat_coordinates() == line.base().flat_coordinates());
}

#[test]
fn clone_is_deep() {
    let line        = LineString::from_coordinates(&[[0.0, 0.0], [10.0, 0.0]]);
    let mut copy    = line.clone();

    assert!(copy.base().flat_coordinates() == line.base().flat_coordinates());

    // Mutating the clone never affects the original
    copy.base_mut().flat_coordinates_mut()[0] = 99.0;
    assert!(line.base().flat_coordinates()[0] == 0.0);
}

#[test]
fn extent_is_stable_without_mutation() {
    let line = LineString::from_coordinates(&[[0.0, 0.0], [10.0, 5.0]]);

    let revision_before = line.base().revision();
    let first           = line.extent();
    let second          = line.extent();

    assert!(first == second);
    assert!(line.base().revision() == revision_before, "Reading the extent must not look like a mutation");
}

#[test]
fn extent_follows_mutation() {
    let mut line = LineString::from_coordinates(&[[0.0, 0.0], [10.0, 5.0]]);

    assert!(line.extent() == Extent::new(0.0, 0.0, 10.0, 5.0));

    line.set_coordinates(vec![0.0, 0.0, 20.0, 5.0]);
    assert!(line.extent() == Extent::new(0.0, 0.0, 20.0, 5.0));
}

#[test]
fn circle_extent_and_intersections() {
    let circle = Circle::new(0.0, 0.0, 5.0);

    assert!(circle.extent() == Extent::new(-5.0, -5.0, 5.0, 5.0));
    assert!(!circle.intersects_extent(&Extent::new(10.0, 10.0, 20.0, 20.0)));
    assert!(circle.intersects_extent(&Extent::new(-1.0, -1.0, 1.0, 1.0)));
}

#[test]
fn polygon_from_circle_approximates_area() {
    let circle  = Circle::new(0.0, 0.0, 5.0);
    let polygon = Polygon::from_circle(&circle, 64, 0.0);

    let expected = std::f64::consts::PI * 25.0;
    let area     = polygon.area();

    assert!((area - expected).abs() / expected < 0.01, "Unexpected area: {} vs {}", area, expected);
}

#[test]
fn collection_extent_is_union_and_translate_recurses() {
    let mut collection = GeometryCollection::new(vec![
        Geometry::Point(Point::new(10.0, 10.0)),
        Geometry::Polygon(Polygon::from_rings(&[vec![[0.0, 0.0], [4.0, 0.0], [4.0, 4.0], [0.0, 4.0]]])),
    ]);

    assert!(collection.extent() == Extent::new(0.0, 0.0, 10.0, 10.0));

    let child_revisions: Vec<u64> = collection.geometries().iter().map(|child| child.revision()).collect();
    let revision_before           = collection.revision();

    let mut geometry = Geometry::Collection(collection);
    geometry.translate(1.0, 2.0);

    let collection = match geometry {
        Geometry::Collection(collection) => collection,
        _                                => unreachable!(),
    };

    assert!(collection.extent() == Extent::new(1.0, 2.0, 11.0, 12.0));
    assert!(collection.revision() != revision_before);
    for (child, revision_before) in collection.geometries().iter().zip(child_revisions) {
        assert!(child.revision() > revision_before, "Child revision did not move");
    }
}

#[test]
fn interior_point_is_inside_polygon() {
    let polygon = Polygon::from_rings(&[
        vec![[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0]],
        vec![[4.0, 1.0], [6.0, 1.0], [6.0, 9.0], [4.0, 9.0]],
    ]);

    let (x, y) = polygon.interior_point();

    assert!(polygon.contains_xy(x, y), "Interior point {} {} not inside", x, y);
}

#[test]
fn closest_point_branch_and_bound() {
    let line = LineString::from_coordinates(&[[0.0, 0.0], [10.0, 0.0]]);

    // A far-away minimum is never improved when the extent check rules the geometry out
    let mut closest = vec![];
    let unchanged   = line.closest_point_xy(100.0, 100.0, &mut closest, 1.0);
    assert!(unchanged == 1.0);

    let geometry = Geometry::LineString(line);
    assert!(geometry.closest_point(3.0, 4.0) == Some((3.0, 0.0)));
}

#[test]
fn multi_polygon_area_and_interior_points() {
    let multi = MultiPolygon::from_polygons(&[
        vec![vec![[0.0, 0.0], [4.0, 0.0], [4.0, 4.0], [0.0, 4.0]]],
        vec![vec![[10.0, 0.0], [14.0, 0.0], [14.0, 4.0], [10.0, 4.0]]],
    ]);

    assert!(multi.area() == 32.0, "Unexpected area: {}", multi.area());

    let interior_points = multi.interior_points();
    assert!(interior_points.len() == 4);
    assert!(multi.contains_xy(interior_points[0], interior_points[1]));
    assert!(multi.contains_xy(interior_points[2], interior_points[3]));
}

#[test]
fn rotate_and_scale_bump_revision() {
    let mut geometry = Geometry::Point(Point::new(1.0, 0.0));
    let before       = geometry.revision();

    geometry.rotate(std::f64::consts::PI / 2.0, (0.0, 0.0));
    assert!(geometry.revision() > before);

    let extent = geometry.extent();
    assert!((extent.min_x).abs() < 1e-12 && (extent.min_y - 1.0).abs() < 1e-12, "Unexpected extent: {:?}", extent);

    geometry.scale(2.0, 2.0, (0.0, 0.0));
    let extent = geometry.extent();
    assert!((extent.min_y - 2.0).abs() < 1e-12, "Unexpected extent: {:?}", extent);
}
