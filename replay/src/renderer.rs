use crate::feature::*;
use crate::style::*;

use carta_geometry::*;

///
/// The contract between the feature-walking code and a replay builder
///
/// A renderer receives one resolved style at a time through the `set_*` methods, then
/// one or more geometries drawn under that style. Each concrete replay supports the
/// geometry kinds its drawing type covers and nothing else: calling an unsupported
/// method is a wiring bug in the collaborator, not a data problem, and panics rather
/// than degrading (degenerate *data* never reaches these methods as a panic — empty
/// geometries simply record nothing).
///
pub trait GeometryRenderer {
    ///
    /// Sets the fill and stroke styles used by subsequent polygonal and line drawing
    ///
    /// Passing `None` for both is the documented way to suppress drawing while still
    /// letting image/text sub-styles render.
    ///
    fn set_fill_stroke_style(&mut self, _fill: Option<FillStyle>, _stroke: Option<StrokeStyle>) {
        panic!("This replay does not draw filled or stroked geometry");
    }

    ///
    /// Sets the image style used by subsequent point drawing
    ///
    fn set_image_style(&mut self, _image: ImageStyle) {
        panic!("This replay does not draw images");
    }

    ///
    /// Sets the text style used by subsequent label drawing
    ///
    fn set_text_style(&mut self, _text: TextStyle) {
        panic!("This replay does not draw text");
    }

    fn draw_point(&mut self, _point: &Point, _feature: FeatureId) {
        panic!("This replay does not draw points");
    }

    fn draw_multi_point(&mut self, _points: &MultiPoint, _feature: FeatureId) {
        panic!("This replay does not draw multi-points");
    }

    fn draw_line_string(&mut self, _line: &LineString, _feature: FeatureId) {
        panic!("This replay does not draw line strings");
    }

    fn draw_multi_line_string(&mut self, _lines: &MultiLineString, _feature: FeatureId) {
        panic!("This replay does not draw multi-line strings");
    }

    fn draw_polygon(&mut self, _polygon: &Polygon, _feature: FeatureId) {
        panic!("This replay does not draw polygons");
    }

    fn draw_multi_polygon(&mut self, _polygons: &MultiPolygon, _feature: FeatureId) {
        panic!("This replay does not draw multi-polygons");
    }

    fn draw_circle(&mut self, _circle: &Circle, _feature: FeatureId) {
        panic!("This replay does not draw circles");
    }

    ///
    /// Dispatches a geometry to the drawing method for its kind
    ///
    /// Collections recurse: every child is drawn under the same feature, and a child
    /// of an unsupported kind panics exactly as a direct call would. Linear rings are
    /// construction material rather than renderable geometry and are rejected here.
    ///
    fn draw_geometry(&mut self, geometry: &Geometry, feature: FeatureId) {
        match geometry {
            Geometry::Point(point)              => self.draw_point(point, feature),
            Geometry::MultiPoint(points)        => self.draw_multi_point(points, feature),
            Geometry::LineString(line)          => self.draw_line_string(line, feature),
            Geometry::MultiLineString(lines)    => self.draw_multi_line_string(lines, feature),
            Geometry::Polygon(polygon)          => self.draw_polygon(polygon, feature),
            Geometry::MultiPolygon(polygons)    => self.draw_multi_polygon(polygons, feature),
            Geometry::Circle(circle)            => self.draw_circle(circle, feature),
            Geometry::LinearRing(_)             => panic!("Linear rings are not independently renderable"),

            Geometry::Collection(collection)    => {
                for child in collection.geometries() {
                    self.draw_geometry(child, feature);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CountingRenderer {
        points: usize,
    }

    impl GeometryRenderer for CountingRenderer {
        fn draw_point(&mut self, _point: &Point, _feature: FeatureId) {
            self.points += 1;
        }
    }

    #[test]
    fn collections_dispatch_recursively() {
        let collection = Geometry::Collection(GeometryCollection::new(vec![
            Geometry::Point(Point::new(1.0, 2.0)),
            Geometry::Collection(GeometryCollection::new(vec![
                Geometry::Point(Point::new(3.0, 4.0)),
            ])),
        ]));

        let mut renderer = CountingRenderer { points: 0 };
        renderer.draw_geometry(&collection, FeatureId(1));

        assert!(renderer.points == 2, "Unexpected point count: {}", renderer.points);
    }

    #[test]
    #[should_panic]
    fn unsupported_kinds_are_a_wiring_bug() {
        let mut renderer = CountingRenderer { points: 0 };
        renderer.draw_circle(&Circle::new(0.0, 0.0, 1.0), FeatureId(1));
    }
}
