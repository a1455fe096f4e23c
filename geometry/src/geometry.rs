use crate::circle::*;
use crate::collection::*;
use crate::extent::*;
use crate::flat;
use crate::line_string::*;
use crate::linear_ring::*;
use crate::multi_line_string::*;
use crate::multi_point::*;
use crate::multi_polygon::*;
use crate::point::*;
use crate::polygon::*;

///
/// The closed set of geometry kinds
///
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum GeometryType {
    Point,
    LineString,
    LinearRing,
    Polygon,
    MultiPoint,
    MultiLineString,
    MultiPolygon,
    Circle,
    GeometryCollection,
}

///
/// Any geometry the rendering pipeline can carry
///
/// This is a closed tagged set rather than an open trait: the renderers dispatch over it
/// with a plain match, and adding a kind is an explicit, compiler-checked change to every
/// consumer.
///
#[derive(Clone, Debug)]
pub enum Geometry {
    Point(Point),
    LineString(LineString),
    LinearRing(LinearRing),
    Polygon(Polygon),
    MultiPoint(MultiPoint),
    MultiLineString(MultiLineString),
    MultiPolygon(MultiPolygon),
    Circle(Circle),
    Collection(GeometryCollection),
}

impl Geometry {
    ///
    /// The kind of this geometry
    ///
    pub fn geometry_type(&self) -> GeometryType {
        match self {
            Geometry::Point(_)              => GeometryType::Point,
            Geometry::LineString(_)         => GeometryType::LineString,
            Geometry::LinearRing(_)         => GeometryType::LinearRing,
            Geometry::Polygon(_)            => GeometryType::Polygon,
            Geometry::MultiPoint(_)         => GeometryType::MultiPoint,
            Geometry::MultiLineString(_)    => GeometryType::MultiLineString,
            Geometry::MultiPolygon(_)       => GeometryType::MultiPolygon,
            Geometry::Circle(_)             => GeometryType::Circle,
            Geometry::Collection(_)         => GeometryType::GeometryCollection,
        }
    }

    ///
    /// The revision counter: any mutation moves it, invalidating derived caches
    ///
    pub fn revision(&self) -> u64 {
        match self {
            Geometry::Point(point)              => point.base().revision(),
            Geometry::LineString(line)          => line.base().revision(),
            Geometry::LinearRing(ring)          => ring.base().revision(),
            Geometry::Polygon(polygon)          => polygon.base().revision(),
            Geometry::MultiPoint(points)        => points.base().revision(),
            Geometry::MultiLineString(lines)    => lines.base().revision(),
            Geometry::MultiPolygon(polygons)    => polygons.base().revision(),
            Geometry::Circle(circle)            => circle.base().revision(),
            Geometry::Collection(collection)    => collection.revision(),
        }
    }

    ///
    /// The extent of this geometry, cached against the revision
    ///
    pub fn extent(&self) -> Extent {
        match self {
            Geometry::Point(point)              => point.extent(),
            Geometry::LineString(line)          => line.extent(),
            Geometry::LinearRing(ring)          => ring.extent(),
            Geometry::Polygon(polygon)          => polygon.extent(),
            Geometry::MultiPoint(points)        => points.extent(),
            Geometry::MultiLineString(lines)    => lines.extent(),
            Geometry::MultiPolygon(polygons)    => polygons.extent(),
            Geometry::Circle(circle)            => circle.extent(),
            Geometry::Collection(collection)    => collection.extent(),
        }
    }

    ///
    /// Updates `closest` with the closest point of this geometry if it beats the supplied
    /// minimum squared distance, returning the new minimum
    ///
    pub fn closest_point_xy(&self, x: f64, y: f64, closest: &mut Vec<f64>, min_squared_distance: f64) -> f64 {
        match self {
            Geometry::Point(point)              => point.closest_point_xy(x, y, closest, min_squared_distance),
            Geometry::LineString(line)          => line.closest_point_xy(x, y, closest, min_squared_distance),
            Geometry::LinearRing(ring)          => ring.closest_point_xy(x, y, closest, min_squared_distance),
            Geometry::Polygon(polygon)          => polygon.closest_point_xy(x, y, closest, min_squared_distance),
            Geometry::MultiPoint(points)        => points.closest_point_xy(x, y, closest, min_squared_distance),
            Geometry::MultiLineString(lines)    => lines.closest_point_xy(x, y, closest, min_squared_distance),
            Geometry::MultiPolygon(polygons)    => polygons.closest_point_xy(x, y, closest, min_squared_distance),
            Geometry::Circle(circle)            => circle.closest_point_xy(x, y, closest, min_squared_distance),
            Geometry::Collection(collection)    => collection.closest_point_xy(x, y, closest, min_squared_distance),
        }
    }

    ///
    /// The closest point of this geometry to the probe, if the geometry is not empty
    ///
    pub fn closest_point(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let mut closest = vec![];
        let distance    = self.closest_point_xy(x, y, &mut closest, f64::INFINITY);

        if distance.is_finite() && closest.len() >= 2 {
            Some((closest[0], closest[1]))
        } else {
            None
        }
    }

    ///
    /// True if this geometry intersects the extent
    ///
    pub fn intersects_extent(&self, extent: &Extent) -> bool {
        match self {
            Geometry::Point(point)              => point.intersects_extent(extent),
            Geometry::LineString(line)          => line.intersects_extent(extent),
            Geometry::LinearRing(ring)          => ring.extent().intersects(extent),
            Geometry::Polygon(polygon)          => polygon.intersects_extent(extent),
            Geometry::MultiPoint(points)        => points.intersects_extent(extent),
            Geometry::MultiLineString(lines)    => lines.intersects_extent(extent),
            Geometry::MultiPolygon(polygons)    => polygons.intersects_extent(extent),
            Geometry::Circle(circle)            => circle.intersects_extent(extent),
            Geometry::Collection(collection)    => collection.intersects_extent(extent),
        }
    }

    ///
    /// Returns a copy simplified for the supplied squared tolerance
    ///
    /// Kinds with no meaningful simplification (points, circles, rings used as
    /// construction material) return a plain copy.
    ///
    pub fn simplified(&self, squared_tolerance: f64) -> Geometry {
        match self {
            Geometry::LineString(line)          => Geometry::LineString(line.simplified(squared_tolerance)),
            Geometry::MultiLineString(lines)    => Geometry::MultiLineString(lines.simplified(squared_tolerance)),
            Geometry::Polygon(polygon)          => Geometry::Polygon(polygon.simplified(squared_tolerance)),
            Geometry::MultiPolygon(polygons)    => Geometry::MultiPolygon(polygons.simplified(squared_tolerance)),
            Geometry::Collection(collection)    => Geometry::Collection(collection.simplified(squared_tolerance)),
            other                               => other.clone(),
        }
    }

    ///
    /// The area enclosed by this geometry (zero for non-areal kinds)
    ///
    pub fn area(&self) -> f64 {
        match self {
            Geometry::Polygon(polygon)          => polygon.area(),
            Geometry::MultiPolygon(polygons)    => polygons.area(),
            Geometry::Circle(circle)            => {
                let radius = circle.radius();
                std::f64::consts::PI * radius * radius
            }
            Geometry::Collection(collection)    => collection.geometries().iter().map(|geometry| geometry.area()).sum(),
            _                                   => 0.0,
        }
    }

    ///
    /// Applies a transformation function to the flat coordinates in place
    ///
    /// This is the seam the projection module plugs into: the function receives the
    /// buffer and its stride and rewrites coordinates in place.
    ///
    pub fn apply_transform(&mut self, transform_fn: &dyn Fn(&mut [f64], usize)) {
        match self {
            Geometry::Point(point)              => { let stride = point.base().stride(); transform_fn(point.base_mut().flat_coordinates_mut(), stride); }
            Geometry::LineString(line)          => { let stride = line.base().stride(); transform_fn(line.base_mut().flat_coordinates_mut(), stride); }
            Geometry::LinearRing(ring)          => { let stride = ring.base().stride(); transform_fn(ring.base_mut().flat_coordinates_mut(), stride); }
            Geometry::Polygon(polygon)          => { let stride = polygon.base().stride(); transform_fn(polygon.base_mut().flat_coordinates_mut(), stride); }
            Geometry::MultiPoint(points)        => { let stride = points.base().stride(); transform_fn(points.base_mut().flat_coordinates_mut(), stride); }
            Geometry::MultiLineString(lines)    => { let stride = lines.base().stride(); transform_fn(lines.base_mut().flat_coordinates_mut(), stride); }
            Geometry::MultiPolygon(polygons)    => { let stride = polygons.base().stride(); transform_fn(polygons.base_mut().flat_coordinates_mut(), stride); }
            Geometry::Circle(circle)            => { let stride = circle.base().stride(); transform_fn(circle.base_mut().flat_coordinates_mut(), stride); }
            Geometry::Collection(collection)    => {
                for child in collection.geometries_mut() {
                    child.apply_transform(transform_fn);
                }
                collection.changed();
            }
        }
    }

    ///
    /// Rotates this geometry in place around an anchor point
    ///
    pub fn rotate(&mut self, angle: f64, anchor: (f64, f64)) {
        self.apply_transform(&move |flat: &mut [f64], stride: usize| {
            let len = flat.len();
            flat::rotate_coordinates(flat, 0, len, stride, angle, anchor);
        });
    }

    ///
    /// Scales this geometry in place about an anchor point
    ///
    pub fn scale(&mut self, sx: f64, sy: f64, anchor: (f64, f64)) {
        self.apply_transform(&move |flat: &mut [f64], stride: usize| {
            let len = flat.len();
            flat::scale_coordinates(flat, 0, len, stride, sx, sy, anchor);
        });
    }

    ///
    /// Translates this geometry in place
    ///
    pub fn translate(&mut self, dx: f64, dy: f64) {
        self.apply_transform(&move |flat: &mut [f64], stride: usize| {
            let len = flat.len();
            flat::translate_coordinates(flat, 0, len, stride, dx, dy);
        });
    }

    ///
    /// The flat coordinates of this geometry (empty for collections, which have no
    /// single buffer)
    ///
    pub fn flat_coordinates(&self) -> &[f64] {
        match self {
            Geometry::Point(point)              => point.base().flat_coordinates(),
            Geometry::LineString(line)          => line.base().flat_coordinates(),
            Geometry::LinearRing(ring)          => ring.base().flat_coordinates(),
            Geometry::Polygon(polygon)          => polygon.base().flat_coordinates(),
            Geometry::MultiPoint(points)        => points.base().flat_coordinates(),
            Geometry::MultiLineString(lines)    => lines.base().flat_coordinates(),
            Geometry::MultiPolygon(polygons)    => polygons.base().flat_coordinates(),
            Geometry::Circle(circle)            => circle.base().flat_coordinates(),
            Geometry::Collection(_)             => &[],
        }
    }

    ///
    /// The stride of this geometry's flat coordinates (2 for collections, which carry
    /// no buffer of their own)
    ///
    pub fn stride(&self) -> usize {
        match self {
            Geometry::Point(point)              => point.base().stride(),
            Geometry::LineString(line)          => line.base().stride(),
            Geometry::LinearRing(ring)          => ring.base().stride(),
            Geometry::Polygon(polygon)          => polygon.base().stride(),
            Geometry::MultiPoint(points)        => points.base().stride(),
            Geometry::MultiLineString(lines)    => lines.base().stride(),
            Geometry::MultiPolygon(polygons)    => polygons.base().stride(),
            Geometry::Circle(circle)            => circle.base().stride(),
            Geometry::Collection(_)             => 2,
        }
    }
}
