//!
//! Polygon triangulation by ear clipping with hole bridging
//!
//! Rings live in a vertex arena as doubly-linked lists of indices, and every live ring
//! segment is indexed by a small R-tree so bridge validity, ear containment and
//! self-intersection queries never scan whole rings. Holes merge into the exterior ring
//! through duplicated bridge vertices before clipping starts; rings that stop making
//! progress are reclassified, then repaired by splitting at a self-intersection, and as
//! a bounded last resort fan-triangulated from their centroid (malformed input degrades
//! to an imperfect fill rather than a hang).
//!

mod rtree;

use self::rtree::*;

use carta_geometry::flat;
use carta_geometry::*;

use itertools::Itertools;

///
/// The triangles produced for one ring set
///
/// Vertices are XY pairs: the ring's own vertices in order, then any bridge duplicates
/// and intersection-derived vertices appended during triangulation. Indices come in
/// groups of three.
///
pub struct Triangulation {
    pub vertices:   Vec<f64>,
    pub indices:    Vec<u32>,
}

impl Triangulation {
    ///
    /// The total signed area of the emitted triangles
    ///
    pub fn area(&self) -> f64 {
        let mut area = 0.0;

        for triangle in self.indices.chunks_exact(3) {
            let (ax, ay) = (self.vertices[triangle[0] as usize * 2], self.vertices[triangle[0] as usize * 2 + 1]);
            let (bx, by) = (self.vertices[triangle[1] as usize * 2], self.vertices[triangle[1] as usize * 2 + 1]);
            let (cx, cy) = (self.vertices[triangle[2] as usize * 2], self.vertices[triangle[2] as usize * 2 + 1]);

            area += ((bx - ax) * (cy - ay) - (cx - ax) * (by - ay)) / 2.0;
        }

        area
    }
}

///
/// Triangulates one ring set: the first end closes the exterior ring, later ends close
/// holes
///
/// The exterior is normalised to counter-clockwise and holes to clockwise before
/// bridging, so any consistently-wound input triangulates the same way.
///
pub fn triangulate_rings(flat_coordinates: &[f64], offset: usize, ends: &[usize], stride: usize) -> Triangulation {
    let mut triangulator = Triangulator::new();

    let exterior = match ends.first().and_then(|end| triangulator.create_ring(flat_coordinates, offset, *end, stride, false)) {
        Some(ring)  => ring,
        None        => return Triangulation { vertices: triangulator.vertices, indices: triangulator.indices },
    };
    let (start, mut live) = exterior;
    triangulator.insert_ring_segments(start, live);

    // Bridge holes rightmost-first so each bridge ray only ever meets the exterior ring
    // or an already-merged hole
    let mut holes = vec![];
    let mut ring_offset = ends[0];
    for end in &ends[1..] {
        if let Some((hole_start, hole_live)) = triangulator.create_ring(flat_coordinates, ring_offset, *end, stride, true) {
            let rightmost = triangulator.rightmost_of_ring(hole_start, hole_live);
            holes.push((hole_start, hole_live, triangulator.nodes[rightmost].x));
        }
        ring_offset = *end;
    }
    holes.sort_by(|a, b| b.2.partial_cmp(&a.2).unwrap());

    for (hole_start, hole_live, _) in holes {
        live += triangulator.bridge_hole(hole_start, hole_live);
    }

    triangulator.classify_ring(start, live);
    triangulator.ear_clip(start, live);

    Triangulation {
        vertices:   triangulator.vertices,
        indices:    triangulator.indices,
    }
}

#[derive(Clone, Copy, Debug)]
struct RingNode {
    x:          f64,
    y:          f64,
    vertex:     u32,
    prev:       usize,
    next:       usize,
    reflex:     bool,
}

///
/// The counter-clockwise-positive doubled area of a triangle
///
#[inline]
fn signed_area(ax: f64, ay: f64, bx: f64, by: f64, cx: f64, cy: f64) -> f64 {
    (bx - ax) * (cy - ay) - (cx - ax) * (by - ay)
}

///
/// True if the segments cross strictly in their interiors (shared endpoints are not a
/// crossing)
///
fn segments_cross_properly(x1: f64, y1: f64, x2: f64, y2: f64, x3: f64, y3: f64, x4: f64, y4: f64) -> bool {
    let d12 = (x2 - x1, y2 - y1);
    let d34 = (x4 - x3, y4 - y3);

    let denominator = d12.0 * d34.1 - d12.1 * d34.0;
    if denominator == 0.0 {
        return false;
    }

    let t = ((x3 - x1) * d34.1 - (y3 - y1) * d34.0) / denominator;
    let u = ((x3 - x1) * d12.1 - (y3 - y1) * d12.0) / denominator;

    t > 0.0 && t < 1.0 && u > 0.0 && u < 1.0
}

struct Triangulator {
    nodes:      Vec<RingNode>,
    tree:       SegmentTree,
    vertices:   Vec<f64>,
    indices:    Vec<u32>,
}

impl Triangulator {
    fn new() -> Triangulator {
        Triangulator {
            nodes:      vec![],
            tree:       SegmentTree::new(),
            vertices:   vec![],
            indices:    vec![],
        }
    }

    fn add_node(&mut self, x: f64, y: f64) -> usize {
        let vertex = (self.vertices.len() / 2) as u32;
        self.vertices.push(x);
        self.vertices.push(y);

        self.nodes.push(RingNode { x, y, vertex, prev: 0, next: 0, reflex: false });
        self.nodes.len() - 1
    }

    ///
    /// Builds a circular linked ring from a run of flat coordinates, deduplicating
    /// consecutive points and normalising the winding
    ///
    /// Returns the entry node and the live count, or None for rings degenerate below 3
    /// distinct vertices (dropped without emitting anything).
    ///
    fn create_ring(&mut self, flat_coordinates: &[f64], offset: usize, end: usize, stride: usize, clockwise: bool) -> Option<(usize, usize)> {
        let mut points: Vec<(f64, f64)> = (offset..end).step_by(stride)
            .map(|idx| (flat_coordinates[idx], flat_coordinates[idx + 1]))
            .dedup()
            .collect();

        // Drop an explicit closing point
        if points.len() > 1 && points.first() == points.last() {
            points.pop();
        }
        if points.len() < 3 {
            return None;
        }

        // Normalise the winding: exterior counter-clockwise, holes clockwise
        let mut doubled_area = 0.0;
        for position in 0..points.len() {
            let (x1, y1) = points[position];
            let (x2, y2) = points[(position + 1) % points.len()];
            doubled_area += x1 * y2 - x2 * y1;
        }
        if (doubled_area < 0.0) != clockwise {
            points.reverse();
        }

        let first = self.nodes.len();
        for (x, y) in points.iter() {
            self.add_node(*x, *y);
        }

        let count = points.len();
        for position in 0..count {
            self.nodes[first + position].prev = first + (position + count - 1) % count;
            self.nodes[first + position].next = first + (position + 1) % count;
        }

        Some((first, count))
    }

    fn segment_extent(&self, node: usize) -> Extent {
        let to = self.nodes[node].next;
        let mut extent = Extent::empty();
        extent.extend_coordinate(self.nodes[node].x, self.nodes[node].y);
        extent.extend_coordinate(self.nodes[to].x, self.nodes[to].y);
        extent
    }

    fn insert_segment(&mut self, node: usize) {
        self.tree.insert(self.segment_extent(node), node);
    }

    fn remove_segment(&mut self, node: usize) {
        let extent = self.segment_extent(node);
        self.tree.remove(&extent, node);
    }

    fn insert_ring_segments(&mut self, start: usize, live: usize) {
        let mut node = start;
        for _ in 0..live {
            self.insert_segment(node);
            node = self.nodes[node].next;
        }
    }

    fn rightmost_of_ring(&self, start: usize, live: usize) -> usize {
        let mut best = start;
        let mut node = start;
        for _ in 0..live {
            if self.nodes[node].x > self.nodes[best].x {
                best = node;
            }
            node = self.nodes[node].next;
        }
        best
    }

    ///
    /// Merges a hole into the main ring through a duplicated bridge, returning how many
    /// nodes the main ring gained (the hole's nodes plus the two duplicates)
    ///
    fn bridge_hole(&mut self, hole_start: usize, hole_live: usize) -> usize {
        let rightmost = self.rightmost_of_ring(hole_start, hole_live);
        let mx = self.nodes[rightmost].x;
        let my = self.nodes[rightmost].y;

        // Cast a ray right from the rightmost hole vertex and keep the nearest crossing
        // of the current main ring
        let ray = Extent::new(mx, my, f64::MAX, my);
        let mut candidates = vec![];
        self.tree.search(&ray, &mut candidates);

        let mut crossing: Option<(f64, usize)> = None;
        for segment in candidates {
            let from    = self.nodes[segment];
            let to      = self.nodes[from.next];

            if (from.y <= my && to.y > my) || (to.y <= my && from.y > my) {
                let x = (my - from.y) / (to.y - from.y) * (to.x - from.x) + from.x;
                if x >= mx && crossing.map(|(best_x, _)| x < best_x).unwrap_or(true) {
                    crossing = Some((x, segment));
                }
            }
        }

        let (crossing_x, segment) = match crossing {
            Some(found) => found,
            // A hole the ray cannot connect is malformed input: drop it
            None        => return 0,
        };

        // Bridge to the crossed segment's endpoint unless a main-ring vertex inside the
        // bridging triangle would be crossed; then the candidate closest in angle to the
        // ray wins
        let from        = segment;
        let to          = self.nodes[segment].next;
        let endpoint    = if self.nodes[from].x > self.nodes[to].x { from } else { to };

        let mut bridge_to = endpoint;
        if (self.nodes[endpoint].y - my).abs() > 0.0 {
            let kx = self.nodes[endpoint].x;
            let ky = self.nodes[endpoint].y;

            let triangle = {
                let mut extent = Extent::empty();
                extent.extend_coordinate(mx, my);
                extent.extend_coordinate(crossing_x, my);
                extent.extend_coordinate(kx, ky);
                extent
            };

            let mut in_triangle = vec![];
            self.tree.search(&triangle, &mut in_triangle);

            let mut best_angle = f64::INFINITY;
            for candidate_segment in in_triangle {
                for candidate in [candidate_segment, self.nodes[candidate_segment].next] {
                    let cx = self.nodes[candidate].x;
                    let cy = self.nodes[candidate].y;
                    if (cx, cy) == (mx, my) || (cx, cy) == (kx, ky) {
                        continue;
                    }

                    let inside = signed_area(mx, my, crossing_x, my, cx, cy) >= 0.0
                        && signed_area(crossing_x, my, kx, ky, cx, cy) >= 0.0
                        && signed_area(kx, ky, mx, my, cx, cy) >= 0.0;
                    let inside = inside || (signed_area(mx, my, crossing_x, my, cx, cy) <= 0.0
                        && signed_area(crossing_x, my, kx, ky, cx, cy) <= 0.0
                        && signed_area(kx, ky, mx, my, cx, cy) <= 0.0);

                    if inside {
                        let angle = ((cy - my).abs()).atan2(cx - mx);
                        if angle < best_angle && self.bridge_is_clear(rightmost, candidate) {
                            best_angle  = angle;
                            bridge_to   = candidate;
                        }
                    }
                }
            }
        }

        // Splice: main ...B -> M ...hole... M' -> B' -> B.next..., duplicating both
        // bridge endpoints
        let bridge      = bridge_to;
        let bridge_next = self.nodes[bridge].next;
        let hole_prev   = self.nodes[rightmost].prev;

        let m2 = self.add_node(mx, my);
        let b2 = self.add_node(self.nodes[bridge].x, self.nodes[bridge].y);

        self.remove_segment(bridge);

        self.nodes[bridge].next     = rightmost;
        self.nodes[rightmost].prev  = bridge;

        self.nodes[hole_prev].next  = m2;
        self.nodes[m2].prev         = hole_prev;
        self.nodes[m2].next         = b2;
        self.nodes[b2].prev         = m2;
        self.nodes[b2].next         = bridge_next;
        self.nodes[bridge_next].prev = b2;

        // Re-index the changed and new segments, then the hole's own
        self.insert_segment(bridge);
        self.insert_segment(m2);
        self.insert_segment(b2);

        let mut node = rightmost;
        while node != m2 {
            self.insert_segment(node);
            node = self.nodes[node].next;
        }

        hole_live + 2
    }

    ///
    /// True if the candidate bridge crosses no live segment's interior
    ///
    fn bridge_is_clear(&self, from: usize, to: usize) -> bool {
        let (x1, y1) = (self.nodes[from].x, self.nodes[from].y);
        let (x2, y2) = (self.nodes[to].x, self.nodes[to].y);

        let mut bridge_extent = Extent::empty();
        bridge_extent.extend_coordinate(x1, y1);
        bridge_extent.extend_coordinate(x2, y2);

        let mut nearby = vec![];
        self.tree.search(&bridge_extent, &mut nearby);

        for segment in nearby {
            let from_node   = self.nodes[segment];
            let to_node     = self.nodes[from_node.next];

            if segments_cross_properly(x1, y1, x2, y2, from_node.x, from_node.y, to_node.x, to_node.y) {
                return false;
            }
        }
        true
    }

    fn area_at(&self, node: usize) -> f64 {
        let previous    = self.nodes[self.nodes[node].prev];
        let current     = self.nodes[node];
        let next        = self.nodes[current.next];

        signed_area(previous.x, previous.y, current.x, current.y, next.x, next.y)
    }

    fn classify(&mut self, node: usize) {
        self.nodes[node].reflex = self.area_at(node) < 0.0;
    }

    fn classify_ring(&mut self, start: usize, live: usize) {
        let mut node = start;
        for _ in 0..live {
            self.classify(node);
            node = self.nodes[node].next;
        }
    }

    ///
    /// True if clipping the convex vertex would produce a valid ear: no other live
    /// vertex sits strictly inside its triangle and its diagonal crosses nothing
    ///
    fn ear_ok(&self, node: usize) -> bool {
        let previous    = self.nodes[self.nodes[node].prev];
        let current     = self.nodes[node];
        let next        = self.nodes[current.next];

        let mut triangle = Extent::empty();
        triangle.extend_coordinate(previous.x, previous.y);
        triangle.extend_coordinate(current.x, current.y);
        triangle.extend_coordinate(next.x, next.y);

        let mut nearby = vec![];
        self.tree.search(&triangle, &mut nearby);

        for segment in nearby.iter() {
            for candidate in [*segment, self.nodes[*segment].next] {
                let point = self.nodes[candidate];
                // Shared coordinates (including bridge duplicates) never block an ear
                if (point.x, point.y) == (previous.x, previous.y)
                    || (point.x, point.y) == (current.x, current.y)
                    || (point.x, point.y) == (next.x, next.y) {
                    continue;
                }

                if point.reflex
                    && signed_area(previous.x, previous.y, current.x, current.y, point.x, point.y) > 0.0
                    && signed_area(current.x, current.y, next.x, next.y, point.x, point.y) > 0.0
                    && signed_area(next.x, next.y, previous.x, previous.y, point.x, point.y) > 0.0 {
                    return false;
                }
            }
        }

        // No live segment may cross the triangle: the clipping diagonal must stay
        // inside the ring, and a crossing through either ear side means the ring
        // self-intersects here and needs the split fallback instead of an ear. The
        // ear's own sides test as parallel or endpoint-touching, never as crossings.
        for segment in nearby {
            let from    = self.nodes[segment];
            let to      = self.nodes[from.next];

            for (x1, y1, x2, y2) in [
                (previous.x, previous.y, next.x, next.y),
                (previous.x, previous.y, current.x, current.y),
                (current.x, current.y, next.x, next.y),
            ] {
                if segments_cross_properly(x1, y1, x2, y2, from.x, from.y, to.x, to.y) {
                    return false;
                }
            }
        }

        true
    }

    ///
    /// Unlinks a vertex, reconnecting and re-indexing its neighbours
    ///
    fn unlink(&mut self, node: usize) {
        let previous    = self.nodes[node].prev;
        let next        = self.nodes[node].next;

        self.remove_segment(previous);
        self.remove_segment(node);

        self.nodes[previous].next   = next;
        self.nodes[next].prev       = previous;

        self.insert_segment(previous);

        self.classify(previous);
        self.classify(next);
    }

    fn emit_triangle(&mut self, a: usize, b: usize, c: usize) {
        let (a, b, c) = (self.nodes[a].vertex, self.nodes[b].vertex, self.nodes[c].vertex);
        self.indices.push(a);
        self.indices.push(b);
        self.indices.push(c);
    }

    ///
    /// Finds a properly-crossing segment pair in the ring and splits the ring in two at
    /// their intersection, inserting a duplicated intersection vertex into both halves
    ///
    /// Returns the entry node and live count of each half, or None when the ring has
    /// no proper self-intersection.
    ///
    fn split_at_intersection(&mut self, start: usize, live: usize) -> Option<((usize, usize), (usize, usize))> {
        let mut node = start;
        for _ in 0..live {
            let node_next = self.nodes[node].next;

            let mut nearby = vec![];
            self.tree.search(&self.segment_extent(node), &mut nearby);

            for other in nearby {
                let other_next = self.nodes[other].next;
                // Adjacent segments share an endpoint, never a proper crossing
                if other == node || other == node_next || other_next == node {
                    continue;
                }

                let (ax, ay) = (self.nodes[node].x, self.nodes[node].y);
                let (bx, by) = (self.nodes[node_next].x, self.nodes[node_next].y);
                let (cx, cy) = (self.nodes[other].x, self.nodes[other].y);
                let (dx, dy) = (self.nodes[other_next].x, self.nodes[other_next].y);

                if !segments_cross_properly(ax, ay, bx, by, cx, cy, dx, dy) {
                    continue;
                }

                let (ix, iy) = match flat::segment_intersection_point(ax, ay, bx, by, cx, cy, dx, dy) {
                    Some(point) => point,
                    None        => continue,
                };

                // Split into: node -> X1 -> other_next -> ... and other -> X2 -> node_next -> ...
                self.remove_segment(node);
                self.remove_segment(other);

                let x1 = self.add_node(ix, iy);
                let x2 = self.add_node(ix, iy);

                self.nodes[node].next       = x1;
                self.nodes[x1].prev         = node;
                self.nodes[x1].next         = other_next;
                self.nodes[other_next].prev = x1;

                self.nodes[other].next      = x2;
                self.nodes[x2].prev         = other;
                self.nodes[x2].next         = node_next;
                self.nodes[node_next].prev  = x2;

                self.insert_segment(node);
                self.insert_segment(x1);
                self.insert_segment(other);
                self.insert_segment(x2);

                // Count the halves by walking them
                let mut first_live  = 1;
                let mut walk        = self.nodes[node].next;
                while walk != node {
                    first_live += 1;
                    walk = self.nodes[walk].next;
                }

                let mut second_live = 1;
                let mut walk        = self.nodes[other].next;
                while walk != other {
                    second_live += 1;
                    walk = self.nodes[walk].next;
                }

                self.classify(node);
                self.classify(x1);
                self.classify(other);
                self.classify(x2);

                return Some(((other, second_live), (node, first_live)));
            }

            node = node_next;
        }

        None
    }

    ///
    /// Fan-triangulates what is left of a ring from its centroid
    ///
    /// This is the documented bound on malformed input: when neither clipping nor
    /// splitting makes progress the remaining ring fans rather than looping forever.
    ///
    fn fan_from_centroid(&mut self, start: usize, live: usize) {
        let mut center_x = 0.0;
        let mut center_y = 0.0;

        let mut node = start;
        for _ in 0..live {
            center_x += self.nodes[node].x;
            center_y += self.nodes[node].y;
            node = self.nodes[node].next;
        }
        center_x /= live as f64;
        center_y /= live as f64;

        let center = self.add_node(center_x, center_y);

        let mut node = start;
        for _ in 0..live {
            let next = self.nodes[node].next;
            self.remove_segment(node);
            self.emit_triangle(center, node, next);
            node = next;
        }
    }

    ///
    /// Clips ears until the ring (and any rings split off it) is fully triangulated
    ///
    fn ear_clip(&mut self, start: usize, live: usize) {
        let mut worklist = vec![(start, live)];

        while let Some((mut start, mut live)) = worklist.pop() {
            if live < 3 {
                continue;
            }

            // A pass either clips something or triggers a repair; the budget bounds the
            // repairs so no input loops forever
            let budget = 3 * live + 8;
            let mut stalled_passes  = 0;
            let mut total_passes    = 0;

            while live > 3 {
                let mut clipped = 0;

                let mut node    = start;
                let mut steps   = live;
                while steps > 0 && live > 3 {
                    let next = self.nodes[node].next;

                    if !self.nodes[node].reflex {
                        let area = self.area_at(node);

                        if area == 0.0 {
                            // Collinear: drop the vertex without a triangle
                            if node == start { start = next; }
                            self.unlink(node);
                            live -= 1;
                            clipped += 1;
                        } else if area > 0.0 && self.ear_ok(node) {
                            let previous = self.nodes[node].prev;
                            self.emit_triangle(previous, node, next);
                            if node == start { start = next; }
                            self.unlink(node);
                            live -= 1;
                            clipped += 1;
                        }
                    }

                    node = next;
                    steps -= 1;
                }

                total_passes += 1;

                if clipped == 0 {
                    stalled_passes += 1;

                    if stalled_passes == 1 {
                        // Convex/reflex state can be stale after heavy clipping
                        self.classify_ring(start, live);
                        continue;
                    }

                    if let Some(((other_start, other_live), (self_start, self_live))) = self.split_at_intersection(start, live) {
                        worklist.push((other_start, other_live));
                        start = self_start;
                        live = self_live;
                        stalled_passes = 0;
                        continue;
                    }

                    self.fan_from_centroid(start, live);
                    live = 0;
                    break;
                }

                stalled_passes = 0;

                if total_passes > budget {
                    self.fan_from_centroid(start, live);
                    live = 0;
                    break;
                }
            }

            if live == 3 {
                let second  = self.nodes[start].next;
                let third   = self.nodes[second].next;

                if self.area_at(start) != 0.0 {
                    self.emit_triangle(start, second, third);
                }
                for node in [start, second, third] {
                    self.remove_segment(node);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn square_triangulates_to_two_triangles() {
        let flat = vec![0.0, 0.0, 4.0, 0.0, 4.0, 4.0, 0.0, 4.0];

        let triangulation = triangulate_rings(&flat, 0, &[8], 2);

        assert!(triangulation.indices.len() == 6, "Unexpected index count: {}", triangulation.indices.len());
        assert!(close(triangulation.area(), 16.0), "Unexpected area: {}", triangulation.area());
    }

    #[test]
    fn square_with_hole_covers_the_ring_area() {
        // 4x4 square with a centred 2x2 hole (hole wound opposite to the exterior)
        let flat = vec![
            0.0, 0.0, 4.0, 0.0, 4.0, 4.0, 0.0, 4.0,
            1.0, 1.0, 1.0, 3.0, 3.0, 3.0, 3.0, 1.0,
        ];

        let triangulation = triangulate_rings(&flat, 0, &[8, 16], 2);

        assert!(close(triangulation.area(), 12.0), "Unexpected area: {}", triangulation.area());

        // Indices only ever reference the 8 input vertices plus the two bridge duplicates
        assert!(triangulation.vertices.len() == 20, "Unexpected vertex count: {}", triangulation.vertices.len() / 2);
        assert!(triangulation.indices.iter().all(|index| (*index as usize) < 10));
    }

    #[test]
    fn concave_polygon_triangulates_fully() {
        // An L shape: 6 vertices, area 3+4 = hmm, computed below
        let flat = vec![0.0, 0.0, 3.0, 0.0, 3.0, 1.0, 1.0, 1.0, 1.0, 3.0, 0.0, 3.0];

        let triangulation = triangulate_rings(&flat, 0, &[12], 2);

        // Shoelace area of the L is 5
        assert!(close(triangulation.area(), 5.0), "Unexpected area: {}", triangulation.area());
        assert!(triangulation.indices.len() == 12, "Unexpected index count: {}", triangulation.indices.len());
    }

    #[test]
    fn winding_is_normalised() {
        // The same square wound clockwise still triangulates positively
        let flat = vec![0.0, 0.0, 0.0, 4.0, 4.0, 4.0, 4.0, 0.0];

        let triangulation = triangulate_rings(&flat, 0, &[8], 2);

        assert!(close(triangulation.area(), 16.0), "Unexpected area: {}", triangulation.area());
    }

    #[test]
    fn collinear_vertices_are_dropped_without_triangles() {
        // A square with a redundant midpoint on the bottom edge
        let flat = vec![0.0, 0.0, 2.0, 0.0, 4.0, 0.0, 4.0, 4.0, 0.0, 4.0];

        let triangulation = triangulate_rings(&flat, 0, &[10], 2);

        assert!(close(triangulation.area(), 16.0), "Unexpected area: {}", triangulation.area());
    }

    #[test]
    fn degenerate_rings_emit_nothing() {
        let flat = vec![1.0, 1.0, 1.0, 1.0, 1.0, 1.0];

        let triangulation = triangulate_rings(&flat, 0, &[6], 2);

        assert!(triangulation.indices.is_empty());
    }

    #[test]
    fn self_intersecting_ring_still_covers_both_lobes() {
        // A bowtie: two triangular lobes joined at a crossing
        let flat = vec![0.0, 0.0, 4.0, 4.0, 4.0, 0.0, 0.0, 4.0];

        let triangulation = triangulate_rings(&flat, 0, &[8], 2);

        // Both lobes have area 4; the split fallback must recover both (up to sign)
        let total: f64 = triangulation.indices.chunks_exact(3)
            .map(|triangle| {
                let (ax, ay) = (triangulation.vertices[triangle[0] as usize * 2], triangulation.vertices[triangle[0] as usize * 2 + 1]);
                let (bx, by) = (triangulation.vertices[triangle[1] as usize * 2], triangulation.vertices[triangle[1] as usize * 2 + 1]);
                let (cx, cy) = (triangulation.vertices[triangle[2] as usize * 2], triangulation.vertices[triangle[2] as usize * 2 + 1]);
                (signed_area(ax, ay, bx, by, cx, cy) / 2.0).abs()
            })
            .sum();

        assert!(close(total, 8.0), "Unexpected total area: {}", total);
    }

    #[test]
    fn hole_bridge_duplicates_rather_than_reuses_vertices() {
        let flat = vec![
            0.0, 0.0, 10.0, 0.0, 10.0, 10.0, 0.0, 10.0,
            4.0, 4.0, 4.0, 6.0, 6.0, 6.0, 6.0, 4.0,
        ];

        let triangulation = triangulate_rings(&flat, 0, &[8, 16], 2);

        assert!(close(triangulation.area(), 96.0), "Unexpected area: {}", triangulation.area());
        // 8 ring vertices + 2 bridge duplicates
        assert!(triangulation.vertices.len() == 20, "Unexpected vertex count: {}", triangulation.vertices.len() / 2);
    }
}
