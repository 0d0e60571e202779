//! Geometry kernel: pure functions over points, segments and polygons.
//!
//! Nothing here knows about rooms or floors. Degenerate input never panics;
//! it produces a neutral answer (zero area, `None`, `false`).

use crate::model::{Point, polygon_edges};
use serde::{Deserialize, Serialize};

/// Distance below which two coordinates are considered equal.
pub const EPSILON: f64 = 1e-9;

// ─── Polygons ────────────────────────────────────────────────────────────

/// Ray-casting containment test. Points on an edge or vertex count as inside.
pub fn point_in_polygon(p: Point, polygon: &[Point]) -> bool {
    if polygon.len() < 3 {
        return false;
    }
    if polygon_edges(polygon).any(|(_, a, b)| segment_distance(p, a, b) <= EPSILON) {
        return true;
    }
    let mut inside = false;
    let n = polygon.len();
    let mut j = n - 1;
    for i in 0..n {
        let (pi, pj) = (polygon[i], polygon[j]);
        if (pi.y > p.y) != (pj.y > p.y) {
            let x_cross = (pj.x - pi.x) * (p.y - pi.y) / (pj.y - pi.y) + pi.x;
            if p.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Signed shoelace area: positive for counter-clockwise winding (y up).
pub fn signed_area(polygon: &[Point]) -> f64 {
    if polygon.len() < 3 {
        return 0.0;
    }
    polygon_edges(polygon)
        .map(|(_, a, b)| a.cross(b))
        .sum::<f64>()
        / 2.0
}

/// Polygon area in squared grid units. Fewer than 3 points → 0.
pub fn polygon_area(polygon: &[Point]) -> f64 {
    signed_area(polygon).abs()
}

/// Closed perimeter in grid units.
pub fn polygon_perimeter(polygon: &[Point]) -> f64 {
    if polygon.len() < 2 {
        return 0.0;
    }
    polygon_edges(polygon)
        .map(|(_, a, b)| a.distance_to(b))
        .sum()
}

/// Area-weighted centroid; falls back to the vertex average for zero-area input.
pub fn centroid(polygon: &[Point]) -> Option<Point> {
    if polygon.is_empty() {
        return None;
    }
    let area = signed_area(polygon);
    if area.abs() <= EPSILON {
        let n = polygon.len() as f64;
        let sum = polygon.iter().fold(Point::ZERO, |acc, p| acc + *p);
        return Some(Point::new(sum.x / n, sum.y / n));
    }
    let (mut cx, mut cy) = (0.0, 0.0);
    for (_, a, b) in polygon_edges(polygon) {
        let f = a.cross(b);
        cx += (a.x + b.x) * f;
        cy += (a.y + b.y) * f;
    }
    Some(Point::new(cx / (6.0 * area), cy / (6.0 * area)))
}

/// A point strictly inside the polygon, for overlap tests on concave shapes.
///
/// Tries the centroid first, then the centroid of each vertex triangle.
pub fn interior_point(polygon: &[Point]) -> Option<Point> {
    if polygon.len() < 3 {
        return None;
    }
    let strictly_inside = |p: Point| {
        point_in_polygon(p, polygon)
            && polygon_edges(polygon).all(|(_, a, b)| segment_distance(p, a, b) > EPSILON)
    };
    if let Some(c) = centroid(polygon)
        && strictly_inside(c)
    {
        return Some(c);
    }
    let n = polygon.len();
    (0..n)
        .map(|i| {
            let (a, b, c) = (polygon[(i + n - 1) % n], polygon[i], polygon[(i + 1) % n]);
            Point::new((a.x + b.x + c.x) / 3.0, (a.y + b.y + c.y) / 3.0)
        })
        .find(|p| strictly_inside(*p))
}

/// Whether any two non-adjacent edges of the polygon touch or cross.
pub fn is_self_intersecting(polygon: &[Point]) -> bool {
    let n = polygon.len();
    if n < 4 {
        return false;
    }
    let edges: Vec<_> = polygon_edges(polygon).collect();
    for i in 0..n {
        for j in (i + 1)..n {
            let adjacent = j == i + 1 || (i == 0 && j == n - 1);
            if adjacent {
                continue;
            }
            let (_, a1, a2) = edges[i];
            let (_, b1, b2) = edges[j];
            if segment_intersection(a1, a2, b1, b2).is_some() {
                return true;
            }
        }
    }
    false
}

/// Whether two polygons share interior area beyond `tolerance`.
///
/// Rooms that merely share an edge, or whose corners poke into each other by
/// less than `tolerance`, do not overlap.
pub fn polygons_overlap(a: &[Point], b: &[Point], tolerance: f64) -> bool {
    if a.len() < 3 || b.len() < 3 {
        return false;
    }
    if !bounds_of(a).expanded(-tolerance).intersects(&bounds_of(b)) {
        return false;
    }

    // Proper edge crossings far enough from every endpoint.
    for (_, a1, a2) in polygon_edges(a) {
        for (_, b1, b2) in polygon_edges(b) {
            if let Some(x) = proper_crossing(a1, a2, b1, b2)
                && [a1, a2, b1, b2].iter().all(|e| e.distance_to(x) > tolerance)
            {
                return true;
            }
        }
    }

    // Vertices or edge midpoints buried deeper than the tolerance.
    let buried = |p: Point, poly: &[Point]| {
        point_in_polygon(p, poly) && boundary_distance(p, poly) > tolerance
    };
    let samples = |poly: &[Point]| -> Vec<Point> {
        poly.iter()
            .copied()
            .chain(polygon_edges(poly).map(|(_, s, e)| s.midpoint(e)))
            .collect()
    };
    if samples(a).into_iter().any(|p| buried(p, b))
        || samples(b).into_iter().any(|p| buried(p, a))
    {
        return true;
    }

    // Coincident or nested shapes with no crossings and no buried vertices.
    [interior_point(a).map(|p| (p, b)), interior_point(b).map(|p| (p, a))]
        .into_iter()
        .flatten()
        .any(|(p, other)| buried(p, other))
}

/// Shortest distance from a point to a polygon's boundary.
pub fn boundary_distance(p: Point, polygon: &[Point]) -> f64 {
    polygon_edges(polygon)
        .map(|(_, a, b)| segment_distance(p, a, b))
        .fold(f64::INFINITY, f64::min)
}

/// Translate every point by `delta`.
pub fn translate_points(points: &[Point], delta: Point) -> Vec<Point> {
    points.iter().map(|p| *p + delta).collect()
}

// ─── Segments ────────────────────────────────────────────────────────────

/// Closest point on segment `a..b` to `p`, and its parameter `t ∈ [0, 1]`.
pub fn project_point_onto_segment(p: Point, a: Point, b: Point) -> (Point, f64) {
    let ab = b - a;
    let len_sq = ab.dot(ab);
    if len_sq <= EPSILON * EPSILON {
        return (a, 0.0);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    (a + ab * t, t)
}

/// Distance from `p` to segment `a..b`.
pub fn segment_distance(p: Point, a: Point, b: Point) -> f64 {
    let (closest, _) = project_point_onto_segment(p, a, b);
    p.distance_to(closest)
}

/// Intersection point of two segments, including touching endpoints.
/// Collinear overlaps return the first shared point found.
pub fn segment_intersection(a1: Point, a2: Point, b1: Point, b2: Point) -> Option<Point> {
    let r = a2 - a1;
    let s = b2 - b1;
    let denom = r.cross(s);
    let qp = b1 - a1;

    if denom.abs() <= EPSILON {
        if qp.cross(r).abs() > EPSILON {
            return None;
        }
        // Collinear: look for a shared endpoint.
        return [b1, b2, a1, a2].into_iter().find(|p| {
            segment_distance(*p, a1, a2) <= EPSILON && segment_distance(*p, b1, b2) <= EPSILON
        });
    }

    let t = qp.cross(s) / denom;
    let u = qp.cross(r) / denom;
    let range = -EPSILON..=1.0 + EPSILON;
    (range.contains(&t) && range.contains(&u)).then(|| a1 + r * t)
}

/// Intersection of two segments that cross at a single point interior to both.
/// Collinear and endpoint-touching pairs return `None`.
pub fn proper_crossing(a1: Point, a2: Point, b1: Point, b2: Point) -> Option<Point> {
    let r = a2 - a1;
    let s = b2 - b1;
    let denom = r.cross(s);
    if denom.abs() <= EPSILON {
        return None;
    }
    let qp = b1 - a1;
    let t = qp.cross(s) / denom;
    let u = qp.cross(r) / denom;
    let open = |v: f64| v > EPSILON && v < 1.0 - EPSILON;
    (open(t) && open(u)).then(|| a1 + r * t)
}

/// Whether two segments cross at a point interior to both.
pub fn segments_cross(a1: Point, a2: Point, b1: Point, b2: Point) -> bool {
    proper_crossing(a1, a2, b1, b2).is_some()
}

/// Overlap of two collinear segments, if longer than `tolerance`.
///
/// `b1..b2` must lie within `tolerance` of the infinite line through `a1..a2`.
/// The result runs in the direction of `a1..a2`.
pub fn collinear_overlap(
    a1: Point,
    a2: Point,
    b1: Point,
    b2: Point,
    tolerance: f64,
) -> Option<(Point, Point)> {
    let dir = (a2 - a1).normalized()?;
    let off_line = |p: Point| (p - a1).cross(dir).abs();
    if off_line(b1) > tolerance || off_line(b2) > tolerance {
        return None;
    }
    let len = a1.distance_to(a2);
    let tb1 = (b1 - a1).dot(dir);
    let tb2 = (b2 - a1).dot(dir);
    let start = tb1.min(tb2).max(0.0);
    let end = tb1.max(tb2).min(len);
    (end - start > tolerance).then(|| (a1 + dir * start, a1 + dir * end))
}

// ─── Bounds ──────────────────────────────────────────────────────────────

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    /// Normalized box spanning two corner points.
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            min_x: a.x.min(b.x),
            min_y: a.y.min(b.y),
            max_x: a.x.max(b.x),
            max_y: a.y.max(b.y),
        }
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }

    /// AABB overlap test; touching edges count as intersecting.
    pub fn intersects(&self, other: &Bounds) -> bool {
        self.min_x <= other.max_x
            && self.max_x >= other.min_x
            && self.min_y <= other.max_y
            && self.max_y >= other.min_y
    }

    /// Grow (or shrink, for negative `by`) on every side.
    pub fn expanded(&self, by: f64) -> Bounds {
        Bounds {
            min_x: self.min_x - by,
            min_y: self.min_y - by,
            max_x: self.max_x + by,
            max_y: self.max_y + by,
        }
    }
}

/// Bounding box of a point list (polygon, segment or path).
/// An empty list yields a degenerate box at the origin.
pub fn bounds_of(points: &[Point]) -> Bounds {
    let Some(first) = points.first() else {
        return Bounds::from_corners(Point::ZERO, Point::ZERO);
    };
    points.iter().skip(1).fold(
        Bounds::from_corners(*first, *first),
        |b, p| Bounds {
            min_x: b.min_x.min(p.x),
            min_y: b.min_y.min(p.y),
            max_x: b.max_x.max(p.x),
            max_y: b.max_y.max(p.y),
        },
    )
}

// ─── Units ───────────────────────────────────────────────────────────────

/// Convert an area in squared grid units to square metres.
pub fn area_to_square_meters(area: f64, meters_per_unit: f64) -> f64 {
    area * meters_per_unit * meters_per_unit
}
