//! Snapping engine: grid snap and multi-candidate "smart" snap.
//!
//! Candidate order is a fixed total order so previews never jitter:
//!
//! | Tier | Snap type |
//! |------|-----------|
//! | 5 | Intersection |
//! | 4 | Vertex |
//! | 3 | Midpoint |
//! | 2 | Edge projection |
//! | 1 | Grid |
//!
//! The highest tier with any candidate within `snap_distance` wins. Inside a
//! tier the closest candidate wins; an exact distance tie goes to the earliest
//! candidate in floor order (rooms, walls, doors, each in collection order).

use crate::geometry::{project_point_onto_segment, segment_intersection};
use crate::id::EntityId;
use crate::model::{Floor, Point};
use serde::{Deserialize, Serialize};

/// What a snapped point attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SnapType {
    None,
    Grid,
    Edge,
    Midpoint,
    Vertex,
    Intersection,
}

impl SnapType {
    /// Tier in the priority order (higher wins).
    pub fn priority(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Grid => 1,
            Self::Edge => 2,
            Self::Midpoint => 3,
            Self::Vertex => 4,
            Self::Intersection => 5,
        }
    }
}

/// Outcome of a snap query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SnapResult {
    pub point: Point,
    pub snap_type: SnapType,
    /// Entity whose geometry produced the candidate (none for grid snaps).
    pub source: Option<EntityId>,
}

/// Snapping parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapOptions {
    /// Maximum distance (grid units) at which any candidate is accepted.
    pub snap_distance: f64,
    /// Grid spacing in grid units.
    pub grid_size: f64,
    pub vertices: bool,
    pub midpoints: bool,
    pub edges: bool,
    pub intersections: bool,
    pub grid: bool,
    /// Ignore this entity's geometry (e.g. the room whose vertex is being dragged).
    #[serde(skip)]
    pub exclude: Option<EntityId>,
}

impl Default for SnapOptions {
    fn default() -> Self {
        Self {
            snap_distance: 0.5,
            grid_size: 1.0,
            vertices: true,
            midpoints: true,
            edges: true,
            intersections: true,
            grid: true,
            exclude: None,
        }
    }
}

impl SnapOptions {
    /// Parse a partial JSON override; missing keys keep their defaults.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Same options, ignoring `id`'s own geometry.
    pub fn excluding(&self, id: EntityId) -> Self {
        Self {
            exclude: Some(id),
            ..self.clone()
        }
    }
}

/// Round each axis to the nearest multiple of `grid_size`.
/// A non-positive grid size leaves the point unchanged.
pub fn snap_to_grid(point: Point, grid_size: f64) -> Point {
    if grid_size <= 0.0 {
        return point;
    }
    Point::new(
        (point.x / grid_size).round() * grid_size,
        (point.y / grid_size).round() * grid_size,
    )
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    point: Point,
    snap_type: SnapType,
    source: Option<EntityId>,
    distance: f64,
}

/// Edge of some entity that passed the distance filter.
#[derive(Debug, Clone, Copy)]
struct NearEdge {
    a: Point,
    b: Point,
    source: EntityId,
}

/// Pick the best snap target for `point` on `floor`.
///
/// Returns the unmodified point with [`SnapType::None`] when nothing lies
/// within `options.snap_distance`.
pub fn smart_snap(point: Point, floor: &Floor, options: &SnapOptions) -> SnapResult {
    let max = options.snap_distance;
    let mut candidates: Vec<Candidate> = Vec::new();
    let push = |candidates: &mut Vec<Candidate>, p: Point, snap_type, source| {
        let distance = p.distance_to(point);
        if distance <= max {
            candidates.push(Candidate {
                point: p,
                snap_type,
                source,
                distance,
            });
        }
    };

    let mut near_edges: Vec<NearEdge> = Vec::new();
    for (source, vertices, closed) in geometry_sources(floor, options.exclude) {
        if options.vertices {
            for v in &vertices {
                push(&mut candidates, *v, SnapType::Vertex, Some(source));
            }
        }
        let n = vertices.len();
        let edge_count = match (closed, n) {
            (_, 0 | 1) => 0,
            (true, _) => n,
            (false, _) => n - 1,
        };
        for i in 0..edge_count {
            let (a, b) = (vertices[i], vertices[(i + 1) % n]);
            if options.midpoints {
                push(&mut candidates, a.midpoint(b), SnapType::Midpoint, Some(source));
            }
            let (projected, _) = project_point_onto_segment(point, a, b);
            if projected.distance_to(point) <= max {
                near_edges.push(NearEdge { a, b, source });
                if options.edges {
                    push(&mut candidates, projected, SnapType::Edge, Some(source));
                }
            }
        }
    }

    if options.intersections {
        for (i, e1) in near_edges.iter().enumerate() {
            for e2 in &near_edges[i + 1..] {
                if e1.source == e2.source {
                    continue;
                }
                if let Some(x) = segment_intersection(e1.a, e1.b, e2.a, e2.b) {
                    push(&mut candidates, x, SnapType::Intersection, Some(e1.source));
                }
            }
        }
    }

    if options.grid {
        push(
            &mut candidates,
            snap_to_grid(point, options.grid_size),
            SnapType::Grid,
            None,
        );
    }

    best_candidate(&candidates).map_or(
        SnapResult {
            point,
            snap_type: SnapType::None,
            source: None,
        },
        |c| SnapResult {
            point: c.point,
            snap_type: c.snap_type,
            source: c.source,
        },
    )
}

/// First candidate in (tier desc, distance asc) order; stable for ties.
fn best_candidate(candidates: &[Candidate]) -> Option<&Candidate> {
    candidates.iter().fold(None, |best: Option<&Candidate>, c| match best {
        None => Some(c),
        Some(b) => {
            let better = c.snap_type.priority() > b.snap_type.priority()
                || (c.snap_type.priority() == b.snap_type.priority() && c.distance < b.distance);
            Some(if better { c } else { b })
        }
    })
}

/// Snap-able geometry in floor order: `(owner, vertices, closed)`.
fn geometry_sources(floor: &Floor, exclude: Option<EntityId>) -> Vec<(EntityId, Vec<Point>, bool)> {
    let rooms = floor
        .rooms
        .iter()
        .map(|r| (r.id, r.polygon.clone(), true));
    let walls = floor
        .walls
        .iter()
        .map(|w| (w.id, w.points().to_vec(), false));
    let doors = floor
        .doors
        .iter()
        .map(|d| (d.id, d.segment.to_vec(), false));
    rooms
        .chain(walls)
        .chain(doors)
        .filter(|(id, _, _)| Some(*id) != exclude)
        .collect()
}
