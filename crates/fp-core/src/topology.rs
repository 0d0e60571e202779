//! Topology derived from geometry: shared walls, door positions, and
//! connectivity graphs (rooms via doors, floors via vertical links).

use crate::geometry::{collinear_overlap, segment_distance};
use crate::id::EntityId;
use crate::model::{Door, Floor, FloorSet, Point, Room};
use petgraph::algo::connected_components;
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::Bfs;
use std::collections::HashMap;

/// Boundary stretch shared by two adjacent rooms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SharedWall {
    pub room_a: EntityId,
    pub room_b: EntityId,
    pub start: Point,
    pub end: Point,
}

impl SharedWall {
    pub fn length(&self) -> f64 {
        self.start.distance_to(self.end)
    }

    /// Whether a segment lies on this shared wall within `tolerance`.
    pub fn contains_segment(&self, a: Point, b: Point, tolerance: f64) -> bool {
        segment_distance(a, self.start, self.end) <= tolerance
            && segment_distance(b, self.start, self.end) <= tolerance
    }

    /// Whether this wall separates the two given rooms, in either order.
    pub fn joins(&self, a: EntityId, b: EntityId) -> bool {
        (self.room_a == a && self.room_b == b) || (self.room_a == b && self.room_b == a)
    }
}

/// Every collinear edge overlap between two rooms.
pub fn shared_walls_between(a: &Room, b: &Room, tolerance: f64) -> Vec<SharedWall> {
    let mut out = Vec::new();
    for (_, a1, a2) in a.edges() {
        for (_, b1, b2) in b.edges() {
            if let Some((start, end)) = collinear_overlap(a1, a2, b1, b2, tolerance) {
                out.push(SharedWall {
                    room_a: a.id,
                    room_b: b.id,
                    start,
                    end,
                });
            }
        }
    }
    out
}

/// All shared walls on a floor, in room order.
pub fn shared_walls(floor: &Floor, tolerance: f64) -> Vec<SharedWall> {
    let mut out = Vec::new();
    for (i, a) in floor.rooms.iter().enumerate() {
        for b in &floor.rooms[i + 1..] {
            out.extend(shared_walls_between(a, b, tolerance));
        }
    }
    out
}

/// Shared wall that a door segment lies on, if any.
pub fn shared_wall_for_segment(
    floor: &Floor,
    a: Point,
    b: Point,
    tolerance: f64,
) -> Option<SharedWall> {
    shared_walls(floor, tolerance)
        .into_iter()
        .find(|w| w.contains_segment(a, b, tolerance))
}

/// Candidate door segments of `width` along a shared wall.
///
/// The centred slot comes first, then consecutive slots from the wall start.
/// A wall shorter than `width` yields no candidates.
pub fn door_candidates(wall: &SharedWall, width: f64) -> Vec<[Point; 2]> {
    let len = wall.length();
    let Some(dir) = (wall.end - wall.start).normalized() else {
        return Vec::new();
    };
    if width <= 0.0 || width > len {
        return Vec::new();
    }
    let slot = |offset: f64| [wall.start + dir * offset, wall.start + dir * (offset + width)];
    let centre = slot((len - width) / 2.0);
    let mut out = vec![centre];
    let count = (len / width).floor() as usize;
    for i in 0..count {
        let s = slot(i as f64 * width);
        if s != centre {
            out.push(s);
        }
    }
    out
}

// ─── Connectivity ────────────────────────────────────────────────────────

/// Rooms as nodes, doors as edges.
pub struct RoomGraph {
    pub graph: UnGraph<EntityId, EntityId>,
    index: HashMap<EntityId, NodeIndex>,
}

impl RoomGraph {
    pub fn build(floor: &Floor) -> Self {
        let mut graph = UnGraph::new_undirected();
        let mut index = HashMap::new();
        for room in &floor.rooms {
            index.insert(room.id, graph.add_node(room.id));
        }
        for Door { id, room_a, room_b, .. } in &floor.doors {
            if let (Some(&a), Some(&b)) = (index.get(room_a), index.get(room_b)) {
                graph.add_edge(a, b, *id);
            }
        }
        Self { graph, index }
    }

    /// Number of separately reachable room clusters.
    pub fn component_count(&self) -> usize {
        connected_components(&self.graph)
    }

    /// Rooms reachable from `start` through doors (including `start`).
    pub fn reachable_from(&self, start: EntityId) -> Vec<EntityId> {
        let Some(&origin) = self.index.get(&start) else {
            return Vec::new();
        };
        let mut bfs = Bfs::new(&self.graph, origin);
        let mut out = Vec::new();
        while let Some(nx) = bfs.next(&self.graph) {
            out.push(self.graph[nx]);
        }
        out
    }

    /// Rooms with no door at all.
    pub fn isolated_rooms(&self) -> Vec<EntityId> {
        self.graph
            .node_indices()
            .filter(|&n| self.graph.neighbors(n).next().is_none())
            .map(|n| self.graph[n])
            .collect()
    }
}

/// Floors as nodes, vertical links as edges between connected floors.
pub fn floor_graph(floors: &FloorSet) -> UnGraph<EntityId, EntityId> {
    let mut graph = UnGraph::new_undirected();
    let mut index = HashMap::new();
    for floor in &floors.floors {
        index.insert(floor.id, graph.add_node(floor.id));
    }
    for floor in &floors.floors {
        for link in &floor.vertical_links {
            let Some(&from) = index.get(&link.floor_id) else {
                continue;
            };
            for target in &link.connected_floor_ids {
                if *target == link.floor_id {
                    continue;
                }
                if let Some(&to) = index.get(target)
                    && graph.find_edge(from, to).is_none()
                {
                    graph.add_edge(from, to, link.id);
                }
            }
        }
    }
    graph
}

/// Floors that no vertical link reaches when the building has more than one floor.
pub fn unreachable_floors(floors: &FloorSet) -> Vec<EntityId> {
    if floors.floors.len() < 2 {
        return Vec::new();
    }
    let graph = floor_graph(floors);
    graph
        .node_indices()
        .filter(|&n| graph.neighbors(n).next().is_none())
        .map(|n| graph[n])
        .collect()
}
