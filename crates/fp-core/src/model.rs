//! Core data model for multi-floor building plans.
//!
//! A plan is a set of floors; each floor exclusively owns its rooms, walls,
//! doors, artworks and vertical links. Child entities point at their owning
//! room through `room_id`, a value resolved by lookup each time. Ownership
//! is re-derived after geometric edits rather than stored as a parent pointer.
//! Every value here is treated as immutable: edits produce new values.

use crate::id::EntityId;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::ops::{Add, Mul, Neg, Sub};

// ─── Points ──────────────────────────────────────────────────────────────

/// World-space coordinate in grid units. Also used as a translation offset.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(self, other: Point) -> f64 {
        (self - other).length()
    }

    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn dot(self, other: Point) -> f64 {
        self.x * other.x + self.y * other.y
    }

    pub fn cross(self, other: Point) -> f64 {
        self.x * other.y - self.y * other.x
    }

    /// Unit vector in the same direction, or `None` for a zero vector.
    pub fn normalized(self) -> Option<Point> {
        let len = self.length();
        (len > f64::EPSILON).then(|| Point::new(self.x / len, self.y / len))
    }

    pub fn midpoint(self, other: Point) -> Point {
        Point::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}

impl Add for Point {
    type Output = Point;
    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Neg for Point {
    type Output = Point;
    fn neg(self) -> Point {
        Point::new(-self.x, -self.y)
    }
}

impl Mul<f64> for Point {
    type Output = Point;
    fn mul(self, rhs: f64) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

/// Width/height pair in grid units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

// ─── Rooms ───────────────────────────────────────────────────────────────

/// A closed area on a floor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub id: EntityId,
    /// Outer boundary, ≥3 points, no implicit closing point.
    pub polygon: Vec<Point>,
    /// Interior cut-outs (courtyards, shafts).
    #[serde(default)]
    pub holes: Vec<Vec<Point>>,
    #[serde(default)]
    pub name: Option<String>,
}

impl Room {
    pub fn new(id: EntityId, polygon: Vec<Point>) -> Self {
        Self {
            id,
            polygon,
            holes: Vec::new(),
            name: None,
        }
    }

    /// Iterate the polygon's edges as `(index, start, end)`, including the closing edge.
    pub fn edges(&self) -> impl Iterator<Item = (usize, Point, Point)> + '_ {
        polygon_edges(&self.polygon)
    }
}

/// Iterate a closed polygon's edges as `(index, start, end)`.
pub fn polygon_edges(polygon: &[Point]) -> impl Iterator<Item = (usize, Point, Point)> + '_ {
    let n = polygon.len();
    (0..if n >= 2 { n } else { 0 }).map(move |i| (i, polygon[i], polygon[(i + 1) % n]))
}

// ─── Walls ───────────────────────────────────────────────────────────────

/// Wall centreline: a straight segment or a multi-point path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WallGeometry {
    Segment([Point; 2]),
    Path(Vec<Point>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wall {
    pub id: EntityId,
    pub geometry: WallGeometry,
    pub thickness: f64,
    #[serde(default)]
    pub room_id: Option<EntityId>,
    #[serde(default)]
    pub load_bearing: bool,
}

impl Wall {
    pub fn segment(id: EntityId, start: Point, end: Point, thickness: f64) -> Self {
        Self {
            id,
            geometry: WallGeometry::Segment([start, end]),
            thickness,
            room_id: None,
            load_bearing: false,
        }
    }

    /// All centreline points in order.
    pub fn points(&self) -> &[Point] {
        match &self.geometry {
            WallGeometry::Segment(pts) => pts.as_slice(),
            WallGeometry::Path(pts) => pts.as_slice(),
        }
    }

    /// Open polyline pieces (no closing edge).
    pub fn pieces(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        self.points().windows(2).map(|w| (w[0], w[1]))
    }

    pub fn length(&self) -> f64 {
        self.pieces().map(|(a, b)| a.distance_to(b)).sum()
    }
}

// ─── Doors ───────────────────────────────────────────────────────────────

/// A door lying on a wall shared by `room_a` and `room_b`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Door {
    pub id: EntityId,
    pub segment: [Point; 2],
    pub width: f64,
    pub room_a: EntityId,
    pub room_b: EntityId,
    #[serde(default)]
    pub room_id: Option<EntityId>,
}

impl Door {
    /// Whether this door connects the given room on either side.
    pub fn touches(&self, room: EntityId) -> bool {
        self.room_a == room || self.room_b == room
    }

    /// Unit vector along the door (and thus along its wall).
    pub fn axis(&self) -> Option<Point> {
        (self.segment[1] - self.segment[0]).normalized()
    }

    pub fn center(&self) -> Point {
        self.segment[0].midpoint(self.segment[1])
    }
}

// ─── Vertical links ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VerticalLinkKind {
    Stairs,
    Elevator,
}

impl VerticalLinkKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Stairs => "stairs",
            Self::Elevator => "elevator",
        }
    }
}

/// Stairs or elevator: instantiated on one floor, connecting several.
///
/// Records sharing a `link_group_id` across floors form one physical
/// staircase or elevator shaft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerticalLink {
    pub id: EntityId,
    pub kind: VerticalLinkKind,
    pub floor_id: EntityId,
    /// Top-left (minimum) corner.
    pub position: Point,
    pub size: Size,
    pub connected_floor_ids: SmallVec<[EntityId; 4]>,
    #[serde(default)]
    pub room_id: Option<EntityId>,
    #[serde(default)]
    pub link_group_id: Option<EntityId>,
    #[serde(default)]
    pub link_number: Option<u32>,
}

impl VerticalLink {
    /// Corners in order: min/min, max/min, max/max, min/max.
    pub fn corners(&self) -> [Point; 4] {
        let Point { x, y } = self.position;
        let Size { width, height } = self.size;
        [
            Point::new(x, y),
            Point::new(x + width, y),
            Point::new(x + width, y + height),
            Point::new(x, y + height),
        ]
    }

    pub fn center(&self) -> Point {
        Point::new(
            self.position.x + self.size.width / 2.0,
            self.position.y + self.size.height / 2.0,
        )
    }
}

// ─── Artworks ────────────────────────────────────────────────────────────

/// A point asset, optionally with a rectangular footprint centred on `position`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artwork {
    pub id: EntityId,
    pub position: Point,
    #[serde(default)]
    pub size: Option<Size>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub room_id: Option<EntityId>,
}

impl Artwork {
    /// Footprint corners; a sizeless artwork degenerates to its position.
    pub fn corners(&self) -> [Point; 4] {
        let Size { width, height } = self.size.unwrap_or_default();
        let (hw, hh) = (width / 2.0, height / 2.0);
        let Point { x, y } = self.position;
        [
            Point::new(x - hw, y - hh),
            Point::new(x + hw, y - hh),
            Point::new(x + hw, y + hh),
            Point::new(x - hw, y + hh),
        ]
    }
}

// ─── Legacy transport records ────────────────────────────────────────────

/// Escalator between two floors, kept for round-tripping older plans.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Escalator {
    pub id: EntityId,
    pub start: Point,
    pub end: Point,
    pub from_floor_id: EntityId,
    pub to_floor_id: EntityId,
}

/// Single-point elevator marker, kept for round-tripping older plans.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Elevator {
    pub id: EntityId,
    pub position: Point,
    pub connected_floor_ids: SmallVec<[EntityId; 4]>,
}

// ─── Entity sum type ─────────────────────────────────────────────────────

/// Any placeable entity, as produced by a creation tool or the clipboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Entity {
    Room(Room),
    Wall(Wall),
    Door(Door),
    Artwork(Artwork),
    VerticalLink(VerticalLink),
}

impl Entity {
    pub fn id(&self) -> EntityId {
        match self {
            Self::Room(r) => r.id,
            Self::Wall(w) => w.id,
            Self::Door(d) => d.id,
            Self::Artwork(a) => a.id,
            Self::VerticalLink(l) => l.id,
        }
    }

    /// Lower-case kind name used in history labels.
    pub fn kind_label(&self) -> &'static str {
        match self {
            Self::Room(_) => "room",
            Self::Wall(_) => "wall",
            Self::Door(_) => "door",
            Self::Artwork(_) => "artwork",
            Self::VerticalLink(l) => l.kind.label(),
        }
    }
}

// ─── Floors ──────────────────────────────────────────────────────────────

/// One building level. Every collection is keyed by unique ID within the floor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Floor {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub level: i32,
    #[serde(default)]
    pub rooms: Vec<Room>,
    #[serde(default)]
    pub walls: Vec<Wall>,
    #[serde(default)]
    pub doors: Vec<Door>,
    #[serde(default)]
    pub artworks: Vec<Artwork>,
    #[serde(default)]
    pub vertical_links: Vec<VerticalLink>,
    #[serde(default)]
    pub escalators: Vec<Escalator>,
    #[serde(default)]
    pub elevators: Vec<Elevator>,
}

impl Floor {
    pub fn new(id: EntityId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            level: 0,
            rooms: Vec::new(),
            walls: Vec::new(),
            doors: Vec::new(),
            artworks: Vec::new(),
            vertical_links: Vec::new(),
            escalators: Vec::new(),
            elevators: Vec::new(),
        }
    }

    pub fn room(&self, id: EntityId) -> Option<&Room> {
        self.rooms.iter().find(|r| r.id == id)
    }

    pub fn wall(&self, id: EntityId) -> Option<&Wall> {
        self.walls.iter().find(|w| w.id == id)
    }

    pub fn door(&self, id: EntityId) -> Option<&Door> {
        self.doors.iter().find(|d| d.id == id)
    }

    pub fn artwork(&self, id: EntityId) -> Option<&Artwork> {
        self.artworks.iter().find(|a| a.id == id)
    }

    pub fn vertical_link(&self, id: EntityId) -> Option<&VerticalLink> {
        self.vertical_links.iter().find(|l| l.id == id)
    }

    /// Look up any placeable entity by ID.
    pub fn entity(&self, id: EntityId) -> Option<Entity> {
        self.room(id)
            .cloned()
            .map(Entity::Room)
            .or_else(|| self.wall(id).cloned().map(Entity::Wall))
            .or_else(|| self.door(id).cloned().map(Entity::Door))
            .or_else(|| self.artwork(id).cloned().map(Entity::Artwork))
            .or_else(|| self.vertical_link(id).cloned().map(Entity::VerticalLink))
    }

    /// Insert an entity, replacing any existing one with the same ID in place.
    pub fn upsert(&mut self, entity: Entity) {
        fn put<T>(items: &mut Vec<T>, item: T, same: impl Fn(&T) -> bool) {
            match items.iter_mut().find(|i| same(i)) {
                Some(slot) => *slot = item,
                None => items.push(item),
            }
        }
        match entity {
            Entity::Room(r) => {
                let id = r.id;
                put(&mut self.rooms, r, |x| x.id == id);
            }
            Entity::Wall(w) => {
                let id = w.id;
                put(&mut self.walls, w, |x| x.id == id);
            }
            Entity::Door(d) => {
                let id = d.id;
                put(&mut self.doors, d, |x| x.id == id);
            }
            Entity::Artwork(a) => {
                let id = a.id;
                put(&mut self.artworks, a, |x| x.id == id);
            }
            Entity::VerticalLink(l) => {
                let id = l.id;
                put(&mut self.vertical_links, l, |x| x.id == id);
            }
        }
    }

    /// A copy of this floor with `room` substituted for the room of the same ID.
    pub fn with_room(&self, room: &Room) -> Floor {
        let mut floor = self.clone();
        floor.upsert(Entity::Room(room.clone()));
        floor
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
            && self.walls.is_empty()
            && self.doors.is_empty()
            && self.artworks.is_empty()
            && self.vertical_links.is_empty()
    }
}

/// The whole building: the unit exchanged with the persistence collaborator.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FloorSet {
    pub floors: Vec<Floor>,
}

impl FloorSet {
    pub fn floor(&self, id: EntityId) -> Option<&Floor> {
        self.floors.iter().find(|f| f.id == id)
    }
}
