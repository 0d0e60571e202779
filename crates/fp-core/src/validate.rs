//! Placement rules per entity kind.
//!
//! Every validator is a pure function of (candidate, floor snapshot, config)
//! returning a [`Validation`]. Validators never mutate state and never panic;
//! an invalid placement is communicated only through the result.

use crate::geometry::{
    boundary_distance, bounds_of, is_self_intersecting, point_in_polygon, polygon_area,
    polygons_overlap, segment_distance, segments_cross,
};
use crate::id::EntityId;
use crate::model::{Artwork, Door, Entity, Floor, FloorSet, Point, Room, VerticalLink, Wall};
use crate::topology::{RoomGraph, shared_walls_between, unreachable_floors};
use serde::{Deserialize, Serialize};

// ─── Results ─────────────────────────────────────────────────────────────

/// How strongly a finding affects the operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// Advisory only.
    Info,
    /// Allowed, with a visible notice.
    Warning,
    /// Blocks the operation.
    Error,
}

/// Discriminated validation outcome.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Validation {
    pub valid: bool,
    pub severity: Option<Severity>,
    pub message: Option<String>,
}

impl Validation {
    pub fn ok() -> Self {
        Self {
            valid: true,
            severity: None,
            message: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            severity: Some(Severity::Error),
            message: Some(message.into()),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            valid: true,
            severity: Some(Severity::Warning),
            message: Some(message.into()),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            valid: true,
            severity: Some(Severity::Info),
            message: Some(message.into()),
        }
    }

    /// Whether this result blocks the operation.
    pub fn is_blocking(&self) -> bool {
        !self.valid
    }

    /// Keep the more severe of two results; the first wins ties.
    #[must_use]
    pub fn and(self, other: Validation) -> Validation {
        if other.severity > self.severity {
            other
        } else {
            self
        }
    }

    /// Fold many results into the most severe one.
    pub fn worst(results: impl IntoIterator<Item = Validation>) -> Validation {
        results.into_iter().fold(Validation::ok(), Validation::and)
    }
}

// ─── Config ──────────────────────────────────────────────────────────────

/// Thresholds used by the validators. All lengths are in grid units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    pub min_room_area: f64,
    pub min_room_width: f64,
    pub min_room_height: f64,
    /// Longer side over shorter side of the room's bounding box.
    pub max_aspect_ratio: f64,
    /// Rooms may interpenetrate by up to this distance without counting as overlap.
    pub overlap_tolerance: f64,
    pub min_wall_length: f64,
    /// Wall endpoints closer than this to the room edge (but not on it) get a warning.
    pub min_wall_edge_distance: f64,
    pub min_door_width: f64,
    pub max_door_width: f64,
    /// Distance within which a door counts as lying on a shared wall.
    pub door_tolerance: f64,
    pub min_artwork_size: f64,
    pub max_artwork_size: f64,
    pub artwork_wall_clearance: f64,
    pub min_vertical_link_size: f64,
    /// Allow vertical links whose footprint lies in no room at all.
    pub allow_links_outside_rooms: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            min_room_area: 1.0,
            min_room_width: 1.0,
            min_room_height: 1.0,
            max_aspect_ratio: 20.0,
            overlap_tolerance: 0.05,
            min_wall_length: 0.5,
            min_wall_edge_distance: 0.25,
            min_door_width: 0.5,
            max_door_width: 4.0,
            door_tolerance: 0.05,
            min_artwork_size: 0.1,
            max_artwork_size: 20.0,
            artwork_wall_clearance: 0.2,
            min_vertical_link_size: 1.0,
            allow_links_outside_rooms: false,
        }
    }
}

impl ValidationConfig {
    /// Parse a partial JSON override; missing keys keep their defaults.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

// ─── Rooms ───────────────────────────────────────────────────────────────

/// Check a room candidate against the floor (its own previous version is ignored).
pub fn validate_room(room: &Room, floor: &Floor, config: &ValidationConfig) -> Validation {
    let poly = &room.polygon;
    if poly.len() < 3 {
        return Validation::error("A room needs at least 3 corners");
    }
    if is_self_intersecting(poly) {
        return Validation::error("Room outline crosses itself");
    }
    let area = polygon_area(poly);
    if area < config.min_room_area {
        return Validation::error(format!(
            "Room is too small ({area:.2} < {:.2} square units)",
            config.min_room_area
        ));
    }
    let b = bounds_of(poly);
    if b.width() < config.min_room_width || b.height() < config.min_room_height {
        return Validation::error(format!(
            "Room is too narrow ({:.2} × {:.2})",
            b.width(),
            b.height()
        ));
    }
    let aspect = b.width().max(b.height()) / b.width().min(b.height());
    if aspect > config.max_aspect_ratio {
        return Validation::error(format!(
            "Room is too elongated (aspect ratio {aspect:.1} > {:.1})",
            config.max_aspect_ratio
        ));
    }
    if let Some(other) = floor
        .rooms
        .iter()
        .filter(|r| r.id != room.id)
        .find(|r| polygons_overlap(poly, &r.polygon, config.overlap_tolerance))
    {
        return Validation::error(format!("Room overlaps {}", display_name(other)));
    }
    Validation::ok()
}

fn display_name(room: &Room) -> String {
    room.name
        .clone()
        .unwrap_or_else(|| format!("room {}", room.id))
}

/// After moving or reshaping `room`, every door referencing it must still sit
/// on a wall it shares with the door's other room.
pub fn validate_room_doors(room: &Room, floor: &Floor, config: &ValidationConfig) -> Validation {
    let floor = floor.with_room(room);
    Validation::worst(
        floor
            .doors
            .iter()
            .filter(|d| d.touches(room.id))
            .map(|d| {
                if door_on_shared_wall(d, &floor, config) {
                    Validation::ok()
                } else {
                    Validation::error(format!("Door {} would no longer sit on a shared wall", d.id))
                }
            }),
    )
}

/// Every wall owned by `room` must stay inside its polygon.
pub fn validate_room_walls(room: &Room, walls: &[Wall]) -> Validation {
    match walls
        .iter()
        .filter(|w| w.room_id == Some(room.id))
        .find(|w| !w.points().iter().all(|p| point_in_polygon(*p, &room.polygon)))
    {
        Some(w) => Validation::error(format!("Wall {} would end up outside its room", w.id)),
        None => Validation::ok(),
    }
}

// ─── Walls ───────────────────────────────────────────────────────────────

pub fn validate_wall(wall: &Wall, floor: &Floor, config: &ValidationConfig) -> Validation {
    let points = wall.points();
    if points.len() < 2 {
        return Validation::error("A wall needs at least 2 points");
    }
    let length = wall.length();
    if length < config.min_wall_length {
        return Validation::error(format!(
            "Wall is too short ({length:.2} < {:.2})",
            config.min_wall_length
        ));
    }
    let host = floor
        .rooms
        .iter()
        .find(|r| points.iter().all(|p| point_in_polygon(*p, &r.polygon)));
    let Some(host) = host else {
        return Validation::error("Wall must lie within a room");
    };
    let crosses = floor.walls.iter().filter(|w| w.id != wall.id).find(|other| {
        wall.pieces()
            .any(|(a1, a2)| other.pieces().any(|(b1, b2)| segments_cross(a1, a2, b1, b2)))
    });
    if let Some(other) = crosses {
        return Validation::error(format!("Wall crosses wall {}", other.id));
    }
    let too_close = [points[0], points[points.len() - 1]].into_iter().any(|p| {
        let d = boundary_distance(p, &host.polygon);
        d > config.door_tolerance && d < config.min_wall_edge_distance
    });
    if too_close {
        return Validation::warning("Wall ends very close to the room edge");
    }
    Validation::ok()
}

// ─── Doors ───────────────────────────────────────────────────────────────

pub fn validate_door(door: &Door, floor: &Floor, config: &ValidationConfig) -> Validation {
    if door.width < config.min_door_width || door.width > config.max_door_width {
        return Validation::error(format!(
            "Door width {:.2} is outside [{:.2}, {:.2}]",
            door.width, config.min_door_width, config.max_door_width
        ));
    }
    if door.room_a == door.room_b {
        return Validation::error("A door must connect two different rooms");
    }
    if floor.room(door.room_a).is_none() || floor.room(door.room_b).is_none() {
        return Validation::error("Door refers to a room that does not exist");
    }
    if !door_on_shared_wall(door, floor, config) {
        return Validation::error("Door must lie on a wall shared by its two rooms");
    }
    Validation::ok()
}

fn door_on_shared_wall(door: &Door, floor: &Floor, config: &ValidationConfig) -> bool {
    let (Some(a), Some(b)) = (floor.room(door.room_a), floor.room(door.room_b)) else {
        return false;
    };
    let [p, q] = door.segment;
    shared_walls_between(a, b, config.door_tolerance)
        .iter()
        .any(|w| w.contains_segment(p, q, config.door_tolerance))
}

// ─── Artworks ────────────────────────────────────────────────────────────

pub fn validate_artwork(artwork: &Artwork, floor: &Floor, config: &ValidationConfig) -> Validation {
    if let Some(size) = artwork.size {
        let (lo, hi) = (size.width.min(size.height), size.width.max(size.height));
        if lo < config.min_artwork_size || hi > config.max_artwork_size {
            return Validation::error(format!(
                "Artwork size {:.2} × {:.2} is outside [{:.2}, {:.2}]",
                size.width, size.height, config.min_artwork_size, config.max_artwork_size
            ));
        }
    }
    if room_containing_point(floor, artwork.position).is_none() {
        return Validation::error("Artwork must be placed inside a room");
    }
    let clearance = floor
        .walls
        .iter()
        .flat_map(|w| w.pieces())
        .map(|(a, b)| segment_distance(artwork.position, a, b))
        .fold(f64::INFINITY, f64::min);
    if clearance < config.artwork_wall_clearance {
        return Validation::warning("Artwork is very close to a wall");
    }
    Validation::ok()
}

// ─── Vertical links ──────────────────────────────────────────────────────

/// Footprint must fit inside one room (or inside none, when allowed).
pub fn validate_vertical_link(
    link: &VerticalLink,
    floor: &Floor,
    config: &ValidationConfig,
) -> Validation {
    if link.size.width < config.min_vertical_link_size
        || link.size.height < config.min_vertical_link_size
    {
        return Validation::error(format!(
            "{} footprint is smaller than {:.2}",
            capitalize(link.kind.label()),
            config.min_vertical_link_size
        ));
    }
    match room_enclosing_link(floor, link) {
        Some(_) => Validation::ok(),
        None if touches_any_room(floor, link) => {
            Validation::error("Vertical link must fit entirely inside a single room")
        }
        None if config.allow_links_outside_rooms => {
            Validation::info("Vertical link is not inside any room")
        }
        None => Validation::error("Vertical link must be placed inside a room"),
    }
}

/// Like [`validate_vertical_link`], but the footprint must stay in `room_id`.
pub fn validate_vertical_link_in_room(
    link: &VerticalLink,
    room_id: EntityId,
    floor: &Floor,
    config: &ValidationConfig,
) -> Validation {
    let base = validate_vertical_link(link, floor, config);
    if base.is_blocking() {
        return base;
    }
    match floor.room(room_id) {
        Some(room)
            if link
                .corners()
                .iter()
                .all(|c| point_in_polygon(*c, &room.polygon)) =>
        {
            base
        }
        _ => Validation::error("Vertical link must stay inside its room"),
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn touches_any_room(floor: &Floor, link: &VerticalLink) -> bool {
    floor.rooms.iter().any(|r| {
        link.corners()
            .iter()
            .any(|c| point_in_polygon(*c, &r.polygon))
    })
}

// ─── Dispatch ────────────────────────────────────────────────────────────

/// Run the placement validator matching the entity's kind.
pub fn validate_entity(entity: &Entity, floor: &Floor, config: &ValidationConfig) -> Validation {
    match entity {
        Entity::Room(r) => validate_room(r, floor, config),
        Entity::Wall(w) => validate_wall(w, floor, config),
        Entity::Door(d) => validate_door(d, floor, config),
        Entity::Artwork(a) => validate_artwork(a, floor, config),
        Entity::VerticalLink(l) => validate_vertical_link(l, floor, config),
    }
}

// ─── Containment lookups ─────────────────────────────────────────────────

/// First room (in floor order) whose polygon contains `p`.
pub fn room_containing_point(floor: &Floor, p: Point) -> Option<EntityId> {
    floor
        .rooms
        .iter()
        .find(|r| point_in_polygon(p, &r.polygon))
        .map(|r| r.id)
}

/// Room that contains all four corners of the link's rectangle.
pub fn room_enclosing_link(floor: &Floor, link: &VerticalLink) -> Option<EntityId> {
    let corners = link.corners();
    floor
        .rooms
        .iter()
        .find(|r| corners.iter().all(|c| point_in_polygon(*c, &r.polygon)))
        .map(|r| r.id)
}

// ─── Floor-level checks ──────────────────────────────────────────────────

/// Info-level report of rooms that no door connects, when the floor has several rooms.
pub fn validate_floor_connectivity(floor: &Floor) -> Validation {
    if floor.rooms.len() < 2 {
        return Validation::ok();
    }
    let isolated = RoomGraph::build(floor).isolated_rooms();
    if isolated.is_empty() {
        Validation::ok()
    } else {
        let names: Vec<_> = isolated.iter().map(|id| id.to_string()).collect();
        Validation::info(format!("No door reaches: {}", names.join(", ")))
    }
}

/// Info-level report of floors that no vertical link connects to the rest of the building.
pub fn validate_floor_links(floors: &FloorSet) -> Validation {
    let cut_off = unreachable_floors(floors);
    if cut_off.is_empty() {
        return Validation::ok();
    }
    let names: Vec<_> = cut_off
        .iter()
        .map(|id| floors.floor(*id).map_or_else(|| id.to_string(), |f| f.name.clone()))
        .collect();
    Validation::info(format!("No vertical link reaches: {}", names.join(", ")))
}
