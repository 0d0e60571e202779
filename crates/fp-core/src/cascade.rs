//! Entity & cascade service.
//!
//! Pure transforms over entities, plus the propagation of a room's move to
//! everything that names it as owner. Ownership is re-derived by containment
//! after each move instead of being trusted.

use crate::geometry::{Bounds, point_in_polygon, translate_points};
use crate::id::EntityId;
use crate::model::{
    Artwork, Door, Elevator, Entity, Escalator, Floor, FloorSet, Point, Room, Size, VerticalLink,
    Wall, WallGeometry,
};
use crate::validate::{room_containing_point, room_enclosing_link};
use std::collections::HashSet;

// ─── Translate ───────────────────────────────────────────────────────────

/// Copy-on-write translation by a delta.
pub trait Translate: Sized {
    #[must_use]
    fn translated(&self, delta: Point) -> Self;
}

impl Translate for Room {
    fn translated(&self, delta: Point) -> Self {
        Room {
            polygon: translate_points(&self.polygon, delta),
            holes: self
                .holes
                .iter()
                .map(|h| translate_points(h, delta))
                .collect(),
            ..self.clone()
        }
    }
}

impl Translate for Wall {
    fn translated(&self, delta: Point) -> Self {
        let geometry = match &self.geometry {
            WallGeometry::Segment([a, b]) => WallGeometry::Segment([*a + delta, *b + delta]),
            WallGeometry::Path(pts) => WallGeometry::Path(translate_points(pts, delta)),
        };
        Wall {
            geometry,
            ..self.clone()
        }
    }
}

impl Translate for Door {
    fn translated(&self, delta: Point) -> Self {
        Door {
            segment: [self.segment[0] + delta, self.segment[1] + delta],
            ..self.clone()
        }
    }
}

impl Translate for Artwork {
    fn translated(&self, delta: Point) -> Self {
        Artwork {
            position: self.position + delta,
            ..self.clone()
        }
    }
}

impl Translate for VerticalLink {
    fn translated(&self, delta: Point) -> Self {
        VerticalLink {
            position: self.position + delta,
            ..self.clone()
        }
    }
}

impl Translate for Escalator {
    fn translated(&self, delta: Point) -> Self {
        Escalator {
            start: self.start + delta,
            end: self.end + delta,
            ..self.clone()
        }
    }
}

impl Translate for Elevator {
    fn translated(&self, delta: Point) -> Self {
        Elevator {
            position: self.position + delta,
            ..self.clone()
        }
    }
}

impl Translate for Entity {
    fn translated(&self, delta: Point) -> Self {
        match self {
            Entity::Room(r) => Entity::Room(r.translated(delta)),
            Entity::Wall(w) => Entity::Wall(w.translated(delta)),
            Entity::Door(d) => Entity::Door(d.translated(delta)),
            Entity::Artwork(a) => Entity::Artwork(a.translated(delta)),
            Entity::VerticalLink(l) => Entity::VerticalLink(l.translated(delta)),
        }
    }
}

// ─── Room cascade ────────────────────────────────────────────────────────

/// Everything that changed when a room moved.
#[derive(Debug, Clone, PartialEq)]
pub struct CascadeResult {
    pub room: Room,
    pub walls: Vec<Wall>,
    pub doors: Vec<Door>,
    pub artworks: Vec<Artwork>,
    pub vertical_links: Vec<VerticalLink>,
    /// Children that no room contains any more; they keep their last `room_id`.
    pub orphans: Vec<EntityId>,
}

impl CascadeResult {
    /// Write every changed entity back into a copy of `floor`.
    pub fn apply_to(&self, floor: &Floor) -> Floor {
        let mut out = floor.clone();
        out.upsert(Entity::Room(self.room.clone()));
        for w in &self.walls {
            out.upsert(Entity::Wall(w.clone()));
        }
        for d in &self.doors {
            out.upsert(Entity::Door(d.clone()));
        }
        for a in &self.artworks {
            out.upsert(Entity::Artwork(a.clone()));
        }
        for l in &self.vertical_links {
            out.upsert(Entity::VerticalLink(l.clone()));
        }
        out
    }

    /// IDs of every entity the cascade touched, room first.
    pub fn touched(&self) -> Vec<EntityId> {
        std::iter::once(self.room.id)
            .chain(self.walls.iter().map(|w| w.id))
            .chain(self.doors.iter().map(|d| d.id))
            .chain(self.artworks.iter().map(|a| a.id))
            .chain(self.vertical_links.iter().map(|l| l.id))
            .collect()
    }
}

/// Translate `room` and every entity owned by it by `delta`, then re-derive
/// membership of artworks (centre test) and vertical links (all-corners test)
/// across the whole floor.
///
/// `room` is the room as currently stored on `floor`.
pub fn cascade_move_room(room: &Room, delta: Point, floor: &Floor) -> CascadeResult {
    let owned = |id: Option<EntityId>| id == Some(room.id);
    let moved = room.translated(delta);

    let walls: Vec<Wall> = floor
        .walls
        .iter()
        .filter(|w| owned(w.room_id))
        .map(|w| w.translated(delta))
        .collect();
    let doors: Vec<Door> = floor
        .doors
        .iter()
        .filter(|d| owned(d.room_id))
        .map(|d| d.translated(delta))
        .collect();

    let mut after = floor.with_room(&moved);
    for a in floor.artworks.iter().filter(|a| owned(a.room_id)) {
        after.upsert(Entity::Artwork(a.translated(delta)));
    }
    for l in floor.vertical_links.iter().filter(|l| owned(l.room_id)) {
        after.upsert(Entity::VerticalLink(l.translated(delta)));
    }

    let mut orphans = Vec::new();
    let mut artworks = Vec::new();
    for (before, now) in floor.artworks.iter().zip(&after.artworks) {
        let (art, orphaned) = reparent_artwork(now, &after);
        if orphaned && art.room_id.is_some() {
            orphans.push(art.id);
        }
        if art != *before {
            artworks.push(art);
        }
    }
    let mut vertical_links = Vec::new();
    for (before, now) in floor.vertical_links.iter().zip(&after.vertical_links) {
        let (link, orphaned) = reparent_vertical_link(now, &after);
        if orphaned && link.room_id.is_some() {
            orphans.push(link.id);
        }
        if link != *before {
            vertical_links.push(link);
        }
    }

    log::trace!(
        "cascade {} by ({:.2}, {:.2}): {} walls, {} doors, {} artworks, {} links",
        room.id,
        delta.x,
        delta.y,
        walls.len(),
        doors.len(),
        artworks.len(),
        vertical_links.len()
    );

    CascadeResult {
        room: moved,
        walls,
        doors,
        artworks,
        vertical_links,
        orphans,
    }
}

// ─── Re-parenting ────────────────────────────────────────────────────────

/// Re-derive an artwork's owner from its centre.
///
/// The current owner wins while it still contains the centre. Returns the
/// updated artwork and whether no room contains it (in which case `room_id`
/// is left unchanged).
pub fn reparent_artwork(artwork: &Artwork, floor: &Floor) -> (Artwork, bool) {
    let keeps = artwork
        .room_id
        .and_then(|id| floor.room(id))
        .is_some_and(|r| point_in_polygon(artwork.position, &r.polygon));
    if keeps {
        return (artwork.clone(), false);
    }
    match room_containing_point(floor, artwork.position) {
        Some(id) => (
            Artwork {
                room_id: Some(id),
                ..artwork.clone()
            },
            false,
        ),
        None => (artwork.clone(), true),
    }
}

/// Re-derive a vertical link's owner: all four corners must lie in one room.
///
/// Same contract as [`reparent_artwork`].
pub fn reparent_vertical_link(link: &VerticalLink, floor: &Floor) -> (VerticalLink, bool) {
    let keeps = link
        .room_id
        .and_then(|id| floor.room(id))
        .is_some_and(|r| link.corners().iter().all(|c| point_in_polygon(*c, &r.polygon)));
    if keeps {
        return (link.clone(), false);
    }
    match room_enclosing_link(floor, link) {
        Some(id) => (
            VerticalLink {
                room_id: Some(id),
                ..link.clone()
            },
            false,
        ),
        None => (link.clone(), true),
    }
}

/// Owner for a wall: the first room containing every centreline point.
pub fn room_enclosing_wall(floor: &Floor, wall: &Wall) -> Option<EntityId> {
    floor
        .rooms
        .iter()
        .find(|r| wall.points().iter().all(|p| point_in_polygon(*p, &r.polygon)))
        .map(|r| r.id)
}

/// Assign the derived owner to a freshly created entity.
pub fn assign_owner(entity: Entity, floor: &Floor) -> Entity {
    match entity {
        Entity::Wall(w) => {
            let room_id = room_enclosing_wall(floor, &w);
            Entity::Wall(Wall { room_id, ..w })
        }
        Entity::Door(d) => Entity::Door(Door {
            room_id: d.room_id.or(Some(d.room_a)),
            ..d
        }),
        Entity::Artwork(a) => Entity::Artwork(reparent_artwork(&a, floor).0),
        Entity::VerticalLink(l) => Entity::VerticalLink(reparent_vertical_link(&l, floor).0),
        room @ Entity::Room(_) => room,
    }
}

// ─── Corner resize ───────────────────────────────────────────────────────

/// Move corner `index` (in [`VerticalLink::corners`] order) to `to`, keeping
/// the opposite corner fixed. Out-of-range indices leave the link unchanged.
pub fn resize_vertical_link_corner(link: &VerticalLink, index: usize, to: Point) -> VerticalLink {
    if index >= 4 {
        return link.clone();
    }
    let anchor = link.corners()[(index + 2) % 4];
    let b = Bounds::from_corners(anchor, to);
    VerticalLink {
        position: Point::new(b.min_x, b.min_y),
        size: Size::new(b.width(), b.height()),
        ..link.clone()
    }
}

// ─── Removal ─────────────────────────────────────────────────────────────

/// Remove `ids` from one floor, together with everything owned by a removed
/// room and every door opening onto one. Vertical links sharing a group with
/// a removed link drop the removed link's floor from `connected_floor_ids`.
///
/// Returns every ID actually removed.
pub fn remove_entities(floors: &mut FloorSet, floor_id: EntityId, ids: &[EntityId]) -> Vec<EntityId> {
    let Some(floor) = floors.floors.iter_mut().find(|f| f.id == floor_id) else {
        return Vec::new();
    };
    let doomed: HashSet<EntityId> = ids.iter().copied().collect();
    let rooms: HashSet<EntityId> = floor
        .rooms
        .iter()
        .filter(|r| doomed.contains(&r.id))
        .map(|r| r.id)
        .collect();
    let goes = |id: EntityId, owner: Option<EntityId>| {
        doomed.contains(&id) || owner.is_some_and(|o| rooms.contains(&o))
    };

    let mut removed = Vec::new();
    let mut groups = Vec::new();
    floor.rooms.retain(|r| keep(&mut removed, r.id, rooms.contains(&r.id)));
    floor
        .walls
        .retain(|w| keep(&mut removed, w.id, goes(w.id, w.room_id)));
    floor.doors.retain(|d| {
        let gone = goes(d.id, d.room_id) || rooms.contains(&d.room_a) || rooms.contains(&d.room_b);
        keep(&mut removed, d.id, gone)
    });
    floor
        .artworks
        .retain(|a| keep(&mut removed, a.id, goes(a.id, a.room_id)));
    floor.vertical_links.retain(|l| {
        let gone = goes(l.id, l.room_id);
        if gone && let Some(g) = l.link_group_id {
            groups.push(g);
        }
        keep(&mut removed, l.id, gone)
    });

    if !groups.is_empty() {
        for other in floors.floors.iter_mut().filter(|f| f.id != floor_id) {
            for link in &mut other.vertical_links {
                if link.link_group_id.is_some_and(|g| groups.contains(&g)) {
                    link.connected_floor_ids.retain(|f| *f != floor_id);
                }
            }
        }
    }
    removed
}

fn keep(removed: &mut Vec<EntityId>, id: EntityId, gone: bool) -> bool {
    if gone {
        removed.push(id);
    }
    !gone
}
