//! Drag/edit engine.
//!
//! A [`DragSession`] lives for one pointer gesture. It snapshots everything
//! the gesture may touch, and every update recomputes the candidate floor
//! from that snapshot plus the total delta, so previews never accumulate
//! rounding drift. The orchestrator shows the candidate as transient state,
//! commits it once on a valid release, and restores the snapshot verbatim
//! otherwise.

use crate::config::EditorConfig;
use fp_core::cascade::{
    Translate, cascade_move_room, reparent_artwork, reparent_vertical_link,
    resize_vertical_link_corner,
};
use fp_core::geometry::point_in_polygon;
use fp_core::id::EntityId;
use fp_core::model::{Artwork, Door, Entity, Floor, Point, Room, VerticalLink, Wall};
use fp_core::snap::{SnapOptions, smart_snap, snap_to_grid};
use fp_core::validate::{
    Validation, validate_entity, validate_room, validate_room_doors, validate_room_walls,
    validate_vertical_link, validate_vertical_link_in_room,
};
use std::collections::{HashMap, HashSet};

// ─── Snapshot ────────────────────────────────────────────────────────────

/// Id-keyed copies of the entities a gesture may modify.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FloorSnapshot {
    pub rooms: HashMap<EntityId, Room>,
    pub walls: HashMap<EntityId, Wall>,
    pub doors: HashMap<EntityId, Door>,
    pub artworks: HashMap<EntityId, Artwork>,
    pub vertical_links: HashMap<EntityId, VerticalLink>,
}

impl FloorSnapshot {
    /// Capture `ids` and their cascade children.
    ///
    /// Moving a room re-derives membership of every artwork and vertical link
    /// on the floor, so all of those are captured whenever a room is included.
    pub fn capture(floor: &Floor, ids: &[EntityId]) -> Self {
        let mut snap = Self::default();
        for &id in ids {
            match floor.entity(id) {
                Some(Entity::Room(r)) => {
                    snap.rooms.insert(r.id, r);
                    for w in floor.walls.iter().filter(|w| w.room_id == Some(id)) {
                        snap.walls.insert(w.id, w.clone());
                    }
                    for d in floor.doors.iter().filter(|d| d.room_id == Some(id)) {
                        snap.doors.insert(d.id, d.clone());
                    }
                    for a in &floor.artworks {
                        snap.artworks.insert(a.id, a.clone());
                    }
                    for l in &floor.vertical_links {
                        snap.vertical_links.insert(l.id, l.clone());
                    }
                }
                Some(Entity::Wall(w)) => {
                    snap.walls.insert(w.id, w);
                }
                Some(Entity::Door(d)) => {
                    snap.doors.insert(d.id, d);
                }
                Some(Entity::Artwork(a)) => {
                    snap.artworks.insert(a.id, a);
                }
                Some(Entity::VerticalLink(l)) => {
                    snap.vertical_links.insert(l.id, l);
                }
                None => {}
            }
        }
        snap
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
            + self.walls.len()
            + self.doors.len()
            + self.artworks.len()
            + self.vertical_links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.rooms.contains_key(&id)
            || self.walls.contains_key(&id)
            || self.doors.contains_key(&id)
            || self.artworks.contains_key(&id)
            || self.vertical_links.contains_key(&id)
    }

    /// Write every captured entity back into `floor`, in place.
    pub fn restore(&self, floor: &mut Floor) {
        for r in self.rooms.values() {
            floor.upsert(Entity::Room(r.clone()));
        }
        for w in self.walls.values() {
            floor.upsert(Entity::Wall(w.clone()));
        }
        for d in self.doors.values() {
            floor.upsert(Entity::Door(d.clone()));
        }
        for a in self.artworks.values() {
            floor.upsert(Entity::Artwork(a.clone()));
        }
        for l in self.vertical_links.values() {
            floor.upsert(Entity::VerticalLink(l.clone()));
        }
    }

    /// A copy of `floor` with the snapshot restored.
    pub fn restored(&self, floor: &Floor) -> Floor {
        let mut out = floor.clone();
        self.restore(&mut out);
        out
    }
}

// ─── Session ─────────────────────────────────────────────────────────────

/// What a gesture drags.
#[derive(Debug, Clone, PartialEq)]
pub enum DragTarget {
    /// Whole elements, in selection order.
    Elements(Vec<EntityId>),
    Vertex { room_id: EntityId, index: usize },
    Segment { room_id: EntityId, index: usize },
    LinkCorner { link_id: EntityId, index: usize },
}

/// Result of one update: the candidate floor and its validity.
#[derive(Debug, Clone, PartialEq)]
pub struct DragOutcome {
    pub floor: Floor,
    pub validation: Validation,
}

#[derive(Debug, Clone)]
pub struct DragSession {
    target: DragTarget,
    /// Grid-snapped gesture start.
    origin: Point,
    snapshot: FloorSnapshot,
    delta: Point,
    validation: Validation,
}

impl DragSession {
    /// Start a gesture at world point `start`.
    pub fn begin(target: DragTarget, start: Point, floor: &Floor, grid_size: f64) -> Self {
        let ids = match &target {
            DragTarget::Elements(ids) => ids.clone(),
            DragTarget::Vertex { room_id, .. } | DragTarget::Segment { room_id, .. } => {
                vec![*room_id]
            }
            DragTarget::LinkCorner { link_id, .. } => vec![*link_id],
        };
        let snapshot = FloorSnapshot::capture(floor, &ids);
        log::trace!("drag begin {:?}: {} entities captured", target, snapshot.len());
        Self {
            target,
            origin: snap_to_grid(start, grid_size),
            snapshot,
            delta: Point::ZERO,
            validation: Validation::ok(),
        }
    }

    pub fn target(&self) -> &DragTarget {
        &self.target
    }

    pub fn snapshot(&self) -> &FloorSnapshot {
        &self.snapshot
    }

    pub fn validation(&self) -> &Validation {
        &self.validation
    }

    /// Whether the last update moved anything.
    pub fn changed(&self) -> bool {
        self.delta != Point::ZERO
    }

    /// History label for a committed gesture.
    pub fn label(&self) -> String {
        match &self.target {
            DragTarget::Elements(ids) if ids.len() == 1 => {
                let kind = if self.snapshot.rooms.contains_key(&ids[0]) {
                    "room"
                } else if self.snapshot.walls.contains_key(&ids[0]) {
                    "wall"
                } else if self.snapshot.doors.contains_key(&ids[0]) {
                    "door"
                } else if let Some(l) = self.snapshot.vertical_links.get(&ids[0]) {
                    l.kind.label()
                } else {
                    "artwork"
                };
                format!("Move {kind}")
            }
            DragTarget::Elements(ids) => format!("Move {} elements", ids.len()),
            DragTarget::Vertex { .. } => "Edit vertex".to_string(),
            DragTarget::Segment { .. } => "Edit segment".to_string(),
            DragTarget::LinkCorner { link_id, .. } => {
                let kind = self
                    .snapshot
                    .vertical_links
                    .get(link_id)
                    .map_or("stairs", |l| l.kind.label());
                format!("Resize {kind}")
            }
        }
    }

    /// Pointer moved to world point `current`.
    pub fn update(&mut self, current: Point, floor: &Floor, config: &EditorConfig, grid_size: f64) -> DragOutcome {
        let delta = snap_to_grid(current, grid_size) - self.origin;
        self.apply_delta(delta, floor, config, grid_size)
    }

    /// Candidate floor for a total displacement of `delta` from the snapshot.
    pub fn apply_delta(
        &mut self,
        delta: Point,
        floor: &Floor,
        config: &EditorConfig,
        grid_size: f64,
    ) -> DragOutcome {
        let base = self.snapshot.restored(floor);
        let (floor, validation) = match self.target.clone() {
            DragTarget::Elements(ids) => self.move_elements(&ids, delta, base, config, grid_size),
            DragTarget::Vertex { room_id, index } => {
                self.edit_vertices(room_id, &[index], delta, base, config, grid_size)
            }
            DragTarget::Segment { room_id, index } => {
                let n = self.snapshot.rooms.get(&room_id).map_or(0, |r| r.polygon.len());
                let next = if n == 0 { 0 } else { (index + 1) % n };
                self.edit_vertices(room_id, &[index, next], delta, base, config, grid_size)
            }
            DragTarget::LinkCorner { link_id, index } => {
                self.resize_corner(link_id, index, delta, base, config, grid_size)
            }
        };
        log::trace!(
            "drag update ({:.2}, {:.2}) valid={}",
            delta.x,
            delta.y,
            validation.valid
        );
        self.delta = delta;
        self.validation = validation.clone();
        DragOutcome { floor, validation }
    }

    /// The floor with every captured entity put back.
    pub fn cancel(&self, floor: &Floor) -> Floor {
        log::trace!("drag restore: {} entities", self.snapshot.len());
        self.snapshot.restored(floor)
    }

    fn move_elements(
        &self,
        ids: &[EntityId],
        delta: Point,
        mut floor: Floor,
        config: &EditorConfig,
        grid_size: f64,
    ) -> (Floor, Validation) {
        let cfg = &config.validation;
        let mut moved: HashSet<EntityId> = HashSet::new();
        let mut rooms = Vec::new();
        let mut orphans = Vec::new();

        for &id in ids {
            if moved.contains(&id) {
                continue;
            }
            match floor.entity(id) {
                Some(Entity::Room(room)) => {
                    let result = cascade_move_room(&room, delta, &floor);
                    orphans.extend(result.orphans.iter().copied());
                    moved.extend(result.touched());
                    floor = result.apply_to(&floor);
                    rooms.push(id);
                }
                Some(Entity::Door(door)) => {
                    floor.upsert(Entity::Door(door.translated(door_delta(&door, delta, grid_size))));
                    moved.insert(id);
                }
                Some(Entity::Artwork(art)) => {
                    let (art, _) = reparent_artwork(&art.translated(delta), &floor);
                    floor.upsert(Entity::Artwork(art));
                    moved.insert(id);
                }
                Some(Entity::VerticalLink(link)) => {
                    let (link, _) = reparent_vertical_link(&link.translated(delta), &floor);
                    floor.upsert(Entity::VerticalLink(link));
                    moved.insert(id);
                }
                Some(entity @ Entity::Wall(_)) => {
                    floor.upsert(entity.translated(delta));
                    moved.insert(id);
                }
                None => {}
            }
        }

        let validation = Validation::worst(
            ids.iter()
                .filter_map(|id| floor.entity(*id))
                .map(|e| validate_entity(&e, &floor, cfg))
                .chain(
                    rooms
                        .iter()
                        .filter_map(|id| floor.room(*id))
                        .map(|r| validate_room_doors(r, &floor, cfg)),
                )
                .chain(orphan_warning(&orphans)),
        );
        (floor, validation)
    }

    fn edit_vertices(
        &self,
        room_id: EntityId,
        indices: &[usize],
        delta: Point,
        mut floor: Floor,
        config: &EditorConfig,
        grid_size: f64,
    ) -> (Floor, Validation) {
        let Some(original) = self.snapshot.rooms.get(&room_id) else {
            return (floor, Validation::error("Room no longer exists"));
        };
        let options = SnapOptions {
            grid_size,
            ..config.snap.excluding(room_id)
        };
        let mut room = original.clone();
        for &i in indices {
            if let Some(v) = original.polygon.get(i) {
                room.polygon[i] = smart_snap(*v + delta, &floor, &options).point;
            }
        }
        let validation = validate_room(&room, &floor, &config.validation)
            .and(validate_room_doors(&room, &floor, &config.validation))
            .and(validate_room_walls(&room, &floor.walls));
        floor.upsert(Entity::Room(room));
        let stranded = rederive_children(&mut floor, original);
        (floor, validation.and(stranded))
    }

    fn resize_corner(
        &self,
        link_id: EntityId,
        index: usize,
        delta: Point,
        mut floor: Floor,
        config: &EditorConfig,
        grid_size: f64,
    ) -> (Floor, Validation) {
        let Some(original) = self.snapshot.vertical_links.get(&link_id) else {
            return (floor, Validation::error("Vertical link no longer exists"));
        };
        let corner = original.corners().get(index).copied().unwrap_or(original.position);
        let link = resize_vertical_link_corner(original, index, snap_to_grid(corner + delta, grid_size));
        let validation = match link.room_id {
            Some(room_id) => validate_vertical_link_in_room(&link, room_id, &floor, &config.validation),
            None => validate_vertical_link(&link, &floor, &config.validation),
        };
        floor.upsert(Entity::VerticalLink(link));
        (floor, validation)
    }
}

/// Re-derive artwork and vertical-link owners after `original` was reshaped.
///
/// Children that sat inside `original` and now fit in no room make the edit
/// invalid. Children that were already outside every room are left alone.
fn rederive_children(floor: &mut Floor, original: &Room) -> Validation {
    let was_inside = |p: &Point| point_in_polygon(*p, &original.polygon);
    let owned = |id: Option<EntityId>| id == Some(original.id);
    let mut stranded = 0;
    for art in floor.artworks.clone() {
        let (art, orphaned) = reparent_artwork(&art, floor);
        if orphaned && owned(art.room_id) && was_inside(&art.position) {
            stranded += 1;
        }
        floor.upsert(Entity::Artwork(art));
    }
    for link in floor.vertical_links.clone() {
        let (link, orphaned) = reparent_vertical_link(&link, floor);
        if orphaned && owned(link.room_id) && link.corners().iter().all(was_inside) {
            stranded += 1;
        }
        floor.upsert(Entity::VerticalLink(link));
    }
    match stranded {
        0 => Validation::ok(),
        1 => Validation::error("Edit would leave an element outside every room"),
        n => Validation::error(format!("Edit would leave {n} elements outside every room")),
    }
}

fn orphan_warning(orphans: &[EntityId]) -> Option<Validation> {
    (!orphans.is_empty()).then(|| {
        log::debug!("move left {} children outside every room", orphans.len());
        Validation::warning(format!("{} elements are outside every room", orphans.len()))
    })
}

/// Doors slide along their own axis only, in whole grid steps.
pub fn door_delta(door: &Door, delta: Point, grid_size: f64) -> Point {
    let Some(axis) = door.axis() else {
        return Point::ZERO;
    };
    let along = delta.dot(axis);
    let along = if grid_size > 0.0 {
        (along / grid_size).round() * grid_size
    } else {
        along
    };
    axis * along
}

#[cfg(test)]
mod tests {
    use super::*;
    use fp_core::model::{Size, VerticalLinkKind};
    use fp_core::validate::Severity;
    use pretty_assertions::assert_eq;
    use smallvec::smallvec;

    fn id(s: &str) -> EntityId {
        EntityId::intern(s)
    }

    fn rect(name: &str, x: f64, y: f64, w: f64, h: f64) -> Room {
        Room::new(
            id(name),
            vec![
                Point::new(x, y),
                Point::new(x + w, y),
                Point::new(x + w, y + h),
                Point::new(x, y + h),
            ],
        )
    }

    fn floor() -> Floor {
        let mut f = Floor::new(id("drag_floor"), "Ground");
        f.rooms.push(rect("drag_a", 0.0, 0.0, 6.0, 6.0));
        f.rooms.push(rect("drag_b", 6.0, 0.0, 6.0, 6.0));
        f.rooms.push(rect("drag_far", 20.0, 0.0, 4.0, 4.0));
        f.walls.push(Wall {
            room_id: Some(id("drag_far")),
            ..Wall::segment(id("drag_wall"), Point::new(21.0, 1.0), Point::new(23.0, 1.0), 0.2)
        });
        f.doors.push(Door {
            id: id("drag_door"),
            segment: [Point::new(6.0, 1.0), Point::new(6.0, 2.0)],
            width: 1.0,
            room_a: id("drag_a"),
            room_b: id("drag_b"),
            room_id: Some(id("drag_a")),
        });
        f.vertical_links.push(VerticalLink {
            id: id("drag_stairs"),
            kind: VerticalLinkKind::Stairs,
            floor_id: id("drag_floor"),
            position: Point::new(1.0, 1.0),
            size: Size::new(2.0, 2.0),
            connected_floor_ids: smallvec![id("drag_floor")],
            room_id: Some(id("drag_a")),
            link_group_id: None,
            link_number: None,
        });
        f
    }

    #[test]
    fn door_slides_along_its_axis() {
        let f = floor();
        let door = f.door(id("drag_door")).cloned().expect("door");
        assert_eq!(door_delta(&door, Point::new(7.0, 1.6), 1.0), Point::new(0.0, 2.0));
    }

    #[test]
    fn room_drag_carries_children() {
        let f = floor();
        let mut s = DragSession::begin(
            DragTarget::Elements(vec![id("drag_far")]),
            Point::new(22.0, 2.0),
            &f,
            1.0,
        );
        let out = s.update(Point::new(22.2, 8.1), &f, &EditorConfig::default(), 1.0);
        assert!(out.validation.valid);
        assert_eq!(s.label(), "Move room");
        let wall = out.floor.wall(id("drag_wall")).expect("wall");
        assert_eq!(wall.points(), &[Point::new(21.0, 7.0), Point::new(23.0, 7.0)]);
    }

    #[test]
    fn invalid_drag_restores_verbatim() {
        let f = floor();
        let mut s = DragSession::begin(
            DragTarget::Elements(vec![id("drag_far")]),
            Point::new(22.0, 2.0),
            &f,
            1.0,
        );
        let out = s.update(Point::new(10.0, 2.0), &f, &EditorConfig::default(), 1.0);
        assert!(!out.validation.valid);
        assert_eq!(s.cancel(&out.floor), f);
    }

    #[test]
    fn vertex_edit_reshapes_room() {
        let f = floor();
        let mut s = DragSession::begin(
            DragTarget::Vertex {
                room_id: id("drag_far"),
                index: 2,
            },
            Point::new(24.0, 4.0),
            &f,
            1.0,
        );
        let out = s.update(Point::new(25.0, 5.0), &f, &EditorConfig::default(), 1.0);
        assert!(out.validation.valid);
        assert_eq!(out.floor.room(id("drag_far")).expect("room").polygon[2], Point::new(25.0, 5.0));
        assert_eq!(s.label(), "Edit vertex");
    }

    #[test]
    fn segment_edit_moves_both_ends() {
        let f = floor();
        let mut s = DragSession::begin(
            DragTarget::Segment {
                room_id: id("drag_far"),
                index: 1,
            },
            Point::new(24.0, 2.0),
            &f,
            1.0,
        );
        let out = s.update(Point::new(26.0, 2.0), &f, &EditorConfig::default(), 1.0);
        let poly = &out.floor.room(id("drag_far")).expect("room").polygon;
        assert_eq!(poly[1], Point::new(26.0, 0.0));
        assert_eq!(poly[2], Point::new(26.0, 4.0));
    }

    #[test]
    fn segment_edit_cannot_leave_an_owned_wall_outside() {
        let f = floor();
        let mut s = DragSession::begin(
            DragTarget::Segment {
                room_id: id("drag_far"),
                index: 1,
            },
            Point::new(24.0, 2.0),
            &f,
            1.0,
        );
        let out = s.update(Point::new(22.0, 2.0), &f, &EditorConfig::default(), 1.0);
        assert!(!out.validation.valid);
        assert_eq!(
            out.validation.message.as_deref(),
            Some("Wall drag_wall would end up outside its room")
        );
        assert_eq!(s.cancel(&out.floor), f);
    }

    #[test]
    fn segment_edit_cannot_strand_stairs() {
        let f = floor();
        let mut s = DragSession::begin(
            DragTarget::Segment {
                room_id: id("drag_a"),
                index: 2,
            },
            Point::new(3.0, 6.0),
            &f,
            1.0,
        );
        let out = s.update(Point::new(3.0, 2.0), &f, &EditorConfig::default(), 1.0);
        assert!(!out.validation.valid);
        assert_eq!(
            out.validation.message.as_deref(),
            Some("Edit would leave an element outside every room")
        );
        assert_eq!(s.cancel(&out.floor), f);
    }

    #[test]
    fn growing_a_room_adopts_a_stray_artwork() {
        let mut f = floor();
        f.artworks.push(Artwork {
            id: id("drag_stray"),
            position: Point::new(26.0, 2.0),
            size: None,
            name: None,
            room_id: None,
        });
        let mut s = DragSession::begin(
            DragTarget::Segment {
                room_id: id("drag_far"),
                index: 1,
            },
            Point::new(24.0, 2.0),
            &f,
            1.0,
        );
        let out = s.update(Point::new(28.0, 2.0), &f, &EditorConfig::default(), 1.0);
        assert!(out.validation.valid);
        let art = out.floor.artwork(id("drag_stray")).expect("artwork");
        assert_eq!(art.room_id, Some(id("drag_far")));
    }

    #[test]
    fn moving_a_room_flags_children_left_outside() {
        let mut f = floor();
        f.artworks.push(Artwork {
            id: id("drag_loose"),
            position: Point::new(30.0, 2.0),
            size: None,
            name: None,
            room_id: Some(id("drag_far")),
        });
        let mut s = DragSession::begin(
            DragTarget::Elements(vec![id("drag_far")]),
            Point::new(22.0, 2.0),
            &f,
            1.0,
        );
        let out = s.update(Point::new(22.0, 12.0), &f, &EditorConfig::default(), 1.0);
        assert!(out.validation.valid);
        assert_eq!(out.validation.severity, Some(Severity::Warning));
    }

    #[test]
    fn corner_resize_stays_in_room() {
        let f = floor();
        let mut s = DragSession::begin(
            DragTarget::LinkCorner {
                link_id: id("drag_stairs"),
                index: 2,
            },
            Point::new(3.0, 3.0),
            &f,
            1.0,
        );
        let out = s.update(Point::new(5.0, 4.0), &f, &EditorConfig::default(), 1.0);
        assert!(out.validation.valid);
        let link = out.floor.vertical_link(id("drag_stairs")).expect("link");
        assert_eq!(link.size, Size::new(4.0, 3.0));
        assert_eq!(s.label(), "Resize stairs");

        let out = s.update(Point::new(9.0, 4.0), &f, &EditorConfig::default(), 1.0);
        assert!(!out.validation.valid);
    }
}
