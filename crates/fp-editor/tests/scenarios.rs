//! Integration tests: pointer and keyboard input → editor state (fp-editor).
//!
//! Screen coordinates are world coordinates scaled by the default 20 px per
//! unit at zoom 1, so `at(4.0, 3.0)` lands on world point (4, 3).

use fp_core::geometry::polygons_overlap;
use fp_core::{
    Artwork, Door, Entity, EntityId, Floor, FloorSet, MemoryStore, Point, Room, Severity, Size,
    VerticalLink, VerticalLinkKind, Wall,
};
use fp_editor::{Command, Editor, EditorConfig, InputEvent, Modifiers, SelectedElement, ToolKind};
use pretty_assertions::assert_eq;
use smallvec::smallvec;

const PPU: f64 = 20.0;

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn editor(floors: FloorSet) -> Editor {
    init();
    Editor::new(EditorConfig::default(), floors)
}

fn rect(id: EntityId, x: f64, y: f64, w: f64, h: f64) -> Room {
    Room::new(
        id,
        vec![
            Point::new(x, y),
            Point::new(x + w, y),
            Point::new(x + w, y + h),
            Point::new(x, y + h),
        ],
    )
}

fn one_floor(build: impl FnOnce(&mut Floor)) -> FloorSet {
    let mut floor = Floor::new(EntityId::intern("scenario_ground"), "Ground");
    build(&mut floor);
    FloorSet {
        floors: vec![floor],
    }
}

fn current(e: &Editor) -> &Floor {
    e.state().current_floor().expect("current floor")
}

/// The building as the latest history entry recorded it.
fn committed(e: &Editor) -> &FloorSet {
    &e.history().entries()[e.history().index()].snapshot.floors
}

/// Primary-button drag in world coordinates.
fn drag(e: &mut Editor, from: (f64, f64), to: (f64, f64), now_ms: u64) {
    e.handle(&InputEvent::down(from.0 * PPU, from.1 * PPU), now_ms);
    e.handle(&InputEvent::moved(to.0 * PPU, to.1 * PPU), now_ms);
    e.handle(&InputEvent::up(to.0 * PPU, to.1 * PPU), now_ms);
}

fn click(e: &mut Editor, at: (f64, f64), now_ms: u64) {
    e.handle(&InputEvent::down(at.0 * PPU, at.1 * PPU), now_ms);
    e.handle(&InputEvent::up(at.0 * PPU, at.1 * PPU), now_ms);
}

// ─── Drawing ─────────────────────────────────────────────────────────────

#[test]
fn rectangle_drag_creates_selected_room() {
    let mut e = editor(FloorSet::default());
    e.handle(&InputEvent::key("r"), 0);
    assert_eq!(e.state().selected_tool, ToolKind::Rectangle);

    drag(&mut e, (0.0, 0.0), (4.0, 3.0), 1_000);

    let floor = current(&e);
    assert_eq!(floor.rooms.len(), 1);
    assert_eq!(floor.rooms[0].polygon.len(), 4);
    let m = e.state().measurements.expect("room is selected");
    assert_eq!(m.area_m2, 3.0);
    assert_eq!(m.perimeter_m, 7.0);
    assert_eq!(e.history().undo_label(), Some("Create room"));
}

#[test]
fn overlapping_rectangle_is_rejected() {
    let mut e = editor(FloorSet::default());
    e.apply(Command::SetTool(ToolKind::Rectangle));
    drag(&mut e, (0.0, 0.0), (4.0, 3.0), 1_000);
    drag(&mut e, (2.0, 1.0), (6.0, 5.0), 2_000);

    assert_eq!(current(&e).rooms.len(), 1);
    assert_eq!(e.history().len(), 2);
    let status = e.state().status.clone().expect("rejection is reported");
    assert_eq!(status.severity, Some(Severity::Error));
}

#[test]
fn polygon_closes_on_first_vertex() {
    let mut e = editor(FloorSet::default());
    e.apply(Command::SetTool(ToolKind::Polygon));
    click(&mut e, (0.0, 0.0), 0);
    click(&mut e, (5.0, 0.0), 0);
    click(&mut e, (5.0, 4.0), 0);
    assert_eq!(e.state().current_polygon.as_ref().map(Vec::len), Some(3));
    click(&mut e, (0.0, 4.0), 0);
    click(&mut e, (0.2, 0.1), 0);

    let floor = current(&e);
    assert_eq!(floor.rooms.len(), 1);
    assert_eq!(floor.rooms[0].polygon.len(), 4);
    assert!(e.state().current_polygon.is_none());
    assert!(!e.is_gesture_active());
}

#[test]
fn escape_abandons_polygon_with_two_points() {
    let mut e = editor(FloorSet::default());
    e.apply(Command::SetTool(ToolKind::Polygon));
    click(&mut e, (0.0, 0.0), 0);
    click(&mut e, (5.0, 0.0), 0);
    e.handle(&InputEvent::key("Escape"), 0);
    assert!(current(&e).rooms.is_empty());
    assert!(e.state().current_polygon.is_none());
}

#[test]
fn stairs_wait_for_connected_floors() {
    let ground = EntityId::intern("scenario_ground");
    let hall = EntityId::intern("stairs_hall");
    let mut e = editor(one_floor(|f| f.rooms.push(rect(hall, 0.0, 0.0, 6.0, 6.0))));
    e.apply(Command::AddFloor {
        name: "First".into(),
    });
    let first = e.state().current_floor_id.expect("new floor is current");
    e.apply(Command::SwitchFloor(ground));

    e.apply(Command::SetTool(ToolKind::Stairs));
    drag(&mut e, (1.0, 1.0), (3.0, 3.0), 5_000);
    assert!(e.state().pending_link.is_some());
    assert!(current(&e).vertical_links.is_empty());

    e.apply(Command::FinishVerticalLink {
        connected_floor_ids: vec![first],
        link_group_id: Some(EntityId::intern("main_stairs")),
    });

    let link = &current(&e).vertical_links[0];
    assert_eq!(link.kind, VerticalLinkKind::Stairs);
    assert_eq!(link.connected_floor_ids.as_slice(), &[ground, first]);
    assert_eq!(link.room_id, Some(hall));
    assert_eq!(link.link_number, Some(1));
    assert_eq!(link.size, Size::new(2.0, 2.0));
    assert!(e.state().pending_link.is_none());
}

// ─── Dragging ────────────────────────────────────────────────────────────

#[test]
fn door_slides_only_along_its_wall() {
    let (a, b, door) = (
        EntityId::intern("door_room_a"),
        EntityId::intern("door_room_b"),
        EntityId::intern("door_between"),
    );
    let mut e = editor(one_floor(|f| {
        f.rooms.push(rect(a, 0.0, 0.0, 8.0, 4.0));
        f.rooms.push(rect(b, 0.0, 4.0, 8.0, 4.0));
        f.doors.push(Door {
            id: door,
            segment: [Point::new(1.0, 4.0), Point::new(2.0, 4.0)],
            width: 1.0,
            room_a: a,
            room_b: b,
            room_id: Some(a),
        });
    }));

    e.apply(Command::Move {
        targets: vec![door],
        delta: Point::new(3.0, 7.0),
    });
    let moved = current(&e).door(door).expect("door").segment;
    assert_eq!(moved, [Point::new(4.0, 4.0), Point::new(5.0, 4.0)]);

    drag(&mut e, (4.4, 4.0), (6.4, -3.0), 10_000);
    let moved = current(&e).door(door).expect("door").segment;
    assert_eq!(moved, [Point::new(6.0, 4.0), Point::new(7.0, 4.0)]);
    assert_eq!(e.history().undo_label(), Some("Move door"));
}

fn two_rooms_with_stairs() -> (FloorSet, [EntityId; 3]) {
    let ids = [
        EntityId::intern("link_room_a"),
        EntityId::intern("link_room_b"),
        EntityId::intern("link_stairs"),
    ];
    let [a, b, stairs] = ids;
    let floors = one_floor(|f| {
        f.rooms.push(rect(a, 0.0, 0.0, 6.0, 6.0));
        f.rooms.push(rect(b, 6.0, 0.0, 6.0, 6.0));
        f.vertical_links.push(VerticalLink {
            id: stairs,
            kind: VerticalLinkKind::Stairs,
            floor_id: f.id,
            position: Point::new(1.0, 1.0),
            size: Size::new(2.0, 2.0),
            connected_floor_ids: smallvec![f.id],
            room_id: Some(a),
            link_group_id: None,
            link_number: Some(1),
        });
    });
    (floors, ids)
}

#[test]
fn link_dragged_into_another_room_is_reparented() {
    let (floors, [_, b, stairs]) = two_rooms_with_stairs();
    let mut e = editor(floors);

    drag(&mut e, (2.0, 2.0), (9.0, 2.0), 1_000);

    let link = current(&e).vertical_link(stairs).expect("link");
    assert_eq!(link.position, Point::new(8.0, 1.0));
    assert_eq!(link.room_id, Some(b));
    assert_eq!(e.history().undo_label(), Some("Move stairs"));
}

#[test]
fn link_dragged_outside_every_room_is_restored() {
    let (floors, [a, _, stairs]) = two_rooms_with_stairs();
    let mut e = editor(floors);
    let before = current(&e).clone();

    drag(&mut e, (2.0, 2.0), (20.0, 2.0), 1_000);

    let link = current(&e).vertical_link(stairs).expect("link");
    assert_eq!(link.position, Point::new(1.0, 1.0));
    assert_eq!(link.room_id, Some(a));
    assert_eq!(*current(&e), before);
    assert!(!e.history().can_undo());
    let status = e.state().status.clone().expect("rejection is reported");
    assert_eq!(status.severity, Some(Severity::Error));
}

#[test]
fn escape_mid_drag_restores_everything() {
    let room = EntityId::intern("escape_room");
    let mut e = editor(one_floor(|f| f.rooms.push(rect(room, 0.0, 0.0, 4.0, 3.0))));
    let before = e.state().floors.clone();

    e.handle(&InputEvent::down(2.0 * PPU, 1.5 * PPU), 0);
    e.handle(&InputEvent::moved(7.0 * PPU, 1.5 * PPU), 0);
    assert_eq!(
        current(&e).room(room).map(|r| r.polygon[0]),
        Some(Point::new(5.0, 0.0))
    );

    e.handle(&InputEvent::key("Escape"), 0);
    assert_eq!(e.state().floors, before);
    assert!(e.state().selected_elements.is_empty());
    assert!(!e.is_gesture_active());
    assert!(!e.history().can_undo());
}

#[test]
fn room_drag_carries_its_artwork() {
    let room = EntityId::intern("carry_room");
    let art = EntityId::intern("carry_art");
    let mut e = editor(one_floor(|f| {
        f.rooms.push(rect(room, 0.0, 0.0, 4.0, 3.0));
        f.artworks.push(Artwork {
            id: art,
            position: Point::new(2.0, 1.5),
            size: Some(Size::new(1.0, 1.0)),
            name: Some("Bust".into()),
            room_id: Some(room),
        });
    }));

    drag(&mut e, (0.5, 0.5), (5.5, 0.5), 1_000);

    let moved = current(&e).artwork(art).expect("artwork");
    assert_eq!(moved.position, Point::new(7.0, 1.5));
    assert_eq!(moved.room_id, Some(room));
    assert_eq!(e.history().undo_label(), Some("Move room"));
}

#[test]
fn segment_edit_past_an_owned_wall_is_rejected() {
    let room = EntityId::intern("walled_room");
    let wall = EntityId::intern("walled_partition");
    let mut e = editor(one_floor(|f| {
        f.rooms.push(rect(room, 0.0, 0.0, 6.0, 6.0));
        f.walls.push(Wall {
            room_id: Some(room),
            ..Wall::segment(wall, Point::new(4.0, 1.0), Point::new(4.0, 5.0), 0.2)
        });
    }));
    let before = e.state().floors.clone();

    click(&mut e, (2.0, 3.0), 0);
    drag(&mut e, (6.0, 3.0), (2.0, 3.0), 1_000);

    assert_eq!(e.state().floors, before);
    assert_eq!(current(&e).wall(wall).and_then(|w| w.room_id), Some(room));
    assert!(!e.history().can_undo());
    let status = e.state().status.clone().expect("rejection is reported");
    assert_eq!(status.severity, Some(Severity::Error));
    assert_eq!(
        status.message.as_deref(),
        Some("Wall walled_partition would end up outside its room")
    );
}

#[test]
fn vertex_edit_re_derives_artwork_owners() {
    let room = EntityId::intern("reshaped_room");
    let (inside, stray) = (
        EntityId::intern("reshaped_inside"),
        EntityId::intern("reshaped_stray"),
    );
    let art = |id, x, room_id| Artwork {
        id,
        position: Point::new(x, 3.0),
        size: None,
        name: None,
        room_id,
    };
    let mut e = editor(one_floor(|f| {
        f.rooms.push(rect(room, 0.0, 0.0, 6.0, 6.0));
        f.artworks.push(art(inside, 5.0, Some(room)));
        f.artworks.push(art(stray, 8.0, None));
    }));
    let before = e.state().floors.clone();
    click(&mut e, (2.0, 2.0), 0);

    // Pulling the corner in would leave the owned artwork in no room.
    drag(&mut e, (6.0, 6.0), (3.0, 6.0), 1_000);
    assert_eq!(e.state().floors, before);
    assert!(!e.history().can_undo());

    // Pushing it out takes in the stray one.
    drag(&mut e, (6.0, 6.0), (12.0, 6.0), 2_000);
    let floor = current(&e);
    assert_eq!(floor.room(room).map(|r| r.polygon[2]), Some(Point::new(12.0, 6.0)));
    assert_eq!(floor.artwork(inside).and_then(|a| a.room_id), Some(room));
    assert_eq!(floor.artwork(stray).and_then(|a| a.room_id), Some(room));
    assert_eq!(e.history().undo_label(), Some("Edit vertex"));

    e.apply(Command::Undo);
    assert_eq!(e.state().floors, before);
}

fn rooms_apart() -> (FloorSet, [EntityId; 2]) {
    let ids = [
        EntityId::intern("midgesture_a"),
        EntityId::intern("midgesture_b"),
    ];
    let floors = one_floor(|f| {
        f.rooms.push(rect(ids[0], 0.0, 0.0, 4.0, 4.0));
        f.rooms.push(rect(ids[1], 10.0, 0.0, 4.0, 4.0));
    });
    (floors, ids)
}

#[test]
fn duplicate_mid_drag_acts_on_committed_plan() {
    let (floors, [a, _]) = rooms_apart();
    let mut e = editor(floors);
    click(&mut e, (2.0, 2.0), 0);

    // Drag a onto b and press Ctrl+D before releasing.
    e.handle(&InputEvent::down(2.0 * PPU, 2.0 * PPU), 1_000);
    e.handle(&InputEvent::moved(12.0 * PPU, 2.0 * PPU), 1_000);
    assert_eq!(
        current(&e).room(a).map(|r| r.polygon[0]),
        Some(Point::new(10.0, 0.0))
    );
    e.handle(&InputEvent::key_with("d", Modifiers::CTRL), 1_100);
    assert!(!e.is_gesture_active());

    e.handle(&InputEvent::moved(13.0 * PPU, 2.0 * PPU), 1_200);
    e.handle(&InputEvent::up(13.0 * PPU, 2.0 * PPU), 1_200);

    let floor = current(&e);
    assert_eq!(e.history().undo_label(), Some("Duplicate"));
    assert_eq!(floor.rooms.len(), 3);
    assert_eq!(floor.room(a).map(|r| r.polygon[0]), Some(Point::new(0.0, 0.0)));
    assert_eq!(floor.rooms[2].polygon[0], Point::new(5.0, 0.0));
    for (i, r) in floor.rooms.iter().enumerate() {
        for other in &floor.rooms[i + 1..] {
            assert!(!polygons_overlap(&r.polygon, &other.polygon, 0.05));
        }
    }
    assert_eq!(&e.state().floors, committed(&e));
}

#[test]
fn delete_mid_drag_stays_deleted() {
    let (floors, [a, b]) = rooms_apart();
    let mut e = editor(floors);
    click(&mut e, (2.0, 2.0), 0);

    e.handle(&InputEvent::down(2.0 * PPU, 2.0 * PPU), 1_000);
    e.handle(&InputEvent::moved(12.0 * PPU, 2.0 * PPU), 1_000);
    e.handle(&InputEvent::key("Delete"), 1_100);
    e.handle(&InputEvent::moved(13.0 * PPU, 2.0 * PPU), 1_200);
    e.handle(&InputEvent::up(13.0 * PPU, 2.0 * PPU), 1_200);

    assert!(current(&e).room(a).is_none());
    assert_eq!(current(&e).rooms.len(), 1);
    assert!(e.state().selected_elements.is_empty());
    assert_eq!(&e.state().floors, committed(&e));
    assert_eq!(e.history().undo_label(), Some("Delete room"));

    e.apply(Command::Undo);
    assert_eq!(current(&e).room(a).map(|r| r.polygon[0]), Some(Point::new(0.0, 0.0)));
    assert!(current(&e).room(b).is_some());
}

// ─── Selection ───────────────────────────────────────────────────────────

#[test]
fn box_select_picks_up_rooms() {
    let (a, b) = (EntityId::intern("box_a"), EntityId::intern("box_b"));
    let mut e = editor(one_floor(|f| {
        f.rooms.push(rect(a, 0.0, 0.0, 4.0, 3.0));
        f.rooms.push(rect(b, 6.0, 0.0, 4.0, 3.0));
    }));

    drag(&mut e, (-1.0, -1.0), (11.0, 4.0), 0);

    assert_eq!(
        e.state().selected_elements.as_slice(),
        &[SelectedElement::Room(a), SelectedElement::Room(b)]
    );
    assert!(e.state().measurements.is_none());
}

#[test]
fn delete_cascades_and_undo_brings_it_back() {
    let room = EntityId::intern("delete_room");
    let art = EntityId::intern("delete_art");
    let mut e = editor(one_floor(|f| f.rooms.push(rect(room, 0.0, 0.0, 4.0, 3.0))));
    e.apply(Command::Create(Entity::Artwork(Artwork {
        id: art,
        position: Point::new(2.0, 1.5),
        size: Some(Size::new(1.0, 1.0)),
        name: None,
        room_id: None,
    })));
    assert_eq!(current(&e).artwork(art).and_then(|a| a.room_id), Some(room));

    click(&mut e, (0.5, 0.5), 5_000);
    assert_eq!(
        e.state().selected_elements.as_slice(),
        &[SelectedElement::Room(room)]
    );
    e.handle(&InputEvent::key("Delete"), 6_000);

    assert!(current(&e).rooms.is_empty());
    assert!(current(&e).artworks.is_empty());
    assert!(e.state().selected_elements.is_empty());
    assert_eq!(e.history().undo_label(), Some("Delete room"));

    e.apply(Command::Undo);
    assert!(current(&e).room(room).is_some());
    assert!(current(&e).artwork(art).is_some());
}

// ─── Persistence ─────────────────────────────────────────────────────────

#[test]
fn save_and_reload_through_memory_store() {
    let room = EntityId::intern("saved_room");
    let mut e = editor(one_floor(|f| f.rooms.push(rect(room, 0.0, 0.0, 4.0, 3.0))));
    let committed = e.state().floors.clone();

    // A drag in progress is not what gets saved.
    e.handle(&InputEvent::down(2.0 * PPU, 1.5 * PPU), 0);
    e.handle(&InputEvent::moved(9.0 * PPU, 1.5 * PPU), 0);

    let mut store = MemoryStore::new();
    e.save_to(&mut store).expect("save");

    let mut other = Editor::default();
    other.load_from(&mut store).expect("load");
    assert_eq!(other.state().floors, committed);
    assert!(!other.history().can_undo());
}
