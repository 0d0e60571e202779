//! Integration tests: fixture plan → validation, cascade, re-parenting,
//! topology and persistence.

use fp_core::cascade::{Translate, cascade_move_room, reparent_vertical_link};
use fp_core::geometry::polygon_area;
use fp_core::snap::{SnapOptions, SnapType, smart_snap};
use fp_core::topology::{RoomGraph, floor_graph, shared_walls, unreachable_floors};
use fp_core::validate::{
    Severity, ValidationConfig, validate_floor_connectivity, validate_room, validate_room_doors,
    validate_vertical_link,
};
use fp_core::{EntityId, Floor, FloorSet, MemoryStore, Persistence, Point, Room};
use pretty_assertions::assert_eq;

fn gallery() -> FloorSet {
    serde_json::from_str(include_str!("fixtures/gallery.json")).expect("fixture parses")
}

fn ground(set: &FloorSet) -> &Floor {
    set.floor(EntityId::intern("ground")).expect("ground floor")
}

fn room<'a>(floor: &'a Floor, name: &str) -> &'a Room {
    floor.room(EntityId::intern(name)).expect("room exists")
}

// ─── Validation ──────────────────────────────────────────────────────────

#[test]
fn fixture_rooms_are_valid_in_place() {
    let set = gallery();
    let floor = ground(&set);
    let cfg = ValidationConfig::default();
    for r in &floor.rooms {
        let v = validate_room(r, floor, &cfg);
        assert!(v.valid, "{} rejected: {:?}", r.id, v.message);
    }
    assert_eq!(polygon_area(&room(floor, "lobby").polygon), 80.0);
}

#[test]
fn room_dropped_onto_another_is_rejected() {
    let set = gallery();
    let floor = ground(&set);
    let annex = room(floor, "annex").translated(Point::new(-26.0, 0.0));
    let v = validate_room(&annex, floor, &ValidationConfig::default());
    assert!(!v.valid);
    assert_eq!(v.severity, Some(Severity::Error));
}

// ─── Cascade ─────────────────────────────────────────────────────────────

#[test]
fn lobby_move_carries_every_child() {
    let set = gallery();
    let floor = ground(&set);
    let delta = Point::new(0.0, 1.5);
    let result = cascade_move_room(room(floor, "lobby"), delta, floor);

    let touched = result.touched();
    for id in ["lobby", "lobby_partition", "lobby_east_door", "bust", "main_stairs"] {
        assert!(touched.contains(&EntityId::intern(id)), "{id} not moved");
    }
    assert!(!touched.contains(&EntityId::intern("tapestry")));
    assert!(!touched.contains(&EntityId::intern("east_hall")));

    let moved = result.apply_to(floor);
    for (before, after) in floor.artworks.iter().zip(&moved.artworks) {
        let expected = if before.room_id == Some(EntityId::intern("lobby")) {
            before.position + delta
        } else {
            before.position
        };
        assert_eq!(after.position, expected);
    }
    assert_eq!(
        moved.vertical_links[0].position,
        floor.vertical_links[0].position + delta
    );
}

#[test]
fn sliding_lobby_away_strands_its_door() {
    let set = gallery();
    let floor = ground(&set);
    let cfg = ValidationConfig::default();
    let along = room(floor, "lobby").translated(Point::new(0.0, 1.0));
    assert!(validate_room_doors(&along, floor, &cfg).valid);
    let away = room(floor, "lobby").translated(Point::new(-3.0, 0.0));
    assert!(!validate_room_doors(&away, floor, &cfg).valid);
}

// ─── Re-parenting ────────────────────────────────────────────────────────

#[test]
fn stairs_moved_into_east_hall_change_owner() {
    let set = gallery();
    let floor = ground(&set);
    let stairs = floor.vertical_links[0].translated(Point::new(6.0, 0.0));
    let (stairs, orphaned) = reparent_vertical_link(&stairs, floor);
    assert!(!orphaned);
    assert_eq!(stairs.room_id, Some(EntityId::intern("east_hall")));
    assert!(validate_vertical_link(&stairs, floor, &ValidationConfig::default()).valid);
}

#[test]
fn stairs_moved_into_empty_space_keep_owner_and_fail() {
    let set = gallery();
    let floor = ground(&set);
    let stairs = floor.vertical_links[0].translated(Point::new(15.0, 0.0));
    let (stairs, orphaned) = reparent_vertical_link(&stairs, floor);
    assert!(orphaned);
    assert_eq!(stairs.room_id, Some(EntityId::intern("lobby")));
    assert!(!validate_vertical_link(&stairs, floor, &ValidationConfig::default()).valid);
}

// ─── Topology ────────────────────────────────────────────────────────────

#[test]
fn gallery_topology() {
    let set = gallery();
    let floor = ground(&set);
    let walls = shared_walls(floor, 0.01);
    assert_eq!(walls.len(), 1);
    assert_eq!(walls[0].length(), 8.0);

    let graph = RoomGraph::build(floor);
    assert_eq!(graph.isolated_rooms(), vec![EntityId::intern("annex")]);
    let v = validate_floor_connectivity(floor);
    assert_eq!(v.severity, Some(Severity::Info));

    assert!(unreachable_floors(&set).is_empty());
    let floors: fp_core::UnGraph<EntityId, EntityId> = floor_graph(&set);
    assert_eq!(floors.node_count(), set.floors.len());
}

#[test]
fn snapping_against_fixture() {
    let set = gallery();
    let floor = ground(&set);
    let options = SnapOptions::default();

    let r = smart_snap(Point::new(0.2, 0.1), floor, &options);
    assert_eq!(r.snap_type, SnapType::Vertex);
    assert_eq!(r.point, Point::new(0.0, 0.0));

    // Corner shared by the lobby and the east hall.
    let r = smart_snap(Point::new(10.2, 0.1), floor, &options);
    assert_eq!(r.snap_type, SnapType::Intersection);
    assert_eq!(r.point, Point::new(10.0, 0.0));
}

// ─── Persistence ─────────────────────────────────────────────────────────

#[test]
fn gallery_survives_store_round_trip() {
    let set = gallery();
    let mut store = MemoryStore::new();
    store.save(&set).expect("save");
    let json = store.to_json().expect("json");
    let mut reopened = MemoryStore::from_json(&json).expect("reopen");
    assert_eq!(reopened.load().expect("load"), set);
}
