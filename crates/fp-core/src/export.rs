//! Relational export/import of a [`FloorSet`].
//!
//! The exported shape is four flat tables, the way a relational store keeps
//! plans:
//!
//! - `plans`: one row per floor
//! - `entities`: one row per entity, with non-geometric metadata in a JSON
//!   description blob
//! - `points`: every coordinate, keyed by entity, ring and ordinal
//!   (ring 0 is the outline, rings 1+ are room holes)
//! - `relations`: ownership, door sides, and floors served by vertical links
//!
//! `import_floor_set(&export_floor_set(set))` reproduces `set` exactly.

use crate::id::EntityId;
use crate::model::{
    Artwork, Door, Elevator, Escalator, Floor, FloorSet, Point, Room, Size, VerticalLink,
    VerticalLinkKind, Wall, WallGeometry,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use smallvec::SmallVec;
use std::collections::HashMap;
use thiserror::Error;

// ─── Tables ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanRecord {
    pub id: EntityId,
    pub name: String,
    pub level: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Room,
    Wall,
    Door,
    Artwork,
    VerticalLink,
    Escalator,
    Elevator,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub id: EntityId,
    pub plan_id: EntityId,
    pub kind: EntityKind,
    pub description: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointRecord {
    pub entity_id: EntityId,
    pub ring: u32,
    pub ordinal: u32,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    /// Child entity → owning room.
    OwnedBy,
    /// Door → room on side A, then door → room on side B.
    DoorConnects,
    /// Vertical link, escalator or elevator → floor it serves, in order.
    LinksFloor,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RelationRecord {
    pub kind: RelationKind,
    pub from: EntityId,
    pub to: EntityId,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExportSet {
    pub plans: Vec<PlanRecord>,
    pub entities: Vec<EntityRecord>,
    pub points: Vec<PointRecord>,
    pub relations: Vec<RelationRecord>,
}

/// Structural problems found while rebuilding a floor set.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("entity {entity} refers to unknown plan {plan}")]
    UnknownPlan { entity: EntityId, plan: EntityId },

    #[error("entity {0} appears more than once")]
    DuplicateEntity(EntityId),

    #[error("{kind:?} {entity} has {found} points in ring {ring}, expected {expected}")]
    PointCount {
        entity: EntityId,
        kind: EntityKind,
        ring: u32,
        found: usize,
        expected: usize,
    },

    #[error("{entity} is missing its {relation:?} relation")]
    MissingRelation {
        entity: EntityId,
        relation: RelationKind,
    },

    #[error("invalid description for {entity}: {source}")]
    Description {
        entity: EntityId,
        #[source]
        source: serde_json::Error,
    },
}

// ─── Export ──────────────────────────────────────────────────────────────

struct Exporter {
    out: ExportSet,
}

impl Exporter {
    fn entity(&mut self, id: EntityId, plan_id: EntityId, kind: EntityKind, description: serde_json::Value) {
        self.out.entities.push(EntityRecord {
            id,
            plan_id,
            kind,
            description,
        });
    }

    fn ring(&mut self, entity_id: EntityId, ring: u32, points: &[Point]) {
        self.out
            .points
            .extend(points.iter().enumerate().map(|(i, p)| PointRecord {
                entity_id,
                ring,
                ordinal: i as u32,
                x: p.x,
                y: p.y,
            }));
    }

    fn relation(&mut self, kind: RelationKind, from: EntityId, to: EntityId) {
        self.out.relations.push(RelationRecord { kind, from, to });
    }

    fn owner(&mut self, from: EntityId, room_id: Option<EntityId>) {
        if let Some(room) = room_id {
            self.relation(RelationKind::OwnedBy, from, room);
        }
    }

    fn floors_served(&mut self, from: EntityId, floors: &[EntityId]) {
        for f in floors {
            self.relation(RelationKind::LinksFloor, from, *f);
        }
    }
}

/// Flatten a floor set into relational tables.
pub fn export_floor_set(set: &FloorSet) -> ExportSet {
    let mut ex = Exporter {
        out: ExportSet::default(),
    };
    for floor in &set.floors {
        let plan = floor.id;
        ex.out.plans.push(PlanRecord {
            id: plan,
            name: floor.name.clone(),
            level: floor.level,
        });
        for r in &floor.rooms {
            ex.entity(r.id, plan, EntityKind::Room, json!({ "name": r.name }));
            ex.ring(r.id, 0, &r.polygon);
            for (i, hole) in r.holes.iter().enumerate() {
                ex.ring(r.id, i as u32 + 1, hole);
            }
        }
        for w in &floor.walls {
            let path = matches!(w.geometry, WallGeometry::Path(_));
            ex.entity(
                w.id,
                plan,
                EntityKind::Wall,
                json!({ "thickness": w.thickness, "load_bearing": w.load_bearing, "path": path }),
            );
            ex.ring(w.id, 0, w.points());
            ex.owner(w.id, w.room_id);
        }
        for d in &floor.doors {
            ex.entity(d.id, plan, EntityKind::Door, json!({ "width": d.width }));
            ex.ring(d.id, 0, &d.segment);
            ex.relation(RelationKind::DoorConnects, d.id, d.room_a);
            ex.relation(RelationKind::DoorConnects, d.id, d.room_b);
            ex.owner(d.id, d.room_id);
        }
        for a in &floor.artworks {
            ex.entity(
                a.id,
                plan,
                EntityKind::Artwork,
                json!({ "size": a.size, "name": a.name }),
            );
            ex.ring(a.id, 0, &[a.position]);
            ex.owner(a.id, a.room_id);
        }
        for l in &floor.vertical_links {
            ex.entity(
                l.id,
                plan,
                EntityKind::VerticalLink,
                json!({
                    "kind": l.kind,
                    "size": l.size,
                    "link_group_id": l.link_group_id,
                    "link_number": l.link_number,
                }),
            );
            ex.ring(l.id, 0, &[l.position]);
            ex.floors_served(l.id, &l.connected_floor_ids);
            ex.owner(l.id, l.room_id);
        }
        for e in &floor.escalators {
            ex.entity(e.id, plan, EntityKind::Escalator, json!({}));
            ex.ring(e.id, 0, &[e.start, e.end]);
            ex.floors_served(e.id, &[e.from_floor_id, e.to_floor_id]);
        }
        for e in &floor.elevators {
            ex.entity(e.id, plan, EntityKind::Elevator, json!({}));
            ex.ring(e.id, 0, &[e.position]);
            ex.floors_served(e.id, &e.connected_floor_ids);
        }
    }
    log::debug!(
        "exported {} plans, {} entities, {} points",
        ex.out.plans.len(),
        ex.out.entities.len(),
        ex.out.points.len()
    );
    ex.out
}

// ─── Import ──────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct RoomMeta {
    name: Option<String>,
}

#[derive(Deserialize)]
struct WallMeta {
    thickness: f64,
    #[serde(default)]
    load_bearing: bool,
    #[serde(default)]
    path: bool,
}

#[derive(Deserialize)]
struct DoorMeta {
    width: f64,
}

#[derive(Deserialize)]
struct ArtworkMeta {
    size: Option<Size>,
    name: Option<String>,
}

#[derive(Deserialize)]
struct LinkMeta {
    kind: VerticalLinkKind,
    size: Size,
    link_group_id: Option<EntityId>,
    link_number: Option<u32>,
}

/// Lookup tables built once per import.
struct Tables {
    rings: HashMap<EntityId, Vec<Vec<Point>>>,
    relations: HashMap<(EntityId, RelationKind), Vec<EntityId>>,
}

impl Tables {
    fn new(set: &ExportSet) -> Self {
        let mut sorted: Vec<&PointRecord> = set.points.iter().collect();
        sorted.sort_by_key(|p| (p.ring, p.ordinal));
        let mut rings: HashMap<EntityId, Vec<Vec<Point>>> = HashMap::new();
        for p in sorted {
            let entry = rings.entry(p.entity_id).or_default();
            let ring = p.ring as usize;
            if entry.len() <= ring {
                entry.resize_with(ring + 1, Vec::new);
            }
            entry[ring].push(Point::new(p.x, p.y));
        }
        let mut relations: HashMap<(EntityId, RelationKind), Vec<EntityId>> = HashMap::new();
        for r in &set.relations {
            relations.entry((r.from, r.kind)).or_default().push(r.to);
        }
        Self { rings, relations }
    }

    fn rings(&self, id: EntityId) -> &[Vec<Point>] {
        self.rings.get(&id).map(Vec::as_slice).unwrap_or_default()
    }

    /// Ring 0 with an exact point count (`None` accepts any count ≥ `min`).
    fn outline(
        &self,
        rec: &EntityRecord,
        exact: Option<usize>,
        min: usize,
    ) -> Result<Vec<Point>, ImportError> {
        let outline = self.rings(rec.id).first().cloned().unwrap_or_default();
        let ok = match exact {
            Some(n) => outline.len() == n,
            None => outline.len() >= min,
        };
        if ok {
            Ok(outline)
        } else {
            Err(ImportError::PointCount {
                entity: rec.id,
                kind: rec.kind,
                ring: 0,
                found: outline.len(),
                expected: exact.unwrap_or(min),
            })
        }
    }

    fn related(&self, id: EntityId, kind: RelationKind) -> &[EntityId] {
        self.relations
            .get(&(id, kind))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    fn owner(&self, id: EntityId) -> Option<EntityId> {
        self.related(id, RelationKind::OwnedBy).first().copied()
    }
}

fn meta<T: DeserializeOwned>(rec: &EntityRecord) -> Result<T, ImportError> {
    serde_json::from_value(rec.description.clone()).map_err(|source| ImportError::Description {
        entity: rec.id,
        source,
    })
}

/// Rebuild a floor set from relational tables.
///
/// Plan order and per-kind entity order follow the table order.
pub fn import_floor_set(set: &ExportSet) -> Result<FloorSet, ImportError> {
    let tables = Tables::new(set);
    let mut floors: Vec<Floor> = set
        .plans
        .iter()
        .map(|p| {
            let mut f = Floor::new(p.id, p.name.clone());
            f.level = p.level;
            f
        })
        .collect();
    let index: HashMap<EntityId, usize> = floors.iter().enumerate().map(|(i, f)| (f.id, i)).collect();
    let mut seen = std::collections::HashSet::new();

    for rec in &set.entities {
        if !seen.insert(rec.id) {
            return Err(ImportError::DuplicateEntity(rec.id));
        }
        let Some(&slot) = index.get(&rec.plan_id) else {
            return Err(ImportError::UnknownPlan {
                entity: rec.id,
                plan: rec.plan_id,
            });
        };
        let floor = &mut floors[slot];
        match rec.kind {
            EntityKind::Room => {
                let m: RoomMeta = meta(rec)?;
                let polygon = tables.outline(rec, None, 3)?;
                floor.rooms.push(Room {
                    id: rec.id,
                    polygon,
                    holes: tables.rings(rec.id).iter().skip(1).cloned().collect(),
                    name: m.name,
                });
            }
            EntityKind::Wall => {
                let m: WallMeta = meta(rec)?;
                let geometry = if m.path {
                    WallGeometry::Path(tables.outline(rec, None, 2)?)
                } else {
                    let pts = tables.outline(rec, Some(2), 2)?;
                    WallGeometry::Segment([pts[0], pts[1]])
                };
                floor.walls.push(Wall {
                    id: rec.id,
                    geometry,
                    thickness: m.thickness,
                    room_id: tables.owner(rec.id),
                    load_bearing: m.load_bearing,
                });
            }
            EntityKind::Door => {
                let m: DoorMeta = meta(rec)?;
                let pts = tables.outline(rec, Some(2), 2)?;
                let [room_a, room_b] = tables.related(rec.id, RelationKind::DoorConnects) else {
                    return Err(ImportError::MissingRelation {
                        entity: rec.id,
                        relation: RelationKind::DoorConnects,
                    });
                };
                floor.doors.push(Door {
                    id: rec.id,
                    segment: [pts[0], pts[1]],
                    width: m.width,
                    room_a: *room_a,
                    room_b: *room_b,
                    room_id: tables.owner(rec.id),
                });
            }
            EntityKind::Artwork => {
                let m: ArtworkMeta = meta(rec)?;
                let pts = tables.outline(rec, Some(1), 1)?;
                floor.artworks.push(Artwork {
                    id: rec.id,
                    position: pts[0],
                    size: m.size,
                    name: m.name,
                    room_id: tables.owner(rec.id),
                });
            }
            EntityKind::VerticalLink => {
                let m: LinkMeta = meta(rec)?;
                let pts = tables.outline(rec, Some(1), 1)?;
                floor.vertical_links.push(VerticalLink {
                    id: rec.id,
                    kind: m.kind,
                    floor_id: rec.plan_id,
                    position: pts[0],
                    size: m.size,
                    connected_floor_ids: SmallVec::from_slice(
                        tables.related(rec.id, RelationKind::LinksFloor),
                    ),
                    room_id: tables.owner(rec.id),
                    link_group_id: m.link_group_id,
                    link_number: m.link_number,
                });
            }
            EntityKind::Escalator => {
                let pts = tables.outline(rec, Some(2), 2)?;
                let [from, to] = tables.related(rec.id, RelationKind::LinksFloor) else {
                    return Err(ImportError::MissingRelation {
                        entity: rec.id,
                        relation: RelationKind::LinksFloor,
                    });
                };
                floor.escalators.push(Escalator {
                    id: rec.id,
                    start: pts[0],
                    end: pts[1],
                    from_floor_id: *from,
                    to_floor_id: *to,
                });
            }
            EntityKind::Elevator => {
                let pts = tables.outline(rec, Some(1), 1)?;
                floor.elevators.push(Elevator {
                    id: rec.id,
                    position: pts[0],
                    connected_floor_ids: SmallVec::from_slice(
                        tables.related(rec.id, RelationKind::LinksFloor),
                    ),
                });
            }
        }
    }
    log::debug!("imported {} floors", floors.len());
    Ok(FloorSet { floors })
}
