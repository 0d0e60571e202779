//! Hit testing: world point → element lookup.
//!
//! Priority, first match wins:
//!
//! 1. vertex of a selected room
//! 2. segment of a selected room
//! 3. corner of the selected vertical link
//! 4. artwork
//! 5. door
//! 6. vertical link
//! 7. wall
//! 8. room interior
//!
//! Vertex and segment handles only exist on rooms that are already selected,
//! since doors and walls lie on room edges and would otherwise be unreachable.
//! Within the handle tiers the closest candidate wins; interior tiers are
//! walked in reverse collection order (last drawn = topmost).

use crate::config::EditorConfig;
use crate::selection::{SelectedElement, Selection};
use fp_core::geometry::{Bounds, bounds_of, point_in_polygon, segment_distance};
use fp_core::id::EntityId;
use fp_core::model::{Floor, Point};

/// What the pointer is over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTarget {
    Vertex { room_id: EntityId, index: usize },
    Segment { room_id: EntityId, index: usize },
    LinkCorner { link_id: EntityId, index: usize },
    Artwork(EntityId),
    Door(EntityId),
    VerticalLink(EntityId),
    Wall(EntityId),
    Room(EntityId),
}

impl HitTarget {
    /// The selection a click on this target produces.
    pub fn as_selection(&self) -> SelectedElement {
        match *self {
            Self::Vertex { room_id, index } => SelectedElement::Vertex { room_id, index },
            Self::Segment { room_id, index } => SelectedElement::Segment { room_id, index },
            Self::LinkCorner { link_id, .. } => SelectedElement::VerticalLink(link_id),
            Self::Artwork(id) => SelectedElement::Artwork(id),
            Self::Door(id) => SelectedElement::Door(id),
            Self::VerticalLink(id) => SelectedElement::VerticalLink(id),
            Self::Wall(id) => SelectedElement::Wall(id),
            Self::Room(id) => SelectedElement::Room(id),
        }
    }
}

/// Hit tolerances in world units for the current zoom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitTolerances {
    pub vertex: f64,
    pub segment: f64,
    pub corner: f64,
    pub element: f64,
}

impl HitTolerances {
    pub fn new(config: &EditorConfig, zoom: f64) -> Self {
        Self {
            vertex: config.px_to_world(config.vertex_hit_px, zoom),
            segment: config.px_to_world(config.segment_hit_px, zoom),
            corner: config.px_to_world(config.corner_hit_px, zoom),
            element: config.px_to_world(config.element_hit_px, zoom),
        }
    }
}

/// Closest `(distance, value)` under `max`; earlier entries win exact ties.
fn closest<T>(items: impl Iterator<Item = (f64, T)>, max: f64) -> Option<T> {
    items
        .filter(|(d, _)| *d <= max)
        .fold(None, |best: Option<(f64, T)>, (d, v)| match best {
            Some((bd, _)) if bd <= d => best,
            _ => Some((d, v)),
        })
        .map(|(_, v)| v)
}

/// Find the element at `p` on `floor`.
pub fn find_element_at(
    floor: &Floor,
    p: Point,
    tol: &HitTolerances,
    selection: &Selection,
) -> Option<HitTarget> {
    let handles = floor.rooms.iter().filter(|r| selection.touches_room(r.id));

    let vertex = closest(
        handles.clone().flat_map(|r| {
            r.polygon
                .iter()
                .enumerate()
                .map(move |(index, v)| (v.distance_to(p), HitTarget::Vertex { room_id: r.id, index }))
        }),
        tol.vertex,
    );
    if vertex.is_some() {
        return vertex;
    }

    let segment = closest(
        handles.flat_map(|r| {
            r.edges().map(move |(index, a, b)| {
                (segment_distance(p, a, b), HitTarget::Segment { room_id: r.id, index })
            })
        }),
        tol.segment,
    );
    if segment.is_some() {
        return segment;
    }

    if let Some(link) = selection.single_link().and_then(|id| floor.vertical_link(id)) {
        let corner = closest(
            link.corners().into_iter().enumerate().map(|(index, c)| {
                (c.distance_to(p), HitTarget::LinkCorner { link_id: link.id, index })
            }),
            tol.corner,
        );
        if corner.is_some() {
            return corner;
        }
    }

    if let Some(a) = floor.artworks.iter().rev().find(|a| {
        let b = bounds_of(&a.corners()).expanded(tol.element);
        b.contains(p)
    }) {
        return Some(HitTarget::Artwork(a.id));
    }

    if let Some(d) = floor
        .doors
        .iter()
        .rev()
        .find(|d| segment_distance(p, d.segment[0], d.segment[1]) <= tol.element)
    {
        return Some(HitTarget::Door(d.id));
    }

    if let Some(l) = floor
        .vertical_links
        .iter()
        .rev()
        .find(|l| bounds_of(&l.corners()).contains(p))
    {
        return Some(HitTarget::VerticalLink(l.id));
    }

    if let Some(w) = floor.walls.iter().rev().find(|w| {
        let reach = tol.element.max(w.thickness / 2.0);
        w.pieces().any(|(a, b)| segment_distance(p, a, b) <= reach)
    }) {
        return Some(HitTarget::Wall(w.id));
    }

    floor
        .rooms
        .iter()
        .rev()
        .find(|r| point_in_polygon(p, &r.polygon))
        .map(|r| HitTarget::Room(r.id))
}

/// Every element whose bounds intersect `rect` (box selection), in floor order.
pub fn elements_in_rect(floor: &Floor, rect: &Bounds) -> Vec<SelectedElement> {
    let hits = |points: &[Point]| bounds_of(points).intersects(rect);
    let rooms = floor
        .rooms
        .iter()
        .filter(|r| hits(&r.polygon))
        .map(|r| SelectedElement::Room(r.id));
    let walls = floor
        .walls
        .iter()
        .filter(|w| hits(w.points()))
        .map(|w| SelectedElement::Wall(w.id));
    let doors = floor
        .doors
        .iter()
        .filter(|d| hits(&d.segment))
        .map(|d| SelectedElement::Door(d.id));
    let artworks = floor
        .artworks
        .iter()
        .filter(|a| hits(&a.corners()))
        .map(|a| SelectedElement::Artwork(a.id));
    let links = floor
        .vertical_links
        .iter()
        .filter(|l| hits(&l.corners()))
        .map(|l| SelectedElement::VerticalLink(l.id));
    rooms
        .chain(walls)
        .chain(doors)
        .chain(artworks)
        .chain(links)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use fp_core::model::{Artwork, Door, Room, Size, VerticalLink, VerticalLinkKind, Wall};
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
        let mut f = Floor::new(id("hit_floor"), "Ground");
        f.rooms.push(rect("hit_a", 0.0, 0.0, 4.0, 4.0));
        f.rooms.push(rect("hit_b", 4.0, 0.0, 4.0, 4.0));
        f.doors.push(Door {
            id: id("hit_door"),
            segment: [Point::new(4.0, 1.0), Point::new(4.0, 2.0)],
            width: 1.0,
            room_a: id("hit_a"),
            room_b: id("hit_b"),
            room_id: Some(id("hit_a")),
        });
        f.walls.push(Wall::segment(
            id("hit_wall"),
            Point::new(1.0, 3.0),
            Point::new(3.0, 3.0),
            0.2,
        ));
        f.artworks.push(Artwork {
            id: id("hit_art"),
            position: Point::new(6.0, 3.0),
            size: Some(Size::new(1.0, 1.0)),
            name: None,
            room_id: Some(id("hit_b")),
        });
        f.vertical_links.push(VerticalLink {
            id: id("hit_link"),
            kind: VerticalLinkKind::Elevator,
            floor_id: id("hit_floor"),
            position: Point::new(1.0, 0.5),
            size: Size::new(1.0, 1.0),
            connected_floor_ids: smallvec![id("hit_floor")],
            room_id: Some(id("hit_a")),
            link_group_id: None,
            link_number: None,
        });
        f
    }

    fn tol() -> HitTolerances {
        HitTolerances {
            vertex: 0.3,
            segment: 0.2,
            corner: 0.3,
            element: 0.2,
        }
    }

    #[test]
    fn interior_priorities() {
        let f = floor();
        let none = Selection::new();
        let at = |x, y| find_element_at(&f, Point::new(x, y), &tol(), &none);
        assert_eq!(at(4.05, 1.5), Some(HitTarget::Door(id("hit_door"))));
        assert_eq!(at(6.2, 3.1), Some(HitTarget::Artwork(id("hit_art"))));
        assert_eq!(at(1.5, 1.0), Some(HitTarget::VerticalLink(id("hit_link"))));
        assert_eq!(at(2.0, 3.05), Some(HitTarget::Wall(id("hit_wall"))));
        assert_eq!(at(2.0, 2.0), Some(HitTarget::Room(id("hit_a"))));
        assert_eq!(at(20.0, 20.0), None);
    }

    #[test]
    fn handles_only_on_selected_rooms() {
        let f = floor();
        let mut sel = Selection::new();
        let p = Point::new(0.1, 0.1);
        assert_eq!(
            find_element_at(&f, p, &tol(), &sel),
            Some(HitTarget::Room(id("hit_a")))
        );
        sel.select_only(SelectedElement::Room(id("hit_a")));
        assert_eq!(
            find_element_at(&f, p, &tol(), &sel),
            Some(HitTarget::Vertex {
                room_id: id("hit_a"),
                index: 0
            })
        );
        assert_eq!(
            find_element_at(&f, Point::new(2.0, 0.1), &tol(), &sel),
            Some(HitTarget::Segment {
                room_id: id("hit_a"),
                index: 0
            })
        );
    }

    #[test]
    fn selected_link_exposes_corners() {
        let f = floor();
        let mut sel = Selection::new();
        sel.select_only(SelectedElement::VerticalLink(id("hit_link")));
        assert_eq!(
            find_element_at(&f, Point::new(2.05, 1.45), &tol(), &sel),
            Some(HitTarget::LinkCorner {
                link_id: id("hit_link"),
                index: 2
            })
        );
    }

    #[test]
    fn box_selection_collects_intersecting() {
        let f = floor();
        let found = elements_in_rect(&f, &Bounds::from_corners(Point::new(5.0, 2.0), Point::new(7.0, 5.0)));
        assert_eq!(
            found,
            vec![
                SelectedElement::Room(id("hit_b")),
                SelectedElement::Artwork(id("hit_art")),
            ]
        );
    }
}
