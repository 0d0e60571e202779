//! Editor state: the single value the orchestrator owns and hosts render.

use crate::history::Document;
use crate::selection::{SelectedElement, Selection};
use crate::tools::ToolKind;
use fp_core::geometry::{area_to_square_meters, polygon_area, polygon_perimeter};
use fp_core::id::EntityId;
use fp_core::model::{Floor, FloorSet, Point, VerticalLink};
use fp_core::validate::Validation;

/// World ↔ screen mapping: `screen = world × pixels_per_unit × zoom + pan`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub zoom: f64,
    /// Screen-space offset in pixels.
    pub pan: Point,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            pan: Point::ZERO,
        }
    }
}

impl Viewport {
    pub fn to_world(&self, screen: Point, pixels_per_unit: f64) -> Point {
        let scale = self.zoom * pixels_per_unit;
        Point::new((screen.x - self.pan.x) / scale, (screen.y - self.pan.y) / scale)
    }

    pub fn to_screen(&self, world: Point, pixels_per_unit: f64) -> Point {
        world * (self.zoom * pixels_per_unit) + self.pan
    }

    /// Change zoom while keeping the world point under `anchor` (screen) fixed.
    pub fn zoom_about(&mut self, anchor: Point, zoom: f64, pixels_per_unit: f64) {
        let world = self.to_world(anchor, pixels_per_unit);
        self.zoom = zoom;
        self.pan = anchor - world * (zoom * pixels_per_unit);
    }
}

/// Real-world size of the single selected room.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurements {
    pub area_m2: f64,
    pub perimeter_m: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContextMenu {
    /// Screen position of the click.
    pub position: Point,
    pub target: Option<SelectedElement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EditorState {
    pub floors: FloorSet,
    pub current_floor_id: Option<EntityId>,
    pub selected_tool: ToolKind,
    pub selected_elements: Selection,
    pub grid_size: f64,
    pub viewport: Viewport,
    /// Vertices of the polygon being drawn.
    pub current_polygon: Option<Vec<Point>>,
    pub context_menu: Option<ContextMenu>,
    pub measurements: Option<Measurements>,
    /// A drawn vertical link waiting for its connected floors.
    pub pending_link: Option<VerticalLink>,
    /// Last validation notice worth showing (rejections, warnings).
    pub status: Option<Validation>,
}

impl EditorState {
    pub fn new(floors: FloorSet, grid_size: f64) -> Self {
        let current_floor_id = floors.floors.first().map(|f| f.id);
        Self {
            floors,
            current_floor_id,
            selected_tool: ToolKind::Select,
            selected_elements: Selection::new(),
            grid_size,
            viewport: Viewport::default(),
            current_polygon: None,
            context_menu: None,
            measurements: None,
            pending_link: None,
            status: None,
        }
    }

    pub fn current_floor(&self) -> Option<&Floor> {
        self.current_floor_id.and_then(|id| self.floors.floor(id))
    }

    pub fn current_floor_mut(&mut self) -> Option<&mut Floor> {
        let id = self.current_floor_id?;
        self.floors.floors.iter_mut().find(|f| f.id == id)
    }

    /// Replace the floor with the same ID as `floor`.
    pub fn replace_floor(&mut self, floor: Floor) {
        if let Some(slot) = self.floors.floors.iter_mut().find(|f| f.id == floor.id) {
            *slot = floor;
        }
    }

    pub fn document(&self) -> Document {
        Document {
            floors: self.floors.clone(),
            current_floor_id: self.current_floor_id,
            selection: self.selected_elements.clone(),
        }
    }

    /// Restore a history snapshot. Transient UI state is cleared.
    pub fn restore(&mut self, doc: &Document) {
        self.floors = doc.floors.clone();
        self.current_floor_id = doc.current_floor_id;
        self.selected_elements = doc.selection.clone();
        self.current_polygon = None;
        self.context_menu = None;
        self.pending_link = None;
    }

    /// Recompute measurements for a single selected room.
    pub fn refresh_measurements(&mut self, meters_per_unit: f64) {
        let room = match self.selected_elements.as_slice() {
            [SelectedElement::Room(id)] => self.current_floor().and_then(|f| f.room(*id)),
            _ => None,
        };
        self.measurements = room.map(|r| Measurements {
            area_m2: area_to_square_meters(polygon_area(&r.polygon), meters_per_unit),
            perimeter_m: polygon_perimeter(&r.polygon) * meters_per_unit,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zoom_keeps_anchor_fixed() {
        let mut vp = Viewport::default();
        let anchor = Point::new(100.0, 50.0);
        let before = vp.to_world(anchor, 20.0);
        vp.zoom_about(anchor, 2.0, 20.0);
        let after = vp.to_world(anchor, 20.0);
        assert!(before.distance_to(after) < 1e-9);
        assert_eq!(vp.to_screen(after, 20.0), anchor);
    }
}
