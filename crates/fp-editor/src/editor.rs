//! Interaction orchestrator.
//!
//! `Editor` exclusively owns the [`EditorState`] and the [`History`]. Input
//! events are routed to exactly one machine at a time: the active creation
//! tool, a drag session, box selection, or panning. Gestures update state
//! transiently; a finished gesture becomes one history entry. Hosts that
//! drive the engine programmatically use [`Editor::apply`] with a
//! [`Command`].

use crate::config::EditorConfig;
use crate::drag::{DragSession, DragTarget};
use crate::history::History;
use crate::hit::{HitTarget, HitTolerances, elements_in_rect, find_element_at};
use crate::input::{InputEvent, Modifiers, PointerButton};
use crate::selection::{SelectedElement, Selection};
use crate::shortcuts::{ShortcutAction, ShortcutMap};
use crate::state::{ContextMenu, EditorState, Viewport};
use crate::tools::{Feedback, Preview, Tool, ToolAction, ToolContext, ToolEvent, ToolKind, make_tool};
use fp_core::cascade::{Translate, assign_owner, remove_entities};
use fp_core::geometry::{Bounds, bounds_of};
use fp_core::id::EntityId;
use fp_core::model::{Artwork, Door, Entity, Floor, FloorSet, Point, Room, VerticalLink, Wall};
use fp_core::store::Persistence;
use fp_core::validate::{
    Validation, validate_entity, validate_floor_connectivity, validate_floor_links,
};
use smallvec::{SmallVec, smallvec};
use std::collections::HashMap;

/// Explicit state transitions.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Validate and append an entity to the current floor.
    Create(Entity),
    /// Translate entities on the current floor (rooms cascade to children).
    Move { targets: Vec<EntityId>, delta: Point },
    /// Delete the selected elements.
    Delete,
    Undo,
    Redo,
    Copy,
    Paste,
    Duplicate,
    SelectAll,
    Deselect,
    SetTool(ToolKind),
    AddFloor { name: String },
    SwitchFloor(EntityId),
    /// Complete the pending vertical link with the floors it connects.
    FinishVerticalLink {
        connected_floor_ids: Vec<EntityId>,
        link_group_id: Option<EntityId>,
    },
    CancelPendingLink,
    /// Replace the whole building and reset history.
    Load(FloorSet),
}

enum Gesture {
    Idle,
    Pan {
        last: Point,
    },
    Drag {
        session: DragSession,
        selection_before: Selection,
    },
    BoxSelect {
        start: Point,
        current: Point,
        additive: bool,
    },
    /// A creation tool is mid-gesture.
    Tool,
}

/// Everything a renderer needs for one frame.
#[derive(Debug)]
pub struct Frame<'a> {
    pub state: &'a EditorState,
    pub hover: Option<HitTarget>,
    pub preview: Option<Preview>,
    pub feedback: Option<Feedback>,
    /// World-space rubber band during box selection.
    pub selection_box: Option<Bounds>,
}

pub struct Editor {
    config: EditorConfig,
    state: EditorState,
    history: History,
    tool: Option<Box<dyn Tool>>,
    gesture: Gesture,
    hover: Option<HitTarget>,
    clipboard: Vec<Entity>,
    paste_count: u32,
    /// Latest timestamp seen; untimed commands are spaced a merge window apart.
    clock_ms: u64,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(EditorConfig::default(), FloorSet::default())
    }
}

impl Editor {
    /// Open `floors`; an empty building gets one ground floor.
    pub fn new(config: EditorConfig, floors: FloorSet) -> Self {
        let state = EditorState::new(with_ground_floor(floors), config.grid_size);
        let history = History::new(state.document(), config.history_limit, config.merge_window_ms);
        Self {
            config,
            state,
            history,
            tool: None,
            gesture: Gesture::Idle,
            hover: None,
            clipboard: Vec::new(),
            paste_count: 0,
            clock_ms: 0,
        }
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Whether a pointer gesture is in progress.
    pub fn is_gesture_active(&self) -> bool {
        !matches!(self.gesture, Gesture::Idle)
    }

    pub fn frame(&self) -> Frame<'_> {
        Frame {
            state: &self.state,
            hover: self.hover,
            preview: self.tool.as_ref().and_then(|t| t.preview()),
            feedback: self.tool.as_ref().map(|t| t.feedback().clone()),
            selection_box: match self.gesture {
                Gesture::BoxSelect { start, current, .. } => Some(Bounds::from_corners(start, current)),
                _ => None,
            },
        }
    }

    // ─── Persistence ─────────────────────────────────────────────────────

    /// Replace the building with what `store` holds.
    pub fn load_from<P: Persistence>(&mut self, store: &mut P) -> Result<&EditorState, P::Error> {
        let floors = store.load()?;
        log::info!("loaded {} floors", floors.floors.len());
        self.load(floors);
        Ok(&self.state)
    }

    /// Save the last committed building (never a transient drag preview).
    pub fn save_to<P: Persistence>(&self, store: &mut P) -> Result<(), P::Error> {
        let committed = &self.history.entries()[self.history.index()].snapshot.floors;
        store.save(committed)?;
        log::info!("saved {} floors", committed.floors.len());
        Ok(())
    }

    // ─── Commands ────────────────────────────────────────────────────────

    pub fn apply(&mut self, command: Command) -> &EditorState {
        let now = self.clock_ms + self.config.merge_window_ms;
        self.apply_at(command, now)
    }

    /// Apply `command` at time `now_ms` (drives history merging).
    ///
    /// A gesture in progress is abandoned first, so commands always act on
    /// committed state and never on a drag preview.
    pub fn apply_at(&mut self, command: Command, now_ms: u64) -> &EditorState {
        self.clock_ms = self.clock_ms.max(now_ms);
        self.abort_gesture();
        match command {
            Command::Create(entity) => {
                self.create(entity, now_ms);
            }
            Command::Move { targets, delta } => self.move_elements(targets, delta, now_ms),
            Command::Delete => self.delete_selection(now_ms),
            Command::Undo => self.undo(),
            Command::Redo => self.redo(),
            Command::Copy => {
                self.clipboard = self.selected_entities();
                self.paste_count = 0;
            }
            Command::Paste => {
                if !self.clipboard.is_empty() {
                    self.paste_count += 1;
                    let items = self.clipboard.clone();
                    self.place_copies(items, self.paste_count, "Paste", now_ms);
                }
            }
            Command::Duplicate => {
                let items = self.selected_entities();
                self.place_copies(items, 1, "Duplicate", now_ms);
            }
            Command::SelectAll => self.select_all(),
            Command::Deselect => {
                self.state.selected_elements.clear();
                self.state.refresh_measurements(self.config.meters_per_unit);
            }
            Command::SetTool(kind) => self.set_tool(kind),
            Command::AddFloor { name } => self.add_floor(name, now_ms),
            Command::SwitchFloor(id) => self.switch_floor(id),
            Command::FinishVerticalLink {
                connected_floor_ids,
                link_group_id,
            } => self.finish_link(connected_floor_ids, link_group_id, now_ms),
            Command::CancelPendingLink => self.state.pending_link = None,
            Command::Load(floors) => self.load(floors),
        }
        &self.state
    }

    fn commit(&mut self, description: String, now_ms: u64, validation: Validation) {
        let validation = if validation.severity.is_some() {
            validation
        } else {
            self.layout_report()
        };
        self.state.status = validation.severity.is_some().then_some(validation);
        self.state.refresh_measurements(self.config.meters_per_unit);
        self.history.commit(self.state.document(), description, now_ms);
    }

    /// Advisory notes about the committed layout: rooms no door reaches on
    /// the current floor, then floors no vertical link reaches.
    fn layout_report(&self) -> Validation {
        let rooms = self
            .state
            .current_floor()
            .map_or_else(Validation::ok, validate_floor_connectivity);
        rooms.and(validate_floor_links(&self.state.floors))
    }

    fn create(&mut self, entity: Entity, now_ms: u64) -> bool {
        let Some(floor) = self.state.current_floor() else {
            return false;
        };
        let entity = assign_owner(entity, floor);
        let validation = validate_entity(&entity, floor, &self.config.validation);
        if validation.is_blocking() {
            log::debug!("create {} rejected: {:?}", entity.kind_label(), validation.message);
            self.state.status = Some(validation);
            return false;
        }
        let label = format!("Create {}", entity.kind_label());
        let id = entity.id();
        if let Some(floor) = self.state.current_floor_mut() {
            floor.upsert(entity);
        }
        if let Some(element) = self
            .state
            .current_floor()
            .and_then(|f| SelectedElement::for_entity(f, id))
        {
            self.state.selected_elements.select_only(element);
        }
        self.commit(label, now_ms, validation);
        true
    }

    fn move_elements(&mut self, targets: Vec<EntityId>, delta: Point, now_ms: u64) {
        let Some(floor) = self.state.current_floor() else {
            return;
        };
        let grid = self.state.grid_size;
        let mut session = DragSession::begin(DragTarget::Elements(targets), Point::ZERO, floor, grid);
        let out = session.apply_delta(delta, floor, &self.config, grid);
        if !session.changed() {
            return;
        }
        if out.validation.is_blocking() {
            log::debug!("move rejected: {:?}", out.validation.message);
            self.state.status = Some(out.validation);
            return;
        }
        self.state.replace_floor(out.floor);
        self.commit(session.label(), now_ms, out.validation);
    }

    fn delete_selection(&mut self, now_ms: u64) {
        let Some(floor) = self.state.current_floor() else {
            return;
        };
        let floor_id = floor.id;
        let ids = self.state.selected_elements.entity_ids();
        let label = match ids.as_slice() {
            [] => return,
            [id] => floor
                .entity(*id)
                .map(|e| format!("Delete {}", e.kind_label()))
                .unwrap_or_else(|| "Delete".to_string()),
            many => format!("Delete {} elements", many.len()),
        };
        let removed = remove_entities(&mut self.state.floors, floor_id, &ids);
        if removed.is_empty() {
            return;
        }
        log::debug!("deleted {} entities", removed.len());
        if let Some(floor) = self.state.floors.floor(floor_id) {
            self.state.selected_elements.retain_existing(floor);
        }
        self.hover = None;
        self.commit(label, now_ms, Validation::ok());
    }

    fn undo(&mut self) {
        if let Some(doc) = self.history.undo() {
            self.state.restore(doc);
            self.state.refresh_measurements(self.config.meters_per_unit);
            self.hover = None;
        }
    }

    fn redo(&mut self) {
        if let Some(doc) = self.history.redo() {
            self.state.restore(doc);
            self.state.refresh_measurements(self.config.meters_per_unit);
            self.hover = None;
        }
    }

    fn select_all(&mut self) {
        let Some(floor) = self.state.current_floor() else {
            return;
        };
        let all: Vec<SelectedElement> = floor
            .rooms
            .iter()
            .map(|r| SelectedElement::Room(r.id))
            .chain(floor.walls.iter().map(|w| SelectedElement::Wall(w.id)))
            .chain(floor.doors.iter().map(|d| SelectedElement::Door(d.id)))
            .chain(floor.artworks.iter().map(|a| SelectedElement::Artwork(a.id)))
            .chain(floor.vertical_links.iter().map(|l| SelectedElement::VerticalLink(l.id)))
            .collect();
        self.state.selected_elements.clear();
        self.state.selected_elements.extend(all);
        self.state.refresh_measurements(self.config.meters_per_unit);
    }

    fn set_tool(&mut self, kind: ToolKind) {
        self.tool = make_tool(kind);
        self.state.selected_tool = kind;
        self.state.current_polygon = None;
        self.hover = None;
    }

    fn add_floor(&mut self, name: String, now_ms: u64) {
        let level = self
            .state
            .floors
            .floors
            .iter()
            .map(|f| f.level + 1)
            .max()
            .unwrap_or(0);
        let floor = Floor {
            level,
            ..Floor::new(EntityId::fresh("floor"), name.clone())
        };
        self.state.current_floor_id = Some(floor.id);
        self.state.floors.floors.push(floor);
        self.state.selected_elements.clear();
        self.commit(format!("Add floor {name}"), now_ms, Validation::ok());
    }

    fn switch_floor(&mut self, id: EntityId) {
        if self.state.floors.floor(id).is_none() {
            return;
        }
        self.state.current_floor_id = Some(id);
        self.state.selected_elements.clear();
        self.state.refresh_measurements(self.config.meters_per_unit);
        self.hover = None;
    }

    fn finish_link(&mut self, connected: Vec<EntityId>, group: Option<EntityId>, now_ms: u64) {
        let Some(mut link) = self.state.pending_link.take() else {
            return;
        };
        let mut floors: SmallVec<[EntityId; 4]> = smallvec![link.floor_id];
        for id in connected {
            if !floors.contains(&id) && self.state.floors.floor(id).is_some() {
                floors.push(id);
            }
        }
        let siblings = self
            .state
            .floors
            .floors
            .iter()
            .flat_map(|f| &f.vertical_links)
            .filter(|l| match group {
                Some(g) => l.link_group_id == Some(g),
                None => l.floor_id == link.floor_id && l.kind == link.kind,
            })
            .count();
        link.connected_floor_ids = floors;
        link.link_group_id = group;
        link.link_number = Some(siblings as u32 + 1);
        if self.state.floors.floor(link.floor_id).is_some() {
            self.state.current_floor_id = Some(link.floor_id);
        }
        self.create(Entity::VerticalLink(link), now_ms);
    }

    fn load(&mut self, floors: FloorSet) {
        self.abort_gesture();
        let tool = self.state.selected_tool;
        let viewport = self.state.viewport;
        self.state = EditorState::new(with_ground_floor(floors), self.config.grid_size);
        self.state.selected_tool = tool;
        self.state.viewport = viewport;
        self.history.reset(self.state.document());
        self.hover = None;
        self.paste_count = 0;
    }

    // ─── Clipboard ───────────────────────────────────────────────────────

    /// Selected entities plus the children of selected rooms. Doors come
    /// along only when both of their rooms do.
    fn selected_entities(&self) -> Vec<Entity> {
        let Some(floor) = self.state.current_floor() else {
            return Vec::new();
        };
        let ids = self.state.selected_elements.entity_ids();
        let mut out: Vec<Entity> = ids.iter().filter_map(|id| floor.entity(*id)).collect();
        let rooms: Vec<EntityId> = out
            .iter()
            .filter_map(|e| match e {
                Entity::Room(r) => Some(r.id),
                _ => None,
            })
            .collect();
        let owned = |id: EntityId, owner: Option<EntityId>| {
            !ids.contains(&id) && owner.is_some_and(|o| rooms.contains(&o))
        };
        out.extend(
            floor
                .walls
                .iter()
                .filter(|w| owned(w.id, w.room_id))
                .cloned()
                .map(Entity::Wall),
        );
        out.extend(
            floor
                .doors
                .iter()
                .filter(|d| {
                    !ids.contains(&d.id) && rooms.contains(&d.room_a) && rooms.contains(&d.room_b)
                })
                .cloned()
                .map(Entity::Door),
        );
        out.extend(
            floor
                .artworks
                .iter()
                .filter(|a| owned(a.id, a.room_id))
                .cloned()
                .map(Entity::Artwork),
        );
        out.extend(
            floor
                .vertical_links
                .iter()
                .filter(|l| owned(l.id, l.room_id))
                .cloned()
                .map(Entity::VerticalLink),
        );
        out
    }

    /// Groups containing rooms are placed beside the original; anything
    /// else is nudged diagonally. The `n`th placement is `n` steps away.
    fn placement_offset(&self, items: &[Entity], n: u32) -> Point {
        let points: Vec<Point> = items
            .iter()
            .filter_map(|e| match e {
                Entity::Room(r) => Some(r.polygon.iter().copied()),
                _ => None,
            })
            .flatten()
            .collect();
        let step = self.config.paste_offset;
        if points.is_empty() {
            Point::new(step, step) * f64::from(n)
        } else {
            Point::new(bounds_of(&points).width() + step, 0.0) * f64::from(n)
        }
    }

    fn place_copies(&mut self, items: Vec<Entity>, n: u32, label: &str, now_ms: u64) {
        if items.is_empty() {
            return;
        }
        let Some(floor) = self.state.current_floor() else {
            return;
        };
        let offset = self.placement_offset(&items, n);
        let remap: HashMap<EntityId, EntityId> = items
            .iter()
            .map(|e| (e.id(), EntityId::fresh(e.kind_label())))
            .collect();
        let mut copies: Vec<Entity> = items
            .iter()
            .filter_map(|e| relabel(e.translated(offset), &remap, floor.id))
            .collect();
        copies.sort_by_key(|e| !matches!(e, Entity::Room(_)));

        let mut candidate = floor.clone();
        let mut placed = Vec::with_capacity(copies.len());
        for copy in copies {
            let copy = assign_owner(copy, &candidate);
            placed.push(copy.id());
            candidate.upsert(copy);
        }
        let validation = Validation::worst(
            placed
                .iter()
                .filter_map(|id| candidate.entity(*id))
                .map(|e| validate_entity(&e, &candidate, &self.config.validation)),
        );
        if validation.is_blocking() {
            log::debug!("{label} rejected: {:?}", validation.message);
            self.state.status = Some(validation);
            return;
        }

        let selection: Vec<SelectedElement> = placed
            .iter()
            .filter_map(|id| SelectedElement::for_entity(&candidate, *id))
            .collect();
        let count = placed.len();
        self.state.replace_floor(candidate);
        self.state.selected_elements.clear();
        self.state.selected_elements.extend(selection);
        let description = if count == 1 {
            label.to_string()
        } else {
            format!("{label} {count} elements")
        };
        self.commit(description, now_ms, validation);
    }

    // ─── Input ───────────────────────────────────────────────────────────

    /// Route one input event; `now_ms` timestamps any resulting commit.
    pub fn handle(&mut self, event: &InputEvent, now_ms: u64) -> &EditorState {
        self.clock_ms = self.clock_ms.max(now_ms);
        match *event {
            InputEvent::PointerDown {
                x,
                y,
                button,
                modifiers,
            } => self.pointer_down(Point::new(x, y), button, modifiers, now_ms),
            InputEvent::PointerMove { x, y, .. } => self.pointer_move(Point::new(x, y), now_ms),
            InputEvent::PointerUp { x, y, button } => self.pointer_up(Point::new(x, y), button, now_ms),
            InputEvent::DoubleClick { x, y } => {
                let world = self.to_world(Point::new(x, y));
                self.tool_event(ToolEvent::DoubleClick(world), now_ms);
            }
            InputEvent::Wheel { x, y, delta_y } => self.wheel(Point::new(x, y), delta_y),
            InputEvent::Key { ref key, modifiers } => self.key(key, modifiers, now_ms),
        }
        &self.state
    }

    fn to_world(&self, screen: Point) -> Point {
        self.state.viewport.to_world(screen, self.config.pixels_per_unit)
    }

    fn pointer_down(&mut self, screen: Point, button: PointerButton, modifiers: Modifiers, now_ms: u64) {
        self.state.context_menu = None;
        match button {
            PointerButton::Middle => {
                if matches!(self.gesture, Gesture::Idle) {
                    self.gesture = Gesture::Pan { last: screen };
                }
            }
            PointerButton::Secondary => {
                if matches!(self.gesture, Gesture::Idle) {
                    let target = self.hit(self.to_world(screen)).map(|h| h.as_selection());
                    self.state.context_menu = Some(ContextMenu {
                        position: screen,
                        target,
                    });
                }
            }
            PointerButton::Primary => {
                if !matches!(self.gesture, Gesture::Idle | Gesture::Tool) {
                    return;
                }
                let world = self.to_world(screen);
                if self.tool.is_some() {
                    self.tool_event(ToolEvent::Down(world), now_ms);
                } else {
                    self.select_down(world, modifiers);
                }
            }
        }
    }

    fn hit(&self, world: Point) -> Option<HitTarget> {
        let floor = self.state.current_floor()?;
        let tol = HitTolerances::new(&self.config, self.state.viewport.zoom);
        find_element_at(floor, world, &tol, &self.state.selected_elements)
    }

    fn select_down(&mut self, world: Point, modifiers: Modifiers) {
        let hit = self.hit(world);
        let additive = modifiers.shift || modifiers.ctrl || modifiers.meta;
        let selection_before = self.state.selected_elements.clone();
        let selection = &mut self.state.selected_elements;

        let target = match hit {
            None => {
                if !additive {
                    selection.clear();
                }
                self.gesture = Gesture::BoxSelect {
                    start: world,
                    current: world,
                    additive,
                };
                self.state.refresh_measurements(self.config.meters_per_unit);
                return;
            }
            Some(h) if additive => {
                selection.toggle(h.as_selection());
                self.state.refresh_measurements(self.config.meters_per_unit);
                return;
            }
            Some(HitTarget::Vertex { room_id, index }) => {
                selection.select_only(SelectedElement::Vertex { room_id, index });
                DragTarget::Vertex { room_id, index }
            }
            Some(HitTarget::Segment { room_id, index }) => {
                selection.select_only(SelectedElement::Segment { room_id, index });
                DragTarget::Segment { room_id, index }
            }
            Some(HitTarget::LinkCorner { link_id, index }) => DragTarget::LinkCorner { link_id, index },
            Some(h) => {
                let element = h.as_selection();
                if !selection.contains(&element) {
                    selection.select_only(element);
                }
                DragTarget::Elements(selection.entity_ids())
            }
        };
        self.state.refresh_measurements(self.config.meters_per_unit);

        let Some(floor) = self.state.current_floor() else {
            return;
        };
        let session = DragSession::begin(target, world, floor, self.state.grid_size);
        self.gesture = Gesture::Drag {
            session,
            selection_before,
        };
    }

    fn pointer_move(&mut self, screen: Point, now_ms: u64) {
        let world = self.to_world(screen);
        match &mut self.gesture {
            Gesture::Pan { last } => {
                let d = screen - *last;
                *last = screen;
                self.state.viewport.pan = self.state.viewport.pan + d;
            }
            Gesture::BoxSelect { current, .. } => *current = world,
            Gesture::Drag { session, .. } => {
                let Some(floor) = self.state.current_floor() else {
                    return;
                };
                let out = session.update(world, floor, &self.config, self.state.grid_size);
                self.state.status = out.validation.severity.is_some().then_some(out.validation);
                self.state.replace_floor(out.floor);
            }
            Gesture::Tool | Gesture::Idle => {
                if self.tool.is_some() {
                    self.tool_event(ToolEvent::Move(world), now_ms);
                } else {
                    self.hover = self.hit(world);
                }
            }
        }
    }

    fn pointer_up(&mut self, screen: Point, button: PointerButton, now_ms: u64) {
        let world = self.to_world(screen);
        match button {
            PointerButton::Middle => {
                if matches!(self.gesture, Gesture::Pan { .. }) {
                    self.gesture = Gesture::Idle;
                }
            }
            PointerButton::Secondary => {}
            PointerButton::Primary => match std::mem::replace(&mut self.gesture, Gesture::Idle) {
                Gesture::Drag { session, .. } => self.finish_drag(session, world, now_ms),
                Gesture::BoxSelect { start, additive, .. } => self.finish_box(start, world, additive),
                Gesture::Tool | Gesture::Idle => self.tool_event(ToolEvent::Up(world), now_ms),
                pan @ Gesture::Pan { .. } => self.gesture = pan,
            },
        }
    }

    fn finish_drag(&mut self, mut session: DragSession, world: Point, now_ms: u64) {
        let Some(floor) = self.state.current_floor() else {
            return;
        };
        let out = session.update(world, floor, &self.config, self.state.grid_size);
        if !session.changed() {
            let restored = session.cancel(&out.floor);
            self.state.replace_floor(restored);
            return;
        }
        if out.validation.is_blocking() {
            log::debug!("{} rejected: {:?}", session.label(), out.validation.message);
            let restored = session.cancel(&out.floor);
            self.state.replace_floor(restored);
            self.state.status = Some(out.validation);
            return;
        }
        self.state.replace_floor(out.floor);
        self.commit(session.label(), now_ms, out.validation);
    }

    fn finish_box(&mut self, start: Point, end: Point, additive: bool) {
        let rect = Bounds::from_corners(start, end);
        let min = self.config.px_to_world(2.0, self.state.viewport.zoom);
        if rect.width() < min && rect.height() < min {
            return;
        }
        let Some(floor) = self.state.current_floor() else {
            return;
        };
        let found = elements_in_rect(floor, &rect);
        if !additive {
            self.state.selected_elements.clear();
        }
        self.state.selected_elements.extend(found);
        self.state.refresh_measurements(self.config.meters_per_unit);
    }

    fn tool_event(&mut self, event: ToolEvent, now_ms: u64) {
        let Some(tool) = self.tool.as_mut() else {
            return;
        };
        let Some(floor) = self.state.current_floor() else {
            return;
        };
        let ctx = ToolContext {
            floor,
            config: &self.config,
            zoom: self.state.viewport.zoom,
            grid_size: self.state.grid_size,
        };
        let action = tool.handle(&event, &ctx);
        let active = tool.is_active();
        let polygon = match tool.preview() {
            Some(Preview::Polygon { points, .. }) => Some(points),
            _ => None,
        };
        self.gesture = if active { Gesture::Tool } else { Gesture::Idle };
        self.state.current_polygon = polygon;

        match action {
            Some(ToolAction::Commit(entity)) => {
                self.create(entity, now_ms);
            }
            Some(ToolAction::AwaitFloorSelection(link)) => {
                log::debug!("{} {} awaiting floor selection", link.kind.label(), link.id);
                self.state.pending_link = Some(link);
                self.state.status = Some(Validation::info("Choose the floors this link connects"));
            }
            Some(ToolAction::Rejected(validation)) => self.state.status = Some(validation),
            Some(ToolAction::Cancelled) | None => {}
        }
    }

    fn wheel(&mut self, anchor: Point, delta_y: f64) {
        let step = self.config.zoom_step;
        let factor = if delta_y < 0.0 {
            step
        } else if delta_y > 0.0 {
            1.0 / step
        } else {
            return;
        };
        self.zoom_by(anchor, factor);
    }

    fn zoom_by(&mut self, anchor: Point, factor: f64) {
        let zoom = (self.state.viewport.zoom * factor).clamp(self.config.min_zoom, self.config.max_zoom);
        self.state
            .viewport
            .zoom_about(anchor, zoom, self.config.pixels_per_unit);
    }

    fn key(&mut self, key: &str, m: Modifiers, now_ms: u64) {
        let Some(action) = ShortcutMap::resolve(key, m) else {
            return;
        };
        let command = match action {
            ShortcutAction::Tool(kind) => Command::SetTool(kind),
            ShortcutAction::Undo => Command::Undo,
            ShortcutAction::Redo => Command::Redo,
            ShortcutAction::Delete => Command::Delete,
            ShortcutAction::SelectAll => Command::SelectAll,
            ShortcutAction::Duplicate => Command::Duplicate,
            ShortcutAction::Copy => Command::Copy,
            ShortcutAction::Paste => Command::Paste,
            ShortcutAction::Cancel => return self.escape(now_ms),
            ShortcutAction::Confirm => return self.tool_event(ToolEvent::Confirm, now_ms),
            ShortcutAction::ZoomIn => return self.zoom_by(Point::ZERO, self.config.zoom_step),
            ShortcutAction::ZoomOut => return self.zoom_by(Point::ZERO, 1.0 / self.config.zoom_step),
            ShortcutAction::ResetView => {
                self.state.viewport = Viewport::default();
                return;
            }
        };
        self.apply_at(command, now_ms);
    }

    /// Escape: cancel the gesture in progress, else close whatever is open,
    /// else deselect.
    fn escape(&mut self, now_ms: u64) {
        match std::mem::replace(&mut self.gesture, Gesture::Idle) {
            Gesture::Drag {
                session,
                selection_before,
            } => {
                if let Some(restored) = self.state.current_floor().map(|f| session.cancel(f)) {
                    self.state.replace_floor(restored);
                }
                self.state.selected_elements = selection_before;
                self.state.status = None;
                self.state.refresh_measurements(self.config.meters_per_unit);
            }
            Gesture::Tool => self.tool_event(ToolEvent::Cancel, now_ms),
            Gesture::BoxSelect { .. } | Gesture::Pan { .. } => {}
            Gesture::Idle => {
                if self.state.context_menu.take().is_some() || self.state.pending_link.take().is_some() {
                    return;
                }
                self.state.selected_elements.clear();
                self.state.refresh_measurements(self.config.meters_per_unit);
            }
        }
    }

    /// Drop any gesture without committing: drags are restored, tools reset.
    fn abort_gesture(&mut self) {
        match std::mem::replace(&mut self.gesture, Gesture::Idle) {
            Gesture::Drag {
                session,
                selection_before,
            } => {
                if let Some(restored) = self.state.current_floor().map(|f| session.cancel(f)) {
                    self.state.replace_floor(restored);
                }
                self.state.selected_elements = selection_before;
            }
            Gesture::Tool => {
                self.tool = make_tool(self.state.selected_tool);
                self.state.current_polygon = None;
            }
            Gesture::BoxSelect { .. } | Gesture::Pan { .. } | Gesture::Idle => {}
        }
    }
}

fn with_ground_floor(floors: FloorSet) -> FloorSet {
    if floors.floors.is_empty() {
        FloorSet {
            floors: vec![Floor::new(EntityId::fresh("floor"), "Ground floor")],
        }
    } else {
        floors
    }
}

/// Give a copied entity its new ID and point its references at copied
/// owners. Doors whose rooms were not both copied are dropped.
fn relabel(entity: Entity, remap: &HashMap<EntityId, EntityId>, floor_id: EntityId) -> Option<Entity> {
    let new_id = |id: EntityId| remap.get(&id).copied();
    let owner = |o: Option<EntityId>| o.and_then(|o| remap.get(&o).copied());
    Some(match entity {
        Entity::Room(r) => Entity::Room(Room {
            id: new_id(r.id)?,
            ..r
        }),
        Entity::Wall(w) => Entity::Wall(Wall {
            id: new_id(w.id)?,
            room_id: owner(w.room_id),
            ..w
        }),
        Entity::Door(d) => Entity::Door(Door {
            id: new_id(d.id)?,
            room_a: new_id(d.room_a)?,
            room_b: new_id(d.room_b)?,
            room_id: owner(d.room_id),
            ..d
        }),
        Entity::Artwork(a) => Entity::Artwork(Artwork {
            id: new_id(a.id)?,
            room_id: owner(a.room_id),
            ..a
        }),
        Entity::VerticalLink(l) => Entity::VerticalLink(VerticalLink {
            id: new_id(l.id)?,
            floor_id,
            room_id: owner(l.room_id),
            connected_floor_ids: smallvec![floor_id],
            link_group_id: None,
            link_number: None,
            ..l
        }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use fp_core::validate::Severity;

    fn config() -> EditorConfig {
        EditorConfig::default()
    }

    fn rect(x: f64, y: f64, w: f64, h: f64) -> Room {
        Room::new(
            EntityId::fresh("room"),
            vec![
                Point::new(x, y),
                Point::new(x + w, y),
                Point::new(x + w, y + h),
                Point::new(x, y + h),
            ],
        )
    }

    #[test]
    fn empty_building_gets_a_floor() {
        let editor = Editor::new(config(), FloorSet::default());
        assert_eq!(editor.state().floors.floors.len(), 1);
        assert!(editor.state().current_floor().is_some());
        assert!(!editor.history().can_undo());
    }

    #[test]
    fn paste_places_rooms_beside_the_original() {
        let mut editor = Editor::new(config(), FloorSet::default());
        editor.apply(Command::Create(Entity::Room(rect(0.0, 0.0, 4.0, 3.0))));
        editor.apply(Command::Copy);
        editor.apply(Command::Paste);
        let floor = editor.state().current_floor().expect("floor");
        assert_eq!(floor.rooms.len(), 2);
        assert_eq!(floor.rooms[1].polygon[0], Point::new(5.0, 0.0));
        assert_eq!(editor.history().undo_label(), Some("Paste"));
    }

    #[test]
    fn commits_note_unconnected_rooms_and_floors() {
        let mut editor = Editor::new(config(), FloorSet::default());
        editor.apply(Command::Create(Entity::Room(rect(0.0, 0.0, 4.0, 3.0))));
        assert!(editor.state().status.is_none());

        editor.apply(Command::Create(Entity::Room(rect(6.0, 0.0, 4.0, 3.0))));
        let status = editor.state().status.clone().expect("note");
        assert_eq!(status.severity, Some(Severity::Info));
        assert!(status.message.is_some_and(|m| m.starts_with("No door reaches")));

        editor.apply(Command::AddFloor {
            name: "Upper".into(),
        });
        let status = editor.state().status.clone().expect("note");
        assert_eq!(
            status.message.as_deref(),
            Some("No vertical link reaches: Ground floor, Upper")
        );
    }

    #[test]
    fn wheel_zoom_is_clamped() {
        let mut editor = Editor::new(config(), FloorSet::default());
        for _ in 0..100 {
            editor.handle(
                &InputEvent::Wheel {
                    x: 10.0,
                    y: 10.0,
                    delta_y: -1.0,
                },
                0,
            );
        }
        assert_eq!(editor.state().viewport.zoom, 10.0);
    }

    #[test]
    fn secondary_click_opens_context_menu() {
        let mut editor = Editor::new(config(), FloorSet::default());
        let room = rect(0.0, 0.0, 4.0, 4.0);
        let id = room.id;
        editor.apply(Command::Create(Entity::Room(room)));
        editor.handle(
            &InputEvent::PointerDown {
                x: 40.0,
                y: 40.0,
                button: PointerButton::Secondary,
                modifiers: Modifiers::NONE,
            },
            0,
        );
        let menu = editor.state().context_menu.expect("menu");
        assert_eq!(menu.target, Some(SelectedElement::Room(id)));
        editor.handle(&InputEvent::key("Escape"), 0);
        assert!(editor.state().context_menu.is_none());
    }

    #[test]
    fn middle_drag_pans() {
        let mut editor = Editor::new(config(), FloorSet::default());
        editor.handle(
            &InputEvent::PointerDown {
                x: 0.0,
                y: 0.0,
                button: PointerButton::Middle,
                modifiers: Modifiers::NONE,
            },
            0,
        );
        editor.handle(&InputEvent::moved(30.0, -10.0), 0);
        editor.handle(
            &InputEvent::PointerUp {
                x: 30.0,
                y: -10.0,
                button: PointerButton::Middle,
            },
            0,
        );
        assert_eq!(editor.state().viewport.pan, Point::new(30.0, -10.0));
        assert!(!editor.is_gesture_active());
    }
}
