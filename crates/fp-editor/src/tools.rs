//! Creation tools.
//!
//! Each tool is a small state machine
//! `idle → creating (valid | invalid) → committed | cancelled`, driven by
//! world-space [`ToolEvent`]s. Tools never touch editor state: they return a
//! [`ToolAction`] and expose live [`Feedback`] and a [`Preview`] for the
//! renderer.
//!
//! | Tool | Gesture | Result |
//! |------|---------|--------|
//! | Polygon | click per vertex; double-click, Enter or click near the first vertex closes | Room |
//! | Rectangle / Circle / Triangle / Arc | drag | Room |
//! | Wall | drag | Wall |
//! | Door | hover a shared wall, click a slot (or drag along it) | Door |
//! | Stairs / Elevator | drag a rectangle | VerticalLink, after floor selection |
//! | Artwork | click | Artwork |

use crate::config::EditorConfig;
use fp_core::geometry::{Bounds, segment_distance};
use fp_core::id::EntityId;
use fp_core::model::{
    Artwork, Door, Entity, Floor, Point, Room, Size, VerticalLink, VerticalLinkKind, Wall,
};
use fp_core::snap::{SnapOptions, smart_snap, snap_to_grid};
use fp_core::topology::{SharedWall, door_candidates, shared_wall_for_segment, shared_walls};
use fp_core::validate::{
    Validation, validate_artwork, validate_door, validate_room, validate_vertical_link,
    validate_wall,
};
use smallvec::smallvec;
use std::f64::consts::{PI, TAU};

/// The active tool determines how primary-button input is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    Select,
    Polygon,
    Rectangle,
    Circle,
    Triangle,
    Arc,
    Wall,
    Door,
    Stairs,
    Elevator,
    Artwork,
}

impl ToolKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Select => "select",
            Self::Polygon => "polygon",
            Self::Rectangle => "rectangle",
            Self::Circle => "circle",
            Self::Triangle => "triangle",
            Self::Arc => "arc",
            Self::Wall => "wall",
            Self::Door => "door",
            Self::Stairs => "stairs",
            Self::Elevator => "elevator",
            Self::Artwork => "artwork",
        }
    }
}

/// Pointer/keyboard input already converted to world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ToolEvent {
    Down(Point),
    Move(Point),
    Up(Point),
    DoubleClick(Point),
    /// Enter.
    Confirm,
    /// Escape.
    Cancel,
}

/// Read-only view of what a tool may consult.
pub struct ToolContext<'a> {
    pub floor: &'a Floor,
    pub config: &'a EditorConfig,
    pub zoom: f64,
    pub grid_size: f64,
}

impl ToolContext<'_> {
    fn snap_options(&self) -> SnapOptions {
        SnapOptions {
            grid_size: self.grid_size,
            ..self.config.snap.clone()
        }
    }

    /// Smart snap against the floor's geometry.
    pub fn snap(&self, p: Point) -> Point {
        smart_snap(p, self.floor, &self.snap_options()).point
    }

    pub fn snap_grid(&self, p: Point) -> Point {
        snap_to_grid(p, self.grid_size)
    }

    /// Screen pixels → world units at the current zoom.
    pub fn px(&self, px: f64) -> f64 {
        self.config.px_to_world(px, self.zoom)
    }
}

/// What the orchestrator should do after a tool event.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolAction {
    /// Append the entity as a historied commit.
    Commit(Entity),
    /// Hand the link to the floor-selection step before appending it.
    AwaitFloorSelection(VerticalLink),
    /// The finished candidate was invalid and has been discarded.
    Rejected(Validation),
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Creating { valid: bool },
    Committed,
    Cancelled,
}

/// Live state for the renderer's validity badge.
#[derive(Debug, Clone, PartialEq)]
pub struct Feedback {
    pub phase: Phase,
    pub validation: Validation,
}

impl Default for Feedback {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            validation: Validation::ok(),
        }
    }
}

impl Feedback {
    fn creating(validation: Validation) -> Self {
        Self {
            phase: Phase::Creating {
                valid: validation.valid,
            },
            validation,
        }
    }

    fn cancelled() -> Self {
        Self {
            phase: Phase::Cancelled,
            validation: Validation::ok(),
        }
    }
}

/// In-progress geometry for the renderer.
#[derive(Debug, Clone, PartialEq)]
pub enum Preview {
    Polygon {
        points: Vec<Point>,
        cursor: Option<Point>,
    },
    Shape(Vec<Point>),
    Wall([Point; 2]),
    Door {
        candidates: Vec<[Point; 2]>,
        chosen: Option<[Point; 2]>,
    },
    Rect {
        position: Point,
        size: Size,
    },
    Marker(Point),
}

/// Trait for creation tools.
pub trait Tool {
    fn kind(&self) -> ToolKind;

    /// Handle an event, returning an action when the gesture finishes.
    fn handle(&mut self, event: &ToolEvent, ctx: &ToolContext) -> Option<ToolAction>;

    fn feedback(&self) -> &Feedback;

    fn preview(&self) -> Option<Preview>;

    /// Whether a gesture is in progress.
    fn is_active(&self) -> bool {
        matches!(self.feedback().phase, Phase::Creating { .. })
    }
}

/// Build the creation tool for `kind`; the select tool has none.
pub fn make_tool(kind: ToolKind) -> Option<Box<dyn Tool>> {
    match kind {
        ToolKind::Select => None,
        ToolKind::Polygon => Some(Box::new(PolygonTool::new())),
        ToolKind::Rectangle => Some(Box::new(ShapeTool::new(ShapeKind::Rectangle))),
        ToolKind::Circle => Some(Box::new(ShapeTool::new(ShapeKind::Circle))),
        ToolKind::Triangle => Some(Box::new(ShapeTool::new(ShapeKind::Triangle))),
        ToolKind::Arc => Some(Box::new(ShapeTool::new(ShapeKind::Arc))),
        ToolKind::Wall => Some(Box::new(WallTool::new())),
        ToolKind::Door => Some(Box::new(DoorTool::new())),
        ToolKind::Stairs => Some(Box::new(VerticalLinkTool::new(VerticalLinkKind::Stairs))),
        ToolKind::Elevator => Some(Box::new(VerticalLinkTool::new(VerticalLinkKind::Elevator))),
        ToolKind::Artwork => Some(Box::new(ArtworkTool::new())),
    }
}

/// Placeholder ID for candidates that are only validated, never stored.
fn preview_id() -> EntityId {
    EntityId::intern("preview")
}

/// Validate a finished candidate and turn it into the matching action.
fn conclude(
    feedback: &mut Feedback,
    validation: Validation,
    accept: impl FnOnce() -> ToolAction,
) -> Option<ToolAction> {
    if validation.is_blocking() {
        log::debug!("candidate rejected: {:?}", validation.message);
        *feedback = Feedback {
            phase: Phase::Cancelled,
            validation: validation.clone(),
        };
        Some(ToolAction::Rejected(validation))
    } else {
        *feedback = Feedback {
            phase: Phase::Committed,
            validation,
        };
        Some(accept())
    }
}

// ─── Polygon Tool ────────────────────────────────────────────────────────

pub struct PolygonTool {
    points: Vec<Point>,
    cursor: Option<Point>,
    feedback: Feedback,
}

impl Default for PolygonTool {
    fn default() -> Self {
        Self::new()
    }
}

impl PolygonTool {
    pub fn new() -> Self {
        Self {
            points: Vec::new(),
            cursor: None,
            feedback: Feedback::default(),
        }
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    fn live_validation(&self, ctx: &ToolContext) -> Validation {
        let mut pts = self.points.clone();
        pts.extend(self.cursor);
        if pts.len() < 3 {
            return Validation::ok();
        }
        validate_room(&Room::new(preview_id(), pts), ctx.floor, &ctx.config.validation)
    }

    fn close(&mut self, ctx: &ToolContext) -> Option<ToolAction> {
        if self.points.len() < 3 {
            return None;
        }
        let room = Room::new(EntityId::fresh("room"), std::mem::take(&mut self.points));
        self.cursor = None;
        let v = validate_room(&room, ctx.floor, &ctx.config.validation);
        conclude(&mut self.feedback, v, || ToolAction::Commit(Entity::Room(room)))
    }
}

impl Tool for PolygonTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Polygon
    }

    fn handle(&mut self, event: &ToolEvent, ctx: &ToolContext) -> Option<ToolAction> {
        match *event {
            ToolEvent::Down(p) => {
                let s = ctx.snap(p);
                let threshold = ctx.px(ctx.config.closing_threshold_px);
                if let Some(first) = self.points.first().copied()
                    && self.points.len() >= 3
                    && (s.distance_to(first) <= threshold || p.distance_to(first) <= threshold)
                {
                    return self.close(ctx);
                }
                if self.points.last().is_none_or(|last| last.distance_to(s) > f64::EPSILON) {
                    self.points.push(s);
                }
                self.cursor = None;
                self.feedback = Feedback::creating(self.live_validation(ctx));
                None
            }
            ToolEvent::Move(p) => {
                if !self.points.is_empty() {
                    self.cursor = Some(ctx.snap(p));
                    self.feedback = Feedback::creating(self.live_validation(ctx));
                }
                None
            }
            ToolEvent::Up(_) => None,
            ToolEvent::DoubleClick(_) | ToolEvent::Confirm => self.close(ctx),
            ToolEvent::Cancel => {
                if self.points.len() >= 3 {
                    return self.close(ctx);
                }
                if self.points.is_empty() {
                    return None;
                }
                self.points.clear();
                self.cursor = None;
                self.feedback = Feedback::cancelled();
                Some(ToolAction::Cancelled)
            }
        }
    }

    fn feedback(&self) -> &Feedback {
        &self.feedback
    }

    fn preview(&self) -> Option<Preview> {
        (!self.points.is_empty()).then(|| Preview::Polygon {
            points: self.points.clone(),
            cursor: self.cursor,
        })
    }
}

// ─── Shape Tool ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    Rectangle,
    Circle,
    Triangle,
    /// Semicircle whose diameter runs from the drag start to the drag end.
    Arc,
}

/// Room outline for a drag from `a` to `b`.
pub fn shape_polygon(kind: ShapeKind, a: Point, b: Point, config: &EditorConfig) -> Vec<Point> {
    match kind {
        ShapeKind::Rectangle => {
            let r = Bounds::from_corners(a, b);
            vec![
                Point::new(r.min_x, r.min_y),
                Point::new(r.max_x, r.min_y),
                Point::new(r.max_x, r.max_y),
                Point::new(r.min_x, r.max_y),
            ]
        }
        ShapeKind::Circle => {
            let radius = a.distance_to(b);
            let n = config.circle_segments.max(3);
            (0..n)
                .map(|i| {
                    let t = TAU * i as f64 / n as f64;
                    Point::new(a.x + radius * t.cos(), a.y + radius * t.sin())
                })
                .collect()
        }
        ShapeKind::Triangle => {
            let r = Bounds::from_corners(a, b);
            vec![
                Point::new(r.min_x, r.max_y),
                Point::new(r.max_x, r.max_y),
                Point::new((r.min_x + r.max_x) / 2.0, r.min_y),
            ]
        }
        ShapeKind::Arc => {
            let c = a.midpoint(b);
            let radius = a.distance_to(b) / 2.0;
            let start = (a.y - c.y).atan2(a.x - c.x);
            let n = config.arc_segments.max(2);
            (0..=n)
                .map(|i| {
                    let t = start + PI * i as f64 / n as f64;
                    Point::new(c.x + radius * t.cos(), c.y + radius * t.sin())
                })
                .collect()
        }
    }
}

pub struct ShapeTool {
    shape: ShapeKind,
    start: Option<Point>,
    outline: Vec<Point>,
    feedback: Feedback,
}

impl ShapeTool {
    pub fn new(shape: ShapeKind) -> Self {
        Self {
            shape,
            start: None,
            outline: Vec::new(),
            feedback: Feedback::default(),
        }
    }
}

impl Tool for ShapeTool {
    fn kind(&self) -> ToolKind {
        match self.shape {
            ShapeKind::Rectangle => ToolKind::Rectangle,
            ShapeKind::Circle => ToolKind::Circle,
            ShapeKind::Triangle => ToolKind::Triangle,
            ShapeKind::Arc => ToolKind::Arc,
        }
    }

    fn handle(&mut self, event: &ToolEvent, ctx: &ToolContext) -> Option<ToolAction> {
        match *event {
            ToolEvent::Down(p) => {
                self.start = Some(ctx.snap(p));
                self.outline.clear();
                self.feedback = Feedback::creating(Validation::ok());
                None
            }
            ToolEvent::Move(p) => {
                let start = self.start?;
                let s = ctx.snap(p);
                self.outline = shape_polygon(self.shape, start, s, ctx.config);
                if start.distance_to(s) >= ctx.config.min_drag_distance {
                    let room = Room::new(preview_id(), self.outline.clone());
                    self.feedback =
                        Feedback::creating(validate_room(&room, ctx.floor, &ctx.config.validation));
                }
                None
            }
            ToolEvent::Up(p) => {
                let start = self.start.take()?;
                let end = ctx.snap(p);
                self.outline.clear();
                if start.distance_to(end) < ctx.config.min_drag_distance {
                    self.feedback = Feedback::default();
                    return None;
                }
                let room = Room::new(
                    EntityId::fresh("room"),
                    shape_polygon(self.shape, start, end, ctx.config),
                );
                let v = validate_room(&room, ctx.floor, &ctx.config.validation);
                conclude(&mut self.feedback, v, || ToolAction::Commit(Entity::Room(room)))
            }
            ToolEvent::Cancel => {
                self.start.take()?;
                self.outline.clear();
                self.feedback = Feedback::cancelled();
                Some(ToolAction::Cancelled)
            }
            ToolEvent::DoubleClick(_) | ToolEvent::Confirm => None,
        }
    }

    fn feedback(&self) -> &Feedback {
        &self.feedback
    }

    fn preview(&self) -> Option<Preview> {
        (self.start.is_some() && !self.outline.is_empty())
            .then(|| Preview::Shape(self.outline.clone()))
    }
}

// ─── Wall Tool ───────────────────────────────────────────────────────────

pub struct WallTool {
    start: Option<Point>,
    current: Option<Point>,
    feedback: Feedback,
}

impl Default for WallTool {
    fn default() -> Self {
        Self::new()
    }
}

impl WallTool {
    pub fn new() -> Self {
        Self {
            start: None,
            current: None,
            feedback: Feedback::default(),
        }
    }
}

impl Tool for WallTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Wall
    }

    fn handle(&mut self, event: &ToolEvent, ctx: &ToolContext) -> Option<ToolAction> {
        let thickness = ctx.config.default_wall_thickness;
        match *event {
            ToolEvent::Down(p) => {
                let s = ctx.snap(p);
                self.start = Some(s);
                self.current = Some(s);
                self.feedback = Feedback::creating(Validation::ok());
                None
            }
            ToolEvent::Move(p) => {
                let start = self.start?;
                let s = ctx.snap(p);
                self.current = Some(s);
                let wall = Wall::segment(preview_id(), start, s, thickness);
                self.feedback =
                    Feedback::creating(validate_wall(&wall, ctx.floor, &ctx.config.validation));
                None
            }
            ToolEvent::Up(p) => {
                let start = self.start.take()?;
                let end = ctx.snap(p);
                self.current = None;
                if start.distance_to(end) < ctx.config.min_drag_distance {
                    self.feedback = Feedback::default();
                    return None;
                }
                let wall = Wall::segment(EntityId::fresh("wall"), start, end, thickness);
                let v = validate_wall(&wall, ctx.floor, &ctx.config.validation);
                conclude(&mut self.feedback, v, || ToolAction::Commit(Entity::Wall(wall)))
            }
            ToolEvent::Cancel => {
                self.start.take()?;
                self.current = None;
                self.feedback = Feedback::cancelled();
                Some(ToolAction::Cancelled)
            }
            ToolEvent::DoubleClick(_) | ToolEvent::Confirm => None,
        }
    }

    fn feedback(&self) -> &Feedback {
        &self.feedback
    }

    fn preview(&self) -> Option<Preview> {
        Some(Preview::Wall([self.start?, self.current?]))
    }
}

// ─── Door Tool ───────────────────────────────────────────────────────────

/// Doors go on walls shared by two rooms. Hovering a shared wall offers slot
/// candidates of the default width; a click takes the slot nearest the
/// pointer, a drag along the wall defines the door segment directly.
pub struct DoorTool {
    wall: Option<SharedWall>,
    candidates: Vec<[Point; 2]>,
    chosen: Option<usize>,
    start: Option<Point>,
    current: Option<Point>,
    feedback: Feedback,
}

impl Default for DoorTool {
    fn default() -> Self {
        Self::new()
    }
}

impl DoorTool {
    pub fn new() -> Self {
        Self {
            wall: None,
            candidates: Vec::new(),
            chosen: None,
            start: None,
            current: None,
            feedback: Feedback::default(),
        }
    }

    /// Refresh the hovered shared wall and its slot candidates.
    fn hover(&mut self, p: Point, ctx: &ToolContext) {
        let tol = ctx.config.validation.door_tolerance;
        let reach = ctx.config.snap.snap_distance.max(ctx.px(ctx.config.element_hit_px));
        self.wall = shared_walls(ctx.floor, tol)
            .into_iter()
            .map(|w| (segment_distance(p, w.start, w.end), w))
            .filter(|(d, _)| *d <= reach)
            .fold(None, |best: Option<(f64, SharedWall)>, (d, w)| match best {
                Some((bd, _)) if bd <= d => best,
                _ => Some((d, w)),
            })
            .map(|(_, w)| w);
        self.candidates = self
            .wall
            .map(|w| door_candidates(&w, ctx.config.default_door_width))
            .unwrap_or_default();
        self.chosen = self
            .candidates
            .iter()
            .enumerate()
            .map(|(i, [a, b])| (a.midpoint(*b).distance_to(p), i))
            .fold(None, |best: Option<(f64, usize)>, (d, i)| match best {
                Some((bd, _)) if bd <= d => best,
                _ => Some((d, i)),
            })
            .map(|(_, i)| i);
    }

    fn door(segment: [Point; 2], wall: &SharedWall) -> Door {
        Door {
            id: EntityId::fresh("door"),
            segment,
            width: segment[0].distance_to(segment[1]),
            room_a: wall.room_a,
            room_b: wall.room_b,
            room_id: None,
        }
    }

    fn not_on_shared_wall(&mut self) -> Option<ToolAction> {
        let v = Validation::error("Doors must be placed on a wall shared by two rooms");
        self.feedback = Feedback {
            phase: Phase::Cancelled,
            validation: v.clone(),
        };
        Some(ToolAction::Rejected(v))
    }
}

impl Tool for DoorTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Door
    }

    fn handle(&mut self, event: &ToolEvent, ctx: &ToolContext) -> Option<ToolAction> {
        match *event {
            ToolEvent::Down(p) => {
                self.hover(p, ctx);
                let s = ctx.snap(p);
                self.start = Some(s);
                self.current = Some(s);
                self.feedback = Feedback::creating(Validation::ok());
                None
            }
            ToolEvent::Move(p) => {
                match self.start {
                    Some(_) => self.current = Some(ctx.snap(p)),
                    None => self.hover(p, ctx),
                }
                None
            }
            ToolEvent::Up(p) => {
                let start = self.start.take()?;
                let end = ctx.snap(p);
                self.current = None;
                let tol = ctx.config.validation.door_tolerance;

                if start.distance_to(end) >= ctx.config.min_drag_distance {
                    let Some(wall) = shared_wall_for_segment(ctx.floor, start, end, tol) else {
                        return self.not_on_shared_wall();
                    };
                    let door = Self::door([start, end], &wall);
                    let v = validate_door(&door, ctx.floor, &ctx.config.validation);
                    return conclude(&mut self.feedback, v, || ToolAction::Commit(Entity::Door(door)));
                }

                self.hover(p, ctx);
                let (Some(wall), Some(slot)) = (self.wall, self.chosen.map(|i| self.candidates[i])) else {
                    return self.not_on_shared_wall();
                };
                let door = Self::door(slot, &wall);
                let v = validate_door(&door, ctx.floor, &ctx.config.validation);
                conclude(&mut self.feedback, v, || ToolAction::Commit(Entity::Door(door)))
            }
            ToolEvent::Cancel => {
                self.start.take()?;
                self.current = None;
                self.feedback = Feedback::cancelled();
                Some(ToolAction::Cancelled)
            }
            ToolEvent::DoubleClick(_) | ToolEvent::Confirm => None,
        }
    }

    fn feedback(&self) -> &Feedback {
        &self.feedback
    }

    fn preview(&self) -> Option<Preview> {
        if self.wall.is_none() && self.start.is_none() {
            return None;
        }
        let chosen = match (self.start, self.current) {
            (Some(a), Some(b)) if a != b => Some([a, b]),
            _ => self.chosen.map(|i| self.candidates[i]),
        };
        Some(Preview::Door {
            candidates: self.candidates.clone(),
            chosen,
        })
    }
}

// ─── Vertical Link Tool ──────────────────────────────────────────────────

pub struct VerticalLinkTool {
    link_kind: VerticalLinkKind,
    start: Option<Point>,
    current: Option<Point>,
    feedback: Feedback,
}

impl VerticalLinkTool {
    pub fn new(link_kind: VerticalLinkKind) -> Self {
        Self {
            link_kind,
            start: None,
            current: None,
            feedback: Feedback::default(),
        }
    }

    fn link(&self, id: EntityId, a: Point, b: Point, floor: &Floor) -> VerticalLink {
        let r = Bounds::from_corners(a, b);
        VerticalLink {
            id,
            kind: self.link_kind,
            floor_id: floor.id,
            position: Point::new(r.min_x, r.min_y),
            size: Size::new(r.width(), r.height()),
            connected_floor_ids: smallvec![floor.id],
            room_id: None,
            link_group_id: None,
            link_number: None,
        }
    }
}

impl Tool for VerticalLinkTool {
    fn kind(&self) -> ToolKind {
        match self.link_kind {
            VerticalLinkKind::Stairs => ToolKind::Stairs,
            VerticalLinkKind::Elevator => ToolKind::Elevator,
        }
    }

    fn handle(&mut self, event: &ToolEvent, ctx: &ToolContext) -> Option<ToolAction> {
        match *event {
            ToolEvent::Down(p) => {
                let s = ctx.snap_grid(p);
                self.start = Some(s);
                self.current = Some(s);
                self.feedback = Feedback::creating(Validation::ok());
                None
            }
            ToolEvent::Move(p) => {
                let start = self.start?;
                let s = ctx.snap_grid(p);
                self.current = Some(s);
                let link = self.link(preview_id(), start, s, ctx.floor);
                self.feedback = Feedback::creating(validate_vertical_link(
                    &link,
                    ctx.floor,
                    &ctx.config.validation,
                ));
                None
            }
            ToolEvent::Up(p) => {
                let start = self.start.take()?;
                let end = ctx.snap_grid(p);
                self.current = None;
                if start.distance_to(end) < ctx.config.min_drag_distance {
                    self.feedback = Feedback::default();
                    return None;
                }
                let link = self.link(EntityId::fresh(self.link_kind.label()), start, end, ctx.floor);
                let v = validate_vertical_link(&link, ctx.floor, &ctx.config.validation);
                conclude(&mut self.feedback, v, || ToolAction::AwaitFloorSelection(link))
            }
            ToolEvent::Cancel => {
                self.start.take()?;
                self.current = None;
                self.feedback = Feedback::cancelled();
                Some(ToolAction::Cancelled)
            }
            ToolEvent::DoubleClick(_) | ToolEvent::Confirm => None,
        }
    }

    fn feedback(&self) -> &Feedback {
        &self.feedback
    }

    fn preview(&self) -> Option<Preview> {
        let r = Bounds::from_corners(self.start?, self.current?);
        Some(Preview::Rect {
            position: Point::new(r.min_x, r.min_y),
            size: Size::new(r.width(), r.height()),
        })
    }
}

// ─── Artwork Tool ────────────────────────────────────────────────────────

pub struct ArtworkTool {
    cursor: Option<Point>,
    feedback: Feedback,
}

impl Default for ArtworkTool {
    fn default() -> Self {
        Self::new()
    }
}

impl ArtworkTool {
    pub fn new() -> Self {
        Self {
            cursor: None,
            feedback: Feedback::default(),
        }
    }

    fn artwork(id: EntityId, position: Point, ctx: &ToolContext) -> Artwork {
        let side = ctx.config.default_artwork_size;
        Artwork {
            id,
            position,
            size: Some(Size::new(side, side)),
            name: None,
            room_id: None,
        }
    }
}

impl Tool for ArtworkTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Artwork
    }

    fn handle(&mut self, event: &ToolEvent, ctx: &ToolContext) -> Option<ToolAction> {
        match *event {
            ToolEvent::Move(p) => {
                let s = ctx.snap_grid(p);
                self.cursor = Some(s);
                let v = validate_artwork(&Self::artwork(preview_id(), s, ctx), ctx.floor, &ctx.config.validation);
                self.feedback = Feedback {
                    phase: Phase::Idle,
                    validation: v,
                };
                None
            }
            ToolEvent::Down(p) => {
                let art = Self::artwork(EntityId::fresh("artwork"), ctx.snap_grid(p), ctx);
                let v = validate_artwork(&art, ctx.floor, &ctx.config.validation);
                conclude(&mut self.feedback, v, || ToolAction::Commit(Entity::Artwork(art)))
            }
            ToolEvent::Cancel => {
                self.cursor = None;
                None
            }
            ToolEvent::Up(_) | ToolEvent::DoubleClick(_) | ToolEvent::Confirm => None,
        }
    }

    fn feedback(&self) -> &Feedback {
        &self.feedback
    }

    fn preview(&self) -> Option<Preview> {
        self.cursor.map(Preview::Marker)
    }
}
