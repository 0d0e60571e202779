//! Keyboard bindings.
//!
//! Keys are the `KeyboardEvent.key` value, matched case-insensitively.
//! `ctrl` and `meta` (⌘) are interchangeable, so one table serves every
//! platform.

use crate::input::Modifiers;
use crate::tools::ToolKind;

/// What a bound key does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    Tool(ToolKind),
    Undo,
    Redo,
    Delete,
    SelectAll,
    Duplicate,
    Copy,
    Paste,
    /// Escape: abandon the gesture in progress, else deselect.
    Cancel,
    /// Enter: close the polygon being drawn.
    Confirm,
    ZoomIn,
    ZoomOut,
    ResetView,
}

/// Bare keys that pick a tool.
const TOOL_KEYS: &[(&str, ToolKind)] = &[
    ("v", ToolKind::Select),
    ("p", ToolKind::Polygon),
    ("r", ToolKind::Rectangle),
    ("c", ToolKind::Circle),
    ("t", ToolKind::Triangle),
    ("a", ToolKind::Arc),
    ("w", ToolKind::Wall),
    ("d", ToolKind::Door),
    ("s", ToolKind::Stairs),
    ("e", ToolKind::Elevator),
    ("i", ToolKind::Artwork),
];

/// Keys held with ctrl/⌘.
const COMMAND_KEYS: &[(&str, ShortcutAction)] = &[
    ("z", ShortcutAction::Undo),
    ("y", ShortcutAction::Redo),
    ("a", ShortcutAction::SelectAll),
    ("d", ShortcutAction::Duplicate),
    ("c", ShortcutAction::Copy),
    ("v", ShortcutAction::Paste),
    ("=", ShortcutAction::ZoomIn),
    ("+", ShortcutAction::ZoomIn),
    ("-", ShortcutAction::ZoomOut),
    ("0", ShortcutAction::ResetView),
];

pub struct ShortcutMap;

impl ShortcutMap {
    /// The action bound to `key` under `modifiers`, if any.
    pub fn resolve(key: &str, modifiers: Modifiers) -> Option<ShortcutAction> {
        let key = key.to_ascii_lowercase();

        if modifiers.ctrl || modifiers.meta {
            if modifiers.shift {
                return (key == "z").then_some(ShortcutAction::Redo);
            }
            return COMMAND_KEYS
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, action)| *action);
        }

        match key.as_str() {
            "delete" | "backspace" => Some(ShortcutAction::Delete),
            "escape" => Some(ShortcutAction::Cancel),
            "enter" => Some(ShortcutAction::Confirm),
            _ => TOOL_KEYS
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, tool)| ShortcutAction::Tool(*tool)),
        }
    }
}
