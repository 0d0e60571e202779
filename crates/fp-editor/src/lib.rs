pub mod config;
pub mod drag;
pub mod editor;
pub mod history;
pub mod hit;
pub mod input;
pub mod selection;
pub mod shortcuts;
pub mod state;
pub mod tools;

pub use config::EditorConfig;
pub use editor::{Command, Editor, Frame};
pub use history::{Document, History, HistoryEntry};
pub use input::{InputEvent, Modifiers, PointerButton};
pub use selection::{SelectedElement, Selection};
pub use state::{EditorState, Measurements, Viewport};
pub use tools::{Feedback, Phase, Preview, ToolKind};
