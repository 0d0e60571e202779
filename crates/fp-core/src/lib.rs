pub mod cascade;
pub mod export;
pub mod geometry;
pub mod id;
pub mod model;
pub mod snap;
pub mod store;
pub mod topology;
pub mod validate;

pub use cascade::{CascadeResult, Translate, cascade_move_room, remove_entities};
pub use export::{ExportSet, ImportError, export_floor_set, import_floor_set};
pub use id::EntityId;
pub use model::*;
pub use snap::{SnapOptions, SnapResult, SnapType, smart_snap, snap_to_grid};
pub use store::{MemoryStore, Persistence, StoreError};
pub use validate::{Severity, Validation, ValidationConfig};

// `RoomGraph::graph` and `topology::floor_graph` expose this graph type.
pub use petgraph::graph::UnGraph;
