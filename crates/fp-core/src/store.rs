//! Persistence seam.
//!
//! The engine never performs I/O itself; hosts plug in a [`Persistence`]
//! implementation. [`MemoryStore`] keeps the relational export shape in
//! memory and is what the tests use.

use crate::export::{ExportSet, ImportError, export_floor_set, import_floor_set};
use crate::model::FloorSet;
use thiserror::Error;

/// Load/save a whole building.
pub trait Persistence {
    type Error: std::error::Error;

    fn load(&mut self) -> Result<FloorSet, Self::Error>;
    fn save(&mut self, floors: &FloorSet) -> Result<(), Self::Error>;
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("nothing has been saved yet")]
    Empty,

    #[error("stored plan is malformed: {0}")]
    Import(#[from] ImportError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// In-memory store holding the last saved [`ExportSet`].
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    saved: Option<ExportSet>,
    saves: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store from a JSON document in the export shape.
    pub fn from_json(text: &str) -> Result<Self, StoreError> {
        Ok(Self {
            saved: Some(serde_json::from_str(text)?),
            saves: 0,
        })
    }

    /// The stored tables as JSON.
    pub fn to_json(&self) -> Result<String, StoreError> {
        let saved = self.saved.as_ref().ok_or(StoreError::Empty)?;
        Ok(serde_json::to_string_pretty(saved)?)
    }

    pub fn tables(&self) -> Option<&ExportSet> {
        self.saved.as_ref()
    }

    /// Number of successful saves since creation.
    pub fn save_count(&self) -> usize {
        self.saves
    }
}

impl Persistence for MemoryStore {
    type Error = StoreError;

    fn load(&mut self) -> Result<FloorSet, StoreError> {
        let saved = self.saved.as_ref().ok_or(StoreError::Empty)?;
        let floors = import_floor_set(saved)?;
        log::info!("loaded {} floors from memory store", floors.floors.len());
        Ok(floors)
    }

    fn save(&mut self, floors: &FloorSet) -> Result<(), StoreError> {
        self.saved = Some(export_floor_set(floors));
        self.saves += 1;
        log::info!("saved {} floors to memory store", floors.floors.len());
        Ok(())
    }
}
