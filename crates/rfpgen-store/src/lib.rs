//! Requirement storage for rfpgen
//!
//! Defines the persisted record shapes, the [`RequirementStore`] interface with
//! an in-memory and a JSON-file implementation, and the [`PersistenceAdapter`]
//! the orchestrator writes through.

mod adapter;
mod file;
mod memory;
mod model;
mod store;

pub use adapter::{PersistenceAdapter, RATING_RANGE};
pub use file::JsonFileStore;
pub use memory::MemoryStore;
pub use model::{FieldPatch, FieldUpdate, ProviderMarker, ReferenceRecord, RequirementRecord};
pub use rfpgen_utils::error::StorageError;
pub use store::RequirementStore;
