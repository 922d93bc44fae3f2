//! In-process store used by tests and short-lived CLI sessions.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

use rfpgen_utils::error::StorageError;
use rfpgen_utils::types::RequirementId;

use crate::model::{FieldPatch, ReferenceRecord, RequirementRecord};
use crate::store::RequirementStore;

#[derive(Default)]
struct Tables {
    records: BTreeMap<RequirementId, RequirementRecord>,
    references: BTreeMap<RequirementId, Vec<ReferenceRecord>>,
}

/// `RequirementStore` backed by in-memory maps.
///
/// Each write runs under a single write guard, so patches and reference
/// replacements are atomic with respect to readers.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    writes: AtomicUsize,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful mutating calls (patches and reference replacements).
    /// Ingestion is not counted.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RequirementStore for MemoryStore {
    async fn get_by_id(&self, id: RequirementId) -> Result<Option<RequirementRecord>, StorageError> {
        Ok(self.tables.read().await.records.get(&id).cloned())
    }

    async fn insert_requirement(&self, record: RequirementRecord) -> Result<(), StorageError> {
        let mut tables = self.tables.write().await;
        if tables.records.contains_key(&record.id) {
            return Err(StorageError::AlreadyExists { id: record.id });
        }
        tables.records.insert(record.id, record);
        Ok(())
    }

    async fn upsert_patch(
        &self,
        id: RequirementId,
        patch: &FieldPatch,
    ) -> Result<RequirementRecord, StorageError> {
        let mut tables = self.tables.write().await;
        let record = tables
            .records
            .get_mut(&id)
            .ok_or(StorageError::NotFound { id })?;
        record.apply(patch);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(record.clone())
    }

    async fn replace_references(
        &self,
        id: RequirementId,
        references: Vec<ReferenceRecord>,
    ) -> Result<(), StorageError> {
        let mut tables = self.tables.write().await;
        if !tables.records.contains_key(&id) {
            return Err(StorageError::NotFound { id });
        }
        tables.references.insert(id, references);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn references_for(&self, id: RequirementId) -> Result<Vec<ReferenceRecord>, StorageError> {
        Ok(self
            .tables
            .read()
            .await
            .references
            .get(&id)
            .cloned()
            .unwrap_or_default())
    }
}
