use async_trait::async_trait;
use std::sync::Arc;

use rfpgen_utils::error::StorageError;
use rfpgen_utils::types::RequirementId;

use crate::model::{FieldPatch, ReferenceRecord, RequirementRecord};

/// External storage interface for requirement records and their reference sets.
///
/// Implementations must apply each call atomically: a reader never observes a
/// half-applied patch or a partially replaced reference set.
#[async_trait]
pub trait RequirementStore: Send + Sync {
    async fn get_by_id(&self, id: RequirementId) -> Result<Option<RequirementRecord>, StorageError>;

    /// Create a record at ingestion; fails with `AlreadyExists` on a duplicate id
    async fn insert_requirement(&self, record: RequirementRecord) -> Result<(), StorageError>;

    /// Apply `patch` to an existing record and return the updated record
    async fn upsert_patch(
        &self,
        id: RequirementId,
        patch: &FieldPatch,
    ) -> Result<RequirementRecord, StorageError>;

    /// Delete every reference owned by `id`, then insert `references`
    async fn replace_references(
        &self,
        id: RequirementId,
        references: Vec<ReferenceRecord>,
    ) -> Result<(), StorageError>;

    async fn references_for(&self, id: RequirementId) -> Result<Vec<ReferenceRecord>, StorageError>;
}

#[async_trait]
impl<T: RequirementStore + ?Sized> RequirementStore for Arc<T> {
    async fn get_by_id(&self, id: RequirementId) -> Result<Option<RequirementRecord>, StorageError> {
        (**self).get_by_id(id).await
    }

    async fn insert_requirement(&self, record: RequirementRecord) -> Result<(), StorageError> {
        (**self).insert_requirement(record).await
    }

    async fn upsert_patch(
        &self,
        id: RequirementId,
        patch: &FieldPatch,
    ) -> Result<RequirementRecord, StorageError> {
        (**self).upsert_patch(id, patch).await
    }

    async fn replace_references(
        &self,
        id: RequirementId,
        references: Vec<ReferenceRecord>,
    ) -> Result<(), StorageError> {
        (**self).replace_references(id, references).await
    }

    async fn references_for(&self, id: RequirementId) -> Result<Vec<ReferenceRecord>, StorageError> {
        (**self).references_for(id).await
    }
}
