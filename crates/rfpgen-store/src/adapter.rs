use rfpgen_utils::error::{RfpError, StorageError, ValidationError};
use rfpgen_utils::fallback::fallback_response;
use rfpgen_utils::types::RequirementId;

use crate::model::{FieldPatch, FieldUpdate, ReferenceRecord, RequirementRecord};
use crate::store::RequirementStore;

/// Valid feedback ratings
pub const RATING_RANGE: std::ops::RangeInclusive<u8> = 1..=5;

/// Write path used by the orchestrator and the CLI.
///
/// Wraps a [`RequirementStore`] and guarantees that a blank `final_response`
/// is never persisted: a patch that sets one gets the fallback text derived
/// from the stored requirement instead. Fields the patch leaves as
/// [`FieldUpdate::Keep`] are untouched.
pub struct PersistenceAdapter<S> {
    store: S,
}

impl<S: RequirementStore> PersistenceAdapter<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn get(&self, id: RequirementId) -> Result<Option<RequirementRecord>, StorageError> {
        self.store.get_by_id(id).await
    }

    /// Like [`get`](Self::get), but a missing record is `StorageError::NotFound`
    pub async fn find(&self, id: RequirementId) -> Result<RequirementRecord, StorageError> {
        self.store
            .get_by_id(id)
            .await?
            .ok_or(StorageError::NotFound { id })
    }

    pub async fn ingest(&self, record: RequirementRecord) -> Result<(), StorageError> {
        tracing::info!(requirement_id = %record.id, "ingesting requirement");
        self.store.insert_requirement(record).await
    }

    /// Apply `patch` in one store call and return the updated record.
    pub async fn apply_patch(
        &self,
        id: RequirementId,
        patch: FieldPatch,
    ) -> Result<RequirementRecord, StorageError> {
        let patch = self.enforce_final_response(id, patch).await?;
        self.store.upsert_patch(id, &patch).await
    }

    /// Replace the whole reference set owned by `id`
    pub async fn replace_references(
        &self,
        id: RequirementId,
        references: Vec<ReferenceRecord>,
    ) -> Result<(), StorageError> {
        tracing::debug!(requirement_id = %id, count = references.len(), "replacing references");
        self.store.replace_references(id, references).await
    }

    pub async fn references(&self, id: RequirementId) -> Result<Vec<ReferenceRecord>, StorageError> {
        self.store.references_for(id).await
    }

    /// Store a reviewer rating (1..=5) and optional comment.
    ///
    /// Only `rating` and `feedback` change; generated content is preserved.
    pub async fn record_feedback(
        &self,
        id: RequirementId,
        rating: u8,
        feedback: Option<String>,
    ) -> Result<RequirementRecord, RfpError> {
        if !RATING_RANGE.contains(&rating) {
            return Err(ValidationError::RatingOutOfRange { rating }.into());
        }
        if self.store.get_by_id(id).await?.is_none() {
            return Err(ValidationError::UnknownRequirement { id }.into());
        }

        let feedback = feedback
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty());
        let patch = FieldPatch {
            rating: FieldUpdate::Set(rating),
            feedback: feedback.into(),
            ..FieldPatch::default()
        };
        Ok(self.store.upsert_patch(id, &patch).await?)
    }

    async fn enforce_final_response(
        &self,
        id: RequirementId,
        mut patch: FieldPatch,
    ) -> Result<FieldPatch, StorageError> {
        let blank = patch
            .final_response
            .as_set()
            .is_some_and(|text| text.trim().is_empty());
        if blank {
            let record = self.find(id).await?;
            tracing::warn!(requirement_id = %id, "blank final response replaced with fallback");
            patch.final_response = FieldUpdate::Set(fallback_response(&record.requirement));
        }
        Ok(patch)
    }
}
