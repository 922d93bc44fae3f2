//! Durable store: one JSON document per requirement under a data directory.
//!
//! Every mutation rewrites the whole document through
//! [`write_file_atomic`], so a crash leaves either the old or the new document
//! on disk, never a torn one.

use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::fs;
use tokio::sync::Mutex;

use rfpgen_utils::atomic_write::write_file_atomic;
use rfpgen_utils::error::StorageError;
use rfpgen_utils::types::RequirementId;

use crate::model::{FieldPatch, ReferenceRecord, RequirementRecord};
use crate::store::RequirementStore;

#[derive(Debug, Serialize, Deserialize)]
struct StoredDocument {
    record: RequirementRecord,
    #[serde(default)]
    references: Vec<ReferenceRecord>,
}

/// `RequirementStore` persisted as `<data_dir>/requirements/<id>.json`.
///
/// File I/O runs on tokio's blocking pool so provider calls sharing the
/// runtime keep making progress.
pub struct JsonFileStore {
    root: Utf8PathBuf,
    // Serializes read-modify-write cycles within this process
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    /// Open (and create if needed) a store rooted at `data_dir`.
    pub fn open(data_dir: impl Into<Utf8PathBuf>) -> Result<Self, StorageError> {
        let root = data_dir.into().join("requirements");
        fs::create_dir_all(&root).map_err(|e| {
            StorageError::Unavailable(format!("cannot create data directory {root}: {e}"))
        })?;
        tracing::debug!(root = %root, "opened JSON file store");
        Ok(Self {
            root,
            write_lock: Mutex::new(()),
        })
    }

    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    fn document_path(&self, id: RequirementId) -> Utf8PathBuf {
        self.root.join(format!("{id}.json"))
    }

    async fn read(&self, id: RequirementId) -> Result<Option<StoredDocument>, StorageError> {
        let path = self.document_path(id);
        blocking(move || read_document(&path, id)).await
    }

    /// Load, modify and rewrite one document in a single blocking task.
    async fn modify<T, F>(&self, id: RequirementId, change: F) -> Result<T, StorageError>
    where
        T: Send + 'static,
        F: FnOnce(&mut StoredDocument) -> T + Send + 'static,
    {
        let _guard = self.write_lock.lock().await;
        let path = self.document_path(id);
        blocking(move || {
            let mut document = read_document(&path, id)?.ok_or(StorageError::NotFound { id })?;
            let result = change(&mut document);
            write_document(&path, id, &document)?;
            Ok(result)
        })
        .await
    }
}

async fn blocking<T, F>(task: F) -> Result<T, StorageError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, StorageError> + Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| StorageError::Unavailable(format!("storage task failed: {e}")))?
}

fn read_document(path: &Utf8Path, id: RequirementId) -> Result<Option<StoredDocument>, StorageError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(StorageError::ReadFailed {
                id,
                reason: e.to_string(),
            });
        }
    };
    serde_json::from_str(&content)
        .map(Some)
        .map_err(|e| StorageError::ReadFailed {
            id,
            reason: format!("corrupt document {path}: {e}"),
        })
}

fn write_document(
    path: &Utf8Path,
    id: RequirementId,
    document: &StoredDocument,
) -> Result<(), StorageError> {
    let json = serde_json::to_string_pretty(document).map_err(|e| StorageError::WriteFailed {
        id,
        reason: e.to_string(),
    })?;
    write_file_atomic(path, &json).map_err(|e| StorageError::WriteFailed {
        id,
        reason: format!("{e:#}"),
    })
}

#[async_trait]
impl RequirementStore for JsonFileStore {
    async fn get_by_id(&self, id: RequirementId) -> Result<Option<RequirementRecord>, StorageError> {
        Ok(self.read(id).await?.map(|doc| doc.record))
    }

    async fn insert_requirement(&self, record: RequirementRecord) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        let id = record.id;
        let path = self.document_path(id);
        blocking(move || {
            if read_document(&path, id)?.is_some() {
                return Err(StorageError::AlreadyExists { id });
            }
            write_document(
                &path,
                id,
                &StoredDocument {
                    record,
                    references: Vec::new(),
                },
            )
        })
        .await
    }

    async fn upsert_patch(
        &self,
        id: RequirementId,
        patch: &FieldPatch,
    ) -> Result<RequirementRecord, StorageError> {
        let patch = patch.clone();
        self.modify(id, move |document| {
            document.record.apply(&patch);
            document.record.clone()
        })
        .await
    }

    async fn replace_references(
        &self,
        id: RequirementId,
        references: Vec<ReferenceRecord>,
    ) -> Result<(), StorageError> {
        self.modify(id, move |document| document.references = references)
            .await
    }

    async fn references_for(&self, id: RequirementId) -> Result<Vec<ReferenceRecord>, StorageError> {
        Ok(self
            .read(id)
            .await?
            .map(|doc| doc.references)
            .unwrap_or_default())
    }
}
