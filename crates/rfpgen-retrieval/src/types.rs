use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use rfpgen_utils::error::RetrievalError;

/// A historical requirement/response pair returned by the similarity backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarMatch {
    #[serde(default)]
    pub category: Option<String>,
    pub requirement: String,
    pub response: String,
    #[serde(default)]
    pub label: Option<String>,
    /// Similarity in [0, 1] once ranked; backends may report anything
    pub score: f32,
}

/// External vector-search service
#[async_trait]
pub trait SimilarityBackend: Send + Sync {
    /// Up to `k` matches for `text`, in the backend's own order
    ///
    /// # Errors
    ///
    /// Returns `RetrievalError` when the service cannot be reached or answers
    /// with something other than a match list.
    async fn search(&self, text: &str, k: usize) -> Result<Vec<SimilarMatch>, RetrievalError>;
}

/// Whether the reference set is the full answer from the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RetrievalStatus {
    Complete,
    /// Soft failure: the backend could not be used, references are empty
    Unavailable { reason: String },
    /// No similarity endpoint is configured
    Disabled,
}

impl RetrievalStatus {
    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}

/// Ranked references plus the status of the search that produced them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalOutcome {
    pub references: Vec<SimilarMatch>,
    pub status: RetrievalStatus,
}

impl RetrievalOutcome {
    #[must_use]
    pub fn complete(references: Vec<SimilarMatch>) -> Self {
        Self {
            references,
            status: RetrievalStatus::Complete,
        }
    }

    #[must_use]
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            references: Vec::new(),
            status: RetrievalStatus::Unavailable {
                reason: reason.into(),
            },
        }
    }

    #[must_use]
    pub fn disabled() -> Self {
        Self {
            references: Vec::new(),
            status: RetrievalStatus::Disabled,
        }
    }
}
