//! In-memory similarity backend for tests.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

use rfpgen_utils::error::RetrievalError;

use crate::types::{SimilarMatch, SimilarityBackend};

/// Returns the same matches for every query, or always fails.
pub struct FixedSimilarityBackend {
    matches: Vec<SimilarMatch>,
    failure: Option<String>,
    calls: AtomicUsize,
}

impl FixedSimilarityBackend {
    #[must_use]
    pub fn new(matches: Vec<SimilarMatch>) -> Self {
        Self {
            matches,
            failure: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// A backend that reports `RetrievalError::Unreachable` on every call
    #[must_use]
    pub fn unreachable(reason: impl Into<String>) -> Self {
        Self {
            matches: Vec::new(),
            failure: Some(reason.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SimilarityBackend for FixedSimilarityBackend {
    async fn search(&self, _text: &str, k: usize) -> Result<Vec<SimilarMatch>, RetrievalError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.failure {
            Some(reason) => Err(RetrievalError::Unreachable(reason.clone())),
            None => Ok(self.matches.iter().take(k).cloned().collect()),
        }
    }
}
