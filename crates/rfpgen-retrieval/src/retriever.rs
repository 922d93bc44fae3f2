use std::cmp::Ordering;
use std::sync::Arc;

use tracing::{debug, warn};

use rfpgen_config::Config;
use rfpgen_utils::error::RetrievalError;

use crate::http_backend::HttpSimilarityBackend;
use crate::types::{RetrievalOutcome, SimilarMatch, SimilarityBackend};

/// Ranked, read-only view over a [`SimilarityBackend`].
///
/// Backend failures never propagate: they become
/// [`RetrievalStatus::Unavailable`](crate::RetrievalStatus::Unavailable) with an
/// empty reference list so generation can continue ungrounded.
#[derive(Clone)]
pub struct SimilarityRetriever {
    backend: Option<Arc<dyn SimilarityBackend>>,
    top_k: usize,
    min_score: f32,
}

impl SimilarityRetriever {
    #[must_use]
    pub fn new(backend: Arc<dyn SimilarityBackend>, top_k: usize, min_score: f32) -> Self {
        Self {
            backend: Some(backend),
            top_k,
            min_score,
        }
    }

    /// A retriever that never contacts anything and reports `Disabled`.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            backend: None,
            top_k: rfpgen_config::DEFAULT_RETRIEVAL_TOP_K,
            min_score: rfpgen_config::DEFAULT_RETRIEVAL_MIN_SCORE,
        }
    }

    /// Build from `[retrieval]`; no endpoint means a disabled retriever.
    ///
    /// # Errors
    ///
    /// Returns `RetrievalError::Misconfiguration` when the endpoint is unusable.
    pub fn from_config(config: &Config) -> Result<Self, RetrievalError> {
        let Some(endpoint) = &config.retrieval.endpoint else {
            debug!("No similarity endpoint configured; retrieval disabled");
            return Ok(Self::disabled());
        };

        let backend = HttpSimilarityBackend::new(endpoint.clone(), config.retrieval_timeout())?;
        Ok(Self::new(
            Arc::new(backend),
            config.retrieval_top_k(),
            config.retrieval_min_score(),
        ))
    }

    #[must_use]
    pub fn top_k(&self) -> usize {
        self.top_k
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.backend.is_some()
    }

    /// At most `k` references for `text`, highest score first.
    ///
    /// Blank `text` yields an empty `Complete` outcome without a backend call.
    pub async fn search(&self, text: &str, k: usize) -> RetrievalOutcome {
        let Some(backend) = &self.backend else {
            return RetrievalOutcome::disabled();
        };

        let text = text.trim();
        if text.is_empty() || k == 0 {
            return RetrievalOutcome::complete(Vec::new());
        }

        match backend.search(text, k).await {
            Ok(matches) => {
                let fetched = matches.len();
                let references = rank(matches, k, self.min_score);
                debug!(
                    fetched,
                    kept = references.len(),
                    min_score = self.min_score,
                    "Similarity search complete"
                );
                RetrievalOutcome::complete(references)
            }
            Err(err) => {
                warn!(error = %err, "Similarity backend unavailable; continuing without references");
                RetrievalOutcome::unavailable(err.to_string())
            }
        }
    }
}

fn clamp_score(score: f32) -> f32 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 1.0)
    }
}

/// Clamp scores into [0, 1], drop matches below `min_score`, order by score
/// descending keeping fetch order among ties, and keep the first `k`.
#[must_use]
pub fn rank(matches: Vec<SimilarMatch>, k: usize, min_score: f32) -> Vec<SimilarMatch> {
    let mut ranked: Vec<SimilarMatch> = matches
        .into_iter()
        .map(|mut m| {
            m.score = clamp_score(m.score);
            m
        })
        .filter(|m| m.score >= min_score)
        .collect();

    // sort_by is stable, so equal scores keep fetch order
    ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    ranked.truncate(k);
    ranked
}
