//! Similarity retrieval
//!
//! Wraps an external vector-search service and returns ranked historical
//! requirement/response pairs used to ground generation prompts.

mod http_backend;
mod retriever;
mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use http_backend::HttpSimilarityBackend;
pub use retriever::{SimilarityRetriever, rank};
pub use types::{RetrievalOutcome, RetrievalStatus, SimilarMatch, SimilarityBackend};
pub use rfpgen_utils::error::RetrievalError;
