use tokio::time::Instant;

use rfpgen_retrieval::RetrievalStatus;
use rfpgen_store::{ReferenceRecord, RequirementRecord};
use rfpgen_utils::error::ProviderError;
use rfpgen_utils::types::{GenerationMode, ProviderId, RequirementId};

use super::phase::{GenerationPhase, PhaseTrace};

/// One call to [`generate`](super::GenerationOrchestrator::generate). Not persisted.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub requirement_id: RequirementId,
    /// Inline requirement text; the stored text is used when absent or blank
    pub text: Option<String>,
    pub mode: GenerationMode,
    /// Overrides the configured `synthesis.auto_continue`
    pub auto_continue: Option<bool>,
    /// Overrides the configured generation deadline
    pub deadline: Option<Instant>,
}

impl GenerationRequest {
    #[must_use]
    pub fn new(requirement_id: RequirementId, mode: GenerationMode) -> Self {
        Self {
            requirement_id,
            text: None,
            mode,
            auto_continue: None,
            deadline: None,
        }
    }

    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    #[must_use]
    pub fn with_auto_continue(mut self, auto_continue: bool) -> Self {
        self.auto_continue = Some(auto_continue);
        self
    }

    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

/// Explicit Phase 2 trigger for a record left in "synthesis pending".
#[derive(Debug, Clone)]
pub struct SynthesisRequest {
    pub requirement_id: RequirementId,
    pub text: Option<String>,
    /// Phase 1 answers; read from the stored record when `None`
    pub outputs: Option<Vec<(ProviderId, String)>>,
    pub deadline: Option<Instant>,
}

impl SynthesisRequest {
    #[must_use]
    pub fn new(requirement_id: RequirementId) -> Self {
        Self {
            requirement_id,
            text: None,
            outputs: None,
            deadline: None,
        }
    }

    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    #[must_use]
    pub fn with_outputs(mut self, outputs: Vec<(ProviderId, String)>) -> Self {
        self.outputs = Some(outputs);
        self
    }

    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

/// Result of a request that reached `Persisted`.
#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    pub record: RequirementRecord,
    pub references: Vec<ReferenceRecord>,
    pub phase: GenerationPhase,
    /// Phase 1 produced answers but no final response has been chosen
    pub synthesis_pending: bool,
    pub retrieval: RetrievalStatus,
    /// Providers that failed during Phase 1
    pub provider_failures: Vec<(ProviderId, ProviderError)>,
    /// Why the synthesis call failed, when it was attempted and failed
    pub synthesis_failure: Option<ProviderError>,
    pub trace: PhaseTrace,
}
