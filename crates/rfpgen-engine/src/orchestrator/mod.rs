//! Two-phase generation orchestrator
//!
//! Phase 1 fans one prompt out to every configured provider and persists
//! whatever came back. Phase 2 merges those answers through the synthesis
//! route, either immediately (auto-continue) or later through
//! [`GenerationOrchestrator::synthesize`].
//!
//! The orchestrator holds no lock across provider or retrieval calls.
//! Concurrent requests for the same requirement are not coordinated and the
//! last write wins.

mod phase;
mod request;

pub use self::phase::{GenerationPhase, PhaseTrace};
pub use self::request::{GenerationOutcome, GenerationRequest, SynthesisRequest};

use futures::future::join_all;
use std::time::Duration;
use tokio::time::{Instant, timeout_at};
use tracing::{Instrument, debug, info, warn};

use rfpgen_config::{Config, Credentials};
use rfpgen_llm::{Message, ProviderGateway};
use rfpgen_retrieval::{RetrievalOutcome, RetrievalStatus, SimilarMatch, SimilarityRetriever};
use rfpgen_store::{PersistenceAdapter, ReferenceRecord, RequirementRecord, RequirementStore};
use rfpgen_utils::error::{
    GenerationError, ProviderError, RfpError, StorageError, ValidationError,
};
use rfpgen_utils::logging::{generation_span, log_phase_complete, log_phase_error, log_phase_start};
use rfpgen_utils::types::{GenerationMode, ProviderId, ProviderRoute, RequirementId};

use crate::normalizer::{RawOutputs, normalize, normalize_combined};
use crate::prompt::{PromptSettings, phase1_messages, phase2_messages};

/// Deadline applied when neither the request nor the configuration sets one
pub const DEFAULT_GENERATION_DEADLINE: Duration = Duration::from_secs(300);

/// Runtime knobs for the orchestrator, usually taken from [`Config`].
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    /// Providers dispatched in synthesis mode, in order
    pub providers: Vec<ProviderId>,
    /// Successful Phase 1 answers needed before synthesis runs
    pub min_providers: usize,
    pub auto_continue: bool,
    pub deadline: Duration,
    pub prompt: PromptSettings,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            providers: ProviderId::all().collect(),
            min_providers: 2,
            auto_continue: true,
            deadline: DEFAULT_GENERATION_DEADLINE,
            prompt: PromptSettings::default(),
        }
    }
}

impl OrchestratorSettings {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            providers: config.enabled_providers(),
            min_providers: config.synthesis_min_providers(),
            auto_continue: config.auto_continue(),
            deadline: config
                .generation_deadline()
                .unwrap_or(DEFAULT_GENERATION_DEADLINE),
            prompt: PromptSettings::from_config(config),
        }
    }
}

fn storage_failure(phase: GenerationPhase) -> impl FnOnce(StorageError) -> GenerationError {
    move |source| GenerationError::Storage {
        phase: phase.as_str().to_string(),
        source,
    }
}

fn to_reference(requirement_id: RequirementId, m: SimilarMatch) -> ReferenceRecord {
    ReferenceRecord {
        requirement_id,
        category: m.category,
        requirement: m.requirement,
        response: m.response,
        label: m.label,
        score: m.score,
    }
}

fn elapsed_ms(started: Instant) -> u128 {
    started.elapsed().as_millis()
}

/// Drives a requirement through Phase 1, optional Phase 2 and persistence.
pub struct GenerationOrchestrator<S> {
    gateway: ProviderGateway,
    retriever: SimilarityRetriever,
    persistence: PersistenceAdapter<S>,
    settings: OrchestratorSettings,
}

impl<S: RequirementStore> GenerationOrchestrator<S> {
    pub fn new(
        gateway: ProviderGateway,
        retriever: SimilarityRetriever,
        persistence: PersistenceAdapter<S>,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            gateway,
            retriever,
            persistence,
            settings,
        }
    }

    /// Wire the gateway, retriever and settings from configuration around `store`.
    ///
    /// # Errors
    ///
    /// Fails when the HTTP client or the similarity endpoint cannot be set up.
    pub fn from_config(config: &Config, credentials: &Credentials, store: S) -> Result<Self, RfpError> {
        let gateway = ProviderGateway::from_config(config, credentials)?;
        let retriever = SimilarityRetriever::from_config(config)?;
        Ok(Self::new(
            gateway,
            retriever,
            PersistenceAdapter::new(store),
            OrchestratorSettings::from_config(config),
        ))
    }

    pub fn persistence(&self) -> &PersistenceAdapter<S> {
        &self.persistence
    }

    pub fn settings(&self) -> &OrchestratorSettings {
        &self.settings
    }

    /// Run a generation request to `Persisted`.
    ///
    /// Phase 1 tolerates every provider failure but one. With enough answers
    /// and auto-continue on, Phase 2 runs in the same call; a failed synthesis
    /// leaves the record in "synthesis pending" rather than failing.
    ///
    /// # Errors
    ///
    /// - `GenerationError::Validation` for an unknown or zero id (no writes)
    /// - `GenerationError::Exhausted` when no provider answered (no writes)
    /// - `GenerationError::Storage` when a write fails, tagged with the phase
    pub async fn generate(&self, request: GenerationRequest) -> Result<GenerationOutcome, GenerationError> {
        let span = generation_span(request.requirement_id, request.mode);
        self.run_generate(request).instrument(span).await
    }

    async fn run_generate(&self, request: GenerationRequest) -> Result<GenerationOutcome, GenerationError> {
        let id = request.requirement_id;
        let mode = request.mode;
        let mut trace = PhaseTrace::new();
        let started = Instant::now();
        log_phase_start(id, GenerationPhase::Init.as_str());

        let record = self.load_record(id, GenerationPhase::Init).await?;
        let requirement = request
            .text
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| record.requirement.clone());
        let deadline = request
            .deadline
            .unwrap_or_else(|| Instant::now() + self.settings.deadline);

        // Phase 1: retrieve, then fan out
        trace.advance(GenerationPhase::Phase1Dispatch)?;
        log_phase_start(id, GenerationPhase::Phase1Dispatch.as_str());
        let retrieval = self.retrieve(&requirement, deadline).await;
        let messages = phase1_messages(
            &requirement,
            record.category.as_deref(),
            &retrieval.references,
            &self.settings.prompt,
        );
        let providers = match mode.single_provider() {
            Some(provider) => vec![provider],
            None => self.settings.providers.clone(),
        };
        let (raw, failures) = self.dispatch_phase1(&providers, &messages, deadline).await;

        let outputs = raw.individual();
        if outputs.is_empty() {
            let err = GenerationError::Exhausted { failures };
            log_phase_error(
                id,
                GenerationPhase::Phase1Dispatch.as_str(),
                &err.to_string(),
                elapsed_ms(started),
            );
            trace.advance(GenerationPhase::Failed)?;
            return Err(err);
        }
        log_phase_complete(id, GenerationPhase::Phase1Dispatch.as_str(), elapsed_ms(started));

        // Phase 1 complete: provider fields first, then the reference set
        trace.advance(GenerationPhase::Phase1Complete)?;
        let patch = normalize(&raw, mode, &requirement);
        let mut record = self
            .persistence
            .apply_patch(id, patch)
            .await
            .map_err(storage_failure(GenerationPhase::Phase1Complete))?;
        let references: Vec<ReferenceRecord> = retrieval
            .references
            .into_iter()
            .map(|m| to_reference(id, m))
            .collect();
        self.persistence
            .replace_references(id, references.clone())
            .await
            .map_err(storage_failure(GenerationPhase::Phase1Complete))?;
        info!(
            requirement_id = %id,
            answered = outputs.len(),
            failed = failures.len(),
            references = references.len(),
            "Phase 1 persisted"
        );

        let mut synthesis_failure = None;
        if mode.is_synthesis() {
            let ready = outputs.len() >= self.settings.min_providers;
            let auto_continue = request.auto_continue.unwrap_or(self.settings.auto_continue);
            if ready && auto_continue {
                match self
                    .run_phase2(id, &requirement, &outputs, deadline, &mut trace)
                    .await?
                {
                    Ok(updated) => record = updated,
                    Err(err) => synthesis_failure = Some(err),
                }
            } else {
                debug!(
                    requirement_id = %id,
                    ready,
                    auto_continue,
                    "Phase 2 not started"
                );
            }
        }

        trace.advance(GenerationPhase::Persisted)?;
        log_phase_complete(id, GenerationPhase::Persisted.as_str(), elapsed_ms(started));

        Ok(GenerationOutcome {
            synthesis_pending: mode.is_synthesis() && record.final_response.is_none(),
            record,
            references,
            phase: trace.current(),
            retrieval: retrieval.status,
            provider_failures: failures,
            synthesis_failure,
            trace,
        })
    }

    /// Run Phase 2 for a record whose Phase 1 already completed.
    ///
    /// Phase 1 answers come from the request or, when not given, from the
    /// stored provider fields.
    ///
    /// # Errors
    ///
    /// - `ValidationError::UnknownRequirement` for a missing record
    /// - `ValidationError::NothingToSynthesize` when there are no answers
    /// - `ValidationError::NotSynthesisReady` below `synthesis.min_providers`
    /// - `GenerationError::Storage` when the Phase 2 write fails
    ///
    /// A failed synthesis call is not an error: the outcome reports
    /// `synthesis_pending` and the failure.
    pub async fn synthesize(&self, request: SynthesisRequest) -> Result<GenerationOutcome, GenerationError> {
        let span = generation_span(request.requirement_id, GenerationMode::Synthesis);
        self.run_synthesize(request).instrument(span).await
    }

    async fn run_synthesize(&self, request: SynthesisRequest) -> Result<GenerationOutcome, GenerationError> {
        let id = request.requirement_id;
        let record = self
            .load_record(id, GenerationPhase::Phase1Complete)
            .await?;
        let requirement = request
            .text
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| record.requirement.clone());

        let outputs = match request.outputs {
            Some(outputs) => RawOutputs::from_individual(&outputs).individual(),
            None => record.provider_outputs(),
        };
        if outputs.is_empty() {
            return Err(ValidationError::NothingToSynthesize { id }.into());
        }
        if outputs.len() < self.settings.min_providers {
            return Err(ValidationError::NotSynthesisReady {
                required: self.settings.min_providers,
                found: outputs.len(),
            }
            .into());
        }

        let deadline = request
            .deadline
            .unwrap_or_else(|| Instant::now() + self.settings.deadline);
        let mut trace = PhaseTrace::starting_at(GenerationPhase::Phase1Complete);
        let (record, synthesis_failure) = match self
            .run_phase2(id, &requirement, &outputs, deadline, &mut trace)
            .await?
        {
            Ok(updated) => (updated, None),
            Err(err) => (record, Some(err)),
        };
        trace.advance(GenerationPhase::Persisted)?;

        let references = self
            .persistence
            .references(id)
            .await
            .map_err(storage_failure(GenerationPhase::Persisted))?;

        Ok(GenerationOutcome {
            synthesis_pending: record.final_response.is_none(),
            record,
            references,
            phase: trace.current(),
            // Phase 2 does not search; the stored reference set is returned as is
            retrieval: RetrievalStatus::Complete,
            provider_failures: Vec::new(),
            synthesis_failure,
            trace,
        })
    }

    /// Issue the synthesis call and persist its answer.
    ///
    /// The outer `Result` carries fatal errors (storage, illegal transition);
    /// the inner one the synthesis call's own failure, which callers degrade to
    /// "synthesis pending".
    pub async fn run_phase2(
        &self,
        id: RequirementId,
        requirement: &str,
        outputs: &[(ProviderId, String)],
        deadline: Instant,
        trace: &mut PhaseTrace,
    ) -> Result<Result<RequirementRecord, ProviderError>, GenerationError> {
        trace.advance(GenerationPhase::Phase2Dispatch)?;
        log_phase_start(id, GenerationPhase::Phase2Dispatch.as_str());
        let started = Instant::now();

        let messages = phase2_messages(requirement, outputs);
        let reply = match self
            .gateway
            .invoke(ProviderRoute::Synthesis, &messages, deadline)
            .await
        {
            Ok(reply) => reply,
            Err(err) => {
                warn!(
                    requirement_id = %id,
                    class = %err.class,
                    "Synthesis failed; Phase 1 answers kept, synthesis pending"
                );
                log_phase_error(
                    id,
                    GenerationPhase::Phase2Dispatch.as_str(),
                    &err.to_string(),
                    elapsed_ms(started),
                );
                return Ok(Err(err));
            }
        };

        trace.advance(GenerationPhase::Phase2Complete)?;
        // Phase 1 provider fields stay as written
        let patch = normalize_combined(&reply.text, requirement);
        let record = self
            .persistence
            .apply_patch(id, patch)
            .await
            .map_err(storage_failure(GenerationPhase::Phase2Complete))?;
        log_phase_complete(id, GenerationPhase::Phase2Complete.as_str(), elapsed_ms(started));
        Ok(Ok(record))
    }

    async fn load_record(
        &self,
        id: RequirementId,
        phase: GenerationPhase,
    ) -> Result<RequirementRecord, GenerationError> {
        if id.get() == 0 {
            return Err(ValidationError::MissingRequirementId.into());
        }
        self.persistence
            .get(id)
            .await
            .map_err(storage_failure(phase))?
            .ok_or_else(|| ValidationError::UnknownRequirement { id }.into())
    }

    /// Similarity search bounded by the request deadline
    async fn retrieve(&self, requirement: &str, deadline: Instant) -> RetrievalOutcome {
        match timeout_at(deadline, self.retriever.search(requirement, self.retriever.top_k())).await {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!("Deadline expired during similarity search; continuing without references");
                RetrievalOutcome::unavailable("deadline expired during similarity search")
            }
        }
    }

    /// Call every provider concurrently and wait for all of them
    async fn dispatch_phase1(
        &self,
        providers: &[ProviderId],
        messages: &[Message],
        deadline: Instant,
    ) -> (RawOutputs, Vec<(ProviderId, ProviderError)>) {
        let calls = providers.iter().map(|&provider| async move {
            let result = self
                .gateway
                .invoke(ProviderRoute::from(provider), messages, deadline)
                .await;
            (provider, result)
        });

        let mut raw = RawOutputs::new();
        let mut failures = Vec::new();
        for (provider, result) in join_all(calls).await {
            match result {
                Ok(reply) => {
                    debug!(
                        provider = %provider,
                        model = %reply.model_used,
                        used_fallback = reply.used_fallback,
                        "Provider answered"
                    );
                    raw.set(provider, reply.text);
                }
                Err(err) => {
                    warn!(provider = %provider, class = %err.class, "Provider failed");
                    failures.push((provider, err));
                }
            }
        }
        (raw, failures)
    }
}
