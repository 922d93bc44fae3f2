//! End-to-end generation workflows through the public library API
//!
//! Providers and the similarity service are scripted; records go through the
//! real JSON file store so every scenario also checks what lands on disk.

use std::sync::Arc;

use camino::Utf8PathBuf;
use tempfile::TempDir;

use rfpgen::llm::testing::{ScriptStep, ScriptedBackend};
use rfpgen::retrieval::testing::FixedSimilarityBackend;
use rfpgen::{
    GenerationMode, GenerationOrchestrator, GenerationPhase, GenerationRequest, JsonFileStore,
    OrchestratorSettings, PersistenceAdapter, ProviderErrorClass, ProviderGateway, ProviderId,
    ProviderRoute, RequirementId, RequirementRecord, RetrievalStatus, RouteBinding, SimilarMatch,
    SimilarityRetriever, SynthesisRequest,
};

struct Harness {
    _dir: TempDir,
    data_dir: Utf8PathBuf,
    openai: Arc<ScriptedBackend>,
    anthropic: Arc<ScriptedBackend>,
    deepseek: Arc<ScriptedBackend>,
    synthesis: Arc<ScriptedBackend>,
}

impl Harness {
    fn new(openai: Vec<ScriptStep>, anthropic: Vec<ScriptStep>, deepseek: Vec<ScriptStep>, synthesis: Vec<ScriptStep>) -> Self {
        let dir = TempDir::new().unwrap();
        let data_dir = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        Self {
            _dir: dir,
            data_dir,
            openai: Arc::new(ScriptedBackend::new("openai", openai)),
            anthropic: Arc::new(ScriptedBackend::new("anthropic", anthropic)),
            deepseek: Arc::new(ScriptedBackend::new("deepseek", deepseek)),
            synthesis: Arc::new(ScriptedBackend::new("synthesis", synthesis)),
        }
    }

    fn store(&self) -> JsonFileStore {
        JsonFileStore::open(self.data_dir.clone()).unwrap()
    }

    fn gateway(&self) -> ProviderGateway {
        ProviderGateway::new()
            .with_route(
                ProviderRoute::OpenAi,
                RouteBinding::new(self.openai.clone(), "gpt-4").with_fallback("gpt-4o-mini"),
            )
            .with_route(
                ProviderRoute::Anthropic,
                RouteBinding::new(self.anthropic.clone(), "claude-3-7-sonnet-20250219")
                    .with_fallback("claude-3-5-sonnet-latest"),
            )
            .with_route(
                ProviderRoute::DeepSeek,
                RouteBinding::new(self.deepseek.clone(), "deepseek-chat"),
            )
            .with_route(
                ProviderRoute::Synthesis,
                RouteBinding::new(self.synthesis.clone(), "gpt-4"),
            )
    }

    fn orchestrator(
        &self,
        retriever: SimilarityRetriever,
        settings: OrchestratorSettings,
    ) -> GenerationOrchestrator<JsonFileStore> {
        GenerationOrchestrator::new(
            self.gateway(),
            retriever,
            PersistenceAdapter::new(self.store()),
            settings,
        )
    }

    async fn ingest(&self, id: u64, requirement: &str) {
        PersistenceAdapter::new(self.store())
            .ingest(RequirementRecord::new(RequirementId::new(id), requirement).with_category("Integration"))
            .await
            .unwrap();
    }

    async fn reload(&self, id: u64) -> RequirementRecord {
        PersistenceAdapter::new(self.store())
            .find(RequirementId::new(id))
            .await
            .unwrap()
    }
}

fn reply(text: &str) -> Vec<ScriptStep> {
    vec![ScriptStep::Reply(text.to_string())]
}

#[tokio::test]
async fn test_synthesis_run_persists_all_fields_to_disk() {
    let h = Harness::new(reply("A says yes"), reply("B says yes"), reply("C says yes"), reply("Merged yes"));
    h.ingest(40, "Provides a REST API for order import").await;
    let retriever = SimilarityRetriever::new(
        Arc::new(FixedSimilarityBackend::new(vec![SimilarMatch {
            category: Some("Integration".to_string()),
            requirement: "Offers an order import API".to_string(),
            response: "Yes, via REST".to_string(),
            label: Some("Globex 2023".to_string()),
            score: 0.95,
        }])),
        5,
        0.5,
    );

    let outcome = h
        .orchestrator(retriever, OrchestratorSettings::default())
        .generate(GenerationRequest::new(RequirementId::new(40), GenerationMode::Synthesis))
        .await
        .unwrap();
    assert_eq!(outcome.phase, GenerationPhase::Persisted);
    assert_eq!(outcome.retrieval, RetrievalStatus::Complete);

    let record = h.reload(40).await;
    assert_eq!(record.openai_response.as_deref(), Some("A says yes"));
    assert_eq!(record.anthropic_response.as_deref(), Some("B says yes"));
    assert_eq!(record.deepseek_response.as_deref(), Some("C says yes"));
    assert_eq!(record.synthesized_response.as_deref(), Some("Merged yes"));
    assert_eq!(record.final_response.as_deref(), Some("Merged yes"));
    assert_eq!(record.provider_marker, Some(GenerationMode::Synthesis));

    let references = PersistenceAdapter::new(h.store())
        .references(RequirementId::new(40))
        .await
        .unwrap();
    assert_eq!(references.len(), 1);
    assert_eq!(references[0].label.as_deref(), Some("Globex 2023"));
}

#[tokio::test]
async fn test_model_unavailable_retries_once_with_fallback() {
    let h = Harness::new(
        vec![ScriptStep::ModelUnavailable, ScriptStep::Reply("From fallback".to_string())],
        reply("unused"),
        reply("unused"),
        reply("unused"),
    );
    h.ingest(41, "Supports MFA").await;

    let outcome = h
        .orchestrator(SimilarityRetriever::disabled(), OrchestratorSettings::default())
        .generate(GenerationRequest::new(RequirementId::new(41), GenerationMode::OpenAi))
        .await
        .unwrap();

    assert_eq!(outcome.record.final_response.as_deref(), Some("From fallback"));
    let models: Vec<String> = h.openai.calls().into_iter().map(|c| c.model).collect();
    assert_eq!(models, vec!["gpt-4".to_string(), "gpt-4o-mini".to_string()]);
}

#[tokio::test]
async fn test_auth_and_quota_failures_do_not_use_fallback() {
    let h = Harness::new(
        vec![ScriptStep::AuthFailure],
        vec![ScriptStep::QuotaExceeded],
        reply("C only"),
        reply("unused"),
    );
    h.ingest(42, "Encrypts data at rest").await;

    let outcome = h
        .orchestrator(SimilarityRetriever::disabled(), OrchestratorSettings::default())
        .generate(GenerationRequest::new(RequirementId::new(42), GenerationMode::Synthesis))
        .await
        .unwrap();

    assert_eq!(h.openai.call_count(), 1);
    assert_eq!(h.anthropic.call_count(), 1);
    let classes: Vec<(ProviderId, ProviderErrorClass)> = outcome
        .provider_failures
        .iter()
        .map(|(p, e)| (*p, e.class))
        .collect();
    assert!(classes.contains(&(ProviderId::OpenAi, ProviderErrorClass::Auth)));
    assert!(classes.contains(&(ProviderId::Anthropic, ProviderErrorClass::Quota)));

    // one survivor is below the synthesis threshold: the lone answer becomes final
    assert_eq!(h.synthesis.call_count(), 0);
    let record = h.reload(42).await;
    assert_eq!(record.deepseek_response.as_deref(), Some("C only"));
    assert_eq!(record.final_response.as_deref(), Some("C only"));
    assert_eq!(record.provider_marker, Some(GenerationMode::DeepSeek));
}

#[tokio::test]
async fn test_deferred_synthesis_across_orchestrator_instances() {
    let h = Harness::new(reply("A"), reply("B"), reply("C"), reply("Merged"));
    h.ingest(43, "Supports SCIM provisioning").await;

    let phase1 = h
        .orchestrator(SimilarityRetriever::disabled(), OrchestratorSettings::default())
        .generate(
            GenerationRequest::new(RequirementId::new(43), GenerationMode::Synthesis)
                .with_auto_continue(false),
        )
        .await
        .unwrap();
    assert!(phase1.synthesis_pending);
    assert!(h.reload(43).await.synthesis_pending());
    assert_eq!(h.synthesis.call_count(), 0);

    // a fresh orchestrator reads the Phase 1 answers back from disk
    let phase2 = h
        .orchestrator(SimilarityRetriever::disabled(), OrchestratorSettings::default())
        .synthesize(SynthesisRequest::new(RequirementId::new(43)))
        .await
        .unwrap();
    assert!(!phase2.synthesis_pending);
    assert_eq!(h.synthesis.call_count(), 1);

    let record = h.reload(43).await;
    assert_eq!(record.final_response.as_deref(), Some("Merged"));
    assert_eq!(record.openai_response.as_deref(), Some("A"));
}

#[tokio::test]
async fn test_feedback_preserves_generated_content() {
    let h = Harness::new(reply("A"), reply("B"), reply("C"), reply("Merged"));
    h.ingest(44, "Offers 99.9% uptime SLA").await;
    h.orchestrator(SimilarityRetriever::disabled(), OrchestratorSettings::default())
        .generate(GenerationRequest::new(RequirementId::new(44), GenerationMode::Synthesis))
        .await
        .unwrap();

    PersistenceAdapter::new(h.store())
        .record_feedback(RequirementId::new(44), 5, Some("Spot on".to_string()))
        .await
        .unwrap();

    let record = h.reload(44).await;
    assert_eq!(record.rating, Some(5));
    assert_eq!(record.feedback.as_deref(), Some("Spot on"));
    assert_eq!(record.final_response.as_deref(), Some("Merged"));
    assert_eq!(record.synthesized_response.as_deref(), Some("Merged"));
}

#[tokio::test]
async fn test_regeneration_in_single_mode_clears_other_providers() {
    let h = Harness::new(
        vec![ScriptStep::Reply("A1".to_string()), ScriptStep::Reply("A2".to_string())],
        reply("B"),
        reply("C"),
        reply("Merged"),
    );
    h.ingest(45, "Supports webhooks").await;

    h.orchestrator(SimilarityRetriever::disabled(), OrchestratorSettings::default())
        .generate(GenerationRequest::new(RequirementId::new(45), GenerationMode::Synthesis))
        .await
        .unwrap();
    h.orchestrator(SimilarityRetriever::disabled(), OrchestratorSettings::default())
        .generate(GenerationRequest::new(RequirementId::new(45), GenerationMode::OpenAi))
        .await
        .unwrap();

    let record = h.reload(45).await;
    assert_eq!(record.openai_response.as_deref(), Some("A2"));
    assert_eq!(record.anthropic_response, None);
    assert_eq!(record.deepseek_response, None);
    assert_eq!(record.synthesized_response, None);
    assert_eq!(record.final_response.as_deref(), Some("A2"));
    assert_eq!(record.provider_marker, Some(GenerationMode::OpenAi));
}
