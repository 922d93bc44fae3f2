//! rfpgen - multi-provider RFP response generation
//!
//! rfpgen answers RFP requirement lines by asking several language-model
//! providers in parallel, grounding each prompt in similar historical answers,
//! and merging the individual answers into one final response.
//!
//! rfpgen can be used in two ways:
//! - **CLI**: run `rfpgen ingest`, `rfpgen generate`, `rfpgen show` and friends
//! - **Library**: build a [`GenerationOrchestrator`] over any [`RequirementStore`]
//!
//! # Quick Start (CLI)
//!
//! ```bash
//! rfpgen ingest 113 --text "Supports single sign-on via SAML 2.0" --category Security
//! rfpgen generate 113
//! rfpgen show 113 --json
//! ```
//!
//! # Quick Start (Library)
//!
//! ```rust,no_run
//! use rfpgen::{
//!     CliArgs, Config, Credentials, GenerationMode, GenerationOrchestrator, GenerationRequest,
//!     MemoryStore, RequirementId,
//! };
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::discover(&CliArgs::default())?;
//! let credentials = Credentials::resolve(&config);
//! let orchestrator = GenerationOrchestrator::from_config(&config, &credentials, MemoryStore::new())?;
//!
//! let outcome = orchestrator
//!     .generate(GenerationRequest::new(RequirementId::new(113), GenerationMode::Synthesis))
//!     .await?;
//! println!("{:?}", outcome.record.final_response);
//! # Ok(())
//! # }
//! ```
//!
//! # Stable Public API
//!
//! - [`GenerationOrchestrator`] with [`GenerationRequest`] and [`SynthesisRequest`]
//! - [`Config`], [`CliArgs`] and [`Credentials`]
//! - [`RfpError`] and [`ExitCode`]
//! - [`RequirementStore`] with [`MemoryStore`] and [`JsonFileStore`]

// ============================================================================
// Stable Public API
// ============================================================================

/// Two-phase generation over a requirement store.
pub use rfpgen_engine::{
    GenerationOrchestrator, GenerationOutcome, GenerationPhase, GenerationRequest,
    OrchestratorSettings, PhaseTrace, SynthesisRequest,
};

/// Pure mapping from raw provider outputs to record fields.
pub use rfpgen_engine::{RawOutputs, normalize, normalize_combined, normalize_named};

/// Identifiers shared by every layer.
pub use rfpgen_utils::types::{GenerationMode, ProviderId, ProviderRoute, RequirementId};

/// Configuration for rfpgen operations.
///
/// Precedence: CLI arguments > config file > built-in defaults.
pub use rfpgen_config::{CliArgs, Config, Credentials};

/// Library-level error type.
///
/// Library code returns `RfpError` and does NOT call `std::process::exit()`;
/// use [`to_exit_code()`](RfpError::to_exit_code) to pick the process status.
pub use rfpgen_utils::error::RfpError;

pub use rfpgen_utils::error::{
    ConfigError, ErrorCategory, GenerationError, MappingError, ProviderError, ProviderErrorClass,
    StorageError, UserFriendlyError, ValidationError,
};

/// Exit codes matching the documented exit code table.
pub use rfpgen_utils::exit_codes::ExitCode;

pub use rfpgen_store::{
    FieldPatch, FieldUpdate, JsonFileStore, MemoryStore, PersistenceAdapter, ReferenceRecord,
    RequirementRecord, RequirementStore,
};

pub use rfpgen_llm::{LlmBackend, ProviderGateway, RouteBinding};
pub use rfpgen_retrieval::{
    RetrievalOutcome, RetrievalStatus, SimilarMatch, SimilarityBackend, SimilarityRetriever,
};

// ============================================================================
// Internal modules - accessible but not stable
// ============================================================================

#[doc(hidden)]
pub use rfpgen_utils::{atomic_write, error, exit_codes, fallback, logging, redaction, types};

#[doc(hidden)]
pub use rfpgen_config as config;

#[doc(hidden)]
pub use rfpgen_llm as llm;

#[doc(hidden)]
pub use rfpgen_retrieval as retrieval;

#[doc(hidden)]
pub use rfpgen_store as store;

#[doc(hidden)]
pub use rfpgen_engine as engine;

// Exported with #[doc(hidden)] to allow white-box testing of CLI flag parsing
#[doc(hidden)]
pub mod cli;
