//! Generation engine for rfpgen
//!
//! Turns an ingested requirement into persisted provider answers and, in
//! synthesis mode, one combined final response:
//!
//! - [`orchestrator`]: the two-phase state machine
//! - [`normalizer`]: pure mapping from raw outputs to record fields
//! - [`prompt`]: Phase 1 and Phase 2 prompt construction

pub mod normalizer;
pub mod orchestrator;
pub mod prompt;

pub use normalizer::{RawOutputs, normalize, normalize_combined, normalize_named};
pub use orchestrator::{
    DEFAULT_GENERATION_DEADLINE, GenerationOrchestrator, GenerationOutcome, GenerationPhase,
    GenerationRequest, OrchestratorSettings, PhaseTrace, SynthesisRequest,
};
pub use prompt::PromptSettings;
