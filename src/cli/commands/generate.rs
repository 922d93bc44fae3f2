//! Generate and synthesize command implementations

use tracing::info;

use super::common::{build_orchestrator, print_record, reference_lines};
use super::json_emit::{outcome_json, print_json};
use crate::{
    Config, GenerationMode, GenerationOutcome, GenerationRequest, RequirementId, RetrievalStatus,
    RfpError, SynthesisRequest,
};

/// Execute the generate command
///
/// `--no-auto-continue` and `--deadline-secs` reach the orchestrator through
/// the configuration overrides built in `run`.
pub async fn execute_generate_command(
    id: u64,
    mode: GenerationMode,
    text: Option<String>,
    json: bool,
    config: &Config,
) -> Result<(), RfpError> {
    let orchestrator = build_orchestrator(config)?;

    let mut request = GenerationRequest::new(RequirementId::new(id), mode);
    if let Some(text) = text {
        request = request.with_text(text);
    }

    let outcome = orchestrator.generate(request).await?;
    info!(
        requirement_id = id,
        mode = %mode,
        phase = %outcome.phase,
        "generation finished"
    );
    emit_outcome(&outcome, json)
}

/// Execute the synthesize command over the stored Phase 1 answers
pub async fn execute_synthesize_command(
    id: u64,
    json: bool,
    config: &Config,
) -> Result<(), RfpError> {
    let orchestrator = build_orchestrator(config)?;
    let request = SynthesisRequest::new(RequirementId::new(id));
    let outcome = orchestrator.synthesize(request).await?;
    info!(requirement_id = id, phase = %outcome.phase, "synthesis finished");
    emit_outcome(&outcome, json)
}

fn emit_outcome(outcome: &GenerationOutcome, json: bool) -> Result<(), RfpError> {
    if json {
        print_json(&outcome_json(outcome))?;
        return Ok(());
    }

    if let RetrievalStatus::Unavailable { reason } = &outcome.retrieval {
        eprintln!("⚠ Similar responses unavailable: {reason}");
    }
    for (provider, error) in &outcome.provider_failures {
        eprintln!("⚠ {} failed: {error}", provider.display_name());
    }
    if let Some(error) = &outcome.synthesis_failure {
        eprintln!("⚠ Synthesis failed: {error}");
    }

    print_record(&outcome.record);
    if !outcome.references.is_empty() {
        println!("  References:");
        for line in reference_lines(&outcome.references) {
            println!("{line}");
        }
    }
    if outcome.synthesis_pending {
        println!(
            "\nRun 'rfpgen synthesize {}' to combine the answers.",
            outcome.record.id
        );
    }
    Ok(())
}
