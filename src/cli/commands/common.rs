//! Helpers shared by the command implementations

use camino::Utf8PathBuf;

use crate::{Config, ConfigError, Credentials, GenerationOrchestrator, JsonFileStore, RfpError};
use rfpgen_store::{ReferenceRecord, RequirementRecord};
use rfpgen_utils::types::ProviderId;

/// Open the JSON file store under the configured data directory
pub(super) fn open_store(config: &Config) -> Result<JsonFileStore, RfpError> {
    let data_dir = Utf8PathBuf::from_path_buf(config.data_dir()).map_err(|path| {
        ConfigError::InvalidValue {
            key: "storage.data_dir".to_string(),
            value: format!("{} is not valid UTF-8", path.display()),
        }
    })?;
    Ok(JsonFileStore::open(data_dir)?)
}

/// Orchestrator wired from configuration over the file store
pub(super) fn build_orchestrator(
    config: &Config,
) -> Result<GenerationOrchestrator<JsonFileStore>, RfpError> {
    let credentials = Credentials::resolve(config);
    let store = open_store(config)?;
    GenerationOrchestrator::from_config(config, &credentials, store)
}

/// Human-readable record summary
pub(super) fn print_record(record: &RequirementRecord) {
    println!("Requirement {}", record.id);
    println!("  Text: {}", record.requirement);
    if let Some(category) = &record.category {
        println!("  Category: {category}");
    }
    if let Some(label) = &record.rfp_label {
        println!("  RFP: {label}");
    }
    for provider in ProviderId::all() {
        if let Some(text) = record.provider_response(provider) {
            println!("  {} response:\n    {}", provider.display_name(), indent(text));
        }
    }
    if let Some(text) = &record.synthesized_response {
        println!("  Synthesized response:\n    {}", indent(text));
    }
    match (&record.final_response, record.provider_marker) {
        (Some(text), Some(marker)) => println!("  Final response ({marker}):\n    {}", indent(text)),
        (Some(text), None) => println!("  Final response:\n    {}", indent(text)),
        (None, _) if record.synthesis_pending() => println!("  Final response: synthesis pending"),
        (None, _) => println!("  Final response: not generated"),
    }
    if let Some(rating) = record.rating {
        println!("  Rating: {rating}/5");
    }
    if let Some(feedback) = &record.feedback {
        println!("  Feedback: {feedback}");
    }
    println!("  Updated: {}", record.timestamp.to_rfc3339());
}

fn indent(text: &str) -> String {
    text.lines().collect::<Vec<_>>().join("\n    ")
}

/// One display line per reference, numbered by rank, with its source label
pub(super) fn reference_lines(references: &[ReferenceRecord]) -> Vec<String> {
    references
        .iter()
        .enumerate()
        .map(|(rank, reference)| {
            let mut line = format!(
                "    {}. ({:.2}) {}",
                rank + 1,
                reference.score,
                reference.requirement
            );
            if let Some(label) = &reference.label {
                line.push_str(&format!(" [{label}]"));
            }
            line
        })
        .collect()
}
