//! JSON rendering for command output
//!
//! Output is built with `serde_json::json!` so the shape stays stable even
//! when internal types grow fields.

use serde_json::{Value, json};

use crate::GenerationOutcome;
use rfpgen_store::{ReferenceRecord, RequirementRecord};
use rfpgen_utils::error::ProviderError;
use rfpgen_utils::types::ProviderId;

pub(super) fn provider_error_json(provider: Option<ProviderId>, error: &ProviderError) -> Value {
    json!({
        "provider": provider.map(|p| p.as_str()),
        "class": error.class.as_str(),
        "message": error.message,
    })
}

pub(super) fn record_json(record: &RequirementRecord, references: &[ReferenceRecord]) -> Value {
    json!({
        "record": record,
        "synthesis_pending": record.synthesis_pending(),
        "references": references,
    })
}

pub(super) fn outcome_json(outcome: &GenerationOutcome) -> Value {
    let failures: Vec<Value> = outcome
        .provider_failures
        .iter()
        .map(|(provider, error)| provider_error_json(Some(*provider), error))
        .collect();

    json!({
        "phase": outcome.phase,
        "trace": outcome.trace.visited(),
        "synthesis_pending": outcome.synthesis_pending,
        "retrieval": outcome.retrieval,
        "provider_failures": failures,
        "synthesis_failure": outcome
            .synthesis_failure
            .as_ref()
            .map(|error| provider_error_json(None, error)),
        "record": outcome.record,
        "references": outcome.references,
    })
}

pub(super) fn print_json(value: &Value) -> Result<(), std::io::Error> {
    let rendered = serde_json::to_string_pretty(value).map_err(std::io::Error::other)?;
    println!("{rendered}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rfpgen_utils::error::ProviderErrorClass;
    use rfpgen_utils::types::RequirementId;

    #[test]
    fn test_provider_error_json_shape() {
        let error = ProviderError::new(ProviderErrorClass::Quota, "rate limited");
        let value = provider_error_json(Some(ProviderId::Anthropic), &error);
        assert_eq!(value["provider"], "anthropic");
        assert_eq!(value["class"], "quota");
        assert_eq!(value["message"], "rate limited");
    }

    #[test]
    fn test_record_json_reports_pending() {
        let mut record = RequirementRecord::new(RequirementId::new(7), "Supports SSO");
        record.openai_response = Some("Yes".to_string());
        record.anthropic_response = Some("Yes, via SAML".to_string());
        let value = record_json(&record, &[]);
        assert_eq!(value["synthesis_pending"], true);
        assert_eq!(value["references"].as_array().map(Vec::len), Some(0));
    }
}
