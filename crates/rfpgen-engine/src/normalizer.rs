//! Maps raw provider outputs onto record fields.
//!
//! The mapping is pure: the same outputs, mode and requirement text always give
//! the same [`FieldPatch`]. Missing content never becomes an error; it becomes
//! the fallback text from [`fallback_response`].

use rfpgen_store::{FieldPatch, FieldUpdate};
use rfpgen_utils::error::MappingError;
use rfpgen_utils::fallback::fallback_response;
use rfpgen_utils::types::{GenerationMode, ProviderId};

/// Provider answers collected by one generation run.
///
/// Whitespace-only entries are treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawOutputs {
    pub openai: Option<String>,
    pub anthropic: Option<String>,
    pub deepseek: Option<String>,
    /// Answer from the synthesis route
    pub combined: Option<String>,
}

fn present(text: Option<&String>) -> Option<&str> {
    text.map(|t| t.trim()).filter(|t| !t.is_empty())
}

impl RawOutputs {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, provider: ProviderId, text: impl Into<String>) -> Self {
        self.set(provider, text);
        self
    }

    #[must_use]
    pub fn with_combined(mut self, text: impl Into<String>) -> Self {
        self.combined = Some(text.into());
        self
    }

    pub fn set(&mut self, provider: ProviderId, text: impl Into<String>) {
        let slot = match provider {
            ProviderId::OpenAi => &mut self.openai,
            ProviderId::Anthropic => &mut self.anthropic,
            ProviderId::DeepSeek => &mut self.deepseek,
        };
        *slot = Some(text.into());
    }

    /// Trimmed answer from `provider`, if it produced one
    #[must_use]
    pub fn get(&self, provider: ProviderId) -> Option<&str> {
        present(match provider {
            ProviderId::OpenAi => self.openai.as_ref(),
            ProviderId::Anthropic => self.anthropic.as_ref(),
            ProviderId::DeepSeek => self.deepseek.as_ref(),
        })
    }

    #[must_use]
    pub fn combined(&self) -> Option<&str> {
        present(self.combined.as_ref())
    }

    /// Non-empty individual answers in dispatch order
    #[must_use]
    pub fn individual(&self) -> Vec<(ProviderId, String)> {
        ProviderId::all()
            .filter_map(|p| self.get(p).map(|text| (p, text.to_string())))
            .collect()
    }

    /// Rebuild outputs from `(provider, text)` pairs, e.g. a persisted Phase 1
    #[must_use]
    pub fn from_individual(outputs: &[(ProviderId, String)]) -> Self {
        outputs
            .iter()
            .fold(Self::new(), |raw, (p, text)| raw.with(*p, text.clone()))
    }
}

/// Build the record patch for `raw` under `mode`.
///
/// Provider fields this run did not produce are cleared, so a patch always
/// supersedes earlier generated content. See [`normalize_named`] for the
/// string-mode entry point.
#[must_use]
pub fn normalize(raw: &RawOutputs, mode: GenerationMode, requirement: &str) -> FieldPatch {
    match mode.single_provider() {
        Some(provider) => normalize_single(raw, provider, requirement),
        None => normalize_synthesis(raw, requirement),
    }
}

/// [`normalize`] with the mode given by name.
///
/// # Errors
///
/// Returns [`MappingError`] when `mode` is not a known generation mode.
pub fn normalize_named(
    raw: &RawOutputs,
    mode: &str,
    requirement: &str,
) -> Result<FieldPatch, MappingError> {
    let mode: GenerationMode = mode.parse()?;
    Ok(normalize(raw, mode, requirement))
}

/// Build the Phase 2 patch for a synthesis answer.
///
/// Only `synthesized_response`, `final_response` and the marker change; the
/// provider fields written by Phase 1 are kept whatever subset of answers fed
/// the synthesis call. A blank answer falls back like [`normalize`].
#[must_use]
pub fn normalize_combined(combined: &str, requirement: &str) -> FieldPatch {
    let text = match combined.trim() {
        "" => fallback_response(requirement),
        text => text.to_string(),
    };
    FieldPatch {
        synthesized_response: FieldUpdate::Set(text.clone()),
        final_response: FieldUpdate::Set(text),
        provider_marker: FieldUpdate::Set(GenerationMode::Synthesis),
        ..FieldPatch::default()
    }
}

fn cleared() -> FieldPatch {
    FieldPatch {
        openai_response: FieldUpdate::Clear,
        anthropic_response: FieldUpdate::Clear,
        deepseek_response: FieldUpdate::Clear,
        synthesized_response: FieldUpdate::Clear,
        ..FieldPatch::default()
    }
}

fn normalize_single(raw: &RawOutputs, provider: ProviderId, requirement: &str) -> FieldPatch {
    let text = raw
        .get(provider)
        .map_or_else(|| fallback_response(requirement), str::to_string);

    let mut patch = cleared();
    *patch.provider_mut(provider) = FieldUpdate::Set(text.clone());
    patch.final_response = FieldUpdate::Set(text);
    patch.provider_marker = FieldUpdate::Set(GenerationMode::from(provider));
    patch
}

fn normalize_synthesis(raw: &RawOutputs, requirement: &str) -> FieldPatch {
    let mut patch = cleared();
    let individual = raw.individual();
    for (provider, text) in &individual {
        *patch.provider_mut(*provider) = FieldUpdate::Set(text.clone());
    }

    if let Some(combined) = raw.combined() {
        patch.synthesized_response = FieldUpdate::Set(combined.to_string());
        patch.final_response = FieldUpdate::Set(combined.to_string());
        patch.provider_marker = FieldUpdate::Set(GenerationMode::Synthesis);
        return patch;
    }

    match individual.as_slice() {
        [] => {
            patch.final_response = FieldUpdate::Set(fallback_response(requirement));
            patch.provider_marker = FieldUpdate::Set(GenerationMode::Synthesis);
        }
        [(provider, text)] => {
            patch.final_response = FieldUpdate::Set(text.clone());
            patch.provider_marker = FieldUpdate::Set(GenerationMode::from(*provider));
        }
        _ => {
            // synthesis pending
            patch.final_response = FieldUpdate::Clear;
            patch.provider_marker = FieldUpdate::Clear;
        }
    }
    patch
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rfpgen_store::RequirementRecord;
    use rfpgen_utils::types::RequirementId;

    fn applied(patch: &FieldPatch) -> RequirementRecord {
        let mut record = RequirementRecord::new(RequirementId::new(1), "r");
        record.openai_response = Some("stale".to_string());
        record.final_response = Some("stale".to_string());
        record.apply(patch);
        record
    }

    #[test]
    fn test_single_mode_mirrors_output() {
        let raw = RawOutputs::new().with(ProviderId::OpenAi, "Answer X");
        let record = applied(&normalize(&raw, GenerationMode::OpenAi, "r"));

        assert_eq!(record.final_response.as_deref(), Some("Answer X"));
        assert_eq!(record.openai_response.as_deref(), Some("Answer X"));
        assert_eq!(record.anthropic_response, None);
        assert_eq!(record.deepseek_response, None);
        assert_eq!(record.provider_marker, Some(GenerationMode::OpenAi));
    }

    #[test]
    fn test_single_mode_without_output_uses_fallback_in_both_fields() {
        let raw = RawOutputs::new().with(ProviderId::Anthropic, "   ");
        let record = applied(&normalize(&raw, GenerationMode::Anthropic, "Supports SSO"));

        let fallback = fallback_response("Supports SSO");
        assert_eq!(record.final_response.as_deref(), Some(fallback.as_str()));
        assert_eq!(record.anthropic_response.as_deref(), Some(fallback.as_str()));
        assert_eq!(record.openai_response, None);
    }

    #[test]
    fn test_synthesis_with_combined_keeps_individual_outputs() {
        let raw = RawOutputs::new()
            .with(ProviderId::OpenAi, "A-text")
            .with(ProviderId::Anthropic, "B-text")
            .with_combined("Combined");
        let record = applied(&normalize(&raw, GenerationMode::Synthesis, "r"));

        assert_eq!(record.openai_response.as_deref(), Some("A-text"));
        assert_eq!(record.anthropic_response.as_deref(), Some("B-text"));
        assert_eq!(record.deepseek_response, None);
        assert_eq!(record.synthesized_response.as_deref(), Some("Combined"));
        assert_eq!(record.final_response.as_deref(), Some("Combined"));
        assert_eq!(record.provider_marker, Some(GenerationMode::Synthesis));
    }

    #[test]
    fn test_synthesis_pending_leaves_final_unset() {
        let raw = RawOutputs::new()
            .with(ProviderId::OpenAi, "A-text")
            .with(ProviderId::DeepSeek, "C-text");
        let record = applied(&normalize(&raw, GenerationMode::Synthesis, "r"));

        assert_eq!(record.final_response, None);
        assert_eq!(record.provider_marker, None);
        assert!(record.synthesis_pending());
    }

    #[test]
    fn test_synthesis_with_one_output_uses_it() {
        let raw = RawOutputs::new().with(ProviderId::DeepSeek, " C-text ");
        let record = applied(&normalize(&raw, GenerationMode::Synthesis, "r"));

        assert_eq!(record.final_response.as_deref(), Some("C-text"));
        assert_eq!(record.provider_marker, Some(GenerationMode::DeepSeek));
        assert_eq!(record.openai_response, None);
    }

    #[test]
    fn test_synthesis_without_outputs_uses_fallback() {
        let record = applied(&normalize(&RawOutputs::new(), GenerationMode::Synthesis, ""));
        assert_eq!(record.final_response, Some(fallback_response("")));
    }

    #[test]
    fn test_combined_patch_keeps_every_provider_field() {
        let mut record = RequirementRecord::new(RequirementId::new(1), "r");
        record.openai_response = Some("A-text".to_string());
        record.anthropic_response = Some("B-text".to_string());
        record.deepseek_response = Some("C-text".to_string());

        let patch = normalize_combined(" Combined ", "r");
        assert!(ProviderId::all().all(|p| patch.provider(p).is_keep()));
        record.apply(&patch);

        assert_eq!(record.openai_response.as_deref(), Some("A-text"));
        assert_eq!(record.anthropic_response.as_deref(), Some("B-text"));
        assert_eq!(record.deepseek_response.as_deref(), Some("C-text"));
        assert_eq!(record.synthesized_response.as_deref(), Some("Combined"));
        assert_eq!(record.final_response.as_deref(), Some("Combined"));
        assert_eq!(record.provider_marker, Some(GenerationMode::Synthesis));
    }

    #[test]
    fn test_blank_combined_answer_falls_back() {
        let patch = normalize_combined("  ", "Supports SSO");
        assert_eq!(
            patch.final_response.as_set(),
            Some(&fallback_response("Supports SSO"))
        );
    }

    #[test]
    fn test_unknown_mode_is_mapping_error() {
        let err = normalize_named(&RawOutputs::new(), "gemini", "r").unwrap_err();
        assert_eq!(err.mode, "gemini");
        assert!(normalize_named(&RawOutputs::new(), "moa", "r").is_ok());
    }

    fn mode_strategy() -> impl Strategy<Value = GenerationMode> {
        prop_oneof![
            Just(GenerationMode::OpenAi),
            Just(GenerationMode::Anthropic),
            Just(GenerationMode::DeepSeek),
            Just(GenerationMode::Synthesis),
        ]
    }

    proptest! {
        #[test]
        fn prop_final_response_never_blank(
            mode in mode_strategy(),
            a in proptest::option::of(".{0,20}"),
            b in proptest::option::of(".{0,20}"),
            c in proptest::option::of(".{0,20}"),
            combined in proptest::option::of(".{0,20}"),
            requirement in ".{0,40}",
        ) {
            let raw = RawOutputs { openai: a, anthropic: b, deepseek: c, combined };
            let patch = normalize(&raw, mode, &requirement);
            if let Some(text) = patch.final_response.as_set() {
                prop_assert!(!text.trim().is_empty());
            }
            prop_assert_eq!(&patch, &normalize(&raw, mode, &requirement));
        }

        #[test]
        fn prop_single_mode_sets_exactly_one_provider(
            mode in mode_strategy().prop_filter("single", |m| !m.is_synthesis()),
            text in proptest::option::of(".{0,20}"),
        ) {
            let provider = mode.single_provider().unwrap();
            let mut raw = RawOutputs::new();
            if let Some(text) = text {
                raw.set(provider, text);
            }
            let record = applied(&normalize(&raw, mode, "requirement"));
            let populated: Vec<_> = ProviderId::all()
                .filter(|p| record.provider_response(*p).is_some())
                .collect();
            prop_assert_eq!(populated, vec![provider]);
            prop_assert_eq!(record.provider_response(provider), record.final_response.as_deref());
        }
    }
}
