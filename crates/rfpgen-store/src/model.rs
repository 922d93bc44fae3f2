use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use rfpgen_utils::types::{GenerationMode, ProviderId, RequirementId};

/// Which mode produced a record's `final_response`
pub type ProviderMarker = GenerationMode;

/// The persisted unit of work: one RFP requirement line and its answers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequirementRecord {
    pub id: RequirementId,
    pub requirement: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub rfp_label: Option<String>,
    #[serde(default)]
    pub uploaded_by: Option<String>,
    #[serde(default)]
    pub openai_response: Option<String>,
    #[serde(default)]
    pub anthropic_response: Option<String>,
    #[serde(default)]
    pub deepseek_response: Option<String>,
    #[serde(default)]
    pub synthesized_response: Option<String>,
    #[serde(default)]
    pub final_response: Option<String>,
    #[serde(default)]
    pub provider_marker: Option<ProviderMarker>,
    #[serde(default)]
    pub rating: Option<u8>,
    #[serde(default)]
    pub feedback: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl RequirementRecord {
    /// An ingested record with no generated content yet
    #[must_use]
    pub fn new(id: RequirementId, requirement: impl Into<String>) -> Self {
        Self {
            id,
            requirement: requirement.into(),
            category: None,
            rfp_label: None,
            uploaded_by: None,
            openai_response: None,
            anthropic_response: None,
            deepseek_response: None,
            synthesized_response: None,
            final_response: None,
            provider_marker: None,
            rating: None,
            feedback: None,
            timestamp: Utc::now(),
        }
    }

    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.rfp_label = Some(label.into());
        self
    }

    #[must_use]
    pub fn with_uploader(mut self, uploaded_by: impl Into<String>) -> Self {
        self.uploaded_by = Some(uploaded_by.into());
        self
    }

    #[must_use]
    pub fn provider_response(&self, provider: ProviderId) -> Option<&str> {
        match provider {
            ProviderId::OpenAi => self.openai_response.as_deref(),
            ProviderId::Anthropic => self.anthropic_response.as_deref(),
            ProviderId::DeepSeek => self.deepseek_response.as_deref(),
        }
    }

    fn provider_slot(&mut self, provider: ProviderId) -> &mut Option<String> {
        match provider {
            ProviderId::OpenAi => &mut self.openai_response,
            ProviderId::Anthropic => &mut self.anthropic_response,
            ProviderId::DeepSeek => &mut self.deepseek_response,
        }
    }

    /// Non-blank provider answers, in dispatch order
    #[must_use]
    pub fn provider_outputs(&self) -> Vec<(ProviderId, String)> {
        ProviderId::all()
            .filter_map(|p| {
                self.provider_response(p)
                    .map(str::trim)
                    .filter(|text| !text.is_empty())
                    .map(|text| (p, text.to_string()))
            })
            .collect()
    }

    /// True when Phase 1 produced answers but no final response was chosen
    #[must_use]
    pub fn synthesis_pending(&self) -> bool {
        self.final_response.is_none() && !self.provider_outputs().is_empty()
    }

    /// Apply `patch` in place and stamp the record
    pub fn apply(&mut self, patch: &FieldPatch) {
        for provider in ProviderId::all() {
            patch.provider(provider).apply_to(self.provider_slot(provider));
        }
        patch
            .synthesized_response
            .apply_to(&mut self.synthesized_response);
        patch.final_response.apply_to(&mut self.final_response);
        patch.provider_marker.apply_to(&mut self.provider_marker);
        patch.rating.apply_to(&mut self.rating);
        patch.feedback.apply_to(&mut self.feedback);
        self.timestamp = Utc::now();
    }
}

/// A historical requirement/response pair attached to a requirement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceRecord {
    pub requirement_id: RequirementId,
    #[serde(default)]
    pub category: Option<String>,
    pub requirement: String,
    pub response: String,
    #[serde(default)]
    pub label: Option<String>,
    /// Similarity in [0, 1]
    pub score: f32,
}

/// Tri-state change to one record field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FieldUpdate<T> {
    /// Absent from the patch; the stored value is preserved
    #[default]
    Keep,
    Set(T),
    /// Explicitly unset
    Clear,
}

impl<T: Clone> FieldUpdate<T> {
    pub fn apply_to(&self, slot: &mut Option<T>) {
        match self {
            Self::Keep => {}
            Self::Set(value) => *slot = Some(value.clone()),
            Self::Clear => *slot = None,
        }
    }

    #[must_use]
    pub fn is_keep(&self) -> bool {
        matches!(self, Self::Keep)
    }

    #[must_use]
    pub fn as_set(&self) -> Option<&T> {
        match self {
            Self::Set(value) => Some(value),
            _ => None,
        }
    }
}

impl<T> From<Option<T>> for FieldUpdate<T> {
    /// `Some` sets, `None` clears
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Self::Set(v),
            None => Self::Clear,
        }
    }
}

/// Changes to apply to a [`RequirementRecord`] in one write.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldPatch {
    pub openai_response: FieldUpdate<String>,
    pub anthropic_response: FieldUpdate<String>,
    pub deepseek_response: FieldUpdate<String>,
    pub synthesized_response: FieldUpdate<String>,
    pub final_response: FieldUpdate<String>,
    pub provider_marker: FieldUpdate<ProviderMarker>,
    pub rating: FieldUpdate<u8>,
    pub feedback: FieldUpdate<String>,
}

impl FieldPatch {
    #[must_use]
    pub fn provider(&self, provider: ProviderId) -> &FieldUpdate<String> {
        match provider {
            ProviderId::OpenAi => &self.openai_response,
            ProviderId::Anthropic => &self.anthropic_response,
            ProviderId::DeepSeek => &self.deepseek_response,
        }
    }

    pub fn provider_mut(&mut self, provider: ProviderId) -> &mut FieldUpdate<String> {
        match provider {
            ProviderId::OpenAi => &mut self.openai_response,
            ProviderId::Anthropic => &mut self.anthropic_response,
            ProviderId::DeepSeek => &mut self.deepseek_response,
        }
    }

    /// True when the patch would change nothing
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_preserves_kept_fields() {
        let mut record = RequirementRecord::new(RequirementId::new(1), "Supports SSO")
            .with_category("Security");
        record.rating = Some(4);
        record.openai_response = Some("old".to_string());

        let patch = FieldPatch {
            anthropic_response: FieldUpdate::Set("new".to_string()),
            openai_response: FieldUpdate::Clear,
            ..FieldPatch::default()
        };
        record.apply(&patch);

        assert_eq!(record.openai_response, None);
        assert_eq!(record.anthropic_response.as_deref(), Some("new"));
        assert_eq!(record.rating, Some(4));
        assert_eq!(record.category.as_deref(), Some("Security"));
    }

    #[test]
    fn test_provider_outputs_skip_blank_fields() {
        let mut record = RequirementRecord::new(RequirementId::new(2), "r");
        record.openai_response = Some("A-text".to_string());
        record.deepseek_response = Some("  ".to_string());

        assert_eq!(
            record.provider_outputs(),
            vec![(ProviderId::OpenAi, "A-text".to_string())]
        );
        assert!(record.synthesis_pending());
    }

    #[test]
    fn test_record_serializes_marker_lowercase() {
        let mut record = RequirementRecord::new(RequirementId::new(3), "r");
        record.provider_marker = Some(GenerationMode::Synthesis);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["provider_marker"], "synthesis");
        assert_eq!(json["id"], 3);
    }

    #[test]
    fn test_option_into_field_update() {
        assert_eq!(
            FieldUpdate::from(Some("x".to_string())),
            FieldUpdate::Set("x".to_string())
        );
        assert_eq!(FieldUpdate::<String>::from(None), FieldUpdate::Clear);
        assert!(FieldPatch::default().is_empty());
    }
}
