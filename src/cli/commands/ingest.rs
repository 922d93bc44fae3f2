//! Ingest command implementation

use tracing::info;

use super::common::open_store;
use crate::{Config, PersistenceAdapter, RequirementId, RequirementRecord, RfpError, ValidationError};

/// Execute the ingest command
pub async fn execute_ingest_command(
    id: u64,
    text: String,
    category: Option<String>,
    label: Option<String>,
    uploaded_by: Option<String>,
    config: &Config,
) -> Result<(), RfpError> {
    if id == 0 {
        return Err(ValidationError::MissingRequirementId.into());
    }
    let text = text.trim();
    if text.is_empty() {
        return Err(ValidationError::InvalidField {
            field: "text".to_string(),
            reason: "requirement text is empty".to_string(),
        }
        .into());
    }

    let mut record = RequirementRecord::new(RequirementId::new(id), text);
    if let Some(category) = category.filter(|c| !c.trim().is_empty()) {
        record = record.with_category(category.trim());
    }
    if let Some(label) = label.filter(|l| !l.trim().is_empty()) {
        record = record.with_label(label.trim());
    }
    if let Some(user) = uploaded_by.filter(|u| !u.trim().is_empty()) {
        record = record.with_uploader(user.trim());
    }

    let persistence = PersistenceAdapter::new(open_store(config)?);
    persistence.ingest(record).await?;

    info!(requirement_id = id, "requirement ingested");
    println!("✓ Ingested requirement {id}");
    Ok(())
}
