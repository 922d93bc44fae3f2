//! Feedback command implementation

use tracing::info;

use super::common::open_store;
use crate::{Config, PersistenceAdapter, RequirementId, RfpError, ValidationError};

/// Execute the feedback command
pub async fn execute_feedback_command(
    id: u64,
    rating: u8,
    comment: Option<String>,
    config: &Config,
) -> Result<(), RfpError> {
    if id == 0 {
        return Err(ValidationError::MissingRequirementId.into());
    }
    let persistence = PersistenceAdapter::new(open_store(config)?);
    let record = persistence
        .record_feedback(RequirementId::new(id), rating, comment)
        .await?;

    info!(requirement_id = id, rating, "feedback recorded");
    match &record.feedback {
        Some(feedback) => println!("✓ Rated requirement {id} {rating}/5: {feedback}"),
        None => println!("✓ Rated requirement {id} {rating}/5"),
    }
    Ok(())
}
