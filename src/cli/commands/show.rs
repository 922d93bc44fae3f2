//! Show command implementation

use super::common::{open_store, print_record, reference_lines};
use super::json_emit::{print_json, record_json};
use crate::{Config, PersistenceAdapter, RequirementId, RfpError, ValidationError};

/// Execute the show command
pub async fn execute_show_command(id: u64, json: bool, config: &Config) -> Result<(), RfpError> {
    if id == 0 {
        return Err(ValidationError::MissingRequirementId.into());
    }
    let id = RequirementId::new(id);
    let persistence = PersistenceAdapter::new(open_store(config)?);

    let Some(record) = persistence.get(id).await? else {
        return Err(ValidationError::UnknownRequirement { id }.into());
    };
    let references = persistence.references(id).await?;

    if json {
        print_json(&record_json(&record, &references))?;
        return Ok(());
    }

    print_record(&record);
    if references.is_empty() {
        println!("  References: none");
    } else {
        println!("  References:");
        for line in reference_lines(&references) {
            println!("{line}");
        }
    }
    Ok(())
}
