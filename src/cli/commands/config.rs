//! Config command implementation

use crate::{Config, RfpError};

/// Print the effective configuration with the source of each value
pub fn execute_config_command(config: &Config) -> Result<(), RfpError> {
    println!("Effective configuration:");
    println!("========================");

    let effective = config.effective_config();
    let width = effective.keys().map(String::len).max().unwrap_or(0);
    for (key, (value, source)) in &effective {
        println!("  {key:<width$} = {value}  [{source}]");
    }
    Ok(())
}
