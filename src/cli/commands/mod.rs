//! CLI command implementations.
//!
//! Each `execute_*` function owns one subcommand and returns `RfpError` so
//! `run` can render it and pick the exit code.

mod common;
mod config;
mod feedback;
mod generate;
mod ingest;
mod json_emit;
mod show;

pub use config::execute_config_command;
pub use feedback::execute_feedback_command;
pub use generate::{execute_generate_command, execute_synthesize_command};
pub use ingest::execute_ingest_command;
pub use show::execute_show_command;
