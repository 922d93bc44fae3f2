//! CLI entry point and dispatch logic
//!
//! This module owns the `run()` function which:
//! - Parses CLI arguments
//! - Builds CliArgs and discovers Config
//! - Creates the tokio runtime
//! - Dispatches to command handlers
//! - Handles all error output

use clap::Parser;

use super::args::{Cli, Commands};
use super::commands;

use crate::{CliArgs, Config, ConfigError, ExitCode, RfpError};
use rfpgen_utils::logging::init_tracing;

/// Main CLI execution function.
///
/// Prints all output including errors and returns the exit code on failure;
/// `main` only maps it to the process exit status.
pub fn run() -> Result<(), ExitCode> {
    let cli = Cli::parse();

    if let Err(e) = init_tracing(cli.verbose) {
        eprintln!("✗ Failed to initialize logging: {e}");
    }

    let (no_auto_continue, deadline_secs) = match &cli.command {
        Commands::Generate {
            no_auto_continue,
            deadline_secs,
            ..
        } => (*no_auto_continue, *deadline_secs),
        _ => (false, None),
    };

    let cli_args = CliArgs {
        config_path: cli.config.clone(),
        data_dir: cli.data_dir.clone(),
        auto_continue: no_auto_continue.then_some(false),
        deadline_secs,
        retrieval_endpoint: None,
    };

    let config = match Config::discover(&cli_args) {
        Ok(config) => config,
        Err(err) => {
            let err = match err.downcast::<ConfigError>() {
                Ok(config_err) => RfpError::Config(config_err),
                Err(other) => RfpError::Config(ConfigError::DiscoveryFailed {
                    reason: format!("{other:#}"),
                }),
            };
            eprintln!("{}", err.display_for_user());
            return Err(err.to_exit_code());
        }
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("✗ Failed to create async runtime: {e}");
            return Err(ExitCode::INTERNAL);
        }
    };

    let result = rt.block_on(async {
        match cli.command {
            Commands::Ingest {
                id,
                text,
                category,
                label,
                uploaded_by,
            } => commands::execute_ingest_command(id, text, category, label, uploaded_by, &config).await,
            Commands::Generate {
                id,
                mode,
                text,
                json,
                ..
            } => commands::execute_generate_command(id, mode, text, json, &config).await,
            Commands::Synthesize { id, json } => {
                commands::execute_synthesize_command(id, json, &config).await
            }
            Commands::Show { id, json } => commands::execute_show_command(id, json, &config).await,
            Commands::Feedback {
                id,
                rating,
                comment,
            } => commands::execute_feedback_command(id, rating, comment, &config).await,
            Commands::Config => commands::execute_config_command(&config),
        }
    });

    if let Err(error) = result {
        eprintln!("{}", error.display_for_user());
        return Err(error.to_exit_code());
    }

    Ok(())
}
