//! CLI argument definitions and parsing structures
//!
//! This module defines the command-line interface structure using clap,
//! including the main `Cli` struct and the `Commands` subcommand enum.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::GenerationMode;

/// rfpgen - multi-provider RFP response generation
#[derive(Parser, Debug)]
#[command(name = "rfpgen")]
#[command(about = "Generate RFP responses from several LLM providers and synthesize the best answer")]
#[command(long_about = r#"
rfpgen answers RFP requirement lines with several language-model providers,
grounds each prompt in similar historical answers, and merges the individual
answers into one final response.

EXAMPLES:
  # Register a requirement
  rfpgen ingest 113 --text "Supports single sign-on via SAML 2.0" --category Security

  # Ask every provider and synthesize a final answer
  rfpgen generate 113

  # Ask only one provider
  rfpgen generate 113 --mode anthropic

  # Run Phase 1 now, synthesize later
  rfpgen generate 113 --no-auto-continue
  rfpgen synthesize 113

  # Inspect and rate the result
  rfpgen show 113 --json
  rfpgen feedback 113 --rating 4 --comment "Accurate"

CONFIGURATION:
  Configuration is loaded with precedence: CLI flags > config file > defaults
  Config file is $RFPGEN_HOME/config.toml, or .rfpgen/config.toml found by
  searching upward from the current directory
  Use --config to specify an explicit config file path
"#)]
#[command(version)]
pub struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding requirement records (overrides [storage] data_dir)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Register a requirement so it can be generated
    Ingest {
        /// Requirement id (positive integer)
        id: u64,

        /// Requirement text
        #[arg(long)]
        text: String,

        /// Functional category, quoted in prompts
        #[arg(long)]
        category: Option<String>,

        /// RFP label, e.g. the customer or tender name
        #[arg(long)]
        label: Option<String>,

        /// Who uploaded the requirement
        #[arg(long)]
        uploaded_by: Option<String>,
    },

    /// Generate a response for a requirement
    Generate {
        /// Requirement id
        id: u64,

        /// openai, anthropic, deepseek or synthesis (aliases: openAI, claude, moa)
        #[arg(long, default_value = "synthesis")]
        mode: GenerationMode,

        /// Use this text instead of the stored requirement text
        #[arg(long)]
        text: Option<String>,

        /// Stop after Phase 1 even when synthesis is ready
        #[arg(long)]
        no_auto_continue: bool,

        /// Give up on provider calls after this many seconds
        #[arg(long)]
        deadline_secs: Option<u64>,

        /// Output result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Combine stored Phase 1 answers into a final response
    Synthesize {
        /// Requirement id
        id: u64,

        /// Output result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a requirement record and its references
    Show {
        /// Requirement id
        id: u64,

        /// Output record as JSON
        #[arg(long)]
        json: bool,
    },

    /// Rate a generated response
    Feedback {
        /// Requirement id
        id: u64,

        /// Rating from 1 to 5
        #[arg(long)]
        rating: u8,

        /// Free-text reviewer comment
        #[arg(long)]
        comment: Option<String>,
    },

    /// Show the effective configuration and where each value came from
    Config,
}

/// Build the clap command, for help rendering and tests
#[must_use]
pub fn build_cli() -> clap::Command {
    <Cli as clap::CommandFactory>::command()
}
