//! Exit code alignment for the rfpgen binary
//!
//! Runs the real binary in a scratch directory with no config file and no
//! provider credentials, so nothing reaches the network.

use serde_json::Value;
use std::process::{Command, Output};
use tempfile::TempDir;

fn rfpgen(args: &[&str], temp_dir: &TempDir) -> Output {
    Command::new(env!("CARGO_BIN_EXE_rfpgen"))
        .args(args)
        .arg("--data-dir")
        .arg(temp_dir.path().join("data"))
        .current_dir(temp_dir.path())
        .env_remove("RFPGEN_HOME")
        .env_remove("OPENAI_API_KEY")
        .env_remove("ANTHROPIC_API_KEY")
        .env_remove("DEEPSEEK_API_KEY")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute rfpgen")
}

fn exit_code(output: &Output) -> i32 {
    output.status.code().unwrap_or(-1)
}

#[test]
fn test_ingest_show_feedback_succeed() {
    let temp_dir = TempDir::new().unwrap();

    let ingest = rfpgen(
        &["ingest", "12", "--text", "Supports SAML SSO", "--category", "Security"],
        &temp_dir,
    );
    assert_eq!(exit_code(&ingest), 0, "{}", String::from_utf8_lossy(&ingest.stderr));

    let feedback = rfpgen(&["feedback", "12", "--rating", "3", "--comment", "Too short"], &temp_dir);
    assert_eq!(exit_code(&feedback), 0);

    let show = rfpgen(&["show", "12", "--json"], &temp_dir);
    assert_eq!(exit_code(&show), 0);
    let json: Value = serde_json::from_slice(&show.stdout).unwrap();
    assert_eq!(json["record"]["id"], 12);
    assert_eq!(json["record"]["category"], "Security");
    assert_eq!(json["record"]["rating"], 3);
    assert_eq!(json["record"]["feedback"], "Too short");
    assert_eq!(json["synthesis_pending"], false);
}

#[test]
fn test_unknown_requirement_exits_with_cli_args_code() {
    let temp_dir = TempDir::new().unwrap();
    let output = rfpgen(&["show", "404"], &temp_dir);
    assert_eq!(exit_code(&output), 2);
    assert!(String::from_utf8_lossy(&output.stderr).contains("404"));
}

#[test]
fn test_rating_out_of_range_exits_with_cli_args_code() {
    let temp_dir = TempDir::new().unwrap();
    rfpgen(&["ingest", "1", "--text", "Exports PDF"], &temp_dir);
    let output = rfpgen(&["feedback", "1", "--rating", "9"], &temp_dir);
    assert_eq!(exit_code(&output), 2);
}

#[test]
fn test_unknown_mode_is_a_usage_error() {
    let temp_dir = TempDir::new().unwrap();
    let output = rfpgen(&["generate", "1", "--mode", "gpt-5"], &temp_dir);
    assert_eq!(exit_code(&output), 2);
}

#[test]
fn test_generate_without_credentials_exhausts_providers() {
    let temp_dir = TempDir::new().unwrap();
    rfpgen(&["ingest", "7", "--text", "Supports SCIM"], &temp_dir);

    let output = rfpgen(&["generate", "7"], &temp_dir);
    assert_eq!(exit_code(&output), 70, "{}", String::from_utf8_lossy(&output.stderr));

    // nothing was written on failure
    let show = rfpgen(&["show", "7", "--json"], &temp_dir);
    let json: Value = serde_json::from_slice(&show.stdout).unwrap();
    assert!(json["record"]["final_response"].is_null());
    assert!(json["record"]["openai_response"].is_null());
}

#[test]
fn test_missing_explicit_config_file() {
    let temp_dir = TempDir::new().unwrap();
    let output = rfpgen(&["config", "--config", "does-not-exist.toml"], &temp_dir);
    assert_eq!(exit_code(&output), 2);
}
