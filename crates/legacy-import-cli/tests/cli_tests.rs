//! CLI integration tests for legacy-import.
//!
//! These tests verify command-line argument parsing, help output,
//! and exit codes for configuration error conditions.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;

/// Get a command for the legacy-import binary.
fn cmd() -> Command {
    Command::cargo_bin("legacy-import").unwrap()
}

// =============================================================================
// Help and Version Tests
// =============================================================================

#[test]
fn test_help_shows_all_commands() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("list-importers"))
        .stdout(predicate::str::contains("health-check"));
}

#[test]
fn test_run_subcommand_help() {
    cmd()
        .args(["run", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--dry-run"))
        .stdout(predicate::str::contains("--limit"))
        .stdout(predicate::str::contains("--log-file"))
        .stdout(predicate::str::contains("--only"))
        .stdout(predicate::str::contains("--start-at"))
        .stdout(predicate::str::contains("--stop-at"));
}

#[test]
fn test_version_flag() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("legacy-import"));
}

// =============================================================================
// Global Flags Tests
// =============================================================================

#[test]
fn test_output_json_flag_exists() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--output-json"));
}

#[test]
fn test_tracker_file_flag_exists() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--tracker-file"));
}

#[test]
fn test_log_format_flag_exists() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--log-format"))
        .stdout(predicate::str::contains("[default: text]"));
}

#[test]
fn test_verbosity_flag_exists() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--verbosity"))
        .stdout(predicate::str::contains("[default: info]"));
}

// =============================================================================
// Exit Code Tests - Config Errors
// =============================================================================

#[test]
fn test_missing_config_fails() {
    cmd()
        .args(["--config", "nonexistent_config_file.yaml", "list-importers"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("nonexistent_config_file.yaml"));
}

#[test]
fn test_invalid_yaml_fails() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "invalid: yaml: content: [").unwrap();

    cmd()
        .args(["--config", file.path().to_str().unwrap(), "list-importers"])
        .assert()
        .code(1);
}

#[test]
fn test_missing_required_fields_fails() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "legacy:").unwrap();
    writeln!(file, "  host: db.example.org").unwrap();

    cmd()
        .args(["--config", file.path().to_str().unwrap(), "list-importers"])
        .assert()
        .code(1);
}

#[test]
fn test_incomplete_config_names_missing_fields() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "legacy:").unwrap();
    writeln!(file, "  host: db.example.org").unwrap();
    writeln!(file, "  user: importer").unwrap();
    writeln!(file, "  database: mwnf3").unwrap();
    writeln!(file, "target:").unwrap();
    writeln!(file, "  base_url: ftp://inventory.example.org").unwrap();
    writeln!(file, "  token: tok").unwrap();

    cmd()
        .args(["--config", file.path().to_str().unwrap(), "list-importers"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("base_url"));
}

// =============================================================================
// list-importers Tests
// =============================================================================

fn write_valid_config(variant: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "legacy:").unwrap();
    writeln!(file, "  host: db.example.org").unwrap();
    writeln!(file, "  user: importer").unwrap();
    writeln!(file, "  password: secret").unwrap();
    writeln!(file, "  database: mwnf3").unwrap();
    writeln!(file, "  variant: {variant}").unwrap();
    writeln!(file, "target:").unwrap();
    writeln!(file, "  base_url: https://inventory.example.org").unwrap();
    writeln!(file, "  token: tok-123").unwrap();
    file
}

#[test]
fn test_list_importers_mwnf3_order() {
    let file = write_valid_config("mwnf3");

    cmd()
        .args(["--config", file.path().to_str().unwrap(), "list-importers"])
        .assert()
        .success()
        .stdout(predicate::str::contains("languages"))
        .stdout(predicate::str::contains("countries"))
        .stdout(predicate::str::contains("projects"))
        .stdout(predicate::str::contains("partners"))
        .stdout(predicate::str::contains("objects"))
        .stdout(predicate::str::contains("monuments"));
}

#[test]
fn test_list_importers_sharing_history() {
    let file = write_valid_config("mwnf3_sharing_history");

    cmd()
        .args(["--config", file.path().to_str().unwrap(), "list-importers"])
        .assert()
        .success()
        .stdout(predicate::str::contains("sh-partners"))
        .stdout(predicate::str::contains("sh-objects"))
        .stdout(predicate::str::contains("sh-monuments"));
}

// =============================================================================
// Subcommand Existence Tests
// =============================================================================

#[test]
fn test_health_check_command_exists() {
    cmd()
        .args(["health-check", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("connectivity"));
}

#[test]
fn test_config_default_path() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("[default: config.yaml]"));
}

#[test]
fn test_no_subcommand_shows_help() {
    cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage:"));
}
