//! CLI interface tests.
//!
//! Drives the `slatec` binary with assert_cmd and checks exit codes and
//! artifact output.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn slatec_cmd() -> Command {
    Command::cargo_bin("slatec").unwrap()
}

fn write_source(dir: &TempDir, name: &str, source: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, source).unwrap();
    path
}

const DIAMOND: &str =
    "f():i32 { x:i32 = 1; if cond { x:i32 = 2; } else { x:i32 = 3; } y:i32 = x; }";

#[test]
fn test_help_output() {
    slatec_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Slate compiler middle-end"))
        .stdout(predicate::str::contains("--dump"));
}

#[test]
fn test_version_output() {
    slatec_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("0.1.0"));
}

#[test]
fn test_compile_success_exit_code() {
    let dir = TempDir::new().unwrap();
    let path = write_source(&dir, "ok.slate", "f():i32 { x:i32 = 1; }");

    slatec_cmd()
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("1 blocks"));
}

#[test]
fn test_missing_file_fails() {
    slatec_cmd().arg("/no/such/file.slate").assert().failure();
}

#[test]
fn test_parse_error_fails() {
    let dir = TempDir::new().unwrap();
    let path = write_source(&dir, "bad.slate", "f():i32 {");

    slatec_cmd().arg(&path).assert().failure();
}

#[test]
fn test_dump_ir_shows_versioned_names() {
    let dir = TempDir::new().unwrap();
    let path = write_source(&dir, "diamond.slate", DIAMOND);

    slatec_cmd()
        .arg(&path)
        .args(["--dump", "ir"])
        .assert()
        .success()
        .stdout(predicate::str::contains("store x1"))
        .stdout(predicate::str::contains("phi("));
}

#[test]
fn test_dump_cfg_and_dominators() {
    let dir = TempDir::new().unwrap();
    let path = write_source(&dir, "diamond.slate", DIAMOND);

    slatec_cmd()
        .arg(&path)
        .args(["--dump", "cfg", "--dump", "dominators", "--dump", "frontiers"])
        .assert()
        .success()
        .stdout(predicate::str::contains("========== CFG =========="))
        .stdout(predicate::str::contains("Predecessors"))
        .stdout(predicate::str::contains("idom: none"))
        .stdout(predicate::str::contains("dominance frontier"));
}

#[test]
fn test_dump_all_includes_tokens_and_ast() {
    let dir = TempDir::new().unwrap();
    let path = write_source(&dir, "diamond.slate", DIAMOND);

    slatec_cmd()
        .arg(&path)
        .arg("--dump-all")
        .assert()
        .success()
        .stdout(predicate::str::contains("IDENT f"))
        .stdout(predicate::str::contains("VarDecl x: i32"))
        .stdout(predicate::str::contains("digraph cfg"));
}

#[test]
fn test_json_format() {
    let dir = TempDir::new().unwrap();
    let path = write_source(&dir, "ok.slate", "f():i32 { x:i32 = 1; }");

    let output = slatec_cmd()
        .arg(&path)
        .args(["--format", "json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let json: serde_json::Value = serde_json::from_slice(&output).unwrap();
    let functions = json["functions"].as_array().unwrap();
    assert_eq!(functions.len(), 1);
    assert_eq!(functions[0]["name"], "f");
    assert_eq!(functions[0]["skipped"], false);
    assert_eq!(functions[0]["blocks"], 1);
}

#[test]
fn test_empty_source_succeeds() {
    let dir = TempDir::new().unwrap();
    let path = write_source(&dir, "empty.slate", "");

    slatec_cmd().arg(&path).assert().success();
}

#[test]
fn test_config_file_enables_dumps() {
    let dir = TempDir::new().unwrap();
    let path = write_source(&dir, "ok.slate", "f():i32 { x:i32 = 1; }");
    let config = dir.path().join("slatec.toml");
    fs::write(&config, "[output]\nprint_ir = true\n").unwrap();

    slatec_cmd()
        .arg(&path)
        .args(["--config", config.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("store x0"));
}
