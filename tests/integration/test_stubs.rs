//! Integration tests for `monorail stubs`

use crate::helpers::{TestWorkspace, list_dir, run_monorail, run_monorail_failing};
use anyhow::Result;
use serde_json::json;

#[test]
fn test_stubs_created_for_configured_targets() -> Result<()> {
  let ws = TestWorkspace::new(&["x86_64-unknown-linux-gnu", "aarch64-apple-darwin"])?;

  run_monorail(&ws, &["stubs"])?;
  assert_eq!(list_dir(&ws.path.join("npm")), vec!["darwin-arm64", "linux-x64-gnu"]);

  let stub = ws.read_json("npm/linux-x64-gnu/package.json")?;
  assert_eq!(stub, json!({ "os": ["linux"], "cpu": ["x64"] }));
  assert!(ws.file_exists("npm/darwin-arm64/README.md"));

  Ok(())
}

#[test]
fn test_stubs_rerun_keeps_edits() -> Result<()> {
  let ws = TestWorkspace::new(&["x86_64-unknown-linux-musl"])?;
  run_monorail(&ws, &["stubs"])?;

  let manifest = ws.path.join("npm/linux-x64-musl/package.json");
  std::fs::write(&manifest, r#"{"os":["linux"],"cpu":["x64"],"libc":["musl"]}"#)?;

  let output = run_monorail(&ws, &["stubs"])?;
  assert!(String::from_utf8_lossy(&output.stdout).contains("already exist"));
  assert_eq!(ws.read_json("npm/linux-x64-musl/package.json")?["libc"], json!(["musl"]));

  Ok(())
}

#[test]
fn test_legacy_schema_requires_defaults_false() -> Result<()> {
  let ws = TestWorkspace::new(&[])?;
  ws.install_napi_cli("2.18.4")?;
  ws.write_manifest(&json!({
    "name": "@acme/core",
    "version": "0.3.0",
    "napi": {
      "name": "core",
      "package": { "name": "@acme/core" },
      "triples": { "additional": ["x86_64-unknown-linux-gnu"] }
    }
  }))?;

  let output = run_monorail_failing(&ws, &["stubs"])?;
  assert_eq!(output.status.code(), Some(1));
  assert!(String::from_utf8_lossy(&output.stderr).contains("napi.triples.defaults"));
  assert!(!ws.file_exists("npm"));

  Ok(())
}

#[test]
fn test_legacy_schema_with_defaults_false() -> Result<()> {
  let ws = TestWorkspace::new(&[])?;
  ws.install_napi_cli("2.18.4")?;
  ws.write_manifest(&json!({
    "name": "@acme/core",
    "version": "0.3.0",
    "napi": {
      "name": "core",
      "package": { "name": "@acme/core" },
      "triples": { "defaults": false, "additional": ["aarch64-unknown-linux-gnu"] }
    }
  }))?;

  run_monorail(&ws, &["stubs"])?;
  assert_eq!(list_dir(&ws.path.join("npm")), vec!["linux-arm64-gnu"]);

  Ok(())
}

#[test]
fn test_unsupported_tool_version_exits_with_validation_code() -> Result<()> {
  let ws = TestWorkspace::new(&["x86_64-unknown-linux-gnu"])?;
  ws.install_napi_cli("1.4.0")?;

  let output = run_monorail_failing(&ws, &["stubs"])?;
  assert_eq!(output.status.code(), Some(3));
  assert!(String::from_utf8_lossy(&output.stderr).contains("1.4.0"));

  Ok(())
}
