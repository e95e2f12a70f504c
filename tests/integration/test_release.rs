//! Integration tests for `monorail release`

use crate::helpers::{TestWorkspace, list_dir, run_monorail, run_monorail_failing};
use anyhow::Result;
use serde_json::json;

#[test]
fn test_wasm_and_napi_wasm_are_exclusive() -> Result<()> {
  let ws = TestWorkspace::new(&["x86_64-unknown-linux-gnu"])?;

  let output = run_monorail_failing(&ws, &["release", "--wasm", "--napi-wasm"])?;
  let stderr = String::from_utf8_lossy(&output.stderr);
  assert_eq!(output.status.code(), Some(1));
  assert!(stderr.contains("--wasm, --napi-wasm"), "stderr: {}", stderr);
  assert!(!String::from_utf8_lossy(&output.stdout).contains("$ "));
  assert!(!ws.file_exists("target"));

  Ok(())
}

#[test]
fn test_unknown_triple_changes_nothing() -> Result<()> {
  let ws = TestWorkspace::new(&["x86_64-unknown-linux-gnu", "sparc64-unknown-linux-gnu"])?;
  let before = list_dir(&ws.path);

  let output = run_monorail_failing(&ws, &["release"])?;
  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stderr.contains("sparc64-unknown-linux-gnu"));
  assert!(stderr.contains("monorail targets"));

  assert_eq!(list_dir(&ws.path), before);
  assert!(ws.read_json("package.json")?.get("private").is_none());

  Ok(())
}

#[test]
fn test_root_release_requires_files() -> Result<()> {
  let ws = TestWorkspace::new(&["x86_64-unknown-linux-gnu"])?;
  ws.write_manifest(&json!({
    "name": "@acme/core",
    "version": "0.3.0",
    "files": [],
    "napi": { "binaryName": "core", "packageName": "@acme/core", "targets": ["x86_64-unknown-linux-gnu"] }
  }))?;
  std::fs::write(ws.path.join("index.js"), "module.exports = require('./core.node')\n")?;

  let output = run_monorail_failing(&ws, &["release", "--root"])?;
  assert!(String::from_utf8_lossy(&output.stderr).contains("files"));
  assert!(!ws.file_exists("dist"));

  Ok(())
}

#[test]
fn test_wasm_opt_with_no_wasm_files() -> Result<()> {
  let ws = TestWorkspace::new(&["x86_64-unknown-linux-gnu"])?;
  std::fs::create_dir_all(ws.path.join("pkg"))?;
  std::fs::write(ws.path.join("pkg/core.js"), "")?;

  let output = run_monorail(&ws, &["release", "--wasm-opt", "pkg"])?;
  assert!(String::from_utf8_lossy(&output.stdout).contains("0 file(s) optimized"));
  assert!(list_dir(&ws.home).iter().all(|name| name != ".npmrc"));

  Ok(())
}

#[test]
fn test_missing_manifest_is_reported() -> Result<()> {
  let ws = TestWorkspace::new(&[])?;
  std::fs::remove_file(ws.path.join("package.json"))?;

  let output = run_monorail_failing(&ws, &["release", "--wasm-web"])?;
  assert_eq!(output.status.code(), Some(1));
  assert!(String::from_utf8_lossy(&output.stderr).contains("package.json"));

  Ok(())
}
