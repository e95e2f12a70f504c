//! Integration tests for `monorail targets`

use crate::helpers::{TestWorkspace, run_monorail, run_monorail_failing};
use anyhow::Result;
use std::collections::BTreeSet;

#[test]
fn test_targets_json_lists_distinct_triples() -> Result<()> {
  let ws = TestWorkspace::new(&["x86_64-unknown-linux-gnu"])?;

  let output = run_monorail(&ws, &["targets", "--json"])?;
  let catalog: serde_json::Value = serde_json::from_slice(&output.stdout)?;
  let entries = catalog.as_array().expect("catalog should be an array");
  assert_eq!(entries.len(), 9);

  let triples: BTreeSet<&str> = entries.iter().filter_map(|e| e["triple"].as_str()).collect();
  assert_eq!(triples.len(), entries.len(), "triples must be distinct");
  assert!(triples.contains("aarch64-apple-darwin"));

  let first = &entries[0];
  assert!(first["platform_key"].is_string());
  assert!(first["os"].is_array());
  assert!(first["cpu"].is_array());

  Ok(())
}

#[test]
fn test_targets_text_output() -> Result<()> {
  let ws = TestWorkspace::new(&[])?;

  let output = run_monorail(&ws, &["targets"])?;
  let stdout = String::from_utf8_lossy(&output.stdout);
  assert!(stdout.contains("linux-x64-musl"));
  assert!(stdout.contains("x86_64-pc-windows-msvc"));

  Ok(())
}

#[test]
fn test_targets_single_platform() -> Result<()> {
  let ws = TestWorkspace::new(&[])?;

  let output = run_monorail(&ws, &["targets", "darwin-arm64", "--json"])?;
  let entry: serde_json::Value = serde_json::from_slice(&output.stdout)?;
  assert_eq!(entry["triple"], "aarch64-apple-darwin");

  let output = run_monorail_failing(&ws, &["targets", "darwin-sparc"])?;
  assert_eq!(output.status.code(), Some(1));
  assert!(String::from_utf8_lossy(&output.stderr).contains("darwin-sparc"));

  Ok(())
}
