//! Test helpers for integration tests

use anyhow::{Context, Result};
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// A pnpm monorepo root with an isolated home directory
pub struct TestWorkspace {
  _root: TempDir,
  _home: TempDir,
  pub path: PathBuf,
  pub home: PathBuf,
}

impl TestWorkspace {
  /// Create a workspace declaring the given targets in the 3.x `napi` shape
  pub fn new(targets: &[&str]) -> Result<Self> {
    let root = TempDir::new()?;
    let home = TempDir::new()?;
    let path = root.path().to_path_buf();

    let ws = Self {
      path,
      home: home.path().to_path_buf(),
      _root: root,
      _home: home,
    };

    ws.write_manifest(&json!({
      "name": "@acme/core",
      "version": "0.3.0",
      "main": "index.js",
      "license": "MIT",
      "files": ["index.js", "index.d.ts"],
      "napi": {
        "binaryName": "core",
        "packageName": "@acme/core",
        "targets": targets
      }
    }))?;
    ws.install_napi_cli("3.0.0")?;
    std::fs::write(ws.path.join("LICENSE"), "MIT License\n")?;

    Ok(ws)
  }

  pub fn write_manifest(&self, manifest: &Value) -> Result<()> {
    std::fs::write(self.path.join("package.json"), serde_json::to_string_pretty(manifest)?)?;
    Ok(())
  }

  /// Pretend `@napi-rs/cli` is installed at the given version
  pub fn install_napi_cli(&self, version: &str) -> Result<()> {
    let dir = self.path.join("node_modules/@napi-rs/cli");
    std::fs::create_dir_all(&dir)?;
    std::fs::write(
      dir.join("package.json"),
      json!({ "name": "@napi-rs/cli", "version": version }).to_string(),
    )?;
    Ok(())
  }

  /// Check if a file exists
  pub fn file_exists(&self, path: &str) -> bool {
    self.path.join(path).exists()
  }

  /// Read and parse a JSON file
  pub fn read_json(&self, path: &str) -> Result<Value> {
    let content = std::fs::read_to_string(self.path.join(path)).with_context(|| format!("reading {}", path))?;
    Ok(serde_json::from_str(&content)?)
  }
}

fn monorail(ws: &TestWorkspace, args: &[&str]) -> Command {
  let mut cmd = Command::new(env!("CARGO_BIN_EXE_monorail"));
  cmd
    .current_dir(&ws.path)
    .args(args)
    .env("HOME", &ws.home)
    .env("XDG_CACHE_HOME", ws.home.join(".cache"))
    .env("MONORAIL_SKIP_WASM_OPT", "1")
    .env_remove("NPM_TOKEN")
    .env_remove("NPM_CONFIG_REGISTRY")
    .env_remove("RUST_LOG");
  cmd
}

/// Run monorail and require success
pub fn run_monorail(ws: &TestWorkspace, args: &[&str]) -> Result<Output> {
  let output = monorail(ws, args).output().context("Failed to run monorail")?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    anyhow::bail!(
      "monorail command failed: monorail {}\nstdout: {}\nstderr: {}",
      args.join(" "),
      stdout,
      stderr
    );
  }

  Ok(output)
}

/// Run monorail and require failure, returning the output for inspection
pub fn run_monorail_failing(ws: &TestWorkspace, args: &[&str]) -> Result<Output> {
  let output = monorail(ws, args).output().context("Failed to run monorail")?;

  if output.status.success() {
    anyhow::bail!(
      "monorail {} succeeded unexpectedly\nstdout: {}",
      args.join(" "),
      String::from_utf8_lossy(&output.stdout)
    );
  }

  Ok(output)
}

/// Sorted entries of a directory (empty when it does not exist)
pub fn list_dir(path: &Path) -> Vec<String> {
  let Ok(entries) = std::fs::read_dir(path) else {
    return Vec::new();
  };
  let mut names: Vec<String> = entries
    .filter_map(|e| e.ok())
    .map(|e| e.file_name().to_string_lossy().into_owned())
    .collect();
  names.sort();
  names
}
