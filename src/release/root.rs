//! Root meta-package release (`--root`)
//!
//! Builds `dist/` holding the JS binding and a manifest that pulls in every
//! platform package as an optional dependency, then publishes it.

use crate::core::error::{ArtifactError, RailError, RailResult};
use crate::core::runner::CommandSpec;
use crate::napi::config::NormalizedNapiConfig;
use crate::napi::manifest::{MANIFEST_FILE, RootManifest, VENDOR_KEY, write_json};
use crate::napi::stubs;
use crate::release::artifacts::{self, LICENSE_FILE, README_FILE};
use crate::release::publish::{self, PublishTarget};
use crate::release::{PUBLISH_FIELDS, ReleaseContext};
use serde_json::{Map, Value, json};
use std::path::{Path, PathBuf};

/// Output directory for the root package
pub const ROOT_PUBLISH_DIR: &str = "dist";

/// The generated JS binding every root package must ship
pub const JS_ENTRY: &str = "index.js";

pub fn build_command(root: &Path) -> CommandSpec {
  CommandSpec::new("pnpm", root).args(["run", "build"])
}

/// `{ "<packageName>-<platformKey>": version }` for each platform with a stub on disk
pub fn optional_dependencies(root: &Path, config: &NormalizedNapiConfig, version: &str) -> Map<String, Value> {
  stubs::existing(root)
    .into_iter()
    .map(|d| {
      (
        format!("{}-{}", config.package_name, d.platform_key),
        Value::String(version.to_string()),
      )
    })
    .collect()
}

/// Derive the published manifest from the root manifest
pub fn publish_manifest(manifest: &RootManifest, optional_deps: Map<String, Value>) -> Value {
  let mut out = manifest.pick(PUBLISH_FIELDS);
  out.insert("optionalDependencies".to_string(), Value::Object(optional_deps));

  if let Some(postinstall) = manifest.postinstall() {
    out.insert("scripts".to_string(), json!({ "postinstall": postinstall }));
  }

  if let Some(vendor) = manifest.vendor() {
    for key in &vendor.keep {
      if let Some(value) = manifest.get(key) {
        out.insert(key.clone(), value.clone());
      }
    }
  }
  if let Some(block) = manifest.get(VENDOR_KEY) {
    out.insert(VENDOR_KEY.to_string(), block.clone());
  }

  Value::Object(out)
}

/// Run the root release. Returns the publish directory.
pub fn run_root_release(
  ctx: &ReleaseContext<'_>,
  manifest: &RootManifest,
  config: &NormalizedNapiConfig,
) -> RailResult<PathBuf> {
  let root = ctx.root();
  let version = manifest.version()?;
  manifest.name()?;
  let files = manifest.require_files()?;
  for file in files {
    artifacts::check_relative("files", file)?;
  }

  let entry = root.join(JS_ENTRY);
  if !entry.is_file() {
    return Err(RailError::Artifact(ArtifactError::MissingEntryPoint { path: entry }));
  }

  println!("🔨 Building {}...", config.package_name);
  ctx.runner.run(&build_command(root))?;

  let optional_deps = optional_dependencies(root, config, version);
  if optional_deps.is_empty() {
    tracing::warn!("no platform packages found under npm/; the root package will have no optionalDependencies");
  }

  let out = root.join(ROOT_PUBLISH_DIR);
  artifacts::recreate_dir(&out)?;

  write_json(&out.join(MANIFEST_FILE), &publish_manifest(manifest, optional_deps))?;

  artifacts::copy_if_present(root, LICENSE_FILE, &out)?;
  artifacts::copy_if_present(root, README_FILE, &out)?;
  for file in files {
    artifacts::copy_if_present(root, file, &out)?;
  }

  println!("📦 Assembled {}", out.display());
  publish::publish(ctx, PublishTarget::Directory(&out))?;
  Ok(out)
}
