//! Default release path: per-platform packages
//!
//! Configured targets get a stub under `npm/` if they lack one, then every
//! stub on disk is patched into a publishable package. The stubs are then registered as workspace members,
//! the root is marked private so it is not published alongside them, and the
//! workspace publish picks up everything else.

use crate::core::error::RailResult;
use crate::core::runner::CommandSpec;
use crate::napi::catalog::{self, ArchitectureDescriptor};
use crate::napi::config::NormalizedNapiConfig;
use crate::napi::manifest::{MANIFEST_FILE, RootManifest, read_json_object, write_json};
use crate::napi::stubs::{self, STUB_GLOB};
use crate::release::artifacts::{self, LICENSE_FILE, README_FILE};
use crate::release::publish::{self, PublishTarget};
use crate::release::workspace::{self, Registration};
use crate::release::ReleaseContext;
use serde_json::{Value, json};
use std::path::{Path, PathBuf};

/// Root fields every platform package inherits verbatim
pub const SHARED_FIELDS: &[&str] = &["author", "homepage", "repository", "engines", "license", "publishConfig"];

pub fn install_command(root: &Path) -> CommandSpec {
  CommandSpec::new("pnpm", root).args(["install", "--no-frozen-lockfile"])
}

/// Compiled addon file shipped by a platform package
pub fn binary_file(config: &NormalizedNapiConfig, descriptor: &ArchitectureDescriptor) -> String {
  format!("{}.{}.node", config.binary_name, descriptor.platform_key)
}

fn readme(name: &str, descriptor: &ArchitectureDescriptor, manifest: &RootManifest, package_name: &str) -> String {
  let mut out = format!(
    "# `{}`\n\nThis is the **{}** binary for `{}`\n",
    name, descriptor.triple, package_name
  );
  if let Some(url) = manifest.repository_url() {
    out.push_str(&format!("\nSource: {}\n", url));
  }
  out
}

/// Fill in one stub's manifest, LICENSE and README. Returns the package name.
pub fn patch_subpackage(
  root: &Path,
  manifest: &RootManifest,
  config: &NormalizedNapiConfig,
  descriptor: &ArchitectureDescriptor,
  license: &Path,
) -> RailResult<String> {
  let dir = stubs::stub_dir(root, descriptor);
  let manifest_path = dir.join(MANIFEST_FILE);
  let mut stub = if manifest_path.exists() {
    read_json_object(&manifest_path)?
  } else {
    serde_json::Map::new()
  };

  let name = format!("{}-{}", config.package_name, descriptor.platform_key);
  let main = binary_file(config, descriptor);

  stub.insert("name".to_string(), json!(name));
  stub.insert("description".to_string(), json!(descriptor.description));
  stub.insert("version".to_string(), json!(manifest.version()?));
  stub.insert("main".to_string(), json!(main));
  stub.insert("files".to_string(), json!([main]));
  stub.extend(manifest.pick(SHARED_FIELDS));
  stub.entry("os").or_insert_with(|| json!(descriptor.os));
  stub.entry("cpu").or_insert_with(|| json!(descriptor.cpu));

  artifacts::copy_entry(license, &dir.join(LICENSE_FILE))?;
  std::fs::write(
    dir.join(README_FILE),
    readme(&name, descriptor, manifest, &config.package_name),
  )?;
  write_json(&manifest_path, &Value::Object(stub))?;

  Ok(name)
}

/// Patch, register and publish the per-platform packages
pub fn run_default_release(
  ctx: &ReleaseContext<'_>,
  manifest: &mut RootManifest,
  config: &NormalizedNapiConfig,
) -> RailResult<Vec<PathBuf>> {
  let root = ctx.root();
  manifest.version()?;
  let license = artifacts::require_license(root)?;

  let descriptors = catalog::descriptors_for(&config.targets);
  stubs::ensure_stub_directories(root, &descriptors)?;

  println!("🩹 Patching platform packages...");
  let mut patched = Vec::new();
  for descriptor in stubs::existing(root) {
    let name = patch_subpackage(root, manifest, config, descriptor, &license)?;
    println!("   ✅ {}", name);
    patched.push(stubs::stub_dir(root, descriptor));
  }

  if workspace::register_glob(root, STUB_GLOB)? == Registration::AlreadyPresent {
    tracing::debug!("workspace glob already registered");
  }

  manifest.mark_private()?;
  println!("   Marked {} private", manifest.path().display());

  ctx.runner.run(&install_command(root))?;
  publish::publish(ctx, PublishTarget::Workspace)?;

  Ok(patched)
}
