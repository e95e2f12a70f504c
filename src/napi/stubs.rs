//! Per-platform stub packages under `<root>/npm/<platformKey>`
//!
//! A stub starts as a README and a package.json holding only the `os`/`cpu`
//! constraints. The default release path fills in the rest before publishing.

use crate::core::error::{RailResult, ResultExt};
use crate::napi::catalog::{ArchitectureDescriptor, CATALOG};
use crate::napi::manifest::{MANIFEST_FILE, write_json};
use serde_json::json;
use std::path::{Path, PathBuf};

/// Directory holding all stub packages
pub const STUB_ROOT: &str = "npm";

/// Workspace glob that covers every stub package
pub const STUB_GLOB: &str = "./npm/*";

pub fn stub_dir(root: &Path, descriptor: &ArchitectureDescriptor) -> PathBuf {
  root.join(STUB_ROOT).join(descriptor.platform_key)
}

/// Create any missing stub directory. Existing ones are left untouched.
///
/// Returns the directories that were created.
pub fn ensure_stub_directories(root: &Path, descriptors: &[&ArchitectureDescriptor]) -> RailResult<Vec<PathBuf>> {
  let mut created = Vec::new();

  for descriptor in descriptors {
    let dir = stub_dir(root, descriptor);
    if dir.exists() {
      continue;
    }

    std::fs::create_dir_all(&dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    std::fs::write(dir.join("README.md"), "").with_context(|| format!("Failed to write README in {}", dir.display()))?;
    write_json(
      &dir.join(MANIFEST_FILE),
      &json!({
        "os": descriptor.os,
        "cpu": descriptor.cpu,
      }),
    )?;

    println!("   Created {}/{}", STUB_ROOT, descriptor.platform_key);
    created.push(dir);
  }

  Ok(created)
}

/// Every catalog platform whose stub directory exists on disk, configured or not
pub fn existing(root: &Path) -> Vec<&'static ArchitectureDescriptor> {
  CATALOG.iter().filter(|d| stub_dir(root, d).is_dir()).collect()
}
