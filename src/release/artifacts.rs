//! Release directory helpers
//!
//! Publish directories are always rebuilt from scratch so nothing from an
//! earlier run ends up in a tarball.

use crate::core::error::{ArtifactError, RailError, RailResult, ResultExt};
use std::path::{Component, Path, PathBuf};

pub const LICENSE_FILE: &str = "LICENSE";
pub const README_FILE: &str = "README.md";

/// Delete `dir` if present and create it empty
pub fn recreate_dir(dir: &Path) -> RailResult<()> {
  if dir.exists() {
    std::fs::remove_dir_all(dir).with_context(|| format!("Failed to remove {}", dir.display()))?;
  }
  std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))
}

/// Copy a file or a directory tree to `dest`
pub fn copy_entry(src: &Path, dest: &Path) -> RailResult<()> {
  if src.is_dir() {
    std::fs::create_dir_all(dest).with_context(|| format!("Failed to create {}", dest.display()))?;
    for entry in std::fs::read_dir(src)? {
      let entry = entry?;
      copy_entry(&entry.path(), &dest.join(entry.file_name()))?;
    }
    return Ok(());
  }

  if let Some(parent) = dest.parent() {
    std::fs::create_dir_all(parent).with_context(|| format!("Failed to create {}", parent.display()))?;
  }
  std::fs::copy(src, dest).with_context(|| format!("Failed to copy {} to {}", src.display(), dest.display()))?;
  Ok(())
}

/// Reject `field` entries that would resolve outside the root or the publish dir
pub fn check_relative(field: &str, rel: &str) -> RailResult<()> {
  let path = Path::new(rel);
  if rel.is_empty() || path.has_root() {
    return Err(RailError::invalid_field(
      field,
      format!("`{}` must be a path relative to the package root", rel),
    ));
  }
  if path.components().any(|c| !matches!(c, Component::Normal(_) | Component::CurDir)) {
    return Err(RailError::invalid_field(
      field,
      format!("`{}` must not leave the package root", rel),
    ));
  }
  Ok(())
}

/// Copy `<root>/<rel>` into `<out>/<rel>`, warning when it does not exist.
///
/// Returns whether anything was copied.
pub fn copy_if_present(root: &Path, rel: &str, out: &Path) -> RailResult<bool> {
  let src = root.join(rel);
  if !src.exists() {
    tracing::warn!("{} not found, skipping", rel);
    return Ok(false);
  }
  copy_entry(&src, &out.join(rel))?;
  Ok(true)
}

/// Path of the root LICENSE, which must exist
pub fn require_license(root: &Path) -> RailResult<PathBuf> {
  let license = root.join(LICENSE_FILE);
  if !license.is_file() {
    return Err(RailError::Artifact(ArtifactError::MissingLicense { path: license }));
  }
  Ok(license)
}

/// Sorted file names directly inside `dir`
pub fn list_files(dir: &Path) -> RailResult<Vec<String>> {
  let mut names = Vec::new();
  for entry in std::fs::read_dir(dir).with_context(|| format!("Failed to read {}", dir.display()))? {
    let entry = entry?;
    if entry.file_type()?.is_file()
      && let Some(name) = entry.file_name().to_str()
    {
      names.push(name.to_string());
    }
  }
  names.sort();
  Ok(names)
}
