//! pnpm workspace registration
//!
//! Only the `packages` list of `pnpm-workspace.yaml` is touched. Other keys
//! survive the rewrite, though YAML comments do not.

use crate::core::error::{RailError, RailResult, ResultExt};
use serde_yaml::{Mapping, Value};
use std::path::Path;

pub const WORKSPACE_FILE: &str = "pnpm-workspace.yaml";

const PACKAGES_KEY: &str = "packages";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
  Added,
  AlreadyPresent,
}

/// `./npm/*` and `npm/*` name the same directories
fn same_glob(a: &str, b: &str) -> bool {
  a.trim_start_matches("./") == b.trim_start_matches("./")
}

/// Append `glob` to the workspace `packages` list unless an equivalent entry exists.
///
/// The file is created when absent.
pub fn register_glob(root: &Path, glob: &str) -> RailResult<Registration> {
  let path = root.join(WORKSPACE_FILE);

  let mut doc = if path.exists() {
    let content = std::fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))?;
    match serde_yaml::from_str::<Value>(&content)? {
      Value::Null => Value::Mapping(Mapping::new()),
      value @ Value::Mapping(_) => value,
      _ => {
        return Err(RailError::message(format!(
          "{} must be a YAML mapping",
          path.display()
        )));
      }
    }
  } else {
    Value::Mapping(Mapping::new())
  };

  let Value::Mapping(map) = &mut doc else {
    return Err(RailError::message(format!("{} must be a YAML mapping", path.display())));
  };

  let packages = map
    .entry(Value::String(PACKAGES_KEY.to_string()))
    .or_insert_with(|| Value::Sequence(Vec::new()));
  if packages.is_null() {
    *packages = Value::Sequence(Vec::new());
  }
  let Value::Sequence(list) = packages else {
    return Err(RailError::message(format!(
      "`{}` in {} must be a list",
      PACKAGES_KEY,
      path.display()
    )));
  };

  if list.iter().filter_map(Value::as_str).any(|entry| same_glob(entry, glob)) {
    println!("   {} already lists {}", WORKSPACE_FILE, glob);
    return Ok(Registration::AlreadyPresent);
  }

  list.push(Value::String(glob.to_string()));
  let content = serde_yaml::to_string(&doc)?;
  std::fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;

  println!("   Registered {} in {}", glob, WORKSPACE_FILE);
  Ok(Registration::Added)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn packages(root: &Path) -> Vec<String> {
    let content = std::fs::read_to_string(root.join(WORKSPACE_FILE)).unwrap();
    let doc: Value = serde_yaml::from_str(&content).unwrap();
    doc["packages"]
      .as_sequence()
      .unwrap()
      .iter()
      .map(|v| v.as_str().unwrap().to_string())
      .collect()
  }

  #[test]
  fn test_appends_to_existing_list() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
      dir.path().join(WORKSPACE_FILE),
      "packages:\n  - packages/*\nonlyBuiltDependencies:\n  - esbuild\n",
    )
    .unwrap();

    assert_eq!(register_glob(dir.path(), "./npm/*").unwrap(), Registration::Added);
    assert_eq!(packages(dir.path()), vec!["packages/*", "./npm/*"]);

    let content = std::fs::read_to_string(dir.path().join(WORKSPACE_FILE)).unwrap();
    assert!(content.contains("onlyBuiltDependencies"));
  }

  #[test]
  fn test_second_registration_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(WORKSPACE_FILE), "packages:\n  - npm/*\n").unwrap();

    assert_eq!(
      register_glob(dir.path(), "./npm/*").unwrap(),
      Registration::AlreadyPresent
    );
    assert_eq!(packages(dir.path()), vec!["npm/*"]);
  }

  #[test]
  fn test_creates_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    register_glob(dir.path(), "./npm/*").unwrap();
    assert_eq!(packages(dir.path()), vec!["./npm/*"]);
  }

  #[test]
  fn test_rejects_non_list_packages() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(WORKSPACE_FILE), "packages: npm/*\n").unwrap();
    assert!(register_glob(dir.path(), "./npm/*").is_err());
  }
}
