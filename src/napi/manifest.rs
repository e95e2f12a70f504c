//! Root package.json access
//!
//! The manifest is kept twice: as the raw JSON object (insertion order
//! preserved) for field selection and lossless rewrites, and as a typed view of
//! the fields release logic reads. Every field is optional in the typed view;
//! accessors turn absence into a `ConfigError` naming the field.

use crate::core::error::{ConfigError, RailError, RailResult, ResultExt};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const MANIFEST_FILE: &str = "package.json";

/// Vendor extension key in package.json
pub const VENDOR_KEY: &str = "monorail";

/// `monorail` block in the root package.json
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorBlock {
  /// Extra top-level keys to propagate into published manifests
  #[serde(default)]
  pub keep: Vec<String>,
  /// Name override for the wasm (node / napi-wasm) package
  #[serde(default)]
  pub wasm_package_name: Option<String>,
  /// Name override for the wasm-web package
  #[serde(default)]
  pub wasm_web_package_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Repository {
  Url(String),
  Object {
    #[serde(default)]
    url: Option<String>,
  },
}

/// Typed view of the root manifest fields monorail reads
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestFields {
  pub name: Option<String>,
  pub version: Option<String>,
  pub main: Option<String>,
  pub repository: Option<Repository>,
  pub files: Option<Vec<String>>,
  pub scripts: Option<BTreeMap<String, String>>,
  pub dependencies: Option<BTreeMap<String, String>>,
  pub private: Option<bool>,
  pub monorail: Option<VendorBlock>,
  pub napi: Option<Value>,
}

/// The consuming package's manifest
#[derive(Debug, Clone)]
pub struct RootManifest {
  path: PathBuf,
  raw: Map<String, Value>,
  fields: ManifestFields,
}

impl RootManifest {
  /// Load `<root>/package.json`
  pub fn load(root: &Path) -> RailResult<Self> {
    let path = root.join(MANIFEST_FILE);
    let raw = read_json_object(&path)?;
    Self::from_object(path, raw)
  }

  fn from_object(path: PathBuf, raw: Map<String, Value>) -> RailResult<Self> {
    let fields: ManifestFields = serde_json::from_value(Value::Object(raw.clone())).map_err(|e| {
      RailError::Config(ConfigError::Parse {
        path: path.clone(),
        reason: e.to_string(),
      })
    })?;
    Ok(Self { path, raw, fields })
  }

  /// Build a manifest from an in-memory value (not backed by a file)
  #[cfg(test)]
  pub fn from_value(value: Value) -> RailResult<Self> {
    match value {
      Value::Object(raw) => Self::from_object(PathBuf::from(MANIFEST_FILE), raw),
      _ => Err(RailError::message("manifest must be a JSON object")),
    }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  pub fn name(&self) -> RailResult<&str> {
    non_empty(self.fields.name.as_deref()).ok_or_else(|| RailError::missing_field("name"))
  }

  pub fn version(&self) -> RailResult<&str> {
    non_empty(self.fields.version.as_deref()).ok_or_else(|| RailError::missing_field("version"))
  }

  pub fn main(&self) -> Option<&str> {
    self.fields.main.as_deref()
  }

  /// Published file list (empty when absent)
  pub fn files(&self) -> &[String] {
    self.fields.files.as_deref().unwrap_or_default()
  }

  /// Published file list, which must be non-empty
  pub fn require_files(&self) -> RailResult<&[String]> {
    let files = self.files();
    if files.is_empty() {
      return Err(RailError::missing_field("files"));
    }
    Ok(files)
  }

  pub fn postinstall(&self) -> Option<&str> {
    self
      .fields
      .scripts
      .as_ref()
      .and_then(|s| s.get("postinstall"))
      .map(String::as_str)
  }

  pub fn dependency(&self, name: &str) -> Option<&str> {
    self
      .fields
      .dependencies
      .as_ref()
      .and_then(|d| d.get(name))
      .map(String::as_str)
  }

  pub fn repository_url(&self) -> Option<&str> {
    match self.fields.repository.as_ref()? {
      Repository::Url(url) => Some(url),
      Repository::Object { url } => url.as_deref(),
    }
  }

  pub fn vendor(&self) -> Option<&VendorBlock> {
    self.fields.monorail.as_ref()
  }

  /// Raw `napi` block, if declared
  pub fn napi(&self) -> Option<&Value> {
    self.fields.napi.as_ref()
  }

  pub fn get(&self, key: &str) -> Option<&Value> {
    self.raw.get(key)
  }

  /// Copy the listed top-level keys that are present, in the order given
  pub fn pick(&self, keys: &[&str]) -> Map<String, Value> {
    let mut out = Map::new();
    for key in keys {
      if let Some(value) = self.raw.get(*key) {
        out.insert((*key).to_string(), value.clone());
      }
    }
    out
  }

  /// Set `"private": true` and persist, leaving every other key untouched
  pub fn mark_private(&mut self) -> RailResult<()> {
    self.raw.insert("private".to_string(), Value::Bool(true));
    self.fields.private = Some(true);
    write_json(&self.path, &Value::Object(self.raw.clone()))
  }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
  value.filter(|v| !v.trim().is_empty())
}

/// Read a JSON file that must contain an object
pub fn read_json_object(path: &Path) -> RailResult<Map<String, Value>> {
  if !path.exists() {
    return Err(RailError::Config(ConfigError::NotFound {
      path: path.to_path_buf(),
    }));
  }

  let content = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
  let value: Value = serde_json::from_str(&content).map_err(|e| {
    RailError::Config(ConfigError::Parse {
      path: path.to_path_buf(),
      reason: e.to_string(),
    })
  })?;

  match value {
    Value::Object(map) => Ok(map),
    _ => Err(RailError::Config(ConfigError::Parse {
      path: path.to_path_buf(),
      reason: "expected a JSON object".to_string(),
    })),
  }
}

/// Write pretty JSON with a trailing newline
pub fn write_json(path: &Path, value: &Value) -> RailResult<()> {
  let mut content = serde_json::to_string_pretty(value)?;
  content.push('\n');
  std::fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}
