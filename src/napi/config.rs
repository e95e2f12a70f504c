//! Native-binding configuration normalization
//!
//! package.json carries the `napi` block in one of two shapes depending on the
//! installed `@napi-rs/cli` major version:
//!
//! ```json
//! // 2.x
//! "napi": { "name": "core", "package": { "name": "@acme/core" },
//!           "triples": { "defaults": false, "additional": ["x86_64-unknown-linux-gnu"] } }
//! // 3.x
//! "napi": { "binaryName": "core", "packageName": "@acme/core",
//!           "targets": ["x86_64-unknown-linux-gnu"] }
//! ```
//!
//! Both are resolved once into [`NormalizedNapiConfig`]; nothing downstream
//! looks at the schema version again.

use crate::core::error::{ConfigError, EnvironmentError, RailError, RailResult};
use crate::napi::catalog;
use crate::napi::manifest::{RootManifest, read_json_object};
use semver::Version;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

/// Where the native build tool's own manifest lives, relative to the root
const NAPI_CLI_MANIFEST: &str = "node_modules/@napi-rs/cli/package.json";

const LEGACY_KEYS: &[&str] = &["name", "package", "triples"];
const CURRENT_KEYS: &[&str] = &["binaryName", "packageName", "targets"];

/// The single shape every release mode works from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedNapiConfig {
  /// Prefix of the compiled `.node` file (`<binaryName>.<platform>.node`)
  pub binary_name: String,
  /// npm name prefix of the per-platform packages
  pub package_name: String,
  /// Declared target triples, in declaration order
  pub targets: Vec<String>,
}

/// Which `napi` block shape to expect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaVersion {
  /// `@napi-rs/cli` 2.x
  Legacy,
  /// `@napi-rs/cli` 3.x
  Current,
}

impl SchemaVersion {
  pub fn from_tool_version(version: &Version) -> RailResult<Self> {
    match version.major {
      2 => Ok(SchemaVersion::Legacy),
      3 => Ok(SchemaVersion::Current),
      _ => Err(RailError::Environment(EnvironmentError::UnsupportedToolVersion {
        found: Some(version.to_string()),
      })),
    }
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LegacyPackage {
  pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LegacyTriples {
  pub defaults: Option<bool>,
  pub additional: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LegacyShape {
  pub name: Option<String>,
  pub package: Option<LegacyPackage>,
  pub triples: Option<LegacyTriples>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentShape {
  pub binary_name: Option<String>,
  pub package_name: Option<String>,
  pub targets: Option<Vec<String>>,
}

/// The `napi` block, parsed according to the detected schema version
#[derive(Debug, Clone)]
pub enum NapiShape {
  Legacy(LegacyShape),
  Current(CurrentShape),
}

impl NapiShape {
  /// Parse the raw block, rejecting keys that belong to the other shape
  pub fn parse(value: &Value, schema: SchemaVersion) -> RailResult<Self> {
    let object = value
      .as_object()
      .ok_or_else(|| RailError::invalid_field("napi", "expected an object"))?;

    let (foreign, expected) = match schema {
      SchemaVersion::Legacy => (CURRENT_KEYS, "2.x"),
      SchemaVersion::Current => (LEGACY_KEYS, "3.x"),
    };
    let mixed: Vec<&str> = foreign.iter().copied().filter(|k| object.contains_key(*k)).collect();
    if !mixed.is_empty() {
      return Err(RailError::invalid_field(
        "napi",
        format!(
          "keys {} do not belong to the @napi-rs/cli {} schema",
          mixed.join(", "),
          expected
        ),
      ));
    }

    let shape = match schema {
      SchemaVersion::Legacy => NapiShape::Legacy(
        serde_json::from_value(value.clone()).map_err(|e| RailError::invalid_field("napi", e.to_string()))?,
      ),
      SchemaVersion::Current => NapiShape::Current(
        serde_json::from_value(value.clone()).map_err(|e| RailError::invalid_field("napi", e.to_string()))?,
      ),
    };
    Ok(shape)
  }

  /// Reconcile into the normalized form, failing on the first missing field
  pub fn normalize(self) -> RailResult<NormalizedNapiConfig> {
    match self {
      NapiShape::Legacy(legacy) => {
        let binary_name = required(legacy.name, "napi.name")?;
        let package_name = required(legacy.package.and_then(|p| p.name), "napi.package.name")?;
        let triples = legacy.triples.ok_or_else(|| RailError::missing_field("napi.triples"))?;

        match triples.defaults {
          Some(false) => {}
          Some(true) => {
            return Err(RailError::invalid_field(
              "napi.triples.defaults",
              "default targets are not supported; set it to false and enumerate every target in napi.triples.additional",
            ));
          }
          None => return Err(RailError::missing_field("napi.triples.defaults")),
        }

        let targets = required_list(triples.additional, "napi.triples.additional")?;
        Ok(NormalizedNapiConfig {
          binary_name,
          package_name,
          targets,
        })
      }
      NapiShape::Current(current) => Ok(NormalizedNapiConfig {
        binary_name: required(current.binary_name, "napi.binaryName")?,
        package_name: required(current.package_name, "napi.packageName")?,
        targets: required_list(current.targets, "napi.targets")?,
      }),
    }
  }
}

fn required(value: Option<String>, field: &str) -> RailResult<String> {
  value
    .filter(|v| !v.trim().is_empty())
    .ok_or_else(|| RailError::missing_field(field))
}

fn required_list(value: Option<Vec<String>>, field: &str) -> RailResult<Vec<String>> {
  value
    .filter(|v| !v.is_empty())
    .ok_or_else(|| RailError::missing_field(field))
}

/// Installed `@napi-rs/cli` version, read from its own package.json
pub fn detect_tool_version(root: &Path) -> RailResult<Version> {
  let path = root.join(NAPI_CLI_MANIFEST);
  let unsupported = || RailError::Environment(EnvironmentError::UnsupportedToolVersion { found: None });

  let manifest = read_json_object(&path).map_err(|_| unsupported())?;
  let raw = manifest.get("version").and_then(Value::as_str).ok_or_else(unsupported)?;

  Version::parse(raw.trim_start_matches('v')).map_err(|_| {
    RailError::Environment(EnvironmentError::UnsupportedToolVersion {
      found: Some(raw.to_string()),
    })
  })
}

/// Normalize the manifest's `napi` block for the given tool version
pub fn normalize_napi_config(manifest: &RootManifest, tool_version: &Version) -> RailResult<NormalizedNapiConfig> {
  let schema = SchemaVersion::from_tool_version(tool_version)?;
  let block = manifest.napi().ok_or_else(|| RailError::missing_field("napi"))?;
  NapiShape::parse(block, schema)?.normalize()
}

/// Every declared triple must be in the architecture catalog
pub fn validate_targets(config: &NormalizedNapiConfig) -> RailResult<()> {
  let unknown: Vec<String> = config
    .targets
    .iter()
    .filter(|t| catalog::lookup_triple(t).is_none())
    .cloned()
    .collect();

  if unknown.is_empty() {
    return Ok(());
  }

  Err(RailError::Config(ConfigError::UnsupportedTargets {
    unknown,
    supported: catalog::all_target_triples().into_iter().map(String::from).collect(),
  }))
}

/// Detect, normalize and validate in one step
pub fn resolve(root: &Path, manifest: &RootManifest) -> RailResult<NormalizedNapiConfig> {
  let tool_version = detect_tool_version(root)?;
  tracing::debug!(%tool_version, "detected @napi-rs/cli");
  let config = normalize_napi_config(manifest, &tool_version)?;
  validate_targets(&config)?;
  Ok(config)
}
