//! WebAssembly fallback package releases
//!
//! Three variants share one pipeline: build, require the build output,
//! optionally shrink it with wasm-opt, copy the artifacts into a fresh publish
//! directory, derive a manifest, and publish.
//!
//! | variant | flag          | build output       | publish dir               |
//! |---------|---------------|--------------------|---------------------------|
//! | Node    | `--wasm`      | `target/wasm`      | `target/wasm_publish`     |
//! | Web     | `--wasm-web`  | `target/wasm_web`  | `target/wasm_web_publish` |
//! | Wasi    | `--napi-wasm` | `target/napi_wasm` | `target/wasm_publish`     |

use crate::core::error::{ArtifactError, RailError, RailResult};
use crate::core::runner::CommandSpec;
use crate::napi::config::NormalizedNapiConfig;
use crate::napi::manifest::{MANIFEST_FILE, RootManifest, write_json};
use crate::release::artifacts::{self, LICENSE_FILE, README_FILE};
use crate::release::publish::{self, PublishTarget};
use crate::release::{BINARY_FIELDS, PUBLISH_FIELDS, ReleaseContext, optimize};
use serde_json::{Map, Value, json};
use std::path::{Path, PathBuf};

/// Runtime shim the wasi build loads
pub const WASI_RUNTIME: &str = "@napi-rs/wasm-runtime";

/// Loader files the native package must ship for the wasm fallback to work
pub const REQUIRED_SUPPORT_FILES: &[&str] = &["index.js", "index.d.ts", "install.js"];

/// Loader files that should ship but are not strictly needed
pub const RECOMMENDED_SUPPORT_FILES: &[&str] = &["index.mjs", "browser.js"];

pub const EXPECTED_MAIN: &str = "index.js";

const WASI_TARGET: &str = "wasm32-wasip1-threads";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WasmVariant {
  /// wasm-bindgen output for Node (`--target nodejs`)
  Node,
  /// wasm-bindgen output for browsers (`--target web`)
  Web,
  /// napi-rs wasi build with Node and browser entries
  Wasi,
}

impl WasmVariant {
  pub fn label(self) -> &'static str {
    match self {
      WasmVariant::Node => "wasm (node)",
      WasmVariant::Web => "wasm (web)",
      WasmVariant::Wasi => "wasm (wasi)",
    }
  }

  pub fn build_output(self, root: &Path) -> PathBuf {
    match self {
      WasmVariant::Node => root.join("target/wasm"),
      WasmVariant::Web => root.join("target/wasm_web"),
      WasmVariant::Wasi => root.join("target/napi_wasm"),
    }
  }

  pub fn publish_dir(self, root: &Path) -> PathBuf {
    match self {
      WasmVariant::Node | WasmVariant::Wasi => root.join("target/wasm_publish"),
      WasmVariant::Web => root.join("target/wasm_web_publish"),
    }
  }

  pub fn build_command(self, root: &Path, binary_name: &str) -> CommandSpec {
    match self {
      WasmVariant::Node => CommandSpec::new("wasm-pack", root).args([
        "build",
        "--release",
        "--target",
        "nodejs",
        "--out-dir",
        "target/wasm",
        "--out-name",
        binary_name,
      ]),
      WasmVariant::Web => CommandSpec::new("wasm-pack", root).args([
        "build",
        "--release",
        "--target",
        "web",
        "--out-dir",
        "target/wasm_web",
        "--out-name",
        binary_name,
      ]),
      WasmVariant::Wasi => CommandSpec::new("napi", root).args([
        "build",
        "--platform",
        "--release",
        "--target",
        WASI_TARGET,
        "--output-dir",
        "target/napi_wasm",
      ]),
    }
  }

  /// Build output extensions copied into the publish directory
  pub fn extensions(self) -> &'static [&'static str] {
    match self {
      WasmVariant::Node | WasmVariant::Web => &[".wasm", ".js", ".d.ts"],
      WasmVariant::Wasi => &[".wasm", ".js", ".d.ts", ".cjs", ".mjs"],
    }
  }

  fn suffix(self) -> &'static str {
    match self {
      WasmVariant::Node | WasmVariant::Wasi => "-wasm",
      WasmVariant::Web => "-wasm-web",
    }
  }

  /// Published name: vendor override first, else `<packageName><suffix>`
  pub fn package_name(self, manifest: &RootManifest, config: &NormalizedNapiConfig) -> String {
    let vendor = manifest.vendor();
    let override_name = match self {
      WasmVariant::Node | WasmVariant::Wasi => vendor.and_then(|v| v.wasm_package_name.clone()),
      WasmVariant::Web => vendor.and_then(|v| v.wasm_web_package_name.clone()),
    };
    override_name
      .filter(|n| !n.trim().is_empty())
      .unwrap_or_else(|| format!("{}{}", config.package_name, self.suffix()))
  }
}

/// The four output categories a napi wasi build must produce
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WasiOutputs {
  pub workers: Vec<String>,
  pub binary: String,
  pub node_entry: String,
  pub browser_entry: String,
}

const WORKER_SUFFIXES: &[&str] = &["wasi-worker.mjs", "wasi-worker-browser.mjs"];
const NODE_ENTRY_SUFFIX: &str = ".wasi.cjs";
const BROWSER_ENTRY_SUFFIX: &str = ".wasi-browser.js";

impl WasiOutputs {
  /// Match build outputs by filename suffix. Each missing category is fatal.
  pub fn discover(dir: &Path) -> RailResult<Self> {
    let files = artifacts::list_files(dir)?;
    let missing = |category: &'static str, pattern: &'static str| {
      RailError::Artifact(ArtifactError::MissingWasiOutput {
        category,
        pattern,
        dir: dir.to_path_buf(),
      })
    };

    let workers: Vec<String> = files
      .iter()
      .filter(|f| WORKER_SUFFIXES.iter().any(|s| f.ends_with(s)))
      .cloned()
      .collect();
    if workers.is_empty() {
      return Err(missing("worker script", "wasi-worker.mjs"));
    }

    let find = |suffix: &str| files.iter().find(|f| f.ends_with(suffix)).cloned();
    let binary = find(".wasm").ok_or_else(|| missing("wasm binary", ".wasm"))?;
    let node_entry = find(NODE_ENTRY_SUFFIX).ok_or_else(|| missing("node entry", NODE_ENTRY_SUFFIX))?;
    let browser_entry = find(BROWSER_ENTRY_SUFFIX).ok_or_else(|| missing("browser entry", BROWSER_ENTRY_SUFFIX))?;

    Ok(Self {
      workers,
      binary,
      node_entry,
      browser_entry,
    })
  }
}

/// Checks the native package must pass before its wasm fallback can be published
pub fn preflight_node(manifest: &RootManifest) -> RailResult<()> {
  let files = manifest.files();
  let has = |name: &str| files.iter().any(|f| f.trim_start_matches("./") == name);

  let missing: Vec<&str> = REQUIRED_SUPPORT_FILES.iter().copied().filter(|f| !has(*f)).collect();
  if !missing.is_empty() {
    return Err(RailError::invalid_field(
      "files",
      format!("must include {} for the wasm fallback loader", missing.join(", ")),
    ));
  }

  for file in RECOMMENDED_SUPPORT_FILES.iter().copied().filter(|f| !has(*f)) {
    tracing::warn!("\"files\" does not include {} (recommended)", file);
  }

  match manifest.main() {
    Some(EXPECTED_MAIN) => {}
    other => tracing::warn!("\"main\" is {:?}, expected \"{}\"", other.unwrap_or("<unset>"), EXPECTED_MAIN),
  }

  if manifest.postinstall().is_none() {
    return Err(RailError::missing_field("scripts.postinstall"));
  }

  Ok(())
}

/// Entry-point fields for the published manifest
fn entry_fields(
  variant: WasmVariant,
  config: &NormalizedNapiConfig,
  manifest: &RootManifest,
  wasi: Option<&WasiOutputs>,
) -> RailResult<Map<String, Value>> {
  let mut fields = Map::new();
  match (variant, wasi) {
    (WasmVariant::Node, _) => {
      fields.insert("main".to_string(), json!(format!("{}.js", config.binary_name)));
      fields.insert("types".to_string(), json!(format!("{}.d.ts", config.binary_name)));
    }
    (WasmVariant::Web, _) => {
      fields.insert("type".to_string(), json!("module"));
      fields.insert("module".to_string(), json!(format!("{}.js", config.binary_name)));
      fields.insert("types".to_string(), json!(format!("{}.d.ts", config.binary_name)));
    }
    (WasmVariant::Wasi, Some(outputs)) => {
      let runtime = manifest
        .dependency(WASI_RUNTIME)
        .ok_or_else(|| RailError::missing_field(format!("dependencies.{}", WASI_RUNTIME)))?;
      fields.insert("main".to_string(), json!(outputs.node_entry));
      fields.insert("browser".to_string(), json!(outputs.browser_entry));
      fields.insert("dependencies".to_string(), json!({ WASI_RUNTIME: runtime }));
    }
    (WasmVariant::Wasi, None) => return Err(RailError::message("wasi outputs were not resolved")),
  }
  Ok(fields)
}

/// Derive the published manifest for a wasm package
pub fn publish_manifest(
  variant: WasmVariant,
  manifest: &RootManifest,
  config: &NormalizedNapiConfig,
  name: &str,
  wasi: Option<&WasiOutputs>,
) -> RailResult<Value> {
  let fields: Vec<&str> = PUBLISH_FIELDS
    .iter()
    .copied()
    .filter(|f| !BINARY_FIELDS.contains(f))
    .collect();

  let mut out = manifest.pick(&fields);
  out.extend(entry_fields(variant, config, manifest, wasi)?);
  out.insert("name".to_string(), json!(name));
  Ok(Value::Object(out))
}

/// Run a wasm release. Returns the publish directory.
pub fn run_wasm_release(
  ctx: &ReleaseContext<'_>,
  manifest: &RootManifest,
  config: &NormalizedNapiConfig,
  variant: WasmVariant,
) -> RailResult<PathBuf> {
  let root = ctx.root();
  manifest.version()?;

  match variant {
    WasmVariant::Node => preflight_node(manifest)?,
    WasmVariant::Wasi => {
      manifest
        .dependency(WASI_RUNTIME)
        .ok_or_else(|| RailError::missing_field(format!("dependencies.{}", WASI_RUNTIME)))?;
    }
    WasmVariant::Web => {}
  }

  let build = variant.build_command(root, &config.binary_name);
  println!("🔨 Building {}...", variant.label());
  ctx.runner.run(&build)?;

  let build_output = variant.build_output(root);
  if !build_output.is_dir() {
    return Err(RailError::Artifact(ArtifactError::BuildOutputMissing {
      path: build_output,
      hint: format!("Run `{}` first.", build),
    }));
  }

  optimize::run_pass(ctx.env, Some(&build_output));

  let wasi = match variant {
    WasmVariant::Wasi => {
      let outputs = WasiOutputs::discover(&build_output)?;
      tracing::debug!(binary = %outputs.binary, workers = ?outputs.workers, "resolved wasi outputs");
      Some(outputs)
    }
    _ => None,
  };
  let license = artifacts::require_license(root)?;

  let out = variant.publish_dir(root);
  artifacts::recreate_dir(&out)?;

  let extensions = variant.extensions();
  let mut copied = 0;
  for file in artifacts::list_files(&build_output)? {
    if extensions.iter().any(|ext| file.ends_with(ext)) {
      artifacts::copy_entry(&build_output.join(&file), &out.join(&file))?;
      copied += 1;
    }
  }
  tracing::debug!(copied, dir = %out.display(), "copied build outputs");

  let name = variant.package_name(manifest, config);
  std::fs::write(
    out.join(README_FILE),
    format!("`{}` is the WebAssembly build of `{}`.\n", name, config.package_name),
  )?;

  let published = publish_manifest(variant, manifest, config, &name, wasi.as_ref())?;
  if let Some(main) = published.get("main").and_then(Value::as_str)
    && !out.join(main).exists()
  {
    tracing::warn!("entry {} was not found in {}", main, build_output.display());
  }
  write_json(&out.join(MANIFEST_FILE), &published)?;

  artifacts::copy_entry(&license, &out.join(LICENSE_FILE))?;

  println!("📦 Assembled {} in {}", name, out.display());
  publish::publish(ctx, PublishTarget::Directory(&out))?;
  Ok(out)
}
