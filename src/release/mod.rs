//! Release modes for native-binding packages
//!
//! A release run picks exactly one mode from its flags:
//!
//! - **optimize** (`--wasm-opt [path]`): only the wasm-opt pass, nothing published
//! - **root** (`--root`): meta-package in `dist/` with per-platform optional deps
//! - **wasm** (`--wasm`, `--wasm-web`, `--napi-wasm`): WebAssembly fallback packages
//! - **subpackages** (default): patch `npm/*` stubs, register them, publish them
//!
//! Steps run strictly in order and the first failure aborts the run. Files
//! written before a failure are left in place; there is no rollback.

pub mod artifacts;
pub mod optimize;
pub mod publish;
pub mod root;
pub mod subpackages;
pub mod wasm;
pub mod workspace;

use crate::core::config::ReleaseEnv;
use crate::core::error::{ConfigError, RailError, RailResult};
use crate::core::runner::CommandRunner;
use std::path::{Path, PathBuf};

pub use wasm::WasmVariant;

/// Top-level fields copied from the root manifest into published manifests
pub const PUBLISH_FIELDS: &[&str] = &[
  "name",
  "version",
  "main",
  "types",
  "description",
  "author",
  "homepage",
  "repository",
  "keywords",
  "license",
  "engines",
  "napi",
];

/// Fields that only make sense next to a native binary
pub const BINARY_FIELDS: &[&str] = &["main", "types", "napi"];

/// Raw release flags as given on the command line
#[derive(Debug, Clone, Default)]
pub struct ReleaseFlags {
  pub root: bool,
  pub wasm: bool,
  pub wasm_web: bool,
  pub napi_wasm: bool,
  /// `Some(None)` when `--wasm-opt` was given without a path
  pub wasm_opt: Option<Option<PathBuf>>,
  pub tag: Option<String>,
}

/// The single branch a release run executes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseMode {
  Optimize(Option<PathBuf>),
  Root,
  Wasm(WasmVariant),
  Subpackages,
}

impl ReleaseMode {
  /// Pick the mode, rejecting combinations of mode flags
  pub fn select(flags: &ReleaseFlags) -> RailResult<Self> {
    let chosen: Vec<&str> = [
      (flags.root, "--root"),
      (flags.wasm, "--wasm"),
      (flags.wasm_web, "--wasm-web"),
      (flags.napi_wasm, "--napi-wasm"),
    ]
    .into_iter()
    .filter_map(|(set, name)| set.then_some(name))
    .collect();

    if chosen.len() > 1 {
      return Err(RailError::Config(ConfigError::ConflictingFlags {
        flags: chosen.into_iter().map(String::from).collect(),
      }));
    }

    if let Some(target) = &flags.wasm_opt {
      return Ok(ReleaseMode::Optimize(target.clone()));
    }

    Ok(match chosen.first().copied() {
      Some("--root") => ReleaseMode::Root,
      Some("--wasm") => ReleaseMode::Wasm(WasmVariant::Node),
      Some("--wasm-web") => ReleaseMode::Wasm(WasmVariant::Web),
      Some("--napi-wasm") => ReleaseMode::Wasm(WasmVariant::Wasi),
      _ => ReleaseMode::Subpackages,
    })
  }

  pub fn label(&self) -> &'static str {
    match self {
      ReleaseMode::Optimize(_) => "wasm-opt",
      ReleaseMode::Root => "root package",
      ReleaseMode::Wasm(variant) => variant.label(),
      ReleaseMode::Subpackages => "platform packages",
    }
  }
}

/// Shared state for one release run
pub struct ReleaseContext<'a> {
  pub env: &'a ReleaseEnv,
  pub runner: &'a dyn CommandRunner,
  /// Distribution tag forwarded to the publish command
  pub tag: Option<String>,
}

impl<'a> ReleaseContext<'a> {
  pub fn new(env: &'a ReleaseEnv, runner: &'a dyn CommandRunner, tag: Option<String>) -> Self {
    Self { env, runner, tag }
  }

  pub fn root(&self) -> &Path {
    &self.env.root
  }
}
