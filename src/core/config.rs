//! Runtime configuration for release runs
//!
//! Everything monorail reads from the process environment is collected once in
//! `main` into a [`ReleaseEnv`] and passed down by reference. Nothing below the
//! command layer calls `std::env::var` itself, so tests build the struct
//! directly.

use crate::core::error::{RailError, RailResult};
use std::path::{Path, PathBuf};

/// Environment variable holding the registry auth token
pub const TOKEN_VAR: &str = "NPM_TOKEN";

/// Environment variable overriding the target registry
pub const REGISTRY_VAR: &str = "NPM_CONFIG_REGISTRY";

/// Skip the wasm-opt pass entirely
pub const SKIP_WASM_OPT_VAR: &str = "MONORAIL_SKIP_WASM_OPT";

/// Silence the wasm-pack double-optimization advisory
pub const NO_WASM_OPT_ADVICE_VAR: &str = "MONORAIL_NO_WASM_OPT_ADVICE";

pub const DEFAULT_REGISTRY: &str = "https://registry.npmjs.org/";

/// Configuration for a single monorail invocation
#[derive(Debug, Clone)]
pub struct ReleaseEnv {
  /// Monorepo root (directory holding the root package.json)
  pub root: PathBuf,

  /// User-level npm credential file (~/.npmrc)
  pub npmrc_path: PathBuf,

  /// Persistent cache for downloaded tools
  pub cache_dir: PathBuf,

  /// Registry URL publishes go to
  pub registry: String,

  /// Auth token from the environment, if any
  pub npm_token: Option<String>,

  /// Skip the wasm-opt pass
  pub skip_wasm_opt: bool,

  /// Skip the wasm-pack profile advisory
  pub skip_wasm_opt_advice: bool,
}

impl ReleaseEnv {
  /// Build configuration from the current process environment
  pub fn from_process(root: &Path) -> RailResult<Self> {
    let home = dirs::home_dir().ok_or_else(|| RailError::message("Could not determine the home directory"))?;
    let cache_dir = dirs::cache_dir()
      .unwrap_or_else(|| home.join(".cache"))
      .join("monorail");

    let registry = std::env::var(REGISTRY_VAR)
      .ok()
      .filter(|r| !r.trim().is_empty())
      .unwrap_or_else(|| DEFAULT_REGISTRY.to_string());

    Ok(Self {
      root: root.to_path_buf(),
      npmrc_path: home.join(".npmrc"),
      cache_dir,
      registry,
      npm_token: std::env::var(TOKEN_VAR).ok().filter(|t| !t.is_empty()),
      skip_wasm_opt: env_flag(SKIP_WASM_OPT_VAR),
      skip_wasm_opt_advice: env_flag(NO_WASM_OPT_ADVICE_VAR),
    })
  }

  /// Configuration rooted at `root` with everything else kept under `home`.
  ///
  /// No environment variables are consulted.
  #[cfg(test)]
  pub fn for_test(root: &Path, home: &Path) -> Self {
    Self {
      root: root.to_path_buf(),
      npmrc_path: home.join(".npmrc"),
      cache_dir: home.join(".cache").join("monorail"),
      registry: DEFAULT_REGISTRY.to_string(),
      npm_token: None,
      skip_wasm_opt: true,
      skip_wasm_opt_advice: true,
    }
  }

  /// Host part of the registry URL, as used in `.npmrc` auth lines
  pub fn registry_host(&self) -> String {
    registry_host(&self.registry)
  }
}

/// Extract `host[:port][/path]` from a registry URL without the scheme or trailing slash
pub fn registry_host(url: &str) -> String {
  let without_scheme = url.split_once("://").map(|(_, rest)| rest).unwrap_or(url);
  without_scheme.trim_end_matches('/').to_string()
}

fn env_flag(name: &str) -> bool {
  std::env::var(name)
    .map(|v| is_truthy(&v))
    .unwrap_or(false)
}

fn is_truthy(value: &str) -> bool {
  !matches!(value.trim().to_ascii_lowercase().as_str(), "" | "0" | "false" | "no" | "off")
}
