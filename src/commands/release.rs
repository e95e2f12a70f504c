//! `monorail release`
//!
//! Mode flags are resolved before anything else, so a bad combination fails
//! without touching the filesystem or spawning a tool. The napi configuration
//! is then normalized and validated in full before the selected builder runs.

use crate::core::config::ReleaseEnv;
use crate::core::error::RailResult;
use crate::core::runner::CommandRunner;
use crate::napi;
use crate::napi::manifest::RootManifest;
use crate::release::{ReleaseContext, ReleaseFlags, ReleaseMode, optimize, root, subpackages, wasm};

/// Run the release command
pub fn run_release(flags: ReleaseFlags, env: &ReleaseEnv, runner: &dyn CommandRunner) -> RailResult<()> {
  let mode = ReleaseMode::select(&flags)?;
  tracing::debug!(?mode, root = %env.root.display(), "release mode selected");

  if let ReleaseMode::Optimize(target) = &mode {
    let optimized = optimize::run_pass(env, target.as_deref());
    println!("✅ wasm-opt pass finished ({} file(s) optimized)", optimized);
    return Ok(());
  }

  let mut manifest = RootManifest::load(&env.root)?;
  let config = napi::config::resolve(&env.root, &manifest)?;

  println!("🚆 Releasing {} ({})", config.package_name, mode.label());
  let ctx = ReleaseContext::new(env, runner, flags.tag);

  match mode {
    ReleaseMode::Root => {
      root::run_root_release(&ctx, &manifest, &config)?;
    }
    ReleaseMode::Wasm(variant) => {
      wasm::run_wasm_release(&ctx, &manifest, &config, variant)?;
    }
    ReleaseMode::Subpackages => {
      subpackages::run_default_release(&ctx, &mut manifest, &config)?;
    }
    ReleaseMode::Optimize(_) => {}
  }

  println!("✅ Release complete");
  Ok(())
}
