//! `monorail stubs`

use crate::core::config::ReleaseEnv;
use crate::core::error::RailResult;
use crate::napi::manifest::RootManifest;
use crate::napi::{catalog, config, stubs};

/// Create the stub package for every configured target that lacks one
pub fn run_stubs(env: &ReleaseEnv) -> RailResult<()> {
  let manifest = RootManifest::load(&env.root)?;
  let config = config::resolve(&env.root, &manifest)?;
  let descriptors = catalog::descriptors_for(&config.targets);

  let created = stubs::ensure_stub_directories(&env.root, &descriptors)?;
  if created.is_empty() {
    println!("✅ All {} stub package(s) already exist", descriptors.len());
  } else {
    println!(
      "✅ Created {} of {} stub package(s) under {}/",
      created.len(),
      descriptors.len(),
      stubs::STUB_ROOT
    );
  }
  Ok(())
}
