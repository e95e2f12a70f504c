//! `monorail targets`

use crate::core::error::{RailError, RailResult};
use crate::napi::catalog::{self, ArchitectureDescriptor, CATALOG};

/// Catalog entries to show: everything, or the one matching a platform key or triple
fn select(key: Option<&str>) -> RailResult<Vec<&'static ArchitectureDescriptor>> {
  let Some(key) = key else {
    return Ok(CATALOG.iter().collect());
  };

  catalog::lookup(key)
    .or_else(|| catalog::lookup_triple(key))
    .map(|d| vec![d])
    .ok_or_else(|| RailError::Message {
      message: format!("Unknown platform: {}", key),
      context: None,
      help: Some("Run `monorail targets` to list supported platform keys and triples.".to_string()),
    })
}

/// Print the supported platforms
pub fn run_targets(key: Option<&str>, json: bool) -> RailResult<()> {
  let descriptors = select(key)?;

  if json {
    let out = match descriptors.as_slice() {
      [single] if key.is_some() => serde_json::to_string_pretty(single)?,
      all => serde_json::to_string_pretty(all)?,
    };
    println!("{}", out);
    return Ok(());
  }

  if key.is_none() {
    println!("Supported platforms");
    println!("===================");
    println!();
  }
  for descriptor in descriptors {
    println!(
      "  {:<18} {:<28} {}",
      descriptor.platform_key, descriptor.triple, descriptor.description
    );
  }
  Ok(())
}
