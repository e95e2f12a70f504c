//! Supported native platforms
//!
//! One entry per prebuilt binary we know how to package. The platform key names
//! the stub package directory (`npm/<key>`) and the package suffix
//! (`<packageName>-<key>`); the triple is what package.json lists as a target.

use serde::Serialize;
use std::collections::BTreeSet;

/// Static description of one supported platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ArchitectureDescriptor {
  pub platform_key: &'static str,
  pub description: &'static str,
  pub os: &'static [&'static str],
  pub cpu: &'static [&'static str],
  pub triple: &'static str,
}

pub const CATALOG: &[ArchitectureDescriptor] = &[
  ArchitectureDescriptor {
    platform_key: "darwin-arm64",
    description: "macOS ARM64",
    os: &["darwin"],
    cpu: &["arm64"],
    triple: "aarch64-apple-darwin",
  },
  ArchitectureDescriptor {
    platform_key: "darwin-x64",
    description: "macOS x64",
    os: &["darwin"],
    cpu: &["x64"],
    triple: "x86_64-apple-darwin",
  },
  ArchitectureDescriptor {
    platform_key: "linux-x64-gnu",
    description: "Linux x64 (glibc)",
    os: &["linux"],
    cpu: &["x64"],
    triple: "x86_64-unknown-linux-gnu",
  },
  ArchitectureDescriptor {
    platform_key: "linux-x64-musl",
    description: "Linux x64 (musl)",
    os: &["linux"],
    cpu: &["x64"],
    triple: "x86_64-unknown-linux-musl",
  },
  ArchitectureDescriptor {
    platform_key: "linux-arm64-gnu",
    description: "Linux ARM64 (glibc)",
    os: &["linux"],
    cpu: &["arm64"],
    triple: "aarch64-unknown-linux-gnu",
  },
  ArchitectureDescriptor {
    platform_key: "linux-arm64-musl",
    description: "Linux ARM64 (musl)",
    os: &["linux"],
    cpu: &["arm64"],
    triple: "aarch64-unknown-linux-musl",
  },
  ArchitectureDescriptor {
    platform_key: "win32-x64-msvc",
    description: "Windows x64",
    os: &["win32"],
    cpu: &["x64"],
    triple: "x86_64-pc-windows-msvc",
  },
  ArchitectureDescriptor {
    platform_key: "win32-arm64-msvc",
    description: "Windows ARM64",
    os: &["win32"],
    cpu: &["arm64"],
    triple: "aarch64-pc-windows-msvc",
  },
  ArchitectureDescriptor {
    platform_key: "win32-ia32-msvc",
    description: "Windows x86 (32-bit)",
    os: &["win32"],
    cpu: &["ia32"],
    triple: "i686-pc-windows-msvc",
  },
];

/// Find a platform by its key (e.g. `darwin-arm64`)
pub fn lookup(platform_key: &str) -> Option<&'static ArchitectureDescriptor> {
  CATALOG.iter().find(|d| d.platform_key == platform_key)
}

/// Find a platform by its target triple
pub fn lookup_triple(triple: &str) -> Option<&'static ArchitectureDescriptor> {
  CATALOG.iter().find(|d| d.triple == triple)
}

/// Every triple a package may declare
pub fn all_target_triples() -> BTreeSet<&'static str> {
  CATALOG.iter().map(|d| d.triple).collect()
}

/// Descriptors for a list of triples, in catalog order.
///
/// Unknown triples are skipped; callers validate first.
pub fn descriptors_for(triples: &[String]) -> Vec<&'static ArchitectureDescriptor> {
  CATALOG
    .iter()
    .filter(|d| triples.iter().any(|t| t == d.triple))
    .collect()
}
