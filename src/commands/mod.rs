//! CLI commands for monorail
//!
//! - **release**: build and publish one release mode (root, wasm variants, platform packages)
//! - **stubs**: create missing per-platform stub packages
//! - **targets**: list supported platforms
//!
//! Commands take the [`ReleaseEnv`](crate::core::config::ReleaseEnv) built once in `main`.

pub mod release;
pub mod stubs;
pub mod targets;

pub use release::run_release;
pub use stubs::run_stubs;
pub use targets::run_targets;
