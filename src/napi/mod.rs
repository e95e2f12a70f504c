//! Native-binding package model
//!
//! - **catalog**: supported platforms and their target triples
//! - **manifest**: root package.json access and lossless edits
//! - **config**: `napi` block normalization across @napi-rs/cli 2.x and 3.x
//! - **stubs**: per-platform placeholder packages under `npm/`

pub mod catalog;
pub mod config;
pub mod manifest;
pub mod stubs;
