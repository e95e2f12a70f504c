//! Core building blocks shared by every command
//!
//! - **config**: runtime configuration read once from the process environment
//! - **error**: error types with contextual help messages and exit codes
//! - **runner**: external command execution behind a trait

pub mod config;
pub mod error;
pub mod runner;
