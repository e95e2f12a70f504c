//! Progress indicators for long-running operations
//!
//! Uses `linya`, which draws several bars from many threads without
//! allocating per update.

use linya::{Bar, Progress};
use std::sync::Mutex;

/// A single bar shared across rayon workers
pub struct SharedProgress {
  progress: Mutex<Progress>,
  bar: Bar,
}

impl SharedProgress {
  pub fn new(total: usize, label: impl Into<String>) -> Self {
    let mut progress = Progress::new();
    let bar = progress.bar(total, label.into());
    Self {
      progress: Mutex::new(progress),
      bar,
    }
  }

  /// Increment by 1 and redraw (thread-safe)
  pub fn inc(&self) {
    // A panicked worker must not stop the others from reporting
    let mut progress = self.progress.lock().unwrap_or_else(|e| e.into_inner());
    progress.inc_and_draw(&self.bar, 1);
  }
}
