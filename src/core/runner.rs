//! External command execution
//!
//! Every build, install and publish step shells out through a [`CommandRunner`].
//! The system runner inherits stdio so tool output streams straight to the
//! console, and treats any non-zero exit as a hard failure.

use crate::core::error::{CommandError, RailError, RailResult};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

/// A fully described external command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
  pub program: String,
  pub args: Vec<String>,
  pub cwd: PathBuf,
}

impl CommandSpec {
  pub fn new(program: impl Into<String>, cwd: &Path) -> Self {
    Self {
      program: program.into(),
      args: Vec::new(),
      cwd: cwd.to_path_buf(),
    }
  }

  pub fn arg(mut self, arg: impl Into<String>) -> Self {
    self.args.push(arg.into());
    self
  }

  pub fn args<I, S>(mut self, args: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.args.extend(args.into_iter().map(Into::into));
    self
  }

  /// Command line as a single string (for logs and errors)
  pub fn command_line(&self) -> String {
    let mut line = self.program.clone();
    for arg in &self.args {
      line.push(' ');
      line.push_str(arg);
    }
    line
  }
}

impl fmt::Display for CommandSpec {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.command_line())
  }
}

/// Runs external commands to completion
pub trait CommandRunner {
  /// Run the command, waiting for it to exit. Non-zero exit is an error.
  fn run(&self, spec: &CommandSpec) -> RailResult<()>;
}

/// Runner backed by `std::process::Command` with inherited stdio
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
  fn run(&self, spec: &CommandSpec) -> RailResult<()> {
    println!("   $ {}", spec);
    tracing::debug!(cwd = %spec.cwd.display(), command = %spec, "spawning");

    let status = Command::new(&spec.program)
      .args(&spec.args)
      .current_dir(&spec.cwd)
      .status()
      .map_err(|e| {
        RailError::Command(CommandError::Spawn {
          command: spec.command_line(),
          reason: e.to_string(),
        })
      })?;

    if !status.success() {
      return Err(RailError::Command(CommandError::Failed {
        command: spec.command_line(),
        status: status.code(),
      }));
    }

    Ok(())
  }
}


#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_command_line_rendering() {
    let spec = CommandSpec::new("pnpm", Path::new("/repo"))
      .arg("install")
      .args(["--no-frozen-lockfile"]);
    assert_eq!(spec.command_line(), "pnpm install --no-frozen-lockfile");
    assert_eq!(spec.cwd, PathBuf::from("/repo"));
  }

  #[test]
  fn test_system_runner_reports_spawn_failure() {
    let dir = tempfile::tempdir().unwrap();
    let spec = CommandSpec::new("definitely-not-a-real-program-7f3a", dir.path());
    let err = SystemRunner.run(&spec).unwrap_err();
    assert!(matches!(err, RailError::Command(CommandError::Spawn { .. })));
  }

  #[cfg(unix)]
  #[test]
  fn test_system_runner_nonzero_exit() {
    let dir = tempfile::tempdir().unwrap();
    let spec = CommandSpec::new("false", dir.path());
    let err = SystemRunner.run(&spec).unwrap_err();
    assert!(matches!(err, RailError::Command(CommandError::Failed { .. })));
  }
}
