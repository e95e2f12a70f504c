//! Registry authentication and publishing
//!
//! Every publish goes through [`publish`], which first makes sure `~/.npmrc`
//! has an auth line for the target registry. When the line is missing the
//! token must come from `NPM_TOKEN`; it is appended to the credential file and
//! never echoed.

use crate::core::config::{ReleaseEnv, TOKEN_VAR};
use crate::core::error::{AuthError, RailError, RailResult, ResultExt};
use crate::core::runner::CommandSpec;
use crate::release::ReleaseContext;
use std::io::Write;
use std::path::Path;

/// What gets published
#[derive(Debug, Clone, Copy)]
pub enum PublishTarget<'a> {
  /// Every workspace package the versioning tool selects
  Workspace,
  /// A single self-contained package directory
  Directory(&'a Path),
}

/// How the credential check was satisfied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStatus {
  /// `.npmrc` already had an auth line for the registry
  Existing,
  /// The token from the environment was written to `.npmrc`
  Appended,
}

fn auth_prefix(host: &str) -> String {
  format!("//{}/:_authToken=", host)
}

/// Make sure the credential file holds a token for the configured registry
pub fn ensure_auth(env: &ReleaseEnv) -> RailResult<AuthStatus> {
  let host = env.registry_host();
  let prefix = auth_prefix(&host);

  let existing = if env.npmrc_path.exists() {
    std::fs::read_to_string(&env.npmrc_path).with_context(|| format!("Failed to read {}", env.npmrc_path.display()))?
  } else {
    String::new()
  };

  if existing.lines().any(|line| line.trim_start().starts_with(&prefix)) {
    tracing::debug!(registry = %host, "auth token already present");
    return Ok(AuthStatus::Existing);
  }

  let token = env.npm_token.as_deref().ok_or_else(|| {
    RailError::Auth(AuthError::MissingToken {
      var: TOKEN_VAR,
      registry: host.clone(),
    })
  })?;

  let mut line = String::new();
  if !existing.is_empty() && !existing.ends_with('\n') {
    line.push('\n');
  }
  line.push_str(&prefix);
  line.push_str(token);
  line.push('\n');

  let mut file = open_credentials(&env.npmrc_path)?;
  file
    .write_all(line.as_bytes())
    .with_context(|| format!("Failed to write {}", env.npmrc_path.display()))?;

  println!("   Added auth token for {} to {}", host, env.npmrc_path.display());
  Ok(AuthStatus::Appended)
}

#[cfg(unix)]
fn open_credentials(path: &Path) -> RailResult<std::fs::File> {
  use std::os::unix::fs::OpenOptionsExt;
  std::fs::OpenOptions::new()
    .create(true)
    .append(true)
    .mode(0o600)
    .open(path)
    .with_context(|| format!("Failed to open {}", path.display()))
}

#[cfg(not(unix))]
fn open_credentials(path: &Path) -> RailResult<std::fs::File> {
  std::fs::OpenOptions::new()
    .create(true)
    .append(true)
    .open(path)
    .with_context(|| format!("Failed to open {}", path.display()))
}

/// The publish command for a target, with the optional dist-tag appended
pub fn publish_command(root: &Path, target: PublishTarget<'_>, tag: Option<&str>) -> CommandSpec {
  let spec = match target {
    PublishTarget::Workspace => CommandSpec::new("pnpm", root).args(["changeset", "publish"]),
    PublishTarget::Directory(dir) => CommandSpec::new("npm", dir).args(["publish", "--access", "public"]),
  };

  match tag {
    Some(tag) => spec.arg("--tag").arg(tag),
    None => spec,
  }
}

/// Check credentials, then hand off to the registry client
pub fn publish(ctx: &ReleaseContext<'_>, target: PublishTarget<'_>) -> RailResult<()> {
  ensure_auth(ctx.env)?;

  match target {
    PublishTarget::Workspace => println!("🚀 Publishing workspace packages..."),
    PublishTarget::Directory(dir) => println!("🚀 Publishing {}...", dir.display()),
  }

  let spec = publish_command(ctx.root(), target, ctx.tag.as_deref());
  ctx.runner.run(&spec)
}
