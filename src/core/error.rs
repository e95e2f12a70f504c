//! Error types for monorail with contextual messages and exit codes
//!
//! Every failure in a release aborts the current command. Errors are grouped by
//! what the operator has to fix: the manifest (`Config`), the machine
//! (`Environment`), a missing build artifact (`Artifact`), registry credentials
//! (`Auth`) or an external tool (`Command`). Each category carries a help line.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Exit codes for monorail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
  /// User error (manifest, flags, missing artifacts, credentials)
  User = 1,
  /// System error (I/O, external commands)
  System = 2,
  /// Environment mismatch (tool version, platform)
  Validation = 3,
}

impl ExitCode {
  /// Convert to i32 for process exit
  pub fn as_i32(self) -> i32 {
    self as i32
  }
}

/// Main error type for monorail
#[derive(Debug)]
pub enum RailError {
  /// Malformed or missing manifest fields, bad flag combinations
  Config(ConfigError),

  /// Unsupported native build tool or host platform
  Environment(EnvironmentError),

  /// A prior build artifact is absent
  Artifact(ArtifactError),

  /// Registry authentication precondition unmet
  Auth(AuthError),

  /// External command failures
  Command(CommandError),

  /// I/O errors
  Io(io::Error),

  /// Generic error with message and optional context
  Message {
    message: String,
    context: Option<String>,
    help: Option<String>,
  },
}

impl RailError {
  /// Create a simple error message
  pub fn message(msg: impl Into<String>) -> Self {
    RailError::Message {
      message: msg.into(),
      context: None,
      help: None,
    }
  }

  /// Shorthand for a missing manifest field
  pub fn missing_field(field: impl Into<String>) -> Self {
    RailError::Config(ConfigError::MissingField { field: field.into() })
  }

  /// Shorthand for a manifest field with an unusable value
  pub fn invalid_field(field: impl Into<String>, reason: impl Into<String>) -> Self {
    RailError::Config(ConfigError::InvalidField {
      field: field.into(),
      reason: reason.into(),
    })
  }

  /// Add context to an existing error
  pub fn context(self, ctx: impl Into<String>) -> Self {
    let ctx_str = ctx.into();
    match self {
      RailError::Message { message, context, help } => RailError::Message {
        message,
        context: Some(context.map(|c| format!("{}\n{}", ctx_str, c)).unwrap_or(ctx_str)),
        help,
      },
      RailError::Io(e) => RailError::Message {
        message: format!("{}: {}", ctx_str, e),
        context: None,
        help: None,
      },
      _ => self,
    }
  }

  /// Get the appropriate exit code for this error
  pub fn exit_code(&self) -> ExitCode {
    match self {
      RailError::Config(_) => ExitCode::User,
      RailError::Environment(_) => ExitCode::Validation,
      RailError::Artifact(_) => ExitCode::User,
      RailError::Auth(_) => ExitCode::User,
      RailError::Command(_) => ExitCode::System,
      RailError::Io(_) => ExitCode::System,
      RailError::Message { .. } => ExitCode::User,
    }
  }

  /// Get contextual help message for this error
  pub fn help_message(&self) -> Option<String> {
    match self {
      RailError::Config(e) => e.help_message(),
      RailError::Environment(e) => e.help_message(),
      RailError::Artifact(e) => e.help_message(),
      RailError::Auth(e) => e.help_message(),
      RailError::Command(e) => e.help_message(),
      RailError::Message { help, .. } => help.clone(),
      RailError::Io(_) => None,
    }
  }
}

impl fmt::Display for RailError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      RailError::Config(e) => write!(f, "{}", e),
      RailError::Environment(e) => write!(f, "{}", e),
      RailError::Artifact(e) => write!(f, "{}", e),
      RailError::Auth(e) => write!(f, "{}", e),
      RailError::Command(e) => write!(f, "{}", e),
      RailError::Io(e) => write!(f, "I/O error: {}", e),
      RailError::Message { message, context, .. } => {
        write!(f, "{}", message)?;
        if let Some(ctx) = context {
          write!(f, "\n{}", ctx)?;
        }
        Ok(())
      }
    }
  }
}

impl std::error::Error for RailError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      RailError::Io(e) => Some(e),
      _ => None,
    }
  }
}

impl From<io::Error> for RailError {
  fn from(err: io::Error) -> Self {
    RailError::Io(err)
  }
}

impl From<String> for RailError {
  fn from(msg: String) -> Self {
    RailError::message(msg)
  }
}

impl From<&str> for RailError {
  fn from(msg: &str) -> Self {
    RailError::message(msg)
  }
}

impl From<toml_edit::TomlError> for RailError {
  fn from(err: toml_edit::TomlError) -> Self {
    RailError::message(format!("TOML parse error: {}", err))
  }
}

impl From<serde_json::Error> for RailError {
  fn from(err: serde_json::Error) -> Self {
    RailError::message(format!("JSON error: {}", err))
  }
}

impl From<serde_yaml::Error> for RailError {
  fn from(err: serde_yaml::Error) -> Self {
    RailError::message(format!("YAML error: {}", err))
  }
}

impl From<semver::Error> for RailError {
  fn from(err: semver::Error) -> Self {
    RailError::message(format!("Version parse error: {}", err))
  }
}

impl From<reqwest::Error> for RailError {
  fn from(err: reqwest::Error) -> Self {
    RailError::message(format!("Download error: {}", err))
  }
}

/// Manifest and invocation errors
#[derive(Debug)]
pub enum ConfigError {
  /// A required file is absent
  NotFound { path: PathBuf },

  /// A manifest could not be parsed
  Parse { path: PathBuf, reason: String },

  /// Missing required field (dotted path, e.g. `napi.targets`)
  MissingField { field: String },

  /// Field present but unusable
  InvalidField { field: String, reason: String },

  /// Mutually exclusive release flags were combined
  ConflictingFlags { flags: Vec<String> },

  /// Declared targets absent from the architecture catalog
  UnsupportedTargets { unknown: Vec<String>, supported: Vec<String> },
}

impl ConfigError {
  fn help_message(&self) -> Option<String> {
    match self {
      ConfigError::NotFound { .. } => Some("Run monorail from the monorepo root that holds package.json.".to_string()),
      ConfigError::MissingField { field } if field == "files" => {
        Some("List the published files in package.json \"files\" (at least index.js).".to_string())
      }
      ConfigError::MissingField { field } if field.starts_with("napi.triples") => Some(
        "Set napi.triples.defaults to false and enumerate every target in napi.triples.additional.".to_string(),
      ),
      ConfigError::MissingField { field } if field.starts_with("napi") => {
        Some("Declare napi.binaryName, napi.packageName and napi.targets in package.json.".to_string())
      }
      ConfigError::ConflictingFlags { .. } => {
        Some("Pick one release mode per invocation: --root, --wasm, --wasm-web or --napi-wasm.".to_string())
      }
      ConfigError::UnsupportedTargets { .. } => Some("Run `monorail targets` to list supported triples.".to_string()),
      _ => None,
    }
  }
}

impl fmt::Display for ConfigError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ConfigError::NotFound { path } => write!(f, "Required file not found: {}", path.display()),
      ConfigError::Parse { path, reason } => write!(f, "Failed to parse {}: {}", path.display(), reason),
      ConfigError::MissingField { field } => write!(f, "Missing required field in package.json: {}", field),
      ConfigError::InvalidField { field, reason } => write!(f, "Invalid field {} in package.json: {}", field, reason),
      ConfigError::ConflictingFlags { flags } => {
        write!(f, "Flags cannot be combined: {}", flags.join(", "))
      }
      ConfigError::UnsupportedTargets { unknown, supported } => write!(
        f,
        "Unsupported target triple(s): {}\nSupported: {}",
        unknown.join(", "),
        supported.join(", ")
      ),
    }
  }
}

/// Host environment mismatches
#[derive(Debug)]
pub enum EnvironmentError {
  /// The native build tool is missing or an unknown major version
  UnsupportedToolVersion { found: Option<String> },

  /// No prebuilt optimizer exists for this OS/CPU combination
  UnsupportedPlatform { os: String, arch: String },
}

impl EnvironmentError {
  fn help_message(&self) -> Option<String> {
    match self {
      EnvironmentError::UnsupportedToolVersion { .. } => {
        Some("Install @napi-rs/cli 2.x or 3.x as a devDependency and run `pnpm install`.".to_string())
      }
      EnvironmentError::UnsupportedPlatform { .. } => {
        Some("Run the optimization on linux or macos (x86_64 or aarch64), or set MONORAIL_SKIP_WASM_OPT=1.".to_string())
      }
    }
  }
}

impl fmt::Display for EnvironmentError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      EnvironmentError::UnsupportedToolVersion { found: Some(v) } => {
        write!(f, "Unsupported @napi-rs/cli version: {}", v)
      }
      EnvironmentError::UnsupportedToolVersion { found: None } => {
        write!(f, "Could not detect an installed @napi-rs/cli version")
      }
      EnvironmentError::UnsupportedPlatform { os, arch } => {
        write!(f, "Unsupported platform for wasm-opt: {}-{}", os, arch)
      }
    }
  }
}

/// Expected build artifacts that are missing
#[derive(Debug)]
pub enum ArtifactError {
  /// The build output directory does not exist
  BuildOutputMissing { path: PathBuf, hint: String },

  /// The package JS entry point is absent
  MissingEntryPoint { path: PathBuf },

  /// The root LICENSE file is absent
  MissingLicense { path: PathBuf },

  /// A napi-wasm output category has no matching file
  MissingWasiOutput { category: &'static str, pattern: &'static str, dir: PathBuf },
}

impl ArtifactError {
  fn help_message(&self) -> Option<String> {
    match self {
      ArtifactError::BuildOutputMissing { hint, .. } => Some(hint.clone()),
      ArtifactError::MissingEntryPoint { .. } => {
        Some("Run the build (e.g. `pnpm run build`) so the JS binding is generated.".to_string())
      }
      ArtifactError::MissingLicense { .. } => Some("Add a LICENSE file at the repository root.".to_string()),
      ArtifactError::MissingWasiOutput { .. } => Some(
        "Rebuild with `napi build --platform --target wasm32-wasip1-threads` and check the output names.".to_string(),
      ),
    }
  }
}

impl fmt::Display for ArtifactError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ArtifactError::BuildOutputMissing { path, .. } => {
        write!(f, "Build output not found: {}", path.display())
      }
      ArtifactError::MissingEntryPoint { path } => write!(f, "JS entry point not found: {}", path.display()),
      ArtifactError::MissingLicense { path } => write!(f, "LICENSE not found: {}", path.display()),
      ArtifactError::MissingWasiOutput { category, pattern, dir } => write!(
        f,
        "No {} found in {} (expected a file ending with {})",
        category,
        dir.display(),
        pattern
      ),
    }
  }
}

/// Registry authentication errors
#[derive(Debug)]
pub enum AuthError {
  /// No credential line and no token in the environment
  MissingToken { var: &'static str, registry: String },
}

impl AuthError {
  fn help_message(&self) -> Option<String> {
    match self {
      AuthError::MissingToken { var, .. } => Some(format!("export {}=<your-token>", var)),
    }
  }
}

impl fmt::Display for AuthError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      AuthError::MissingToken { var, registry } => write!(
        f,
        "No auth token for {} in ~/.npmrc and {} is not set",
        registry, var
      ),
    }
  }
}

/// External command errors
#[derive(Debug)]
pub enum CommandError {
  /// The program could not be started
  Spawn { command: String, reason: String },

  /// The program exited unsuccessfully
  Failed { command: String, status: Option<i32> },
}

impl CommandError {
  fn help_message(&self) -> Option<String> {
    match self {
      CommandError::Spawn { command, .. } => {
        let program = command.split_whitespace().next().unwrap_or(command);
        Some(format!("Make sure `{}` is installed and on PATH.", program))
      }
      CommandError::Failed { .. } => None,
    }
  }
}

impl fmt::Display for CommandError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      CommandError::Spawn { command, reason } => write!(f, "Failed to run `{}`: {}", command, reason),
      CommandError::Failed { command, status: Some(code) } => {
        write!(f, "Command `{}` exited with status {}", command, code)
      }
      CommandError::Failed { command, status: None } => write!(f, "Command `{}` was terminated", command),
    }
  }
}

/// Result type alias for monorail
pub type RailResult<T> = Result<T, RailError>;

/// Helper trait to add context to Results
pub trait ResultExt<T> {
  /// Add context to an error result
  fn context(self, ctx: impl Into<String>) -> RailResult<T>;

  /// Add context using a closure (lazy evaluation)
  fn with_context<F>(self, f: F) -> RailResult<T>
  where
    F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
  E: Into<RailError>,
{
  fn context(self, ctx: impl Into<String>) -> RailResult<T> {
    self.map_err(|e| e.into().context(ctx))
  }

  fn with_context<F>(self, f: F) -> RailResult<T>
  where
    F: FnOnce() -> String,
  {
    self.map_err(|e| e.into().context(f()))
  }
}

/// Pretty-print an error to stderr with help text
pub fn print_error(error: &RailError) {
  eprintln!("\n❌ {}\n", error);

  if let Some(help) = error.help_message() {
    eprintln!("💡 Help: {}\n", help);
  }
}
