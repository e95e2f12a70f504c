//! wasm-opt size pass
//!
//! Shrinks `.wasm` build outputs in place with binaryen's `wasm-opt -Oz`. The
//! binaryen release is downloaded once per platform into the user cache and
//! verified against its published SHA-256.
//!
//! The pass is best effort: [`run_pass`] logs every failure as a warning and
//! returns, so it can never fail a release.

use crate::core::config::ReleaseEnv;
use crate::core::error::{EnvironmentError, RailError, RailResult, ResultExt};
use crate::ui::progress::SharedProgress;
use rayon::prelude::*;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::process::Command;

pub const BINARYEN_VERSION: &str = "version_123";

const RELEASE_BASE: &str = "https://github.com/WebAssembly/binaryen/releases/download";

/// Build output directories scanned when no path is given
pub const DEFAULT_CANDIDATES: &[&str] = &["target/wasm", "target/wasm_web"];

const OPT_LEVEL: &str = "-Oz";

/// Host platform as named by binaryen release assets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinaryenPlatform {
  pub arch: &'static str,
  pub os: &'static str,
}

impl BinaryenPlatform {
  /// Map a Rust `(os, arch)` pair onto binaryen's asset naming
  pub fn for_host(os: &str, arch: &str) -> RailResult<Self> {
    let platform = match (os, arch) {
      ("linux", "x86_64") => Self { arch: "x86_64", os: "linux" },
      ("linux", "aarch64") => Self { arch: "aarch64", os: "linux" },
      ("macos", "x86_64") => Self { arch: "x86_64", os: "macos" },
      ("macos", "aarch64") => Self { arch: "arm64", os: "macos" },
      _ => {
        return Err(RailError::Environment(EnvironmentError::UnsupportedPlatform {
          os: os.to_string(),
          arch: arch.to_string(),
        }));
      }
    };
    Ok(platform)
  }

  pub fn current() -> RailResult<Self> {
    Self::for_host(std::env::consts::OS, std::env::consts::ARCH)
  }

  /// `binaryen-version_123-x86_64-linux`
  pub fn release_name(&self) -> String {
    format!("binaryen-{}-{}-{}", BINARYEN_VERSION, self.arch, self.os)
  }

  pub fn archive_url(&self) -> String {
    format!("{}/{}/{}.tar.gz", RELEASE_BASE, BINARYEN_VERSION, self.release_name())
  }

  pub fn checksum_url(&self) -> String {
    format!("{}.sha256", self.archive_url())
  }
}

/// Path of the cached `wasm-opt` executable for a platform
pub fn cached_tool(cache_dir: &Path, platform: &BinaryenPlatform) -> PathBuf {
  cache_dir
    .join(platform.release_name())
    .join(format!("binaryen-{}", BINARYEN_VERSION))
    .join("bin")
    .join("wasm-opt")
}

/// Directories or files to scan
pub fn candidates(root: &Path, target: Option<&Path>) -> Vec<PathBuf> {
  match target {
    Some(path) if path.is_absolute() => vec![path.to_path_buf()],
    Some(path) => vec![root.join(path)],
    None => DEFAULT_CANDIDATES.iter().map(|c| root.join(c)).collect(),
  }
}

fn is_wasm(path: &Path) -> bool {
  path.is_file() && path.extension().is_some_and(|ext| ext == "wasm")
}

fn wasm_in(dir: &Path) -> Vec<PathBuf> {
  let Ok(entries) = std::fs::read_dir(dir) else {
    return Vec::new();
  };
  entries
    .filter_map(Result::ok)
    .map(|e| e.path())
    .filter(|p| is_wasm(p))
    .collect()
}

/// `.wasm` files given directly, inside a candidate directory, or one level below it
pub fn discover_wasm_files(candidates: &[PathBuf]) -> Vec<PathBuf> {
  let mut files = Vec::new();

  for candidate in candidates {
    if is_wasm(candidate) {
      files.push(candidate.clone());
      continue;
    }
    if !candidate.is_dir() {
      continue;
    }

    files.extend(wasm_in(candidate));
    if let Ok(entries) = std::fs::read_dir(candidate) {
      for sub in entries.filter_map(Result::ok).map(|e| e.path()).filter(|p| p.is_dir()) {
        files.extend(wasm_in(&sub));
      }
    }
  }

  files.sort();
  files.dedup();
  files
}

/// Whether Cargo.toml leaves wasm-pack's own wasm-opt run enabled
pub fn wasm_pack_runs_wasm_opt(root: &Path) -> bool {
  let manifest = root.join("Cargo.toml");
  let Ok(content) = std::fs::read_to_string(&manifest) else {
    return false;
  };
  let Ok(doc) = content.parse::<toml_edit::DocumentMut>() else {
    return false;
  };

  let disabled = doc
    .get("package")
    .and_then(|p| p.get("metadata"))
    .and_then(|m| m.get("wasm-pack"))
    .and_then(|w| w.get("profile"))
    .and_then(|p| p.get("release"))
    .and_then(|r| r.get("wasm-opt"))
    .and_then(|v| v.as_bool())
    == Some(false);

  !disabled
}

fn expected_checksum(body: &str) -> RailResult<String> {
  body
    .split_whitespace()
    .next()
    .map(|h| h.to_ascii_lowercase())
    .ok_or_else(|| RailError::message("Empty checksum file for binaryen release"))
}

/// Verify `bytes` against a `.sha256` file body (`<hex>  <file name>`)
pub fn verify_checksum(bytes: &[u8], checksum_file: &str) -> RailResult<()> {
  let expected = expected_checksum(checksum_file)?;
  let actual = format!("{:x}", Sha256::digest(bytes));
  if actual != expected {
    return Err(RailError::message(format!(
      "Checksum mismatch for binaryen archive: expected {}, got {}",
      expected, actual
    )));
  }
  Ok(())
}

fn download(url: &str) -> RailResult<Vec<u8>> {
  tracing::debug!(%url, "downloading");
  let response = reqwest::blocking::get(url)?.error_for_status()?;
  Ok(response.bytes()?.to_vec())
}

fn unpack(archive: &[u8], dest: &Path) -> RailResult<()> {
  let decoder = flate2::read::GzDecoder::new(archive);
  let mut tar = tar::Archive::new(decoder);
  tar
    .unpack(dest)
    .with_context(|| format!("Failed to extract binaryen into {}", dest.display()))
}

/// Return the cached `wasm-opt`, downloading it first when absent
pub fn ensure_wasm_opt(cache_dir: &Path, platform: &BinaryenPlatform) -> RailResult<PathBuf> {
  let tool = cached_tool(cache_dir, platform);
  if tool.is_file() {
    tracing::debug!(path = %tool.display(), "using cached wasm-opt");
    return Ok(tool);
  }

  println!("📥 Downloading binaryen {} ({}-{})...", BINARYEN_VERSION, platform.arch, platform.os);
  let archive = download(&platform.archive_url())?;
  let checksum = download(&platform.checksum_url())?;
  verify_checksum(&archive, &String::from_utf8_lossy(&checksum))?;

  let final_dir = cache_dir.join(platform.release_name());
  let staging = cache_dir.join(format!(".{}.partial", platform.release_name()));
  if staging.exists() {
    std::fs::remove_dir_all(&staging)?;
  }
  std::fs::create_dir_all(&staging).with_context(|| format!("Failed to create {}", staging.display()))?;
  unpack(&archive, &staging)?;

  if final_dir.exists() {
    std::fs::remove_dir_all(&final_dir)?;
  }
  std::fs::rename(&staging, &final_dir).with_context(|| format!("Failed to move binaryen into {}", final_dir.display()))?;

  if !tool.is_file() {
    return Err(RailError::message(format!(
      "binaryen archive did not contain {}",
      tool.display()
    )));
  }
  Ok(tool)
}

fn optimize_file(tool: &Path, file: &Path) -> RailResult<()> {
  let output = Command::new(tool)
    .arg(OPT_LEVEL)
    .arg(file)
    .arg("-o")
    .arg(file)
    .output()
    .with_context(|| format!("Failed to run {}", tool.display()))?;

  if !output.status.success() {
    return Err(RailError::message(format!(
      "wasm-opt failed on {}: {}",
      file.display(),
      String::from_utf8_lossy(&output.stderr).trim()
    )));
  }
  Ok(())
}

fn try_run_pass(env: &ReleaseEnv, target: Option<&Path>) -> RailResult<usize> {
  let files = discover_wasm_files(&candidates(&env.root, target));
  if files.is_empty() {
    tracing::info!("no .wasm files found, skipping wasm-opt");
    return Ok(0);
  }

  if !env.skip_wasm_opt_advice && wasm_pack_runs_wasm_opt(&env.root) {
    tracing::warn!(
      "wasm-pack also runs wasm-opt; set `wasm-opt = false` under [package.metadata.wasm-pack.profile.release] in Cargo.toml to avoid optimizing twice"
    );
  }

  let platform = BinaryenPlatform::current()?;
  let tool = ensure_wasm_opt(&env.cache_dir, &platform)?;

  println!("🗜️  Optimizing {} wasm file(s) with wasm-opt {}...", files.len(), OPT_LEVEL);
  let progress = SharedProgress::new(files.len(), "wasm-opt");
  let failures: Vec<(PathBuf, RailError)> = files
    .par_iter()
    .filter_map(|file| {
      let result = optimize_file(&tool, file);
      progress.inc();
      result.err().map(|e| (file.clone(), e))
    })
    .collect();

  for (file, err) in &failures {
    tracing::warn!("wasm-opt skipped {}: {}", file.display(), err);
  }
  Ok(files.len() - failures.len())
}

/// Optimize `.wasm` files under `target` (or the default build directories).
///
/// Returns how many files were optimized. Never fails.
pub fn run_pass(env: &ReleaseEnv, target: Option<&Path>) -> usize {
  if env.skip_wasm_opt {
    tracing::info!("wasm-opt disabled by environment");
    return 0;
  }

  match try_run_pass(env, target) {
    Ok(count) => count,
    Err(err) => {
      tracing::warn!("wasm-opt pass skipped: {}", err);
      0
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_supported_platforms() {
    let p = BinaryenPlatform::for_host("macos", "aarch64").unwrap();
    assert_eq!(p.release_name(), "binaryen-version_123-arm64-macos");
    assert_eq!(
      p.archive_url(),
      "https://github.com/WebAssembly/binaryen/releases/download/version_123/binaryen-version_123-arm64-macos.tar.gz"
    );

    let p = BinaryenPlatform::for_host("linux", "x86_64").unwrap();
    assert_eq!(p.release_name(), "binaryen-version_123-x86_64-linux");
    assert!(p.checksum_url().ends_with(".tar.gz.sha256"));
  }

  #[test]
  fn test_unsupported_platform() {
    for (os, arch) in [("windows", "x86_64"), ("linux", "riscv64"), ("freebsd", "x86_64")] {
      assert!(matches!(
        BinaryenPlatform::for_host(os, arch).unwrap_err(),
        RailError::Environment(EnvironmentError::UnsupportedPlatform { .. })
      ));
    }
  }

  #[test]
  fn test_discovery_depth_and_order() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    std::fs::create_dir_all(root.join("target/wasm/pkg/deep")).unwrap();
    std::fs::create_dir_all(root.join("target/wasm_web")).unwrap();
    std::fs::write(root.join("target/wasm/b.wasm"), "").unwrap();
    std::fs::write(root.join("target/wasm/a.js"), "").unwrap();
    std::fs::write(root.join("target/wasm/pkg/a.wasm"), "").unwrap();
    std::fs::write(root.join("target/wasm/pkg/deep/ignored.wasm"), "").unwrap();
    std::fs::write(root.join("target/wasm_web/c.wasm"), "").unwrap();

    let files = discover_wasm_files(&candidates(root, None));
    assert_eq!(
      files,
      vec![
        root.join("target/wasm/b.wasm"),
        root.join("target/wasm/pkg/a.wasm"),
        root.join("target/wasm_web/c.wasm"),
      ]
    );
  }

  #[test]
  fn test_direct_file_and_dedup() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("one.wasm"), "").unwrap();
    let file = dir.path().join("one.wasm");
    let files = discover_wasm_files(&[file.clone(), dir.path().to_path_buf()]);
    assert_eq!(files, vec![file]);
  }

  #[test]
  fn test_empty_directory_downloads_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    std::fs::create_dir_all(root.join("out")).unwrap();
    std::fs::write(root.join("out/index.js"), "").unwrap();

    let mut env = ReleaseEnv::for_test(root, root);
    env.skip_wasm_opt = false;
    env.cache_dir = root.join("cache");

    assert_eq!(run_pass(&env, Some(Path::new("out"))), 0);
    assert!(!env.cache_dir.exists());
  }

  #[test]
  fn test_skip_flag_short_circuits() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("target/wasm")).unwrap();
    std::fs::write(dir.path().join("target/wasm/x.wasm"), "").unwrap();

    let env = ReleaseEnv::for_test(dir.path(), dir.path());
    assert_eq!(run_pass(&env, None), 0);
    assert!(!env.cache_dir.exists());
  }

  #[test]
  fn test_wasm_pack_advisory_detection() {
    let dir = tempfile::tempdir().unwrap();
    assert!(!wasm_pack_runs_wasm_opt(dir.path()));

    std::fs::write(dir.path().join("Cargo.toml"), "[package]\nname = \"core\"\n").unwrap();
    assert!(wasm_pack_runs_wasm_opt(dir.path()));

    std::fs::write(
      dir.path().join("Cargo.toml"),
      "[package]\nname = \"core\"\n\n[package.metadata.wasm-pack.profile.release]\nwasm-opt = false\n",
    )
    .unwrap();
    assert!(!wasm_pack_runs_wasm_opt(dir.path()));
  }

  #[test]
  fn test_checksum_verification() {
    let body = b"binaryen";
    let hex = format!("{:x}", Sha256::digest(body));
    verify_checksum(body, &format!("{}  binaryen-version_123-x86_64-linux.tar.gz\n", hex)).unwrap();
    assert!(verify_checksum(b"tampered", &hex).is_err());
    assert!(verify_checksum(body, "").is_err());
  }

  #[cfg(unix)]
  fn install_fake_wasm_opt(cache_dir: &Path, script: &str) -> Option<PathBuf> {
    use std::os::unix::fs::PermissionsExt;

    let platform = BinaryenPlatform::current().ok()?;
    let tool = cached_tool(cache_dir, &platform);
    std::fs::create_dir_all(tool.parent().unwrap()).unwrap();
    std::fs::write(&tool, script).unwrap();
    std::fs::set_permissions(&tool, std::fs::Permissions::from_mode(0o755)).unwrap();
    Some(tool)
  }

  #[cfg(unix)]
  fn wasm_fixture(root: &Path) -> ReleaseEnv {
    std::fs::create_dir_all(root.join("target/wasm/pkg")).unwrap();
    std::fs::write(root.join("target/wasm/a.wasm"), "raw").unwrap();
    std::fs::write(root.join("target/wasm/pkg/b.wasm"), "raw").unwrap();

    let mut env = ReleaseEnv::for_test(root, root);
    env.skip_wasm_opt = false;
    env
  }

  #[cfg(unix)]
  #[test]
  fn test_pass_rewrites_files_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let env = wasm_fixture(dir.path());
    // Invoked as `wasm-opt -Oz <in> -o <out>`
    let script = "#!/bin/sh\n[ \"$1\" = \"-Oz\" ] || exit 2\nprintf 'opt' > \"$4\"\n";
    if install_fake_wasm_opt(&env.cache_dir, script).is_none() {
      return;
    }

    assert_eq!(run_pass(&env, None), 2);
    for file in ["target/wasm/a.wasm", "target/wasm/pkg/b.wasm"] {
      assert_eq!(std::fs::read_to_string(dir.path().join(file)).unwrap(), "opt");
    }
  }

  #[cfg(unix)]
  #[test]
  fn test_tool_failure_is_swallowed() {
    let dir = tempfile::tempdir().unwrap();
    let env = wasm_fixture(dir.path());
    if install_fake_wasm_opt(&env.cache_dir, "#!/bin/sh\necho broken >&2\nexit 1\n").is_none() {
      return;
    }

    assert_eq!(run_pass(&env, None), 0);
    assert_eq!(std::fs::read_to_string(dir.path().join("target/wasm/a.wasm")).unwrap(), "raw");
  }

  #[test]
  fn test_cached_tool_is_reused() {
    let dir = tempfile::tempdir().unwrap();
    let platform = BinaryenPlatform::for_host("linux", "x86_64").unwrap();
    let tool = cached_tool(dir.path(), &platform);
    std::fs::create_dir_all(tool.parent().unwrap()).unwrap();
    std::fs::write(&tool, "").unwrap();

    assert_eq!(ensure_wasm_opt(dir.path(), &platform).unwrap(), tool);
  }
}
