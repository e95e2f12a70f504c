mod commands;
mod core;
mod napi;
mod release;
mod ui;

use clap::{Parser, Subcommand};
use core::config::ReleaseEnv;
use core::error::{RailError, print_error};
use core::runner::SystemRunner;
use release::ReleaseFlags;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Release napi native binaries and their wasm fallbacks from a pnpm monorepo
#[derive(Parser)]
#[command(name = "monorail")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(styles = get_styles())]
struct Cli {
  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Build and publish packages (default: the per-platform packages under npm/)
  Release {
    /// Publish the root meta-package from dist/ with platform packages as optional deps
    #[arg(long)]
    root: bool,
    /// Publish the wasm-bindgen Node fallback package
    #[arg(long)]
    wasm: bool,
    /// Publish the wasm-bindgen browser package
    #[arg(long)]
    wasm_web: bool,
    /// Publish the napi wasi package (wasm32-wasip1-threads)
    #[arg(long)]
    napi_wasm: bool,
    /// Only run wasm-opt, over PATH or target/wasm and target/wasm_web
    #[arg(long, value_name = "PATH", num_args = 0..=1)]
    wasm_opt: Option<Option<PathBuf>>,
    /// Distribution tag passed to the publish command
    #[arg(long)]
    tag: Option<String>,
  },

  /// Create missing stub packages for the configured targets
  Stubs,

  /// List supported platforms and target triples
  Targets {
    /// Show a single platform, by platform key or target triple
    key: Option<String>,
    /// Output the catalog as JSON
    #[arg(long)]
    json: bool,
  },
}

fn get_styles() -> clap::builder::Styles {
  clap::builder::Styles::styled()
    .usage(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .header(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .literal(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))))
    .invalid(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .error(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .valid(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
    )
    .placeholder(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))))
}

fn init_logging() {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("monorail=info"));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_target(false)
    .with_writer(std::io::stderr)
    .init();
}

fn main() {
  let cli = Cli::parse();
  init_logging();

  let cwd = match std::env::current_dir() {
    Ok(dir) => dir,
    Err(e) => {
      eprintln!("Error: Failed to get current directory: {}", e);
      std::process::exit(1);
    }
  };

  let result = match cli.command {
    Commands::Release {
      root,
      wasm,
      wasm_web,
      napi_wasm,
      wasm_opt,
      tag,
    } => {
      let flags = ReleaseFlags {
        root,
        wasm,
        wasm_web,
        napi_wasm,
        wasm_opt,
        tag,
      };
      ReleaseEnv::from_process(&cwd).and_then(|env| commands::run_release(flags, &env, &SystemRunner))
    }
    Commands::Stubs => ReleaseEnv::from_process(&cwd).and_then(|env| commands::run_stubs(&env)),
    Commands::Targets { key, json } => commands::run_targets(key.as_deref(), json),
  };

  if let Err(err) = result {
    handle_error(err);
  }
}

fn handle_error(err: RailError) -> ! {
  print_error(&err);
  std::process::exit(err.exit_code().as_i32());
}
