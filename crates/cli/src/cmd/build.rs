//! Implementation of the build flow.
//!
//! Validates the selection, prints the settings, prepares a fresh build
//! folder in the current directory and runs the pipeline to completion.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use lmpcross_lib::acquire::HttpAcquirer;
use lmpcross_lib::config::BuildConfig;
use lmpcross_lib::execute::ProcessRunner;
use lmpcross_lib::options::{BuildOptions, RawOptions};
use lmpcross_lib::pipeline::{BuildReport, Context as BuildContext, build};
use lmpcross_lib::toolchain::ToolChain;
use lmpcross_lib::workspace::Workspace;

use crate::output::{OutputFormat, format_duration, print_info, print_json, print_stat, print_success, print_warning};

pub struct BuildArgs {
  pub raw: RawOptions,
  pub cleanup: bool,
  pub format: OutputFormat,
}

pub fn cmd_build(args: BuildArgs) -> Result<()> {
  let options = BuildOptions::from_raw(&args.raw)?;
  debug!(revision = %options.revision, kind = ?options.revision.kind(), "validated selection");

  let home = home_dir()?;
  let mut config = BuildConfig::from_env(&home)?;
  config.cleanup |= args.cleanup;
  debug!(?config, "configuration");

  let cwd = std::env::current_dir().context("Failed to determine current directory")?;
  let toolchain = ToolChain::resolve(options.word_size);

  if !args.format.is_json() {
    print_settings(&options, &home, &Workspace::build_dir_for(&cwd, &options), &toolchain);
  }
  for entry in toolchain.missing() {
    print_warning(&format!(
      "{} ({}) not found in PATH",
      entry.program,
      entry.tool.label()
    ));
  }

  let workspace = Workspace::create(&home, &cwd, &options)?;
  let ctx = BuildContext::new(options, config, workspace, toolchain);

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let report = rt.block_on(build(&ctx, &ProcessRunner, &HttpAcquirer::new()))?;

  if args.format.is_json() {
    print_json(&report)?;
  } else {
    print_report(&report);
  }

  Ok(())
}

/// Directory holding the running executable; patches are looked up there.
fn home_dir() -> Result<PathBuf> {
  let exe = std::env::current_exe().context("Failed to locate the running executable")?;
  let exe = dunce::canonicalize(&exe).unwrap_or(exe);
  exe
    .parent()
    .map(Path::to_path_buf)
    .context("Executable has no parent directory")
}

fn print_settings(options: &BuildOptions, home: &Path, build_dir: &Path, toolchain: &ToolChain) {
  print_info(&format!(
    "Settings: building LAMMPS revision {} for {}-bit Windows",
    options.revision, options.word_size
  ));
  print_stat("Message passing", options.transport.as_str());
  print_stat("Multi-threading", options.threads.as_str());
  print_stat("Parallel jobs", &options.jobs.to_string());
  print_stat("Home folder", &home.display().to_string());
  print_stat("Build folder", &build_dir.display().to_string());

  for entry in toolchain.entries() {
    let location = entry
      .path
      .as_ref()
      .map(|path| path.display().to_string())
      .unwrap_or_else(|| "not found".to_string());
    print_stat(entry.tool.label(), &location);
  }
  println!();
}

fn print_report(report: &BuildReport) {
  println!();
  print_success(&format!(
    "Build complete in {}",
    format_duration(report.elapsed)
  ));
  print_stat("LAMMPS", &report.executable.display().to_string());
  for artifact in report.artifacts.iter().filter(|path| **path != report.executable) {
    print_stat("Helper", &artifact.display().to_string());
  }

  if report.cleaned {
    print_info(&format!("Removed build folder {}", report.build_dir.display()));
  } else {
    print_stat("Build folder", &report.build_dir.display().to_string());
  }
}
