//! The complete build, from download to the final executable.
//!
//! Stages run strictly one after another: acquisition, the component table,
//! final assembly and (if configured) cleanup. Every failure ends the run.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::info;

use crate::acquire::{Acquirer, acquire_all, artifacts};
use crate::assembly::assemble;
use crate::component::{BuildError, COMPONENTS, Sequencer};
use crate::config::BuildConfig;
use crate::execute::CommandRunner;
use crate::options::BuildOptions;
use crate::toolchain::{Environment, ToolChain};
use crate::workspace::Workspace;

/// Everything a run needs, assembled once at startup.
#[derive(Debug)]
pub struct Context {
  pub options: BuildOptions,
  pub config: BuildConfig,
  pub workspace: Workspace,
  pub env: Environment,
}

impl Context {
  pub fn new(options: BuildOptions, config: BuildConfig, workspace: Workspace, toolchain: ToolChain) -> Self {
    let env = Environment::new(&options, toolchain, workspace.build_dir());
    Self {
      options,
      config,
      workspace,
      env,
    }
  }
}

/// Outcome of a successful run.
#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
  pub options: BuildOptions,
  pub build_dir: PathBuf,
  /// Executables moved into the build directory, in the order they were produced.
  pub artifacts: Vec<PathBuf>,
  /// The LAMMPS executable itself.
  pub executable: PathBuf,
  /// Whether the build directory was removed afterwards.
  pub cleaned: bool,
  #[serde(rename = "elapsed_secs", serialize_with = "as_secs")]
  pub elapsed: Duration,
}

fn as_secs<S: serde::Serializer>(elapsed: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
  serializer.serialize_f64(elapsed.as_secs_f64())
}

/// Run the whole build in the context's workspace.
pub async fn build(
  ctx: &Context,
  runner: &impl CommandRunner,
  acquirer: &impl Acquirer,
) -> Result<BuildReport, BuildError> {
  let start = Instant::now();
  let build_dir = ctx.workspace.build_dir();
  let mut nav = ctx.workspace.navigator();

  info!(build_dir = %build_dir.display(), "downloading and unpacking sources");
  let sources = acquire_all(acquirer, &artifacts(&ctx.options, &ctx.config), build_dir).await?;

  let sequencer = Sequencer::new(
    &ctx.options,
    &ctx.env,
    runner,
    &sources,
    &ctx.config.patch_dir,
    build_dir,
  );
  let mut produced = sequencer.run_all(COMPONENTS, &mut nav).await?;

  let executable = assemble(&sequencer, &mut nav).await?;
  produced.push(executable.clone());
  info!(executable = %executable.display(), "build complete");

  let cleaned = if ctx.config.cleanup {
    ctx.workspace.remove()?;
    true
  } else {
    info!(build_dir = %build_dir.display(), "keeping build folder");
    false
  };

  Ok(BuildReport {
    options: ctx.options.clone(),
    build_dir: build_dir.to_path_buf(),
    artifacts: produced,
    executable,
    cleaned,
    elapsed: start.elapsed(),
  })
}
