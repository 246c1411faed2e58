//! Interpreter for component tables.

use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::types::{BuildError, ComponentSpec, MakeStep, PostAction};
use crate::acquire::Sources;
use crate::execute::{BuildCommand, CommandRunner};
use crate::options::BuildOptions;
use crate::placeholder::{PlaceholderError, substitute};
use crate::toolchain::Environment;
use crate::workspace::Navigator;

/// Render one make step into a command.
///
/// Every template is substituted before the command exists, so an unresolved
/// tool is reported here and never reaches the runner.
pub fn render_step(step: &MakeStep, options: &BuildOptions, env: &Environment) -> Result<BuildCommand, PlaceholderError> {
  let mut cmd = BuildCommand::new("make");

  if step.parallel {
    cmd = cmd.arg("-j").arg(options.jobs.to_string());
  }
  if let Some(dir) = step.directory {
    cmd = cmd.arg("-C").arg(dir);
  }
  if let Some(makefile) = step.makefiles.iter().find(|choice| choice.when.holds(options)) {
    cmd = cmd.arg("-f").arg(makefile.value);
  }

  for flag in step.flags.iter().filter(|flag| flag.when.holds(options)) {
    let value = substitute(flag.value, env)?;
    cmd = cmd.arg(format!("{}={value}", flag.name));
  }

  let targets = step.targets.iter().filter(|target| target.when.holds(options));
  Ok(cmd.args(targets.map(|target| target.value)))
}

/// Builds components one after another.
pub struct Sequencer<'a, R> {
  options: &'a BuildOptions,
  env: &'a Environment,
  runner: &'a R,
  sources: &'a Sources,
  patch_dir: &'a Path,
  build_dir: &'a Path,
}

impl<'a, R: CommandRunner> Sequencer<'a, R> {
  pub fn new(
    options: &'a BuildOptions,
    env: &'a Environment,
    runner: &'a R,
    sources: &'a Sources,
    patch_dir: &'a Path,
    build_dir: &'a Path,
  ) -> Self {
    Self {
      options,
      env,
      runner,
      sources,
      patch_dir,
      build_dir,
    }
  }

  pub fn options(&self) -> &BuildOptions {
    self.options
  }

  pub fn build_dir(&self) -> &Path {
    self.build_dir
  }

  /// Build `specs` in order, returning the executables moved into the build
  /// directory. The first failure ends the run.
  pub async fn run_all(&self, specs: &[ComponentSpec], nav: &mut Navigator) -> Result<Vec<PathBuf>, BuildError> {
    let mut produced = Vec::new();
    for spec in specs {
      produced.extend(self.run(spec, nav).await?);
    }
    Ok(produced)
  }

  /// Build a single component and return to the build directory.
  pub async fn run(&self, spec: &ComponentSpec, nav: &mut Navigator) -> Result<Vec<PathBuf>, BuildError> {
    if !spec.when.holds(self.options) {
      debug!(component = spec.name, "not needed for this selection");
      return Ok(Vec::new());
    }

    info!(component = spec.name, "building");
    nav.change_to(self.component_dir(spec))?;

    self.apply_patch(spec, nav).await?;

    for step in spec.steps.iter().filter(|step| step.when.holds(self.options)) {
      let cmd = render_step(step, self.options, self.env)?;
      self.execute(spec, &cmd, nav).await?;
    }

    let mut produced = Vec::new();
    for action in spec.post {
      if let Some(path) = self.post_action(action, nav).await? {
        produced.push(path);
      }
    }

    nav.change_to(self.build_dir)?;
    Ok(produced)
  }

  fn component_dir(&self, spec: &ComponentSpec) -> PathBuf {
    let root = self.sources.get(spec.root);
    if spec.subdir.is_empty() {
      root.to_path_buf()
    } else {
      root.join(spec.subdir)
    }
  }

  async fn apply_patch(&self, spec: &ComponentSpec, nav: &Navigator) -> Result<(), BuildError> {
    let patch = self.patch_dir.join(format!("{}.patch", spec.slug));
    if !patch.is_file() {
      return Ok(());
    }

    info!(component = spec.name, patch = %patch.display(), "applying patch");
    let cmd = BuildCommand::new("patch").arg("-p0").stdin(patch);
    self.execute(spec, &cmd, nav).await
  }

  async fn execute(&self, spec: &ComponentSpec, cmd: &BuildCommand, nav: &Navigator) -> Result<(), BuildError> {
    debug!(component = spec.name, cmd = %cmd, "running");
    let output = self.runner.run(cmd, nav.current()).await?;

    if self.options.verbose && !output.is_empty() {
      info!(component = spec.name, "{output}");
    }
    Ok(())
  }

  async fn post_action(&self, action: &PostAction, nav: &Navigator) -> Result<Option<PathBuf>, BuildError> {
    match *action {
      PostAction::Relocate { from, to, when } => {
        if !when.holds(self.options) {
          return Ok(None);
        }

        let from = nav.resolve(from);
        let to = self.build_dir.join(to);
        tokio::fs::rename(&from, &to)
          .await
          .map_err(|source| BuildError::Relocate {
            from: from.clone(),
            to: to.clone(),
            source,
          })?;

        info!(artifact = %to.display(), "relocated");
        Ok(Some(to))
      }
      PostAction::Link { dependency, subdir, link } => {
        let root = self.sources.get(dependency);
        let target = if subdir.is_empty() {
          root.to_path_buf()
        } else {
          root.join(subdir)
        };
        let link = nav.resolve(link);

        symlink_dir(&target, &link).map_err(|source| BuildError::Link {
          link: link.clone(),
          target: target.clone(),
          source,
        })?;

        debug!(link = %link.display(), target = %target.display(), "linked");
        Ok(None)
      }
    }
  }
}

#[cfg(unix)]
fn symlink_dir(target: &Path, link: &Path) -> io::Result<()> {
  std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn symlink_dir(target: &Path, link: &Path) -> io::Result<()> {
  std::os::windows::fs::symlink_dir(target, link)
}
