//! Shared test helpers for pipeline tests.
//!
//! Nothing here touches the network or a real cross compiler: sources are
//! faked by [`TreeAcquirer`], commands are recorded by [`RecordingRunner`]
//! and the toolchain is a directory of empty executables.

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use lmpcross_lib::acquire::{AcquireError, Acquirer};
use lmpcross_lib::config::BuildConfig;
use lmpcross_lib::execute::{BuildCommand, CommandRunner, ExecuteError};
use lmpcross_lib::options::{BuildOptions, RawOptions};
use lmpcross_lib::pipeline::Context;
use lmpcross_lib::toolchain::{Tool, ToolChain};
use lmpcross_lib::workspace::Workspace;
use tempfile::TempDir;

const LIBS: [&str; 9] = ["atc", "awpmd", "colvars", "gpu", "linalg", "meam", "poems", "smd", "voronoi"];

/// Records commands; fails the first one run in a directory ending with `fail_in`.
#[derive(Default)]
pub struct RecordingRunner {
  calls: Mutex<Vec<(BuildCommand, PathBuf)>>,
  fail_in: Option<&'static str>,
}

impl RecordingRunner {
  pub fn failing_in(dir: &'static str) -> Self {
    Self {
      fail_in: Some(dir),
      ..Self::default()
    }
  }

  pub fn calls(&self) -> Vec<(BuildCommand, PathBuf)> {
    self.calls.lock().unwrap().clone()
  }

  pub fn dirs(&self) -> Vec<PathBuf> {
    self.calls().into_iter().map(|(_, cwd)| cwd).collect()
  }
}

impl CommandRunner for RecordingRunner {
  async fn run(&self, cmd: &BuildCommand, cwd: &Path) -> Result<String, ExecuteError> {
    self.calls.lock().unwrap().push((cmd.clone(), cwd.to_path_buf()));

    if self.fail_in.is_some_and(|dir| cwd.ends_with(dir)) {
      return Err(ExecuteError::CmdFailed {
        cmd: cmd.command_line(),
        code: Some(2),
        output: "fatal error: mpi.h: No such file or directory".to_string(),
      });
    }
    Ok(String::new())
  }
}

/// Lays out the directory trees the real archives would unpack to,
/// including the files the make steps would have produced.
#[derive(Default)]
pub struct TreeAcquirer {
  fetched: Mutex<Vec<String>>,
  fail_on: Option<&'static str>,
}

impl TreeAcquirer {
  pub fn failing_on(needle: &'static str) -> Self {
    Self {
      fail_on: Some(needle),
      ..Self::default()
    }
  }

  pub fn fetched(&self) -> Vec<String> {
    self.fetched.lock().unwrap().clone()
  }
}

impl Acquirer for TreeAcquirer {
  async fn fetch(&self, url: &str, dest: &Path) -> Result<(), AcquireError> {
    if self.fail_on.is_some_and(|needle| url.contains(needle)) {
      return Err(AcquireError::Fetch {
        url: url.to_string(),
        message: "HTTP 503 Service Unavailable".to_string(),
      });
    }
    self.fetched.lock().unwrap().push(url.to_string());
    std::fs::write(dest, url)?;
    Ok(())
  }

  async fn unpack_archive(&self, archive: &Path, dest: &Path) -> Result<(), AcquireError> {
    let url = std::fs::read_to_string(archive)?;
    let file = url.rsplit('/').next().unwrap_or_default();

    if let Some(rev) = url.contains("/archive/").then(|| file.trim_end_matches(".tar.gz")) {
      let lammps = dest.join(format!("lammps-{rev}"));
      std::fs::create_dir_all(lammps.join("src/STUBS"))?;
      for lib in LIBS {
        std::fs::create_dir_all(lammps.join("lib").join(lib))?;
      }
      std::fs::write(lammps.join("lib/gpu/ocl_get_devices"), "")?;
      std::fs::write(lammps.join("src/lmp_serial"), "")?;
      std::fs::write(lammps.join("src/lmp_mpi"), "")?;
    } else if file.starts_with("mpich2-win") {
      std::fs::create_dir_all(dest.join(file.trim_end_matches("-devel.tar.gz")).join("include"))?;
    } else if file.starts_with("opencl") {
      std::fs::create_dir_all(dest.join("OpenCL/include"))?;
    } else if file.starts_with("eigen-") {
      std::fs::create_dir_all(dest.join(file.trim_end_matches(".tar.gz")).join("Eigen"))?;
    } else if file.starts_with("voro++") {
      let src = dest.join(file.trim_end_matches(".tar.gz")).join("src");
      std::fs::create_dir_all(&src)?;
      std::fs::write(src.join("voro++"), "")?;
    }
    Ok(())
  }

  async fn decompress(&self, file: &Path, dest: &Path) -> Result<(), AcquireError> {
    std::fs::copy(file, dest)?;
    Ok(())
  }
}

/// Isolated home, working directory and toolchain for one test.
pub struct TestEnv {
  pub temp: TempDir,
  pub options: BuildOptions,
}

impl TestEnv {
  pub fn new(raw: RawOptions) -> Self {
    let options = BuildOptions::from_raw(&RawOptions { jobs: 2, ..raw }).unwrap();
    Self {
      temp: TempDir::new().unwrap(),
      options,
    }
  }

  pub fn serial() -> Self {
    Self::new(RawOptions::default())
  }

  pub fn home(&self) -> PathBuf {
    let home = self.temp.path().join("home");
    std::fs::create_dir_all(&home).unwrap();
    dunce::canonicalize(&home).unwrap_or(home)
  }

  pub fn config(&self) -> BuildConfig {
    BuildConfig::new(&self.home())
  }

  /// A toolchain with every tool present.
  pub fn toolchain(&self) -> ToolChain {
    let bin = self.temp.path().join("bin");
    std::fs::create_dir_all(&bin).unwrap();
    for tool in Tool::ALL {
      let path = bin.join(tool.program(self.options.word_size));
      std::fs::write(&path, "#!/bin/sh\nexit 0\n").unwrap();
      std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    }
    ToolChain::resolve_in(self.options.word_size, Some(bin.as_os_str()), &bin)
  }

  pub fn context(&self, config: BuildConfig, toolchain: ToolChain) -> Context {
    let workspace = Workspace::create(&self.home(), self.temp.path(), &self.options).unwrap();
    Context::new(self.options.clone(), config, workspace, toolchain)
  }

  pub fn default_context(&self) -> Context {
    self.context(self.config(), self.toolchain())
  }
}
