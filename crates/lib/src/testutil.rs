//! Test utilities for lmpcross-lib.
//!
//! Helpers for tests that need executables on a synthetic search path,
//! commands that behave predictably on the host, or a runner that only
//! records what it was asked to do.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::execute::{BuildCommand, CommandRunner, ExecuteError};
#[cfg(unix)]
use crate::options::WordSize;
#[cfg(unix)]
use crate::toolchain::{Tool, ToolChain};

/// Create an empty executable file at `path`.
#[cfg(unix)]
pub fn write_executable(path: &Path) {
  use std::os::unix::fs::PermissionsExt;

  std::fs::write(path, "#!/bin/sh\nexit 0\n").unwrap();
  std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).unwrap();
}

/// Write every tool of the word size's family into `dir` and resolve against it.
#[cfg(unix)]
pub fn fake_toolchain(word_size: WordSize, dir: &Path) -> ToolChain {
  for tool in Tool::ALL {
    write_executable(&dir.join(tool.program(word_size)));
  }
  ToolChain::resolve_in(word_size, Some(dir.as_os_str()), dir)
}

/// Returns a command that runs a shell script.
#[cfg(unix)]
pub fn shell_cmd(script: &str) -> BuildCommand {
  BuildCommand::new("/bin/sh").arg("-c").arg(script)
}

#[cfg(windows)]
pub fn shell_cmd(script: &str) -> BuildCommand {
  BuildCommand::new("cmd.exe").arg("/C").arg(script)
}

/// Returns a command that creates a marker file in the current directory.
#[cfg(unix)]
pub fn touch_file(filename: &str) -> BuildCommand {
  BuildCommand::new("touch").arg(filename)
}

#[cfg(windows)]
pub fn touch_file(filename: &str) -> BuildCommand {
  BuildCommand::new("powershell.exe")
    .arg("-NoProfile")
    .arg("-Command")
    .arg(format!("New-Item -ItemType File -Path '{}' -Force | Out-Null", filename))
}

/// Records commands instead of running them.
///
/// A command whose working directory ends with `fail_in` fails with a
/// recognizable make error as its output.
#[derive(Debug, Default)]
pub struct RecordingRunner {
  calls: Mutex<Vec<(BuildCommand, PathBuf)>>,
  pub fail_in: Option<&'static str>,
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
}

impl CommandRunner for RecordingRunner {
  async fn run(&self, cmd: &BuildCommand, cwd: &Path) -> Result<String, ExecuteError> {
    self.calls.lock().unwrap().push((cmd.clone(), cwd.to_path_buf()));

    if self.fail_in.is_some_and(|dir| cwd.ends_with(dir)) {
      return Err(ExecuteError::CmdFailed {
        cmd: cmd.command_line(),
        code: Some(2),
        output: format!("make: *** [{}] Error 1", cwd.display()),
      });
    }
    Ok(format!("ran {}", cmd.program()))
  }
}
