//! External command execution.
//!
//! Build steps are plain argument vectors executed without a shell. A command
//! is awaited to completion before the orchestration moves on; stdout and
//! stderr are captured and returned (or attached to the error) as one text.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ExecuteError {
  /// Command ran and exited unsuccessfully.
  #[error("command failed with exit code {code:?}: {cmd}\n{output}")]
  CmdFailed {
    cmd: String,
    code: Option<i32>,
    output: String,
  },

  /// Command could not be started at all.
  #[error("failed to run '{cmd}': {source}")]
  Spawn {
    cmd: String,
    #[source]
    source: io::Error,
  },
}

/// A single external command: program, arguments and optional stdin file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildCommand {
  program: String,
  args: Vec<String>,
  stdin: Option<PathBuf>,
}

impl BuildCommand {
  pub fn new(program: impl Into<String>) -> Self {
    Self {
      program: program.into(),
      args: Vec::new(),
      stdin: None,
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

  /// Feed the contents of `path` to the command's standard input.
  pub fn stdin(mut self, path: impl Into<PathBuf>) -> Self {
    self.stdin = Some(path.into());
    self
  }

  pub fn program(&self) -> &str {
    &self.program
  }

  pub fn get_args(&self) -> &[String] {
    &self.args
  }

  pub fn get_stdin(&self) -> Option<&Path> {
    self.stdin.as_deref()
  }

  /// Returns the value of the first `NAME=value` argument for `name`.
  pub fn var(&self, name: &str) -> Option<&str> {
    self
      .args
      .iter()
      .find_map(|arg| arg.strip_prefix(name).and_then(|rest| rest.strip_prefix('=')))
  }

  /// The command rendered as a shell command line, for logs and errors.
  pub fn command_line(&self) -> String {
    let mut line = quote(&self.program);
    for arg in &self.args {
      line.push(' ');
      line.push_str(&quote(arg));
    }
    if let Some(stdin) = &self.stdin {
      line.push_str(" < ");
      line.push_str(&quote(&stdin.to_string_lossy()));
    }
    line
  }
}

impl fmt::Display for BuildCommand {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.command_line())
  }
}

/// Single-quote `s` if a POSIX shell would otherwise split or expand it.
fn quote(s: &str) -> String {
  let plain = !s.is_empty()
    && s
      .chars()
      .all(|c| c.is_ascii_alphanumeric() || "-_./=:+,@%".contains(c));
  if plain {
    s.to_string()
  } else {
    format!("'{}'", s.replace('\'', r"'\''"))
  }
}

/// Runs external commands for the orchestration.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
  /// Run `cmd` in `cwd` to completion.
  ///
  /// Returns the combined output on success, [`ExecuteError::CmdFailed`] with
  /// the same output on a non-zero exit.
  async fn run(&self, cmd: &BuildCommand, cwd: &Path) -> Result<String, ExecuteError>;
}

/// Runs commands as child processes of this one.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
  async fn run(&self, cmd: &BuildCommand, cwd: &Path) -> Result<String, ExecuteError> {
    let line = cmd.command_line();
    debug!(cmd = %line, "executing command");

    let spawn_err = |source| ExecuteError::Spawn {
      cmd: line.clone(),
      source,
    };

    let stdin = match cmd.get_stdin() {
      Some(path) => Stdio::from(std::fs::File::open(path).map_err(spawn_err)?),
      None => Stdio::null(),
    };

    debug!(working_dir = %cwd.display(), "spawning process");

    let output = Command::new(cmd.program())
      .args(cmd.get_args())
      .current_dir(cwd)
      .stdin(stdin)
      .stdout(Stdio::piped())
      .stderr(Stdio::piped())
      .output()
      .await
      .map_err(spawn_err)?;

    let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
    combined.push_str(&String::from_utf8_lossy(&output.stderr));

    if !output.status.success() {
      return Err(ExecuteError::CmdFailed {
        cmd: line,
        code: output.status.code(),
        output: combined,
      });
    }

    if !combined.is_empty() {
      debug!(output = %combined, "command output");
    }

    Ok(combined)
  }
}
