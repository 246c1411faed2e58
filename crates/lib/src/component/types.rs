//! Types describing component builds.
//!
//! A [`ComponentSpec`] is static configuration: where the component lives, the
//! make invocations that build it, and what to do with the result. Values that
//! depend on the selection are `$${...}` templates (see [`crate::placeholder`]);
//! entries that only apply to some selections carry a [`When`] condition.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::acquire::{AcquireError, Dependency};
use crate::execute::ExecuteError;
use crate::options::{BuildOptions, Threads, Transport, WordSize};
use crate::placeholder::PlaceholderError;
use crate::workspace::WorkspaceError;

/// Errors that abort a build.
#[derive(Debug, Error)]
pub enum BuildError {
  #[error(transparent)]
  Placeholder(#[from] PlaceholderError),

  #[error(transparent)]
  Execute(#[from] ExecuteError),

  #[error(transparent)]
  Workspace(#[from] WorkspaceError),

  #[error(transparent)]
  Acquire(#[from] AcquireError),

  #[error("failed to move '{}' to '{}': {source}", .from.display(), .to.display())]
  Relocate {
    from: PathBuf,
    to: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to link '{}' to '{}': {source}", .link.display(), .target.display())]
  Link {
    link: PathBuf,
    target: PathBuf,
    #[source]
    source: io::Error,
  },
}

impl BuildError {
  /// Captured output of the failed command, if a command failed.
  pub fn command_output(&self) -> Option<&str> {
    match self {
      Self::Execute(ExecuteError::CmdFailed { output, .. }) => Some(output),
      _ => None,
    }
  }
}

/// Condition under which a table entry applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum When {
  Always,
  Transport(Transport),
  Threads(Threads),
  WordSize(WordSize),
}

impl When {
  pub fn holds(&self, options: &BuildOptions) -> bool {
    match self {
      Self::Always => true,
      Self::Transport(transport) => options.transport == *transport,
      Self::Threads(threads) => options.threads == *threads,
      Self::WordSize(word_size) => options.word_size == *word_size,
    }
  }
}

/// A conditional literal, used for makefile variants and make targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Choice {
  pub value: &'static str,
  pub when: When,
}

impl Choice {
  pub const fn always(value: &'static str) -> Self {
    Self {
      value,
      when: When::Always,
    }
  }

  pub const fn when(when: When, value: &'static str) -> Self {
    Self { value, when }
  }
}

/// A `NAME=value` make variable whose value is a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Flag {
  pub name: &'static str,
  pub value: &'static str,
  pub when: When,
}

impl Flag {
  pub const fn always(name: &'static str, value: &'static str) -> Self {
    Self {
      name,
      value,
      when: When::Always,
    }
  }

  pub const fn when(when: When, name: &'static str, value: &'static str) -> Self {
    Self { name, value, when }
  }
}

/// One make invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MakeStep {
  /// Pass `-j <jobs>`.
  pub parallel: bool,
  /// Pass `-C <dir>`.
  pub directory: Option<&'static str>,
  /// Makefile variants; the first that applies is passed with `-f`.
  pub makefiles: &'static [Choice],
  pub flags: &'static [Flag],
  /// Every target that applies is passed, in order.
  pub targets: &'static [Choice],
  pub when: When,
}

impl MakeStep {
  pub const SERIAL: MakeStep = MakeStep {
    parallel: false,
    directory: None,
    makefiles: &[],
    flags: &[],
    targets: &[],
    when: When::Always,
  };

  pub const PARALLEL: MakeStep = MakeStep {
    parallel: true,
    ..MakeStep::SERIAL
  };
}

/// What to do once a component's make steps succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostAction {
  /// Move `from` (relative to the component directory) to `to` in the build directory.
  Relocate {
    from: &'static str,
    to: &'static str,
    when: When,
  },
  /// Create `link` in the component directory pointing at `subdir` of a dependency tree.
  Link {
    dependency: Dependency,
    subdir: &'static str,
    link: &'static str,
  },
}

/// Static description of how to build one component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComponentSpec {
  /// Display name.
  pub name: &'static str,
  /// Base name of the optional `<slug>.patch` file.
  pub slug: &'static str,
  /// Tree the component lives in.
  pub root: Dependency,
  /// Directory relative to `root`; empty for the root itself.
  pub subdir: &'static str,
  pub when: When,
  pub steps: &'static [MakeStep],
  pub post: &'static [PostAction],
}
