//! Build directory management and explicit directory navigation.
//!
//! Every run works inside a build directory named after its selection. The
//! directory is destroyed and recreated at the start of a run so a build always
//! starts clean. Stages never change the process working directory; they carry
//! a [`Navigator`] and run commands in whatever absolute directory it points at.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::options::BuildOptions;

#[derive(Debug, Error)]
pub enum WorkspaceError {
  #[error("Cannot create temporary build folder: {path}: {source}")]
  Create {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to remove build folder '{path}': {source}")]
  Remove {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("refusing to change into relative path '{0}'")]
  NotAbsolute(PathBuf),
}

/// The home directory (where the executable and its patches live) and the
/// freshly created build directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
  home: PathBuf,
  build_dir: PathBuf,
}

impl Workspace {
  /// Path of the build directory for `options` under `parent`.
  pub fn build_dir_for(parent: &Path, options: &BuildOptions) -> PathBuf {
    parent.join(options.build_dir_name())
  }

  /// Remove any previous build directory for this selection and create an empty one.
  ///
  /// `parent` is made absolute first so every later stage can navigate by
  /// absolute paths.
  pub fn create(home: &Path, parent: &Path, options: &BuildOptions) -> Result<Self, WorkspaceError> {
    let parent = dunce::canonicalize(parent).map_err(|source| WorkspaceError::Create {
      path: Self::build_dir_for(parent, options),
      source,
    })?;
    let build_dir = Self::build_dir_for(&parent, options);

    match std::fs::remove_dir_all(&build_dir) {
      Ok(()) => info!(path = %build_dir.display(), "removed previous build folder"),
      Err(e) if e.kind() == io::ErrorKind::NotFound => {}
      Err(e) => warn!(path = %build_dir.display(), error = %e, "could not remove previous build folder"),
    }

    std::fs::create_dir(&build_dir).map_err(|source| WorkspaceError::Create {
      path: build_dir.clone(),
      source,
    })?;

    Ok(Self {
      home: home.to_path_buf(),
      build_dir,
    })
  }

  pub fn home(&self) -> &Path {
    &self.home
  }

  pub fn build_dir(&self) -> &Path {
    &self.build_dir
  }

  /// A navigator positioned at the build directory.
  pub fn navigator(&self) -> Navigator {
    Navigator {
      current: self.build_dir.clone(),
    }
  }

  /// Delete the build directory and everything in it.
  pub fn remove(&self) -> Result<(), WorkspaceError> {
    info!(path = %self.build_dir.display(), "cleaning up build folder");
    std::fs::remove_dir_all(&self.build_dir).map_err(|source| WorkspaceError::Remove {
      path: self.build_dir.clone(),
      source,
    })
  }
}

/// Tracks the directory the orchestration is currently working in.
///
/// The only way to move is [`Navigator::change_to`] with an absolute path;
/// there is no directory stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigator {
  current: PathBuf,
}

impl Navigator {
  pub fn new(start: impl Into<PathBuf>) -> Result<Self, WorkspaceError> {
    let start = start.into();
    if !start.is_absolute() {
      return Err(WorkspaceError::NotAbsolute(start));
    }
    Ok(Self { current: start })
  }

  pub fn change_to(&mut self, path: impl AsRef<Path>) -> Result<(), WorkspaceError> {
    let path = path.as_ref();
    if !path.is_absolute() {
      return Err(WorkspaceError::NotAbsolute(path.to_path_buf()));
    }
    debug!(from = %self.current.display(), to = %path.display(), "changing directory");
    self.current = path.to_path_buf();
    Ok(())
  }

  pub fn current(&self) -> &Path {
    &self.current
  }

  /// Resolve a path relative to the current directory.
  pub fn resolve(&self, relative: impl AsRef<Path>) -> PathBuf {
    self.current.join(relative)
  }
}
