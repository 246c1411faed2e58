//! Acquisition of third-party sources, helper executables and the LAMMPS tree.
//!
//! The orchestrator only needs three primitives, expressed by [`Acquirer`]:
//! fetch a URL to a file, unpack an archive into a directory, and decompress a
//! single gzip'd file. [`acquire_all`] drives them over the fixed artifact list
//! and then locates the unpacked trees later stages need.

mod http;

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

pub use http::HttpAcquirer;

use crate::config::BuildConfig;
use crate::consts::{EIGEN_VERSION, VORO_VERSION};
use crate::options::BuildOptions;

#[derive(Debug, Error)]
pub enum AcquireError {
  #[error("fetch failed for {url}: {message}")]
  Fetch { url: String, message: String },

  #[error("failed to unpack '{path}': {source}")]
  Unpack {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to decompress '{path}': {source}")]
  Decompress {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("no directory starting with '{prefix}' in {}", .dir.display())]
  NotFound { prefix: String, dir: PathBuf },

  #[error("io error: {0}")]
  Io(#[from] io::Error),
}

/// The download and unpack primitives.
#[allow(async_fn_in_trait)]
pub trait Acquirer {
  /// Download `url` to the file `dest`.
  async fn fetch(&self, url: &str, dest: &Path) -> Result<(), AcquireError>;

  /// Unpack a `.tar.gz` archive into `dest`, keeping its top-level directory.
  async fn unpack_archive(&self, archive: &Path, dest: &Path) -> Result<(), AcquireError>;

  /// Decompress a gzip'd file to `dest`.
  async fn decompress(&self, file: &Path, dest: &Path) -> Result<(), AcquireError>;
}

/// Unpacked trees that later stages refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dependency {
  Eigen,
  Voro,
  Lammps,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactKind {
  /// A gzip'd executable, stored in the build directory as `name`.
  Executable { name: String },
  /// A source tarball; `locate` names the unpacked directory by prefix.
  Archive { locate: Option<(Dependency, String)> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
  pub label: &'static str,
  pub url: String,
  pub kind: ArtifactKind,
}

/// Everything a build downloads, in download order.
pub fn artifacts(options: &BuildOptions, config: &BuildConfig) -> Vec<Artifact> {
  let url = &config.thirdparty_url;
  let bits = options.word_size;
  let rev = &options.revision;

  vec![
    Artifact {
      label: "FFMpeg",
      url: format!("{url}/ffmpeg-win{bits}.exe.gz"),
      kind: ArtifactKind::Executable {
        name: "ffmpeg.exe".to_string(),
      },
    },
    Artifact {
      label: "gzip",
      url: format!("{url}/gzip.exe.gz"),
      kind: ArtifactKind::Executable {
        name: "gzip.exe".to_string(),
      },
    },
    Artifact {
      label: "MPICH2",
      url: format!("{url}/mpich2-win{bits}-devel.tar.gz"),
      kind: ArtifactKind::Archive { locate: None },
    },
    Artifact {
      label: "OpenCL",
      url: format!("{url}/opencl-win-devel.tar.gz"),
      kind: ArtifactKind::Archive { locate: None },
    },
    Artifact {
      label: "Eigen3",
      url: format!("{url}/eigen-{EIGEN_VERSION}.tar.gz"),
      kind: ArtifactKind::Archive {
        locate: Some((Dependency::Eigen, "eigen-".to_string())),
      },
    },
    Artifact {
      label: "Voro++",
      url: format!("{url}/voro++-{VORO_VERSION}.tar.gz"),
      kind: ArtifactKind::Archive {
        locate: Some((Dependency::Voro, "voro++".to_string())),
      },
    },
    Artifact {
      label: "LAMMPS",
      url: format!("{}/{rev}.tar.gz", config.source_url),
      kind: ArtifactKind::Archive {
        locate: Some((Dependency::Lammps, format!("lammps-{rev}"))),
      },
    },
  ]
}

/// Absolute locations of the unpacked trees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sources {
  pub eigen: PathBuf,
  pub voro: PathBuf,
  pub lammps: PathBuf,
}

impl Sources {
  pub fn get(&self, dependency: Dependency) -> &Path {
    match dependency {
      Dependency::Eigen => &self.eigen,
      Dependency::Voro => &self.voro,
      Dependency::Lammps => &self.lammps,
    }
  }
}

/// Download and unpack every artifact into `build_dir`.
///
/// Stops at the first failure; nothing is retried.
pub async fn acquire_all(
  acquirer: &impl Acquirer,
  artifacts: &[Artifact],
  build_dir: &Path,
) -> Result<Sources, AcquireError> {
  let mut eigen = None;
  let mut voro = None;
  let mut lammps = None;

  for artifact in artifacts {
    info!(artifact = artifact.label, url = %artifact.url, "downloading");

    match &artifact.kind {
      ArtifactKind::Executable { name } => {
        let download = build_dir.join(format!("{name}.gz"));
        acquirer.fetch(&artifact.url, &download).await?;
        acquirer.decompress(&download, &build_dir.join(name)).await?;
        tokio::fs::remove_file(&download).await?;
      }
      ArtifactKind::Archive { locate } => {
        let download = build_dir.join("tmp.tar.gz");
        acquirer.fetch(&artifact.url, &download).await?;
        acquirer.unpack_archive(&download, build_dir).await?;
        tokio::fs::remove_file(&download).await?;

        if let Some((dependency, prefix)) = locate {
          let dir = locate_dir(build_dir, prefix)?;
          debug!(?dependency, path = %dir.display(), "located source tree");
          match dependency {
            Dependency::Eigen => eigen = Some(dir),
            Dependency::Voro => voro = Some(dir),
            Dependency::Lammps => lammps = Some(dir),
          }
        }
      }
    }
  }

  let missing = |prefix: &str| AcquireError::NotFound {
    prefix: prefix.to_string(),
    dir: build_dir.to_path_buf(),
  };

  Ok(Sources {
    eigen: eigen.ok_or_else(|| missing("eigen-"))?,
    voro: voro.ok_or_else(|| missing("voro++"))?,
    lammps: lammps.ok_or_else(|| missing("lammps-"))?,
  })
}

/// First directory in `dir` (by name order) whose name starts with `prefix`.
pub fn locate_dir(dir: &Path, prefix: &str) -> Result<PathBuf, AcquireError> {
  let mut matches: Vec<PathBuf> = std::fs::read_dir(dir)?
    .filter_map(Result::ok)
    .filter(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
    .filter(|entry| entry.file_name().to_string_lossy().starts_with(prefix))
    .map(|entry| entry.path())
    .collect();
  matches.sort();

  matches.into_iter().next().ok_or_else(|| AcquireError::NotFound {
    prefix: prefix.to_string(),
    dir: dir.to_path_buf(),
  })
}
