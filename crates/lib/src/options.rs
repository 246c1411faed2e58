//! Build options.
//!
//! `BuildOptions` is the validated, immutable selection a run is made from. The
//! CLI collects raw strings into [`RawOptions`]; [`BuildOptions::from_raw`] checks
//! every field against its allowed literals and rejects the whole selection on
//! the first mismatch.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use thiserror::Error;

/// A recognized option holding a disallowed value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptionsError {
  #[error("Unsupported bitness flag {0}")]
  WordSize(String),

  #[error("Unsupported parallel flag {0}")]
  Transport(String),

  #[error("Unsupported threading flag {0}")]
  Threads(String),

  #[error("Unsupported revision flag {0}")]
  Revision(String),

  #[error("Unknown verbose keyword: {0}")]
  Verbosity(String),

  #[error("Unsupported number of parallel jobs {0}")]
  Jobs(usize),
}

/// Target word size of the Windows executables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum WordSize {
  #[serde(rename = "32")]
  W32,
  #[serde(rename = "64")]
  W64,
}

impl WordSize {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::W32 => "32",
      Self::W64 => "64",
    }
  }
}

impl FromStr for WordSize {
  type Err = OptionsError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "32" => Ok(Self::W32),
      "64" => Ok(Self::W64),
      _ => Err(OptionsError::WordSize(s.to_string())),
    }
  }
}

impl fmt::Display for WordSize {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

/// Message passing: the real MPICH2 library or the bundled STUBS library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
  #[serde(rename = "no")]
  None,
  Mpi,
}

impl Transport {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::None => "no",
      Self::Mpi => "mpi",
    }
  }
}

impl FromStr for Transport {
  type Err = OptionsError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "no" => Ok(Self::None),
      "mpi" => Ok(Self::Mpi),
      _ => Err(OptionsError::Transport(s.to_string())),
    }
  }
}

impl fmt::Display for Transport {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

/// Shared-memory threading in the final executable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Threads {
  #[serde(rename = "no")]
  None,
  #[serde(rename = "omp")]
  OpenMp,
}

impl Threads {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::None => "no",
      Self::OpenMp => "omp",
    }
  }
}

impl FromStr for Threads {
  type Err = OptionsError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "no" => Ok(Self::None),
      "omp" => Ok(Self::OpenMp),
      _ => Err(OptionsError::Threads(s.to_string())),
    }
  }
}

impl fmt::Display for Threads {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

static BRANCH_RE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^(stable|unstable|master)$").expect("branch pattern is valid"));
static RELEASE_RE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^(patch|stable)_\d+(Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)\d{4}$")
    .expect("release pattern is valid")
});
static COMMIT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-f0-9]{40}$").expect("commit pattern is valid"));

/// The lexical form a revision selector was recognized as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevisionKind {
  /// `stable`, `unstable` or `master`
  Branch,
  /// `patch_<day><Mon><year>` or `stable_<day><Mon><year>`
  Release,
  /// 40 lowercase hex digits
  Commit,
}

/// Which snapshot of the LAMMPS sources to fetch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Revision(String);

impl Revision {
  pub fn parse(s: &str) -> Result<Self, OptionsError> {
    match Self::classify(s) {
      Some(_) => Ok(Self(s.to_string())),
      None => Err(OptionsError::Revision(s.to_string())),
    }
  }

  pub fn classify(s: &str) -> Option<RevisionKind> {
    if BRANCH_RE.is_match(s) {
      Some(RevisionKind::Branch)
    } else if RELEASE_RE.is_match(s) {
      Some(RevisionKind::Release)
    } else if COMMIT_RE.is_match(s) {
      Some(RevisionKind::Commit)
    } else {
      None
    }
  }

  pub fn kind(&self) -> RevisionKind {
    // Construction only succeeds for recognized forms.
    Self::classify(&self.0).unwrap_or(RevisionKind::Branch)
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for Revision {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

/// Parse a yes/no keyword, case-insensitively.
///
/// Returns `None` for anything outside the fixed truthy/falsy spellings.
pub fn parse_switch(s: &str) -> Option<bool> {
  match s.to_ascii_lowercase().as_str() {
    "yes" | "y" | "on" | "1" | "true" => Some(true),
    "no" | "n" | "off" | "0" | "false" => Some(false),
    _ => None,
  }
}

/// Unvalidated option values as collected from the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawOptions {
  pub bits: String,
  pub jobs: usize,
  pub transport: String,
  pub threads: String,
  pub revision: String,
  pub verbose: String,
}

impl Default for RawOptions {
  fn default() -> Self {
    Self {
      bits: "64".to_string(),
      jobs: default_jobs(),
      transport: "no".to_string(),
      threads: "no".to_string(),
      revision: "stable".to_string(),
      verbose: "no".to_string(),
    }
  }
}

/// Number of CPUs on the host, or 1 if that cannot be determined.
pub fn default_jobs() -> usize {
  std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
}

/// The validated build selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildOptions {
  pub word_size: WordSize,
  pub jobs: usize,
  pub transport: Transport,
  pub threads: Threads,
  pub revision: Revision,
  pub verbose: bool,
}

impl BuildOptions {
  pub fn from_raw(raw: &RawOptions) -> Result<Self, OptionsError> {
    let verbose = parse_switch(&raw.verbose).ok_or_else(|| OptionsError::Verbosity(raw.verbose.clone()))?;
    if raw.jobs == 0 {
      return Err(OptionsError::Jobs(raw.jobs));
    }

    Ok(Self {
      word_size: raw.bits.parse()?,
      jobs: raw.jobs,
      transport: raw.transport.parse()?,
      threads: raw.threads.parse()?,
      revision: Revision::parse(&raw.revision)?,
      verbose,
    })
  }

  /// Name of the build directory for this selection.
  ///
  /// Every field is drawn from a fixed alphabet without `-`, so distinct
  /// selections never map to the same name.
  pub fn build_dir_name(&self) -> String {
    format!(
      "tmp-{}-{}-{}-{}",
      self.word_size, self.transport, self.threads, self.revision
    )
  }
}
