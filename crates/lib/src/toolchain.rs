//! MinGW cross toolchain resolution and the flags derived from the selection.
//!
//! Tools are looked up on the executable search path by a fixed base name per
//! word size. A tool that is not found is recorded rather than reported: the
//! failure surfaces as [`PlaceholderError::ToolNotFound`] the moment a command
//! template references it, before any command line is built.

use std::ffi::OsStr;
use std::fmt;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::options::{BuildOptions, Transport, WordSize};
use crate::placeholder::{PlaceholderError, Resolver};

/// Entries of the cross toolchain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
  Cc,
  Cxx,
  Fc,
  Ar,
  Size,
  /// NSIS installer compiler
  Nsis,
}

impl Tool {
  pub const ALL: [Tool; 6] = [Tool::Cc, Tool::Cxx, Tool::Fc, Tool::Ar, Tool::Size, Tool::Nsis];

  /// Name used in `$${tool:<name>}` placeholders.
  pub fn key(&self) -> &'static str {
    match self {
      Self::Cc => "cc",
      Self::Cxx => "cxx",
      Self::Fc => "fc",
      Self::Ar => "ar",
      Self::Size => "size",
      Self::Nsis => "nsis",
    }
  }

  pub fn from_key(key: &str) -> Option<Self> {
    Self::ALL.into_iter().find(|tool| tool.key() == key)
  }

  /// Human readable label for settings output.
  pub fn label(&self) -> &'static str {
    match self {
      Self::Cc => "C compiler",
      Self::Cxx => "C++ compiler",
      Self::Fc => "Fortran compiler",
      Self::Ar => "Library archiver",
      Self::Size => "Size tool",
      Self::Nsis => "Installer tool",
    }
  }

  /// Executable base name for the given word size.
  pub fn program(&self, word_size: WordSize) -> &'static str {
    match (word_size, self) {
      (WordSize::W32, Self::Cc) => "i686-w64-mingw32-gcc",
      (WordSize::W32, Self::Cxx) => "i686-w64-mingw32-g++",
      (WordSize::W32, Self::Fc) => "i686-w64-mingw32-gfortran",
      (WordSize::W32, Self::Ar) => "i686-w64-mingw32-ar",
      (WordSize::W32, Self::Size) => "i686-w64-mingw32-size",
      (WordSize::W64, Self::Cc) => "x86_64-w64-mingw32-gcc",
      (WordSize::W64, Self::Cxx) => "x86_64-w64-mingw32-g++",
      (WordSize::W64, Self::Fc) => "x86_64-w64-mingw32-gfortran",
      (WordSize::W64, Self::Ar) => "x86_64-w64-mingw32-ar",
      (WordSize::W64, Self::Size) => "x86_64-w64-mingw32-size",
      (_, Self::Nsis) => "makensis",
    }
  }
}

impl fmt::Display for Tool {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.key())
  }
}

/// One toolchain entry after lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTool {
  pub tool: Tool,
  pub program: &'static str,
  pub path: Option<PathBuf>,
}

/// The cross toolchain for one word size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolChain {
  pub word_size: WordSize,
  entries: Vec<ResolvedTool>,
}

impl ToolChain {
  /// Resolve every tool against the process `PATH`.
  pub fn resolve(word_size: WordSize) -> Self {
    let search_path = std::env::var_os("PATH");
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    Self::resolve_in(word_size, search_path.as_deref(), &cwd)
  }

  /// Resolve every tool against an explicit search path.
  ///
  /// The first directory holding a regular, executable file of the expected
  /// name wins.
  pub fn resolve_in(word_size: WordSize, search_path: Option<&OsStr>, cwd: &Path) -> Self {
    let entries = Tool::ALL
      .into_iter()
      .map(|tool| {
        let program = tool.program(word_size);
        let path = search_path.and_then(|paths| which::which_in(program, Some(paths), cwd).ok());
        debug!(tool = %tool, program, path = ?path, "resolved tool");
        ResolvedTool { tool, program, path }
      })
      .collect();

    Self { word_size, entries }
  }

  pub fn entries(&self) -> &[ResolvedTool] {
    &self.entries
  }

  pub fn get(&self, tool: Tool) -> Option<&Path> {
    self.entries.iter().find(|entry| entry.tool == tool)?.path.as_deref()
  }

  /// Path of a tool as a string, failing if it was not found.
  pub fn require(&self, tool: Tool) -> Result<&str, PlaceholderError> {
    self
      .get(tool)
      .and_then(Path::to_str)
      .ok_or_else(|| PlaceholderError::ToolNotFound {
        tool: tool.key().to_string(),
        program: tool.program(self.word_size).to_string(),
      })
  }

  /// Tools that were not found on the search path.
  pub fn missing(&self) -> Vec<&ResolvedTool> {
    self.entries.iter().filter(|entry| entry.path.is_none()).collect()
  }
}

/// Preprocessor flag selecting the LAMMPS integer size model.
pub fn size_model_flag(word_size: WordSize) -> &'static str {
  match word_size {
    WordSize::W32 => "-DLAMMPS_SMALLSMALL",
    WordSize::W64 => "-DLAMMPS_SMALLBIG",
  }
}

/// Include flag for the message passing headers.
///
/// With MPI this points at the MPICH2 development tree unpacked into the
/// build directory; without it, at the STUBS library relative to a
/// `lib/<component>` directory of the LAMMPS tree.
pub fn transport_include(transport: Transport, word_size: WordSize, build_dir: &Path) -> String {
  match transport {
    Transport::Mpi => format!("-I{}/mpich2-win{}/include", build_dir.display(), word_size),
    Transport::None => "-I../../src/STUBS".to_string(),
  }
}

/// The toolchain plus the values derived from the selection, as seen by
/// command templates.
///
/// | placeholder | value |
/// |---|---|
/// | `$${tool:<key>}` | resolved path of the tool, see [`Tool::key`] |
/// | `$${var:bits}` | `32` or `64` |
/// | `$${var:jobs}` | parallel job count |
/// | `$${var:size_model}` | [`size_model_flag`] |
/// | `$${var:mpi_inc}` | [`transport_include`] |
/// | `$${var:build}` | absolute build directory |
#[derive(Debug, Clone)]
pub struct Environment {
  toolchain: ToolChain,
  vars: Vec<(&'static str, String)>,
}

impl Environment {
  pub fn new(options: &BuildOptions, toolchain: ToolChain, build_dir: &Path) -> Self {
    let vars = vec![
      ("bits", options.word_size.to_string()),
      ("jobs", options.jobs.to_string()),
      ("size_model", size_model_flag(options.word_size).to_string()),
      (
        "mpi_inc",
        transport_include(options.transport, options.word_size, build_dir),
      ),
      ("build", build_dir.display().to_string()),
    ];
    Self { toolchain, vars }
  }

  pub fn var(&self, name: &str) -> Option<&str> {
    self
      .vars
      .iter()
      .find(|(key, _)| *key == name)
      .map(|(_, value)| value.as_str())
  }
}

impl Resolver for Environment {
  fn resolve_tool(&self, name: &str) -> Result<&str, PlaceholderError> {
    let tool = Tool::from_key(name).ok_or_else(|| PlaceholderError::UnknownTool(name.to_string()))?;
    self.toolchain.require(tool)
  }

  fn resolve_var(&self, name: &str) -> Result<&str, PlaceholderError> {
    self.var(name).ok_or_else(|| PlaceholderError::UnknownVar(name.to_string()))
  }
}
