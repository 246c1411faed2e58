//! lmpcross-lib: cross-building LAMMPS for Windows from a Linux host.
//!
//! This crate provides everything the `lmpcross` binary drives:
//! - `options`: validated build selection (word size, transport, threads, revision)
//! - `toolchain`: MinGW cross tools resolved on the search path plus derived flags
//! - `workspace`: the per-selection build directory and explicit navigation
//! - `acquire`: downloading and unpacking third-party sources and helper executables
//! - `component`: the declarative component table and the sequencer that interprets it
//! - `assembly`: feature selection and the final executable build
//! - `pipeline`: the strictly linear run from acquisition to relocation

pub mod acquire;
pub mod assembly;
pub mod component;
pub mod config;
pub mod consts;
pub mod execute;
pub mod options;
pub mod pipeline;
pub mod placeholder;
pub mod toolchain;
pub mod workspace;

#[cfg(test)]
pub mod testutil;
