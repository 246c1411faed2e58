//! Integration tests for lmpcross-lib.

#[cfg(unix)]
mod common;
#[cfg(unix)]
mod pipeline_tests;
