//! Placeholder parsing and substitution for command templates.
//!
//! The component table describes make variables as templates whose values
//! depend on the resolved toolchain and the build selection. This module
//! handles parsing those templates and substituting resolved values.
//!
//! # Placeholder Formats
//!
//! - `$${tool:<name>}` - absolute path of a toolchain entry (`cc`, `cxx`, `fc`, `ar`, `size`, `nsis`)
//! - `$${var:<name>}` - a derived value (`bits`, `jobs`, `size_model`, `mpi_inc`, `build`)
//!
//! # Make Variables
//!
//! Single `$` characters pass through unchanged, so make references like
//! `$(CC)` and `$(LMP_INC)` reach make untouched.
//!
//! # Escaping
//!
//! Use `$$$` before `{` to produce a literal `$${` sequence.
//!
//! # Example
//!
//! ```
//! use lmpcross_lib::placeholder::{parse, Placeholder, Segment};
//!
//! let segments = parse("$${tool:cxx} -O3 $(LMP_INC)").unwrap();
//! assert_eq!(segments, vec![
//!     Segment::Placeholder(Placeholder::Tool("cxx".to_string())),
//!     Segment::Literal(" -O3 $(LMP_INC)".to_string()),
//! ]);
//! ```

use thiserror::Error;

/// A parsed placeholder reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placeholder {
  /// `$${tool:<name>}`
  Tool(String),

  /// `$${var:<name>}`
  Var(String),
}

/// A segment of parsed text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
  /// Literal text (no placeholders)
  Literal(String),

  /// A placeholder to be resolved
  Placeholder(Placeholder),
}

/// Errors that can occur during placeholder parsing or resolution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaceholderError {
  #[error("unclosed placeholder at position {0}")]
  Unclosed(usize),

  #[error("unknown placeholder type: {0}")]
  UnknownType(String),

  #[error("malformed placeholder: {0}")]
  Malformed(String),

  #[error("unknown tool: {0}")]
  UnknownTool(String),

  #[error("unknown variable: {0}")]
  UnknownVar(String),

  /// The template references a tool that was not found on the search path.
  #[error("required tool '{program}' ({tool}) was not found in PATH")]
  ToolNotFound { tool: String, program: String },
}

/// Trait for resolving placeholder values.
pub trait Resolver {
  /// Resolve a toolchain entry to the path of its executable.
  fn resolve_tool(&self, name: &str) -> Result<&str, PlaceholderError>;

  /// Resolve a derived variable.
  fn resolve_var(&self, name: &str) -> Result<&str, PlaceholderError>;
}

/// Parse a string containing placeholders into segments.
///
/// # Errors
///
/// Returns an error if a placeholder is malformed (unclosed, unknown type, etc.)
pub fn parse(input: &str) -> Result<Vec<Segment>, PlaceholderError> {
  let mut segments = Vec::new();
  let mut literal = String::new();
  let mut chars = input.char_indices().peekable();

  while let Some((pos, ch)) = chars.next() {
    if ch != '$' {
      literal.push(ch);
      continue;
    }

    match chars.peek() {
      Some((_, '$')) => {
        chars.next();

        match chars.peek() {
          Some((_, '$')) => {
            chars.next();

            match chars.peek() {
              Some((_, '{')) => {
                // $$${ -> literal $${
                literal.push_str("$${");
                chars.next();
              }
              _ => literal.push_str("$$$"),
            }
          }
          Some((_, '{')) => {
            chars.next();

            if !literal.is_empty() {
              segments.push(Segment::Literal(std::mem::take(&mut literal)));
            }

            let mut content = String::new();
            let mut found_close = false;
            for (_, c) in chars.by_ref() {
              if c == '}' {
                found_close = true;
                break;
              }
              content.push(c);
            }

            if !found_close {
              return Err(PlaceholderError::Unclosed(pos));
            }

            segments.push(Segment::Placeholder(parse_placeholder_content(&content)?));
          }
          // `$$` is make's escaped dollar
          _ => literal.push_str("$$"),
        }
      }
      _ => literal.push('$'),
    }
  }

  if !literal.is_empty() {
    segments.push(Segment::Literal(literal));
  }

  Ok(segments)
}

/// Parse the content inside a placeholder (everything between `$${` and `}`).
fn parse_placeholder_content(content: &str) -> Result<Placeholder, PlaceholderError> {
  let (kind, name) = content
    .split_once(':')
    .ok_or_else(|| PlaceholderError::Malformed(format!("missing colon in '{content}'")))?;

  if name.is_empty() {
    return Err(PlaceholderError::Malformed(format!("empty name in '{content}'")));
  }

  match kind {
    "tool" => Ok(Placeholder::Tool(name.to_string())),
    "var" => Ok(Placeholder::Var(name.to_string())),
    _ => Err(PlaceholderError::UnknownType(kind.to_string())),
  }
}

/// Substitute all placeholders in a string using the provided resolver.
///
/// # Errors
///
/// Returns an error if parsing fails or if any placeholder cannot be resolved.
pub fn substitute(input: &str, resolver: &impl Resolver) -> Result<String, PlaceholderError> {
  let segments = parse(input)?;
  substitute_segments(&segments, resolver)
}

/// Substitute placeholders in pre-parsed segments.
pub fn substitute_segments(segments: &[Segment], resolver: &impl Resolver) -> Result<String, PlaceholderError> {
  let mut result = String::new();

  for segment in segments {
    match segment {
      Segment::Literal(s) => result.push_str(s),
      Segment::Placeholder(Placeholder::Tool(name)) => result.push_str(resolver.resolve_tool(name)?),
      Segment::Placeholder(Placeholder::Var(name)) => result.push_str(resolver.resolve_var(name)?),
    }
  }

  Ok(result)
}
