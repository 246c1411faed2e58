//! Third-party component builds.
//!
//! [`table::COMPONENTS`] lists what to build as data; [`Sequencer`] walks such
//! a list in order and stops at the first failure.

mod sequencer;
pub mod table;
pub mod types;

pub use sequencer::{Sequencer, render_step};
pub use table::COMPONENTS;
pub use types::{BuildError, Choice, ComponentSpec, Flag, MakeStep, PostAction, When};
