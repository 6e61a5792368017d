//! Shared paper model and error types used across all cordsift crates.

pub mod error;
pub mod paper;

pub use error::{CordsiftError, Result};
pub use paper::{ContextKind, TextUnit, UnitContext};
