//! procrun-core: shared types for the procrun crates
//!
//! - Error type and Result alias
//! - Text helpers used to prettify command output

pub mod error;
pub mod util;

pub use error::{Result, RunError};
