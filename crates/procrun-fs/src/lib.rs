//! procrun-fs: filesystem helpers for procrun
//!
//! Small stateless wrappers over `std::fs`, `glob` and `walkdir`. The
//! execution engine does not depend on this crate.

pub mod files;
pub mod walk;

pub use files::{exists, is_dir, is_file, read_bytes, read_file, read_lines, write_file};
pub use walk::{glob, walk_files};
