//! Pattern expansion and directory traversal

use glob::MatchOptions;
use procrun_core::Result;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Expand `pattern`, matching letters case-insensitively
pub fn glob(pattern: &str) -> Result<Vec<PathBuf>> {
    let options = MatchOptions {
        case_sensitive: false,
        require_literal_separator: false,
        require_literal_leading_dot: false,
    };

    let mut matches = Vec::new();
    for entry in glob::glob_with(pattern, options)? {
        matches.push(entry?);
    }
    Ok(matches)
}

/// Concatenate the contents of every regular file under `root`.
///
/// Entries are visited in file-name order. The first entry that cannot be
/// listed or read aborts the walk.
pub fn walk_files(root: impl AsRef<Path>) -> Result<String> {
    let mut contents = String::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let bytes = fs::read(entry.path())?;
        contents.push_str(&String::from_utf8_lossy(&bytes));
    }

    Ok(contents)
}
