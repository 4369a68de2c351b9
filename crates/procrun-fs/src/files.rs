//! Single-file helpers

use log::debug;
use procrun_core::Result;
use std::fs;
use std::path::Path;

/// Check whether anything exists at `path`
pub fn exists(path: impl AsRef<Path>) -> bool {
    path.as_ref().exists()
}

/// Check whether `path` exists and is not a directory
pub fn is_file(path: impl AsRef<Path>) -> bool {
    match fs::metadata(path.as_ref()) {
        Ok(meta) => !meta.is_dir(),
        Err(_) => false,
    }
}

/// Check whether `path` is a directory
pub fn is_dir(path: impl AsRef<Path>) -> bool {
    fs::metadata(path.as_ref())
        .map(|meta| meta.is_dir())
        .unwrap_or(false)
}

/// Read the whole file as text.
///
/// Returns an empty string for missing, unreadable or non-file paths.
/// Invalid UTF-8 is replaced rather than rejected.
pub fn read_file(path: impl AsRef<Path>) -> String {
    let path = path.as_ref();
    if !is_file(path) {
        return String::new();
    }

    match fs::read(path) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) => {
            debug!("Unable to read {}: {}", path.display(), e);
            String::new()
        }
    }
}

/// Read the whole file as raw bytes
pub fn read_bytes(path: impl AsRef<Path>) -> Result<Vec<u8>> {
    Ok(fs::read(path)?)
}

/// Read the file as lines, without line terminators
pub fn read_lines(path: impl AsRef<Path>) -> Vec<String> {
    read_file(path).lines().map(str::to_string).collect()
}

/// Write `content` to `path`, creating or truncating it
pub fn write_file(path: impl AsRef<Path>, content: &str) -> Result<()> {
    fs::write(path, content)?;
    Ok(())
}
