//! Filesystem utilities for cachet.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::UtilError;

/// Create a directory and all parent directories if they do not exist.
///
/// # Errors
/// Returns an error if the directory cannot be created.
pub fn ensure_dir(path: &Path) -> Result<(), UtilError> {
    std::fs::create_dir_all(path).map_err(|source| UtilError::Io {
        path: path.display().to_string(),
        source,
    })
}

/// Write `contents` to `path` atomically (write-to-temp-then-rename).
///
/// A crashed or interrupted write leaves the previous file intact instead of
/// a truncated one. The parent directory is created if missing.
///
/// # Errors
/// Returns an error if the parent directory, the temp file, or the rename fails.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), UtilError> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }

    // Append rather than replace the extension so `a.css` and `a.js` in the
    // same directory never share a temp name.
    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    std::fs::write(&tmp_path, contents).map_err(|source| UtilError::Io {
        path: tmp_path.display().to_string(),
        source,
    })?;
    std::fs::rename(&tmp_path, path).map_err(|source| UtilError::Io {
        path: path.display().to_string(),
        source,
    })
}

/// Return the modification time of `path` as seconds since the Unix epoch.
///
/// A pre-epoch timestamp maps to `0`.
///
/// # Errors
/// Returns an error if the file metadata cannot be read.
pub fn modified_epoch(path: &Path) -> Result<u64, UtilError> {
    let modified = std::fs::metadata(path)
        .and_then(|meta| meta.modified())
        .map_err(|source| UtilError::Io {
            path: path.display().to_string(),
            source,
        })?;
    Ok(modified
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default())
}

/// The current wall-clock time as seconds since the Unix epoch.
#[must_use]
pub fn now_epoch() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// List the immediate files of `dir` with one of the given `extensions`,
/// sorted by path. No recursion into subdirectories.
///
/// Extension matching is literal (`"css"` does not match `FOO.CSS`).
///
/// # Errors
/// Returns an error if a listing pattern cannot be compiled from `dir` and an
/// extension. Unreadable directory entries are skipped.
pub fn list_files(dir: &Path, extensions: &[&str]) -> Result<Vec<PathBuf>, UtilError> {
    let mut files = Vec::new();
    for extension in extensions {
        let pattern = dir.join(format!("*.{extension}"));
        let pattern_str = pattern.display().to_string();
        let matches = glob::glob(&pattern_str).map_err(|e| UtilError::Pattern {
            pattern: pattern_str.clone(),
            message: e.to_string(),
        })?;
        files.extend(matches.filter_map(Result::ok).filter(|p| p.is_file()));
    }
    files.sort();
    files.dedup();
    Ok(files)
}
