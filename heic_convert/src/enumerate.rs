//! Input enumeration
//!
//! Turns the `--input` path into the list of HEIC/HEIF files to convert.
//! Directories are listed one level deep only, sorted by file name.

use crate::error::{Result, RunError};
use crate::formats::HEIC_EXTENSIONS;
use shared_utils::has_extension;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

pub fn is_heic_file(path: &Path) -> bool {
    has_extension(path, HEIC_EXTENSIONS)
}

/// Candidate files for `path`, which the caller has already checked exists.
///
/// - a file yields itself, or `UnsupportedExtension`
/// - a directory yields its direct HEIC/HEIF children, or `NoConvertibleFiles`
///
/// Entries that can't be stat'ed (dangling symlinks, races with deletion) are
/// logged and skipped; only failing to list the directory itself is an error.
pub fn enumerate_inputs(path: &Path) -> Result<Vec<PathBuf>> {
    if !path.is_dir() {
        if is_heic_file(path) {
            return Ok(vec![path.to_path_buf()]);
        }
        return Err(RunError::UnsupportedExtension(path.to_path_buf()));
    }

    let walker = WalkDir::new(path)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name();

    let mut files = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            // depth 0 is the directory itself: nothing can be listed
            Err(source) if source.depth() == 0 => {
                return Err(RunError::ReadDir {
                    path: path.to_path_buf(),
                    source,
                })
            }
            Err(err) => {
                warn!(
                    path = ?err.path(),
                    error = %err,
                    "Skipping unreadable directory entry"
                );
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        if is_heic_file(entry.path()) {
            files.push(entry.into_path());
        } else {
            debug!(path = %entry.path().display(), "Skipping non-HEIC entry");
        }
    }

    if files.is_empty() {
        return Err(RunError::NoConvertibleFiles(path.to_path_buf()));
    }

    debug!(count = files.len(), dir = %path.display(), "Enumerated HEIC files");
    Ok(files)
}
