//! Staging area lifecycle.
//!
//! The staging directory holds the single report fetched per run. Files left
//! behind by a previous run are never trusted, so every run starts by emptying
//! the directory (or creating it on the first run).

use std::fs;
use std::io;
use std::path::Path;

use tracing::{debug, warn};

/// Wipe-or-create the staging directory.
///
/// Removes every regular file directly inside `directory`. Subdirectories are
/// not descended into and are left in place.
///
/// # Errors
///
/// Returns the underlying I/O error if the directory cannot be listed or
/// created, or a file cannot be removed.
pub fn prepare(directory: &Path) -> io::Result<()> {
    if directory.exists() {
        debug!(
            staging_dir = %directory.display(),
            "staging directory exists, deleting old files"
        );
        for entry in fs::read_dir(directory)? {
            let entry = entry?;
            let path = entry.path();
            if entry.file_type()?.is_dir() {
                warn!(path = %path.display(), "leaving subdirectory in staging area");
                continue;
            }
            debug!(file = %path.display(), "deleting staged file");
            fs::remove_file(&path)?;
        }
    } else {
        debug!(
            staging_dir = %directory.display(),
            "staging directory does not exist, creating"
        );
        fs::create_dir_all(directory)?;
    }
    Ok(())
}
