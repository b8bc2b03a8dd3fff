//! Removal of job files after a GULP calculation.
//!
//! Decks and reports are scratch data once the numbers have been parsed.
//! Cleanup is best effort: a file that is already gone is logged at debug
//! level, any other failure is logged as a warning and counted, and neither
//! aborts the caller.

use crate::naming::JobFiles;
use log::{debug, info, warn};
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

/// Outcome of one cleanup pass.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CleanupReport {
    /// Files that were deleted
    pub removed: Vec<PathBuf>,
    /// Files that did not exist
    pub missing: Vec<PathBuf>,
    /// Files that could not be deleted
    pub failed: Vec<PathBuf>,
}

impl CleanupReport {
    /// True when no deletion failed.
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Deletes the deck, the report and the dump (if one was requested).
pub fn remove_job_files(files: &JobFiles) -> CleanupReport {
    let mut report = CleanupReport::default();

    for path in files.all() {
        match fs::remove_file(path) {
            Ok(()) => {
                debug!("Cleaned up file: {}", path.display());
                report.removed.push(path.to_path_buf());
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Nothing to clean at {}", path.display());
                report.missing.push(path.to_path_buf());
            }
            Err(e) => {
                warn!("Failed to remove file {}: {}", path.display(), e);
                report.failed.push(path.to_path_buf());
            }
        }
    }

    if !report.is_clean() {
        info!(
            "Cleanup finished with {} removed, {} failed",
            report.removed.len(),
            report.failed.len()
        );
    }
    report
}
