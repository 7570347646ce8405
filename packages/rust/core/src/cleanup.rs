//! Post-upload removal of ephemeral files.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use bookrelease_shared::{BookReleaseError, Result};

use crate::plan::ReleasePlan;

/// Paths that were actually removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub removed: Vec<PathBuf>,
}

fn remove(path: &Path, dir: bool) -> Result<bool> {
    let result = if dir {
        std::fs::remove_dir_all(path)
    } else {
        std::fs::remove_file(path)
    };
    match result {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(BookReleaseError::io(path, e)),
    }
}

/// Remove the main copy, both previews and the chapter directory.
///
/// Trade PDFs stay as the cache for the next run. Already-absent paths are
/// not an error.
#[instrument(skip_all)]
pub fn cleanup(plan: &ReleasePlan) -> Result<CleanupReport> {
    let mut report = CleanupReport::default();
    for file in plan.ephemeral_files() {
        if remove(file, false)? {
            debug!(path = %file.display(), "removed");
            report.removed.push(file.to_path_buf());
        }
    }
    if remove(&plan.chapters_dir, true)? {
        debug!(path = %plan.chapters_dir.display(), "removed");
        report.removed.push(plan.chapters_dir.clone());
    }
    info!(removed = report.removed.len(), "cleanup finished");
    Ok(report)
}
