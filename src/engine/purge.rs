// Purge service — removes every archive and staging directory and clears the
// session store. Deletions are independent best-effort; the sweep keeps going
// past individual failures.

use std::fs;
use std::path::Path;

use tracing::{info, warn};

use super::session::SessionStore;
use crate::error::Result;

#[derive(Debug, Default, Clone, Copy)]
pub struct PurgeReport {
    pub archives_removed: usize,
    pub staging_dirs_removed: usize,
    pub failures: usize,
}

/// Delete all `*.zip` archives under `archive_dir`, all subdirectories of
/// `staging_root` (including leftover `.part` directories), and clear the
/// store. Only a total inability to list one of the roots is an error;
/// per-entry failures are logged and counted. Idempotent.
pub fn purge(
    archive_dir: &Path,
    staging_root: &Path,
    store: &SessionStore,
) -> Result<PurgeReport> {
    let mut report = PurgeReport::default();

    for entry in fs::read_dir(archive_dir)? {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!("archive dir entry unreadable: {}", e);
                report.failures += 1;
                continue;
            }
        };
        let path = entry.path();
        let is_zip = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("zip"))
            .unwrap_or(false);
        if !path.is_file() || !is_zip {
            continue;
        }
        match fs::remove_file(&path) {
            Ok(()) => report.archives_removed += 1,
            Err(e) => {
                warn!("failed to remove archive {}: {}", path.display(), e);
                report.failures += 1;
            }
        }
    }

    for entry in fs::read_dir(staging_root)? {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!("staging root entry unreadable: {}", e);
                report.failures += 1;
                continue;
            }
        };
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        match fs::remove_dir_all(&path) {
            Ok(()) => report.staging_dirs_removed += 1,
            Err(e) => {
                warn!("failed to remove staging dir {}: {}", path.display(), e);
                report.failures += 1;
            }
        }
    }

    store.clear();

    info!(
        "purge complete: {} archive(s), {} staging dir(s), {} failure(s)",
        report.archives_removed, report.staging_dirs_removed, report.failures
    );
    Ok(report)
}
