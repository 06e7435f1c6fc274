use std::path::{Path, PathBuf};

use tracing::{debug, warn};

/// Writes a page snapshot to `dir` and returns its path.
///
/// File names follow `snapshot_<utc timestamp>_<uuid>.html` so repeated
/// failures never overwrite each other.
pub fn write_snapshot(dir: &Path, html: &str) -> std::io::Result<PathBuf> {
    let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");
    let filename = format!("snapshot_{}_{}.html", timestamp, uuid::Uuid::new_v4().simple());
    let path = dir.join(filename);

    std::fs::create_dir_all(dir)?;
    std::fs::write(&path, html)?;

    debug!(path = %path.display(), bytes = html.len(), "Page snapshot written");
    Ok(path)
}

/// Best-effort variant used on failure paths: logs and swallows write errors.
pub fn capture(dir: &Path, html: &str) -> Option<PathBuf> {
    match write_snapshot(dir, html) {
        Ok(path) => Some(path),
        Err(e) => {
            warn!("Failed to write page snapshot to {}: {}", dir.display(), e);
            None
        }
    }
}
