use std::path::Path;

use tracing::{info, warn};

/// Removes entries of `dir` whose names contain `pattern`.
///
/// Best effort: a missing directory is not an error and individual removal
/// failures are logged and skipped. Returns how many entries were removed.
pub(crate) async fn remove_artifacts(dir: &Path, pattern: &str) -> usize {
    if pattern.is_empty() {
        return 0;
    }
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return 0,
        Err(err) => {
            warn!("Cannot list {}: {}", dir.display(), err);
            return 0;
        }
    };

    let mut removed = 0_usize;
    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(err) => {
                warn!("Stopped listing {}: {}", dir.display(), err);
                break;
            }
        };
        if !entry.file_name().to_string_lossy().contains(pattern) {
            continue;
        }
        let path = entry.path();
        let outcome = match entry.file_type().await {
            Ok(kind) if kind.is_dir() => tokio::fs::remove_dir_all(&path).await,
            Ok(_) => tokio::fs::remove_file(&path).await,
            Err(err) => Err(err),
        };
        match outcome {
            Ok(()) => removed = removed.saturating_add(1),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => warn!("Failed to remove {}: {}", path.display(), err),
        }
    }
    info!("Removed {} build artifacts from {}", removed, dir.display());
    removed
}
