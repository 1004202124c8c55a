use std::collections::HashSet;
use std::path::Path;

use duet_core::RemoteListing;
use tracing::debug;

use super::engine::{EngineError, SyncReport};
use super::marker;

/// Deletes children of `local_dir` that are not in `listing`.
///
/// The marker itself and directories without their own marker are never
/// touched, whatever the listing says.
pub async fn reclaim(
    listing: &RemoteListing,
    local_dir: &Path,
    report: &mut SyncReport,
) -> Result<(), EngineError> {
    let remote_names: HashSet<&str> = listing
        .entries
        .iter()
        .map(|entry| entry.name.as_str())
        .collect();

    let mut children = tokio::fs::read_dir(local_dir)
        .await
        .map_err(EngineError::io("read directory", local_dir))?;

    while let Some(child) = children
        .next_entry()
        .await
        .map_err(EngineError::io("read directory", local_dir))?
    {
        let file_name = child.file_name();
        let known = file_name
            .to_str()
            .is_some_and(|name| remote_names.contains(name) || marker::is_marker_name(name));
        if known {
            continue;
        }

        let path = child.path();
        let file_type = child
            .file_type()
            .await
            .map_err(EngineError::io("stat", &path))?;

        if file_type.is_dir() {
            if !marker::is_managed(&path).await {
                debug!("keeping unmanaged directory {}", path.display());
                continue;
            }
            tokio::fs::remove_dir_all(&path)
                .await
                .map_err(EngineError::io("remove", &path))?;
        } else {
            tokio::fs::remove_file(&path)
                .await
                .map_err(EngineError::io("remove", &path))?;
        }
        debug!("removed: {}", path.display());
        report.removed += 1;
    }

    Ok(())
}
