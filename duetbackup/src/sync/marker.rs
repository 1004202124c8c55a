//! Ownership marker for locally mirrored directories.
//!
//! A directory that directly contains [`MARKER_NAME`] was created (or has been
//! visited) by a backup run. Nothing else records ownership.

use std::io;
use std::path::{Path, PathBuf};

pub const MARKER_NAME: &str = ".duetbackup";

pub fn marker_path(dir: &Path) -> PathBuf {
    dir.join(MARKER_NAME)
}

/// Writes an empty marker into `dir`, truncating any existing one.
pub async fn write_marker(dir: &Path) -> io::Result<()> {
    tokio::fs::write(marker_path(dir), b"").await
}

/// True iff `path` is a directory carrying its own marker.
///
/// Any error while probing counts as "not managed".
pub async fn is_managed(path: &Path) -> bool {
    match tokio::fs::symlink_metadata(path).await {
        Ok(meta) if meta.is_dir() => tokio::fs::symlink_metadata(marker_path(path))
            .await
            .is_ok(),
        _ => false,
    }
}

pub fn is_marker_name(name: &str) -> bool {
    name == MARKER_NAME
}
