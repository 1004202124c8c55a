use std::io;
use std::path::{Path, PathBuf};

use duet_core::{DuetError, RemoteListing};
use thiserror::Error;
use tracing::{info, warn};

use super::excludes::ExcludeSet;
use super::marker;
use super::mirror;
use super::paths::{PathError, clean_remote_path, local_child_path};
use super::reclaim;
use super::remote::RemoteSource;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to fetch file list for {path}: {source}")]
    Listing {
        path: String,
        #[source]
        source: DuetError,
    },
    #[error("failed to download {path}: {source}")]
    Download {
        path: String,
        #[source]
        source: DuetError,
    },
    #[error("failed to {op} {}: {source}", path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid entry in {dir}: {source}")]
    InvalidEntryName {
        dir: String,
        #[source]
        source: PathError,
    },
}

impl EngineError {
    pub(crate) fn io(op: &'static str, path: &Path) -> impl FnOnce(io::Error) -> Self {
        let path = path.to_path_buf();
        move |source| Self::Io { op, path, source }
    }
}

/// Counters for one backup run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub directories: usize,
    pub added: usize,
    pub updated: usize,
    pub up_to_date: usize,
    pub excluded_files: usize,
    pub excluded_dirs: usize,
    pub removed: usize,
}

impl SyncReport {
    pub fn downloads(&self) -> usize {
        self.added + self.updated
    }
}

pub struct SyncEngine<R> {
    remote: R,
    excludes: ExcludeSet,
    remove_local: bool,
}

impl<R: RemoteSource> SyncEngine<R> {
    pub fn new(remote: R, excludes: ExcludeSet) -> Self {
        Self {
            remote,
            excludes,
            remove_local: false,
        }
    }

    /// Also delete local entries that no longer exist on the device.
    pub fn with_remove_local(mut self, remove_local: bool) -> Self {
        self.remove_local = remove_local;
        self
    }

    /// Mirrors `remote_root` and everything below it into `local_root`.
    ///
    /// Directories are visited depth-first in listing order. The first error
    /// ends the run; whatever was written before it stays on disk.
    pub async fn run(&self, remote_root: &str, local_root: &Path) -> Result<SyncReport, EngineError> {
        let mut report = SyncReport::default();
        let mut pending = vec![(clean_remote_path(remote_root), local_root.to_path_buf())];

        while let Some((remote_dir, local_dir)) = pending.pop() {
            let children = self
                .sync_directory(&remote_dir, &local_dir, &mut report)
                .await?;
            // Reversed so the first subdirectory is popped next.
            pending.extend(children.into_iter().rev());
        }

        info!(
            directories = report.directories,
            added = report.added,
            updated = report.updated,
            up_to_date = report.up_to_date,
            excluded_files = report.excluded_files,
            excluded_dirs = report.excluded_dirs,
            removed = report.removed,
            "backup finished"
        );
        Ok(report)
    }

    /// Handles a single directory and returns the subdirectories to visit next.
    async fn sync_directory(
        &self,
        remote_dir: &str,
        local_dir: &Path,
        report: &mut SyncReport,
    ) -> Result<Vec<(String, PathBuf)>, EngineError> {
        if self.excludes.contains(remote_dir) {
            info!("excluding {remote_dir}");
            report.excluded_dirs += 1;
            return Ok(Vec::new());
        }

        info!("fetching file list for {remote_dir}");
        let listing = self
            .remote
            .fetch_listing(remote_dir)
            .await
            .map_err(|source| EngineError::Listing {
                path: remote_dir.to_string(),
                source,
            })?;
        report.directories += 1;

        info!(
            "downloading new/changed files from {remote_dir} to {}",
            local_dir.display()
        );
        mirror::update(&self.remote, &listing, local_dir, &self.excludes, report).await?;

        if self.remove_local {
            info!("removing no longer existing files in {}", local_dir.display());
            reclaim::reclaim(&listing, local_dir, report).await?;
        }

        subdirectories(&listing, local_dir)
    }
}

fn subdirectories(
    listing: &RemoteListing,
    local_dir: &Path,
) -> Result<Vec<(String, PathBuf)>, EngineError> {
    listing
        .directories()
        .filter(|entry| {
            let shadows_marker = marker::is_marker_name(&entry.name);
            if shadows_marker {
                warn!(
                    "skipping remote directory that shadows the backup marker: {}",
                    listing.child_path(&entry.name)
                );
            }
            !shadows_marker
        })
        .map(|entry| {
            let local = local_child_path(local_dir, &entry.name).map_err(|source| {
                EngineError::InvalidEntryName {
                    dir: listing.directory_path.clone(),
                    source,
                }
            })?;
            Ok((listing.child_path(&entry.name), local))
        })
        .collect()
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
