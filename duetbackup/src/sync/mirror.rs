use std::io;
use std::path::{Path, PathBuf};
use std::time::{Instant, SystemTime};

use duet_core::{DuetError, RemoteEntry, RemoteListing};
use filetime::FileTime;
use tracing::{debug, warn};

use super::engine::{EngineError, SyncReport};
use super::excludes::ExcludeSet;
use super::marker;
use super::paths::local_child_path;
use super::remote::RemoteSource;

/// Brings the files of one remote directory up to date in `local_dir`.
///
/// The directory is created if needed and its marker is (re)written before any
/// file is looked at. Subdirectories in the listing are left alone.
pub async fn update<R: RemoteSource>(
    remote: &R,
    listing: &RemoteListing,
    local_dir: &Path,
    excludes: &ExcludeSet,
    report: &mut SyncReport,
) -> Result<(), EngineError> {
    ensure_local_dir(local_dir).await?;

    for entry in listing.files() {
        let remote_path = listing.child_path(&entry.name);
        if marker::is_marker_name(&entry.name) {
            warn!("skipping remote file that shadows the backup marker: {remote_path}");
            continue;
        }
        if excludes.contains(&remote_path) {
            debug!("excluding: {remote_path}");
            report.excluded_files += 1;
            continue;
        }

        let target = local_child_path(local_dir, &entry.name).map_err(|source| {
            EngineError::InvalidEntryName {
                dir: listing.directory_path.clone(),
                source,
            }
        })?;

        let local_mtime = local_modified(&target).await?;
        match local_mtime {
            Some(mtime) if mtime >= entry.modified_at => {
                debug!("up-to-date: {remote_path}");
                report.up_to_date += 1;
            }
            _ => {
                let kibs = fetch_file(remote, &remote_path, entry, &target).await?;
                if local_mtime.is_some() {
                    debug!("updated: {remote_path} ({kibs:.1} KiB/s)");
                    report.updated += 1;
                } else {
                    debug!("added: {remote_path} ({kibs:.1} KiB/s)");
                    report.added += 1;
                }
            }
        }
    }

    Ok(())
}

async fn ensure_local_dir(local_dir: &Path) -> Result<(), EngineError> {
    match tokio::fs::metadata(local_dir).await {
        Ok(_) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            debug!("creating directory {}", local_dir.display());
            tokio::fs::create_dir_all(local_dir)
                .await
                .map_err(EngineError::io("create directory", local_dir))?;
        }
        Err(err) => return Err(EngineError::io("stat", local_dir)(err)),
    }
    marker::write_marker(local_dir)
        .await
        .map_err(EngineError::io("write marker", &marker::marker_path(local_dir)))
}

async fn local_modified(target: &Path) -> Result<Option<SystemTime>, EngineError> {
    let meta = match tokio::fs::metadata(target).await {
        Ok(meta) => meta,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(EngineError::io("stat", target)(err)),
    };
    if meta.is_dir() {
        return Err(EngineError::io("write file", target)(io::Error::other(
            "a directory is in the way of a remote file",
        )));
    }
    meta.modified()
        .map(Some)
        .map_err(EngineError::io("stat", target))
}

/// Streams `entry` into `target` through a `.partial` file, stamps it with the
/// remote mtime and returns the transfer rate in KiB/s.
///
/// The partial file is synced to disk before the rename, so `target` either
/// keeps its previous contents or holds the complete download.
async fn fetch_file<R: RemoteSource>(
    remote: &R,
    remote_path: &str,
    entry: &RemoteEntry,
    target: &Path,
) -> Result<f64, EngineError> {
    let partial = partial_path(target);
    let mut file = tokio::fs::File::create(&partial)
        .await
        .map_err(EngineError::io("write file", &partial))?;

    let started = Instant::now();
    let written = match remote.download_to(remote_path, &mut file).await {
        Ok(written) => written,
        Err(err) => {
            drop(file);
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(match err {
                DuetError::Io(source) => EngineError::io("write file", &partial)(source),
                source => EngineError::Download {
                    path: remote_path.to_string(),
                    source,
                },
            });
        }
    };
    let elapsed = started.elapsed().as_secs_f64();

    file.sync_all()
        .await
        .map_err(EngineError::io("sync file", &partial))?;
    drop(file);

    let stamp = FileTime::from_system_time(entry.modified_at);
    filetime::set_file_times(&partial, stamp, stamp)
        .map_err(EngineError::io("set mtime", &partial))?;
    tokio::fs::rename(&partial, target)
        .await
        .map_err(EngineError::io("write file", target))?;

    let kibs = if elapsed > 0.0 {
        written as f64 / elapsed / 1024.0
    } else {
        0.0
    };
    Ok(kibs)
}

fn partial_path(target: &Path) -> PathBuf {
    let mut name = target.file_name().unwrap_or_default().to_os_string();
    name.push(".partial");
    target.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_path_appends_suffix() {
        assert_eq!(
            partial_path(Path::new("/backup/sys/config.g")),
            PathBuf::from("/backup/sys/config.g.partial")
        );
        assert_eq!(
            partial_path(Path::new("/backup/sys/Makefile")),
            PathBuf::from("/backup/sys/Makefile.partial")
        );
    }
}
