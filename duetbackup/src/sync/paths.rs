use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    #[error("entry name is empty")]
    Empty,
    #[error("entry name {0:?} would leave its directory")]
    UnsupportedName(String),
}

/// Collapses runs of `/` into one and drops a single trailing `/`.
pub fn clean_remote_path(path: &str) -> String {
    let mut cleaned = String::with_capacity(path.len());
    let mut previous_slash = false;
    for ch in path.chars() {
        if ch == '/' {
            if previous_slash {
                continue;
            }
            previous_slash = true;
        } else {
            previous_slash = false;
        }
        cleaned.push(ch);
    }
    if cleaned.ends_with('/') {
        cleaned.pop();
    }
    cleaned
}

/// Maps a remote entry name onto a path inside `local_dir`.
pub fn local_child_path(local_dir: &Path, name: &str) -> Result<PathBuf, PathError> {
    if name.is_empty() {
        return Err(PathError::Empty);
    }
    // Names come straight from the device; keep them to a single component.
    if name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\0')
        || (cfg!(windows) && name.contains('\\'))
    {
        return Err(PathError::UnsupportedName(name.to_string()));
    }
    Ok(local_dir.join(name))
}
