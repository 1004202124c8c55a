use std::cmp::Ordering;
use std::time::SystemTime;

use serde::{Deserialize, Deserializer};

use crate::timestamp::parse_wire_timestamp;

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub enum EntryKind {
    #[serde(rename = "d")]
    Directory,
    #[serde(rename = "f")]
    File,
}

/// One child of a remote directory as reported by `rr_filelist`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct RemoteEntry {
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub name: String,
    #[serde(default)]
    pub size: u64,
    #[serde(rename = "date", deserialize_with = "deserialize_wire_time")]
    pub modified_at: SystemTime,
}

impl RemoteEntry {
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

/// A single `rr_filelist` response.
#[derive(Debug, Clone, Deserialize)]
pub struct FileListPage {
    pub dir: String,
    #[serde(default)]
    pub files: Vec<RemoteEntry>,
    /// Cursor for the following page; zero when this was the last one.
    #[serde(default)]
    pub next: u64,
}

/// All children of one remote directory, directories first, then by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteListing {
    pub directory_path: String,
    pub entries: Vec<RemoteEntry>,
}

impl RemoteListing {
    pub fn new(directory_path: impl Into<String>, mut entries: Vec<RemoteEntry>) -> Self {
        sort_entries(&mut entries);
        Self {
            directory_path: directory_path.into(),
            entries,
        }
    }

    pub fn files(&self) -> impl Iterator<Item = &RemoteEntry> {
        self.entries.iter().filter(|entry| !entry.is_dir())
    }

    pub fn directories(&self) -> impl Iterator<Item = &RemoteEntry> {
        self.entries.iter().filter(|entry| entry.is_dir())
    }

    /// Full remote path of a child of this directory.
    pub fn child_path(&self, name: &str) -> String {
        format!("{}/{}", self.directory_path, name)
    }
}

/// Stable sort: directories before files, then byte-wise by name.
pub fn sort_entries(entries: &mut [RemoteEntry]) {
    entries.sort_by(compare_entries);
}

fn compare_entries(a: &RemoteEntry, b: &RemoteEntry) -> Ordering {
    match (a.is_dir(), b.is_dir()) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => a.name.cmp(&b.name),
    }
}

fn deserialize_wire_time<'de, D>(deserializer: D) -> Result<SystemTime, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    parse_wire_timestamp(&value).map_err(serde::de::Error::custom)
}
