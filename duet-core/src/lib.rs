mod client;
mod listing;
pub mod timestamp;

pub use client::{DuetClient, DuetError};
pub use listing::{EntryKind, FileListPage, RemoteEntry, RemoteListing, sort_entries};
pub use reqwest::StatusCode;
