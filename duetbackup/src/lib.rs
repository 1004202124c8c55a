pub mod config;
pub mod sync;

pub use config::{BackupConfig, Cli};
pub use sync::engine::{EngineError, SyncEngine, SyncReport};
pub use sync::excludes::ExcludeSet;
pub use sync::remote::RemoteSource;
