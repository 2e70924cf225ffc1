//! Application state management

use crate::error::Result;
use crate::source::RecordSource;
use crate::store::SnapshotStore;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Application state shared across all queries
pub struct AppState {
    /// Snapshot store holding the normalized record collection
    pub store: SnapshotStore,

    /// Upstream paginated record source
    pub source: Arc<dyn RecordSource>,

    /// Table identifier to ingest from
    pub table: String,

    /// Directory holding the persisted snapshot artifact
    pub data_dir: PathBuf,
}

impl AppState {
    /// Create new application state
    pub fn new(source: Arc<dyn RecordSource>, table: &str, data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir)?;

        tracing::info!("Data directory: {:?}", data_dir);

        Ok(Self {
            store: SnapshotStore::new(),
            source,
            table: table.to_string(),
            data_dir: data_dir.to_path_buf(),
        })
    }

    /// Path of the single persisted snapshot artifact
    pub fn snapshot_path(&self) -> PathBuf {
        self.data_dir.join("snapshot.json")
    }
}
