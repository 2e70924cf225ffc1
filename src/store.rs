//! Snapshot store
//!
//! Holds the full normalized record collection as the unit of truth for all
//! queries. Readers clone the current `Arc`, so an ingest that swaps the
//! snapshot never disturbs an in-flight query; there is no partially updated
//! state to observe. The store never re-fetches on its own.

use crate::error::{AppError, Result};
use crate::record::DealRecord;
use parking_lot::RwLock;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// The full record collection at last ingestion
pub type Snapshot = Vec<DealRecord>;

/// Owner of the current snapshot
pub struct SnapshotStore {
    snapshot: RwLock<Option<Arc<Snapshot>>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self {
            snapshot: RwLock::new(None),
        }
    }

    /// Replace the snapshot atomically and return the new one
    pub fn ingest(&self, records: Vec<DealRecord>) -> Arc<Snapshot> {
        let snapshot = Arc::new(records);
        *self.snapshot.write() = Some(snapshot.clone());
        info!("snapshot replaced: {} records", snapshot.len());
        snapshot
    }

    /// Current snapshot
    ///
    /// Fails with `NotReady` if nothing has ever been ingested; the caller
    /// must run ingestion first rather than receive silently empty results.
    pub fn get(&self) -> Result<Arc<Snapshot>> {
        self.snapshot
            .read()
            .clone()
            .ok_or_else(|| AppError::NotReady("no snapshot ingested yet".to_string()))
    }

    pub fn is_ready(&self) -> bool {
        self.snapshot.read().is_some()
    }

    /// Write the snapshot as a single JSON document
    pub fn persist(&self, path: &Path) -> Result<()> {
        let snapshot = self.get()?;
        let json = serde_json::to_string(snapshot.as_ref())?;
        std::fs::write(path, json)?;
        info!("snapshot persisted to {:?}", path);
        Ok(())
    }

    /// Populate the store from a persisted snapshot artifact
    pub fn load(&self, path: &Path) -> Result<usize> {
        let json = std::fs::read_to_string(path)?;
        let records: Vec<DealRecord> = serde_json::from_str(&json)?;
        let count = records.len();
        self.ingest(records);
        info!("snapshot loaded from {:?}: {} records", path, count);
        Ok(count)
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::DealStage;
    use chrono::NaiveDate;

    fn deal(day: u32) -> DealRecord {
        DealRecord {
            close_date: NaiveDate::from_ymd_opt(2024, 3, day),
            engage_date: None,
            close_value: Some(100.0),
            deal_stage: DealStage::Won,
            status: Some("closed".to_string()),
            agent: Some("Moe Frazier".to_string()),
            manager: None,
            account: None,
            product: None,
            sector: None,
            region: None,
            office_location: None,
        }
    }

    #[test]
    fn get_before_ingest_is_not_ready() {
        let store = SnapshotStore::new();
        assert!(!store.is_ready());
        assert!(matches!(store.get(), Err(AppError::NotReady(_))));
    }

    #[test]
    fn ingest_replaces_whole_snapshot() {
        let store = SnapshotStore::new();
        store.ingest(vec![deal(1), deal(2)]);
        assert_eq!(store.get().unwrap().len(), 2);

        store.ingest(vec![deal(3)]);
        assert_eq!(store.get().unwrap().len(), 1);
    }

    #[test]
    fn readers_keep_their_snapshot_across_ingest() {
        let store = SnapshotStore::new();
        store.ingest(vec![deal(1), deal(2)]);

        let reader = store.get().unwrap();
        store.ingest(vec![deal(3)]);

        assert_eq!(reader.len(), 2);
        assert_eq!(store.get().unwrap().len(), 1);
    }

    #[test]
    fn persist_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.json");

        let store = SnapshotStore::new();
        store.ingest(vec![deal(1), deal(2)]);
        store.persist(&path).unwrap();

        let restored = SnapshotStore::new();
        assert_eq!(restored.load(&path).unwrap(), 2);
        assert_eq!(restored.get().unwrap().as_ref(), store.get().unwrap().as_ref());
    }
}
