//! Ingest Service
//!
//! Fetch-all-pages-then-replace: walks the upstream source sequentially,
//! normalizes every record, swaps the snapshot in one step and persists the
//! JSON artifact. The only operation in the crate that touches the network.

use crate::error::Result;
use crate::record::DealRecord;
use crate::source::fetch_all_records;
use crate::state::AppState;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Result of an ingest run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestResult {
    pub success: bool,
    pub records: usize,
    /// "remote" for a fresh fetch, "cache" for a cold-start restore.
    pub origin: String,
}

/// Snapshot readiness report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotStatus {
    pub ready: bool,
    pub records: usize,
}

/// Ingestion service for snapshot lifecycle
pub struct IngestService;

impl IngestService {
    /// Fetch every page from the source and replace the snapshot
    ///
    /// Any page failure aborts the whole run; the previous snapshot stays in
    /// place and in-flight readers are never disturbed.
    pub async fn refresh(state: &AppState) -> Result<IngestResult> {
        info!("IngestService::refresh - table={}", state.table);

        let raw = fetch_all_records(state.source.as_ref(), &state.table).await?;
        let records: Vec<DealRecord> = raw.iter().map(DealRecord::from_raw).collect();
        let count = records.len();

        state.store.ingest(records);
        state.store.persist(&state.snapshot_path())?;

        Ok(IngestResult {
            success: true,
            records: count,
            origin: "remote".to_string(),
        })
    }

    /// Cold start: populate the store from the persisted artifact if present
    ///
    /// Returns `Ok(None)` when no artifact exists; the caller decides whether
    /// to refresh from the source.
    pub fn restore(state: &AppState) -> Result<Option<IngestResult>> {
        let path = state.snapshot_path();
        if !path.exists() {
            info!("IngestService::restore - no artifact at {:?}", path);
            return Ok(None);
        }

        let count = state.store.load(&path)?;

        Ok(Some(IngestResult {
            success: true,
            records: count,
            origin: "cache".to_string(),
        }))
    }

    /// Readiness and record count of the current snapshot
    pub fn status(state: &AppState) -> SnapshotStatus {
        match state.store.get() {
            Ok(snapshot) => SnapshotStatus {
                ready: true,
                records: snapshot.len(),
            },
            Err(_) => SnapshotStatus {
                ready: false,
                records: 0,
            },
        }
    }
}
