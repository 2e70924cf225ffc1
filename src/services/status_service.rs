//! Status Service
//!
//! Rollup over the free-text `status` field. Exactly three values are
//! recognized, case-insensitively; anything else is ignored. This field is
//! independent of `deal_stage`.

use crate::engine::DatePredicate;
use crate::error::Result;
use crate::state::AppState;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Result of the status rollup query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusRollupResult {
    pub success: bool,
    pub month: Option<u32>,
    pub closed: u64,
    pub in_progress: u64,
    pub lost: u64,
}

/// Status service for the status rollup
pub struct StatusService;

impl StatusService {
    /// Counts of closed / in_progress / lost statuses
    ///
    /// With a month the rollup is close-date scoped like every other date
    /// filter; without one it covers the whole snapshot.
    pub fn rollup(state: &AppState, month: Option<u32>) -> Result<StatusRollupResult> {
        info!("StatusService::rollup - month={:?}", month);

        let predicate = month.map(DatePredicate::month).transpose()?;
        let snapshot = state.store.get()?;

        let mut closed = 0;
        let mut in_progress = 0;
        let mut lost = 0;

        for record in snapshot.iter() {
            if let Some(p) = &predicate {
                if !p.matches(record.close_date) {
                    continue;
                }
            }
            match record.status.as_deref().map(str::to_ascii_lowercase).as_deref() {
                Some("closed") => closed += 1,
                Some("in_progress") => in_progress += 1,
                Some("lost") => lost += 1,
                _ => {}
            }
        }

        Ok(StatusRollupResult {
            success: true,
            month,
            closed,
            in_progress,
            lost,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::record::{DealRecord, DealStage};
    use crate::source::{RecordPage, RecordSource};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::Arc;

    struct NullSource;

    #[async_trait]
    impl RecordSource for NullSource {
        async fn fetch_page(&self, _table: &str, _cursor: Option<&str>) -> Result<RecordPage> {
            Ok(RecordPage {
                records: vec![],
                next_cursor: None,
            })
        }
    }

    fn state_with(records: Vec<DealRecord>) -> AppState {
        let dir = std::env::temp_dir().join("pipeline-analytics-status-tests");
        let state = AppState::new(Arc::new(NullSource), "sales_pipeline", &dir).unwrap();
        state.store.ingest(records);
        state
    }

    fn deal(status: Option<&str>, month: u32) -> DealRecord {
        DealRecord {
            close_date: NaiveDate::from_ymd_opt(2024, month, 5),
            engage_date: None,
            close_value: Some(0.0),
            deal_stage: DealStage::Other(String::new()),
            status: status.map(str::to_string),
            agent: None,
            manager: None,
            account: None,
            product: None,
            sector: None,
            region: None,
            office_location: None,
        }
    }

    #[test]
    fn rollup_is_case_insensitive_and_drops_unknowns() {
        let state = state_with(vec![
            deal(Some("Closed"), 3),
            deal(Some("CLOSED"), 3),
            deal(Some("In_Progress"), 3),
            deal(Some("lost"), 3),
            deal(Some("paused"), 3),
            deal(None, 3),
        ]);

        let result = StatusService::rollup(&state, None).unwrap();
        assert_eq!(result.closed, 2);
        assert_eq!(result.in_progress, 1);
        assert_eq!(result.lost, 1);
    }

    #[test]
    fn month_scoped_rollup_filters_by_close_date() {
        let state = state_with(vec![deal(Some("closed"), 3), deal(Some("closed"), 4)]);

        let result = StatusService::rollup(&state, Some(3)).unwrap();
        assert_eq!(result.closed, 1);

        let err = StatusService::rollup(&state, Some(0)).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
