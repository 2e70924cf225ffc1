//! Conversion Service
//!
//! Conversion rates and won/lost counters. An opportunity is any record whose
//! close date falls in the window, whatever its stage; only `Won` and `Lost`
//! stages feed the counters, everything else is in progress. Days with zero
//! opportunities never appear in a rate map.

use crate::engine::{group_count, ratio_pct, DatePredicate};
use crate::error::Result;
use crate::presenters::present_rate;
use crate::record::{DealRecord, DealStage};
use crate::state::AppState;
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

/// Conversion rate for one day
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayConversion {
    pub day: u32,
    pub won: u64,
    pub opportunities: u64,
    /// `won / opportunities * 100`; always present since a day only appears
    /// with at least one opportunity.
    pub rate: Option<f64>,
}

/// Result of the conversion rate query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionResult {
    pub success: bool,
    pub month: u32,
    pub days: Vec<DayConversion>,
}

/// Won/lost counts for one day
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayWonLost {
    pub day: u32,
    pub won: u64,
    pub lost: u64,
}

/// Result of the won/lost queries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WonLostResult {
    pub success: bool,
    pub month: u32,
    pub won: u64,
    pub lost: u64,
    pub days: Vec<DayWonLost>,
}

/// Opportunity count for one day, grouped by engage date
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayVolume {
    pub day: u32,
    pub count: u64,
}

/// Result of the opportunity volume query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpportunityVolumeResult {
    pub success: bool,
    pub month: u32,
    pub days: Vec<DayVolume>,
}

/// Conversion service for rate and counter queries
pub struct ConversionService;

impl ConversionService {
    /// Per-day conversion rates for a month, optionally narrowed to one day
    pub fn conversion_rates(
        state: &AppState,
        month: u32,
        day: Option<u32>,
    ) -> Result<ConversionResult> {
        info!("ConversionService::conversion_rates - month={} day={:?}", month, day);

        let predicate = predicate_for(month, day)?;
        let snapshot = state.store.get()?;

        let opportunities = group_count(scoped(&snapshot, &predicate), |r| {
            r.close_date.map(|d| d.day())
        });
        let won = group_count(scoped(&snapshot, &predicate), |r| match r.deal_stage {
            DealStage::Won => r.close_date.map(|d| d.day()),
            _ => None,
        });

        let days = opportunities
            .into_iter()
            .map(|(day, total)| {
                let won_count = won.get(&day).copied().unwrap_or(0);
                DayConversion {
                    day,
                    won: won_count,
                    opportunities: total,
                    rate: present_rate(ratio_pct(won_count, total)),
                }
            })
            .collect();

        Ok(ConversionResult {
            success: true,
            month,
            days,
        })
    }

    /// Won and lost deal counts per day plus month totals
    ///
    /// Stages other than `Won` and `Lost` count toward neither side.
    pub fn won_lost(state: &AppState, month: u32, day: Option<u32>) -> Result<WonLostResult> {
        info!("ConversionService::won_lost - month={} day={:?}", month, day);

        let predicate = predicate_for(month, day)?;
        let snapshot = state.store.get()?;

        let won_by_day = group_count(scoped(&snapshot, &predicate), |r| match r.deal_stage {
            DealStage::Won => r.close_date.map(|d| d.day()),
            _ => None,
        });
        let lost_by_day = group_count(scoped(&snapshot, &predicate), |r| match r.deal_stage {
            DealStage::Lost => r.close_date.map(|d| d.day()),
            _ => None,
        });

        let mut day_keys: BTreeMap<u32, ()> = BTreeMap::new();
        day_keys.extend(won_by_day.keys().map(|d| (*d, ())));
        day_keys.extend(lost_by_day.keys().map(|d| (*d, ())));

        let days: Vec<DayWonLost> = day_keys
            .into_keys()
            .map(|day| DayWonLost {
                day,
                won: won_by_day.get(&day).copied().unwrap_or(0),
                lost: lost_by_day.get(&day).copied().unwrap_or(0),
            })
            .collect();

        Ok(WonLostResult {
            success: true,
            month,
            won: days.iter().map(|d| d.won).sum(),
            lost: days.iter().map(|d| d.lost).sum(),
            days,
        })
    }

    /// Deal counts per engage-date day
    ///
    /// The only query scoped by `engage_date` instead of `close_date`.
    pub fn opportunity_volume(
        state: &AppState,
        month: u32,
        day: Option<u32>,
    ) -> Result<OpportunityVolumeResult> {
        info!("ConversionService::opportunity_volume - month={} day={:?}", month, day);

        let predicate = predicate_for(month, day)?;
        let snapshot = state.store.get()?;

        let counts = group_count(
            snapshot.iter().filter(|r| predicate.matches(r.engage_date)),
            |r| r.engage_date.map(|d| d.day()),
        );

        let days = counts
            .into_iter()
            .map(|(day, count)| DayVolume { day, count })
            .collect();

        Ok(OpportunityVolumeResult {
            success: true,
            month,
            days,
        })
    }
}

fn predicate_for(month: u32, day: Option<u32>) -> Result<DatePredicate> {
    match day {
        Some(day) => DatePredicate::month_day(month, day),
        None => DatePredicate::month(month),
    }
}

fn scoped<'a>(
    records: &'a [DealRecord],
    predicate: &'a DatePredicate,
) -> impl Iterator<Item = &'a DealRecord> {
    records.iter().filter(|r| predicate.matches(r.close_date))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
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
        let dir = std::env::temp_dir().join("pipeline-analytics-conversion-tests");
        let state = AppState::new(Arc::new(NullSource), "sales_pipeline", &dir).unwrap();
        state.store.ingest(records);
        state
    }

    fn deal(month: u32, day: u32, stage: DealStage) -> DealRecord {
        DealRecord {
            close_date: NaiveDate::from_ymd_opt(2024, month, day),
            engage_date: NaiveDate::from_ymd_opt(2024, month, day),
            close_value: Some(100.0),
            deal_stage: stage,
            status: None,
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
    fn one_won_one_lost_is_fifty_percent() {
        let state = state_with(vec![
            deal(3, 5, DealStage::Won),
            deal(3, 5, DealStage::Lost),
        ]);

        let result = ConversionService::conversion_rates(&state, 3, Some(5)).unwrap();
        assert_eq!(result.days.len(), 1);
        assert_eq!(result.days[0].rate, Some(50.0));
        assert_eq!(result.days[0].opportunities, 2);
    }

    #[test]
    fn in_progress_stages_dilute_the_rate() {
        let state = state_with(vec![
            deal(3, 5, DealStage::Won),
            deal(3, 5, DealStage::Other("Engaging".to_string())),
            deal(3, 5, DealStage::Other("Prospecting".to_string())),
            deal(3, 5, DealStage::Won),
        ]);

        let result = ConversionService::conversion_rates(&state, 3, None).unwrap();
        assert_eq!(result.days[0].rate, Some(50.0));
        assert_eq!(result.days[0].won, 2);
        assert_eq!(result.days[0].opportunities, 4);
    }

    #[test]
    fn rates_stay_within_bounds() {
        let state = state_with(vec![
            deal(3, 1, DealStage::Won),
            deal(3, 2, DealStage::Lost),
            deal(3, 3, DealStage::Won),
            deal(3, 3, DealStage::Lost),
        ]);

        let result = ConversionService::conversion_rates(&state, 3, None).unwrap();
        for day in &result.days {
            let rate = day.rate.unwrap();
            assert!((0.0..=100.0).contains(&rate), "rate {} out of bounds", rate);
        }
    }

    #[test]
    fn zero_opportunity_days_are_omitted() {
        let state = state_with(vec![deal(3, 5, DealStage::Won)]);

        let result = ConversionService::conversion_rates(&state, 3, None).unwrap();
        assert_eq!(result.days.len(), 1);

        let empty = ConversionService::conversion_rates(&state, 7, None).unwrap();
        assert!(empty.days.is_empty());
    }

    #[test]
    fn won_lost_ignores_other_stages() {
        let state = state_with(vec![
            deal(3, 5, DealStage::Won),
            deal(3, 5, DealStage::Lost),
            deal(3, 5, DealStage::Other("Engaging".to_string())),
            deal(3, 8, DealStage::Lost),
        ]);

        let result = ConversionService::won_lost(&state, 3, None).unwrap();
        assert_eq!(result.won, 1);
        assert_eq!(result.lost, 2);
        assert_eq!(result.days.len(), 2);
        assert_eq!(result.days[1].day, 8);
        assert_eq!(result.days[1].won, 0);
    }

    #[test]
    fn opportunity_volume_uses_engage_date() {
        let mut open_deal = deal(3, 12, DealStage::Other("Engaging".to_string()));
        open_deal.close_date = None;
        let state = state_with(vec![open_deal, deal(4, 2, DealStage::Won)]);

        let result = ConversionService::opportunity_volume(&state, 3, None).unwrap();
        assert_eq!(result.days.len(), 1);
        assert_eq!(result.days[0].day, 12);
        assert_eq!(result.days[0].count, 1);
    }

    #[test]
    fn invalid_predicate_is_a_validation_error() {
        let state = state_with(vec![]);
        let err = ConversionService::conversion_rates(&state, 13, None).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
