//! Sector Service
//!
//! One query, five selectable metrics per sector. The metric string comes
//! straight from the caller and is validated before any record is touched.

use crate::engine::{group_count, group_sum, ratio_pct, DatePredicate};
use crate::error::{AppError, Result};
use crate::presenters::{present_rate, round2};
use crate::record::{DealRecord, DealStage};
use crate::state::AppState;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::info;

/// Metric selectable for sector analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectorMetric {
    ConversionRate,
    WonDeals,
    LostDeals,
    TotalOpportunities,
    TotalSales,
}

impl FromStr for SectorMetric {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "conversion_rate" => Ok(SectorMetric::ConversionRate),
            "won_deals" => Ok(SectorMetric::WonDeals),
            "lost_deals" => Ok(SectorMetric::LostDeals),
            "total_opportunities" => Ok(SectorMetric::TotalOpportunities),
            "total_sales" => Ok(SectorMetric::TotalSales),
            other => Err(AppError::Validation(format!(
                "unknown sector metric '{}', expected one of conversion_rate, won_deals, \
                 lost_deals, total_opportunities, total_sales",
                other
            ))),
        }
    }
}

/// One sector's value for the selected metric
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectorValue {
    pub sector: Option<String>,
    pub value: Option<f64>,
}

/// Result of the sector analysis query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectorAnalysisResult {
    pub success: bool,
    pub month: u32,
    pub metric: SectorMetric,
    pub sectors: Vec<SectorValue>,
}

/// Sector service for the parameterized sector report
pub struct SectorService;

impl SectorService {
    /// Per-sector value of the requested metric, descending
    pub fn analyze(state: &AppState, month: u32, metric: &str) -> Result<SectorAnalysisResult> {
        info!("SectorService::analyze - month={} metric={}", month, metric);

        let metric = SectorMetric::from_str(metric)?;
        let predicate = DatePredicate::month(month)?;
        let snapshot = state.store.get()?;

        let scoped = || snapshot.iter().filter(|r| predicate.matches(r.close_date));

        let opportunities = group_count(scoped(), |r| Some(r.sector.clone()));
        let won = group_count(scoped(), |r| match r.deal_stage {
            DealStage::Won => Some(r.sector.clone()),
            _ => None,
        });
        let lost = group_count(scoped(), |r| match r.deal_stage {
            DealStage::Lost => Some(r.sector.clone()),
            _ => None,
        });
        let sales = group_sum(scoped(), |r| Some(r.sector.clone()), |r: &DealRecord| r.close_value);

        let mut sectors: Vec<SectorValue> = opportunities
            .iter()
            .map(|(sector, total)| {
                let value = match metric {
                    SectorMetric::ConversionRate => present_rate(ratio_pct(
                        won.get(sector).copied().unwrap_or(0),
                        *total,
                    )),
                    SectorMetric::WonDeals => Some(won.get(sector).copied().unwrap_or(0) as f64),
                    SectorMetric::LostDeals => Some(lost.get(sector).copied().unwrap_or(0) as f64),
                    SectorMetric::TotalOpportunities => Some(*total as f64),
                    SectorMetric::TotalSales => {
                        Some(round2(sales.get(sector).copied().unwrap_or(0.0)))
                    }
                };
                SectorValue {
                    sector: sector.clone(),
                    value,
                }
            })
            .collect();

        sectors.sort_by(|a, b| {
            b.value
                .partial_cmp(&a.value)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        Ok(SectorAnalysisResult {
            success: true,
            month,
            metric,
            sectors,
        })
    }
}
