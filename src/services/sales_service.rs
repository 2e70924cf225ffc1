//! Sales Service
//!
//! Monetary aggregates over the snapshot: daily and monthly totals,
//! day-over-day deltas, product / category / region breakdowns and
//! period-over-period comparisons. Every operation filters by the close date
//! predicate, folds close values per grouping key and rounds at the edge.

use crate::engine::{group_sum, pct_change, DatePredicate};
use crate::error::{AppError, Result};
use crate::presenters::{present_rate, round2};
use crate::record::DealRecord;
use crate::state::AppState;
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::info;

/// One `(year, month, day)` bucket
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyTotal {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub total: f64,
}

/// Result of the daily sales total query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyTotalsResult {
    pub success: bool,
    pub days: Vec<DailyTotal>,
}

/// One day within the monthly report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaySales {
    pub day: u32,
    pub total: f64,
    /// Percent change vs. the previous day in sorted day order; `None` for
    /// the first day or a zero-total previous day.
    pub change_pct: Option<f64>,
}

/// Result of the monthly sales query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlySalesResult {
    pub success: bool,
    pub month: u32,
    pub total: f64,
    pub days: Vec<DaySales>,
}

/// Scalar monthly total
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlyTotalResult {
    pub success: bool,
    pub month: u32,
    pub total: f64,
}

/// Per-product sales volume
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductSales {
    /// `None` when the linked product never resolved; the bucket passes
    /// through rather than being folded into a synthetic name.
    pub product: Option<String>,
    pub total: f64,
}

/// Result of the sales-by-product query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductSalesResult {
    pub success: bool,
    pub month: u32,
    pub products: Vec<ProductSales>,
}

/// Selectable grouping dimension for the category report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Manager,
    SalesAgent,
    Account,
}

impl Category {
    fn select(&self, record: &DealRecord) -> Option<String> {
        match self {
            Category::Manager => record.manager.clone(),
            Category::SalesAgent => record.agent.clone(),
            Category::Account => record.account.clone(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Manager => "manager",
            Category::SalesAgent => "sales_agent",
            Category::Account => "account",
        }
    }
}

impl FromStr for Category {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "manager" => Ok(Category::Manager),
            "sales_agent" => Ok(Category::SalesAgent),
            "account" => Ok(Category::Account),
            other => Err(AppError::Validation(format!(
                "unknown category '{}', expected manager, sales_agent or account",
                other
            ))),
        }
    }
}

/// One bucket of the category report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorySales {
    pub key: Option<String>,
    pub total: f64,
}

/// Result of the sales-by-category query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorySalesResult {
    pub success: bool,
    pub month: u32,
    pub category: Category,
    pub groups: Vec<CategorySales>,
}

/// One region's share of the month
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionShare {
    pub region: Option<String>,
    pub total: f64,
    /// Share of the grand total; 0.0 when the grand total itself is 0.
    pub share_pct: f64,
}

/// Result of the regional breakdown query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionBreakdownResult {
    pub success: bool,
    pub month: u32,
    pub grand_total: f64,
    pub regions: Vec<RegionShare>,
}

/// Period-over-period comparison
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodComparisonResult {
    pub success: bool,
    pub current_total: f64,
    pub previous_total: f64,
    /// `None` when the previous period has no total to compare against.
    pub change_pct: Option<f64>,
}

/// Sales service for monetary aggregates
pub struct SalesService;

impl SalesService {
    /// Sum of close values per `(year, month, day)` for one month/day window
    pub fn daily_total(state: &AppState, month: u32, day: u32) -> Result<DailyTotalsResult> {
        info!("SalesService::daily_total - month={} day={}", month, day);

        let predicate = DatePredicate::month_day(month, day)?;
        let snapshot = state.store.get()?;

        let totals = group_sum(
            scoped(&snapshot, &predicate),
            |r| r.close_date.map(|d| (d.year(), d.month(), d.day())),
            |r| r.close_value,
        );

        let days = totals
            .into_iter()
            .map(|((year, month, day), total)| DailyTotal {
                year,
                month,
                day,
                total: round2(total),
            })
            .collect();

        Ok(DailyTotalsResult { success: true, days })
    }

    /// Per-day totals for a month with day-over-day percent changes
    pub fn monthly_sales(state: &AppState, month: u32) -> Result<MonthlySalesResult> {
        info!("SalesService::monthly_sales - month={}", month);

        let predicate = DatePredicate::month(month)?;
        let snapshot = state.store.get()?;

        let by_day = group_sum(
            scoped(&snapshot, &predicate),
            |r| r.close_date.map(|d| d.day()),
            |r| r.close_value,
        );

        let total: f64 = by_day.values().sum();
        let mut days = Vec::with_capacity(by_day.len());
        let mut previous: Option<f64> = None;

        for (day, day_total) in by_day {
            let change_pct = present_rate(previous.and_then(|p| pct_change(day_total, p)));
            days.push(DaySales {
                day,
                total: round2(day_total),
                change_pct,
            });
            previous = Some(day_total);
        }

        Ok(MonthlySalesResult {
            success: true,
            month,
            total: round2(total),
            days,
        })
    }

    /// Scalar sum of close values for a month
    pub fn monthly_total(state: &AppState, month: u32) -> Result<MonthlyTotalResult> {
        info!("SalesService::monthly_total - month={}", month);

        let predicate = DatePredicate::month(month)?;
        let snapshot = state.store.get()?;

        Ok(MonthlyTotalResult {
            success: true,
            month,
            total: round2(scoped_total(&snapshot, &predicate)),
        })
    }

    /// Sales volume per product, descending
    pub fn sales_by_product(state: &AppState, month: u32) -> Result<ProductSalesResult> {
        info!("SalesService::sales_by_product - month={}", month);

        let predicate = DatePredicate::month(month)?;
        let snapshot = state.store.get()?;

        let totals = group_sum(
            scoped(&snapshot, &predicate),
            |r| Some(r.product.clone()),
            |r| r.close_value,
        );

        let products = sorted_desc(totals)
            .into_iter()
            .map(|(product, total)| ProductSales {
                product,
                total: round2(total),
            })
            .collect();

        Ok(ProductSalesResult {
            success: true,
            month,
            products,
        })
    }

    /// Sales volume grouped by a selectable dimension, descending
    ///
    /// The category string is validated before any computation; an unknown
    /// value is a client error, never a silent default.
    pub fn sales_by_category(
        state: &AppState,
        month: u32,
        category: &str,
    ) -> Result<CategorySalesResult> {
        info!("SalesService::sales_by_category - month={} category={}", month, category);

        let category = Category::from_str(category)?;
        let predicate = DatePredicate::month(month)?;
        let snapshot = state.store.get()?;

        let totals = group_sum(
            scoped(&snapshot, &predicate),
            |r| Some(category.select(r)),
            |r| r.close_value,
        );

        let groups = sorted_desc(totals)
            .into_iter()
            .map(|(key, total)| CategorySales {
                key,
                total: round2(total),
            })
            .collect();

        Ok(CategorySalesResult {
            success: true,
            month,
            category,
            groups,
        })
    }

    /// Per-region totals with share of the grand total
    pub fn regional_breakdown(state: &AppState, month: u32) -> Result<RegionBreakdownResult> {
        info!("SalesService::regional_breakdown - month={}", month);

        let predicate = DatePredicate::month(month)?;
        let snapshot = state.store.get()?;

        let totals = group_sum(
            scoped(&snapshot, &predicate),
            |r| Some(r.region.clone()),
            |r| r.close_value,
        );

        let grand_total: f64 = totals.values().sum();

        let regions = sorted_desc(totals)
            .into_iter()
            .map(|(region, total)| {
                let share_pct = if grand_total == 0.0 {
                    0.0
                } else {
                    round2(total / grand_total * 100.0)
                };
                RegionShare {
                    region,
                    total: round2(total),
                    share_pct,
                }
            })
            .collect();

        Ok(RegionBreakdownResult {
            success: true,
            month,
            grand_total: round2(grand_total),
            regions,
        })
    }

    /// Month vs. the previous calendar month (January compares to December)
    pub fn month_over_month(state: &AppState, month: u32) -> Result<PeriodComparisonResult> {
        info!("SalesService::month_over_month - month={}", month);

        let predicate = DatePredicate::month(month)?;
        Self::compare(state, predicate)
    }

    /// Day vs. the previous day within the same month
    pub fn day_over_day(state: &AppState, month: u32, day: u32) -> Result<PeriodComparisonResult> {
        info!("SalesService::day_over_day - month={} day={}", month, day);

        let predicate = DatePredicate::month_day(month, day)?;
        Self::compare(state, predicate)
    }

    // ========================================================================
    // Private Helper Methods
    // ========================================================================

    fn compare(state: &AppState, predicate: DatePredicate) -> Result<PeriodComparisonResult> {
        let snapshot = state.store.get()?;

        let current_total = scoped_total(&snapshot, &predicate);
        let previous_total = predicate
            .previous()
            .map(|p| scoped_total(&snapshot, &p))
            .unwrap_or(0.0);

        let change_pct = present_rate(
            predicate
                .previous()
                .and_then(|_| pct_change(current_total, previous_total)),
        );

        Ok(PeriodComparisonResult {
            success: true,
            current_total: round2(current_total),
            previous_total: round2(previous_total),
            change_pct,
        })
    }
}

/// Records inside the predicate window
fn scoped<'a>(
    records: &'a [DealRecord],
    predicate: &'a DatePredicate,
) -> impl Iterator<Item = &'a DealRecord> {
    records.iter().filter(|r| predicate.matches(r.close_date))
}

/// Sum of close values inside the window, skipping coercion failures
fn scoped_total(records: &[DealRecord], predicate: &DatePredicate) -> f64 {
    scoped(records, predicate).filter_map(|r| r.close_value).sum()
}

/// Descending by value; ties stay in ascending key order
fn sorted_desc<K: Ord>(totals: std::collections::BTreeMap<K, f64>) -> Vec<(K, f64)> {
    let mut entries: Vec<(K, f64)> = totals.into_iter().collect();
    entries.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    entries
}
