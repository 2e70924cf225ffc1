//! Agent Service
//!
//! Per-agent performance: won/lost counters, success rate and total sales,
//! plus the top-agent query over any of those metrics. An agent only appears
//! with at least one deal in the window, so the success-rate denominator is
//! never zero.

use crate::engine::{group_count, group_sum, ratio_pct, top_entry, DatePredicate};
use crate::error::{AppError, Result};
use crate::presenters::{present_rate, round2};
use crate::record::{DealRecord, DealStage};
use crate::state::AppState;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use tracing::info;

/// One agent's line on the leaderboard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentPerformance {
    pub agent: String,
    pub won_deals: u64,
    pub lost_deals: u64,
    pub total_deals: u64,
    /// `won / total * 100`, rounded.
    pub success_rate: Option<f64>,
    pub total_sales: f64,
}

/// Result of the leaderboard query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardResult {
    pub success: bool,
    pub month: u32,
    pub agents: Vec<AgentPerformance>,
}

/// Metric selectable for the top-agent query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentMetric {
    Sales,
    WonDeals,
    SuccessRate,
}

impl FromStr for AgentMetric {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "sales" => Ok(AgentMetric::Sales),
            "won_deals" => Ok(AgentMetric::WonDeals),
            "success_rate" => Ok(AgentMetric::SuccessRate),
            other => Err(AppError::Validation(format!(
                "unknown agent metric '{}', expected sales, won_deals or success_rate",
                other
            ))),
        }
    }
}

/// The winning agent for a metric
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopAgent {
    pub agent: String,
    pub value: f64,
}

/// Result of the top-agent query; `top_agent` is absent for an empty window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopAgentResult {
    pub success: bool,
    pub month: u32,
    pub metric: AgentMetric,
    pub top_agent: Option<TopAgent>,
}

/// Agent service for performance queries
pub struct AgentService;

impl AgentService {
    /// Per-agent performance, sorted by total sales descending
    pub fn leaderboard(state: &AppState, month: u32) -> Result<LeaderboardResult> {
        info!("AgentService::leaderboard - month={}", month);

        let predicate = DatePredicate::month(month)?;
        let snapshot = state.store.get()?;

        let mut agents = Self::performances(&snapshot, &predicate);
        agents.sort_by(|a, b| {
            b.total_sales
                .partial_cmp(&a.total_sales)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        Ok(LeaderboardResult {
            success: true,
            month,
            agents,
        })
    }

    /// Arg-max over the per-agent metric map
    ///
    /// An empty month yields an absent `top_agent`, not an error; ties go to
    /// the alphabetically first agent.
    pub fn top_agent(state: &AppState, month: u32, metric: &str) -> Result<TopAgentResult> {
        info!("AgentService::top_agent - month={} metric={}", month, metric);

        let metric = AgentMetric::from_str(metric)?;
        let predicate = DatePredicate::month(month)?;
        let snapshot = state.store.get()?;

        let values: BTreeMap<String, f64> = Self::performances(&snapshot, &predicate)
            .into_iter()
            .map(|p| {
                let value = match metric {
                    AgentMetric::Sales => p.total_sales,
                    AgentMetric::WonDeals => p.won_deals as f64,
                    AgentMetric::SuccessRate => p.success_rate.unwrap_or(0.0),
                };
                (p.agent, value)
            })
            .collect();

        let top_agent = top_entry(&values).map(|(agent, value)| TopAgent {
            agent: agent.clone(),
            value: *value,
        });

        Ok(TopAgentResult {
            success: true,
            month,
            metric,
            top_agent,
        })
    }

    // ========================================================================
    // Private Helper Methods
    // ========================================================================

    fn performances(records: &[DealRecord], predicate: &DatePredicate) -> Vec<AgentPerformance> {
        let scoped = || {
            records
                .iter()
                .filter(|r| predicate.matches(r.close_date) && r.agent.is_some())
        };

        let totals = group_count(scoped(), |r| r.agent.clone());
        let won = group_count(scoped(), |r| match r.deal_stage {
            DealStage::Won => r.agent.clone(),
            _ => None,
        });
        let lost = group_count(scoped(), |r| match r.deal_stage {
            DealStage::Lost => r.agent.clone(),
            _ => None,
        });
        let sales = group_sum(scoped(), |r| r.agent.clone(), |r| r.close_value);

        totals
            .into_iter()
            .map(|(agent, total_deals)| {
                let won_deals = won.get(&agent).copied().unwrap_or(0);
                let lost_deals = lost.get(&agent).copied().unwrap_or(0);
                let total_sales = sales.get(&agent).copied().unwrap_or(0.0);
                AgentPerformance {
                    success_rate: present_rate(ratio_pct(won_deals, total_deals)),
                    agent,
                    won_deals,
                    lost_deals,
                    total_deals,
                    total_sales: round2(total_sales),
                }
            })
            .collect()
    }
}
