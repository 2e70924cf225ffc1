//! Services Layer
//!
//! Query and ingestion logic called by the external serving layer. Every
//! query service resolves the snapshot through the store (and so reports
//! `NotReady` before the first ingest), runs a pure aggregation over it, and
//! returns a serializable result struct.
//!
//! # Architecture
//!
//! ```text
//! Serving layer --> Services --> Engine primitives --> Snapshot
//!                      |
//!                      +--> RecordSource (ingest only)
//! ```
//!
//! # Services
//!
//! - `IngestService` - Fetch all pages, normalize, replace the snapshot
//! - `SalesService` - Totals, deltas, product/category/region breakdowns
//! - `ConversionService` - Conversion rates, won/lost counts, opportunity volume
//! - `AgentService` - Leaderboard, top agent by metric
//! - `SectorService` - Sector analysis over five selectable metrics
//! - `StatusService` - Status rollup (closed / in_progress / lost)

pub mod agent_service;
pub mod conversion_service;
pub mod ingest_service;
pub mod sales_service;
pub mod sector_service;
pub mod status_service;

// Re-export commonly used types and services
pub use agent_service::{AgentMetric, AgentPerformance, AgentService, LeaderboardResult, TopAgentResult};
pub use conversion_service::{ConversionResult, ConversionService, OpportunityVolumeResult, WonLostResult};
pub use ingest_service::{IngestResult, IngestService, SnapshotStatus};
pub use sales_service::{
    Category, CategorySalesResult, DailyTotalsResult, MonthlySalesResult, MonthlyTotalResult,
    PeriodComparisonResult, ProductSalesResult, RegionBreakdownResult, SalesService,
};
pub use sector_service::{SectorAnalysisResult, SectorMetric, SectorService};
pub use status_service::{StatusRollupResult, StatusService};
