//! Pipeline Analytics - CRM sales reporting engine
//!
//! Ingests sales-pipeline deal records from a paginated upstream table API
//! into a single normalized snapshot, and answers time-windowed reporting
//! queries over it: totals, conversion rates, leaderboards and breakdowns.
//! The HTTP serving layer and dashboard are external callers of the services
//! in this crate.

pub mod engine;
pub mod error;
pub mod presenters;
pub mod record;
pub mod services;
pub mod source;
pub mod state;
pub mod store;

pub use error::{AppError, ErrorResponse, Result};
pub use record::{DealRecord, DealStage, RawRecord};
pub use state::AppState;
pub use store::{Snapshot, SnapshotStore};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing/logging for embedding binaries
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pipeline_analytics=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
