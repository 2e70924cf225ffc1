//! Upstream record sources
//!
//! The engine only ever sees the `RecordSource` trait: one page of raw
//! records at a time plus an optional continuation cursor. Pagination is
//! sequential and a failed page aborts the whole walk, so a partial result
//! never reaches the snapshot store.

pub mod airtable;

pub use airtable::AirtableSource;

use crate::error::{AppError, Result};
use crate::record::RawRecord;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

/// One page from the upstream API
#[derive(Debug, Clone)]
pub struct RecordPage {
    pub records: Vec<RawRecord>,
    /// Continuation cursor; `None` means the walk is complete.
    pub next_cursor: Option<String>,
}

/// Paginated record-fetch API keyed by a table identifier
#[async_trait]
pub trait RecordSource: Send + Sync {
    async fn fetch_page(&self, table: &str, cursor: Option<&str>) -> Result<RecordPage>;
}

/// Upstream connection settings
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    pub api_key: String,
    pub base_id: String,
    pub table: String,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_page_size() -> u32 {
    100
}

fn default_timeout_secs() -> u64 {
    30
}

impl SourceConfig {
    /// Read settings from `PIPELINE_API_KEY`, `PIPELINE_BASE_ID` and
    /// `PIPELINE_TABLE` (default `sales_pipeline`)
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("PIPELINE_API_KEY")
            .map_err(|_| AppError::Config("PIPELINE_API_KEY is not set".to_string()))?;
        let base_id = std::env::var("PIPELINE_BASE_ID")
            .map_err(|_| AppError::Config("PIPELINE_BASE_ID is not set".to_string()))?;
        let table =
            std::env::var("PIPELINE_TABLE").unwrap_or_else(|_| "sales_pipeline".to_string());

        let config = Self {
            api_key,
            base_id,
            table,
            page_size: default_page_size(),
            timeout_secs: default_timeout_secs(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.api_key.is_empty() {
            return Err(AppError::Config("api_key must not be empty".to_string()));
        }
        if self.base_id.is_empty() {
            return Err(AppError::Config("base_id must not be empty".to_string()));
        }
        if self.page_size == 0 {
            return Err(AppError::Config("page_size must be positive".to_string()));
        }
        Ok(())
    }
}

/// Walk every page of a table, in order, following the continuation cursor
pub async fn fetch_all_records(source: &dyn RecordSource, table: &str) -> Result<Vec<RawRecord>> {
    let mut records = Vec::new();
    let mut cursor: Option<String> = None;
    let mut pages = 0u32;

    loop {
        let page = source.fetch_page(table, cursor.as_deref()).await?;
        pages += 1;
        debug!("page {}: {} records", pages, page.records.len());
        records.extend(page.records);

        match page.next_cursor {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }

    info!("fetched {} records from '{}' in {} pages", records.len(), table, pages);
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_rejects_empty_credentials() {
        let config = SourceConfig {
            api_key: String::new(),
            base_id: "appXYZ".to_string(),
            table: "sales_pipeline".to_string(),
            page_size: 100,
            timeout_secs: 30,
        };
        assert!(config.validate().is_err());

        let config = SourceConfig {
            api_key: "key".to_string(),
            base_id: "appXYZ".to_string(),
            table: "sales_pipeline".to_string(),
            page_size: 0,
            timeout_secs: 30,
        };
        assert!(config.validate().is_err());
    }
}
