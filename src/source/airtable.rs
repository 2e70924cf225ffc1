//! Airtable source adapter

use crate::error::{AppError, Result};
use crate::record::RawRecord;
use crate::source::{RecordPage, RecordSource, SourceConfig};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

const BASE_URL: &str = "https://api.airtable.com/v0";

/// Airtable paginated record source
pub struct AirtableSource {
    client: Client,
    config: SourceConfig,
}

impl AirtableSource {
    pub fn new(config: SourceConfig) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(config.timeout_secs))
                .build()
                .expect("Failed to create HTTP client"),
            config,
        }
    }
}

#[derive(Debug, Deserialize)]
struct PageResponse {
    #[serde(default)]
    records: Vec<RawRecord>,
    offset: Option<String>,
}

#[async_trait]
impl RecordSource for AirtableSource {
    async fn fetch_page(&self, table: &str, cursor: Option<&str>) -> Result<RecordPage> {
        let url = format!("{}/{}/{}", BASE_URL, self.config.base_id, table);

        let mut query: Vec<(&str, String)> =
            vec![("pageSize", self.config.page_size.to_string())];
        if let Some(offset) = cursor {
            query.push(("offset", offset.to_string()));
        }

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.config.api_key)
            .query(&query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Source(format!("HTTP {}: {}", status, body)));
        }

        let page: PageResponse = response.json().await?;

        Ok(RecordPage {
            records: page.records,
            next_cursor: page.offset,
        })
    }
}
