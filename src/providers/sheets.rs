use crate::config::GatewayConfig;
use crate::core::cache::Cache;
use crate::core::records::{RawRows, RecordProvider};
use crate::providers::util::with_retry;
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Row-set source backed by a Google-Sheets-style values API. One tab maps
/// to one ledger partition; fetched tabs are cached for the process
/// lifetime.
pub struct SheetsGateway {
    base_url: String,
    sheet_id: String,
    api_key: Option<String>,
    cache: Arc<Cache<String, RawRows>>,
}

impl SheetsGateway {
    pub fn new(config: &GatewayConfig, cache: Arc<Cache<String, RawRows>>) -> Self {
        SheetsGateway {
            base_url: config.base_url.clone(),
            sheet_id: config.sheet_id.clone(),
            api_key: config.api_key.clone(),
            cache,
        }
    }

    fn query_params(&self, range: Option<String>) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(range) = range {
            params.push(("ranges", range));
        }
        if let Some(key) = &self.api_key {
            params.push(("key", key.clone()));
        }
        params
    }

    async fn get_text(&self, url: &str, params: &[(&'static str, String)]) -> Result<String> {
        let client = reqwest::Client::builder().user_agent("mandi/0.2").build()?;
        let response = with_retry(|| async { client.get(url).query(params).send().await }, 3, 500)
            .await
            .with_context(|| format!("Failed to send request to {url}"))?;

        response
            .text()
            .await
            .with_context(|| format!("Failed to read response body from {url}"))
    }
}

#[derive(Debug, Deserialize)]
struct BatchValuesResponse {
    #[serde(rename = "valueRanges", default)]
    value_ranges: Vec<ValueRange>,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    // blank tabs come back with no values key at all
    #[serde(default)]
    values: Vec<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct SheetListResponse {
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SheetProperties {
    title: String,
}

#[async_trait]
impl RecordProvider for SheetsGateway {
    #[instrument(name = "SheetFetch", skip(self), fields(tab = %tab))]
    async fn fetch_rows(&self, tab: &str) -> Result<RawRows> {
        if let Some(cached) = self.cache.get(&tab.to_string()).await {
            return Ok(cached);
        }

        let url = format!(
            "{}/v4/spreadsheets/{}/values:batchGet",
            self.base_url, self.sheet_id
        );
        let params = self.query_params(Some(format!("'{tab}'!A:Z")));
        debug!("Requesting rows from {}", url);

        let response_text = self.get_text(&url, &params).await?;
        if response_text.trim().is_empty() {
            return Err(anyhow!("Received empty response for tab: {}", tab));
        }

        // A response whose values are not a sequence of sequences of cells
        // is structurally malformed and fails here, before any calculator
        // sees it.
        let batch: BatchValuesResponse = serde_json::from_str(&response_text).with_context(|| {
            format!("Malformed row-set for tab: {tab}. Response: '{response_text}'")
        })?;

        let rows = batch
            .value_ranges
            .into_iter()
            .next()
            .map(|range| range.values)
            .unwrap_or_default();
        debug!("Fetched {} rows from tab {}", rows.len(), tab);

        self.cache.put(tab.to_string(), rows.clone()).await;
        Ok(rows)
    }

    #[instrument(name = "SheetTabList", skip(self))]
    async fn list_tabs(&self) -> Result<Vec<String>> {
        let url = format!("{}/v4/spreadsheets/{}", self.base_url, self.sheet_id);
        let mut params = self.query_params(None);
        params.push(("fields", "sheets.properties.title".to_string()));

        let response_text = self.get_text(&url, &params).await?;
        let listing: SheetListResponse = serde_json::from_str(&response_text)
            .with_context(|| format!("Malformed tab listing. Response: '{response_text}'"))?;

        Ok(listing
            .sheets
            .into_iter()
            .map(|sheet| sheet.properties.title)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn gateway(base_url: &str) -> SheetsGateway {
        let config = GatewayConfig {
            base_url: base_url.to_string(),
            sheet_id: "sheet1".to_string(),
            api_key: None,
        };
        SheetsGateway::new(&config, Arc::new(Cache::new()))
    }

    async fn mount_values(server: &MockServer, tab: &str, body: &str, expected_calls: u64) {
        Mock::given(method("GET"))
            .and(path("/v4/spreadsheets/sheet1/values:batchGet"))
            .and(query_param("ranges", format!("'{tab}'!A:Z")))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .expect(expected_calls)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_fetch_rows() {
        let server = MockServer::start().await;
        let body = r#"{"valueRanges": [{"values": [["Date", "Quantity"], ["6/14/25", "1200"]]}]}"#;
        mount_values(&server, "Alok Traders", body, 1).await;

        let rows = gateway(&server.uri())
            .fetch_rows("Alok Traders")
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1], vec!["6/14/25".to_string(), "1200".to_string()]);
    }

    #[tokio::test]
    async fn test_blank_tab_is_an_empty_row_set() {
        let server = MockServer::start().await;
        mount_values(&server, "Empty", r#"{"valueRanges": [{}]}"#, 1).await;

        let rows = gateway(&server.uri()).fetch_rows("Empty").await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_row_set_is_fatal() {
        let server = MockServer::start().await;
        // values is not a sequence of sequences
        mount_values(&server, "Broken", r#"{"valueRanges": [{"values": [42]}]}"#, 1).await;

        let result = gateway(&server.uri()).fetch_rows("Broken").await;
        assert!(result.is_err());
        let message = result.unwrap_err().to_string();
        assert!(message.contains("Malformed row-set for tab: Broken"));
    }

    #[tokio::test]
    async fn test_second_fetch_is_served_from_cache() {
        let server = MockServer::start().await;
        let body = r#"{"valueRanges": [{"values": [["only row"]]}]}"#;
        mount_values(&server, "Cached", body, 1).await;

        let gateway = gateway(&server.uri());
        let first = gateway.fetch_rows("Cached").await.unwrap();
        let second = gateway.fetch_rows("Cached").await.unwrap();
        assert_eq!(first, second);
        // the mock's expect(1) verifies only one request went out
    }

    #[tokio::test]
    async fn test_api_key_is_sent_when_configured() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v4/spreadsheets/sheet1/values:batchGet"))
            .and(query_param("key", "k-123"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"valueRanges": [{"values": []}]}"#),
            )
            .expect(1)
            .mount(&server)
            .await;

        let config = GatewayConfig {
            base_url: server.uri(),
            sheet_id: "sheet1".to_string(),
            api_key: Some("k-123".to_string()),
        };
        let gateway = SheetsGateway::new(&config, Arc::new(Cache::new()));
        gateway.fetch_rows("Keyed").await.unwrap();
    }

    #[tokio::test]
    async fn test_list_tabs() {
        let server = MockServer::start().await;
        let body = r#"{"sheets": [
            {"properties": {"title": "Contact details"}},
            {"properties": {"title": "Alok Traders"}}
        ]}"#;
        Mock::given(method("GET"))
            .and(path("/v4/spreadsheets/sheet1"))
            .and(query_param("fields", "sheets.properties.title"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&server)
            .await;

        let tabs = gateway(&server.uri()).list_tabs().await.unwrap();
        assert_eq!(tabs, vec!["Contact details", "Alok Traders"]);
    }
}
