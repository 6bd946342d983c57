//! Brave-style web search client
//!
//! No client-side rate limiting: the web-search fan-out trades quota safety
//! for latency, and each query carries its own timeout.

use super::{WebSearchClient, WebSearchResponse, USER_AGENT};
use crate::config::RecConfig;
use crate::error::{ClientError, ClientResult};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

const SERVICE: &str = "web-search";

/// Results requested per query
const RESULTS_PER_QUERY: u32 = 5;

pub struct BraveSearchClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    timeout: Duration,
}

impl BraveSearchClient {
    pub fn new(config: &RecConfig) -> ClientResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ClientError::upstream(SERVICE, format!("client build failed: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.endpoints.brave_base_url.trim_end_matches('/').to_string(),
            api_key: config.brave_api_key.clone(),
            timeout: config.pipeline.web_search_timeout(),
        })
    }
}

#[async_trait]
impl WebSearchClient for BraveSearchClient {
    async fn search(&self, query: &str) -> ClientResult<WebSearchResponse> {
        let url = format!("{}/res/v1/web/search", self.base_url);
        let count = RESULTS_PER_QUERY.to_string();
        debug!(query = %query, "Querying web search API");

        let response = self
            .client
            .get(&url)
            .query(&[("q", query), ("count", count.as_str())])
            .header("Accept", "application/json")
            .header("X-Subscription-Token", &self.api_key)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| ClientError::from_reqwest(SERVICE, self.timeout, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::from_status(SERVICE, status, &body));
        }

        response
            .json::<WebSearchResponse>()
            .await
            .map_err(|e| ClientError::from_reqwest(SERVICE, self.timeout, e))
    }
}
