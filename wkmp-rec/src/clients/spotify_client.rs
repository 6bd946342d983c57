//! Spotify-style catalog search client
//!
//! Uses the caller's bearer token per request. A direct `governor` limiter
//! keeps concurrent batches under the catalog's request quota.

use super::{CatalogClient, CatalogSearchResponse, USER_AGENT};
use crate::config::RecConfig;
use crate::error::{ClientError, ClientResult};
use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use std::num::NonZeroU32;
use std::time::Duration;
use tracing::debug;

const SERVICE: &str = "catalog";

pub struct SpotifyCatalogClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
    rate_limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
}

impl SpotifyCatalogClient {
    pub fn new(config: &RecConfig) -> ClientResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ClientError::upstream(SERVICE, format!("client build failed: {}", e)))?;

        let per_second = NonZeroU32::new(config.pipeline.catalog_requests_per_second)
            .ok_or_else(|| ClientError::upstream(SERVICE, "catalog_requests_per_second must be > 0"))?;

        Ok(Self {
            client,
            base_url: config.endpoints.spotify_base_url.trim_end_matches('/').to_string(),
            timeout: config.pipeline.catalog_timeout(),
            rate_limiter: RateLimiter::direct(Quota::per_second(per_second)),
        })
    }
}

#[async_trait]
impl CatalogClient for SpotifyCatalogClient {
    async fn search_tracks(
        &self,
        query: &str,
        access_token: &str,
        limit: usize,
    ) -> ClientResult<CatalogSearchResponse> {
        self.rate_limiter.until_ready().await;

        let url = format!("{}/v1/search", self.base_url);
        let limit = limit.to_string();
        debug!(query = %query, limit = %limit, "Querying catalog search API");

        let response = self
            .client
            .get(&url)
            .query(&[("q", query), ("type", "track"), ("limit", limit.as_str())])
            .bearer_auth(access_token)
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
            .json::<CatalogSearchResponse>()
            .await
            .map_err(|e| ClientError::from_reqwest(SERVICE, self.timeout, e))
    }
}
