// GraphQL HTTP client
//
// One POST per operation with body `{"query": ...}`. Transport failures are
// mapped onto FetchError; body decoding lives in `response`.

use crate::response::{
    parse_hello, parse_restock, parse_stats, HELLO_QUERY, RESTOCK_MUTATION, STATS_QUERY,
};
use async_trait::async_trait;
use crm_jobs_core::port::{
    CrmStats, FetchError, HealthProbe, RestockOutcome, RestockPolicy, StatsFetcher,
    StockRestocker,
};
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};

pub struct GraphqlClient {
    http: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

impl GraphqlClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Transport(format!("Failed to create client: {}", e)))?;

        Ok(Self {
            http,
            endpoint: endpoint.into(),
            timeout,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// POST a query and return the raw response body
    async fn post(&self, query: &str) -> Result<String, FetchError> {
        debug!(endpoint = %self.endpoint, query = query, "Sending GraphQL request");

        let response = self
            .http
            .post(&self.endpoint)
            .json(&json!({ "query": query }))
            .send()
            .await
            .map_err(|e| self.map_reqwest_error(e))?;

        let status = response.status();
        if !status.is_success() {
            warn!(endpoint = %self.endpoint, status = %status, "GraphQL endpoint returned error status");
            return Err(FetchError::Transport(format!("HTTP status {}", status)));
        }

        response.text().await.map_err(|e| self.map_reqwest_error(e))
    }

    fn map_reqwest_error(&self, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout(self.timeout.as_millis() as u64)
        } else if err.is_decode() {
            FetchError::Malformed(err.to_string())
        } else {
            FetchError::Transport(err.to_string())
        }
    }
}

#[async_trait]
impl StatsFetcher for GraphqlClient {
    async fn get_stats(&self) -> Result<CrmStats, FetchError> {
        let body = self.post(STATS_QUERY).await?;
        parse_stats(&body)
    }
}

#[async_trait]
impl HealthProbe for GraphqlClient {
    async fn ping(&self) -> Result<String, FetchError> {
        let body = self.post(HELLO_QUERY).await?;
        parse_hello(&body)
    }
}

#[async_trait]
impl StockRestocker for GraphqlClient {
    /// The server owns the threshold and increment; the policy is only logged
    async fn restock_low_stock(&self, policy: RestockPolicy) -> Result<RestockOutcome, FetchError> {
        debug!(
            threshold = policy.threshold,
            increment = policy.increment,
            "Requesting low-stock restock"
        );
        let body = self.post(RESTOCK_MUTATION).await?;
        parse_restock(&body)
    }
}
