//! HTTP JSON backend client.
//!
//! # Responsibilities
//! - Status probes: `GET <base><status_path>`, any 2xx is healthy
//! - Queries: `POST <base><search_path>/<entity>` with
//!   `{query, filters, offset, limit}`, answered by `{total, hits}`
//! - Map transport failures onto [`BackendError`]
//!
//! # Design Decisions
//! - Same contract for the search engine and the relational query service
//! - Every call carries the configured client timeout

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use url::Url;

use crate::config::BackendConfig;
use crate::routing::backend::{BackendError, SearchBackend, SearchQuery, SearchResults};

#[derive(Serialize)]
struct QueryRequest<'a> {
    query: &'a str,
    filters: &'a BTreeMap<String, String>,
    offset: u64,
    limit: u32,
}

/// A search backend reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    name: String,
    client: reqwest::Client,
    base_url: String,
    status_path: String,
    search_path: String,
    timeout: Duration,
}

impl HttpBackend {
    pub fn from_config(config: &BackendConfig) -> Result<Self, BackendError> {
        Url::parse(&config.base_url).map_err(|e| {
            BackendError::Unavailable(format!("invalid base URL '{}': {}", config.base_url, e))
        })?;

        let timeout = Duration::from_millis(config.request_timeout_ms);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("search-gateway/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| BackendError::Unavailable(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            name: config.name.clone(),
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            status_path: config.status_path.clone(),
            search_path: config.search_path.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn map_error(&self, e: reqwest::Error) -> BackendError {
        if e.is_timeout() {
            BackendError::Timeout(self.timeout)
        } else if e.is_decode() {
            BackendError::Query(format!("invalid response body: {}", e))
        } else {
            // Connect, request and body errors all mean the backend is unreachable.
            BackendError::Unavailable(e.to_string())
        }
    }

    async fn check_status(&self, response: reqwest::Response) -> Result<reqwest::Response, BackendError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(BackendError::Status {
            status: status.as_u16(),
            body: body.chars().take(512).collect(),
        })
    }
}

#[async_trait]
impl SearchBackend for HttpBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn status_probe(&self) -> Result<(), BackendError> {
        let response = self
            .client
            .get(self.url(&self.status_path))
            .send()
            .await
            .map_err(|e| self.map_error(e))?;
        self.check_status(response).await?;
        Ok(())
    }

    async fn query(&self, query: &SearchQuery) -> Result<SearchResults, BackendError> {
        let url = self.url(&format!("{}/{}", self.search_path, query.entity));
        let body = QueryRequest {
            query: &query.text,
            filters: &query.filters,
            offset: query.offset(),
            limit: query.per_page,
        };

        let response = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_error(e))?;

        self.check_status(response)
            .await?
            .json::<SearchResults>()
            .await
            .map_err(|e| self.map_error(e))
    }
}
