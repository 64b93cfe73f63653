//! Search backend abstraction.
//!
//! # Responsibilities
//! - Name the two engines a request can be served by
//! - Define the query and result shapes shared by both engines
//! - Classify backend errors as transient (unavailability) or not
//!
//! Both the specialized search engine and the relational fallback
//! implement [`SearchBackend`] and return the same [`SearchResults`].

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The engine that is authoritative for, or actually served, a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Engine {
    /// Performance-optimized full-text search engine.
    Search,
    /// Relational database fallback.
    Database,
}

impl Engine {
    pub fn as_str(&self) -> &'static str {
        match self {
            Engine::Search => "search",
            Engine::Database => "database",
        }
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A normalized search request over one entity kind (works, persons, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchQuery {
    pub entity: String,
    pub text: String,
    pub filters: BTreeMap<String, String>,
    pub page: u32,
    pub per_page: u32,
}

impl SearchQuery {
    pub fn new(entity: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            text: text.into(),
            filters: BTreeMap::new(),
            page: 1,
            per_page: 25,
        }
    }

    pub fn with_filter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(name.into(), value.into());
        self
    }

    pub fn with_page(mut self, page: u32, per_page: u32) -> Self {
        self.page = page.max(1);
        self.per_page = per_page;
        self
    }

    /// Lowercase the text and collapse runs of whitespace.
    pub fn normalized(mut self) -> Self {
        self.text = self
            .text
            .split_whitespace()
            .map(str::to_lowercase)
            .collect::<Vec<_>>()
            .join(" ");
        self
    }

    /// Zero-based offset of the first hit on the requested page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.per_page)
    }
}

/// Results as returned by either engine.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct SearchResults {
    pub total: u64,
    #[serde(default)]
    pub hits: Vec<serde_json::Value>,
}

/// Errors reported by a backend client.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Connection refused, reset or lost.
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// No response within the client deadline.
    #[error("backend timed out after {0:?}")]
    Timeout(Duration),

    /// Backend answered with a non-success status.
    #[error("backend returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// The backend rejected or failed the query itself.
    #[error("query failed: {0}")]
    Query(String),
}

impl BackendError {
    /// True when the error signals the backend itself is unreachable or
    /// overloaded, as opposed to a problem with this particular query.
    pub fn is_transient(&self) -> bool {
        match self {
            BackendError::Unavailable(_) | BackendError::Timeout(_) => true,
            BackendError::Status { status, .. } => matches!(status, 502..=504),
            BackendError::Query(_) => false,
        }
    }
}

/// Client for one search backend.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Display name (e.g., "manticore", "postgres").
    fn name(&self) -> &str;

    /// Lightweight status check; not a user query.
    async fn status_probe(&self) -> Result<(), BackendError>;

    /// Execute a search.
    async fn query(&self, query: &SearchQuery) -> Result<SearchResults, BackendError>;
}
