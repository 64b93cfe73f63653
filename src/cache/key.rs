//! Cache key derivation.
//!
//! A key encodes exactly the query the backend receives. Entity, text and
//! filters are JSON-encoded so separator characters inside values cannot
//! make two different queries share a key. Equivalent spellings are folded
//! earlier, when the request is parsed, never here.

use std::time::Duration;

use serde_json::json;

use crate::config::CacheConfig;
use crate::routing::backend::SearchQuery;

/// Result volatility class, mapped to a configured TTL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TtlClass {
    /// Search result pages: short-lived.
    Search,
    /// Aggregate counts: long-lived.
    Statistics,
}

impl TtlClass {
    pub fn ttl(&self, config: &CacheConfig) -> Duration {
        match self {
            TtlClass::Search => Duration::from_secs(config.search_ttl_secs),
            TtlClass::Statistics => Duration::from_secs(config.statistics_ttl_secs),
        }
    }

    fn prefix(&self) -> &'static str {
        match self {
            TtlClass::Search => "search",
            TtlClass::Statistics => "stats",
        }
    }
}

/// Stable cache key for a query. Filters are a `BTreeMap`, so their order
/// in the key is already sorted by name.
pub fn cache_key(class: TtlClass, query: &SearchQuery) -> String {
    format!(
        "{}:{}:p{}:n{}",
        class.prefix(),
        json!([query.entity, query.text, query.filters]),
        query.page,
        query.per_page,
    )
}
