//! Response shaping and error mapping.
//!
//! # Responsibilities
//! - Define the common search envelope returned by either engine
//! - Map routing and control errors to HTTP status codes
//!
//! # Design Decisions
//! - Same envelope whichever engine served; only `meta.engine` differs
//! - Both engines down → 503; a failed query → 502; bad input → 400

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

use crate::health::ControlError;
use crate::routing::{Engine, RoutedResults, RouteError, SearchQuery};

pub const X_SEARCH_ENGINE: &str = "x-search-engine";

/// Paging and provenance metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvelopeMeta {
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
    pub engine: Engine,
    pub fallback: bool,
    #[serde(default)]
    pub cached: bool,
}

/// Response body for search endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchEnvelope {
    pub data: Vec<serde_json::Value>,
    pub meta: EnvelopeMeta,
}

impl SearchEnvelope {
    pub fn from_routed(query: &SearchQuery, routed: RoutedResults) -> Self {
        Self {
            meta: EnvelopeMeta {
                total: routed.results.total,
                page: query.page,
                per_page: query.per_page,
                engine: routed.engine,
                fallback: routed.fallback,
                cached: false,
            },
            data: routed.results.hits,
        }
    }
}

/// Response body for statistics endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsEnvelope {
    pub entity: String,
    pub total: u64,
    pub engine: Engine,
    pub fallback: bool,
    #[serde(default)]
    pub cached: bool,
}

/// Errors returned by HTTP handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("missing or invalid admin credentials")]
    Unauthorized,

    #[error(transparent)]
    Route(#[from] RouteError),

    #[error(transparent)]
    Control(#[from] ControlError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Route(e) if e.is_unavailable() => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Route(_) => StatusCode::BAD_GATEWAY,
            ApiError::Control(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = %status, error = %self, "Request failed");
        }
        (status, Json(json!({ "success": false, "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::{BackendError, SearchResults};
    use std::time::Duration;

    #[test]
    fn test_error_status_mapping() {
        let unavailable = ApiError::Route(RouteError::AllBackendsUnavailable {
            primary: BackendError::Unavailable("reset".into()),
            fallback: BackendError::Timeout(Duration::from_secs(5)),
        });
        assert_eq!(unavailable.status(), StatusCode::SERVICE_UNAVAILABLE);

        let bad_query = ApiError::Route(RouteError::Backend {
            engine: Engine::Search,
            source: BackendError::Query("syntax".into()),
        });
        assert_eq!(bad_query.status(), StatusCode::BAD_GATEWAY);

        let refused = ApiError::Control(ControlError::RecoveryProbeFailed("timeout".into()));
        assert_eq!(refused.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_envelope_from_routed() {
        let query = SearchQuery::new("works", "x").with_page(2, 10);
        let envelope = SearchEnvelope::from_routed(
            &query,
            RoutedResults {
                results: SearchResults { total: 42, hits: vec![json!({"id": 1})] },
                engine: Engine::Database,
                fallback: true,
            },
        );
        assert_eq!(envelope.meta.total, 42);
        assert_eq!(envelope.meta.page, 2);
        assert!(envelope.meta.fallback);
        assert_eq!(envelope.data.len(), 1);
    }
}
