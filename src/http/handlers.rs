//! Public request handlers.
//!
//! Query composition is thin on purpose: parameters become a
//! [`SearchQuery`], the cache is consulted, and [`SearchRouter`] decides
//! which engine answers.
//!
//! [`SearchRouter`]: crate::routing::SearchRouter

use std::collections::BTreeMap;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::cache::{cache_key, TtlClass};
use crate::health::HealthStatus;
use crate::http::request::request_id;
use crate::http::response::{ApiError, SearchEnvelope, StatsEnvelope, X_SEARCH_ENGINE};
use crate::http::server::AppState;
use crate::routing::{Engine, SearchQuery};

const DEFAULT_PER_PAGE: u32 = 25;
const MAX_PER_PAGE: u32 = 100;

/// `GET /search/{entity}`
pub async fn search(
    State(state): State<AppState>,
    Path(entity): Path<String>,
    Query(params): Query<BTreeMap<String, String>>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let query = parse_query(&entity, params)?;
    let key = cache_key(TtlClass::Search, &query);

    if let Some(mut envelope) = state.cached::<SearchEnvelope>(&key) {
        envelope.meta.cached = true;
        return Ok(with_engine_header(envelope.meta.engine, Json(envelope)));
    }

    tracing::debug!(
        request_id = %request_id(&headers),
        entity = %query.entity,
        page = query.page,
        "Routing search"
    );

    let routed = state.router.route(&query).await?;
    let envelope = SearchEnvelope::from_routed(&query, routed);
    state.store(key, TtlClass::Search, &envelope);

    Ok(with_engine_header(envelope.meta.engine, Json(envelope)))
}

/// `GET /stats/{entity}`: total count, cached with the long TTL class.
pub async fn stats(
    State(state): State<AppState>,
    Path(entity): Path<String>,
    Query(mut params): Query<BTreeMap<String, String>>,
) -> Result<Response, ApiError> {
    params.remove("page");
    params.insert("per_page".to_string(), "0".to_string());
    let query = parse_query(&entity, params)?;
    let key = cache_key(TtlClass::Statistics, &query);

    if let Some(mut envelope) = state.cached::<StatsEnvelope>(&key) {
        envelope.cached = true;
        return Ok(with_engine_header(envelope.engine, Json(envelope)));
    }

    let routed = state.router.route(&query).await?;
    let envelope = StatsEnvelope {
        entity: query.entity.clone(),
        total: routed.results.total,
        engine: routed.engine,
        fallback: routed.fallback,
        cached: false,
    };
    state.store(key, TtlClass::Statistics, &envelope);

    Ok(with_engine_header(envelope.engine, Json(envelope)))
}

/// `GET /health/search`
pub async fn health_status(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(state.controller.get_health_status())
}

/// `GET /healthz`
pub async fn liveness() -> &'static str {
    "ok"
}

fn with_engine_header(engine: Engine, body: impl IntoResponse) -> Response {
    let mut response = body.into_response();
    response
        .headers_mut()
        .insert(X_SEARCH_ENGINE, HeaderValue::from_static(engine.as_str()));
    response
}

fn is_valid_entity(entity: &str) -> bool {
    !entity.is_empty()
        && entity.len() <= 64
        && entity
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Build a query from path and query-string parameters. Everything other
/// than `q`, `page` and `per_page` is a filter.
fn parse_query(entity: &str, mut params: BTreeMap<String, String>) -> Result<SearchQuery, ApiError> {
    if !is_valid_entity(entity) {
        return Err(ApiError::BadRequest(format!("invalid entity '{}'", entity)));
    }

    let text = params.remove("q").unwrap_or_default();
    let page = parse_number(params.remove("page"), "page", 1)?;
    let per_page = parse_number(params.remove("per_page"), "per_page", DEFAULT_PER_PAGE)?;
    if per_page > MAX_PER_PAGE {
        return Err(ApiError::BadRequest(format!(
            "per_page must be at most {}",
            MAX_PER_PAGE
        )));
    }

    let mut query = SearchQuery::new(entity.to_lowercase(), text)
        .with_page(page, per_page)
        .normalized();
    query.filters = params;
    Ok(query)
}

fn parse_number(value: Option<String>, name: &str, default: u32) -> Result<u32, ApiError> {
    match value {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ApiError::BadRequest(format!("{} must be a non-negative integer", name))),
    }
}
