//! Per-request routing between the search engine and the database.

mod common;

use std::sync::Arc;

use common::{controller, MockBackend, QueryMode, RecordingAlertSink};
use search_gateway::health::RollbackFlag;
use search_gateway::routing::{BackendError, Engine, RouteError, SearchQuery, SearchRouter};

fn query() -> SearchQuery {
    SearchQuery::new("works", "graphene oxide").with_filter("year", "2020")
}

#[tokio::test]
async fn test_healthy_routes_to_search_engine() {
    let search = MockBackend::new("manticore");
    let database = MockBackend::new("postgres");
    let router = SearchRouter::new(
        search.clone(),
        database.clone(),
        Arc::new(RollbackFlag::default()),
    );

    let routed = router.route(&query()).await.unwrap();
    assert_eq!(routed.engine, Engine::Search);
    assert!(!routed.fallback);
    assert_eq!(routed.results.hits[0]["source"], "manticore");
    assert_eq!(search.query_count(), 1);
    assert_eq!(database.query_count(), 0);
}

#[tokio::test]
async fn test_transient_error_falls_back_for_one_request() {
    let search = MockBackend::new("manticore");
    let database = MockBackend::new("postgres");
    let ctl = controller(Arc::clone(&search), RecordingAlertSink::new());
    let router = SearchRouter::new(
        search.clone(),
        database.clone(),
        ctl.rollback_flag(),
    );

    search.set_query_mode(QueryMode::ConnectionLost);
    let routed = router.route(&query()).await.unwrap();
    assert_eq!(routed.engine, Engine::Database);
    assert!(routed.fallback);
    assert_eq!(routed.results.hits[0]["source"], "postgres");

    // Global state is untouched by request-time errors.
    assert!(!ctl.get_health_status().rollback_active);
    assert!(!ctl.is_rolled_back());

    search.set_query_mode(QueryMode::Ok);
    let routed = router.route(&query()).await.unwrap();
    assert_eq!(routed.engine, Engine::Search);
    assert!(!routed.fallback);
    assert_eq!(search.query_count(), 2);
    assert_eq!(database.query_count(), 1);
}

#[tokio::test]
async fn test_rollback_routes_to_database() {
    let search = MockBackend::new("manticore");
    let database = MockBackend::new("postgres");
    let ctl = controller(Arc::clone(&search), RecordingAlertSink::new());
    let router = SearchRouter::new(
        search.clone(),
        database.clone(),
        ctl.rollback_flag(),
    );

    ctl.manual_rollback("maintenance").await.unwrap();
    assert_eq!(router.authoritative_engine(), Engine::Database);

    let routed = router.route(&query()).await.unwrap();
    assert_eq!(routed.engine, Engine::Database);
    assert!(routed.fallback);
    assert_eq!(search.query_count(), 0);

    ctl.manual_recovery().await.unwrap();
    assert_eq!(router.authoritative_engine(), Engine::Search);
    let routed = router.route(&query()).await.unwrap();
    assert_eq!(routed.engine, Engine::Search);
}

#[tokio::test]
async fn test_pinned_engine_ignores_health() {
    let search = MockBackend::new("manticore");
    let database = MockBackend::new("postgres");
    let router = SearchRouter::new(
        search.clone(),
        database.clone(),
        Arc::new(RollbackFlag::default()),
    )
    .pinned_to(Some(Engine::Database));

    let routed = router.route(&query()).await.unwrap();
    assert_eq!(routed.engine, Engine::Database);
    assert!(!routed.fallback);
    assert_eq!(search.query_count(), 0);
}

#[tokio::test]
async fn test_rollback_overrides_search_pin() {
    let search = MockBackend::new("manticore");
    let database = MockBackend::new("postgres");
    let ctl = controller(Arc::clone(&search), RecordingAlertSink::new());
    let router = SearchRouter::new(search.clone(), database.clone(), ctl.rollback_flag())
        .pinned_to(Some(Engine::Search));

    assert_eq!(router.authoritative_engine(), Engine::Search);

    ctl.manual_rollback("maintenance").await.unwrap();
    assert_eq!(router.authoritative_engine(), Engine::Database);

    let routed = router.route(&query()).await.unwrap();
    assert_eq!(routed.engine, Engine::Database);
    assert!(routed.fallback);
    assert_eq!(search.query_count(), 0);
    assert_eq!(database.query_count(), 1);
}

#[tokio::test]
async fn test_both_backends_down() {
    let search = MockBackend::new("manticore");
    let database = MockBackend::new("postgres");
    let router = SearchRouter::new(
        search.clone(),
        database.clone(),
        Arc::new(RollbackFlag::default()),
    );

    search.set_query_mode(QueryMode::ConnectionLost);
    database.set_query_mode(QueryMode::ConnectionLost);

    let err = router.route(&query()).await.unwrap_err();
    assert!(err.is_unavailable());
    assert!(matches!(err, RouteError::AllBackendsUnavailable { .. }));
}

#[tokio::test]
async fn test_bad_query_is_not_masked() {
    let search = MockBackend::new("manticore");
    let database = MockBackend::new("postgres");
    let router = SearchRouter::new(
        search.clone(),
        database.clone(),
        Arc::new(RollbackFlag::default()),
    );

    search.set_query_mode(QueryMode::BadQuery);

    let err = router.route(&query()).await.unwrap_err();
    assert!(!err.is_unavailable());
    assert!(matches!(
        err,
        RouteError::Backend {
            engine: Engine::Search,
            source: BackendError::Query(_),
        }
    ));
    assert_eq!(database.query_count(), 0);
}
