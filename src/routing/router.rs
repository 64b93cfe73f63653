//! Per-request search routing.
//!
//! # Responsibilities
//! - Read the rollback flag once per request
//! - Dispatch to the authoritative engine
//! - Fall back to the database for a single request when the search
//!   engine reports a transient error
//! - Annotate results with the engine that served them
//!
//! # Design Decisions
//! - Never waits on the failover controller; the flag is an atomic read
//! - Never changes global state: a flaky request does not trigger rollback
//! - Both engines failing is surfaced to the caller, not masked

use std::sync::Arc;

use thiserror::Error;

use crate::health::state::RollbackFlag;
use crate::observability::metrics;
use crate::routing::backend::{BackendError, Engine, SearchBackend, SearchQuery, SearchResults};

/// Results annotated with where they came from.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutedResults {
    pub results: SearchResults,
    /// Engine that actually produced the results.
    pub engine: Engine,
    /// True when the search engine should have served but could not.
    pub fallback: bool,
}

/// Errors surfaced to the request handler.
#[derive(Debug, Error)]
pub enum RouteError {
    /// The dispatched backend failed and no fallback applies.
    #[error("{engine} backend failed: {source}")]
    Backend {
        engine: Engine,
        #[source]
        source: BackendError,
    },

    /// Search engine unavailable and the one-shot fallback failed too.
    #[error("search engine unavailable ({primary}); database fallback failed ({fallback})")]
    AllBackendsUnavailable {
        primary: BackendError,
        fallback: BackendError,
    },
}

impl RouteError {
    /// True when the failure is backend unavailability rather than a bad query.
    pub fn is_unavailable(&self) -> bool {
        match self {
            RouteError::Backend { source, .. } => source.is_transient(),
            RouteError::AllBackendsUnavailable { .. } => true,
        }
    }
}

/// Routes queries between the search engine and the database fallback.
pub struct SearchRouter {
    search: Arc<dyn SearchBackend>,
    database: Arc<dyn SearchBackend>,
    rollback: Arc<RollbackFlag>,
    pinned: Option<Engine>,
}

impl SearchRouter {
    pub fn new(
        search: Arc<dyn SearchBackend>,
        database: Arc<dyn SearchBackend>,
        rollback: Arc<RollbackFlag>,
    ) -> Self {
        Self {
            search,
            database,
            rollback,
            pinned: None,
        }
    }

    /// Route every request to `engine` regardless of health state.
    pub fn pinned_to(mut self, engine: Option<Engine>) -> Self {
        self.pinned = engine;
        self
    }

    /// Engine a new request would be dispatched to. An active rollback
    /// always wins over a pin.
    pub fn authoritative_engine(&self) -> Engine {
        if self.rollback.is_active() {
            return Engine::Database;
        }
        self.pinned.unwrap_or(Engine::Search)
    }

    pub async fn route(&self, query: &SearchQuery) -> Result<RoutedResults, RouteError> {
        let routed = match self.authoritative_engine() {
            Engine::Database => {
                let results = self.database.query(query).await.map_err(|source| {
                    RouteError::Backend {
                        engine: Engine::Database,
                        source,
                    }
                })?;
                RoutedResults {
                    results,
                    engine: Engine::Database,
                    fallback: self.pinned != Some(Engine::Database),
                }
            }
            Engine::Search => self.route_to_search(query).await?,
        };

        metrics::record_search(routed.engine, routed.fallback);
        Ok(routed)
    }

    async fn route_to_search(&self, query: &SearchQuery) -> Result<RoutedResults, RouteError> {
        match self.search.query(query).await {
            Ok(results) => Ok(RoutedResults {
                results,
                engine: Engine::Search,
                fallback: false,
            }),
            Err(primary) if primary.is_transient() => {
                tracing::warn!(
                    search_engine = %self.search.name(),
                    entity = %query.entity,
                    error = %primary,
                    "Search engine unavailable, falling back to database for this request"
                );
                match self.database.query(query).await {
                    Ok(results) => Ok(RoutedResults {
                        results,
                        engine: Engine::Database,
                        fallback: true,
                    }),
                    Err(fallback) => {
                        tracing::error!(
                            entity = %query.entity,
                            primary = %primary,
                            fallback = %fallback,
                            "Both search backends unavailable"
                        );
                        Err(RouteError::AllBackendsUnavailable { primary, fallback })
                    }
                }
            }
            Err(source) => Err(RouteError::Backend {
                engine: Engine::Search,
                source,
            }),
        }
    }
}
