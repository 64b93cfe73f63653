//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build backends, failover controller and search router from config
//! - Create Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, timeout)
//! - Start the health monitor alongside the listener
//! - Shut both down on the shutdown signal

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::Request;
use axum::routing::get;
use axum::Router;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::admin;
use crate::backends::HttpBackend;
use crate::cache::{ResponseCache, TtlClass};
use crate::config::{AdminConfig, CacheConfig, GatewayConfig};
use crate::health::{AlertSink, FailoverController, HealthProbe, LogAlertSink};
use crate::http::handlers;
use crate::http::request::{propagate_request_id_layer, request_id, set_request_id_layer};
use crate::routing::{BackendError, SearchBackend, SearchRouter};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<FailoverController>,
    pub router: Arc<SearchRouter>,
    pub cache: Option<ResponseCache>,
    pub cache_config: CacheConfig,
    pub admin: AdminConfig,
}

impl AppState {
    /// Cached value for `key`, if caching is enabled and the entry is live.
    pub fn cached<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.cache.as_ref()?.get(key)?;
        serde_json::from_value(value).ok()
    }

    pub fn store<T: Serialize>(&self, key: String, class: TtlClass, value: &T) {
        let Some(cache) = &self.cache else {
            return;
        };
        match serde_json::to_value(value) {
            Ok(json) => cache.set(key, json, class.ttl(&self.cache_config)),
            Err(e) => tracing::warn!(error = %e, "Failed to serialize response for cache"),
        }
    }
}

/// HTTP server for the search gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
    controller: Arc<FailoverController>,
}

impl HttpServer {
    /// Create a server talking to the configured HTTP backends.
    pub fn new(config: GatewayConfig) -> Result<Self, BackendError> {
        let search = Arc::new(HttpBackend::from_config(&config.search_engine)?);
        let database = Arc::new(HttpBackend::from_config(&config.database)?);
        Ok(Self::with_backends(config, search, database, Arc::new(LogAlertSink)))
    }

    /// Create a server over arbitrary backend clients and alert sink.
    pub fn with_backends(
        config: GatewayConfig,
        search: Arc<dyn SearchBackend>,
        database: Arc<dyn SearchBackend>,
        alerts: Arc<dyn AlertSink>,
    ) -> Self {
        let probe = HealthProbe::new(
            Arc::clone(&search),
            Duration::from_secs(config.failover.probe_timeout_secs),
        );
        let controller = Arc::new(FailoverController::new(probe, &config.failover, alerts));

        let search_router = SearchRouter::new(search, database, controller.rollback_flag())
            .pinned_to(config.failover.pinned_engine);
        if let Some(engine) = config.failover.pinned_engine {
            tracing::info!(engine = %engine, "Search routing pinned by configuration");
        }

        let state = AppState {
            controller: Arc::clone(&controller),
            router: Arc::new(search_router),
            cache: config
                .cache
                .enabled
                .then(|| ResponseCache::new(config.cache.max_entries)),
            cache_config: config.cache.clone(),
            admin: config.admin.clone(),
        };

        let router = Self::build_router(&config, state);
        Self {
            router,
            config,
            controller,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        let mut routes = Router::new()
            .route("/search/{entity}", get(handlers::search))
            .route("/stats/{entity}", get(handlers::stats))
            .route("/health/search", get(handlers::health_status))
            .route("/healthz", get(handlers::liveness));

        if config.admin.enabled {
            routes = routes.merge(admin::admin_router(state.clone()));
        }

        routes
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(
                TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                    tracing::info_span!(
                        "request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = %request_id(request.headers()),
                    )
                }),
            )
            .layer(propagate_request_id_layer())
            .layer(set_request_id_layer())
    }

    /// The fully layered router (used directly by tests).
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn controller(&self) -> Arc<FailoverController> {
        Arc::clone(&self.controller)
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Run the server and the health monitor until shutdown is signalled.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let monitor = if self.config.failover.enabled {
            Some(self.controller.start(shutdown.resubscribe()).await)
        } else {
            tracing::warn!("Search health monitor disabled; rollback only via admin endpoints");
            None
        };

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        if let Some(handle) = monitor {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "Health monitor did not stop cleanly");
            }
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
