//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use search_gateway::config::FailoverConfig;
use search_gateway::health::{Alert, AlertSink, FailoverController, HealthProbe};
use search_gateway::routing::{BackendError, SearchBackend, SearchQuery, SearchResults};
use serde_json::json;

/// How a mock backend answers queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryMode {
    Ok,
    ConnectionLost,
    BadQuery,
}

/// In-memory backend with switchable health.
pub struct MockBackend {
    name: &'static str,
    probe_ok: AtomicBool,
    panic_next_probe: AtomicBool,
    query_mode: Mutex<QueryMode>,
    pub probes: AtomicU32,
    pub queries: AtomicU32,
}

impl MockBackend {
    pub fn new(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            probe_ok: AtomicBool::new(true),
            panic_next_probe: AtomicBool::new(false),
            query_mode: Mutex::new(QueryMode::Ok),
            probes: AtomicU32::new(0),
            queries: AtomicU32::new(0),
        })
    }

    pub fn set_probe_ok(&self, ok: bool) {
        self.probe_ok.store(ok, Ordering::SeqCst);
    }

    /// Make the next status check panic, as a buggy client would.
    pub fn panic_on_next_probe(&self) {
        self.panic_next_probe.store(true, Ordering::SeqCst);
    }

    pub fn set_query_mode(&self, mode: QueryMode) {
        *self.query_mode.lock().unwrap() = mode;
    }

    pub fn query_count(&self) -> u32 {
        self.queries.load(Ordering::SeqCst)
    }

    pub fn probe_count(&self) -> u32 {
        self.probes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SearchBackend for MockBackend {
    fn name(&self) -> &str {
        self.name
    }

    async fn status_probe(&self) -> Result<(), BackendError> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        if self.panic_next_probe.swap(false, Ordering::SeqCst) {
            panic!("status check panicked");
        }
        if self.probe_ok.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(BackendError::Unavailable("connection refused".into()))
        }
    }

    async fn query(&self, query: &SearchQuery) -> Result<SearchResults, BackendError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        let mode = *self.query_mode.lock().unwrap();
        match mode {
            QueryMode::Ok => Ok(SearchResults {
                total: 1,
                hits: vec![json!({ "source": self.name, "entity": query.entity, "q": query.text })],
            }),
            QueryMode::ConnectionLost => Err(BackendError::Unavailable("connection lost".into())),
            QueryMode::BadQuery => Err(BackendError::Query("syntax error".into())),
        }
    }
}

/// Alert sink that keeps every alert for inspection.
#[derive(Default)]
pub struct RecordingAlertSink {
    alerts: Mutex<Vec<Alert>>,
}

impl RecordingAlertSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn alerts(&self) -> Vec<Alert> {
        self.alerts.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.alerts.lock().unwrap().len()
    }
}

impl AlertSink for RecordingAlertSink {
    fn emit(&self, alert: &Alert) {
        self.alerts.lock().unwrap().push(alert.clone());
    }
}

/// Controller with default thresholds {0.05, 100ms, 5} over `search`.
pub fn controller(
    search: Arc<MockBackend>,
    alerts: Arc<RecordingAlertSink>,
) -> Arc<FailoverController> {
    let probe = HealthProbe::new(search, Duration::from_millis(500));
    Arc::new(FailoverController::new(probe, &FailoverConfig::default(), alerts))
}
