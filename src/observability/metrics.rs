//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define gateway metrics (probes, rollback state, routing, cache)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `search_probe_total` (counter): probes by outcome
//! - `search_probe_latency_seconds` (histogram): probe round-trip time
//! - `search_rollback_active` (gauge): 1=database authoritative, 0=search engine
//! - `search_rollback_transitions_total` (counter): transitions by trigger
//! - `search_requests_total` (counter): served requests by engine, fallback
//! - `search_cache_lookups_total` (counter): cache hits and misses
//! - `search_monitor_restarts_total` (counter): supervised monitor restarts
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed (tests, CLI)
//! - Labels are low-cardinality enums only; never query text

use std::net::SocketAddr;
use std::time::Duration;

use metrics_exporter_prometheus::PrometheusBuilder;

use crate::routing::backend::Engine;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_probe(succeeded: bool, latency: Duration) {
    let outcome = if succeeded { "success" } else { "failure" };
    ::metrics::counter!("search_probe_total", "outcome" => outcome).increment(1);
    ::metrics::histogram!("search_probe_latency_seconds").record(latency.as_secs_f64());
}

pub fn record_rollback_active(active: bool) {
    ::metrics::gauge!("search_rollback_active").set(if active { 1.0 } else { 0.0 });
}

pub fn record_transition(trigger: &'static str) {
    ::metrics::counter!("search_rollback_transitions_total", "trigger" => trigger).increment(1);
}

pub fn record_search(engine: Engine, fallback: bool) {
    ::metrics::counter!(
        "search_requests_total",
        "engine" => engine.as_str(),
        "fallback" => if fallback { "true" } else { "false" }
    )
    .increment(1);
}

pub fn record_cache_lookup(hit: bool) {
    let result = if hit { "hit" } else { "miss" };
    ::metrics::counter!("search_cache_lookups_total", "result" => result).increment(1);
}

pub fn record_monitor_restart() {
    ::metrics::counter!("search_monitor_restarts_total").increment(1);
}
