//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::routing::backend::Engine;

/// Root configuration for the search gateway.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Specialized full-text search engine.
    pub search_engine: BackendConfig,

    /// Relational query service used as the fallback engine.
    pub database: BackendConfig,

    /// Health monitoring and failover policy.
    pub failover: FailoverConfig,

    /// Response cache settings.
    pub cache: CacheConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Admin (manual override) endpoints.
    pub admin: AdminConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            search_engine: BackendConfig::default(),
            database: BackendConfig {
                name: "postgres".to_string(),
                base_url: "http://127.0.0.1:8090".to_string(),
                search_path: "/query".to_string(),
                ..BackendConfig::default()
            },
            failover: FailoverConfig::default(),
            cache: CacheConfig::default(),
            timeouts: TimeoutConfig::default(),
            observability: ObservabilityConfig::default(),
            admin: AdminConfig::default(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Connection settings for one search backend.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Display name reported in health status (e.g., "manticore").
    pub name: String,

    /// Base URL of the backend service.
    pub base_url: String,

    /// Path probed by the health monitor.
    pub status_path: String,

    /// Path prefix for queries; the entity kind is appended.
    pub search_path: String,

    /// Per-request timeout in milliseconds.
    pub request_timeout_ms: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            name: "manticore".to_string(),
            base_url: "http://127.0.0.1:9308".to_string(),
            status_path: "/status".to_string(),
            search_path: "/search".to_string(),
            request_timeout_ms: 5_000,
        }
    }
}

/// Static rollback thresholds. Loaded once, immutable afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RollbackThresholds {
    /// Maximum tolerated failed/total ratio over the window (0.0 - 1.0).
    pub max_error_rate: f64,

    /// Maximum tolerated mean latency of successful probes, in milliseconds.
    pub max_avg_latency_ms: u64,

    /// Trailing failures that trip a rollback on their own.
    pub max_consecutive_failures: u32,
}

impl Default for RollbackThresholds {
    fn default() -> Self {
        Self {
            max_error_rate: 0.05,
            max_avg_latency_ms: 100,
            max_consecutive_failures: 5,
        }
    }
}

/// Health monitor and failover configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FailoverConfig {
    /// Run the background probe loop.
    pub enabled: bool,

    /// Probe interval in seconds.
    pub probe_interval_secs: u64,

    /// Probe timeout in seconds.
    pub probe_timeout_secs: u64,

    /// Number of probe results kept in the sliding window.
    pub window_size: usize,

    /// Number of probe errors kept for the status endpoint.
    pub recent_errors_capacity: usize,

    /// Route every request to this engine regardless of health.
    pub pinned_engine: Option<Engine>,

    /// Rollback thresholds.
    pub thresholds: RollbackThresholds,
}

impl Default for FailoverConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            probe_interval_secs: 30,
            probe_timeout_secs: 5,
            window_size: 20,
            recent_errors_capacity: 10,
            pinned_engine: None,
            thresholds: RollbackThresholds::default(),
        }
    }
}

/// Response cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Enable response caching.
    pub enabled: bool,

    /// TTL for search results in seconds.
    pub search_ttl_secs: u64,

    /// TTL for statistics (counts) in seconds.
    pub statistics_ttl_secs: u64,

    /// Soft cap on cached entries; expired entries are purged past it.
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            search_ttl_secs: 300,
            statistics_ttl_secs: 3_600,
            max_entries: 10_000,
        }
    }
}

/// Timeout configuration for inbound requests.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Pretty output for development, JSON for production.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Default admin key; refused by validation when admin endpoints are enabled.
pub const PLACEHOLDER_API_KEY: &str = "CHANGE_ME_IN_PRODUCTION";

/// Admin endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Mount the manual rollback/recovery endpoints.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: PLACEHOLDER_API_KEY.to_string(),
        }
    }
}
