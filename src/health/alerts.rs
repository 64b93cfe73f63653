//! Alert emission for failover transitions.
//!
//! # Design Decisions
//! - Sinks are synchronous and must not block; the controller calls them
//!   while holding its state lock
//! - The log sink is the minimum: one structured `error` event per alert

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Alert severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Info,
    Warning,
    Critical,
}

/// An alert with a human title and machine-readable payload.
#[derive(Debug, Clone, Serialize)]
pub struct Alert {
    pub title: String,
    pub severity: AlertSeverity,
    pub data: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

impl Alert {
    pub fn new(title: impl Into<String>, severity: AlertSeverity, data: serde_json::Value) -> Self {
        Self {
            title: title.into(),
            severity,
            data,
            timestamp: Utc::now(),
        }
    }
}

/// Destination for alerts.
pub trait AlertSink: Send + Sync {
    fn emit(&self, alert: &Alert);
}

/// Writes alerts to the tracing subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogAlertSink;

impl AlertSink for LogAlertSink {
    fn emit(&self, alert: &Alert) {
        match alert.severity {
            AlertSeverity::Critical => tracing::error!(
                alert = %alert.title,
                data = %alert.data,
                "ALERT"
            ),
            AlertSeverity::Warning => tracing::warn!(
                alert = %alert.title,
                data = %alert.data,
                "ALERT"
            ),
            AlertSeverity::Info => tracing::info!(
                alert = %alert.title,
                data = %alert.data,
                "ALERT"
            ),
        }
    }
}
