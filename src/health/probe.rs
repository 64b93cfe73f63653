//! Search engine health probe.
//!
//! # Responsibilities
//! - Issue one bounded status check against the search engine
//! - Report latency and outcome as a [`ProbeResult`]
//!
//! # Design Decisions
//! - Probe failure is data: `probe()` never returns an error
//! - Every probe has a deadline so the control loop keeps its cadence

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::time;

use crate::routing::backend::SearchBackend;

/// One health-check outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeResult {
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "latency_ms", serialize_with = "serialize_millis")]
    pub latency: Duration,
    pub succeeded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProbeResult {
    pub fn success(latency: Duration) -> Self {
        Self {
            timestamp: Utc::now(),
            latency,
            succeeded: true,
            error: None,
        }
    }

    pub fn failure(latency: Duration, error: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            latency,
            succeeded: false,
            error: Some(error.into()),
        }
    }
}

pub(crate) fn serialize_millis<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_f64(duration.as_secs_f64() * 1000.0)
}

/// Performs round-trip health checks against a search backend.
pub struct HealthProbe {
    target: Arc<dyn SearchBackend>,
    timeout: Duration,
}

impl HealthProbe {
    pub fn new(target: Arc<dyn SearchBackend>, timeout: Duration) -> Self {
        Self { target, timeout }
    }

    /// Name of the probed backend.
    pub fn target_name(&self) -> &str {
        self.target.name()
    }

    pub async fn probe(&self) -> ProbeResult {
        let started = Instant::now();

        match time::timeout(self.timeout, self.target.status_probe()).await {
            Ok(Ok(())) => ProbeResult::success(started.elapsed()),
            Ok(Err(e)) => {
                tracing::warn!(backend = %self.target.name(), error = %e, "Health probe failed");
                ProbeResult::failure(started.elapsed(), e.to_string())
            }
            Err(_) => {
                tracing::warn!(
                    backend = %self.target.name(),
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Health probe timed out"
                );
                ProbeResult::failure(
                    started.elapsed(),
                    format!("probe timed out after {}ms", self.timeout.as_millis()),
                )
            }
        }
    }
}
