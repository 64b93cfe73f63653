//! Failover controller.
//!
//! # Responsibilities
//! - Probe the search engine on a fixed interval, starting immediately
//! - Feed the sliding window and evaluate rollback thresholds
//! - Flip the routing flag to the database fallback on breach
//! - Serve manual rollback and recovery requests from operators
//! - Publish a read-only status snapshot
//!
//! # Design Decisions
//! - One async mutex serializes every mutation; probe + record + evaluate
//!   run as one unit, and manual operations cannot interleave with it
//! - Readers never take the lock: routing reads an atomic flag, status
//!   reads an `ArcSwap` snapshot republished after each mutation
//! - No automatic recovery; only an operator can restore the search engine
//! - The probe loop is supervised and restarted if a cycle panics

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::config::FailoverConfig;
use crate::health::alerts::{Alert, AlertSeverity, AlertSink};
use crate::health::probe::{HealthProbe, ProbeResult};
use crate::health::state::{HealthState, ProbeError, RollbackFlag};
use crate::health::thresholds::{
    breached_thresholds, format_reasons, should_rollback, RollbackReason, RollbackThresholds,
};
use crate::health::window::WindowSnapshot;
use crate::observability::metrics;

/// Number of probes listed in the status snapshot.
const STATUS_RECENT_PROBES: usize = 5;

/// Missed intervals after which the monitor is reported stale.
const STALE_AFTER_INTERVALS: u32 = 3;

/// Pause before restarting a panicked probe loop.
const RESTART_BACKOFF: Duration = Duration::from_secs(1);

/// Errors returned to operators by manual controls.
#[derive(Debug, Error)]
pub enum ControlError {
    #[error("search traffic is already rolled back ({reason})")]
    AlreadyRolledBack { reason: String },

    #[error("recovery refused: search engine probe failed: {0}")]
    RecoveryProbeFailed(String),
}

/// Result of a successful manual rollback.
#[derive(Debug, Clone, Serialize)]
pub struct RollbackOutcome {
    pub success: bool,
    pub reason: String,
}

/// Result of a successful manual recovery.
#[derive(Debug, Clone, Serialize)]
pub struct RecoveryOutcome {
    pub success: bool,
    pub message: String,
}

/// Aggregate metrics section of [`HealthStatus`].
#[derive(Debug, Clone, Serialize)]
pub struct StatusMetrics {
    pub error_rate: f64,
    pub avg_latency_ms: f64,
    pub consecutive_failures: u32,
    pub sample_count: usize,
    pub last_successful_probe_at: Option<DateTime<Utc>>,
}

/// Read-only snapshot for status and dashboard endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    pub rollback_active: bool,
    pub search_engine_name: String,
    pub metrics: StatusMetrics,
    pub thresholds: RollbackThresholds,
    pub recent_probes: Vec<ProbeResult>,
    pub recent_errors: Vec<ProbeError>,
    pub rolled_back_at: Option<DateTime<Utc>>,
    pub rollback_reason: Option<String>,
    pub last_probe_at: Option<DateTime<Utc>>,
    /// Never set when the probe loop is disabled by configuration.
    pub monitor_stale: bool,
}

/// Owns the search engine health state and all transitions on it.
pub struct FailoverController {
    probe: HealthProbe,
    thresholds: RollbackThresholds,
    probe_interval: Duration,
    monitor_enabled: bool,
    alerts: Arc<dyn AlertSink>,
    state: Mutex<HealthState>,
    flag: Arc<RollbackFlag>,
    status: ArcSwap<HealthStatus>,
    started_at: DateTime<Utc>,
}

impl FailoverController {
    pub fn new(probe: HealthProbe, config: &FailoverConfig, alerts: Arc<dyn AlertSink>) -> Self {
        let state = HealthState::new(config.window_size, config.recent_errors_capacity);
        let thresholds = config.thresholds;
        let status = build_status(&state, probe.target_name(), &thresholds);

        metrics::record_rollback_active(false);

        Self {
            probe,
            thresholds,
            probe_interval: Duration::from_secs(config.probe_interval_secs),
            monitor_enabled: config.enabled,
            alerts,
            state: Mutex::new(state),
            flag: Arc::new(RollbackFlag::default()),
            status: ArcSwap::from_pointee(status),
            started_at: Utc::now(),
        }
    }

    /// Override the probe interval (tests use sub-second intervals).
    pub fn with_probe_interval(mut self, interval: Duration) -> Self {
        self.probe_interval = interval;
        self
    }

    /// Shared read-only view of the routing decision.
    pub fn rollback_flag(&self) -> Arc<RollbackFlag> {
        Arc::clone(&self.flag)
    }

    pub fn is_rolled_back(&self) -> bool {
        self.flag.is_active()
    }

    pub fn thresholds(&self) -> &RollbackThresholds {
        &self.thresholds
    }

    pub fn get_health_status(&self) -> HealthStatus {
        let mut status = HealthStatus::clone(&self.status.load());
        if !self.monitor_enabled {
            return status;
        }
        let last_activity = status.last_probe_at.unwrap_or(self.started_at);
        let stale_after = self.probe_interval * STALE_AFTER_INTERVALS;
        status.monitor_stale = Utc::now()
            .signed_duration_since(last_activity)
            .to_std()
            .map(|elapsed| elapsed > stale_after)
            .unwrap_or(false);
        status
    }

    /// Probe once and apply the result.
    pub async fn run_cycle(&self) -> ProbeResult {
        let mut state = self.state.lock().await;
        let result = self.probe.probe().await;
        self.apply_locked(&mut state, result.clone());
        result
    }

    /// Apply an externally obtained probe result as if a scheduled probe
    /// had produced it.
    pub async fn record_probe(&self, result: ProbeResult) {
        let mut state = self.state.lock().await;
        self.apply_locked(&mut state, result);
    }

    /// Force `Healthy → RolledBack` with an operator-supplied reason.
    pub async fn manual_rollback(&self, reason: &str) -> Result<RollbackOutcome, ControlError> {
        let mut state = self.state.lock().await;
        let reason = RollbackReason::manual(reason);
        let snapshot = state.window().snapshot();

        if !self.rollback_locked(&mut state, &[reason.clone()], &snapshot) {
            return Err(ControlError::AlreadyRolledBack {
                reason: state.rollback_reason.clone().unwrap_or_default(),
            });
        }
        self.publish(&state);

        Ok(RollbackOutcome {
            success: true,
            reason: reason.to_string(),
        })
    }

    /// Attempt `RolledBack → Healthy`. Re-probes synchronously and refuses
    /// without any state change if the probe fails.
    pub async fn manual_recovery(&self) -> Result<RecoveryOutcome, ControlError> {
        let mut state = self.state.lock().await;

        if !state.is_rolled_back() {
            return Ok(RecoveryOutcome {
                success: true,
                message: format!("{} is already serving search traffic", self.probe.target_name()),
            });
        }

        let result = self.probe.probe().await;
        if !result.succeeded {
            let error = result.error.unwrap_or_else(|| "unknown error".to_string());
            tracing::warn!(error = %error, "Manual recovery refused");
            return Err(ControlError::RecoveryProbeFailed(error));
        }

        let previous_reason = state.rollback_reason.clone();
        state.reset_after_recovery();
        state.last_probe_at = Some(result.timestamp);
        state.last_successful_probe_at = Some(result.timestamp);
        self.flag.set(false);
        self.publish(&state);

        metrics::record_rollback_active(false);
        metrics::record_transition("recovery");
        self.alerts.emit(&Alert::new(
            "Search engine restored",
            AlertSeverity::Info,
            json!({
                "search_engine": self.probe.target_name(),
                "previous_reason": previous_reason,
                "probe_latency_ms": result.latency.as_millis() as u64,
            }),
        ));
        tracing::info!(
            search_engine = %self.probe.target_name(),
            latency_ms = result.latency.as_millis() as u64,
            "Search traffic restored to search engine"
        );

        Ok(RecoveryOutcome {
            success: true,
            message: format!("{} restored as search backend", self.probe.target_name()),
        })
    }

    /// Probe once, then hand off to the supervised probe loop. Awaiting
    /// this before serving traffic guarantees health is known up front.
    pub async fn start(self: &Arc<Self>, shutdown: broadcast::Receiver<()>) -> JoinHandle<()> {
        let initial = self.run_cycle().await;
        tracing::info!(
            search_engine = %self.probe.target_name(),
            healthy = initial.succeeded,
            latency_ms = initial.latency.as_millis() as u64,
            "Initial search engine probe complete"
        );

        let controller = Arc::clone(self);
        tokio::spawn(controller.supervise(shutdown))
    }

    /// Probe loop. The first probe fires one interval after start.
    pub async fn run(self: Arc<Self>, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            search_engine = %self.probe.target_name(),
            interval_secs = self.probe_interval.as_secs_f64(),
            "Health monitor starting"
        );

        let mut ticker = time::interval_at(Instant::now() + self.probe_interval, self.probe_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.run_cycle().await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Health monitor received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    /// Restarts the probe loop after a panic. The supervisor keeps its own
    /// receiver: a resubscribed one misses signals sent before it existed.
    async fn supervise(self: Arc<Self>, mut shutdown: broadcast::Receiver<()>) {
        loop {
            let mut task = tokio::spawn(Arc::clone(&self).run(shutdown.resubscribe()));

            let outcome = tokio::select! {
                outcome = &mut task => outcome,
                _ = shutdown.recv() => {
                    // An in-flight probe is abandoned; the next start re-probes.
                    task.abort();
                    let _ = task.await;
                    tracing::info!("Health monitor stopped");
                    break;
                }
            };

            match outcome {
                Ok(()) => break,
                Err(e) if e.is_panic() => {
                    tracing::error!(error = %e, "Health monitor panicked, restarting");
                    metrics::record_monitor_restart();
                    tokio::select! {
                        _ = time::sleep(RESTART_BACKOFF) => {}
                        _ = shutdown.recv() => {
                            tracing::info!("Shutdown during health monitor restart");
                            break;
                        }
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "Health monitor task cancelled");
                    break;
                }
            }
        }
    }

    fn apply_locked(&self, state: &mut HealthState, result: ProbeResult) {
        metrics::record_probe(result.succeeded, result.latency);
        state.record_probe(result);

        let snapshot = state.window().snapshot();
        if should_rollback(&snapshot, &self.thresholds, state.is_rolled_back()) {
            let reasons = breached_thresholds(&snapshot, &self.thresholds);
            self.rollback_locked(state, &reasons, &snapshot);
        }

        self.publish(state);
    }

    /// Side effects run only for the call that actually flips the state.
    fn rollback_locked(
        &self,
        state: &mut HealthState,
        reasons: &[RollbackReason],
        snapshot: &WindowSnapshot,
    ) -> bool {
        if !state.enter_rollback(reasons) {
            return false;
        }
        self.flag.set(true);

        let tags = format_reasons(reasons);
        let trigger = if reasons.iter().any(RollbackReason::is_manual) {
            "manual"
        } else {
            "automatic"
        };

        metrics::record_rollback_active(true);
        metrics::record_transition(trigger);
        self.alerts.emit(&Alert::new(
            "Search engine rolled back to database fallback",
            AlertSeverity::Critical,
            json!({
                "search_engine": self.probe.target_name(),
                "reason": tags,
                "trigger": trigger,
                "error_rate": snapshot.error_rate,
                "avg_latency_ms": snapshot.avg_latency_successful.as_secs_f64() * 1000.0,
                "consecutive_failures": snapshot.consecutive_failures,
                "rolled_back_at": state.rolled_back_at,
            }),
        ));
        tracing::warn!(
            search_engine = %self.probe.target_name(),
            reason = %tags,
            trigger,
            "Search traffic rolled back to database"
        );
        true
    }

    fn publish(&self, state: &HealthState) {
        self.status
            .store(Arc::new(build_status(state, self.probe.target_name(), &self.thresholds)));
    }
}

fn build_status(state: &HealthState, engine_name: &str, thresholds: &RollbackThresholds) -> HealthStatus {
    let snapshot = state.window().snapshot();

    HealthStatus {
        rollback_active: state.rollback_active,
        search_engine_name: engine_name.to_string(),
        metrics: StatusMetrics {
            error_rate: snapshot.error_rate,
            avg_latency_ms: snapshot.avg_latency_successful.as_secs_f64() * 1000.0,
            consecutive_failures: snapshot.consecutive_failures,
            sample_count: snapshot.sample_count,
            last_successful_probe_at: state.last_successful_probe_at,
        },
        thresholds: *thresholds,
        recent_probes: state.window().recent(STATUS_RECENT_PROBES),
        recent_errors: state.recent_errors.iter().cloned().collect(),
        rolled_back_at: state.rolled_back_at,
        rollback_reason: state.rollback_reason.clone(),
        last_probe_at: state.last_probe_at,
        monitor_stale: false,
    }
}
