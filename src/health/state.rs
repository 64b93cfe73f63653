//! Search engine health state.
//!
//! # States
//! - Healthy: search engine authoritative
//! - RolledBack: relational fallback authoritative, search engine still probed
//!
//! # State Transitions
//! ```text
//! Healthy → RolledBack: threshold breach (automatic) or operator request
//! RolledBack → Healthy: operator recovery after a successful re-probe only
//! ```
//!
//! # Design Decisions
//! - Writers: `FailoverController` only
//! - The routing decision is published through [`RollbackFlag`], an atomic
//!   that request handlers read without locking
//! - Everything resets on process restart

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::health::probe::ProbeResult;
use crate::health::thresholds::{format_reasons, RollbackReason};
use crate::health::window::MetricsWindow;

/// Lock-free view of the rollback decision.
#[derive(Debug, Default)]
pub struct RollbackFlag(AtomicBool);

impl RollbackFlag {
    pub fn is_active(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub(crate) fn set(&self, active: bool) {
        self.0.store(active, Ordering::Release);
    }
}

/// One probe error kept for the status endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeError {
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

/// Controller-owned health state. Mutated under the controller's lock.
#[derive(Debug)]
pub struct HealthState {
    pub(crate) rollback_active: bool,
    pub(crate) rolled_back_at: Option<DateTime<Utc>>,
    pub(crate) rollback_reason: Option<String>,
    pub(crate) last_successful_probe_at: Option<DateTime<Utc>>,
    pub(crate) last_probe_at: Option<DateTime<Utc>>,
    /// Most recent first.
    pub(crate) recent_errors: VecDeque<ProbeError>,
    recent_errors_capacity: usize,
    pub(crate) window: MetricsWindow,
}

impl HealthState {
    pub fn new(window_size: usize, recent_errors_capacity: usize) -> Self {
        Self {
            rollback_active: false,
            rolled_back_at: None,
            rollback_reason: None,
            last_successful_probe_at: None,
            last_probe_at: None,
            recent_errors: VecDeque::with_capacity(recent_errors_capacity),
            recent_errors_capacity,
            window: MetricsWindow::new(window_size),
        }
    }

    pub fn is_rolled_back(&self) -> bool {
        self.rollback_active
    }

    pub fn window(&self) -> &MetricsWindow {
        &self.window
    }

    pub(crate) fn record_probe(&mut self, result: ProbeResult) {
        self.last_probe_at = Some(result.timestamp);

        if result.succeeded {
            self.last_successful_probe_at = Some(result.timestamp);
        } else if self.recent_errors_capacity > 0 {
            if self.recent_errors.len() == self.recent_errors_capacity {
                self.recent_errors.pop_back();
            }
            self.recent_errors.push_front(ProbeError {
                timestamp: result.timestamp,
                message: result.error.clone().unwrap_or_else(|| "unknown error".to_string()),
            });
        }

        self.window.record(result);
    }

    /// Enter rollback. Returns false without side effects when already active.
    pub(crate) fn enter_rollback(&mut self, reasons: &[RollbackReason]) -> bool {
        if self.rollback_active {
            return false;
        }
        self.rollback_active = true;
        self.rolled_back_at = Some(Utc::now());
        self.rollback_reason = Some(format_reasons(reasons));
        true
    }

    /// Clean slate after a verified recovery.
    pub(crate) fn reset_after_recovery(&mut self) {
        self.rollback_active = false;
        self.rolled_back_at = None;
        self.rollback_reason = None;
        self.recent_errors.clear();
        self.window.clear();
    }
}
