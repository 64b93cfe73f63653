//! Rollback threshold evaluation.
//!
//! Pure functions mapping a [`WindowSnapshot`] to a rollback decision.
//! Signals are OR-combined: any single breached threshold is enough.

use std::fmt;
use std::time::Duration;

use crate::health::window::WindowSnapshot;

pub use crate::config::schema::RollbackThresholds;

/// Reason tag used when an operator forces a rollback without giving one.
pub const MANUAL_INTERVENTION: &str = "manual_intervention";

/// Why a rollback was triggered. Displays as a stable tag.
#[derive(Debug, Clone, PartialEq)]
pub enum RollbackReason {
    /// `high_error_rate_12.0%`
    HighErrorRate(f64),
    /// `slow_response_150ms`
    SlowResponse(Duration),
    /// `consecutive_failures_5`
    ConsecutiveFailures(u32),
    /// Operator-supplied tag.
    Manual(String),
}

impl RollbackReason {
    pub fn manual(reason: &str) -> Self {
        let reason = reason.trim();
        if reason.is_empty() {
            RollbackReason::Manual(MANUAL_INTERVENTION.to_string())
        } else {
            RollbackReason::Manual(reason.to_string())
        }
    }

    pub fn is_manual(&self) -> bool {
        matches!(self, RollbackReason::Manual(_))
    }
}

impl fmt::Display for RollbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RollbackReason::HighErrorRate(rate) => write!(f, "high_error_rate_{:.1}%", rate * 100.0),
            RollbackReason::SlowResponse(latency) => {
                write!(f, "slow_response_{}ms", latency.as_millis())
            }
            RollbackReason::ConsecutiveFailures(n) => write!(f, "consecutive_failures_{}", n),
            RollbackReason::Manual(tag) => f.write_str(tag),
        }
    }
}

/// Comma-joined tags, e.g. `high_error_rate_12.0%,slow_response_150ms`.
pub fn format_reasons(reasons: &[RollbackReason]) -> String {
    reasons
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// Every threshold the snapshot breaches, in a fixed order.
pub fn breached_thresholds(
    snapshot: &WindowSnapshot,
    thresholds: &RollbackThresholds,
) -> Vec<RollbackReason> {
    let mut reasons = Vec::new();

    if snapshot.error_rate > thresholds.max_error_rate {
        reasons.push(RollbackReason::HighErrorRate(snapshot.error_rate));
    }
    if snapshot.avg_latency_successful > Duration::from_millis(thresholds.max_avg_latency_ms) {
        reasons.push(RollbackReason::SlowResponse(snapshot.avg_latency_successful));
    }
    if snapshot.consecutive_failures >= thresholds.max_consecutive_failures {
        reasons.push(RollbackReason::ConsecutiveFailures(snapshot.consecutive_failures));
    }

    reasons
}

/// Rollback is a level, not an edge: never re-triggered while active.
pub fn should_rollback(
    snapshot: &WindowSnapshot,
    thresholds: &RollbackThresholds,
    currently_rolled_back: bool,
) -> bool {
    if currently_rolled_back {
        return false;
    }
    !breached_thresholds(snapshot, thresholds).is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thresholds() -> RollbackThresholds {
        RollbackThresholds {
            max_error_rate: 0.05,
            max_avg_latency_ms: 100,
            max_consecutive_failures: 5,
        }
    }

    fn snapshot(error_rate: f64, latency_ms: u64, consecutive: u32) -> WindowSnapshot {
        WindowSnapshot {
            error_rate,
            avg_latency_successful: Duration::from_millis(latency_ms),
            consecutive_failures: consecutive,
            sample_count: 20,
        }
    }

    #[test]
    fn test_no_premature_trip() {
        assert!(!should_rollback(&WindowSnapshot::default(), &thresholds(), false));
        assert!(!should_rollback(&snapshot(0.0, 40, 0), &thresholds(), false));
    }

    #[test]
    fn test_each_threshold_is_sufficient() {
        let t = thresholds();
        assert!(should_rollback(&snapshot(0.10, 40, 0), &t, false));
        assert!(should_rollback(&snapshot(0.0, 150, 0), &t, false));
        // Six consecutive failures in a mostly healthy window.
        let mut consecutive = snapshot(0.0, 40, 6);
        consecutive.error_rate = 0.04;
        assert_eq!(
            breached_thresholds(&consecutive, &t),
            vec![RollbackReason::ConsecutiveFailures(6)]
        );
        assert!(should_rollback(&consecutive, &t, false));
    }

    #[test]
    fn test_boundaries() {
        let t = thresholds();
        // Rate and latency are strict, consecutive failures inclusive.
        assert!(!should_rollback(&snapshot(0.05, 100, 4), &t, false));
        assert!(should_rollback(&snapshot(0.0, 0, 5), &t, false));
    }

    #[test]
    fn test_gated_while_rolled_back() {
        assert!(!should_rollback(&snapshot(1.0, 500, 20), &thresholds(), true));
    }

    #[test]
    fn test_reason_tags() {
        let reasons = breached_thresholds(&snapshot(0.12, 150, 5), &thresholds());
        assert_eq!(
            format_reasons(&reasons),
            "high_error_rate_12.0%,slow_response_150ms,consecutive_failures_5"
        );
    }

    #[test]
    fn test_manual_reason() {
        assert_eq!(RollbackReason::manual("").to_string(), "manual_intervention");
        assert_eq!(RollbackReason::manual(" maintenance ").to_string(), "maintenance");
        assert!(RollbackReason::manual("x").is_manual());
    }
}
