//! Search engine health monitoring and failover.
//!
//! # Data Flow
//! ```text
//! Background loop (controller.rs):
//!     Periodic timer (first tick immediate)
//!     → probe.rs (bounded status check → ProbeResult)
//!     → window.rs (sliding window → WindowSnapshot)
//!     → thresholds.rs (breach? → RollbackReason list)
//!     → state.rs (flip RollbackFlag, record transition)
//!     → alerts.rs (one alert per transition)
//!
//! Request path (routing/router.rs):
//!     RollbackFlag::is_active() → pick engine
//!
//! Operators (admin/):
//!     manual_rollback / manual_recovery → controller.rs
//! ```
//!
//! # Design Decisions
//! - Rollback is a level with hysteresis: only an operator restores
//!   the search engine, after a successful synchronous re-probe
//! - Probe failures are recorded as data and never escalated
//! - A single flaky user request never changes global state

pub mod alerts;
pub mod controller;
pub mod probe;
pub mod state;
pub mod thresholds;
pub mod window;

pub use alerts::{Alert, AlertSeverity, AlertSink, LogAlertSink};
pub use controller::{ControlError, FailoverController, HealthStatus, RecoveryOutcome, RollbackOutcome};
pub use probe::{HealthProbe, ProbeResult};
pub use state::{HealthState, RollbackFlag};
pub use thresholds::{RollbackReason, RollbackThresholds};
pub use window::{MetricsWindow, WindowSnapshot};
