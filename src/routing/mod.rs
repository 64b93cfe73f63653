//! Search routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming search (entity, text, filters, page)
//!     → router.rs (read RollbackFlag, pick engine)
//!     → backend.rs (SearchBackend::query on the chosen engine)
//!     → on transient search engine error: one-shot database query
//!     → RoutedResults { results, engine, fallback }
//! ```
//!
//! # Design Decisions
//! - Same result shape from both engines; clients never see a rollback
//! - Only transient errors (connection lost, timeout, 502-504) fall back
//! - Routing never mutates health state

pub mod backend;
pub mod router;

pub use backend::{BackendError, Engine, SearchBackend, SearchQuery, SearchResults};
pub use router::{RouteError, RoutedResults, SearchRouter};
