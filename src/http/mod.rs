//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID, tracing span)
//!     → handlers.rs (parse query, consult cache)
//!     → routing::SearchRouter (pick engine, one-shot fallback)
//!     → response.rs (common envelope, error mapping)
//!     → Send to client
//! ```

pub mod handlers;
pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use response::{ApiError, SearchEnvelope, StatsEnvelope, X_SEARCH_ENGINE};
pub use server::{AppState, HttpServer};
