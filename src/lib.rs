//! Search gateway library: health-monitored routing between a full-text
//! search engine and its relational database fallback.

pub mod admin;
pub mod backends;
pub mod cache;
pub mod config;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use config::GatewayConfig;
pub use health::FailoverController;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use routing::SearchRouter;
