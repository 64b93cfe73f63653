//! Operator controls for search failover.
//!
//! # Design Decisions
//! - Bearer-token protected, mounted only when `admin.enabled`
//! - Handlers are thin: all state changes go through `FailoverController`

pub mod auth;
pub mod handlers;

use axum::{middleware, routing::post, Router};

use self::auth::admin_auth_middleware;
use self::handlers::{recover, rollback};
use crate::http::server::AppState;

pub fn admin_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/admin/search/rollback", post(rollback))
        .route("/admin/search/recover", post(recover))
        .route_layer(middleware::from_fn_with_state(state, admin_auth_middleware))
}
