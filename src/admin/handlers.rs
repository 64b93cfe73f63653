use axum::{body::Bytes, extract::State, Json};
use serde::Deserialize;

use crate::health::{RecoveryOutcome, RollbackOutcome};
use crate::http::response::ApiError;
use crate::http::server::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct RollbackRequest {
    #[serde(default)]
    pub reason: String,
}

/// `POST /admin/search/rollback`; the body is optional.
pub async fn rollback(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<RollbackOutcome>, ApiError> {
    let request: RollbackRequest = if body.iter().all(u8::is_ascii_whitespace) {
        RollbackRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::BadRequest(format!("invalid rollback request: {}", e)))?
    };

    tracing::info!(reason = %request.reason, "Manual rollback requested");
    let outcome = state.controller.manual_rollback(&request.reason).await?;
    Ok(Json(outcome))
}

/// `POST /admin/search/recover`
pub async fn recover(State(state): State<AppState>) -> Result<Json<RecoveryOutcome>, ApiError> {
    tracing::info!("Manual recovery requested");
    let outcome = state.controller.manual_recovery().await?;
    Ok(Json(outcome))
}
