//! Session summary route.

use axum::{Extension, Router, extract::State, routing::get};
use ember_core::types::SessionSummary;
use std::sync::Arc;

use crate::error::{ApiError, ApiResponse, ApiResult};
use crate::middleware::SessionContext;
use crate::state::AppState;

/// Create summary router
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/session-summary", get(get_session_summary))
}

/// Projection over every focus session of the caller
pub async fn get_session_summary(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SessionContext>,
) -> ApiResult<SessionSummary> {
    let summary = state
        .engine
        .get_session_summary(&session.session_key)?
        .ok_or_else(|| ApiError::NotFound("No session summary found".to_string()))?;

    Ok(ApiResponse::ok(summary))
}
