//! Weekly check-in route.

use axum::{Extension, Router, extract::State, routing::post};
use ember_core::focus::CheckIn;
use ember_core::types::SessionSummary;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{ApiResponse, ApiResult};
use crate::extract::ApiJson;
use crate::middleware::SessionContext;
use crate::state::AppState;

/// Create check-in router
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/check-in", post(submit_check_in))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInRequest {
    pub category: String,
    pub completed_activities: bool,
    pub new_rating: i64,
    pub continue_working: bool,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInResponse {
    pub summary: String,
    pub next_steps: String,
    pub session_summary: SessionSummary,
}

/// Submit a weekly check-in
pub async fn submit_check_in(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SessionContext>,
    ApiJson(req): ApiJson<CheckInRequest>,
) -> ApiResult<CheckInResponse> {
    let check_in = CheckIn {
        completed_activities: req.completed_activities,
        new_rating: req.new_rating,
        continue_working: req.continue_working,
        notes: req.notes.filter(|n| !n.trim().is_empty()),
    };

    let outcome = state
        .engine
        .check_in(&session.session_key, &req.category, &check_in)
        .await?;

    Ok(ApiResponse::ok(CheckInResponse {
        summary: outcome.summary_text,
        next_steps: outcome.next_steps,
        session_summary: outcome.summary,
    }))
}
