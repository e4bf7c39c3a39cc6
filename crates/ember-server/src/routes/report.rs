//! Balance report route.

use axum::{Extension, Router, extract::State, routing::get};
use serde::Serialize;
use std::sync::Arc;

use super::answers::AnswersResponse;
use crate::error::{ApiError, ApiResponse, ApiResult};
use crate::middleware::SessionContext;
use crate::state::AppState;

/// Create report router
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/report", get(get_report))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportResponse {
    pub summary: String,
    pub wheel_data: AnswersResponse,
}

/// Written overview of the caller's wheel ratings
pub async fn get_report(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SessionContext>,
) -> ApiResult<ReportResponse> {
    let report = state
        .engine
        .report(&session.session_key)
        .await?
        .ok_or_else(|| ApiError::NotFound("No answers found".to_string()))?;

    Ok(ApiResponse::ok(ReportResponse {
        summary: report.summary,
        wheel_data: AnswersResponse {
            categories: report.ratings,
        },
    }))
}
