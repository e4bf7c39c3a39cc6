//! Wheel questionnaire routes.

use axum::{Extension, Router, extract::State, routing::post};
use ember_core::types::{WheelCategory, validate_rating};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::error::{ApiResponse, ApiResult};
use crate::extract::ApiJson;
use crate::middleware::SessionContext;
use crate::state::AppState;

/// Create wheel router
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/answers", post(submit_answers).get(get_answers))
}

#[derive(Debug, Deserialize)]
pub struct RatingInput {
    pub category: String,
    pub value: i64,
}

#[derive(Debug, Deserialize)]
pub struct SubmitAnswersRequest {
    pub categories: Vec<RatingInput>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswersResponse {
    pub categories: Vec<WheelCategory>,
}

/// Record a completed wheel questionnaire
pub async fn submit_answers(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SessionContext>,
    ApiJson(req): ApiJson<SubmitAnswersRequest>,
) -> ApiResult<AnswersResponse> {
    let categories = req
        .categories
        .into_iter()
        .map(|input| {
            Ok(WheelCategory {
                value: validate_rating(input.value)?,
                category: input.category,
            })
        })
        .collect::<ember_core::Result<Vec<_>>>()?;

    state.engine.submit_wheel(&session.session_key, &categories)?;
    info!(
        session_key = %session.session_key,
        categories = categories.len(),
        "Wheel answers recorded"
    );

    let categories = state.engine.latest_ratings(&session.session_key)?;
    Ok(ApiResponse::ok(AnswersResponse { categories }))
}

/// Latest wheel ratings of the session
pub async fn get_answers(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SessionContext>,
) -> ApiResult<AnswersResponse> {
    let categories = state.engine.latest_ratings(&session.session_key)?;
    Ok(ApiResponse::ok(AnswersResponse { categories }))
}
