//! Focus session routes.

use axum::{
    Extension, Router,
    extract::{Path, State},
    routing::{get, post},
};
use ember_core::focus::AnswerOutcome;
use ember_core::types::FocusWorkflow;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{ApiResponse, ApiResult};
use crate::extract::ApiJson;
use crate::middleware::SessionContext;
use crate::state::AppState;

/// Reply to an answer that leaves questions open
pub const ANSWER_ACK: &str = "Thanks for your answer!";
/// Reply to the last answer
pub const ANSWERS_DONE: &str =
    "Great! Now let's pick activities that will help you improve this area.";

/// Create focus session router
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/focus-sessions/active", get(list_active))
        .route("/focus/{category}", post(start_session))
        .route("/focus/{category}/answer", post(submit_answer))
        .route("/focus/{category}/activities", post(select_activities))
        .route("/focus/{category}/check-in", get(check_in_prompt))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartResponse {
    pub session_id: String,
    pub question: String,
    pub question_index: usize,
    pub total_questions: usize,
    pub focus_session: FocusWorkflow,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRequest {
    pub answer: String,
    pub question_index: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerResponse {
    pub response: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_question: Option<String>,
    pub is_complete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activities: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectActivitiesRequest {
    pub selected_activities: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectActivitiesResponse {
    pub summary: String,
    pub focus_session: FocusWorkflow,
}

#[derive(Debug, Serialize)]
pub struct CheckInPromptResponse {
    pub question: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveResponse {
    pub focus_sessions: Vec<FocusWorkflow>,
}

/// Start (or restart) a focus session for a category
pub async fn start_session(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SessionContext>,
    Path(category): Path<String>,
) -> ApiResult<StartResponse> {
    let workflow = state.engine.create(&session.session_key, &category)?;

    Ok(ApiResponse::ok(StartResponse {
        session_id: session.session_key,
        question: workflow.questions[0].prompt.clone(),
        question_index: 0,
        total_questions: workflow.questions.len(),
        focus_session: workflow,
    }))
}

/// Answer one of the focus questions
pub async fn submit_answer(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SessionContext>,
    Path(category): Path<String>,
    ApiJson(req): ApiJson<AnswerRequest>,
) -> ApiResult<AnswerResponse> {
    let index = usize::try_from(req.question_index).map_err(|_| {
        ember_core::Error::invalid(format!(
            "question index {} out of range",
            req.question_index
        ))
    })?;

    let outcome = state
        .engine
        .submit_answer(&session.session_key, &category, index, &req.answer)
        .await?;

    let response = match outcome {
        AnswerOutcome::Next { next_question, .. } => AnswerResponse {
            response: ANSWER_ACK.to_string(),
            next_question: Some(next_question),
            is_complete: false,
            activities: None,
        },
        AnswerOutcome::Complete { activities, .. } => AnswerResponse {
            response: ANSWERS_DONE.to_string(),
            next_question: None,
            is_complete: true,
            activities: Some(activities),
        },
    };

    Ok(ApiResponse::ok(response))
}

/// Choose activities and close the focus session
pub async fn select_activities(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SessionContext>,
    Path(category): Path<String>,
    ApiJson(req): ApiJson<SelectActivitiesRequest>,
) -> ApiResult<SelectActivitiesResponse> {
    let (workflow, summary) = state
        .engine
        .complete_focus_session(&session.session_key, &category, req.selected_activities)
        .await?;

    Ok(ApiResponse::ok(SelectActivitiesResponse {
        summary,
        focus_session: workflow,
    }))
}

/// Weekly check-in question for a category
pub async fn check_in_prompt(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SessionContext>,
    Path(category): Path<String>,
) -> ApiResult<CheckInPromptResponse> {
    let question = state
        .engine
        .check_in_prompt(&session.session_key, &category)
        .await?;

    Ok(ApiResponse::ok(CheckInPromptResponse { question }))
}

/// Active focus sessions of the caller
pub async fn list_active(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SessionContext>,
) -> ApiResult<ActiveResponse> {
    let focus_sessions = state.engine.get_active(&session.session_key)?;
    Ok(ApiResponse::ok(ActiveResponse { focus_sessions }))
}
