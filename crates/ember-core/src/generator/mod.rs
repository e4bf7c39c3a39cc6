//! Suggestion generation boundary.
//!
//! The workflow engine asks a [`SuggestionGenerator`] for activity ideas,
//! session summaries and check-in prompts. Two implementations ship with the
//! crate:
//!
//! - [`CannedGenerator`]: deterministic offline responses, used in
//!   development mode and as the fallback when the real generator reports
//!   [`Error::Unconfigured`](crate::Error::Unconfigured).
//! - `OpenAiGenerator` (`client` feature): an OpenAI-compatible chat
//!   completions client.

mod canned;
#[cfg(feature = "client")]
mod openai;

pub use canned::*;
#[cfg(feature = "client")]
pub use openai::*;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{FocusWorkflow, WheelCategory, WheelData};

/// Maximum number of activity suggestions handed back to callers.
pub const MAX_SUGGESTIONS: usize = 5;

/// Weekly time budget assumed when the user gave no usable number.
pub const DEFAULT_TIME_BUDGET_MINUTES: u32 = 60;

/// Input for activity suggestion generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityRequest {
    pub category: String,
    pub time_budget_minutes: u32,
    pub user_context: String,
    pub previous_answers: Vec<String>,
}

/// Text generation backend used by the workflow engine.
#[async_trait]
pub trait SuggestionGenerator: Send + Sync {
    /// Short name for logs and health output.
    fn name(&self) -> &'static str;

    /// Candidate activities for improving a category.
    async fn generate_activity_suggestions(&self, request: &ActivityRequest)
    -> Result<Vec<String>>;

    /// Closing text for one or more focus sessions.
    async fn generate_session_summary(
        &self,
        workflows: &[FocusWorkflow],
        wheel: &WheelData,
        completed_activities: bool,
    ) -> Result<String>;

    /// The question asked at the weekly check-in.
    async fn generate_check_in_prompt(
        &self,
        category: &str,
        selected_activities: &[String],
    ) -> Result<String>;

    /// Balance report over the user's latest wheel ratings.
    async fn generate_report(&self, ratings: &[WheelCategory]) -> Result<String>;
}

/// Trim, drop blank entries and cap at [`MAX_SUGGESTIONS`].
pub fn normalize_suggestions(raw: Vec<String>) -> Vec<String> {
    raw.into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .take(MAX_SUGGESTIONS)
        .collect()
}
