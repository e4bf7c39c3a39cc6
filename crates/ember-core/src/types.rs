//! Shared types for ember-core.
//!
//! These types are used by the workflow engine, the stores and the HTTP layer.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lowest rating a wheel category can hold.
pub const MIN_RATING: u8 = 1;
/// Highest rating a wheel category can hold.
pub const MAX_RATING: u8 = 10;
/// Rating reported for a category when no reading is known.
pub const NEUTRAL_RATING: u8 = 5;
/// Longest category name accepted, in characters.
pub const MAX_CATEGORY_LEN: usize = 64;

// ─────────────────────────────────────────────────────────────────────────────
// Workflow Types
// ─────────────────────────────────────────────────────────────────────────────

/// Kind of a focus-session question. The order of the variants is the order
/// the questions are asked in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionKind {
    /// What is wrong in this area of life.
    Problem,
    /// What kept the user from fixing it.
    Obstacle,
    /// How much time the user will spend on it next week.
    Time,
}

impl QuestionKind {
    /// Convert to string for storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionKind::Problem => "problem",
            QuestionKind::Obstacle => "obstacle",
            QuestionKind::Time => "time",
        }
    }
}

/// Workflow status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowStatus {
    Active,
    Completed,
    Paused,
}

impl WorkflowStatus {
    /// Convert to string for storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowStatus::Active => "active",
            WorkflowStatus::Completed => "completed",
            WorkflowStatus::Paused => "paused",
        }
    }

    /// Parse from string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(WorkflowStatus::Active),
            "completed" => Some(WorkflowStatus::Completed),
            "paused" => Some(WorkflowStatus::Paused),
            _ => None,
        }
    }
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One question of a focus session and the user's answer to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub kind: QuestionKind,
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
}

/// Store key of a workflow.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorkflowKey {
    pub session_key: String,
    pub category: String,
}

impl WorkflowKey {
    pub fn new(session_key: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            session_key: session_key.into(),
            category: category.into(),
        }
    }
}

impl fmt::Display for WorkflowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.session_key, self.category)
    }
}

/// A focus session: one guided flow for improving one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusWorkflow {
    pub session_key: String,
    pub category: String,
    pub questions: Vec<Question>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_budget_minutes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_activities: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_in_notes: Option<String>,
    pub status: WorkflowStatus,
    pub created_at: i64,
    pub updated_at: i64,
}

impl FocusWorkflow {
    /// Store key of this workflow
    pub fn key(&self) -> WorkflowKey {
        WorkflowKey::new(&self.session_key, &self.category)
    }

    /// Whether `index` addresses the final question
    pub fn is_last_question(&self, index: usize) -> bool {
        index + 1 == self.questions.len()
    }

    /// All non-empty answers in question order
    pub fn answers(&self) -> Vec<String> {
        self.questions
            .iter()
            .filter_map(|q| q.answer.as_deref())
            .filter(|a| !a.trim().is_empty())
            .map(String::from)
            .collect()
    }

    /// Mark the record as modified now
    pub fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().timestamp_millis();
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Wheel Types
// ─────────────────────────────────────────────────────────────────────────────

/// A self-assessed rating of one life-balance category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WheelCategory {
    pub category: String,
    pub value: u8,
}

/// A wheel entry as reported in session summaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WheelEntry {
    pub category: String,
    pub value: u8,
    pub is_working_on: bool,
}

/// The user's wheel of balance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WheelData {
    pub categories: Vec<WheelEntry>,
}

/// Read-only projection over all workflows of one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub session_key: String,
    pub focus_sessions: Vec<FocusWorkflow>,
    pub wheel_data: WheelData,
    pub last_check_in: i64,
}

/// Validate a wheel rating to the inclusive 1..=10 range.
pub fn validate_rating(value: i64) -> crate::Result<u8> {
    if (MIN_RATING as i64..=MAX_RATING as i64).contains(&value) {
        Ok(value as u8)
    } else {
        Err(crate::Error::invalid(format!(
            "rating must be between {} and {}, got {}",
            MIN_RATING, MAX_RATING, value
        )))
    }
}

/// Reject blank category names and names longer than [`MAX_CATEGORY_LEN`].
pub fn validate_category(category: &str) -> crate::Result<()> {
    if category.trim().is_empty() {
        return Err(crate::Error::invalid("category must not be empty"));
    }
    let len = category.chars().count();
    if len > MAX_CATEGORY_LEN {
        return Err(crate::Error::invalid(format!(
            "category must be at most {} characters, got {}",
            MAX_CATEGORY_LEN, len
        )));
    }
    Ok(())
}
