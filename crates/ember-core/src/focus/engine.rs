//! Focus-session workflow engine.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::locks::KeyLocks;
use super::questions::{build_questions, parse_time_budget};
use crate::error::{Error, Result};
use crate::generator::{
    ActivityRequest, CannedGenerator, DEFAULT_TIME_BUDGET_MINUTES, SuggestionGenerator,
    normalize_suggestions,
};
use crate::rating::RatingSource;
use crate::store::SessionStore;
use crate::types::{
    FocusWorkflow, NEUTRAL_RATING, QuestionKind, SessionSummary, WheelCategory, WheelData,
    WheelEntry, WorkflowKey, WorkflowStatus, validate_category, validate_rating,
};

/// Message returned when the user keeps working on a category.
pub const NEXT_STEPS_CONTINUE: &str = "Let's keep working on this area!";
/// Message returned when the user closes a category.
pub const NEXT_STEPS_DONE: &str = "Great! Maybe you would like to pick another area to work on?";

/// Result of submitting an answer through [`FocusEngine::submit_answer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerOutcome {
    /// More questions remain.
    Next {
        workflow: FocusWorkflow,
        next_question: String,
    },
    /// The last question was answered; suggestions were generated.
    Complete {
        workflow: FocusWorkflow,
        activities: Vec<String>,
    },
}

/// A weekly check-in report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckIn {
    pub completed_activities: bool,
    pub new_rating: i64,
    pub continue_working: bool,
    pub notes: Option<String>,
}

/// Result of [`FocusEngine::check_in`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckInOutcome {
    pub summary: SessionSummary,
    pub summary_text: String,
    pub next_steps: String,
}

/// Result of [`FocusEngine::report`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceReport {
    pub summary: String,
    pub ratings: Vec<WheelCategory>,
}

/// Counts from one eviction pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvictionStats {
    pub workflows: usize,
    pub rated_sessions: usize,
}

/// Drives focus sessions through their lifecycle.
///
/// Every mutation runs as get → modify → put under a per-(session, category)
/// lock. Generator calls are made outside the lock.
pub struct FocusEngine {
    store: Arc<dyn SessionStore>,
    ratings: Arc<dyn RatingSource>,
    generator: Arc<dyn SuggestionGenerator>,
    fallback: CannedGenerator,
    locks: KeyLocks,
}

impl FocusEngine {
    /// Create a new engine
    pub fn new(
        store: Arc<dyn SessionStore>,
        ratings: Arc<dyn RatingSource>,
        generator: Arc<dyn SuggestionGenerator>,
    ) -> Self {
        Self {
            store,
            ratings,
            generator,
            fallback: CannedGenerator::new(),
            locks: KeyLocks::new(),
        }
    }

    /// The underlying session store
    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    /// Name of the configured generator
    pub fn generator_name(&self) -> &'static str {
        self.generator.name()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Workflow Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Start a focus session, replacing any existing one for the pair.
    pub fn create(&self, session_key: &str, category: &str) -> Result<FocusWorkflow> {
        validate_category(category)?;

        let key = WorkflowKey::new(session_key, category);
        self.locks.with_lock(&key, || {
            if let Some(previous) = self.store.get(&key)? {
                info!(
                    session_key = %session_key,
                    category = %category,
                    previous_status = %previous.status,
                    answered = previous.answers().len(),
                    "Restarting focus session, previous answers discarded"
                );
            }

            let now = chrono::Utc::now().timestamp_millis();
            let workflow = FocusWorkflow {
                session_key: session_key.to_string(),
                category: category.to_string(),
                questions: build_questions(category),
                time_budget_minutes: None,
                selected_activities: None,
                check_in_notes: None,
                status: WorkflowStatus::Active,
                created_at: now,
                updated_at: now,
            };

            self.store.put(workflow.clone())?;
            info!(session_key = %session_key, category = %category, "Focus session started");
            Ok(workflow)
        })
    }

    /// Get the workflow for a pair
    pub fn get(&self, session_key: &str, category: &str) -> Result<Option<FocusWorkflow>> {
        self.store.get(&WorkflowKey::new(session_key, category))
    }

    /// Record an answer. Answering the time question re-derives the budget.
    pub fn answer_question(
        &self,
        session_key: &str,
        category: &str,
        index: usize,
        text: &str,
    ) -> Result<FocusWorkflow> {
        self.update(session_key, category, |wf| {
            let count = wf.questions.len();
            let question = wf.questions.get_mut(index).ok_or_else(|| {
                Error::invalid(format!(
                    "question index {} out of range (session has {} questions)",
                    index, count
                ))
            })?;

            question.answer = Some(text.to_string());
            if question.kind == QuestionKind::Time {
                wf.time_budget_minutes = parse_time_budget(text);
            }

            debug!(
                session_key = %session_key,
                category = %category,
                index,
                time_budget_minutes = ?wf.time_budget_minutes,
                "Answer recorded"
            );
            Ok(())
        })
    }

    /// All active workflows of a session
    pub fn get_active(&self, session_key: &str) -> Result<Vec<FocusWorkflow>> {
        let mut active: Vec<FocusWorkflow> = self
            .store
            .list_by_session(session_key)?
            .into_iter()
            .filter(|wf| wf.status == WorkflowStatus::Active)
            .collect();
        sort_workflows(&mut active);
        Ok(active)
    }

    /// Store the chosen activities and complete the workflow.
    pub fn select_activities(
        &self,
        session_key: &str,
        category: &str,
        chosen: Vec<String>,
    ) -> Result<FocusWorkflow> {
        let workflow = self.update(session_key, category, move |wf| {
            wf.selected_activities = Some(chosen);
            wf.status = WorkflowStatus::Completed;
            Ok(())
        })?;

        info!(
            session_key = %session_key,
            category = %category,
            activities = workflow.selected_activities.as_ref().map_or(0, Vec::len),
            "Activities selected, focus session completed"
        );
        Ok(workflow)
    }

    /// Reconcile a weekly check-in.
    ///
    /// `continue_working` reopens the workflow, otherwise it is completed. The
    /// new rating becomes the latest known rating of the category.
    pub fn submit_weekly_check_in(
        &self,
        session_key: &str,
        category: &str,
        check_in: &CheckIn,
    ) -> Result<SessionSummary> {
        let rating = validate_rating(check_in.new_rating)?;

        let notes = check_in.notes.clone();
        let continue_working = check_in.continue_working;
        let ratings = &self.ratings;
        // Rating and status change under the same key lock
        let workflow = self.update(session_key, category, move |wf| {
            ratings.record_ratings(
                session_key,
                &[WheelCategory {
                    category: category.to_string(),
                    value: rating,
                }],
            )?;

            wf.status = if continue_working {
                WorkflowStatus::Active
            } else {
                WorkflowStatus::Completed
            };
            if notes.is_some() {
                wf.check_in_notes = notes;
            }
            Ok(())
        })?;

        info!(
            session_key = %session_key,
            category = %category,
            rating,
            continue_working,
            completed_activities = check_in.completed_activities,
            "Weekly check-in recorded"
        );

        Ok(SessionSummary {
            session_key: session_key.to_string(),
            focus_sessions: vec![workflow],
            wheel_data: WheelData {
                categories: vec![WheelEntry {
                    category: category.to_string(),
                    value: rating,
                    is_working_on: continue_working,
                }],
            },
            last_check_in: chrono::Utc::now().timestamp_millis(),
        })
    }

    /// Project all workflows of a session into a summary.
    ///
    /// Returns `None` when the session has no workflows.
    pub fn get_session_summary(&self, session_key: &str) -> Result<Option<SessionSummary>> {
        let mut workflows = self.store.list_by_session(session_key)?;
        if workflows.is_empty() {
            return Ok(None);
        }
        sort_workflows(&mut workflows);

        let ratings: HashMap<String, u8> = self
            .ratings
            .latest_ratings(session_key)?
            .into_iter()
            .map(|r| (r.category, r.value))
            .collect();

        let categories = workflows
            .iter()
            .map(|wf| WheelEntry {
                category: wf.category.clone(),
                value: ratings.get(&wf.category).copied().unwrap_or(NEUTRAL_RATING),
                is_working_on: wf.status == WorkflowStatus::Active,
            })
            .collect();

        Ok(Some(SessionSummary {
            session_key: session_key.to_string(),
            focus_sessions: workflows,
            wheel_data: WheelData { categories },
            last_check_in: chrono::Utc::now().timestamp_millis(),
        }))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Wheel Ratings
    // ─────────────────────────────────────────────────────────────────────────

    /// Record the user's wheel ratings
    pub fn submit_wheel(&self, session_key: &str, categories: &[WheelCategory]) -> Result<()> {
        self.ratings.record_ratings(session_key, categories)?;
        info!(session_key = %session_key, count = categories.len(), "Wheel ratings saved");
        Ok(())
    }

    /// Latest ratings of a session
    pub fn latest_ratings(&self, session_key: &str) -> Result<Vec<WheelCategory>> {
        self.ratings.latest_ratings(session_key)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Generation
    // ─────────────────────────────────────────────────────────────────────────

    /// Ask the generator for at most five activities.
    ///
    /// An unset time budget is sent as [`DEFAULT_TIME_BUDGET_MINUTES`].
    pub async fn generate_activity_suggestions(
        &self,
        category: &str,
        time_budget_minutes: Option<u32>,
        user_context: &str,
        previous_answers: Vec<String>,
    ) -> Result<Vec<String>> {
        let request = ActivityRequest {
            category: category.to_string(),
            time_budget_minutes: time_budget_minutes.unwrap_or(DEFAULT_TIME_BUDGET_MINUTES),
            user_context: user_context.to_string(),
            previous_answers,
        };

        let raw = match self.generator.generate_activity_suggestions(&request).await {
            Ok(raw) => raw,
            Err(e) if e.is_unconfigured() => {
                warn!(error = %e, "Generator unconfigured, using canned activities");
                self.fallback.generate_activity_suggestions(&request).await?
            }
            Err(e) => return Err(e),
        };

        Ok(normalize_suggestions(raw))
    }

    async fn session_summary_text(
        &self,
        workflows: &[FocusWorkflow],
        wheel: &WheelData,
        completed_activities: bool,
    ) -> Result<String> {
        match self
            .generator
            .generate_session_summary(workflows, wheel, completed_activities)
            .await
        {
            Ok(text) => Ok(text),
            Err(e) if e.is_unconfigured() => {
                warn!(error = %e, "Generator unconfigured, using canned summary");
                self.fallback
                    .generate_session_summary(workflows, wheel, completed_activities)
                    .await
            }
            Err(e) => Err(e),
        }
    }

    /// Answer a question and either return the next prompt or, after the last
    /// question, the generated activity suggestions.
    pub async fn submit_answer(
        &self,
        session_key: &str,
        category: &str,
        index: usize,
        text: &str,
    ) -> Result<AnswerOutcome> {
        let workflow = self.answer_question(session_key, category, index, text)?;

        if workflow.is_last_question(index) {
            let activities = self
                .generate_activity_suggestions(
                    category,
                    workflow.time_budget_minutes,
                    text,
                    workflow.answers(),
                )
                .await?;
            return Ok(AnswerOutcome::Complete {
                workflow,
                activities,
            });
        }

        let next_question = workflow.questions[index + 1].prompt.clone();
        Ok(AnswerOutcome::Next {
            workflow,
            next_question,
        })
    }

    /// Select activities and produce the closing summary text.
    pub async fn complete_focus_session(
        &self,
        session_key: &str,
        category: &str,
        chosen: Vec<String>,
    ) -> Result<(FocusWorkflow, String)> {
        let workflow = self.select_activities(session_key, category, chosen)?;
        let wheel = self
            .get_session_summary(session_key)?
            .map(|s| s.wheel_data)
            .unwrap_or_default();

        let text = self
            .session_summary_text(std::slice::from_ref(&workflow), &wheel, false)
            .await?;
        Ok((workflow, text))
    }

    /// Reconcile a check-in and produce the summary text and next steps.
    pub async fn check_in(
        &self,
        session_key: &str,
        category: &str,
        check_in: &CheckIn,
    ) -> Result<CheckInOutcome> {
        let summary = self.submit_weekly_check_in(session_key, category, check_in)?;
        let summary_text = self
            .session_summary_text(
                &summary.focus_sessions,
                &summary.wheel_data,
                check_in.completed_activities,
            )
            .await?;

        let next_steps = if check_in.continue_working {
            NEXT_STEPS_CONTINUE
        } else {
            NEXT_STEPS_DONE
        };

        Ok(CheckInOutcome {
            summary,
            summary_text,
            next_steps: next_steps.to_string(),
        })
    }

    /// The weekly check-in question for a workflow.
    pub async fn check_in_prompt(&self, session_key: &str, category: &str) -> Result<String> {
        let workflow = self
            .get(session_key, category)?
            .ok_or_else(|| Error::not_found(session_key, category))?;
        let activities = workflow.selected_activities.unwrap_or_default();

        match self
            .generator
            .generate_check_in_prompt(category, &activities)
            .await
        {
            Ok(text) => Ok(text),
            Err(e) if e.is_unconfigured() => {
                warn!(error = %e, "Generator unconfigured, using canned check-in prompt");
                self.fallback
                    .generate_check_in_prompt(category, &activities)
                    .await
            }
            Err(e) => Err(e),
        }
    }

    /// Balance report over the latest wheel ratings of a session.
    ///
    /// Returns `None` when the session has rated nothing.
    pub async fn report(&self, session_key: &str) -> Result<Option<BalanceReport>> {
        let ratings = self.latest_ratings(session_key)?;
        if ratings.is_empty() {
            return Ok(None);
        }

        let summary = match self.generator.generate_report(&ratings).await {
            Ok(text) => text,
            Err(e) if e.is_unconfigured() => {
                warn!(error = %e, "Generator unconfigured, using canned report");
                self.fallback.generate_report(&ratings).await?
            }
            Err(e) => return Err(e),
        };

        debug!(session_key = %session_key, categories = ratings.len(), "Balance report generated");
        Ok(Some(BalanceReport { summary, ratings }))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Maintenance
    // ─────────────────────────────────────────────────────────────────────────

    /// Drop expired workflows and ratings.
    pub fn evict_expired(&self) -> Result<EvictionStats> {
        let now = chrono::Utc::now().timestamp_millis();
        let stats = EvictionStats {
            workflows: self.store.evict_expired(now)?,
            rated_sessions: self.ratings.evict_expired(now)?,
        };

        if stats.workflows > 0 || stats.rated_sessions > 0 {
            info!(
                workflows = stats.workflows,
                rated_sessions = stats.rated_sessions,
                "Evicted expired focus sessions"
            );
        }
        Ok(stats)
    }

    fn update<F>(&self, session_key: &str, category: &str, mutate: F) -> Result<FocusWorkflow>
    where
        F: FnOnce(&mut FocusWorkflow) -> Result<()>,
    {
        let key = WorkflowKey::new(session_key, category);
        self.locks.with_lock(&key, || {
            let mut workflow = self
                .store
                .get(&key)?
                .ok_or_else(|| Error::not_found(session_key, category))?;

            mutate(&mut workflow)?;
            workflow.touch();
            self.store.put(workflow.clone())?;
            Ok(workflow)
        })
    }
}

fn sort_workflows(workflows: &mut [FocusWorkflow]) {
    workflows.sort_by(|a, b| {
        a.created_at
            .cmp(&b.created_at)
            .then_with(|| a.category.cmp(&b.category))
    });
}
