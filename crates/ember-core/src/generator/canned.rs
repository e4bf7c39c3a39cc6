//! Offline generator with fixed responses.

use async_trait::async_trait;

use super::{ActivityRequest, MAX_SUGGESTIONS, SuggestionGenerator};
use crate::error::Result;
use crate::types::{FocusWorkflow, WheelCategory, WheelData};

/// Closing text used when no language model is available.
pub const CANNED_SUMMARY: &str = "Great! You are already on your way. Let's check in a week from now \
and see how these activities change your sense of inner balance and harmony.";

const GENERIC_ACTIVITIES: [&str; 5] = [
    "Spend some time alone with yourself",
    "Try something new",
    "Do something nice for yourself",
    "Practice mindfulness",
    "Thank yourself for the effort",
];

/// Deterministic generator for development mode and degraded operation.
#[derive(Debug, Clone, Copy, Default)]
pub struct CannedGenerator;

impl CannedGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Built-in activities for the well-known wheel categories.
    pub fn activities_for(category: &str) -> &'static [&'static str] {
        match category {
            "Health" => &[
                "Walk 10,000 steps a day",
                "Drink 8 glasses of water",
                "Do a 20-minute workout",
                "Cook a healthy breakfast",
                "Book a medical check-up",
            ],
            "Work" => &[
                "Plan the week ahead",
                "Learn a new technology",
                "Network with colleagues",
                "Tidy up your workspace",
                "Take an online course",
            ],
            "Family & Relationships" => &[
                "Spend an evening without your phone",
                "Plan a family dinner",
                "Give a loved one a compliment",
                "Do something nice for your partner",
                "Talk about plans for the future",
            ],
            "Friends & Social Life" => &[
                "Message a friend",
                "Plan a get-together",
                "Join a hobby club",
                "Call an old friend",
                "Host a party",
            ],
            "Rest & Recovery" => &[
                "Take a hot bath",
                "Read a book",
                "Listen to music",
                "Walk in the park",
                "Meditate for 10 minutes",
            ],
            "Self-Perception" => &[
                "Write down 3 things you are grateful for",
                "Do something just for yourself",
                "Practice self-compassion",
                "Keep a journal",
                "Try a new hobby",
            ],
            "Hobbies" => &[
                "Start drawing",
                "Learn a new language",
                "Put together a puzzle",
                "Try cooking something new",
                "Start a collection",
            ],
            "Finances" => &[
                "Draw up a budget",
                "Set aside 10% of your income",
                "Read up on investing",
                "Pay down a debt",
                "Build an emergency fund",
            ],
            _ => &GENERIC_ACTIVITIES,
        }
    }
}

#[async_trait]
impl SuggestionGenerator for CannedGenerator {
    fn name(&self) -> &'static str {
        "canned"
    }

    async fn generate_activity_suggestions(
        &self,
        request: &ActivityRequest,
    ) -> Result<Vec<String>> {
        Ok(Self::activities_for(&request.category)
            .iter()
            .take(MAX_SUGGESTIONS)
            .map(|s| s.to_string())
            .collect())
    }

    async fn generate_session_summary(
        &self,
        _workflows: &[FocusWorkflow],
        _wheel: &WheelData,
        _completed_activities: bool,
    ) -> Result<String> {
        Ok(CANNED_SUMMARY.to_string())
    }

    async fn generate_check_in_prompt(
        &self,
        category: &str,
        _selected_activities: &[String],
    ) -> Result<String> {
        Ok(format!(
            "Hi! It has been a week since you decided to work on \"{}\". Did you manage to do \
             the activities you planned? How would you rate this area from 1 to 10 now?",
            category
        ))
    }

    async fn generate_report(&self, ratings: &[WheelCategory]) -> Result<String> {
        let Some(weakest) = ratings.iter().min_by_key(|r| r.value) else {
            return Ok("Fill in your wheel of balance to get a report.".to_string());
        };

        Ok(format!(
            "Thank you for rating {} areas of your life. The area that needs the most care right \
             now is \"{}\" ({}/10). Start small: pick one simple activity for this area and give it \
             a few minutes this week.",
            ratings.len(),
            weakest.category,
            weakest.value
        ))
    }
}
