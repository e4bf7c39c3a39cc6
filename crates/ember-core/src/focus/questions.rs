//! The fixed focus-session questionnaire and time-budget parsing.

use crate::types::{Question, QuestionKind};

/// Number of questions in every focus session.
pub const QUESTION_COUNT: usize = 3;

/// Build the questionnaire for a category: problem, obstacle, time.
pub fn build_questions(category: &str) -> Vec<Question> {
    [QuestionKind::Problem, QuestionKind::Obstacle, QuestionKind::Time]
        .into_iter()
        .map(|kind| Question {
            kind,
            prompt: prompt_for(kind, category),
            answer: None,
        })
        .collect()
}

fn prompt_for(kind: QuestionKind, category: &str) -> String {
    match kind {
        QuestionKind::Problem => format!(
            "What exactly is wrong in the \"{}\" area? Describe specifically what bothers you.",
            category
        ),
        QuestionKind::Obstacle => {
            "What kept you from solving these problems before? What obstacles do you see?"
                .to_string()
        }
        QuestionKind::Time => format!(
            "How much time would you like to spend on improving \"{}\" next week? (from 10 minutes to 84 hours)",
            category
        ),
    }
}

/// Derive a weekly time budget in minutes from a free-text answer.
///
/// The first run of ASCII digits is read as a number of hours. Returns `None`
/// when the answer has no digits or the value does not fit.
pub fn parse_time_budget(answer: &str) -> Option<u32> {
    let start = answer.find(|c: char| c.is_ascii_digit())?;
    let digits: &str = answer[start..]
        .split(|c: char| !c.is_ascii_digit())
        .next()?;

    let hours: u32 = digits.parse().ok()?;
    hours.checked_mul(60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_questions_order() {
        let questions = build_questions("Health");
        assert_eq!(questions.len(), QUESTION_COUNT);
        assert_eq!(questions[0].kind, QuestionKind::Problem);
        assert_eq!(questions[1].kind, QuestionKind::Obstacle);
        assert_eq!(questions[2].kind, QuestionKind::Time);
        assert!(questions.iter().all(|q| q.answer.is_none()));
    }

    #[test]
    fn test_prompts_mention_category() {
        let questions = build_questions("Finances");
        assert!(questions[0].prompt.contains("\"Finances\""));
        assert!(questions[2].prompt.contains("\"Finances\""));
    }

    #[test]
    fn test_parse_leading_number() {
        assert_eq!(parse_time_budget("3 hours a week"), Some(180));
        assert_eq!(parse_time_budget("2 hours"), Some(120));
    }

    #[test]
    fn test_parse_first_run_only() {
        assert_eq!(parse_time_budget("about 4 or 5 hours"), Some(240));
        assert_eq!(parse_time_budget("12h"), Some(720));
    }

    #[test]
    fn test_parse_zero_is_distinct_from_none() {
        assert_eq!(parse_time_budget("0 hours"), Some(0));
        assert_eq!(parse_time_budget("no time at all"), None);
        assert_eq!(parse_time_budget(""), None);
    }

    #[test]
    fn test_parse_overflow_is_none() {
        assert_eq!(parse_time_budget("99999999999 hours"), None);
        assert_eq!(parse_time_budget("71582789 hours"), None);
    }
}
