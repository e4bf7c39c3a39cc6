//! OpenAI-compatible chat completions generator.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{ActivityRequest, MAX_SUGGESTIONS, SuggestionGenerator};
use crate::error::{Error, Result};
use crate::types::{FocusWorkflow, WheelCategory, WheelData};

/// Default API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default chat model
pub const DEFAULT_MODEL: &str = "gpt-4";

const PERSONA: &str = "You are Ember, a caring AI that helps people restore the balance between \
work, themselves, relationships and rest. You do not treat or criticise; you gently guide and \
support.";

/// Configuration for [`OpenAiGenerator`].
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// API key; `None` makes every call fail with `Unconfigured`.
    pub api_key: Option<String>,
    /// Base URL of the chat completions API.
    pub base_url: String,
    /// Model name.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.7,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// Generator backed by an OpenAI-compatible HTTP API.
#[derive(Clone)]
pub struct OpenAiGenerator {
    config: GeneratorConfig,
    client: reqwest::Client,
}

impl OpenAiGenerator {
    /// Create a new generator
    pub fn new(config: GeneratorConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Other(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Whether an API key is present
    pub fn is_configured(&self) -> bool {
        self.config
            .api_key
            .as_deref()
            .is_some_and(|k| !k.trim().is_empty())
    }

    async fn complete(&self, user_prompt: &str, max_tokens: u32) -> Result<String> {
        let api_key = match self.config.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => key,
            _ => return Err(Error::Unconfigured("OPENAI_API_KEY is not set".to_string())),
        };

        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));
        let body = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: PERSONA,
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
            temperature: self.config.temperature,
            max_tokens,
        };

        debug!(model = %self.config.model, max_tokens, "Requesting chat completion");

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::generation(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!(status = %status, "Chat completion returned an error status");
            return Err(Error::generation(format!("HTTP {}: {}", status, text)));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::generation(format!("invalid response body: {}", e)))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Error::generation("response contained no choices"))
    }
}

/// Split a model reply into activity lines, stripping list markers.
pub fn parse_activity_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(strip_list_marker)
        .filter(|line| !line.is_empty())
        .take(MAX_SUGGESTIONS)
        .map(String::from)
        .collect()
}

fn strip_list_marker(line: &str) -> &str {
    let line = line.trim();
    let line = line.trim_start_matches(['-', '*', '•']).trim_start();
    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 {
        let rest = &line[digits..];
        if let Some(rest) = rest.strip_prefix('.').or_else(|| rest.strip_prefix(')')) {
            // "1. Walk" is a marker, "2.5 km run" is text
            if rest.starts_with(char::is_whitespace) {
                return rest.trim();
            }
        }
    }
    line.trim()
}

fn format_ratings(ratings: &[WheelCategory]) -> String {
    ratings
        .iter()
        .map(|c| format!("{}: {}/10", c.category, c.value))
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_wheel(wheel: &WheelData, separator: &str) -> String {
    wheel
        .categories
        .iter()
        .map(|c| format!("{}: {}/10", c.category, c.value))
        .collect::<Vec<_>>()
        .join(separator)
}

#[async_trait]
impl SuggestionGenerator for OpenAiGenerator {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn generate_activity_suggestions(
        &self,
        request: &ActivityRequest,
    ) -> Result<Vec<String>> {
        let prompt = format!(
            "The user wants to improve the \"{category}\" area and is ready to spend {minutes} minutes a week on it.\n\n\
             User context: {context}\n\n\
             Previous answers: {answers}\n\n\
             Suggest {count} concrete, doable activities that will help improve this area. The activities must be:\n\
             - Realistic for the given time\n\
             - Specific and measurable\n\
             - Suitable for the \"{category}\" area\n\
             - Varied (simple actions, psychological techniques, events)\n\n\
             Format: just a list of activities, one per line.",
            category = request.category,
            minutes = request.time_budget_minutes,
            context = request.user_context,
            answers = request.previous_answers.join(", "),
            count = MAX_SUGGESTIONS,
        );

        let content = self.complete(&prompt, 300).await?;
        Ok(parse_activity_lines(&content))
    }

    async fn generate_session_summary(
        &self,
        workflows: &[FocusWorkflow],
        wheel: &WheelData,
        completed_activities: bool,
    ) -> Result<String> {
        let sessions = workflows
            .iter()
            .map(|wf| {
                format!(
                    "{}: {}",
                    wf.category,
                    wf.selected_activities
                        .as_deref()
                        .unwrap_or_default()
                        .join(", ")
                )
            })
            .collect::<Vec<_>>()
            .join("; ");

        let prompt = format!(
            "The user finished a session of working on their life balance.\n\n\
             Focus sessions: {sessions}\n\n\
             Current wheel of balance: {wheel}\n\n\
             Did they complete what they planned: {completed}\n\n\
             Summarise the session (2-3 paragraphs) and write a supportive conclusion in the spirit of: \
             \"Great! You are already on your way. Let's check in a week from now and see how these \
             activities change your sense of inner balance and harmony.\"",
            sessions = sessions,
            wheel = format_wheel(wheel, ", "),
            completed = if completed_activities { "Yes" } else { "No" },
        );

        self.complete(&prompt, 400).await
    }

    async fn generate_check_in_prompt(
        &self,
        category: &str,
        selected_activities: &[String],
    ) -> Result<String> {
        let prompt = format!(
            "A week has passed since the user started working on the \"{category}\" area.\n\n\
             Planned activities: {activities}\n\n\
             Ask a caring question about their progress that helps them:\n\
             1. Assess whether they did what they planned\n\
             2. Re-rate the area (from 1 to 10)\n\
             3. Decide whether to keep working on this area\n\n\
             Be supportive and do not push.",
            category = category,
            activities = selected_activities.join(", "),
        );

        self.complete(&prompt, 200).await
    }

    async fn generate_report(&self, ratings: &[WheelCategory]) -> Result<String> {
        let prompt = format!(
            "Here are the user's ratings of their life areas:\n{ratings}\n\n\
             Write a caring report (2-3 paragraphs) and suggest first steps for improving the \
             weakest areas. Be empathetic and supportive.",
            ratings = format_ratings(ratings),
        );

        self.complete(&prompt, 500).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::WheelEntry;

    #[test]
    fn test_parse_activity_lines_strips_markers() {
        let content = "1. Walk daily\n2) Sleep early\n- Drink water\n\n* Stretch\n• Read\nCook";
        assert_eq!(
            parse_activity_lines(content),
            vec!["Walk daily", "Sleep early", "Drink water", "Stretch", "Read"]
        );
    }

    #[test]
    fn test_parse_activity_lines_keeps_leading_numbers_in_text() {
        assert_eq!(
            parse_activity_lines("10,000 steps a day"),
            vec!["10,000 steps a day"]
        );
    }

    #[test]
    fn test_parse_activity_lines_keeps_decimals() {
        assert_eq!(
            parse_activity_lines("2.5 km run every morning\n3) Stretch"),
            vec!["2.5 km run every morning", "Stretch"]
        );
    }

    #[test]
    fn test_format_ratings() {
        let ratings = vec![
            WheelCategory {
                category: "Health".to_string(),
                value: 4,
            },
            WheelCategory {
                category: "Work".to_string(),
                value: 8,
            },
        ];
        assert_eq!(format_ratings(&ratings), "Health: 4/10\nWork: 8/10");
    }

    #[test]
    fn test_format_wheel() {
        let wheel = WheelData {
            categories: vec![
                WheelEntry {
                    category: "Health".to_string(),
                    value: 4,
                    is_working_on: true,
                },
                WheelEntry {
                    category: "Work".to_string(),
                    value: 8,
                    is_working_on: false,
                },
            ],
        };
        assert_eq!(format_wheel(&wheel, ", "), "Health: 4/10, Work: 8/10");
    }

    #[test]
    fn test_chat_request_serialization() {
        let body = ChatRequest {
            model: "gpt-4",
            messages: vec![ChatMessage {
                role: "user",
                content: "hi",
            }],
            temperature: 0.5,
            max_tokens: 10,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "gpt-4");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["max_tokens"], 10);
    }

    #[tokio::test]
    async fn test_missing_key_is_unconfigured() {
        let generator = OpenAiGenerator::new(GeneratorConfig::default()).unwrap();
        assert!(!generator.is_configured());

        let err = generator
            .generate_check_in_prompt("Health", &[])
            .await
            .unwrap_err();
        assert!(err.is_unconfigured());
    }

    #[tokio::test]
    async fn test_blank_key_is_unconfigured() {
        let generator = OpenAiGenerator::new(GeneratorConfig {
            api_key: Some("   ".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert!(!generator.is_configured());
    }
}
