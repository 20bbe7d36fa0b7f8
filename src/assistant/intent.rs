//! Routing a user message to logging, analytics or small talk

use serde::{Deserialize, Serialize};

use crate::llm::{extract_json, ChatMessage, ChatModel, ChatRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// The user is describing something they ate or drank
    LogMeal,
    /// The user is asking about logged data
    Query,
    Chat,
}

impl Intent {
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "log_meal" | "log" | "meal" => Some(Intent::LogMeal),
            "query" | "question" | "analytics" => Some(Intent::Query),
            "chat" | "general" | "other" => Some(Intent::Chat),
            _ => None,
        }
    }
}

const CLASSIFIER_PROMPT: &str = "Classify the user's message for a vegan meal tracking assistant.\n\
Reply with JSON only: {\"intent\": \"log_meal\" | \"query\" | \"chat\"}.\n\
- log_meal: the user reports food or drink they ate and wants it recorded.\n\
- query: the user asks about their logged meals, nutrient totals, trends or comparisons.\n\
- chat: anything else, including general nutrition questions.";

/// Ask the model for the intent, falling back to keyword rules on any failure
pub async fn classify<M: ChatModel>(model: &M, message: &str) -> Intent {
    let request = ChatRequest::new(vec![
        ChatMessage::system(CLASSIFIER_PROMPT),
        ChatMessage::user(message.trim()),
    ])
    .temperature(0.0)
    .max_tokens(50)
    .top_p(1.0);

    let reply = match model.complete(&request).await {
        Ok(reply) => reply,
        Err(e) => {
            tracing::warn!("intent classification failed, using keyword rules: {}", e);
            return classify_heuristic(message);
        }
    };

    let label = extract_json(&reply)
        .ok()
        .and_then(|map| map.get("intent").and_then(|v| v.as_str()).map(str::to_string));

    match label.as_deref().and_then(Intent::from_label) {
        Some(intent) => {
            tracing::debug!(?intent, "classified message");
            intent
        }
        None => {
            tracing::warn!(reply = %reply, "unrecognised intent reply, using keyword rules");
            classify_heuristic(message)
        }
    }
}

const QUERY_CUES: &[&str] = &[
    "how much",
    "how many",
    "what did i",
    "did i eat",
    "did i have",
    "total",
    "average",
    "avg",
    "compare",
    "trend",
    "summary",
    "summarize",
    "show me",
    "list my",
    "last week",
    "this week",
    "last month",
    "per day",
    "daily",
    "most",
    "least",
];

const LOG_CUES: &[&str] = &[
    "i ate",
    "i had",
    "i just had",
    "i drank",
    "i've eaten",
    "ive eaten",
    "log ",
    "log:",
    "record ",
    "add a meal",
    "add meal",
    "for breakfast",
    "for lunch",
    "for dinner",
    "for a snack",
    "as a snack",
    "had for",
];

/// Keyword rules: analytic cues win over logging cues
pub fn classify_heuristic(message: &str) -> Intent {
    let text = format!("{} ", message.trim().to_lowercase());
    if QUERY_CUES.iter().any(|cue| text.contains(cue)) {
        Intent::Query
    } else if LOG_CUES.iter().any(|cue| text.contains(cue)) {
        Intent::LogMeal
    } else {
        Intent::Chat
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::ScriptedModel;
    use crate::llm::LlmError;

    #[test]
    fn test_from_label() {
        assert_eq!(Intent::from_label("log_meal"), Some(Intent::LogMeal));
        assert_eq!(Intent::from_label("Log Meal"), Some(Intent::LogMeal));
        assert_eq!(Intent::from_label("QUERY"), Some(Intent::Query));
        assert_eq!(Intent::from_label("chat"), Some(Intent::Chat));
        assert_eq!(Intent::from_label("dance"), None);
    }

    #[test]
    fn test_heuristic() {
        assert_eq!(
            classify_heuristic("I ate a tofu scramble with spinach"),
            Intent::LogMeal
        );
        assert_eq!(classify_heuristic("Log lentil soup for lunch"), Intent::LogMeal);
        assert_eq!(
            classify_heuristic("How much protein did I eat last week?"),
            Intent::Query
        );
        // Analytic cues take precedence
        assert_eq!(
            classify_heuristic("What did I have for lunch yesterday?"),
            Intent::Query
        );
        assert_eq!(classify_heuristic("Is tempeh fermented?"), Intent::Chat);
    }

    #[tokio::test]
    async fn test_classify_uses_model_reply() {
        let model = ScriptedModel::new(["```json\n{\"intent\": \"query\"}\n```"]);
        assert_eq!(classify(&model, "anything at all").await, Intent::Query);

        let requests = model.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].temperature, 0.0);
        assert_eq!(requests[0].messages[1].content, "anything at all");
    }

    #[tokio::test]
    async fn test_classify_falls_back_on_bad_reply() {
        let model = ScriptedModel::new(["I think this is about food"]);
        assert_eq!(classify(&model, "I ate two bananas").await, Intent::LogMeal);

        let model = ScriptedModel::new(Vec::<String>::new());
        model.push_error(LlmError::Request("timeout".into()));
        assert_eq!(classify(&model, "hello there").await, Intent::Chat);
    }
}
