//! Multi-turn chat session
//!
//! Routes each message by intent and walks the meal logging dialogue:
//! description -> details -> confirmation.

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use std::path::Path;

use super::intent::{classify, Intent};
use super::logger::{describe_entry, insert_entry, MealEntry, MealLogger};
use super::sql::SqlAssistant;
use crate::llm::{ChatMessage, ChatModel, ChatRequest, Role, Sampling};
use crate::model::QueryResult;
use crate::profile::NutritionProfile;
use crate::store::{catalog, MealStore};

/// Messages kept in history (and sent as context)
pub const MAX_HISTORY: usize = 20;

pub const WELCOME_MESSAGE: &str = "Hi there! I'm your Vegan Nutritionist Assistant. \
Ask me about your meals, macros, or micronutrients and I'll help you analyze your nutrition data.";

const APOLOGY: &str = "I'm sorry, I encountered an error processing your request.";

const CONFIRM_WORDS: &[&str] = &["yes", "y", "confirm", "save"];

/// Where the meal logging dialogue stands
#[derive(Debug, Clone, Default, PartialEq)]
pub enum LogState {
    #[default]
    Idle,
    /// Asked for quantities and timing of `description`
    AwaitingDetails { description: String },
    /// Showed `entry` and asked whether to save it
    AwaitingConfirmation { entry: MealEntry },
}

/// Assistant reply for one user turn
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reply {
    pub text: String,
    pub result: Option<QueryResult>,
    pub sql: Option<String>,
    /// Id of a meal saved during this turn
    pub logged_id: Option<i64>,
}

impl Reply {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }
}

pub struct ChatSession<'a, M> {
    model: &'a M,
    store: &'a MealStore,
    profile: &'a NutritionProfile,
    sampling: Sampling,
    max_history: usize,
    max_rows: usize,
    history: Vec<ChatMessage>,
    state: LogState,
}

impl<'a, M: ChatModel> ChatSession<'a, M> {
    pub fn new(model: &'a M, store: &'a MealStore, profile: &'a NutritionProfile) -> Self {
        Self {
            model,
            store,
            profile,
            sampling: Sampling::default(),
            max_history: MAX_HISTORY,
            max_rows: super::sql::MAX_ROWS,
            history: vec![ChatMessage::assistant(WELCOME_MESSAGE)],
            state: LogState::Idle,
        }
    }

    pub fn with_sampling(mut self, sampling: Sampling) -> Self {
        self.sampling = sampling;
        self
    }

    pub fn with_max_history(mut self, max_history: usize) -> Self {
        self.max_history = max_history.max(1);
        self
    }

    pub fn with_max_rows(mut self, max_rows: usize) -> Self {
        self.max_rows = max_rows.max(1);
        self
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    pub fn state(&self) -> &LogState {
        &self.state
    }

    /// Forget the conversation and any half-finished meal
    pub fn clear(&mut self) {
        self.history = vec![ChatMessage::assistant(WELCOME_MESSAGE)];
        self.state = LogState::Idle;
    }

    pub async fn handle(&mut self, input: &str, now: NaiveDateTime) -> Reply {
        let input = input.trim();
        self.push(ChatMessage::user(input));

        let reply = match std::mem::take(&mut self.state) {
            LogState::AwaitingDetails { description } => {
                self.prepare_entry(&description, input, now).await
            }
            LogState::AwaitingConfirmation { entry } => self.confirm_entry(entry, input),
            LogState::Idle => match classify(self.model, input).await {
                Intent::LogMeal => {
                    self.state = LogState::AwaitingDetails {
                        description: input.to_string(),
                    };
                    Reply::text(MealLogger::<M>::clarification_prompt())
                }
                Intent::Query => self.answer_query(input, now).await,
                Intent::Chat => self.general_chat().await,
            },
        };

        self.push(ChatMessage::assistant(reply.text.clone()));
        reply
    }

    async fn prepare_entry(&mut self, description: &str, details: &str, now: NaiveDateTime) -> Reply {
        let logger = MealLogger::new(self.model);
        match logger.build_entry(description, details, now).await {
            Ok(entry) => {
                let text = format!(
                    "{}\n\n{}\n\nShould I save this meal? (yes/no)",
                    entry.summary,
                    describe_entry(&entry.meal)
                );
                self.state = LogState::AwaitingConfirmation { entry };
                Reply::text(text)
            }
            Err(e) => {
                tracing::warn!("meal entry failed: {}", e);
                Reply::text(format!("I couldn't prepare that meal entry: {}", e))
            }
        }
    }

    fn confirm_entry(&mut self, entry: MealEntry, answer: &str) -> Reply {
        if !is_confirmation(answer) {
            return Reply::text("Okay, I won't save that meal.");
        }

        match insert_entry(self.store, &entry.meal) {
            Ok(id) => Reply {
                text: format!(
                    "Saved {} (meal #{}).",
                    entry.meal.meal_name.as_deref().unwrap_or("the meal"),
                    id
                ),
                logged_id: Some(id),
                ..Reply::default()
            },
            Err(e) => {
                tracing::error!("failed to save meal: {:#}", e);
                Reply::text(format!("I couldn't save that meal: {:#}", e))
            }
        }
    }

    async fn answer_query(&self, question: &str, now: NaiveDateTime) -> Reply {
        let response = SqlAssistant::new(self.model, self.store, self.profile)
            .with_sampling(self.sampling)
            .with_max_rows(self.max_rows)
            .answer(question, now.date())
            .await;

        Reply {
            text: response.message,
            result: response.result,
            sql: response.sql,
            logged_id: None,
        }
    }

    async fn general_chat(&self) -> Reply {
        let system = format!(
            "{}\nYou help the user track a vegan diet. Meals are stored in SQLite.\n\
             Database schema:\n{}\n\
             Nutrition profile (YAML):\n{}",
            self.profile.system_prompt,
            catalog::schema_context(),
            self.profile.to_yaml(),
        );

        let mut messages = vec![ChatMessage::system(system)];
        messages.extend(
            self.history
                .iter()
                .filter(|m| m.role != Role::System)
                .cloned(),
        );

        let request = ChatRequest::new(messages).sampling(self.sampling);
        match self.model.complete(&request).await {
            Ok(text) => Reply::text(text),
            Err(e) => {
                tracing::error!("chat completion failed: {}", e);
                Reply::text(APOLOGY)
            }
        }
    }

    fn push(&mut self, message: ChatMessage) {
        self.history.push(message);
        if self.history.len() > self.max_history {
            let excess = self.history.len() - self.max_history;
            self.history.drain(..excess);
        }
    }

    /// Write the history as JSON
    pub fn save_history(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }
        let json = serde_json::to_string_pretty(&self.history)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write history {}", path.display()))?;
        Ok(())
    }

    /// Replace the history with a saved one; a missing file keeps the welcome message
    pub fn load_history(&mut self, path: &Path) -> Result<()> {
        if !path.exists() {
            return Ok(());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read history {}", path.display()))?;
        let messages: Vec<ChatMessage> = serde_json::from_str(&content)
            .with_context(|| format!("Invalid history {}", path.display()))?;

        self.history.clear();
        self.state = LogState::Idle;
        for message in messages {
            self.push(message);
        }
        if self.history.is_empty() {
            self.history.push(ChatMessage::assistant(WELCOME_MESSAGE));
        }
        tracing::debug!(messages = self.history.len(), "restored chat history");
        Ok(())
    }
}

/// Whether a reply accepts a proposed entry
pub fn is_confirmation(answer: &str) -> bool {
    let answer = answer
        .trim()
        .trim_end_matches(['.', '!'])
        .to_lowercase();
    CONFIRM_WORDS.contains(&answer.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::ScriptedModel;
    use crate::llm::LlmError;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 12, 12)
            .unwrap()
            .and_hms_opt(19, 30, 0)
            .unwrap()
    }

    const ENTRY: &str = r#"{"row": {"meal_type": "Dinner", "meal_name": "Chickpea curry",
        "food_description": "1 cup chickpeas, coconut milk, rice", "protein": 19, "iron": 4.7},
        "summary": "Chickpea curry with rice."}"#;

    #[test]
    fn test_confirmation_words() {
        assert!(is_confirmation("yes"));
        assert!(is_confirmation(" Y "));
        assert!(is_confirmation("Save!"));
        assert!(is_confirmation("confirm."));
        assert!(!is_confirmation("no"));
        assert!(!is_confirmation("yes but change the rice"));
    }

    #[tokio::test]
    async fn test_log_meal_dialogue() {
        let store = MealStore::open_in_memory().unwrap();
        let profile = NutritionProfile::default();
        let model = ScriptedModel::new([r#"{"intent": "log_meal"}"#, ENTRY]);
        let mut session = ChatSession::new(&model, &store, &profile);

        let reply = session.handle("I ate chickpea curry tonight", now()).await;
        assert!(reply.text.starts_with("Happy to log that meal!"));
        assert!(matches!(session.state(), LogState::AwaitingDetails { .. }));

        let reply = session.handle("1 cup chickpeas, half cup rice", now()).await;
        assert!(reply.text.contains("Chickpea curry with rice."));
        assert!(reply.text.contains("- iron: 4.7 mg"));
        assert!(matches!(session.state(), LogState::AwaitingConfirmation { .. }));

        let reply = session.handle("yes", now()).await;
        let id = reply.logged_id.unwrap();
        assert_eq!(session.state(), &LogState::Idle);

        let meal = store.get_meal(id).unwrap().unwrap();
        assert_eq!(meal.details.meal_name.as_deref(), Some("Chickpea curry"));
        assert_eq!(meal.details.date.as_deref(), Some("2024-12-12"));
        assert_eq!(meal.details.time.as_deref(), Some("19:30:00"));

        // The original description reaches the logger prompt
        assert!(model.requests()[1].messages[1]
            .content
            .contains("I ate chickpea curry tonight"));
    }

    #[tokio::test]
    async fn test_declined_entry_is_not_saved() {
        let store = MealStore::open_in_memory().unwrap();
        let profile = NutritionProfile::default();
        let model = ScriptedModel::new([r#"{"intent": "log_meal"}"#, ENTRY]);
        let mut session = ChatSession::new(&model, &store, &profile);

        session.handle("log my dinner", now()).await;
        session.handle("curry", now()).await;
        let reply = session.handle("no thanks", now()).await;

        assert_eq!(reply.text, "Okay, I won't save that meal.");
        assert!(reply.logged_id.is_none());
        assert!(store.list_meals(0, 10).unwrap().is_empty());
        assert_eq!(session.state(), &LogState::Idle);
    }

    #[tokio::test]
    async fn test_failed_entry_returns_to_idle() {
        let store = MealStore::open_in_memory().unwrap();
        let profile = NutritionProfile::default();
        let model = ScriptedModel::new([r#"{"intent": "log_meal"}"#, "not json at all"]);
        let mut session = ChatSession::new(&model, &store, &profile);

        session.handle("I had toast", now()).await;
        let reply = session.handle("two slices", now()).await;
        assert!(reply.text.starts_with("I couldn't prepare that meal entry"));
        assert_eq!(session.state(), &LogState::Idle);
    }

    #[tokio::test]
    async fn test_query_attaches_result() {
        let store = MealStore::open_in_memory().unwrap();
        let profile = NutritionProfile::default();
        let model = ScriptedModel::new([
            r#"{"intent": "query"}"#,
            r#"{"sql": "SELECT COUNT(*) AS meals FROM meals", "confidence": 0.8}"#,
            "You haven't logged any meals yet.",
        ]);
        let mut session = ChatSession::new(&model, &store, &profile);

        let reply = session.handle("How many meals have I logged?", now()).await;
        assert_eq!(reply.text, "You haven't logged any meals yet.");
        assert_eq!(reply.sql.as_deref(), Some("SELECT COUNT(*) AS meals FROM meals"));
        assert_eq!(reply.result.unwrap().rows, vec![vec![serde_json::json!(0)]]);
    }

    #[tokio::test]
    async fn test_general_chat_sends_history() {
        let store = MealStore::open_in_memory().unwrap();
        let profile = NutritionProfile::default();
        let model = ScriptedModel::new([
            r#"{"intent": "chat"}"#,
            "Tempeh is fermented soy.",
        ]);
        let mut session = ChatSession::new(&model, &store, &profile);

        let reply = session.handle("What is tempeh?", now()).await;
        assert_eq!(reply.text, "Tempeh is fermented soy.");

        let request = &model.requests()[1];
        assert!(request.messages[0].content.contains("Table `meals`"));
        assert_eq!(request.messages[1].content, WELCOME_MESSAGE);
        assert_eq!(request.messages[2].content, "What is tempeh?");
        assert_eq!(session.history().len(), 3);
    }

    #[tokio::test]
    async fn test_general_chat_error_apologizes() {
        let store = MealStore::open_in_memory().unwrap();
        let profile = NutritionProfile::default();
        let model = ScriptedModel::new([r#"{"intent": "chat"}"#]);
        model.push_error(LlmError::EmptyResponse);
        let mut session = ChatSession::new(&model, &store, &profile);

        let reply = session.handle("hello", now()).await;
        assert_eq!(reply.text, APOLOGY);
    }

    #[tokio::test]
    async fn test_history_is_capped() {
        let store = MealStore::open_in_memory().unwrap();
        let profile = NutritionProfile::default();
        let replies: Vec<String> = (0..6)
            .flat_map(|i| [r#"{"intent": "chat"}"#.to_string(), format!("reply {i}")])
            .collect();
        let model = ScriptedModel::new(replies);
        let mut session = ChatSession::new(&model, &store, &profile).with_max_history(4);

        for i in 0..6 {
            session.handle(&format!("message {i}"), now()).await;
        }
        let history = session.history();
        assert_eq!(history.len(), 4);
        assert_eq!(history[3].content, "reply 5");
        assert_eq!(history[0].content, "message 4");
    }

    #[tokio::test]
    async fn test_history_round_trip_and_clear() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("chat").join("history.json");
        let store = MealStore::open_in_memory().unwrap();
        let profile = NutritionProfile::default();
        let model = ScriptedModel::new([r#"{"intent": "chat"}"#, "Hi!"]);

        let mut session = ChatSession::new(&model, &store, &profile);
        session.handle("hello", now()).await;
        session.save_history(&path).unwrap();

        let mut restored = ChatSession::new(&model, &store, &profile);
        restored.load_history(&path).unwrap();
        assert_eq!(restored.history(), session.history());

        restored.clear();
        assert_eq!(restored.history().len(), 1);
        assert_eq!(restored.history()[0].content, WELCOME_MESSAGE);

        // Missing file leaves the session untouched
        restored.load_history(&dir.path().join("nope.json")).unwrap();
        assert_eq!(restored.history().len(), 1);
    }
}
