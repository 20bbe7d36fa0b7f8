//! Conversational layer: intent routing, meal logging, analytics and chat

pub mod chat;
pub mod dates;
pub mod intent;
pub mod logger;
pub mod sql;

pub use chat::{is_confirmation, ChatSession, LogState, Reply, MAX_HISTORY, WELCOME_MESSAGE};
pub use dates::{date_hints, resolve_phrase, DateRange};
pub use intent::{classify, classify_heuristic, Intent};
pub use logger::{MealEntry, MealLogger};
pub use sql::{AssistantResponse, SqlAssistant, SqlPlan, MAX_ROWS};

use thiserror::Error;

use crate::llm::LlmError;

#[derive(Debug, Error)]
pub enum AssistantError {
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("invalid meal entry: {0}")]
    InvalidEntry(String),

    #[error("the following required fields are missing: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    #[error("could not generate SQL: {0}")]
    SqlGeneration(String),

    #[error("could not run SQL: {0}")]
    SqlExecution(String),
}
