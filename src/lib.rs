pub mod assistant;
pub mod cli;
pub mod config;
pub mod import;
pub mod llm;
pub mod model;
pub mod profile;
pub mod store;

pub use assistant::{ChatSession, Intent, MealLogger, SqlAssistant};
pub use config::Config;
pub use llm::{ChatModel, OpenAiClient};
pub use profile::NutritionProfile;
pub use store::MealStore;
