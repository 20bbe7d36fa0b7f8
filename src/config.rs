//! Configuration management with YAML support

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub profile: ProfileConfig,

    #[serde(default)]
    pub chat: ChatConfig,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_path")]
    pub path: String,
}

/// Language model endpoint and sampling parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// OpenAI-compatible base URL (without `/chat/completions`)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_top_p")]
    pub top_p: f32,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Nutrition profile location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileConfig {
    #[serde(default = "default_profile_path")]
    pub path: String,
}

/// Chat session behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    #[serde(default = "default_max_history")]
    pub max_history: usize,

    /// Where chat history is persisted between runs (none = not persisted)
    #[serde(default)]
    pub history_path: Option<String>,

    /// Row cap for generated analytics queries
    #[serde(default = "default_max_rows")]
    pub max_rows: usize,
}

// Default value functions
fn default_database_path() -> String {
    "~/.local/share/nutrilog/nutrition.db".to_string()
}

fn default_base_url() -> String {
    "https://router.huggingface.co/v1".to_string()
}

fn default_model() -> String {
    "openai/gpt-oss-20b".to_string()
}

fn default_api_key_env() -> String {
    "HUGGINGFACE_API_KEY".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    1000
}

fn default_top_p() -> f32 {
    0.95
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_profile_path() -> String {
    "~/.config/nutrilog/profile.yaml".to_string()
}

fn default_max_history() -> usize {
    20
}

fn default_max_rows() -> usize {
    200
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            top_p: default_top_p(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            path: default_profile_path(),
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            max_history: default_max_history(),
            history_path: None,
            max_rows: default_max_rows(),
        }
    }
}

impl LlmConfig {
    /// API key from the configured environment variable, then OPENAI_API_KEY
    pub fn api_key(&self) -> Option<String> {
        [self.api_key_env.as_str(), "OPENAI_API_KEY"]
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .find(|k| !k.trim().is_empty())
    }
}

impl Config {
    /// Load configuration from a YAML file
    /// Searches in order:
    /// 1. Provided path
    /// 2. ./nutrilog.yaml (current directory)
    /// 3. ~/.config/nutrilog/nutrilog.yaml
    pub fn load(path: &str) -> Result<Self> {
        let search_paths = vec![
            expand(path),
            PathBuf::from("nutrilog.yaml"),
            expand("~/.config/nutrilog/nutrilog.yaml"),
        ];

        for search_path in &search_paths {
            if search_path.exists() {
                return Self::from_file(search_path);
            }
        }

        // No config file found, use defaults
        Ok(Config::default())
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Get the database path, expanding ~ to home directory
    pub fn database_path(&self) -> PathBuf {
        expand(&self.database.path)
    }

    pub fn profile_path(&self) -> PathBuf {
        expand(&self.profile.path)
    }

    pub fn history_path(&self) -> Option<PathBuf> {
        self.chat.history_path.as_deref().map(expand)
    }
}

fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).to_string())
}
