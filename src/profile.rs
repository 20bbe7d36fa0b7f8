//! User nutrition profile (goals, preferences, system prompt)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a careful vegan nutrition analyst.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutritionProfile {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub goals: Vec<String>,

    #[serde(default)]
    pub preferences: Vec<String>,

    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// Personal daily targets keyed by nutrient column; override the RDA
    #[serde(default)]
    pub targets: BTreeMap<String, f64>,
}

fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.to_string()
}

impl Default for NutritionProfile {
    fn default() -> Self {
        Self {
            name: None,
            goals: vec![],
            preferences: vec![],
            system_prompt: default_system_prompt(),
            targets: BTreeMap::new(),
        }
    }
}

impl NutritionProfile {
    /// Load a profile; a missing file yields the default profile
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no nutrition profile, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read profile {}", path.display()))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("Invalid profile {}", path.display()))
    }

    /// YAML rendering for prompts
    pub fn to_yaml(&self) -> String {
        serde_yaml::to_string(self).unwrap_or_default()
    }

    pub fn target_for(&self, nutrient: &str) -> Option<f64> {
        self.targets.get(nutrient).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_default() {
        let profile = NutritionProfile::load(Path::new("/nonexistent/profile.yaml")).unwrap();
        assert_eq!(profile, NutritionProfile::default());
        assert_eq!(profile.system_prompt, DEFAULT_SYSTEM_PROMPT);
    }

    #[test]
    fn test_yaml_profile() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("profile.yaml");
        std::fs::write(
            &path,
            r#"
name: Sam
goals:
  - Reach 90 g protein per day
preferences:
  - Whole-food vegan
targets:
  protein: 90
  iron: 32
"#,
        )
        .unwrap();

        let profile = NutritionProfile::load(&path).unwrap();
        assert_eq!(profile.name.as_deref(), Some("Sam"));
        assert_eq!(profile.goals.len(), 1);
        assert_eq!(profile.target_for("protein"), Some(90.0));
        assert_eq!(profile.target_for("zinc"), None);
        assert_eq!(profile.system_prompt, DEFAULT_SYSTEM_PROMPT);

        let yaml = profile.to_yaml();
        assert!(yaml.contains("Reach 90 g protein per day"));
    }
}
