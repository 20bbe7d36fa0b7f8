//! Turning a free-text meal description into a `meals` row

use anyhow::{bail, Result};
use chrono::{NaiveDateTime, NaiveTime};
use serde_json::{Map, Value};

use super::dates::{parse_iso, resolve_phrase};
use super::AssistantError;
use crate::llm::{extract_json, ChatMessage, ChatModel, ChatRequest};
use crate::model::{leading_number, NewMeal, DESCRIPTIVE_COLUMNS};
use crate::store::catalog::{self, MEAL_TYPES};
use crate::store::MealStore;

const DEFAULT_MEAL_SOURCE: &str = "Homemade";

/// A normalized row plus the model's one-sentence description of it
#[derive(Debug, Clone, PartialEq)]
pub struct MealEntry {
    pub meal: NewMeal,
    pub summary: String,
}

pub struct MealLogger<'a, M> {
    model: &'a M,
}

impl<'a, M: ChatModel> MealLogger<'a, M> {
    pub fn new(model: &'a M) -> Self {
        Self { model }
    }

    /// Follow-up question asked before estimating nutrients
    pub fn clarification_prompt() -> &'static str {
        "Happy to log that meal! Please share approximate quantities (cups, grams, Tbsp) \
         for each component, when you ate it, and whether it was breakfast, lunch, dinner, or a snack."
    }

    /// Ask the model for a complete row and normalize it
    pub async fn build_entry(
        &self,
        description: &str,
        details: &str,
        now: NaiveDateTime,
    ) -> Result<MealEntry, AssistantError> {
        let system = format!(
            "You are a meticulous vegan nutrition meal logging assistant. \
             Use nutrition knowledge to estimate macros and micronutrients in realistic quantities. \
             If data is missing, make a reasonable estimate but avoid impossible values. \
             Use ISO date format (YYYY-MM-DD) and 24h time (HH:MM:SS). \
             Allowed meal_type values: {}.\n\n\
             Today's date is {} and the current time is {}. \
             When the user mentions relative phrases like 'today', 'this morning', or 'yesterday', \
             resolve them using this reference.\n\n\
             Database schema:\n{}\n\
             Respond with JSON only.",
            MEAL_TYPES.join(", "),
            now.format("%Y-%m-%d"),
            now.format("%H:%M:%S"),
            catalog::schema_context(),
        );
        let user = format!(
            "A user wants to log a vegan meal. Craft a detailed meal entry using the database schema.\n\
             Original note:\n{}\n\n\
             Additional details:\n{}\n\n\
             Return JSON with two keys: `row` containing the column/value map, \
             and `summary` describing the meal in one sentence.",
            description.trim(),
            details.trim(),
        );

        let request = ChatRequest::new(vec![ChatMessage::system(system), ChatMessage::user(user)])
            .temperature(0.4)
            .max_tokens(600);
        let reply = self.model.complete(&request).await?;
        let data = extract_json(&reply)?;

        let row = match data.get("row") {
            Some(Value::Object(row)) => row,
            _ => {
                return Err(AssistantError::InvalidEntry(
                    "model did not return a row object".to_string(),
                ))
            }
        };

        let meal = normalize_row(row, now);
        let missing = missing_required(&meal);
        if !missing.is_empty() {
            return Err(AssistantError::MissingFields(missing));
        }

        let summary = data
            .get("summary")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or("Here are the meal details.")
            .to_string();

        tracing::info!(
            meal = meal.meal_name.as_deref().unwrap_or_default(),
            date = meal.date.as_deref().unwrap_or_default(),
            "prepared meal entry"
        );
        Ok(MealEntry { meal, summary })
    }
}

/// Persist a confirmed entry. Returns the new row id.
pub fn insert_entry(store: &MealStore, meal: &NewMeal) -> Result<i64> {
    if meal.is_empty() {
        bail!("Meal row is empty");
    }
    store.insert_meal(meal)
}

/// Coerce a model-produced column map into a meal row
///
/// Unknown keys are dropped. Null-like values count as missing. `date`,
/// `time` and `meal_source` fall back to defaults.
pub fn normalize_row(row: &Map<String, Value>, now: NaiveDateTime) -> NewMeal {
    let mut meal = NewMeal::default();

    for &column in DESCRIPTIVE_COLUMNS.iter().chain(std::iter::once(&"notes")) {
        let text = row.get(column).and_then(text_value);
        let text = match column {
            "date" => Some(normalize_date(text.as_deref(), now)),
            "time" => Some(normalize_time(text.as_deref(), now)),
            "meal_source" => text.or_else(|| Some(DEFAULT_MEAL_SOURCE.to_string())),
            "meal_type" => text.and_then(|t| match catalog::canonical_meal_type(&t) {
                Some(canonical) => Some(canonical.to_string()),
                None => {
                    tracing::warn!(meal_type = %t, "dropping unknown meal type");
                    None
                }
            }),
            _ => text,
        };
        meal.set_text(column, text);
    }

    for column in catalog::MEAL_COLUMNS.iter().filter(|c| c.is_numeric()) {
        let value = row.get(column.name).and_then(numeric_value);
        meal.nutrients.set(column.name, value);
    }

    meal
}

fn missing_required(meal: &NewMeal) -> Vec<String> {
    catalog::required_columns()
        .filter(|c| meal.text(c.name).is_none())
        .map(|c| c.name.to_string())
        .collect()
}

fn is_missing(text: &str) -> bool {
    let text = text.trim();
    text.is_empty() || text.eq_ignore_ascii_case("null") || text.eq_ignore_ascii_case("none")
}

fn text_value(value: &Value) -> Option<String> {
    let text = match value {
        Value::Null => return None,
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    };
    (!is_missing(&text)).then_some(text)
}

fn numeric_value(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) if !is_missing(s) => leading_number(s),
        _ => None,
    };
    number.filter(|n| n.is_finite())
}

fn normalize_date(value: Option<&str>, now: NaiveDateTime) -> String {
    let today = now.date();
    let date = match value {
        None => today,
        Some(text) => match parse_iso(text).or_else(|| resolve_phrase(text, today).map(|r| r.start)) {
            Some(date) => date,
            None => {
                tracing::warn!(date = %text, "unrecognised meal date, using today");
                today
            }
        },
    };
    date.format("%Y-%m-%d").to_string()
}

fn normalize_time(value: Option<&str>, now: NaiveDateTime) -> String {
    let parsed = value.and_then(|text| {
        let text = text.trim();
        ["%H:%M:%S", "%H:%M", "%I:%M %p", "%I:%M%p"]
            .iter()
            .find_map(|fmt| NaiveTime::parse_from_str(&text.to_uppercase(), fmt).ok())
    });
    if let (Some(text), None) = (value, parsed) {
        tracing::warn!(time = %text, "unrecognised meal time, using current time");
    }
    parsed.unwrap_or_else(|| now.time()).format("%H:%M:%S").to_string()
}

/// Multi-line preview of a row for confirmation prompts
pub fn describe_entry(meal: &NewMeal) -> String {
    let mut lines = vec![];
    for column in DESCRIPTIVE_COLUMNS {
        if let Some(value) = meal.text(column) {
            lines.push(format!("- {}: {}", column, value));
        }
    }
    for (column, value) in meal.nutrients.present() {
        match catalog::unit_of(column) {
            Some(unit) => lines.push(format!("- {}: {} {}", column, round(value), unit)),
            None => lines.push(format!("- {}: {}", column, round(value))),
        }
    }
    if let Some(notes) = meal.notes.as_deref() {
        lines.push(format!("- notes: {}", notes));
    }
    lines.join("\n")
}

fn round(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
