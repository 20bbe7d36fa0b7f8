//! Meal and nutrient records shared by the store, the assistant and the importer
//!
//! Field names match the SQLite column names exactly; generated SQL refers to
//! them by name, so renaming a field here is a schema change.

use rusqlite::types::Value as SqlValue;
use serde::{Deserialize, Serialize};

macro_rules! nutrient_fields {
    ($($field:ident),+ $(,)?) => {
        /// Nutrient columns of the `meals` table, in on-disk order.
        pub const NUTRIENT_COLUMNS: &[&str] = &[$(stringify!($field)),+];

        /// Per-meal nutrient values. Every field is independently optional.
        #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
        pub struct Nutrients {
            $(
                #[serde(default)]
                pub $field: Option<f64>,
            )+
        }

        impl Nutrients {
            /// Value of a nutrient column by name (`None` for null or unknown columns)
            pub fn get(&self, column: &str) -> Option<f64> {
                match column {
                    $(stringify!($field) => self.$field,)+
                    _ => None,
                }
            }

            /// Set a nutrient column by name. Returns false for unknown columns.
            pub fn set(&mut self, column: &str, value: Option<f64>) -> bool {
                match column {
                    $(stringify!($field) => {
                        self.$field = value;
                        true
                    })+
                    _ => false,
                }
            }

            /// Values in `NUTRIENT_COLUMNS` order
            pub fn values(&self) -> Vec<Option<f64>> {
                vec![$(self.$field),+]
            }
        }
    };
}

nutrient_fields!(
    // Macronutrients
    calories,
    carbohydrates,
    protein,
    fats,
    fiber,
    // Minerals
    iron,
    calcium,
    zinc,
    magnesium,
    // B vitamins
    b1,
    b2,
    b3,
    b5,
    b6,
    b9,
    b12,
    // Other micronutrients
    omega3,
    vitamin_a,
    vitamin_c,
    vitamin_e,
    vitamin_k,
);

/// Text columns of the `meals` table that precede the nutrients
pub const DESCRIPTIVE_COLUMNS: &[&str] = &[
    "date",
    "time",
    "meal_type",
    "meal_name",
    "meal_source",
    "food_description",
];

impl Nutrients {
    pub fn is_empty(&self) -> bool {
        self.values().iter().all(Option::is_none)
    }

    /// Column/value pairs for the nutrients that are present
    pub fn present(&self) -> Vec<(&'static str, f64)> {
        NUTRIENT_COLUMNS
            .iter()
            .zip(self.values())
            .filter_map(|(column, value)| value.map(|v| (*column, v)))
            .collect()
    }
}

/// A meal row before it has an id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewMeal {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub meal_type: Option<String>,
    #[serde(default)]
    pub meal_name: Option<String>,
    #[serde(default)]
    pub meal_source: Option<String>,
    #[serde(default)]
    pub food_description: Option<String>,
    #[serde(flatten)]
    pub nutrients: Nutrients,
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewMeal {
    /// Text column by name
    pub fn text(&self, column: &str) -> Option<&str> {
        match column {
            "date" => self.date.as_deref(),
            "time" => self.time.as_deref(),
            "meal_type" => self.meal_type.as_deref(),
            "meal_name" => self.meal_name.as_deref(),
            "meal_source" => self.meal_source.as_deref(),
            "food_description" => self.food_description.as_deref(),
            "notes" => self.notes.as_deref(),
            _ => None,
        }
    }

    /// Set a text column by name. Returns false for unknown columns.
    pub fn set_text(&mut self, column: &str, value: Option<String>) -> bool {
        let slot = match column {
            "date" => &mut self.date,
            "time" => &mut self.time,
            "meal_type" => &mut self.meal_type,
            "meal_name" => &mut self.meal_name,
            "meal_source" => &mut self.meal_source,
            "food_description" => &mut self.food_description,
            "notes" => &mut self.notes,
            _ => return false,
        };
        *slot = value;
        true
    }

    pub fn is_empty(&self) -> bool {
        DESCRIPTIVE_COLUMNS
            .iter()
            .chain(std::iter::once(&"notes"))
            .all(|c| self.text(c).is_none())
            && self.nutrients.is_empty()
    }

    /// Insert column names in on-disk order (everything except `id`)
    pub fn columns() -> Vec<&'static str> {
        DESCRIPTIVE_COLUMNS
            .iter()
            .chain(NUTRIENT_COLUMNS.iter())
            .chain(std::iter::once(&"notes"))
            .copied()
            .collect()
    }

    /// SQL values matching `NewMeal::columns()`; `None` becomes NULL
    pub fn sql_values(&self) -> Vec<SqlValue> {
        let mut values: Vec<SqlValue> = DESCRIPTIVE_COLUMNS
            .iter()
            .map(|c| SqlValue::from(self.text(c).map(str::to_string)))
            .collect();
        values.extend(self.nutrients.values().into_iter().map(SqlValue::from));
        values.push(SqlValue::from(self.notes.clone()));
        values
    }
}

/// A stored meal row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meal {
    pub id: i64,
    #[serde(flatten)]
    pub details: NewMeal,
}

/// A nutrient metadata row before it has an id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewNutrient {
    pub name: String,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub aliases: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub sources: Option<String>,
    #[serde(default)]
    pub rda: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutrientMetadata {
    pub id: i64,
    pub name: String,
    pub unit: Option<String>,
    pub aliases: Option<String>,
    pub description: Option<String>,
    pub sources: Option<String>,
    pub rda: Option<f64>,
}

impl NutrientMetadata {
    /// Aliases split on commas, trimmed, empty entries dropped
    pub fn alias_list(&self) -> Vec<&str> {
        self.aliases
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .collect()
    }

    /// Case-insensitive match against the name or any alias
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim();
        self.name.eq_ignore_ascii_case(query)
            || self.alias_list().iter().any(|a| a.eq_ignore_ascii_case(query))
    }
}

/// Nutrient sums over every meal logged on one date
#[derive(Debug, Clone, PartialEq)]
pub struct DailyTotals {
    pub date: String,
    pub meal_count: i64,
    pub nutrients: Nutrients,
}

/// Rows returned by an ad-hoc read-only query
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<serde_json::Value>>,
    /// More rows were available than the row cap allowed
    pub truncated: bool,
}

impl QueryResult {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows as JSON objects keyed by column name
    pub fn records(&self) -> Vec<serde_json::Map<String, serde_json::Value>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .cloned()
                    .zip(row.iter().cloned())
                    .collect()
            })
            .collect()
    }
}

/// Leading number of a free-text cell: "400 mg" -> 400, "2.5g" -> 2.5
pub fn leading_number(text: &str) -> Option<f64> {
    let text = text.trim();
    let end = text
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || c == '.' || (i == 0 && c == '-')))
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    text[..end].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nutrient_access_by_name() {
        let mut nutrients = Nutrients::default();
        assert!(nutrients.set("iron", Some(3.2)));
        assert!(nutrients.set("b12", Some(2.4)));
        assert!(!nutrients.set("sodium", Some(1.0)));

        assert_eq!(nutrients.get("iron"), Some(3.2));
        assert_eq!(nutrients.iron, Some(3.2));
        assert_eq!(nutrients.get("calcium"), None);
        assert_eq!(nutrients.present(), vec![("iron", 3.2), ("b12", 2.4)]);
    }

    #[test]
    fn test_column_order() {
        let columns = NewMeal::columns();
        assert_eq!(columns.len(), 28);
        assert_eq!(columns[0], "date");
        assert_eq!(columns[6], "calories");
        assert_eq!(columns[27], "notes");
        assert_eq!(NewMeal::default().sql_values().len(), columns.len());
    }

    #[test]
    fn test_empty_meal() {
        let mut meal = NewMeal::default();
        assert!(meal.is_empty());
        meal.nutrients.zinc = Some(1.0);
        assert!(!meal.is_empty());
    }

    #[test]
    fn test_leading_number() {
        assert_eq!(leading_number("400 mg"), Some(400.0));
        assert_eq!(leading_number("2.5g"), Some(2.5));
        assert_eq!(leading_number(" 12 "), Some(12.0));
        assert_eq!(leading_number("trace"), None);
        assert_eq!(leading_number(""), None);
    }

    #[test]
    fn test_nutrient_alias_match() {
        let meta = NutrientMetadata {
            id: 1,
            name: "b9".to_string(),
            unit: Some("mcg".to_string()),
            aliases: Some("folate, folic acid,".to_string()),
            description: None,
            sources: None,
            rda: Some(400.0),
        };
        assert_eq!(meta.alias_list(), vec!["folate", "folic acid"]);
        assert!(meta.matches("Folate"));
        assert!(meta.matches("B9"));
        assert!(!meta.matches("b12"));
    }
}
