//! Column catalog for the `meals` table
//!
//! Describes each column for prompting the language model and drives the
//! meal logger's normalization (numeric vs text, required fields).

/// Meal types the logger accepts, in canonical spelling
pub const MEAL_TYPES: &[&str] = &["Breakfast", "Lunch", "Dinner", "Snack", "Drink"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Key,
    Text,
    Real,
}

#[derive(Debug, Clone, Copy)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub kind: ColumnKind,
    pub unit: Option<&'static str>,
    pub description: &'static str,
    pub allowed_values: &'static [&'static str],
    /// Must be present before a logged meal is saved
    pub required: bool,
}

impl ColumnSpec {
    const fn text(name: &'static str, description: &'static str, required: bool) -> Self {
        Self {
            name,
            kind: ColumnKind::Text,
            unit: None,
            description,
            allowed_values: &[],
            required,
        }
    }

    const fn real(name: &'static str, unit: &'static str, description: &'static str) -> Self {
        Self {
            name,
            kind: ColumnKind::Real,
            unit: Some(unit),
            description,
            allowed_values: &[],
            required: false,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.kind == ColumnKind::Real
    }

    pub fn sql_type(&self) -> &'static str {
        match self.kind {
            ColumnKind::Key => "INTEGER",
            ColumnKind::Text => "TEXT",
            ColumnKind::Real => "REAL",
        }
    }
}

pub const MEAL_COLUMNS: &[ColumnSpec] = &[
    ColumnSpec {
        name: "id",
        kind: ColumnKind::Key,
        unit: None,
        description: "Auto-incrementing meal id",
        allowed_values: &[],
        required: false,
    },
    ColumnSpec::text("date", "Date the meal was eaten, ISO YYYY-MM-DD", true),
    ColumnSpec::text("time", "Time the meal was eaten, 24h HH:MM:SS", true),
    ColumnSpec {
        name: "meal_type",
        kind: ColumnKind::Text,
        unit: None,
        description: "Kind of meal",
        allowed_values: MEAL_TYPES,
        required: true,
    },
    ColumnSpec::text("meal_name", "Short name of the meal", true),
    ColumnSpec::text(
        "meal_source",
        "Where the meal came from, e.g. Homemade or Restaurant",
        false,
    ),
    ColumnSpec::text(
        "food_description",
        "Natural-language description with quantities",
        false,
    ),
    ColumnSpec::real("calories", "kcal", "Energy"),
    ColumnSpec::real("carbohydrates", "g", "Total carbohydrates"),
    ColumnSpec::real("protein", "g", "Protein"),
    ColumnSpec::real("fats", "g", "Total fat"),
    ColumnSpec::real("fiber", "g", "Dietary fiber"),
    ColumnSpec::real("iron", "mg", "Iron"),
    ColumnSpec::real("calcium", "mg", "Calcium"),
    ColumnSpec::real("zinc", "mg", "Zinc"),
    ColumnSpec::real("magnesium", "mg", "Magnesium"),
    ColumnSpec::real("b1", "mg", "Vitamin B1 (thiamine)"),
    ColumnSpec::real("b2", "mg", "Vitamin B2 (riboflavin)"),
    ColumnSpec::real("b3", "mg", "Vitamin B3 (niacin)"),
    ColumnSpec::real("b5", "mg", "Vitamin B5 (pantothenic acid)"),
    ColumnSpec::real("b6", "mg", "Vitamin B6"),
    ColumnSpec::real("b9", "mcg", "Vitamin B9 (folate)"),
    ColumnSpec::real("b12", "mcg", "Vitamin B12"),
    ColumnSpec::real("omega3", "g", "Omega-3 fatty acids (ALA, EPA, DHA)"),
    ColumnSpec::real("vitamin_a", "mcg", "Vitamin A (RAE)"),
    ColumnSpec::real("vitamin_c", "mg", "Vitamin C"),
    ColumnSpec::real("vitamin_e", "mg", "Vitamin E"),
    ColumnSpec::real("vitamin_k", "mcg", "Vitamin K"),
    ColumnSpec::text("notes", "Free-text notes", false),
];

pub struct ExampleQuery {
    pub name: &'static str,
    pub sql: &'static str,
}

pub const EXAMPLE_QUERIES: &[ExampleQuery] = &[
    ExampleQuery {
        name: "Daily protein for a week",
        sql: "SELECT date, SUM(protein) AS total_protein_g FROM meals \
              WHERE date BETWEEN '2024-12-02' AND '2024-12-08' GROUP BY date ORDER BY date",
    },
    ExampleQuery {
        name: "Average calories per meal type",
        sql: "SELECT meal_type, ROUND(AVG(calories), 1) AS avg_calories FROM meals \
              GROUP BY meal_type",
    },
    ExampleQuery {
        name: "Meals eaten on one day",
        sql: "SELECT time, meal_type, meal_name, calories FROM meals \
              WHERE date = '2024-12-09' ORDER BY time",
    },
    ExampleQuery {
        name: "Iron intake against RDA",
        sql: "WITH daily AS (SELECT date, SUM(iron) AS iron_mg FROM meals GROUP BY date) \
              SELECT d.date, d.iron_mg, ROUND(100.0 * d.iron_mg / n.rda, 0) AS pct_rda \
              FROM daily d JOIN nutrient_metadata n ON n.name = 'iron' ORDER BY d.date",
    },
];

pub fn column(name: &str) -> Option<&'static ColumnSpec> {
    MEAL_COLUMNS.iter().find(|c| c.name == name)
}

pub fn unit_of(name: &str) -> Option<&'static str> {
    column(name).and_then(|c| c.unit)
}

pub fn required_columns() -> impl Iterator<Item = &'static ColumnSpec> {
    MEAL_COLUMNS.iter().filter(|c| c.required)
}

/// Canonical spelling of a meal type, matched case-insensitively
pub fn canonical_meal_type(value: &str) -> Option<&'static str> {
    let value = value.trim();
    MEAL_TYPES
        .iter()
        .copied()
        .find(|t| t.eq_ignore_ascii_case(value))
}

/// Human-readable schema description used in prompts
pub fn schema_context() -> String {
    let mut out = String::from(
        "Table `meals`: one row per logged meal. Nutrient columns may be NULL.\nColumns:\n",
    );
    for column in MEAL_COLUMNS {
        out.push_str(&format!("- {} ({})", column.name, column.sql_type()));
        if let Some(unit) = column.unit {
            out.push_str(&format!(" [{}]", unit));
        }
        out.push_str(&format!(" - {}", column.description));
        if !column.allowed_values.is_empty() {
            out.push_str(&format!(". Allowed: {}", column.allowed_values.join(", ")));
        }
        out.push('\n');
    }
    out.push_str(
        "Table `nutrient_metadata`: name (TEXT, unique, matches a meals column), unit, \
         aliases (comma-separated), description, sources, rda (REAL, recommended daily allowance).\n",
    );
    out
}

/// Example queries formatted as a bullet list
pub fn example_queries() -> String {
    EXAMPLE_QUERIES
        .iter()
        .map(|q| format!("- {}: {}", q.name, q.sql))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NewMeal, NUTRIENT_COLUMNS};

    #[test]
    fn test_catalog_matches_model_columns() {
        let catalog: Vec<&str> = MEAL_COLUMNS.iter().skip(1).map(|c| c.name).collect();
        assert_eq!(catalog, NewMeal::columns());
        for name in NUTRIENT_COLUMNS {
            assert!(column(name).unwrap().is_numeric(), "{} should be REAL", name);
        }
    }

    #[test]
    fn test_required_columns() {
        let required: Vec<&str> = required_columns().map(|c| c.name).collect();
        assert_eq!(required, vec!["date", "time", "meal_type", "meal_name"]);
    }

    #[test]
    fn test_canonical_meal_type() {
        assert_eq!(canonical_meal_type("breakfast"), Some("Breakfast"));
        assert_eq!(canonical_meal_type(" SNACK "), Some("Snack"));
        assert_eq!(canonical_meal_type("brunch"), None);
    }

    #[test]
    fn test_schema_context_lists_every_column() {
        let context = schema_context();
        for column in MEAL_COLUMNS {
            assert!(context.contains(&format!("- {} (", column.name)));
        }
        assert!(context.contains("Allowed: Breakfast, Lunch, Dinner, Snack, Drink"));
        assert!(context.contains("nutrient_metadata"));
    }
}
