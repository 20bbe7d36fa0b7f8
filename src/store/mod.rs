//! Meal log and nutrient metadata storage with SQLite
//!
//! The store owns a single connection. It exposes inserts and read paths
//! only; updating or deleting individual meals is left to callers with
//! direct SQL access.

pub mod catalog;
pub mod reference;
mod schema;

use anyhow::{Context, Result};
use rusqlite::types::ValueRef;
use rusqlite::{params, params_from_iter, Connection, Row, ToSql};
use std::path::Path;
use thiserror::Error;

use crate::model::{
    DailyTotals, Meal, NewMeal, NewNutrient, NutrientMetadata, Nutrients, QueryResult,
    NUTRIENT_COLUMNS,
};

pub use schema::SCHEMA;

/// Upper bound on page size for meal listings
pub const MAX_PAGE_SIZE: usize = 1000;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("only read-only queries are allowed")]
    NotReadOnly,

    #[error("only a single SQL statement is allowed")]
    MultipleStatements,

    #[error("query is empty")]
    EmptyQuery,
}

pub struct MealStore {
    conn: Connection,
}

impl MealStore {
    pub fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database {}", path.display()))?;
        let store = Self { conn };
        store.init_schema()?;
        tracing::debug!(path = %path.display(), "opened meal store");
        Ok(store)
    }

    /// Open an in-memory database (for tests)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn
            .execute_batch(SCHEMA)
            .context("Failed to apply schema")?;
        Ok(())
    }

    // ============================================
    // MEALS
    // ============================================

    /// Insert a meal; absent fields are stored as NULL. Returns the new id.
    pub fn insert_meal(&self, meal: &NewMeal) -> Result<i64> {
        self.conn
            .execute(&insert_meal_sql(), params_from_iter(meal.sql_values()))
            .context("Failed to insert meal")?;
        let id = self.conn.last_insert_rowid();
        tracing::info!(id, name = meal.meal_name.as_deref().unwrap_or("-"), "meal logged");
        Ok(id)
    }

    /// Insert many meals in one transaction, optionally clearing the table first
    pub fn insert_meals(&mut self, meals: &[NewMeal], replace: bool) -> Result<usize> {
        let tx = self.conn.transaction()?;

        if replace {
            let cleared = tx.execute("DELETE FROM meals", [])?;
            tracing::info!(cleared, "cleared existing meals");
        }

        {
            let mut stmt = tx.prepare(&insert_meal_sql())?;
            for meal in meals {
                stmt.execute(params_from_iter(meal.sql_values()))
                    .with_context(|| {
                        format!(
                            "Failed to insert meal '{}'",
                            meal.meal_name.as_deref().unwrap_or("-")
                        )
                    })?;
            }
        }

        tx.commit()?;
        Ok(meals.len())
    }

    pub fn clear_meals(&self) -> Result<usize> {
        Ok(self.conn.execute("DELETE FROM meals", [])?)
    }

    pub fn get_meal(&self, id: i64) -> Result<Option<Meal>> {
        let result = self.conn.query_row(
            &format!("SELECT {} FROM meals WHERE id = ?", meal_select_columns()),
            params![id],
            map_meal,
        );

        match result {
            Ok(meal) => Ok(Some(meal)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Meals in insertion order
    pub fn list_meals(&self, skip: usize, limit: usize) -> Result<Vec<Meal>> {
        self.query_meals("", "ORDER BY id", params![], skip, limit)
    }

    /// Meals whose `date` equals the given string exactly, ordered by time
    pub fn meals_by_date(&self, date: &str, skip: usize, limit: usize) -> Result<Vec<Meal>> {
        self.query_meals("WHERE date = ?", "ORDER BY time", params![date], skip, limit)
    }

    /// Meals between two ISO dates, both inclusive
    pub fn meals_by_date_range(
        &self,
        start: &str,
        end: &str,
        skip: usize,
        limit: usize,
    ) -> Result<Vec<Meal>> {
        self.query_meals(
            "WHERE date >= ? AND date <= ?",
            "ORDER BY date, time",
            params![start, end],
            skip,
            limit,
        )
    }

    /// Meals on a date with a given type; the type is capitalized first
    pub fn meals_by_date_and_type(
        &self,
        date: &str,
        meal_type: &str,
        skip: usize,
        limit: usize,
    ) -> Result<Vec<Meal>> {
        let meal_type = capitalize(meal_type);
        self.query_meals(
            "WHERE date = ? AND meal_type = ?",
            "ORDER BY time",
            params![date, meal_type],
            skip,
            limit,
        )
    }

    /// Meals in a date range whose source contains `source` (case-insensitive)
    pub fn meals_by_date_range_and_source(
        &self,
        start: &str,
        end: &str,
        source: &str,
        skip: usize,
        limit: usize,
    ) -> Result<Vec<Meal>> {
        let pattern = format!("%{}%", source);
        self.query_meals(
            "WHERE date >= ? AND date <= ? AND meal_source LIKE ?",
            "ORDER BY date, time",
            params![start, end, pattern],
            skip,
            limit,
        )
    }

    fn query_meals(
        &self,
        filter: &str,
        order: &str,
        filter_params: &[&dyn ToSql],
        skip: usize,
        limit: usize,
    ) -> Result<Vec<Meal>> {
        let query = format!(
            "SELECT {} FROM meals {} {} LIMIT ? OFFSET ?",
            meal_select_columns(),
            filter,
            order
        );
        let limit = limit.clamp(1, MAX_PAGE_SIZE) as i64;
        let skip = skip as i64;

        let mut all_params: Vec<&dyn ToSql> = filter_params.to_vec();
        all_params.push(&limit);
        all_params.push(&skip);

        let mut stmt = self.conn.prepare(&query)?;
        let rows = stmt.query_map(all_params.as_slice(), map_meal)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Sum every nutrient over the meals logged on `date`
    pub fn daily_totals(&self, date: &str) -> Result<DailyTotals> {
        let sums = NUTRIENT_COLUMNS
            .iter()
            .map(|c| format!("SUM({})", c))
            .collect::<Vec<_>>()
            .join(", ");
        let query = format!("SELECT COUNT(*), {} FROM meals WHERE date = ?", sums);

        self.conn
            .query_row(&query, params![date], |row| {
                let mut nutrients = Nutrients::default();
                for (offset, column) in NUTRIENT_COLUMNS.iter().enumerate() {
                    nutrients.set(column, row.get(offset + 1)?);
                }
                Ok(DailyTotals {
                    date: date.to_string(),
                    meal_count: row.get(0)?,
                    nutrients,
                })
            })
            .map_err(Into::into)
    }

    // ============================================
    // NUTRIENT METADATA
    // ============================================

    /// Insert a nutrient; fails if the name already exists
    pub fn insert_nutrient(&self, nutrient: &NewNutrient) -> Result<i64> {
        self.conn
            .execute(
                "INSERT INTO nutrient_metadata (name, unit, aliases, description, sources, rda)
                 VALUES (?, ?, ?, ?, ?, ?)",
                params![
                    nutrient.name,
                    nutrient.unit,
                    nutrient.aliases,
                    nutrient.description,
                    nutrient.sources,
                    nutrient.rda,
                ],
            )
            .with_context(|| format!("Failed to insert nutrient '{}'", nutrient.name))?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Insert a nutrient unless the name exists. Returns true if inserted.
    pub fn upsert_nutrient(&self, nutrient: &NewNutrient) -> Result<bool> {
        let changed = self.conn.execute(
            "INSERT OR IGNORE INTO nutrient_metadata (name, unit, aliases, description, sources, rda)
             VALUES (?, ?, ?, ?, ?, ?)",
            params![
                nutrient.name,
                nutrient.unit,
                nutrient.aliases,
                nutrient.description,
                nutrient.sources,
                nutrient.rda,
            ],
        )?;
        Ok(changed > 0)
    }

    /// Seed the built-in reference nutrients, keeping existing rows
    pub fn seed_nutrients(&self) -> Result<usize> {
        let mut inserted = 0;
        for nutrient in reference::REFERENCE_NUTRIENTS {
            if self.upsert_nutrient(&nutrient.to_new())? {
                inserted += 1;
            }
        }
        tracing::info!(inserted, "seeded nutrient metadata");
        Ok(inserted)
    }

    pub fn get_nutrient(&self, name: &str) -> Result<Option<NutrientMetadata>> {
        let result = self.conn.query_row(
            "SELECT id, name, unit, aliases, description, sources, rda
             FROM nutrient_metadata WHERE name = ? COLLATE NOCASE",
            params![name],
            map_nutrient,
        );

        match result {
            Ok(n) => Ok(Some(n)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Look up a nutrient by name, falling back to its aliases
    pub fn find_nutrient(&self, query: &str) -> Result<Option<NutrientMetadata>> {
        if let Some(found) = self.get_nutrient(query.trim())? {
            return Ok(Some(found));
        }
        Ok(self
            .list_nutrients()?
            .into_iter()
            .find(|n| n.matches(query)))
    }

    pub fn list_nutrients(&self) -> Result<Vec<NutrientMetadata>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, unit, aliases, description, sources, rda
             FROM nutrient_metadata ORDER BY id",
        )?;
        let rows = stmt.query_map([], map_nutrient)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    // ============================================
    // AD-HOC QUERIES
    // ============================================

    /// Run a single read-only statement and return at most `max_rows` rows
    pub fn run_read_only(&self, sql: &str, max_rows: usize) -> Result<QueryResult> {
        let sql = single_statement(sql)?;
        let mut stmt = self.conn.prepare(sql).context("Failed to prepare query")?;
        if !stmt.readonly() {
            return Err(StoreError::NotReadOnly.into());
        }

        let columns: Vec<String> = stmt
            .column_names()
            .into_iter()
            .map(String::from)
            .collect();

        let mut result = QueryResult {
            columns,
            ..QueryResult::default()
        };

        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            if result.rows.len() >= max_rows {
                result.truncated = true;
                break;
            }
            let values = (0..result.columns.len())
                .map(|i| row.get_ref(i).map(json_value))
                .collect::<Result<Vec<_>, _>>()?;
            result.rows.push(values);
        }

        tracing::debug!(rows = result.rows.len(), truncated = result.truncated, "query executed");
        Ok(result)
    }
}

// ============================================
// HELPERS
// ============================================

fn meal_select_columns() -> String {
    let mut columns = vec!["id"];
    columns.extend(NewMeal::columns());
    columns.join(", ")
}

fn insert_meal_sql() -> String {
    let columns = NewMeal::columns();
    format!(
        "INSERT INTO meals ({}) VALUES ({})",
        columns.join(", "),
        vec!["?"; columns.len()].join(", ")
    )
}

fn map_meal(row: &Row) -> rusqlite::Result<Meal> {
    let mut nutrients = Nutrients::default();
    for (offset, column) in NUTRIENT_COLUMNS.iter().enumerate() {
        nutrients.set(column, row.get(7 + offset)?);
    }

    Ok(Meal {
        id: row.get(0)?,
        details: NewMeal {
            date: row.get(1)?,
            time: row.get(2)?,
            meal_type: row.get(3)?,
            meal_name: row.get(4)?,
            meal_source: row.get(5)?,
            food_description: row.get(6)?,
            nutrients,
            notes: row.get(7 + NUTRIENT_COLUMNS.len())?,
        },
    })
}

fn map_nutrient(row: &Row) -> rusqlite::Result<NutrientMetadata> {
    Ok(NutrientMetadata {
        id: row.get(0)?,
        name: row.get(1)?,
        unit: row.get(2)?,
        aliases: row.get(3)?,
        description: row.get(4)?,
        sources: row.get(5)?,
        rda: row.get(6)?,
    })
}

fn json_value(value: ValueRef<'_>) -> serde_json::Value {
    match value {
        ValueRef::Null => serde_json::Value::Null,
        ValueRef::Integer(i) => i.into(),
        ValueRef::Real(f) => serde_json::Number::from_f64(f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        ValueRef::Text(t) | ValueRef::Blob(t) => String::from_utf8_lossy(t).into_owned().into(),
    }
}

/// Strip trailing semicolons and reject anything with a second statement.
/// Semicolons inside quoted literals, identifiers and comments are ignored.
fn single_statement(sql: &str) -> Result<&str, StoreError> {
    let sql = sql.trim();
    let mut end: Option<usize> = None;
    let mut has_code = false;

    let mut chars = sql.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        match c {
            '-' if matches!(chars.peek(), Some((_, '-'))) => {
                for (_, d) in chars.by_ref() {
                    if d == '\n' {
                        break;
                    }
                }
            }
            '/' if matches!(chars.peek(), Some((_, '*'))) => {
                chars.next();
                let mut prev = ' ';
                for (_, d) in chars.by_ref() {
                    if prev == '*' && d == '/' {
                        break;
                    }
                    prev = d;
                }
            }
            ';' => {
                end.get_or_insert(i);
            }
            c if c.is_whitespace() => {}
            _ if end.is_some() => return Err(StoreError::MultipleStatements),
            '\'' | '"' | '`' => {
                has_code = true;
                for (_, d) in chars.by_ref() {
                    if d == c {
                        break;
                    }
                }
            }
            _ => has_code = true,
        }
    }

    if !has_code {
        return Err(StoreError::EmptyQuery);
    }
    Ok(sql[..end.unwrap_or(sql.len())].trim_end())
}

fn capitalize(value: &str) -> String {
    let lower = value.trim().to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
