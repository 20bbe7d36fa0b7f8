//! Bulk import of tab-separated meal exports
//!
//! Expected headers: Date, Time, Meal_type, Meal_name, Meal_Source,
//! Food_Description, Calories, Carbohydrates, Protein, Fats, Fiber, Iron,
//! Calcium, Zinc, Magnesium, B_Vitamins, Omega_3s, Vitamin_A, Vitamin_C,
//! Vitamin_E, Vitamin_K, Notes.

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use std::io::Read;
use std::path::Path;

use crate::model::{leading_number, NewMeal, Nutrients};
use crate::store::MealStore;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub imported: usize,
    /// Rows dropped for an unreadable date, time or record
    pub skipped: usize,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ImportRow {
    #[serde(rename = "Date")]
    date: Option<String>,
    #[serde(rename = "Time")]
    time: Option<String>,
    #[serde(rename = "Meal_type")]
    meal_type: Option<String>,
    #[serde(rename = "Meal_name")]
    meal_name: Option<String>,
    #[serde(rename = "Meal_Source")]
    meal_source: Option<String>,
    #[serde(rename = "Food_Description")]
    food_description: Option<String>,
    #[serde(rename = "Calories")]
    calories: Option<String>,
    #[serde(rename = "Carbohydrates")]
    carbohydrates: Option<String>,
    #[serde(rename = "Protein")]
    protein: Option<String>,
    #[serde(rename = "Fats")]
    fats: Option<String>,
    #[serde(rename = "Fiber")]
    fiber: Option<String>,
    #[serde(rename = "Iron")]
    iron: Option<String>,
    #[serde(rename = "Calcium")]
    calcium: Option<String>,
    #[serde(rename = "Zinc")]
    zinc: Option<String>,
    #[serde(rename = "Magnesium")]
    magnesium: Option<String>,
    #[serde(rename = "B_Vitamins")]
    b_vitamins: Option<String>,
    #[serde(rename = "Omega_3s")]
    omega3: Option<String>,
    #[serde(rename = "Vitamin_A")]
    vitamin_a: Option<String>,
    #[serde(rename = "Vitamin_C")]
    vitamin_c: Option<String>,
    #[serde(rename = "Vitamin_E")]
    vitamin_e: Option<String>,
    #[serde(rename = "Vitamin_K")]
    vitamin_k: Option<String>,
    #[serde(rename = "Notes")]
    notes: Option<String>,
}

impl ImportRow {
    /// None when the date or time cannot be parsed
    fn into_meal(self) -> Option<NewMeal> {
        let date = parse_date(self.date.as_deref()?)?;
        let time = parse_time(self.time.as_deref()?)?;
        let flags = VitaminFlags::parse(self.b_vitamins.as_deref().unwrap_or_default());

        let number = |cell: &Option<String>| cell.as_deref().and_then(leading_number);
        let nutrients = Nutrients {
            calories: number(&self.calories),
            carbohydrates: number(&self.carbohydrates),
            protein: number(&self.protein),
            fats: number(&self.fats),
            fiber: number(&self.fiber),
            iron: number(&self.iron),
            calcium: number(&self.calcium),
            zinc: number(&self.zinc),
            magnesium: number(&self.magnesium),
            b1: flags.value("B1"),
            b2: flags.value("B2"),
            b3: flags.value("B3"),
            b5: flags.value("B5"),
            b6: flags.value("B6"),
            b9: flags.value("B9"),
            b12: flags.value("B12"),
            omega3: number(&self.omega3),
            vitamin_a: number(&self.vitamin_a),
            vitamin_c: number(&self.vitamin_c),
            vitamin_e: number(&self.vitamin_e),
            vitamin_k: number(&self.vitamin_k),
        };

        Some(NewMeal {
            date: Some(date),
            time: Some(time),
            meal_type: self.meal_type,
            meal_name: self.meal_name,
            meal_source: self.meal_source,
            food_description: self.food_description,
            nutrients,
            notes: self.notes,
        })
    }
}

/// B vitamins listed in the `B_Vitamins` cell, e.g. "B1, B6, Folate"
struct VitaminFlags(Vec<String>);

impl VitaminFlags {
    fn parse(cell: &str) -> Self {
        let tokens = cell
            .split(|c: char| c == ',' || c == ';' || c == '/' || c.is_whitespace())
            .filter(|t| !t.is_empty())
            .map(|t| match t.to_uppercase().as_str() {
                "FOLATE" | "FOLIC" => "B9".to_string(),
                other => other.to_string(),
            })
            .collect();
        Self(tokens)
    }

    /// 1.0 when listed, 0.0 otherwise
    fn value(&self, vitamin: &str) -> Option<f64> {
        Some(if self.0.iter().any(|t| t == vitamin) { 1.0 } else { 0.0 })
    }
}

fn parse_date(value: &str) -> Option<String> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%d-%b-%Y")
        .or_else(|_| NaiveDate::parse_from_str(value, "%Y-%m-%d"))
        .ok()
        .map(|d| d.format("%Y-%m-%d").to_string())
}

fn parse_time(value: &str) -> Option<String> {
    let value = value.trim().to_uppercase();
    ["%I:%M %p", "%H:%M:%S", "%H:%M"]
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(&value, fmt).ok())
        .map(|t| t.format("%H:%M:%S").to_string())
}

/// Import a tab-separated file into the store in one transaction
pub fn import_meals(store: &mut MealStore, path: &Path, replace: bool) -> Result<ImportReport> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let report = import_from_reader(store, file, replace)
        .with_context(|| format!("Failed to import {}", path.display()))?;
    tracing::info!(
        path = %path.display(),
        imported = report.imported,
        skipped = report.skipped,
        "import finished"
    );
    Ok(report)
}

pub fn import_from_reader<R: Read>(
    store: &mut MealStore,
    reader: R,
    replace: bool,
) -> Result<ImportReport> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut meals = vec![];
    let mut skipped = 0;

    for (index, record) in csv_reader.deserialize::<ImportRow>().enumerate() {
        // Header is line 1
        let line = index + 2;
        let row = match record {
            Ok(row) => row,
            Err(e) => {
                tracing::warn!(line, "skipping unreadable row: {}", e);
                skipped += 1;
                continue;
            }
        };

        match row.into_meal() {
            Some(meal) => meals.push(meal),
            None => {
                tracing::warn!(line, "skipping row with invalid date/time");
                skipped += 1;
            }
        }
    }

    let imported = store.insert_meals(&meals, replace)?;
    Ok(ImportReport { imported, skipped })
}
