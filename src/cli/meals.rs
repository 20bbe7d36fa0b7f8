//! Meals command implementation (list, show)

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;

use super::{format_amount, truncate};
use crate::assistant::dates::{parse_iso, resolve_phrase};
use crate::model::Meal;
use crate::store::{catalog, MealStore};

/// Filters accepted by `meals list`
#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    pub date: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub when: Option<String>,
    pub meal_type: Option<String>,
    pub source: Option<String>,
}

/// Which store query a filter maps to
#[derive(Debug, Clone, PartialEq, Eq)]
enum Selection {
    All,
    Date(String),
    DateAndType(String, String),
    Range(String, String),
    RangeAndSource(String, String, String),
}

impl ListFilter {
    fn selection(&self, today: NaiveDate) -> Result<Selection> {
        let range = match (&self.date, &self.from, &self.to, &self.when) {
            (None, None, None, None) => None,
            (Some(date), None, None, None) => Some((checked(date)?, checked(date)?)),
            (None, Some(from), Some(to), None) => Some((checked(from)?, checked(to)?)),
            (None, Some(_), None, None) | (None, None, Some(_), None) => {
                bail!("--from and --to must be given together")
            }
            (None, None, None, Some(phrase)) => {
                let range = resolve_phrase(phrase, today)
                    .with_context(|| format!("Unrecognised date phrase '{}'", phrase))?;
                Some((range.start_iso(), range.end_iso()))
            }
            _ => bail!("use only one of --date, --from/--to or --when"),
        };

        let selection = match (range, &self.meal_type, &self.source) {
            (None, None, None) => Selection::All,
            (None, _, _) => bail!("--type and --source need a date filter"),
            (Some(_), Some(_), Some(_)) => bail!("--type and --source cannot be combined"),
            (Some((start, end)), Some(meal_type), None) => {
                if start != end {
                    bail!("--type works with a single day; use --date or a one-day --when");
                }
                Selection::DateAndType(start, meal_type.clone())
            }
            (Some((start, end)), None, Some(source)) => {
                Selection::RangeAndSource(start, end, source.clone())
            }
            (Some((start, end)), None, None) if start == end => Selection::Date(start),
            (Some((start, end)), None, None) => Selection::Range(start, end),
        };
        Ok(selection)
    }
}

fn checked(date: &str) -> Result<String> {
    match parse_iso(date) {
        Some(d) => Ok(d.format("%Y-%m-%d").to_string()),
        None => bail!("Invalid date '{}', expected YYYY-MM-DD", date),
    }
}

pub fn list(
    store: &MealStore,
    filter: &ListFilter,
    today: NaiveDate,
    skip: usize,
    limit: usize,
) -> Result<()> {
    let meals = match filter.selection(today)? {
        Selection::All => store.list_meals(skip, limit)?,
        Selection::Date(date) => store.meals_by_date(&date, skip, limit)?,
        Selection::DateAndType(date, meal_type) => {
            store.meals_by_date_and_type(&date, &meal_type, skip, limit)?
        }
        Selection::Range(start, end) => store.meals_by_date_range(&start, &end, skip, limit)?,
        Selection::RangeAndSource(start, end, source) => {
            store.meals_by_date_range_and_source(&start, &end, &source, skip, limit)?
        }
    };

    if meals.is_empty() {
        println!("No meals found. Log one with 'nutrilog log' or run 'nutrilog import'.");
        return Ok(());
    }

    println!(
        "{:<6} {:<11} {:<6} {:<10} {:<28} {:>8} {:>8}",
        "ID", "Date", "Time", "Type", "Meal", "kcal", "Protein"
    );
    println!("{}", "-".repeat(83));

    for meal in meals {
        let d = &meal.details;
        let time = d
            .time
            .as_deref()
            .map(|t| t.get(..5).unwrap_or(t))
            .unwrap_or("-");
        println!(
            "{:<6} {:<11} {:<6} {:<10} {:<28} {:>8} {:>8}",
            meal.id,
            d.date.as_deref().unwrap_or("-"),
            time,
            d.meal_type.as_deref().unwrap_or("-"),
            truncate(d.meal_name.as_deref().unwrap_or("-"), 28),
            amount(d.nutrients.calories),
            amount(d.nutrients.protein),
        );
    }

    Ok(())
}

pub fn show(store: &MealStore, id: i64) -> Result<()> {
    let meal = store
        .get_meal(id)?
        .with_context(|| format!("Meal #{} not found", id))?;
    print_meal(&meal);
    Ok(())
}

fn print_meal(meal: &Meal) {
    let d = &meal.details;
    println!(
        "Meal #{}: {}",
        meal.id,
        d.meal_name.as_deref().unwrap_or("(unnamed)")
    );
    println!(
        "  {} {}  {}  {}",
        d.date.as_deref().unwrap_or("-"),
        d.time.as_deref().unwrap_or("-"),
        d.meal_type.as_deref().unwrap_or("-"),
        d.meal_source.as_deref().unwrap_or("-"),
    );
    if let Some(description) = d.food_description.as_deref() {
        println!("  {}", description);
    }

    let present = d.nutrients.present();
    if !present.is_empty() {
        println!();
        for (column, value) in present {
            println!(
                "  {:<14} {:>10} {}",
                column,
                format_amount(value),
                catalog::unit_of(column).unwrap_or("")
            );
        }
    }

    if let Some(notes) = d.notes.as_deref() {
        println!();
        println!("  Notes: {}", notes);
    }
}

fn amount(value: Option<f64>) -> String {
    value.map(format_amount).unwrap_or_else(|| "-".to_string())
}
