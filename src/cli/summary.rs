//! Summary command implementation: one day's totals against targets

use anyhow::Result;
use std::collections::HashMap;

use super::format_amount;
use crate::model::{DailyTotals, NUTRIENT_COLUMNS};
use crate::profile::NutritionProfile;
use crate::store::{catalog, MealStore};

/// One nutrient line of the summary
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryLine {
    pub nutrient: &'static str,
    pub total: Option<f64>,
    pub target: Option<f64>,
}

impl SummaryLine {
    pub fn percent(&self) -> Option<f64> {
        match (self.total, self.target) {
            (Some(total), Some(target)) if target > 0.0 => Some(100.0 * total / target),
            _ => None,
        }
    }
}

/// Totals paired with the profile target, falling back to the stored RDA
pub fn summarize(
    totals: &DailyTotals,
    profile: &NutritionProfile,
    rdas: &HashMap<String, f64>,
) -> Vec<SummaryLine> {
    NUTRIENT_COLUMNS
        .iter()
        .map(|&nutrient| SummaryLine {
            nutrient,
            total: totals.nutrients.get(nutrient),
            target: profile
                .target_for(nutrient)
                .or_else(|| rdas.get(nutrient).copied()),
        })
        .collect()
}

pub fn run(store: &MealStore, profile: &NutritionProfile, date: &str) -> Result<()> {
    let totals = store.daily_totals(date)?;

    if totals.meal_count == 0 {
        println!("No meals logged on {}.", date);
        return Ok(());
    }

    let rdas: HashMap<String, f64> = store
        .list_nutrients()?
        .into_iter()
        .filter_map(|n| n.rda.map(|rda| (n.name, rda)))
        .collect();

    println!("{}: {} meal(s)", date, totals.meal_count);
    println!();
    println!("{:<14} {:>10} {:>10} {:<5} {:>6}", "Nutrient", "Total", "Target", "Unit", "%");
    println!("{}", "-".repeat(50));

    for line in summarize(&totals, profile, &rdas) {
        println!(
            "{:<14} {:>10} {:>10} {:<5} {:>6}",
            line.nutrient,
            line.total.map(format_amount).unwrap_or_else(|| "-".to_string()),
            line.target.map(format_amount).unwrap_or_else(|| "-".to_string()),
            catalog::unit_of(line.nutrient).unwrap_or(""),
            line.percent()
                .map(|p| format!("{:.0}%", p))
                .unwrap_or_else(|| "-".to_string()),
        );
    }

    if rdas.is_empty() {
        println!();
        println!("Tip: run 'nutrilog nutrients seed' to compare against RDAs.");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NewMeal;

    #[test]
    fn test_profile_target_overrides_rda() {
        let store = MealStore::open_in_memory().unwrap();
        store.seed_nutrients().unwrap();
        for iron in [4.0, 5.0] {
            let mut meal = NewMeal {
                date: Some("2024-12-12".into()),
                ..NewMeal::default()
            };
            meal.nutrients.iron = Some(iron);
            store.insert_meal(&meal).unwrap();
        }

        let mut profile = NutritionProfile::default();
        profile.targets.insert("protein".into(), 90.0);

        let rdas: HashMap<String, f64> = store
            .list_nutrients()
            .unwrap()
            .into_iter()
            .filter_map(|n| n.rda.map(|rda| (n.name, rda)))
            .collect();
        let totals = store.daily_totals("2024-12-12").unwrap();
        let lines = summarize(&totals, &profile, &rdas);

        let iron = lines.iter().find(|l| l.nutrient == "iron").unwrap();
        assert_eq!(iron.total, Some(9.0));
        assert_eq!(iron.target, Some(18.0));
        assert_eq!(iron.percent(), Some(50.0));

        let protein = lines.iter().find(|l| l.nutrient == "protein").unwrap();
        assert_eq!(protein.total, None);
        assert_eq!(protein.target, Some(90.0));
        assert_eq!(protein.percent(), None);

        run(&store, &profile, "2024-12-12").unwrap();
        run(&store, &profile, "2024-12-13").unwrap();
    }
}
