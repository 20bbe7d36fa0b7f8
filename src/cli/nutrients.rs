//! Nutrients command implementation

use anyhow::{Context, Result};

use super::{format_amount, truncate};
use crate::store::MealStore;

pub fn seed(store: &MealStore) -> Result<()> {
    let inserted = store.seed_nutrients()?;
    if inserted == 0 {
        println!("Nutrient reference data already present.");
    } else {
        println!("Seeded {} nutrients.", inserted);
    }
    Ok(())
}

pub fn list(store: &MealStore) -> Result<()> {
    let nutrients = store.list_nutrients()?;

    if nutrients.is_empty() {
        println!("No nutrients found. Run 'nutrilog nutrients seed' first.");
        return Ok(());
    }

    println!("{:<12} {:<6} {:>8} {}", "Name", "Unit", "RDA", "Aliases");
    println!("{}", "-".repeat(70));

    for n in nutrients {
        println!(
            "{:<12} {:<6} {:>8} {}",
            n.name,
            n.unit.as_deref().unwrap_or("-"),
            n.rda.map(format_amount).unwrap_or_else(|| "-".to_string()),
            truncate(n.aliases.as_deref().unwrap_or("-"), 40),
        );
    }

    Ok(())
}

pub fn show(store: &MealStore, name: &str) -> Result<()> {
    let n = store
        .find_nutrient(name)?
        .with_context(|| format!("Nutrient '{}' not found", name))?;

    println!("{} ({})", n.name, n.unit.as_deref().unwrap_or("-"));
    if let Some(rda) = n.rda {
        println!("  RDA:         {} {}", format_amount(rda), n.unit.as_deref().unwrap_or(""));
    }
    let aliases = n.alias_list();
    if !aliases.is_empty() {
        println!("  Aliases:     {}", aliases.join(", "));
    }
    if let Some(description) = n.description.as_deref() {
        println!("  Description: {}", description);
    }
    if let Some(sources) = n.sources.as_deref() {
        println!("  Sources:     {}", sources);
    }

    Ok(())
}
