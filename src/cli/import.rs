//! Import command implementation

use anyhow::Result;
use std::path::Path;

use crate::import::import_meals;
use crate::store::MealStore;

pub fn run(store: &mut MealStore, path: &Path, replace: bool) -> Result<()> {
    let report = import_meals(store, path, replace)?;

    println!("Imported {} meals from {}", report.imported, path.display());
    if report.skipped > 0 {
        println!("Skipped {} rows with an invalid date or time", report.skipped);
    }

    Ok(())
}
