//! Ask command implementation: one analytics question

use anyhow::Result;
use chrono::NaiveDate;

use super::print_result;
use crate::assistant::SqlAssistant;
use crate::config::Config;
use crate::llm::{ChatModel, Sampling};
use crate::profile::NutritionProfile;
use crate::store::MealStore;

pub async fn run<M: ChatModel>(
    model: &M,
    store: &MealStore,
    profile: &NutritionProfile,
    config: &Config,
    question: &str,
    today: NaiveDate,
    show_sql: bool,
) -> Result<()> {
    let response = SqlAssistant::new(model, store, profile)
        .with_sampling(Sampling::from(&config.llm))
        .with_max_rows(config.chat.max_rows)
        .answer(question, today)
        .await;

    println!("{}", response.message);

    if let Some(error) = response.error.as_deref() {
        eprintln!("Error: {}", error);
        return Ok(());
    }

    if show_sql {
        if let Some(sql) = response.sql.as_deref() {
            println!();
            println!("SQL: {}", sql);
            if let Some(confidence) = response.confidence {
                println!("Confidence: {:.0}%", confidence * 100.0);
            }
        }
    }

    if let Some(result) = response.result.as_ref() {
        println!();
        print_result(result);
    }

    Ok(())
}
