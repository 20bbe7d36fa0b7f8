//! Log command implementation: guided meal logging

use anyhow::{bail, Result};
use chrono::NaiveDateTime;
use std::io::{self, BufRead, Write};

use crate::assistant::logger::{describe_entry, insert_entry};
use crate::assistant::{is_confirmation, MealLogger};
use crate::llm::ChatModel;
use crate::store::MealStore;

pub async fn run<M: ChatModel>(
    model: &M,
    store: &MealStore,
    description: &str,
    details: Option<String>,
    assume_yes: bool,
    now: NaiveDateTime,
) -> Result<()> {
    let mut input = io::stdin().lock();
    log_meal(model, store, description, details, assume_yes, now, &mut input).await?;
    Ok(())
}

/// Build, preview and (once confirmed) save one entry. Returns the new id.
async fn log_meal<M: ChatModel, R: BufRead>(
    model: &M,
    store: &MealStore,
    description: &str,
    details: Option<String>,
    assume_yes: bool,
    now: NaiveDateTime,
    input: &mut R,
) -> Result<Option<i64>> {
    let details = match details {
        Some(details) => details,
        None => {
            println!("{}", MealLogger::<M>::clarification_prompt());
            prompt(input, "> ")?
        }
    };

    let entry = MealLogger::new(model)
        .build_entry(description, &details, now)
        .await?;

    println!();
    println!("{}", entry.summary);
    println!("{}", describe_entry(&entry.meal));
    println!();

    if !assume_yes {
        let answer = prompt(input, "Save this meal? [yes/no] ")?;
        if !is_confirmation(&answer) {
            println!("Not saved.");
            return Ok(None);
        }
    }

    let id = insert_entry(store, &entry.meal)?;
    println!("Saved meal #{}", id);
    Ok(Some(id))
}

fn prompt<R: BufRead>(input: &mut R, label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        bail!("No input");
    }
    Ok(line.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::ScriptedModel;
    use chrono::NaiveDate;
    use std::io::Cursor;

    const REPLY: &str = r#"{"row": {"meal_type": "Lunch", "meal_name": "Lentil soup",
        "iron": 6.6}, "summary": "Lentil soup for lunch."}"#;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 12, 12)
            .unwrap()
            .and_hms_opt(12, 30, 0)
            .unwrap()
    }

    #[tokio::test]
    async fn test_confirm_words_match_chat() {
        for answer in ["yes", "y", "Save!", "confirm."] {
            let store = MealStore::open_in_memory().unwrap();
            let model = ScriptedModel::new([REPLY]);
            let mut input = Cursor::new(format!("{}\n", answer));
            let id = log_meal(
                &model,
                &store,
                "lentil soup",
                Some("1 bowl".into()),
                false,
                now(),
                &mut input,
            )
            .await
            .unwrap();
            assert!(id.is_some(), "{} should save", answer);
            assert_eq!(store.list_meals(0, 10).unwrap().len(), 1);
        }
    }

    #[tokio::test]
    async fn test_declined_entry_is_not_saved() {
        let store = MealStore::open_in_memory().unwrap();
        let model = ScriptedModel::new([REPLY]);
        let mut input = Cursor::new("no\n");
        let id = log_meal(
            &model,
            &store,
            "lentil soup",
            Some("1 bowl".into()),
            false,
            now(),
            &mut input,
        )
        .await
        .unwrap();
        assert_eq!(id, None);
        assert!(store.list_meals(0, 10).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_details_are_asked_when_missing() {
        let store = MealStore::open_in_memory().unwrap();
        let model = ScriptedModel::new([REPLY]);
        let mut input = Cursor::new("1 bowl at noon\n");
        let id = log_meal(&model, &store, "lentil soup", None, true, now(), &mut input)
            .await
            .unwrap();
        assert!(id.is_some());
        assert!(model.requests()[0].messages[1].content.contains("1 bowl at noon"));
    }
}
