//! Chat command implementation: interactive REPL

use anyhow::Result;
use chrono::Local;
use std::io::{self, BufRead, Write};

use super::print_result;
use crate::assistant::{ChatSession, WELCOME_MESSAGE};
use crate::config::Config;
use crate::llm::{ChatModel, Sampling};
use crate::profile::NutritionProfile;
use crate::store::MealStore;

const HELP: &str = "Commands: /clear resets the conversation, /quit exits.";

pub async fn run<M: ChatModel>(
    model: &M,
    store: &MealStore,
    profile: &NutritionProfile,
    config: &Config,
) -> Result<()> {
    let mut session = ChatSession::new(model, store, profile)
        .with_sampling(Sampling::from(&config.llm))
        .with_max_history(config.chat.max_history)
        .with_max_rows(config.chat.max_rows);

    let history_path = config.history_path();
    if let Some(path) = history_path.as_deref() {
        if let Err(e) = session.load_history(path) {
            tracing::warn!("could not restore chat history: {:#}", e);
        }
    }

    println!("{}", WELCOME_MESSAGE);
    println!("{}", HELP);

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("\nyou> ");
        io::stdout().flush()?;

        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim();
        match input {
            "" => continue,
            "/quit" | "/exit" => break,
            "/clear" => {
                session.clear();
                println!("Conversation cleared.");
                continue;
            }
            "/help" => {
                println!("{}", HELP);
                continue;
            }
            _ => {}
        }

        let reply = session.handle(input, Local::now().naive_local()).await;
        println!("\nassistant> {}", reply.text);
        if let Some(result) = reply.result.as_ref() {
            println!();
            print_result(result);
        }

        if let Some(path) = history_path.as_deref() {
            if let Err(e) = session.save_history(path) {
                tracing::warn!("could not save chat history: {:#}", e);
            }
        }
    }

    Ok(())
}
