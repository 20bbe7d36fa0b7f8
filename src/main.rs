use anyhow::Result;
use chrono::Local;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use nutrilog::cli::{ask, chat, import, log, meals, nutrients, summary};
use nutrilog::config::Config;
use nutrilog::llm::OpenAiClient;
use nutrilog::profile::NutritionProfile;
use nutrilog::store::{MealStore, MAX_PAGE_SIZE};

#[derive(Parser)]
#[command(name = "nutrilog")]
#[command(about = "Vegan meal log with a natural-language nutrition assistant")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "nutrilog.yaml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive chat: log meals, ask questions, talk nutrition
    Chat,

    /// Log a meal from a free-text description
    Log {
        /// What you ate
        #[arg(required = true, num_args = 1..)]
        description: Vec<String>,

        /// Quantities, time and meal type (asked interactively if omitted)
        #[arg(short, long)]
        details: Option<String>,

        /// Save without asking for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Ask a question about your logged meals
    Ask {
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,

        /// Print the generated SQL
        #[arg(long)]
        sql: bool,
    },

    /// Browse logged meals
    Meals {
        #[command(subcommand)]
        command: MealsCommands,
    },

    /// Import a tab-separated meal export
    Import {
        file: PathBuf,

        /// Delete existing meals first
        #[arg(long)]
        replace: bool,
    },

    /// Nutrient reference data
    Nutrients {
        #[command(subcommand)]
        command: NutrientsCommands,
    },

    /// Daily nutrient totals against targets
    Summary {
        /// Day to summarize (YYYY-MM-DD, default today)
        #[arg(short, long)]
        date: Option<String>,
    },
}

#[derive(Subcommand)]
enum MealsCommands {
    /// List meals, optionally filtered
    List {
        /// Exact day (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,

        /// Range start (YYYY-MM-DD, inclusive)
        #[arg(long)]
        from: Option<String>,

        /// Range end (YYYY-MM-DD, inclusive)
        #[arg(long)]
        to: Option<String>,

        /// Relative phrase such as "yesterday" or "last week"
        #[arg(long)]
        when: Option<String>,

        /// Meal type (single day only)
        #[arg(short = 't', long = "type")]
        meal_type: Option<String>,

        /// Meal source substring (date filter required)
        #[arg(short, long)]
        source: Option<String>,

        #[arg(long, default_value_t = 0)]
        skip: usize,

        #[arg(short, long, default_value_t = 100)]
        limit: usize,
    },
    /// Show every field of one meal
    Show { id: i64 },
}

#[derive(Subcommand)]
enum NutrientsCommands {
    /// Insert the built-in reference nutrients
    Seed,
    /// List nutrient metadata
    List,
    /// Show one nutrient by name or alias
    Show { name: String },
}

fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| "nutrilog=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    // Load config
    let config = Config::load(&cli.config).unwrap_or_else(|e| {
        tracing::warn!("falling back to default config: {:#}", e);
        Config::default()
    });

    // Initialize store
    let mut store = MealStore::open(&config.database_path())?;
    let now = Local::now().naive_local();

    match cli.command {
        Commands::Chat => {
            let profile = NutritionProfile::load(&config.profile_path())?;
            let model = OpenAiClient::from_config(&config.llm)?;
            chat::run(&model, &store, &profile, &config).await?;
        }
        Commands::Log {
            description,
            details,
            yes,
        } => {
            let model = OpenAiClient::from_config(&config.llm)?;
            log::run(&model, &store, &description.join(" "), details, yes, now).await?;
        }
        Commands::Ask { question, sql } => {
            let profile = NutritionProfile::load(&config.profile_path())?;
            let model = OpenAiClient::from_config(&config.llm)?;
            ask::run(
                &model,
                &store,
                &profile,
                &config,
                &question.join(" "),
                now.date(),
                sql,
            )
            .await?;
        }
        Commands::Meals { command } => match command {
            MealsCommands::List {
                date,
                from,
                to,
                when,
                meal_type,
                source,
                skip,
                limit,
            } => {
                let filter = meals::ListFilter {
                    date,
                    from,
                    to,
                    when,
                    meal_type,
                    source,
                };
                meals::list(&store, &filter, now.date(), skip, limit.min(MAX_PAGE_SIZE))?;
            }
            MealsCommands::Show { id } => {
                meals::show(&store, id)?;
            }
        },
        Commands::Import { file, replace } => {
            import::run(&mut store, &file, replace)?;
        }
        Commands::Nutrients { command } => match command {
            NutrientsCommands::Seed => {
                nutrients::seed(&store)?;
            }
            NutrientsCommands::List => {
                nutrients::list(&store)?;
            }
            NutrientsCommands::Show { name } => {
                nutrients::show(&store, &name)?;
            }
        },
        Commands::Summary { date } => {
            let profile = NutritionProfile::load(&config.profile_path())?;
            let date = date.unwrap_or_else(|| now.format("%Y-%m-%d").to_string());
            summary::run(&store, &profile, &date)?;
        }
    }

    Ok(())
}
