use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;

use recall_scheduler::config::Config;
use recall_scheduler::logging::{init_tracing, LogConfig};
use recall_scheduler::scheduler::config::SchedulerConfig;
use recall_scheduler::scheduler::ReviewPlanner;
use recall_scheduler::store::operations::items::{ItemFilter, KnowledgeItem};
use recall_scheduler::store::operations::reviews::ReviewInput;
use recall_scheduler::store::Store;

/// Spaced-repetition scheduler
#[derive(Parser)]
#[command(name = "recall-scheduler")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Schedule reviews of learning items and plan the daily workload")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new learning item, due immediately
    Add {
        id: String,
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        content: String,
        #[arg(long)]
        category: Option<String>,
        /// Comma-separated tags
        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,
    },

    /// List items, newest first
    List {
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        tag: Option<String>,
        #[arg(long)]
        mastered: Option<bool>,
        #[arg(long, default_value_t = 0)]
        skip: usize,
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show one item
    Show { id: String },

    /// Record a review with a recall quality from 0 to 5
    Review {
        id: String,
        #[arg(allow_negative_numbers = true)]
        quality: i32,
        /// Time spent on the review, in seconds
        #[arg(long)]
        seconds: Option<u32>,
        #[arg(long)]
        notes: Option<String>,
    },

    /// Build the review plan for now or for a given RFC 3339 instant
    Plan {
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },

    /// List due items, earliest first
    Due {
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show the review history of an item, newest first
    History {
        id: String,
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show overall review statistics
    Stats,
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = Config::from_env();
    init_tracing(&LogConfig::from(&config));
    tracing::debug!(?config, "Configuration loaded");

    let scheduler_config = SchedulerConfig::from_env(&config.scheduler);
    scheduler_config
        .validate()
        .map_err(anyhow::Error::msg)
        .context("invalid scheduler configuration")?;

    let store = Store::open(&config.sled_path)
        .with_context(|| format!("failed to open store at {}", config.sled_path))?;
    let planner = ReviewPlanner::new(scheduler_config.planner.policy);
    let now = Utc::now();

    match cli.command {
        Commands::Add {
            id,
            title,
            content,
            category,
            tags,
        } => {
            let item = KnowledgeItem::new(&id, &title, category, now)
                .with_content(content)
                .with_tags(tags);
            store.create_item(&item)?;
            print_json(&item)?;
        }
        Commands::List {
            category,
            tag,
            mastered,
            skip,
            limit,
        } => {
            let mut filter = ItemFilter {
                category,
                tag,
                is_mastered: mastered,
                skip,
                ..ItemFilter::default()
            };
            if let Some(limit) = limit {
                filter.limit = limit;
            }
            print_json(&store.list_items(&filter)?)?;
        }
        Commands::Show { id } => {
            let item = store
                .get_item(&id)?
                .with_context(|| format!("item {id} not found"))?;
            print_json(&item)?;
        }
        Commands::Review {
            id,
            quality,
            seconds,
            notes,
        } => {
            let input = ReviewInput {
                time_spent_seconds: seconds,
                notes,
            };
            let record =
                store.record_review(&id, quality, &input, now, &scheduler_config.mastery)?;
            print_json(&record)?;
        }
        Commands::Plan { at } => {
            let plan = store.daily_plan(at.unwrap_or(now), &planner)?;
            print_json(&plan)?;
        }
        Commands::Due { limit } => {
            let limit = limit.unwrap_or(scheduler_config.planner.due_limit);
            let items = store.due_items(now, Some(limit))?;
            print_json(&items)?;
        }
        Commands::History { id, limit } => {
            let limit = limit.unwrap_or(scheduler_config.planner.history_limit);
            let records = store.review_history(&id, limit)?;
            print_json(&records)?;
        }
        Commands::Stats => {
            let stats = store.review_stats(now)?;
            print_json(&stats)?;
        }
    }

    store.flush()?;
    Ok(())
}
