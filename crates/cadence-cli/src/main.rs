//! Cadence CLI - Subscription analytics and billing-cycle engine
//!
//! Usage:
//!   cadence init                      Initialize database
//!   cadence add Netflix 15.49         Add a monthly subscription
//!   cadence process                   Roll renewals and expire trials
//!   cadence suggestions               Show ranked ways to save

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let db = commands::open_db(&cli.db)?;
    let config = commands::load_config(cli.config.as_deref())?;
    let json = cli.json;

    match cli.command {
        Commands::Init => commands::cmd_init(&db),
        Commands::Status => commands::cmd_status(&db, &config).await,
        Commands::Add {
            name,
            price,
            cycle,
            category,
            next,
            trial_days,
            price_after_trial,
            convert,
        } => commands::cmd_add(
            &db,
            &commands::NewSubscriptionArgs {
                name,
                price,
                cycle,
                category,
                next,
                trial_days,
                price_after_trial,
                convert,
            },
        ),
        Commands::Record {
            amount,
            description,
            date,
            category,
            recurring,
            tags,
        } => commands::cmd_record(
            &db,
            amount,
            &description,
            date.as_deref(),
            &category,
            recurring,
            tags,
        ),
        Commands::List => commands::cmd_list(&db, json),
        Commands::Use { id } => commands::cmd_use(&db, id),
        Commands::Pause { id } => commands::cmd_pause(&db, &config, id).await,
        Commands::Resume { id } => commands::cmd_resume(&db, &config, id).await,
        Commands::Cancel { id } => commands::cmd_cancel(&db, &config, id).await,
        Commands::SetPrice { id, price } => commands::cmd_set_price(&db, &config, id, price).await,
        Commands::Process => commands::cmd_process(&db, &config, json).await,
        Commands::Trend { range } => commands::cmd_trend(&db, config, &range, json).await,
        Commands::Breakdown => commands::cmd_breakdown(&db, config, json).await,
        Commands::Yoy => commands::cmd_yoy(&db, config, json).await,
        Commands::Forecast { months } => commands::cmd_forecast(&db, config, months, json).await,
        Commands::Suggestions => commands::cmd_suggestions(&db, config, json).await,
        Commands::Unused { window } => commands::cmd_unused(&db, config, &window, json).await,
        Commands::Cancellations => commands::cmd_cancellations(&db, config, json).await,
    }
}
