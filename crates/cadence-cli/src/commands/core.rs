//! Core command implementations and shared utilities
//!
//! This module contains:
//! - `open_db` - Shared utility to open the database
//! - `load_config` - Resolve the engine config from --config or the data dir
//! - `cmd_init` - Initialize the database
//! - `cmd_status` - Database stats and a billing overview

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use cadence_core::models::SubscriptionState;
use cadence_core::{BillingEngine, Database, EngineConfig, NoopEvents};

pub fn open_db(db_path: &Path) -> Result<Database> {
    let path_str = db_path
        .to_str()
        .with_context(|| format!("Database path is not valid UTF-8: {}", db_path.display()))?;
    Database::new(path_str).context("Failed to open database")
}

/// Explicit path wins; otherwise the data-dir override or defaults
pub fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(path) => EngineConfig::load_from(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => EngineConfig::load().context("Failed to load config"),
    }
}

pub fn cmd_init(db: &Database) -> Result<()> {
    println!("🔧 Initializing database at {}...", db.path());
    println!("✅ Database initialized successfully!");
    println!();
    println!("Next steps:");
    println!("  1. Add a subscription: cadence add Netflix 15.49 --category streaming");
    println!("  2. Roll renewals forward: cadence process");
    println!("  3. Look for savings: cadence suggestions");

    Ok(())
}

pub async fn cmd_status(db: &Database, config: &EngineConfig) -> Result<()> {
    println!();
    println!("📊 Cadence Status");
    println!("   ─────────────────────────────────────────────────────────────");
    println!("   Database: {}", db.path());

    if let Ok(metadata) = fs::metadata(db.path()) {
        let size_kb = metadata.len() as f64 / 1024.0;
        if size_kb < 1024.0 {
            println!("   Size: {:.1} KB", size_kb);
        } else {
            println!("   Size: {:.1} MB", size_kb / 1024.0);
        }
    }

    let subscriptions = db.all_subscriptions()?;
    let transactions = db.all_transactions()?;
    let count = |state: SubscriptionState| {
        subscriptions
            .iter()
            .filter(|s| s.state() == state)
            .count()
    };

    println!();
    println!("   Subscriptions: {}", subscriptions.len());
    println!("     Active:    {}", count(SubscriptionState::Active));
    println!("     Trialing:  {}", count(SubscriptionState::Trialing));
    println!("     Paused:    {}", count(SubscriptionState::Paused));
    println!("     Cancelled: {}", count(SubscriptionState::Cancelled));
    println!("   Transactions: {}", transactions.len());

    let engine = BillingEngine::with_config(db, &NoopEvents, config);
    let overdue = engine.overdue().await?;
    let due_soon = engine.due_soon().await?;
    let expiring = engine
        .expiring_trials(config.trial_ending_window_days)
        .await?;

    println!();
    if !overdue.is_empty() {
        println!(
            "   ⏰ {} overdue renewal(s), run: cadence process",
            overdue.len()
        );
    }
    println!(
        "   📅 Due within {} days: {}",
        config.due_soon_days,
        due_soon.len()
    );
    println!(
        "   ⏳ Trials ending within {} days: {}",
        config.trial_ending_window_days,
        expiring.len()
    );

    Ok(())
}
