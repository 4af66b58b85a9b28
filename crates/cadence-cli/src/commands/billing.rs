//! Billing lifecycle command implementations

use anyhow::{anyhow, Context, Result};
use cadence_core::models::Subscription;
use cadence_core::{BillingEngine, Database, EngineConfig, TracingEvents};
use serde::Serialize;

use super::print_json;

fn engine<'a>(db: &'a Database, config: &EngineConfig) -> BillingEngine<'a> {
    BillingEngine::with_config(db, &TracingEvents, config)
}

fn print_transition(verb: &str, sub: &Subscription) {
    println!(
        "✅ {} {} (ID: {}), now {}",
        verb,
        sub.name,
        sub.id,
        sub.state()
    );
}

pub async fn cmd_pause(db: &Database, config: &EngineConfig, id: i64) -> Result<()> {
    let sub = engine(db, config).pause(id).await?;
    print_transition("Paused", &sub);
    Ok(())
}

pub async fn cmd_resume(db: &Database, config: &EngineConfig, id: i64) -> Result<()> {
    let sub = engine(db, config).resume(id).await?;
    print_transition("Resumed", &sub);
    if !sub.is_lifetime() {
        println!(
            "   📅 Next billing date: {}",
            sub.next_billing_date.format("%Y-%m-%d")
        );
    }
    Ok(())
}

pub async fn cmd_cancel(db: &Database, config: &EngineConfig, id: i64) -> Result<()> {
    let sub = engine(db, config).cancel(id).await?;
    print_transition("Cancelled", &sub);
    println!(
        "   💰 Saves ${:.2}/month from now on",
        sub.monthly_equivalent()
    );
    Ok(())
}

pub async fn cmd_set_price(
    db: &Database,
    config: &EngineConfig,
    id: i64,
    price: f64,
) -> Result<()> {
    let current = db
        .get_subscription(id)?
        .ok_or_else(|| anyhow!("Subscription not found: {}", id))?;
    let old_price = current.price;

    let updated = engine(db, config)
        .update_subscription(Subscription { price, ..current })
        .await
        .context("Failed to update price")?;

    let arrow = if updated.price > old_price {
        "📈"
    } else if updated.price < old_price {
        "📉"
    } else {
        "➖"
    };
    println!(
        "{} {} price ${:.2} → ${:.2}",
        arrow, updated.name, old_price, updated.price
    );
    Ok(())
}

#[derive(Serialize)]
struct ProcessSummary {
    renewals: cadence_core::RenewalReport,
    trials: cadence_core::TrialReport,
}

pub async fn cmd_process(db: &Database, config: &EngineConfig, json: bool) -> Result<()> {
    let engine = engine(db, config);
    // Expired trials settle before any renewal runs
    let trials = engine.process_trial_expirations().await?;
    let renewals = engine.process_overdue_renewals().await?;

    if json {
        return print_json(&ProcessSummary { renewals, trials });
    }

    println!("🔄 Billing run complete");
    println!(
        "   Renewed: {} ({} cycle(s) advanced)",
        renewals.renewed, renewals.steps
    );
    println!(
        "   Trials converted: {}, cancelled: {}",
        trials.converted, trials.cancelled
    );
    let skipped = renewals.skipped + trials.skipped;
    if skipped > 0 {
        println!("   ⚠️  Skipped {} record(s) after store errors, see logs", skipped);
    }
    Ok(())
}
