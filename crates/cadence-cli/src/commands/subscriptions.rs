//! Subscription and transaction command implementations

use anyhow::{anyhow, Context, Result};
use cadence_core::billing::{advance_billing_date, validate};
use cadence_core::models::{BillingCycle, Category, NewTransaction, Subscription, SubscriptionState};
use cadence_core::config::MAX_WINDOW_DAYS;
use cadence_core::Database;
use chrono::{Duration, Utc};

use super::{parse_date_arg, print_json, start_of_day, truncate};

/// Arguments for `cadence add`
pub struct NewSubscriptionArgs {
    pub name: String,
    pub price: f64,
    pub cycle: String,
    pub category: String,
    pub next: Option<String>,
    pub trial_days: Option<i64>,
    pub price_after_trial: Option<f64>,
    pub convert: bool,
}

/// Build a validated subscription from command arguments
pub fn build_subscription(args: &NewSubscriptionArgs) -> Result<Subscription> {
    let cycle: BillingCycle = args.cycle.parse().map_err(|e: String| anyhow!(e))?;
    let category: Category = args.category.parse().map_err(|e: String| anyhow!(e))?;
    let now = Utc::now();

    let trial_end = match args.trial_days {
        Some(days) if !(1..=MAX_WINDOW_DAYS).contains(&days) => {
            return Err(anyhow!(
                "--trial-days must be between 1 and {} (got {})",
                MAX_WINDOW_DAYS,
                days
            ));
        }
        Some(days) => Some(
            Duration::try_days(days)
                .and_then(|d| now.checked_add_signed(d))
                .ok_or_else(|| anyhow!("--trial-days is out of range (got {})", days))?,
        ),
        None => None,
    };

    let next_billing_date = match (&args.next, trial_end) {
        (Some(next), _) => start_of_day(parse_date_arg(next, "--next")?),
        // Trials bill first when they end
        (None, Some(end)) => end,
        (None, None) => advance_billing_date(now, cycle).unwrap_or(now),
    };

    let mut sub = Subscription::new(args.name.trim(), args.price, cycle, next_billing_date)
        .with_category(category);

    if let Some(end) = trial_end {
        sub = sub.with_trial(now, end, args.price_after_trial, args.convert);
    }

    validate(&sub)?;
    Ok(sub)
}

pub fn cmd_add(db: &Database, args: &NewSubscriptionArgs) -> Result<()> {
    let sub = build_subscription(args)?;
    let id = db
        .insert_subscription(&sub)
        .context("Failed to save subscription")?;

    println!(
        "✅ Added {} (ID: {}) at ${:.2}/{}",
        sub.name, id, sub.price, sub.billing_cycle
    );
    if let Some(end) = sub.trial_end_date {
        let outcome = if sub.will_convert_to_paid {
            "converts to paid"
        } else {
            "cancels"
        };
        println!("   ⏳ Free trial {} on {}", outcome, end.format("%Y-%m-%d"));
    } else if sub.billing_cycle.is_recurring() {
        println!(
            "   📅 Next billing date: {}",
            sub.next_billing_date.format("%Y-%m-%d")
        );
    }

    Ok(())
}

pub fn cmd_record(
    db: &Database,
    amount: f64,
    description: &str,
    date: Option<&str>,
    category: &str,
    recurring: bool,
    tags: Vec<String>,
) -> Result<()> {
    if !amount.is_finite() {
        return Err(anyhow!("Amount must be a finite number"));
    }
    let date = match date {
        Some(value) => parse_date_arg(value, "--date")?,
        None => Utc::now().date_naive(),
    };
    let category: Category = category.parse().map_err(|e: String| anyhow!(e))?;

    let tx = NewTransaction {
        amount,
        date,
        description: description.to_string(),
        category,
        is_recurring: recurring,
        tags,
    };
    let id = db
        .insert_transaction(&tx)
        .context("Failed to save transaction")?;

    println!(
        "✅ Recorded ${:.2} for {} on {} (ID: {})",
        amount, description, date, id
    );
    Ok(())
}

pub fn cmd_list(db: &Database, json: bool) -> Result<()> {
    let subscriptions = db.all_subscriptions()?;

    if json {
        return print_json(&subscriptions);
    }

    if subscriptions.is_empty() {
        println!("No subscriptions yet. Run:");
        println!("  cadence add NAME PRICE --cycle monthly");
        return Ok(());
    }

    println!();
    println!("📋 Subscriptions");
    println!("   ─────────────────────────────────────────────────────────────");

    for sub in &subscriptions {
        let status_icon = match sub.state() {
            SubscriptionState::Active => "✅",
            SubscriptionState::Trialing => "⏳",
            SubscriptionState::Paused => "⏸️",
            SubscriptionState::Cancelled => "❌",
        };

        let next = if sub.is_lifetime() {
            "-".to_string()
        } else {
            sub.next_billing_date.format("%Y-%m-%d").to_string()
        };

        println!(
            "   {} {:>4} {:20} │ {:>8}/{:<10} │ {:>8}/mo │ next {}",
            status_icon,
            sub.id,
            truncate(&sub.name, 20),
            format!("${:.2}", sub.price),
            sub.billing_cycle.as_str(),
            format!("${:.2}", sub.monthly_equivalent()),
            next
        );
    }

    Ok(())
}

pub fn cmd_use(db: &Database, id: i64) -> Result<()> {
    db.record_usage(id, Utc::now())
        .with_context(|| format!("Failed to record usage for subscription {}", id))?;
    println!("✅ Usage recorded for subscription {}", id);
    Ok(())
}
