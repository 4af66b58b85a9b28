//! Detection and recommendation engine
//!
//! Scans subscriptions and price history for savings opportunities:
//! - Unused subscriptions (no use within a named window)
//! - Recent price increases
//! - Free trials about to start charging
//! - Monthly plans that would be cheaper billed annually

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::billing::is_trial_expiring;
use crate::config::{EngineConfig, MAX_WINDOW_DAYS};
use crate::models::{BillingCycle, PriceChange, Subscription};

use super::types::{
    AnnualConversion, PriceIncrease, Priority, SavingsSuggestion, SuggestionKind,
};

/// Annual plans are assumed to cost this many monthly payments
pub const ANNUAL_PLAN_MONTHS: f64 = 10.0;
/// Cheapest monthly plan worth converting
pub const MIN_CONVERSION_PRICE: f64 = 5.0;
/// Smallest yearly saving worth suggesting a conversion for
pub const MIN_CONVERSION_SAVINGS: f64 = 10.0;

/// How long without use before a subscription counts as unused
///
/// Each consumer has its own default: reminders nudge early, savings
/// suggestions wait longer, and cancellation advice waits longest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnusedWindow {
    /// 30 days
    Reminder,
    /// 60 days
    Savings,
    /// 90 days
    Cancellation,
    Custom(i64),
}

impl UnusedWindow {
    pub fn days(&self) -> i64 {
        match self {
            UnusedWindow::Reminder => 30,
            UnusedWindow::Savings => 60,
            UnusedWindow::Cancellation => 90,
            UnusedWindow::Custom(days) => *days,
        }
    }
}

impl std::str::FromStr for UnusedWindow {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "reminder" => Ok(UnusedWindow::Reminder),
            "savings" => Ok(UnusedWindow::Savings),
            "cancellation" => Ok(UnusedWindow::Cancellation),
            other => other
                .parse::<i64>()
                .ok()
                .filter(|days| (0..=MAX_WINDOW_DAYS).contains(days))
                .map(UnusedWindow::Custom)
                .ok_or_else(|| {
                    format!(
                        "Unknown window: {} (valid: reminder, savings, cancellation, or 0 to {} days)",
                        s, MAX_WINDOW_DAYS
                    )
                }),
        }
    }
}

/// `now` minus `days`, or `None` when that falls outside the representable range
fn days_before(now: DateTime<Utc>, days: i64) -> Option<DateTime<Utc>> {
    Duration::try_days(days).and_then(|d| now.checked_sub_signed(d))
}

/// Active and not used within `window`
///
/// Never-used subscriptions count from their creation date. A window reaching
/// past the earliest representable date never flags anything.
pub fn is_unused(sub: &Subscription, now: DateTime<Utc>, window: UnusedWindow) -> bool {
    if !sub.is_active {
        return false;
    }

    let Some(cutoff) = days_before(now, window.days()) else {
        return false;
    };
    match sub.last_used_date {
        Some(last_used) => last_used < cutoff,
        None => sub.usage_count == 0 && sub.created_date < cutoff,
    }
}

pub fn detect_unused(
    subscriptions: &[Subscription],
    now: DateTime<Utc>,
    window: UnusedWindow,
) -> Vec<Subscription> {
    subscriptions
        .iter()
        .filter(|s| is_unused(s, now, window))
        .cloned()
        .collect()
}

/// Active subscriptions whose latest price change is an increase inside the lookback
pub fn detect_price_increases(
    subscriptions: &[Subscription],
    changes: &[PriceChange],
    now: DateTime<Utc>,
    lookback_days: i64,
) -> Vec<PriceIncrease> {
    let since = days_before(now, lookback_days).unwrap_or(DateTime::<Utc>::MIN_UTC);

    subscriptions
        .iter()
        .filter(|s| s.is_active)
        .filter_map(|sub| {
            let latest = changes
                .iter()
                .filter(|c| c.subscription_id == sub.id)
                .max_by_key(|c| (c.change_date, c.id))?;

            (latest.change_date >= since && latest.change_date <= now && latest.is_increase())
                .then(|| PriceIncrease {
                    subscription: sub.clone(),
                    change: latest.clone(),
                })
        })
        .collect()
}

/// Active trials ending within `window_days` (inclusive, not yet past)
pub fn detect_trials_ending(
    subscriptions: &[Subscription],
    now: DateTime<Utc>,
    window_days: i64,
) -> Vec<Subscription> {
    subscriptions
        .iter()
        .filter(|s| is_trial_expiring(s, now, window_days))
        .cloned()
        .collect()
}

/// Active monthly subscriptions that would save money on an annual plan, best first
pub fn annual_conversion_candidates(subscriptions: &[Subscription]) -> Vec<AnnualConversion> {
    let mut candidates: Vec<AnnualConversion> = subscriptions
        .iter()
        .filter(|s| {
            s.is_active
                && s.billing_cycle == BillingCycle::Monthly
                && s.price >= MIN_CONVERSION_PRICE
        })
        .filter_map(|sub| {
            let annual_price = sub.price * ANNUAL_PLAN_MONTHS;
            let annual_savings = sub.price * 12.0 - annual_price;
            (annual_savings > MIN_CONVERSION_SAVINGS).then(|| AnnualConversion {
                subscription_id: sub.id,
                subscription_name: sub.name.clone(),
                monthly_price: sub.price,
                annual_price,
                annual_savings,
            })
        })
        .collect();

    candidates.sort_by(|a, b| b.annual_savings.total_cmp(&a.annual_savings));
    candidates
}

/// Every savings suggestion, largest potential savings first
pub fn savings_suggestions(
    subscriptions: &[Subscription],
    changes: &[PriceChange],
    now: DateTime<Utc>,
    config: &EngineConfig,
) -> Vec<SavingsSuggestion> {
    let mut suggestions = Vec::new();

    for sub in detect_unused(subscriptions, now, UnusedWindow::Savings) {
        let annual = sub.monthly_equivalent() * 12.0;
        let priority = if annual > 100.0 {
            Priority::High
        } else {
            Priority::Medium
        };
        let reason = match sub.last_used_date {
            Some(last) => format!(
                "Not used since {}. Cancel to save ${:.2}/year",
                last.format("%Y-%m-%d"),
                annual
            ),
            None => format!(
                "Never used since it was added. Cancel to save ${:.2}/year",
                annual
            ),
        };
        suggestions.push(SavingsSuggestion::new(
            SuggestionKind::Unused,
            &sub,
            annual,
            priority,
            reason,
        ));
    }

    for candidate in annual_conversion_candidates(subscriptions) {
        let Some(sub) = subscriptions
            .iter()
            .find(|s| s.id == candidate.subscription_id)
        else {
            continue;
        };
        let priority = if candidate.annual_savings > 50.0 {
            Priority::High
        } else {
            Priority::Medium
        };
        suggestions.push(SavingsSuggestion::new(
            SuggestionKind::AnnualConversion,
            sub,
            candidate.annual_savings,
            priority,
            format!(
                "Switch to annual billing (about ${:.2}/year instead of ${:.2})",
                candidate.annual_price,
                candidate.monthly_price * 12.0
            ),
        ));
    }

    for increase in detect_price_increases(
        subscriptions,
        changes,
        now,
        config.price_increase_lookback_days,
    ) {
        suggestions.push(SavingsSuggestion::new(
            SuggestionKind::PriceIncrease,
            &increase.subscription,
            0.0,
            Priority::Medium,
            format!(
                "Price went from ${:.2} to ${:.2} ({:+.1}%)",
                increase.change.old_price,
                increase.change.new_price,
                increase.change.percent_change()
            ),
        ));
    }

    for sub in detect_trials_ending(subscriptions, now, config.trial_ending_window_days) {
        let price = sub.price_after_trial.unwrap_or(sub.price);
        let ends = sub
            .trial_end_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        suggestions.push(SavingsSuggestion::new(
            SuggestionKind::TrialEnding,
            &sub,
            price * 12.0,
            Priority::Urgent,
            format!("Free trial ends {}. Cancel before it starts charging ${:.2}", ends, price),
        ));
    }

    suggestions.sort_by(|a, b| b.potential_savings.total_cmp(&a.potential_savings));
    suggestions
}

/// Subscriptions worth cancelling: long unused, or trials about to charge
pub fn cancellation_candidates(
    subscriptions: &[Subscription],
    now: DateTime<Utc>,
    trial_window_days: i64,
) -> Vec<Subscription> {
    let mut seen = HashSet::new();

    detect_unused(subscriptions, now, UnusedWindow::Cancellation)
        .into_iter()
        .chain(detect_trials_ending(subscriptions, now, trial_window_days))
        .filter(|s| seen.insert(s.id))
        .collect()
}
