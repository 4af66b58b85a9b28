//! Subscription lifecycle transitions and renewal processing
//!
//! The free functions here are pure: they inspect or derive subscription
//! records without touching storage. `BillingEngine` applies them through the
//! storage collaborator and reports the outcome to the event collaborator.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::events::BillingEvents;
use crate::models::{PriceChange, Subscription, SubscriptionState};
use crate::store::SubscriptionStore;

use super::cycle::roll_forward;

/// Active, renewing, and past its billing date
pub fn is_overdue(sub: &Subscription, now: DateTime<Utc>) -> bool {
    sub.is_active && !sub.is_lifetime() && sub.next_billing_date < now
}

/// Whether `date` falls no later than `days` after `now`
///
/// A horizon past the representable range contains every date.
fn within_days_of(date: DateTime<Utc>, now: DateTime<Utc>, days: i64) -> bool {
    match Duration::try_days(days).and_then(|d| now.checked_add_signed(d)) {
        Some(horizon) => date <= horizon,
        None => days > 0,
    }
}

/// Active, renewing, and billing within the next `within_days`
pub fn is_due_soon(sub: &Subscription, now: DateTime<Utc>, within_days: i64) -> bool {
    sub.is_active
        && !sub.is_lifetime()
        && sub.next_billing_date >= now
        && within_days_of(sub.next_billing_date, now, within_days)
}

/// Trial whose end date has passed
pub fn is_trial_expired(sub: &Subscription, now: DateTime<Utc>) -> bool {
    sub.is_free_trial && sub.trial_end_date.is_some_and(|end| end < now)
}

/// Active trial ending within the next `within_days` (inclusive, not past)
pub fn is_trial_expiring(sub: &Subscription, now: DateTime<Utc>, within_days: i64) -> bool {
    sub.is_active
        && sub.is_free_trial
        && sub
            .trial_end_date
            .is_some_and(|end| end >= now && within_days_of(end, now, within_days))
}

/// Reject records that must never reach the store
pub fn validate(sub: &Subscription) -> Result<()> {
    if sub.name.trim().is_empty() {
        return Err(Error::InvalidData(
            "Subscription name is required".to_string(),
        ));
    }
    if !sub.price.is_finite() || sub.price <= 0.0 {
        return Err(Error::InvalidData(format!(
            "Subscription price must be greater than zero (got {})",
            sub.price
        )));
    }
    if let Some(after) = sub.price_after_trial {
        if !after.is_finite() || after <= 0.0 {
            return Err(Error::InvalidData(format!(
                "Price after trial must be greater than zero (got {})",
                after
            )));
        }
    }
    Ok(())
}

/// Next billing date computed fresh from `now` (unchanged for lifetime)
fn next_from_now(sub: &Subscription, now: DateTime<Utc>) -> DateTime<Utc> {
    if sub.is_lifetime() {
        return sub.next_billing_date;
    }
    sub.billing_cycle.advance(now).unwrap_or(now)
}

/// Pause an active subscription
///
/// `Ok(None)` means the subscription is already paused.
pub fn pause(sub: &Subscription) -> Result<Option<Subscription>> {
    match sub.state() {
        SubscriptionState::Paused => Ok(None),
        SubscriptionState::Cancelled => Err(Error::InvalidTransition(format!(
            "Cannot pause cancelled subscription {}",
            sub.id
        ))),
        SubscriptionState::Active | SubscriptionState::Trialing => {
            let mut paused = sub.clone();
            paused.is_active = false;
            Ok(Some(paused))
        }
    }
}

/// Reactivate a paused or cancelled subscription
///
/// A billing date that fell into the past while inactive is recomputed from
/// `now`. `Ok(None)` means the subscription is already active.
pub fn resume(sub: &Subscription, now: DateTime<Utc>) -> Result<Option<Subscription>> {
    match sub.state() {
        SubscriptionState::Active | SubscriptionState::Trialing => Ok(None),
        SubscriptionState::Paused | SubscriptionState::Cancelled => {
            let mut resumed = sub.clone();
            resumed.is_active = true;
            resumed.cancellation_date = None;
            if resumed.next_billing_date < now {
                resumed.next_billing_date = next_from_now(&resumed, now);
            }
            Ok(Some(resumed))
        }
    }
}

/// Cancel a subscription
///
/// `Ok(None)` means the subscription is already cancelled.
pub fn cancel(sub: &Subscription, now: DateTime<Utc>) -> Result<Option<Subscription>> {
    match sub.state() {
        SubscriptionState::Cancelled => Ok(None),
        _ => {
            let mut cancelled = sub.clone();
            cancelled.is_active = false;
            cancelled.cancellation_date = Some(now);
            Ok(Some(cancelled))
        }
    }
}

/// Turn an expired trial into a paid subscription
pub fn convert_trial(sub: &Subscription, now: DateTime<Utc>) -> Subscription {
    let mut paid = sub.clone();
    if let Some(price) = sub.price_after_trial {
        paid.price = price;
    }
    paid.is_free_trial = false;
    paid.trial_start_date = None;
    paid.trial_end_date = None;
    paid.price_after_trial = None;
    paid.will_convert_to_paid = false;
    paid.next_billing_date = next_from_now(&paid, now);
    paid
}

/// Outcome of a renewal pass
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct RenewalReport {
    /// Subscriptions whose billing date moved forward
    pub renewed: usize,
    /// Overdue subscriptions left untouched because the store failed
    pub skipped: usize,
    /// Total billing cycles advanced across all renewed subscriptions
    pub steps: u64,
}

/// Outcome of a trial-expiration pass
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct TrialReport {
    pub converted: usize,
    pub cancelled: usize,
    pub skipped: usize,
}

/// Applies lifecycle transitions through the storage collaborator
pub struct BillingEngine<'a> {
    store: &'a dyn SubscriptionStore,
    events: &'a dyn BillingEvents,
    max_renewal_steps: u32,
    due_soon_days: i64,
}

impl<'a> BillingEngine<'a> {
    pub fn new(store: &'a dyn SubscriptionStore, events: &'a dyn BillingEvents) -> Self {
        Self::with_config(store, events, &EngineConfig::default())
    }

    pub fn with_config(
        store: &'a dyn SubscriptionStore,
        events: &'a dyn BillingEvents,
        config: &EngineConfig,
    ) -> Self {
        Self {
            store,
            events,
            max_renewal_steps: config.max_renewal_steps,
            due_soon_days: config.due_soon_days,
        }
    }

    async fn find(&self, id: i64) -> Result<Subscription> {
        self.store
            .list_subscriptions()
            .await?
            .into_iter()
            .find(|s| s.id == id)
            .ok_or_else(|| Error::NotFound(format!("Subscription {}", id)))
    }

    fn emit(&self, event: &'static str, subscription_id: i64, result: Result<()>) {
        if let Err(e) = result {
            warn!(
                event,
                subscription_id,
                error = %e,
                "Billing event delivery failed"
            );
        }
    }

    /// Overdue subscriptions as of now
    pub async fn overdue(&self) -> Result<Vec<Subscription>> {
        let now = Utc::now();
        let subs = self.store.list_subscriptions().await?;
        Ok(subs.into_iter().filter(|s| is_overdue(s, now)).collect())
    }

    /// Subscriptions billing within the configured due-soon window
    pub async fn due_soon(&self) -> Result<Vec<Subscription>> {
        let now = Utc::now();
        let subs = self.store.list_subscriptions().await?;
        Ok(subs
            .into_iter()
            .filter(|s| is_due_soon(s, now, self.due_soon_days))
            .collect())
    }

    /// Active trials ending within `within_days`
    pub async fn expiring_trials(&self, within_days: i64) -> Result<Vec<Subscription>> {
        let now = Utc::now();
        let subs = self.store.list_subscriptions().await?;
        Ok(subs
            .into_iter()
            .filter(|s| is_trial_expiring(s, now, within_days))
            .collect())
    }

    /// Bring every overdue subscription's billing date up to date
    pub async fn process_overdue_renewals(&self) -> Result<RenewalReport> {
        self.process_overdue_renewals_at(Utc::now()).await
    }

    /// Renewal pass as of `now`
    ///
    /// Each overdue subscription is advanced cycle by cycle until its billing
    /// date is no longer in the past, so one pass leaves nothing overdue even
    /// after a long gap. Expired trials are left to the trial pass. A
    /// subscription the store fails to update is logged and skipped; the rest
    /// of the batch continues.
    pub async fn process_overdue_renewals_at(&self, now: DateTime<Utc>) -> Result<RenewalReport> {
        let subs = self.store.list_subscriptions().await?;
        let mut report = RenewalReport::default();

        for sub in subs
            .iter()
            .filter(|s| is_overdue(s, now) && !is_trial_expired(s, now))
        {
            let (next, steps) = match roll_forward(
                sub.next_billing_date,
                sub.billing_cycle,
                now,
                self.max_renewal_steps,
            ) {
                Some(result) => result,
                None => {
                    warn!(
                        subscription_id = sub.id,
                        cycle = %sub.billing_cycle,
                        "Renewal did not converge, recomputing from now"
                    );
                    (next_from_now(sub, now), 1)
                }
            };

            let mut renewed = sub.clone();
            renewed.next_billing_date = next;

            if let Err(e) = self.store.update_subscription(&renewed).await {
                warn!(
                    subscription_id = sub.id,
                    error = %e,
                    "Failed to persist renewal, skipping"
                );
                report.skipped += 1;
                continue;
            }

            debug!(
                subscription_id = sub.id,
                steps,
                next_billing_date = %next.format("%Y-%m-%d"),
                "Advanced billing date"
            );
            report.renewed += 1;
            report.steps += steps as u64;
            self.emit("renewed", sub.id, self.events.on_renewed(&renewed, next));
        }

        info!(
            renewed = report.renewed,
            skipped = report.skipped,
            steps = report.steps,
            "Renewal processing complete"
        );
        Ok(report)
    }

    /// Convert or cancel every expired trial
    pub async fn process_trial_expirations(&self) -> Result<TrialReport> {
        self.process_trial_expirations_at(Utc::now()).await
    }

    /// Trial-expiration pass as of `now`
    ///
    /// Trials set to convert become paid (adopting the post-trial price and a
    /// fresh billing date); the rest are cancelled.
    pub async fn process_trial_expirations_at(&self, now: DateTime<Utc>) -> Result<TrialReport> {
        let subs = self.store.list_subscriptions().await?;
        let mut report = TrialReport::default();

        for sub in subs
            .iter()
            .filter(|s| s.is_active && is_trial_expired(s, now))
        {
            if sub.will_convert_to_paid {
                let paid = convert_trial(sub, now);

                if let Err(e) = self.store.update_subscription(&paid).await {
                    warn!(subscription_id = sub.id, error = %e, "Failed to convert trial, skipping");
                    report.skipped += 1;
                    continue;
                }

                if paid.price != sub.price {
                    let change = PriceChange::new(sub.id, sub.price, paid.price, now, true);
                    self.record_price_change(&change).await;
                }

                debug!(subscription_id = sub.id, price = paid.price, "Trial converted");
                report.converted += 1;
                self.emit(
                    "trial_converted",
                    sub.id,
                    self.events.on_trial_converted(&paid),
                );
            } else {
                let Some(cancelled) = cancel(sub, now)? else {
                    continue;
                };

                if let Err(e) = self.store.update_subscription(&cancelled).await {
                    warn!(subscription_id = sub.id, error = %e, "Failed to cancel trial, skipping");
                    report.skipped += 1;
                    continue;
                }

                debug!(subscription_id = sub.id, "Trial ended without conversion");
                report.cancelled += 1;
                self.emit(
                    "reminder_settings_changed",
                    sub.id,
                    self.events.on_reminder_settings_changed(&cancelled),
                );
            }
        }

        info!(
            converted = report.converted,
            cancelled = report.cancelled,
            skipped = report.skipped,
            "Trial processing complete"
        );
        Ok(report)
    }

    pub async fn pause(&self, id: i64) -> Result<Subscription> {
        let sub = self.find(id).await?;
        self.apply("pause", sub.clone(), pause(&sub)?).await
    }

    pub async fn resume(&self, id: i64) -> Result<Subscription> {
        let sub = self.find(id).await?;
        let resumed = resume(&sub, Utc::now())?;
        self.apply("resume", sub, resumed).await
    }

    pub async fn cancel(&self, id: i64) -> Result<Subscription> {
        let sub = self.find(id).await?;
        let cancelled = cancel(&sub, Utc::now())?;
        self.apply("cancel", sub, cancelled).await
    }

    async fn apply(
        &self,
        transition: &'static str,
        current: Subscription,
        next: Option<Subscription>,
    ) -> Result<Subscription> {
        let Some(next) = next else {
            debug!(subscription_id = current.id, transition, "Transition is a no-op");
            return Ok(current);
        };

        self.store.update_subscription(&next).await?;
        info!(
            subscription_id = next.id,
            transition,
            state = %next.state(),
            "Subscription transitioned"
        );
        self.emit(
            "reminder_settings_changed",
            next.id,
            self.events.on_reminder_settings_changed(&next),
        );
        Ok(next)
    }

    /// Persist an edited subscription
    ///
    /// Validation runs before anything is written. A changed price is
    /// recorded in the price history, and an increase raises a price alert.
    /// Changes to cycle, billing date or status notify the reminder
    /// scheduler.
    pub async fn update_subscription(&self, updated: Subscription) -> Result<Subscription> {
        validate(&updated)?;
        let current = self.find(updated.id).await?;

        self.store.update_subscription(&updated).await?;

        if updated.price != current.price {
            let change =
                PriceChange::new(updated.id, current.price, updated.price, Utc::now(), false);
            self.record_price_change(&change).await;

            if change.is_increase() {
                self.emit(
                    "price_increased",
                    updated.id,
                    self.events
                        .on_price_increased(&updated, current.price, updated.price),
                );
            }
        }

        let cadence_changed = updated.billing_cycle != current.billing_cycle
            || updated.next_billing_date != current.next_billing_date
            || updated.is_active != current.is_active;
        if cadence_changed {
            self.emit(
                "reminder_settings_changed",
                updated.id,
                self.events.on_reminder_settings_changed(&updated),
            );
        }

        Ok(updated)
    }

    async fn record_price_change(&self, change: &PriceChange) {
        match self.store.append_price_change(change).await {
            Ok(()) => debug!(
                subscription_id = change.subscription_id,
                old_price = change.old_price,
                new_price = change.new_price,
                "Recorded price change"
            ),
            Err(e) => warn!(
                subscription_id = change.subscription_id,
                error = %e,
                "Failed to record price change"
            ),
        }
    }
}
