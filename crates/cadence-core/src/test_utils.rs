//! Test utilities for cadence-core
//!
//! In-memory collaborators for exercising the billing and analytics engines
//! without SQLite: a store with injectable write failures and event sinks that
//! record or reject every event.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::{Error, Result};
use crate::events::{BillingEvent, BillingEvents};
use crate::models::{PriceChange, Subscription, Transaction};
use crate::store::SubscriptionStore;

/// Store backed by vectors behind a mutex
#[derive(Default)]
pub struct MemoryStore {
    subscriptions: Mutex<Vec<Subscription>>,
    transactions: Mutex<Vec<Transaction>>,
    price_changes: Mutex<Vec<PriceChange>>,
    failing_updates: Mutex<HashSet<i64>>,
    reads: Mutex<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_subscriptions(subscriptions: Vec<Subscription>) -> Self {
        let store = Self::default();
        *store.subscriptions.lock().unwrap() = subscriptions;
        store
    }

    pub fn with_transactions(self, transactions: Vec<Transaction>) -> Self {
        *self.transactions.lock().unwrap() = transactions;
        self
    }

    pub fn with_price_changes(self, changes: Vec<PriceChange>) -> Self {
        *self.price_changes.lock().unwrap() = changes;
        self
    }

    /// Make every update of this subscription fail
    pub fn fail_updates_for(&self, id: i64) {
        self.failing_updates.lock().unwrap().insert(id);
    }

    /// Replace the stored subscription list (simulates an external write)
    pub fn set_subscriptions(&self, subscriptions: Vec<Subscription>) {
        *self.subscriptions.lock().unwrap() = subscriptions;
    }

    /// Number of list calls served, for cache hit assertions
    pub fn read_count(&self) -> usize {
        *self.reads.lock().unwrap()
    }

    fn record_read(&self) {
        *self.reads.lock().unwrap() += 1;
    }
}

#[async_trait]
impl SubscriptionStore for MemoryStore {
    async fn list_subscriptions(&self) -> Result<Vec<Subscription>> {
        self.record_read();
        Ok(self.subscriptions.lock().unwrap().clone())
    }

    async fn list_transactions(&self) -> Result<Vec<Transaction>> {
        self.record_read();
        Ok(self.transactions.lock().unwrap().clone())
    }

    async fn update_subscription(&self, subscription: &Subscription) -> Result<()> {
        if self.failing_updates.lock().unwrap().contains(&subscription.id) {
            return Err(Error::InvalidData(format!(
                "Injected update failure for subscription {}",
                subscription.id
            )));
        }

        let mut subs = self.subscriptions.lock().unwrap();
        let slot = subs
            .iter_mut()
            .find(|s| s.id == subscription.id)
            .ok_or_else(|| Error::NotFound(format!("Subscription {}", subscription.id)))?;
        *slot = subscription.clone();
        Ok(())
    }

    async fn append_price_change(&self, change: &PriceChange) -> Result<()> {
        let mut changes = self.price_changes.lock().unwrap();
        let mut stored = change.clone();
        stored.id = changes.len() as i64 + 1;
        changes.push(stored);
        Ok(())
    }

    async fn list_price_changes(
        &self,
        subscription_id: Option<i64>,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<PriceChange>> {
        let mut changes: Vec<PriceChange> = self
            .price_changes
            .lock()
            .unwrap()
            .iter()
            .filter(|c| subscription_id.map_or(true, |id| c.subscription_id == id))
            .filter(|c| since.map_or(true, |s| c.change_date >= s))
            .cloned()
            .collect();
        changes.sort_by_key(|c| c.change_date);
        Ok(changes)
    }
}

/// Sink that keeps every event it receives
#[derive(Default)]
pub struct RecordingEvents {
    events: Mutex<Vec<BillingEvent>>,
}

impl RecordingEvents {
    pub fn events(&self) -> Vec<BillingEvent> {
        self.events.lock().unwrap().clone()
    }

    fn push(&self, event: BillingEvent) -> Result<()> {
        self.events.lock().unwrap().push(event);
        Ok(())
    }
}

impl BillingEvents for RecordingEvents {
    fn on_renewed(&self, subscription: &Subscription, next: DateTime<Utc>) -> Result<()> {
        self.push(BillingEvent::Renewed {
            subscription_id: subscription.id,
            next_billing_date: next,
        })
    }

    fn on_price_increased(&self, subscription: &Subscription, old: f64, new: f64) -> Result<()> {
        self.push(BillingEvent::PriceIncreased {
            subscription_id: subscription.id,
            old_price: old,
            new_price: new,
        })
    }

    fn on_trial_converted(&self, subscription: &Subscription) -> Result<()> {
        self.push(BillingEvent::TrialConverted {
            subscription_id: subscription.id,
        })
    }

    fn on_reminder_settings_changed(&self, subscription: &Subscription) -> Result<()> {
        self.push(BillingEvent::ReminderSettingsChanged {
            subscription_id: subscription.id,
        })
    }
}

/// Sink whose every delivery fails
pub struct FailingEvents;

impl BillingEvents for FailingEvents {
    fn on_renewed(&self, _: &Subscription, _: DateTime<Utc>) -> Result<()> {
        Err(Error::Event("scheduler unavailable".to_string()))
    }

    fn on_price_increased(&self, _: &Subscription, _: f64, _: f64) -> Result<()> {
        Err(Error::Event("scheduler unavailable".to_string()))
    }

    fn on_trial_converted(&self, _: &Subscription) -> Result<()> {
        Err(Error::Event("scheduler unavailable".to_string()))
    }

    fn on_reminder_settings_changed(&self, _: &Subscription) -> Result<()> {
        Err(Error::Event("scheduler unavailable".to_string()))
    }
}
