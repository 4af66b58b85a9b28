//! Billing event collaborator
//!
//! The state machine reports renewals, price increases, trial conversions and
//! reminder-affecting transitions so an external scheduler can reschedule or
//! cancel notifications. Delivery is fire-and-forget: an `Err` from a sink is
//! logged by the caller and never fails the transition that produced it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Result;
use crate::models::Subscription;

pub trait BillingEvents: Send + Sync {
    /// The subscription's billing date moved forward after a renewal
    fn on_renewed(&self, subscription: &Subscription, next_billing_date: DateTime<Utc>)
        -> Result<()>;

    /// A price edit raised the subscription's price
    fn on_price_increased(
        &self,
        subscription: &Subscription,
        old_price: f64,
        new_price: f64,
    ) -> Result<()>;

    /// A free trial turned into a paid subscription
    fn on_trial_converted(&self, subscription: &Subscription) -> Result<()>;

    /// Billing cadence or status changed; reminders need rescheduling
    fn on_reminder_settings_changed(&self, subscription: &Subscription) -> Result<()>;
}

/// Owned form of an emitted event, for sinks that queue or record events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BillingEvent {
    Renewed {
        subscription_id: i64,
        next_billing_date: DateTime<Utc>,
    },
    PriceIncreased {
        subscription_id: i64,
        old_price: f64,
        new_price: f64,
    },
    TrialConverted {
        subscription_id: i64,
    },
    ReminderSettingsChanged {
        subscription_id: i64,
    },
}

impl BillingEvent {
    pub fn subscription_id(&self) -> i64 {
        match self {
            Self::Renewed {
                subscription_id, ..
            }
            | Self::PriceIncreased {
                subscription_id, ..
            }
            | Self::TrialConverted { subscription_id }
            | Self::ReminderSettingsChanged { subscription_id } => *subscription_id,
        }
    }
}

/// Sink that writes every event to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEvents;

impl BillingEvents for TracingEvents {
    fn on_renewed(
        &self,
        subscription: &Subscription,
        next_billing_date: DateTime<Utc>,
    ) -> Result<()> {
        info!(
            subscription_id = subscription.id,
            name = %subscription.name,
            next_billing_date = %next_billing_date.format("%Y-%m-%d"),
            "Subscription renewed"
        );
        Ok(())
    }

    fn on_price_increased(
        &self,
        subscription: &Subscription,
        old_price: f64,
        new_price: f64,
    ) -> Result<()> {
        info!(
            subscription_id = subscription.id,
            name = %subscription.name,
            old_price,
            new_price,
            "Subscription price increased"
        );
        Ok(())
    }

    fn on_trial_converted(&self, subscription: &Subscription) -> Result<()> {
        info!(
            subscription_id = subscription.id,
            name = %subscription.name,
            price = subscription.price,
            "Trial converted to paid"
        );
        Ok(())
    }

    fn on_reminder_settings_changed(&self, subscription: &Subscription) -> Result<()> {
        info!(
            subscription_id = subscription.id,
            name = %subscription.name,
            state = %subscription.state(),
            "Reminder settings changed"
        );
        Ok(())
    }
}

/// Sink that drops every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEvents;

impl BillingEvents for NoopEvents {
    fn on_renewed(&self, _: &Subscription, _: DateTime<Utc>) -> Result<()> {
        Ok(())
    }

    fn on_price_increased(&self, _: &Subscription, _: f64, _: f64) -> Result<()> {
        Ok(())
    }

    fn on_trial_converted(&self, _: &Subscription) -> Result<()> {
        Ok(())
    }

    fn on_reminder_settings_changed(&self, _: &Subscription) -> Result<()> {
        Ok(())
    }
}
