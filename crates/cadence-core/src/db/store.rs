//! `SubscriptionStore` over SQLite
//!
//! rusqlite calls are synchronous; they run inline on the calling task since
//! every query here is a short local read or single-row write.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::Database;
use crate::error::Result;
use crate::models::{PriceChange, Subscription, Transaction};
use crate::store::SubscriptionStore;

#[async_trait]
impl SubscriptionStore for Database {
    async fn list_subscriptions(&self) -> Result<Vec<Subscription>> {
        self.all_subscriptions()
    }

    async fn list_transactions(&self) -> Result<Vec<Transaction>> {
        self.all_transactions()
    }

    async fn update_subscription(&self, subscription: &Subscription) -> Result<()> {
        self.save_subscription(subscription)
    }

    async fn append_price_change(&self, change: &PriceChange) -> Result<()> {
        self.insert_price_change(change).map(|_| ())
    }

    async fn list_price_changes(
        &self,
        subscription_id: Option<i64>,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<PriceChange>> {
        self.price_changes(subscription_id, since)
    }
}
