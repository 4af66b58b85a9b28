//! Storage collaborator interface
//!
//! The engine never owns persistence. It reads subscriptions, transactions and
//! price history through this trait and writes back only the fields the
//! billing-cycle state machine is responsible for. `Database` is the SQLite
//! implementation; tests use an in-memory store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::{PriceChange, Subscription, Transaction};

#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// All subscriptions, in any state
    async fn list_subscriptions(&self) -> Result<Vec<Subscription>>;

    /// All transactions
    async fn list_transactions(&self) -> Result<Vec<Transaction>>;

    /// Replace the stored record with the same id
    ///
    /// Returns `Error::NotFound` if no record has that id.
    async fn update_subscription(&self, subscription: &Subscription) -> Result<()>;

    /// Append a price history record
    async fn append_price_change(&self, change: &PriceChange) -> Result<()>;

    /// Price history ordered by change date (oldest first), optionally
    /// filtered to one subscription and/or changes on or after `since`
    async fn list_price_changes(
        &self,
        subscription_id: Option<i64>,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<PriceChange>>;
}
