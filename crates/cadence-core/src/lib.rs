//! Cadence Core Library
//!
//! Subscription analytics and billing-cycle engine:
//! - Data model for subscriptions, transactions and price history
//! - Time bucketing and least-squares regression utilities
//! - Billing-cycle state machine (renewal, pause/resume, cancellation, trials)
//! - Trend, forecast and savings-detection engines behind a TTL cache
//! - Storage and event collaborator traits, with a SQLite store
//! - Engine configuration loading

pub mod analytics;
pub mod billing;
pub mod bucketing;
pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod models;
pub mod regression;
pub mod store;

/// Test utilities: in-memory store and recording event sinks
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use analytics::{Analytics, UnusedWindow};
pub use billing::{BillingEngine, RenewalReport, TrialReport};
pub use bucketing::{BucketUnit, DateRange, RangeKind};
pub use config::EngineConfig;
pub use db::Database;
pub use error::{Error, Result};
pub use events::{BillingEvent, BillingEvents, NoopEvents, TracingEvents};
pub use regression::LinearFit;
pub use store::SubscriptionStore;
