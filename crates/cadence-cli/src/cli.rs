//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Cadence - Track subscriptions and the money they cost you
#[derive(Parser)]
#[command(name = "cadence")]
#[command(about = "Subscription analytics and billing-cycle engine", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path
    #[arg(long, default_value = "cadence.db", global = true)]
    pub db: PathBuf,

    /// Engine config file (defaults to the platform data dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print results as JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database
    Init,

    /// Add a subscription
    Add {
        /// Display name
        name: String,

        /// Price per billing cycle
        price: f64,

        /// Billing cycle: daily, weekly, biweekly, monthly, quarterly, semiannual, annual, lifetime
        #[arg(short, long, default_value = "monthly")]
        cycle: String,

        /// Category (streaming, music, software, ...)
        #[arg(long, default_value = "other")]
        category: String,

        /// Next billing date (YYYY-MM-DD, defaults to one cycle from today)
        #[arg(long)]
        next: Option<String>,

        /// Start a free trial lasting this many days
        #[arg(long)]
        trial_days: Option<i64>,

        /// Price charged once the trial converts
        #[arg(long, requires = "trial_days")]
        price_after_trial: Option<f64>,

        /// Convert to paid when the trial ends instead of cancelling
        #[arg(long, requires = "trial_days")]
        convert: bool,
    },

    /// Record a transaction
    Record {
        /// Amount (negative for refunds)
        #[arg(allow_negative_numbers = true)]
        amount: f64,

        /// Description
        description: String,

        /// Transaction date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,

        /// Category
        #[arg(long, default_value = "other")]
        category: String,

        /// Mark as a recurring charge
        #[arg(long)]
        recurring: bool,

        /// Free-form tag (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,
    },

    /// List subscriptions
    List,

    /// Record one use of a subscription
    Use {
        /// Subscription ID
        id: i64,
    },

    /// Pause a subscription
    Pause {
        /// Subscription ID
        id: i64,
    },

    /// Resume a paused or cancelled subscription
    Resume {
        /// Subscription ID
        id: i64,
    },

    /// Cancel a subscription
    Cancel {
        /// Subscription ID
        id: i64,
    },

    /// Change a subscription's price (recorded in price history)
    SetPrice {
        /// Subscription ID
        id: i64,

        /// New price per billing cycle
        price: f64,
    },

    /// Process overdue renewals and expired trials
    Process,

    /// Show spending trend over a range
    Trend {
        /// Range: week, month, quarter, year
        #[arg(short, long, default_value = "month")]
        range: String,
    },

    /// Show monthly spend by category
    Breakdown,

    /// Compare spending with the same period last year
    Yoy,

    /// Forecast monthly spend
    Forecast {
        /// Months ahead (defaults to the configured horizon)
        #[arg(short, long)]
        months: Option<u32>,
    },

    /// Show ranked savings suggestions
    Suggestions,

    /// Show subscriptions that have gone unused
    Unused {
        /// Window: reminder (30d), savings (60d), cancellation (90d) or a day count
        #[arg(short, long, default_value = "savings")]
        window: String,
    },

    /// Show subscriptions worth cancelling
    Cancellations,

    /// Show database status and a billing overview
    Status,
}
