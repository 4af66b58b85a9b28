//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Init and status, plus shared utilities (open_db, load_config)
//! - `subscriptions` - Add, record, list and usage commands
//! - `billing` - Lifecycle transitions, price edits and renewal processing
//! - `reports` - Trend, breakdown, year-over-year, forecast and suggestion reports

pub mod billing;
pub mod core;
pub mod reports;
pub mod subscriptions;

// Re-export command functions for main.rs
pub use billing::*;
pub use core::*;
pub use reports::*;
pub use subscriptions::*;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Pretty-print any result as JSON on stdout
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}

/// Parse a YYYY-MM-DD argument
pub fn parse_date_arg(value: &str, flag: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .with_context(|| format!("Invalid {} date format (use YYYY-MM-DD)", flag))
}

/// Midnight UTC on the given day
pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}
