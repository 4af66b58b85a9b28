//! Result types produced by the analytics engines
//!
//! None of these are persisted; they are computed on demand from subscriptions,
//! transactions and price history.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::models::{Category, PriceChange, Subscription};

/// One bucket of a spending trend series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpendingDataPoint {
    /// Start of the bucket
    pub date: NaiveDate,
    pub total: f64,
    /// Monthly-equivalent cost of currently active subscriptions
    pub subscriptions: f64,
    /// Absolute transaction amounts dated inside the bucket
    pub transactions: f64,
    /// Total exceeds 1.5x the series mean
    pub is_significant: bool,
}

/// Summary of a trend series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpendingStatistics {
    pub total: f64,
    pub average: f64,
    pub peak: f64,
    pub peak_date: Option<NaiveDate>,
    pub significant_points: usize,
    pub points: usize,
}

/// Active subscription cost grouped by category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySpending {
    pub category: Category,
    /// Monthly-equivalent total
    pub total: f64,
    /// Share of the grand total, 0-100
    pub percentage: f64,
    /// Number of subscriptions in the category
    pub count: usize,
}

/// Direction of a fitted trend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Up,
    Down,
    Stable,
}

impl TrendDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrendDirection::Up => "up",
            TrendDirection::Down => "down",
            TrendDirection::Stable => "stable",
        }
    }
}

impl fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Linear fit over a trend series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendAnalysis {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
    /// Change from the first to the last point, in percent
    pub percentage_change: f64,
    /// Fitted value one bucket past the end, never negative
    pub next_prediction: f64,
    pub direction: TrendDirection,
}

/// One projected month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastValue {
    /// First day of the projected month
    pub date: NaiveDate,
    pub predicted: f64,
    /// 0.3 to 1.0, shrinking with horizon
    pub confidence: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
}

/// Year-over-year change for one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryGrowth {
    pub category: Category,
    pub last_year: f64,
    pub this_year: f64,
    /// Percent change; 0 when last year had no spending
    pub growth: f64,
}

/// Year-to-date spending against the same span of the previous year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearOverYearComparison {
    pub this_year_start: NaiveDate,
    pub this_year_end: NaiveDate,
    pub last_year_start: NaiveDate,
    pub last_year_end: NaiveDate,
    pub this_year_total: f64,
    pub last_year_total: f64,
    pub percentage_change: f64,
    /// Categories up more than 5%, fastest growing first (at most 5)
    pub growing: Vec<CategoryGrowth>,
    /// Categories down more than 5%, steepest decline first (at most 5)
    pub declining: Vec<CategoryGrowth>,
}

/// Monthly subscription that would be cheaper on an annual plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnualConversion {
    pub subscription_id: i64,
    pub subscription_name: String,
    pub monthly_price: f64,
    /// Assumed annual plan price (10 months)
    pub annual_price: f64,
    pub annual_savings: f64,
}

/// A subscription whose latest price change was an increase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceIncrease {
    pub subscription: Subscription,
    pub change: PriceChange,
}

/// Kind of savings suggestion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionKind {
    /// Not used within the savings window
    Unused,
    /// Cheaper on an annual plan
    AnnualConversion,
    /// Price went up recently (informational)
    PriceIncrease,
    /// Free trial about to start charging
    TrialEnding,
}

impl SuggestionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SuggestionKind::Unused => "unused",
            SuggestionKind::AnnualConversion => "annual_conversion",
            SuggestionKind::PriceIncrease => "price_increase",
            SuggestionKind::TrialEnding => "trial_ending",
        }
    }
}

impl fmt::Display for SuggestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SuggestionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unused" => Ok(SuggestionKind::Unused),
            "annual_conversion" => Ok(SuggestionKind::AnnualConversion),
            "price_increase" => Ok(SuggestionKind::PriceIncrease),
            "trial_ending" => Ok(SuggestionKind::TrialEnding),
            _ => Err(format!("Unknown suggestion kind: {}", s)),
        }
    }
}

/// How soon a suggestion deserves attention
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A ranked way to reduce spending
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavingsSuggestion {
    pub kind: SuggestionKind,
    pub subscription_id: i64,
    pub subscription_name: String,
    /// Estimated yearly savings (0 for informational suggestions)
    pub potential_savings: f64,
    pub priority: Priority,
    pub reason: String,
}

impl SavingsSuggestion {
    pub fn new(
        kind: SuggestionKind,
        subscription: &Subscription,
        potential_savings: f64,
        priority: Priority,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            subscription_id: subscription.id,
            subscription_name: subscription.name.clone(),
            potential_savings,
            priority,
            reason: reason.into(),
        }
    }
}
