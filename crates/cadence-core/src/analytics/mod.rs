//! Subscription analytics
//!
//! Derives spending trends, category breakdowns, year-over-year comparisons,
//! forecasts and savings suggestions from subscription and transaction
//! records.
//!
//! ## Engines
//!
//! - **Trends** - Bucketed spending series and their projections
//! - **Forecast** - Regression-based monthly spend projection
//! - **Detection** - Unused, price-increase, trial-ending and annual-plan candidates
//!
//! The pure engine functions take records and an explicit date. `Analytics`
//! wraps them with store access and a TTL cache.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cadence_core::analytics::Analytics;
//!
//! let mut analytics = Analytics::new(store, EngineConfig::default());
//! let breakdown = analytics.category_breakdown().await?;
//! let forecast = analytics.forecast(6).await?;
//! ```

pub mod cache;
pub mod detection;
pub mod forecast;
pub mod service;
pub mod trends;
pub mod types;

pub use cache::{AnalyticsCache, CacheStats};
pub use detection::{
    annual_conversion_candidates, cancellation_candidates, detect_price_increases,
    detect_trials_ending, detect_unused, is_unused, savings_suggestions, UnusedWindow,
};
pub use forecast::{forecast_from_history, projected_total};
pub use service::Analytics;
pub use trends::{
    category_breakdown, linear_trend_analysis, monthly_average, series_totals,
    spending_anomalies, spending_statistics, spending_trend, total_monthly_cost, year_over_year,
};
pub use types::{
    AnnualConversion, CategoryGrowth, CategorySpending, ForecastValue, PriceIncrease, Priority,
    SavingsSuggestion, SpendingDataPoint, SpendingStatistics, SuggestionKind, TrendAnalysis,
    TrendDirection, YearOverYearComparison,
};
