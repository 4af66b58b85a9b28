//! Analytics service
//!
//! Reads records through the storage collaborator and serves the trend,
//! forecast and detection engines. Trend series, category breakdown, monthly
//! average and forecast go through the cache; everything else is computed
//! fresh on each call.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::debug;

use crate::bucketing::DateRange;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::models::Subscription;
use crate::store::SubscriptionStore;

use super::cache::{AnalyticsCache, CacheStats};
use super::detection::{self, UnusedWindow};
use super::forecast;
use super::trends;
use super::types::{
    AnnualConversion, CategorySpending, ForecastValue, PriceIncrease, SavingsSuggestion,
    SpendingDataPoint, SpendingStatistics, TrendAnalysis, YearOverYearComparison,
};

/// Single-owner analytics front end
///
/// Cached queries take `&mut self`; the owner serializes access.
pub struct Analytics {
    store: Arc<dyn SubscriptionStore>,
    cache: AnalyticsCache,
    config: EngineConfig,
}

impl Analytics {
    pub fn new(store: Arc<dyn SubscriptionStore>, config: EngineConfig) -> Self {
        Self {
            store,
            cache: AnalyticsCache::new(config.cache_ttl),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Drop all cached results; call after mutating the store
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub async fn spending_trend(&mut self, range: &DateRange) -> Result<Vec<SpendingDataPoint>> {
        if let Some(points) = self.cache.trend(range, Instant::now()) {
            return Ok(points);
        }

        let subscriptions = self.store.list_subscriptions().await?;
        let transactions = self.store.list_transactions().await?;
        let points = trends::spending_trend(&subscriptions, &transactions, range);

        debug!(range = range.kind.as_str(), points = points.len(), "Computed spending trend");
        self.cache.put_trend(*range, points.clone(), Instant::now());
        Ok(points)
    }

    pub async fn spending_statistics(&mut self, range: &DateRange) -> Result<SpendingStatistics> {
        let points = self.spending_trend(range).await?;
        Ok(trends::spending_statistics(&points))
    }

    pub async fn spending_anomalies(&mut self, range: &DateRange) -> Result<Vec<SpendingDataPoint>> {
        let points = self.spending_trend(range).await?;
        Ok(trends::spending_anomalies(&points))
    }

    pub async fn linear_trend_analysis(&mut self, range: &DateRange) -> Result<TrendAnalysis> {
        let points = self.spending_trend(range).await?;
        Ok(trends::linear_trend_analysis(&points))
    }

    pub async fn category_breakdown(&mut self) -> Result<Vec<CategorySpending>> {
        if let Some(breakdown) = self.cache.category_breakdown(Instant::now()) {
            return Ok(breakdown);
        }

        let subscriptions = self.store.list_subscriptions().await?;
        let breakdown = trends::category_breakdown(&subscriptions);
        self.cache
            .put_category_breakdown(breakdown.clone(), Instant::now());
        Ok(breakdown)
    }

    pub async fn monthly_average(&mut self) -> Result<f64> {
        if let Some(average) = self.cache.monthly_average(Instant::now()) {
            return Ok(average);
        }

        let subscriptions = self.store.list_subscriptions().await?;
        let transactions = self.store.list_transactions().await?;
        let average =
            trends::monthly_average(&subscriptions, &transactions, Utc::now().date_naive());
        self.cache.put_monthly_average(average, Instant::now());
        Ok(average)
    }

    pub async fn forecast(&mut self, months: u32) -> Result<Vec<ForecastValue>> {
        if let Some(values) = self.cache.forecast(months, Instant::now()) {
            return Ok(values);
        }

        let subscriptions = self.store.list_subscriptions().await?;
        let transactions = self.store.list_transactions().await?;
        let values = forecast::forecast(
            &subscriptions,
            &transactions,
            Utc::now().date_naive(),
            months,
        );

        debug!(months, "Computed forecast");
        self.cache.put_forecast(months, values.clone(), Instant::now());
        Ok(values)
    }

    pub async fn total_monthly_cost(&self) -> Result<f64> {
        let subscriptions = self.store.list_subscriptions().await?;
        Ok(trends::total_monthly_cost(&subscriptions))
    }

    pub async fn year_over_year(&self) -> Result<YearOverYearComparison> {
        let transactions = self.store.list_transactions().await?;
        Ok(trends::year_over_year(
            &transactions,
            Utc::now().date_naive(),
        ))
    }

    pub async fn detect_unused(&self, window: UnusedWindow) -> Result<Vec<Subscription>> {
        let subscriptions = self.store.list_subscriptions().await?;
        Ok(detection::detect_unused(&subscriptions, Utc::now(), window))
    }

    pub async fn detect_price_increases(&self) -> Result<Vec<PriceIncrease>> {
        let subscriptions = self.store.list_subscriptions().await?;
        let changes = self.store.list_price_changes(None, None).await?;
        Ok(detection::detect_price_increases(
            &subscriptions,
            &changes,
            Utc::now(),
            self.config.price_increase_lookback_days,
        ))
    }

    pub async fn detect_trials_ending(&self) -> Result<Vec<Subscription>> {
        let subscriptions = self.store.list_subscriptions().await?;
        Ok(detection::detect_trials_ending(
            &subscriptions,
            Utc::now(),
            self.config.trial_ending_window_days,
        ))
    }

    pub async fn annual_conversion_candidates(&self) -> Result<Vec<AnnualConversion>> {
        let subscriptions = self.store.list_subscriptions().await?;
        Ok(detection::annual_conversion_candidates(&subscriptions))
    }

    pub async fn savings_suggestions(&self) -> Result<Vec<SavingsSuggestion>> {
        let subscriptions = self.store.list_subscriptions().await?;
        let changes = self.store.list_price_changes(None, None).await?;
        Ok(detection::savings_suggestions(
            &subscriptions,
            &changes,
            Utc::now(),
            &self.config,
        ))
    }

    pub async fn cancellation_candidates(&self) -> Result<Vec<Subscription>> {
        let subscriptions = self.store.list_subscriptions().await?;
        Ok(detection::cancellation_candidates(
            &subscriptions,
            Utc::now(),
            self.config.cancellation_trial_window_days,
        ))
    }
}
