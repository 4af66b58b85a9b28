//! Time-boxed memoization of analytics results
//!
//! All entries share one populated-at timestamp. A read that finds the cache
//! expired drops every entry first, so recomputing one value never extends
//! the life of the others. Callers pass `now` explicitly.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::bucketing::DateRange;

use super::types::{CategorySpending, ForecastValue, SpendingDataPoint};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
    pub entries: usize,
}

pub struct AnalyticsCache {
    ttl: Duration,
    populated_at: Option<Instant>,
    trends: HashMap<DateRange, Vec<SpendingDataPoint>>,
    category_breakdown: Option<Vec<CategorySpending>>,
    monthly_average: Option<f64>,
    /// Most recent forecast and its horizon in months
    forecast: Option<(u32, Vec<ForecastValue>)>,
    hits: u64,
    misses: u64,
}

impl AnalyticsCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            populated_at: None,
            trends: HashMap::new(),
            category_breakdown: None,
            monthly_average: None,
            forecast: None,
            hits: 0,
            misses: 0,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Populated less than one TTL before `now`
    pub fn is_valid(&self, now: Instant) -> bool {
        self.populated_at
            .is_some_and(|at| now.saturating_duration_since(at) < self.ttl)
    }

    pub fn trend(&mut self, range: &DateRange, now: Instant) -> Option<Vec<SpendingDataPoint>> {
        self.expire_if_stale(now);
        let found = self.trends.get(range).cloned();
        self.record(found)
    }

    pub fn put_trend(&mut self, range: DateRange, points: Vec<SpendingDataPoint>, now: Instant) {
        self.expire_if_stale(now);
        self.trends.insert(range, points);
        self.touch(now);
    }

    pub fn category_breakdown(&mut self, now: Instant) -> Option<Vec<CategorySpending>> {
        self.expire_if_stale(now);
        let found = self.category_breakdown.clone();
        self.record(found)
    }

    pub fn put_category_breakdown(&mut self, breakdown: Vec<CategorySpending>, now: Instant) {
        self.expire_if_stale(now);
        self.category_breakdown = Some(breakdown);
        self.touch(now);
    }

    pub fn monthly_average(&mut self, now: Instant) -> Option<f64> {
        self.expire_if_stale(now);
        let found = self.monthly_average;
        self.record(found)
    }

    pub fn put_monthly_average(&mut self, average: f64, now: Instant) {
        self.expire_if_stale(now);
        self.monthly_average = Some(average);
        self.touch(now);
    }

    /// The cached forecast, only if it was computed for the same horizon
    pub fn forecast(&mut self, months: u32, now: Instant) -> Option<Vec<ForecastValue>> {
        self.expire_if_stale(now);
        let found = self
            .forecast
            .as_ref()
            .filter(|(horizon, _)| *horizon == months)
            .map(|(_, values)| values.clone());
        self.record(found)
    }

    pub fn put_forecast(&mut self, months: u32, values: Vec<ForecastValue>, now: Instant) {
        self.expire_if_stale(now);
        self.forecast = Some((months, values));
        self.touch(now);
    }

    /// Drop every entry (call after any store mutation)
    pub fn clear(&mut self) {
        self.trends.clear();
        self.category_breakdown = None;
        self.monthly_average = None;
        self.forecast = None;
        self.populated_at = None;
    }

    pub fn len(&self) -> usize {
        self.trends.len()
            + usize::from(self.category_breakdown.is_some())
            + usize::from(self.monthly_average.is_some())
            + usize::from(self.forecast.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let total = self.hits + self.misses;
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            hit_rate: if total > 0 {
                self.hits as f64 / total as f64
            } else {
                0.0
            },
            entries: self.len(),
        }
    }

    fn expire_if_stale(&mut self, now: Instant) {
        if self.populated_at.is_some() && !self.is_valid(now) {
            tracing::debug!(entries = self.len(), "Analytics cache expired");
            self.clear();
        }
    }

    // The first insert after a clear starts the shared window
    fn touch(&mut self, now: Instant) {
        if self.populated_at.is_none() {
            self.populated_at = Some(now);
        }
    }

    fn record<T>(&mut self, found: Option<T>) -> Option<T> {
        if found.is_some() {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn range() -> DateRange {
        DateRange::month(NaiveDate::from_ymd_opt(2026, 10, 19).unwrap())
    }

    fn point(total: f64) -> SpendingDataPoint {
        SpendingDataPoint {
            date: NaiveDate::from_ymd_opt(2026, 10, 1).unwrap(),
            total,
            subscriptions: total,
            transactions: 0.0,
            is_significant: false,
        }
    }

    #[test]
    fn test_hit_within_ttl() {
        let start = Instant::now();
        let mut cache = AnalyticsCache::new(Duration::from_secs(300));

        assert!(cache.trend(&range(), start).is_none());
        cache.put_trend(range(), vec![point(20.0)], start);

        let later = start + Duration::from_secs(299);
        assert_eq!(cache.trend(&range(), later), Some(vec![point(20.0)]));

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entries, 1);
    }

    #[test]
    fn test_expiry_drops_every_entry() {
        let start = Instant::now();
        let mut cache = AnalyticsCache::new(Duration::from_secs(300));

        cache.put_trend(range(), vec![point(20.0)], start);
        cache.put_category_breakdown(vec![], start);
        cache.put_monthly_average(20.0, start);
        assert_eq!(cache.len(), 3);

        let expired = start + Duration::from_secs(300);
        assert!(!cache.is_valid(expired));
        assert!(cache.monthly_average(expired).is_none());
        assert!(cache.is_empty());

        // Refreshing one value does not bring the others back
        cache.put_monthly_average(25.0, expired);
        assert_eq!(cache.monthly_average(expired), Some(25.0));
        assert!(cache.trend(&range(), expired).is_none());
        assert!(cache.category_breakdown(expired).is_none());
    }

    #[test]
    fn test_new_entries_share_the_original_window() {
        let start = Instant::now();
        let mut cache = AnalyticsCache::new(Duration::from_secs(300));

        cache.put_monthly_average(20.0, start);
        cache.put_category_breakdown(vec![], start + Duration::from_secs(200));

        let after_first_window = start + Duration::from_secs(301);
        assert!(cache.category_breakdown(after_first_window).is_none());
    }

    #[test]
    fn test_forecast_keyed_by_horizon() {
        let now = Instant::now();
        let mut cache = AnalyticsCache::new(Duration::from_secs(300));
        let value = ForecastValue {
            date: NaiveDate::from_ymd_opt(2026, 11, 1).unwrap(),
            predicted: 10.0,
            confidence: 0.92,
            lower_bound: 9.84,
            upper_bound: 10.16,
        };

        cache.put_forecast(3, vec![value.clone()], now);
        assert!(cache.forecast(6, now).is_none());
        assert_eq!(cache.forecast(3, now), Some(vec![value]));

        // A new horizon replaces the old one
        cache.put_forecast(6, vec![], now);
        assert!(cache.forecast(3, now).is_none());
    }

    #[test]
    fn test_clear() {
        let now = Instant::now();
        let mut cache = AnalyticsCache::new(Duration::from_secs(300));
        cache.put_monthly_average(20.0, now);

        cache.clear();
        assert!(!cache.is_valid(now));
        assert!(cache.monthly_average(now).is_none());
    }
}
