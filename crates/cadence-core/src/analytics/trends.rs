//! Trend and aggregation engine
//!
//! `spending_trend` is the one canonical bucketed computation. Statistics,
//! anomalies, chart series and the linear trend are projections of its output.
//!
//! Every bucket carries the present monthly rate of the currently active
//! subscriptions. Historical membership is not reconstructed, so past buckets
//! assume today's subscriptions were always present.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};

use crate::bucketing::DateRange;
use crate::models::{Category, Subscription, Transaction};
use crate::regression::LinearFit;

use super::types::{
    CategoryGrowth, CategorySpending, SpendingDataPoint, SpendingStatistics, TrendAnalysis,
    TrendDirection, YearOverYearComparison,
};

/// A point is significant when its total exceeds this multiple of the mean
pub const SIGNIFICANCE_FACTOR: f64 = 1.5;
/// Percent change below which a trend or category counts as flat
pub const STABLE_THRESHOLD_PCT: f64 = 5.0;
/// Maximum categories reported as growing or declining
const TOP_CATEGORIES: usize = 5;

/// Monthly-equivalent cost of all active subscriptions
pub fn total_monthly_cost(subscriptions: &[Subscription]) -> f64 {
    subscriptions
        .iter()
        .filter(|s| s.is_active)
        .map(|s| s.monthly_equivalent())
        .sum()
}

/// Bucketed spending over `range`
pub fn spending_trend(
    subscriptions: &[Subscription],
    transactions: &[Transaction],
    range: &DateRange,
) -> Vec<SpendingDataPoint> {
    let unit = range.bucket_unit();
    let subscription_portion = total_monthly_cost(subscriptions);

    let mut by_bucket: HashMap<NaiveDate, f64> = HashMap::new();
    for tx in transactions.iter().filter(|t| range.contains(t.date)) {
        *by_bucket.entry(unit.snap(tx.date)).or_insert(0.0) += tx.amount.abs();
    }

    let mut points: Vec<SpendingDataPoint> = range
        .bucket_starts()
        .into_iter()
        .map(|date| {
            let transactions = by_bucket.get(&date).copied().unwrap_or(0.0);
            SpendingDataPoint {
                date,
                total: subscription_portion + transactions,
                subscriptions: subscription_portion,
                transactions,
                is_significant: false,
            }
        })
        .collect();

    let average = mean(points.iter().map(|p| p.total));
    if average > 0.0 {
        for point in &mut points {
            point.is_significant = point.total > SIGNIFICANCE_FACTOR * average;
        }
    }

    points
}

/// (date, total) pairs for charting
pub fn series_totals(points: &[SpendingDataPoint]) -> Vec<(NaiveDate, f64)> {
    points.iter().map(|p| (p.date, p.total)).collect()
}

pub fn spending_statistics(points: &[SpendingDataPoint]) -> SpendingStatistics {
    let total: f64 = points.iter().map(|p| p.total).sum();
    let peak = points
        .iter()
        .max_by(|a, b| a.total.total_cmp(&b.total));

    SpendingStatistics {
        total,
        average: mean(points.iter().map(|p| p.total)),
        peak: peak.map(|p| p.total).unwrap_or(0.0),
        peak_date: peak.map(|p| p.date),
        significant_points: points.iter().filter(|p| p.is_significant).count(),
        points: points.len(),
    }
}

/// Points flagged as significant
pub fn spending_anomalies(points: &[SpendingDataPoint]) -> Vec<SpendingDataPoint> {
    points.iter().filter(|p| p.is_significant).cloned().collect()
}

/// Active subscription cost per category, largest first
pub fn category_breakdown(subscriptions: &[Subscription]) -> Vec<CategorySpending> {
    let mut totals: HashMap<Category, (f64, usize)> = HashMap::new();
    for sub in subscriptions.iter().filter(|s| s.is_active) {
        let entry = totals.entry(sub.category).or_insert((0.0, 0));
        entry.0 += sub.monthly_equivalent();
        entry.1 += 1;
    }

    let grand_total: f64 = totals.values().map(|(total, _)| total).sum();

    let mut breakdown: Vec<CategorySpending> = totals
        .into_iter()
        .map(|(category, (total, count))| CategorySpending {
            category,
            total,
            percentage: if grand_total > 0.0 {
                total / grand_total * 100.0
            } else {
                0.0
            },
            count,
        })
        .collect();

    breakdown.sort_by(|a, b| {
        b.total
            .total_cmp(&a.total)
            .then_with(|| a.category.cmp(&b.category))
    });
    breakdown
}

/// Mean bucket total over the trailing year
pub fn monthly_average(
    subscriptions: &[Subscription],
    transactions: &[Transaction],
    today: NaiveDate,
) -> f64 {
    let series = spending_trend(subscriptions, transactions, &DateRange::year(today));
    mean(series.iter().map(|p| p.total))
}

/// Year-to-date transaction spending against the same span last year
pub fn year_over_year(transactions: &[Transaction], today: NaiveDate) -> YearOverYearComparison {
    let this_year_start = NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today);
    let elapsed = today - this_year_start;
    let last_year_start =
        NaiveDate::from_ymd_opt(today.year() - 1, 1, 1).unwrap_or(this_year_start);
    let last_year_end = last_year_start
        .checked_add_signed(elapsed)
        .unwrap_or(last_year_start);

    let this_year = category_totals(transactions, this_year_start, today);
    let last_year = category_totals(transactions, last_year_start, last_year_end);

    let this_year_total: f64 = this_year.values().sum();
    let last_year_total: f64 = last_year.values().sum();

    let mut categories: Vec<Category> = this_year.keys().chain(last_year.keys()).copied().collect();
    categories.sort();
    categories.dedup();

    let growth: Vec<CategoryGrowth> = categories
        .into_iter()
        .map(|category| {
            let this = this_year.get(&category).copied().unwrap_or(0.0);
            let last = last_year.get(&category).copied().unwrap_or(0.0);
            CategoryGrowth {
                category,
                last_year: last,
                this_year: this,
                growth: percentage_change(last, this),
            }
        })
        .collect();

    let mut growing: Vec<CategoryGrowth> = growth
        .iter()
        .filter(|g| g.growth > STABLE_THRESHOLD_PCT)
        .cloned()
        .collect();
    growing.sort_by(|a, b| b.growth.total_cmp(&a.growth));
    growing.truncate(TOP_CATEGORIES);

    let mut declining: Vec<CategoryGrowth> = growth
        .into_iter()
        .filter(|g| g.growth < -STABLE_THRESHOLD_PCT)
        .collect();
    declining.sort_by(|a, b| a.growth.total_cmp(&b.growth));
    declining.truncate(TOP_CATEGORIES);

    YearOverYearComparison {
        this_year_start,
        this_year_end: today,
        last_year_start,
        last_year_end,
        this_year_total,
        last_year_total,
        percentage_change: percentage_change(last_year_total, this_year_total),
        growing,
        declining,
    }
}

/// Least-squares trend over a series' totals
pub fn linear_trend_analysis(points: &[SpendingDataPoint]) -> TrendAnalysis {
    let values: Vec<f64> = points.iter().map(|p| p.total).collect();
    let fit = LinearFit::fit(&values);

    let change = match (values.first(), values.last()) {
        (Some(&first), Some(&last)) => percentage_change(first, last),
        _ => 0.0,
    };

    let direction = if change.abs() < STABLE_THRESHOLD_PCT {
        TrendDirection::Stable
    } else if change > 0.0 {
        TrendDirection::Up
    } else {
        TrendDirection::Down
    };

    TrendAnalysis {
        slope: fit.slope,
        intercept: fit.intercept,
        r_squared: fit.r_squared(&values),
        percentage_change: change,
        next_prediction: fit.predict(values.len() as f64),
        direction,
    }
}

/// Percent change from `old` to `new`; 0 when `old` is 0
pub fn percentage_change(old: f64, new: f64) -> f64 {
    if old == 0.0 {
        0.0
    } else {
        (new - old) / old * 100.0
    }
}

fn category_totals(
    transactions: &[Transaction],
    start: NaiveDate,
    end: NaiveDate,
) -> HashMap<Category, f64> {
    let mut totals = HashMap::new();
    for tx in transactions
        .iter()
        .filter(|t| t.date >= start && t.date <= end)
    {
        *totals.entry(tx.category).or_insert(0.0) += tx.amount.abs();
    }
    totals
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BillingCycle;
    use chrono::{TimeZone, Utc};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sub(price: f64, cycle: BillingCycle, category: Category) -> Subscription {
        let next = Utc.with_ymd_and_hms(2026, 11, 1, 0, 0, 0).unwrap();
        Subscription::new("Service", price, cycle, next).with_category(category)
    }

    fn tx(amount: f64, on: NaiveDate, category: Category) -> Transaction {
        Transaction {
            id: 0,
            amount,
            date: on,
            description: "Purchase".to_string(),
            category,
            is_recurring: false,
            tags: vec![],
        }
    }

    #[test]
    fn test_total_monthly_cost_mixed_cycles() {
        let subs = vec![
            sub(10.0, BillingCycle::Monthly, Category::Streaming),
            sub(120.0, BillingCycle::Annual, Category::Software),
            sub(0.0, BillingCycle::Lifetime, Category::Other),
        ];
        assert!((total_monthly_cost(&subs) - 20.0).abs() < 1e-9);

        let breakdown = category_breakdown(&subs);
        let sum: f64 = breakdown.iter().map(|c| c.total).sum();
        assert!((sum - 20.0).abs() < 1e-9);
        assert_eq!(breakdown[0].category, Category::Streaming);
        assert!((breakdown[0].percentage - 50.0).abs() < 1e-9);
        assert_eq!(breakdown.last().unwrap().total, 0.0);
    }

    #[test]
    fn test_inactive_subscriptions_excluded() {
        let mut paused = sub(50.0, BillingCycle::Monthly, Category::Gaming);
        paused.is_active = false;
        let subs = vec![paused, sub(10.0, BillingCycle::Monthly, Category::Music)];

        assert_eq!(total_monthly_cost(&subs), 10.0);
        let breakdown = category_breakdown(&subs);
        assert_eq!(breakdown.len(), 1);
        assert_eq!(breakdown[0].category, Category::Music);
        assert_eq!(breakdown[0].count, 1);
    }

    #[test]
    fn test_category_breakdown_empty() {
        assert!(category_breakdown(&[]).is_empty());

        let mut lifetime = sub(0.0, BillingCycle::Lifetime, Category::Other);
        lifetime.price = 199.0;
        let breakdown = category_breakdown(&[lifetime]);
        assert_eq!(breakdown[0].percentage, 0.0);
    }

    #[test]
    fn test_spending_trend_weekly_range() {
        let today = date(2026, 10, 19);
        let subs = vec![sub(30.0, BillingCycle::Monthly, Category::Streaming)];
        let txs = vec![
            tx(-100.0, date(2026, 10, 15), Category::Shopping),
            tx(50.0, date(2026, 10, 16), Category::Other),
            tx(-999.0, date(2026, 10, 1), Category::Shopping),
        ];

        let points = spending_trend(&subs, &txs, &DateRange::week(today));
        assert_eq!(points.len(), 8);
        assert_eq!(points[0].date, date(2026, 10, 12));
        assert!(points.iter().all(|p| p.subscriptions == 30.0));

        let oct15 = points.iter().find(|p| p.date == date(2026, 10, 15)).unwrap();
        assert_eq!(oct15.total, 130.0);
        assert!(oct15.is_significant);

        let oct16 = points.iter().find(|p| p.date == date(2026, 10, 16)).unwrap();
        assert_eq!(oct16.transactions, 50.0);
        assert!(oct16.is_significant);

        assert_eq!(spending_anomalies(&points).len(), 2);

        let stats = spending_statistics(&points);
        assert_eq!(stats.total, 390.0);
        assert_eq!(stats.peak_date, Some(date(2026, 10, 15)));
        assert_eq!(stats.significant_points, 2);
        assert_eq!(series_totals(&points).len(), 8);
    }

    #[test]
    fn test_spending_trend_quarter_buckets_by_week() {
        let today = date(2026, 10, 19);
        let txs = vec![
            tx(-20.0, date(2026, 7, 19), Category::Food),
            tx(-30.0, date(2026, 7, 14), Category::Food),
        ];

        let points = spending_trend(&[], &txs, &DateRange::quarter(today));
        // July 19 is a Sunday and shares the week of Monday July 13;
        // July 14 precedes the range and is dropped
        assert_eq!(points[0].date, date(2026, 7, 13));
        assert_eq!(points[0].transactions, 20.0);
        assert!(points.windows(2).all(|w| (w[1].date - w[0].date).num_days() == 7));
    }

    #[test]
    fn test_flat_series_has_no_anomalies() {
        let today = date(2026, 10, 19);
        let subs = vec![sub(12.0, BillingCycle::Monthly, Category::Cloud)];
        let points = spending_trend(&subs, &[], &DateRange::month(today));
        assert!(spending_anomalies(&points).is_empty());

        let empty = spending_trend(&[], &[], &DateRange::month(today));
        assert!(empty.iter().all(|p| !p.is_significant));
    }

    #[test]
    fn test_year_over_year() {
        let today = date(2026, 10, 19);
        let txs = vec![
            tx(-600.0, date(2025, 3, 1), Category::Shopping),
            tx(-400.0, date(2025, 6, 1), Category::Food),
            // Outside last year's comparable window
            tx(-5000.0, date(2025, 12, 1), Category::Shopping),
            tx(-900.0, date(2026, 2, 1), Category::Shopping),
            tx(-300.0, date(2026, 9, 1), Category::Food),
        ];

        let yoy = year_over_year(&txs, today);
        assert_eq!(yoy.this_year_start, date(2026, 1, 1));
        assert_eq!(yoy.last_year_end, date(2025, 10, 19));
        assert_eq!(yoy.last_year_total, 1000.0);
        assert_eq!(yoy.this_year_total, 1200.0);
        assert!((yoy.percentage_change - 20.0).abs() < 1e-9);

        assert_eq!(yoy.growing.len(), 1);
        assert_eq!(yoy.growing[0].category, Category::Shopping);
        assert!((yoy.growing[0].growth - 50.0).abs() < 1e-9);
        assert_eq!(yoy.declining.len(), 1);
        assert_eq!(yoy.declining[0].category, Category::Food);
    }

    #[test]
    fn test_year_over_year_without_history() {
        let today = date(2026, 10, 19);
        let txs = vec![tx(-50.0, date(2026, 5, 5), Category::Music)];
        let yoy = year_over_year(&txs, today);
        assert_eq!(yoy.last_year_total, 0.0);
        assert_eq!(yoy.percentage_change, 0.0);
        assert!(yoy.growing.is_empty());
    }

    #[test]
    fn test_linear_trend_analysis() {
        let points: Vec<SpendingDataPoint> = [10.0, 20.0, 30.0, 40.0]
            .iter()
            .enumerate()
            .map(|(i, &total)| SpendingDataPoint {
                date: date(2026, 1 + i as u32, 1),
                total,
                subscriptions: 0.0,
                transactions: total,
                is_significant: false,
            })
            .collect();

        let trend = linear_trend_analysis(&points);
        assert!((trend.slope - 10.0).abs() < 1e-9);
        assert!((trend.intercept - 10.0).abs() < 1e-9);
        assert!((trend.r_squared - 1.0).abs() < 1e-9);
        assert!((trend.percentage_change - 300.0).abs() < 1e-9);
        assert!((trend.next_prediction - 50.0).abs() < 1e-9);
        assert_eq!(trend.direction, TrendDirection::Up);

        let empty = linear_trend_analysis(&[]);
        assert_eq!(empty.direction, TrendDirection::Stable);
        assert_eq!(empty.next_prediction, 0.0);
    }

    #[test]
    fn test_monthly_average_uses_year_series() {
        let today = date(2026, 10, 19);
        let subs = vec![sub(10.0, BillingCycle::Monthly, Category::News)];
        let txs = vec![tx(-130.0, date(2026, 5, 10), Category::Shopping)];

        // 13 monthly buckets, each at least the $10 subscription rate
        let average = monthly_average(&subs, &txs, today);
        assert!((average - 20.0).abs() < 1e-9);
    }
}
