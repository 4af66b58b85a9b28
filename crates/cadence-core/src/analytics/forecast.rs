//! Spend forecasting
//!
//! Projects monthly spend by fitting a line through the trailing-year trend
//! series. Confidence decays with horizon and the bound width grows as
//! confidence falls.

use chrono::{Datelike, Months, NaiveDate};

use crate::bucketing::DateRange;
use crate::models::{Subscription, Transaction};
use crate::regression::LinearFit;

use super::trends::{spending_trend, total_monthly_cost};
use super::types::ForecastValue;

/// Below this many history points the forecast is flat
pub const MIN_HISTORY_POINTS: usize = 3;
const CONFIDENCE_DECAY_PER_MONTH: f64 = 0.08;
const MIN_CONFIDENCE: f64 = 0.3;
const BAND_FACTOR: f64 = 0.2;
const FLAT_CONFIDENCE: f64 = 0.5;
const FLAT_BAND: f64 = 0.1;

/// Forecast the next `months` months from stored data
///
/// History is the trailing-year monthly series starting at the first bucket
/// with any spending, so a short history falls back to a flat forecast.
pub fn forecast(
    subscriptions: &[Subscription],
    transactions: &[Transaction],
    today: NaiveDate,
    months: u32,
) -> Vec<ForecastValue> {
    let series = spending_trend(subscriptions, transactions, &DateRange::year(today));
    let history: Vec<f64> = series
        .iter()
        .map(|p| p.total)
        .skip_while(|total| *total == 0.0)
        .collect();

    forecast_from_history(&history, total_monthly_cost(subscriptions), months, today)
}

/// Forecast from an explicit history series
///
/// `current_monthly_total` is the flat level used when the history is too
/// short to fit.
pub fn forecast_from_history(
    history: &[f64],
    current_monthly_total: f64,
    months: u32,
    today: NaiveDate,
) -> Vec<ForecastValue> {
    if history.len() < MIN_HISTORY_POINTS {
        let level = current_monthly_total.max(0.0);
        return (1..=months)
            .map(|m| ForecastValue {
                date: month_start_after(today, m),
                predicted: level,
                confidence: FLAT_CONFIDENCE,
                lower_bound: level * (1.0 - FLAT_BAND),
                upper_bound: level * (1.0 + FLAT_BAND),
            })
            .collect();
    }

    let fit = LinearFit::fit(history);
    let n = history.len() as f64;

    (1..=months)
        .map(|m| {
            let predicted = fit.predict(n + m as f64);
            let confidence = (1.0 - CONFIDENCE_DECAY_PER_MONTH * m as f64).max(MIN_CONFIDENCE);
            let half_width = predicted * BAND_FACTOR * (1.0 - confidence);
            ForecastValue {
                date: month_start_after(today, m),
                predicted,
                confidence,
                lower_bound: (predicted - half_width).max(0.0),
                upper_bound: predicted + half_width,
            }
        })
        .collect()
}

/// Sum of predicted spend across a forecast
pub fn projected_total(forecast: &[ForecastValue]) -> f64 {
    forecast.iter().map(|f| f.predicted).sum()
}

// First day of the month `m` months after today's month
fn month_start_after(today: NaiveDate, m: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(today.year(), today.month(), 1)
        .and_then(|first| first.checked_add_months(Months::new(m)))
        .unwrap_or(today)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BillingCycle, Category};
    use chrono::{TimeZone, Utc};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_linear_history_extrapolates() {
        let today = date(2026, 10, 19);
        let forecast = forecast_from_history(&[100.0, 110.0, 120.0, 130.0], 0.0, 3, today);

        assert_eq!(forecast.len(), 3);
        assert_eq!(forecast[0].date, date(2026, 11, 1));
        assert_eq!(forecast[2].date, date(2027, 1, 1));
        assert!((forecast[0].predicted - 150.0).abs() < 1e-9);
        assert!((forecast[2].predicted - 170.0).abs() < 1e-9);
        assert!((forecast[0].confidence - 0.92).abs() < 1e-9);
        assert!((forecast[0].upper_bound - 152.4).abs() < 1e-9);
        assert!((projected_total(&forecast) - 480.0).abs() < 1e-9);
    }

    #[test]
    fn test_short_history_is_flat() {
        let today = date(2026, 10, 19);
        let forecast = forecast_from_history(&[55.0, 60.0], 40.0, 2, today);

        assert_eq!(forecast.len(), 2);
        for value in &forecast {
            assert_eq!(value.predicted, 40.0);
            assert_eq!(value.confidence, 0.5);
            assert!((value.lower_bound - 36.0).abs() < 1e-9);
            assert!((value.upper_bound - 44.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_zero_months_is_empty() {
        let today = date(2026, 10, 19);
        assert!(forecast_from_history(&[1.0, 2.0, 3.0], 5.0, 0, today).is_empty());
        assert!(forecast_from_history(&[], 5.0, 0, today).is_empty());
    }

    #[test]
    fn test_confidence_monotone_and_bounded() {
        let today = date(2026, 10, 19);
        let forecast = forecast_from_history(&[80.0, 95.0, 70.0, 110.0, 90.0], 0.0, 24, today);

        for pair in forecast.windows(2) {
            assert!(pair[1].confidence <= pair[0].confidence);
        }
        for value in &forecast {
            assert!((0.3..=1.0).contains(&value.confidence));
            assert!(value.lower_bound <= value.predicted);
            assert!(value.predicted <= value.upper_bound);
            assert!(value.lower_bound >= 0.0);
        }
        assert_eq!(forecast.last().unwrap().confidence, 0.3);
    }

    #[test]
    fn test_declining_history_clamps_to_zero() {
        let today = date(2026, 10, 19);
        let forecast = forecast_from_history(&[300.0, 200.0, 100.0], 0.0, 6, today);
        assert!(forecast.iter().all(|f| f.predicted >= 0.0));
        assert_eq!(forecast.last().unwrap().predicted, 0.0);
        assert_eq!(forecast.last().unwrap().lower_bound, 0.0);
    }

    #[test]
    fn test_forecast_from_records() {
        let today = date(2026, 10, 19);
        let next = Utc.with_ymd_and_hms(2026, 11, 1, 0, 0, 0).unwrap();
        let subs = vec![Subscription::new("Spotify", 11.99, BillingCycle::Monthly, next)
            .with_category(Category::Music)];

        // A steady subscription with no transactions projects its own rate
        let forecast = forecast(&subs, &[], today, 6);
        assert_eq!(forecast.len(), 6);
        assert!(forecast.iter().all(|f| (f.predicted - 11.99).abs() < 1e-9));

        // No spending at all leaves no history and a flat zero forecast
        let empty = super::forecast(&[], &[], today, 2);
        assert!(empty.iter().all(|f| f.predicted == 0.0 && f.confidence == 0.5));
    }
}
