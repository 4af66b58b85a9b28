//! Time bucketing for trend series
//!
//! Maps a date range to a bucket unit and snaps dates to the start of their
//! containing bucket. The bucket policy decides the granularity of every
//! derived trend series:
//!
//! | range   | bucket                                   |
//! |---------|------------------------------------------|
//! | week    | day                                      |
//! | month   | day                                      |
//! | quarter | week                                     |
//! | year    | month                                    |
//! | custom  | day (≤30 days), week (≤90 days), month   |
//!
//! Weeks start on Monday.

use chrono::{Datelike, Duration, Months, NaiveDate};
use serde::{Deserialize, Serialize};

/// Classification of a date range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RangeKind {
    Week,
    Month,
    Quarter,
    Year,
    Custom,
}

impl RangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Week => "week",
            Self::Month => "month",
            Self::Quarter => "quarter",
            Self::Year => "year",
            Self::Custom => "custom",
        }
    }
}

impl std::str::FromStr for RangeKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "quarter" => Ok(Self::Quarter),
            "year" => Ok(Self::Year),
            "custom" => Ok(Self::Custom),
            _ => Err(format!(
                "Unknown range: {} (valid: week, month, quarter, year, custom)",
                s
            )),
        }
    }
}

/// Width of one bucket in a trend series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BucketUnit {
    Day,
    Week,
    Month,
}

impl BucketUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
        }
    }

    /// Snap a date to the start of its containing bucket
    pub fn snap(&self, date: NaiveDate) -> NaiveDate {
        match self {
            Self::Day => date,
            Self::Week => {
                date - Duration::days(date.weekday().num_days_from_monday() as i64)
            }
            Self::Month => NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap_or(date),
        }
    }

    /// Start of the bucket following the one starting at `start`
    ///
    /// Returns `None` only when the calendar cannot represent the result.
    pub fn next(&self, start: NaiveDate) -> Option<NaiveDate> {
        match self {
            Self::Day => start.checked_add_signed(Duration::days(1)),
            Self::Week => start.checked_add_signed(Duration::weeks(1)),
            Self::Month => start.checked_add_months(Months::new(1)),
        }
    }
}

/// Pick the bucket unit for a range
pub fn bucket_unit_for(kind: RangeKind, start: NaiveDate, end: NaiveDate) -> BucketUnit {
    match kind {
        RangeKind::Week | RangeKind::Month => BucketUnit::Day,
        RangeKind::Quarter => BucketUnit::Week,
        RangeKind::Year => BucketUnit::Month,
        RangeKind::Custom => {
            let span = (end - start).num_days();
            if span <= 30 {
                BucketUnit::Day
            } else if span <= 90 {
                BucketUnit::Week
            } else {
                BucketUnit::Month
            }
        }
    }
}

/// A concrete, inclusive date range with its classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub kind: RangeKind,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// The 7 days ending today
    pub fn week(today: NaiveDate) -> Self {
        let start = today
            .checked_sub_signed(Duration::days(7))
            .unwrap_or(today);
        Self::new(RangeKind::Week, start, today)
    }

    /// One calendar month ending today
    pub fn month(today: NaiveDate) -> Self {
        Self::months_back(RangeKind::Month, today, 1)
    }

    /// Three calendar months ending today
    pub fn quarter(today: NaiveDate) -> Self {
        Self::months_back(RangeKind::Quarter, today, 3)
    }

    /// Twelve calendar months ending today
    pub fn year(today: NaiveDate) -> Self {
        Self::months_back(RangeKind::Year, today, 12)
    }

    /// An explicit range; reversed bounds are swapped
    pub fn custom(start: NaiveDate, end: NaiveDate) -> Self {
        if start <= end {
            Self::new(RangeKind::Custom, start, end)
        } else {
            Self::new(RangeKind::Custom, end, start)
        }
    }

    /// Build the named range ending today
    pub fn for_kind(kind: RangeKind, today: NaiveDate) -> Self {
        match kind {
            RangeKind::Week => Self::week(today),
            RangeKind::Month => Self::month(today),
            RangeKind::Quarter => Self::quarter(today),
            RangeKind::Year => Self::year(today),
            RangeKind::Custom => Self::custom(today, today),
        }
    }

    fn new(kind: RangeKind, start: NaiveDate, end: NaiveDate) -> Self {
        Self { kind, start, end }
    }

    // Calendar failures collapse the range onto its end date
    fn months_back(kind: RangeKind, today: NaiveDate, months: u32) -> Self {
        let start = today
            .checked_sub_months(Months::new(months))
            .unwrap_or(today);
        Self::new(kind, start, today)
    }

    pub fn span_days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    pub fn bucket_unit(&self) -> BucketUnit {
        bucket_unit_for(self.kind, self.start, self.end)
    }

    /// Start dates of every bucket overlapping the range, in order
    pub fn bucket_starts(&self) -> Vec<NaiveDate> {
        let unit = self.bucket_unit();
        let mut starts = Vec::new();
        let mut current = unit.snap(self.start);

        while current <= self.end {
            starts.push(current);
            match unit.next(current) {
                Some(next) => current = next,
                None => break,
            }
        }

        starts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_named_range_policy() {
        let today = date(2026, 10, 19);
        assert_eq!(DateRange::week(today).bucket_unit(), BucketUnit::Day);
        assert_eq!(DateRange::month(today).bucket_unit(), BucketUnit::Day);
        assert_eq!(DateRange::quarter(today).bucket_unit(), BucketUnit::Week);
        assert_eq!(DateRange::year(today).bucket_unit(), BucketUnit::Month);
    }

    #[test]
    fn test_custom_range_policy_boundaries() {
        let start = date(2026, 1, 1);
        let unit = |days: i64| DateRange::custom(start, start + Duration::days(days)).bucket_unit();

        assert_eq!(unit(30), BucketUnit::Day);
        assert_eq!(unit(31), BucketUnit::Week);
        assert_eq!(unit(90), BucketUnit::Week);
        assert_eq!(unit(91), BucketUnit::Month);
    }

    #[test]
    fn test_snap_week_starts_monday() {
        // 2026-10-19 is a Monday
        assert_eq!(BucketUnit::Week.snap(date(2026, 10, 19)), date(2026, 10, 19));
        assert_eq!(BucketUnit::Week.snap(date(2026, 10, 25)), date(2026, 10, 19));
        assert_eq!(BucketUnit::Week.snap(date(2026, 10, 18)), date(2026, 10, 12));
    }

    #[test]
    fn test_snap_month_and_day() {
        assert_eq!(BucketUnit::Month.snap(date(2026, 2, 28)), date(2026, 2, 1));
        assert_eq!(BucketUnit::Day.snap(date(2026, 2, 28)), date(2026, 2, 28));
    }

    #[test]
    fn test_year_range_has_thirteen_month_buckets() {
        let range = DateRange::year(date(2026, 10, 19));
        assert_eq!(range.start, date(2025, 10, 19));

        let starts = range.bucket_starts();
        assert_eq!(starts.len(), 13);
        assert_eq!(starts[0], date(2025, 10, 1));
        assert_eq!(starts[12], date(2026, 10, 1));
    }

    #[test]
    fn test_week_range_day_buckets() {
        let range = DateRange::week(date(2026, 10, 19));
        let starts = range.bucket_starts();
        assert_eq!(starts.len(), 8);
        assert_eq!(starts.first(), Some(&date(2026, 10, 12)));
        assert_eq!(starts.last(), Some(&date(2026, 10, 19)));
    }

    #[test]
    fn test_month_range_clamps_short_months() {
        let range = DateRange::month(date(2026, 3, 31));
        assert_eq!(range.start, date(2026, 2, 28));
    }

    #[test]
    fn test_custom_swaps_reversed_bounds() {
        let range = DateRange::custom(date(2026, 5, 1), date(2026, 4, 1));
        assert_eq!(range.start, date(2026, 4, 1));
        assert_eq!(range.end, date(2026, 5, 1));
        assert!(range.contains(date(2026, 4, 15)));
        assert!(!range.contains(date(2026, 5, 2)));
    }
}
