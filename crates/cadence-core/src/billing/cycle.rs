//! Billing-cycle arithmetic
//!
//! The monthly-equivalent conversion is an approximation contract, not a
//! calendar-accurate one. Its constants are fixed and every "monthly cost"
//! figure in the crate goes through it.

use chrono::{DateTime, Duration, Months, Utc};

use crate::models::BillingCycle;

/// Average weeks per month used by the monthly conversion
pub const WEEKS_PER_MONTH: f64 = 4.33;
/// Average fortnights per month used by the monthly conversion
pub const FORTNIGHTS_PER_MONTH: f64 = 2.17;
/// Days per month used by the monthly conversion
pub const DAYS_PER_MONTH: f64 = 30.0;

impl BillingCycle {
    /// Normalize a per-cycle price to an average monthly cost
    pub fn monthly_equivalent(&self, price: f64) -> f64 {
        match self {
            Self::Daily => price * DAYS_PER_MONTH,
            Self::Weekly => price * WEEKS_PER_MONTH,
            Self::Biweekly => price * FORTNIGHTS_PER_MONTH,
            Self::Monthly => price,
            Self::Quarterly => price / 3.0,
            Self::Semiannual => price / 6.0,
            Self::Annual => price / 12.0,
            Self::Lifetime => 0.0,
        }
    }

    /// Add exactly one cycle to `date`
    ///
    /// Month-based cycles clamp to the end of shorter months (Jan 31 + 1 month
    /// is Feb 28/29). Returns `None` for lifetime, or when the calendar cannot
    /// represent the result.
    pub fn advance(&self, date: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Self::Daily => date.checked_add_signed(Duration::days(1)),
            Self::Weekly => date.checked_add_signed(Duration::weeks(1)),
            Self::Biweekly => date.checked_add_signed(Duration::weeks(2)),
            Self::Monthly => date.checked_add_months(Months::new(1)),
            Self::Quarterly => date.checked_add_months(Months::new(3)),
            Self::Semiannual => date.checked_add_months(Months::new(6)),
            Self::Annual => date.checked_add_months(Months::new(12)),
            Self::Lifetime => None,
        }
    }
}

/// Monthly cost of `price` billed every `cycle`
pub fn monthly_equivalent(price: f64, cycle: BillingCycle) -> f64 {
    cycle.monthly_equivalent(price)
}

/// The billing date one cycle after `date` (`None` for lifetime)
pub fn advance_billing_date(date: DateTime<Utc>, cycle: BillingCycle) -> Option<DateTime<Utc>> {
    cycle.advance(date)
}

/// Advance `date` one cycle at a time until it is no longer before `now`
///
/// Returns the converged date and the number of steps taken, or `None` when
/// the cycle cannot advance or convergence needs more than `max_steps`.
pub fn roll_forward(
    date: DateTime<Utc>,
    cycle: BillingCycle,
    now: DateTime<Utc>,
    max_steps: u32,
) -> Option<(DateTime<Utc>, u32)> {
    let mut current = date;
    let mut steps = 0;

    while current < now {
        if steps >= max_steps {
            return None;
        }
        current = cycle.advance(current)?;
        steps += 1;
    }

    Some((current, steps))
}
