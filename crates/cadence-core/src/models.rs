//! Domain models for Cadence

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Recurrence period of a subscription's charge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingCycle {
    Daily,
    Weekly,
    Biweekly,
    Monthly,
    Quarterly,
    Semiannual,
    Annual,
    /// One-time purchase, never renews
    Lifetime,
}

impl BillingCycle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Biweekly => "biweekly",
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
            Self::Semiannual => "semiannual",
            Self::Annual => "annual",
            Self::Lifetime => "lifetime",
        }
    }

    /// Get all billing cycles
    pub fn all() -> &'static [BillingCycle] {
        &[
            Self::Daily,
            Self::Weekly,
            Self::Biweekly,
            Self::Monthly,
            Self::Quarterly,
            Self::Semiannual,
            Self::Annual,
            Self::Lifetime,
        ]
    }

    pub fn is_recurring(&self) -> bool {
        !matches!(self, Self::Lifetime)
    }
}

impl std::str::FromStr for BillingCycle {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "biweekly" | "fortnightly" => Ok(Self::Biweekly),
            "monthly" => Ok(Self::Monthly),
            "quarterly" => Ok(Self::Quarterly),
            "semiannual" | "semiannually" => Ok(Self::Semiannual),
            "annual" | "yearly" => Ok(Self::Annual),
            "lifetime" => Ok(Self::Lifetime),
            _ => Err(format!("Unknown billing cycle: {}", s)),
        }
    }
}

impl std::fmt::Display for BillingCycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Spending category shared by subscriptions and transactions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Streaming,
    Music,
    Software,
    Gaming,
    News,
    Fitness,
    Food,
    Cloud,
    Productivity,
    Education,
    Shopping,
    Utilities,
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Streaming => "streaming",
            Self::Music => "music",
            Self::Software => "software",
            Self::Gaming => "gaming",
            Self::News => "news",
            Self::Fitness => "fitness",
            Self::Food => "food",
            Self::Cloud => "cloud",
            Self::Productivity => "productivity",
            Self::Education => "education",
            Self::Shopping => "shopping",
            Self::Utilities => "utilities",
            Self::Other => "other",
        }
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "streaming" => Ok(Self::Streaming),
            "music" => Ok(Self::Music),
            "software" => Ok(Self::Software),
            "gaming" => Ok(Self::Gaming),
            "news" => Ok(Self::News),
            "fitness" => Ok(Self::Fitness),
            "food" => Ok(Self::Food),
            "cloud" => Ok(Self::Cloud),
            "productivity" => Ok(Self::Productivity),
            "education" => Ok(Self::Education),
            "shopping" => Ok(Self::Shopping),
            "utilities" => Ok(Self::Utilities),
            "other" => Ok(Self::Other),
            _ => Err(format!("Unknown category: {}", s)),
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle state of a subscription, derived from its stored fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionState {
    Active,
    /// Active and still inside a free trial
    Trialing,
    /// Inactive without a cancellation date
    Paused,
    /// Inactive with a cancellation date
    Cancelled,
}

impl SubscriptionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Trialing => "trialing",
            Self::Paused => "paused",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for SubscriptionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A tracked subscription
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: i64,
    pub name: String,
    /// Price charged per billing cycle
    pub price: f64,
    pub billing_cycle: BillingCycle,
    pub next_billing_date: DateTime<Utc>,
    pub is_active: bool,
    /// Set only when explicitly cancelled (pausing leaves this empty)
    pub cancellation_date: Option<DateTime<Utc>>,
    pub is_free_trial: bool,
    pub trial_start_date: Option<DateTime<Utc>>,
    pub trial_end_date: Option<DateTime<Utc>>,
    pub price_after_trial: Option<f64>,
    pub will_convert_to_paid: bool,
    pub usage_count: u32,
    pub last_used_date: Option<DateTime<Utc>>,
    pub created_date: DateTime<Utc>,
    pub category: Category,
}

impl Subscription {
    /// Create an active, non-trial subscription created now
    pub fn new(
        name: impl Into<String>,
        price: f64,
        billing_cycle: BillingCycle,
        next_billing_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: 0,
            name: name.into(),
            price,
            billing_cycle,
            next_billing_date,
            is_active: true,
            cancellation_date: None,
            is_free_trial: false,
            trial_start_date: None,
            trial_end_date: None,
            price_after_trial: None,
            will_convert_to_paid: false,
            usage_count: 0,
            last_used_date: None,
            created_date: Utc::now(),
            category: Category::Other,
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = id;
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    pub fn with_created_date(mut self, created: DateTime<Utc>) -> Self {
        self.created_date = created;
        self
    }

    /// Record usage: total count and the most recent use
    pub fn with_usage(mut self, count: u32, last_used: Option<DateTime<Utc>>) -> Self {
        self.usage_count = count;
        self.last_used_date = last_used;
        self
    }

    /// Put the subscription into a free trial
    pub fn with_trial(
        mut self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        price_after_trial: Option<f64>,
        will_convert_to_paid: bool,
    ) -> Self {
        self.is_free_trial = true;
        self.trial_start_date = Some(start);
        self.trial_end_date = Some(end);
        self.price_after_trial = price_after_trial;
        self.will_convert_to_paid = will_convert_to_paid;
        self
    }

    /// Average monthly cost, always recomputed from price and cycle
    pub fn monthly_equivalent(&self) -> f64 {
        self.billing_cycle.monthly_equivalent(self.price)
    }

    pub fn state(&self) -> SubscriptionState {
        match (self.is_active, self.cancellation_date.is_some()) {
            (true, _) if self.is_free_trial => SubscriptionState::Trialing,
            (true, _) => SubscriptionState::Active,
            (false, true) => SubscriptionState::Cancelled,
            (false, false) => SubscriptionState::Paused,
        }
    }

    pub fn is_lifetime(&self) -> bool {
        self.billing_cycle == BillingCycle::Lifetime
    }
}

/// A financial transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    /// Negative = expense, positive = income
    pub amount: f64,
    pub date: NaiveDate,
    pub description: String,
    pub category: Category,
    pub is_recurring: bool,
    pub tags: Vec<String>,
}

/// A new transaction to be recorded (before DB insertion)
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub amount: f64,
    pub date: NaiveDate,
    pub description: String,
    pub category: Category,
    pub is_recurring: bool,
    pub tags: Vec<String>,
}

/// Append-only record of a subscription price edit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceChange {
    pub id: i64,
    pub subscription_id: i64,
    pub old_price: f64,
    pub new_price: f64,
    pub change_date: DateTime<Utc>,
    /// False when the user edited the price, true when the engine observed it
    pub detected_automatically: bool,
}

impl PriceChange {
    pub fn new(
        subscription_id: i64,
        old_price: f64,
        new_price: f64,
        change_date: DateTime<Utc>,
        detected_automatically: bool,
    ) -> Self {
        Self {
            id: 0,
            subscription_id,
            old_price,
            new_price,
            change_date,
            detected_automatically,
        }
    }

    pub fn is_increase(&self) -> bool {
        self.new_price > self.old_price
    }

    /// Percentage change relative to the old price (0 when the old price was 0)
    pub fn percent_change(&self) -> f64 {
        if self.old_price == 0.0 {
            0.0
        } else {
            (self.new_price - self.old_price) / self.old_price * 100.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_billing_cycle_from_str() {
        assert_eq!(
            "monthly".parse::<BillingCycle>().unwrap(),
            BillingCycle::Monthly
        );
        assert_eq!(
            "Yearly".parse::<BillingCycle>().unwrap(),
            BillingCycle::Annual
        );
        assert!("hourly".parse::<BillingCycle>().is_err());
        for cycle in BillingCycle::all() {
            assert_eq!(cycle.as_str().parse::<BillingCycle>().unwrap(), *cycle);
        }
    }

    #[test]
    fn test_category_serde() {
        let json = serde_json::to_string(&Category::Streaming).unwrap();
        assert_eq!(json, r#""streaming""#);

        let parsed: Category = serde_json::from_str(r#""cloud""#).unwrap();
        assert_eq!(parsed, Category::Cloud);
    }

    #[test]
    fn test_subscription_state() {
        let now = Utc::now();
        let mut sub = Subscription::new("Netflix", 15.49, BillingCycle::Monthly, now);
        assert_eq!(sub.state(), SubscriptionState::Active);

        sub.is_active = false;
        assert_eq!(sub.state(), SubscriptionState::Paused);

        sub.cancellation_date = Some(now);
        assert_eq!(sub.state(), SubscriptionState::Cancelled);

        let trial = Subscription::new("Hulu", 7.99, BillingCycle::Monthly, now).with_trial(
            now,
            now + Duration::days(7),
            Some(7.99),
            true,
        );
        assert_eq!(trial.state(), SubscriptionState::Trialing);
    }

    #[test]
    fn test_price_change_percent() {
        let change = PriceChange::new(1, 10.0, 12.0, Utc::now(), false);
        assert!(change.is_increase());
        assert!((change.percent_change() - 20.0).abs() < 1e-9);

        let free = PriceChange::new(1, 0.0, 5.0, Utc::now(), true);
        assert_eq!(free.percent_change(), 0.0);
    }
}
