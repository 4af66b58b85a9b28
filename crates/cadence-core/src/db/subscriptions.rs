//! Subscription operations

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};

use super::{format_datetime, parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{BillingCycle, Category, Subscription};

const SUBSCRIPTION_COLUMNS: &str = "id, name, price, billing_cycle, next_billing_date, is_active, \
     cancellation_date, is_free_trial, trial_start_date, trial_end_date, price_after_trial, \
     will_convert_to_paid, usage_count, last_used_date, category, created_at";

impl Database {
    /// Insert a subscription and return its new id (the record's own id is ignored)
    pub fn insert_subscription(&self, sub: &Subscription) -> Result<i64> {
        let conn = self.conn()?;

        conn.execute(
            r#"
            INSERT INTO subscriptions (name, price, billing_cycle, next_billing_date, is_active,
                cancellation_date, is_free_trial, trial_start_date, trial_end_date,
                price_after_trial, will_convert_to_paid, usage_count, last_used_date,
                category, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                sub.name,
                sub.price,
                sub.billing_cycle.as_str(),
                format_datetime(&sub.next_billing_date),
                sub.is_active,
                sub.cancellation_date.as_ref().map(format_datetime),
                sub.is_free_trial,
                sub.trial_start_date.as_ref().map(format_datetime),
                sub.trial_end_date.as_ref().map(format_datetime),
                sub.price_after_trial,
                sub.will_convert_to_paid,
                sub.usage_count,
                sub.last_used_date.as_ref().map(format_datetime),
                sub.category.as_str(),
                format_datetime(&sub.created_date),
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }

    /// Get a subscription by ID
    pub fn get_subscription(&self, id: i64) -> Result<Option<Subscription>> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {} FROM subscriptions WHERE id = ?",
            SUBSCRIPTION_COLUMNS
        );

        let sub = conn
            .query_row(&sql, params![id], Self::row_to_subscription)
            .optional()?;
        Ok(sub)
    }

    /// List every subscription in id order
    pub fn all_subscriptions(&self) -> Result<Vec<Subscription>> {
        let conn = self.conn()?;
        let sql = format!("SELECT {} FROM subscriptions ORDER BY id", SUBSCRIPTION_COLUMNS);

        let mut stmt = conn.prepare(&sql)?;
        let subscriptions = stmt
            .query_map([], Self::row_to_subscription)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(subscriptions)
    }

    /// Overwrite every mutable field of an existing subscription
    pub fn save_subscription(&self, sub: &Subscription) -> Result<()> {
        let conn = self.conn()?;

        let updated = conn.execute(
            r#"
            UPDATE subscriptions SET
                name = ?, price = ?, billing_cycle = ?, next_billing_date = ?, is_active = ?,
                cancellation_date = ?, is_free_trial = ?, trial_start_date = ?,
                trial_end_date = ?, price_after_trial = ?, will_convert_to_paid = ?,
                usage_count = ?, last_used_date = ?, category = ?
            WHERE id = ?
            "#,
            params![
                sub.name,
                sub.price,
                sub.billing_cycle.as_str(),
                format_datetime(&sub.next_billing_date),
                sub.is_active,
                sub.cancellation_date.as_ref().map(format_datetime),
                sub.is_free_trial,
                sub.trial_start_date.as_ref().map(format_datetime),
                sub.trial_end_date.as_ref().map(format_datetime),
                sub.price_after_trial,
                sub.will_convert_to_paid,
                sub.usage_count,
                sub.last_used_date.as_ref().map(format_datetime),
                sub.category.as_str(),
                sub.id,
            ],
        )?;

        if updated == 0 {
            return Err(Error::NotFound(format!("Subscription {}", sub.id)));
        }
        Ok(())
    }

    /// Delete a subscription (and its price history); returns whether it existed
    pub fn delete_subscription(&self, id: i64) -> Result<bool> {
        let conn = self.conn()?;
        let deleted = conn.execute("DELETE FROM subscriptions WHERE id = ?", params![id])?;
        Ok(deleted > 0)
    }

    /// Count one use of a subscription at `when`
    pub fn record_usage(&self, id: i64, when: DateTime<Utc>) -> Result<()> {
        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE subscriptions SET usage_count = usage_count + 1, last_used_date = ? WHERE id = ?",
            params![format_datetime(&when), id],
        )?;

        if updated == 0 {
            return Err(Error::NotFound(format!("Subscription {}", id)));
        }
        Ok(())
    }

    /// Helper to convert a row to Subscription
    /// Column order matches `SUBSCRIPTION_COLUMNS`
    fn row_to_subscription(row: &rusqlite::Row) -> rusqlite::Result<Subscription> {
        let cycle_str: String = row.get(3)?;
        let next_str: String = row.get(4)?;
        let cancelled_str: Option<String> = row.get(6)?;
        let trial_start_str: Option<String> = row.get(8)?;
        let trial_end_str: Option<String> = row.get(9)?;
        let last_used_str: Option<String> = row.get(13)?;
        let category_str: String = row.get(14)?;
        let created_str: Option<String> = row.get(15)?;

        Ok(Subscription {
            id: row.get(0)?,
            name: row.get(1)?,
            price: row.get(2)?,
            // Unknown cycles read back as monthly rather than failing the whole list
            billing_cycle: cycle_str.parse().unwrap_or(BillingCycle::Monthly),
            next_billing_date: parse_datetime(&next_str),
            is_active: row.get(5)?,
            cancellation_date: cancelled_str.map(|s| parse_datetime(&s)),
            is_free_trial: row.get(7)?,
            trial_start_date: trial_start_str.map(|s| parse_datetime(&s)),
            trial_end_date: trial_end_str.map(|s| parse_datetime(&s)),
            price_after_trial: row.get(10)?,
            will_convert_to_paid: row.get(11)?,
            usage_count: row.get(12)?,
            last_used_date: last_used_str.map(|s| parse_datetime(&s)),
            category: category_str.parse().unwrap_or(Category::Other),
            created_date: created_str
                .map(|s| parse_datetime(&s))
                .unwrap_or_else(Utc::now),
        })
    }
}
