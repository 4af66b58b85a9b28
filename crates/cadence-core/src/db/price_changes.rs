//! Price history operations
//!
//! Rows are only ever inserted; nothing updates or deletes a single record.

use chrono::{DateTime, Utc};
use rusqlite::params;

use super::{format_datetime, parse_datetime, Database};
use crate::error::Result;
use crate::models::PriceChange;

impl Database {
    /// Append a price change and return its id
    pub fn insert_price_change(&self, change: &PriceChange) -> Result<i64> {
        let conn = self.conn()?;

        conn.execute(
            r#"
            INSERT INTO price_changes (subscription_id, old_price, new_price, change_date, detected_automatically)
            VALUES (?, ?, ?, ?, ?)
            "#,
            params![
                change.subscription_id,
                change.old_price,
                change.new_price,
                format_datetime(&change.change_date),
                change.detected_automatically,
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }

    /// Price history ordered oldest first, optionally filtered by subscription
    /// and by a minimum change date
    pub fn price_changes(
        &self,
        subscription_id: Option<i64>,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<PriceChange>> {
        let conn = self.conn()?;

        let mut conditions = Vec::new();
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(id) = subscription_id {
            conditions.push("subscription_id = ?");
            params_vec.push(Box::new(id));
        }
        if let Some(since) = since {
            conditions.push("change_date >= ?");
            params_vec.push(Box::new(format_datetime(&since)));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let sql = format!(
            r#"
            SELECT id, subscription_id, old_price, new_price, change_date, detected_automatically
            FROM price_changes
            {}
            ORDER BY change_date, id
            "#,
            where_clause
        );

        let mut stmt = conn.prepare(&sql)?;
        let params_refs: Vec<&dyn rusqlite::ToSql> =
            params_vec.iter().map(|p| p.as_ref()).collect();

        let changes = stmt
            .query_map(params_refs.as_slice(), |row| {
                let date_str: String = row.get(4)?;
                Ok(PriceChange {
                    id: row.get(0)?,
                    subscription_id: row.get(1)?,
                    old_price: row.get(2)?,
                    new_price: row.get(3)?,
                    change_date: parse_datetime(&date_str),
                    detected_automatically: row.get(5)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(changes)
    }
}
