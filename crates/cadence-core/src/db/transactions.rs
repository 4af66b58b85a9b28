//! Transaction operations

use rusqlite::{params, OptionalExtension};

use super::{parse_date, Database, DATE_FORMAT};
use crate::error::{Error, Result};
use crate::models::{Category, NewTransaction, Transaction};

impl Database {
    /// Insert a transaction and return its id
    pub fn insert_transaction(&self, tx: &NewTransaction) -> Result<i64> {
        let conn = self.conn()?;
        let tags = serde_json::to_string(&tx.tags)?;

        conn.execute(
            r#"
            INSERT INTO transactions (date, description, amount, category, is_recurring, tags)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
            params![
                tx.date.format(DATE_FORMAT).to_string(),
                tx.description,
                tx.amount,
                tx.category.as_str(),
                tx.is_recurring,
                tags,
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }

    /// Get a single transaction by ID
    pub fn get_transaction(&self, id: i64) -> Result<Option<Transaction>> {
        let conn = self.conn()?;
        let transaction = conn
            .query_row(
                "SELECT id, date, description, amount, category, is_recurring, tags
                 FROM transactions WHERE id = ?",
                params![id],
                |row| Self::row_to_transaction(row),
            )
            .optional()?;
        Ok(transaction)
    }

    /// List every transaction, oldest first
    pub fn all_transactions(&self) -> Result<Vec<Transaction>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, date, description, amount, category, is_recurring, tags
             FROM transactions ORDER BY date, id",
        )?;

        let transactions = stmt
            .query_map([], |row| Self::row_to_transaction(row))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(transactions)
    }

    /// Amend a recorded transaction in place
    pub fn update_transaction(&self, tx: &Transaction) -> Result<()> {
        let conn = self.conn()?;
        let tags = serde_json::to_string(&tx.tags)?;

        let updated = conn.execute(
            r#"
            UPDATE transactions SET
                date = ?, description = ?, amount = ?, category = ?, is_recurring = ?, tags = ?
            WHERE id = ?
            "#,
            params![
                tx.date.format(DATE_FORMAT).to_string(),
                tx.description,
                tx.amount,
                tx.category.as_str(),
                tx.is_recurring,
                tags,
                tx.id,
            ],
        )?;

        if updated == 0 {
            return Err(Error::NotFound(format!("Transaction {}", tx.id)));
        }
        Ok(())
    }

    /// Delete a transaction; returns whether it existed
    pub fn delete_transaction(&self, id: i64) -> Result<bool> {
        let conn = self.conn()?;
        let deleted = conn.execute("DELETE FROM transactions WHERE id = ?", params![id])?;
        Ok(deleted > 0)
    }

    /// Helper to convert a row to Transaction
    /// Column order: id, date, description, amount, category, is_recurring, tags
    fn row_to_transaction(row: &rusqlite::Row) -> rusqlite::Result<Transaction> {
        let date_str: String = row.get(1)?;
        let category_str: String = row.get(4)?;
        let tags_str: String = row.get(6)?;

        Ok(Transaction {
            id: row.get(0)?,
            date: parse_date(&date_str),
            description: row.get(2)?,
            amount: row.get(3)?,
            category: category_str.parse().unwrap_or(Category::Other),
            is_recurring: row.get(5)?,
            tags: serde_json::from_str(&tags_str).unwrap_or_default(),
        })
    }
}
