//! Activity ledger over `learning_records`.
//!
//! # Invariants
//! - Ids come from `AUTOINCREMENT`: monotonic and never reused.
//! - Queries return records ordered by `(year, month, day, id)`.
//! - The ledger never touches the character row; compensation on removal
//!   is the service's job.

use chrono::Utc;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use tracing::debug;

use super::{parse_timestamp, to_u32};
use crate::category::Category;
use crate::error::{QuestError, Result};
use crate::types::{ActivityRecord, NewRecord, RecordFilter, RecordId};

const RECORD_SELECT_SQL: &str = "SELECT
    id,
    year,
    month,
    day,
    category,
    memo,
    applied_amount,
    created_at
FROM learning_records";

/// Repository for ledger records.
pub struct RecordLedger<'c> {
    conn: &'c Connection,
}

impl<'c> RecordLedger<'c> {
    /// Wrap a connection or open transaction.
    #[must_use]
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    /// Append a record and return it with its assigned id.
    ///
    /// # Errors
    /// Returns [`QuestError::Database`] on SQLite failures.
    pub fn append(&self, record: &NewRecord, applied_amount: Option<u32>) -> Result<ActivityRecord> {
        let created_at = Utc::now();
        self.conn.execute(
            "INSERT INTO learning_records (year, month, day, category, memo, applied_amount, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                record.date.year,
                record.date.month,
                record.date.day,
                record.category.key(),
                record.memo.as_str(),
                applied_amount,
                created_at.to_rfc3339(),
            ],
        )?;
        let id = RecordId(self.conn.last_insert_rowid());
        debug!(record_id = %id, category = %record.category, date = %record.date, "Appended record");

        Ok(ActivityRecord {
            id,
            year: record.date.year,
            month: record.date.month,
            day: record.date.day,
            category: record.category,
            memo: record.memo.clone(),
            applied_amount,
            created_at,
        })
    }

    /// Fetch one record.
    ///
    /// # Errors
    /// Returns [`QuestError::InvalidData`] for unreadable rows.
    pub fn get(&self, id: RecordId) -> Result<Option<ActivityRecord>> {
        let mut stmt = self
            .conn
            .prepare_cached(&format!("{RECORD_SELECT_SQL} WHERE id = ?1"))?;
        stmt.query_row(params![id.0], RawRecord::from_row)
            .optional()?
            .map(RawRecord::into_record)
            .transpose()
    }

    /// List records, optionally narrowed to a year and/or month, in date
    /// order.
    ///
    /// # Errors
    /// Returns [`QuestError::Validation`] for a month outside 1-12.
    pub fn query(&self, filter: &RecordFilter) -> Result<Vec<ActivityRecord>> {
        filter.validate()?;

        let mut sql = format!("{RECORD_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(year) = filter.year {
            sql.push_str(" AND year = ?");
            bind_values.push(Value::Integer(i64::from(year)));
        }
        if let Some(month) = filter.month {
            sql.push_str(" AND month = ?");
            bind_values.push(Value::Integer(i64::from(month)));
        }
        sql.push_str(" ORDER BY year ASC, month ASC, day ASC, id ASC");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(RawRecord::from_row(row)?.into_record()?);
        }
        Ok(records)
    }

    /// Delete a record, returning what was removed.
    ///
    /// # Errors
    /// Returns [`QuestError::Database`] on SQLite failures.
    pub fn remove(&self, id: RecordId) -> Result<Option<ActivityRecord>> {
        let Some(record) = self.get(id)? else {
            return Ok(None);
        };
        self.conn
            .execute("DELETE FROM learning_records WHERE id = ?1", params![id.0])?;
        debug!(record_id = %id, "Removed record");
        Ok(Some(record))
    }

    /// Number of records in the ledger.
    ///
    /// # Errors
    /// Returns [`QuestError::Database`] on SQLite failures.
    pub fn count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM learning_records", [], |row| row.get(0))?;
        usize::try_from(count).map_err(|_| QuestError::InvalidData(format!("negative count {count}")))
    }
}

struct RawRecord {
    id: i64,
    year: i64,
    month: i64,
    day: i64,
    category: String,
    memo: String,
    applied_amount: Option<i64>,
    created_at: String,
}

impl RawRecord {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            year: row.get("year")?,
            month: row.get("month")?,
            day: row.get("day")?,
            category: row.get("category")?,
            memo: row.get("memo")?,
            applied_amount: row.get("applied_amount")?,
            created_at: row.get("created_at")?,
        })
    }

    fn into_record(self) -> Result<ActivityRecord> {
        let category: Category = self.category.parse().map_err(|_| {
            QuestError::InvalidData(format!(
                "invalid category `{}` in learning_records.category",
                self.category
            ))
        })?;
        let year = i32::try_from(self.year).map_err(|_| {
            QuestError::InvalidData(format!("year {} out of range in learning_records.year", self.year))
        })?;

        Ok(ActivityRecord {
            id: RecordId(self.id),
            year,
            month: to_u32(self.month, "learning_records.month")?,
            day: to_u32(self.day, "learning_records.day")?,
            category,
            memo: self.memo,
            applied_amount: self
                .applied_amount
                .map(|v| to_u32(v, "learning_records.applied_amount"))
                .transpose()?,
            created_at: parse_timestamp(&self.created_at, "learning_records.created_at")?,
        })
    }
}
