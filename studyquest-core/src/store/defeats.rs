//! Boss trophy log over `boss_defeats`.
//!
//! Membership only grows: recording the same level twice keeps one row.

use chrono::Utc;
use rusqlite::{params, Connection};
use tracing::info;

use super::to_u32;
use crate::error::Result;

/// Repository for defeated boss levels.
pub struct BossDefeatLog<'c> {
    conn: &'c Connection,
}

impl<'c> BossDefeatLog<'c> {
    /// Wrap a connection or open transaction.
    #[must_use]
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    /// Record a defeat. Returns `true` if the level was not yet in the log.
    ///
    /// # Errors
    /// Returns `QuestError::Database` on SQLite failures.
    pub fn record_defeat(&self, level: u32) -> Result<bool> {
        let inserted = self.conn.execute(
            "INSERT INTO boss_defeats (level, defeated_at) VALUES (?1, ?2)
             ON CONFLICT(level) DO NOTHING",
            params![level, Utc::now().to_rfc3339()],
        )?;
        if inserted > 0 {
            info!(level, "Boss defeat recorded");
        }
        Ok(inserted > 0)
    }

    /// All defeated levels, ascending.
    ///
    /// # Errors
    /// Returns `QuestError::Database` on SQLite failures.
    pub fn list_defeated(&self) -> Result<Vec<u32>> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT level FROM boss_defeats ORDER BY level ASC")?;
        let rows = stmt.query_map([], |row| row.get::<_, i64>(0))?;

        let mut levels = Vec::new();
        for row in rows {
            levels.push(to_u32(row?, "boss_defeats.level")?);
        }
        Ok(levels)
    }
}
