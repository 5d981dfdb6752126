//! SQLite persistence layer for StudyQuest.
//!
//! One database file holds the whole game:
//!
//! ```sql
//! character        -- exactly one row (id = 1), version-stamped
//! learning_records -- the activity ledger
//! boss_defeats     -- trophy log, one row per level
//! ```
//!
//! [`Store`] owns the connection and hands out short-lived repositories
//! ([`ParameterStore`], [`RecordLedger`], [`BossDefeatLog`]) that borrow
//! either the connection or an open transaction.

mod defeats;
mod ledger;
mod params;

pub use defeats::BossDefeatLog;
pub use ledger::RecordLedger;
pub use params::ParameterStore;

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OpenFlags, Transaction, TransactionBehavior};
use tracing::info;

use crate::config::PersistenceConfig;
use crate::error::{QuestError, Result};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS character (
    id         INTEGER PRIMARY KEY CHECK (id = 1),
    defense    INTEGER NOT NULL CHECK (defense >= 5),
    attack     INTEGER NOT NULL CHECK (attack >= 5),
    power      INTEGER NOT NULL CHECK (power >= 5),
    hp         INTEGER NOT NULL CHECK (hp >= 5),
    gold       INTEGER NOT NULL CHECK (gold >= 0),
    version    INTEGER NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS learning_records (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    year           INTEGER NOT NULL,
    month          INTEGER NOT NULL,
    day            INTEGER NOT NULL,
    category       TEXT NOT NULL,
    memo           TEXT NOT NULL DEFAULT '',
    applied_amount INTEGER,
    created_at     TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_learning_records_date
    ON learning_records (year, month, day, id);
CREATE TABLE IF NOT EXISTS boss_defeats (
    level       INTEGER PRIMARY KEY,
    defeated_at TEXT NOT NULL
);";

/// Handle to an open StudyQuest database.
pub struct Store {
    conn: Connection,
    db_path: PathBuf,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("db_path", &self.db_path)
            .finish_non_exhaustive()
    }
}

impl Store {
    /// Open (or create) a database at `path` and apply the schema.
    ///
    /// # Errors
    ///
    /// Returns [`QuestError::Database`] on SQLite failures.
    pub fn open<P: AsRef<Path>>(path: P, config: &PersistenceConfig) -> Result<Self> {
        let db_path = path.as_ref().to_path_buf();
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;

        let conn = Connection::open_with_flags(&db_path, flags)?;
        conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;
        if config.wal_mode {
            let mode: String =
                conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
            tracing::debug!(journal_mode = %mode, "Journal mode set");
        }
        conn.execute_batch("PRAGMA synchronous = NORMAL;")?;
        conn.execute_batch(SCHEMA)?;

        info!(
            path = %db_path.display(),
            wal = config.wal_mode,
            "StudyQuest store opened"
        );

        Ok(Self { conn, db_path })
    }

    /// Open an in-memory database (useful for tests).
    ///
    /// # Errors
    ///
    /// Returns [`QuestError::Database`] on SQLite failures.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn,
            db_path: PathBuf::from(":memory:"),
        })
    }

    /// Begin a write transaction that takes the database write lock up
    /// front, so the read-modify-write inside it cannot interleave with
    /// another writer.
    ///
    /// Dropping the transaction without committing rolls it back.
    ///
    /// # Errors
    ///
    /// Returns [`QuestError::Database`] if the lock cannot be taken within
    /// the busy timeout.
    pub fn immediate(&mut self) -> Result<Transaction<'_>> {
        Ok(self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?)
    }

    /// Character repository over the bare connection.
    #[must_use]
    pub fn parameters(&self) -> ParameterStore<'_> {
        ParameterStore::new(&self.conn)
    }

    /// Ledger repository over the bare connection.
    #[must_use]
    pub fn ledger(&self) -> RecordLedger<'_> {
        RecordLedger::new(&self.conn)
    }

    /// Trophy repository over the bare connection.
    #[must_use]
    pub fn defeats(&self) -> BossDefeatLog<'_> {
        BossDefeatLog::new(&self.conn)
    }

    // ------------------------------------------------------------------
    // Maintenance
    // ------------------------------------------------------------------

    /// Copy the database to `dest_path` using SQLite's online-backup API.
    ///
    /// # Errors
    ///
    /// Returns [`QuestError::Database`] on SQLite failures.
    pub fn backup<P: AsRef<Path>>(&self, dest_path: P) -> Result<()> {
        let start = Instant::now();
        let mut dest = Connection::open(dest_path.as_ref())?;
        let backup = rusqlite::backup::Backup::new(&self.conn, &mut dest)?;
        backup.run_to_completion(256, Duration::from_millis(50), None)?;

        info!(
            dest = %dest_path.as_ref().display(),
            elapsed_ms = start.elapsed().as_millis(),
            "Database backup completed"
        );
        Ok(())
    }

    /// Run SQLite's integrity check. `Ok(false)` means corruption.
    ///
    /// # Errors
    ///
    /// Returns [`QuestError::Database`] if the check itself fails.
    pub fn integrity_check(&self) -> Result<bool> {
        let result: String = self
            .conn
            .query_row("PRAGMA integrity_check", [], |row| row.get(0))?;
        Ok(result == "ok")
    }

    /// Path to the database file (or `:memory:`).
    #[must_use]
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }
}

// ---------------------------------------------------------------------------
// Column helpers shared by the repositories
// ---------------------------------------------------------------------------

fn parse_timestamp(value: &str, column: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| QuestError::InvalidData(format!("invalid timestamp `{value}` in {column}: {e}")))
}

fn to_u32(value: i64, column: &str) -> Result<u32> {
    u32::try_from(value)
        .map_err(|_| QuestError::InvalidData(format!("value {value} out of range in {column}")))
}
