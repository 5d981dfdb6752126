//! The single character row.
//!
//! # Invariants
//! - At most one row exists: its primary key is pinned to `1`.
//! - Initialization is insert-if-absent, so racing first runs converge on
//!   one default character.
//! - Every write is a compare-and-swap on `version`.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, info};

use super::{parse_timestamp, to_u32};
use crate::error::{QuestError, Result};
use crate::types::CharacterSnapshot;

const CHARACTER_ID: i64 = 1;

/// Repository for the character snapshot.
pub struct ParameterStore<'c> {
    conn: &'c Connection,
}

impl<'c> ParameterStore<'c> {
    /// Wrap a connection or open transaction.
    #[must_use]
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    /// Read the current snapshot, if one was ever created.
    ///
    /// # Errors
    /// Returns [`QuestError::InvalidData`] if the stored row breaks the stat
    /// floors, or [`QuestError::Database`] on SQLite failures.
    pub fn load(&self) -> Result<Option<CharacterSnapshot>> {
        let row = self
            .conn
            .prepare_cached(
                "SELECT defense, attack, power, hp, gold, version, updated_at
                 FROM character WHERE id = ?1",
            )?
            .query_row(params![CHARACTER_ID], RawSnapshot::from_row)
            .optional()?;

        row.map(RawSnapshot::into_snapshot).transpose()
    }

    /// Return the current snapshot, creating the default one on first use.
    ///
    /// # Errors
    /// Returns [`QuestError::Database`] on SQLite failures.
    pub fn get_or_init(&self) -> Result<CharacterSnapshot> {
        let initial = CharacterSnapshot::initial();
        let inserted = self.conn.execute(
            "INSERT INTO character (id, defense, attack, power, hp, gold, version, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(id) DO NOTHING",
            params![
                CHARACTER_ID,
                initial.defense,
                initial.attack,
                initial.power,
                initial.hp,
                initial.gold,
                initial.version,
                initial.updated_at.to_rfc3339(),
            ],
        )?;
        if inserted > 0 {
            info!("Created default character");
        }

        self.load()?.ok_or_else(|| {
            QuestError::InvalidData("character row missing after initialization".to_string())
        })
    }

    /// Write `snapshot` over the stored row if nobody wrote since it was read.
    ///
    /// Returns the stored snapshot with its new version and timestamp.
    ///
    /// # Errors
    /// Returns [`QuestError::Conflict`] when the stored version differs from
    /// `snapshot.version`, or [`QuestError::InvalidData`] if the snapshot
    /// breaks the stat floors.
    pub fn persist(&self, snapshot: &CharacterSnapshot) -> Result<CharacterSnapshot> {
        snapshot.validate()?;
        let now = Utc::now();
        let changed = self.conn.execute(
            "UPDATE character
             SET defense = ?1, attack = ?2, power = ?3, hp = ?4, gold = ?5,
                 version = version + 1, updated_at = ?6
             WHERE id = ?7 AND version = ?8",
            params![
                snapshot.defense,
                snapshot.attack,
                snapshot.power,
                snapshot.hp,
                snapshot.gold,
                now.to_rfc3339(),
                CHARACTER_ID,
                snapshot.version,
            ],
        )?;

        if changed == 0 {
            return Err(QuestError::Conflict {
                expected: snapshot.version,
            });
        }

        debug!(version = snapshot.version + 1, "Persisted character");
        Ok(CharacterSnapshot {
            version: snapshot.version + 1,
            updated_at: now,
            ..snapshot.clone()
        })
    }
}

struct RawSnapshot {
    defense: i64,
    attack: i64,
    power: i64,
    hp: i64,
    gold: i64,
    version: i64,
    updated_at: String,
}

impl RawSnapshot {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            defense: row.get(0)?,
            attack: row.get(1)?,
            power: row.get(2)?,
            hp: row.get(3)?,
            gold: row.get(4)?,
            version: row.get(5)?,
            updated_at: row.get(6)?,
        })
    }

    fn into_snapshot(self) -> Result<CharacterSnapshot> {
        let snapshot = CharacterSnapshot {
            defense: to_u32(self.defense, "character.defense")?,
            attack: to_u32(self.attack, "character.attack")?,
            power: to_u32(self.power, "character.power")?,
            hp: to_u32(self.hp, "character.hp")?,
            gold: to_u32(self.gold, "character.gold")?,
            version: self.version,
            updated_at: parse_timestamp(&self.updated_at, "character.updated_at")?,
        };
        snapshot.validate()?;
        Ok(snapshot)
    }
}
