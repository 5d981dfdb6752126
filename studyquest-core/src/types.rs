//! Core type definitions for the StudyQuest progression engine.
//!
//! All types are serializable; JSON field names are camelCase to match the
//! boundary contract.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::category::Category;
use crate::error::{QuestError, Result};

/// Lowest value any of the four stats may take.
pub const STAT_FLOOR: u32 = 5;

/// Lowest value gold may take.
pub const GOLD_FLOOR: u32 = 0;

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// One of the four tracked character attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stat {
    /// Raised by Japanese-language study.
    Defense,
    /// Raised by math study.
    Attack,
    /// Raised by the foundation tests.
    Power,
    /// Raised by kanji drills.
    Hp,
}

impl Stat {
    /// All four stats in display order.
    pub const ALL: [Self; 4] = [Self::Defense, Self::Attack, Self::Power, Self::Hp];

    /// Stable lowercase name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Defense => "defense",
            Self::Attack => "attack",
            Self::Power => "power",
            Self::Hp => "hp",
        }
    }
}

impl fmt::Display for Stat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Character snapshot
// ---------------------------------------------------------------------------

/// The single authoritative character aggregate.
///
/// `version` is bumped by the store on every successful write and is the
/// compare-and-swap guard for the next one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterSnapshot {
    /// Defense stat (>= 5).
    pub defense: u32,
    /// Attack stat (>= 5).
    pub attack: u32,
    /// Power stat (>= 5).
    pub power: u32,
    /// Hit points stat (>= 5).
    pub hp: u32,
    /// Gold counter (>= 0).
    pub gold: u32,
    /// Optimistic concurrency stamp.
    pub version: i64,
    /// Wall-clock time of the last write.
    pub updated_at: DateTime<Utc>,
}

impl CharacterSnapshot {
    /// The cold-start character: every stat at the floor, no gold.
    #[must_use]
    pub fn initial() -> Self {
        Self {
            defense: STAT_FLOOR,
            attack: STAT_FLOOR,
            power: STAT_FLOOR,
            hp: STAT_FLOOR,
            gold: GOLD_FLOOR,
            version: 1,
            updated_at: Utc::now(),
        }
    }

    /// Read one stat.
    #[must_use]
    pub fn stat(&self, stat: Stat) -> u32 {
        match stat {
            Stat::Defense => self.defense,
            Stat::Attack => self.attack,
            Stat::Power => self.power,
            Stat::Hp => self.hp,
        }
    }

    /// Mutable access to one stat.
    pub fn stat_mut(&mut self, stat: Stat) -> &mut u32 {
        match stat {
            Stat::Defense => &mut self.defense,
            Stat::Attack => &mut self.attack,
            Stat::Power => &mut self.power,
            Stat::Hp => &mut self.hp,
        }
    }

    /// Check the stat floors.
    ///
    /// # Errors
    /// Returns [`QuestError::InvalidData`] naming the first stat below 5.
    pub fn validate(&self) -> Result<()> {
        for stat in Stat::ALL {
            let value = self.stat(stat);
            if value < STAT_FLOOR {
                return Err(QuestError::InvalidData(format!(
                    "{stat} is {value}, below the floor of {STAT_FLOOR}"
                )));
            }
        }
        Ok(())
    }

    /// The stats-only view used in boundary responses.
    #[must_use]
    pub fn stats(&self) -> StatBlock {
        StatBlock {
            defense: self.defense,
            attack: self.attack,
            power: self.power,
            hp: self.hp,
            gold: self.gold,
        }
    }
}

/// Plain stat values without versioning metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatBlock {
    /// Defense stat.
    pub defense: u32,
    /// Attack stat.
    pub attack: u32,
    /// Power stat.
    pub power: u32,
    /// Hit points stat.
    pub hp: u32,
    /// Gold counter.
    pub gold: u32,
}

// ---------------------------------------------------------------------------
// Ledger records
// ---------------------------------------------------------------------------

/// Identifier of a ledger record, assigned by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub i64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A calendar day an activity is filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordDate {
    /// Calendar year.
    pub year: i32,
    /// Month, 1-12.
    pub month: u32,
    /// Day of month, 1-31.
    pub day: u32,
}

impl RecordDate {
    /// Build a date, rejecting days that do not exist on the calendar.
    ///
    /// # Errors
    /// Returns [`QuestError::Validation`] for impossible dates such as
    /// `2026-02-30`.
    pub fn new(year: i32, month: u32, day: u32) -> Result<Self> {
        NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
            QuestError::Validation(format!("malformed date {year:04}-{month:02}-{day:02}"))
        })?;
        Ok(Self { year, month, day })
    }
}

impl fmt::Display for RecordDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

/// A submitted learning activity before it has an identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRecord {
    /// Day the activity is filed under.
    pub date: RecordDate,
    /// Activity kind.
    pub category: Category,
    /// Free-text note, may be empty.
    pub memo: String,
}

impl NewRecord {
    /// Validate raw parts into a new record.
    ///
    /// # Errors
    /// Returns [`QuestError::Validation`] on a malformed date.
    pub fn new(
        year: i32,
        month: u32,
        day: u32,
        category: Category,
        memo: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self {
            date: RecordDate::new(year, month, day)?,
            category,
            memo: memo.into(),
        })
    }
}

/// A persisted ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRecord {
    /// Store-assigned identity.
    pub id: RecordId,
    /// Calendar year.
    pub year: i32,
    /// Month, 1-12.
    pub month: u32,
    /// Day of month.
    pub day: u32,
    /// Activity kind.
    pub category: Category,
    /// Free-text note.
    pub memo: String,
    /// Stat amount rolled when the record was applied; `None` for gold-only
    /// categories.
    pub applied_amount: Option<u32>,
    /// When the record was appended.
    pub created_at: DateTime<Utc>,
}

impl ActivityRecord {
    /// The calendar day of this record.
    #[must_use]
    pub fn date(&self) -> RecordDate {
        RecordDate {
            year: self.year,
            month: self.month,
            day: self.day,
        }
    }
}

/// Optional year/month narrowing for ledger queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFilter {
    /// Only records of this year.
    pub year: Option<i32>,
    /// Only records of this month (1-12).
    pub month: Option<u32>,
}

impl RecordFilter {
    /// Filter to one calendar month.
    #[must_use]
    pub fn month_of(year: i32, month: u32) -> Self {
        Self {
            year: Some(year),
            month: Some(month),
        }
    }

    /// Reject month filters outside 1-12.
    ///
    /// # Errors
    /// Returns [`QuestError::Validation`] for an out-of-range month.
    pub fn validate(&self) -> Result<()> {
        match self.month {
            Some(month) if !(1..=12).contains(&month) => Err(QuestError::Validation(format!(
                "month filter {month} is outside 1-12"
            ))),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_snapshot_sits_on_the_floors() {
        let snap = CharacterSnapshot::initial();
        assert_eq!(snap.stats(), StatBlock { defense: 5, attack: 5, power: 5, hp: 5, gold: 0 });
        assert!(snap.validate().is_ok());
    }

    #[test]
    fn validate_rejects_stat_below_floor() {
        let mut snap = CharacterSnapshot::initial();
        snap.power = 4;
        let err = snap.validate().expect_err("power 4 must be rejected");
        assert!(err.to_string().contains("power"));
    }

    #[test]
    fn record_date_rejects_impossible_days() {
        assert!(RecordDate::new(2026, 2, 30).is_err());
        assert!(RecordDate::new(2026, 13, 1).is_err());
        assert!(RecordDate::new(2024, 2, 29).is_ok());
    }

    #[test]
    fn record_filter_rejects_bad_month() {
        assert!(RecordFilter { year: None, month: Some(0) }.validate().is_err());
        assert!(RecordFilter::month_of(2026, 12).validate().is_ok());
    }

    #[test]
    fn snapshot_serializes_camel_case() {
        let json = serde_json::to_value(CharacterSnapshot::initial()).expect("serialize");
        assert!(json.get("updatedAt").is_some());
        assert_eq!(json["defense"], 5);
    }
}
