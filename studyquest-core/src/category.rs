//! Activity categories and their stat effects.
//!
//! The category set is closed. Each category maps to one effect rule:
//!
//! | kind      | categories                                 | effect                        |
//! |-----------|--------------------------------------------|-------------------------------|
//! | primary   | gnoble_japanese, gnoble_math, foundation_test, yotsuya_kanji | one stat +[1,3] |
//! | secondary | other_japanese, other_math                 | same stat as a primary, +[1,3] |
//! | combo     | super_quest                                | one draw of [1,3] to all four |
//! | free-form | free_entry                                 | gold +10 only                 |
//!
//! Random draws come from a [`BonusRoll`] so callers can inject a seeded or
//! scripted source.

use std::fmt;
use std::str::FromStr;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::{QuestError, Result};
use crate::types::{CharacterSnapshot, Stat, GOLD_FLOOR, STAT_FLOOR};

/// Smallest stat bonus a roll can produce.
pub const BONUS_MIN: u32 = 1;
/// Largest stat bonus a roll can produce.
pub const BONUS_MAX: u32 = 3;
/// Gold granted by a free-form entry.
pub const FREE_ENTRY_GOLD: u32 = 10;
/// Stat points withdrawn per affected stat when a record is removed.
pub const FIXED_STAT_COMPENSATION: u32 = 2;

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

/// One of the eight fixed activity kinds.
///
/// Serialized by key; the Japanese display labels are accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Gnoble Japanese class.
    #[serde(alias = "グノーブル国語")]
    GnobleJapanese,
    /// Gnoble math class.
    #[serde(alias = "グノーブル算数")]
    GnobleMath,
    /// Foundation skills test.
    #[serde(alias = "基礎力完成テスト")]
    FoundationTest,
    /// Yotsuya Otsuka kanji drill.
    #[serde(alias = "四谷大塚漢字")]
    YotsuyaKanji,
    /// Other Japanese study.
    #[serde(alias = "その他国語")]
    OtherJapanese,
    /// Other math study.
    #[serde(alias = "その他算数")]
    OtherMath,
    /// Super quest: trains everything at once.
    #[serde(alias = "その他（スーパークエスト）")]
    SuperQuest,
    /// Free-form entry, paid in gold.
    #[serde(alias = "その他（自由記述）")]
    FreeEntry,
}

/// The stat/gold target of a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Raise one stat by a rolled amount.
    Single(Stat),
    /// Raise all four stats by one shared rolled amount.
    AllStats,
    /// Add a fixed amount of gold.
    Gold(u32),
}

impl Category {
    /// Every category in display order.
    pub const ALL: [Self; 8] = [
        Self::GnobleJapanese,
        Self::GnobleMath,
        Self::FoundationTest,
        Self::YotsuyaKanji,
        Self::OtherJapanese,
        Self::OtherMath,
        Self::SuperQuest,
        Self::FreeEntry,
    ];

    /// Stable storage/wire key.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::GnobleJapanese => "gnoble_japanese",
            Self::GnobleMath => "gnoble_math",
            Self::FoundationTest => "foundation_test",
            Self::YotsuyaKanji => "yotsuya_kanji",
            Self::OtherJapanese => "other_japanese",
            Self::OtherMath => "other_math",
            Self::SuperQuest => "super_quest",
            Self::FreeEntry => "free_entry",
        }
    }

    /// Display label shown on the activity calendar.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::GnobleJapanese => "グノーブル国語",
            Self::GnobleMath => "グノーブル算数",
            Self::FoundationTest => "基礎力完成テスト",
            Self::YotsuyaKanji => "四谷大塚漢字",
            Self::OtherJapanese => "その他国語",
            Self::OtherMath => "その他算数",
            Self::SuperQuest => "その他（スーパークエスト）",
            Self::FreeEntry => "その他（自由記述）",
        }
    }

    /// What this category raises.
    #[must_use]
    pub fn effect(self) -> Effect {
        match self {
            Self::GnobleJapanese | Self::OtherJapanese => Effect::Single(Stat::Defense),
            Self::GnobleMath | Self::OtherMath => Effect::Single(Stat::Attack),
            Self::FoundationTest => Effect::Single(Stat::Power),
            Self::YotsuyaKanji => Effect::Single(Stat::Hp),
            Self::SuperQuest => Effect::AllStats,
            Self::FreeEntry => Effect::Gold(FREE_ENTRY_GOLD),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Category {
    type Err = QuestError;

    fn from_str(s: &str) -> Result<Self> {
        let needle = s.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.key() == needle || c.label() == needle)
            .ok_or_else(|| QuestError::Validation(format!("unknown category `{needle}`")))
    }
}

// ---------------------------------------------------------------------------
// Random source
// ---------------------------------------------------------------------------

/// Source of stat bonuses in `[BONUS_MIN, BONUS_MAX]`.
pub trait BonusRoll: Send {
    /// Draw one bonus.
    fn roll(&mut self) -> u32;
}

/// [`BonusRoll`] backed by a `rand` generator.
#[derive(Debug, Clone)]
pub struct Dice<R = StdRng> {
    rng: R,
}

impl<R: Rng> Dice<R> {
    /// Wrap an existing generator.
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl Dice<StdRng> {
    /// Deterministic dice for replays and tests.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    /// Dice seeded from OS entropy.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }
}

impl<R: Rng + Send> BonusRoll for Dice<R> {
    fn roll(&mut self) -> u32 {
        self.rng.gen_range(BONUS_MIN..=BONUS_MAX)
    }
}

// ---------------------------------------------------------------------------
// Deltas
// ---------------------------------------------------------------------------

/// A change to the character, in absolute points per field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatDelta {
    /// Defense points.
    pub defense: u32,
    /// Attack points.
    pub attack: u32,
    /// Power points.
    pub power: u32,
    /// Hp points.
    pub hp: u32,
    /// Gold.
    pub gold: u32,
    /// The rolled amount, reported back to the caller; `None` for gold-only.
    pub applied_amount: Option<u32>,
}

impl StatDelta {
    fn with_stat(stat: Stat, amount: u32) -> Self {
        let mut delta = Self {
            applied_amount: Some(amount),
            ..Self::default()
        };
        *delta.stat_mut(stat) = amount;
        delta
    }

    fn all_stats(amount: u32) -> Self {
        Self {
            defense: amount,
            attack: amount,
            power: amount,
            hp: amount,
            gold: 0,
            applied_amount: Some(amount),
        }
    }

    fn gold(amount: u32) -> Self {
        Self {
            gold: amount,
            ..Self::default()
        }
    }

    fn stat_mut(&mut self, stat: Stat) -> &mut u32 {
        match stat {
            Stat::Defense => &mut self.defense,
            Stat::Attack => &mut self.attack,
            Stat::Power => &mut self.power,
            Stat::Hp => &mut self.hp,
        }
    }

    /// Points for one stat.
    #[must_use]
    pub fn stat(&self, stat: Stat) -> u32 {
        match stat {
            Stat::Defense => self.defense,
            Stat::Attack => self.attack,
            Stat::Power => self.power,
            Stat::Hp => self.hp,
        }
    }

    /// Add this delta to a snapshot.
    pub fn apply_to(&self, snapshot: &mut CharacterSnapshot) {
        for stat in Stat::ALL {
            let value = snapshot.stat_mut(stat);
            *value = value.saturating_add(self.stat(stat));
        }
        snapshot.gold = snapshot.gold.saturating_add(self.gold);
    }

    /// Subtract this delta from a snapshot, clamping at the floors.
    pub fn withdraw_from(&self, snapshot: &mut CharacterSnapshot) {
        for stat in Stat::ALL {
            let amount = self.stat(stat);
            if amount == 0 {
                continue;
            }
            let value = snapshot.stat_mut(stat);
            *value = value.saturating_sub(amount).max(STAT_FLOOR);
        }
        if self.gold > 0 {
            snapshot.gold = snapshot.gold.saturating_sub(self.gold).max(GOLD_FLOOR);
        }
    }
}

/// How removing a record takes points back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompensationMode {
    /// Withdraw a flat [`FIXED_STAT_COMPENSATION`] per affected stat,
    /// regardless of what was rolled.
    #[default]
    Fixed,
    /// Withdraw exactly the amount the record applied.
    Exact,
}

/// Resolve the effect of submitting `category`, drawing at most once.
pub fn resolve(category: Category, dice: &mut dyn BonusRoll) -> StatDelta {
    match category.effect() {
        Effect::Single(stat) => StatDelta::with_stat(stat, dice.roll()),
        Effect::AllStats => StatDelta::all_stats(dice.roll()),
        Effect::Gold(amount) => StatDelta::gold(amount),
    }
}

/// The delta withdrawn when a record of `category` is removed.
///
/// `applied_amount` is only consulted in [`CompensationMode::Exact`]; rows
/// without one fall back to the fixed amount.
#[must_use]
pub fn compensation(
    category: Category,
    mode: CompensationMode,
    applied_amount: Option<u32>,
) -> StatDelta {
    let amount = match mode {
        CompensationMode::Fixed => FIXED_STAT_COMPENSATION,
        CompensationMode::Exact => applied_amount.unwrap_or(FIXED_STAT_COMPENSATION),
    };
    match category.effect() {
        Effect::Single(stat) => StatDelta::with_stat(stat, amount),
        Effect::AllStats => StatDelta::all_stats(amount),
        Effect::Gold(gold) => StatDelta::gold(gold),
    }
}
