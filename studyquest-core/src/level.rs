//! Level banding: stat value to level.
//!
//! Levels come in bands of five points:
//!
//! ```text
//!   stat   1..=5   6..=10   11..=15   ...
//!   level    1        2         3     ...
//! ```
//!
//!   level(s) = floor((s - 1) / 5) + 1
//!
//! A stat of 0 never occurs for a valid character; it saturates to level 1.

use serde::{Deserialize, Serialize};

use crate::types::{CharacterSnapshot, Stat};

/// Width of one level band in stat points.
pub const LEVEL_BAND: u32 = 5;

/// Map a stat value to its level.
#[must_use]
pub fn level(stat: u32) -> u32 {
    stat.saturating_sub(1) / LEVEL_BAND + 1
}

/// The four derived levels of a character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Levels {
    /// Level of the defense stat.
    pub defense: u32,
    /// Level of the attack stat.
    pub attack: u32,
    /// Level of the power stat.
    pub power: u32,
    /// Level of the hp stat.
    pub hp: u32,
}

impl Levels {
    /// Derive the levels of a snapshot.
    #[must_use]
    pub fn of(snapshot: &CharacterSnapshot) -> Self {
        Self {
            defense: level(snapshot.defense),
            attack: level(snapshot.attack),
            power: level(snapshot.power),
            hp: level(snapshot.hp),
        }
    }

    /// Level of one stat.
    #[must_use]
    pub fn get(&self, stat: Stat) -> u32 {
        match stat {
            Stat::Defense => self.defense,
            Stat::Attack => self.attack,
            Stat::Power => self.power,
            Stat::Hp => self.hp,
        }
    }

    /// The common level when all four are equal, `None` otherwise.
    #[must_use]
    pub fn synchronized(&self) -> Option<u32> {
        let first = self.defense;
        Stat::ALL
            .iter()
            .all(|&stat| self.get(stat) == first)
            .then_some(first)
    }

    /// The lowest of the four levels.
    #[must_use]
    pub fn minimum(&self) -> u32 {
        Stat::ALL
            .iter()
            .map(|&stat| self.get(stat))
            .min()
            .unwrap_or(1)
    }

    /// Whether any stat sits on a higher level than in `before`.
    #[must_use]
    pub fn any_above(&self, before: &Self) -> bool {
        Stat::ALL
            .iter()
            .any(|&stat| self.get(stat) > before.get(stat))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn band_edges() {
        assert_eq!(level(1), 1);
        assert_eq!(level(5), 1);
        assert_eq!(level(6), 2);
        assert_eq!(level(10), 2);
        assert_eq!(level(11), 3);
        assert_eq!(level(105), 21);
    }

    #[test]
    fn zero_saturates_to_level_one() {
        assert_eq!(level(0), 1);
    }

    #[test]
    fn synchronized_needs_all_four() {
        let mut snap = CharacterSnapshot::initial();
        snap.defense = 6;
        snap.attack = 7;
        snap.power = 8;
        snap.hp = 10;
        assert_eq!(Levels::of(&snap).synchronized(), Some(2));

        snap.hp = 11;
        assert_eq!(Levels::of(&snap).synchronized(), None);
        assert_eq!(Levels::of(&snap).minimum(), 2);
    }

    #[test]
    fn any_above_detects_single_stat_gain() {
        let before = Levels::of(&CharacterSnapshot::initial());
        let mut snap = CharacterSnapshot::initial();
        snap.attack = 6;
        assert!(Levels::of(&snap).any_above(&before));
        assert!(!before.any_above(&before));
    }
}
