//! Boss catalog and encounter policies.
//!
//! Twenty milestone bosses sit on levels 2 through 21. Whether one of them
//! is "current" is decided by an [`EncounterPolicy`]:
//!
//! - [`LevelSyncPolicy`] (`level_sync`, the default): the boss appears only
//!   when all four stat levels are exactly equal. Any imbalance hides it,
//!   however high a single stat climbs.
//! - [`MinimumThresholdPolicy`] (`min_threshold`): the strongest boss whose
//!   level the weakest stat has reached.
//!
//! Defeating a boss never retires it from matching.

use serde::Serialize;

use crate::error::{QuestError, Result};
use crate::level::Levels;

/// A static milestone definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BossDefinition {
    /// Level this boss guards.
    pub level: u32,
    /// Display name.
    pub name: &'static str,
    /// One-line flavor text.
    pub description: &'static str,
}

const fn boss(level: u32, name: &'static str, description: &'static str) -> BossDefinition {
    BossDefinition {
        level,
        name,
        description,
    }
}

/// The full catalog, ordered by level.
pub static BOSS_CATALOG: [BossDefinition; 20] = [
    boss(2, "Zanking the Rote Fiend", "A fiend that loathes memorization"),
    boss(3, "Slime of Careless Mistakes", "Quietly turns plus signs into minus signs"),
    boss(4, "Kalkros the Arithmetic Overlord", "An overlord who scrambles every calculation"),
    boss(5, "Strokewyrm", "Tangles the stroke order of every kanji"),
    boss(6, "Dokkaiser the Reading Dragon", "A dragon that devours reading comprehension"),
    boss(7, "Fractionator", "Pries numerators away from their denominators"),
    boss(8, "Idle Golem", "Whispers that tomorrow is a fine day to start"),
    boss(9, "Ratiomancer", "Bends ratios until they no longer balance"),
    boss(10, "Phantom of the Blank Sheet", "Haunts every question left unanswered"),
    boss(11, "Graph Hydra", "Grows a new axis for every one you cut"),
    boss(12, "Proverb Sphinx", "Speaks only in idioms and four-character proverbs"),
    boss(13, "Geometron", "Hides the one auxiliary line that solves the figure"),
    boss(14, "Warden of the Ticking Clock", "Makes the exam clock run twice as fast"),
    boss(15, "Oyodo the Applied Demon", "Ruler of the applied problems"),
    boss(16, "Essay Basilisk", "Petrifies the pen before the first sentence"),
    boss(17, "Speed Wraith", "Chases every train and traveller in the word problems"),
    boss(18, "Drowsy Titan", "Casts slumber on the afternoon study session"),
    boss(19, "Mock Exam Colossus", "Guards the gate of the practice exams"),
    boss(20, "Archfiend of Nerves", "Feeds on exam-day jitters"),
    boss(21, "Jukendevil the Demon King", "The strongest demon king, ruler of the entrance exams"),
];

/// The static catalog.
#[must_use]
pub fn catalog() -> &'static [BossDefinition] {
    &BOSS_CATALOG
}

/// Look up the boss guarding `level`.
#[must_use]
pub fn find(level: u32) -> Option<&'static BossDefinition> {
    BOSS_CATALOG.iter().find(|b| b.level == level)
}

// ---------------------------------------------------------------------------
// Policies
// ---------------------------------------------------------------------------

/// Strategy deciding which boss, if any, the character currently faces.
pub trait EncounterPolicy: Send + Sync {
    /// Configuration name of this policy.
    fn name(&self) -> &'static str;

    /// Pick the current boss from `catalog` for the given levels.
    fn current_boss<'a>(
        &self,
        levels: &Levels,
        catalog: &'a [BossDefinition],
    ) -> Option<&'a BossDefinition>;
}

/// Boss appears only when all four levels are equal and a boss guards that
/// level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LevelSyncPolicy;

impl EncounterPolicy for LevelSyncPolicy {
    fn name(&self) -> &'static str {
        "level_sync"
    }

    fn current_boss<'a>(
        &self,
        levels: &Levels,
        catalog: &'a [BossDefinition],
    ) -> Option<&'a BossDefinition> {
        let common = levels.synchronized()?;
        catalog.iter().find(|b| b.level == common)
    }
}

/// Strongest boss whose level the weakest stat has reached.
#[derive(Debug, Clone, Copy, Default)]
pub struct MinimumThresholdPolicy;

impl EncounterPolicy for MinimumThresholdPolicy {
    fn name(&self) -> &'static str {
        "min_threshold"
    }

    fn current_boss<'a>(
        &self,
        levels: &Levels,
        catalog: &'a [BossDefinition],
    ) -> Option<&'a BossDefinition> {
        let floor = levels.minimum();
        catalog
            .iter()
            .filter(|b| b.level <= floor)
            .max_by_key(|b| b.level)
    }
}

/// Build a policy from its configuration name.
///
/// # Errors
/// Returns [`QuestError::Config`] for an unknown name.
pub fn policy_by_name(name: &str) -> Result<Box<dyn EncounterPolicy>> {
    match name.trim() {
        "level_sync" => Ok(Box::new(LevelSyncPolicy)),
        "min_threshold" => Ok(Box::new(MinimumThresholdPolicy)),
        other => Err(QuestError::Config(format!(
            "unknown encounter policy `{other}`; expected level_sync|min_threshold"
        ))),
    }
}
