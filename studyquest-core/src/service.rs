//! Progression orchestration.
//!
//! [`ProgressionService`] is the only writer of the character. Each
//! mutating call opens one immediate transaction and does its whole
//! read-modify-write inside it: if any step fails the transaction is
//! dropped and nothing is kept.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::boss::{self, BossDefinition, EncounterPolicy};
use crate::category::{self, BonusRoll, CompensationMode, Dice};
use crate::config::{ProgressionConfig, QuestConfig};
use crate::error::{QuestError, Result};
use crate::level::Levels;
use crate::store::{BossDefeatLog, ParameterStore, RecordLedger, Store};
use crate::types::{ActivityRecord, CharacterSnapshot, NewRecord, RecordFilter, RecordId};

/// Result of a successful submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitOutcome {
    /// Character after the submission.
    pub snapshot: CharacterSnapshot,
    /// Levels after the submission.
    pub levels: Levels,
    /// Rolled amount; `None` for free-form entries.
    pub applied_amount: Option<u32>,
    /// Whether any stat moved up a level.
    pub leveled_up: bool,
    /// The ledger entry that was written.
    pub record: ActivityRecord,
}

/// Result of a removal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoveOutcome {
    /// The record existed; compensation was applied.
    Removed {
        /// Character after compensation.
        snapshot: CharacterSnapshot,
        /// The deleted entry.
        record: ActivityRecord,
    },
    /// No such record. Nothing changed.
    NotFound,
}

/// Read-only summary of the character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    /// Current character.
    pub snapshot: CharacterSnapshot,
    /// Derived levels.
    pub levels: Levels,
    /// Boss the character currently faces, if any.
    pub current_boss: Option<BossDefinition>,
    /// Defeated boss levels, ascending.
    pub defeated_levels: Vec<u32>,
}

/// Turns learning activity into character progression.
pub struct ProgressionService {
    store: Store,
    policy: Box<dyn EncounterPolicy>,
    dice: Box<dyn BonusRoll>,
    config: ProgressionConfig,
}

impl std::fmt::Debug for ProgressionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressionService")
            .field("store", &self.store)
            .field("policy", &self.policy.name())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ProgressionService {
    /// Build a service from configuration.
    ///
    /// The dice are seeded from `progression.dice_seed` when set, from OS
    /// entropy otherwise.
    ///
    /// # Errors
    /// Returns [`QuestError::Config`] for an unknown encounter policy.
    pub fn new(store: Store, config: &QuestConfig) -> Result<Self> {
        let policy = boss::policy_by_name(&config.progression.encounter_policy)?;
        let dice: Box<dyn BonusRoll> = match config.progression.dice_seed {
            Some(seed) => Box::new(Dice::seeded(seed)),
            None => Box::new(Dice::from_entropy()),
        };
        Ok(Self::with_parts(store, policy, dice, config.progression.clone()))
    }

    /// Build a service from explicit parts.
    #[must_use]
    pub fn with_parts(
        store: Store,
        policy: Box<dyn EncounterPolicy>,
        dice: Box<dyn BonusRoll>,
        config: ProgressionConfig,
    ) -> Self {
        info!(
            db = %store.db_path().display(),
            policy = policy.name(),
            compensation = ?config.compensation,
            "Progression service ready"
        );
        Self {
            store,
            policy,
            dice,
            config,
        }
    }

    /// The underlying store, for maintenance tasks such as backups.
    #[must_use]
    pub fn store(&self) -> &Store {
        &self.store
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Record a learning activity and apply its effect.
    ///
    /// # Errors
    /// Returns [`QuestError::Validation`] for an over-long memo, and
    /// [`QuestError::Conflict`] or [`QuestError::Database`] when the write
    /// loses a race or SQLite fails. No state changes on error.
    pub fn submit_record(&mut self, record: NewRecord) -> Result<SubmitOutcome> {
        let memo_chars = record.memo.chars().count();
        if memo_chars > self.config.max_memo_chars {
            return Err(QuestError::Validation(format!(
                "memo is {memo_chars} characters, limit is {}",
                self.config.max_memo_chars
            )));
        }

        let tx = self.store.immediate()?;
        let params = ParameterStore::new(&tx);

        let mut snapshot = params.get_or_init()?;
        let before = Levels::of(&snapshot);
        let delta = category::resolve(record.category, self.dice.as_mut());
        delta.apply_to(&mut snapshot);
        let after = Levels::of(&snapshot);
        let leveled_up = after.any_above(&before);

        let stored_record = RecordLedger::new(&tx).append(&record, delta.applied_amount)?;
        let stored = params.persist(&snapshot)?;
        tx.commit()?;

        info!(
            record_id = %stored_record.id,
            category = %record.category,
            applied_amount = ?delta.applied_amount,
            leveled_up,
            "Record submitted"
        );

        Ok(SubmitOutcome {
            snapshot: stored,
            levels: after,
            applied_amount: delta.applied_amount,
            leveled_up,
            record: stored_record,
        })
    }

    /// Remove a record and take back its points.
    ///
    /// An unknown id is [`RemoveOutcome::NotFound`], or
    /// [`QuestError::RecordNotFound`] when `strict_remove` is set.
    ///
    /// # Errors
    /// Returns [`QuestError::Conflict`] or [`QuestError::Database`] when the
    /// write loses a race or SQLite fails. No state changes on error.
    pub fn remove_record(&mut self, id: RecordId) -> Result<RemoveOutcome> {
        let strict = self.config.strict_remove;
        let mode = self.config.compensation;

        let tx = self.store.immediate()?;
        let ledger = RecordLedger::new(&tx);

        let Some(record) = ledger.get(id)? else {
            if strict {
                warn!(record_id = %id, "Remove of unknown record rejected");
                return Err(QuestError::RecordNotFound(id));
            }
            debug!(record_id = %id, "Remove of unknown record ignored");
            return Ok(RemoveOutcome::NotFound);
        };

        let params = ParameterStore::new(&tx);
        let mut snapshot = params.get_or_init()?;
        category::compensation(record.category, mode, record.applied_amount)
            .withdraw_from(&mut snapshot);
        let stored = params.persist(&snapshot)?;
        ledger.remove(id)?;
        tx.commit()?;

        info!(
            record_id = %id,
            category = %record.category,
            mode = compensation_name(mode),
            "Record removed"
        );

        Ok(RemoveOutcome::Removed {
            snapshot: stored,
            record,
        })
    }

    /// Mark the boss of `level` as defeated. Returns `true` the first time.
    ///
    /// # Errors
    /// Returns [`QuestError::Validation`] when no boss guards `level`.
    pub fn record_defeat(&mut self, level: u32) -> Result<bool> {
        if boss::find(level).is_none() {
            return Err(QuestError::Validation(format!("no boss guards level {level}")));
        }
        let tx = self.store.immediate()?;
        let newly = BossDefeatLog::new(&tx).record_defeat(level)?;
        tx.commit()?;
        Ok(newly)
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Current character, levels, boss and trophies.
    ///
    /// Creates the default character on first use. Only that first call
    /// takes the write lock.
    ///
    /// # Errors
    /// Returns [`QuestError::Database`] on SQLite failures.
    pub fn status(&mut self) -> Result<StatusReport> {
        let existing = self.store.parameters().load()?;
        let snapshot = match existing {
            Some(snapshot) => snapshot,
            None => {
                let tx = self.store.immediate()?;
                let snapshot = ParameterStore::new(&tx).get_or_init()?;
                tx.commit()?;
                snapshot
            }
        };
        let defeated_levels = self.store.defeats().list_defeated()?;

        let levels = Levels::of(&snapshot);
        let current_boss = self
            .policy
            .current_boss(&levels, boss::catalog())
            .copied();

        Ok(StatusReport {
            snapshot,
            levels,
            current_boss,
            defeated_levels,
        })
    }

    /// Ledger records matching `filter`, in date order.
    ///
    /// # Errors
    /// Returns [`QuestError::Validation`] for a bad month filter.
    pub fn list_records(&self, filter: &RecordFilter) -> Result<Vec<ActivityRecord>> {
        self.store.ledger().query(filter)
    }

    /// Defeated boss levels, ascending.
    ///
    /// # Errors
    /// Returns [`QuestError::Database`] on SQLite failures.
    pub fn defeated_levels(&self) -> Result<Vec<u32>> {
        self.store.defeats().list_defeated()
    }
}

fn compensation_name(mode: CompensationMode) -> &'static str {
    match mode {
        CompensationMode::Fixed => "fixed",
        CompensationMode::Exact => "exact",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boss::{LevelSyncPolicy, MinimumThresholdPolicy};
    use crate::category::Category;

    /// Cycles through fixed rolls.
    struct Scripted {
        rolls: Vec<u32>,
        next: usize,
    }

    impl BonusRoll for Scripted {
        fn roll(&mut self) -> u32 {
            let value = self.rolls[self.next % self.rolls.len()];
            self.next += 1;
            value
        }
    }

    fn service_with(rolls: &[u32], config: ProgressionConfig) -> ProgressionService {
        ProgressionService::with_parts(
            Store::open_in_memory().expect("open"),
            Box::new(LevelSyncPolicy),
            Box::new(Scripted {
                rolls: rolls.to_vec(),
                next: 0,
            }),
            config,
        )
    }

    fn service(rolls: &[u32]) -> ProgressionService {
        service_with(rolls, ProgressionConfig::default())
    }

    fn submit(svc: &mut ProgressionService, category: Category) -> SubmitOutcome {
        let record = NewRecord::new(2026, 4, 1, category, "").expect("valid date");
        svc.submit_record(record).expect("submit")
    }

    // --- status ---------------------------------------------------------

    #[test]
    fn cold_start_status() {
        let mut svc = service(&[1]);
        let status = svc.status().expect("status");
        assert_eq!(status.snapshot.stats(), CharacterSnapshot::initial().stats());
        assert_eq!(status.levels.synchronized(), Some(1));
        assert!(status.current_boss.is_none());
        assert!(status.defeated_levels.is_empty());
    }

    #[test]
    fn boss_appears_only_on_synchronized_levels() {
        let mut svc = service(&[2, 3, 1]);
        submit(&mut svc, Category::SuperQuest);
        let status = svc.status().expect("status");
        assert_eq!((status.snapshot.defense, status.snapshot.hp), (7, 7));
        assert_eq!(status.current_boss.map(|b| b.level), Some(2));

        submit(&mut svc, Category::YotsuyaKanji);
        submit(&mut svc, Category::YotsuyaKanji);
        let status = svc.status().expect("status");
        assert_eq!(status.snapshot.hp, 11);
        assert_eq!(status.levels.hp, 3);
        assert!(status.current_boss.is_none());
    }

    #[test]
    fn threshold_policy_follows_weakest_stat() {
        let mut svc = ProgressionService::with_parts(
            Store::open_in_memory().expect("open"),
            Box::new(MinimumThresholdPolicy),
            Box::new(Scripted { rolls: vec![2, 3, 1], next: 0 }),
            ProgressionConfig::default(),
        );
        submit(&mut svc, Category::SuperQuest);
        submit(&mut svc, Category::YotsuyaKanji);
        submit(&mut svc, Category::YotsuyaKanji);
        let status = svc.status().expect("status");
        assert_eq!(status.current_boss.map(|b| b.level), Some(2));
    }

    // --- submit ---------------------------------------------------------

    #[test]
    fn free_entry_adds_gold_only() {
        let mut svc = service(&[3]);
        let outcome = submit(&mut svc, Category::FreeEntry);
        assert_eq!(outcome.snapshot.gold, 10);
        assert_eq!(outcome.snapshot.attack, 5);
        assert_eq!(outcome.applied_amount, None);
        assert!(!outcome.leveled_up);
        assert_eq!(outcome.record.applied_amount, None);
    }

    #[test]
    fn combo_applies_one_draw_to_all_stats() {
        let mut svc = service(&[2, 3]);
        let outcome = submit(&mut svc, Category::SuperQuest);
        let s = &outcome.snapshot;
        assert_eq!((s.defense, s.attack, s.power, s.hp), (7, 7, 7, 7));
        assert_eq!(outcome.applied_amount, Some(2));
        assert!(outcome.leveled_up);
    }

    #[test]
    fn primary_category_raises_its_stat() {
        let mut svc = service(&[1]);
        let outcome = submit(&mut svc, Category::GnobleMath);
        assert_eq!(outcome.snapshot.attack, 6);
        assert_eq!(outcome.snapshot.defense, 5);
        assert!(outcome.leveled_up, "attack 5 -> 6 crosses into level 2");
        assert_eq!(outcome.levels.attack, 2);
    }

    #[test]
    fn version_advances_with_each_write() {
        let mut svc = service(&[1]);
        let first = submit(&mut svc, Category::OtherJapanese);
        let second = submit(&mut svc, Category::OtherJapanese);
        assert_eq!(second.snapshot.version, first.snapshot.version + 1);
    }

    #[test]
    fn long_memo_is_rejected_without_state_change() {
        let mut svc = service_with(
            &[3],
            ProgressionConfig {
                max_memo_chars: 4,
                ..ProgressionConfig::default()
            },
        );
        let record = NewRecord::new(2026, 4, 1, Category::GnobleMath, "漢字五文字").expect("date");
        assert!(matches!(svc.submit_record(record), Err(QuestError::Validation(_))));
        assert_eq!(svc.store().ledger().count().expect("count"), 0);
        assert_eq!(svc.status().expect("status").snapshot.attack, 5);
    }

    // --- remove ---------------------------------------------------------

    #[test]
    fn insert_then_remove_is_not_a_net_no_op() {
        let mut svc = service(&[3]);
        let outcome = submit(&mut svc, Category::GnobleMath);
        assert_eq!(outcome.snapshot.attack, 8);

        let removed = svc.remove_record(outcome.record.id).expect("remove");
        let RemoveOutcome::Removed { snapshot, record } = removed else {
            panic!("expected removal");
        };
        assert_eq!(snapshot.attack, 6);
        assert_eq!(record.id, outcome.record.id);
        assert!(svc.list_records(&RecordFilter::default()).expect("list").is_empty());
    }

    #[test]
    fn removal_clamps_at_floors() {
        let mut svc = service(&[1]);
        let math = submit(&mut svc, Category::GnobleMath);
        let gold = submit(&mut svc, Category::FreeEntry);

        svc.remove_record(math.record.id).expect("remove math");
        let RemoveOutcome::Removed { snapshot, .. } =
            svc.remove_record(gold.record.id).expect("remove gold")
        else {
            panic!("expected removal");
        };
        assert_eq!(snapshot.attack, 5);
        assert_eq!(snapshot.gold, 0);
    }

    #[test]
    fn removing_unknown_record_is_benign() {
        let mut svc = service(&[1]);
        let before = svc.status().expect("status").snapshot;
        assert_eq!(svc.remove_record(RecordId(99)).expect("remove"), RemoveOutcome::NotFound);
        let after = svc.status().expect("status").snapshot;
        assert_eq!(before.version, after.version);
    }

    #[test]
    fn strict_remove_reports_unknown_record() {
        let mut svc = service_with(
            &[1],
            ProgressionConfig {
                strict_remove: true,
                ..ProgressionConfig::default()
            },
        );
        assert!(matches!(
            svc.remove_record(RecordId(99)),
            Err(QuestError::RecordNotFound(RecordId(99)))
        ));
    }

    #[test]
    fn exact_compensation_reverses_the_roll() {
        let mut svc = service_with(
            &[3],
            ProgressionConfig {
                compensation: CompensationMode::Exact,
                ..ProgressionConfig::default()
            },
        );
        let outcome = submit(&mut svc, Category::SuperQuest);
        let RemoveOutcome::Removed { snapshot, .. } =
            svc.remove_record(outcome.record.id).expect("remove")
        else {
            panic!("expected removal");
        };
        assert_eq!(snapshot.stats(), CharacterSnapshot::initial().stats());
    }

    // --- defeats --------------------------------------------------------

    #[test]
    fn defeat_is_idempotent_and_independent_of_presence() {
        let mut svc = service(&[2]);
        assert!(svc.record_defeat(7).expect("first"));
        assert!(!svc.record_defeat(7).expect("second"));
        assert_eq!(svc.defeated_levels().expect("list"), vec![7]);

        submit(&mut svc, Category::SuperQuest);
        svc.record_defeat(2).expect("defeat 2");
        let status = svc.status().expect("status");
        assert_eq!(status.defeated_levels, vec![2, 7]);
        assert_eq!(status.current_boss.map(|b| b.level), Some(2));
    }

    #[test]
    fn defeat_outside_catalog_is_rejected() {
        let mut svc = service(&[1]);
        assert!(matches!(svc.record_defeat(1), Err(QuestError::Validation(_))));
        assert!(matches!(svc.record_defeat(22), Err(QuestError::Validation(_))));
        assert!(svc.defeated_levels().expect("list").is_empty());
    }

    #[test]
    fn new_rejects_unknown_policy() {
        let mut config = QuestConfig::default();
        config.progression.encounter_policy = "random".to_string();
        let store = Store::open_in_memory().expect("open");
        assert!(matches!(
            ProgressionService::new(store, &config),
            Err(QuestError::Config(_))
        ));
    }
}
