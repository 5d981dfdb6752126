//! # StudyQuest Core Library
//!
//! Progression engine that turns learning-activity records into the
//! persistent state of a single RPG-styled character:
//!
//! - **Stats**: defense, attack, power and hp (floor 5), plus gold (floor 0)
//! - **Levels**: derived per stat in bands of five points
//! - **Ledger**: dated activity records, each one a stat mutation
//! - **Bosses**: milestones that appear when the four levels line up
//! - **Trophies**: an idempotent log of defeated boss levels
//!
//! Everything is stored in one SQLite database. Every mutating operation
//! of [`ProgressionService`] runs inside a single immediate transaction,
//! and the character row carries a version stamp that guards every write.

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod boss;
pub mod category;
pub mod config;
pub mod error;
pub mod level;
pub mod service;
pub mod store;
pub mod telemetry;
pub mod types;

pub use boss::{BossDefinition, EncounterPolicy, LevelSyncPolicy, MinimumThresholdPolicy};
pub use category::{BonusRoll, Category, Dice, StatDelta};
pub use config::QuestConfig;
pub use error::{QuestError, Result};
pub use level::Levels;
pub use service::{ProgressionService, RemoveOutcome, StatusReport, SubmitOutcome};
pub use store::Store;
pub use types::*;
