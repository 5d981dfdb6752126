//! Configuration for the StudyQuest engine.
//!
//! Maps directly to `studyquest.toml`. Every section and key is optional.
//!
//! ```toml
//! [general]
//! log_level = "info"
//!
//! [persistence]
//! database_path = "studyquest.db"
//! wal_mode = true
//! busy_timeout_ms = 5000
//!
//! [progression]
//! encounter_policy = "level_sync"
//! compensation = "fixed"
//! strict_remove = false
//! max_memo_chars = 500
//!
//! [api]
//! max_conflict_retries = 3
//! ```

use serde::{Deserialize, Serialize};

use crate::boss::policy_by_name;
use crate::category::CompensationMode;

/// Upper bound for `api.max_conflict_retries`.
pub const MAX_CONFLICT_RETRIES: u32 = 32;

/// Top-level StudyQuest configuration, loadable from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuestConfig {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// SQLite storage settings.
    #[serde(default)]
    pub persistence: PersistenceConfig,
    /// Progression rule switches.
    #[serde(default)]
    pub progression: ProgressionConfig,
    /// Boundary-layer settings.
    #[serde(default)]
    pub api: ApiConfig,
}

impl QuestConfig {
    /// Load configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `QuestError::Config` if the TOML is invalid or names an
    /// unknown encounter policy.
    pub fn from_toml(toml_str: &str) -> crate::error::Result<Self> {
        let config: Self =
            toml::from_str(toml_str).map_err(|e| crate::QuestError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Check cross-field constraints.
    ///
    /// # Errors
    /// Returns `QuestError::Config` on an unknown encounter policy, a zero
    /// memo limit or a retry limit above [`MAX_CONFLICT_RETRIES`].
    pub fn validate(&self) -> crate::error::Result<()> {
        policy_by_name(&self.progression.encounter_policy)?;
        if self.progression.max_memo_chars == 0 {
            return Err(crate::QuestError::Config(
                "progression.max_memo_chars must be positive".to_string(),
            ));
        }
        if self.api.max_conflict_retries > MAX_CONFLICT_RETRIES {
            return Err(crate::QuestError::Config(format!(
                "api.max_conflict_retries is {}, limit is {MAX_CONFLICT_RETRIES}",
                self.api.max_conflict_retries
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// General system settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Emit JSON log lines instead of human-readable ones.
    #[serde(default)]
    pub json_logs: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logs: false,
        }
    }
}

/// SQLite storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Database file path.
    #[serde(default = "default_database_path")]
    pub database_path: String,
    /// Use WAL mode so readers do not block the single writer.
    #[serde(default = "default_true")]
    pub wal_mode: bool,
    /// How long a connection waits for the write lock.
    #[serde(default = "default_5000")]
    pub busy_timeout_ms: u64,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: true,
            busy_timeout_ms: 5000,
        }
    }
}

/// Progression rule switches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressionConfig {
    /// Encounter policy: "`level_sync`" or "`min_threshold`".
    #[serde(default = "default_policy")]
    pub encounter_policy: String,
    /// How removals take points back.
    #[serde(default)]
    pub compensation: CompensationMode,
    /// Treat removing an unknown record as an error instead of a no-op.
    #[serde(default)]
    pub strict_remove: bool,
    /// Longest accepted memo, in characters.
    #[serde(default = "default_500")]
    pub max_memo_chars: usize,
    /// Fixed dice seed; `None` seeds from OS entropy.
    #[serde(default)]
    pub dice_seed: Option<u64>,
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            encounter_policy: default_policy(),
            compensation: CompensationMode::Fixed,
            strict_remove: false,
            max_memo_chars: 500,
            dice_seed: None,
        }
    }
}

/// Boundary-layer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Retries after a version conflict or busy database before giving up.
    #[serde(default = "default_3")]
    pub max_conflict_retries: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            max_conflict_retries: 3,
        }
    }
}

// ---------------------------------------------------------------------------
// Serde default helpers
// ---------------------------------------------------------------------------

fn default_true() -> bool { true }
fn default_log_level() -> String { "info".to_string() }
fn default_database_path() -> String { "studyquest.db".to_string() }
fn default_policy() -> String { "level_sync".to_string() }
fn default_3() -> u32 { 3 }
fn default_500() -> usize { 500 }
fn default_5000() -> u64 { 5000 }
