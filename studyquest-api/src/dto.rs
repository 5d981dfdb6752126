//! Request and response bodies. All keys are camelCase.

use serde::{Deserialize, Serialize};
use studyquest_core::{ActivityRecord, BossDefinition, Levels, RecordId, StatBlock};

/// Body of a record submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordBody {
    /// Calendar year.
    pub year: i32,
    /// Month, 1-12.
    pub month: u32,
    /// Day of month.
    pub day: u32,
    /// Category key or display label.
    pub category: String,
    /// Optional note.
    #[serde(default)]
    pub memo: String,
}

/// Optional filters for listing records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordsQuery {
    /// Only this year.
    #[serde(default)]
    pub year: Option<i32>,
    /// Only this month.
    #[serde(default)]
    pub month: Option<u32>,
}

/// Body of a boss defeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BossDefeatBody {
    /// Level of the defeated boss.
    pub level: u32,
}

/// Character summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    /// Current stats and gold.
    pub stats: StatBlock,
    /// Derived levels.
    pub levels: Levels,
    /// Boss currently faced, or `null`.
    pub current_boss: Option<BossDefinition>,
    /// Defeated boss levels, ascending.
    pub defeated_levels: Vec<u32>,
}

/// Reply to a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    /// Always `true`.
    pub success: bool,
    /// Stats after the submission.
    pub stats: StatBlock,
    /// Rolled amount, `null` for free-form entries.
    pub applied_amount: Option<u32>,
    /// Whether any stat moved up a level.
    pub leveled_up: bool,
    /// Id of the new record.
    pub record_id: RecordId,
}

/// Reply to a deletion. Unknown ids give `success: false` with a reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResponse {
    /// Whether a record was removed.
    pub success: bool,
    /// Stats after compensation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<StatBlock>,
    /// Why nothing was removed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Reply to a boss defeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BossDefeatResponse {
    /// Always `true`; repeats are not errors.
    pub success: bool,
    /// The recorded level.
    pub level: u32,
}

/// Reply to a record listing.
pub type RecordsResponse = Vec<ActivityRecord>;
