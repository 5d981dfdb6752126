//! JSON request dispatcher.
//!
//! A request is one JSON object tagged by `op`:
//!
//! ```json
//! {"op": "submit_record", "year": 2026, "month": 4, "day": 1, "category": "gnoble_math"}
//! {"op": "delete_record", "id": 12}
//! {"op": "list_records", "month": 4}
//! ```
//!
//! Every reply is a JSON value; failures use the error body shape.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::warn;

use crate::api::QuestApi;
use crate::dto::{BossDefeatBody, RecordBody, RecordsQuery};
use crate::error::{ApiError, Result};

/// One boundary operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ApiRequest {
    /// `GET status`
    Status,
    /// `POST record`
    SubmitRecord(RecordBody),
    /// `GET records`
    ListRecords(RecordsQuery),
    /// `DELETE record/{id}`
    DeleteRecord {
        /// Record to remove.
        id: i64,
    },
    /// `POST boss-defeat`
    RecordDefeat(BossDefeatBody),
    /// `GET boss-defeats`
    DefeatedLevels,
}

impl QuestApi {
    /// Run one decoded request.
    #[must_use]
    pub fn handle(&self, request: ApiRequest) -> Value {
        let reply = match request {
            ApiRequest::Status => self.status().and_then(to_value),
            ApiRequest::SubmitRecord(body) => self.submit_record(body).and_then(to_value),
            ApiRequest::ListRecords(query) => self.list_records(query).and_then(to_value),
            ApiRequest::DeleteRecord { id } => self.delete_record(id).and_then(to_value),
            ApiRequest::RecordDefeat(body) => self.record_defeat(body).and_then(to_value),
            ApiRequest::DefeatedLevels => self.defeated_levels().and_then(to_value),
        };
        reply.unwrap_or_else(|err| error_value(&err))
    }

    /// Decode, run and encode one request.
    #[must_use]
    pub fn handle_json(&self, raw: &str) -> String {
        let reply = match serde_json::from_str::<ApiRequest>(raw) {
            Ok(request) => self.handle(request),
            Err(err) => error_value(&ApiError::from(err)),
        };
        reply.to_string()
    }
}

fn to_value<T: Serialize>(value: T) -> Result<Value> {
    Ok(serde_json::to_value(value)?)
}

fn error_value(err: &ApiError) -> Value {
    warn!(kind = err.kind(), reason = %err, "Request failed");
    serde_json::to_value(err.body()).unwrap_or_else(|_| {
        json!({ "success": false, "reason": err.to_string(), "kind": err.kind() })
    })
}
