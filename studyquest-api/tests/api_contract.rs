//! Boundary contract tests: JSON shapes, error bodies and retry behavior.

use serde_json::{json, Value};
use studyquest_api::dto::{BossDefeatBody, RecordBody, RecordsQuery};
use studyquest_api::{ApiError, QuestApi};
use studyquest_core::config::QuestConfig;
use studyquest_core::{ProgressionService, Store};

fn memory_api() -> QuestApi {
    let mut config = QuestConfig::default();
    config.progression.dice_seed = Some(42);
    let service = ProgressionService::new(Store::open_in_memory().expect("open"), &config)
        .expect("service");
    QuestApi::new(service, &config.api)
}

fn call(api: &QuestApi, request: Value) -> Value {
    serde_json::from_str(&api.handle_json(&request.to_string())).expect("reply is json")
}

// ---------------------------------------------------------------------------
// Shapes
// ---------------------------------------------------------------------------

#[test]
fn cold_start_status_shape() {
    let api = memory_api();
    let reply = call(&api, json!({"op": "status"}));
    assert_eq!(
        reply,
        json!({
            "stats": {"defense": 5, "attack": 5, "power": 5, "hp": 5, "gold": 0},
            "levels": {"defense": 1, "attack": 1, "power": 1, "hp": 1},
            "currentBoss": null,
            "defeatedLevels": [],
        })
    );
}

#[test]
fn submit_reply_shape() {
    let api = memory_api();
    let reply = call(
        &api,
        json!({"op": "submit_record", "year": 2026, "month": 4, "day": 1,
               "category": "その他（自由記述）", "memo": "read a novel"}),
    );
    assert_eq!(reply["success"], true);
    assert_eq!(reply["stats"]["gold"], 10);
    assert_eq!(reply["appliedAmount"], Value::Null);
    assert_eq!(reply["leveledUp"], false);
    assert!(reply["recordId"].is_i64());
}

#[test]
fn records_list_in_date_order() {
    let api = memory_api();
    for day in [9, 2, 5] {
        api.submit_record(RecordBody {
            year: 2026,
            month: 4,
            day,
            category: "gnoble_japanese".into(),
            memo: String::new(),
        })
        .expect("submit");
    }

    let reply = call(&api, json!({"op": "list_records", "year": 2026, "month": 4}));
    let days: Vec<i64> = reply
        .as_array()
        .expect("array")
        .iter()
        .map(|r| r["day"].as_i64().expect("day"))
        .collect();
    assert_eq!(days, vec![2, 5, 9]);
    assert_eq!(reply[0]["category"], "gnoble_japanese");
    assert!(reply[0].get("appliedAmount").is_some());

    let none = api
        .list_records(RecordsQuery { year: Some(2025), month: None })
        .expect("list");
    assert!(none.is_empty());
}

#[test]
fn delete_reports_stats_or_reason() {
    let api = memory_api();
    let submitted = api
        .submit_record(RecordBody {
            year: 2026,
            month: 4,
            day: 1,
            category: "free_entry".into(),
            memo: String::new(),
        })
        .expect("submit");

    let reply = call(&api, json!({"op": "delete_record", "id": submitted.record_id}));
    assert_eq!(reply, json!({"success": true, "stats": {"defense": 5, "attack": 5, "power": 5, "hp": 5, "gold": 0}}));

    let again = call(&api, json!({"op": "delete_record", "id": submitted.record_id}));
    assert_eq!(again["success"], false);
    assert!(again["reason"].as_str().expect("reason").contains("not found"));
    assert!(again.get("stats").is_none());
}

#[test]
fn boss_defeats_are_idempotent() {
    let api = memory_api();
    let first = call(&api, json!({"op": "record_defeat", "level": 6}));
    let second = call(&api, json!({"op": "record_defeat", "level": 6}));
    assert_eq!(first, json!({"success": true, "level": 6}));
    assert_eq!(first, second);

    api.record_defeat(BossDefeatBody { level: 2 }).expect("defeat");
    assert_eq!(call(&api, json!({"op": "defeated_levels"})), json!([2, 6]));
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[test]
fn validation_errors_use_error_body() {
    let api = memory_api();

    let bad_category = call(
        &api,
        json!({"op": "submit_record", "year": 2026, "month": 4, "day": 1, "category": "origami"}),
    );
    assert_eq!(bad_category["success"], false);
    assert_eq!(bad_category["kind"], "validation");

    let bad_date = call(
        &api,
        json!({"op": "submit_record", "year": 2026, "month": 2, "day": 30, "category": "gnoble_math"}),
    );
    assert_eq!(bad_date["kind"], "validation");

    let bad_level = call(&api, json!({"op": "record_defeat", "level": 40}));
    assert_eq!(bad_level["kind"], "validation");

    let bad_month = call(&api, json!({"op": "list_records", "month": 0}));
    assert_eq!(bad_month["kind"], "validation");

    let status = api.status().expect("status");
    assert_eq!(status.stats.gold, 0);
    assert!(status.defeated_levels.is_empty());
}

#[test]
fn malformed_request_is_bad_request() {
    let api = memory_api();
    let reply: Value = serde_json::from_str(&api.handle_json("{not json")).expect("json");
    assert_eq!(reply["success"], false);
    assert_eq!(reply["kind"], "bad_request");
}

#[test]
fn strict_remove_surfaces_not_found() {
    let mut config = QuestConfig::default();
    config.progression.strict_remove = true;
    let service = ProgressionService::new(Store::open_in_memory().expect("open"), &config)
        .expect("service");
    let api = QuestApi::new(service, &config.api);

    let reply = call(&api, json!({"op": "delete_record", "id": 77}));
    assert_eq!(reply["kind"], "not_found");
}

// ---------------------------------------------------------------------------
// Retry
// ---------------------------------------------------------------------------

#[test]
fn busy_database_exhausts_retries_then_recovers() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut config = QuestConfig::default();
    config.persistence.database_path = dir.path().join("quest.db").display().to_string();
    config.persistence.busy_timeout_ms = 1;
    config.api.max_conflict_retries = 2;

    let api = QuestApi::open(&config).expect("open api");
    let mut blocker =
        Store::open(&config.persistence.database_path, &config.persistence).expect("blocker");

    let body = RecordBody {
        year: 2026,
        month: 4,
        day: 1,
        category: "gnoble_math".into(),
        memo: String::new(),
    };

    {
        let _lock = blocker.immediate().expect("hold write lock");
        let err = api.submit_record(body.clone()).expect_err("writer is locked out");
        assert!(matches!(err, ApiError::RetriesExhausted { attempts: 3, .. }));
        assert_eq!(err.kind(), "busy");
    }

    let reply = api.submit_record(body).expect("lock released");
    assert!(reply.success);
    assert_eq!(api.list_records(RecordsQuery::default()).expect("list").len(), 1);
}
