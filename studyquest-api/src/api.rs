//! Typed handlers over a shared [`ProgressionService`].
//!
//! The service sits behind a `parking_lot::Mutex`; each attempt takes the
//! lock, runs one engine operation and releases it. Conflicts and busy
//! databases are retried up to `api.max_conflict_retries` times.

use std::thread;
use std::time::Duration;

use parking_lot::Mutex;
use studyquest_core::config::{ApiConfig, QuestConfig, MAX_CONFLICT_RETRIES};
use studyquest_core::{
    Category, NewRecord, ProgressionService, RecordFilter, RecordId, RemoveOutcome, Store,
};
use tracing::{debug, warn};

use crate::dto::{
    BossDefeatBody, BossDefeatResponse, DeleteResponse, RecordBody, RecordsQuery,
    RecordsResponse, StatusResponse, SubmitResponse,
};
use crate::error::{ApiError, Result};

/// Pause before retry `n` (1-based).
const RETRY_BACKOFF_MS: u64 = 15;

/// Boundary entry point.
pub struct QuestApi {
    service: Mutex<ProgressionService>,
    max_retries: u32,
}

impl QuestApi {
    /// Wrap an existing service. The retry limit is capped at
    /// [`MAX_CONFLICT_RETRIES`].
    #[must_use]
    pub fn new(service: ProgressionService, config: &ApiConfig) -> Self {
        Self {
            service: Mutex::new(service),
            max_retries: config.max_conflict_retries.min(MAX_CONFLICT_RETRIES),
        }
    }

    /// Open the configured database and build the service on it.
    ///
    /// # Errors
    /// Fails if the database cannot be opened or the configuration names an
    /// unknown policy.
    pub fn open(config: &QuestConfig) -> Result<Self> {
        let store = Store::open(&config.persistence.database_path, &config.persistence)?;
        let service = ProgressionService::new(store, config)?;
        Ok(Self::new(service, &config.api))
    }

    /// `GET status`
    ///
    /// # Errors
    /// Storage failures.
    pub fn status(&self) -> Result<StatusResponse> {
        let report = self.with_retry("status", ProgressionService::status)?;
        Ok(StatusResponse {
            stats: report.snapshot.stats(),
            levels: report.levels,
            current_boss: report.current_boss,
            defeated_levels: report.defeated_levels,
        })
    }

    /// `POST record`
    ///
    /// # Errors
    /// Validation failures for unknown categories, impossible dates and
    /// over-long memos; storage failures otherwise.
    pub fn submit_record(&self, body: RecordBody) -> Result<SubmitResponse> {
        let category: Category = body.category.parse()?;
        let record = NewRecord::new(body.year, body.month, body.day, category, body.memo)?;

        let outcome = self.with_retry("submit_record", |svc| svc.submit_record(record.clone()))?;
        Ok(SubmitResponse {
            success: true,
            stats: outcome.snapshot.stats(),
            applied_amount: outcome.applied_amount,
            leveled_up: outcome.leveled_up,
            record_id: outcome.record.id,
        })
    }

    /// `GET records?year&month`
    ///
    /// # Errors
    /// Validation failure for a month outside 1-12.
    pub fn list_records(&self, query: RecordsQuery) -> Result<RecordsResponse> {
        let filter = RecordFilter {
            year: query.year,
            month: query.month,
        };
        Ok(self.service.lock().list_records(&filter)?)
    }

    /// `DELETE record/{id}`
    ///
    /// # Errors
    /// Storage failures, or `not_found` when strict removal is configured.
    pub fn delete_record(&self, id: i64) -> Result<DeleteResponse> {
        let id = RecordId(id);
        match self.with_retry("delete_record", |svc| svc.remove_record(id))? {
            RemoveOutcome::Removed { snapshot, .. } => Ok(DeleteResponse {
                success: true,
                stats: Some(snapshot.stats()),
                reason: None,
            }),
            RemoveOutcome::NotFound => Ok(DeleteResponse {
                success: false,
                stats: None,
                reason: Some(format!("record {id} not found")),
            }),
        }
    }

    /// `POST boss-defeat`
    ///
    /// # Errors
    /// Validation failure when no boss guards the level.
    pub fn record_defeat(&self, body: BossDefeatBody) -> Result<BossDefeatResponse> {
        let newly = self.with_retry("record_defeat", |svc| svc.record_defeat(body.level))?;
        debug!(level = body.level, newly, "Boss defeat handled");
        Ok(BossDefeatResponse {
            success: true,
            level: body.level,
        })
    }

    /// `GET boss-defeats`
    ///
    /// # Errors
    /// Storage failures.
    pub fn defeated_levels(&self) -> Result<Vec<u32>> {
        Ok(self.service.lock().defeated_levels()?)
    }

    fn with_retry<T>(
        &self,
        op: &'static str,
        mut f: impl FnMut(&mut ProgressionService) -> studyquest_core::Result<T>,
    ) -> Result<T> {
        let mut attempt: u32 = 0;
        loop {
            attempt = attempt.saturating_add(1);
            let result = {
                let mut service = self.service.lock();
                f(&mut *service)
            };
            match result {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() => {
                    if attempt > self.max_retries {
                        warn!(op, attempts = attempt, error = %err, "Retries exhausted");
                        return Err(ApiError::RetriesExhausted {
                            attempts: attempt,
                            source: err,
                        });
                    }
                    debug!(op, attempt, error = %err, "Retrying");
                    thread::sleep(Duration::from_millis(RETRY_BACKOFF_MS * u64::from(attempt)));
                }
                Err(err) => return Err(err.into()),
            }
        }
    }
}

impl std::fmt::Debug for QuestApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuestApi")
            .field("max_retries", &self.max_retries)
            .finish_non_exhaustive()
    }
}
