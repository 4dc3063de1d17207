use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{JobHistoryRow, NewJobRun};
use crate::{features::jobs::JobRow, models::Error};

/// Job catalog and the execution history hanging off it.
///
/// Implementations stamp `created_at`/`updated_at` themselves, enforce
/// uniqueness of (`job_id`, `execution_start_time`) and cascade history on
/// job deletion. Violations come back as typed errors and are never retried
/// here.
#[async_trait]
pub trait JobHistoryRepository: Send + Sync {
    async fn ping(&self) -> Result<(), Error>;

    async fn create_job(&self, name: &str) -> Result<JobRow, Error>;

    async fn get_job(&self, job_id: i64) -> Result<Option<JobRow>, Error>;

    /// History rows keep the name the job had when they were written.
    async fn rename_job(&self, job_id: i64, name: &str) -> Result<Option<JobRow>, Error>;

    /// Deletes the job and, by cascade, all of its history.
    async fn delete_job(&self, job_id: i64) -> Result<bool, Error>;

    /// Fails with `DuplicateRun` or `ForeignKeyViolation`.
    async fn create_run(&self, run: NewJobRun) -> Result<JobHistoryRow, Error>;

    /// Sets `execution_end_time`, once.
    async fn finish_run(&self, run_id: i64, end: DateTime<Utc>) -> Result<JobHistoryRow, Error>;

    async fn get_run(&self, run_id: i64) -> Result<Option<JobHistoryRow>, Error>;

    /// Runs of one job ordered by start time.
    async fn get_history(
        &self,
        job_id: i64,
        limit: i32,
        offset: i32,
    ) -> Result<Vec<JobHistoryRow>, Error>;
}

/// Why a guarded end-time update touched no row.
pub(crate) fn finish_rejected(run: Option<JobHistoryRow>, run_id: i64) -> Error {
    match run {
        None => Error::RunNotFound(run_id),
        Some(row) if row.execution_end_time.is_some() => Error::RunAlreadyFinished(run_id),
        Some(_) => Error::InvalidEndTime,
    }
}
