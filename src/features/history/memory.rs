use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use super::{
    jobhistory::to_store_precision, repository::finish_rejected, JobHistoryRepository,
    JobHistoryRow, NewJobRun, Timestamper,
};
use crate::{
    features::jobs::{validate_name, JobRow},
    models::Error,
};

/// In-process store with the same constraints as the Postgres schema.
///
/// Every check-then-write happens under one lock, so concurrent inserts of
/// the same (job, start) pair serialize and exactly one wins.
#[derive(Debug, Default)]
pub struct MemoryJobHistory {
    tables: Mutex<Tables>,
    clock: Timestamper,
}

#[derive(Debug, Default)]
struct Tables {
    job_seq: i64,
    run_seq: i64,
    jobs: BTreeMap<i64, JobRow>,
    runs: BTreeMap<i64, JobHistoryRow>,
}

impl MemoryJobHistory {
    pub fn new() -> MemoryJobHistory {
        MemoryJobHistory::default()
    }
}

#[async_trait]
impl JobHistoryRepository for MemoryJobHistory {
    async fn ping(&self) -> Result<(), Error> {
        Ok(())
    }

    async fn create_job(&self, name: &str) -> Result<JobRow, Error> {
        validate_name(name)?;
        let mut tables = self.tables.lock().await;
        tables.job_seq += 1;
        let now = self.clock.now();
        let job = JobRow {
            row_id: tables.job_seq,
            name: name.to_owned(),
            created_at: now,
            updated_at: now,
        };
        tables.jobs.insert(job.row_id, job.clone());
        Ok(job)
    }

    async fn get_job(&self, job_id: i64) -> Result<Option<JobRow>, Error> {
        let tables = self.tables.lock().await;
        Ok(tables.jobs.get(&job_id).cloned())
    }

    async fn rename_job(&self, job_id: i64, name: &str) -> Result<Option<JobRow>, Error> {
        validate_name(name)?;
        let mut tables = self.tables.lock().await;
        let Some(job) = tables.jobs.get_mut(&job_id) else {
            return Ok(None);
        };
        job.name = name.to_owned();
        job.updated_at = self.clock.now();
        Ok(Some(job.clone()))
    }

    async fn delete_job(&self, job_id: i64) -> Result<bool, Error> {
        let mut tables = self.tables.lock().await;
        if tables.jobs.remove(&job_id).is_none() {
            return Ok(false);
        }
        tables.runs.retain(|_, run| run.job_id != job_id);
        Ok(true)
    }

    async fn create_run(&self, run: NewJobRun) -> Result<JobHistoryRow, Error> {
        let run = run.validated()?;
        let mut tables = self.tables.lock().await;
        if !tables.jobs.contains_key(&run.job_id) {
            return Err(Error::ForeignKeyViolation(run.job_id));
        }
        let duplicate = tables.runs.values().any(|r| {
            r.job_id == run.job_id && r.execution_start_time == run.execution_start_time
        });
        if duplicate {
            return Err(Error::DuplicateRun {
                job_id: run.job_id,
                start: run.execution_start_time,
            });
        }
        tables.run_seq += 1;
        let now = self.clock.now();
        let row = JobHistoryRow {
            row_id: tables.run_seq,
            job_id: run.job_id,
            job_name: run.job_name,
            execution_start_time: run.execution_start_time,
            execution_end_time: run.execution_end_time,
            created_at: now,
            updated_at: now,
        };
        tables.runs.insert(row.row_id, row.clone());
        Ok(row)
    }

    async fn finish_run(&self, run_id: i64, end: DateTime<Utc>) -> Result<JobHistoryRow, Error> {
        let end = to_store_precision(end);
        let mut tables = self.tables.lock().await;
        match tables.runs.get_mut(&run_id) {
            Some(row) if row.execution_end_time.is_none() && row.execution_start_time <= end => {
                row.execution_end_time = Some(end);
                row.updated_at = self.clock.now();
                Ok(row.clone())
            }
            row => Err(finish_rejected(row.cloned(), run_id)),
        }
    }

    async fn get_run(&self, run_id: i64) -> Result<Option<JobHistoryRow>, Error> {
        let tables = self.tables.lock().await;
        Ok(tables.runs.get(&run_id).cloned())
    }

    async fn get_history(
        &self,
        job_id: i64,
        limit: i32,
        offset: i32,
    ) -> Result<Vec<JobHistoryRow>, Error> {
        let tables = self.tables.lock().await;
        let mut history: Vec<JobHistoryRow> = tables
            .runs
            .values()
            .filter(|run| run.job_id == job_id)
            .cloned()
            .collect();
        history.sort_by_key(|run| run.execution_start_time);
        Ok(history
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }
}
