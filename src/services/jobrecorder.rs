use std::{future::Future, sync::Arc};

use chrono::{DateTime, Utc};
#[allow(unused_imports)]
use tracing::{debug, error, info, warn};

use crate::{
    features::history::{JobHistoryEntry, JobHistoryRepository, NewJobRun},
    models::Error,
};

/// Records job runs in the history ledger for a job runner.
///
/// Store errors are passed through untouched; deciding whether a
/// `DuplicateRun` is benign is up to the caller.
#[derive(Clone)]
pub struct JobRecorder {
    history: Arc<dyn JobHistoryRepository>,
}

impl JobRecorder {
    pub fn new(history: Arc<dyn JobHistoryRepository>) -> Self {
        Self { history }
    }

    pub async fn start(&self, job_id: i64) -> Result<JobHistoryEntry, Error> {
        self.start_at(job_id, Utc::now()).await
    }

    pub async fn start_at(
        &self,
        job_id: i64,
        start: DateTime<Utc>,
    ) -> Result<JobHistoryEntry, Error> {
        let run = self.new_run(job_id, start).await?;
        let row = self.history.create_run(run).await?;
        debug!({ job_id, run_id = row.row_id }, "==> run started");
        Ok(row.into())
    }

    /// Records a run that already finished.
    pub async fn record_completed(
        &self,
        job_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<JobHistoryEntry, Error> {
        let run = self.new_run(job_id, start).await?.with_end(end);
        let row = self.history.create_run(run).await?;
        debug!({ job_id, run_id = row.row_id }, "==> run recorded");
        Ok(row.into())
    }

    pub async fn finish(&self, run: &JobHistoryEntry) -> Result<JobHistoryEntry, Error> {
        self.finish_at(run.row_id, Utc::now()).await
    }

    pub async fn finish_at(&self, run_id: i64, end: DateTime<Utc>) -> Result<JobHistoryEntry, Error> {
        let row = self.history.finish_run(run_id, end).await?;
        debug!({ job_id = row.job_id, run_id }, "==> run finished");
        Ok(row.into())
    }

    /// Runs `work` between a start and a finish record.
    ///
    /// If `work` panics the run stays open, with no end time.
    pub async fn record<F, T>(&self, job_id: i64, work: F) -> Result<(T, JobHistoryEntry), Error>
    where
        F: Future<Output = T>,
    {
        let run = self.start(job_id).await?;
        let output = work.await;
        let run = self.finish(&run).await?;
        Ok((output, run))
    }

    async fn new_run(&self, job_id: i64, start: DateTime<Utc>) -> Result<NewJobRun, Error> {
        let job = self
            .history
            .get_job(job_id)
            .await?
            .ok_or(Error::JobNotFound(job_id))?;
        Ok(NewJobRun::started(job.row_id, job.name, start))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::history::MemoryJobHistory;

    fn recorder() -> (Arc<MemoryJobHistory>, JobRecorder) {
        let history = Arc::new(MemoryJobHistory::new());
        let recorder = JobRecorder::new(history.clone());
        (history, recorder)
    }

    #[tokio::test]
    async fn record_wraps_work() -> anyhow::Result<()> {
        // arrange
        let (history, recorder) = recorder();
        let job = history.create_job("ingest").await?;

        // act
        let (output, run) = recorder.record(job.row_id, async { 40 + 2 }).await?;

        // assert
        assert_eq!(42, output);
        assert_eq!("ingest", run.job_name);
        assert!(run.is_finished());
        assert!(run.execution_end_time >= Some(run.execution_start_time));
        assert!(run.updated_at > run.created_at);
        Ok(())
    }

    #[tokio::test]
    async fn start_unknown_job() -> anyhow::Result<()> {
        // arrange
        let (_, recorder) = recorder();

        // act
        let res = recorder.start(9).await;

        // assert
        assert!(matches!(res, Err(Error::JobNotFound(9))));
        Ok(())
    }

    #[tokio::test]
    async fn start_twice_at_same_instant() -> anyhow::Result<()> {
        // arrange
        let (history, recorder) = recorder();
        let job = history.create_job("ingest").await?;
        let start: DateTime<Utc> = "2024-01-01T00:00:00Z".parse()?;

        // act
        let first = recorder.start_at(job.row_id, start).await;
        let second = recorder.start_at(job.row_id, start).await;

        // assert
        assert!(first.is_ok());
        assert!(matches!(second, Err(Error::DuplicateRun { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn run_keeps_name_at_start() -> anyhow::Result<()> {
        // arrange
        let (history, recorder) = recorder();
        let job = history.create_job("ingest-v1").await?;
        let run = recorder.start(job.row_id).await?;

        // act
        history.rename_job(job.row_id, "ingest-v2").await?;
        let run = recorder.finish(&run).await?;

        // assert
        assert_eq!("ingest-v1", run.job_name);
        Ok(())
    }
}
