use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    features::{batch::Batch, jobs::validate_name},
    models::Error,
};

/// Persisted `job_history_catalog` row.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct JobHistoryRow {
    pub row_id: i64,
    pub job_id: i64,
    pub job_name: String,
    pub execution_start_time: DateTime<Utc>,
    pub execution_end_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Detached copy of a history row, free of any store types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobHistoryEntry {
    pub row_id: i64,
    pub job_id: i64,
    pub job_name: String,
    pub execution_start_time: DateTime<Utc>,
    pub execution_end_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JobHistoryRow {
    pub fn to_entry(&self) -> JobHistoryEntry {
        self.clone().into()
    }
}

impl From<JobHistoryRow> for JobHistoryEntry {
    fn from(row: JobHistoryRow) -> Self {
        JobHistoryEntry {
            row_id: row.row_id,
            job_id: row.job_id,
            job_name: row.job_name,
            execution_start_time: row.execution_start_time,
            execution_end_time: row.execution_end_time,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl JobHistoryEntry {
    pub fn is_finished(&self) -> bool {
        self.execution_end_time.is_some()
    }

    pub fn duration(&self) -> Option<chrono::Duration> {
        self.execution_end_time
            .map(|end| end - self.execution_start_time)
    }
}

#[derive(Debug, Clone)]
pub struct NewJobRun {
    pub job_id: i64,
    pub job_name: String,
    pub execution_start_time: DateTime<Utc>,
    pub execution_end_time: Option<DateTime<Utc>>,
}

impl NewJobRun {
    pub fn started(job_id: i64, job_name: impl Into<String>, start: DateTime<Utc>) -> NewJobRun {
        NewJobRun {
            job_id,
            job_name: job_name.into(),
            execution_start_time: start,
            execution_end_time: None,
        }
    }

    pub fn with_end(mut self, end: DateTime<Utc>) -> NewJobRun {
        self.execution_end_time = Some(end);
        self
    }

    /// Checks the row and rounds its timestamps to the store's microsecond
    /// precision, so both stores agree on what a duplicate start is.
    pub(crate) fn validated(self) -> Result<NewJobRun, Error> {
        validate_name(&self.job_name)?;
        let start = to_store_precision(self.execution_start_time);
        let end = self.execution_end_time.map(to_store_precision);
        if matches!(end, Some(end) if end < start) {
            return Err(Error::InvalidEndTime);
        }
        Ok(NewJobRun {
            execution_start_time: start,
            execution_end_time: end,
            ..self
        })
    }
}

pub(crate) fn to_store_precision(at: DateTime<Utc>) -> DateTime<Utc> {
    at.round_subsecs(6)
}

pub const HISTORY_COLUMNS: [&str; 7] = [
    "row_id",
    "job_id",
    "job_name",
    "execution_start_time",
    "execution_end_time",
    "created_at",
    "updated_at",
];

/// History as tabular data, one row per run.
pub fn history_batch(entries: &[JobHistoryEntry]) -> Result<Batch, Error> {
    let columns = HISTORY_COLUMNS.iter().map(|c| c.to_string()).collect();
    let rows = entries
        .iter()
        .map(|e| {
            vec![
                json!(e.row_id),
                json!(e.job_id),
                json!(e.job_name),
                json!(e.execution_start_time),
                json!(e.execution_end_time),
                json!(e.created_at),
                json!(e.updated_at),
            ]
        })
        .collect();
    Batch::new(columns, rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> DateTime<Utc> {
        s.parse().expect("timestamp")
    }

    #[tokio::test]
    async fn new_run_rejects_end_before_start() -> anyhow::Result<()> {
        // arrange
        let run = NewJobRun::started(1, "ingest", at("2024-01-01T00:00:10Z"))
            .with_end(at("2024-01-01T00:00:09Z"));

        // act
        let res = run.validated();

        // assert
        assert!(matches!(res, Err(Error::InvalidEndTime)));
        Ok(())
    }

    #[tokio::test]
    async fn new_run_rounds_to_micros() -> anyhow::Result<()> {
        // arrange
        let run = NewJobRun::started(1, "ingest", at("2024-01-01T00:00:00.000000400Z"));

        // act
        let run = run.validated()?;

        // assert
        assert_eq!(at("2024-01-01T00:00:00Z"), run.execution_start_time);
        Ok(())
    }

    #[tokio::test]
    async fn entry_from_row() -> anyhow::Result<()> {
        // arrange
        let row = JobHistoryRow {
            row_id: 5,
            job_id: 1,
            job_name: "ingest".into(),
            execution_start_time: at("2024-01-01T00:00:00Z"),
            execution_end_time: Some(at("2024-01-01T00:01:30Z")),
            created_at: at("2024-01-01T00:00:00Z"),
            updated_at: at("2024-01-01T00:01:30Z"),
        };

        // act
        let entry = row.to_entry();

        // assert
        assert_eq!(5, entry.row_id);
        assert_eq!("ingest", entry.job_name);
        assert!(entry.is_finished());
        assert_eq!(Some(chrono::Duration::seconds(90)), entry.duration());
        Ok(())
    }

    #[tokio::test]
    async fn history_as_batch() -> anyhow::Result<()> {
        // arrange
        let entry = JobHistoryEntry {
            row_id: 1,
            job_id: 2,
            job_name: "ingest".into(),
            execution_start_time: at("2024-01-01T00:00:00Z"),
            execution_end_time: None,
            created_at: at("2024-01-01T00:00:00Z"),
            updated_at: at("2024-01-01T00:00:00Z"),
        };

        // act
        let batch = history_batch(&[entry])?;

        // assert
        assert_eq!(1, batch.len());
        assert_eq!(HISTORY_COLUMNS.len(), batch.columns().len());
        assert_eq!(Some(vec![&json!("ingest")]), batch.column("job_name"));
        assert_eq!(Some(vec![&json!(null)]), batch.column("execution_end_time"));
        Ok(())
    }
}
