use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};
#[allow(unused_imports)]
use tracing::{debug, error, info, warn};

use super::{
    jobhistory::to_store_precision, repository::finish_rejected, JobHistoryRepository,
    JobHistoryRow, NewJobRun, Timestamper,
};
use crate::{
    db,
    features::jobs::{validate_name, JobRow},
    models::Error,
};

#[derive(Debug)]
pub struct PgJobHistory {
    pool: Pool<Postgres>,
    clock: Timestamper,
}

impl PgJobHistory {
    pub fn new(pool: Pool<Postgres>) -> PgJobHistory {
        PgJobHistory {
            pool,
            clock: Timestamper::new(),
        }
    }

    pub fn pool(&self) -> &Pool<Postgres> {
        &self.pool
    }
}

/// Maps constraint violations reported by Postgres onto typed errors.
fn classify(err: sqlx::Error, run: &NewJobRun) -> Error {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return Error::DuplicateRun {
                job_id: run.job_id,
                start: run.execution_start_time,
            };
        }
        if db_err.is_foreign_key_violation() {
            return Error::ForeignKeyViolation(run.job_id);
        }
        if db_err.is_check_violation() {
            return Error::InvalidEndTime;
        }
    }
    Error::DbError(err)
}

#[async_trait]
impl JobHistoryRepository for PgJobHistory {
    async fn ping(&self) -> Result<(), Error> {
        db::select_one(&self.pool).await
    }

    async fn create_job(&self, name: &str) -> Result<JobRow, Error> {
        validate_name(name)?;
        const SQL: &str = "INSERT INTO job_catalog(name, created_at, updated_at) VALUES ($1, $2, $2)
        RETURNING row_id, name, created_at, updated_at";
        let job = sqlx::query_as::<_, JobRow>(SQL)
            .bind(name)
            .bind(self.clock.now())
            .fetch_one(&self.pool)
            .await?;
        Ok(job)
    }

    async fn get_job(&self, job_id: i64) -> Result<Option<JobRow>, Error> {
        const SQL: &str = "SELECT row_id, name, created_at, updated_at FROM job_catalog WHERE row_id = $1";
        let job = sqlx::query_as::<_, JobRow>(SQL)
            .bind(job_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(job)
    }

    async fn rename_job(&self, job_id: i64, name: &str) -> Result<Option<JobRow>, Error> {
        validate_name(name)?;
        const SQL: &str = "UPDATE job_catalog SET name = $2, updated_at = $3 WHERE row_id = $1
        RETURNING row_id, name, created_at, updated_at";
        let job = sqlx::query_as::<_, JobRow>(SQL)
            .bind(job_id)
            .bind(name)
            .bind(self.clock.now())
            .fetch_optional(&self.pool)
            .await?;
        Ok(job)
    }

    async fn delete_job(&self, job_id: i64) -> Result<bool, Error> {
        const SQL: &str = "DELETE FROM job_catalog WHERE row_id = $1";
        let res = sqlx::query(SQL).bind(job_id).execute(&self.pool).await?;
        debug!({ job_id, rows = res.rows_affected() }, "delete job");
        Ok(res.rows_affected() > 0)
    }

    async fn create_run(&self, run: NewJobRun) -> Result<JobHistoryRow, Error> {
        let run = run.validated()?;
        const SQL: &str = "INSERT INTO job_history_catalog(job_id, job_name, execution_start_time, execution_end_time, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $5) RETURNING *";
        let row = sqlx::query_as::<_, JobHistoryRow>(SQL)
            .bind(run.job_id)
            .bind(&run.job_name)
            .bind(run.execution_start_time)
            .bind(run.execution_end_time)
            .bind(self.clock.now())
            .fetch_one(&self.pool)
            .await
            .map_err(|err| classify(err, &run))?;
        Ok(row)
    }

    async fn finish_run(&self, run_id: i64, end: DateTime<Utc>) -> Result<JobHistoryRow, Error> {
        const SQL: &str = "UPDATE job_history_catalog SET execution_end_time = $2, updated_at = $3
        WHERE row_id = $1 AND execution_end_time IS NULL AND execution_start_time <= $2 RETURNING *";
        let row = sqlx::query_as::<_, JobHistoryRow>(SQL)
            .bind(run_id)
            .bind(to_store_precision(end))
            .bind(self.clock.now())
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => Ok(row),
            None => Err(finish_rejected(self.get_run(run_id).await?, run_id)),
        }
    }

    async fn get_run(&self, run_id: i64) -> Result<Option<JobHistoryRow>, Error> {
        const SQL: &str = "SELECT * FROM job_history_catalog WHERE row_id = $1";
        let row = sqlx::query_as::<_, JobHistoryRow>(SQL)
            .bind(run_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn get_history(
        &self,
        job_id: i64,
        limit: i32,
        offset: i32,
    ) -> Result<Vec<JobHistoryRow>, Error> {
        const SQL: &str = "SELECT * FROM job_history_catalog WHERE job_id = $1 ORDER BY execution_start_time LIMIT $2 OFFSET $3";
        let history = sqlx::query_as::<_, JobHistoryRow>(SQL)
            .bind(job_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        Ok(history)
    }
}
