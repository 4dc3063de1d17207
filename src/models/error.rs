use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use problemdetails::Problem;

// region:    Error
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Malformed Envelope - {0}")]
    MalformedEnvelope(String),

    #[error("Unsupported Payload Type - {0}")]
    UnsupportedPayloadType(&'static str),

    #[error("Invalid Batch - {0}")]
    InvalidBatch(String),

    #[error("Duplicate Run - job {job_id} already started at {start}")]
    DuplicateRun { job_id: i64, start: DateTime<Utc> },

    #[error("Foreign Key Violation - job {0} does not exist")]
    ForeignKeyViolation(i64),

    #[error("Job Not Found - {0}")]
    JobNotFound(i64),

    #[error("Run Not Found - {0}")]
    RunNotFound(i64),

    #[error("Run Already Finished - {0}")]
    RunAlreadyFinished(i64),

    #[error("Invalid End Time - end precedes start")]
    InvalidEndTime,

    #[error("Invalid Params - {0}")]
    InvalidParams(&'static str),

    #[error("Config Error - {0}")]
    Config(String),

    #[error(transparent)]
    DbError(#[from] sqlx::Error),

    #[error(transparent)]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    IoError(#[from] std::io::Error),
}
// endregion: Error

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::MalformedEnvelope(_)
            | Error::UnsupportedPayloadType(_)
            | Error::InvalidBatch(_)
            | Error::InvalidParams(_) => StatusCode::BAD_REQUEST,
            Error::InvalidEndTime | Error::ForeignKeyViolation(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Error::DuplicateRun { .. } | Error::RunAlreadyFinished(_) => StatusCode::CONFLICT,
            Error::JobNotFound(_) | Error::RunNotFound(_) => StatusCode::NOT_FOUND,
            Error::DbError(sqlx::Error::RowNotFound) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<Error> for Problem {
    fn from(item: Error) -> Problem {
        let status_code = item.status_code();
        let problem = problemdetails::new(status_code)
            .with_title(status_code.to_string())
            .with_detail(item.to_string());
        match status_code {
            StatusCode::INTERNAL_SERVER_ERROR => problem.with_instance(format!("{:?}", item)),
            _ => problem,
        }
    }
}

#[tokio::test]
async fn error_status_codes() -> anyhow::Result<()> {
    // arrange
    let start = "2024-01-01T00:00:00Z".parse::<DateTime<Utc>>()?;

    // act & assert
    assert_eq!(
        StatusCode::CONFLICT,
        Error::DuplicateRun { job_id: 1, start }.status_code()
    );
    assert_eq!(
        StatusCode::UNPROCESSABLE_ENTITY,
        Error::ForeignKeyViolation(1).status_code()
    );
    assert_eq!(StatusCode::NOT_FOUND, Error::RunNotFound(7).status_code());
    assert_eq!(
        StatusCode::BAD_REQUEST,
        Error::MalformedEnvelope("eof".into()).status_code()
    );
    assert_eq!(
        StatusCode::INTERNAL_SERVER_ERROR,
        Error::Config("DATABASE_URL".into()).status_code()
    );
    Ok(())
}
