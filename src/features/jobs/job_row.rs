use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Error;

pub const MAX_NAME_LEN: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow, Serialize)]
pub struct JobRow {
    pub row_id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobCreate {
    pub name: String,
}

/// Job names are stored as `VARCHAR(100)`, in the catalog and in history.
pub fn validate_name(name: &str) -> Result<(), Error> {
    if name.is_empty() || name.chars().count() > MAX_NAME_LEN {
        return Err(Error::InvalidParams("name"));
    }
    Ok(())
}

#[tokio::test]
async fn validate_name_bounds() -> anyhow::Result<()> {
    // act & assert
    assert!(validate_name("nightly-ingest").is_ok());
    assert!(validate_name(&"x".repeat(MAX_NAME_LEN)).is_ok());
    assert!(validate_name("").is_err());
    assert!(validate_name(&"x".repeat(MAX_NAME_LEN + 1)).is_err());
    Ok(())
}
