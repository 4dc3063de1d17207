use std::{fmt::Display, str::FromStr};

use serde_json::Value;

use super::{codec, ResponseStatus};
use crate::{features::batch::Batch, models::Error};

/// What a response carries in its `batch` slot.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponsePayload {
    Batch(Batch),
    /// A JSON primitive, `null` when there is no payload.
    Value(Value),
}

impl ResponsePayload {
    pub const fn none() -> ResponsePayload {
        ResponsePayload::Value(Value::Null)
    }

    pub fn is_empty(&self) -> bool {
        match self {
            ResponsePayload::Batch(batch) => batch.is_empty(),
            ResponsePayload::Value(value) => value.is_null(),
        }
    }

    pub fn as_batch(&self) -> Option<&Batch> {
        match self {
            ResponsePayload::Batch(batch) => Some(batch),
            ResponsePayload::Value(_) => None,
        }
    }
}

impl Default for ResponsePayload {
    fn default() -> Self {
        ResponsePayload::none()
    }
}

impl From<Batch> for ResponsePayload {
    fn from(value: Batch) -> Self {
        ResponsePayload::Batch(value)
    }
}

impl From<Value> for ResponsePayload {
    fn from(value: Value) -> Self {
        ResponsePayload::Value(value)
    }
}

/// Server response envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    status: ResponseStatus,
    batch: ResponsePayload,
    error: String,
}

impl Response {
    pub fn new(
        status: ResponseStatus,
        batch: impl Into<ResponsePayload>,
        error: impl Into<String>,
    ) -> Response {
        Response {
            status,
            batch: batch.into(),
            error: error.into(),
        }
    }

    pub fn success(batch: impl Into<ResponsePayload>) -> Response {
        Response::new(ResponseStatus::Success, batch, String::new())
    }

    pub fn fail(error: impl Into<String>) -> Response {
        Response::new(ResponseStatus::Fail, ResponsePayload::none(), error)
    }

    pub fn status(&self) -> ResponseStatus {
        self.status
    }

    pub fn batch(&self) -> &ResponsePayload {
        &self.batch
    }

    pub fn error(&self) -> &str {
        &self.error
    }

    pub fn to_json(&self) -> Result<String, Error> {
        codec::encode(self)
    }

    pub fn from_json(text: &str) -> Result<Response, Error> {
        codec::decode(text)
    }
}

impl FromStr for Response {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        codec::decode(s)
    }
}

impl From<Error> for Response {
    fn from(value: Error) -> Self {
        Response::fail(value.to_string())
    }
}

impl Display for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Response Object:")?;
        writeln!(f, "@status: {}", self.status)?;
        match &self.batch {
            ResponsePayload::Batch(batch) => writeln!(f, "@batch: {}", batch)?,
            ResponsePayload::Value(value) => writeln!(f, "@batch: {}", value)?,
        }
        write!(f, "@error: {}", self.error)
    }
}

#[tokio::test]
async fn response_equality_is_structural() -> anyhow::Result<()> {
    // arrange
    let batch = || Batch::new(vec!["a".into()], vec![vec![serde_json::json!(1)]]);
    let a = Response::success(batch()?);
    let b = Response::new(ResponseStatus::Success, batch()?, "");

    // act & assert
    assert_eq!(a, b);
    assert_ne!(a, Response::new(ResponseStatus::Fail, batch()?, ""));
    assert_ne!(a, Response::new(ResponseStatus::Success, batch()?, "oops"));
    assert_ne!(a, Response::success(Batch::empty()));
    Ok(())
}

#[tokio::test]
async fn response_from_error() -> anyhow::Result<()> {
    // act
    let response = Response::from(Error::JobNotFound(3));

    // assert
    assert_eq!(ResponseStatus::Fail, response.status());
    assert!(response.batch().is_empty());
    assert_eq!("Job Not Found - 3", response.error());
    Ok(())
}

#[tokio::test]
async fn response_display() -> anyhow::Result<()> {
    // arrange
    let response = Response::fail("boom");

    // act
    let s = response.to_string();

    // assert
    assert_eq!("Response Object:\n@status: kFail\n@batch: null\n@error: boom", s);
    Ok(())
}
