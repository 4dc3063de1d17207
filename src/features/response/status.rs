use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::models::Error;

/// Outcome of a server request.
///
/// Wire encoding is fixed: `"kSuccess"` and `"kFail"`. The legacy numeric
/// spellings `"0"` and `"-1"` are still accepted when decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResponseStatus {
    #[serde(rename = "kSuccess", alias = "0")]
    Success,
    #[serde(rename = "kFail", alias = "-1")]
    Fail,
}

impl ResponseStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ResponseStatus::Success => "kSuccess",
            ResponseStatus::Fail => "kFail",
        }
    }

    pub const fn is_success(&self) -> bool {
        matches!(self, ResponseStatus::Success)
    }
}

impl FromStr for ResponseStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "kSuccess" | "0" => Ok(ResponseStatus::Success),
            "kFail" | "-1" => Ok(ResponseStatus::Fail),
            _ => Err(Error::InvalidParams("status")),
        }
    }
}

impl Display for ResponseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[tokio::test]
async fn status_wire_encoding() -> anyhow::Result<()> {
    // act & assert
    assert_eq!("\"kSuccess\"", serde_json::to_string(&ResponseStatus::Success)?);
    assert_eq!("\"kFail\"", serde_json::to_string(&ResponseStatus::Fail)?);
    assert_eq!(
        ResponseStatus::Fail,
        serde_json::from_str::<ResponseStatus>("\"-1\"")?
    );
    assert_eq!(
        ResponseStatus::Success,
        serde_json::from_str::<ResponseStatus>("\"0\"")?
    );
    assert!(serde_json::from_str::<ResponseStatus>("\"SUCCESS\"").is_err());
    Ok(())
}

#[tokio::test]
async fn status_from_str() -> anyhow::Result<()> {
    // act & assert
    assert_eq!(ResponseStatus::Success, "kSuccess".parse()?);
    assert_eq!(ResponseStatus::Fail, "-1".parse()?);
    assert!("ok".parse::<ResponseStatus>().is_err());
    assert_eq!("kFail", ResponseStatus::Fail.to_string());
    Ok(())
}
