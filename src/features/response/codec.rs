//! JSON text form of a [`Response`]:
//!
//! ```text
//! {"status": "kSuccess" | "kFail", "batch": <primitive | {"__batch__": ..}>, "error": ".."}
//! ```
//!
//! Status and error go through plain serde. The `batch` slot is the only
//! place a complex value may appear: a [`Batch`] is written with its own
//! portable encoder under the reserved tag, and only that tag is decoded
//! back into a `Batch`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Response, ResponsePayload, ResponseStatus};
use crate::{
    features::batch::{self, Batch},
    models::Error,
};

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    status: ResponseStatus,
    batch: Value,
    error: &'a str,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct Envelope {
    status: ResponseStatus,
    batch: Value,
    error: String,
}

pub fn encode(response: &Response) -> Result<String, Error> {
    let envelope = EnvelopeRef {
        status: response.status(),
        batch: encode_payload(response.batch())?,
        error: response.error(),
    };
    serde_json::to_string(&envelope).map_err(|err| Error::MalformedEnvelope(err.to_string()))
}

pub fn decode(text: &str) -> Result<Response, Error> {
    let envelope: Envelope =
        serde_json::from_str(text).map_err(|err| Error::MalformedEnvelope(err.to_string()))?;
    let batch = decode_payload(envelope.batch)?;
    Ok(Response::new(envelope.status, batch, envelope.error))
}

fn encode_payload(payload: &ResponsePayload) -> Result<Value, Error> {
    match payload {
        ResponsePayload::Batch(b) => batch::tag(b),
        ResponsePayload::Value(Value::Array(_)) => Err(Error::UnsupportedPayloadType("array")),
        ResponsePayload::Value(Value::Object(_)) => Err(Error::UnsupportedPayloadType("object")),
        ResponsePayload::Value(value) => Ok(value.clone()),
    }
}

fn decode_payload(value: Value) -> Result<ResponsePayload, Error> {
    if batch::is_tagged::<Batch>(&value) {
        return batch::untag::<Batch>(value)
            .map(ResponsePayload::Batch)
            .map_err(|err| Error::MalformedEnvelope(err.to_string()));
    }
    match value {
        Value::Array(_) | Value::Object(_) => Err(Error::MalformedEnvelope(
            "batch must be a primitive or a tagged batch".into(),
        )),
        value => Ok(ResponsePayload::Value(value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn two_rows() -> Result<Batch, Error> {
        Batch::new(vec!["id".into()], vec![vec![json!(1)], vec![json!(2)]])
    }

    #[tokio::test]
    async fn round_trip_success_with_batch() -> anyhow::Result<()> {
        // arrange
        let response = Response::success(two_rows()?);

        // act
        let text = encode(&response)?;
        let decoded = decode(&text)?;

        // assert
        assert_eq!(response, decoded);
        let batch = decoded.batch().as_batch().expect("batch payload");
        assert_eq!(&[vec![json!(1)], vec![json!(2)]], batch.rows());
        Ok(())
    }

    #[tokio::test]
    async fn encode_wire_shape() -> anyhow::Result<()> {
        // arrange
        let response = Response::success(two_rows()?);

        // act
        let value: Value = serde_json::from_str(&encode(&response)?)?;

        // assert
        assert_eq!(
            json!({
                "status": "kSuccess",
                "batch": {"__batch__": {"columns": ["id"], "data": [[1], [2]]}},
                "error": ""
            }),
            value
        );
        Ok(())
    }

    #[tokio::test]
    async fn round_trip_fail_with_empty_batch() -> anyhow::Result<()> {
        // arrange
        let response = Response::new(ResponseStatus::Fail, Batch::empty(), "query failed");

        // act
        let decoded = decode(&encode(&response)?)?;

        // assert
        assert_eq!(response, decoded);
        assert!(decoded.batch().is_empty());
        assert_eq!(Some(&Batch::empty()), decoded.batch().as_batch());
        Ok(())
    }

    #[tokio::test]
    async fn round_trip_without_payload() -> anyhow::Result<()> {
        // arrange
        let response = Response::fail("no such table");

        // act
        let text = encode(&response)?;
        let decoded = decode(&text)?;

        // assert
        assert!(text.contains("\"batch\":null"));
        assert_eq!(response, decoded);
        Ok(())
    }

    #[tokio::test]
    async fn round_trip_mixed_cells() -> anyhow::Result<()> {
        // arrange
        let batch = Batch::new(
            vec!["name".into(), "score".into(), "tags".into()],
            vec![
                vec![json!("a"), json!(0.5), json!(["x", "y"])],
                vec![json!(null), json!(-3), json!({"k": "v"})],
            ],
        )?;
        let response = Response::success(batch);

        // act
        let decoded = decode(&encode(&response)?)?;

        // assert
        assert_eq!(response, decoded);
        Ok(())
    }

    #[tokio::test]
    async fn primitive_batch_decodes_verbatim() -> anyhow::Result<()> {
        // arrange
        let text = r#"{"status": "kSuccess", "batch": 42, "error": ""}"#;

        // act
        let decoded = decode(text)?;

        // assert
        assert_eq!(&ResponsePayload::Value(json!(42)), decoded.batch());
        assert_eq!(None, decoded.batch().as_batch());
        assert_eq!(decoded, decode(&encode(&decoded)?)?);
        Ok(())
    }

    #[tokio::test]
    async fn string_batch_named_like_tag_is_not_a_batch() -> anyhow::Result<()> {
        // arrange
        let text = r#"{"status": "kSuccess", "batch": "__batch__", "error": ""}"#;

        // act
        let decoded = decode(text)?;

        // assert
        assert_eq!(&ResponsePayload::Value(json!("__batch__")), decoded.batch());
        Ok(())
    }

    #[tokio::test]
    async fn decode_legacy_status() -> anyhow::Result<()> {
        // arrange
        let text = r#"{"status": "-1", "batch": null, "error": "boom"}"#;

        // act
        let decoded = decode(text)?;

        // assert
        assert_eq!(Response::fail("boom"), decoded);
        Ok(())
    }

    #[tokio::test]
    async fn decode_malformed_text() -> anyhow::Result<()> {
        // act & assert
        assert!(matches!(decode("{not json"), Err(Error::MalformedEnvelope(_))));
        assert!(matches!(decode(""), Err(Error::MalformedEnvelope(_))));
        assert!(matches!(decode("[]"), Err(Error::MalformedEnvelope(_))));
        Ok(())
    }

    #[tokio::test]
    async fn decode_missing_fields() -> anyhow::Result<()> {
        // arrange
        let texts = [
            r#"{"batch": null, "error": ""}"#,
            r#"{"status": "kSuccess", "error": ""}"#,
            r#"{"status": "kSuccess", "batch": null}"#,
        ];

        // act & assert
        for text in texts {
            assert!(
                matches!(decode(text), Err(Error::MalformedEnvelope(_))),
                "{text}"
            );
        }
        Ok(())
    }

    #[tokio::test]
    async fn decode_rejects_unknown_status_and_fields() -> anyhow::Result<()> {
        // act & assert
        assert!(matches!(
            decode(r#"{"status": "kMaybe", "batch": null, "error": ""}"#),
            Err(Error::MalformedEnvelope(_))
        ));
        assert!(matches!(
            decode(r#"{"status": "kFail", "batch": null, "error": "", "extra": 1}"#),
            Err(Error::MalformedEnvelope(_))
        ));
        Ok(())
    }

    #[tokio::test]
    async fn decode_rejects_untagged_mapping() -> anyhow::Result<()> {
        // arrange
        let text = r#"{"status": "kSuccess", "batch": {"columns": [], "data": []}, "error": ""}"#;

        // act & assert
        assert!(matches!(decode(text), Err(Error::MalformedEnvelope(_))));
        Ok(())
    }

    #[tokio::test]
    async fn decode_rejects_bad_tagged_batch() -> anyhow::Result<()> {
        // arrange
        let text = r#"{"status": "kSuccess", "batch": {"__batch__": {"columns": ["a"], "data": [[1, 2]]}}, "error": ""}"#;

        // act & assert
        assert!(matches!(decode(text), Err(Error::MalformedEnvelope(_))));
        Ok(())
    }

    #[tokio::test]
    async fn encode_rejects_generic_objects() -> anyhow::Result<()> {
        // arrange
        let object = Response::success(json!({"columns": ["a"]}));
        let array = Response::success(json!([[1], [2]]));

        // act & assert
        assert!(matches!(
            encode(&object),
            Err(Error::UnsupportedPayloadType("object"))
        ));
        assert!(matches!(
            encode(&array),
            Err(Error::UnsupportedPayloadType("array"))
        ));
        Ok(())
    }

    #[tokio::test]
    async fn codec_is_reentrant() -> anyhow::Result<()> {
        // arrange
        let tasks: Vec<_> = (0..32)
            .map(|i| {
                tokio::spawn(async move {
                    let batch = Batch::new(vec!["i".into()], vec![vec![json!(i)]])?;
                    let response = Response::success(batch);
                    let decoded = decode(&encode(&response)?)?;
                    Ok::<bool, Error>(decoded == response)
                })
            })
            .collect();

        // act
        let results = futures::future::join_all(tasks).await;

        // assert
        for res in results {
            assert!(res??);
        }
        Ok(())
    }
}
