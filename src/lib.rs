use std::sync::Arc;

use axum::Router;
use models::AppState;
use tower_http::trace::TraceLayer;

pub mod db;
pub mod features;
pub mod models;
pub mod services;

pub fn app(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .merge(features::jobs::routes(Arc::clone(&state)))
        .merge(features::history::routes(Arc::clone(&state)));
    Router::new()
        .merge(features::live::routes(Arc::clone(&state)))
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        features::response::{Response, ResponseStatus},
        models::Config,
    };
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> anyhow::Result<(StatusCode, String)> {
        let req = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json");
        let req = match body {
            Some(body) => req.body(Body::from(body.to_string()))?,
            None => req.body(Body::empty())?,
        };
        let res = app.clone().oneshot(req).await?;
        let status = res.status();
        let bytes = res.into_body().collect().await?.to_bytes();
        Ok((status, String::from_utf8(bytes.to_vec())?))
    }

    #[tokio::test]
    async fn job_lifecycle() -> anyhow::Result<()> {
        // arrange
        let app = app(AppState::in_memory(Config::default()));
        let (_, job) = call(&app, "POST", "/api/v1/jobs", Some(json!({"name": "nightly"}))).await?;
        let job: Value = serde_json::from_str(&job)?;
        let job_id = job["row_id"].as_i64().unwrap_or_default();

        // act
        let (started, run) = call(
            &app,
            "POST",
            &format!("/api/v1/jobs/{job_id}/runs"),
            Some(json!({"start": "2024-01-01T00:00:00Z"})),
        )
        .await?;
        let run: Value = serde_json::from_str(&run)?;
        let run_id = run["row_id"].as_i64().unwrap_or_default();
        let (finished, _) = call(
            &app,
            "PUT",
            &format!("/api/v1/runs/{run_id}/end"),
            Some(json!({"end": "2024-01-01T00:01:00Z"})),
        )
        .await?;
        let (_, text) = call(&app, "GET", &format!("/api/v1/jobs/{job_id}/history/response"), None).await?;
        let (deleted, _) = call(&app, "DELETE", &format!("/api/v1/jobs/{job_id}"), None).await?;
        let (gone, _) = call(&app, "GET", &format!("/api/v1/runs/{run_id}"), None).await?;

        // assert
        assert_eq!(StatusCode::CREATED, started);
        assert_eq!(StatusCode::OK, finished);
        let response = Response::from_json(&text)?;
        assert_eq!(ResponseStatus::Success, response.status());
        let ends = response
            .batch()
            .as_batch()
            .and_then(|b| b.column("execution_end_time"))
            .unwrap_or_default();
        assert_eq!(vec![&json!("2024-01-01T00:01:00Z")], ends);
        assert_eq!(StatusCode::NO_CONTENT, deleted);
        assert_eq!(StatusCode::NOT_FOUND, gone);
        Ok(())
    }

    #[tokio::test]
    async fn live_routes() -> anyhow::Result<()> {
        // arrange
        let app = app(AppState::in_memory(Config::default()));

        // act
        let (status, _) = call(&app, "GET", "/live", None).await?;

        // assert
        assert_eq!(StatusCode::OK, status);
        Ok(())
    }
}
