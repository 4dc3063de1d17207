use crate::{
    features::{response::Response, Paging, PagingResult},
    models::{AppState, Error},
    services::JobRecorder,
};
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use problemdetails::Problem;
use serde::Deserialize;
use std::sync::Arc;
#[allow(unused_imports)]
use tracing::{debug, error, info, warn};

use super::{history_batch, JobHistoryEntry};

pub fn routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/jobs/:id/runs", post(run_create))
        .route("/jobs/:id/history", get(get_history_by_id))
        .route("/jobs/:id/history/response", get(get_history_response))
        .route("/runs/:id", get(run_by_id))
        .route("/runs/:id/end", put(run_finish))
        .with_state(state)
}

#[derive(Debug, Default, Deserialize)]
struct RunCreate {
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize)]
struct RunFinish {
    end: Option<DateTime<Utc>>,
}

async fn run_create(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<i64>,
    Json(body): Json<RunCreate>,
) -> Result<impl IntoResponse, Problem> {
    let recorder = JobRecorder::new(Arc::clone(&state.history));
    let start = body.start.unwrap_or_else(Utc::now);
    let entry = match body.end {
        None => recorder.start_at(job_id, start).await?,
        Some(end) => recorder.record_completed(job_id, start, end).await?,
    };
    Ok((StatusCode::CREATED, Json(entry)))
}

async fn run_finish(
    State(state): State<Arc<AppState>>,
    Path(run_id): Path<i64>,
    Json(body): Json<RunFinish>,
) -> Result<impl IntoResponse, Problem> {
    let recorder = JobRecorder::new(Arc::clone(&state.history));
    let end = body.end.unwrap_or_else(Utc::now);
    let entry = recorder.finish_at(run_id, end).await?;
    Ok(Json(entry))
}

async fn run_by_id(
    State(state): State<Arc<AppState>>,
    Path(run_id): Path<i64>,
) -> Result<impl IntoResponse, Problem> {
    let entry = state
        .history
        .get_run(run_id)
        .await?
        .map(JobHistoryEntry::from)
        .ok_or(Error::RunNotFound(run_id))?;
    Ok(Json(entry))
}

async fn get_history_by_id(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<i64>,
    Query(pagination): Query<Paging>,
) -> Result<impl IntoResponse, Problem> {
    let limit = pagination.limit.unwrap_or(100);
    let offset = pagination.offset.unwrap_or(0);
    let data = get_by_id(&state, job_id, limit, offset).await?;
    Ok(Json(PagingResult {
        limit,
        offset,
        data,
    }))
}

/// History wrapped in a response envelope, the way query results are sent
/// to clients.
async fn get_history_response(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<i64>,
    Query(pagination): Query<Paging>,
) -> Result<impl IntoResponse, Problem> {
    let limit = pagination.limit.unwrap_or(100);
    let offset = pagination.offset.unwrap_or(0);
    let batch = get_by_id(&state, job_id, limit, offset)
        .await
        .and_then(|entries| history_batch(&entries));
    let response = match batch {
        Ok(batch) => Response::success(batch),
        Err(err) => {
            warn!({ job_id }, "history response failed: {}", err);
            Response::from(err)
        }
    };
    let text = response.to_json()?;
    Ok(([(header::CONTENT_TYPE, "application/json")], text))
}

pub async fn get_by_id(
    state: &AppState,
    job_id: i64,
    limit: i32,
    offset: i32,
) -> Result<Vec<JobHistoryEntry>, Error> {
    if state.history.get_job(job_id).await?.is_none() {
        return Err(Error::JobNotFound(job_id));
    }
    let history = state.history.get_history(job_id, limit, offset).await?;
    Ok(history.into_iter().map(JobHistoryEntry::from).collect())
}
