use crate::models::{AppState, Error};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use problemdetails::Problem;
use std::sync::Arc;
#[allow(unused_imports)]
use tracing::{debug, error, info, warn};

use super::JobCreate;

pub fn routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/jobs", post(job_create))
        .route("/jobs/:id", get(get_by_id).put(rename).delete(delete))
        .with_state(state)
}

async fn job_create(
    State(state): State<Arc<AppState>>,
    Json(body): Json<JobCreate>,
) -> Result<impl IntoResponse, Problem> {
    let job = state.history.create_job(&body.name).await?;
    debug!({ instance_id = state.instance_id, job_id = job.row_id }, "job created");
    Ok((StatusCode::CREATED, Json(job)))
}

async fn get_by_id(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<i64>,
) -> Result<impl IntoResponse, Problem> {
    let job = state
        .history
        .get_job(job_id)
        .await?
        .ok_or(Error::JobNotFound(job_id))?;
    Ok(Json(job))
}

async fn rename(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<i64>,
    Json(body): Json<JobCreate>,
) -> Result<impl IntoResponse, Problem> {
    let job = state
        .history
        .rename_job(job_id, &body.name)
        .await?
        .ok_or(Error::JobNotFound(job_id))?;
    Ok(Json(job))
}

async fn delete(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<i64>,
) -> Result<Response, Problem> {
    let deleted = state.history.delete_job(job_id).await?;
    debug!({ instance_id = state.instance_id, job_id, deleted }, "job delete");
    match deleted {
        false => Ok(StatusCode::NOT_FOUND.into_response()),
        true => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}
