use crate::AppState;
use crate::auth::Admin;
use crate::error::ApiResult;
use crate::extract::{ApiPath, ValidJson, ValidQuery};
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use jobly::models::{Job, JobFilter, JobUpdate, NewJob};
use serde_json::{Value, json};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/jobs", get(list).post(create))
        .route("/jobs/{id}", get(detail).patch(update).delete(remove))
}

/// `POST /jobs { job } => { job }` (admin)
async fn create(
    _admin: Admin,
    State(state): State<AppState>,
    ValidJson(data): ValidJson<NewJob>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let conn = state.conn().await?;
    let job = Job::create(&conn, data).await?;
    Ok((StatusCode::CREATED, Json(json!({ "job": job }))))
}

/// `GET /jobs?title=&minSalary=&hasEquity= => { jobs: [...] }`
async fn list(
    State(state): State<AppState>,
    ValidQuery(filter): ValidQuery<JobFilter>,
) -> ApiResult<Json<Value>> {
    let conn = state.conn().await?;
    let jobs = Job::find_all(&conn, Some(&filter)).await?;
    Ok(Json(json!({ "jobs": jobs })))
}

async fn detail(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<Json<Value>> {
    let conn = state.conn().await?;
    let job = Job::get(&conn, id).await?;
    Ok(Json(json!({ "job": job })))
}

/// `PATCH /jobs/{id} { title?, salary?, equity? } => { job }` (admin)
async fn update(
    _admin: Admin,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
    ValidJson(data): ValidJson<JobUpdate>,
) -> ApiResult<Json<Value>> {
    let conn = state.conn().await?;
    let job = Job::update(&conn, id, data).await?;
    Ok(Json(json!({ "job": job })))
}

async fn remove(
    _admin: Admin,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<Json<Value>> {
    let conn = state.conn().await?;
    Job::remove(&conn, id).await?;
    Ok(Json(json!({ "deleted": id })))
}
