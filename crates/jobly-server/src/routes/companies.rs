use crate::AppState;
use crate::auth::Admin;
use crate::error::ApiResult;
use crate::extract::{ApiPath, ValidJson, ValidQuery};
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use jobly::models::{Company, CompanyFilter, CompanyUpdate, NewCompany};
use serde_json::{Value, json};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/companies", get(list).post(create))
        .route("/companies/{handle}", get(detail).patch(update).delete(remove))
}

/// `POST /companies { company } => { company }` (admin)
async fn create(
    _admin: Admin,
    State(state): State<AppState>,
    ValidJson(data): ValidJson<NewCompany>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let conn = state.conn().await?;
    let company = Company::create(&conn, data).await?;
    Ok((StatusCode::CREATED, Json(json!({ "company": company }))))
}

/// `GET /companies?name=&minEmployees=&maxEmployees= => { companies: [...] }`
async fn list(
    State(state): State<AppState>,
    ValidQuery(filter): ValidQuery<CompanyFilter>,
) -> ApiResult<Json<Value>> {
    let conn = state.conn().await?;
    let companies = Company::find_all(&conn, Some(&filter)).await?;
    Ok(Json(json!({ "companies": companies })))
}

/// `GET /companies/{handle} => { company }`, jobs included.
async fn detail(
    State(state): State<AppState>,
    ApiPath(handle): ApiPath<String>,
) -> ApiResult<Json<Value>> {
    let conn = state.conn().await?;
    let company = Company::get(&conn, &handle).await?;
    Ok(Json(json!({ "company": company })))
}

/// `PATCH /companies/{handle} { fld1, ... } => { company }` (admin)
async fn update(
    _admin: Admin,
    State(state): State<AppState>,
    ApiPath(handle): ApiPath<String>,
    ValidJson(data): ValidJson<CompanyUpdate>,
) -> ApiResult<Json<Value>> {
    let conn = state.conn().await?;
    let company = Company::update(&conn, &handle, data).await?;
    Ok(Json(json!({ "company": company })))
}

/// `DELETE /companies/{handle} => { deleted: handle }` (admin)
async fn remove(
    _admin: Admin,
    State(state): State<AppState>,
    ApiPath(handle): ApiPath<String>,
) -> ApiResult<Json<Value>> {
    let conn = state.conn().await?;
    Company::remove(&conn, &handle).await?;
    Ok(Json(json!({ "deleted": handle })))
}
