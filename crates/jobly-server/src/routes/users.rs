use crate::AppState;
use crate::auth::{Admin, AuthUser, ensure_admin_or_user};
use crate::error::{ApiError, ApiResult};
use crate::extract::{ApiPath, ValidJson};
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use jobly::models::{NewUser, User, UserUpdate};
use serde_json::{Value, json};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list).post(create))
        .route("/users/{username}", get(detail).patch(update).delete(remove))
        .route("/users/{username}/jobs/{id}", post(apply))
}

/// `POST /users { user } => { user, token }` (admin)
///
/// Unlike `/auth/register`, this may create admins.
async fn create(
    _admin: Admin,
    State(state): State<AppState>,
    ValidJson(data): ValidJson<NewUser>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let conn = state.conn().await?;
    let user = User::register(&conn, data, state.bcrypt_cost).await?;
    let token = state.tokens.issue_token(&user)?;
    Ok((StatusCode::CREATED, Json(json!({ "user": user, "token": token }))))
}

/// `GET /users => { users: [...] }` (admin)
async fn list(_admin: Admin, State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let conn = state.conn().await?;
    let users = User::find_all(&conn).await?;
    Ok(Json(json!({ "users": users })))
}

/// `GET /users/{username} => { user }`, applications included.
async fn detail(
    caller: AuthUser,
    State(state): State<AppState>,
    ApiPath(username): ApiPath<String>,
) -> ApiResult<Json<Value>> {
    ensure_admin_or_user(&caller, &username)?;
    let conn = state.conn().await?;
    let user = User::get(&conn, &username).await?;
    Ok(Json(json!({ "user": user })))
}

/// `PATCH /users/{username} { firstName?, lastName?, password?, email? } => { user }`
///
/// The caller is checked before the body, so strangers get 401 even for a bad body.
async fn update(
    caller: AuthUser,
    State(state): State<AppState>,
    ApiPath(username): ApiPath<String>,
    body: Result<ValidJson<UserUpdate>, ApiError>,
) -> ApiResult<Json<Value>> {
    let claims = ensure_admin_or_user(&caller, &username)?;
    let ValidJson(data) = body?;
    if data.is_admin.is_some() && !claims.is_admin {
        return Err(ApiError::forbidden("Only admins may change isAdmin"));
    }
    let conn = state.conn().await?;
    let user = User::update(&conn, &username, data, state.bcrypt_cost).await?;
    Ok(Json(json!({ "user": user })))
}

async fn remove(
    caller: AuthUser,
    State(state): State<AppState>,
    ApiPath(username): ApiPath<String>,
) -> ApiResult<Json<Value>> {
    ensure_admin_or_user(&caller, &username)?;
    let conn = state.conn().await?;
    User::remove(&conn, &username).await?;
    Ok(Json(json!({ "deleted": username })))
}

/// `POST /users/{username}/jobs/{id} => { applied: id }`
async fn apply(
    caller: AuthUser,
    State(state): State<AppState>,
    ApiPath((username, id)): ApiPath<(String, i32)>,
) -> ApiResult<Json<Value>> {
    ensure_admin_or_user(&caller, &username)?;
    let conn = state.conn().await?;
    User::apply_to_job(&conn, &username, id).await?;
    Ok(Json(json!({ "applied": id })))
}
