use crate::AppState;
use crate::error::ApiResult;
use crate::extract::ValidJson;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use jobly::models::{NewUser, User};
use jobly::{Validate, ValidationErrors};
use serde::Deserialize;
use serde_json::{Value, json};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/token", post(token))
        .route("/auth/register", post(register))
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct TokenRequest {
    username: String,
    password: String,
}

impl Validate for TokenRequest {
    fn validate(&self) -> ValidationErrors {
        let mut errs = ValidationErrors::default();
        errs.check_len("username", &self.username, 1, 25);
        errs.check_len("password", &self.password, 1, 20);
        errs
    }
}

/// Self-service sign-up. Never grants admin.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RegisterRequest {
    username: String,
    password: String,
    first_name: String,
    last_name: String,
    email: String,
}

impl From<RegisterRequest> for NewUser {
    fn from(req: RegisterRequest) -> Self {
        NewUser {
            username: req.username,
            password: req.password,
            first_name: req.first_name,
            last_name: req.last_name,
            email: req.email,
            is_admin: false,
        }
    }
}

impl Validate for RegisterRequest {
    fn validate(&self) -> ValidationErrors {
        NewUser::from(self.clone()).validate()
    }
}

/// `POST /auth/token { username, password } => { token }`
async fn token(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<TokenRequest>,
) -> ApiResult<Json<Value>> {
    let conn = state.conn().await?;
    let user = User::authenticate(&conn, &req.username, &req.password).await?;
    let token = state.tokens.issue_token(&user)?;
    Ok(Json(json!({ "token": token })))
}

/// `POST /auth/register { user } => { token }`
async fn register(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let conn = state.conn().await?;
    let user = User::register(&conn, req.into(), state.bcrypt_cost).await?;
    let token = state.tokens.issue_token(&user)?;
    Ok((StatusCode::CREATED, Json(json!({ "token": token }))))
}
