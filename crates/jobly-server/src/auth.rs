//! Bearer tokens and role checks.
//!
//! Tokens are HS256 JWTs carrying the username and admin flag. A missing or
//! invalid token never fails a request by itself: [`AuthUser`] just resolves
//! to an anonymous caller, and the guards ([`LoggedIn`], [`Admin`],
//! [`ensure_admin_or_user`]) decide what that caller may do.

use crate::AppState;
use crate::error::ApiError;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use jobly::models::User;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub username: String,
    pub is_admin: bool,
    pub iat: i64,
    pub exp: i64,
}

/// Signing and verification keys derived from the configured secret.
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_secs: i64,
}

impl TokenKeys {
    pub fn new(secret: &str, ttl_secs: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl_secs,
        }
    }

    pub fn issue_token(&self, user: &User) -> jsonwebtoken::errors::Result<String> {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            username: user.username.clone(),
            is_admin: user.is_admin,
            iat: now,
            exp: now + self.ttl_secs,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
    }

    /// Check the signature and expiry of `token`.
    pub fn verify_token(&self, token: &str) -> jsonwebtoken::errors::Result<Claims> {
        let validation = Validation::new(Algorithm::HS256);
        decode::<Claims>(token, &self.decoding, &validation).map(|data| data.claims)
    }
}

/// The caller, if a valid bearer token was sent.
#[derive(Debug, Clone, Default)]
pub struct AuthUser(pub Option<Claims>);

impl AuthUser {
    pub fn claims(&self) -> Option<&Claims> {
        self.0.as_ref()
    }

    pub fn is_admin(&self) -> bool {
        self.0.as_ref().is_some_and(|c| c.is_admin)
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let Some(token) = bearer_token(parts) else {
            return Ok(Self(None));
        };
        match state.tokens.verify_token(token) {
            Ok(claims) => Ok(Self(Some(claims))),
            Err(err) => {
                tracing::debug!(error = %err, "ignoring invalid bearer token");
                Ok(Self(None))
            }
        }
    }
}

/// Any authenticated caller.
#[derive(Debug, Clone)]
pub struct LoggedIn(pub Claims);

impl FromRequestParts<AppState> for LoggedIn {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let AuthUser(claims) = AuthUser::from_request_parts(parts, state).await?;
        claims.map(Self).ok_or_else(ApiError::unauthorized)
    }
}

/// An authenticated admin.
#[derive(Debug, Clone)]
pub struct Admin(pub Claims);

impl FromRequestParts<AppState> for Admin {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let LoggedIn(claims) = LoggedIn::from_request_parts(parts, state).await?;
        if !claims.is_admin {
            return Err(ApiError::unauthorized());
        }
        Ok(Self(claims))
    }
}

/// Allow admins, or the user named `username` acting on themselves.
pub fn ensure_admin_or_user<'a>(caller: &'a AuthUser, username: &str) -> Result<&'a Claims, ApiError> {
    match caller.claims() {
        Some(claims) if claims.is_admin || claims.username == username => Ok(claims),
        _ => Err(ApiError::unauthorized()),
    }
}
