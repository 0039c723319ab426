//! HTTP error responses.

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use jobly::{ErrorKind, JoblyError};
use serde_json::json;
use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

/// Everything a handler can fail with.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Jobly(#[from] JoblyError),

    #[error("token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

impl ApiError {
    pub fn unauthorized() -> Self {
        Self::Jobly(JoblyError::unauthorized("Unauthorized"))
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Jobly(JoblyError::Forbidden(message.into()))
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::Jobly(JoblyError::not_found(message))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Jobly(err) => match err.kind() {
                ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
                ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
                ErrorKind::Forbidden => StatusCode::FORBIDDEN,
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::Conflict => StatusCode::CONFLICT,
                ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Token(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing message. Internal failures are not described.
    fn public_message(&self) -> String {
        match self {
            Self::Jobly(JoblyError::InvalidInput(messages)) => messages.join("; "),
            Self::Jobly(
                JoblyError::NotFound(m)
                | JoblyError::Unauthorized(m)
                | JoblyError::Forbidden(m)
                | JoblyError::Conflict(m),
            ) => m.clone(),
            _ => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = json!({
            "error": {
                "message": self.public_message(),
                "status": status.as_u16(),
            }
        });
        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Jobly(JoblyError::invalid_input(rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Jobly(JoblyError::invalid_input(rejection.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::Jobly(JoblyError::invalid_input(rejection.body_text()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use pretty_assertions::assert_eq;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn maps_kinds_to_status_codes() {
        let cases = [
            (JoblyError::invalid_input("No data"), StatusCode::BAD_REQUEST),
            (JoblyError::unauthorized("x"), StatusCode::UNAUTHORIZED),
            (JoblyError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (JoblyError::not_found("x"), StatusCode::NOT_FOUND),
            (JoblyError::conflict("x"), StatusCode::CONFLICT),
            (JoblyError::decode("id", "bad"), StatusCode::INTERNAL_SERVER_ERROR),
            (JoblyError::Pool("down".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }

    #[tokio::test]
    async fn renders_error_body() {
        let response = ApiError::from(JoblyError::not_found("No job: 0")).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            body_json(response).await,
            json!({ "error": { "message": "No job: 0", "status": 404 } })
        );
    }

    #[tokio::test]
    async fn hides_internal_details() {
        let response = ApiError::from(JoblyError::Pool("password=hunter2".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await["error"]["message"],
            "Internal server error"
        );
    }
}
