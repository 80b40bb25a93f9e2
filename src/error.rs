use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use crate::users::{repo::StoreError, validation::ValidationError};

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Malformed or missing input. The message goes to the client verbatim.
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    /// Anything the client can't fix. Logged, never echoed.
    #[error("internal error: {0:#}")]
    Internal(#[from] anyhow::Error),
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: bool,
    pub message: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            ApiError::Validation(msg) | ApiError::NotFound(msg) | ApiError::Conflict(msg) => msg,
            ApiError::Internal(e) => {
                error!(error = %format!("{e:#}"), "internal error");
                "Internal Server Error".to_string()
            }
        };
        (status, Json(ErrorBody { error: true, message })).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEmail => ApiError::Conflict("Email already registered".into()),
            StoreError::Database(e) => ApiError::Internal(anyhow::Error::new(e).context("store query")),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::Validation(err.message.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_of(err: ApiError) -> (StatusCode, serde_json::Value) {
        let res = err.into_response();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn validation_message_is_surfaced_verbatim() {
        let (status, body) = body_of(ApiError::Validation("Invalid user id".into())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], true);
        assert_eq!(body["message"], "Invalid user id");
    }

    #[tokio::test]
    async fn internal_error_hides_its_cause() {
        let err = ApiError::Internal(anyhow::anyhow!("relation \"users\" does not exist"));
        let (status, body) = body_of(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Internal Server Error");
        assert!(!body.to_string().contains("relation"));
    }

    #[tokio::test]
    async fn duplicate_email_maps_to_conflict() {
        let (status, body) = body_of(StoreError::DuplicateEmail.into()).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["message"], "Email already registered");
    }

    #[test]
    fn database_failures_collapse_to_internal() {
        let err: ApiError = StoreError::Database(sqlx::Error::PoolTimedOut).into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
