use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Application error taxonomy, mapped onto HTTP at the boundary.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("email already registered")]
    DuplicateEmail,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("unauthorized")]
    Unauthorized,

    #[error("not found")]
    NotFound,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::DuplicateEmail => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::InvalidCredentials => (StatusCode::BAD_REQUEST, self.to_string()),
            // Never explains why; an empty object leaks nothing about auth internals.
            AppError::Unauthorized => {
                return (StatusCode::UNAUTHORIZED, Json(json!({}))).into_response();
            }
            AppError::NotFound => (StatusCode::NOT_FOUND, self.to_string()),
            AppError::Internal(err) => {
                tracing::error!(error = %err, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => AppError::NotFound,
            other => AppError::Internal(other.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn error_response(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        (status, json)
    }

    #[tokio::test]
    async fn validation_maps_to_400_with_message() {
        let (status, body) =
            error_response(AppError::Validation("text must not be empty".into())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "text must not be empty");
    }

    #[tokio::test]
    async fn duplicate_email_maps_to_400() {
        let (status, body) = error_response(AppError::DuplicateEmail).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "email already registered");
    }

    #[tokio::test]
    async fn invalid_credentials_maps_to_400() {
        let (status, body) = error_response(AppError::InvalidCredentials).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid credentials");
    }

    #[tokio::test]
    async fn unauthorized_is_401_with_empty_body() {
        let (status, body) = error_response(AppError::Unauthorized).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({}));
    }

    #[tokio::test]
    async fn not_found_maps_to_404() {
        let (status, body) = error_response(AppError::NotFound).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "not found");
    }

    #[tokio::test]
    async fn internal_hides_details() {
        let (status, body) = error_response(AppError::Internal(anyhow::anyhow!(
            "connection refused at 10.0.0.5:5432"
        )))
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "internal server error");
        assert!(!body["error"].as_str().unwrap().contains("10.0.0.5"));
    }

    #[test]
    fn row_not_found_becomes_not_found() {
        let err = AppError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, AppError::NotFound));
    }
}
