use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    DatabaseError(String),
    BadRequest(String),
    Internal(String),
    Validation(String),
    SerializationError(String),
    ConfigurationError(String),
}

impl AppError {
    pub fn is_validation(&self) -> bool {
        matches!(self, AppError::Validation(_))
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
            AppError::Validation(msg) => write!(f, "Validation error: {}", msg),
            AppError::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            AppError::ConfigurationError(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

// Every failure is reported as a 500 carrying the underlying message.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::DatabaseError(_) | AppError::Internal(_) => {
                tracing::error!("{}", self);
            }
            _ => tracing::warn!("{}", self),
        }

        let status = StatusCode::INTERNAL_SERVER_ERROR;
        let body = Json(json!({
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::DatabaseError(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::SerializationError(err.to_string())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn render(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_every_error_is_500_with_message() {
        let (status, body) = render(AppError::Validation("rating: too high".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"error": "Validation error: rating: too high"}));

        let (status, body) = render(AppError::DatabaseError("pool closed".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], json!("Database error: pool closed"));
    }

    #[test]
    fn test_conversions() {
        let err: AppError = serde_json::from_str::<serde_json::Value>("{").unwrap_err().into();
        assert!(matches!(err, AppError::SerializationError(_)));
        assert!(!err.is_validation());

        let err: AppError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, AppError::DatabaseError(_)));
    }
}
