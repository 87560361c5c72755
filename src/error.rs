use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Embedding service unavailable: {0}")]
    EmbeddingUnavailable(String),

    #[error("Rate limited by upstream service: {0}")]
    RateLimited(String),

    #[error("Retrieval failed: {0}")]
    Retrieval(String),

    #[error("External API error: {0}")]
    ExternalApi(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether the caller may retry the same request later
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AppError::EmbeddingUnavailable(_) | AppError::RateLimited(_)
        )
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidInput(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::RateLimited(_) => (StatusCode::TOO_MANY_REQUESTS, self.to_string()),
            AppError::EmbeddingUnavailable(_)
            | AppError::Retrieval(_)
            | AppError::Database(_)
            | AppError::Cache(_)
            | AppError::HttpClient(_)
            | AppError::ExternalApi(_)
            | AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = vec![
            (AppError::InvalidInput("bad".into()), StatusCode::BAD_REQUEST),
            (AppError::RateLimited("slow down".into()), StatusCode::TOO_MANY_REQUESTS),
            (
                AppError::EmbeddingUnavailable("down".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                AppError::Retrieval("index".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }

    #[test]
    fn test_retryable_errors() {
        assert!(AppError::RateLimited("x".into()).is_retryable());
        assert!(AppError::EmbeddingUnavailable("x".into()).is_retryable());
        assert!(!AppError::InvalidInput("x".into()).is_retryable());
        assert!(!AppError::Retrieval("x".into()).is_retryable());
    }
}
