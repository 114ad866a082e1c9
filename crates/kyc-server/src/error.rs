//! Error types for the KYC server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Main error type for the KYC server
#[derive(Error, Debug)]
pub enum KycError {
    #[error("no record found for merchant_id: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ::config::ConfigError),
}

impl KycError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            KycError::NotFound(_) => StatusCode::NOT_FOUND,
            KycError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            KycError::NotFound(_) => "not_found",
            KycError::InvalidRequest(_) => "invalid_request",
            KycError::Database(_) => "database_error",
            _ => "internal_error",
        }
    }
}

impl IntoResponse for KycError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }
        let body = Json(json!({
            "error": self.to_string(),
            "code": self.code(),
        }));
        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, KycError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            KycError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            KycError::InvalidRequest("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        let db = KycError::Database(sqlx::Error::PoolClosed);
        assert_eq!(db.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(db.code(), "database_error");
    }

    #[test]
    fn test_not_found_message() {
        let err = KycError::NotFound("11111111-1111-1111-1111-111111111111".into());
        assert_eq!(
            err.to_string(),
            "no record found for merchant_id: 11111111-1111-1111-1111-111111111111"
        );
    }
}
